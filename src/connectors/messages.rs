// src/connectors/messages.rs
use crate::types::Side;
use serde::{Deserialize, Serialize};

/// Body of `POST /v1/positions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPosition {
    pub symbol_id: String,
    pub side: Side,
}

/// Body of `POST /v1/orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub position_id: String,
    pub quantity: f64,
    pub side: Side,
}

/// Response of `GET /v1/users/token`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}
