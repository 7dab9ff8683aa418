// src/connectors/mod.rs
pub mod api;
pub mod messages;
pub mod replay;
pub mod traits;
