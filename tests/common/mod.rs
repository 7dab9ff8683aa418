//! In-process stand-in for the trading REST API.
#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use machina::connectors::messages::{NewOrder, NewPosition};
use machina::types::{Candle, Order, OrderType, Position, PositionStatus};
use std::sync::{Arc, Mutex};

pub const USERNAME: &str = "bot";
pub const PASSWORD: &str = "secret";
const TOKEN: &str = "t0k3n";
// base64("bot:secret")
const BASIC: &str = "Basic Ym90OnNlY3JldA==";

#[derive(Default)]
pub struct Store {
    pub positions: Vec<Position>,
    next_id: u32,
}

pub type Shared = Arc<Mutex<Store>>;

/// Starts the fake API on an ephemeral port and returns its base url.
pub async fn serve() -> (String, Shared) {
    let store = Shared::default();
    let app = Router::new()
        .route("/v1/users/token", get(token))
        .route("/v1/candles/:symbol/:interval/:page/:rows", get(candles))
        .route("/v1/positions", post(create_position))
        .route("/v1/positions/:id/:rows", get(list_positions))
        .route("/v1/positions/:id", delete(close_position))
        .route("/v1/orders", post(create_order))
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (format!("http://{addr}"), store)
}

fn header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

fn bearer(headers: &HeaderMap) -> bool {
    header(headers) == Some(format!("Bearer {TOKEN}").as_str())
}

async fn token(headers: HeaderMap) -> Response {
    if header(&headers) != Some(BASIC) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(serde_json::json!({ "token": TOKEN })).into_response()
}

async fn candles(
    headers: HeaderMap,
    Path((symbol, interval, _page, rows)): Path<(String, String, u32, u32)>,
) -> Response {
    if !bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if symbol == "FAIL" {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let bars: Vec<Candle> = (0..rows as i64)
        .map(|i| Candle {
            symbol: symbol.clone(),
            interval: interval.clone(),
            open_time: Utc.timestamp_opt(i * 3_600, 0).unwrap(),
            close_time: Utc.timestamp_opt((i + 1) * 3_600 - 1, 0).unwrap(),
            open_price: 100.0 + i as f64,
            close_price: 101.0 + i as f64,
            ..Default::default()
        })
        .collect();
    Json(bars).into_response()
}

async fn list_positions(
    headers: HeaderMap,
    State(store): State<Shared>,
    Path((page, rows)): Path<(usize, usize)>,
) -> Response {
    if !bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let store = store.lock().unwrap();
    // most recent first, pages start at 1
    let batch: Vec<Position> = store
        .positions
        .iter()
        .rev()
        .skip(page.saturating_sub(1) * rows)
        .take(rows)
        .cloned()
        .collect();
    if batch.is_empty() {
        // the API answers an empty page with null
        return Json(serde_json::Value::Null).into_response();
    }
    Json(batch).into_response()
}

async fn create_position(
    headers: HeaderMap,
    State(store): State<Shared>,
    Json(body): Json<NewPosition>,
) -> Response {
    if !bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut store = store.lock().unwrap();
    store.next_id += 1;
    let position = Position {
        id: format!("p-{}", store.next_id),
        symbol_id: body.symbol_id,
        side: body.side,
        status: PositionStatus::Open,
        creation_time: Utc::now(),
        user: USERNAME.to_string(),
        symbol: "ETHUSDT".to_string(),
        orders: Vec::new(),
    };
    store.positions.push(position.clone());

    let mut body = serde_json::to_value(&position).unwrap();
    body["orders"] = serde_json::Value::Null;
    (StatusCode::CREATED, Json(body)).into_response()
}

/// Orders fill at 100, then 110, 120, ... within a position.
async fn create_order(
    headers: HeaderMap,
    State(store): State<Shared>,
    Json(body): Json<NewOrder>,
) -> Response {
    if !bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut store = store.lock().unwrap();
    let Some(position) = store.positions.iter_mut().find(|p| p.id == body.position_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let order = Order {
        id: format!("{}-o{}", position.id, position.orders.len() + 1),
        symbol_id: position.symbol_id.clone(),
        position_id: position.id.clone(),
        creation_time: Utc::now(),
        price: 100.0 + 10.0 * position.orders.len() as f64,
        quantity: body.quantity,
        status: "FILLED".to_string(),
        order_type: OrderType::Market,
        side: body.side,
    };
    position.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn close_position(
    headers: HeaderMap,
    State(store): State<Shared>,
    Path(id): Path<String>,
) -> Response {
    if !bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut store = store.lock().unwrap();
    match store.positions.iter_mut().find(|p| p.id == id) {
        Some(position) => {
            position.status = PositionStatus::Closed;
            StatusCode::NO_CONTENT.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
