// src/connectors/api.rs
use crate::connectors::messages::{NewOrder, NewPosition, TokenResponse};
use crate::connectors::traits::{CandleSource, ExecutionBackend};
use crate::error::EngineError;
use crate::types::{Candle, Order, Position};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

const POSITIONS_PAGE_ROWS: u32 = 10;

/// Client for the trading REST API that stores candles, positions and orders.
pub struct ApiClient {
    http_client: Client,
    base_url: String,
    username: String,
    password: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building http client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            token: None,
        })
    }

    /// Exchanges the configured credentials for a bearer token.
    pub async fn authenticate(&mut self) -> Result<()> {
        let url = format!("{}/v1/users/token", self.base_url);
        let request = self
            .http_client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password));

        let token: TokenResponse = Self::execute(request)
            .await?
            .json()
            .await
            .context("decoding token response")?;

        info!(endpoint = %self.base_url, user = %self.username, "api : authenticated");
        self.token = Some(token.token);
        Ok(())
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoint);
        let builder = self.http_client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        // we care only about status codes in 2xx range, anything else we can't process
        if !status.is_success() {
            return Err(EngineError::UnexpectedStatus(status.as_u16()).into());
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(&self, method: Method, endpoint: &str) -> Result<T> {
        debug!(%method, endpoint, "api : request");
        let response = Self::execute(self.request(method, endpoint)).await?;
        let body = response.json::<T>().await?;
        Ok(body)
    }

    /// One page of positions, most recent first.
    async fn fetch_positions(&self, page: u32, rows: u32) -> Result<Vec<Position>> {
        let endpoint = format!("/v1/positions/{}/{}", page, rows);
        let positions: Option<Vec<Position>> = self.fetch(Method::GET, &endpoint).await?;
        Ok(positions.unwrap_or_default())
    }
}

#[async_trait]
impl CandleSource for ApiClient {
    async fn candles(
        &self,
        symbol: &str,
        interval: &str,
        page: u32,
        rows: u32,
    ) -> Result<Vec<Candle>> {
        let endpoint = format!("/v1/candles/{}/{}/{}/{}", symbol, interval, page, rows);
        let candles: Option<Vec<Candle>> = self.fetch(Method::GET, &endpoint).await?;
        Ok(candles.unwrap_or_default())
    }
}

#[async_trait]
impl ExecutionBackend for ApiClient {
    async fn list_positions(&self) -> Result<Vec<Position>> {
        let mut positions = Vec::new();
        for page in 1.. {
            let batch = self.fetch_positions(page, POSITIONS_PAGE_ROWS).await?;
            let last_page = batch.len() < POSITIONS_PAGE_ROWS as usize;
            positions.extend(batch);
            if last_page {
                break;
            }
        }
        Ok(positions)
    }

    async fn last_position(&self) -> Result<Option<Position>> {
        Ok(self.fetch_positions(1, 1).await?.pop())
    }

    async fn create_position(&self, position: NewPosition, quantity: f64) -> Result<Position> {
        let request = self.request(Method::POST, "/v1/positions").json(&position);
        let mut created: Position = Self::execute(request).await?.json().await?;

        let order = NewOrder {
            position_id: created.id.clone(),
            quantity,
            side: created.side,
        };
        let opening = self
            .create_order(order)
            .await
            .with_context(|| format!("unable to create order for position {}", created.id))?;

        created.orders.push(opening);
        Ok(created)
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order> {
        let request = self.request(Method::POST, "/v1/orders").json(&order);
        let created = Self::execute(request).await?.json().await?;
        Ok(created)
    }

    async fn close_position(&self, id: &str) -> Result<Option<Position>> {
        let endpoint = format!("/v1/positions/{}", id);
        Self::execute(self.request(Method::DELETE, &endpoint)).await?;

        // Fetch the position so we can return it
        self.last_position().await
    }
}
