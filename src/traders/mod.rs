// src/traders/mod.rs
pub mod api;
pub mod backtest;

pub use api::ApiTrader;
pub use backtest::BacktestTrader;

use crate::connectors::traits::{Stop, Trader};
use crate::error::EngineError;
use crate::strategies::traits::Rule;
use crate::types::Candle;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Errors after which the trader skips the candle and keeps going.
pub(crate) fn recoverable(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<EngineError>(),
        Some(EngineError::InsufficientFunds { .. } | EngineError::PositionAlreadyClosed)
    )
}

/// Trader selected at startup.
pub enum TraderKind {
    Api(ApiTrader),
    Backtest(BacktestTrader),
}

#[async_trait]
impl Trader for TraderKind {
    async fn trade(
        &mut self,
        stop: Stop,
        candles: mpsc::Receiver<Candle>,
        rule: &mut dyn Rule,
    ) -> Result<()> {
        match self {
            TraderKind::Api(trader) => trader.trade(stop, candles, rule).await,
            TraderKind::Backtest(trader) => trader.trade(stop, candles, rule).await,
        }
    }

    async fn profit(&self) -> f64 {
        match self {
            TraderKind::Api(trader) => trader.profit().await,
            TraderKind::Backtest(trader) => trader.profit().await,
        }
    }
}
