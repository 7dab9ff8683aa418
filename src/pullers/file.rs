// src/pullers/file.rs
use crate::connectors::replay::load_klines;
use crate::connectors::traits::{Puller, Stop};
use crate::pullers::forward;
use crate::types::{Candle, TradingPair};
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::info;

/// Replays a kline dump as fast as the trader consumes it, then waits for
/// the stop signal so every candle is delivered.
pub struct FilePuller {
    path: PathBuf,
    pair: TradingPair,
}

impl FilePuller {
    pub fn new(path: impl Into<PathBuf>, pair: TradingPair) -> Self {
        Self {
            path: path.into(),
            pair,
        }
    }

    fn relabel(&self, mut candle: Candle) -> Candle {
        candle.symbol = self.pair.symbol.clone();
        candle.interval = self.pair.interval.clone();
        candle.symbol_id = self.pair.symbol_id.clone();
        candle
    }
}

#[async_trait]
impl Puller for FilePuller {
    async fn pull(&mut self, mut stop: Stop, candles: mpsc::Sender<Candle>) -> Result<()> {
        let data = load_klines(&self.path).await?;
        info!(file = %self.path.display(), candles = data.len(), "puller : replaying file");

        for candle in data {
            if !forward(&mut stop, &candles, self.relabel(candle)).await {
                info!("puller : gracefully shutting down the puller");
                return Ok(());
            }
        }

        let _ = stop.await;
        info!("puller : gracefully shutting down the puller");
        Ok(())
    }
}
