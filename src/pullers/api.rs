// src/pullers/api.rs
use crate::connectors::traits::{CandleSource, Puller, Stop};
use crate::pullers::forward;
use crate::types::{Candle, TradingPair};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Seeds the trader with the warming history, then polls the most recent
/// bar every `poll_interval`.
pub struct ApiPuller {
    source: Arc<dyn CandleSource>,
    pair: TradingPair,
    poll_interval: Duration,
    fetch_timeout: Duration,
}

impl ApiPuller {
    pub fn new(
        source: Arc<dyn CandleSource>,
        pair: TradingPair,
        poll_interval: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            pair,
            poll_interval,
            fetch_timeout,
        }
    }

    async fn seed(&self) -> Result<Vec<Candle>> {
        let candles = self
            .source
            .candles(&self.pair.symbol, &self.pair.interval, 1, self.pair.warming)
            .await
            .context("puller : seed : error pulling candles from api")?;
        info!(
            symbol = %self.pair.symbol,
            interval = %self.pair.interval,
            candles = candles.len(),
            "puller : seeded"
        );
        Ok(candles)
    }

    /// `Ok(None)` when the fetch timed out; the next tick tries again.
    async fn latest(&self) -> Result<Option<Candle>> {
        let fetch = self
            .source
            .candles(&self.pair.symbol, &self.pair.interval, 1, 1);

        match timeout(self.fetch_timeout, fetch).await {
            Ok(candles) => {
                let candles = candles.context("puller : error pulling candle from api")?;
                Ok(candles.into_iter().next())
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.fetch_timeout.as_millis() as u64,
                    "puller : candle fetch timed out, waiting for next tick"
                );
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl Puller for ApiPuller {
    async fn pull(&mut self, mut stop: Stop, candles: mpsc::Sender<Candle>) -> Result<()> {
        for candle in self.seed().await? {
            if !forward(&mut stop, &candles, candle).await {
                info!("puller : gracefully shutting down the puller");
                return Ok(());
            }
        }

        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = ticker.tick() => {
                    let Some(candle) = self.latest().await? else {
                        continue;
                    };
                    debug!(open_time = %candle.open_time, close = candle.close_price, "puller : pulled");
                    if !forward(&mut stop, &candles, candle).await {
                        break;
                    }
                }
            }
        }

        info!("puller : gracefully shutting down the puller");
        Ok(())
    }
}
