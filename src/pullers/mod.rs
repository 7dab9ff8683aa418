// src/pullers/mod.rs
pub mod api;
pub mod file;

pub use api::ApiPuller;
pub use file::FilePuller;

use crate::connectors::traits::{Puller, Stop};
use crate::types::Candle;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Hands a candle to the trader. Returns `false` once the puller should
/// stop: either the stop signal fired or the trader hung up.
pub(crate) async fn forward(stop: &mut Stop, candles: &mpsc::Sender<Candle>, candle: Candle) -> bool {
    tokio::select! {
        _ = stop => false,
        sent = candles.send(candle) => sent.is_ok(),
    }
}

/// Puller selected at startup.
pub enum PullerKind {
    Api(ApiPuller),
    File(FilePuller),
}

#[async_trait]
impl Puller for PullerKind {
    async fn pull(&mut self, stop: Stop, candles: mpsc::Sender<Candle>) -> Result<()> {
        match self {
            PullerKind::Api(puller) => puller.pull(stop, candles).await,
            PullerKind::File(puller) => puller.pull(stop, candles).await,
        }
    }
}
