// src/core/timeseries.rs
use crate::types::Candle;

/// Append-only candle buffer. A candle whose `open_time` equals the last
/// appended one is dropped; ordering is otherwise not enforced.
#[derive(Debug, Default, Clone)]
pub struct TimeSeries {
    candles: Vec<Candle>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the candle was appended.
    pub fn add_candle(&mut self, candle: Candle) -> bool {
        if let Some(last) = self.candles.last() {
            if last.open_time == candle.open_time {
                return false;
            }
        }
        self.candles.push(candle);
        true
    }

    /// Last appended candle, or the zero-value candle when empty.
    pub fn last_candle(&self) -> Candle {
        self.candles.last().cloned().unwrap_or_default()
    }

    pub fn is_new(&self, candle: &Candle) -> bool {
        self.candles
            .last()
            .map_or(true, |last| last.open_time != candle.open_time)
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Average close of the last `window` candles (fewer when the series is shorter).
    pub fn average_close(&self, window: usize) -> f64 {
        let window = window.min(self.candles.len());
        if window == 0 {
            return 0.0;
        }
        let sum: f64 = self.candles[self.candles.len() - window..]
            .iter()
            .map(|c| c.close_price)
            .sum();
        sum / window as f64
    }
}
