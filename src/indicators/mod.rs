// src/indicators/mod.rs
//! Stateful indicators computed bar by bar over a [`TimeSeries`].
//!
//! An indicator does not own the series it reads; the caller appends a
//! candle and then asks every indicator to advance one step. A value of
//! `0.0` means the indicator has not seen enough bars yet.

pub mod ema;
pub mod sma;

pub use ema::Ema;
pub use sma::Sma;

use crate::core::timeseries::TimeSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cross {
    None,
    Up,
    Down,
}

pub trait Indicator: Send {
    /// Advance one bar and return the new value.
    fn calculate(&mut self, series: &TimeSeries) -> f64;

    fn value(&self) -> f64;

    fn previous(&self) -> f64;

    /// Bars processed so far.
    fn position(&self) -> usize;
}

pub trait MovingAverageIndicator: Indicator {
    fn average(&self) -> &MovingAverage;

    fn uptrend(&self) -> bool {
        self.average().uptrend()
    }

    /// Flat counts as a downtrend.
    fn downtrend(&self) -> bool {
        !self.uptrend()
    }

    fn cross_over(&self, series: &TimeSeries) -> Cross {
        self.average().cross_over(series)
    }
}

/// State shared by every moving average: window, bar count, last two values.
#[derive(Debug, Clone, Default)]
pub struct MovingAverage {
    pub window: usize,
    pub(crate) current: usize,
    pub(crate) previous: f64,
    pub(crate) value: f64,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            ..Default::default()
        }
    }

    /// Bumps the bar count and remembers the outgoing value.
    pub(crate) fn step(&mut self) {
        self.current += 1;
        self.previous = self.value;
    }

    pub fn uptrend(&self) -> bool {
        self.previous < self.value
    }

    /// A price can only cross down on a red candle and up on a green one.
    /// Touching the open or close exactly is not a cross.
    pub fn cross_over(&self, series: &TimeSeries) -> Cross {
        let candle = series.last_candle();

        if candle.is_green() && candle.open_price < self.value && self.value < candle.close_price
        {
            return Cross::Up;
        }

        if candle.is_red() && candle.open_price > self.value && self.value > candle.close_price {
            return Cross::Down;
        }

        Cross::None
    }
}
