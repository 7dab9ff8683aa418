// src/indicators/sma.rs
use crate::core::timeseries::TimeSeries;
use crate::indicators::{Indicator, MovingAverage, MovingAverageIndicator};

/// Simple moving average over closing prices.
///
/// The first bar seeds the value with its close. While the series is not
/// longer than the window the average is recomputed over whatever is
/// available; after that the value is rolled forward by dropping the close
/// that left the window.
#[derive(Debug, Clone)]
pub struct Sma {
    ma: MovingAverage,
    seeded: bool,
}

impl Sma {
    pub fn new(window: usize) -> Self {
        Self {
            ma: MovingAverage::new(window),
            seeded: false,
        }
    }
}

impl Indicator for Sma {
    fn calculate(&mut self, series: &TimeSeries) -> f64 {
        self.ma.step();

        let bars = series.len();
        if bars == 0 || self.ma.window == 0 {
            return self.ma.value;
        }

        if !self.seeded && bars == 1 {
            self.ma.value = series.last_candle().close_price;
        } else if self.ma.window > bars - 1 {
            self.ma.value = series.average_close(self.ma.window);
        } else {
            let candles = series.candles();
            let dropped = candles[bars - (self.ma.window + 1)].close_price;
            let close = series.last_candle().close_price;
            self.ma.value += (close - dropped) / self.ma.window as f64;
        }
        self.seeded = true;

        self.ma.value
    }

    fn value(&self) -> f64 {
        self.ma.value
    }

    fn previous(&self) -> f64 {
        self.ma.previous
    }

    fn position(&self) -> usize {
        self.ma.current
    }
}

impl MovingAverageIndicator for Sma {
    fn average(&self) -> &MovingAverage {
        &self.ma
    }
}
