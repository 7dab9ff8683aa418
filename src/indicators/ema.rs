// src/indicators/ema.rs
use crate::core::timeseries::TimeSeries;
use crate::indicators::{Indicator, MovingAverage, MovingAverageIndicator};

/// Exponential moving average over closing prices.
///
/// Reports `0.0` until `window` bars are available, seeds with the simple
/// average of those bars, then applies `(close - prev) * 2/(window+1) + prev`.
#[derive(Debug, Clone)]
pub struct Ema {
    ma: MovingAverage,
}

impl Ema {
    pub fn new(window: usize) -> Self {
        Self {
            ma: MovingAverage::new(window),
        }
    }

    fn multiplier(&self) -> f64 {
        2.0 / (self.ma.window as f64 + 1.0)
    }
}

impl Indicator for Ema {
    fn calculate(&mut self, series: &TimeSeries) -> f64 {
        self.ma.step();

        let bars = series.len();
        if self.ma.window > bars {
            self.ma.value = 0.0;
        } else if self.ma.window == bars {
            self.ma.value = series.average_close(self.ma.window);
        } else {
            let close = series.last_candle().close_price;
            let previous = self.ma.previous;
            self.ma.value = (close - previous) * self.multiplier() + previous;
        }

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

impl MovingAverageIndicator for Ema {
    fn average(&self) -> &MovingAverage {
        &self.ma
    }
}
