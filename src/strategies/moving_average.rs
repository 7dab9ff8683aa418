// src/strategies/moving_average.rs
use crate::core::timeseries::TimeSeries;
use crate::indicators::{Cross, Ema, Indicator, MovingAverageIndicator};
use crate::strategies::traits::Rule;
use crate::types::{Action, Candle, Side, Signal};
use tracing::debug;

/// Two moving averages and a warming period.
///
/// The slow average gives the trend; the price crossing the fast average
/// opens a position with the trend or closes the one that is held:
///
/// | slow trend | fast cross | signal       |
/// |------------|------------|--------------|
/// | down       | down       | SELL / OPEN  |
/// | down       | up         | SELL / CLOSE |
/// | up         | up         | BUY / OPEN   |
/// | up         | down       | BUY / CLOSE  |
pub struct MovingAverageRule<F = Ema, S = Ema> {
    series: TimeSeries,
    fast: F,
    slow: S,
    warming_period: usize,
}

impl MovingAverageRule {
    pub fn new(fast_window: usize, slow_window: usize, warming_period: usize) -> Self {
        Self::with_indicators(Ema::new(fast_window), Ema::new(slow_window), warming_period)
    }
}

impl<F, S> MovingAverageRule<F, S>
where
    F: MovingAverageIndicator,
    S: MovingAverageIndicator,
{
    pub fn with_indicators(fast: F, slow: S, warming_period: usize) -> Self {
        Self {
            series: TimeSeries::new(),
            fast,
            slow,
            warming_period,
        }
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn fast(&self) -> &F {
        &self.fast
    }

    pub fn slow(&self) -> &S {
        &self.slow
    }

    fn ready(&self) -> bool {
        self.fast.value() != 0.0
            && self.slow.value() != 0.0
            && self.slow.position() >= self.warming_period
    }

    fn condition(&self) -> Signal {
        let cross = self.fast.cross_over(&self.series);

        if self.slow.downtrend() {
            match cross {
                Cross::Down => return Signal::Advice(Side::Sell, Action::Open),
                Cross::Up => return Signal::Advice(Side::Sell, Action::Close),
                Cross::None => {}
            }
        }

        if self.slow.uptrend() {
            match cross {
                Cross::Up => return Signal::Advice(Side::Buy, Action::Open),
                Cross::Down => return Signal::Advice(Side::Buy, Action::Close),
                Cross::None => {}
            }
        }

        Signal::Hold
    }
}

impl<F, S> Rule for MovingAverageRule<F, S>
where
    F: MovingAverageIndicator,
    S: MovingAverageIndicator,
{
    fn name(&self) -> String {
        format!(
            "moving-average[fast: {}, slow: {}, warming: {}]",
            self.fast.average().window,
            self.slow.average().window,
            self.warming_period
        )
    }

    fn assert(&mut self, candle: &Candle) -> Signal {
        // In-progress updates of the last bar never re-trigger evaluation
        if !self.series.is_new(candle) {
            return Signal::Hold;
        }

        self.series.add_candle(candle.clone());
        self.slow.calculate(&self.series);
        self.fast.calculate(&self.series);

        if !self.ready() {
            return Signal::Hold;
        }

        let signal = self.condition();
        if let Signal::Advice(side, action) = signal {
            debug!(
                %side,
                %action,
                fast = self.fast.value(),
                slow = self.slow.value(),
                close = candle.close_price,
                "rule : signal"
            );
        }
        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Sma;
    use crate::utils::time::from_millis;

    fn bar(hour: i64, open: f64, close: f64) -> Candle {
        Candle {
            symbol: "ETHUSDT".into(),
            interval: "1h".into(),
            open_time: from_millis(hour * 3_600_000),
            close_time: from_millis((hour + 1) * 3_600_000 - 1),
            open_price: open,
            close_price: close,
            low: open.min(close),
            high: open.max(close),
            volume: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn holds_until_indicators_are_warm() {
        let mut rule = MovingAverageRule::new(2, 3, 3);
        assert_eq!(rule.assert(&bar(0, 10.0, 10.0)), Signal::Hold);
        assert_eq!(rule.assert(&bar(1, 10.0, 11.0)), Signal::Hold);
        assert_eq!(rule.fast().value(), 10.5);
        assert_eq!(rule.slow().value(), 0.0);
    }

    #[test]
    fn warming_period_gates_signals() {
        let mut rule = MovingAverageRule::new(2, 3, 4);
        rule.assert(&bar(0, 10.0, 10.0));
        rule.assert(&bar(1, 10.0, 11.0));
        // would be a BUY / OPEN with a warming period of 3
        assert_eq!(rule.assert(&bar(2, 11.0, 12.0)), Signal::Hold);

        let mut eager = MovingAverageRule::new(2, 3, 3);
        eager.assert(&bar(0, 10.0, 10.0));
        eager.assert(&bar(1, 10.0, 11.0));
        assert_eq!(
            eager.assert(&bar(2, 11.0, 12.0)),
            Signal::Advice(Side::Buy, Action::Open)
        );
    }

    #[test]
    fn uptrend_opens_and_closes_buy() {
        let mut rule = MovingAverageRule::new(2, 3, 4);
        rule.assert(&bar(0, 10.0, 10.0));
        rule.assert(&bar(1, 10.0, 11.0));
        rule.assert(&bar(2, 11.0, 12.0));

        // slow 12.0 (up from 11.0), fast 12.5 inside the green body
        assert_eq!(
            rule.assert(&bar(3, 12.0, 13.0)),
            Signal::Advice(Side::Buy, Action::Open)
        );
        // slow 12.2 still rising, fast 12.43 inside the red body
        assert_eq!(
            rule.assert(&bar(4, 14.0, 12.4)),
            Signal::Advice(Side::Buy, Action::Close)
        );
    }

    #[test]
    fn downtrend_opens_and_closes_sell() {
        let mut rule = MovingAverageRule::new(2, 3, 4);
        rule.assert(&bar(0, 12.0, 12.0));
        rule.assert(&bar(1, 12.0, 11.0));
        rule.assert(&bar(2, 11.0, 10.0));

        // slow 10.0 (down from 11.0), fast 9.5 inside the red body
        assert_eq!(
            rule.assert(&bar(3, 10.0, 9.0)),
            Signal::Advice(Side::Sell, Action::Open)
        );
        // slow 9.9 still falling, fast 9.7 inside the green body
        assert_eq!(
            rule.assert(&bar(4, 9.0, 9.8)),
            Signal::Advice(Side::Sell, Action::Close)
        );
    }

    #[test]
    fn duplicate_bar_is_ignored() {
        let mut rule = MovingAverageRule::new(2, 3, 4);
        rule.assert(&bar(0, 10.0, 10.0));
        rule.assert(&bar(1, 10.0, 11.0));
        rule.assert(&bar(2, 11.0, 12.0));
        assert_eq!(
            rule.assert(&bar(3, 12.0, 13.0)),
            Signal::Advice(Side::Buy, Action::Open)
        );

        assert_eq!(rule.assert(&bar(3, 12.0, 13.0)), Signal::Hold);
        assert_eq!(rule.series().len(), 4);
        assert_eq!(rule.slow().position(), 4);
        assert_eq!(rule.fast().position(), 4);
    }

    #[test]
    fn no_cross_holds() {
        let mut rule = MovingAverageRule::new(2, 3, 3);
        rule.assert(&bar(0, 10.0, 10.0));
        rule.assert(&bar(1, 10.0, 11.0));
        // fast 11.03 sits below the whole candle body
        assert_eq!(rule.assert(&bar(2, 11.2, 11.3)), Signal::Hold);
    }

    #[test]
    fn works_with_simple_averages() {
        let mut rule = MovingAverageRule::with_indicators(Sma::new(2), Sma::new(3), 1);
        assert_eq!(rule.name(), "moving-average[fast: 2, slow: 3, warming: 1]");
        // sma seeds on the first bar; a doji never crosses
        assert_eq!(rule.assert(&bar(0, 10.0, 10.0)), Signal::Hold);
        // slow avg(10, 12) = 11 rising, fast avg(10, 12) = 11 inside 10..12
        assert_eq!(
            rule.assert(&bar(1, 10.0, 12.0)),
            Signal::Advice(Side::Buy, Action::Open)
        );
    }
}
