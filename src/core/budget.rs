// src/core/budget.rs
use crate::error::EngineError;
use crate::types::{Candle, PositionStatus, Side};
use std::fmt;

/// Capital granted to a strategy. Opening and closing positions move funds
/// between the base coin (ETH, BTC) and the alt coin (USDT, BUSD); once
/// either side runs dry the strategy can no longer trade.
pub trait Budget: Send + Sync + fmt::Display {
    /// Books the opening of a position and returns the quantity to order.
    fn open(&mut self, side: Side, candle: &Candle) -> Result<f64, EngineError>;

    /// Books the closing of a position. The returned lot is informational;
    /// the closing order mirrors the opening order's quantity.
    fn close(
        &mut self,
        side: Side,
        status: PositionStatus,
        candle: &Candle,
    ) -> Result<f64, EngineError>;
}

/// Trades a fixed `lot` of the base coin per position.
///
/// Balances are adjusted before the funds check runs, so a failing call
/// still leaves the ledger moved.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedBudget {
    pub base: f64,
    pub alt: f64,
    pub lot: f64,
}

const MIN_BASE: f64 = 0.001;
const MIN_ALT: f64 = 1.0;

impl FixedBudget {
    pub fn new(base: f64, alt: f64, lot: f64) -> Self {
        Self { base, alt, lot }
    }

    fn empty(&self) -> bool {
        self.base <= MIN_BASE || self.alt <= MIN_ALT
    }

    fn check(&self) -> Result<f64, EngineError> {
        if self.empty() {
            return Err(EngineError::InsufficientFunds {
                base: self.base,
                alt: self.alt,
            });
        }
        Ok(self.lot)
    }

    fn sell_base(&mut self, price: f64) {
        self.base -= self.lot;
        self.alt += self.lot * price;
    }

    fn buy_base(&mut self, price: f64) {
        self.base += self.lot;
        self.alt -= self.lot * price;
    }
}

impl Budget for FixedBudget {
    fn open(&mut self, side: Side, candle: &Candle) -> Result<f64, EngineError> {
        match side {
            Side::Sell => self.sell_base(candle.close_price),
            Side::Buy => self.buy_base(candle.close_price),
        }
        self.check()
    }

    fn close(
        &mut self,
        side: Side,
        status: PositionStatus,
        candle: &Candle,
    ) -> Result<f64, EngineError> {
        if status == PositionStatus::Closed {
            return Err(EngineError::PositionAlreadyClosed);
        }
        match side {
            Side::Sell => self.buy_base(candle.close_price),
            Side::Buy => self.sell_base(candle.close_price),
        }
        self.check()
    }
}

impl fmt::Display for FixedBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[lot: {:.6}, base: {:.6}, alt: {:.6}]",
            self.lot, self.base, self.alt
        )
    }
}
