// src/strategies/traits.rs
use crate::types::{Candle, Signal};

/// Decides when to open or close a position.
pub trait Rule: Send {
    fn name(&self) -> String;

    // Feed a candle; returns Signal::Hold unless a position should change
    fn assert(&mut self, candle: &Candle) -> Signal;
}
