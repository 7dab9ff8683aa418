// src/strategies/mod.rs
pub mod moving_average;
pub mod traits;

pub use moving_average::MovingAverageRule;
pub use traits::Rule;
