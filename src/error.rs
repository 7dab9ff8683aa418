// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not enough in fund. In fund: B[{base}] T[{alt}]")]
    InsufficientFunds { base: f64, alt: f64 },

    #[error("can't close a position that is already closed")]
    PositionAlreadyClosed,

    #[error("wrong orders.len, need {expected} but got {got}")]
    UnexpectedOrderCount { expected: usize, got: usize },

    #[error("rule was lost by a previous run")]
    RuleUnavailable,

    #[error("status code [{0}] out of range, expecting 200 <= status code <= 299")]
    UnexpectedStatus(u16),

    #[error("malformed kline at index {index}: {reason}")]
    MalformedKline { index: usize, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
