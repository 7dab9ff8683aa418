// src/core/mod.rs
pub mod budget;
pub mod engine;
pub mod position;
pub mod timeseries;
