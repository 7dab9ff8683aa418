// src/lib.rs
pub mod config;
pub mod connectors;
pub mod core;
pub mod error;
pub mod indicators;
pub mod pullers;
pub mod strategies;
pub mod telemetry;
pub mod traders;
pub mod types;
pub mod utils;
