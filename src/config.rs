// src/config.rs

use crate::error::EngineError;
use crate::types::TradingPair;
use crate::utils::time::parse_interval;
use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Live candles, live execution.
    Live,
    /// Candles from a file, live execution.
    Replay,
    /// Candles from a file, simulated execution.
    #[default]
    Backtest,
}

impl Mode {
    pub fn uses_api(&self) -> bool {
        matches!(self, Mode::Live | Mode::Replay)
    }

    pub fn uses_file(&self) -> bool {
        matches!(self, Mode::Replay | Mode::Backtest)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StrategyConfig {
    pub symbol: String,
    pub symbol_id: String,
    pub interval: String,
    pub base: f64,
    pub alt: f64,
    pub lot: f64,
    pub window_fast: usize,
    pub window_slow: usize,
    pub window_warming: u32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            symbol: "ETHUSDT".to_string(),
            symbol_id: String::new(),
            interval: "4h".to_string(),
            base: 0.2,
            alt: 500.0,
            lot: 0.1,
            window_fast: 20,
            window_slow: 100,
            window_warming: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PullerConfig {
    // Derived from the strategy interval when unset
    pub poll_interval_secs: Option<u64>,
    pub fetch_timeout_secs: Option<u64>,
    pub replay_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BacktestConfig {
    pub idle_timeout_secs: u64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000".to_string(),
            username: String::new(),
            password: String::new(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub mode: Mode,
    pub strategy: StrategyConfig,
    pub puller: PullerConfig,
    pub backtest: BacktestConfig,
    pub api: ApiConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Reads the optional `Settings` file, then `MACHINA__*` environment
    /// variables on top of it (`MACHINA__API__PASSWORD`, ...).
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("Settings").required(false))
            .add_source(Environment::with_prefix("MACHINA").separator("__"));

        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let s = &self.strategy;
        if s.window_fast == 0 || s.window_slow == 0 {
            return Err(invalid("moving average windows must be positive"));
        }
        if s.window_fast >= s.window_slow {
            return Err(invalid(format!(
                "fast window ({}) must be shorter than slow window ({})",
                s.window_fast, s.window_slow
            )));
        }
        if s.lot <= 0.0 {
            return Err(invalid("lot must be positive"));
        }

        let poll = self.poll_interval()?;
        if self.fetch_timeout()? >= poll {
            return Err(invalid("fetch timeout must be shorter than the poll interval"));
        }

        if self.mode.uses_api() && (self.api.username.is_empty() || self.api.password.is_empty()) {
            return Err(invalid("api username and password are required in live and replay modes"));
        }
        if self.mode.uses_file() && self.puller.replay_file.is_none() {
            return Err(invalid("puller.replay_file is required in replay and backtest modes"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Result<Duration, EngineError> {
        if let Some(secs) = self.puller.poll_interval_secs {
            if secs == 0 {
                return Err(invalid("poll interval must be positive"));
            }
            return Ok(Duration::from_secs(secs));
        }
        parse_interval(&self.strategy.interval)
            .ok_or_else(|| invalid(format!("unknown interval {:?}", self.strategy.interval)))
    }

    pub fn fetch_timeout(&self) -> Result<Duration, EngineError> {
        match self.puller.fetch_timeout_secs {
            Some(secs) => Ok(Duration::from_secs(secs)),
            None => {
                let poll = self.poll_interval()?.as_secs();
                Ok(Duration::from_secs(poll.saturating_sub(1).max(1)))
            }
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.backtest.idle_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn trading_pair(&self) -> TradingPair {
        TradingPair {
            symbol: self.strategy.symbol.clone(),
            symbol_id: self.strategy.symbol_id.clone(),
            interval: self.strategy.interval.clone(),
            warming: self.strategy.window_warming,
        }
    }
}

fn invalid(reason: impl Into<String>) -> EngineError {
    EngineError::InvalidConfig(reason.into())
}
