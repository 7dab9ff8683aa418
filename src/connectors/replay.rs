// src/connectors/replay.rs
//! Loader for exchange kline dumps:
//! `[[open_time_ms, "open", "high", "low", "close", "volume", close_time_ms, ...], ...]`.

use crate::error::EngineError;
use crate::types::Candle;
use crate::utils::time::from_millis;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

const KLINE_FIELDS: usize = 7;

pub async fn load_klines(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading replay file {}", path.display()))?;
    Ok(parse_klines(&data)?)
}

pub fn parse_klines(data: &str) -> Result<Vec<Candle>, EngineError> {
    let rows: Vec<Vec<Value>> =
        serde_json::from_str(data).map_err(|e| EngineError::MalformedKline {
            index: 0,
            reason: e.to_string(),
        })?;

    rows.iter()
        .enumerate()
        .map(|(index, row)| parse_row(index, row))
        .collect()
}

fn parse_row(index: usize, row: &[Value]) -> Result<Candle, EngineError> {
    if row.len() < KLINE_FIELDS {
        return Err(EngineError::MalformedKline {
            index,
            reason: format!("expected at least {} fields, got {}", KLINE_FIELDS, row.len()),
        });
    }

    let number = |field: usize, name: &str| -> Result<f64, EngineError> {
        let parsed = match &row[field] {
            Value::String(s) => s.parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        };
        parsed.ok_or_else(|| EngineError::MalformedKline {
            index,
            reason: format!("{} is not a number: {}", name, row[field]),
        })
    };

    Ok(Candle {
        open_time: from_millis(number(0, "open_time")? as i64),
        open_price: number(1, "open")?,
        high: number(2, "high")?,
        low: number(3, "low")?,
        close_price: number(4, "close")?,
        volume: number(5, "volume")?,
        close_time: from_millis(number(6, "close_time")? as i64),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        [1640995200000, "3676.22", "3730.00", "3658.01", "3715.31", "41026.8571", 1641009599999,
         "151591870.75", 118216, "21075.9042", "77886066.10", "0"],
        [1641009600000, 3715.31, 3768.0, 3700.12, 3750.0, 30000.5, 1641023999999]
    ]"#;

    #[test]
    fn parses_string_and_numeric_fields() {
        let candles = parse_klines(SAMPLE).unwrap();
        assert_eq!(candles.len(), 2);

        let first = &candles[0];
        assert_eq!(first.open_time.timestamp_millis(), 1_640_995_200_000);
        assert_eq!(first.close_time.timestamp_millis(), 1_641_009_599_999);
        assert_eq!(first.open_price, 3676.22);
        assert_eq!(first.high, 3730.00);
        assert_eq!(first.low, 3658.01);
        assert_eq!(first.close_price, 3715.31);
        assert_eq!(first.volume, 41026.8571);

        assert_eq!(candles[1].close_price, 3750.0);
    }

    #[test]
    fn short_row_is_rejected() {
        let err = parse_klines(r#"[[1, "1", "1", "1", "1", "1", 2], [1, "2"]]"#).unwrap_err();
        assert!(matches!(err, EngineError::MalformedKline { index: 1, .. }));
    }

    #[test]
    fn bad_number_is_rejected() {
        let err = parse_klines(r#"[[1, "abc", "1", "1", "1", "1", 2]]"#).unwrap_err();
        match err {
            EngineError::MalformedKline { index, reason } => {
                assert_eq!(index, 0);
                assert!(reason.contains("open"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn not_an_array_is_rejected() {
        assert!(parse_klines(r#"{"open": 1}"#).is_err());
    }

    #[tokio::test]
    async fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("klines.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let candles = load_klines(&path).await.unwrap();
        assert_eq!(candles.len(), 2);

        assert!(load_klines(dir.path().join("missing.json")).await.is_err());
    }
}
