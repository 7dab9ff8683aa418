// src/utils/time.rs
use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

/// Converts an exchange timestamp (milliseconds since epoch) to UTC.
/// Out-of-range values collapse to the epoch.
pub fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

/// Parses a candle interval such as `5m`, `4h` or `1d` into a duration.
pub fn parse_interval(interval: &str) -> Option<Duration> {
    let interval = interval.trim();
    let split = interval.len().checked_sub(1)?;
    if !interval.is_char_boundary(split) {
        return None;
    }
    let (amount, unit) = interval.split_at(split);
    let amount: u64 = amount.parse().ok()?;
    let seconds = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 604_800,
        _ => return None,
    };
    if amount == 0 {
        return None;
    }
    Some(Duration::from_secs(amount.checked_mul(seconds)?))
}
