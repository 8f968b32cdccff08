//! Miscellaneous helper utilities.

use serde::Deserialize;
use tracing_subscriber::{EnvFilter, fmt};

pub const MINUTE_MS: i64 = 60 * 1000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Current wall-clock time in epoch millis.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Next settlement boundary of a fixed `period_hours` schedule at or after `now`.
pub fn next_funding_boundary(now: i64, period_hours: u32) -> i64 {
    let period = i64::from(period_hours.max(1)) * HOUR_MS;
    // ceil for non-negative epochs
    (now + period - 1).div_euclid(period) * period
}

/// Venue-reported settlement time, or the estimated boundary when the venue
/// leaves it out or reports zero.
pub fn settlement_or_estimate(reported: Option<i64>, now: i64, period_hours: u32) -> i64 {
    match reported {
        Some(t) if t > 0 => t,
        _ => next_funding_boundary(now, period_hours),
    }
}

/// Exchange numeric field that may be sent either as a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s.trim().parse().ok()?,
        };
        v.is_finite().then_some(v)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Numeric::Number(n) if n.is_finite() => Some(*n as i64),
            Numeric::Number(_) => None,
            Numeric::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// `Option<Numeric>` → `f64`, `None` when absent or unparsable.
pub fn num(field: &Option<Numeric>) -> Option<f64> {
    field.as_ref().and_then(Numeric::as_f64)
}

/// `Option<Numeric>` → `i64`, `None` when absent or unparsable.
pub fn int(field: &Option<Numeric>) -> Option<i64> {
    field.as_ref().and_then(Numeric::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_rounds_up_to_period() {
        let eight = 8 * HOUR_MS;
        assert_eq!(next_funding_boundary(1, 8), eight);
        assert_eq!(next_funding_boundary(eight, 8), eight);
        assert_eq!(next_funding_boundary(eight + 1, 8), 2 * eight);
        assert_eq!(next_funding_boundary(HOUR_MS + 30 * MINUTE_MS, 1), 2 * HOUR_MS);
    }

    #[test]
    fn reported_settlement_wins_unless_zero() {
        assert_eq!(settlement_or_estimate(Some(42), 10, 8), 42);
        assert_eq!(settlement_or_estimate(Some(0), 10, 8), 8 * HOUR_MS);
        assert_eq!(settlement_or_estimate(None, 10, 1), HOUR_MS);
    }

    #[test]
    fn numeric_accepts_strings_and_numbers() {
        let v: Vec<Numeric> = serde_json::from_str(r#"["0.0001", 12.5, "bad", "1700000000000", 3]"#)
            .expect("json should parse");
        assert_eq!(v[0].as_f64(), Some(0.0001));
        assert_eq!(v[1].as_f64(), Some(12.5));
        assert_eq!(v[2].as_f64(), None);
        assert_eq!(v[3].as_i64(), Some(1_700_000_000_000));
        assert_eq!(v[4].as_i64(), Some(3));
    }
}
