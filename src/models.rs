//! Shared data structures used throughout the application.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hours in the 365-day year used for annualizing hourly funding.
pub const HOURS_PER_YEAR: f64 = 24.0 * 365.0;

/// Venue a funding record was sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "dYdX")]
    Dydx,
    Hyperliquid,
    Binance,
    Bybit,
    #[serde(rename = "MEXC")]
    Mexc,
    Gate,
    #[serde(rename = "BingX")]
    BingX,
    Bitget,
}

impl Protocol {
    pub fn name(self) -> &'static str {
        match self {
            Protocol::Dydx => "dYdX",
            Protocol::Hyperliquid => "Hyperliquid",
            Protocol::Binance => "Binance",
            Protocol::Bybit => "Bybit",
            Protocol::Mexc => "MEXC",
            Protocol::Gate => "Gate",
            Protocol::BingX => "BingX",
            Protocol::Bitget => "Bitget",
        }
    }

    /// Native settlement period in hours when the venue does not report one.
    pub fn funding_period_hours(self) -> u32 {
        match self {
            Protocol::Dydx | Protocol::Hyperliquid => 1,
            _ => 8,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One venue's current funding state for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRecord {
    pub symbol: String,
    pub protocol: Protocol,
    pub price: f64,
    /// Raw rate for one settlement period of the venue.
    pub funding_rate: f64,
    pub funding_rate_1h: f64,
    pub funding_rate_apr: f64,
    /// Epoch millis of the next settlement, `None` when unknown.
    pub next_funding_time: Option<i64>,
    pub timestamp: i64,
}

impl FundingRecord {
    /// Build a record from a raw per-period rate, deriving the hourly and
    /// annualized rates.
    ///
    /// Returns `None` for a non-positive price, a zero period, or any
    /// non-finite input.
    pub fn new(
        symbol: impl Into<String>,
        protocol: Protocol,
        price: f64,
        funding_rate: f64,
        period_hours: u32,
        next_funding_time: Option<i64>,
        timestamp: i64,
    ) -> Option<Self> {
        if !price.is_finite() || price <= 0.0 || !funding_rate.is_finite() || period_hours == 0 {
            return None;
        }
        let funding_rate_1h = funding_rate / f64::from(period_hours);
        Some(Self {
            symbol: symbol.into(),
            protocol,
            price,
            funding_rate,
            funding_rate_1h,
            funding_rate_apr: annualize_hourly(funding_rate_1h),
            next_funding_time: next_funding_time.filter(|t| *t > 0),
            timestamp,
        })
    }
}

/// Hourly rate → annual percentage.
pub fn annualize_hourly(rate_1h: f64) -> f64 {
    rate_1h * HOURS_PER_YEAR * 100.0
}

/// All records gathered in one aggregation pass, highest APR first.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    records: Vec<FundingRecord>,
}

impl Snapshot {
    pub fn from_records(mut records: Vec<FundingRecord>) -> Self {
        records.sort_by(|a, b| b.funding_rate_apr.total_cmp(&a.funding_rate_apr));
        Self { records }
    }

    pub fn records(&self) -> &[FundingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apr_is_derived_from_hourly_rate() {
        let eight_hour = FundingRecord::new("BTCUSDT", Protocol::Binance, 60_000.0, 0.0001, 8, None, 0)
            .expect("valid record");
        let hourly =
            FundingRecord::new("BTC", Protocol::Hyperliquid, 60_000.0, 0.0000125, 1, None, 0)
                .expect("valid record");

        for rec in [&eight_hour, &hourly] {
            let expected = rec.funding_rate_1h * 24.0 * 365.0 * 100.0;
            assert!((rec.funding_rate_apr - expected).abs() < 1e-9);
        }
        // 0.01% per 8h == 10.95% APR on either venue
        assert!((eight_hour.funding_rate_apr - 10.95).abs() < 1e-9);
        assert!((hourly.funding_rate_apr - 10.95).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_prices_and_rates() {
        assert!(FundingRecord::new("X", Protocol::Gate, 0.0, 0.001, 8, None, 0).is_none());
        assert!(FundingRecord::new("X", Protocol::Gate, -1.0, 0.001, 8, None, 0).is_none());
        assert!(FundingRecord::new("X", Protocol::Gate, f64::NAN, 0.001, 8, None, 0).is_none());
        assert!(FundingRecord::new("X", Protocol::Gate, 1.0, f64::INFINITY, 8, None, 0).is_none());
        assert!(FundingRecord::new("X", Protocol::Gate, 1.0, 0.001, 0, None, 0).is_none());
    }

    #[test]
    fn zero_next_funding_time_means_unknown() {
        let rec = FundingRecord::new("X", Protocol::Bybit, 1.0, 0.001, 8, Some(0), 0).unwrap();
        assert_eq!(rec.next_funding_time, None);
    }

    #[test]
    fn snapshot_sorts_by_apr_descending() {
        let recs = vec![
            FundingRecord::new("A", Protocol::Binance, 1.0, 0.0001, 8, None, 0).unwrap(),
            FundingRecord::new("B", Protocol::Binance, 1.0, 0.0010, 8, None, 0).unwrap(),
            FundingRecord::new("C", Protocol::Binance, 1.0, -0.0005, 8, None, 0).unwrap(),
        ];
        let snap = Snapshot::from_records(recs);
        let order: Vec<_> = snap.records().iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }

    #[test]
    fn record_serializes_camel_case() {
        let rec = FundingRecord::new("ETH-USD", Protocol::Dydx, 3000.0, 0.00001, 1, Some(5), 7)
            .unwrap();
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["protocol"], "dYdX");
        assert!(json.get("fundingRate1h").is_some());
        assert!(json.get("fundingRateApr").is_some());
        assert_eq!(json["nextFundingTime"], 5);
    }
}
