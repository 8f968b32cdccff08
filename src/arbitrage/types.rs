use crate::models::Protocol;
use crate::symbol::SymbolPolicy;
use serde::Serialize;

/// Minimum APR spread for the general policy, in percentage points.
pub const DEFAULT_MIN_SPREAD_APR: f64 = 5.0;

/// Configuration for arbitrage calculations
#[derive(Debug, Clone)]
pub struct ArbitrageConfig {
    /// General-policy pairs must have `spread_apr` strictly above this.
    /// Raising it narrows results; values below [`DEFAULT_MIN_SPREAD_APR`]
    /// are ignored.
    pub min_spread_apr: f64,
}

impl ArbitrageConfig {
    /// Effective general-policy floor, never below [`DEFAULT_MIN_SPREAD_APR`].
    pub fn floor(&self) -> f64 {
        self.min_spread_apr.max(DEFAULT_MIN_SPREAD_APR)
    }
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            min_spread_apr: DEFAULT_MIN_SPREAD_APR,
        }
    }
}

/// Funding-rate spread between the lowest-APR (long) and highest-APR (short)
/// venue for one asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadOpportunity {
    pub symbol: String,
    pub long_protocol: Protocol,
    pub long_rate: f64,
    pub long_rate_apr: f64,
    pub long_next_funding: Option<i64>,
    pub long_price: f64,
    pub short_protocol: Protocol,
    pub short_rate: f64,
    pub short_rate_apr: f64,
    pub short_next_funding: Option<i64>,
    pub short_price: f64,
    pub spread_apr: f64,
    /// Raw per-period rate difference.
    pub spread_rate: f64,
    pub price_spread: f64,
    pub price_spread_pct: f64,
    /// `price_spread_pct + spread_rate * 100`. Mixes a percentage with a
    /// per-period rate; kept as-is for payload compatibility.
    pub net_spread: f64,
}

/// Price dislocation between the cheapest (long) and dearest (short) venue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceArbOpportunity {
    pub policy: SymbolPolicy,
    pub symbol: String,
    pub long_protocol: Protocol,
    pub long_price: f64,
    pub long_rate: f64,
    pub long_rate_apr: f64,
    pub short_protocol: Protocol,
    pub short_price: f64,
    pub short_rate: f64,
    pub short_rate_apr: f64,
    /// `long_price - short_price`; negative means buy-low/sell-high is open.
    pub price_spread: f64,
    pub price_spread_pct: f64,
    pub funding_spread_apr: f64,
}

/// Detector output for one policy.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Opportunities {
    Spread(Vec<SpreadOpportunity>),
    PriceArb(Vec<PriceArbOpportunity>),
}

impl Opportunities {
    pub fn len(&self) -> usize {
        match self {
            Opportunities::Spread(v) => v.len(),
            Opportunities::PriceArb(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
