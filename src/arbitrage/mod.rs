pub mod evaluator;
pub mod types;

pub use evaluator::{detect, find_price_opportunities, find_spread_opportunities, group_by_symbol};
pub use types::{
    ArbitrageConfig, DEFAULT_MIN_SPREAD_APR, Opportunities, PriceArbOpportunity, SpreadOpportunity,
};
