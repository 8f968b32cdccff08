use crate::errors::Result;
use crate::models::{FundingRecord, Protocol};
use crate::sources::get_json;
use crate::utils::{Numeric, int, num, settlement_or_estimate};
use serde::Deserialize;

const BINANCE_PREMIUM_INDEX: &str = "https://fapi.binance.com/fapi/v1/premiumIndex";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PremiumIndex {
    symbol: String,
    #[serde(default)]
    mark_price: Option<Numeric>,
    #[serde(default)]
    last_funding_rate: Option<Numeric>,
    #[serde(default)]
    next_funding_time: Option<Numeric>,
}

/// Fetch USDⓈ-M perpetual funding from the premium index endpoint.
pub async fn fetch_funding(client: &reqwest::Client, now: i64) -> Result<Vec<FundingRecord>> {
    let body = get_json(client, BINANCE_PREMIUM_INDEX).await?;
    parse_premium_index(&body, now)
}

/// Map a premium index response to records; rows with bad numbers are dropped.
pub fn parse_premium_index(body: &str, now: i64) -> Result<Vec<FundingRecord>> {
    let rows: Vec<PremiumIndex> = serde_json::from_str(body)?;
    let period = Protocol::Binance.funding_period_hours();
    Ok(rows
        .iter()
        .filter_map(|row| {
            let price = num(&row.mark_price)?;
            let rate = num(&row.last_funding_rate)?;
            let next = settlement_or_estimate(int(&row.next_funding_time), now, period);
            FundingRecord::new(&row.symbol, Protocol::Binance, price, rate, period, Some(next), now)
        })
        .collect())
}
