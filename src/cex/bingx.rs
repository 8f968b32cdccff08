use crate::errors::{AppError, Result};
use crate::models::{FundingRecord, Protocol};
use crate::sources::get_json;
use crate::utils::{Numeric, int, num, settlement_or_estimate};
use serde::Deserialize;

const BINGX_PREMIUM_INDEX: &str = "https://open-api.bingx.com/openApi/swap/v2/quote/premiumIndex";

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<PremiumIndex>,
}

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

pub async fn fetch_funding(client: &reqwest::Client, now: i64) -> Result<Vec<FundingRecord>> {
    let body = get_json(client, BINGX_PREMIUM_INDEX).await?;
    parse_premium_index(&body, now)
}

pub fn parse_premium_index(body: &str, now: i64) -> Result<Vec<FundingRecord>> {
    let env: Envelope = serde_json::from_str(body)?;
    if env.code != 0 {
        return Err(AppError::Api {
            venue: "BingX",
            message: format!("code {} {}", env.code, env.msg),
        });
    }
    let period = Protocol::BingX.funding_period_hours();
    Ok(env
        .data
        .iter()
        .filter_map(|row| {
            let next = settlement_or_estimate(int(&row.next_funding_time), now, period);
            FundingRecord::new(
                &row.symbol,
                Protocol::BingX,
                num(&row.mark_price)?,
                num(&row.last_funding_rate)?,
                period,
                Some(next),
                now,
            )
        })
        .collect())
}
