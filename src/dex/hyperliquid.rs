use crate::errors::{AppError, Result};
use crate::models::{FundingRecord, Protocol};
use crate::utils::{Numeric, next_funding_boundary, num};
use serde::Deserialize;
use serde_json::json;

const HYPERLIQUID_INFO: &str = "https://api.hyperliquid.xyz/info";

#[derive(Debug, Deserialize)]
struct Meta {
    universe: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetCtx {
    #[serde(default)]
    funding: Option<Numeric>,
    #[serde(default)]
    mark_px: Option<Numeric>,
}

/// Hyperliquid settles hourly, so the reported funding is already the 1h rate.
pub async fn fetch_funding(client: &reqwest::Client, now: i64) -> Result<Vec<FundingRecord>> {
    let resp = client
        .post(HYPERLIQUID_INFO)
        .json(&json!({ "type": "metaAndAssetCtxs" }))
        .send()
        .await?;
    if !resp.status().is_success() {
        return Err(AppError::Api {
            venue: "Hyperliquid",
            message: format!("HTTP {}", resp.status()),
        });
    }
    let body = resp.text().await?;
    parse_meta_and_ctxs(&body, now)
}

/// `[meta, ctxs]` where `ctxs[i]` belongs to `meta.universe[i]`.
pub fn parse_meta_and_ctxs(body: &str, now: i64) -> Result<Vec<FundingRecord>> {
    let (meta, ctxs): (Meta, Vec<AssetCtx>) = serde_json::from_str(body)?;
    let period = Protocol::Hyperliquid.funding_period_hours();
    let next = next_funding_boundary(now, period);
    Ok(meta
        .universe
        .iter()
        .zip(ctxs.iter())
        .filter_map(|(asset, ctx)| {
            FundingRecord::new(
                &asset.name,
                Protocol::Hyperliquid,
                num(&ctx.mark_px)?,
                num(&ctx.funding)?,
                period,
                Some(next),
                now,
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{HOUR_MS, MINUTE_MS};

    #[test]
    fn pairs_universe_with_contexts() {
        let raw = r#"[
            {"universe":[{"name":"BTC","szDecimals":5},{"name":"ETH","szDecimals":4},{"name":"kPEPE","szDecimals":0}]},
            [
                {"funding":"0.0000125","markPx":"60150.0","openInterest":"100"},
                {"funding":"-0.00001","markPx":"3010.2"},
                {"funding":"0.00002","markPx":null}
            ]
        ]"#;
        let now = 3 * HOUR_MS + 20 * MINUTE_MS;
        let recs = parse_meta_and_ctxs(raw, now).expect("json should parse");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].symbol, "BTC");
        assert_eq!(recs[0].funding_rate, recs[0].funding_rate_1h);
        assert!((recs[0].funding_rate_apr - 10.95).abs() < 1e-9);
        assert_eq!(recs[1].next_funding_time, Some(4 * HOUR_MS));
    }
}
