use super::types::{ArbitrageConfig, Opportunities, PriceArbOpportunity, SpreadOpportunity};
use crate::models::{FundingRecord, Snapshot};
use crate::symbol::{SymbolPolicy, canonicalize};
use std::collections::BTreeMap;

/// Group records by canonical key, dropping groups with a single venue entry.
pub fn group_by_symbol(
    records: &[FundingRecord],
    policy: SymbolPolicy,
) -> BTreeMap<String, Vec<&FundingRecord>> {
    let mut groups: BTreeMap<String, Vec<&FundingRecord>> = BTreeMap::new();
    for rec in records {
        if let Some(key) = canonicalize(&rec.symbol, policy) {
            groups.entry(key).or_default().push(rec);
        }
    }
    groups.retain(|_, g| g.len() >= 2);
    groups
}

/// `(min, max)` of `group` by `key`; on ties the earlier record is kept.
fn extremes<'a, F>(group: &[&'a FundingRecord], key: F) -> Option<(&'a FundingRecord, &'a FundingRecord)>
where
    F: Fn(&FundingRecord) -> f64,
{
    let (first, rest) = group.split_first()?;
    let (mut lo, mut hi) = (*first, *first);
    for &rec in rest {
        if key(rec) < key(lo) {
            lo = rec;
        }
        if key(rec) > key(hi) {
            hi = rec;
        }
    }
    Some((lo, hi))
}

/// General policy: long the lowest APR, short the highest.
pub fn find_spread_opportunities(
    snapshot: &Snapshot,
    config: &ArbitrageConfig,
) -> Vec<SpreadOpportunity> {
    let floor = config.floor();
    let mut opportunities: Vec<SpreadOpportunity> =
        group_by_symbol(snapshot.records(), SymbolPolicy::General)
            .into_iter()
            .filter_map(|(symbol, group)| {
                let (long, short) = extremes(&group, |r| r.funding_rate_apr)?;
                let spread_apr = short.funding_rate_apr - long.funding_rate_apr;
                if spread_apr <= floor || long.protocol == short.protocol {
                    return None;
                }
                let spread_rate = short.funding_rate - long.funding_rate;
                let price_spread = short.price - long.price;
                let price_spread_pct = price_spread / long.price * 100.0;
                Some(SpreadOpportunity {
                    symbol,
                    long_protocol: long.protocol,
                    long_rate: long.funding_rate,
                    long_rate_apr: long.funding_rate_apr,
                    long_next_funding: long.next_funding_time,
                    long_price: long.price,
                    short_protocol: short.protocol,
                    short_rate: short.funding_rate,
                    short_rate_apr: short.funding_rate_apr,
                    short_next_funding: short.next_funding_time,
                    short_price: short.price,
                    spread_apr,
                    spread_rate,
                    price_spread,
                    price_spread_pct,
                    net_spread: price_spread_pct + spread_rate * 100.0,
                })
            })
            .collect();
    opportunities.sort_by(|a, b| b.spread_apr.total_cmp(&a.spread_apr));
    opportunities
}

/// Price-arb policies: long the cheapest venue, short the dearest. Funding is
/// reported but does not influence leg selection.
pub fn find_price_opportunities(
    snapshot: &Snapshot,
    policy: SymbolPolicy,
) -> Vec<PriceArbOpportunity> {
    let mut opportunities: Vec<PriceArbOpportunity> = group_by_symbol(snapshot.records(), policy)
        .into_iter()
        .filter_map(|(symbol, group)| {
            let (long, short) = extremes(&group, |r| r.price)?;
            if long.protocol == short.protocol {
                return None;
            }
            let price_spread = long.price - short.price;
            Some(PriceArbOpportunity {
                policy,
                symbol,
                long_protocol: long.protocol,
                long_price: long.price,
                long_rate: long.funding_rate,
                long_rate_apr: long.funding_rate_apr,
                short_protocol: short.protocol,
                short_price: short.price,
                short_rate: short.funding_rate,
                short_rate_apr: short.funding_rate_apr,
                price_spread,
                price_spread_pct: price_spread / long.price * 100.0,
                funding_spread_apr: short.funding_rate_apr - long.funding_rate_apr,
            })
        })
        .collect();
    opportunities.sort_by(|a, b| a.price_spread_pct.total_cmp(&b.price_spread_pct));
    opportunities
}

/// Run the detector for `policy`.
pub fn detect(snapshot: &Snapshot, policy: SymbolPolicy, config: &ArbitrageConfig) -> Opportunities {
    match policy {
        SymbolPolicy::General => Opportunities::Spread(find_spread_opportunities(snapshot, config)),
        SymbolPolicy::PreciousMetal | SymbolPolicy::Major => {
            Opportunities::PriceArb(find_price_opportunities(snapshot, policy))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrage::DEFAULT_MIN_SPREAD_APR;
    use crate::models::Protocol;

    /// Per-period rate that annualizes to `apr` percent on an 8h venue.
    fn rate_for_apr(apr: f64) -> f64 {
        apr / 100.0 / (24.0 * 365.0) * 8.0
    }

    fn rec(symbol: &str, protocol: Protocol, price: f64, apr: f64) -> FundingRecord {
        FundingRecord::new(symbol, protocol, price, rate_for_apr(apr), 8, Some(1_000), 0)
            .expect("valid record")
    }

    fn snapshot(records: Vec<FundingRecord>) -> Snapshot {
        Snapshot::from_records(records)
    }

    #[test]
    fn spread_picks_min_and_max_apr() {
        let snap = snapshot(vec![
            rec("BTCUSDT", Protocol::Binance, 60_000.0, 3.0),
            rec("BTC-USD", Protocol::Dydx, 60_100.0, -4.0),
            rec("BTC_USDT", Protocol::Gate, 60_300.0, 12.0),
            rec("BTCUSDT", Protocol::Bybit, 60_200.0, 7.0),
        ]);
        let opps = find_spread_opportunities(&snap, &ArbitrageConfig::default());
        assert_eq!(opps.len(), 1);
        let o = &opps[0];
        assert_eq!(o.symbol, "BTC");
        assert_eq!(o.long_protocol, Protocol::Dydx);
        assert_eq!(o.short_protocol, Protocol::Gate);
        assert!((o.spread_apr - 16.0).abs() < 1e-9);
        assert!((o.price_spread - 200.0).abs() < 1e-9);
        let expected_net = o.price_spread_pct + o.spread_rate * 100.0;
        assert!((o.net_spread - expected_net).abs() < 1e-12);
    }

    #[test]
    fn spread_requires_more_than_threshold() {
        let snap = snapshot(vec![
            rec("ETHUSDT", Protocol::Binance, 3000.0, 1.0),
            rec("ETHUSDT", Protocol::Bybit, 3000.0, 5.5),
            rec("SOLUSDT", Protocol::Binance, 150.0, 1.0),
            rec("SOLUSDT", Protocol::Bybit, 150.0, 7.0),
        ]);
        let opps = find_spread_opportunities(&snap, &ArbitrageConfig::default());
        assert_eq!(opps.len(), 1);
        assert_eq!(opps[0].symbol, "SOL");
        assert!(opps.iter().all(|o| o.spread_apr > 5.0));
    }

    #[test]
    fn spread_equal_to_floor_is_excluded() {
        let eth_long = rec("ETHUSDT", Protocol::Binance, 3000.0, 2.0);
        let eth_short = rec("ETHUSDT", Protocol::Bybit, 3000.0, 10.0);
        // the floor is exactly the ETH spread
        let config = ArbitrageConfig {
            min_spread_apr: eth_short.funding_rate_apr - eth_long.funding_rate_apr,
        };
        assert!(config.floor() > DEFAULT_MIN_SPREAD_APR);
        let snap = snapshot(vec![
            eth_long,
            eth_short,
            rec("SOLUSDT", Protocol::Binance, 150.0, 2.0),
            rec("SOLUSDT", Protocol::Bybit, 150.0, 10.5),
        ]);
        let opps = find_spread_opportunities(&snap, &config);
        assert_eq!(opps.len(), 1);
        assert_eq!(opps[0].symbol, "SOL");
    }

    #[test]
    fn floor_below_default_is_clamped() {
        let snap = snapshot(vec![
            rec("ETHUSDT", Protocol::Binance, 3000.0, 1.0),
            rec("ETHUSDT", Protocol::Bybit, 3000.0, 4.0),
        ]);
        let loose = ArbitrageConfig { min_spread_apr: 2.0 };
        assert_eq!(loose.floor(), DEFAULT_MIN_SPREAD_APR);
        assert!(find_spread_opportunities(&snap, &loose).is_empty());
    }

    #[test]
    fn same_venue_pairs_are_skipped() {
        let snap = snapshot(vec![
            rec("BTCUSDT", Protocol::Binance, 60_000.0, 1.0),
            rec("BTCUSD_PERP", Protocol::Binance, 60_000.0, 30.0),
        ]);
        assert!(find_spread_opportunities(&snap, &ArbitrageConfig::default()).is_empty());
        assert!(find_price_opportunities(&snap, SymbolPolicy::Major).is_empty());
    }

    #[test]
    fn singletons_and_empty_snapshots_yield_nothing() {
        let snap = snapshot(vec![rec("DOGEUSDT", Protocol::Binance, 0.1, 50.0)]);
        assert!(find_spread_opportunities(&snap, &ArbitrageConfig::default()).is_empty());
        let empty = Snapshot::default();
        assert!(detect(&empty, SymbolPolicy::General, &ArbitrageConfig::default()).is_empty());
        assert!(detect(&empty, SymbolPolicy::Major, &ArbitrageConfig::default()).is_empty());
    }

    #[test]
    fn spread_results_sorted_by_apr_descending() {
        let snap = snapshot(vec![
            rec("AAAUSDT", Protocol::Binance, 1.0, 0.0),
            rec("AAAUSDT", Protocol::Bybit, 1.0, 10.0),
            rec("BBBUSDT", Protocol::Binance, 1.0, 0.0),
            rec("BBBUSDT", Protocol::Bybit, 1.0, 40.0),
            rec("CCCUSDT", Protocol::Binance, 1.0, 0.0),
            rec("CCCUSDT", Protocol::Bybit, 1.0, 20.0),
        ]);
        let opps = find_spread_opportunities(&snap, &ArbitrageConfig::default());
        let order: Vec<_> = opps.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(order, vec!["BBB", "CCC", "AAA"]);
    }

    #[test]
    fn ties_keep_first_encountered() {
        let a = rec("XYZUSDT", Protocol::Gate, 10.0, 2.0);
        let b = rec("XYZUSDT", Protocol::Mexc, 10.0, 2.0);
        let c = rec("XYZUSDT", Protocol::Bitget, 10.0, 20.0);
        let group = vec![&a, &b, &c];
        let (lo, hi) = extremes(&group, |r| r.funding_rate_apr).unwrap();
        assert_eq!(lo.protocol, Protocol::Gate);
        assert_eq!(hi.protocol, Protocol::Bitget);
    }

    #[test]
    fn precious_metal_selects_by_price() {
        let snap = snapshot(vec![
            rec("XAUT-USDT", Protocol::BingX, 2350.0, 8.0),
            rec("XAUTUSDT", Protocol::Bybit, 2340.0, 1.0),
            rec("XAUT_USDT", Protocol::Gate, 2361.0, -3.0),
            rec("PAXGUSDT", Protocol::Binance, 2345.0, 2.0),
            rec("PAXG", Protocol::Hyperliquid, 2349.0, 4.0),
            rec("BTCUSDT", Protocol::Binance, 60_000.0, 2.0),
            rec("BTCUSDT", Protocol::Bybit, 61_000.0, 2.0),
        ]);
        let opps = find_price_opportunities(&snap, SymbolPolicy::PreciousMetal);
        assert_eq!(opps.len(), 2);
        // most negative percentage first
        assert_eq!(opps[0].symbol, "XAUT");
        assert_eq!(opps[0].long_protocol, Protocol::Bybit);
        assert_eq!(opps[0].short_protocol, Protocol::Gate);
        assert!((opps[0].price_spread + 21.0).abs() < 1e-9);
        assert!((opps[0].funding_spread_apr + 4.0).abs() < 1e-9);
        assert_eq!(opps[1].symbol, "PAXG");
        assert!(opps[0].price_spread_pct <= opps[1].price_spread_pct);
        assert!(opps.iter().all(|o| o.policy == SymbolPolicy::PreciousMetal));
    }

    #[test]
    fn major_admits_only_exact_assets() {
        let snap = snapshot(vec![
            rec("SOLVUSDT", Protocol::Binance, 0.05, 1.0),
            rec("SOLV-USDT", Protocol::Bybit, 0.06, 1.0),
            rec("BTCUSD0929", Protocol::Bybit, 61_500.0, 1.0),
            rec("ETHUSDT", Protocol::Binance, 3000.0, 1.0),
            rec("ETH", Protocol::Hyperliquid, 3010.0, 9.0),
        ]);
        let opps = find_price_opportunities(&snap, SymbolPolicy::Major);
        assert_eq!(opps.len(), 1);
        assert_eq!(opps[0].symbol, "ETH");
        assert_eq!(opps[0].long_protocol, Protocol::Binance);
        assert_eq!(opps[0].short_protocol, Protocol::Hyperliquid);
        assert!((opps[0].price_spread + 10.0).abs() < 1e-9);
    }

    #[test]
    fn serializes_camel_case_payload_names() {
        let snap = snapshot(vec![
            rec("BTCUSDT", Protocol::Binance, 60_000.0, 3.0),
            rec("BTCUSDT", Protocol::Bybit, 60_300.0, 12.0),
        ]);
        let out = detect(&snap, SymbolPolicy::General, &ArbitrageConfig::default());
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json[0]["longProtocol"], "Binance");
        assert_eq!(json[0]["shortProtocol"], "Bybit");
        assert!(json[0].get("netSpread").is_some());
        assert!(json[0].get("longNextFunding").is_some());
    }
}
