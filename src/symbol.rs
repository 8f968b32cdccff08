//! Venue symbol → canonical base-asset key.

use serde::Serialize;

/// Which universe of symbols a detector pass considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolPolicy {
    /// Any asset; tolerant of quote suffixes and rebased `1000x` tokens.
    General,
    /// Gold-linked contracts only.
    PreciousMetal,
    /// Exactly BTC, ETH or SOL.
    Major,
}

const GENERAL_SUFFIXES: [&str; 3] = ["PERP", "USDT", "USD"];
const QUANTITY_PREFIXES: [&str; 2] = ["1000", "100"];
const PRECIOUS_KEYWORDS: [&str; 3] = ["XAU", "GOLD", "PAXG"];
// First match wins.
const MAJOR_SUFFIXES: [&str; 5] = ["PERP", "USDT", "USDC", "USD", "BUSD"];
const MAJOR_ASSETS: [&str; 3] = ["BTC", "ETH", "SOL"];

/// Canonical key for `raw` under `policy`, or `None` if the symbol is outside
/// the policy's universe.
pub fn canonicalize(raw: &str, policy: SymbolPolicy) -> Option<String> {
    let base = strip_separators(raw);
    match policy {
        SymbolPolicy::General => general(base),
        SymbolPolicy::PreciousMetal => precious_metal(base),
        SymbolPolicy::Major => major(base),
    }
}

fn strip_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '-' | '_' | '/'))
        .collect::<String>()
        .to_uppercase()
}

fn strip_suffixes<'a>(mut s: &'a str, suffixes: &[&str]) -> &'a str {
    for suffix in suffixes {
        if let Some(rest) = s.strip_suffix(suffix) {
            s = rest;
        }
    }
    s
}

fn general(mut key: String) -> Option<String> {
    // Repeat until stable so the result is a fixed point.
    loop {
        let stripped = strip_suffixes(&key, &GENERAL_SUFFIXES);
        if stripped.len() < 2 {
            return None;
        }
        let mut next = stripped;
        for prefix in QUANTITY_PREFIXES {
            if let Some(rest) = next.strip_prefix(prefix) {
                next = rest;
            }
        }
        if next.len() < 2 {
            return None;
        }
        if next == key {
            return Some(key);
        }
        key = next.to_string();
    }
}

fn precious_metal(key: String) -> Option<String> {
    if !PRECIOUS_KEYWORDS.iter().any(|k| key.contains(k)) {
        return None;
    }
    Some(strip_suffixes(&key, &GENERAL_SUFFIXES).to_string())
}

fn major(key: String) -> Option<String> {
    let base = MAJOR_SUFFIXES
        .iter()
        .find_map(|suffix| key.strip_suffix(suffix))
        .unwrap_or(key.as_str());
    MAJOR_ASSETS.contains(&base).then(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VENUE_SYMBOLS: &[&str] = &[
        "BTCUSDT",
        "BTC-USD",
        "BTC_USDT",
        "BTC",
        "1000PEPEUSDT",
        "kPEPE",
        "ETH-USD-PERP",
        "ETHPERP",
        "100BONK_USDT",
        "SOL/USDT",
        "XAUT-USDT",
        "PAXGUSDT",
        "BTCUSD0929",
        "A",
        "USDT",
        "XUSDUSD",
        "100100AB",
    ];

    #[test]
    fn general_strips_suffixes_and_quantity_prefixes() {
        let g = |s| canonicalize(s, SymbolPolicy::General);
        assert_eq!(g("BTCUSDT").as_deref(), Some("BTC"));
        assert_eq!(g("BTC-USD").as_deref(), Some("BTC"));
        assert_eq!(g("btc_usdt").as_deref(), Some("BTC"));
        assert_eq!(g("ETH-USD-PERP").as_deref(), Some("ETH"));
        assert_eq!(g("1000PEPEUSDT").as_deref(), Some("PEPE"));
        assert_eq!(g("100BONK_USDT").as_deref(), Some("BONK"));
        assert_eq!(g("KPEPE").as_deref(), Some("KPEPE"));
        assert_eq!(g("XUSDT"), None);
        assert_eq!(g("USDT"), None);
    }

    #[test]
    fn general_is_idempotent() {
        for raw in VENUE_SYMBOLS {
            if let Some(once) = canonicalize(raw, SymbolPolicy::General) {
                assert_eq!(
                    canonicalize(&once, SymbolPolicy::General).as_deref(),
                    Some(once.as_str()),
                    "not a fixed point for {raw}"
                );
            }
        }
    }

    #[test]
    fn precious_metal_requires_keyword() {
        let p = |s| canonicalize(s, SymbolPolicy::PreciousMetal);
        assert_eq!(p("XAUT-USDT").as_deref(), Some("XAUT"));
        assert_eq!(p("PAXGUSDT").as_deref(), Some("PAXG"));
        assert_eq!(p("GOLD-PERP").as_deref(), Some("GOLD"));
        assert_eq!(p("XAUUSD").as_deref(), Some("XAU"));
        assert_eq!(p("BTCUSDT"), None);
    }

    #[test]
    fn major_requires_exact_match() {
        let m = |s| canonicalize(s, SymbolPolicy::Major);
        assert_eq!(m("ETHUSDT").as_deref(), Some("ETH"));
        assert_eq!(m("BTC-USD").as_deref(), Some("BTC"));
        assert_eq!(m("SOL").as_deref(), Some("SOL"));
        assert_eq!(m("sol_usdc").as_deref(), Some("SOL"));
        assert_eq!(m("SOLVUSDT"), None);
        assert_eq!(m("BTCUSD0929"), None);
        assert_eq!(m("BTCDOMUSDT"), None);
    }

    #[test]
    fn major_strips_only_one_suffix() {
        // PERP removed, then USD is left in place
        assert_eq!(canonicalize("BTCUSDPERP", SymbolPolicy::Major), None);
    }
}
