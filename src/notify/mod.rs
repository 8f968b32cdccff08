//! Outbound alerts and the inbound command channel.
//!
//! [`Notifier`] delivers an [`Alert`] and reports whether delivery was
//! confirmed; it never returns an error to the caller. [`CommandChannel`]
//! is the pollable source of operator commands. [`telegram::TelegramClient`]
//! implements both against the Telegram Bot API.

pub mod command;
pub mod format;
pub mod telegram;

use crate::arbitrage::SpreadOpportunity;
use crate::errors::Result;
use crate::models::FundingRecord;
use async_trait::async_trait;
use tracing::info;

/// One row of a batched opportunity alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertLine {
    pub symbol: String,
    /// `"Long - Short"` for pairs, the venue name for single-venue rows.
    pub venue: String,
    pub apr: f64,
    pub price: f64,
    pub net_spread: Option<f64>,
    pub price_spread: Option<f64>,
}

impl AlertLine {
    pub fn from_spread(opp: &SpreadOpportunity) -> Self {
        Self {
            symbol: opp.symbol.clone(),
            venue: format!("{} - {}", opp.long_protocol, opp.short_protocol),
            apr: opp.spread_apr,
            price: opp.long_price,
            net_spread: Some(opp.net_spread),
            price_spread: Some(opp.price_spread),
        }
    }

    pub fn from_record(rec: &FundingRecord) -> Self {
        Self {
            symbol: rec.symbol.clone(),
            venue: rec.protocol.to_string(),
            apr: rec.funding_rate_apr,
            price: rec.price,
            net_spread: None,
            price_spread: None,
        }
    }
}

/// Scan summary sent as heartbeat or on request.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub pair_count: usize,
    pub top_symbol: Option<String>,
    pub top_apr: Option<f64>,
    /// Requested by an operator rather than sent on the hourly schedule.
    pub manual: bool,
}

impl StatusReport {
    /// Summarize a general-policy result list (any order).
    pub fn from_opportunities(opps: &[SpreadOpportunity], manual: bool) -> Self {
        let top = opps
            .iter()
            .max_by(|a, b| a.spread_apr.total_cmp(&b.spread_apr));
        Self {
            pair_count: opps.len(),
            top_symbol: top.map(|o| o.symbol.clone()),
            top_apr: top.map(|o| o.spread_apr),
            manual,
        }
    }
}

/// Reply to a settings command.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsAck {
    pub min_spread_apr: f64,
    pub heartbeat: bool,
    /// `false` when the requested value was invalid and ignored.
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    Opportunities(Vec<AlertLine>),
    Status(StatusReport),
    Settings(SettingsAck),
    /// Connectivity check with no payload.
    Test,
}

/// Alert sink. Returns `true` only when delivery was confirmed.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, alert: &Alert) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateKind {
    Text(String),
    Callback { id: String, data: Option<String> },
    Other,
}

/// One inbound update; ids increase monotonically per bot.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub id: i64,
    pub kind: UpdateKind,
}

/// Pollable operator command source.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Updates with id `>= offset`, or everything pending when `offset` is `None`.
    async fn poll(&self, offset: Option<i64>) -> Result<Vec<Update>>;

    /// Acknowledge an interactive button press.
    async fn acknowledge(&self, callback_id: &str) -> Result<()>;
}

/// Writes alerts to the log. Used when no messaging channel is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, alert: &Alert) -> bool {
        match alert {
            Alert::Opportunities(lines) => {
                for line in lines {
                    info!(
                        symbol = %line.symbol,
                        venue = %line.venue,
                        apr = line.apr,
                        price = line.price,
                        net_spread = ?line.net_spread,
                        "[OPP] alert"
                    );
                }
            }
            Alert::Status(report) => {
                info!(
                    pairs = report.pair_count,
                    top_symbol = ?report.top_symbol,
                    top_apr = ?report.top_apr,
                    manual = report.manual,
                    "[HEARTBEAT] status"
                );
            }
            Alert::Settings(ack) => {
                info!(
                    min_spread_apr = ack.min_spread_apr,
                    heartbeat = ack.heartbeat,
                    accepted = ack.accepted,
                    "[WATCH] settings"
                );
            }
            Alert::Test => info!("[WATCH] notifier test"),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Protocol;

    fn opp(symbol: &str, spread_apr: f64) -> SpreadOpportunity {
        SpreadOpportunity {
            symbol: symbol.to_string(),
            long_protocol: Protocol::Binance,
            long_rate: 0.0,
            long_rate_apr: 0.0,
            long_next_funding: None,
            long_price: 100.0,
            short_protocol: Protocol::Bybit,
            short_rate: 0.0,
            short_rate_apr: spread_apr,
            short_next_funding: None,
            short_price: 101.0,
            spread_apr,
            spread_rate: 0.0,
            price_spread: 1.0,
            price_spread_pct: 1.0,
            net_spread: 1.0,
        }
    }

    #[test]
    fn status_report_picks_highest_apr() {
        let report = StatusReport::from_opportunities(&[opp("AAA", 7.0), opp("BBB", 30.0)], true);
        assert_eq!(report.pair_count, 2);
        assert_eq!(report.top_symbol.as_deref(), Some("BBB"));
        assert_eq!(report.top_apr, Some(30.0));
        assert!(report.manual);
    }

    #[test]
    fn empty_status_report() {
        let report = StatusReport::from_opportunities(&[], false);
        assert_eq!(report.pair_count, 0);
        assert_eq!(report.top_symbol, None);
        assert_eq!(report.top_apr, None);
    }

    #[test]
    fn alert_line_from_spread_uses_venue_pair() {
        let line = AlertLine::from_spread(&opp("ETH", 12.0));
        assert_eq!(line.venue, "Binance - Bybit");
        assert_eq!(line.price, 100.0);
        assert_eq!(line.net_spread, Some(1.0));
    }

    #[tokio::test]
    async fn log_notifier_always_confirms() {
        assert!(LogNotifier.send(&Alert::Test).await);
    }
}
