//! Command-line surface: one-shot queries, notifier checks and the watcher.

use crate::aggregator::{Aggregator, SnapshotSource};
use crate::arbitrage::{ArbitrageConfig, detect, find_spread_opportunities};
use crate::config::AppConfig;
use crate::notify::telegram::TelegramClient;
use crate::notify::{Alert, CommandChannel, LogNotifier, Notifier, StatusReport};
use crate::symbol::SymbolPolicy;
use crate::watch::{WatchEngine, WatchSettings, Watcher};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Funding-rate aggregation and cross-venue arbitrage watcher.
#[derive(Parser, Debug)]
#[command(name = "funding-arb-watcher")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Print every venue's current funding record, highest APR first
    Funding,
    /// Print general funding-spread opportunities
    Arbitrage,
    /// Print precious-metal price dislocations
    Gold,
    /// Print BTC/ETH/SOL price dislocations
    Major,
    /// Send a status report to the notifier
    Status,
    /// Send a connectivity test message
    TestNotify,
    /// Run the watcher until Ctrl-C
    Watch,
}

impl Command {
    fn policy(self) -> Option<SymbolPolicy> {
        match self {
            Command::Arbitrage => Some(SymbolPolicy::General),
            Command::Gold => Some(SymbolPolicy::PreciousMetal),
            Command::Major => Some(SymbolPolicy::Major),
            _ => None,
        }
    }
}

struct Channels {
    notifier: Arc<dyn Notifier>,
    commands: Option<Arc<dyn CommandChannel>>,
}

fn channels(config: &AppConfig) -> Result<Channels> {
    match &config.telegram {
        Some(tg) => {
            let client = Arc::new(
                TelegramClient::new(tg, config.watch.long_poll)
                    .context("building Telegram client")?,
            );
            Ok(Channels {
                notifier: client.clone(),
                commands: Some(client),
            })
        }
        None => {
            info!("[INIT] Telegram not configured; alerts go to the log");
            Ok(Channels {
                notifier: Arc::new(LogNotifier),
                commands: None,
            })
        }
    }
}

fn print_json<T: Serialize>(value: &T, empty: bool) -> Result<()> {
    if empty {
        println!("no data");
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Build a manual status report from a fresh snapshot and deliver it.
async fn send_status(
    source: &dyn SnapshotSource,
    notifier: &dyn Notifier,
    arbitrage: &ArbitrageConfig,
) -> Result<()> {
    let snapshot = source.snapshot().await;
    let opps = find_spread_opportunities(&snapshot, arbitrage);
    let report = StatusReport::from_opportunities(&opps, true);
    if !notifier.send(&Alert::Status(report)).await {
        bail!("status report was not delivered");
    }
    Ok(())
}

async fn send_test(notifier: &dyn Notifier) -> Result<()> {
    if !notifier.send(&Alert::Test).await {
        bail!("test message was not delivered");
    }
    Ok(())
}

pub async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let aggregator = Aggregator::new(config.sources.clone(), config.fetch_timeout)
        .context("building HTTP client")?;

    match cli.command {
        Command::Funding => {
            let snapshot = aggregator.collect().await;
            print_json(&snapshot, snapshot.is_empty())
        }
        cmd @ (Command::Arbitrage | Command::Gold | Command::Major) => {
            let snapshot = aggregator.collect().await;
            let policy = cmd.policy().unwrap_or(SymbolPolicy::General);
            let opportunities = detect(&snapshot, policy, &config.arbitrage);
            print_json(&opportunities, opportunities.is_empty())
        }
        Command::Status => {
            let notifier = channels(&config)?.notifier;
            send_status(&aggregator, notifier.as_ref(), &config.arbitrage).await?;
            println!("status report sent");
            Ok(())
        }
        Command::TestNotify => {
            let notifier = channels(&config)?.notifier;
            send_test(notifier.as_ref()).await?;
            println!("test message sent");
            Ok(())
        }
        Command::Watch => {
            let Channels { notifier, commands } = channels(&config)?;
            let engine = WatchEngine::new(
                Arc::new(aggregator),
                notifier,
                commands,
                config.arbitrage.clone(),
                WatchSettings::from_config(&config.watch),
            );
            let mut watcher = Watcher::new(engine, config.watch.clone());
            watcher.start().await;
            tokio::signal::ctrl_c()
                .await
                .context("waiting for Ctrl-C")?;
            info!("[WATCH] shutdown requested");
            watcher.stop().await;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::StaticSnapshot;
    use crate::models::{FundingRecord, Protocol, Snapshot};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records what it was asked to send and reports `delivers`.
    struct FixedNotifier {
        delivers: bool,
        sent: Mutex<Vec<Alert>>,
    }

    impl FixedNotifier {
        fn new(delivers: bool) -> Self {
            Self {
                delivers,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Notifier for FixedNotifier {
        async fn send(&self, alert: &Alert) -> bool {
            self.sent.lock().unwrap().push(alert.clone());
            self.delivers
        }
    }

    fn btc_snapshot() -> StaticSnapshot {
        let per_8h = |apr: f64| apr / 100.0 / (24.0 * 365.0) * 8.0;
        StaticSnapshot(Snapshot::from_records(vec![
            FundingRecord::new("BTCUSDT", Protocol::Binance, 60_000.0, per_8h(1.0), 8, None, 0).unwrap(),
            FundingRecord::new("BTCUSDT", Protocol::Bybit, 60_000.0, per_8h(20.0), 8, None, 0).unwrap(),
        ]))
    }

    #[tokio::test]
    async fn status_fails_when_not_delivered() {
        let notifier = FixedNotifier::new(false);
        let err = send_status(&btc_snapshot(), &notifier, &ArbitrageConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not delivered"));
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn status_reports_top_pair_as_manual() {
        let notifier = FixedNotifier::new(true);
        send_status(&btc_snapshot(), &notifier, &ArbitrageConfig::default())
            .await
            .unwrap();
        match &notifier.sent.lock().unwrap()[0] {
            Alert::Status(report) => {
                assert!(report.manual);
                assert_eq!(report.pair_count, 1);
                assert_eq!(report.top_symbol.as_deref(), Some("BTC"));
            }
            other => panic!("expected status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_message_fails_when_not_delivered() {
        assert!(send_test(&FixedNotifier::new(false)).await.is_err());
        assert!(send_test(&FixedNotifier::new(true)).await.is_ok());
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["funding-arb-watcher", "test-notify"]).unwrap();
        assert_eq!(cli.command, Command::TestNotify);
        let cli = Cli::try_parse_from(["funding-arb-watcher", "gold"]).unwrap();
        assert_eq!(cli.command.policy(), Some(SymbolPolicy::PreciousMetal));
        assert!(Cli::try_parse_from(["funding-arb-watcher", "trade"]).is_err());
    }
}
