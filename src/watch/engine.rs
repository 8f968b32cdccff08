//! One evaluation step of each watcher concern.
//!
//! [`WatchEngine`] holds no timers; the runner decides when each step fires.
//! Snapshots are fetched before the state lock is taken, every state
//! mutation happens under it, and no notifier call is made while it is held.

use super::state::{WatchSettings, WatchState};
use crate::aggregator::SnapshotSource;
use crate::arbitrage::{ArbitrageConfig, SpreadOpportunity, find_spread_opportunities};
use crate::notify::command::{WatchCommand, parse_command};
use crate::notify::{
    Alert, AlertLine, CommandChannel, Notifier, SettingsAck, StatusReport, Update, UpdateKind,
};
use crate::errors::Result;
use crate::utils::{HOUR_MS, MINUTE_MS};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Both legs must settle within this of each other.
pub const SYNC_TOLERANCE_MS: i64 = 5 * MINUTE_MS;
/// Alert only when the nearer settlement is this close.
pub const SETTLEMENT_WINDOW_MS: i64 = 20 * MINUTE_MS;
pub const DEBOUNCE_MS: i64 = HOUR_MS;
pub const HEARTBEAT_INTERVAL_MS: i64 = HOUR_MS;
/// Single-venue records above this APR feed the high-yield alert.
pub const HIGH_YIELD_APR: f64 = 20.0;
pub const HIGH_YIELD_COOLDOWN_MS: i64 = HOUR_MS;

/// Both settlement times are known and within [`SYNC_TOLERANCE_MS`].
pub fn is_synced(opp: &SpreadOpportunity) -> bool {
    match (opp.long_next_funding, opp.short_next_funding) {
        (Some(long), Some(short)) => (long - short).abs() < SYNC_TOLERANCE_MS,
        _ => false,
    }
}

/// Time until the nearer known settlement; `None` when neither is known.
pub fn time_to_settlement(opp: &SpreadOpportunity, now: i64) -> Option<i64> {
    [opp.long_next_funding, opp.short_next_funding]
        .into_iter()
        .flatten()
        .map(|t| t - now)
        .min()
}

pub fn is_eligible(opp: &SpreadOpportunity, now: i64, threshold: f64) -> bool {
    let near = matches!(
        time_to_settlement(opp, now),
        Some(t) if t > 0 && t < SETTLEMENT_WINDOW_MS
    );
    is_synced(opp) && near && opp.spread_apr >= threshold
}

/// What one evaluation pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassOutcome {
    pub opportunities: usize,
    /// Symbols whose alert was confirmed delivered.
    pub alerted: Vec<String>,
    pub heartbeat_sent: bool,
}

#[derive(Clone)]
pub struct WatchEngine {
    source: Arc<dyn SnapshotSource>,
    notifier: Arc<dyn Notifier>,
    commands: Option<Arc<dyn CommandChannel>>,
    arbitrage: ArbitrageConfig,
    state: Arc<Mutex<WatchState>>,
}

impl WatchEngine {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        notifier: Arc<dyn Notifier>,
        commands: Option<Arc<dyn CommandChannel>>,
        arbitrage: ArbitrageConfig,
        settings: WatchSettings,
    ) -> Self {
        Self {
            source,
            notifier,
            commands,
            arbitrage,
            state: Arc::new(Mutex::new(WatchState::new(settings))),
        }
    }

    pub fn has_command_channel(&self) -> bool {
        self.commands.is_some()
    }

    pub async fn settings(&self) -> WatchSettings {
        self.state.lock().await.settings.clone()
    }

    /// Drop run state (debounce map, clocks, cursor) and keep settings.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = state.restarted();
    }

    #[cfg(test)]
    async fn state(&self) -> WatchState {
        self.state.lock().await.clone()
    }

    async fn opportunities(&self) -> Vec<SpreadOpportunity> {
        let snapshot = self.source.snapshot().await;
        find_spread_opportunities(&snapshot, &self.arbitrage)
    }

    /// Evaluation pass: heartbeat check, then debounced alerting on
    /// opportunities that are synced and close to settlement.
    ///
    /// Decisions are taken under the state lock; sends happen after it is
    /// released so command polling is never blocked on delivery.
    pub async fn run_pass(&self, now: i64) -> PassOutcome {
        let opps = self.opportunities().await;
        let mut outcome = PassOutcome {
            opportunities: opps.len(),
            ..PassOutcome::default()
        };

        let (heartbeat_due, due) = {
            let mut state = self.state.lock().await;
            let heartbeat_due =
                state.settings.heartbeat && now - state.last_heartbeat > HEARTBEAT_INTERVAL_MS;
            if heartbeat_due {
                // advances on every attempt so a failing channel is not retried each pass
                state.last_heartbeat = now;
            }
            let threshold = state.settings.min_spread_apr;
            let due: Vec<&SpreadOpportunity> = opps
                .iter()
                .filter(|o| is_eligible(o, now, threshold))
                .filter(|o| {
                    state
                        .last_notified
                        .get(&o.symbol)
                        .is_none_or(|&at| now - at >= DEBOUNCE_MS)
                })
                .collect();
            (heartbeat_due, due)
        };

        if heartbeat_due {
            let report = StatusReport::from_opportunities(&opps, false);
            outcome.heartbeat_sent = self.notifier.send(&Alert::Status(report)).await;
            info!(delivered = outcome.heartbeat_sent, "[HEARTBEAT] sent");
        }

        if due.is_empty() {
            debug!(opportunities = opps.len(), "[WATCH] nothing to alert");
            return outcome;
        }

        let lines = due.iter().map(|o| AlertLine::from_spread(o)).collect();
        if self.notifier.send(&Alert::Opportunities(lines)).await {
            let mut state = self.state.lock().await;
            for opp in &due {
                state.last_notified.insert(opp.symbol.clone(), now);
                outcome.alerted.push(opp.symbol.clone());
            }
            info!(symbols = ?outcome.alerted, "[WATCH] opportunity alert delivered");
        } else {
            warn!(count = due.len(), "[WATCH] opportunity alert not delivered; will retry");
        }
        outcome
    }

    /// Send a status report from a fresh snapshot. Leaves the heartbeat
    /// clock alone.
    pub async fn status_report(&self, manual: bool) -> bool {
        let opps = self.opportunities().await;
        let report = StatusReport::from_opportunities(&opps, manual);
        self.notifier.send(&Alert::Status(report)).await
    }

    /// Poll the command channel once and act on every update in the batch.
    /// Returns how many updates were received.
    pub async fn poll_commands(&self) -> Result<usize> {
        let Some(channel) = &self.commands else {
            return Ok(0);
        };
        let offset = self.state.lock().await.next_offset();
        let updates = channel.poll(offset).await?;
        if updates.is_empty() {
            return Ok(0);
        }
        {
            let mut state = self.state.lock().await;
            let max_id = updates.iter().map(|u| u.id).max();
            state.last_update_id = state.last_update_id.max(max_id);
        }
        for update in &updates {
            self.handle_update(channel.as_ref(), update).await;
        }
        Ok(updates.len())
    }

    async fn handle_update(&self, channel: &dyn CommandChannel, update: &Update) {
        let text = match &update.kind {
            UpdateKind::Text(text) => text.as_str(),
            UpdateKind::Callback { id, data } => {
                if let Err(e) = channel.acknowledge(id).await {
                    warn!(update_id = update.id, error = %e, "[TG] callback ack failed");
                }
                match data {
                    Some(data) => data.as_str(),
                    None => return,
                }
            }
            UpdateKind::Other => return,
        };

        match parse_command(text) {
            Ok(WatchCommand::Status) => {
                // operator-requested reports are tagged manual and leave the
                // heartbeat schedule alone; only the periodic pass moves it
                info!(update_id = update.id, "[TG] status requested");
                if !self.status_report(true).await {
                    warn!("[TG] status report not delivered");
                }
            }
            Ok(WatchCommand::SetThreshold(value)) => {
                let ack = {
                    let mut state = self.state.lock().await;
                    let accepted = state.settings.apply_threshold(value);
                    settings_ack(&state.settings, accepted)
                };
                info!(value, accepted = ack.accepted, "[TG] threshold command");
                self.notifier.send(&Alert::Settings(ack)).await;
            }
            Ok(WatchCommand::SetHeartbeat(enabled)) => {
                let ack = {
                    let mut state = self.state.lock().await;
                    state.settings.heartbeat = enabled;
                    settings_ack(&state.settings, true)
                };
                info!(enabled, "[TG] heartbeat command");
                self.notifier.send(&Alert::Settings(ack)).await;
            }
            Err(e) if e.is_invalid_argument() => {
                let ack = settings_ack(&self.state.lock().await.settings, false);
                info!(error = %e, "[TG] rejected command argument");
                self.notifier.send(&Alert::Settings(ack)).await;
            }
            Err(e) => debug!(update_id = update.id, error = %e, "[TG] ignoring update"),
        }
    }

    /// High-yield watch: one batched alert of every record above
    /// [`HIGH_YIELD_APR`], at most once per cooldown. Returns whether an
    /// alert was delivered.
    pub async fn check_high_yield(&self, now: i64) -> bool {
        {
            let state = self.state.lock().await;
            if !state.settings.high_yield
                || now - state.last_high_yield_alert < HIGH_YIELD_COOLDOWN_MS
            {
                return false;
            }
        }

        let snapshot = self.source.snapshot().await;
        let lines: Vec<AlertLine> = snapshot
            .records()
            .iter()
            .filter(|r| r.funding_rate_apr > HIGH_YIELD_APR)
            .map(AlertLine::from_record)
            .collect();
        if lines.is_empty() {
            return false;
        }
        // another check may have alerted while the snapshot was in flight
        if now - self.state.lock().await.last_high_yield_alert < HIGH_YIELD_COOLDOWN_MS {
            return false;
        }

        let count = lines.len();
        let delivered = self.notifier.send(&Alert::Opportunities(lines)).await;
        if delivered {
            let mut state = self.state.lock().await;
            state.last_high_yield_alert = state.last_high_yield_alert.max(now);
        }
        info!(count, delivered, "[WATCH] high-yield alert");
        delivered
    }
}

fn settings_ack(settings: &WatchSettings, accepted: bool) -> SettingsAck {
    SettingsAck {
        min_spread_apr: settings.min_spread_apr,
        heartbeat: settings.heartbeat,
        accepted,
    }
}
