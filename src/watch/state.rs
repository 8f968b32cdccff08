use crate::config::WatchConfig;
use std::collections::HashMap;

/// Operator-adjustable settings. Survive watcher stop and restart within
/// one process.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchSettings {
    pub min_spread_apr: f64,
    pub heartbeat: bool,
    pub high_yield: bool,
}

impl WatchSettings {
    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            min_spread_apr: config.min_spread_apr,
            heartbeat: config.heartbeat,
            high_yield: config.high_yield,
        }
    }

    /// Replace the alert threshold. Non-finite or negative values are
    /// rejected and the prior threshold kept.
    pub fn apply_threshold(&mut self, value: f64) -> bool {
        if !value.is_finite() || value < 0.0 {
            return false;
        }
        self.min_spread_apr = value;
        true
    }
}

/// Mutable watcher state, shared by the watcher tasks behind one mutex.
#[derive(Debug, Clone)]
pub struct WatchState {
    pub settings: WatchSettings,
    /// Canonical symbol -> epoch ms of the last confirmed alert.
    pub last_notified: HashMap<String, i64>,
    /// Epoch ms of the last heartbeat attempt; zero before the first.
    pub last_heartbeat: i64,
    /// Highest command update id seen.
    pub last_update_id: Option<i64>,
    /// Epoch ms of the last confirmed high-yield alert.
    pub last_high_yield_alert: i64,
}

impl WatchState {
    pub fn new(settings: WatchSettings) -> Self {
        Self {
            settings,
            last_notified: HashMap::new(),
            last_heartbeat: 0,
            last_update_id: None,
            last_high_yield_alert: 0,
        }
    }

    /// Offset for the next command poll: one past the last seen id.
    pub fn next_offset(&self) -> Option<i64> {
        self.last_update_id.map(|id| id + 1)
    }

    /// Fresh run state carrying the current settings forward.
    pub fn restarted(&self) -> Self {
        Self::new(self.settings.clone())
    }
}
