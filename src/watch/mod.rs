//! Long-running watcher: debounced opportunity alerts, hourly heartbeat,
//! operator commands and the high-yield watch.

pub mod engine;
pub mod runner;
pub mod state;

pub use engine::{PassOutcome, WatchEngine, is_eligible, is_synced, time_to_settlement};
pub use runner::Watcher;
pub use state::{WatchSettings, WatchState};
