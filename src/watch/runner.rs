use super::engine::WatchEngine;
use crate::config::WatchConfig;
use crate::utils::now_millis;
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

struct Running {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

/// Start/stop lifecycle around a [`WatchEngine`].
///
/// Running spawns an evaluation task, a command-poll task when a command
/// channel exists, and a high-yield task. All of them stop on one shutdown
/// signal, including mid-pass.
pub struct Watcher {
    engine: WatchEngine,
    config: WatchConfig,
    running: Option<Running>,
}

impl Watcher {
    pub fn new(engine: WatchEngine, config: WatchConfig) -> Self {
        Self {
            engine,
            config,
            running: None,
        }
    }

    pub fn engine(&self) -> &WatchEngine {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub async fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.engine.reset().await;
        let (tx, rx) = watch::channel(false);
        let mut handles = Vec::with_capacity(3);

        let engine = self.engine.clone();
        handles.push(spawn_periodic(self.config.eval_interval, rx.clone(), move || {
            let engine = engine.clone();
            async move {
                engine.run_pass(now_millis()).await;
            }
        }));

        if self.engine.has_command_channel() {
            let engine = self.engine.clone();
            handles.push(spawn_periodic(self.config.poll_interval, rx.clone(), move || {
                let engine = engine.clone();
                async move {
                    if let Err(e) = engine.poll_commands().await {
                        warn!(error = %e, "[TG] command poll failed");
                    }
                }
            }));
        }

        let engine = self.engine.clone();
        handles.push(spawn_periodic(self.config.eval_interval, rx, move || {
            let engine = engine.clone();
            async move {
                engine.check_high_yield(now_millis()).await;
            }
        }));

        info!(tasks = handles.len(), "[WATCH] watcher started");
        self.running = Some(Running {
            shutdown: tx,
            handles,
        });
    }

    /// Signal shutdown and wait for every task to finish.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        let _ = running.shutdown.send(true);
        for result in join_all(running.handles).await {
            if let Err(e) = result {
                warn!(error = %e, "[WATCH] task ended abnormally");
            }
        }
        info!("[WATCH] watcher stopped");
    }

    /// Flip between running and stopped; returns the new running state.
    pub async fn toggle(&mut self) -> bool {
        if self.is_running() {
            self.stop().await;
        } else {
            self.start().await;
        }
        self.is_running()
    }
}

/// Run `tick` immediately and then every `period` until shutdown.
fn spawn_periodic<F, Fut>(
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = interval.tick() => {}
            }
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tick() => {}
            }
        }
    })
}
