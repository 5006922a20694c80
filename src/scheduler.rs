// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::watcher::Watcher;

/// Run `watcher` now and then every `interval`, one cycle at a time.
/// A slow cycle delays the next tick instead of overlapping it.
pub fn spawn_watcher(watcher: Arc<Watcher>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            // Failures are logged and counted inside run_cycle; the next tick is the retry.
            if let Ok(outcome) = watcher.run_cycle().await {
                tracing::debug!(
                    target: "scheduler",
                    source = %watcher.source().name,
                    outcome = outcome.label(),
                    "cycle done"
                );
            }
        }
    })
}

/// One independent task per watcher.
pub fn spawn_all(watchers: Vec<Arc<Watcher>>, interval: Duration) -> Vec<JoinHandle<()>> {
    watchers
        .into_iter()
        .map(|w| {
            tracing::info!(
                source = %w.source().name,
                url = %w.source().url,
                every_secs = interval.as_secs(),
                "scheduling watcher"
            );
            spawn_watcher(w, interval)
        })
        .collect()
}
