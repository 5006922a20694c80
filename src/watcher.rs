// src/watcher.rs
//! One poll cycle for one source: fetch, extract, compare, then store and/or mail.

use std::sync::{Arc, Once};

use metrics::{counter, describe_counter, describe_gauge, gauge};

use crate::change_detector::{detect, Detection};
use crate::error::CycleError;
use crate::extract::extract;
use crate::fetch::PageFetcher;
use crate::notify::{Envelope, Notification, Notifier};
use crate::source::Source;
use crate::store::StateStore;

/// One-time metrics registration (so series show up before the first cycle).
fn ensure_metrics_described() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        describe_counter!(
            "surfwatch_cycles_total",
            "Completed watcher cycles by source and outcome."
        );
        describe_counter!(
            "surfwatch_cycle_errors_total",
            "Aborted watcher cycles by source and error kind."
        );
        describe_counter!(
            "surfwatch_notifications_total",
            "Change emails handed to the mail relay."
        );
        describe_gauge!(
            "surfwatch_last_cycle_ts",
            "Unix ts when a source's cycle last finished."
        );
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Baseline stored, no mail.
    FirstObservation,
    Unchanged,
    /// New value stored and mail sent.
    Changed,
}

impl CycleOutcome {
    pub fn label(self) -> &'static str {
        match self {
            CycleOutcome::FirstObservation => "first_observation",
            CycleOutcome::Unchanged => "unchanged",
            CycleOutcome::Changed => "changed",
        }
    }
}

pub struct Watcher {
    source: Source,
    state_key: String,
    envelope: Envelope,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn StateStore>,
    notifier: Arc<dyn Notifier>,
}

impl Watcher {
    pub fn new(
        source: Source,
        envelope: Envelope,
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn StateStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            state_key: source.state_key(),
            source,
            envelope,
            fetcher,
            store,
            notifier,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Run one cycle and log/count the result. Errors stay local to this cycle.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        ensure_metrics_described();
        let name = self.source.name.clone();

        let res = self.cycle().await;
        match &res {
            Ok(outcome) => {
                counter!("surfwatch_cycles_total", "source" => name.clone(), "outcome" => outcome.label())
                    .increment(1);
            }
            Err(e) => {
                tracing::warn!(source = %name, kind = e.kind(), error = %e, "watcher cycle failed");
                counter!("surfwatch_cycle_errors_total", "source" => name.clone(), "kind" => e.kind())
                    .increment(1);
            }
        }
        gauge!("surfwatch_last_cycle_ts", "source" => name)
            .set(chrono::Utc::now().timestamp() as f64);
        res
    }

    async fn cycle(&self) -> Result<CycleOutcome, CycleError> {
        let name = self.source.name.as_str();
        let key = self.state_key.as_str();

        let body = self.fetcher.fetch(&self.source.url).await?;
        let extracted = extract(&self.source, &body)?;

        let detection = detect(self.store.as_ref(), key, &extracted.fragment).await?;
        tracing::debug!(source = name, key, detection = detection.label(), "compared with stored value");
        match detection {
            Detection::FirstObservation => {
                tracing::info!(source = name, key, value = %extracted.fragment, "not found in store, storing baseline");
                self.store.set(key, &extracted.fragment).await?;
                Ok(CycleOutcome::FirstObservation)
            }
            Detection::Unchanged => {
                tracing::info!(source = name, "no changes");
                Ok(CycleOutcome::Unchanged)
            }
            Detection::Changed { old, new } => {
                // Mail content must be available before the new value is committed.
                let content = extracted.content?;
                tracing::info!(source = name, key, %old, %new, "modified, storing and sending email");

                // Stored first: a failed send is not retried on the next cycle.
                self.store.set(key, &new).await?;

                let n = Notification::compose(&self.source, &self.envelope, &content);
                self.notifier.send(&n).await?;
                counter!("surfwatch_notifications_total", "source" => self.source.name.clone())
                    .increment(1);
                Ok(CycleOutcome::Changed)
            }
        }
    }
}
