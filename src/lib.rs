// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod change_detector;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod notify;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod watcher;

// ---- Re-exports for stable public API ----
pub use crate::config::Config;
pub use crate::error::{ConfigError, CycleError, DeliveryError, ExtractionError, FetchError};
pub use crate::source::{ExtractionRule, Source};
pub use crate::watcher::{CycleOutcome, Watcher};

use std::sync::Arc;

/// Wire one watcher per configured source around shared collaborators.
pub fn build_watchers(
    cfg: &Config,
    fetcher: Arc<dyn fetch::PageFetcher>,
    store: Arc<dyn store::StateStore>,
    notifier: Arc<dyn notify::Notifier>,
) -> Vec<Arc<Watcher>> {
    cfg.sources
        .iter()
        .cloned()
        .map(|src| {
            Arc::new(Watcher::new(
                src,
                cfg.envelope.clone(),
                fetcher.clone(),
                store.clone(),
                notifier.clone(),
            ))
        })
        .collect()
}
