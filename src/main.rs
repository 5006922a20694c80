//! surf-watch binary entrypoint.
//! Reads config, wires fetcher/store/mailer, and runs one watcher task per source.

use std::sync::Arc;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use surf_watch::fetch::HttpFetcher;
use surf_watch::notify::EmailNotifier;
use surf_watch::store::open_store;
use surf_watch::{build_watchers, scheduler, Config};

/// Compact logs by default; `LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("surf_watch=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration, not starting");
            return Err(e.into());
        }
    };

    if let Some(addr) = cfg.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("install prometheus listener")?;
        tracing::info!(%addr, "metrics listener up");
    }

    let store = open_store(&cfg.state_store_url).context("open state store")?;
    let fetcher = Arc::new(HttpFetcher::new(cfg.http_timeout).context("build http client")?);
    let notifier = Arc::new(EmailNotifier::new(&cfg.smtp).context("build smtp transport")?);

    let watchers = build_watchers(&cfg, fetcher, store, notifier);
    let handles = scheduler::spawn_all(watchers, cfg.poll_interval);

    tokio::signal::ctrl_c().await.context("wait for ctrl-c")?;
    tracing::info!("shutting down");
    for h in handles {
        h.abort();
    }
    Ok(())
}
