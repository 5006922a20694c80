//! Runs every configured watcher exactly once and exits; for cron-style deployments.
//! Exit code is non-zero when any cycle failed.

use std::sync::Arc;

use anyhow::Context;
use surf_watch::fetch::HttpFetcher;
use surf_watch::notify::EmailNotifier;
use surf_watch::store::open_store;
use surf_watch::{build_watchers, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = Config::from_env().context("configuration")?;
    let store = open_store(&cfg.state_store_url).context("open state store")?;
    let fetcher = Arc::new(HttpFetcher::new(cfg.http_timeout).context("build http client")?);
    let notifier = Arc::new(EmailNotifier::new(&cfg.smtp).context("build smtp transport")?);

    let mut failed = 0usize;
    for w in build_watchers(&cfg, fetcher, store, notifier) {
        match w.run_cycle().await {
            Ok(outcome) => println!("{}: {}", w.source().name, outcome.label()),
            Err(e) => {
                failed += 1;
                println!("{}: {} error: {e}", w.source().name, e.kind());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} watcher cycle(s) failed");
    }
    Ok(())
}
