// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use surf_watch::error::{DeliveryError, FetchError};
use surf_watch::fetch::PageFetcher;
use surf_watch::notify::{Envelope, Notification, Notifier};
use surf_watch::source::{default_sources, Source};
use surf_watch::store::StateStore;
use surf_watch::Watcher;

pub const TOTI_0105: &str = include_str!("../fixtures/totisurf_2024-01-05.html");
pub const TOTI_0106: &str = include_str!("../fixtures/totisurf_2024-01-06.html");
pub const WAVE: &str = include_str!("../fixtures/waveriderz.html");

pub fn totisurf() -> Source {
    default_sources().remove(0)
}

pub fn waveriderz() -> Source {
    default_sources().remove(1)
}

pub fn envelope() -> Envelope {
    Envelope {
        from: "postmaster@mg.example.org".into(),
        to: "surfer@example.org".into(),
    }
}

/// Canned page for one fetch: a body, or an HTTP status error.
#[derive(Clone)]
pub enum Page {
    Html(String),
    Status(u16),
}

/// Serves pages in order; the last one repeats forever.
pub struct ScriptedFetcher {
    pages: Mutex<VecDeque<Page>>,
    calls: Mutex<usize>,
}

impl ScriptedFetcher {
    pub fn new(pages: Vec<Page>) -> Self {
        assert!(!pages.is_empty());
        Self {
            pages: Mutex::new(pages.into()),
            calls: Mutex::new(0),
        }
    }

    pub fn html(html: &str) -> Self {
        Self::new(vec![Page::Html(html.to_string())])
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        *self.calls.lock().unwrap() += 1;
        let page = {
            let mut pages = self.pages.lock().unwrap();
            if pages.len() > 1 {
                pages.pop_front().unwrap()
            } else {
                pages.front().cloned().unwrap()
            }
        };
        match page {
            Page::Html(s) => Ok(s),
            Page::Status(status) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
        }
    }
}

/// Keeps every notification; optionally rejects them like a dead relay.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(vec![]),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, n: &Notification) -> Result<(), DeliveryError> {
        if self.fail {
            let source = "relay unreachable"
                .parse::<lettre::message::Mailbox>()
                .unwrap_err();
            return Err(DeliveryError::Address {
                address: n.to.clone(),
                source,
            });
        }
        self.sent.lock().unwrap().push(n.clone());
        Ok(())
    }
}

pub fn watcher(
    source: Source,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn StateStore>,
    notifier: Arc<dyn Notifier>,
) -> Watcher {
    Watcher::new(source, envelope(), fetcher, store, notifier)
}
