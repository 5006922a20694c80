// src/notify/mod.rs
pub mod email;

use crate::error::DeliveryError;
use crate::source::{ExtractionRule, Source};

pub use email::EmailNotifier;

/// Fixed sender/recipient pair for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: String,
    pub to: String,
}

/// One change mail. Built when a change is detected, dropped after dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub source: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

impl Notification {
    /// Forecast tables are mailed as markup verbatim; widget text is escaped.
    /// The source's lead-in, when set, goes first in either case.
    ///
    /// Escaping widget text is a deliberate change from the earlier
    /// deployment, which appended it raw: `<` or `&` in the text is shown
    /// literally instead of being parsed as markup.
    pub fn compose(source: &Source, envelope: &Envelope, content: &str) -> Self {
        let lead_in = source.lead_in.as_deref().unwrap_or_default();
        let body = match &source.rule {
            ExtractionRule::ForecastTable { .. } => content.to_string(),
            ExtractionRule::TextWidget { .. } => {
                html_escape::encode_text(content).into_owned()
            }
        };
        Self {
            source: source.name.clone(),
            from: envelope.from.clone(),
            to: envelope.to.clone(),
            subject: source.subject.clone(),
            html_body: format!("{lead_in}{body}"),
        }
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, n: &Notification) -> Result<(), DeliveryError>;
}
