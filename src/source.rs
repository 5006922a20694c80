// src/source.rs
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// How to find the interesting part of a page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionRule {
    /// Compare on a "last modified" stamp, mail the cleaned forecast table.
    ForecastTable {
        stamp_selector: String,
        table_selector: String,
    },
    /// Compare on and mail the plain text of one container.
    TextWidget { container_selector: String },
}

impl ExtractionRule {
    fn key_suffix(&self) -> &'static str {
        match self {
            ExtractionRule::ForecastTable { .. } => "modified",
            ExtractionRule::TextWidget { .. } => "forecast",
        }
    }

    fn selectors(&self) -> Vec<&str> {
        match self {
            ExtractionRule::ForecastTable {
                stamp_selector,
                table_selector,
            } => vec![stamp_selector.as_str(), table_selector.as_str()],
            ExtractionRule::TextWidget { container_selector } => vec![container_selector.as_str()],
        }
    }
}

/// A monitored page. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    pub name: String,
    /// Page to fetch; also the base for resolving relative image links.
    pub url: String,
    pub rule: ExtractionRule,
    pub subject: String,
    /// Raw HTML placed in front of the mailed text (text widgets only).
    #[serde(default)]
    pub lead_in: Option<String>,
    #[serde(default)]
    state_key: Option<String>,
}

impl Source {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        rule: ExtractionRule,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            rule,
            subject: subject.into(),
            lead_in: None,
            state_key: None,
        }
    }

    pub fn with_lead_in(mut self, lead_in: impl Into<String>) -> Self {
        self.lead_in = Some(lead_in.into());
        self
    }

    pub fn with_state_key(mut self, key: impl Into<String>) -> Self {
        self.state_key = Some(key.into());
        self
    }

    /// Key of the last-seen fragment in the state store.
    pub fn state_key(&self) -> String {
        match &self.state_key {
            Some(k) => k.clone(),
            None => format!("{}_{}", self.name, self.rule.key_suffix()),
        }
    }

    /// Checks the URL and every selector so a bad source fails at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::Source {
            name: self.name.clone(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(invalid("empty name".into()));
        }
        url::Url::parse(&self.url).map_err(|e| invalid(format!("url `{}`: {e}", self.url)))?;
        for sel in self.rule.selectors() {
            scraper::Selector::parse(sel)
                .map_err(|e| invalid(format!("selector `{sel}`: {e}")))?;
        }
        Ok(())
    }
}

/// The two pages this service was written for. Their keys are pinned so
/// state already in the store survives a rename.
pub fn default_sources() -> Vec<Source> {
    vec![
        Source::new(
            "totisurf",
            "http://totisurf.com",
            ExtractionRule::ForecastTable {
                stamp_selector: r#"font[color="red"]"#.into(),
                table_selector: ".vreme".into(),
            },
            "Totisurf forecast changed",
        )
        .with_state_key("totisurf_modified"),
        Source::new(
            "waveriderz",
            "http://waveriderz.wordpress.com/",
            ExtractionRule::TextWidget {
                container_selector: "div.textwidget".into(),
            },
            "Waveriderz forecast changed",
        )
        .with_lead_in("Borut pravi: <br />")
        .with_state_key("waveriderz_forecast"),
    ]
}

#[derive(Deserialize)]
struct SourcesFile {
    #[serde(rename = "source")]
    sources: Vec<Source>,
}

/// Load `[[source]]` tables from a TOML file.
pub fn load_sources_from(path: &Path) -> Result<Vec<Source>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::SourcesIo {
        path: path.display().to_string(),
        source,
    })?;
    parse_sources(&content, &path.display().to_string())
}

fn parse_sources(s: &str, origin: &str) -> Result<Vec<Source>, ConfigError> {
    let file: SourcesFile = toml::from_str(s).map_err(|source| ConfigError::SourcesToml {
        path: origin.to_string(),
        source,
    })?;

    let mut seen = std::collections::BTreeSet::new();
    for src in &file.sources {
        src.validate()?;
        if !seen.insert(src.state_key()) {
            return Err(ConfigError::Source {
                name: src.name.clone(),
                reason: format!("state key `{}` used twice", src.state_key()),
            });
        }
    }
    Ok(file.sources)
}
