// src/config/mod.rs
//! Process configuration, read once from the environment at startup.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use lettre::message::Mailbox;

use crate::error::ConfigError;
use crate::notify::Envelope;
use crate::source::{default_sources, load_sources_from, Source};

pub const ENV_SMTP_HOST: &str = "SMTP_HOST";
pub const ENV_SMTP_PORT: &str = "SMTP_PORT";
pub const ENV_SMTP_USER: &str = "SMTP_USER";
pub const ENV_SMTP_PASS: &str = "SMTP_PASS";
pub const ENV_STATE_STORE_URL: &str = "STATE_STORE_URL";
pub const ENV_NOTIFY_EMAIL_TO: &str = "NOTIFY_EMAIL_TO";
pub const ENV_NOTIFY_EMAIL_FROM: &str = "NOTIFY_EMAIL_FROM";
pub const ENV_POLL_INTERVAL_SECS: &str = "POLL_INTERVAL_SECS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
pub const ENV_SOURCES_PATH: &str = "SURFWATCH_SOURCES_PATH";
pub const ENV_METRICS_ADDR: &str = "METRICS_ADDR";

/// Checked in this order; the first one missing aborts startup.
pub const REQUIRED: [&str; 6] = [
    ENV_SMTP_HOST,
    ENV_SMTP_PORT,
    ENV_SMTP_USER,
    ENV_SMTP_PASS,
    ENV_STATE_STORE_URL,
    ENV_NOTIFY_EMAIL_TO,
];

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const STORE_SCHEMES: [&str; 4] = ["redis://", "rediss://", "file://", "memory://"];

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub smtp: SmtpConfig,
    pub envelope: Envelope,
    pub state_store_url: String,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub sources: Vec<Source>,
    pub metrics_addr: Option<SocketAddr>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        for name in REQUIRED {
            if get(name).is_none() {
                return Err(ConfigError::Missing(name));
            }
        }
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let smtp = SmtpConfig {
            host: required(ENV_SMTP_HOST)?,
            port: parse_num(ENV_SMTP_PORT, &required(ENV_SMTP_PORT)?)?,
            user: required(ENV_SMTP_USER)?,
            // Passwords may legitimately carry surrounding spaces.
            password: lookup(ENV_SMTP_PASS).unwrap_or_default(),
        };

        let to = required(ENV_NOTIFY_EMAIL_TO)?;
        let from = get(ENV_NOTIFY_EMAIL_FROM).unwrap_or_else(|| smtp.user.clone());
        check_mailbox(ENV_NOTIFY_EMAIL_TO, &to)?;
        check_mailbox(ENV_NOTIFY_EMAIL_FROM, &from)?;

        let state_store_url = required(ENV_STATE_STORE_URL)?;
        if !STORE_SCHEMES.iter().any(|s| state_store_url.starts_with(s)) {
            return Err(ConfigError::Invalid {
                name: ENV_STATE_STORE_URL,
                value: state_store_url,
                reason: format!("scheme must be one of {}", STORE_SCHEMES.join(", ")),
            });
        }

        let poll_secs: u64 = match get(ENV_POLL_INTERVAL_SECS) {
            Some(v) => parse_num(ENV_POLL_INTERVAL_SECS, &v)?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };
        if poll_secs == 0 {
            return Err(ConfigError::Invalid {
                name: ENV_POLL_INTERVAL_SECS,
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        let timeout_secs: u64 = match get(ENV_HTTP_TIMEOUT_SECS) {
            Some(v) => parse_num(ENV_HTTP_TIMEOUT_SECS, &v)?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let sources = match get(ENV_SOURCES_PATH) {
            Some(p) => load_sources_from(&PathBuf::from(p))?,
            None => default_sources(),
        };
        for s in &sources {
            s.validate()?;
        }

        let metrics_addr = match get(ENV_METRICS_ADDR) {
            Some(v) => Some(parse_num::<SocketAddr>(ENV_METRICS_ADDR, &v)?),
            None => None,
        };

        Ok(Self {
            smtp,
            envelope: Envelope { from, to },
            state_store_url,
            poll_interval: Duration::from_secs(poll_secs),
            http_timeout: Duration::from_secs(timeout_secs),
            sources,
            metrics_addr,
        })
    }
}

fn parse_num<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn check_mailbox(name: &'static str, value: &str) -> Result<(), ConfigError> {
    value
        .parse::<Mailbox>()
        .map(|_| ())
        .map_err(|e| ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            (ENV_SMTP_HOST, "smtp.mailgun.org".to_string()),
            (ENV_SMTP_PORT, "587".to_string()),
            (ENV_SMTP_USER, "postmaster@mg.example.org".to_string()),
            (ENV_SMTP_PASS, "hunter2".to_string()),
            (ENV_STATE_STORE_URL, "redis://localhost:6379/0".to_string()),
            (ENV_NOTIFY_EMAIL_TO, "surfer@example.org".to_string()),
        ])
    }

    fn build(env: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_fill_optional_values() {
        let cfg = build(&base_env()).unwrap();
        assert_eq!(cfg.smtp.port, 587);
        assert_eq!(cfg.envelope.from, "postmaster@mg.example.org");
        assert_eq!(cfg.envelope.to, "surfer@example.org");
        assert_eq!(cfg.poll_interval, Duration::from_secs(600));
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
        assert_eq!(cfg.sources.len(), 2);
        assert!(cfg.metrics_addr.is_none());
    }

    #[test]
    fn each_required_var_is_enforced() {
        for name in REQUIRED {
            let mut env = base_env();
            env.remove(name);
            match build(&env) {
                Err(ConfigError::Missing(n)) => assert_eq!(n, name),
                other => panic!("expected Missing({name}), got {other:?}"),
            }
        }
    }

    #[test]
    fn blank_counts_as_missing() {
        let mut env = base_env();
        env.insert(ENV_SMTP_HOST, "   ".into());
        assert!(matches!(build(&env), Err(ConfigError::Missing(ENV_SMTP_HOST))));
    }

    #[test]
    fn bad_port_is_invalid() {
        let mut env = base_env();
        env.insert(ENV_SMTP_PORT, "smtp".into());
        assert!(matches!(
            build(&env),
            Err(ConfigError::Invalid { name: ENV_SMTP_PORT, .. })
        ));
    }

    #[test]
    fn bad_recipient_is_invalid() {
        let mut env = base_env();
        env.insert(ENV_NOTIFY_EMAIL_TO, "nobody".into());
        assert!(matches!(
            build(&env),
            Err(ConfigError::Invalid { name: ENV_NOTIFY_EMAIL_TO, .. })
        ));
    }

    #[test]
    fn unknown_store_scheme_is_invalid() {
        let mut env = base_env();
        env.insert(ENV_STATE_STORE_URL, "mysql://db".into());
        assert!(matches!(
            build(&env),
            Err(ConfigError::Invalid { name: ENV_STATE_STORE_URL, .. })
        ));
    }

    #[test]
    fn optional_overrides_are_parsed() {
        let mut env = base_env();
        env.insert(ENV_NOTIFY_EMAIL_FROM, "Surf Watch <watch@example.org>".into());
        env.insert(ENV_POLL_INTERVAL_SECS, "60".into());
        env.insert(ENV_METRICS_ADDR, "127.0.0.1:9100".into());
        let cfg = build(&env).unwrap();
        assert_eq!(cfg.envelope.from, "Surf Watch <watch@example.org>");
        assert_eq!(cfg.poll_interval, Duration::from_secs(60));
        assert_eq!(cfg.metrics_addr, Some("127.0.0.1:9100".parse().unwrap()));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut env = base_env();
        env.insert(ENV_POLL_INTERVAL_SECS, "0".into());
        assert!(build(&env).is_err());
    }

    #[test]
    fn sources_file_replaces_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("sources.toml");
        std::fs::write(
            &p,
            r##"
[[source]]
name = "spot"
url = "https://example.org/"
subject = "Spot changed"
rule = { kind = "text_widget", container_selector = "#report" }
"##,
        )
        .unwrap();
        let mut env = base_env();
        env.insert(ENV_SOURCES_PATH, p.display().to_string());
        let cfg = build(&env).unwrap();
        assert_eq!(cfg.sources.len(), 1);
        assert_eq!(cfg.sources[0].name, "spot");
    }

    #[test]
    fn password_is_not_printed() {
        let cfg = build(&base_env()).unwrap();
        let dbg = format!("{:?}", cfg);
        assert!(!dbg.contains("hunter2"));
    }
}
