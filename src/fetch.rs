// src/fetch.rs
use std::time::Duration;

use reqwest::Client;

use crate::error::FetchError;

const USER_AGENT: &str = concat!("surf-watch/", env!("CARGO_PKG_VERSION"));

#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Body of a successful `GET url`. Any non-2xx status is an error.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Fails only if the TLS backend cannot be set up. That is a startup
    /// problem, not a page fetch, so it is not a [`FetchError`].
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };
        let resp = self.client.get(url).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        resp.text().await.map_err(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transport_error_names_the_page() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
        let url = "http://127.0.0.1:1/forecast";
        let err = fetcher.fetch(url).await.unwrap_err();
        match &err {
            FetchError::Transport { url: failed, .. } => assert_eq!(failed, url),
            other => panic!("expected a transport error, got {other:?}"),
        }
        assert!(err.to_string().starts_with("GET http://127.0.0.1:1/forecast failed"));
    }
}
