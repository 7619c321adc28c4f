//! HTTP retrieval of panel pages.
use std::time::Duration;

use cast_logging::cast_debug;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION, USER_AGENT};
use reqwest::{redirect, Client, Response, Url};

use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Per request, so each redirect hop gets the full budget.
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// MIME essences accepted as panel pages.
    pub page_types: Vec<String>,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            page_types: vec!["text/html".into(), "application/xhtml+xml".into()],
            user_agent: concat!("promptcast/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError>;
}

/// Fetches panel pages, following redirects itself so every hop is counted
/// and bounded.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn client(&self) -> Result<Client, FetchError> {
        Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    /// Sends the request and every redirect hop; returns the final response
    /// and the number of hops taken.
    async fn follow(&self, client: &Client, start: Url) -> Result<(Response, usize), FetchError> {
        let mut target = start;
        let mut hops = 0;
        loop {
            let response = client
                .get(target.clone())
                .header(USER_AGENT, &self.settings.user_agent)
                .header(ACCEPT, self.settings.page_types.join(","))
                .send()
                .await
                .map_err(map_reqwest_error)?;
            if !response.status().is_redirection() {
                return Ok((response, hops));
            }
            if hops == self.settings.redirect_limit {
                return Err(FetchError::new(
                    FailureKind::RedirectLimitExceeded,
                    format!("more than {} redirects", self.settings.redirect_limit),
                ));
            }
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| FetchError::new(FailureKind::Network, "redirect without location"))?;
            target = target
                .join(location)
                .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
            hops += 1;
            cast_debug!("Redirect {} to {}", hops, target);
        }
    }

    fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        self.settings
            .page_types
            .iter()
            .any(|page_type| page_type.eq_ignore_ascii_case(essence))
    }

    fn over_limit(&self, actual: u64) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            "page too large",
        )
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let start = Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = self.client()?;
        let (response, redirect_count) = self.follow(&client, start).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        if let Some(declared) = response.content_length().filter(|len| *len > self.settings.max_bytes) {
            return Err(self.over_limit(declared));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if let Some(content_type) = content_type.as_deref().filter(|ct| !self.accepts(ct)) {
            return Err(FetchError::new(
                FailureKind::UnsupportedContentType {
                    content_type: content_type.to_string(),
                },
                "panel pages must be html",
            ));
        }

        let final_url = response.url().to_string();
        let mut bytes = Vec::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let total = (bytes.len() + chunk.len()) as u64;
            if total > self.settings.max_bytes {
                return Err(self.over_limit(total));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url,
                redirect_count,
                content_type,
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Network
    };
    FetchError::new(kind, err.to_string())
}
