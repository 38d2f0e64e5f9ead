use async_trait::async_trait;
use std::time::Duration;

use super::types::FeedErrorKind;

#[derive(Debug, Clone)]
pub struct FetchedFeed {
    pub body: String,
    pub content_type: Option<String>,
}

impl FetchedFeed {
    /// True when the server declared a JSON media type, or declared none.
    pub fn declares_json(&self) -> bool {
        match self.content_type.as_deref() {
            None => true,
            Some(value) => {
                let media_type = value.split(';').next().unwrap_or_default().trim();
                media_type.eq_ignore_ascii_case("application/json")
                    || media_type.eq_ignore_ascii_case("application/geo+json")
                    || media_type.to_ascii_lowercase().ends_with("+json")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum FetchStatus {
    Fetched(FetchedFeed),
    /// No URL was configured, so no request was made.
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    HttpStatus(u16),
}

impl FetchError {
    pub fn kind(&self) -> FeedErrorKind {
        FeedErrorKind::Network
    }
}

/// Anything that can hand the pipeline a raw feed body for a URL.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchStatus, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchStatus, FetchError> {
        fetch_feed(&self.client, url).await
    }
}

pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<FetchStatus, FetchError> {
    if url.trim().is_empty() {
        tracing::debug!("no feed url configured, skipping request");
        return Ok(FetchStatus::Skipped);
    }

    tracing::debug!(url, "requesting earthquake feed");
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(url, status = status.as_u16(), "feed request rejected");
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    let body = response.text().await?;
    tracing::debug!(url, bytes = body.len(), "feed body received");

    Ok(FetchStatus::Fetched(FetchedFeed { body, content_type }))
}
