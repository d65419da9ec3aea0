//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the pipeline, including:
//! - Building one shared HTTP client with a browser identity
//! - Single-attempt GET requests returning the raw body
//! - Fixed-delay retry across attempts
//! - Error classification

use crate::config::FetchConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Classification of a single failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The URL could not be parsed
    InvalidUrl,
    /// The server answered with a non-success status
    HttpStatus(u16),
    /// The request exceeded the configured timeout
    Timeout,
    /// The redirect limit was exceeded
    Redirect,
    /// Connection, DNS or TLS failure
    Network,
    /// The response body could not be read
    Body,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::InvalidUrl => write!(f, "invalid url"),
            FetchErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            FetchErrorKind::Timeout => write!(f, "timeout"),
            FetchErrorKind::Redirect => write!(f, "redirect limit exceeded"),
            FetchErrorKind::Network => write!(f, "network error"),
            FetchErrorKind::Body => write!(f, "body read error"),
        }
    }
}

/// Error from one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns true if repeating the request cannot change the outcome
    ///
    /// Request timeout (408) and rate limiting (429) are treated as transient.
    pub fn is_permanent(&self) -> bool {
        match self.kind {
            FetchErrorKind::InvalidUrl => true,
            FetchErrorKind::HttpStatus(code) => {
                (400..500).contains(&code) && code != 408 && code != 429
            }
            _ => false,
        }
    }
}

/// Terminal failure for one URL after the retry budget is spent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed after {attempts} attempts: {last_error}")]
pub struct FetchFailure {
    pub url: String,
    pub attempts: u32,
    pub last_error: FetchError,
}

/// Source of raw page bytes
///
/// Implementations perform exactly one attempt; retrying is layered on top
/// by [`fetch_with_retry`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fixed-delay retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,

    /// Delay between consecutive attempts
    pub delay: Duration,

    /// Retry errors that [`FetchError::is_permanent`] flags as permanent
    pub retry_permanent: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            delay: Duration::from_secs(2),
            retry_permanent: true,
        }
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            attempts: config.retry_attempts.max(1),
            delay: Duration::from_millis(config.retry_delay_ms),
            retry_permanent: config.retry_permanent_errors,
        }
    }
}

/// Fetches a URL, retrying failed attempts with a fixed delay
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Success | Return body |
/// | Failure, attempts left | `on_retry(attempt, error)`, sleep `delay`, retry |
/// | Permanent failure, `retry_permanent == false` | Fail immediately |
/// | Failure, no attempts left | Fail with the last error |
///
/// # Arguments
///
/// * `fetcher` - Single-attempt fetcher
/// * `url` - The URL to fetch
/// * `policy` - Attempt budget and delay
/// * `on_retry` - Called with the 1-based failed attempt number before sleeping
pub async fn fetch_with_retry<F>(
    fetcher: &dyn Fetcher,
    url: &str,
    policy: &RetryPolicy,
    mut on_retry: F,
) -> Result<Vec<u8>, FetchFailure>
where
    F: FnMut(u32, &FetchError),
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match fetcher.fetch(url).await {
            Ok(bytes) => return Ok(bytes),
            Err(error) => {
                let give_up = attempt >= attempts || (!policy.retry_permanent && error.is_permanent());
                if give_up {
                    return Err(FetchFailure {
                        url: url.to_string(),
                        attempts: attempt,
                        last_error: error,
                    });
                }

                on_retry(attempt, &error);
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

/// reqwest-backed [`Fetcher`] sharing one connection pool
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds the HTTP client from fetch configuration
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Client built successfully
    /// * `Err(reqwest::Error)` - TLS backend or header setup failed
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        if let Ok(value) = HeaderValue::from_str(&config.accept_language) {
            headers.insert(ACCEPT_LANGUAGE, value);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::limited(config.max_redirects))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = url::Url::parse(url)
            .map_err(|e| FetchError::new(FetchErrorKind::InvalidUrl, e.to_string()))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::new(FetchErrorKind::Body, e.to_string()))?;

        Ok(body.to_vec())
    }
}

fn status_error(status: StatusCode) -> FetchError {
    FetchError::new(
        FetchErrorKind::HttpStatus(status.as_u16()),
        format!("Request failed with status code {}", status.as_u16()),
    )
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FetchErrorKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FetchErrorKind::Redirect, err.to_string());
    }
    FetchError::new(FetchErrorKind::Network, err.to_string())
}
