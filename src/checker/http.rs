// src/checker/http.rs
// =============================================================================
// This module checks whether a manifest URL exists by making HTTP requests.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Follows redirects, up to a limit
// - Retries transient failures (5xx, timeouts, dropped connections)
// - Never fails loudly: every outcome becomes a ProbeResult
//
// Probes run one after the other. The curated directory is processed once,
// in order, so there is no fan-out here.
//
// Rust concepts:
// - Traits: ExistenceChecker lets tests plug in a fake checker
// - async/await: reqwest is async, tokio drives it
// - thiserror: typed errors for the different ways a probe can fail
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::retry::{parse_retry_after, RetryPolicy};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_REDIRECTS: usize = 20;

// What we learned about a URL: either the final HTTP status, or why we
// never got one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeDetail {
    Status(u16),
    Error(String),
}

impl fmt::Display for ProbeDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeDetail::Status(code) => write!(f, "HTTP {}", code),
            ProbeDetail::Error(message) => f.write_str(message),
        }
    }
}

// Represents the result of probing a single URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub url: String,
    pub reachable: bool,
    pub detail: ProbeDetail,
}

impl ProbeResult {
    pub fn from_status(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            reachable: (200..=299).contains(&status),
            detail: ProbeDetail::Status(status),
        }
    }

    pub fn failed(url: impl Into<String>, error: &ProbeError) -> Self {
        Self {
            url: url.into(),
            reachable: false,
            detail: ProbeDetail::Error(error.to_string()),
        }
    }
}

// The ways a probe can fail before we ever see a status code
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request timed out")]
    Timeout,

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("could not resolve hostname")]
    Dns,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    /// Faults that might go away if we just ask again.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProbeError::Timeout | ProbeError::Connect(_))
    }
}

impl From<reqwest::Error> for ProbeError {
    // Categorizes different error types from reqwest
    fn from(error: reqwest::Error) -> Self {
        let error_string = error.to_string();

        if error.is_timeout() {
            ProbeError::Timeout
        } else if error.is_redirect() {
            ProbeError::TooManyRedirects
        } else if error.is_connect() {
            // reqwest hides the resolver error inside the source chain
            let chain = format!("{:?}", error).to_lowercase();
            if chain.contains("dns") || chain.contains("resolve") {
                ProbeError::Dns
            } else {
                ProbeError::Connect(error_string)
            }
        } else if error.is_builder() {
            ProbeError::InvalidUrl {
                url: error.url().map(|u| u.to_string()).unwrap_or_default(),
                reason: error_string,
            }
        } else {
            ProbeError::Other(error_string)
        }
    }
}

/// Anything that can tell whether a URL exists.
///
/// Implementations must not fail: transport problems are reported as an
/// unreachable [`ProbeResult`].
#[async_trait]
pub trait ExistenceChecker: Send + Sync {
    async fn check(&self, url: &str) -> ProbeResult;
}

// Knobs for the HTTP checker
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub retry: RetryPolicy,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            retry: RetryPolicy::default(),
        }
    }
}

// One HTTP answer, reduced to what the retry loop needs
#[derive(Debug, Clone, Copy)]
struct Answer {
    status: u16,
    retry_after: Option<Duration>,
}

/// Existence checker backed by a reqwest client.
///
/// The client is created once and reused for every probe, so connections to
/// github.com are pooled across the whole run.
#[derive(Debug, Clone)]
pub struct HttpChecker {
    client: Client,
    retry: RetryPolicy,
}

impl HttpChecker {
    pub fn new(settings: ProbeSettings) -> anyhow::Result<Self> {
        let client = client_builder(&settings).build()?;
        Ok(Self::with_client(client, settings.retry))
    }

    pub fn with_client(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    async fn attempt(&self, target: &Url) -> Result<Answer, ProbeError> {
        let response = self.client.head(target.clone()).send().await?;
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        Ok(Answer {
            status: response.status().as_u16(),
            retry_after,
        })
    }
}

#[async_trait]
impl ExistenceChecker for HttpChecker {
    async fn check(&self, url: &str) -> ProbeResult {
        let target = match parse_target(url) {
            Ok(target) => target,
            Err(e) => return ProbeResult::failed(url, &e),
        };

        let mut retries = 0;
        loop {
            let outcome = self.attempt(&target).await;

            let retryable = match &outcome {
                Ok(answer) => self.retry.retries_status(answer.status),
                Err(e) => e.is_transient(),
            };

            if !retryable || !self.retry.allows_retry(retries) {
                return match outcome {
                    Ok(answer) => ProbeResult::from_status(url, answer.status),
                    Err(e) => ProbeResult::failed(url, &e),
                };
            }

            retries += 1;
            let hint = outcome.as_ref().ok().and_then(|a| a.retry_after);
            let delay = self.retry.delay_with_hint(retries, hint);

            match &outcome {
                Ok(answer) => debug!(url, status = answer.status, retry = retries, ?delay, "retrying"),
                Err(e) => debug!(url, error = %e, retry = retries, ?delay, "retrying"),
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

// Client configuration shared by every probe: bounded wait, bounded redirects
fn client_builder(settings: &ProbeSettings) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(settings.timeout)
        .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
}

// Validates a URL before we spend a request on it
//
// Only http and https make sense for a HEAD probe
fn parse_target(url: &str) -> Result<Url, ProbeError> {
    let parsed = Url::parse(url).map_err(|e| ProbeError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ProbeError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why HEAD and not GET?
//    - We only care whether fpm.toml exists, not what is in it
//    - HEAD returns the same status code without the body
//
// 2. Why a trait?
//    - The aggregator only needs "does this URL exist?"
//    - Tests use a fake that answers from a table, no network needed
//
// 3. Why does check() return ProbeResult instead of Result?
//    - A missing manifest is an ordinary answer, not an error
//    - One broken repository must never stop the whole scan
// -----------------------------------------------------------------------------
