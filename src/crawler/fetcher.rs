//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with the per-request timeout
//! - Picking a rotating identity (user agent) for each page
//! - Gating every request through a per-crawl admission gate
//! - Streaming response bodies chunk by chunk
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig, DEFAULT_USER_AGENTS};
use bytes::Bytes;
use rand::Rng;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why a fetch produced no response
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("fetch cancelled")]
    Cancelled,

    #[error("admission gate closed")]
    GateClosed,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e)
        }
    }
}

/// Counting gate that caps in-flight fetches for one crawl
///
/// Clones share the same slots and counters.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// A held fetch slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct FetchSlot {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for FetchSlot {
    fn drop(&mut self) {
        // Runs before the permit field is dropped, so the counter never
        // exceeds capacity.
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Waits until a slot is free and takes it
    pub async fn acquire(&self) -> Result<FetchSlot, FetchError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| FetchError::GateClosed)?;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        Ok(FetchSlot {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fetches currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest `in_flight` value observed so far
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Fixed pool of identity strings, one picked at random per page
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Arc<[String]>,
}

impl UserAgentPool {
    /// Builds a pool; an empty list falls back to the built-in browser strings
    pub fn new(agents: Vec<String>) -> Self {
        let agents: Vec<String> = if agents.is_empty() {
            DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
        } else {
            agents
        };
        Self {
            agents: agents.into(),
        }
    }

    pub fn pick(&self) -> &str {
        let index = rand::rng().random_range(0..self.agents.len());
        &self.agents[index]
    }

    pub(crate) fn len(&self) -> usize {
        self.agents.len()
    }
}

impl From<&UserAgentConfig> for UserAgentPool {
    fn from(config: &UserAgentConfig) -> Self {
        Self::new(config.pool.clone())
    }
}

/// Builds the HTTP client shared by all crawls of a `Crawler`
///
/// The timeout covers the whole request, body included. The user agent is
/// set per request, not on the client.
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs gated GET requests
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    gate: AdmissionGate,
}

impl Fetcher {
    pub fn new(client: Client, gate: AdmissionGate) -> Self {
        Self { client, gate }
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Fetches `url` with the given identity
    ///
    /// Waits for an admission slot first. The slot travels with the returned
    /// page and is released when the page is dropped, so a body that is still
    /// streaming keeps counting against the gate. Non-2xx responses are
    /// returned as pages; only transport failures are errors.
    pub async fn fetch(
        &self,
        url: &Url,
        user_agent: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedPage, FetchError> {
        let slot = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            slot = self.gate.acquire() => slot?,
        };

        let request = self
            .client
            .get(url.as_str())
            .header(USER_AGENT, user_agent);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = request.send() => result?,
        };

        Ok(FetchedPage {
            status: response.status(),
            url: response.url().clone(),
            response,
            cancel: cancel.clone(),
            _slot: slot,
        })
    }
}

/// A response whose body has not been read yet
#[derive(Debug)]
pub struct FetchedPage {
    status: StatusCode,
    url: Url,
    response: Response,
    cancel: CancellationToken,
    _slot: FetchSlot,
}

impl FetchedPage {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Final URL after redirects
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// True unless the server declared a non-HTML body
    pub fn is_html(&self) -> bool {
        match self.response.headers().get(CONTENT_TYPE) {
            None => true,
            Some(value) => value.to_str().map(is_html_content_type).unwrap_or(false),
        }
    }

    /// Next body chunk, or `None` at end of body
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, FetchError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(FetchError::Cancelled),
            chunk = self.response.chunk() => Ok(chunk?),
        }
    }

    /// Reads the remaining body into memory
    pub async fn bytes(mut self) -> Result<Vec<u8>, FetchError> {
        let mut body = Vec::new();
        while let Some(chunk) = self.chunk().await? {
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

fn is_html_content_type(value: &str) -> bool {
    let mime = value.split(';').next().unwrap_or("").trim();
    mime.eq_ignore_ascii_case("text/html") || mime.eq_ignore_ascii_case("application/xhtml+xml")
}
