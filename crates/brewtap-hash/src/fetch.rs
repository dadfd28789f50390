//! Retrieving artifact bytes over HTTP(S).
//!
//! The [`Fetch`] trait is the seam between hashing and the network so the
//! hasher can be driven by an in-memory source in tests.

use std::io::Read;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while downloading an artifact.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status.
    #[error("failed to download {url}: {code} {reason}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        code: u16,
        /// The canonical reason phrase for `code`, if known.
        reason: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("failed to download {url}: {message}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// The underlying transport error.
        message: String,
    },

    /// The response body could not be read to the end.
    #[error("failed to read response body from {url}: {source}")]
    Read {
        /// The URL that was requested.
        url: String,
        /// The I/O error raised while streaming.
        source: std::io::Error,
    },
}

impl FetchError {
    /// The URL whose download failed.
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. } | Self::Transport { url, .. } | Self::Read { url, .. } => url,
        }
    }
}

/// A specialized `Result` type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;

// ---------------------------------------------------------------------------
// Fetch trait
// ---------------------------------------------------------------------------

/// Opens a byte stream for a URL.
///
/// Implementations must report any non-success response as an error rather
/// than handing back an error page to hash.
pub trait Fetch {
    /// Start downloading `url` and return a reader over the response body.
    fn open(&self, url: &str) -> Result<Box<dyn Read>>;
}

impl<F: Fetch + ?Sized> Fetch for &F {
    fn open(&self, url: &str) -> Result<Box<dyn Read>> {
        (**self).open(url)
    }
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// [`Fetch`] over HTTP(S) using a blocking `ureq` agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Creates a fetcher. `timeout` bounds each whole request, including the
    /// body; `None` leaves it to the transport defaults.
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            // Statuses are inspected in `open` so the error can name them.
            .http_status_as_error(false)
            .timeout_global(timeout)
            .user_agent(concat!("brewtap/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Fetch for HttpFetcher {
    fn open(&self, url: &str) -> Result<Box<dyn Read>> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "artifact response");
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        Ok(Box::new(response.into_body().into_reader()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
