//! Async HTTP transport for the WebDriver wire protocol.
//!
//! This module provides [`WireClient`], a low-level transport that sends
//! [`Command`]s to an Appium server and decodes the replies using
//! [`crate::protocol`]. It knows nothing about sessions beyond the id it is
//! given; session bookkeeping is done by [`AppiumDriver`](crate::appium::AppiumDriver).
//!
//! # Example
//!
//! ```no_run
//! use mobiq_core::client::WireClient;
//! use mobiq_core::protocol::Command;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = WireClient::new("http://localhost:4723/wd/hub")?;
//! let value = client.send(None, &Command::NewSession {
//!     capabilities: serde_json::json!({"platformName": "Android"}),
//! }).await?;
//! println!("{value}");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, debug_span, trace, Instrument};

use crate::driver::DriverError;
use crate::protocol::{decode_reply, Command, HttpMethod, ProtocolError, Reply, WireError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Timeout for establishing a TCP connection to the server.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for a whole request. Session creation installs the app and can
/// take a while on a cold emulator, so this is generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the server.
#[derive(Error, Debug)]
pub enum WireClientError {
    /// The base URL could not be used to build a client.
    #[error("invalid server url: {0}")]
    InvalidUrl(String),

    /// The request could not be delivered or the response not read.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request exceeded its timeout.
    #[error("request timed out")]
    Timeout,

    /// The response could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server returned a WebDriver error object.
    #[error("server error: {}: {}", .0.error, .0.message)]
    Server(WireError),
}

impl From<WireClientError> for DriverError {
    fn from(err: WireClientError) -> Self {
        match err {
            WireClientError::InvalidUrl(msg) | WireClientError::ConnectionFailed(msg) => {
                DriverError::ConnectionLost(msg)
            }
            WireClientError::Timeout => DriverError::Timeout,
            WireClientError::Protocol(e) => e.into(),
            WireClientError::Server(e) => e.into(),
        }
    }
}

impl From<reqwest::Error> for WireClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WireClientError::Timeout
        } else {
            WireClientError::ConnectionFailed(err.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// WireClient
// ---------------------------------------------------------------------------

/// HTTP client bound to one server base URL.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct WireClient {
    http: reqwest::Client,
    base_url: String,
}

impl WireClient {
    /// Create a client for the server at `base_url` (e.g.
    /// `http://localhost:4723/wd/hub`). No connection is made yet.
    pub fn new(base_url: impl Into<String>) -> Result<Self, WireClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(WireClientError::InvalidUrl(base_url));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WireClientError::InvalidUrl(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a command and return the decoded `value` payload.
    ///
    /// Server error objects are returned as [`WireClientError::Server`] so
    /// callers can treat all failures uniformly via the error type, whatever
    /// the HTTP status.
    pub async fn send(
        &self,
        session: Option<&str>,
        command: &Command,
    ) -> Result<Value, WireClientError> {
        let name = command.name();
        let span = debug_span!("wire_send", command = name);
        async {
            let url = format!("{}{}", self.base_url, command.path(session));
            let request = match command.method() {
                HttpMethod::Get => self.http.get(&url),
                HttpMethod::Post => self.http.post(&url),
                HttpMethod::Delete => self.http.delete(&url),
            };
            let request = match command.body() {
                Some(body) => request.json(&body),
                None => request,
            };

            debug!(%url, "sending");
            let response = request.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            trace!(%status, len = bytes.len(), "received");

            match decode_reply(&bytes)? {
                Reply::Value(value) => Ok(value),
                Reply::Error(err) => Err(WireClientError::Server(err)),
            }
        }
        .instrument(span)
        .await
    }
}
