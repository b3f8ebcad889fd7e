//! W3C WebDriver wire protocol as spoken by Appium.
//!
//! This module maps typed [`Command`]s to HTTP method, path and JSON body, and
//! decodes the `{"value": ...}` response envelope. It performs no I/O; the
//! transport lives in [`crate::client`].
//!
//! # Response envelope
//!
//! ```text
//! success: {"value": <payload>}
//! failure: {"value": {"error": "<code>", "message": "<text>", "stacktrace": "..."}}
//! ```
//!
//! # Example
//!
//! ```
//! use mobiq_core::locator::Locator;
//! use mobiq_core::protocol::{Command, HttpMethod};
//!
//! let cmd = Command::FindElements(Locator::accessibility_id("Drag"));
//! assert_eq!(cmd.method(), HttpMethod::Post);
//! assert_eq!(cmd.path(Some("abc")), "/session/abc/elements");
//! ```

use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::driver::DriverError;
use crate::element::{ElementId, Rect};
use crate::locator::Locator;

/// Key of a W3C web element reference.
pub const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a23c-4f2a6a2d4ff5";

/// Key used by JSONWP-era servers.
pub const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while decoding a response.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// The body is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// A required field is missing from the payload.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The payload has an unexpected shape for the command.
    #[error("unexpected payload: {0}")]
    UnexpectedShape(String),
}

impl From<ProtocolError> for DriverError {
    fn from(err: ProtocolError) -> Self {
        DriverError::JsonParse(err.to_string())
    }
}

/// An error object returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WireError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl From<WireError> for DriverError {
    fn from(err: WireError) -> Self {
        match err.error.as_str() {
            "no such element" => DriverError::NoSuchElement(err.message),
            "stale element reference" => DriverError::StaleElement(err.message),
            "element not interactable" | "element click intercepted" => {
                DriverError::NotInteractable(err.message)
            }
            "session not created" => DriverError::SessionNotCreated(err.message),
            "invalid session id" => DriverError::NotConnected,
            "timeout" | "script timeout" => DriverError::Timeout,
            _ => DriverError::CommandFailed {
                error: err.error,
                message: err.message,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// HTTP method of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

/// A typed WebDriver command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a session with the given `capabilities` object.
    NewSession { capabilities: Value },
    DeleteSession,
    FindElements(Locator),
    ElementRect(ElementId),
    ElementText(ElementId),
    ElementAttribute(ElementId, String),
    ElementDisplayed(ElementId),
    ElementEnabled(ElementId),
    ElementClick(ElementId),
    ElementClear(ElementId),
    ElementSendKeys(ElementId, String),
    /// Perform a pre-serialized `actions` body.
    PerformActions(Value),
    ReleaseActions,
    SetImplicitWait { ms: u64 },
    Screenshot,
}

impl Command {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::NewSession { .. } => "new_session",
            Command::DeleteSession => "delete_session",
            Command::FindElements(_) => "find_elements",
            Command::ElementRect(_) => "element_rect",
            Command::ElementText(_) => "element_text",
            Command::ElementAttribute(..) => "element_attribute",
            Command::ElementDisplayed(_) => "element_displayed",
            Command::ElementEnabled(_) => "element_enabled",
            Command::ElementClick(_) => "element_click",
            Command::ElementClear(_) => "element_clear",
            Command::ElementSendKeys(..) => "element_send_keys",
            Command::PerformActions(_) => "perform_actions",
            Command::ReleaseActions => "release_actions",
            Command::SetImplicitWait { .. } => "set_timeouts",
            Command::Screenshot => "screenshot",
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            Command::ElementRect(_)
            | Command::ElementText(_)
            | Command::ElementAttribute(..)
            | Command::ElementDisplayed(_)
            | Command::ElementEnabled(_)
            | Command::Screenshot => HttpMethod::Get,
            Command::DeleteSession | Command::ReleaseActions => HttpMethod::Delete,
            Command::NewSession { .. }
            | Command::FindElements(_)
            | Command::ElementClick(_)
            | Command::ElementClear(_)
            | Command::ElementSendKeys(..)
            | Command::PerformActions(_)
            | Command::SetImplicitWait { .. } => HttpMethod::Post,
        }
    }

    /// Request path relative to the server base URL.
    ///
    /// `session` is ignored by [`Command::NewSession`] and required by every
    /// other command; callers pass `None` only for session creation.
    pub fn path(&self, session: Option<&str>) -> String {
        let s = session.unwrap_or_default();
        match self {
            Command::NewSession { .. } => "/session".to_string(),
            Command::DeleteSession => format!("/session/{s}"),
            Command::FindElements(_) => format!("/session/{s}/elements"),
            Command::ElementRect(e) => format!("/session/{s}/element/{e}/rect"),
            Command::ElementText(e) => format!("/session/{s}/element/{e}/text"),
            Command::ElementAttribute(e, name) => {
                format!("/session/{s}/element/{e}/attribute/{name}")
            }
            Command::ElementDisplayed(e) => format!("/session/{s}/element/{e}/displayed"),
            Command::ElementEnabled(e) => format!("/session/{s}/element/{e}/enabled"),
            Command::ElementClick(e) => format!("/session/{s}/element/{e}/click"),
            Command::ElementClear(e) => format!("/session/{s}/element/{e}/clear"),
            Command::ElementSendKeys(e, _) => format!("/session/{s}/element/{e}/value"),
            Command::PerformActions(_) | Command::ReleaseActions => {
                format!("/session/{s}/actions")
            }
            Command::SetImplicitWait { .. } => format!("/session/{s}/timeouts"),
            Command::Screenshot => format!("/session/{s}/screenshot"),
        }
    }

    /// JSON body, `None` for bodiless GET/DELETE commands.
    pub fn body(&self) -> Option<Value> {
        match self {
            Command::NewSession { capabilities } => Some(json!({
                "capabilities": {
                    "alwaysMatch": capabilities,
                    "firstMatch": [{}],
                }
            })),
            Command::FindElements(locator) => Some(json!({
                "using": locator.strategy().as_str(),
                "value": locator.value(),
            })),
            Command::ElementClick(_) | Command::ElementClear(_) => Some(json!({})),
            // `value` carries the text split per character for servers
            // that still read the legacy field.
            Command::ElementSendKeys(_, text) => Some(json!({
                "text": text,
                "value": text.chars().map(String::from).collect::<Vec<_>>(),
            })),
            Command::PerformActions(actions) => Some(actions.clone()),
            Command::SetImplicitWait { ms } => Some(json!({ "implicit": ms })),
            Command::DeleteSession
            | Command::ReleaseActions
            | Command::ElementRect(_)
            | Command::ElementText(_)
            | Command::ElementAttribute(..)
            | Command::ElementDisplayed(_)
            | Command::ElementEnabled(_)
            | Command::Screenshot => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// A decoded response: either the `value` payload or a server error.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Value(Value),
    Error(WireError),
}

/// Decode a response body into a [`Reply`].
///
/// Bodies without a `value` key decode to `Value::Null`, which is what
/// several servers send for commands without a result.
pub fn decode_reply(body: &[u8]) -> Result<Reply, ProtocolError> {
    if body.is_empty() {
        return Ok(Reply::Value(Value::Null));
    }
    let mut envelope: Value =
        serde_json::from_slice(body).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
    let value = envelope
        .get_mut("value")
        .map(Value::take)
        .unwrap_or(Value::Null);

    if value.get("error").and_then(Value::as_str).is_some() {
        let err: WireError = serde_json::from_value(value)
            .map_err(|e| ProtocolError::UnexpectedShape(e.to_string()))?;
        return Ok(Reply::Error(err));
    }
    Ok(Reply::Value(value))
}

/// Extract the session id from a new-session payload.
pub fn parse_session_id(value: &Value) -> Result<String, ProtocolError> {
    value
        .get("sessionId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ProtocolError::MissingField("sessionId"))
}

fn element_ref(value: &Value) -> Option<ElementId> {
    value
        .get(W3C_ELEMENT_KEY)
        .or_else(|| value.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(ElementId::new)
}

/// Extract element references from a find-elements payload.
pub fn parse_element_ids(value: &Value) -> Result<Vec<ElementId>, ProtocolError> {
    let items = value
        .as_array()
        .ok_or_else(|| ProtocolError::UnexpectedShape(format!("expected array, got {value}")))?;
    items
        .iter()
        .map(|item| element_ref(item).ok_or(ProtocolError::MissingField(W3C_ELEMENT_KEY)))
        .collect()
}

#[derive(Deserialize)]
struct WireRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Extract an element rect. Fractional pixels are floored.
pub fn parse_rect(value: &Value) -> Result<Rect, ProtocolError> {
    let r: WireRect = serde_json::from_value(value.clone())
        .map_err(|e| ProtocolError::UnexpectedShape(e.to_string()))?;
    Ok(Rect::new(
        r.x.floor() as i32,
        r.y.floor() as i32,
        r.width.floor() as i32,
        r.height.floor() as i32,
    ))
}

/// Booleans arrive as JSON booleans, or as `"true"`/`"false"` strings from
/// some drivers.
pub fn parse_bool(value: &Value) -> Result<bool, ProtocolError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => Ok(s == "true"),
        other => Err(ProtocolError::UnexpectedShape(format!("expected bool, got {other}"))),
    }
}

/// Attribute values; `null` means the attribute is absent.
pub fn parse_optional_string(value: &Value) -> Result<Option<String>, ProtocolError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(ProtocolError::UnexpectedShape(format!("expected string, got {other}"))),
    }
}

/// Decode a base64 screenshot payload into PNG bytes.
pub fn parse_screenshot(value: &Value) -> Result<Vec<u8>, ProtocolError> {
    let b64 = value
        .as_str()
        .ok_or_else(|| ProtocolError::UnexpectedShape("screenshot is not a string".into()))?;
    // Some servers wrap the payload in newlines.
    let cleaned: String = b64.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| ProtocolError::UnexpectedShape(format!("invalid base64: {e}")))
}
