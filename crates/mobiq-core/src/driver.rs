//! Automation driver trait for backend-agnostic UI automation.
//!
//! This module defines the [`AutomationDriver`] trait, the session boundary
//! between the page layer and whatever actually talks to the device. The
//! production backend is [`AppiumDriver`](crate::appium::AppiumDriver), which
//! speaks W3C WebDriver to an Appium server; tests plug in in-process fakes.
//!
//! Every method maps to one remote command. The trait carries no waiting or
//! retry logic of its own: waits live in [`crate::wait`], above the driver.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::element::{ElementId, Rect};
use crate::gesture::PointerSequence;
use crate::locator::Locator;

/// Errors that can occur during automation driver operations.
///
/// This enum unifies errors from all backends behind a single type, allowing
/// the wait engine and page layer to classify them uniformly.
#[derive(Error, Debug)]
pub enum DriverError {
    /// No element matched the locator.
    #[error("no such element: {0}")]
    NoSuchElement(String),

    /// The element handle refers to a widget that is gone or was redrawn.
    #[error("stale element reference: {0}")]
    StaleElement(String),

    /// The element exists but cannot receive the interaction.
    #[error("element not interactable: {0}")]
    NotInteractable(String),

    /// The server refused to create a session.
    #[error("session not created: {0}")]
    SessionNotCreated(String),

    /// The session was deleted or never created.
    #[error("Not connected to automation backend")]
    NotConnected,

    /// The HTTP connection to the server failed.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// An operation timed out on the server or transport.
    #[error("Operation timed out")]
    Timeout,

    /// Any other remote command failure, with the W3C error code.
    #[error("{error}: {message}")]
    CommandFailed { error: String, message: String },

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a response payload.
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

impl DriverError {
    /// Returns `true` for errors that mean "the element is not there (yet)".
    ///
    /// The wait engine keeps polling through these and propagates everything
    /// else.
    pub fn is_absent(&self) -> bool {
        matches!(self, DriverError::NoSuchElement(_) | DriverError::StaleElement(_))
    }
}

/// Trait for backend-agnostic mobile UI automation.
///
/// Implementors search the live UI tree for a [`Locator`], report geometry and
/// attributes of element handles, and accept click, text and gesture
/// commands. A driver instance owns exactly one automation session; it is
/// shared by reference-counting within a scenario and never across scenarios.
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Find every element currently matching `locator`.
    ///
    /// An empty vector means nothing matched; it is not an error.
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementId>, DriverError>;

    /// Find the first element matching `locator`.
    ///
    /// The default implementation calls
    /// [`find_elements`](AutomationDriver::find_elements) and takes the first
    /// match. Backends with a single-element command can override it.
    async fn find_element(&self, locator: &Locator) -> Result<Option<ElementId>, DriverError> {
        Ok(self.find_elements(locator).await?.into_iter().next())
    }

    /// The element's bounds at the time of the call.
    async fn element_rect(&self, element: &ElementId) -> Result<Rect, DriverError>;

    /// The element's visible text.
    async fn element_text(&self, element: &ElementId) -> Result<String, DriverError>;

    /// A named attribute of the element, `None` when absent.
    async fn element_attribute(
        &self,
        element: &ElementId,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    async fn is_displayed(&self, element: &ElementId) -> Result<bool, DriverError>;

    async fn is_enabled(&self, element: &ElementId) -> Result<bool, DriverError>;

    async fn click(&self, element: &ElementId) -> Result<(), DriverError>;

    /// Clear an editable element's content.
    async fn clear(&self, element: &ElementId) -> Result<(), DriverError>;

    /// Type `text` into the element exactly as given.
    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<(), DriverError>;

    /// Perform a pointer gesture as one atomic input batch.
    async fn perform_actions(&self, sequence: &PointerSequence) -> Result<(), DriverError>;

    /// Set the server-side implicit wait for element lookups.
    async fn set_implicit_wait(&self, timeout: Duration) -> Result<(), DriverError>;

    /// Capture the current screen as PNG bytes.
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    /// End the automation session. Further calls fail with
    /// [`DriverError::NotConnected`].
    async fn quit(&self) -> Result<(), DriverError>;
}
