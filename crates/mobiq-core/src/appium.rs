//! [`AutomationDriver`] implementation backed by an Appium server.
//!
//! This module provides [`AppiumDriver`], which implements the
//! [`AutomationDriver`] trait by sending W3C WebDriver commands through a
//! [`WireClient`]. One driver owns one session: [`AppiumDriver::start`]
//! creates it, [`quit`](AutomationDriver::quit) deletes it.
//!
//! # Example
//!
//! ```no_run
//! use mobiq_core::appium::AppiumDriver;
//! use mobiq_core::config::MobiqConfig;
//! use mobiq_core::driver::AutomationDriver;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MobiqConfig::default();
//! let driver = AppiumDriver::start(&config.server_url, config.capabilities.to_w3c()).await?;
//! let png = driver.screenshot().await?;
//! driver.quit().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::client::WireClient;
use crate::config::MobiqConfig;
use crate::driver::{AutomationDriver, DriverError};
use crate::element::{ElementId, Rect};
use crate::gesture::PointerSequence;
use crate::locator::Locator;
use crate::protocol::{self, Command};

/// An [`AutomationDriver`] speaking W3C WebDriver to Appium.
///
/// The session id is held behind a [`tokio::sync::RwLock`] so that the
/// `&self` trait methods can read it concurrently and `quit` can clear it.
pub struct AppiumDriver {
    client: WireClient,
    session: RwLock<Option<String>>,
}

impl AppiumDriver {
    /// Creates a new session on the server at `server_url`.
    #[instrument(skip(capabilities), level = "debug")]
    pub async fn start(server_url: &str, capabilities: Value) -> Result<Self, DriverError> {
        let client = WireClient::new(server_url)?;
        let value = client
            .send(None, &Command::NewSession { capabilities })
            .await?;
        let session_id = protocol::parse_session_id(&value)?;
        info!(session = %session_id, "session created");
        Ok(Self {
            client,
            session: RwLock::new(Some(session_id)),
        })
    }

    /// Convenience: start a session from a [`MobiqConfig`].
    pub async fn from_config(config: &MobiqConfig) -> Result<Self, DriverError> {
        Self::start(&config.server_url, config.capabilities.to_w3c()).await
    }

    /// The current session id, `None` after `quit`.
    pub async fn session_id(&self) -> Option<String> {
        self.session.read().await.clone()
    }

    /// Sends a session-scoped command.
    async fn send(&self, command: Command) -> Result<Value, DriverError> {
        let guard = self.session.read().await;
        let session = guard.as_deref().ok_or(DriverError::NotConnected)?;
        Ok(self.client.send(Some(session), &command).await?)
    }
}

#[async_trait]
impl AutomationDriver for AppiumDriver {
    #[instrument(skip(self, locator), fields(locator = %locator), level = "debug")]
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementId>, DriverError> {
        let value = self.send(Command::FindElements(locator.clone())).await?;
        let ids = protocol::parse_element_ids(&value)?;
        debug!(count = ids.len(), "elements found");
        Ok(ids)
    }

    async fn element_rect(&self, element: &ElementId) -> Result<Rect, DriverError> {
        let value = self.send(Command::ElementRect(element.clone())).await?;
        Ok(protocol::parse_rect(&value)?)
    }

    async fn element_text(&self, element: &ElementId) -> Result<String, DriverError> {
        let value = self.send(Command::ElementText(element.clone())).await?;
        Ok(protocol::parse_optional_string(&value)?.unwrap_or_default())
    }

    async fn element_attribute(
        &self,
        element: &ElementId,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let value = self
            .send(Command::ElementAttribute(element.clone(), name.to_string()))
            .await?;
        Ok(protocol::parse_optional_string(&value)?)
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool, DriverError> {
        let value = self.send(Command::ElementDisplayed(element.clone())).await?;
        Ok(protocol::parse_bool(&value)?)
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool, DriverError> {
        let value = self.send(Command::ElementEnabled(element.clone())).await?;
        Ok(protocol::parse_bool(&value)?)
    }

    #[instrument(skip(self), level = "debug")]
    async fn click(&self, element: &ElementId) -> Result<(), DriverError> {
        self.send(Command::ElementClick(element.clone())).await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementId) -> Result<(), DriverError> {
        self.send(Command::ElementClear(element.clone())).await?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<(), DriverError> {
        self.send(Command::ElementSendKeys(element.clone(), text.to_string()))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, sequence), fields(steps = sequence.actions().len()), level = "debug")]
    async fn perform_actions(&self, sequence: &PointerSequence) -> Result<(), DriverError> {
        let performed = self.send(Command::PerformActions(sequence.to_w3c())).await;
        // Release even after a failed perform so no pointer stays pressed.
        let released = self.send(Command::ReleaseActions).await;
        performed?;
        released?;
        Ok(())
    }

    async fn set_implicit_wait(&self, timeout: Duration) -> Result<(), DriverError> {
        self.send(Command::SetImplicitWait {
            ms: timeout.as_millis() as u64,
        })
        .await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        let value = self.send(Command::Screenshot).await?;
        Ok(protocol::parse_screenshot(&value)?)
    }

    #[instrument(skip(self), level = "debug")]
    async fn quit(&self) -> Result<(), DriverError> {
        let mut guard = self.session.write().await;
        let session = guard.take().ok_or(DriverError::NotConnected)?;
        self.client
            .send(Some(&session), &Command::DeleteSession)
            .await?;
        info!(session = %session, "session deleted");
        Ok(())
    }
}

/// Opens one automation session per scenario.
///
/// The scenario runner calls [`open`](SessionFactory::open) before each
/// scenario and `quit` on the returned driver afterwards, so scenarios never
/// share a live UI tree.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn AutomationDriver>, DriverError>;
}

/// [`SessionFactory`] creating Appium sessions from a config.
pub struct AppiumSessions {
    server_url: String,
    capabilities: Value,
}

impl AppiumSessions {
    pub fn new(config: &MobiqConfig) -> Self {
        Self {
            server_url: config.server_url.clone(),
            capabilities: config.capabilities.to_w3c(),
        }
    }
}

#[async_trait]
impl SessionFactory for AppiumSessions {
    async fn open(&self) -> Result<Arc<dyn AutomationDriver>, DriverError> {
        let driver = AppiumDriver::start(&self.server_url, self.capabilities.clone()).await?;
        Ok(Arc::new(driver))
    }
}
