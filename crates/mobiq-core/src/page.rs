//! Action primitives shared by every page object.
//!
//! [`BasePage`] composes the wait engine with element resolution: every
//! primitive re-resolves its locator against the live tree, waits with the
//! configured budget, logs the attempt and the outcome, and converts a wait
//! timeout into a typed [`PageError`]. Timeouts never leave this module as
//! [`Outcome::TimedOut`](crate::wait::Outcome::TimedOut).
//!
//! Each primitive is recorded as a step in the page's [`Journal`].

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info};

use crate::config::MobiqConfig;
use crate::driver::{AutomationDriver, DriverError};
use crate::element::Element;
use crate::gesture::{DragTiming, PointerSequence};
use crate::locator::Locator;
use crate::step::{traced, Journal};
use crate::wait::{Outcome, Wait};

/// Errors surfaced by the action primitives.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("Element with locator {locator} not found within {}ms", .waited.as_millis())]
    ElementNotFound { locator: Locator, waited: Duration },

    #[error("No elements with locator {locator} found within {}ms", .waited.as_millis())]
    NoElementsFound { locator: Locator, waited: Duration },

    #[error("Element with locator {locator} not clickable within {}ms", .waited.as_millis())]
    ElementNotClickable { locator: Locator, waited: Duration },

    /// A driver fault outside the wait, e.g. the element detached between
    /// resolution and click.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl PageError {
    /// The locator a timeout-derived error refers to.
    pub fn locator(&self) -> Option<&Locator> {
        match self {
            PageError::ElementNotFound { locator, .. }
            | PageError::NoElementsFound { locator, .. }
            | PageError::ElementNotClickable { locator, .. } => Some(locator),
            PageError::Driver(_) => None,
        }
    }

    /// Returns `true` for the three timeout-derived variants.
    pub fn is_timeout(&self) -> bool {
        self.locator().is_some()
    }
}

/// Shared state and primitives for page objects.
///
/// Cheap to clone; clones share the driver session and the journal.
#[derive(Clone)]
pub struct BasePage {
    driver: Arc<dyn AutomationDriver>,
    wait: Wait,
    timing: DragTiming,
    journal: Arc<Journal>,
    page: &'static str,
}

impl BasePage {
    /// Creates a page bound to `driver` with the given wait budget.
    pub fn new(driver: Arc<dyn AutomationDriver>, wait: Wait, page: &'static str) -> Self {
        Self {
            driver,
            wait,
            timing: DragTiming::default(),
            journal: Journal::new(),
            page,
        }
    }

    /// Creates a page using the wait and gesture settings from `config`.
    pub fn with_config(
        driver: Arc<dyn AutomationDriver>,
        config: &MobiqConfig,
        page: &'static str,
    ) -> Self {
        Self::new(driver, Wait::from(&config.wait), page).with_timing(config.gesture)
    }

    /// Records steps into `journal` instead of a private one.
    pub fn with_journal(mut self, journal: Arc<Journal>) -> Self {
        self.journal = journal;
        self
    }

    pub fn with_timing(mut self, timing: DragTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Rebinds the same session, budget and journal to another page name.
    pub fn for_page(&self, page: &'static str) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    pub fn driver(&self) -> &Arc<dyn AutomationDriver> {
        &self.driver
    }

    pub fn journal(&self) -> &Arc<Journal> {
        &self.journal
    }

    pub fn wait(&self) -> Wait {
        self.wait
    }

    pub fn page_name(&self) -> &'static str {
        self.page
    }

    fn element(&self, id: crate::element::ElementId, locator: &Locator) -> Element {
        Element::new(self.driver.clone(), id, locator.clone())
    }

    /// Runs `operation` as a step of this page's journal.
    pub async fn step<T, Fut>(&self, name: &str, detail: impl Into<String>, operation: Fut) -> Result<T, PageError>
    where
        Fut: std::future::Future<Output = Result<T, PageError>>,
    {
        traced(&self.journal, name, detail, operation).await
    }

    /// Waits for an element to be present and returns it.
    pub async fn find(&self, locator: &Locator) -> Result<Element, PageError> {
        self.step("find", locator.to_string(), self.find_untraced(locator))
            .await
    }

    async fn find_untraced(&self, locator: &Locator) -> Result<Element, PageError> {
        info!(page = self.page, %locator, "Looking for element");
        match self.wait.for_presence(self.driver.as_ref(), locator).await? {
            Outcome::Found(id) => {
                info!(page = self.page, %locator, "Element found");
                Ok(self.element(id, locator))
            }
            Outcome::TimedOut { locator, elapsed } => {
                error!(page = self.page, %locator, "Element not found within timeout");
                Err(PageError::ElementNotFound {
                    locator,
                    waited: elapsed,
                })
            }
        }
    }

    /// Waits for at least one element and returns every match.
    ///
    /// On success the vector is never empty.
    pub async fn find_many(&self, locator: &Locator) -> Result<Vec<Element>, PageError> {
        self.step("find_many", locator.to_string(), async {
            info!(page = self.page, %locator, "Looking for multiple elements");
            let ids = self
                .wait
                .for_non_empty(self.driver.as_ref(), locator)
                .await?
                .or_else_timeout(|locator, waited| {
                    error!(page = self.page, %locator, "No elements found within timeout");
                    PageError::NoElementsFound { locator, waited }
                })?;
            info!(page = self.page, %locator, count = ids.len(), "Found elements");
            Ok(ids
                .into_iter()
                .map(|id| self.element(id, locator))
                .collect())
        })
        .await
    }

    /// Waits for an element to be clickable, then clicks it.
    pub async fn click(&self, locator: &Locator) -> Result<(), PageError> {
        self.step("click", locator.to_string(), async {
            info!(page = self.page, %locator, "Clicking element");
            let id = self
                .wait
                .for_clickable(self.driver.as_ref(), locator)
                .await?
                .or_else_timeout(|locator, waited| {
                    error!(page = self.page, %locator, "Element not clickable within timeout");
                    PageError::ElementNotClickable { locator, waited }
                })?;
            self.driver.click(&id).await?;
            info!(page = self.page, %locator, "Clicked element");
            Ok(())
        })
        .await
    }

    /// Finds an element, clears it and types `value` verbatim.
    pub async fn type_text(&self, locator: &Locator, value: &str) -> Result<(), PageError> {
        self.step("type_text", format!("{locator} | Value: {value}"), async {
            info!(page = self.page, %locator, value, "Sending keys to element");
            let element = self.find_untraced(locator).await?;
            element.clear_and_type(value).await?;
            info!(page = self.page, %locator, "Keys sent to element");
            Ok(())
        })
        .await
    }

    /// Present-and-displayed check that reports a timeout as `false`.
    ///
    /// Driver faults other than an absent element still propagate.
    pub async fn is_visible(&self, locator: &Locator) -> Result<bool, PageError> {
        self.step("is_visible", locator.to_string(), async {
            match self.find_untraced(locator).await {
                Ok(element) => match element.is_displayed().await {
                    Ok(displayed) => Ok(displayed),
                    Err(e) if e.is_absent() => Ok(false),
                    Err(e) => Err(e.into()),
                },
                Err(e) if e.is_timeout() => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
    }

    /// Drags the center of `source` onto the center of `target` in one
    /// pointer batch.
    pub async fn drag(&self, source: &Locator, target: &Locator) -> Result<(), PageError> {
        self.step("drag", format!("{source} -> {target}"), async {
            let from = self.find_untraced(source).await?.rect().await?.center();
            let to = self.find_untraced(target).await?.rect().await?.center();
            let gesture = PointerSequence::drag(from, to, &self.timing);
            self.driver.perform_actions(&gesture).await?;
            info!(
                page = self.page,
                from_x = from.x,
                from_y = from.y,
                to_x = to.x,
                to_y = to.y,
                "Dragged (center-to-center)"
            );
            Ok(())
        })
        .await
    }

    /// Sets the server-side implicit wait.
    pub async fn set_implicit_wait(&self, timeout: Duration) -> Result<(), PageError> {
        self.step(
            "set_implicit_wait",
            format!("{}ms", timeout.as_millis()),
            async { Ok(self.driver.set_implicit_wait(timeout).await?) },
        )
        .await
    }
}
