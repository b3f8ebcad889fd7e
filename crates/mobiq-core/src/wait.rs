//! Explicit waits over the live UI tree.
//!
//! A [`Wait`] polls a probe on a fixed interval until it yields a value or the
//! timeout elapses. The probe is always evaluated at least once, and a timeout
//! is never reported before the full budget has elapsed.
//!
//! Probes return `Ok(None)` for "not yet". Driver errors that mean the element
//! is absent ([`DriverError::is_absent`]) are treated the same way; any other
//! error stops the wait and propagates.
//!
//! The three predicates the page layer needs live in [`conditions`].

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::trace;

use crate::config::WaitSettings;
use crate::driver::{AutomationDriver, DriverError};
use crate::element::ElementId;
use crate::locator::Locator;

/// Result of a wait: the resolved value, or a timeout signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Found(T),
    TimedOut { locator: Locator, elapsed: Duration },
}

impl<T> Outcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }

    /// Converts a timeout into the caller's error type.
    pub fn or_else_timeout<E>(self, on_timeout: impl FnOnce(Locator, Duration) -> E) -> Result<T, E> {
        match self {
            Outcome::Found(value) => Ok(value),
            Outcome::TimedOut { locator, elapsed } => Err(on_timeout(locator, elapsed)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Found(value) => Outcome::Found(f(value)),
            Outcome::TimedOut { locator, elapsed } => Outcome::TimedOut { locator, elapsed },
        }
    }
}

/// A polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    timeout: Duration,
    poll_interval: Duration,
}

impl Wait {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Polls `probe` until it yields a value or the timeout elapses.
    ///
    /// `locator` is carried into the timeout signal.
    pub async fn until<T, F, Fut>(&self, locator: &Locator, mut probe: F) -> Result<Outcome<T>, DriverError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, DriverError>>,
    {
        let start = Instant::now();
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match probe().await {
                Ok(Some(value)) => return Ok(Outcome::Found(value)),
                Ok(None) => {}
                Err(e) if e.is_absent() => trace!(%locator, error = %e, "not present yet"),
                Err(e) => return Err(e),
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                trace!(%locator, attempts, "wait timed out");
                return Ok(Outcome::TimedOut {
                    locator: locator.clone(),
                    elapsed,
                });
            }
            sleep(self.poll_interval.min(self.timeout - elapsed)).await;
        }
    }

    /// Waits until at least one element matches `locator`.
    pub async fn for_presence(
        &self,
        driver: &dyn AutomationDriver,
        locator: &Locator,
    ) -> Result<Outcome<ElementId>, DriverError> {
        self.until(locator, || conditions::presence(driver, locator)).await
    }

    /// Waits until an element matching `locator` is displayed and enabled.
    pub async fn for_clickable(
        &self,
        driver: &dyn AutomationDriver,
        locator: &Locator,
    ) -> Result<Outcome<ElementId>, DriverError> {
        self.until(locator, || conditions::clickable(driver, locator)).await
    }

    /// Waits until the collection matching `locator` is non-empty.
    pub async fn for_non_empty(
        &self,
        driver: &dyn AutomationDriver,
        locator: &Locator,
    ) -> Result<Outcome<Vec<ElementId>>, DriverError> {
        self.until(locator, || conditions::non_empty(driver, locator)).await
    }
}

impl Default for Wait {
    fn default() -> Self {
        Self::from(&WaitSettings::default())
    }
}

impl From<&WaitSettings> for Wait {
    fn from(settings: &WaitSettings) -> Self {
        Self::new(settings.timeout(), settings.poll_interval())
    }
}

/// Predicates evaluated against the live tree.
pub mod conditions {
    use super::*;

    /// The first element matching `locator`, if any.
    pub async fn presence(
        driver: &dyn AutomationDriver,
        locator: &Locator,
    ) -> Result<Option<ElementId>, DriverError> {
        driver.find_element(locator).await
    }

    /// The first matching element if it is displayed and enabled.
    pub async fn clickable(
        driver: &dyn AutomationDriver,
        locator: &Locator,
    ) -> Result<Option<ElementId>, DriverError> {
        let Some(id) = driver.find_element(locator).await? else {
            return Ok(None);
        };
        if driver.is_displayed(&id).await? && driver.is_enabled(&id).await? {
            Ok(Some(id))
        } else {
            Ok(None)
        }
    }

    /// All matching elements, or `None` while the collection is empty.
    pub async fn non_empty(
        driver: &dyn AutomationDriver,
        locator: &Locator,
    ) -> Result<Option<Vec<ElementId>>, DriverError> {
        let ids = driver.find_elements(locator).await?;
        Ok(if ids.is_empty() { None } else { Some(ids) })
    }
}
