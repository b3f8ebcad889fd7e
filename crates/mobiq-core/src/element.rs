//! Element handles and geometry.
//!
//! This module defines the data structures describing a resolved UI element:
//! the opaque [`ElementId`] the automation server hands out, the integer
//! [`Rect`] describing its on-screen bounds, and [`Element`], which binds an id
//! to the driver session that owns it.
//!
//! Handles are never cached across screen transitions. A handle whose widget
//! was removed or redrawn is stale; the driver reports that as
//! [`DriverError::StaleElement`](crate::driver::DriverError::StaleElement).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::driver::{AutomationDriver, DriverError};
use crate::locator::Locator;

/// Opaque reference to a live element in the remote UI tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The bounds of an element at resolution time.
///
/// Coordinates are screen pixels with the origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    /// The x-coordinate of the top-left corner.
    pub x: i32,
    /// The y-coordinate of the top-left corner.
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The center point, using floor division on the half extents.
    pub fn center(&self) -> Point {
        Point {
            x: self.x.saturating_add(self.width.div_euclid(2)),
            y: self.y.saturating_add(self.height.div_euclid(2)),
        }
    }

    /// Returns `true` if `point` lies inside the rectangle (right/bottom edge exclusive).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

/// A resolved element bound to its driver session.
///
/// Produced by the page primitives. The locator that resolved the element is
/// kept for logging and error messages.
#[derive(Clone)]
pub struct Element {
    driver: Arc<dyn AutomationDriver>,
    id: ElementId,
    locator: Locator,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id)
            .field("locator", &self.locator)
            .finish()
    }
}

impl Element {
    pub fn new(driver: Arc<dyn AutomationDriver>, id: ElementId, locator: Locator) -> Self {
        Self {
            driver,
            id,
            locator,
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub async fn rect(&self) -> Result<Rect, DriverError> {
        self.driver.element_rect(&self.id).await
    }

    pub async fn text(&self) -> Result<String, DriverError> {
        self.driver.element_text(&self.id).await
    }

    pub async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        self.driver.element_attribute(&self.id, name).await
    }

    pub async fn is_displayed(&self) -> Result<bool, DriverError> {
        self.driver.is_displayed(&self.id).await
    }

    pub async fn is_enabled(&self) -> Result<bool, DriverError> {
        self.driver.is_enabled(&self.id).await
    }

    pub async fn click(&self) -> Result<(), DriverError> {
        self.driver.click(&self.id).await
    }

    pub async fn clear(&self) -> Result<(), DriverError> {
        self.driver.clear(&self.id).await
    }

    /// Sends `text` verbatim to the element.
    pub async fn send_keys(&self, text: &str) -> Result<(), DriverError> {
        self.driver.send_keys(&self.id, text).await
    }

    /// Clears existing content, then sends `text` verbatim.
    pub async fn clear_and_type(&self, text: &str) -> Result<(), DriverError> {
        self.clear().await?;
        self.send_keys(text).await
    }
}
