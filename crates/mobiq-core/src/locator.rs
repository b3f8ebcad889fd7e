//! Symbolic element locators.
//!
//! A [`Locator`] is an immutable `(strategy, selector)` pair describing how to
//! search the live UI tree. Page objects declare their static locators as
//! constants and build parameterised ones on demand.
//!
//! # Example
//!
//! ```
//! use mobiq_core::locator::{Locator, Strategy};
//!
//! const DRAG_TAB: Locator = Locator::accessibility_id("Drag");
//! let tile = Locator::xpath(format!("//*[@content-desc=\"drag-{}\"]", "l1"));
//!
//! assert_eq!(DRAG_TAB.strategy(), Strategy::AccessibilityId);
//! assert_eq!(tile.value(), "//*[@content-desc=\"drag-l1\"]");
//! ```

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The search strategy a locator uses.
///
/// Serialized with the strategy names the W3C WebDriver / Appium protocol
/// expects in the `using` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Match the accessibility identifier (`content-desc` on Android).
    #[serde(rename = "accessibility id")]
    AccessibilityId,
    /// XPath expression over the page source.
    #[serde(rename = "xpath")]
    XPath,
    /// Native resource id.
    #[serde(rename = "id")]
    Id,
    /// Native widget class name.
    #[serde(rename = "class name")]
    ClassName,
    /// UiAutomator selector expression.
    #[serde(rename = "-android uiautomator")]
    UiAutomator,
}

impl Strategy {
    /// The protocol name sent as `using`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::AccessibilityId => "accessibility id",
            Strategy::XPath => "xpath",
            Strategy::Id => "id",
            Strategy::ClassName => "class name",
            Strategy::UiAutomator => "-android uiautomator",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(strategy, selector)` pair identifying UI elements.
///
/// Equality is by value. Locators are never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    #[serde(rename = "using")]
    strategy: Strategy,
    value: Cow<'static, str>,
}

impl Locator {
    /// Builds a locator from a static selector. Usable in `const` items.
    pub const fn new(strategy: Strategy, value: &'static str) -> Self {
        Self {
            strategy,
            value: Cow::Borrowed(value),
        }
    }

    /// Builds a locator from a selector computed at runtime.
    pub fn owned(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: Cow::Owned(value.into()),
        }
    }

    pub const fn accessibility_id(value: &'static str) -> Self {
        Self::new(Strategy::AccessibilityId, value)
    }

    /// XPath locator. Accepts both static and formatted selectors.
    pub fn xpath(value: impl Into<Cow<'static, str>>) -> Self {
        Self {
            strategy: Strategy::XPath,
            value: value.into(),
        }
    }

    /// XPath locator from a static selector, for `const` items.
    pub const fn xpath_static(value: &'static str) -> Self {
        Self::new(Strategy::XPath, value)
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.strategy, self.value)
    }
}
