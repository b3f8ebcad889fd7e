//! # mobiq-core
//!
//! Page objects, explicit waits and touch gestures for end-to-end UI tests of
//! the WebdriverIO native demo app, driven through an Appium server.
//!
//! ## Modules
//!
//! - [`locator`] - Strategy + selector pairs that identify elements
//! - [`element`] - Element handles, bounds and center points
//! - [`driver`] - The [`AutomationDriver`](driver::AutomationDriver) session boundary
//! - [`protocol`] / [`client`] / [`appium`] - W3C WebDriver over HTTP against Appium
//! - [`wait`] - Polling waits with typed timeout outcomes
//! - [`gesture`] - Pointer sequences for drag and drop
//! - [`step`] - Traced operations and the per-scenario step journal
//! - [`page`] - Action primitives shared by page objects
//! - [`pages`] - The Drag and Forms screens
//! - [`scenario`] / [`scenarios`] - Scenario runner and catalogue
//! - [`report`] - Screenshots and result files
//! - [`config`] - JSON configuration
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mobiq_core::appium::AppiumSessions;
//! use mobiq_core::config::MobiqConfig;
//! use mobiq_core::scenario::{select, Runner};
//! use mobiq_core::scenarios::catalogue;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MobiqConfig::load(None)?;
//! config.validate()?;
//!
//! let runner = Runner::from_config(&config, Arc::new(AppiumSessions::new(&config)));
//! let scenarios = catalogue();
//! let summary = runner.run_all(select(&scenarios, &["drag".to_string()])).await;
//! assert!(summary.all_passed());
//! # Ok(())
//! # }
//! ```

pub mod appium;
pub mod client;
pub mod config;
pub mod driver;
pub mod element;
pub mod gesture;
pub mod locator;
pub mod page;
pub mod pages;
pub mod protocol;
pub mod report;
pub mod scenario;
pub mod scenarios;
pub mod step;
pub mod wait;
