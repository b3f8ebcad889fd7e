//! Run configuration for mobiq.
//!
//! Settings live in a JSON file. Lookup order is an explicit path, then
//! `./mobiq.json`, then `~/.mobiq/config.json`; when none exists the defaults
//! below are used, which target the WebdriverIO demo app on a local Android
//! emulator through Appium.
//!
//! # Example
//!
//! ```no_run
//! use mobiq_core::config::MobiqConfig;
//!
//! let config = MobiqConfig::load(None).expect("unreadable config");
//! config.validate().expect("app package missing");
//! println!("server: {}", config.server_url);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::gesture::DragTiming;

const CONFIG_FILENAME: &str = "mobiq.json";

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The application package referenced by the capabilities does not exist.
    #[error("APK file not found at: {0}")]
    AppNotFound(PathBuf),
}

/// Returns the per-user config directory (`~/.mobiq/`).
pub fn mobiq_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mobiq")
}

/// Device and app capabilities for session creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Capabilities {
    pub platform_name: String,
    pub device_name: String,
    pub automation_name: String,
    pub auto_grant_permissions: bool,
    /// Seconds the server waits for a new command before ending the session.
    pub new_command_timeout: u64,
    pub app_package: String,
    pub app_activity: String,
    /// Path to the APK, relative paths resolve against the working directory.
    pub app: PathBuf,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            platform_name: "Android".to_string(),
            device_name: "emulator-5554".to_string(),
            automation_name: "UiAutomator2".to_string(),
            auto_grant_permissions: true,
            new_command_timeout: 300,
            app_package: "com.wdiodemoapp".to_string(),
            app_activity: "com.wdiodemoapp.MainActivity".to_string(),
            app: PathBuf::from("apk").join("test.apk"),
        }
    }
}

impl Capabilities {
    /// Absolute path of the APK.
    pub fn app_path(&self) -> PathBuf {
        if self.app.is_absolute() {
            self.app.clone()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&self.app))
                .unwrap_or_else(|_| self.app.clone())
        }
    }

    /// The W3C `alwaysMatch` object. Everything except `platformName` is an
    /// extension capability and carries the `appium:` prefix.
    pub fn to_w3c(&self) -> Value {
        let mut caps = Map::new();
        caps.insert("platformName".into(), json!(self.platform_name));
        let vendor = [
            ("deviceName", json!(self.device_name)),
            ("automationName", json!(self.automation_name)),
            ("autoGrantPermissions", json!(self.auto_grant_permissions)),
            ("newCommandTimeout", json!(self.new_command_timeout)),
            ("appPackage", json!(self.app_package)),
            ("appActivity", json!(self.app_activity)),
            ("app", json!(self.app_path().to_string_lossy())),
        ];
        for (key, value) in vendor {
            caps.insert(format!("appium:{key}"), value);
        }
        Value::Object(caps)
    }
}

/// Explicit wait settings shared by every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            poll_interval_ms: 500,
        }
    }
}

impl WaitSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobiqConfig {
    /// Base URL of the Appium server.
    pub server_url: String,
    pub capabilities: Capabilities,
    pub wait: WaitSettings,
    pub gesture: DragTiming,
    /// Directory for per-scenario result files. Cleared before each run.
    pub report_dir: PathBuf,
    pub screenshots_dir: PathBuf,
}

impl Default for MobiqConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:4723/wd/hub".to_string(),
            capabilities: Capabilities::default(),
            wait: WaitSettings::default(),
            gesture: DragTiming::default(),
            report_dir: PathBuf::from("allure-results"),
            screenshots_dir: PathBuf::from("screenshots"),
        }
    }
}

impl MobiqConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist and parse. Without one, the first
    /// existing file of `./mobiq.json` and `~/.mobiq/config.json` is used,
    /// falling back to [`Default`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        let candidates = [
            PathBuf::from(CONFIG_FILENAME),
            mobiq_dir().join("config.json"),
        ];
        match candidates.iter().find(|p| p.is_file()) {
            Some(found) => Self::from_file(found),
            None => Ok(Self::default()),
        }
    }

    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save the config as pretty JSON.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Checks that the app package exists before a session is requested.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let app = self.capabilities.app_path();
        if app.exists() {
            Ok(())
        } else {
            Err(ConfigError::AppNotFound(app))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_demo_app() {
        let config = MobiqConfig::default();
        assert_eq!(config.server_url, "http://localhost:4723/wd/hub");
        assert_eq!(config.capabilities.app_package, "com.wdiodemoapp");
        assert_eq!(config.wait.timeout(), Duration::from_secs(15));
        assert_eq!(config.wait.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.report_dir, PathBuf::from("allure-results"));
    }

    #[test]
    fn capabilities_use_vendor_prefix() {
        let caps = Capabilities {
            app: PathBuf::from("/opt/apps/demo.apk"),
            ..Capabilities::default()
        };
        let w3c = caps.to_w3c();
        assert_eq!(w3c["platformName"], "Android");
        assert_eq!(w3c["appium:automationName"], "UiAutomator2");
        assert_eq!(w3c["appium:newCommandTimeout"], 300);
        assert_eq!(w3c["appium:autoGrantPermissions"], true);
        assert_eq!(w3c["appium:app"], "/opt/apps/demo.apk");
        assert!(w3c.get("deviceName").is_none());
    }

    #[test]
    fn relative_app_path_is_made_absolute() {
        let caps = Capabilities::default();
        assert!(caps.app_path().is_absolute());
        assert!(caps.app_path().ends_with("apk/test.apk"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: MobiqConfig = serde_json::from_str(
            r#"{"server_url": "http://10.0.0.2:4723", "wait": {"timeout_ms": 3000}}"#,
        )
        .unwrap();
        assert_eq!(config.server_url, "http://10.0.0.2:4723");
        assert_eq!(config.wait.timeout_ms, 3000);
        assert_eq!(config.wait.poll_interval_ms, 500);
        assert_eq!(config.capabilities, Capabilities::default());
    }

    #[test]
    fn roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mobiq.json");
        let config = MobiqConfig {
            server_url: "http://example:4723".into(),
            ..MobiqConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = MobiqConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = MobiqConfig::load(Some(Path::new("/definitely/not/here.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn validate_reports_missing_app() {
        let config = MobiqConfig {
            capabilities: Capabilities {
                app: PathBuf::from("/definitely/not/here.apk"),
                ..Capabilities::default()
            },
            ..MobiqConfig::default()
        };
        match config.validate() {
            Err(ConfigError::AppNotFound(path)) => {
                assert_eq!(path, PathBuf::from("/definitely/not/here.apk"))
            }
            other => panic!("expected AppNotFound, got {other:?}"),
        }
    }
}
