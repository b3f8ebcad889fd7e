//! Scenario results on disk.
//!
//! The [`Reporter`] owns two directories: one for per-scenario result files
//! (`<uuid>-result.json`) and one for end-of-scenario screenshots
//! (`<scenario>_<YYYY-mm-dd_HH-MM-SS>.png`). The result directory is wiped
//! at the start of a run so results never mix across runs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::MobiqConfig;
use crate::step::StepRecord;

/// Errors from writing the report directories.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Final status of a scenario.
///
/// `Failed` is an assertion that did not hold; `Broken` is any other error
/// (a wait timeout, a driver fault, or a session that could not be opened).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Broken,
}

impl std::fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScenarioStatus::Passed => "passed",
            ScenarioStatus::Failed => "failed",
            ScenarioStatus::Broken => "broken",
        };
        f.pad(s)
    }
}

/// One scenario's result as written to `<uuid>-result.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub uuid: Uuid,
    pub name: String,
    pub tags: Vec<String>,
    pub status: ScenarioStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    /// Epoch milliseconds.
    pub start: i64,
    /// Epoch milliseconds.
    pub stop: i64,
    pub steps: Vec<StepRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

impl ScenarioReport {
    pub fn new(name: impl Into<String>, tags: Vec<String>, started: DateTime<Utc>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            tags,
            status: ScenarioStatus::Passed,
            status_message: None,
            start: started.timestamp_millis(),
            stop: started.timestamp_millis(),
            steps: Vec::new(),
            screenshot: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }

    pub fn duration_ms(&self) -> i64 {
        self.stop - self.start
    }
}

/// Writes screenshots and result files.
#[derive(Debug, Clone)]
pub struct Reporter {
    report_dir: PathBuf,
    screenshots_dir: PathBuf,
}

impl Reporter {
    pub fn new(report_dir: impl Into<PathBuf>, screenshots_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
            screenshots_dir: screenshots_dir.into(),
        }
    }

    pub fn from_config(config: &MobiqConfig) -> Self {
        Self::new(&config.report_dir, &config.screenshots_dir)
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    pub fn screenshots_dir(&self) -> &Path {
        &self.screenshots_dir
    }

    /// Deletes and recreates the result directory.
    pub async fn reset(&self) -> Result<(), ReportError> {
        let dir = &self.report_dir;
        if tokio::fs::try_exists(dir).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(dir).await.map_err(|source| ReportError::Io {
                path: dir.clone(),
                source,
            })?;
            info!(path = %dir.display(), "Cleared previous results");
        }
        create_dir(dir).await
    }

    /// Writes `png` as `<scenario>_<timestamp>.png` and returns the path.
    pub async fn save_screenshot(&self, scenario: &str, png: &[u8]) -> Result<PathBuf, ReportError> {
        create_dir(&self.screenshots_dir).await?;
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = self
            .screenshots_dir
            .join(format!("{}_{timestamp}.png", file_stem(scenario)));
        write(&path, png).await?;
        debug!(path = %path.display(), bytes = png.len(), "Saved screenshot");
        Ok(path)
    }

    /// Writes the result file for `report` and returns its path.
    pub async fn record(&self, report: &ScenarioReport) -> Result<PathBuf, ReportError> {
        create_dir(&self.report_dir).await?;
        let path = self.report_dir.join(format!("{}-result.json", report.uuid));
        let json = serde_json::to_vec_pretty(report)?;
        write(&path, &json).await?;
        debug!(path = %path.display(), scenario = %report.name, "Recorded result");
        Ok(path)
    }
}

async fn create_dir(dir: &Path) -> Result<(), ReportError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ReportError::Io {
            path: dir.to_path_buf(),
            source,
        })
}

async fn write(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Scenario name made safe for use as a file name.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '[' | ']') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
