//! Step journal and traced operations.
//!
//! Every page-level operation runs through [`traced`], which wraps the
//! operation in a tracing span and appends a [`StepRecord`] to the scenario's
//! [`Journal`]. The wrapper never alters the operation's result; it only
//! observes it.
//!
//! The journal is a ring buffer so a runaway scenario cannot grow it without
//! bound. Records end up in the scenario report.
//!
//! # Example
//!
//! ```
//! use mobiq_core::step::{traced, Journal, StepOutcome};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let journal = Journal::new();
//! let value: Result<u32, String> = traced(&journal, "answer", "", async { Ok(42) }).await;
//! assert_eq!(value, Ok(42));
//! assert_eq!(journal.steps().await[0].outcome, StepOutcome::Passed);
//! # }
//! ```

use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// Maximum number of step records retained per journal.
const MAX_JOURNAL_SIZE: usize = 1000;

/// How a step ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum StepOutcome {
    Passed,
    Failed(String),
}

/// One recorded step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: Uuid,
    /// When the step started.
    pub timestamp: DateTime<Utc>,
    /// Operation name, e.g. `click` or `drag_tile_to`.
    pub name: String,
    /// Rendered arguments.
    pub detail: String,
    pub outcome: StepOutcome,
    pub elapsed_ms: u64,
}

/// Ordered record of the steps a scenario performed.
#[derive(Debug, Default)]
pub struct Journal {
    steps: RwLock<VecDeque<StepRecord>>,
}

impl Journal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Appends a record, evicting the oldest one when full.
    pub async fn record(&self, record: StepRecord) {
        let mut steps = self.steps.write().await;
        if steps.len() >= MAX_JOURNAL_SIZE {
            steps.pop_front();
        }
        steps.push_back(record);
    }

    /// All records in chronological order.
    pub async fn steps(&self) -> Vec<StepRecord> {
        self.steps.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.steps.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.steps.read().await.is_empty()
    }
}

/// Runs `operation` as a named step.
///
/// Opens an `info` span named `step`, awaits the operation inside it, and
/// records the name, `detail`, outcome and elapsed time in `journal`. The
/// operation's result is returned untouched.
pub async fn traced<T, E, Fut>(
    journal: &Journal,
    name: &str,
    detail: impl Into<String>,
    operation: Fut,
) -> Result<T, E>
where
    E: Display,
    Fut: Future<Output = Result<T, E>>,
{
    let detail = detail.into();
    let timestamp = Utc::now();
    let start = Instant::now();
    let span = info_span!("step", step = name, detail = %detail);

    let result = operation.instrument(span).await;

    let outcome = match &result {
        Ok(_) => StepOutcome::Passed,
        Err(e) => StepOutcome::Failed(e.to_string()),
    };
    journal
        .record(StepRecord {
            id: Uuid::new_v4(),
            timestamp,
            name: name.to_string(),
            detail,
            outcome,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
        .await;
    result
}
