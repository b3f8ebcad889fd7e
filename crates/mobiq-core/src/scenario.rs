//! Scenario definition and the sequential runner.
//!
//! A [`Scenario`] is a named, tagged, linear script over the page objects.
//! The [`Runner`] gives every scenario a fresh automation session, runs it,
//! captures a screenshot, writes the result file and always ends the
//! session, whatever the scenario's outcome.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};

use crate::appium::SessionFactory;
use crate::config::MobiqConfig;
use crate::driver::{AutomationDriver, DriverError};
use crate::gesture::DragTiming;
use crate::page::{BasePage, PageError};
use crate::pages::{DragPage, FormsPage};
use crate::report::{Reporter, ScenarioReport, ScenarioStatus};
use crate::step::{traced, Journal};
use crate::wait::Wait;

/// Why a scenario stopped.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// An expectation about the app's state did not hold.
    #[error("{0}")]
    Assertion(String),

    #[error(transparent)]
    Page(#[from] PageError),

    #[error("Failed to open session: {0}")]
    Session(DriverError),
}

impl ScenarioError {
    pub fn status(&self) -> ScenarioStatus {
        match self {
            ScenarioError::Assertion(_) => ScenarioStatus::Failed,
            ScenarioError::Page(_) | ScenarioError::Session(_) => ScenarioStatus::Broken,
        }
    }
}

impl From<DriverError> for ScenarioError {
    fn from(e: DriverError) -> Self {
        ScenarioError::Page(PageError::Driver(e))
    }
}

/// What a scenario body receives: the page objects bound to its session.
#[derive(Clone)]
pub struct ScenarioContext {
    base: BasePage,
}

impl ScenarioContext {
    pub fn new(base: BasePage) -> Self {
        Self { base }
    }

    pub fn drag_page(&self) -> DragPage {
        DragPage::new(self.base.clone())
    }

    pub fn forms_page(&self) -> FormsPage {
        FormsPage::new(self.base.clone())
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    /// Records a verification step; fails the scenario with `message` when
    /// `condition` is false.
    pub async fn verify(
        &self,
        description: &str,
        condition: bool,
        message: impl Into<String>,
    ) -> Result<(), ScenarioError> {
        let message = message.into();
        traced(self.base.journal(), "verify", description, async {
            if condition {
                Ok(())
            } else {
                Err(ScenarioError::Assertion(message))
            }
        })
        .await
    }

    /// Like [`verify`](Self::verify) for an equality, reporting both sides.
    pub async fn verify_eq<T>(&self, description: &str, actual: T, expected: T) -> Result<(), ScenarioError>
    where
        T: PartialEq + Debug,
    {
        let message = format!("Expected {expected:?}, but got {actual:?}");
        self.verify(description, actual == expected, message).await
    }
}

/// Boxed scenario body future.
pub type ScenarioFuture = Pin<Box<dyn Future<Output = Result<(), ScenarioError>> + Send>>;

type Body = Arc<dyn Fn(ScenarioContext) -> ScenarioFuture + Send + Sync>;

/// A named user journey.
#[derive(Clone)]
pub struct Scenario {
    name: String,
    tags: Vec<String>,
    body: Body,
}

impl Scenario {
    pub fn new<F, Fut>(name: impl Into<String>, tags: &[&str], body: F) -> Self
    where
        F: Fn(ScenarioContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ScenarioError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            body: Arc::new(move |ctx| Box::pin(body(ctx))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// `true` when `filter` is empty or shares a tag with this scenario.
    pub fn matches(&self, filter: &[String]) -> bool {
        filter.is_empty() || filter.iter().any(|t| self.tags.contains(t))
    }

    /// Runs the body against `ctx` without any session handling.
    pub async fn run(&self, ctx: ScenarioContext) -> Result<(), ScenarioError> {
        (self.body)(ctx).await
    }
}

impl Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Scenarios from `catalogue` whose tags intersect `filter`.
pub fn select<'a>(catalogue: &'a [Scenario], filter: &[String]) -> Vec<&'a Scenario> {
    catalogue.iter().filter(|s| s.matches(filter)).collect()
}

/// Counts from a finished run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<ScenarioReport>,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.count(ScenarioStatus::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(ScenarioStatus::Failed)
    }

    pub fn broken(&self) -> usize {
        self.count(ScenarioStatus::Broken)
    }

    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(ScenarioReport::passed)
    }

    fn count(&self, status: ScenarioStatus) -> usize {
        self.reports.iter().filter(|r| r.status == status).count()
    }
}

/// Runs scenarios one after another, one session each.
pub struct Runner {
    sessions: Arc<dyn SessionFactory>,
    reporter: Reporter,
    wait: Wait,
    timing: DragTiming,
}

impl Runner {
    pub fn new(sessions: Arc<dyn SessionFactory>, reporter: Reporter) -> Self {
        Self {
            sessions,
            reporter,
            wait: Wait::default(),
            timing: DragTiming::default(),
        }
    }

    pub fn from_config(config: &MobiqConfig, sessions: Arc<dyn SessionFactory>) -> Self {
        Self::new(sessions, Reporter::from_config(config))
            .with_wait(Wait::from(&config.wait))
            .with_timing(config.gesture)
    }

    pub fn with_wait(mut self, wait: Wait) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_timing(mut self, timing: DragTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Runs every scenario in order.
    pub async fn run_all<'a>(&self, scenarios: impl IntoIterator<Item = &'a Scenario>) -> RunSummary {
        let mut summary = RunSummary::default();
        for scenario in scenarios {
            summary.reports.push(self.run(scenario).await);
        }
        info!(
            passed = summary.passed(),
            failed = summary.failed(),
            broken = summary.broken(),
            "Run finished"
        );
        summary
    }

    /// Runs one scenario in a fresh session and records its result.
    pub async fn run(&self, scenario: &Scenario) -> ScenarioReport {
        let span = info_span!("scenario", name = %scenario.name);
        self.run_inner(scenario).instrument(span).await
    }

    async fn run_inner(&self, scenario: &Scenario) -> ScenarioReport {
        let mut report = ScenarioReport::new(&scenario.name, scenario.tags.clone(), Utc::now());
        let journal = Journal::new();
        info!("Starting scenario");

        let result = match self.sessions.open().await {
            Ok(driver) => {
                let base = BasePage::new(driver.clone(), self.wait, "Scenario")
                    .with_timing(self.timing)
                    .with_journal(journal.clone());
                let result = scenario.run(ScenarioContext::new(base)).await;
                report.screenshot = self.capture(driver.as_ref(), &scenario.name).await;
                if let Err(e) = driver.quit().await {
                    warn!(error = %e, "Failed to end session");
                }
                result
            }
            Err(e) => Err(ScenarioError::Session(e)),
        };

        match &result {
            Ok(()) => info!("Scenario passed"),
            Err(e) => {
                error!(error = %e, "Scenario did not pass");
                report.status = e.status();
                report.status_message = Some(e.to_string());
            }
        }
        report.stop = Utc::now().timestamp_millis();
        report.steps = journal.steps().await;

        if let Err(e) = self.reporter.record(&report).await {
            warn!(error = %e, "Failed to write result file");
        }
        report
    }

    /// Best-effort screenshot; failures are logged and yield `None`.
    async fn capture(&self, driver: &dyn AutomationDriver, scenario: &str) -> Option<std::path::PathBuf> {
        let png = match driver.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                warn!(error = %e, "Failed to take screenshot");
                return None;
            }
        };
        match self.reporter.save_screenshot(scenario, &png).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "Failed to save screenshot");
                None
            }
        }
    }
}
