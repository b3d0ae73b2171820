//! Scenario execution engine.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::error::HarnessError;
use crate::scenarios::Scenario;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome, now_utc};

/// Result of one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub operation: String,
    pub passed: bool,
    pub bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errno: Option<i32>,
    pub latency_ns: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Machine-readable summary of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub generated_utc: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<ScenarioResult>,
}

impl RunReport {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Runs scenarios, each in its own scratch directory.
pub struct ScenarioRunner {
    run_id: String,
    scratch_root: PathBuf,
    filter: Option<String>,
}

impl ScenarioRunner {
    /// `scratch_root` is created on demand; per-scenario directories under
    /// it are removed after each scenario.
    #[must_use]
    pub fn new(run_id: impl Into<String>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            run_id: run_id.into(),
            scratch_root: scratch_root.into(),
            filter: None,
        }
    }

    /// Only run scenarios whose name contains `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    pub fn select<'a>(&self, catalog: &'a [Scenario]) -> Vec<&'a Scenario> {
        catalog
            .iter()
            .filter(|s| self.filter.as_deref().is_none_or(|f| s.name.contains(f)))
            .collect()
    }

    pub fn run(
        &self,
        catalog: &[Scenario],
        log: &mut LogEmitter,
    ) -> Result<RunReport, HarnessError> {
        let selected = self.select(catalog);
        if selected.is_empty() {
            return Err(HarnessError::NoScenarios {
                filter: self.filter.clone().unwrap_or_default(),
            });
        }

        log.emit_entry(
            LogEntry::new("", LogLevel::Info, "run_start")
                .with_details(serde_json::json!({ "scenarios": selected.len() })),
        )?;

        let mut results = Vec::with_capacity(selected.len());
        for scenario in selected {
            let result = self.run_one(scenario)?;
            log.emit_entry(result_entry(&result))?;
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.passed).count();
        let report = RunReport {
            run_id: self.run_id.clone(),
            generated_utc: now_utc(),
            total: results.len(),
            passed,
            failed: results.len() - passed,
            results,
        };

        let level = if report.all_passed() { LogLevel::Info } else { LogLevel::Error };
        log.emit_entry(LogEntry::new("", level, "run_end").with_details(serde_json::json!({
            "total": report.total,
            "passed": report.passed,
            "failed": report.failed,
        })))?;
        log.flush()?;
        Ok(report)
    }

    fn run_one(&self, scenario: &Scenario) -> Result<ScenarioResult, HarnessError> {
        let dir = self.scratch_dir(scenario.name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir)?;

        let start = Instant::now();
        let outcome = scenario.run(&dir);
        let latency_ns = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        let _ = std::fs::remove_dir_all(&dir);

        let mut result = ScenarioResult {
            name: scenario.name.to_string(),
            operation: scenario.operation.to_string(),
            passed: outcome.is_ok(),
            bytes: 0,
            exit_code: None,
            errno: None,
            latency_ns,
            message: None,
        };
        match outcome {
            Ok(obs) => {
                result.bytes = obs.bytes;
                result.exit_code = obs.exit_code;
            }
            Err(err) => {
                result.errno = err.errno();
                result.message = Some(err.to_string());
            }
        }
        Ok(result)
    }

    fn scratch_dir(&self, name: &str) -> PathBuf {
        self.scratch_root
            .join(format!("{}-{}", sanitize(&self.run_id), std::process::id()))
            .join(name)
    }

    #[must_use]
    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }
}

fn sanitize(run_id: &str) -> String {
    run_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn result_entry(result: &ScenarioResult) -> LogEntry {
    let (level, outcome) = if result.passed {
        (LogLevel::Info, Outcome::Pass)
    } else {
        (LogLevel::Error, Outcome::Fail)
    };
    let mut entry = LogEntry::new("", level, "scenario_end")
        .with_scenario(&result.name)
        .with_operation(&result.operation)
        .with_outcome(outcome)
        .with_bytes(result.bytes)
        .with_latency_ns(result.latency_ns);
    if let Some(code) = result.exit_code {
        entry = entry.with_exit_code(code);
    }
    if let Some(errno) = result.errno {
        entry = entry.with_errno(errno);
    }
    if let Some(message) = &result.message {
        entry = entry.with_details(serde_json::json!({ "message": message }));
    }
    entry
}
