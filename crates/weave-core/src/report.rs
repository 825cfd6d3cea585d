//! End-of-search reports and where they go.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use weave_explore::SearchState;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("report I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Final counts of one search. Always produced, however many oracle calls
/// failed along the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub strategy: String,
    pub states_seen: usize,
    pub traces_seen: usize,
    pub iterations: u64,
    pub random_iterations: u64,
    pub candidates_enqueued: u64,
    pub mutation_failures: u64,
    /// Distinct states seen after each scored iteration, starting at 0.
    pub state_history: Vec<usize>,
    /// State renderings in discovery order.
    pub discovered_states: Vec<String>,
}

impl SearchReport {
    pub fn from_search(strategy: impl Into<String>, search: &SearchState) -> Self {
        Self {
            strategy: strategy.into(),
            states_seen: search.states_seen(),
            traces_seen: search.traces_seen(),
            iterations: search.iterations(),
            random_iterations: search.random_iterations(),
            candidates_enqueued: search.candidates_enqueued(),
            mutation_failures: search.mutation_failures(),
            state_history: search.state_history().to_vec(),
            discovered_states: search.discovered_states().to_vec(),
        }
    }

    /// `(index, distinct states)` pairs of the state history.
    pub fn history_rows(&self) -> Vec<(usize, usize)> {
        self.state_history.iter().copied().enumerate().collect()
    }
}

/// Destination of the end-of-search report.
pub trait ReportSink {
    fn write(&mut self, report: &SearchReport) -> Result<(), ReportError>;
}

/// Keeps reports in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub reports: Vec<SearchReport>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&SearchReport> {
        self.reports.last()
    }
}

impl ReportSink for MemorySink {
    fn write(&mut self, report: &SearchReport) -> Result<(), ReportError> {
        self.reports.push(report.clone());
        Ok(())
    }
}

/// Writes `{prefix}.json` (the full report) and `{prefix}_states.txt` (one
/// state rendering per line).
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    prefix: PathBuf,
}

impl JsonFileSink {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn report_path(&self) -> PathBuf {
        with_suffix(&self.prefix, ".json")
    }

    pub fn states_path(&self) -> PathBuf {
        with_suffix(&self.prefix, "_states.txt")
    }
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = prefix.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

impl ReportSink for JsonFileSink {
    fn write(&mut self, report: &SearchReport) -> Result<(), ReportError> {
        let report_path = self.report_path();
        let mut out = BufWriter::new(fs::File::create(&report_path)?);
        serde_json::to_writer_pretty(&mut out, report)?;
        out.flush()?;

        let states_path = self.states_path();
        let mut out = BufWriter::new(fs::File::create(&states_path)?);
        for state in &report.discovered_states {
            writeln!(out, "{state}")?;
        }
        out.flush()?;

        info!(
            "wrote report to {} and {}",
            report_path.display(),
            states_path.display()
        );
        Ok(())
    }
}
