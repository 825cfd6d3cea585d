//! Search configuration.
//!
//! Every field has a default, so a JSON document only needs to name what it
//! changes. Values are checked by [`FuzzConfig::validate`] before a
//! scheduler is built from them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use weave_explore::RunMode;
use weave_mutate::MutatorKind;
use weave_oracle::{OracleEndpoint, OracleError};
use weave_trace::LowLevelTrace;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid run mode {0} (expected 0, 1 or 2)")]
    RunMode(u8),

    #[error("oracle port must be non-zero")]
    OraclePort,

    #[error("oracle timeout must be non-zero")]
    OracleTimeout,

    #[error("the replay strategy needs a replay_path")]
    MissingReplayPath,

    #[error("state oracle unavailable: {0}")]
    Oracle(#[from] OracleError),
}

/// The strategy placed first in the portfolio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Random,
    InterleavedFuzzing,
    RoundRobinFuzzing,
    /// Asks on stdin; for stepping through a program by hand.
    Console,
    /// Replays the low-level trace at `replay_path`, then explores randomly.
    Replay,
}

impl StrategyKind {
    pub fn is_fuzzing(&self) -> bool {
        matches!(self, StrategyKind::InterleavedFuzzing | StrategyKind::RoundRobinFuzzing)
    }
}

/// Configuration of one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzConfig {
    pub strategy: StrategyKind,
    /// Plain random strategies rotating alongside `strategy`.
    pub portfolio_size: usize,
    /// Global seed every random source is derived from.
    pub seed: u64,
    /// Mutator name: `choice`, `process`, `delay` or `actor`; anything else
    /// disables mutation.
    pub mutator: String,
    /// Delays inserted by the `delay` mutator.
    pub delays: u32,
    /// `0` disabled, `1` state novelty, `2` trace novelty.
    pub run_mode: u8,
    /// Subtracted from operation ids sent to the oracle.
    pub index_offset: i64,
    pub oracle: OracleEndpoint,
    pub iterations: u32,
    /// Report destination prefix; no report files when absent.
    pub output_path: Option<PathBuf>,
    /// JSON low-level trace replayed by [`StrategyKind::Replay`].
    pub replay_path: Option<PathBuf>,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Random,
            portfolio_size: 0,
            seed: 42,
            mutator: "none".to_string(),
            delays: 10,
            run_mode: 1,
            index_offset: 1,
            oracle: OracleEndpoint::default(),
            iterations: 100,
            output_path: None,
            replay_path: None,
        }
    }
}

impl FuzzConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.run_mode()?;
        if self.strategy == StrategyKind::Replay && self.replay_path.is_none() {
            return Err(ConfigError::MissingReplayPath);
        }
        if self.strategy.is_fuzzing() {
            if self.oracle.port == 0 {
                return Err(ConfigError::OraclePort);
            }
            if self.oracle.timeout_ms == 0 {
                return Err(ConfigError::OracleTimeout);
            }
        }
        Ok(())
    }

    pub fn run_mode(&self) -> Result<RunMode, ConfigError> {
        RunMode::from_code(self.run_mode).ok_or(ConfigError::RunMode(self.run_mode))
    }

    pub fn mutator_kind(&self) -> MutatorKind {
        MutatorKind::from_name(&self.mutator)
    }

    /// Read the trace named by `replay_path`.
    pub fn load_replay_trace(&self) -> Result<LowLevelTrace, ConfigError> {
        let path = self.replay_path.as_ref().ok_or(ConfigError::MissingReplayPath)?;
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
