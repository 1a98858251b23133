//! # Config — Sweep Parameters, TOML Overlay, Validation
//!
//! A sweep is fully described by `SweepConfig`. Values come from three
//! layers, later ones winning:
//!
//! 1. built-in defaults (B = 1000, R = 25, e = 47, …);
//! 2. an optional TOML file (`--config sweep.toml`), every key optional;
//! 3. command-line flags / `Q47_*` environment variables.
//!
//! ```toml
//! n_start = 1_000_000_000
//! n_end = 2_000_000_000
//! sieve_bound = 1000
//! mr_rounds = 25
//! block_size = 10000
//! progress_interval = 10000000
//! ```
//!
//! `validate` runs before the sieve tables are built, so a bad range fails
//! fast with `SweepError::Configuration`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SweepError;
use crate::form::{PowerDifference, CENSUS_EXPONENT};
use crate::oracle::DEFAULT_MR_ROUNDS;
use crate::sieve::{DEFAULT_SIEVE_BOUND, MAX_SIEVE_BOUND};

/// Candidates per parallel block.
pub const DEFAULT_BLOCK_SIZE: u64 = 10_000;
/// Integers scanned between progress observations.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000_000;
/// Seconds between checkpoint writes.
pub const DEFAULT_CHECKPOINT_INTERVAL_SECS: u64 = 60;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub n_start: u64,
    pub n_end: u64,
    pub sieve_bound: u64,
    pub mr_rounds: u32,
    pub exponent: u32,
    pub block_size: u64,
    pub progress_interval: u64,
    pub checkpoint_interval_secs: u64,
}

impl SweepConfig {
    /// Census defaults over [n_start, n_end].
    pub fn new(n_start: u64, n_end: u64) -> Self {
        SweepConfig {
            n_start,
            n_end,
            sieve_bound: DEFAULT_SIEVE_BOUND,
            mr_rounds: DEFAULT_MR_ROUNDS,
            exponent: CENSUS_EXPONENT,
            block_size: DEFAULT_BLOCK_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            checkpoint_interval_secs: DEFAULT_CHECKPOINT_INTERVAL_SECS,
        }
    }

    pub fn form(&self) -> PowerDifference {
        PowerDifference::new(self.exponent)
    }

    /// Number of integers in the range.
    pub fn range_len(&self) -> u64 {
        self.n_end - self.n_start + 1
    }

    pub fn validate(&self) -> Result<(), SweepError> {
        if self.n_start < 1 {
            return Err(SweepError::config("n_start must be at least 1"));
        }
        if self.n_end < self.n_start {
            return Err(SweepError::config(format!(
                "n_end ({}) is below n_start ({})",
                self.n_end, self.n_start
            )));
        }
        if self.n_end == u64::MAX {
            return Err(SweepError::config("n_end must be below 2^64 - 1"));
        }
        if self.sieve_bound == 0 {
            return Err(SweepError::config("sieve_bound must be positive"));
        }
        if self.sieve_bound > MAX_SIEVE_BOUND {
            return Err(SweepError::config(format!(
                "sieve_bound must be at most {} (got {})",
                MAX_SIEVE_BOUND, self.sieve_bound
            )));
        }
        if self.mr_rounds == 0 {
            return Err(SweepError::config("mr_rounds must be positive"));
        }
        if self.exponent < 2 {
            return Err(SweepError::config(format!(
                "exponent must be at least 2 (got {})",
                self.exponent
            )));
        }
        if self.block_size == 0 {
            return Err(SweepError::config("block_size must be positive"));
        }
        if self.progress_interval == 0 {
            return Err(SweepError::config("progress_interval must be positive"));
        }
        Ok(())
    }
}

/// TOML overlay: every key optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub n_start: Option<u64>,
    pub n_end: Option<u64>,
    pub sieve_bound: Option<u64>,
    pub mr_rounds: Option<u32>,
    pub exponent: Option<u32>,
    pub block_size: Option<u64>,
    pub progress_interval: Option<u64>,
    pub checkpoint_interval_secs: Option<u64>,
}

impl ConfigFile {
    pub fn parse(content: &str) -> Result<Self, SweepError> {
        toml::from_str(content).map_err(|e| SweepError::config(format!("invalid TOML: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, SweepError> {
        let content = std::fs::read_to_string(path).map_err(|e| SweepError::io(path, e))?;
        Self::parse(&content)
    }

    /// Layer `over` on top of `self`; keys set in `over` win.
    pub fn merge(self, over: ConfigFile) -> ConfigFile {
        ConfigFile {
            n_start: over.n_start.or(self.n_start),
            n_end: over.n_end.or(self.n_end),
            sieve_bound: over.sieve_bound.or(self.sieve_bound),
            mr_rounds: over.mr_rounds.or(self.mr_rounds),
            exponent: over.exponent.or(self.exponent),
            block_size: over.block_size.or(self.block_size),
            progress_interval: over.progress_interval.or(self.progress_interval),
            checkpoint_interval_secs: over.checkpoint_interval_secs.or(self.checkpoint_interval_secs),
        }
    }

    /// Fill defaults and validate. The range has no default.
    pub fn resolve(self) -> Result<SweepConfig, SweepError> {
        let n_start = self
            .n_start
            .ok_or_else(|| SweepError::config("n_start is required"))?;
        let n_end = self
            .n_end
            .ok_or_else(|| SweepError::config("n_end is required"))?;
        let defaults = SweepConfig::new(n_start, n_end);
        let config = SweepConfig {
            n_start,
            n_end,
            sieve_bound: self.sieve_bound.unwrap_or(defaults.sieve_bound),
            mr_rounds: self.mr_rounds.unwrap_or(defaults.mr_rounds),
            exponent: self.exponent.unwrap_or(defaults.exponent),
            block_size: self.block_size.unwrap_or(defaults.block_size),
            progress_interval: self.progress_interval.unwrap_or(defaults.progress_interval),
            checkpoint_interval_secs: self
                .checkpoint_interval_secs
                .unwrap_or(defaults.checkpoint_interval_secs),
        };
        config.validate()?;
        Ok(config)
    }
}
