//! # Sweep — Range Scan for Prime Quadruplets of Q(n)
//!
//! Scans n ∈ [n_start, n_end] and reports every run of four consecutive
//! probable primes Q(n), Q(n+1), Q(n+2), Q(n+3), flagging quintuplets.
//!
//! ## Pipeline
//!
//! ```text
//!   n ──► SieveTable::check ──Reject──────────────────► false ─┐
//!              │                                               │
//!             Pass ──► Q(n) (GMP) ──► PrimalityTest ──► bool ──┤
//!                                                              ▼
//!                                   ConstellationDetector (strict n order)
//!                                                              │
//!                               quadruplets / quintuplets / statistics
//! ```
//!
//! ## Blocks and ordering
//!
//! The range is processed in blocks of `block_size` integers. Inside a block
//! every candidate is independent, so the pre-sieve, the big-integer
//! evaluation and the oracle run across the rayon pool. The indexed
//! `collect` hands outcomes back in ascending n, and only then are they fed
//! one at a time to the detector, whose window requires strict order.
//!
//! ## Interruption
//!
//! Between blocks the driver checks the stop flag (set by SIGINT/SIGTERM in
//! the CLI) and, when configured, writes a checkpoint every
//! `checkpoint_interval_secs`. Records already emitted are complete and
//! valid; an interrupted report is marked `completed: false`.
//!
//! A completed run leaves its last checkpoint on disk. The caller clears it
//! with `checkpoint::clear` once the records are safely written, so a failed
//! artifact write can still be recovered by rerunning.
//!
//! ## Statistics
//!
//! `scanned` counts every integer fed to the detector, `tested` only those
//! that reached the oracle, `primes_found` the oracle's positives. Hence
//! primes_found ≤ tested ≤ scanned ≤ n_end − n_start + 1.

use anyhow::Result;
use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info};

use crate::checkpoint::{self, Checkpoint, SweepFingerprint};
use crate::config::SweepConfig;
use crate::constellation::{ConstellationDetector, QuadrupletRecord, QuintupletRecord};
use crate::error::SweepError;
use crate::form::PowerDifference;
use crate::oracle::PrimalityTest;
use crate::presieve::{SieveTable, SieveVerdict};
use crate::progress::Progress;

/// Monotone counters for a sweep.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepStatistics {
    pub scanned: u64,
    /// Candidates that passed the pre-sieve and reached the oracle.
    pub tested: u64,
    pub primes_found: u64,
    /// Wall time across all sessions of this sweep.
    pub elapsed_secs: f64,
}

/// Result of evaluating one candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Rejected by the pre-sieve; counts as composite without an oracle call.
    Sieved { modulus: u64 },
    Tested { probable_prime: bool },
}

impl Outcome {
    pub fn is_prime(&self) -> bool {
        matches!(
            self,
            Outcome::Tested {
                probable_prime: true
            }
        )
    }
}

/// Everything a finished (or interrupted) sweep produced.
#[derive(Clone, Debug, Serialize)]
pub struct SweepReport {
    pub config: SweepConfig,
    pub quadruplets: Vec<QuadrupletRecord>,
    pub quintuplets: Vec<QuintupletRecord>,
    pub stats: SweepStatistics,
    /// Last integer fed to the detector.
    pub last_n: u64,
    pub completed: bool,
}

impl SweepReport {
    pub fn log_summary(&self) {
        let s = &self.stats;
        info!(
            n_start = self.config.n_start,
            n_end = self.config.n_end,
            last_n = self.last_n,
            completed = self.completed,
            elapsed_secs = format_args!("{:.1}", s.elapsed_secs),
            elapsed_hours = format_args!("{:.2}", s.elapsed_secs / 3600.0),
            tested = s.tested,
            primes_found = s.primes_found,
            quadruplets = self.quadruplets.len(),
            quintuplets = self.quintuplets.len(),
            "sweep summary"
        );
    }
}

/// Mutable state threaded through the scan: detector window, counters and
/// the append-only record lists. Owned by the single driver thread.
#[derive(Clone, Debug)]
pub struct SweepState {
    pub form: PowerDifference,
    pub detector: ConstellationDetector,
    pub stats: SweepStatistics,
    pub quadruplets: Vec<QuadrupletRecord>,
    pub quintuplets: Vec<QuintupletRecord>,
}

impl SweepState {
    pub fn new(form: PowerDifference, n_start: u64) -> Self {
        SweepState {
            form,
            detector: ConstellationDetector::new(n_start),
            stats: SweepStatistics::default(),
            quadruplets: Vec::new(),
            quintuplets: Vec::new(),
        }
    }

    fn from_checkpoint(form: PowerDifference, cp: Checkpoint) -> Self {
        SweepState {
            form,
            detector: cp.detector,
            stats: cp.stats,
            quadruplets: cp.quadruplets,
            quintuplets: cp.quintuplets,
        }
    }

    /// Feed the outcome for the detector's next position.
    pub fn record(&mut self, outcome: Outcome) {
        let n = self.detector.next_n();
        self.stats.scanned += 1;
        if let Outcome::Tested { probable_prime } = outcome {
            self.stats.tested += 1;
            if probable_prime {
                self.stats.primes_found += 1;
                debug!(n, "probable prime");
            }
        }

        let detection = self.detector.push(outcome.is_prime());
        if let Some(quad) = detection.quadruplet {
            info!(
                n = quad.start,
                digits = quad.approx_digits,
                first = %self.form.expression(quad.start),
                "QUADRUPLET found"
            );
            self.quadruplets.push(quad);
        }
        if let Some(quint) = detection.quintuplet {
            info!(n = quint.start, "QUINTUPLET found");
            self.quintuplets.push(quint);
        }
        debug_assert_eq!(self.detector.next_n(), n + 1);
    }
}

/// Pre-sieve, evaluate and test one candidate.
pub fn evaluate(table: &SieveTable, oracle: &dyn PrimalityTest, n: u64) -> Result<Outcome, SweepError> {
    if let SieveVerdict::Reject { modulus } = table.check(n) {
        return Ok(Outcome::Sieved { modulus });
    }
    let value = table.form().eval(n);
    if value <= 0 {
        return Err(SweepError::Arithmetic {
            n,
            detail: format!("Q(n) = {} is not positive", value),
        });
    }
    Ok(Outcome::Tested {
        probable_prime: oracle.is_probable_prime(&value),
    })
}

/// Evaluate [lo, hi] in parallel; outcomes come back in ascending n.
pub fn evaluate_block(
    table: &SieveTable,
    oracle: &dyn PrimalityTest,
    lo: u64,
    hi: u64,
) -> Result<Vec<Outcome>, SweepError> {
    let len = (hi - lo + 1) as usize;
    (0..len)
        .into_par_iter()
        .map(|i| evaluate(table, oracle, lo + i as u64))
        .collect()
}

pub struct SweepDriver<'a> {
    config: SweepConfig,
    oracle: &'a dyn PrimalityTest,
    stop: Option<&'a AtomicBool>,
    checkpoint_path: Option<&'a Path>,
}

impl<'a> SweepDriver<'a> {
    /// Validates the configuration; no sieve work happens before this passes.
    pub fn new(config: SweepConfig, oracle: &'a dyn PrimalityTest) -> Result<Self, SweepError> {
        config.validate()?;
        Ok(SweepDriver {
            config,
            oracle,
            stop: None,
            checkpoint_path: None,
        })
    }

    /// Stop cleanly at the next block boundary once `flag` is set.
    pub fn with_stop_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.stop = Some(flag);
        self
    }

    /// Resume from and periodically save to `path`.
    pub fn with_checkpoint(mut self, path: &'a Path) -> Self {
        self.checkpoint_path = Some(path);
        self
    }

    pub fn run(&self) -> Result<SweepReport> {
        let config = &self.config;
        let table = SieveTable::build(config.form(), config.sieve_bound);
        info!(
            exponent = config.exponent,
            moduli = table.moduli().count(),
            active = table.active().count(),
            bound = config.sieve_bound,
            survival = format_args!("{:.4}", table.survival_fraction()),
            "sieve tables built"
        );

        let mut state = self.initial_state();
        let resume_from = state.detector.next_n();
        info!(
            n_start = config.n_start,
            n_end = config.n_end,
            range_len = config.range_len(),
            resume_from,
            mr_rounds = self.oracle.rounds(),
            oracle = self.oracle.name(),
            threads = rayon::current_num_threads(),
            "sweep starting"
        );

        let prior_elapsed = state.stats.elapsed_secs;
        let session = Instant::now();
        let progress = Progress::new(
            config.n_start,
            config.n_end,
            config.progress_interval,
            resume_from,
        );
        let mut last_checkpoint = Instant::now();
        let mut block_start = resume_from;
        let mut last_n = resume_from - 1;

        while block_start <= config.n_end {
            let block_end = block_start
                .saturating_add(config.block_size - 1)
                .min(config.n_end);

            let outcomes = evaluate_block(&table, self.oracle, block_start, block_end)?;
            for outcome in outcomes {
                let n = state.detector.next_n();
                state.record(outcome);
                progress.observe(n, state.quadruplets.len() as u64);
            }
            last_n = block_end;
            state.stats.elapsed_secs = prior_elapsed + session.elapsed().as_secs_f64();

            let stop_requested = self.stop.is_some_and(|f| f.load(Ordering::Relaxed));
            if let Some(path) = self.checkpoint_path {
                let due = last_checkpoint.elapsed().as_secs() >= config.checkpoint_interval_secs;
                if block_end < config.n_end && (due || stop_requested) {
                    checkpoint::save(path, &self.checkpoint(&state, block_end))?;
                    debug!(last_n = block_end, "checkpoint saved");
                    last_checkpoint = Instant::now();
                }
            }
            if stop_requested && block_end < config.n_end {
                info!(last_n = block_end, "stop requested, sweep interrupted");
                return Ok(self.report(state, last_n, false));
            }

            block_start = block_end + 1;
        }

        state.stats.elapsed_secs = prior_elapsed + session.elapsed().as_secs_f64();
        Ok(self.report(state, last_n, true))
    }

    fn initial_state(&self) -> SweepState {
        let Some(path) = self.checkpoint_path else {
            return SweepState::new(self.config.form(), self.config.n_start);
        };
        match checkpoint::load(path) {
            Some(cp) if cp.resumes(&self.config) => {
                info!(
                    last_n = cp.last_n,
                    saved_at = %cp.saved_at,
                    quadruplets = cp.quadruplets.len(),
                    "resuming from checkpoint"
                );
                SweepState::from_checkpoint(self.config.form(), cp)
            }
            Some(_) => {
                info!(path = %path.display(), "checkpoint belongs to a different sweep, starting fresh");
                SweepState::new(self.config.form(), self.config.n_start)
            }
            None => SweepState::new(self.config.form(), self.config.n_start),
        }
    }

    fn checkpoint(&self, state: &SweepState, last_n: u64) -> Checkpoint {
        Checkpoint {
            last_n,
            fingerprint: SweepFingerprint::from(&self.config),
            detector: state.detector.clone(),
            stats: state.stats.clone(),
            quadruplets: state.quadruplets.clone(),
            quintuplets: state.quintuplets.clone(),
            saved_at: Utc::now(),
        }
    }

    fn report(&self, state: SweepState, last_n: u64, completed: bool) -> SweepReport {
        SweepReport {
            config: self.config.clone(),
            quadruplets: state.quadruplets,
            quintuplets: state.quintuplets,
            stats: state.stats,
            last_n,
            completed,
        }
    }
}
