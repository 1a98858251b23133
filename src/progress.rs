//! # Progress — Periodic Scan Observations
//!
//! Every `interval` integers past `n_start` the driver hands the current
//! position to `Progress::observe`, which logs one structured line: percent
//! complete, current n, scan rate, running quadruplet count, and elapsed
//! wall time. Observations are advisory; nothing reads them back.
//!
//! The rate is measured against the integers scanned by *this* process, so a
//! resumed sweep reports its own throughput rather than a diluted average.

use std::time::{Duration, Instant};
use tracing::info;

/// One progress observation.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressLine {
    pub n: u64,
    pub percent: f64,
    /// Integers scanned per second since this process started scanning.
    pub rate: f64,
    pub quadruplets: u64,
    pub elapsed: Duration,
}

pub struct Progress {
    n_start: u64,
    n_end: u64,
    interval: u64,
    /// First n scanned by this process (differs from n_start on resume).
    session_start_n: u64,
    start: Instant,
}

impl Progress {
    pub fn new(n_start: u64, n_end: u64, interval: u64, session_start_n: u64) -> Self {
        Progress {
            n_start,
            n_end,
            interval: interval.max(1),
            session_start_n,
            start: Instant::now(),
        }
    }

    /// Whether n falls on a reporting boundary.
    #[inline]
    pub fn is_due(&self, n: u64) -> bool {
        n > self.n_start && (n - self.n_start) % self.interval == 0
    }

    /// Log and return an observation if n is on a boundary.
    pub fn observe(&self, n: u64, quadruplets: u64) -> Option<ProgressLine> {
        if !self.is_due(n) {
            return None;
        }
        let line = self.line(n, quadruplets, self.start.elapsed());
        print_status(&line);
        Some(line)
    }

    fn line(&self, n: u64, quadruplets: u64, elapsed: Duration) -> ProgressLine {
        let span = self.n_end - self.n_start;
        let percent = if span == 0 {
            100.0
        } else {
            (n - self.n_start) as f64 / span as f64 * 100.0
        };
        let scanned = n.saturating_sub(self.session_start_n) + 1;
        let rate = if elapsed.as_secs_f64() > 0.0 {
            scanned as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        ProgressLine {
            n,
            percent,
            rate,
            quadruplets,
            elapsed,
        }
    }
}

fn print_status(line: &ProgressLine) {
    let secs = line.elapsed.as_secs();
    info!(
        percent = format_args!("{:.1}", line.percent),
        n = line.n,
        rate = format_args!("{:.0}", line.rate),
        quadruplets = line.quadruplets,
        elapsed = format_args!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60),
        "sweep progress"
    );
}
