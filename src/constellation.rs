//! # Constellation — Streaming Quadruplet/Quintuplet Detection
//!
//! The detector consumes one primality outcome per scanned integer, in strict
//! ascending order, and keeps only the last five in a ring buffer. After each
//! push it looks at the tail:
//!
//! ```text
//!   window: … [n−4] [n−3] [n−2] [n−1] [n]
//!                   └──── all true ────┘   → Quadruplet(n−3)
//!             └ true ┘ + quadruplet         → Quintuplet(n−4)
//! ```
//!
//! Positions before the scan start count as false, so a fresh detector needs
//! four pushes before it can fire. Each push is evaluated exactly once.
//!
//! Runs longer than four produce overlapping quadruplets: a run of five
//! trues starting at m yields Quadruplet(m), then Quadruplet(m+1) together
//! with Quintuplet(m). The quintuplet check only looks backwards from a
//! quadruplet that has just completed.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::form::approx_digits;

/// Outcomes retained: four for the quadruplet plus one of look-back.
pub const WINDOW_LEN: usize = 5;

/// Four consecutive probable primes Q(start..start+3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadrupletRecord {
    #[serde(rename = "starting_n")]
    pub start: u64,
    pub approx_digits: u64,
}

/// Five consecutive probable primes Q(start..start+4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuintupletRecord {
    #[serde(rename = "starting_n")]
    pub start: u64,
}

/// What a single push produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Detection {
    pub quadruplet: Option<QuadrupletRecord>,
    pub quintuplet: Option<QuintupletRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstellationDetector {
    /// Position the next pushed outcome belongs to.
    next_n: u64,
    window: VecDeque<bool>,
}

impl ConstellationDetector {
    /// A detector whose first push is the outcome for `start`.
    pub fn new(start: u64) -> Self {
        ConstellationDetector {
            next_n: start,
            window: VecDeque::with_capacity(WINDOW_LEN),
        }
    }

    pub fn next_n(&self) -> u64 {
        self.next_n
    }

    /// Record the outcome for `next_n` and report any constellation it closes.
    pub fn push(&mut self, is_prime: bool) -> Detection {
        let n = self.next_n;
        self.next_n += 1;

        if self.window.len() == WINDOW_LEN {
            self.window.pop_front();
        }
        self.window.push_back(is_prime);

        let mut detection = Detection::default();
        if !self.tail_all_true(4) {
            return detection;
        }

        let start = n - 3;
        detection.quadruplet = Some(QuadrupletRecord {
            start,
            approx_digits: approx_digits(start),
        });
        if self.tail_all_true(5) {
            detection.quintuplet = Some(QuintupletRecord { start: start - 1 });
        }
        detection
    }

    fn tail_all_true(&self, k: usize) -> bool {
        self.window.len() >= k && self.window.iter().rev().take(k).all(|&b| b)
    }
}
