//! # Oracle — Pluggable Primality Predicates
//!
//! The sweep never calls GMP directly: it asks a `PrimalityTest`. Production
//! runs use `MillerRabin` (R = 25 rounds, false-positive rate ≤ 4^−25 per
//! composite). Tests and small analog sweeps can substitute `TrialDivision`,
//! which is exact but only usable while √x fits a loop.
//!
//! ## Pre-screen
//!
//! GMP's `mpz_probab_prime_p` starts with trial division and a Baillie–PSW
//! test, then runs the requested Miller–Rabin rounds. Running a 2-round test
//! first lets the overwhelmingly common composites out after the cheap
//! stage; only survivors pay for the full R rounds. A composite can never be
//! promoted by the pre-screen, so the error bound is that of the R-round test.

use rug::integer::IsPrime;
use rug::Integer;

/// Default Miller–Rabin round count.
pub const DEFAULT_MR_ROUNDS: u32 = 25;

/// A probable-prime predicate. Implementations must be thread-safe: the sweep
/// evaluates a block of candidates across the rayon pool.
pub trait PrimalityTest: Send + Sync {
    /// `true` for PROBABLE_PRIME, `false` for COMPOSITE. Values ≤ 1 are
    /// composite.
    fn is_probable_prime(&self, x: &Integer) -> bool;

    /// Rounds performed on a candidate that survives (0 for exact tests).
    fn rounds(&self) -> u32;

    fn name(&self) -> &'static str;
}

/// Two-round Miller-Rabin pre-screening: run 2 fast rounds first, full rounds only for survivors.
pub fn mr_screened_test(candidate: &Integer, mr_rounds: u32) -> IsPrime {
    if mr_rounds > 2 && candidate.is_probably_prime(2) == IsPrime::No {
        return IsPrime::No;
    }
    candidate.is_probably_prime(mr_rounds)
}

/// Fixed-round Miller–Rabin via GMP.
#[derive(Clone, Copy, Debug)]
pub struct MillerRabin {
    rounds: u32,
}

impl MillerRabin {
    pub fn new(rounds: u32) -> Self {
        MillerRabin { rounds }
    }

    /// Upper bound on the probability that a composite passes: 4^−R.
    pub fn error_bound(&self) -> f64 {
        0.25f64.powi(self.rounds as i32)
    }
}

impl Default for MillerRabin {
    fn default() -> Self {
        MillerRabin::new(DEFAULT_MR_ROUNDS)
    }
}

impl PrimalityTest for MillerRabin {
    fn is_probable_prime(&self, x: &Integer) -> bool {
        if *x <= 1 {
            return false;
        }
        mr_screened_test(x, self.rounds) != IsPrime::No
    }

    fn rounds(&self) -> u32 {
        self.rounds
    }

    fn name(&self) -> &'static str {
        "miller-rabin"
    }
}

/// Deterministic trial division up to √x. Only for values below 2^64.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrialDivision;

impl PrimalityTest for TrialDivision {
    fn is_probable_prime(&self, x: &Integer) -> bool {
        let Some(v) = x.to_u64() else {
            // Negative values are composite by convention; oversized ones
            // are outside this predicate's domain.
            return false;
        };
        if v < 2 {
            return false;
        }
        if v % 2 == 0 {
            return v == 2;
        }
        let mut d = 3u64;
        while d.saturating_mul(d) <= v {
            if v % d == 0 {
                return false;
            }
            d += 2;
        }
        true
    }

    fn rounds(&self) -> u32 {
        0
    }

    fn name(&self) -> &'static str {
        "trial-division"
    }
}
