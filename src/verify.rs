//! # Verify — Re-check Published Quadruplets
//!
//! Reads back a quadruplet artifact and re-establishes each record from
//! scratch, independent of the sweep that produced it:
//!
//! 1. the recorded digit estimate must equal `approx_digits(start)`;
//! 2. Q(start), …, Q(start+3) must each pass the configured oracle;
//! 3. each must also pass a second, deliberately different code path: a
//!    BPSW round plus Fermat tests to fixed bases 31..71, so a fault in the
//!    screened Miller–Rabin path cannot confirm itself.
//!
//! Records are independent and verified across the rayon pool.

use rayon::prelude::*;
use rug::integer::IsPrime;
use rug::Integer;

use crate::constellation::QuadrupletRecord;
use crate::form::{approx_digits, PowerDifference};
use crate::oracle::PrimalityTest;

/// Result of verifying one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Verified,
    Failed { reason: String },
}

impl VerifyResult {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerifyResult::Verified)
    }
}

/// Fermat bases for the independent check, disjoint from GMP's internal
/// witness selection for small candidates.
const FIXED_BASES: [u32; 10] = [31, 37, 41, 43, 47, 53, 59, 61, 67, 71];

/// BPSW + fixed-base Fermat. `Err` carries the reason for rejection.
pub fn independent_check(candidate: &Integer) -> Result<(), String> {
    if candidate.is_probably_prime(1) == IsPrime::No {
        return Err("failed BPSW test".into());
    }
    let exp = Integer::from(candidate - 1u32);
    for &base in &FIXED_BASES {
        if *candidate <= base {
            continue;
        }
        match Integer::from(base).pow_mod(&exp, candidate) {
            Ok(r) if r == 1u32 => {}
            Ok(_) => return Err(format!("failed Fermat test with base {}", base)),
            Err(_) => return Err(format!("no inverse with base {}", base)),
        }
    }
    Ok(())
}

/// Verify one quadruplet record against `form`.
pub fn verify_quadruplet(
    record: &QuadrupletRecord,
    form: PowerDifference,
    oracle: &dyn PrimalityTest,
) -> VerifyResult {
    let expected_digits = approx_digits(record.start);
    if record.approx_digits != expected_digits {
        return VerifyResult::Failed {
            reason: format!(
                "digit estimate {} does not match {}",
                record.approx_digits, expected_digits
            ),
        };
    }
    for n in record.start..record.start + 4 {
        let value = form.eval(n);
        if !oracle.is_probable_prime(&value) {
            return VerifyResult::Failed {
                reason: format!("Q({}) is composite ({})", n, oracle.name()),
            };
        }
        if let Err(reason) = independent_check(&value) {
            return VerifyResult::Failed {
                reason: format!("Q({}) {}", n, reason),
            };
        }
    }
    VerifyResult::Verified
}

/// Verify every record in parallel; results are in input order.
pub fn verify_all(
    records: &[QuadrupletRecord],
    form: PowerDifference,
    oracle: &dyn PrimalityTest,
) -> Vec<VerifyResult> {
    records
        .par_iter()
        .map(|r| verify_quadruplet(r, form, oracle))
        .collect()
}
