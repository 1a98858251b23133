//! # Form — The Power-Difference Sequence Q(n) = n^e − (n−1)^e
//!
//! The census targets e = 47. Q(n) is the number of lattice points gained when
//! an e-dimensional cube of side n−1 grows to side n, so it has degree e−1 and
//! leading term e·n^(e−1). Near n = 2×10^11 the values carry about 520 digits.
//!
//! Two evaluations are provided:
//!
//! - `eval` builds the exact `rug::Integer` for the primality oracle.
//! - `eval_mod` reduces Q(r) modulo a small prime without ever forming r^e,
//!   which is what the residue tables are built from.
//!
//! Every prime divisor p ≠ e of Q(n) satisfies p ≡ 1 (mod e) when e is prime:
//! n^e ≡ (n−1)^e (mod p) forces (n·(n−1)⁻¹)^e ≡ 1, so e divides the order of
//! that ratio, which divides p − 1. For e = 47 and moduli below 1000 only
//! 283, 659 and 941 can ever divide Q(n).

use rug::ops::Pow;
use rug::Integer;
use serde::{Deserialize, Serialize};

use crate::sieve::pow_mod;

/// The census exponent.
pub const CENSUS_EXPONENT: u32 = 47;

/// Q(n) = n^e − (n−1)^e for a fixed exponent e ≥ 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerDifference {
    exponent: u32,
}

impl Default for PowerDifference {
    fn default() -> Self {
        PowerDifference {
            exponent: CENSUS_EXPONENT,
        }
    }
}

impl PowerDifference {
    pub fn new(exponent: u32) -> Self {
        PowerDifference { exponent }
    }

    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    /// Exact Q(n) as a GMP integer.
    pub fn eval(&self, n: u64) -> Integer {
        let hi = Integer::from(n).pow(self.exponent);
        // n − 1 may be −1 when n = 0; rug handles the signed power.
        let lo = (Integer::from(n) - 1u32).pow(self.exponent);
        hi - lo
    }

    /// Q(r) mod q for a small modulus q, via repeated squaring.
    ///
    /// r = 0 is well defined: r − 1 is taken as q − 1.
    pub fn eval_mod(&self, r: u64, q: u64) -> u64 {
        let r = r % q;
        let prev = (r + q - 1) % q;
        let e = self.exponent as u64;
        (pow_mod(r, e, q) + q - pow_mod(prev, e, q)) % q
    }

    /// Human-readable expression for the value at n, e.g. `1000^47 - 999^47`.
    pub fn expression(&self, n: u64) -> String {
        format!(
            "{}^{} - {}^{}",
            n,
            self.exponent,
            n as i128 - 1,
            self.exponent
        )
    }
}

/// Approximate digit count of Q(start) as recorded next to each quadruplet:
/// floor(46·log10(start) + 1.67).
///
/// This is the leading-order growth of the 47th-power difference
/// (log10 47 ≈ 1.672); the exact digit count is never computed for records.
pub fn approx_digits(start: u64) -> u64 {
    if start == 0 {
        return 0;
    }
    (46.0 * (start as f64).log10() + 1.67).floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_match_closed_forms() {
        // e = 2: Q(n) = 2n − 1
        let q2 = PowerDifference::new(2);
        for n in 1..50u64 {
            assert_eq!(q2.eval(n), Integer::from(2 * n - 1));
        }
        // e = 3: Q(n) = 3n² − 3n + 1
        let q3 = PowerDifference::new(3);
        for n in 1..50u64 {
            assert_eq!(q3.eval(n), Integer::from(3 * n * n - 3 * n + 1));
        }
    }

    #[test]
    fn census_values() {
        let q = PowerDifference::default();
        assert_eq!(q.exponent(), 47);
        assert_eq!(q.eval(1), 1);
        // Q(2) = 2^47 − 1
        assert_eq!(q.eval(2), Integer::from(140_737_488_355_327u64));
        // Q(0) = 0 − (−1)^47 = 1 for odd exponents, −1 for even ones.
        assert_eq!(q.eval(0), 1);
        assert_eq!(PowerDifference::new(2).eval(0), -1);
    }

    #[test]
    fn eval_mod_agrees_with_big_integer() {
        for &e in &[2u32, 3, 7, 47] {
            let form = PowerDifference::new(e);
            for &q in &[2u64, 3, 5, 7, 47, 283, 997] {
                for r in 0..q.min(120) {
                    let exact = form.eval(r);
                    let expected = exact.mod_u(q as u32) as u64;
                    assert_eq!(form.eval_mod(r, q), expected, "e={} r={} q={}", e, r, q);
                }
            }
        }
    }

    /// Q(n) ≡ 1 (mod 47) whenever e = 47.
    #[test]
    fn census_form_never_divisible_by_47() {
        let form = PowerDifference::default();
        for r in 0..47 {
            assert_eq!(form.eval_mod(r, 47), 1);
        }
    }

    #[test]
    fn approx_digits_formula() {
        assert_eq!(approx_digits(1), 1);
        assert_eq!(approx_digits(10), 47);
        assert_eq!(approx_digits(1_000_000_000), 415);
        // 46·log10(2e11) + 1.67 = 46·11.30103 + 1.67 = 521.52
        assert_eq!(approx_digits(200_000_000_000), 521);
        assert_eq!(approx_digits(0), 0);
    }

    /// The estimate tracks the true digit count of Q(n) to within one digit
    /// over the census range.
    #[test]
    fn approx_digits_close_to_exact() {
        let form = PowerDifference::default();
        for &n in &[1_000u64, 123_456, 2_000_000_000, 150_000_000_000] {
            let exact = form.eval(n).to_string_radix(10).len() as i64;
            let approx = approx_digits(n) as i64;
            assert!((exact - approx).abs() <= 1, "n={} exact={} approx={}", n, exact, approx);
        }
    }

    #[test]
    fn expression_format() {
        assert_eq!(PowerDifference::default().expression(1000), "1000^47 - 999^47");
    }
}
