//! # Presieve — Residue Tables and the Small-Factor Filter
//!
//! Before a candidate n reaches the Miller–Rabin oracle, it is checked
//! against a table of "bad residues": for each small prime q, the set of
//! r ∈ [0, q) with Q(r) ≡ 0 (mod q). Since Q is a polynomial with integer
//! coefficients, Q(n) ≡ Q(n mod q) (mod q), so n mod q landing in the set
//! proves q | Q(n).
//!
//! ## Construction
//!
//! For each q in `primes_below(B)` every residue is evaluated with
//! `PowerDifference::eval_mod`, i.e. two `pow_mod` calls under q. Cost is
//! O(B²/ln B · log e) word operations, negligible next to a single 500-digit
//! primality test. `SieveTable::brute_force` builds the same table from exact
//! big-integer values and exists to pin the two methods together in tests.
//!
//! ## Filtering
//!
//! `SieveTable::check` walks the *active* moduli (non-empty residue sets) in
//! increasing order and stops at the first hit. For the census exponent,
//! only primes q ≡ 1 (mod 47) qualify, so the 168 moduli below 1000 collapse
//! to three: 283, 659, 941. Roughly 26% of candidates are rejected.
//!
//! ## Safety bound
//!
//! A rejection is only sound when Q(n) > q; otherwise Q(n) could *be* q. The
//! table records `sieve_min_n`, the least n with Q(n) greater than every
//! modulus, and candidates below it always pass. For e = 47 this is n = 2;
//! it only matters for low-degree analogs such as Q₃(2) = 7.

use serde::Serialize;

use crate::form::PowerDifference;
use crate::sieve;

/// Outcome of the pre-sieve for a single candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SieveVerdict {
    /// Q(n) is divisible by `modulus` and larger than it.
    Reject { modulus: u64 },
    /// No small factor found; the oracle must decide.
    Pass,
}

impl SieveVerdict {
    pub fn is_reject(&self) -> bool {
        matches!(self, SieveVerdict::Reject { .. })
    }
}

/// Bad-residue set for one modulus.
#[derive(Clone, Debug, Serialize)]
pub struct ResidueSet {
    pub modulus: u64,
    /// Sorted, each entry in [0, modulus).
    pub residues: Vec<u64>,
    #[serde(skip)]
    mask: Vec<bool>,
}

impl ResidueSet {
    /// Empty sets carry no mask; only active moduli pay for one.
    fn new(modulus: u64, residues: Vec<u64>) -> Self {
        let mut mask = Vec::new();
        if !residues.is_empty() {
            mask = vec![false; modulus as usize];
            for &r in &residues {
                mask[r as usize] = true;
            }
        }
        ResidueSet {
            modulus,
            residues,
            mask,
        }
    }

    /// Membership of n mod q.
    #[inline]
    pub fn contains(&self, n: u64) -> bool {
        !self.mask.is_empty() && self.mask[(n % self.modulus) as usize]
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

/// Residue tables for every prime below the bound, built once per sweep and
/// read-only afterwards.
#[derive(Clone, Debug)]
pub struct SieveTable {
    form: PowerDifference,
    bound: u64,
    sets: Vec<ResidueSet>,
    /// Indices into `sets` with at least one bad residue.
    active: Vec<usize>,
    sieve_min_n: u64,
}

impl SieveTable {
    /// Build residue tables for all primes q < `bound` by modular exponentiation.
    ///
    /// Moduli with gcd(e, q − 1) = 1 are skipped without evaluation: x ↦ x^e
    /// is then a bijection mod q, so r^e ≡ (r − 1)^e has no solution.
    pub fn build(form: PowerDifference, bound: u64) -> Self {
        let e = form.exponent() as u64;
        Self::build_with(form, bound, |q| gcd(e, q - 1) > 1, |r, q| form.eval_mod(r, q) == 0)
    }

    /// Reference construction from the exact big-integer value Q(r) mod q.
    pub fn brute_force(form: PowerDifference, bound: u64) -> Self {
        Self::build_with(form, bound, |_| true, |r, q| form.eval(r).is_divisible_u(q as u32))
    }

    fn build_with<M, F>(form: PowerDifference, bound: u64, may_divide: M, divides: F) -> Self
    where
        M: Fn(u64) -> bool,
        F: Fn(u64, u64) -> bool,
    {
        let sets: Vec<ResidueSet> = sieve::primes_below(bound)
            .into_iter()
            .map(|q| {
                let residues: Vec<u64> = if may_divide(q) {
                    (0..q).filter(|&r| divides(r, q)).collect()
                } else {
                    Vec::new()
                };
                ResidueSet::new(q, residues)
            })
            .collect();
        let active = sets
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_empty())
            .map(|(i, _)| i)
            .collect();
        let max_modulus = sets.last().map_or(0, |s| s.modulus);
        SieveTable {
            form,
            bound,
            sets,
            active,
            sieve_min_n: sieve_min_n(form, max_modulus),
        }
    }

    /// Pre-sieve a single candidate, short-circuiting on the first hit.
    #[inline]
    pub fn check(&self, n: u64) -> SieveVerdict {
        if n < self.sieve_min_n {
            return SieveVerdict::Pass;
        }
        for &i in &self.active {
            let set = &self.sets[i];
            if set.contains(n) {
                return SieveVerdict::Reject {
                    modulus: set.modulus,
                };
            }
        }
        SieveVerdict::Pass
    }

    pub fn form(&self) -> PowerDifference {
        self.form
    }

    pub fn bound(&self) -> u64 {
        self.bound
    }

    /// The modulus set: all primes below the bound, increasing.
    pub fn moduli(&self) -> impl Iterator<Item = u64> + '_ {
        self.sets.iter().map(|s| s.modulus)
    }

    /// Residue set for modulus `q`, if q is in the modulus set.
    pub fn residues(&self, q: u64) -> Option<&ResidueSet> {
        self.sets
            .binary_search_by_key(&q, |s| s.modulus)
            .ok()
            .map(|i| &self.sets[i])
    }

    /// Moduli whose residue set is non-empty, increasing.
    pub fn active(&self) -> impl Iterator<Item = &ResidueSet> + '_ {
        self.active.iter().map(|&i| &self.sets[i])
    }

    pub fn sieve_min_n(&self) -> u64 {
        self.sieve_min_n
    }

    /// Expected fraction of candidates that survive, ∏(1 − |table[q]|/q).
    /// Treats the moduli as independent, which the CRT makes exact over a
    /// full period of their product.
    pub fn survival_fraction(&self) -> f64 {
        self.active()
            .map(|s| 1.0 - s.len() as f64 / s.modulus as f64)
            .product()
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Least n ≥ 1 with Q(n) > `max_modulus`. Q is increasing on n ≥ 1 for e ≥ 2
/// with Q(n) ≥ 2n − 1, so the scan ends by n = max_modulus + 1.
fn sieve_min_n(form: PowerDifference, max_modulus: u64) -> u64 {
    let mut n = 1u64;
    while n <= max_modulus && form.eval(n) <= max_modulus {
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    //! Residue tables are compared against exact big-integer evaluation; the
    //! filter is checked for soundness (every rejection is a real divisor)
    //! and for the short-circuit order.

    use super::*;
    use crate::form::CENSUS_EXPONENT;

    #[test]
    fn census_table_has_three_active_moduli() {
        let table = SieveTable::build(PowerDifference::default(), 1000);
        assert_eq!(table.moduli().count(), 168);
        let active: Vec<(u64, usize)> = table.active().map(|s| (s.modulus, s.len())).collect();
        assert_eq!(active, vec![(283, 46), (659, 46), (941, 46)]);
        assert_eq!(table.sieve_min_n(), 2);
    }

    /// Active moduli are exactly the primes q ≡ 1 (mod 47), each with
    /// e − 1 = 46 bad residues: the non-trivial 47th roots of unity ζ give
    /// n ≡ ζ/(ζ − 1).
    #[test]
    fn census_active_moduli_are_one_mod_47() {
        let table = SieveTable::build(PowerDifference::default(), 5000);
        for s in table.active() {
            assert_eq!(s.modulus % CENSUS_EXPONENT as u64, 1);
            assert_eq!(s.len(), 46);
        }
        for q in table.moduli() {
            if q % 47 == 1 {
                assert!(table.residues(q).is_some_and(|s| !s.is_empty()));
            }
        }
    }

    #[test]
    fn first_census_residues() {
        let table = SieveTable::build(PowerDifference::default(), 1000);
        let r283 = table.residues(283).unwrap();
        assert_eq!(&r283.residues[..5], &[10, 11, 16, 18, 24]);
        let r659 = table.residues(659).unwrap();
        assert_eq!(&r659.residues[..5], &[15, 17, 47, 62, 70]);
        assert!(table.residues(47).unwrap().is_empty());
        assert!(table.residues(1000).is_none());
    }

    #[test]
    fn modular_build_matches_brute_force() {
        for &e in &[2u32, 3, 5, 7, 47] {
            let form = PowerDifference::new(e);
            let fast = SieveTable::build(form, 200);
            let slow = SieveTable::brute_force(form, 200);
            for (a, b) in fast.sets.iter().zip(slow.sets.iter()) {
                assert_eq!(a.modulus, b.modulus);
                assert_eq!(a.residues, b.residues, "e={} q={}", e, a.modulus);
            }
        }
    }

    /// Only active moduli allocate a membership mask, so a census table at
    /// a large bound stays a few kilobytes.
    #[test]
    fn inactive_moduli_carry_no_mask() {
        let table = SieveTable::build(PowerDifference::default(), 50_000);
        let masked: usize = table.sets.iter().map(|s| s.mask.len()).sum();
        let active_total: u64 = table.active().map(|s| s.modulus).sum();
        assert_eq!(masked as u64, active_total);
        assert!(table.sets.iter().filter(|s| s.is_empty()).all(|s| s.mask.is_empty()));
        assert!(!table.residues(2).unwrap().contains(1));
    }

    #[test]
    fn gcd_basics() {
        assert_eq!(gcd(47, 282), 47);
        assert_eq!(gcd(47, 660), 1);
        assert_eq!(gcd(3, 6), 3);
        assert_eq!(gcd(7, 1), 1);
    }

    #[test]
    fn residues_within_range() {
        let table = SieveTable::build(PowerDifference::new(3), 1000);
        for q in table.moduli() {
            let set = table.residues(q).unwrap();
            assert!(set.len() as u64 <= q);
            assert!(set.residues.iter().all(|&r| r < q));
            assert!(set.residues.windows(2).all(|w| w[0] < w[1]));
        }
    }

    /// Every rejected n has Q(n) divisible by the reported modulus.
    #[test]
    fn rejections_are_sound() {
        for &e in &[3u32, 7, 47] {
            let form = PowerDifference::new(e);
            let table = SieveTable::build(form, 1000);
            for n in 1..3000u64 {
                if let SieveVerdict::Reject { modulus } = table.check(n) {
                    let value = form.eval(n);
                    assert!(value.is_divisible_u(modulus as u32), "e={} n={}", e, n);
                    assert!(value > modulus, "e={} n={} rejected its own prime", e, n);
                }
            }
        }
    }

    #[test]
    fn check_reports_first_matching_modulus() {
        let table = SieveTable::build(PowerDifference::default(), 1000);
        // 10 is a bad residue mod 283.
        assert_eq!(table.check(10), SieveVerdict::Reject { modulus: 283 });
        assert_eq!(table.check(10 + 283 * 7), SieveVerdict::Reject { modulus: 283 });
        // 13 gives a prime Q(13).
        assert_eq!(table.check(13), SieveVerdict::Pass);
    }

    /// Q₃(2) = 7 is prime and 2 is a bad residue mod 7; the safety bound
    /// must keep it from being rejected.
    #[test]
    fn small_values_bypass_the_filter() {
        let form = PowerDifference::new(3);
        let table = SieveTable::build(form, 1000);
        assert!(table.residues(7).unwrap().contains(2));
        assert_eq!(table.sieve_min_n(), 19);
        assert_eq!(table.check(2), SieveVerdict::Pass);
        assert!(form.eval(table.sieve_min_n()) > 997);
        assert!(form.eval(table.sieve_min_n() - 1) <= 997);
    }

    #[test]
    fn empty_modulus_set() {
        let table = SieveTable::build(PowerDifference::default(), 2);
        assert_eq!(table.moduli().count(), 0);
        assert_eq!(table.check(12345), SieveVerdict::Pass);
        assert_eq!(table.survival_fraction(), 1.0);
    }

    #[test]
    fn survival_fraction_census() {
        let table = SieveTable::build(PowerDifference::default(), 1000);
        let f = table.survival_fraction();
        let expected = (1.0 - 46.0 / 283.0) * (1.0 - 46.0 / 659.0) * (1.0 - 46.0 / 941.0);
        assert!((f - expected).abs() < 1e-12);
        assert!(f > 0.74 && f < 0.75);
    }
}
