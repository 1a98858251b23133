//! Property-based tests for the census arithmetic and the window detector.
//!
//! Properties hold for every generated input, not just the fixtures pinned
//! in the unit tests. They are purely computational and always run.
//!
//! # How to run
//!
//! ```bash
//! cargo test --test property_tests
//! PROPTEST_CASES=10000 cargo test --test property_tests
//! ```
//!
//! Each property is named `prop_<function>_<invariant>`.

use proptest::prelude::*;
use q47_census::constellation::ConstellationDetector;
use q47_census::presieve::SieveVerdict;
use q47_census::{approx_digits, sieve, PowerDifference, SieveTable};
use rug::Integer;

// == Sieve and form arithmetic =================================================

proptest! {
    /// pow_mod(b, e, m) == b^e mod m, checked against GMP.
    #[test]
    fn prop_pow_mod_matches_big_int(
        base in 0u64..u64::MAX,
        exp in 0u64..10_000,
        modulus in 2u64..u64::MAX,
    ) {
        let ours = sieve::pow_mod(base, exp, modulus);
        let theirs = Integer::from(base)
            .pow_mod(&Integer::from(exp), &Integer::from(modulus))
            .unwrap();
        prop_assert_eq!(Integer::from(ours), theirs);
    }

    /// Q(n) mod q computed with word arithmetic equals the exact residue.
    #[test]
    fn prop_eval_mod_matches_exact(
        exponent in 2u32..=64,
        n in 1u64..1_000_000,
        q_index in 0usize..168,
    ) {
        let primes = sieve::primes_below(1000);
        let q = primes[q_index];
        let form = PowerDifference::new(exponent);
        let exact = form.eval(n).mod_u(q as u32) as u64;
        prop_assert_eq!(form.eval_mod(n % q, q), exact);
    }

    /// The digit estimate never exceeds the true length of Q(n) and trails
    /// it by at most two (floor of a slightly low logarithm).
    #[test]
    fn prop_approx_digits_bounded_by_true_length(n in 2u64..1_000_000) {
        let digits = PowerDifference::default().eval(n).to_string().len() as u64;
        let estimate = approx_digits(n);
        prop_assert!(estimate <= digits && estimate + 2 >= digits, "n={} est={} true={}", n, estimate, digits);
    }
}

// == Pre-sieve =================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Modular construction and exact big-integer construction agree on
    /// every residue set.
    #[test]
    fn prop_table_matches_brute_force(exponent in 2u32..=60, bound in 2u64..180) {
        let form = PowerDifference::new(exponent);
        let fast = SieveTable::build(form, bound);
        let slow = SieveTable::brute_force(form, bound);
        prop_assert_eq!(fast.moduli().collect::<Vec<_>>(), slow.moduli().collect::<Vec<_>>());
        for q in fast.moduli() {
            prop_assert_eq!(
                &fast.residues(q).unwrap().residues,
                &slow.residues(q).unwrap().residues,
                "q={}", q
            );
        }
        prop_assert_eq!(fast.sieve_min_n(), slow.sieve_min_n());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A rejection names a modulus that truly divides Q(n), and Q(n) is
    /// strictly larger than it, so no prime value is ever discarded.
    #[test]
    fn prop_rejection_is_sound(exponent in 2u32..=47, n in 1u64..2_000_000) {
        let form = PowerDifference::new(exponent);
        let table = SieveTable::build(form, 1000);
        if let SieveVerdict::Reject { modulus } = table.check(n) {
            let value = form.eval(n);
            prop_assert!(value.is_divisible_u(modulus as u32));
            prop_assert!(value > modulus);
        }
    }
}

// == Constellation detector ====================================================

fn naive_runs(outcomes: &[bool], len: usize, start: u64) -> Vec<u64> {
    if outcomes.len() < len {
        return Vec::new();
    }
    (0..=outcomes.len() - len)
        .filter(|&i| outcomes[i..i + len].iter().all(|&b| b))
        .map(|i| start + i as u64)
        .collect()
}

proptest! {
    /// The streaming detector finds exactly the windows of four (and five)
    /// consecutive trues that a direct scan of the whole sequence finds.
    #[test]
    fn prop_detector_matches_naive_scan(
        start in 1u64..1_000_000_000,
        outcomes in prop::collection::vec(prop::bool::weighted(0.7), 0..300),
    ) {
        let mut detector = ConstellationDetector::new(start);
        let mut quads = Vec::new();
        let mut quints = Vec::new();
        for &b in &outcomes {
            let d = detector.push(b);
            quads.extend(d.quadruplet.map(|q| q.start));
            quints.extend(d.quintuplet.map(|q| q.start));
        }
        prop_assert_eq!(detector.next_n(), start + outcomes.len() as u64);
        prop_assert!(quads.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(quads, naive_runs(&outcomes, 4, start));
        prop_assert_eq!(quints, naive_runs(&outcomes, 5, start));
    }

    /// Every quintuplet start is also a quadruplet start.
    #[test]
    fn prop_quintuplet_implies_quadruplet(
        outcomes in prop::collection::vec(prop::bool::weighted(0.8), 0..200),
    ) {
        let mut detector = ConstellationDetector::new(1);
        let mut quads = Vec::new();
        let mut quints = Vec::new();
        for &b in &outcomes {
            let d = detector.push(b);
            quads.extend(d.quadruplet.map(|q| q.start));
            quints.extend(d.quintuplet.map(|q| q.start));
        }
        for s in quints {
            prop_assert!(quads.contains(&s));
        }
    }
}
