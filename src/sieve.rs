//! # Sieve — Small-Prime Generation and Word-Sized Modular Arithmetic
//!
//! Number-theoretic primitives underneath the residue tables in `presieve`:
//!
//! 1. **Prime generation** via a wheel-30 sieve of Eratosthenes. Only the eight
//!    residues coprime to 30 = 2·3·5 are stored, one bit each, so a segment of
//!    30 integers packs into a single byte.
//! 2. **Modular exponentiation** (`pow_mod`) by repeated squaring with u128
//!    intermediates, so the power r^e mod q never materializes r^e.
//!
//! The modulus set of a sweep is `primes_below(B)` with B = 1000 by default.
//! Residue tables cost O(q) per active modulus, so B is capped at
//! `MAX_SIEVE_BOUND`; below that the wheel lets `q47 table` study how the
//! survival fraction decays with B.
//!
//! ## References
//!
//! - Eratosthenes of Cyrene, ~240 BCE.
//! - Crandall & Pomerance, *Prime Numbers: A Computational Perspective*,
//!   §3.2 (wheel sieves) and §2.1.2 (binary powering).

/// Default exclusive bound for the modulus set.
pub const DEFAULT_SIEVE_BOUND: u64 = 1000;
/// Largest accepted sieve bound.
pub const MAX_SIEVE_BOUND: u64 = 100_000;

/// Residues coprime to 30, one per bit of a wheel byte.
const SPOKES: [u8; 8] = [1, 7, 11, 13, 17, 19, 23, 29];

/// Bit index of a residue mod 30 inside a wheel byte, or `None` if the residue
/// shares a factor with 30.
const fn spoke_bit(residue: usize) -> Option<u8> {
    match residue {
        1 => Some(0),
        7 => Some(1),
        11 => Some(2),
        13 => Some(3),
        17 => Some(4),
        19 => Some(5),
        23 => Some(6),
        29 => Some(7),
        _ => None,
    }
}

/// All primes p with p < `bound`, strictly increasing.
pub fn primes_below(bound: u64) -> Vec<u64> {
    if bound <= 2 {
        return vec![];
    }
    generate_primes(bound - 1)
}

/// All primes p with p ≤ `limit`, strictly increasing (wheel-30).
pub fn generate_primes(limit: u64) -> Vec<u64> {
    let mut primes: Vec<u64> = [2u64, 3, 5].into_iter().filter(|&p| p <= limit).collect();
    if limit < 7 {
        return primes;
    }

    let limit = limit as usize;
    let segments = limit / 30 + 1;
    // Every spoke starts out as a prime candidate; 1 itself is cleared below.
    let mut wheel = vec![0xFFu8; segments];
    wheel[0] &= !1;

    let root = (limit as f64).sqrt() as usize + 1;
    for seg in 0..segments {
        if seg * 30 > root {
            break;
        }
        for (bit, &spoke) in SPOKES.iter().enumerate() {
            let p = seg * 30 + spoke as usize;
            if p < 7 || p > root || wheel[seg] & (1 << bit) == 0 {
                continue;
            }
            let mut m = p * p;
            while m <= limit {
                if let Some(b) = spoke_bit(m % 30) {
                    wheel[m / 30] &= !(1 << b);
                }
                m += 2 * p;
            }
        }
    }

    primes.reserve(estimate_prime_count(limit));
    for (seg, &byte) in wheel.iter().enumerate() {
        if byte == 0 {
            continue;
        }
        for (bit, &spoke) in SPOKES.iter().enumerate() {
            let n = seg * 30 + spoke as usize;
            if byte & (1 << bit) != 0 && n <= limit {
                primes.push(n as u64);
            }
        }
    }
    primes
}

/// Rough upper estimate of π(n), used only to size the output vector.
fn estimate_prime_count(n: usize) -> usize {
    if n < 10 {
        return 4;
    }
    let nf = n as f64;
    (1.3 * nf / nf.ln()) as usize
}

/// Modular exponentiation: base^exp mod modulus.
/// Uses u128 intermediates to avoid overflow for moduli up to ~2^63.
pub fn pow_mod(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let mut result: u64 = 1;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            result = (result as u128 * base as u128 % modulus as u128) as u64;
        }
        exp >>= 1;
        base = (base as u128 * base as u128 % modulus as u128) as u64;
    }
    result
}
