//! # q47-census — Prime Quadruplets of n^47 − (n−1)^47
//!
//! Scans integer ranges for four consecutive n where
//! Q(n) = n^47 − (n−1)^47 is a probable prime, flagging runs of five.
//!
//! | Module | Role |
//! |--------|------|
//! | [`sieve`] | Small-prime generation and word-size `pow_mod` |
//! | [`form`] | `PowerDifference` evaluation (exact and modular), digit estimate |
//! | [`presieve`] | Bad-residue tables and the small-factor filter |
//! | [`oracle`] | `PrimalityTest` trait, screened Miller–Rabin, trial division |
//! | [`constellation`] | Streaming five-slot window detector |
//! | [`sweep`] | Parallel block driver, statistics, report |
//! | [`checkpoint`] | Resumable scan position with integrity check |
//! | [`artifact`] | CSV output files |
//! | [`verify`] | Independent re-check of published quadruplets |
//! | [`config`] | `SweepConfig`, TOML overlay, validation |
//! | [`progress`] | Periodic progress observations |
//! | [`error`] | `SweepError` |

pub mod artifact;
pub mod checkpoint;
pub mod config;
pub mod constellation;
pub mod error;
pub mod form;
pub mod oracle;
pub mod presieve;
pub mod progress;
pub mod sieve;
pub mod sweep;
pub mod verify;

pub use config::SweepConfig;
pub use constellation::{ConstellationDetector, QuadrupletRecord, QuintupletRecord};
pub use error::SweepError;
pub use form::{approx_digits, PowerDifference, CENSUS_EXPONENT};
pub use oracle::{MillerRabin, PrimalityTest, TrialDivision};
pub use presieve::{SieveTable, SieveVerdict};
pub use sweep::{SweepDriver, SweepReport, SweepStatistics};
