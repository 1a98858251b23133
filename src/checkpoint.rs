//! # Checkpoint — Resumable Scan Position
//!
//! A long census run (hours to weeks) can be interrupted between blocks and
//! resumed. The checkpoint carries the scan position, the detector window,
//! the running statistics and every record emitted so far; the sieve tables
//! are *not* stored and are rebuilt on resume.
//!
//! ## Atomic Writes
//!
//! Checkpoint files are written atomically: write to a temp file, then
//! rename. A crash mid-write leaves the previous generation intact.
//!
//! ## Integrity
//!
//! The JSON payload is wrapped in an envelope with its SHA-256 hex digest.
//! On load the digest is recomputed; a mismatching file is skipped and the
//! next older generation (up to 3 kept) is tried.
//!
//! ## Compatibility
//!
//! A checkpoint is only resumed by a sweep with the same `SweepFingerprint`
//! (range, exponent, sieve bound, round count). Anything else starts fresh.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::SweepConfig;
use crate::constellation::{ConstellationDetector, QuadrupletRecord, QuintupletRecord};
use crate::sweep::SweepStatistics;

/// Number of backup generations to keep.
const GENERATIONS: usize = 3;

/// The parameters a checkpoint must agree with to be resumed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepFingerprint {
    pub n_start: u64,
    pub n_end: u64,
    pub exponent: u32,
    pub sieve_bound: u64,
    pub mr_rounds: u32,
}

impl From<&SweepConfig> for SweepFingerprint {
    fn from(c: &SweepConfig) -> Self {
        SweepFingerprint {
            n_start: c.n_start,
            n_end: c.n_end,
            exponent: c.exponent,
            sieve_bound: c.sieve_bound,
            mr_rounds: c.mr_rounds,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Last integer whose outcome reached the detector.
    pub last_n: u64,
    pub fingerprint: SweepFingerprint,
    pub detector: ConstellationDetector,
    pub stats: SweepStatistics,
    pub quadruplets: Vec<QuadrupletRecord>,
    pub quintuplets: Vec<QuintupletRecord>,
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Whether this checkpoint can continue a sweep configured as `config`.
    pub fn resumes(&self, config: &SweepConfig) -> bool {
        self.fingerprint == SweepFingerprint::from(config)
            && self.last_n >= config.n_start
            && self.last_n < config.n_end
            && self.detector.next_n() == self.last_n + 1
    }
}

/// Wrapper that includes a SHA-256 checksum for integrity verification.
#[derive(Serialize, Deserialize)]
struct CheckpointEnvelope {
    checksum: String,
    data: serde_json::Value,
}

fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Return the path for generation `gen` (0 = current, 1 = .1, 2 = .2).
fn generation_path(base: &Path, gen: usize) -> PathBuf {
    if gen == 0 {
        base.to_path_buf()
    } else {
        let mut p = base.as_os_str().to_os_string();
        p.push(format!(".{}", gen));
        PathBuf::from(p)
    }
}

/// Save a checkpoint with integrity checksum and rotating generations.
///
/// Rotation: current → .1 → .2 (oldest .2 is discarded).
pub fn save(path: &Path, checkpoint: &Checkpoint) -> Result<()> {
    for gen in (1..GENERATIONS).rev() {
        let src = generation_path(path, gen - 1);
        let dst = generation_path(path, gen);
        if src.exists() {
            let _ = fs::rename(&src, &dst);
        }
    }

    let data = serde_json::to_value(checkpoint)?;
    let checksum = sha256_hex(&serde_json::to_string_pretty(&data)?);
    let json = serde_json::to_string_pretty(&CheckpointEnvelope { checksum, data })?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load the newest valid checkpoint, falling back to older generations on corruption.
pub fn load(path: &Path) -> Option<Checkpoint> {
    (0..GENERATIONS).find_map(|gen| {
        let p = generation_path(path, gen);
        let cp = load_single(&p)?;
        if gen > 0 {
            warn!(generation = gen, path = %p.display(), "recovered checkpoint from older generation");
        }
        Some(cp)
    })
}

fn load_single(path: &Path) -> Option<Checkpoint> {
    let raw = fs::read_to_string(path).ok()?;
    let envelope: CheckpointEnvelope = serde_json::from_str(&raw).ok()?;

    let expected = sha256_hex(&serde_json::to_string_pretty(&envelope.data).ok()?);
    if expected != envelope.checksum {
        warn!(
            path = %path.display(),
            expected = &expected[..12],
            "checkpoint integrity check failed"
        );
        return None;
    }
    serde_json::from_value(envelope.data).ok()
}

/// Clear all checkpoint files (current + all generations + stray .tmp).
pub fn clear(path: &Path) {
    for gen in 0..GENERATIONS {
        let _ = fs::remove_file(generation_path(path, gen));
    }
    let _ = fs::remove_file(path.with_extension("tmp"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(last_n: u64) -> Checkpoint {
        let config = SweepConfig::new(10, 1000);
        let mut detector = ConstellationDetector::new(10);
        for _ in 10..=last_n {
            detector.push(true);
        }
        Checkpoint {
            last_n,
            fingerprint: SweepFingerprint::from(&config),
            detector,
            stats: SweepStatistics {
                scanned: last_n - 9,
                tested: 3,
                primes_found: 2,
                elapsed_secs: 1.5,
            },
            quadruplets: vec![QuadrupletRecord {
                start: 10,
                approx_digits: 47,
            }],
            quintuplets: vec![],
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.checkpoint");
        let cp = sample(20);
        save(&path, &cp).unwrap();
        assert_eq!(load(&path).unwrap(), cp);
    }

    #[test]
    fn rotation_keeps_generations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.checkpoint");
        for n in [20u64, 30, 40] {
            save(&path, &sample(n)).unwrap();
        }
        assert!(generation_path(&path, 1).exists());
        assert!(generation_path(&path, 2).exists());
        assert_eq!(load_single(&path).unwrap().last_n, 40);
        assert_eq!(load_single(&generation_path(&path, 1)).unwrap().last_n, 30);
        assert_eq!(load_single(&generation_path(&path, 2)).unwrap().last_n, 20);
    }

    /// Tampering with the current file must fall back to generation .1.
    #[test]
    fn corrupted_checkpoint_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.checkpoint");
        save(&path, &sample(20)).unwrap();
        save(&path, &sample(30)).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        fs::write(&path, raw.replace("\"last_n\": 30", "\"last_n\": 31")).unwrap();

        assert_eq!(load(&path).unwrap().last_n, 20);
    }

    #[test]
    fn clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.checkpoint");
        for n in [20u64, 30, 40] {
            save(&path, &sample(n)).unwrap();
        }
        clear(&path);
        assert!(load(&path).is_none());
        assert!(!generation_path(&path, 1).exists());
    }

    #[test]
    fn load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("nothing")).is_none());
    }

    #[test]
    fn resumes_only_matching_sweeps() {
        let cp = sample(20);
        assert!(cp.resumes(&SweepConfig::new(10, 1000)));
        assert!(!cp.resumes(&SweepConfig::new(10, 2000)));

        let mut other_exponent = SweepConfig::new(10, 1000);
        other_exponent.exponent = 7;
        assert!(!cp.resumes(&other_exponent));

        // A checkpoint at the very end has nothing left to resume.
        assert!(!sample(1000).resumes(&SweepConfig::new(10, 1000)));
    }
}
