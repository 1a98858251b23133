//! # Artifact — Delimited Output Files
//!
//! The sweep's results leave the process as flat CSV files that the plotting
//! scripts read column by column:
//!
//! | File | Header | Row |
//! |------|--------|-----|
//! | quadruplets | `starting_n,approx_digits` | one per quadruplet |
//! | quintuplets | `starting_n` | one per quintuplet |
//!
//! Integers are plain decimal without separators. Writes go to a `.tmp`
//! sibling first and are renamed into place, so a failed write never leaves
//! a truncated artifact behind; the records themselves stay in the caller's
//! `SweepReport`, so the write can simply be retried.
//!
//! An interrupted sweep writes to `partial_path` siblings instead, so a
//! partial census never replaces a complete one.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constellation::{QuadrupletRecord, QuintupletRecord};
use crate::error::SweepError;

pub const QUADRUPLET_HEADER: &str = "starting_n,approx_digits";
pub const QUINTUPLET_HEADER: &str = "starting_n";

pub fn write_quadruplets(path: &Path, records: &[QuadrupletRecord]) -> Result<(), SweepError> {
    write_records(path, QUADRUPLET_HEADER, records)
}

pub fn write_quintuplets(path: &Path, records: &[QuintupletRecord]) -> Result<(), SweepError> {
    write_records(path, QUINTUPLET_HEADER, records)
}

pub fn read_quadruplets(path: &Path) -> Result<Vec<QuadrupletRecord>, SweepError> {
    read_records(path)
}

/// Sibling path for the artifacts of an interrupted sweep:
/// `quadruplets.csv` becomes `quadruplets.csv.partial`.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut p = path.as_os_str().to_os_string();
    p.push(".partial");
    PathBuf::from(p)
}

/// The header is written by hand so that an empty artifact still has one.
fn write_records<T: Serialize>(path: &Path, header: &str, records: &[T]) -> Result<(), SweepError> {
    let tmp = path.with_extension("tmp");
    let write = || -> Result<(), csv::Error> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp)?;
        wtr.write_record(header.split(','))?;
        for record in records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    };
    write().map_err(|e| SweepError::io(path, e.into()))?;
    fs::rename(&tmp, path).map_err(|e| SweepError::io(path, e))
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SweepError> {
    let mut rdr = csv::Reader::from_path(path).map_err(|e| SweepError::io(path, e.into()))?;
    rdr.deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|e| SweepError::io(path, e.into()))
}
