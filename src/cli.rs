//! # CLI Execution Functions
//!
//! Kept out of `main.rs` so the entry point stays a thin router. Holds the
//! execution logic for each subcommand plus rayon and signal setup.

use anyhow::{bail, Context, Result};
use q47_census::config::ConfigFile;
use q47_census::presieve::ResidueSet;
use q47_census::sieve::MAX_SIEVE_BOUND;
use q47_census::verify::{self, VerifyResult};
use q47_census::{
    artifact, checkpoint, MillerRabin, PowerDifference, SieveTable, SweepDriver, SweepReport,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{Cli, Commands};

// ── Sweep ───────────────────────────────────────────────────────

/// Resolve the sweep configuration, run it with SIGINT/SIGTERM wired to the
/// stop flag, then write the artifacts. The checkpoint is cleared only once
/// a completed sweep's artifacts are on disk; an interrupted sweep writes
/// `.partial` artifacts and exits non-zero.
pub fn run_sweep(cli: &Cli) -> Result<()> {
    let Commands::Sweep {
        start,
        end,
        config,
        sieve_bound,
        mr_rounds,
        exponent,
        block_size,
        progress_interval,
        output,
        quintuplets,
        summary,
    } = &cli.command
    else {
        bail!("run_sweep called for a different subcommand");
    };

    let file = match config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let flags = ConfigFile {
        n_start: *start,
        n_end: *end,
        sieve_bound: *sieve_bound,
        mr_rounds: *mr_rounds,
        exponent: *exponent,
        block_size: *block_size,
        progress_interval: *progress_interval,
        checkpoint_interval_secs: None,
    };
    let config = file.merge(flags).resolve()?;

    let stop = Arc::new(AtomicBool::new(false));
    spawn_signal_listener(Arc::clone(&stop));

    let oracle = MillerRabin::new(config.mr_rounds);
    info!(
        first = %config.form().expression(config.n_start),
        error_bound = format_args!("{:.1e}", oracle.error_bound()),
        "oracle configured"
    );
    let mut driver = SweepDriver::new(config, &oracle)?.with_stop_flag(&stop);
    if let Some(path) = &cli.checkpoint {
        driver = driver.with_checkpoint(path);
    }

    let report = driver.run()?;
    report.log_summary();

    let (quad_path, quint_path, summary_path) = if report.completed {
        (output.clone(), quintuplets.clone(), summary.clone())
    } else {
        (
            artifact::partial_path(output),
            artifact::partial_path(quintuplets),
            summary.as_deref().map(artifact::partial_path),
        )
    };
    if let Err(e) = write_artifacts(&report, &quad_path, &quint_path, summary_path.as_deref()) {
        let dump = fallback_report_path(cli.checkpoint.as_deref());
        match std::fs::write(&dump, serde_json::to_string_pretty(&report)?) {
            Ok(()) => error!(path = %dump.display(), "artifact write failed; report saved as JSON"),
            Err(dump_err) => error!(error = %dump_err, "artifact write failed and report could not be saved"),
        }
        return Err(e);
    }

    if !report.completed {
        bail!(
            "sweep interrupted at n = {}; partial artifacts written, rerun to resume",
            report.last_n
        );
    }
    if let Some(path) = &cli.checkpoint {
        checkpoint::clear(path);
    }
    Ok(())
}

/// Where the report goes when the artifacts cannot be written: next to the
/// checkpoint if there is one, otherwise the system temp directory.
fn fallback_report_path(checkpoint: Option<&Path>) -> PathBuf {
    match checkpoint {
        Some(path) => path.with_extension("report.json"),
        None => std::env::temp_dir().join(format!("q47-report-{}.json", std::process::id())),
    }
}

fn write_artifacts(
    report: &SweepReport,
    quadruplets: &Path,
    quintuplets: &Path,
    summary: Option<&Path>,
) -> Result<()> {
    artifact::write_quadruplets(quadruplets, &report.quadruplets)?;
    artifact::write_quintuplets(quintuplets, &report.quintuplets)?;
    info!(
        quadruplets = %quadruplets.display(),
        quintuplets = %quintuplets.display(),
        "artifacts written"
    );
    if let Some(path) = summary {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing summary to {}", path.display()))?;
    }
    Ok(())
}

/// Set `stop` on the first SIGINT or SIGTERM. The listener runs on its own
/// current-thread runtime so the rayon pool is never blocked on it.
fn spawn_signal_listener(stop: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!(error = %e, "could not start signal handler runtime");
                return;
            }
        };
        rt.block_on(async {
            let ctrl_c = tokio::signal::ctrl_c();
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                match signal(SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        tokio::select! {
                            _ = ctrl_c => {},
                            _ = sigterm.recv() => {},
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "could not install SIGTERM handler");
                        let _ = ctrl_c.await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                let _ = ctrl_c.await;
            }
            info!("signal received, stopping at the next block boundary");
            stop.store(true, Ordering::Relaxed);
        });
    });
}

// ── Verification ────────────────────────────────────────────────

/// Re-test every record of a quadruplet artifact; fails if any record does.
pub fn run_verify(input: &Path, mr_rounds: u32, exponent: u32) -> Result<()> {
    if exponent < 2 {
        bail!("exponent must be at least 2 (got {})", exponent);
    }
    let records = artifact::read_quadruplets(input)?;
    if records.is_empty() {
        eprintln!("No quadruplets to verify");
        return Ok(());
    }

    let form = PowerDifference::new(exponent);
    let oracle = MillerRabin::new(mr_rounds);
    eprintln!("Verifying {} quadruplets...", records.len());
    eprintln!("{:<16} {:<8} Status", "Start", "Digits");
    eprintln!("{}", "-".repeat(60));

    let results = verify::verify_all(&records, form, &oracle);
    let mut failed = 0u64;
    for (record, result) in records.iter().zip(&results) {
        match result {
            VerifyResult::Verified => {
                eprintln!("{:<16} {:<8} VERIFIED", record.start, record.approx_digits);
            }
            VerifyResult::Failed { reason } => {
                eprintln!(
                    "{:<16} {:<8} FAILED: {}",
                    record.start, record.approx_digits, reason
                );
                failed += 1;
            }
        }
    }

    let verified = results.len() as u64 - failed;
    eprintln!("\nSummary: {} verified, {} failed", verified, failed);
    if failed > 0 {
        bail!("{} of {} quadruplets failed verification", failed, results.len());
    }
    Ok(())
}

// ── Residue Tables ──────────────────────────────────────────────

#[derive(Serialize)]
struct TableSummary<'a> {
    exponent: u32,
    sieve_bound: u64,
    moduli: usize,
    sieve_min_n: u64,
    survival_fraction: f64,
    active: Vec<&'a ResidueSet>,
}

/// Print the pre-sieve tables: one line per modulus with a non-empty set.
pub fn run_table(sieve_bound: u64, exponent: u32, json: bool) -> Result<()> {
    if exponent < 2 {
        bail!("exponent must be at least 2 (got {})", exponent);
    }
    if sieve_bound == 0 || sieve_bound > MAX_SIEVE_BOUND {
        bail!(
            "sieve bound must be in 1..={} (got {})",
            MAX_SIEVE_BOUND,
            sieve_bound
        );
    }
    let table = SieveTable::build(PowerDifference::new(exponent), sieve_bound);

    if json {
        let summary = TableSummary {
            exponent,
            sieve_bound: table.bound(),
            moduli: table.moduli().count(),
            sieve_min_n: table.sieve_min_n(),
            survival_fraction: table.survival_fraction(),
            active: table.active().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "Q(n) = n^{} - (n-1)^{}, primes below {}: {} moduli, {} active",
        exponent,
        exponent,
        table.bound(),
        table.moduli().count(),
        table.active().count()
    );
    println!("{:<8} {:<6} Residues", "Modulus", "Count");
    println!("{}", "-".repeat(60));
    for set in table.active() {
        let residues: Vec<String> = set.residues.iter().map(|r| r.to_string()).collect();
        println!("{:<8} {:<6} {}", set.modulus, set.len(), residues.join(" "));
    }
    println!(
        "\nSurvival fraction: {:.4}  (sieve applies from n = {})",
        table.survival_fraction(),
        table.sieve_min_n()
    );
    Ok(())
}

// ── Thread Pool ─────────────────────────────────────────────────

pub fn configure_rayon(threads: Option<usize>) {
    let num_threads = threads.unwrap_or(0);
    if num_threads > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
        {
            warn!(error = %e, "Could not configure rayon thread pool");
        }
    }
}
