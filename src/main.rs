//! # Main — CLI Entry Point
//!
//! Routes subcommands to the census library:
//!
//! - `sweep`: scan [start, end] for quadruplets, write CSV artifacts.
//! - `verify`: re-test every record in a quadruplet CSV.
//! - `table`: print the pre-sieve residue tables for an exponent and bound.
//!
//! ## Global Options
//!
//! - `--threads` / `Q47_THREADS`: Rayon thread pool size (default all cores).
//! - `--checkpoint` / `Q47_CHECKPOINT`: resumable sweep state (off when unset).
//!
//! `LOG_FORMAT=json` switches logging to one JSON object per line;
//! `RUST_LOG` filters as usual (default `info`).

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "q47",
    version,
    about = "Census of prime quadruplets of n^47 - (n-1)^47"
)]
struct Cli {
    /// Number of rayon worker threads (defaults to all logical cores)
    #[arg(long, global = true, env = "Q47_THREADS")]
    threads: Option<usize>,

    /// Checkpoint file for resuming an interrupted sweep
    #[arg(long, global = true, env = "Q47_CHECKPOINT")]
    checkpoint: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a range of n for prime quadruplets
    Sweep {
        /// First n to scan (inclusive)
        #[arg(long, env = "Q47_START")]
        start: Option<u64>,
        /// Last n to scan (inclusive)
        #[arg(long, env = "Q47_END")]
        end: Option<u64>,
        /// TOML file with sweep parameters; flags override its values
        #[arg(long, env = "Q47_CONFIG")]
        config: Option<PathBuf>,
        /// Pre-sieve with every prime below this bound (default 1000)
        #[arg(long, env = "Q47_SIEVE_BOUND")]
        sieve_bound: Option<u64>,
        /// Miller-Rabin rounds per candidate (default 25)
        #[arg(long, env = "Q47_MR_ROUNDS")]
        mr_rounds: Option<u32>,
        /// Exponent e in n^e - (n-1)^e (default 47)
        #[arg(long, env = "Q47_EXPONENT")]
        exponent: Option<u32>,
        /// Candidates evaluated per parallel block
        #[arg(long, env = "Q47_BLOCK_SIZE")]
        block_size: Option<u64>,
        /// Integers between progress lines
        #[arg(long, env = "Q47_PROGRESS_INTERVAL")]
        progress_interval: Option<u64>,
        /// Quadruplet CSV output
        #[arg(long, default_value = "quadruplets.csv")]
        output: PathBuf,
        /// Quintuplet CSV output
        #[arg(long, default_value = "quintuplets.csv")]
        quintuplets: PathBuf,
        /// Also write the full report as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Re-verify every quadruplet in a CSV artifact
    Verify {
        /// Quadruplet CSV to check
        #[arg(long)]
        input: PathBuf,
        /// Miller-Rabin rounds per value (default 25)
        #[arg(long, default_value_t = q47_census::oracle::DEFAULT_MR_ROUNDS)]
        mr_rounds: u32,
        /// Exponent the artifact was produced with
        #[arg(long, default_value_t = q47_census::CENSUS_EXPONENT)]
        exponent: u32,
    },
    /// Print the pre-sieve residue tables
    Table {
        /// Include primes below this bound
        #[arg(long, default_value_t = q47_census::sieve::DEFAULT_SIEVE_BOUND)]
        sieve_bound: u64,
        /// Exponent e in n^e - (n-1)^e
        #[arg(long, default_value_t = q47_census::CENSUS_EXPONENT)]
        exponent: u32,
        /// Emit JSON instead of a text table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // LOG_FORMAT=json for log shippers, human-readable on stderr otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    cli::configure_rayon(cli.threads);

    match &cli.command {
        Commands::Sweep { .. } => cli::run_sweep(&cli),
        Commands::Verify {
            input,
            mr_rounds,
            exponent,
        } => cli::run_verify(input, *mr_rounds, *exponent),
        Commands::Table {
            sieve_bound,
            exponent,
            json,
        } => cli::run_table(*sieve_bound, *exponent, *json),
    }
}
