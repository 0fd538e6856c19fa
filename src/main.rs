//! # Main — CLI Entry Point
//!
//! Routes subcommands to the implementations in `cli.rs`. Mirrors the
//! teacher's `main.rs`/`cli.rs` split and its `tracing_subscriber` setup
//! (`LOG_FORMAT=json` for machine consumption, human-readable otherwise).
//!
//! ## Subcommands
//!
//! - `is-prob-prime N`: BPSW only.
//! - `is-prime N`: BPSW plus extra Miller-Rabin rounds and the BLS fast path.
//! - `prove N [--out FILE]`: full deterministic proof, ECPP if BLS doesn't close it.
//! - `verify-proof FILE`: independently re-check a proof certificate.
//! - `factor N`: full prime decomposition via the factoring cascade.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ecpp", about = "Arbitrary-precision primality proving and factoring")]
pub struct Cli {
    /// Outer fac_stage cap for the ECPP driver.
    #[arg(long, default_value_t = 20)]
    max_fac_stage: u32,

    /// Extra random Miller-Rabin rounds beyond BPSW.
    #[arg(long, default_value_t = 25)]
    mr_rounds: u32,

    /// Candidates above this bit size skip the BLS n-1 fast path.
    #[arg(long, default_value_t = 200)]
    bls_max_bits: u32,

    /// PRNG seed, for reproducible proofs and tests.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Number of rayon worker threads (0 = all logical cores).
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Verbosity counter (0 = warn, 1 = info, 2 = debug, 3+ = trace). Repeat
    /// to increase, e.g. `-vvv`.
    #[arg(short = 'v', long = "verbosity", action = clap::ArgAction::Count)]
    verbosity: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// BPSW probable-primality test only.
    IsProbPrime { n: String },
    /// BPSW plus extra Miller-Rabin rounds and the BLS n-1 fast path.
    IsPrime { n: String },
    /// Full deterministic proof: BLS n-1 fast path, then ECPP.
    Prove {
        n: String,
        /// Write the proof certificate here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Independently re-verify a proof certificate file.
    VerifyProof { file: PathBuf },
    /// Full prime factorization via the factoring cascade.
    Factor { n: String },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let level = ecpp_core::context::ProofContext::level_for_verbosity(args.verbosity as u32);

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt().json().with_target(false).with_max_level(level).init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_max_level(level)
            .init();
    }

    cli::configure_rayon(if args.threads == 0 { None } else { Some(args.threads) });

    match &args.command {
        Commands::IsProbPrime { n } => cli::run_is_prob_prime(&args, n),
        Commands::IsPrime { n } => cli::run_is_prime(&args, n),
        Commands::Prove { n, out } => cli::run_prove(&args, n, out.as_deref()),
        Commands::VerifyProof { file } => cli::run_verify_proof(file),
        Commands::Factor { n } => cli::run_factor(&args, n),
    }
}
