//! # CLI — Subcommand Implementations
//!
//! Thin translation layer between `clap`'s parsed arguments and the library
//! façade in `lib.rs`. Mirrors the teacher's `cli.rs`/`main.rs` split: `main.rs`
//! owns argument parsing and global setup (logging, rayon), this module owns
//! what each subcommand actually does.

use anyhow::{bail, Context as _, Result};
use ecpp_core::context::{EcppConfig, ProofContext};
use rug::Integer;
use tracing::info;

use crate::{Cli, Commands};

fn parse_n(s: &str) -> Result<Integer> {
    ecpp_core::parse_candidate(s).with_context(|| format!("invalid candidate {s:?}"))
}

fn config_from_cli(cli: &Cli) -> EcppConfig {
    EcppConfig {
        max_fac_stage: cli.max_fac_stage,
        mr_rounds: cli.mr_rounds,
        bls_max_bits: cli.bls_max_bits,
        large_discriminant_set: false,
    }
}

/// Builds a `ProofContext` from parsed CLI args, carrying the verbosity
/// counter through so the ECPP recursion's `tracing` calls respect `-v`.
fn context_from_cli(cli: &Cli) -> ProofContext {
    let mut ctx = ProofContext::with_seed(config_from_cli(cli), cli.seed);
    ctx.set_verbosity(cli.verbosity as u32);
    ctx
}

pub fn configure_rayon(threads: Option<usize>) {
    let num_threads = threads.unwrap_or(0);
    match rayon::ThreadPoolBuilder::new().num_threads(num_threads).build_global() {
        Ok(()) => info!(threads = num_threads, "rayon thread pool configured"),
        Err(e) => info!(error = %e, "rayon thread pool already configured, ignoring"),
    }
}

pub fn run_is_prob_prime(cli: &Cli, n: &str) -> Result<()> {
    let n = parse_n(n)?;
    let result = ecpp_core::is_prob_prime(&n)?;
    let _ = cli;
    match result {
        0 => println!("{n}: composite"),
        1 => println!("{n}: probable prime (BPSW)"),
        2 => println!("{n}: prime (BPSW deterministic, n < 2^64)"),
        _ => unreachable!(),
    }
    Ok(())
}

pub fn run_is_prime(cli: &Cli, n: &str) -> Result<()> {
    let n = parse_n(n)?;
    let mut ctx = context_from_cli(cli);
    let result = ecpp_core::is_prime(&n, &mut ctx)?;
    match result {
        0 => println!("{n}: composite"),
        1 => println!("{n}: probable prime"),
        2 => println!("{n}: prime"),
        _ => unreachable!(),
    }
    Ok(())
}

pub fn run_prove(cli: &Cli, n: &str, out: Option<&std::path::Path>) -> Result<()> {
    let n = parse_n(n)?;
    let mut ctx = context_from_cli(cli);
    let (result, proof) = ecpp_core::is_provable_prime(&n, true, &mut ctx)?;
    match result {
        0 => println!("{n}: composite"),
        1 => println!("{n}: probable prime (ECPP search did not complete within configured bounds)"),
        2 => {
            println!("{n}: prime");
            if let Some(text) = proof {
                match out {
                    Some(path) => {
                        std::fs::write(path, &text)
                            .with_context(|| format!("writing proof certificate to {}", path.display()))?;
                        info!(path = %path.display(), "proof certificate written");
                    }
                    None => print!("{text}"),
                }
            }
        }
        _ => unreachable!(),
    }
    Ok(())
}

pub fn run_verify_proof(path: &std::path::Path) -> Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let lines = ecpp_core::certificate::parse(&text)?;
    if ecpp_core::certificate::verify(&lines) {
        println!("proof is valid: {} recursion level(s)", lines.len());
        Ok(())
    } else {
        bail!("proof verification failed")
    }
}

pub fn run_factor(cli: &Cli, n: &str) -> Result<()> {
    let n = parse_n(n)?;
    let mut ctx = context_from_cli(cli);
    let factors = ecpp_core::factor(&n, &mut ctx);
    let rendered: Vec<String> = factors.iter().map(|f| f.to_string()).collect();
    println!("{n} = {}", rendered.join(" * "));
    Ok(())
}
