//! # BLS — Generalized Pocklington N−1 Fast Path
//!
//! Before paying for a full ECPP recursion, try to prove primality the cheap
//! way: partially factor `N−1` with the factoring cascade, and if the
//! factored part `F` exceeds `√N`, Pocklington's theorem closes the proof
//! directly — one Fermat witness per distinct prime factor of `F`. This
//! generalizes the teacher's `pocklington_factorial_proof` (which only
//! worked because `N−1 = n!` was *known* to be fully factored in advance) to
//! an arbitrary `N` whose `N−1` is factored on the fly by [`crate::factor`].
//!
//! Per SPEC_FULL.md §0.5: `is_prime` tries this path for candidates up to
//! `bls_max_bits`; `is_provable_prime` tries it before falling back to ECPP
//! for every size, since a cheap deterministic proof is always preferable to
//! a full recursion when one is available.

use crate::bpsw::{is_prob_prime, BpswResult};
use crate::context::ProofContext;
use crate::error::EResult;
use crate::factor::factor_once;
use rug::Integer;

pub enum BlsResult {
    /// `N−1` was factored enough (`F > √N`) and every witness check passed.
    Proven,
    /// Fermat's little theorem failed for some witness/factor — `N` is composite.
    Composite,
    /// `N−1` couldn't be factored enough within budget; try ECPP instead.
    NotApplicable,
}

/// Partially factor `n - 1`, stopping once the factored product exceeds
/// `sqrt(n)` or the per-call budget of cascade attempts is exhausted.
/// Returns the distinct prime factors found and their product `F`.
fn partial_factor(n_minus_1: &Integer, budget: u32, ctx: &mut ProofContext) -> (Vec<Integer>, Integer) {
    let mut factors: Vec<Integer> = Vec::new();
    let mut product = Integer::from(1u32);
    let mut worklist = vec![n_minus_1.clone()];
    let threshold = Integer::from(n_minus_1.clone() + 1u32).root(2);

    let mut attempts = 0u32;
    while let Some(m) = worklist.pop() {
        if m <= 1u32 {
            continue;
        }
        if product > threshold {
            break;
        }
        match is_prob_prime(&m) {
            Ok(r) if r != BpswResult::Composite => {
                if !factors.contains(&m) {
                    product = Integer::from(&product * &m);
                    factors.push(m);
                }
                continue;
            }
            _ => {}
        }
        attempts += 1;
        if attempts > budget {
            break;
        }
        match factor_once(&m, 2, ctx) {
            Some((f, _kind)) => {
                let cof = Integer::from(&m / &f);
                worklist.push(f);
                worklist.push(cof);
            }
            None => continue, // gave up on this residual; leaves F short of threshold
        }
    }

    (factors, product)
}

/// Attempt the BLS n−1 fast path for `n`. Assumes `n` already passed BPSW as
/// a probable prime (the caller is responsible for that gate).
pub fn bls_prove(n: &Integer, ctx: &mut ProofContext) -> EResult<BlsResult> {
    let n_minus_1 = Integer::from(n - 1u32);
    let sqrt_n = n.clone().sqrt();

    let (factors, product) = partial_factor(&n_minus_1, 64, ctx);
    if product <= sqrt_n {
        return Ok(BlsResult::NotApplicable);
    }

    for q in &factors {
        let exp_full = n_minus_1.clone();
        let exp_q = Integer::from(&n_minus_1 / q);
        let mut witnessed = false;
        for a in 2u32..=200 {
            let base = Integer::from(a);
            let fermat = match base.clone().pow_mod(&exp_full, n) {
                Ok(r) => r,
                Err(_) => continue,
            };
            if fermat != 1u32 {
                return Ok(BlsResult::Composite);
            }
            let partial = match base.pow_mod(&exp_q, n) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let g = Integer::from(&partial - 1u32).gcd(n);
            if g == 1u32 {
                witnessed = true;
                break;
            }
            if g != *n {
                return Ok(BlsResult::Composite);
            }
        }
        if !witnessed {
            return Ok(BlsResult::NotApplicable);
        }
    }

    Ok(BlsResult::Proven)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EcppConfig;

    #[test]
    fn proves_small_prime_with_smooth_n_minus_1() {
        // 97 - 1 = 96 = 2^5 * 3, fully smooth and easily factored.
        let mut ctx = ProofContext::with_seed(EcppConfig::default(), 3);
        let n = Integer::from(97u32);
        match bls_prove(&n, &mut ctx).unwrap() {
            BlsResult::Proven => {}
            _ => panic!("expected BLS to prove 97 directly"),
        }
    }

    #[test]
    fn composite_rejected() {
        let mut ctx = ProofContext::with_seed(EcppConfig::default(), 4);
        let n = Integer::from(91u32); // 7 * 13, N-1 = 90 = 2*3^2*5
        match bls_prove(&n, &mut ctx).unwrap() {
            BlsResult::Composite | BlsResult::NotApplicable => {}
            BlsResult::Proven => panic!("BLS must never prove a composite"),
        }
    }
}
