//! # BPSW — Baillie–Pomerance–Selfridge–Wagstaff Primality Test (C4)
//!
//! Sequence: small-prime trial division (reusing `SMALL_PRIMES`/`has_small_factor`
//! from the crate root), an early return for `n < 1009²` once trial division
//! clears, then Miller–Rabin base 2, then the strong Lucas–Selfridge test with
//! Selfridge Method A parameter selection. No known composite passes both; BPSW
//! is conjectured (and verified against Feitsma's database up to 2⁶⁴) to have no
//! counterexamples in that range.

use crate::error::{EResult, EcppError};
use crate::modmath::jacobi;
use crate::{has_small_factor, SMALL_PRIMES};
use rayon::prelude::*;
use rug::Integer;

/// Result of a BPSW run, matching spec §4.4's three-valued return.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BpswResult {
    Composite,
    Prime,
    ProbablePrime,
}

/// `1009² = 1_018_081`: above this bound, clearing trial division by the first
/// 64 primes no longer certifies primality outright.
const DETERMINISTIC_TRIAL_BOUND: u32 = 1009 * 1009;

/// Full BPSW sequence per spec §4.4.
pub fn is_prob_prime(n: &Integer) -> EResult<BpswResult> {
    if *n < 2u32 {
        return Ok(BpswResult::Composite);
    }
    if *n == 2u32 {
        return Ok(BpswResult::Prime);
    }
    if n.is_even() {
        return Ok(BpswResult::Composite);
    }
    if has_small_factor(n) {
        return Ok(BpswResult::Composite);
    }
    if *n < DETERMINISTIC_TRIAL_BOUND {
        return Ok(BpswResult::Prime);
    }

    if !miller_rabin(n, &Integer::from(2u32))? {
        return Ok(BpswResult::Composite);
    }
    if !is_strong_lucas_pseudoprime(n)? {
        return Ok(BpswResult::Composite);
    }

    // BPSW has no known counterexample; deterministic for n <= 2^64 (Feitsma).
    if n.significant_bits() <= 64 {
        Ok(BpswResult::Prime)
    } else {
        Ok(BpswResult::ProbablePrime)
    }
}

/// Single-base Miller–Rabin witness test: `a` is a witness to `n`'s
/// compositeness unless `n` passes. `a >= 2` required.
pub fn miller_rabin(n: &Integer, a: &Integer) -> EResult<bool> {
    if *n < 2u32 {
        return Ok(false);
    }
    if *n == 2u32 || *n == 3u32 {
        return Ok(true);
    }
    if n.is_even() {
        return Ok(false);
    }
    if *a < 2u32 {
        return Err(EcppError::InvalidInput {
            message: "miller_rabin: base must be >= 2".to_string(),
        });
    }

    let n_minus_1 = Integer::from(n - 1u32);
    let mut d = n_minus_1.clone();
    let mut r: u32 = 0;
    while d.is_even() {
        d = Integer::from(&d >> 1u32);
        r += 1;
    }

    let a = Integer::from(a % n);
    if a == 0u32 {
        return Ok(true);
    }
    let mut x = a.pow_mod(&d, n).unwrap_or_else(|_| Integer::from(0u32));
    if x == 1u32 || x == n_minus_1 {
        return Ok(true);
    }
    for _ in 1..r {
        x = Integer::from(&x * &x) % n;
        if x == n_minus_1 {
            return Ok(true);
        }
    }
    Ok(false)
}

/// `k` independent random-base Miller–Rabin rounds, matching the public
/// `miller_rabin_random` façade operation. Bases are drawn from `2..n-2` up
/// front, sequentially (`RandState` isn't `Send`); the witness checks
/// themselves then run across rayon's pool.
pub fn miller_rabin_random(n: &Integer, k: u32, ctx: &mut crate::context::ProofContext) -> EResult<bool> {
    if *n < 4u32 {
        return is_prob_prime(n).map(|r| r != BpswResult::Composite);
    }
    let lo = Integer::from(2u32);
    let hi = Integer::from(n - 2u32);
    let bases: Vec<Integer> = (0..k).map(|_| ctx.random_range(&lo, &hi)).collect();
    let results: Vec<EResult<bool>> = bases.par_iter().map(|a| miller_rabin(n, a)).collect();
    for r in results {
        if !r? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Selfridge Method A: scan `D = 5, -7, 9, -11, ...` until `jacobi(D, n) = -1`.
/// Returns `(D, P, Q)` with `P = 1`, `Q = (1-D)/4`.
fn select_d(n: &Integer) -> EResult<(Integer, Integer)> {
    let mut d = Integer::from(5u32);
    let mut sign_positive = true;
    loop {
        let cand = if sign_positive { d.clone() } else { -d.clone() };
        let g = cand.clone().abs().gcd(n);
        if g > 1u32 && &g != n {
            return Err(EcppError::CompositeWitness {
                at: "bpsw: Selfridge Method A gcd",
                factor: g,
            });
        }
        if &g == n {
            // n | D: can't determine residuacity this way; treat as composite guard.
            return Err(EcppError::CompositeWitness {
                at: "bpsw: Selfridge Method A degenerate gcd",
                factor: g,
            });
        }
        let j = jacobi(&cand, n);
        if j == -1 {
            let q = Integer::from(Integer::from(1u32 - &cand) >> 2u32);
            return Ok((cand, q));
        }
        d += 2u32;
        sign_positive = !sign_positive;
        if d > 1_000_000u32 {
            return Err(EcppError::Fatal {
                reason: "bpsw: Selfridge Method A failed to terminate (n is a perfect square?)"
                    .to_string(),
            });
        }
    }
}

/// Strong Lucas–Selfridge probable-prime test.
///
/// Computes `U_d, V_d` for `d = (n+1)/2^s`, `s = v2(n+1)`, via the standard
/// doubling recurrences, then checks the strong-test conditions: either
/// `U_d ≡ 0` or `V_{d·2^r} ≡ 0` for some `0 <= r < s`.
pub fn is_strong_lucas_pseudoprime(n: &Integer) -> EResult<bool> {
    if *n < 2u32 {
        return Ok(false);
    }
    if *n == 2u32 {
        return Ok(true);
    }
    if n.is_even() {
        return Ok(false);
    }
    {
        let s = n.clone().sqrt();
        if Integer::from(&s * &s) == *n {
            return Ok(false);
        }
    }

    let (disc, q_param) = select_d(n)?;
    let p_param = Integer::from(1u32);

    let n_plus_1 = Integer::from(n + 1u32);
    let mut d = n_plus_1.clone();
    let mut s: u32 = 0;
    while d.is_even() {
        d = Integer::from(&d >> 1u32);
        s += 1;
    }

    let (mut u, mut v, mut qk) = lucas_uv_at(&d, &p_param, &q_param, &disc, n)?;

    if u == 0u32 {
        return Ok(true);
    }
    for _ in 0..s {
        if v == 0u32 {
            return Ok(true);
        }
        if u == 0u32 && v == 0u32 {
            break;
        }
        // Double: U_2k = U_k V_k, V_2k = V_k^2 - 2 Q^k.
        u = Integer::from(&u * &v) % n;
        v = (Integer::from(&v * &v) - Integer::from(&qk * 2u32)) % n;
        if v < 0 {
            v += n;
        }
        qk = Integer::from(&qk * &qk) % n;
        if v == 0u32 {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Compute `(U_k, V_k, Q^k) mod n` via the standard Lucas binary ladder with
/// parameters `(P, Q)` and discriminant `disc = P² − 4Q`.
///
/// Doubling: `U_2k = U_k·V_k`, `V_2k = V_k² − 2·Q^k`.
/// Increment: `U_{k+1} = (P·U_k + V_k)/2`, `V_{k+1} = (disc·U_k + P·V_k)/2`.
fn lucas_uv_at(
    k: &Integer,
    p: &Integer,
    q: &Integer,
    disc: &Integer,
    n: &Integer,
) -> EResult<(Integer, Integer, Integer)> {
    let mut u = Integer::from(0u32);
    let mut v = Integer::from(2u32);
    let mut qk = Integer::from(1u32);

    let bits = k.significant_bits();
    for i in (0..bits).rev() {
        let u2 = Integer::from(&u * &v) % n;
        let mut v2 = (Integer::from(&v * &v) - Integer::from(&qk * 2u32)) % n;
        if v2 < 0 {
            v2 += n;
        }
        let qk2 = Integer::from(&qk * &qk) % n;
        u = normalize(u2, n);
        v = normalize(v2, n);
        qk = normalize(qk2, n);

        if k.get_bit(i) {
            let u_new = normalize(Integer::from(Integer::from(p * &u) + &v), n);
            let v_new = normalize(Integer::from(Integer::from(disc * &u) + Integer::from(p * &v)), n);
            u = half_mod(&u_new, n);
            v = half_mod(&v_new, n);
            qk = normalize(Integer::from(&qk * q), n);
        }
    }
    Ok((normalize(u, n), normalize(v, n), normalize(qk, n)))
}

fn normalize(x: Integer, n: &Integer) -> Integer {
    let mut x = x % n;
    if x < 0 {
        x += n;
    }
    x
}

/// Halve `x` mod `n` for odd `n`: if `x` is odd, add `n` first.
fn half_mod(x: &Integer, n: &Integer) -> Integer {
    let mut x = x.clone();
    if x.is_odd() {
        x += n;
    }
    normalize(Integer::from(&x >> 1u32), n)
}
