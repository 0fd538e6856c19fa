//! # Factor — Integer Factoring Cascade (C5)
//!
//! Unified interface `factor_once(n, budget) → (f, kind)` chaining trial
//! division, Pollard ρ (classical Floyd, then Brent), Pollard p−1 (two-stage,
//! reusing [`crate::p1`]), Hart's one-line factorization (OLF), SQUFOF for
//! native-size `n`, and ECM as the final fallback. `factor` recurses the
//! cascade over a worklist until every component is BPSW-prime.

use crate::bpsw::{is_prob_prime, BpswResult};
use crate::context::ProofContext;
use crate::ecm::ecm_factor;
use crate::error::EResult;
use crate::p1::p1_factor;
use crate::sieve::{generate_primes, isqrt_u64};
use rug::Integer;

/// Outcome of a single `factor_once` attempt, paired with the factor found;
/// `factor_once` returning `None` covers spec §4.5's third `NONE` case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FactorKind {
    PrimeFactor,
    CompositeFactor,
}

/// Trial-divide `n` by primes up to `limit`, returning the first factor found.
pub fn trial_division(n: &Integer, limit: u64) -> Option<Integer> {
    for p in generate_primes(limit) {
        let pi = Integer::from(p);
        if n.is_divisible_u(p) {
            return if &pi == n { None } else { Some(pi) };
        }
        if Integer::from(&pi * &pi) > *n {
            break;
        }
    }
    None
}

/// Classical Floyd-cycle Pollard ρ: `x_{i+1} = x_i² + a`, gcd check every 256
/// iterations against the running product to amortize gcd cost.
pub fn pollard_rho_floyd(n: &Integer, rounds: u64, a: u32) -> Option<Integer> {
    let a = Integer::from(a);
    let mut x = Integer::from(2u32);
    let mut y = Integer::from(2u32);
    let mut product = Integer::from(1u32);
    let f = |v: &Integer| -> Integer { (Integer::from(v * v) + &a) % n };

    for i in 1..=rounds {
        x = f(&x);
        y = f(&f(&y));
        let diff = Integer::from(&x - &y).abs();
        if diff == 0u32 {
            return None; // cycle closed without a split; caller retries with a different a
        }
        product = Integer::from(&product * &diff) % n;
        if i % 256 == 0 || i == rounds {
            let g = product.clone().gcd(n);
            if g > 1u32 && &g < n {
                return Some(g);
            }
            if &g == n {
                return None; // backtrack needed; caller retries with smaller batches
            }
            product = Integer::from(1u32);
        }
    }
    None
}

/// Brent's improvement on Pollard ρ: batches the cycle-detection step
/// geometrically instead of Floyd's fixed 2x pace, fewer evaluations of `f`
/// for the same expected cycle length.
pub fn pollard_rho_brent(n: &Integer, rounds: u64, a: u32) -> Option<Integer> {
    let a = Integer::from(a);
    let f = |v: &Integer| -> Integer { (Integer::from(v * v) + &a) % n };

    let mut y = Integer::from(2u32);
    let mut r: u64 = 1;
    let mut q = Integer::from(1u32);
    let mut g = Integer::from(1u32);
    let mut x;
    let mut ys = y.clone();
    let mut iters = 0u64;

    while g == 1u32 && iters < rounds {
        x = y.clone();
        for _ in 0..r {
            y = f(&y);
        }
        let mut k = 0u64;
        while k < r && g == 1u32 {
            ys = y.clone();
            let batch = 128.min(r - k);
            for _ in 0..batch {
                y = f(&y);
                q = Integer::from(&q * Integer::from(&x - &y).abs()) % n;
            }
            g = q.clone().gcd(n);
            k += batch;
            iters += batch;
            if iters >= rounds {
                break;
            }
        }
        r *= 2;
    }

    if g == *n {
        loop {
            ys = f(&ys);
            g = Integer::from(&x - &ys).abs().gcd(n);
            if g != 1u32 {
                break;
            }
        }
    }
    if g > 1u32 && &g < n {
        Some(g)
    } else {
        None
    }
}

/// Hart's "one line factorization" (OLF): searches `s² - premultiplier·n`
/// near perfect squares, effective when `n` has two close-together factors.
pub fn hart_olf(n: &Integer, rounds: u64, premultiplier: u64) -> Option<Integer> {
    let pn = Integer::from(n * premultiplier);
    for i in 1..=rounds {
        let target = Integer::from(&pn * i);
        let s = target.clone().sqrt();
        let mut s = s;
        if Integer::from(&s * &s) < target {
            s += 1u32;
        }
        let s2 = Integer::from(&s * &s);
        let diff = Integer::from(&s2 - &target);
        if diff < 0 {
            continue;
        }
        let r = diff.sqrt();
        if Integer::from(&r * &r) == diff {
            let cand = Integer::from(&s - &r).gcd(n);
            if cand > 1u32 && &cand < n {
                return Some(cand);
            }
        }
    }
    None
}

/// Shanks' SQUFOF, restricted to native-size `n` per spec's `64·m³ < n`
/// guard (multiplier `m` up to 480, so `n` must be representable in u64).
pub fn squfof(n: &Integer, rounds: u64) -> Option<Integer> {
    let n_u64 = n.to_u64()?;
    if n_u64 < 3 {
        return None;
    }
    const MULTIPLIERS: [u64; 16] = [
        1, 3, 5, 7, 11, 3 * 5, 3 * 7, 3 * 11, 5 * 7, 5 * 11, 7 * 11, 3 * 5 * 7, 3 * 5 * 11,
        3 * 7 * 11, 5 * 7 * 11, 3 * 5 * 7 * 11,
    ];
    for &m in &MULTIPLIERS {
        if 64u128 * (m as u128).pow(3) >= n_u64 as u128 {
            continue;
        }
        if let Some(f) = squfof_with_multiplier(n_u64, m, rounds) {
            if f > 1 && f < n_u64 {
                return Some(Integer::from(f));
            }
        }
    }
    None
}

fn squfof_with_multiplier(n: u64, k: u64, rounds: u64) -> Option<u64> {
    let kn = k.checked_mul(n)?;
    let mut p0 = isqrt_u64(kn);
    let mut q0: u64 = 1;
    let mut q1 = kn - p0 * p0;
    if q1 == 0 {
        return Some(isqrt_u64(n));
    }
    let mut found_square = None;

    for i in 0..rounds {
        let b = (p0 + isqrt_u64(kn)) / q1;
        let p1 = b * q1 - p0;
        let q2 = q0 + b * (p0 - p1);
        p0 = p1;
        q0 = q1;
        q1 = q2;
        if i % 2 == 1 {
            let s = isqrt_u64(q1);
            if s * s == q1 {
                found_square = Some((i, s));
                break;
            }
        }
    }

    let (_, s) = found_square?;
    let mut p0b = p0;
    let mut q0b = s;
    let b0 = (isqrt_u64(kn) - p0b) / q0b;
    p0b = b0 * q0b + p0b;
    let mut q1b = (kn - p0b * p0b) / q0b;

    for _ in 0..rounds {
        let b = (p0b + isqrt_u64(kn)) / q1b;
        let p1b = b * q1b - p0b;
        if p0b == p1b {
            let f = gcd_u64(n, p1b);
            if f > 1 && f < n {
                return Some(f);
            }
            break;
        }
        let q2b = q0b + b * (p0b - p1b);
        p0b = p1b;
        q0b = q1b;
        q1b = q2b;
    }
    None
}

fn gcd_u64(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// A small cache of previously-discovered factors (bounded by `MAX_SFACS`),
/// tried as a fast divisibility pre-check before re-running the cascade.
pub struct SavedFactors {
    factors: Vec<Integer>,
    max: usize,
}

impl SavedFactors {
    pub fn new() -> Self {
        SavedFactors {
            factors: Vec::new(),
            max: 1000,
        }
    }

    pub fn record(&mut self, f: Integer) {
        if self.factors.len() < self.max && !self.factors.contains(&f) {
            self.factors.push(f);
        }
    }

    pub fn try_divide(&self, n: &Integer) -> Option<Integer> {
        self.factors.iter().find(|f| n.is_divisible(f)).cloned()
    }
}

impl Default for SavedFactors {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of [`check_for_factor`]'s three-way contract (spec §4.5): a prime
/// factor above `fmin` (`Found`), a residual stripped of small factors but
/// still composite and above `fmin` (`Reduced`, retry at a higher stage), or
/// nothing useful this call (`None`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactorOutcome {
    Found(Integer),
    Reduced(Integer),
    None,
}

/// `check_for_factor(m, fmin, stage, saved)`: the ECPP-facing entry point
/// (spec §4.5/§4.8) distinct from `factor`'s full-decomposition driver.
/// Strips small factors from `m` — recording anything below `fmin` in
/// `saved` for the next call's fast divisibility check — until either a
/// probable prime above `fmin` turns up (`Found`), `factor_once` can't make
/// any further progress this stage (`Reduced`, if some stripping already
/// happened, else `None`), or the residual itself drops to or below `fmin`
/// (`None`).
pub fn check_for_factor(
    m: &Integer,
    fmin: &Integer,
    stage: u32,
    saved: &mut SavedFactors,
    ctx: &mut ProofContext,
) -> EResult<FactorOutcome> {
    let mut residual = m.clone();
    let mut stripped_anything = false;

    loop {
        if residual <= *fmin {
            return Ok(FactorOutcome::None);
        }
        match is_prob_prime(&residual)? {
            BpswResult::Composite => {}
            _ => return Ok(FactorOutcome::Found(residual)),
        }

        let next = saved
            .try_divide(&residual)
            .map(|f| {
                let kind = classify(&f);
                (f, kind)
            })
            .or_else(|| factor_once(&residual, stage, ctx));
        match next {
            Some((f, _kind)) => {
                let cof = Integer::from(&residual / &f);
                let (small, large) = if f < cof { (f, cof) } else { (cof, f) };
                if small > 1u32 && &small < fmin {
                    saved.record(small);
                }
                residual = large;
                stripped_anything = true;
            }
            None => {
                return Ok(if stripped_anything {
                    FactorOutcome::Reduced(residual)
                } else {
                    FactorOutcome::None
                });
            }
        }
    }
}

/// Opaque placeholder for the SIMPQS rung of the escalation ladder (spec
/// §4.5's table, 30-90 digit N). Quadratic-sieve internals are out of scope
/// for this core (SPEC_FULL.md Non-goals); this stub exists so the ladder's
/// shape matches every method spec.md names rather than silently omitting
/// one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Qs,
}

/// Always reports `Method::Qs` unimplemented. Present purely so a caller
/// hitting the 30-90 digit range sees an explicit "not implemented in this
/// core" rather than the cascade quietly skipping the rung.
fn try_method(method: Method, n: &Integer) -> Option<Integer> {
    match method {
        Method::Qs => {
            tracing::debug!(n = %n, "Method::Qs requested but not implemented in this core");
            None
        }
    }
}

/// Classify a just-found factor as `PrimeFactor` or `CompositeFactor`,
/// completing `factor_once`'s `(f, kind)` contract (spec §4.5). Falls back to
/// `CompositeFactor` on a probable-primality error: the caller re-tests via
/// the worklist either way.
fn classify(f: &Integer) -> FactorKind {
    match is_prob_prime(f) {
        Ok(r) if r != BpswResult::Composite => FactorKind::PrimeFactor,
        _ => FactorKind::CompositeFactor,
    }
}

/// One cascade pass, escalating effort by `stage`. Returns the factor found
/// together with its kind (spec §4.5's `(f, kind)` contract), or `None` if
/// every method in the ladder gave up this stage.
pub fn factor_once(n: &Integer, stage: u32, ctx: &mut ProofContext) -> Option<(Integer, FactorKind)> {
    if *n < 4u32 {
        return None;
    }
    if let Some(f) = trial_division(n, 1_000_000) {
        return Some((f, FactorKind::PrimeFactor));
    }
    if let Some(nu) = n.to_u64() {
        if let Some(f) = squfof(&Integer::from(nu), 200_000) {
            let kind = classify(&f);
            return Some((f, kind));
        }
    }
    if let Some(f) = hart_olf(n, 1_000_000, 480) {
        let kind = classify(&f);
        return Some((f, kind));
    }
    let rho_rounds = 100_000u64 * stage as u64;
    if let Some(f) = pollard_rho_brent(n, rho_rounds, 1) {
        let kind = classify(&f);
        return Some((f, kind));
    }
    if let Some(f) = pollard_rho_floyd(n, rho_rounds, 1) {
        let kind = classify(&f);
        return Some((f, kind));
    }
    let b1 = 10_000u64 * stage as u64;
    if let Some(f) = p1_factor(n, b1, Some(b1 * 100)) {
        let kind = classify(&f);
        return Some((f, kind));
    }
    let digits = crate::exact_digits(n);
    if (30..91).contains(&digits) {
        if let Some(f) = try_method(Method::Qs, n) {
            let kind = classify(&f);
            return Some((f, kind));
        }
    }
    ecm_factor(n, 5 * stage, ctx).map(|f| {
        let kind = classify(&f);
        (f, kind)
    })
}

/// Full prime decomposition: recurse `factor_once` over a worklist until
/// every component passes BPSW. Zero and one return as a single-element
/// sequence per §6.
pub fn factor(n: &Integer, ctx: &mut ProofContext) -> Vec<Integer> {
    if *n == 0u32 || *n == 1u32 {
        return vec![n.clone()];
    }
    let mut n = n.clone();
    if n < 0 {
        n = -n;
    }

    let mut result = Vec::new();
    let mut worklist = vec![n];
    while let Some(m) = worklist.pop() {
        if m == 1u32 {
            continue;
        }
        match is_prob_prime(&m) {
            Ok(r) if r != BpswResult::Composite => {
                result.push(m);
                continue;
            }
            _ => {}
        }
        let mut stage = 1u32;
        let (factor, kind) = loop {
            if let Some((f, kind)) = factor_once(&m, stage, ctx) {
                break (f, Some(kind));
            }
            stage += 1;
            if stage > 30 {
                // Give up gracefully rather than looping forever; push the
                // residual as-is (callers can detect it failed primality).
                result.push(m.clone());
                break (Integer::from(1u32), None);
            }
        };
        if factor == 1u32 {
            continue;
        }
        let cof = Integer::from(&m / &factor);
        match kind {
            Some(FactorKind::PrimeFactor) => result.push(factor),
            _ => worklist.push(factor),
        }
        worklist.push(cof);
    }
    result.sort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EcppConfig;

    #[test]
    fn trial_division_finds_small_factor() {
        let n = Integer::from(91u32); // 7 * 13
        let f = trial_division(&n, 1000).unwrap();
        assert!(f == 7u32 || f == 13u32);
    }

    #[test]
    fn pollard_rho_floyd_factors_semiprime() {
        let n = Integer::from(8_051u32); // 83 * 97
        let f = pollard_rho_floyd(&n, 10_000, 1).unwrap();
        assert!(Integer::from(&n % &f) == 0u32);
    }

    #[test]
    fn pollard_rho_brent_factors_semiprime() {
        let n = Integer::from(10_403u32); // 101 * 103
        let f = pollard_rho_brent(&n, 10_000, 1).unwrap();
        assert!(Integer::from(&n % &f) == 0u32);
    }

    #[test]
    fn squfof_factors_native_semiprime() {
        let n = Integer::from(1_000_003u64 * 1_000_033u64);
        let f = squfof(&n, 100_000).expect("squfof should split a native semiprime");
        assert!(Integer::from(&n % &f) == 0u32);
    }

    #[test]
    fn factor_full_decomposition_product_matches() {
        let mut ctx = ProofContext::with_seed(EcppConfig::default(), 555);
        let n = Integer::from(2u32 * 3 * 5 * 7 * 11 * 13 * 17);
        let factors = factor(&n, &mut ctx);
        let product: Integer = factors.iter().fold(Integer::from(1u32), |acc, f| acc * f);
        assert_eq!(product, n);
        for f in &factors {
            assert!(matches!(is_prob_prime(f).unwrap(), BpswResult::Prime | BpswResult::ProbablePrime));
        }
    }

    #[test]
    fn factor_boundary_zero_and_one() {
        let mut ctx = ProofContext::with_seed(EcppConfig::default(), 1);
        assert_eq!(factor(&Integer::from(0u32), &mut ctx), vec![Integer::from(0u32)]);
        assert_eq!(factor(&Integer::from(1u32), &mut ctx), vec![Integer::from(1u32)]);
    }

    #[test]
    fn saved_factors_trial_divide_hits() {
        let mut saved = SavedFactors::new();
        saved.record(Integer::from(7u32));
        let n = Integer::from(91u32);
        assert_eq!(saved.try_divide(&n), Some(Integer::from(7u32)));
    }

    #[test]
    fn factor_once_reports_kind() {
        let mut ctx = ProofContext::with_seed(EcppConfig::default(), 11);
        let (f, kind) = factor_once(&Integer::from(91u32), 1, &mut ctx).unwrap();
        assert!(f == 7u32 || f == 13u32);
        assert_eq!(kind, FactorKind::PrimeFactor);
    }

    #[test]
    fn check_for_factor_finds_large_prime_above_fmin() {
        let mut ctx = ProofContext::with_seed(EcppConfig::default(), 21);
        let mut saved = SavedFactors::new();
        // 2 * 2 * 3 * 1_000_003, fmin below the large prime factor.
        let m = Integer::from(12u32) * Integer::from(1_000_003u32);
        let fmin = Integer::from(100u32);
        match check_for_factor(&m, &fmin, 1, &mut saved, &mut ctx).unwrap() {
            FactorOutcome::Found(f) => assert_eq!(f, Integer::from(1_000_003u32)),
            other => panic!("expected Found(1000003), got {other:?}"),
        }
    }

    #[test]
    fn check_for_factor_returns_none_below_fmin() {
        let mut ctx = ProofContext::with_seed(EcppConfig::default(), 22);
        let mut saved = SavedFactors::new();
        let m = Integer::from(12u32);
        let fmin = Integer::from(100u32);
        assert_eq!(
            check_for_factor(&m, &fmin, 1, &mut saved, &mut ctx).unwrap(),
            FactorOutcome::None
        );
    }

    #[test]
    fn method_qs_stub_always_reports_unimplemented() {
        let n = Integer::from_str_radix("1000000000000000000000000000000007", 10).unwrap();
        assert_eq!(try_method(Method::Qs, &n), None);
    }
}
