//! # ECPP — Elliptic Curve Primality Proving Recursion Driver (C8)
//!
//! The Factor-All-Strategy (FAS) driver from spec §4.8: for each candidate
//! discriminant `D`, solve Cornacchia for `(u, v)`, build the curve-order
//! candidates `choose_m`, find a large prime factor `q` of one of them,
//! recurse on `q`, then on success build a CM curve from the class
//! polynomial's roots and find a witness point. Each recursion level is
//! represented by an explicit [`Frame`] rather than hidden in the call
//! stack, per SPEC_FULL.md's carried-forward design note — `prove` still
//! uses plain Rust recursion (bounded by `O(log N)` levels, so stack depth
//! is never a concern), but every frame's state is visible and returned to
//! the caller rather than discarded.

use crate::bpsw::{is_prob_prime, BpswResult};
use crate::context::ProofContext;
use crate::cornacchia::cornacchia;
use crate::curve::{ecpp_check_point, Curve, Point, PointCheck};
use crate::discriminant::{class_degrees, dataset_supports, lookup, validate_invariant, ClassPolyType};
use crate::error::{EResult, EcppError};
use crate::factor::{check_for_factor, FactorOutcome, SavedFactors};
use crate::modmath::{jacobi, mulmod, powmod, sqrtmod};
use crate::poly::roots_mod_p;
use rug::Integer;
use std::collections::HashSet;
use tracing::{debug, info, trace, warn};

/// One completed recursion level, ready for the certificate assembler.
#[derive(Clone, Debug)]
pub struct Frame {
    pub n: Integer,
    pub a: Integer,
    pub b: Integer,
    pub m: Integer,
    pub q: Integer,
    pub px: Integer,
    pub py: Integer,
}

/// Outcome of one `prove` call.
pub enum ProveResult {
    PrimeDeterministic,
    Composite,
    NotYet,
    Proven(Vec<Frame>),
}

/// Outcome of the public `prove_outer` entry point.
pub enum OuterResult {
    PrimeDeterministic,
    Composite,
    ProbablePrime,
    Proven(Vec<Frame>),
}

/// `(⌊N^{1/4}⌋ + 1)²`, the Atkin–Morain lower bound every `q` must clear.
fn fmin_bound(n: &Integer) -> Integer {
    let fourth_root = n.clone().root(4);
    let base = Integer::from(&fourth_root + 1u32);
    Integer::from(&base * &base)
}

/// `choose_m`: curve-order candidates from a Cornacchia solution, per §4.8.
fn choose_m(d: i64, u: &Integer, v: &Integer, n: &Integer) -> Vec<Integer> {
    let np1 = Integer::from(n + 1u32);
    let mut candidates = vec![Integer::from(&np1 - u), Integer::from(&np1 + u)];

    if d == -3 {
        for inner in [1i32, -1] {
            let term = Integer::from(u + Integer::from(inner * 3) * v);
            let (half, rem) = term.div_rem(Integer::from(2u32));
            if rem != 0u32 {
                continue;
            }
            candidates.push(Integer::from(&np1 + &half));
            candidates.push(Integer::from(&np1 - &half));
        }
    } else if d == -4 {
        let two_v = Integer::from(v * 2u32);
        candidates.push(Integer::from(&np1 + &two_v));
        candidates.push(Integer::from(&np1 - &two_v));
    }

    candidates
        .into_iter()
        .map(|m| {
            if m > 1u32 {
                match is_prob_prime(&m) {
                    Ok(r) if r != BpswResult::Composite => Integer::from(0u32),
                    _ => m,
                }
            } else {
                Integer::from(0u32)
            }
        })
        .collect()
}

/// `find_curve`: construct a CM curve from `D`'s class-polynomial roots and
/// search for a witness point, per §4.8 steps 1–5.
fn find_curve(
    d: i64,
    m: &Integer,
    q: &Integer,
    n: &Integer,
    ctx: &mut ProofContext,
) -> EResult<Option<(Integer, Integer, Point)>> {
    let record = match lookup(d) {
        Some(r) => r,
        None => return Ok(None),
    };
    if record.poly_type == ClassPolyType::Weber {
        return Err(EcppError::Fatal {
            reason: format!(
                "find_curve: discriminant {d} is a Weber-type record; the KSZ j-invariant \
                 conversion (D mod 8) is not implemented in this core"
            ),
        });
    }
    let t = record.coefficients();
    let roots = match roots_mod_p(&t, n, ctx) {
        Ok(r) => r,
        Err(EcppError::SearchExhausted) => return Ok(None),
        Err(e) => return Err(e),
    };
    if roots.is_empty() {
        return Ok(None);
    }

    // Twist bookkeeping per step 3/4.
    let mut g = Integer::from(2u32);
    loop {
        if jacobi(&g, n) == -1 {
            let n_mod3 = Integer::from(n % 3u32);
            if n_mod3 != 1u32 {
                break;
            }
            let exp = Integer::from(Integer::from(n - 1u32) / 3u32);
            let t1 = powmod(&g, &exp, n);
            // D = -3 curves carry an extra order-6 automorphism; the same
            // non-cube-residue condition on g covers both cases here.
            if t1 != 1u32 {
                break;
            }
        }
        g += 1u32;
        if &g >= n {
            return Err(EcppError::CompositeWitness {
                at: "find_curve: no valid twist parameter g found",
                factor: n.clone(),
            });
        }
    }

    let twist_count: u32 = if d == -3 {
        6
    } else if d == -4 {
        4
    } else {
        2
    };

    let max_tries = 50usize * roots.len().max(1);
    let mut tries = 0usize;

    for root in &roots {
        let (mut a0, mut b0) = if d == -3 {
            (Integer::from(0u32), Integer::from(n - 1u32))
        } else if d == -4 {
            (Integer::from(n - 1u32), Integer::from(0u32))
        } else {
            let j = root.clone();
            let denom = Integer::from(&j - 1728u32) % n;
            let denom = if denom < 0 { denom + n } else { denom };
            let denom_inv = match denom.clone().invert(n) {
                Ok(inv) => inv,
                Err(_) => {
                    let gcd = denom.gcd(n);
                    return Err(EcppError::CompositeWitness {
                        at: "find_curve: j - 1728 not invertible",
                        factor: gcd,
                    });
                }
            };
            let c = mulmod(&j, &denom_inv, n);
            let three_c = mulmod(&c, &Integer::from(3u32), n);
            let a = Integer::from(n - &three_c) % n;
            let b = mulmod(&c, &Integer::from(2u32), n);
            (a, b)
        };

        for twist in 0..twist_count {
            if twist > 0 {
                if d == -3 {
                    b0 = mulmod(&b0, &g, n);
                } else if d == -4 {
                    a0 = mulmod(&a0, &g, n);
                } else if twist % 2 == 1 {
                    let g2 = mulmod(&g, &g, n);
                    let g3 = mulmod(&g2, &g, n);
                    a0 = mulmod(&a0, &g2, n);
                    b0 = mulmod(&b0, &g3, n);
                }
            }
            let curve = Curve::new(a0.clone(), b0.clone(), n.clone());

            tries += 1;
            if tries > max_tries {
                return Ok(None);
            }
            let x = ctx.random_range(&Integer::from(1u32), n);
            let x2 = mulmod(&x, &x, n);
            let x3 = mulmod(&x2, &x, n);
            let qval = (Integer::from(&x3 + mulmod(&a0, &x, n)) + &b0) % n;
            let qval = if qval < 0 { qval + n } else { qval };
            if jacobi(&qval, n) == -1 {
                continue;
            }
            let y = sqrtmod(&qval, n)?;
            let p = Point::new(x, y);

            match ecpp_check_point(&curve, &p, m, q)? {
                PointCheck::Success => return Ok(Some((a0, b0, p))),
                PointCheck::NotProved => continue,
            }
        }
    }
    Ok(None)
}

/// `prove(N, fac_stage)`: the FAS recursion, per §4.8. `blacklisted` carries
/// discriminants whose witness-point search has already been exhausted for
/// this particular `N`, across repeated calls as `fac_stage` escalates; a
/// recursive call proving a different `q` gets its own fresh set.
pub fn prove(
    n: &Integer,
    fac_stage: u32,
    saved: &mut SavedFactors,
    blacklisted: &mut HashSet<i64>,
    ctx: &mut ProofContext,
) -> EResult<ProveResult> {
    match is_prob_prime(n)? {
        BpswResult::Prime => return Ok(ProveResult::PrimeDeterministic),
        BpswResult::Composite => return Ok(ProveResult::Composite),
        BpswResult::ProbablePrime => {}
    }

    let fmin = fmin_bound(n);

    for stage in 1..=fac_stage {
        for d in class_degrees() {
            validate_invariant(d)?;
            if blacklisted.contains(&d) {
                continue;
            }
            if lookup(d).is_none() {
                continue;
            }
            trace!(d, stage, "trying discriminant");
            if jacobi(&Integer::from(d), n) != 1 {
                continue;
            }
            let (u, v) = match cornacchia(&Integer::from(d), n)? {
                Some(uv) => uv,
                None => continue,
            };
            debug!(d, u = %u, v = %v, "cornacchia solved");

            for m in choose_m(d, &u, &v, n) {
                if m == 0u32 {
                    continue;
                }
                let q = match check_for_factor(&m, &fmin, stage, saved, ctx)? {
                    FactorOutcome::Found(q) => q,
                    FactorOutcome::Reduced(_) | FactorOutcome::None => continue,
                };
                debug!(d, stage, q = %q, "check_for_factor stage result");
                if q <= fmin {
                    return Err(EcppError::Fatal {
                        reason: "prove: check_for_factor produced q below the Atkin-Morain bound"
                            .to_string(),
                    });
                }

                let mut sub_blacklist = HashSet::new();
                let sub_frames = match prove(&q, fac_stage, saved, &mut sub_blacklist, ctx)? {
                    ProveResult::Composite => return Ok(ProveResult::Composite),
                    ProveResult::NotYet => continue,
                    ProveResult::PrimeDeterministic => Vec::new(),
                    ProveResult::Proven(frames) => frames,
                };

                match find_curve(d, &m, &q, n, ctx)? {
                    None => {
                        // NO_POINT: this D is unusable for the rest of this proof.
                        let err = EcppError::BlacklistedD { d };
                        warn!(%err, "discriminant blacklisted");
                        blacklisted.insert(d);
                        continue;
                    }
                    Some((a, b, p)) => {
                        let mut frames = sub_frames;
                        frames.insert(
                            0,
                            Frame {
                                n: n.clone(),
                                a,
                                b,
                                m: m.clone(),
                                q: q.clone(),
                                px: p.x.clone(),
                                py: p.y.clone(),
                            },
                        );
                        info!(n = %n, d, "level proven");
                        return Ok(ProveResult::Proven(frames));
                    }
                }
            }
        }
    }
    Ok(ProveResult::NotYet)
}

/// Public `prove_outer(N)`: escalate `fac_stage` from 1 to 20 until a
/// definite answer is reached, per §4.8.
pub fn prove_outer(n: &Integer, ctx: &mut ProofContext) -> EResult<OuterResult> {
    dataset_supports(ctx.config.large_discriminant_set)?;
    let mut saved = SavedFactors::new();
    let mut blacklisted = HashSet::new();
    for fac_stage in 1..=ctx.config.max_fac_stage {
        match prove(n, fac_stage, &mut saved, &mut blacklisted, ctx)? {
            ProveResult::PrimeDeterministic => return Ok(OuterResult::PrimeDeterministic),
            ProveResult::Composite => return Ok(OuterResult::Composite),
            ProveResult::Proven(frames) => return Ok(OuterResult::Proven(frames)),
            ProveResult::NotYet => continue,
        }
    }
    Ok(OuterResult::ProbablePrime)
}
