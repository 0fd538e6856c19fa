//! # Poly — Polynomial-mod-N Engine (C2)
//!
//! Polynomials are coefficient vectors in ascending power order (`coeffs[i]`
//! is the coefficient of `x^i`), with every coefficient kept reduced to
//! `[0, N)`. The engine reduces polynomials mod N and finds every root of a
//! polynomial in `Z/NZ` via `gcd(T, x^N − x)` followed by equal-degree
//! splitting (Cantor–Zassenhaus, specialized to the degree-1 case since the
//! gcd step already isolates the product of linear factors).
//!
//! A zero divisor discovered inside polynomial division (needed for both the
//! gcd and the modular-exponentiation reduction) means N is composite; it
//! surfaces immediately as `EcppError::CompositeWitness` carrying the
//! non-trivial divisor, per the Result-shaped plumbing §9 calls for.

use crate::context::ProofContext;
use crate::error::{EResult, EcppError};
use crate::modmath::{invmod, mulmod};
use rug::Integer;

pub type Poly = Vec<Integer>;

/// Reduce every coefficient mod N and strip leading (highest-degree) zeros.
pub fn poly_mod_n(t: &[Integer], n: &Integer) -> Poly {
    let mut out: Poly = t.iter().map(|c| c.clone() % n).map(|c| if c < 0 { c + n } else { c }).collect();
    while out.len() > 1 && out.last().map(|c| *c == 0u32).unwrap_or(false) {
        out.pop();
    }
    out
}

/// Degree of a polynomial, or -1 for the zero polynomial.
pub fn degree(p: &[Integer]) -> isize {
    for (i, c) in p.iter().enumerate().rev() {
        if *c != 0u32 {
            return i as isize;
        }
    }
    -1
}

fn is_zero(p: &[Integer]) -> bool {
    degree(p) < 0
}

/// Full polynomial product, coefficients reduced mod N (no modulus-polynomial
/// reduction).
pub fn poly_mulmod(a: &[Integer], b: &[Integer], n: &Integer) -> Poly {
    if is_zero(a) || is_zero(b) {
        return vec![Integer::from(0u32)];
    }
    let da = degree(a) as usize;
    let db = degree(b) as usize;
    let mut out = vec![Integer::from(0u32); da + db + 1];
    for (i, ai) in a.iter().enumerate().take(da + 1) {
        if *ai == 0u32 {
            continue;
        }
        for (j, bj) in b.iter().enumerate().take(db + 1) {
            if *bj == 0u32 {
                continue;
            }
            out[i + j] = (Integer::from(&out[i + j] + Integer::from(ai * bj))) % n;
        }
    }
    poly_mod_n(&out, n)
}

/// Polynomial long division `a = q*b + r` over `Z/NZ`, assuming N prime (or
/// behaving as prime up to this point). Fails with `CompositeWitness` if `b`'s
/// leading coefficient is not invertible mod N.
pub fn poly_divmod(a: &[Integer], b: &[Integer], n: &Integer) -> EResult<(Poly, Poly)> {
    let db = degree(b);
    if db < 0 {
        return Err(EcppError::Fatal {
            reason: "poly_divmod: division by zero polynomial".to_string(),
        });
    }
    let lead_b = b[db as usize].clone();
    let lead_inv = invmod(&lead_b, n, "poly_divmod: leading coefficient")?;

    let mut rem = poly_mod_n(a, n);
    let da0 = degree(&rem);
    if da0 < db {
        return Ok((vec![Integer::from(0u32)], rem));
    }
    let mut quot = vec![Integer::from(0u32); (da0 - db + 1) as usize];

    loop {
        let dr = degree(&rem);
        if dr < db {
            break;
        }
        let shift = (dr - db) as usize;
        let coeff = mulmod(&rem[dr as usize], &lead_inv, n);
        quot[shift] = coeff.clone();
        for (i, bi) in b.iter().enumerate().take((db + 1) as usize) {
            let term = mulmod(&coeff, bi, n);
            let idx = shift + i;
            rem[idx] = (Integer::from(&rem[idx] - term)) % n;
            if rem[idx] < 0 {
                rem[idx] += n;
            }
        }
        while rem.len() > 1 && *rem.last().unwrap() == 0u32 {
            rem.pop();
        }
        if is_zero(&rem) {
            break;
        }
    }
    Ok((poly_mod_n(&quot, n), poly_mod_n(&rem, n)))
}

/// `a mod b` over `Z/NZ[x]`.
pub fn poly_rem(a: &[Integer], b: &[Integer], n: &Integer) -> EResult<Poly> {
    Ok(poly_divmod(a, b, n)?.1)
}

/// Polynomial gcd over `Z/NZ[x]` via the Euclidean algorithm. A zero divisor
/// surfacing from `poly_divmod` propagates as `CompositeWitness`.
pub fn poly_gcd(a: &[Integer], b: &[Integer], n: &Integer) -> EResult<Poly> {
    let mut x = poly_mod_n(a, n);
    let mut y = poly_mod_n(b, n);
    while !is_zero(&y) {
        let r = poly_rem(&x, &y, n)?;
        x = y;
        y = r;
    }
    // Normalize to monic so the gcd's degree is meaningful regardless of scale.
    let d = degree(&x);
    if d < 0 {
        return Ok(x);
    }
    let lead_inv = invmod(&x[d as usize].clone(), n, "poly_gcd: monic normalization")?;
    Ok(poly_mod_n(
        &x.iter().map(|c| mulmod(c, &lead_inv, n)).collect::<Vec<_>>(),
        n,
    ))
}

/// `base^exp mod (modulus, N)`: binary exponentiation with polynomial
/// reduction after every multiply.
pub fn poly_powmod(base: &[Integer], exp: &Integer, modulus: &[Integer], n: &Integer) -> EResult<Poly> {
    let mut result: Poly = vec![Integer::from(1u32)];
    let mut b = poly_rem(base, modulus, n)?;
    let bits = exp.significant_bits();
    for i in 0..bits {
        if exp.get_bit(i) {
            result = poly_rem(&poly_mulmod(&result, &b, n), modulus, n)?;
        }
        b = poly_rem(&poly_mulmod(&b, &b, n), modulus, n)?;
    }
    Ok(poly_mod_n(&result, n))
}

/// `x^N mod (T, N)`, as a polynomial of degree < deg(T).
fn x_pow_n_mod_t(t: &[Integer], n: &Integer) -> EResult<Poly> {
    let x: Poly = vec![Integer::from(0u32), Integer::from(1u32)];
    poly_powmod(&x, n, t, n)
}

/// `(x+r)^((N-1)/2) mod (T, N)`.
fn shift_pow_mod_t(t: &[Integer], n: &Integer, r: &Integer) -> EResult<Poly> {
    let base: Poly = vec![r.clone(), Integer::from(1u32)];
    let exp = Integer::from(Integer::from(n - 1u32) >> 1u32);
    poly_powmod(&base, &exp, t, n)
}

/// Find every root of `T` in `Z/NZ`.
///
/// Algorithm: compute `g = gcd(T, x^N − x)` to isolate the product of linear
/// factors (only N's actual residues can be roots), then equal-degree split:
/// repeatedly pick a random shift `r` and compute
/// `gcd(g, (x+r)^((N-1)/2) − 1)` until every factor is linear. Smaller-degree
/// factors are recursed first, per spec's tie-break rule.
pub fn roots_mod_p(t: &[Integer], n: &Integer, ctx: &mut ProofContext) -> EResult<Vec<Integer>> {
    let t = poly_mod_n(t, n);
    if degree(&t) <= 0 {
        return Ok(vec![]);
    }

    let xn = x_pow_n_mod_t(&t, n)?;
    // xn - x
    let mut diff = xn;
    if diff.len() < 2 {
        diff.resize(2, Integer::from(0u32));
    }
    diff[1] = (Integer::from(&diff[1] - 1u32)) % n;
    if diff[1] < 0 {
        diff[1] += n;
    }
    let linear_part = poly_gcd(&t, &diff, n)?;

    let mut roots = Vec::new();
    split(&linear_part, n, ctx, &mut roots)?;
    Ok(roots)
}

fn split(p: &[Integer], n: &Integer, ctx: &mut ProofContext, roots: &mut Vec<Integer>) -> EResult<()> {
    let d = degree(p);
    if d <= 0 {
        return Ok(());
    }
    if d == 1 {
        // p = p0 + p1*x, root = -p0 / p1.
        let p1_inv = invmod(&p[1].clone(), n, "poly split: linear coefficient")?;
        let root = (Integer::from(n - &p[0])) % n;
        roots.push(mulmod(&root, &p1_inv, n));
        return Ok(());
    }

    // Equal-degree split at degree 1: keep trying random shifts until we
    // isolate a strict, non-trivial factor.
    for _ in 0..(200 * (d as u32 + 1)) {
        let r = ctx.random_below(n);
        let mut h = shift_pow_mod_t(p, n, &r)?;
        if h.is_empty() {
            h.push(Integer::from(0u32));
        }
        h[0] = (Integer::from(&h[0] - 1u32)) % n;
        if h[0] < 0 {
            h[0] += n;
        }
        let g = poly_gcd(p, &h, n)?;
        let dg = degree(&g);
        if dg > 0 && dg < d {
            let (q, _) = poly_divmod(p, &g, n)?;
            split(&g, n, ctx, roots)?;
            split(&q, n, ctx, roots)?;
            return Ok(());
        }
    }
    Err(EcppError::SearchExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degree_and_mod_n() {
        let n = Integer::from(101u32);
        let p = poly_mod_n(&[Integer::from(105u32), Integer::from(0u32), Integer::from(3u32)], &n);
        assert_eq!(degree(&p), 2);
        assert_eq!(p[0], 4u32); // 105 mod 101 = 4
    }

    #[test]
    fn divmod_exact() {
        let n = Integer::from(101u32);
        // (x^2 - 1) / (x - 1) = x + 1, remainder 0.
        let a = vec![Integer::from(n.clone() - 1u32), Integer::from(0u32), Integer::from(1u32)];
        let b = vec![Integer::from(n.clone() - 1u32), Integer::from(1u32)];
        let (q, r) = poly_divmod(&a, &b, &n).unwrap();
        assert_eq!(degree(&r), -1);
        assert_eq!(q, vec![Integer::from(1u32), Integer::from(1u32)]);
    }

    #[test]
    fn roots_of_quadratic_mod_small_prime() {
        // x^2 - 4 mod 101 has roots {2, 99}.
        let n = Integer::from(101u32);
        let t = vec![Integer::from(n.clone() - 4u32), Integer::from(0u32), Integer::from(1u32)];
        let mut ctx = ProofContext::with_seed(Default::default(), 1234);
        let mut roots = roots_mod_p(&t, &n, &mut ctx).unwrap();
        roots.sort();
        assert_eq!(roots, vec![Integer::from(2u32), Integer::from(99u32)]);
    }

    #[test]
    fn roots_linear_factor() {
        // x - 7 mod 97 has the single root 7.
        let n = Integer::from(97u32);
        let t = vec![Integer::from(n.clone() - 7u32), Integer::from(1u32)];
        let mut ctx = ProofContext::with_seed(Default::default(), 7);
        let roots = roots_mod_p(&t, &n, &mut ctx).unwrap();
        assert_eq!(roots, vec![Integer::from(7u32)]);
    }
}
