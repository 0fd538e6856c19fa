//! # Cornacchia — Modified Cornacchia's Algorithm (C7)
//!
//! Solves `u² + |D|·v² = 4N` for a given negative discriminant `D` and
//! modulus `N`, used by ECPP to recover the `(u, v)` pair that determines the
//! curve-order candidates `m` in [`crate::ecpp::choose_m`]. Based on the
//! Cornacchia–Smith variant (Cohen, *A Course in Computational Algebraic
//! Number Theory*, Algorithm 1.5.2/1.5.3): find a square root of `D mod N`
//! with the right parity, run the Euclidean algorithm on `(2N, b)` down to
//! `b < 2√N`, then check whether the remainder yields a perfect square.

use crate::error::EResult;
use crate::modmath::{jacobi, sqrtmod};
use rug::Integer;

/// `(u, v)` with `u² + |D|·v² = 4N`, or `None` if no solution exists (`D` is
/// not a quadratic residue mod `N`, or the Euclidean remainder isn't a
/// perfect square). A `CompositeWitness` from `sqrtmod` propagates outward —
/// it means `N` wasn't actually prime.
pub fn cornacchia(d: &Integer, n: &Integer) -> EResult<Option<(Integer, Integer)>> {
    let abs_d = Integer::from(-d);
    if jacobi(d, n) != 1 {
        return Ok(None);
    }

    let d_mod_n = {
        let r = Integer::from(d % n);
        if r < 0 {
            r + n
        } else {
            r
        }
    };
    let mut b = sqrtmod(&d_mod_n, n)?;
    // Parity fixup: we need b ≡ D (mod 2); n is odd here so n - b flips parity.
    let d_parity = Integer::from(d.clone().abs() % 2u32);
    let b_parity = Integer::from(&b % 2u32);
    if b_parity != d_parity {
        b = Integer::from(n - &b);
    }

    let mut a = Integer::from(n * 2u32);
    let bound = {
        let four_n = Integer::from(n * 4u32);
        four_n.sqrt()
    };

    while b > bound {
        let t = Integer::from(&a % &b);
        a = b;
        b = t;
    }

    let four_n = Integer::from(n * 4u32);
    let b2 = Integer::from(&b * &b);
    if b2 > four_n {
        return Ok(None);
    }
    let c = Integer::from(&four_n - &b2);
    let (v2, rem) = c.div_rem(abs_d.clone());
    if rem != 0u32 {
        return Ok(None);
    }
    let v = v2.clone().sqrt();
    if Integer::from(&v * &v) != v2 {
        return Ok(None);
    }

    Ok(Some((b, v)))
}
