//! # Modmath — Modular Arithmetic Kernel (C1)
//!
//! Thin wrappers over `rug::Integer`'s GMP-backed primitives: `mulmod`,
//! `powmod`, `invmod`, `jacobi`. `sqrtmod` is the one non-trivial piece
//! (Tonelli–Shanks), since `rug` has no modular square root.
//!
//! Every operation here treats a zero divisor turned up mid-computation as
//! useful information rather than a bug: `invmod` on a composite modulus
//! returns `CompositeWitness` carrying the non-trivial factor instead of
//! panicking or silently returning garbage.

use crate::error::{EResult, EcppError};
use rug::ops::RemRounding;
use rug::Integer;

/// `(a * b) mod n`, result in `[0, n)`.
pub fn mulmod(a: &Integer, b: &Integer, n: &Integer) -> Integer {
    Integer::from(a * b).rem_euc(n)
}

/// `a^e mod n` for non-negative `e`.
pub fn powmod(a: &Integer, e: &Integer, n: &Integer) -> Integer {
    let base = a.clone().rem_euc(n);
    base.pow_mod(e, n).unwrap_or_else(|_| Integer::from(0u32))
}

/// Modular inverse of `a` mod `n`. On failure (gcd(a, n) != 1), returns
/// `CompositeWitness` carrying that gcd — a non-trivial factor of `n` when
/// `n` was assumed prime, which is exactly the situation ECPP's arithmetic
/// is built to exploit rather than hide.
pub fn invmod(a: &Integer, n: &Integer, at: &'static str) -> EResult<Integer> {
    let reduced = a.clone().rem_euc(n);
    if reduced == 0 {
        let g = n.clone();
        return Err(EcppError::CompositeWitness { at, factor: g });
    }
    match reduced.clone().invert(n) {
        Ok(inv) => Ok(inv),
        Err(_) => {
            let g = reduced.gcd(n);
            Err(EcppError::CompositeWitness { at, factor: g })
        }
    }
}

/// Jacobi symbol `(a/n)` for odd positive `n`. Thin wrapper over
/// `rug::Integer::jacobi`.
pub fn jacobi(a: &Integer, n: &Integer) -> i32 {
    a.jacobi(n)
}

/// Tonelli–Shanks modular square root: find `y` with `y^2 ≡ a (mod n)` for
/// prime (or assumed-prime) odd `n`. Fails with `CompositeWitness` when
/// `jacobi(a, n) != 1` (no such root exists, or `n` isn't actually prime), or
/// when the result fails the `y^2 ≡ a (mod n)` re-check — upgrading the
/// TODO noted in SPEC_FULL.md/§9 ("the present code only asserts y != 0")
/// into an actual compositeness witness.
pub fn sqrtmod(a: &Integer, n: &Integer) -> EResult<Integer> {
    let a = a.clone().rem_euc(n);
    if a == 0 {
        return Ok(Integer::from(0u32));
    }
    if jacobi(&a, n) != 1 {
        return Err(EcppError::CompositeWitness {
            at: "sqrtmod: not a quadratic residue",
            factor: n.clone(),
        });
    }

    // n ≡ 3 (mod 4): y = a^((n+1)/4) mod n directly.
    let n_mod4 = Integer::from(n % 4u32);
    if n_mod4 == 3u32 {
        let exp = Integer::from(Integer::from(n + 1u32) >> 2u32);
        let y = powmod(&a, &exp, n);
        return verify_sqrt(y, &a, n);
    }

    // General Tonelli–Shanks: n - 1 = q * 2^s, q odd.
    let mut q = Integer::from(n - 1u32);
    let mut s: u32 = 0;
    while q.is_even() {
        q = Integer::from(&q >> 1u32);
        s += 1;
    }

    // Find a quadratic non-residue z.
    let mut z = Integer::from(2u32);
    while jacobi(&z, n) != -1 {
        z += 1u32;
        if &z >= n {
            return Err(EcppError::Fatal {
                reason: "sqrtmod: no quadratic non-residue found".to_string(),
            });
        }
    }

    let mut m = s;
    let mut c = powmod(&z, &q, n);
    let mut t = powmod(&a, &q, n);
    let exp_r = Integer::from(Integer::from(&q + 1u32) >> 1u32);
    let mut r = powmod(&a, &exp_r, n);

    loop {
        if t == 1u32 {
            return verify_sqrt(r, &a, n);
        }
        // Find least i, 0 < i < m, with t^(2^i) == 1.
        let mut i = 0u32;
        let mut t_pow = t.clone();
        while t_pow != 1u32 {
            t_pow = mulmod(&t_pow, &t_pow, n);
            i += 1;
            if i >= m {
                return Err(EcppError::CompositeWitness {
                    at: "sqrtmod: Tonelli-Shanks failed to converge",
                    factor: n.clone(),
                });
            }
        }
        let mut b = c.clone();
        for _ in 0..(m - i - 1) {
            b = mulmod(&b, &b, n);
        }
        m = i;
        c = mulmod(&b, &b, n);
        t = mulmod(&t, &c, n);
        r = mulmod(&r, &b, n);
    }
}

fn verify_sqrt(y: Integer, a: &Integer, n: &Integer) -> EResult<Integer> {
    let check = mulmod(&y, &y, n);
    if &check == a {
        Ok(y)
    } else {
        Err(EcppError::CompositeWitness {
            at: "sqrtmod: y^2 != a (mod n) on verification",
            factor: n.clone(),
        })
    }
}
