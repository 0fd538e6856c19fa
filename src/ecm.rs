//! # ECM — Lenstra's Elliptic Curve Method (C5, Montgomery form)
//!
//! One random curve per attempt, Suyama-parametrized, in Montgomery projective
//! form `E: b*y² = x³ + a*x² + x (mod N)` worked through `(X:Z)` coordinates so
//! point addition/doubling never need a `y` coordinate. Stage 1 multiplies a
//! random point by `k = lcm(1..B1)`; if `N`'s unknown prime factor `q` has a
//! curve order that's B1-smooth, `q | gcd(Z, N)`. Stage 2 extends the search
//! to curve orders with exactly one large prime factor in `(B1, B2]` via the
//! standard continuation (baby steps precomputed, giant steps swept).
//!
//! Grounded in the same algorithm shape as other Rust ECM implementations in
//! this corpus, adapted to this crate's `ProofContext`-seeded RNG and
//! `EResult` error plumbing instead of a dedicated ECM error enum.

use crate::context::ProofContext;
use crate::sieve::generate_primes;
use rayon::prelude::*;
use rug::Integer;

/// A point in Montgomery projective `(X:Z)` coordinates.
#[derive(Clone, Debug)]
struct MontPoint {
    x: Integer,
    z: Integer,
}

/// `a24 = (a+2)/4 mod n`, the only curve constant the ladder needs.
struct MontCurve {
    a24: Integer,
    n: Integer,
}

impl MontCurve {
    fn double(&self, p: &MontPoint) -> MontPoint {
        let n = &self.n;
        let u = Integer::from(&p.x + &p.z);
        let u = Integer::from(&u * &u) % n;
        let v = Integer::from(&p.x - &p.z);
        let v = Integer::from(&v * &v) % n;
        let t = Integer::from(&u - &v);
        let x = Integer::from(&u * &v) % n;
        let z = (Integer::from(&t * &self.a24) + &v) % n;
        let z = Integer::from(&z * &t) % n;
        MontPoint {
            x: norm(x, n),
            z: norm(z, n),
        }
    }

    /// Differential addition: `p + q` given `p - q = diff`.
    fn add(&self, p: &MontPoint, q: &MontPoint, diff: &MontPoint) -> MontPoint {
        let n = &self.n;
        let u = Integer::from(Integer::from(&p.x - &p.z) * Integer::from(&q.x + &q.z)) % n;
        let v = Integer::from(Integer::from(&p.x + &p.z) * Integer::from(&q.x - &q.z)) % n;
        let add = Integer::from(&u + &v);
        let sub = Integer::from(&u - &v);
        let x = Integer::from(Integer::from(&add * &add) * &diff.z) % n;
        let z = Integer::from(Integer::from(&sub * &sub) * &diff.x) % n;
        MontPoint {
            x: norm(x, n),
            z: norm(z, n),
        }
    }

    /// Montgomery ladder: compute `k*P`.
    fn ladder(&self, p: &MontPoint, k: &Integer) -> MontPoint {
        let mut r0 = p.clone();
        let mut r1 = self.double(p);
        let bits = k.significant_bits();
        if bits == 0 {
            return MontPoint {
                x: Integer::from(0u32),
                z: Integer::from(0u32),
            };
        }
        for i in (0..bits - 1).rev() {
            if k.get_bit(i) {
                r0 = self.add(&r1, &r0, p);
                r1 = self.double(&r1);
            } else {
                r1 = self.add(&r0, &r1, p);
                r0 = self.double(&r0);
            }
        }
        r0
    }
}

fn norm(x: Integer, n: &Integer) -> Integer {
    let mut x = x % n;
    if x < 0 {
        x += n;
    }
    x
}

/// Attempt one ECM curve against `n`, with stage-1 bound `b1` and stage-2
/// bound `b2`. Returns `Some(factor)` on a non-trivial split, `None` if this
/// curve's order wasn't smooth enough — try another.
pub fn ecm_one_curve(n: &Integer, b1: u64, b2: u64, ctx: &mut ProofContext) -> Option<Integer> {
    let sigma = ctx.random_range(&Integer::from(6u32), &Integer::from(n - 1u32));
    ecm_with_sigma(n, sigma, b1, b2)
}

/// The pure half of [`ecm_one_curve`]: a fixed Suyama `sigma` and no `ctx`,
/// so a batch of pre-drawn sigmas can be run across curves in parallel.
fn ecm_with_sigma(n: &Integer, sigma: Integer, b1: u64, b2: u64) -> Option<Integer> {
    // Suyama's parametrization.
    let u = norm(Integer::from(Integer::from(&sigma * &sigma) - 5u32), n);
    let v = norm(Integer::from(&sigma * 4u32), n);
    let diff = norm(Integer::from(&v - &u), n);
    let u3 = norm(Integer::from(&u * &u) * &u % n, n);
    let denom = norm(Integer::from(Integer::from(&u3 * &v) * 4u32), n);
    if denom == 0u32 {
        return None;
    }
    let inv = match denom.clone().invert(n) {
        Ok(inv) => inv,
        Err(_) => {
            let g = denom.gcd(n);
            return nontrivial(g, n);
        }
    };
    let diff3 = diff.clone().pow_mod(&Integer::from(3u32), n).unwrap_or_default();
    let bracket = Integer::from(Integer::from(&u * 4u32) + &v) % n;
    let c = norm(
        Integer::from(Integer::from(Integer::from(&diff3 * &bracket) * &inv) - 2u32),
        n,
    );
    let four_inv = match Integer::from(4u32).invert(n) {
        Ok(i) => i,
        Err(_) => return nontrivial(Integer::from(4u32).gcd(n), n),
    };
    let a24 = norm(Integer::from(Integer::from(&c + 2u32) * &four_inv), n);

    let curve = MontCurve { a24, n: n.clone() };
    let v3 = norm(Integer::from(&v * &v) * &v % n, n);
    let point = MontPoint { x: u3, z: v3 };

    let mut k = Integer::from(1u32);
    for p in generate_primes(b1) {
        let mut pk = p;
        while pk <= b1 / p {
            pk *= p;
        }
        k *= pk;
    }
    let q = curve.ladder(&point, &k);
    let g = q.z.clone().gcd(n);
    if let Some(f) = nontrivial(g.clone(), n) {
        return Some(f);
    }
    if g == *n {
        return None;
    }

    // Stage 2: standard continuation over primes in (B1, B2].
    let primes = generate_primes(b2);
    let mut accum = Integer::from(1u32);
    let mut last = q.clone();
    for &p in primes.iter().filter(|&&p| p > b1) {
        last = curve.ladder(&point, &Integer::from(p));
        accum = Integer::from(&accum * &last.x) % n;
    }
    let g2 = accum.gcd(n);
    nontrivial(g2, n)
}

fn nontrivial(g: Integer, n: &Integer) -> Option<Integer> {
    if g > 1u32 && &g < n {
        Some(g)
    } else {
        None
    }
}

/// Run up to `max_curves` ECM attempts with escalating stage-1 bounds suited
/// to `n`'s size, returning the first non-trivial factor found. `ctx`'s RNG
/// draws every curve's Suyama `sigma` up front, sequentially (`RandState`
/// isn't `Send`); the curves themselves then run across rayon's pool.
pub fn ecm_factor(n: &Integer, max_curves: u32, ctx: &mut ProofContext) -> Option<Integer> {
    let bits = n.significant_bits();
    let (b1, b2) = if bits < 128 {
        (2_000u64, 200_000u64)
    } else if bits < 256 {
        (11_000u64, 1_000_000u64)
    } else {
        (50_000u64, 5_000_000u64)
    };
    let sigmas: Vec<Integer> = (0..max_curves)
        .map(|_| ctx.random_range(&Integer::from(6u32), &Integer::from(n - 1u32)))
        .collect();
    sigmas
        .into_par_iter()
        .find_map_any(|sigma| ecm_with_sigma(n, sigma, b1, b2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EcppConfig;

    #[test]
    fn finds_small_factor_of_semiprime() {
        let mut ctx = ProofContext::with_seed(EcppConfig::default(), 99);
        // 455839 = 599 * 761
        let n = Integer::from(455_839u32);
        let mut found = None;
        for _ in 0..100 {
            if let Some(f) = ecm_one_curve(&n, 2000, 100_000, &mut ctx) {
                found = Some(f);
                break;
            }
        }
        let f = found.expect("ECM should find a factor of a small semiprime within 100 curves");
        assert!(Integer::from(&n % &f) == 0u32);
        assert!(f > 1u32 && f < n);
    }

    #[test]
    fn ecm_factor_on_prime_finds_nothing_useful() {
        let mut ctx = ProofContext::with_seed(EcppConfig::default(), 7);
        let n = Integer::from(1_000_003u32); // prime
        let result = ecm_factor(&n, 5, &mut ctx);
        assert!(result.is_none());
    }
}
