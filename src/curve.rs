//! # Curve — Elliptic-Curve Affine Operations over Z/NZ (C3)
//!
//! Point doubling, addition, and scalar multiplication on
//! `E_{a,b}: y² = x³ + ax + b (mod N)`. `N` need not be prime — that's the
//! point: whenever a slope denominator turns out not to be invertible mod N,
//! `gcd(denominator, N)` is a non-trivial factor, and this module reports it
//! as a `CompositeWitness` rather than failing silently. ECPP's recursion
//! relies on this: a "failed" curve operation on a composite modulus is a
//! useful factoring result.

use crate::error::{EResult, EcppError};
use crate::modmath::{invmod, mulmod};
use rug::Integer;

/// A point in affine coordinates, or the point at infinity (the sentinel
/// `(0, 1)` by convention, matching spec.md's GLOSSARY).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: Integer,
    pub y: Integer,
}

impl Point {
    pub fn infinity() -> Self {
        Point {
            x: Integer::from(0u32),
            y: Integer::from(1u32),
        }
    }

    pub fn is_infinity(&self) -> bool {
        self.x == 0u32 && self.y == 1u32
    }

    pub fn new(x: Integer, y: Integer) -> Self {
        Point { x, y }
    }
}

/// The curve `y² = x³ + ax + b (mod N)`.
#[derive(Clone, Debug)]
pub struct Curve {
    pub a: Integer,
    pub b: Integer,
    pub n: Integer,
}

impl Curve {
    pub fn new(a: Integer, b: Integer, n: Integer) -> Self {
        Curve { a, b, n }
    }

    /// `P` is on the curve: `y² ≡ x³ + ax + b (mod N)`.
    pub fn contains(&self, p: &Point) -> bool {
        if p.is_infinity() {
            return true;
        }
        let lhs = mulmod(&p.y, &p.y, &self.n);
        let x2 = mulmod(&p.x, &p.x, &self.n);
        let x3 = mulmod(&x2, &p.x, &self.n);
        let ax = mulmod(&self.a, &p.x, &self.n);
        let rhs = Integer::from(Integer::from(&x3 + &ax) + &self.b) % &self.n;
        let rhs = if rhs < 0 { rhs + &self.n } else { rhs };
        lhs == rhs
    }

    /// Point doubling. Fails with `CompositeWitness` when `2y` is not
    /// invertible mod N.
    pub fn double(&self, p: &Point) -> EResult<Point> {
        if p.is_infinity() || p.y == 0u32 {
            return Ok(Point::infinity());
        }
        let two_y = Integer::from(&p.y * 2u32) % &self.n;
        let inv = invmod(&two_y, &self.n, "curve double: 2y")?;
        let x2 = mulmod(&p.x, &p.x, &self.n);
        let num = Integer::from(Integer::from(&x2 * 3u32) + &self.a) % &self.n;
        let slope = mulmod(&num, &inv, &self.n);
        self.finish(&p.x, &p.y, &slope)
    }

    /// Point addition. Fails with `CompositeWitness` when `Qx - Px` is not
    /// invertible mod N.
    pub fn add(&self, p: &Point, q: &Point) -> EResult<Point> {
        if p.is_infinity() {
            return Ok(q.clone());
        }
        if q.is_infinity() {
            return Ok(p.clone());
        }
        if p.x == q.x {
            if (Integer::from(&p.y + &q.y)) % &self.n == 0u32 {
                return Ok(Point::infinity());
            }
            return self.double(p);
        }
        let dx = (Integer::from(&q.x - &p.x)) % &self.n;
        let inv = invmod(&dx, &self.n, "curve add: Qx - Px")?;
        let dy = (Integer::from(&q.y - &p.y)) % &self.n;
        let slope = mulmod(&dy, &inv, &self.n);
        self.finish(&p.x, &p.y, &slope)
    }

    fn finish(&self, px: &Integer, py: &Integer, slope: &Integer) -> EResult<Point> {
        let s2 = mulmod(slope, slope, &self.n);
        let x3 = (Integer::from(Integer::from(&s2 - px) - px)) % &self.n;
        let x3 = if x3 < 0 { x3 + &self.n } else { x3 };
        let y3 = (Integer::from(mulmod(slope, &(Integer::from(px - &x3)), &self.n) - py)) % &self.n;
        let y3 = if y3 < 0 { y3 + &self.n } else { y3 };
        Ok(Point::new(x3, y3))
    }

    /// Scalar multiplication `k*P` via a binary ladder. Propagates
    /// `CompositeWitness` from any intermediate doubling/addition failure.
    pub fn multiply(&self, k: &Integer, p: &Point) -> EResult<Point> {
        if *k == 0u32 || p.is_infinity() {
            return Ok(Point::infinity());
        }
        let mut k = k.clone();
        if k < 0 {
            k = -k;
        }
        let bits = k.significant_bits();
        let mut result = Point::infinity();
        let mut addend = p.clone();
        for i in 0..bits {
            if k.get_bit(i) {
                result = self.add(&result, &addend)?;
            }
            if i + 1 < bits {
                addend = self.double(&addend)?;
            }
        }
        Ok(result)
    }
}

/// Outcome of `ecpp_check_point` (spec §4.3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PointCheck {
    Success,
    NotProved,
}

/// Verify a witness point: `P2 = (m/q)·P`, then `q·P2` must be `𝒪` while
/// `P2` itself must not be. A `CompositeWitness` from the underlying curve
/// arithmetic is propagated, which `ecpp` maps to `COMPOSITE` one level up.
pub fn ecpp_check_point(curve: &Curve, p: &Point, m: &Integer, q: &Integer) -> EResult<PointCheck> {
    let (cofactor, rem) = m.clone().div_rem(q.clone());
    if rem != 0u32 {
        return Err(EcppError::Fatal {
            reason: "ecpp_check_point: q does not divide m".to_string(),
        });
    }
    let p2 = curve.multiply(&cofactor, p)?;
    if p2.is_infinity() {
        return Ok(PointCheck::NotProved);
    }
    let p1 = curve.multiply(q, &p2)?;
    if p1.is_infinity() {
        Ok(PointCheck::Success)
    } else {
        Ok(PointCheck::NotProved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // y^2 = x^3 + 2x + 3 mod 97, a well-known small test curve with point (3,6).
    fn small_curve() -> Curve {
        Curve::new(Integer::from(2u32), Integer::from(3u32), Integer::from(97u32))
    }

    #[test]
    fn point_on_curve() {
        let curve = small_curve();
        let p = Point::new(Integer::from(3u32), Integer::from(6u32));
        assert!(curve.contains(&p));
    }

    #[test]
    fn double_and_add_agree() {
        let curve = small_curve();
        let p = Point::new(Integer::from(3u32), Integer::from(6u32));
        let doubled = curve.double(&p).unwrap();
        let added = curve.add(&p, &p).unwrap();
        assert_eq!(doubled, added);
        assert!(curve.contains(&doubled));
    }

    #[test]
    fn multiply_by_zero_is_infinity() {
        let curve = small_curve();
        let p = Point::new(Integer::from(3u32), Integer::from(6u32));
        let r = curve.multiply(&Integer::from(0u32), &p).unwrap();
        assert!(r.is_infinity());
    }

    #[test]
    fn multiply_distributes_over_doubling() {
        let curve = small_curve();
        let p = Point::new(Integer::from(3u32), Integer::from(6u32));
        let two_p = curve.double(&p).unwrap();
        let via_multiply = curve.multiply(&Integer::from(2u32), &p).unwrap();
        assert_eq!(two_p, via_multiply);
    }

    #[test]
    fn add_with_composite_modulus_yields_factor() {
        // N = 35 = 5*7; pick P, Q whose x-difference shares a factor with N.
        let curve = Curve::new(Integer::from(1u32), Integer::from(1u32), Integer::from(35u32));
        let p = Point::new(Integer::from(0u32), Integer::from(1u32));
        let q = Point::new(Integer::from(5u32), Integer::from(1u32)); // x diff = 5, shares factor with 35
        match curve.add(&p, &q) {
            Err(crate::error::EcppError::CompositeWitness { factor, .. }) => {
                assert!(factor == 5u32 || factor == 35u32);
            }
            other => panic!("expected CompositeWitness, got {:?}", other),
        }
    }
}
