//! # ecpp-core — Arbitrary-Precision Primality Proving and Factoring
//!
//! Deterministic primality proofs over `rug::Integer` (GMP-backed arbitrary
//! precision), built around an Elliptic Curve Primality Proving (ECPP)
//! engine, with the probabilistic and factoring infrastructure it depends on.
//!
//! ## Module Organization
//!
//! - [`modmath`] — modular arithmetic kernel: `mulmod`, `powmod`, `invmod`,
//!   `jacobi`, `sqrtmod`.
//! - [`poly`] — polynomial-mod-N engine: root-finding via `gcd(T, x^N - x)`
//!   plus equal-degree splitting.
//! - [`curve`] — elliptic-curve affine operations over `Z/NZ`, surfacing
//!   non-invertible slope denominators as composite witnesses.
//! - [`bpsw`] — Baillie–PSW primality test (Miller–Rabin base 2 + strong
//!   Lucas–Selfridge), deterministic for `n ≤ 2⁶⁴`.
//! - [`sieve`] — wheel-30 small-prime generation and native-size helpers
//!   consumed by the factoring cascade.
//! - [`p1`] — Pollard p−1, two-stage.
//! - [`ecm`] — Lenstra's Elliptic Curve Method, Montgomery form.
//! - [`factor`] — the factoring cascade driver: trial division, Pollard ρ
//!   (Floyd and Brent), p−1, Hart OLF, SQUFOF, ECM.
//! - [`discriminant`] — class-polynomial oracle, `(D, degree, type, coeffs)`.
//! - [`cornacchia`] — modified Cornacchia's algorithm, `u² + |D|v² = 4N`.
//! - [`bls`] — generalized Pocklington N−1 fast path ahead of full ECPP.
//! - [`ecpp`] — the ECPP recursion driver (Factor-All-Strategy).
//! - [`certificate`] — the proof-text assembler/parser/verifier (§6 format).
//! - [`context`] — the seeded PRNG, verbosity, and config threaded through
//!   every operation instead of hidden globals.
//! - [`error`] — the crate-wide error taxonomy.
//!
//! ## Shared Utilities
//!
//! - `has_small_factor`: trial division by the first 64 primes (up to 311).
//! - `mr_screened_test`: two-round Miller–Rabin pre-screen before full rounds.
//! - `frobenius_test`: Grantham's Restricted Quadratic Frobenius Test, used
//!   as a cheap compositeness pre-filter ahead of the expensive BPSW/ECPP path.
//! - `estimate_digits` / `exact_digits`: decimal digit count from bit length.

pub mod bls;
pub mod bpsw;
pub mod certificate;
pub mod context;
pub mod cornacchia;
pub mod curve;
pub mod discriminant;
pub mod ecm;
pub mod ecpp;
pub mod error;
pub mod factor;
pub mod modmath;
pub mod p1;
pub mod poly;
pub mod sieve;

use context::ProofContext;
use error::{EResult, EcppError};
use rug::Integer;

/// Small primes for trial division pre-filter.
pub(crate) const SMALL_PRIMES: [u32; 64] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311,
];

/// Convert a `u64` exponent to `u32` for `rug::Integer::pow()`, panicking with a clear
/// message if the value exceeds `u32::MAX`. This prevents silent truncation that would
/// produce wrong candidates and either miss primes or report false positives.
#[inline]
pub fn checked_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or_else(|_| {
        panic!(
            "exponent {} exceeds u32::MAX ({}); candidate would be silently wrong",
            n,
            u32::MAX
        )
    })
}

/// Quick check if n is divisible by any small prime.
/// Returns true if n is definitely composite (has a small factor).
/// Returns false if n might be prime (passed trial division).
#[inline]
pub fn has_small_factor(n: &Integer) -> bool {
    for &p in &SMALL_PRIMES {
        if n.is_divisible_u(p) {
            return *n != p;
        }
    }
    false
}

/// Two-round Miller-Rabin pre-screening: run 2 fast rounds first, full rounds only for survivors.
/// Composites are rejected ~7x faster since most fail within 2 rounds.
///
/// For large candidates (>10K bits), also runs a Frobenius quadratic test that
/// catches composites MR occasionally misses (false positive < 1/7710 per round
/// vs MR's 1/4, at ~3x the cost of a single MR round).
#[inline]
pub fn mr_screened_test(candidate: &Integer, mr_rounds: u32) -> rug::integer::IsPrime {
    use rug::integer::IsPrime;
    if mr_rounds > 2 && candidate.is_probably_prime(2) == IsPrime::No {
        return IsPrime::No;
    }
    if candidate.significant_bits() > 10_000 && !frobenius_test(candidate) {
        return IsPrime::No;
    }
    candidate.is_probably_prime(mr_rounds)
}

// ---- Frobenius quadratic compositeness test ----
//
// Operates in the ring Z/nZ[x]/(x^2 - bx + c); elements are `[a0, a1]`
// meaning `a0 + a1*x`.

fn frobenius_poly_mul(a: &[Integer; 2], b: &[Integer; 2], coeff_b: &Integer, coeff_c: &Integer, n: &Integer) -> [Integer; 2] {
    let a1b1 = Integer::from(&a[1] * &b[1]) % n;
    let r0 = (Integer::from(&a[0] * &b[0]) - Integer::from(&a1b1 * coeff_c)) % n;
    let r1 = (Integer::from(&a[0] * &b[1])
        + Integer::from(&a[1] * &b[0])
        + Integer::from(&a1b1 * coeff_b))
        % n;
    let r0 = if r0 < 0 { r0 + n } else { r0 };
    let r1 = if r1 < 0 { r1 + n } else { r1 };
    [r0, r1]
}

fn frobenius_poly_sqr(a: &[Integer; 2], coeff_b: &Integer, coeff_c: &Integer, n: &Integer) -> [Integer; 2] {
    frobenius_poly_mul(a, a, coeff_b, coeff_c, n)
}

fn frobenius_poly_pow_mod(exp: &Integer, coeff_b: &Integer, coeff_c: &Integer, n: &Integer) -> [Integer; 2] {
    if *exp == 0u32 {
        return [Integer::from(1u32), Integer::from(0u32)];
    }
    let bits = exp.significant_bits();
    let mut result = [Integer::from(0u32), Integer::from(1u32)]; // = x
    for i in (0..bits - 1).rev() {
        result = frobenius_poly_sqr(&result, coeff_b, coeff_c, n);
        if exp.get_bit(i) {
            let new_r0 = (Integer::from(n) - Integer::from(&result[1] * coeff_c) % n) % n;
            let new_r1 = (Integer::from(&result[0]) + Integer::from(&result[1] * coeff_b)) % n;
            result = [new_r0, new_r1];
        }
    }
    result[0] %= n;
    result[1] %= n;
    if result[0] < 0 {
        result[0] += n;
    }
    if result[1] < 0 {
        result[1] += n;
    }
    result
}

/// Grantham's Restricted Quadratic Frobenius Test (RQFT).
///
/// Tests whether `n` behaves like a prime in a quadratic extension ring. For a
/// prime p, the Frobenius endomorphism x -> x^p satisfies x^p == (b - x) in
/// F_p[x]/(x^2 - bx + c) when Jacobi(b^2 - 4c, p) = -1.
///
/// False positive rate < 1/7710 per round (Grantham, 2001), vs MR's 1/4.
///
/// # References
///
/// - Jon Grantham, "Frobenius Pseudoprimes", Mathematics of Computation,
///   70(234):873-891, 2001.
pub fn frobenius_test(n: &Integer) -> bool {
    if *n <= 2u32 {
        return *n == 2u32;
    }
    if n.is_even() {
        return false;
    }
    {
        let s = n.clone().sqrt();
        if &(Integer::from(&s * &s)) == n {
            return false;
        }
    }

    let mut coeff_b = Integer::new();
    let mut coeff_c = Integer::new();
    let mut found = false;

    'outer: for c in 2u32..=20 {
        for b in 1u32..=50 {
            let disc = Integer::from(b * b) - Integer::from(4u32 * c);
            let j = disc.jacobi(n);
            if j == -1 {
                let g = disc.clone().abs().gcd(n);
                if g == 1u32 || &g == n {
                    coeff_b = Integer::from(b);
                    coeff_c = Integer::from(c);
                    found = true;
                    break 'outer;
                }
                return false;
            }
            if j == 0 {
                let g = disc.clone().abs().gcd(n);
                if g > 1u32 && &g < n {
                    return false;
                }
            }
        }
    }

    if !found {
        'fallback: for b in 1u32..=100 {
            let disc = Integer::from(b * b) - Integer::from(4u32);
            let j = disc.jacobi(n);
            if j == -1 {
                let g = disc.clone().abs().gcd(n);
                if g == 1u32 || &g == n {
                    coeff_b = Integer::from(b);
                    coeff_c = Integer::from(1u32);
                    found = true;
                    break 'fallback;
                }
                return false;
            }
            if j == 0 {
                let g = disc.clone().abs().gcd(n);
                if g > 1u32 && &g < n {
                    return false;
                }
            }
        }
    }

    if !found {
        return true; // extremely rare -- can't run the test
    }

    if n.is_divisible(&coeff_c) {
        return coeff_c == *n;
    }

    let jacobi_c = coeff_c.clone().jacobi(n);
    if jacobi_c == 0 {
        return false;
    }
    let half_nm1 = Integer::from(n - 1u32) >> 1u32;
    if let Ok(euler_val) = coeff_c.clone().pow_mod(&half_nm1, n) {
        let expected_euler = if jacobi_c == 1 {
            Integer::from(1u32)
        } else {
            Integer::from(n - 1u32)
        };
        if euler_val != expected_euler {
            return false;
        }
    }

    let result = frobenius_poly_pow_mod(n, &coeff_b, &coeff_c, n);
    let expected_r0 = Integer::from(&coeff_b % n);
    let expected_r1 = Integer::from(n - 1u32);

    result[0] == expected_r0 && result[1] == expected_r1
}

/// Estimate decimal digit count from bit length, avoiding expensive to_string conversion.
#[inline]
pub fn estimate_digits(n: &Integer) -> u64 {
    let bits = n.significant_bits();
    if bits == 0 {
        return 1;
    }
    (bits as f64 * std::f64::consts::LOG10_2) as u64 + 1
}

/// Exact decimal digit count (expensive for very large numbers).
#[inline]
pub fn exact_digits(n: &Integer) -> u64 {
    n.to_string_radix(10).len() as u64
}

// ---- C11: Public API façade ----

/// `is_prob_prime(n)`: BPSW only. 0 composite, 1 probable prime, 2 deterministic prime.
pub fn is_prob_prime(n: &Integer) -> EResult<u8> {
    use bpsw::BpswResult;
    Ok(match bpsw::is_prob_prime(n)? {
        BpswResult::Composite => 0,
        BpswResult::ProbablePrime => 1,
        BpswResult::Prime => 2,
    })
}

/// `is_prime(n)`: BPSW, then extra random Miller-Rabin rounds scaled by size,
/// then the BLS n-1 fast path if `n` is within `bls_max_bits`.
pub fn is_prime(n: &Integer, ctx: &mut ProofContext) -> EResult<u8> {
    use bpsw::BpswResult;
    match bpsw::is_prob_prime(n)? {
        BpswResult::Composite => return Ok(0),
        BpswResult::Prime => return Ok(2),
        BpswResult::ProbablePrime => {}
    }

    let extra_rounds = if n.significant_bits() < 512 { 2 } else { 5 };
    if !bpsw::miller_rabin_random(n, extra_rounds, ctx)? {
        return Ok(0);
    }

    if n.significant_bits() <= ctx.config.bls_max_bits {
        match bls::bls_prove(n, ctx)? {
            bls::BlsResult::Proven => return Ok(2),
            bls::BlsResult::Composite => return Ok(0),
            bls::BlsResult::NotApplicable => {}
        }
    }
    Ok(1)
}

/// `is_provable_prime(n, want_proof)`: BLS n-1 first, ECPP if still probable.
/// Returns `(result, proof)` where `result` is 0/1/2 and `proof` is `Some`
/// only when `want_proof` was set and a deterministic proof was produced.
pub fn is_provable_prime(n: &Integer, want_proof: bool, ctx: &mut ProofContext) -> EResult<(u8, Option<String>)> {
    use bpsw::BpswResult;
    match bpsw::is_prob_prime(n)? {
        BpswResult::Composite => return Ok((0, None)),
        BpswResult::Prime => return Ok((2, None)),
        BpswResult::ProbablePrime => {}
    }

    match bls::bls_prove(n, ctx)? {
        bls::BlsResult::Proven => return Ok((2, None)),
        bls::BlsResult::Composite => return Ok((0, None)),
        bls::BlsResult::NotApplicable => {}
    }

    match ecpp::prove_outer(n, ctx)? {
        ecpp::OuterResult::PrimeDeterministic => Ok((2, None)),
        ecpp::OuterResult::Composite => Ok((0, None)),
        ecpp::OuterResult::ProbablePrime => Ok((1, None)),
        ecpp::OuterResult::Proven(frames) => {
            let proof = if want_proof {
                Some(certificate::assemble(&frames))
            } else {
                None
            };
            Ok((2, proof))
        }
    }
}

/// `factor(n)`: full prime decomposition.
pub fn factor(n: &Integer, ctx: &mut ProofContext) -> Vec<Integer> {
    factor::factor(n, ctx)
}

/// `miller_rabin(n, a)`: single-base Miller-Rabin witness test, `a >= 2`.
pub fn miller_rabin(n: &Integer, a: &Integer) -> EResult<bool> {
    bpsw::miller_rabin(n, a)
}

/// `miller_rabin_random(n, k)`: `k` independent random-base rounds.
pub fn miller_rabin_random(n: &Integer, k: u32, ctx: &mut ProofContext) -> EResult<bool> {
    bpsw::miller_rabin_random(n, k, ctx)
}

/// `is_strong_lucas_pseudoprime(n)`.
pub fn is_strong_lucas_pseudoprime(n: &Integer) -> EResult<bool> {
    bpsw::is_strong_lucas_pseudoprime(n)
}

/// `ecpp_validate_curve(a, b, N, Px, Py, m, q)`: re-runs `ecpp_check_point`.
pub fn ecpp_validate_curve(
    a: &Integer,
    b: &Integer,
    n: &Integer,
    px: &Integer,
    py: &Integer,
    m: &Integer,
    q: &Integer,
) -> bool {
    use curve::{ecpp_check_point, Curve, Point, PointCheck};
    if *n <= 0u32 || !m.is_divisible(q) {
        return false;
    }
    let fourth_root = n.clone().root(4);
    let am_bound = Integer::from(&fourth_root + 1u32);
    let am_bound = Integer::from(&am_bound * &am_bound);
    if q <= &am_bound {
        return false;
    }
    let curve = Curve::new(a.clone(), b.clone(), n.clone());
    let p = Point::new(px.clone(), py.clone());
    if !curve.contains(&p) {
        return false;
    }
    matches!(ecpp_check_point(&curve, &p, m, q), Ok(PointCheck::Success))
}

/// Reject negative, empty, or non-digit decimal strings at the boundary;
/// the core engine never has to handle malformed input.
pub fn parse_candidate(s: &str) -> EResult<Integer> {
    let s = s.trim();
    if s.is_empty() {
        return Err(EcppError::InvalidInput {
            message: "empty candidate string".to_string(),
        });
    }
    if s.starts_with('-') {
        return Err(EcppError::InvalidInput {
            message: "negative candidates are rejected at the boundary".to_string(),
        });
    }
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(EcppError::InvalidInput {
            message: format!("not a base-10 integer: {:?}", s),
        });
    }
    Integer::from_str_radix(s, 10).map_err(|_| EcppError::InvalidInput {
        message: format!("failed to parse candidate: {:?}", s),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_small_factor_returns_false_for_small_primes() {
        for &p in &SMALL_PRIMES {
            assert!(!has_small_factor(&Integer::from(p)));
        }
    }

    #[test]
    fn has_small_factor_returns_true_for_composites() {
        assert!(has_small_factor(&Integer::from(91u32))); // 7*13
        assert!(has_small_factor(&Integer::from(1_000_000u32)));
    }

    #[test]
    fn has_small_factor_false_for_primes_above_table() {
        assert!(!has_small_factor(&Integer::from(313u32)));
        assert!(!has_small_factor(&Integer::from(1009u32)));
    }

    #[test]
    fn mr_screened_test_known_primes_pass() {
        use rug::integer::IsPrime;
        assert_ne!(mr_screened_test(&Integer::from(1009u32), 25), IsPrime::No);
    }

    #[test]
    fn mr_screened_test_known_composites_fail() {
        use rug::integer::IsPrime;
        assert_eq!(mr_screened_test(&Integer::from(1001u32), 25), IsPrime::No);
    }

    #[test]
    fn frobenius_test_known_primes() {
        for &p in &[2u32, 3, 5, 7, 101, 7919] {
            assert!(frobenius_test(&Integer::from(p)));
        }
    }

    #[test]
    fn frobenius_test_known_composites() {
        for &n in &[4u32, 9, 15, 91, 100] {
            assert!(!frobenius_test(&Integer::from(n)));
        }
    }

    #[test]
    fn frobenius_test_carmichael_numbers() {
        // 561 = 3 * 11 * 17, the smallest Carmichael number.
        assert!(!frobenius_test(&Integer::from(561u32)));
    }

    #[test]
    fn estimate_digits_within_one_of_exact() {
        for &n in &[7u32, 123, 99999, 100000] {
            let n = Integer::from(n);
            let est = estimate_digits(&n);
            let exact = exact_digits(&n);
            assert!((est as i64 - exact as i64).abs() <= 1);
        }
    }

    #[test]
    fn exact_digits_known_values() {
        assert_eq!(exact_digits(&Integer::from(999u32)), 3);
        assert_eq!(exact_digits(&Integer::from(1000u32)), 4);
    }

    #[test]
    fn checked_u32_valid_values() {
        assert_eq!(checked_u32(0), 0);
        assert_eq!(checked_u32(u32::MAX as u64), u32::MAX);
    }

    #[test]
    #[should_panic]
    fn checked_u32_overflow_panics() {
        checked_u32(u32::MAX as u64 + 1);
    }

    #[test]
    fn small_primes_table_is_sorted_and_prime() {
        for w in SMALL_PRIMES.windows(2) {
            assert!(w[0] < w[1]);
        }
        assert_eq!(SMALL_PRIMES[0], 2);
        assert_eq!(*SMALL_PRIMES.last().unwrap(), 311);
    }

    #[test]
    fn facade_is_prob_prime_matches_bpsw() {
        assert_eq!(is_prob_prime(&Integer::from(97u32)).unwrap(), 2);
        assert_eq!(is_prob_prime(&Integer::from(91u32)).unwrap(), 0);
    }

    #[test]
    fn facade_factor_round_trips() {
        let mut ctx = ProofContext::with_seed(context::EcppConfig::default(), 1);
        let n = Integer::from(30030u32); // 2*3*5*7*11*13
        let factors = factor(&n, &mut ctx);
        let product: Integer = factors.iter().fold(Integer::from(1u32), |acc, f| acc * f);
        assert_eq!(product, n);
    }

    #[test]
    fn parse_candidate_rejects_negative_and_empty() {
        assert!(parse_candidate("").is_err());
        assert!(parse_candidate("-5").is_err());
        assert!(parse_candidate("abc").is_err());
        assert_eq!(parse_candidate("42").unwrap(), Integer::from(42u32));
    }

    #[test]
    fn ecpp_validate_curve_rejects_bad_q() {
        // q not dividing m should fail immediately.
        let ok = ecpp_validate_curve(
            &Integer::from(2u32),
            &Integer::from(3u32),
            &Integer::from(97u32),
            &Integer::from(3u32),
            &Integer::from(6u32),
            &Integer::from(104u32),
            &Integer::from(11u32),
        );
        assert!(!ok);
    }
}
