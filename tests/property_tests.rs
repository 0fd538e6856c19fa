//! Randomized invariants from the testable-properties section: `is_prob_prime`
//! agrees with trial division on small inputs, `factor` round-trips, and BPSW
//! never returns "probable" for anything small enough to decide outright.

use ecpp_core::bpsw::{is_prob_prime, BpswResult};
use ecpp_core::context::{EcppConfig, ProofContext};
use proptest::prelude::*;
use rug::Integer;

fn trial_division_is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let mut d = 2u64;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 1;
    }
    true
}

proptest! {
    #[test]
    fn bpsw_agrees_with_trial_division(n in 2u64..1_000_000u64) {
        let expected = trial_division_is_prime(n);
        let got = is_prob_prime(&Integer::from(n)).unwrap();
        let got_prime = got != BpswResult::Composite;
        prop_assert_eq!(expected, got_prime);
    }

    #[test]
    fn bpsw_never_uncertain_below_2_to_64(n in 2u64..1_000_000u64) {
        // n is far below 2^64, so BPSW must decide outright: never ProbablePrime.
        let got = is_prob_prime(&Integer::from(n)).unwrap();
        prop_assert_ne!(got, BpswResult::ProbablePrime);
    }

    #[test]
    fn even_numbers_above_two_are_composite(n in 2u64..500_000u64) {
        let candidate = Integer::from(2u64 * n + 4); // even, > 2
        prop_assert_eq!(is_prob_prime(&candidate).unwrap(), BpswResult::Composite);
    }

    #[test]
    fn perfect_squares_are_composite(n in 2u64..10_000u64) {
        let candidate = Integer::from(n * n);
        prop_assert_eq!(is_prob_prime(&candidate).unwrap(), BpswResult::Composite);
    }

    #[test]
    fn factor_round_trips_and_every_element_is_prime(n in 2u64..1_000_000u64) {
        let mut ctx = ProofContext::with_seed(EcppConfig::default(), 0xC0FFEE);
        let target = Integer::from(n);
        let factors = ecpp_core::factor(&target, &mut ctx);
        let product: Integer = factors.iter().fold(Integer::from(1u32), |acc, f| acc * f);
        prop_assert_eq!(product, target);
        for f in &factors {
            prop_assert_ne!(is_prob_prime(f).unwrap(), BpswResult::Composite);
        }
        for w in factors.windows(2) {
            prop_assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn miller_rabin_never_rejects_a_true_prime(n in 2u64..5_000u64) {
        if trial_division_is_prime(n) {
            let candidate = Integer::from(n);
            for a in 2u64..n.min(50) {
                prop_assert!(ecpp_core::miller_rabin(&candidate, &Integer::from(a)).unwrap());
            }
        }
    }
}

#[test]
fn boundary_cases() {
    assert_eq!(is_prob_prime(&Integer::from(0u32)).unwrap(), BpswResult::Composite);
    assert_eq!(is_prob_prime(&Integer::from(1u32)).unwrap(), BpswResult::Composite);
    for p in [2u32, 3, 5, 7] {
        assert_ne!(is_prob_prime(&Integer::from(p)).unwrap(), BpswResult::Composite);
    }
}

#[test]
fn strong_lucas_holds_for_primes() {
    for p in [2u32, 3, 5, 7, 11, 101, 7919] {
        assert!(ecpp_core::is_strong_lucas_pseudoprime(&Integer::from(p)).unwrap());
    }
}

#[test]
fn known_strong_pseudoprimes_pass_their_base() {
    // 2047 = 23 * 89 is the smallest base-2 strong pseudoprime.
    let n = Integer::from(2047u32);
    assert!(ecpp_core::miller_rabin(&n, &Integer::from(2u32)).unwrap());
    // but BPSW (base 2 + strong Lucas) must still call it composite.
    assert_eq!(is_prob_prime(&n).unwrap(), BpswResult::Composite);
}

#[test]
fn known_carmichael_numbers_are_declared_composite() {
    // Smallest Carmichael numbers; Fermat witnesses alone miss these, BPSW must not.
    for n in [561u32, 1105, 1729, 2465, 2821, 6601, 8911] {
        assert_eq!(is_prob_prime(&Integer::from(n)).unwrap(), BpswResult::Composite);
    }
}
