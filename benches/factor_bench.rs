use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ecpp_core::context::{EcppConfig, ProofContext};
use rug::Integer;

fn bench_has_small_factor_prime(c: &mut Criterion) {
    let n = Integer::from(1u32) << 127u32;
    let prime = n - 1u32;
    c.bench_function("has_small_factor(M127)", |b| {
        b.iter(|| ecpp_core::has_small_factor(black_box(&prime)));
    });
}

fn bench_mr_screened_composite(c: &mut Criterion) {
    let composite = Integer::from(561u32); // 3 * 11 * 17
    c.bench_function("mr_screened_test(561, 25)", |b| {
        b.iter(|| ecpp_core::mr_screened_test(black_box(&composite), black_box(25)));
    });
}

fn bench_pollard_rho_floyd(c: &mut Criterion) {
    // Product of two ~20-digit primes, well within Pollard rho's reach.
    let n = Integer::from_str_radix("1000000000000000000117000000000000000000031", 10).unwrap();
    c.bench_function("pollard_rho_floyd(41-digit semiprime)", |b| {
        b.iter(|| ecpp_core::factor::pollard_rho_floyd(black_box(&n), black_box(2_000_000), black_box(1)));
    });
}

fn bench_ecm_one_curve(c: &mut Criterion) {
    let n = Integer::from_str_radix("1000000000000000000117000000000000000000031", 10).unwrap();
    let mut ctx = ProofContext::with_seed(EcppConfig::default(), 99);
    c.bench_function("ecm_one_curve(41-digit semiprime)", |b| {
        b.iter(|| ecpp_core::ecm::ecm_one_curve(black_box(&n), black_box(2000), black_box(200_000), &mut ctx));
    });
}

fn bench_full_cascade_decomposition(c: &mut Criterion) {
    let n = Integer::from(6469693230u64); // 2*3*5*7*11*13*17*19*23*29*31
    let mut ctx = ProofContext::with_seed(EcppConfig::default(), 7);
    c.bench_function("factor(primorial_31#)", |b| {
        b.iter(|| ecpp_core::factor(black_box(&n), &mut ctx));
    });
}

criterion_group!(
    benches,
    bench_has_small_factor_prime,
    bench_mr_screened_composite,
    bench_pollard_rho_floyd,
    bench_ecm_one_curve,
    bench_full_cascade_decomposition,
);
criterion_main!(benches);
