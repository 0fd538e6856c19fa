use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ecpp_core::context::{EcppConfig, ProofContext};
use rug::Integer;

fn bench_bpsw_small_prime(c: &mut Criterion) {
    let n = Integer::from(1_000_003u32);
    c.bench_function("bpsw::is_prob_prime(1000003)", |b| {
        b.iter(|| ecpp_core::bpsw::is_prob_prime(black_box(&n)).unwrap());
    });
}

fn bench_bpsw_carmichael(c: &mut Criterion) {
    let n = Integer::from(41041u32); // Carmichael number, 7*11*13*41
    c.bench_function("bpsw::is_prob_prime(41041, carmichael)", |b| {
        b.iter(|| ecpp_core::bpsw::is_prob_prime(black_box(&n)).unwrap());
    });
}

fn bench_bls_prove(c: &mut Criterion) {
    let n = Integer::from(65537u32); // 2^16 + 1, Fermat prime, N-1 fully smooth
    let mut ctx = ProofContext::with_seed(EcppConfig::default(), 11);
    c.bench_function("bls::bls_prove(65537)", |b| {
        b.iter(|| ecpp_core::bls::bls_prove(black_box(&n), &mut ctx).unwrap());
    });
}

fn bench_ecpp_prove_outer_small(c: &mut Criterion) {
    // Small prime whose N-1 is deliberately not smooth enough for BLS to
    // close alone, forcing at least one ECPP recursion level.
    let n = Integer::from(1_000_000_007u32);
    let mut ctx = ProofContext::with_seed(EcppConfig::default(), 13);
    c.bench_function("ecpp::prove_outer(1000000007)", |b| {
        b.iter(|| ecpp_core::ecpp::prove_outer(black_box(&n), &mut ctx).unwrap());
    });
}

criterion_group!(
    benches,
    bench_bpsw_small_prime,
    bench_bpsw_carmichael,
    bench_bls_prove,
    bench_ecpp_prove_outer_small,
);
criterion_main!(benches);
