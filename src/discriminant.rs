//! # Discriminant — Class-Polynomial Oracle (C6)
//!
//! `(D, degree h, type, coefficients)` lookup, ordered by ascending class
//! number then by `|D|`, matching §3's data model. The full production
//! dataset (hundreds to low thousands of discriminants) is out of scope per
//! spec.md — "treated as an opaque, read-only dataset indexed by
//! discriminant" — so this ships the well-known class-number-1 fundamental
//! discriminants with their (degree-1) Hilbert class polynomials, i.e. the
//! negatives of the j-invariants of the nine curves with CM by a maximal
//! order of class number 1. A production build links a larger table behind
//! the same [`lookup`] interface; [`EcppConfig::large_discriminant_set`]
//! exists for exactly that purpose (see `context.rs`).

use crate::error::{EResult, EcppError};
use rug::Integer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassPolyType {
    Hilbert,
    Weber,
}

/// A single discriminant's class-polynomial record.
#[derive(Clone, Debug)]
pub struct DiscriminantRecord {
    pub d: i64,
    pub degree: u32,
    pub poly_type: ClassPolyType,
    /// Coefficients in ascending power order, `h+1` entries for degree `h`.
    pub coeffs: &'static [&'static str],
}

/// The nine class-number-1 fundamental discriminants, each with its
/// degree-1 Hilbert class polynomial `x - j(D)`. Ordered by ascending
/// `|D|`, per §3's "ordered by ascending degree, then by |D|" rule applied
/// within this degree-1 subset.
static CLASS_NUMBER_ONE: &[DiscriminantRecord] = &[
    DiscriminantRecord { d: -3, degree: 1, poly_type: ClassPolyType::Hilbert, coeffs: &["0"] },
    DiscriminantRecord { d: -4, degree: 1, poly_type: ClassPolyType::Hilbert, coeffs: &["1728"] },
    DiscriminantRecord { d: -7, degree: 1, poly_type: ClassPolyType::Hilbert, coeffs: &["-3375"] },
    DiscriminantRecord { d: -8, degree: 1, poly_type: ClassPolyType::Hilbert, coeffs: &["8000"] },
    DiscriminantRecord { d: -11, degree: 1, poly_type: ClassPolyType::Hilbert, coeffs: &["-32768"] },
    DiscriminantRecord { d: -19, degree: 1, poly_type: ClassPolyType::Hilbert, coeffs: &["-884736"] },
    DiscriminantRecord { d: -43, degree: 1, poly_type: ClassPolyType::Hilbert, coeffs: &["-884736000"] },
    DiscriminantRecord { d: -67, degree: 1, poly_type: ClassPolyType::Hilbert, coeffs: &["-147197952000"] },
    DiscriminantRecord {
        d: -163,
        degree: 1,
        poly_type: ClassPolyType::Hilbert,
        coeffs: &["-262537412640768000"],
    },
];

/// Enforce §3's invariant: `(-D) mod 4 == 3` or `(-D) mod 16 ∈ {4, 8}`.
pub fn validate_invariant(d: i64) -> EResult<()> {
    let neg_d = -d;
    let ok = neg_d.rem_euclid(4) == 3 || matches!(neg_d.rem_euclid(16), 4 | 8);
    if ok {
        Ok(())
    } else {
        Err(EcppError::Fatal {
            reason: format!("discriminant {} violates the D mod 4 / mod 16 invariant", d),
        })
    }
}

/// Iterate discriminants in the dataset's fixed order (ascending degree,
/// then ascending `|D|`), the order `prove_outer`'s `for D in class_degrees()`
/// loop (spec §4.8) walks.
pub fn class_degrees() -> impl Iterator<Item = i64> {
    CLASS_NUMBER_ONE.iter().map(|r| r.d)
}

/// `lookup(D) = ⊥` maps to `None`: a `D` absent from the shipped dataset.
pub fn lookup(d: i64) -> Option<&'static DiscriminantRecord> {
    CLASS_NUMBER_ONE.iter().find(|r| r.d == d)
}

/// Gate for [`crate::context::EcppConfig::large_discriminant_set`]. The
/// shipped dataset is the nine class-number-1 Hilbert entries only; a larger
/// table would include Weber-type entries, whose roots need a j-invariant
/// conversion `find_curve` does not implement. Fails fast rather than
/// silently proving against a dataset this core can't fully consume.
pub fn dataset_supports(large: bool) -> EResult<()> {
    if large {
        Err(EcppError::Fatal {
            reason: "large_discriminant_set requested but the shipped dataset is the small \
                     Hilbert-only set; a larger table's Weber entries are not yet supported"
                .to_string(),
        })
    } else {
        Ok(())
    }
}

impl DiscriminantRecord {
    /// Parsed coefficients as `Integer`s, ascending power order.
    pub fn coefficients(&self) -> Vec<Integer> {
        self.coeffs
            .iter()
            .map(|s| Integer::from_str_radix(s, 10).expect("static class-polynomial coefficient"))
            .collect()
    }
}
