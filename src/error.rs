//! # Error — Crate-Wide Error Kinds
//!
//! A single enum covers every failure mode the core arithmetic and the ECPP
//! recursion can produce. Most variants are not "errors" in the conventional
//! sense — `CompositeWitness` in particular is the expected, useful output of
//! a zero divisor turning up during modular arithmetic on a number that was
//! merely *assumed* prime. See module docs on `ecpp::prove` for how each
//! variant propagates.

use rug::Integer;
use std::fmt;

/// Crate-wide error type. `Result<T, EcppError>` is used pervasively inside
/// the arithmetic and recursion layers so a zero divisor discovered at depth
/// surfaces immediately rather than being swallowed.
#[derive(Clone, Debug)]
pub enum EcppError {
    /// Input failed boundary validation (negative, empty, non-digit). Never
    /// raised by the core itself — the marshaling layer is out of scope, but
    /// the variant exists so an embedder has somewhere to put this.
    InvalidInput { message: String },

    /// Modular arithmetic on a supposed prime discovered a zero divisor:
    /// `factor` is a non-trivial divisor of the modulus in effect at `at`.
    /// Bypasses the ECPP search and resolves the level as composite.
    CompositeWitness { at: &'static str, factor: Integer },

    /// A recursion level ran out of `(D, m)` pairs before reaching the
    /// bottom. Absorbed by the caller: the outer loop bumps `fac_stage`.
    SearchExhausted,

    /// Curve construction found roots of the class polynomial but no
    /// witness point within the search budget. `d` is marked unusable for
    /// the remainder of this proof.
    BlacklistedD { d: i64 },

    /// A mathematical impossibility (dataset invariant violated, or
    /// `check_for_factor` produced a `q` at or below the Atkin–Morain
    /// `fmin` bound it's contractually supposed to clear). Aborts the proof.
    Fatal { reason: String },
}

impl fmt::Display for EcppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcppError::InvalidInput { message } => write!(f, "invalid input: {message}"),
            EcppError::CompositeWitness { at, factor } => {
                write!(f, "composite witness at {at}: non-trivial factor {factor}")
            }
            EcppError::SearchExhausted => write!(f, "search exhausted at this recursion level"),
            EcppError::BlacklistedD { d } => write!(f, "discriminant {d} blacklisted for this proof"),
            EcppError::Fatal { reason } => write!(f, "fatal: {reason}"),
        }
    }
}

impl std::error::Error for EcppError {}

pub type EResult<T> = Result<T, EcppError>;
