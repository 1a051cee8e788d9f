//! Error taxonomy for the exact lattice layer and the homology pipeline.
//!
//! Fatal pipeline variants carry the offending critical-point index and matrix;
//! `Display` renders matrices as nested row lists so a failing fibration can be
//! pasted back into a JSON input.

use crate::lattice::{rows_repr, IntMatrix};
use thiserror::Error;

/// Failures of the exact integer queries in [`crate::lattice`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LatticeError {
    /// Row `row` of the right-hand side is not an integer combination of the basis rows.
    #[error("no integer solution for right-hand side row {row}")]
    NoIntegerSolution { row: usize },
    #[error("dimension mismatch: expected {expected} columns, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// An intermediate or final entry left the `i64` range (`i128` for determinants).
    #[error("integer overflow in {op}")]
    Overflow { op: &'static str },
}

/// Failures of the fibration pipeline (cycles, boundaries, quotient, forms).
#[derive(Clone, Debug, Error)]
pub enum LefschetzError {
    #[error(transparent)]
    Lattice(#[from] LatticeError),

    #[error("invalid fibration input: {reason}")]
    InvalidInput { reason: String },

    #[error("monodromy matrix {index} is not unimodular (det {determinant}): {}", rows_repr(.matrix))]
    NotUnimodular {
        index: usize,
        determinant: i128,
        matrix: IntMatrix,
    },

    /// `rank(M - I)` is not supported at this point (not a Lefschetz fibre, or
    /// a singular fibre where only elementary ones are allowed).
    #[error("unexpected singularity at critical point {index}: rank(M - I) = {rank} for {}", rows_repr(.matrix))]
    UnexpectedSingularityType {
        index: usize,
        rank: usize,
        matrix: IntMatrix,
    },

    #[error(
        "decomposition of critical point {index} does not multiply back: {} != {}",
        rows_repr(.product),
        rows_repr(.matrix)
    )]
    DecompositionMismatch {
        index: usize,
        matrix: IntMatrix,
        product: IntMatrix,
    },

    #[error("intersection form is not unimodular (det {determinant}): {}", rows_repr(.form))]
    NonUnimodularIntersectionForm { determinant: i128, form: IntMatrix },

    /// The ordered product of all monodromies is not the identity. Recovered once
    /// by appending a point at infinity; `retried` marks the second failure.
    #[error("total monodromy is not trivial (retried: {retried}): {}", rows_repr(.total))]
    TrivialTotalMonodromyViolated { total: IntMatrix, retried: bool },
}

impl LefschetzError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}
