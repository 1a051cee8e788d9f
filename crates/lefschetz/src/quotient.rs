//! Integer representatives of `E / ⟨R⟩`.
//!
//! Purpose
//! - `E` (k × r) is a basis of a sublattice of ℤʳ (the extensions), `R` a set of
//!   relations inside it (the loops at infinity). The result is a ℤ-basis of
//!   the free part of the quotient, as rows in both coordinate systems.
//!
//! Why this design (short)
//! - Relations are moved into extension coordinates with the Smith form of `E`
//!   (`B · E = R`, solved exactly, never inverted).
//! - A greedy scan over standard vectors `e₀, e₁, …` keeps each one that raises
//!   the rank of `B ∪ kept`; a `RankTracker` maintains the rank incrementally.
//! - The scan only guarantees a ℚ-complement. When the kept vectors and the
//!   saturation of `B` do not form a unimodular square, the complement is
//!   replaced by the trailing rows of `V⁻¹` from the Smith form of `B`.
//!
//! References
//! - Code cross-refs: `lattice::SmithForm`, `lattice::RankTracker`

use crate::error::{LatticeError, LefschetzError};
use crate::lattice::{
    self, checked_mul, determinant, row_range, stack, unit_vector, IntMatrix, RankTracker,
    SmithForm,
};
use tracing::debug;

/// Basis of the quotient `E / ⟨R⟩`.
///
/// Invariants:
/// - `representatives == coordinates · E`.
/// - `coordinates` together with a basis of the saturation of `relations` is a
///   basis of ℤᵏ.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuotientBasis {
    /// Rows in ambient (thimble) coordinates.
    pub representatives: IntMatrix,
    /// Rows in extension coordinates.
    pub coordinates: IntMatrix,
    /// Relations in extension coordinates (`relations · E = R`).
    pub relations: IntMatrix,
    pub relation_rank: usize,
    /// The greedy complement was not integral and was replaced.
    pub repaired: bool,
}

impl QuotientBasis {
    #[inline]
    pub fn rank(&self) -> usize {
        self.representatives.nrows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.representatives.nrows() == 0
    }
}

/// Quotient of the row lattice of `extensions` by the rows of `relations`.
///
/// `relations` must lie in the row lattice of `extensions`; otherwise the solve
/// fails with `NoIntegerSolution`.
pub fn quotient_basis(
    extensions: &IntMatrix,
    relations: &IntMatrix,
) -> Result<QuotientBasis, LefschetzError> {
    let (k, r) = extensions.shape();
    if relations.ncols() != r {
        return Err(LatticeError::DimensionMismatch {
            expected: r,
            found: relations.ncols(),
        }
        .into());
    }
    if k == 0 {
        if !lattice::is_zero(relations) {
            return Err(LefschetzError::invalid(
                "non-zero relations in a zero extension lattice",
            ));
        }
        return Ok(QuotientBasis {
            representatives: IntMatrix::zeros(0, r),
            coordinates: IntMatrix::zeros(0, 0),
            relations: IntMatrix::zeros(relations.nrows(), 0),
            relation_rank: 0,
            repaired: false,
        });
    }

    let b = SmithForm::new(extensions)?.solve_left(relations)?;

    let mut tracker = RankTracker::new(k);
    for i in 0..b.nrows() {
        let row: Vec<i64> = b.row(i).iter().copied().collect();
        tracker.insert(&row)?;
    }
    let relation_rank = tracker.rank();
    let mut kept = Vec::with_capacity(k - relation_rank);
    for i in 0..k {
        if tracker.is_full() {
            break;
        }
        if tracker.insert(unit_vector(k, i).as_slice())? {
            kept.push(i);
        }
    }

    let smith_b = SmithForm::new(&b)?;
    let v_inv = smith_b.v_inverse()?;
    let saturation = row_range(&v_inv, 0, smith_b.rank);
    let greedy = IntMatrix::from_fn(kept.len(), k, |row, j| i64::from(kept[row] == j));
    let index = determinant(&stack(&saturation, &greedy))?.unsigned_abs();
    let (coordinates, repaired) = if index == 1 {
        (greedy, false)
    } else {
        debug!(
            extension_rank = k,
            relation_rank, "greedy complement not integral, using Smith complement"
        );
        (row_range(&v_inv, smith_b.rank, k), true)
    };

    Ok(QuotientBasis {
        representatives: checked_mul(&coordinates, extensions)?,
        coordinates,
        relations: b,
        relation_rank,
        repaired,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mat(rows: usize, cols: usize, data: &[i64]) -> IntMatrix {
        IntMatrix::from_row_slice(rows, cols, data)
    }

    #[test]
    fn zero_extension_lattice_gives_empty_basis() {
        let q = quotient_basis(&IntMatrix::zeros(0, 3), &IntMatrix::zeros(2, 3)).unwrap();
        assert!(q.is_empty());
        assert_eq!(q.representatives.shape(), (0, 3));
        assert!(quotient_basis(&IntMatrix::zeros(0, 2), &mat(1, 2, &[1, 0])).is_err());
    }

    #[test]
    fn loops_can_fill_the_extension_lattice() {
        let e = mat(2, 4, &[1, 0, 1, 1, 0, 1, 0, 1]);
        let loops = mat(2, 4, &[0, -1, 0, -1, 1, -1, 1, 0]);
        let q = quotient_basis(&e, &loops).unwrap();
        assert_eq!(q.relations, mat(2, 2, &[0, -1, 1, -1]));
        assert_eq!(q.relation_rank, 2);
        assert!(q.is_empty());
    }

    #[test]
    fn greedy_scan_skips_dependent_vectors() {
        let q = quotient_basis(&IntMatrix::identity(2, 2), &mat(1, 2, &[1, 0])).unwrap();
        assert_eq!(q.coordinates, mat(1, 2, &[0, 1]));
        assert!(!q.repaired);
    }

    #[test]
    fn non_integral_greedy_choice_is_repaired() {
        // e0 completes (2, 3) over Q but spans an index-3 sublattice.
        let rel = mat(1, 2, &[2, 3]);
        let q = quotient_basis(&IntMatrix::identity(2, 2), &rel).unwrap();
        assert!(q.repaired);
        assert_eq!(q.rank(), 1);
        assert_eq!(determinant(&stack(&rel, &q.coordinates)).unwrap().abs(), 1);
        assert_eq!(q.representatives, q.coordinates);
    }

    #[test]
    fn relations_outside_the_lattice_fail() {
        let e = mat(2, 2, &[2, 0, 0, 2]);
        let err = quotient_basis(&e, &mat(1, 2, &[1, 0])).unwrap_err();
        assert!(matches!(
            err,
            LefschetzError::Lattice(LatticeError::NoIntegerSolution { row: 0 })
        ));
    }
}
