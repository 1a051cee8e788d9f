//! Thimble boundary map, extension lattice and loops at infinity.
//!
//! Purpose
//! - `Δ` has one row per thimble, the boundary `(Mᵢ - I) · pᵢ`. A row vector of
//!   thimble coefficients `c` has boundary `c · Δ`.
//! - Extensions are the left kernel of `Δ`: thimble combinations with zero
//!   total boundary.
//! - Loops at infinity transport each standard fibre vector once around all
//!   critical points and record, point by point, the thimble coefficients of
//!   `(Mᵢ - I) · v`. Their rows lie in the extension lattice exactly when the
//!   total monodromy is trivial.
//!
//! References
//! - Code cross-refs: `cycles::CriticalCycles`, `quotient::QuotientBasis`

use crate::cycles::CriticalCycles;
use crate::error::{LatticeError, LefschetzError};
use crate::lattice::{self, checked_apply, matrix_from_rows, unit_vector, IntMatrix, IntVector};
use crate::monodromy::{total_monodromy, MonodromyMatrix, Path};
use std::ops::Range;

/// A permuting cycle swept along the path to its critical point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thimble {
    pub point: usize,
    pub permuting: IntVector,
    pub boundary: IntVector,
    pub path: Path,
}

/// Boundary matrix `Δ` with the thimble ranges of every critical point.
///
/// Invariants:
/// - `offsets.len() == points + 1`, `offsets[0] == 0`, `offsets[points] == delta.nrows()`.
/// - Rows `offsets[i]..offsets[i + 1]` are the vanishing cycles of point `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryMap {
    delta: IntMatrix,
    offsets: Vec<usize>,
}

impl BoundaryMap {
    pub fn new(cycles: &[CriticalCycles], dim: usize) -> Self {
        let mut offsets = Vec::with_capacity(cycles.len() + 1);
        offsets.push(0);
        let mut rows: Vec<IntVector> = Vec::new();
        for c in cycles {
            rows.extend(c.vanishing.iter().cloned());
            offsets.push(rows.len());
        }
        Self {
            delta: matrix_from_rows(&rows, dim),
            offsets,
        }
    }

    #[inline]
    pub fn delta(&self) -> &IntMatrix {
        &self.delta
    }

    #[inline]
    pub fn thimble_count(&self) -> usize {
        self.delta.nrows()
    }

    #[inline]
    pub fn fibre_rank(&self) -> usize {
        self.delta.ncols()
    }

    #[inline]
    pub fn points(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Thimble indices of critical point `point`.
    pub fn thimbles_of(&self, point: usize) -> Range<usize> {
        self.offsets[point]..self.offsets[point + 1]
    }

    /// Boundaries of the thimbles of `point`, as rows.
    pub fn point_boundaries(&self, point: usize) -> IntMatrix {
        let r = self.thimbles_of(point);
        lattice::row_range(&self.delta, r.start, r.end)
    }

    /// Total boundary `c · Δ` of a thimble combination.
    pub fn apply(&self, coefficients: &IntVector) -> Result<IntVector, LatticeError> {
        checked_apply(&self.delta.transpose(), coefficients)
    }
}

/// Thimbles in order, each paired with its point's path.
pub fn thimbles(cycles: &[CriticalCycles], paths: &[Path]) -> Vec<Thimble> {
    cycles
        .iter()
        .zip(paths)
        .enumerate()
        .flat_map(|(point, (c, path))| {
            c.permuting
                .iter()
                .zip(&c.vanishing)
                .map(move |(p, d)| Thimble {
                    point,
                    permuting: p.clone(),
                    boundary: d.clone(),
                    path: path.clone(),
                })
        })
        .collect()
}

/// Hermite basis of the left kernel of `Δ` (rows in thimble coordinates).
pub fn extensions(boundary: &BoundaryMap) -> Result<IntMatrix, LatticeError> {
    lattice::left_kernel(boundary.delta())
}

/// Rows: one loop per standard fibre vector, in thimble coordinates.
///
/// Fails with `TrivialTotalMonodromyViolated` (not retried) when `M_k ⋯ M₁ != I`.
pub fn infinity_loops(
    ms: &[MonodromyMatrix],
    boundary: &BoundaryMap,
) -> Result<IntMatrix, LefschetzError> {
    let n = boundary.fibre_rank();
    let total = total_monodromy(ms, n)?;
    if !total.is_identity() {
        return Err(LefschetzError::TrivialTotalMonodromyViolated {
            total: total.into_inner(),
            retried: false,
        });
    }
    let point_bases: Vec<IntMatrix> = (0..ms.len())
        .map(|i| boundary.point_boundaries(i))
        .collect();
    let mut loops = IntMatrix::zeros(n, boundary.thimble_count());
    for row in 0..n {
        let mut v = unit_vector(n, row);
        for (i, m) in ms.iter().enumerate() {
            let range = boundary.thimbles_of(i);
            if range.is_empty() {
                continue;
            }
            let image = checked_apply(&m.defect()?, &v)?;
            let coefficients = lattice::solve_left_vector(&point_bases[i], &image)?;
            for (k, c) in range.zip(coefficients.iter()) {
                loops[(row, k)] = *c;
            }
            v = m.apply(&v)?;
        }
    }
    Ok(loops)
}
