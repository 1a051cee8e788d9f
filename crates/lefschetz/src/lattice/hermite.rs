//! Row-style Hermite normal form and the queries built on it.

use super::{
    add_row_multiple, dot, negate, negate_row, quotient, row_range, IntMatrix, IntVector,
};
use crate::error::LatticeError;

/// `u · a = h` with `u` unimodular and `h` in reduced row echelon form.
///
/// Invariants:
/// - Rows `0..rank` of `h` are non-zero, rows `rank..` are zero.
/// - `pivots[k]` is the first non-zero column of row `k`; pivots increase
///   strictly and `h[(k, pivots[k])] > 0`.
/// - Entries above a pivot lie in `[0, pivot)`.
/// - Rows `rank..` of `u` span the left kernel of `a`.
#[derive(Clone, Debug)]
pub struct RowEchelon {
    pub h: IntMatrix,
    pub u: IntMatrix,
    pub rank: usize,
    pub pivots: Vec<usize>,
}

impl RowEchelon {
    pub fn new(a: &IntMatrix) -> Result<Self, LatticeError> {
        let (m, n) = a.shape();
        let mut h = a.clone();
        let mut u = IntMatrix::identity(m, m);
        let mut pivots = Vec::new();
        let mut row = 0;
        for col in 0..n {
            if row == m {
                break;
            }
            // Euclid down the column: the smallest entry becomes the pivot until
            // everything below it vanishes.
            loop {
                let Some(p) = (row..m)
                    .filter(|&i| h[(i, col)] != 0)
                    .min_by_key(|&i| h[(i, col)].unsigned_abs())
                else {
                    break;
                };
                h.swap_rows(p, row);
                u.swap_rows(p, row);
                let mut clean = true;
                for i in row + 1..m {
                    if h[(i, col)] != 0 {
                        let q = negate(quotient(h[(i, col)], h[(row, col)])?)?;
                        add_row_multiple(&mut h, i, row, q)?;
                        add_row_multiple(&mut u, i, row, q)?;
                        clean &= h[(i, col)] == 0;
                    }
                }
                if clean {
                    break;
                }
            }
            if h[(row, col)] == 0 {
                continue;
            }
            if h[(row, col)] < 0 {
                negate_row(&mut h, row)?;
                negate_row(&mut u, row)?;
            }
            let pivot = h[(row, col)];
            for i in 0..row {
                let q = negate(h[(i, col)].div_euclid(pivot))?;
                add_row_multiple(&mut h, i, row, q)?;
                add_row_multiple(&mut u, i, row, q)?;
            }
            pivots.push(col);
            row += 1;
        }
        Ok(Self {
            h,
            u,
            rank: row,
            pivots,
        })
    }

    /// Hermite basis of the row lattice (the non-zero rows of `h`).
    pub fn basis(&self) -> IntMatrix {
        row_range(&self.h, 0, self.rank)
    }

    /// Rows of `u` annihilating `a` from the left.
    pub fn left_kernel_rows(&self) -> IntMatrix {
        row_range(&self.u, self.rank, self.u.nrows())
    }

    /// One integer `x` with `x · a = b`; `row` labels `b` in the
    /// `NoIntegerSolution` error when `b` is outside the row lattice.
    pub fn solve_row(&self, row: usize, b: &[i64]) -> Result<IntVector, LatticeError> {
        let n = self.h.ncols();
        debug_assert_eq!(b.len(), n);
        let mut residual = b.to_vec();
        let mut y = vec![0i64; self.rank];
        for (k, &c) in self.pivots.iter().enumerate() {
            let pivot = self.h[(k, c)];
            if residual[c] % pivot != 0 {
                return Err(LatticeError::NoIntegerSolution { row });
            }
            y[k] = residual[c] / pivot;
            for (j, r) in residual.iter_mut().enumerate() {
                *r = y[k]
                    .checked_mul(self.h[(k, j)])
                    .and_then(|x| r.checked_sub(x))
                    .ok_or(LatticeError::Overflow { op: "back substitution" })?;
            }
        }
        if residual.iter().any(|&x| x != 0) {
            return Err(LatticeError::NoIntegerSolution { row });
        }
        let x = (0..self.u.ncols())
            .map(|j| dot((0..self.rank).map(|k| (y[k], self.u[(k, j)])), "back substitution"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(IntVector::from_vec(x))
    }
}

pub fn rank(a: &IntMatrix) -> Result<usize, LatticeError> {
    Ok(RowEchelon::new(a)?.rank)
}

/// Hermite basis of the ℤ-span of the rows of `a`.
pub fn row_space(a: &IntMatrix) -> Result<IntMatrix, LatticeError> {
    Ok(RowEchelon::new(a)?.basis())
}

/// Hermite basis of `{x : x · a = 0}`.
pub fn left_kernel(a: &IntMatrix) -> Result<IntMatrix, LatticeError> {
    row_space(&RowEchelon::new(a)?.left_kernel_rows())
}

/// Hermite basis of `{x : a · x = 0}`, one kernel vector per row.
pub fn kernel(a: &IntMatrix) -> Result<IntMatrix, LatticeError> {
    left_kernel(&a.transpose())
}

/// Integer `x` with `x · a = b` for every row of `b`.
pub fn solve_left(a: &IntMatrix, b: &IntMatrix) -> Result<IntMatrix, LatticeError> {
    if a.ncols() != b.ncols() {
        return Err(LatticeError::DimensionMismatch {
            expected: a.ncols(),
            found: b.ncols(),
        });
    }
    let echelon = RowEchelon::new(a)?;
    let mut out = IntMatrix::zeros(b.nrows(), a.nrows());
    for i in 0..b.nrows() {
        let rhs: Vec<i64> = b.row(i).iter().copied().collect();
        let x = echelon.solve_row(i, &rhs)?;
        for (j, &xj) in x.iter().enumerate() {
            out[(i, j)] = xj;
        }
    }
    Ok(out)
}

/// Single right-hand side version of [`solve_left`].
pub fn solve_left_vector(a: &IntMatrix, b: &IntVector) -> Result<IntVector, LatticeError> {
    if a.ncols() != b.len() {
        return Err(LatticeError::DimensionMismatch {
            expected: a.ncols(),
            found: b.len(),
        });
    }
    RowEchelon::new(a)?.solve_row(0, b.as_slice())
}

/// Integer inverse; fails with `NoIntegerSolution` unless `a` is unimodular.
pub fn inverse(a: &IntMatrix) -> Result<IntMatrix, LatticeError> {
    if !a.is_square() {
        return Err(LatticeError::DimensionMismatch {
            expected: a.nrows(),
            found: a.ncols(),
        });
    }
    solve_left(a, &IntMatrix::identity(a.nrows(), a.nrows()))
}
