//! Smith normal form with both transforms.

use super::{
    add_col_multiple, add_row_multiple, checked_mul, inverse, negate, negate_row, quotient,
    IntMatrix,
};
use crate::error::LatticeError;

/// `d = u · a · v` with `u`, `v` unimodular and `d` diagonal.
///
/// Invariants:
/// - `d[(i, i)] > 0` for `i < rank`; every other entry of `d` is zero.
/// - `d[(i, i)]` divides `d[(i + 1, i + 1)]`.
/// - Columns `rank..` of `v` span the right kernel of `a`.
#[derive(Clone, Debug)]
pub struct SmithForm {
    pub d: IntMatrix,
    pub u: IntMatrix,
    pub v: IntMatrix,
    pub rank: usize,
}

impl SmithForm {
    pub fn new(a: &IntMatrix) -> Result<Self, LatticeError> {
        let (m, n) = a.shape();
        let mut d = a.clone();
        let mut u = IntMatrix::identity(m, m);
        let mut v = IntMatrix::identity(n, n);
        let mut rank = 0;
        for t in 0..m.min(n) {
            loop {
                let Some((pi, pj)) = smallest_entry(&d, t) else {
                    break;
                };
                d.swap_rows(pi, t);
                u.swap_rows(pi, t);
                d.swap_columns(pj, t);
                v.swap_columns(pj, t);
                let mut clean = true;
                for i in t + 1..m {
                    if d[(i, t)] != 0 {
                        let q = negate(quotient(d[(i, t)], d[(t, t)])?)?;
                        add_row_multiple(&mut d, i, t, q)?;
                        add_row_multiple(&mut u, i, t, q)?;
                        clean &= d[(i, t)] == 0;
                    }
                }
                for j in t + 1..n {
                    if d[(t, j)] != 0 {
                        let q = negate(quotient(d[(t, j)], d[(t, t)])?)?;
                        add_col_multiple(&mut d, j, t, q)?;
                        add_col_multiple(&mut v, j, t, q)?;
                        clean &= d[(t, j)] == 0;
                    }
                }
                if !clean {
                    continue;
                }
                // Divisibility chain: pull an offending row into the pivot row and repeat.
                let pivot = d[(t, t)];
                let offending =
                    (t + 1..m).find(|&i| (t + 1..n).any(|j| d[(i, j)].wrapping_rem(pivot) != 0));
                match offending {
                    Some(i) => {
                        add_row_multiple(&mut d, t, i, 1)?;
                        add_row_multiple(&mut u, t, i, 1)?;
                    }
                    None => break,
                }
            }
            if d[(t, t)] == 0 {
                break;
            }
            if d[(t, t)] < 0 {
                negate_row(&mut d, t)?;
                negate_row(&mut u, t)?;
            }
            rank += 1;
        }
        Ok(Self { d, u, v, rank })
    }

    /// `d₁ | d₂ | … | d_rank`.
    pub fn invariant_factors(&self) -> Vec<i64> {
        (0..self.rank).map(|i| self.d[(i, i)]).collect()
    }

    /// Integer `x` with `x · a = rhs`, via the diagonal: `y · d = rhs · v`
    /// entrywise, then `x = y · u`.
    pub fn solve_left(&self, rhs: &IntMatrix) -> Result<IntMatrix, LatticeError> {
        let (m, n) = self.d.shape();
        if rhs.ncols() != n {
            return Err(LatticeError::DimensionMismatch {
                expected: n,
                found: rhs.ncols(),
            });
        }
        let rv = checked_mul(rhs, &self.v)?;
        let mut y = IntMatrix::zeros(rhs.nrows(), m);
        for i in 0..rhs.nrows() {
            for j in 0..n {
                let value = rv[(i, j)];
                if j < self.rank {
                    let dj = self.d[(j, j)];
                    if value % dj != 0 {
                        return Err(LatticeError::NoIntegerSolution { row: i });
                    }
                    y[(i, j)] = value / dj;
                } else if value != 0 {
                    return Err(LatticeError::NoIntegerSolution { row: i });
                }
            }
        }
        checked_mul(&y, &self.u)
    }

    /// `v⁻¹`: its first `rank` rows span the saturation of the row lattice of
    /// `a`; the remaining rows complete them to a basis of ℤⁿ.
    pub fn v_inverse(&self) -> Result<IntMatrix, LatticeError> {
        inverse(&self.v)
    }
}

/// Smallest non-zero `|d[(i, j)]|` with `i, j >= t`; ties go to the first in row-major order.
fn smallest_entry(d: &IntMatrix, t: usize) -> Option<(usize, usize)> {
    let mut best: Option<(u64, usize, usize)> = None;
    for i in t..d.nrows() {
        for j in t..d.ncols() {
            let x = d[(i, j)].unsigned_abs();
            if x != 0 && best.map_or(true, |(b, _, _)| x < b) {
                best = Some((x, i, j));
            }
        }
    }
    best.map(|(_, i, j)| (i, j))
}
