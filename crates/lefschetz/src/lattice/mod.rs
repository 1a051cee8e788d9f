//! Exact integer lattice algebra (Hermite and Smith normal forms).
//!
//! Purpose
//! - Every topological decision in this crate (ranks, kernels, integral
//!   solvability, unimodularity) is an exact integer reduction. No floating point.
//!
//! Why this design (short)
//! - Plain `nalgebra::DMatrix<i64>` storage; the reductions are written out by
//!   hand because nalgebra's decompositions need a field.
//! - Vectors are rows: a lattice is the ℤ-span of the rows of an `IntMatrix`, and
//!   `solve_left` answers `X · A = B`. Monodromy matrices still act on column
//!   vectors (`d = (M - I) · p`).
//! - Entries are `i64`; products accumulate in `i128`, the determinant and the
//!   rank tracker stay there. Every operation that can leave the range returns
//!   `LatticeError::Overflow` instead of wrapping or panicking.
//!
//! References
//! - Code cross-refs: `RowEchelon`, `SmithForm`, `RankTracker`

mod hermite;
mod rank;
mod smith;


pub use hermite::{
    inverse, kernel, left_kernel, rank, row_space, solve_left, solve_left_vector, RowEchelon,
};
pub use rank::RankTracker;
pub use smith::SmithForm;

use crate::error::LatticeError;
use nalgebra::{DMatrix, DVector};
use num_integer::Integer;

pub type IntMatrix = DMatrix<i64>;
pub type IntVector = DVector<i64>;

/// Matrix whose rows are `rows`; `ncols` fixes the width when `rows` is empty.
pub fn matrix_from_rows(rows: &[IntVector], ncols: usize) -> IntMatrix {
    debug_assert!(rows.iter().all(|r| r.len() == ncols));
    IntMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j])
}

/// Rows of `m` as owned vectors.
pub fn rows_of(m: &IntMatrix) -> Vec<IntVector> {
    (0..m.nrows()).map(|i| row_vector(m, i)).collect()
}

#[inline]
pub fn row_vector(m: &IntMatrix, i: usize) -> IntVector {
    IntVector::from_fn(m.ncols(), |j, _| m[(i, j)])
}

/// Rows `start..end` of `m` as an owned matrix (empty ranges allowed).
pub fn row_range(m: &IntMatrix, start: usize, end: usize) -> IntMatrix {
    IntMatrix::from_fn(end - start, m.ncols(), |i, j| m[(start + i, j)])
}

/// `top` stacked over `bottom`.
pub fn stack(top: &IntMatrix, bottom: &IntMatrix) -> IntMatrix {
    debug_assert_eq!(top.ncols(), bottom.ncols());
    let r = top.nrows();
    IntMatrix::from_fn(r + bottom.nrows(), top.ncols(), |i, j| {
        if i < r {
            top[(i, j)]
        } else {
            bottom[(i - r, j)]
        }
    })
}

/// Block-diagonal matrix; blocks may have zero rows or columns.
pub fn block_diagonal(blocks: &[IntMatrix]) -> IntMatrix {
    let rows = blocks.iter().map(|b| b.nrows()).sum();
    let cols = blocks.iter().map(|b| b.ncols()).sum();
    let mut out = IntMatrix::zeros(rows, cols);
    let (mut r0, mut c0) = (0, 0);
    for b in blocks {
        for i in 0..b.nrows() {
            for j in 0..b.ncols() {
                out[(r0 + i, c0 + j)] = b[(i, j)];
            }
        }
        r0 += b.nrows();
        c0 += b.ncols();
    }
    out
}

#[inline]
pub fn unit_vector(n: usize, i: usize) -> IntVector {
    let mut v = IntVector::zeros(n);
    v[i] = 1;
    v
}

/// Non-negative gcd of the entries (0 for an all-zero input).
pub fn content<'a>(entries: impl IntoIterator<Item = &'a i64>) -> i64 {
    entries.into_iter().fold(0i64, |g, x| g.gcd(x))
}


#[inline]
pub fn is_zero(m: &IntMatrix) -> bool {
    m.iter().all(|&x| x == 0)
}

#[inline]
fn overflow(op: &'static str) -> LatticeError {
    LatticeError::Overflow { op }
}

/// `x` back in `i64` range.
#[inline]
fn narrow(x: i128, op: &'static str) -> Result<i64, LatticeError> {
    i64::try_from(x).map_err(|_| overflow(op))
}

/// `Σ xᵢ · yᵢ` accumulated in `i128`; only the sum has to fit in `i64`.
fn dot<I>(terms: I, op: &'static str) -> Result<i64, LatticeError>
where
    I: IntoIterator<Item = (i64, i64)>,
{
    let mut acc = 0i128;
    for (x, y) in terms {
        acc = acc
            .checked_add(i128::from(x) * i128::from(y))
            .ok_or_else(|| overflow(op))?;
    }
    narrow(acc, op)
}

/// `a · b` without wrapping.
pub fn checked_mul(a: &IntMatrix, b: &IntMatrix) -> Result<IntMatrix, LatticeError> {
    if a.ncols() != b.nrows() {
        return Err(LatticeError::DimensionMismatch {
            expected: a.ncols(),
            found: b.nrows(),
        });
    }
    let mut out = IntMatrix::zeros(a.nrows(), b.ncols());
    for i in 0..a.nrows() {
        for j in 0..b.ncols() {
            let terms = (0..a.ncols()).map(|k| (a[(i, k)], b[(k, j)]));
            out[(i, j)] = dot(terms, "matrix product")?;
        }
    }
    Ok(out)
}

/// `a · v` for a column vector `v`, without wrapping.
pub fn checked_apply(a: &IntMatrix, v: &IntVector) -> Result<IntVector, LatticeError> {
    if a.ncols() != v.len() {
        return Err(LatticeError::DimensionMismatch {
            expected: a.ncols(),
            found: v.len(),
        });
    }
    let entries = (0..a.nrows())
        .map(|i| dot((0..a.ncols()).map(|k| (a[(i, k)], v[k])), "matrix product"))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(IntVector::from_vec(entries))
}

/// `k · m` entrywise.
pub fn checked_scale(m: &IntMatrix, k: i64) -> Result<IntMatrix, LatticeError> {
    let mut out = m.clone();
    for x in out.iter_mut() {
        *x = x.checked_mul(k).ok_or_else(|| overflow("scaling"))?;
    }
    Ok(out)
}

/// `-v`.
pub fn negated(v: &IntVector) -> Result<IntVector, LatticeError> {
    let entries = v
        .iter()
        .map(|&x| negate(x))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(IntVector::from_vec(entries))
}

/// `a · f · b` for row vectors `a`, `b`.
pub fn bilinear(a: &IntVector, f: &IntMatrix, b: &IntVector) -> Result<i64, LatticeError> {
    let fb = checked_apply(f, b)?;
    dot(a.iter().copied().zip(fb.iter().copied()), "bilinear form")
}

/// Exact determinant by fraction-free (Bareiss) elimination; `1` for the empty matrix.
pub fn determinant(a: &IntMatrix) -> Result<i128, LatticeError> {
    debug_assert!(a.is_square());
    let n = a.nrows();
    if n == 0 {
        return Ok(1);
    }
    let mut m: Vec<Vec<i128>> = (0..n)
        .map(|i| (0..n).map(|j| i128::from(a[(i, j)])).collect())
        .collect();
    let mut sign = 1i128;
    let mut prev = 1i128;
    for k in 0..n - 1 {
        if m[k][k] == 0 {
            let Some(swap) = (k + 1..n).find(|&i| m[i][k] != 0) else {
                return Ok(0);
            };
            m.swap(k, swap);
            sign = -sign;
        }
        for i in k + 1..n {
            for j in k + 1..n {
                // Bareiss: the division is exact.
                let lhs = m[i][j].checked_mul(m[k][k]);
                let rhs = m[i][k].checked_mul(m[k][j]);
                m[i][j] = lhs
                    .zip(rhs)
                    .and_then(|(l, r)| l.checked_sub(r))
                    .and_then(|d| d.checked_div(prev))
                    .ok_or_else(|| overflow("determinant"))?;
            }
        }
        prev = m[k][k];
    }
    sign.checked_mul(m[n - 1][n - 1])
        .ok_or_else(|| overflow("determinant"))
}

/// Nested row-list rendering, e.g. `[[1, 1], [0, 1]]`.
pub fn rows_repr(m: &IntMatrix) -> String {
    let rows: Vec<String> = (0..m.nrows())
        .map(|i| {
            let entries: Vec<String> = m.row(i).iter().map(|x| x.to_string()).collect();
            format!("[{}]", entries.join(", "))
        })
        .collect();
    format!("[{}]", rows.join(", "))
}

// Elementary row/column operations shared by the normal forms.

#[inline]
fn add_multiple(
    target: i64,
    factor: i64,
    source: i64,
    op: &'static str,
) -> Result<i64, LatticeError> {
    factor
        .checked_mul(source)
        .and_then(|x| target.checked_add(x))
        .ok_or_else(|| overflow(op))
}

/// `row[dst] += factor · row[src]`
pub(crate) fn add_row_multiple(
    m: &mut IntMatrix,
    dst: usize,
    src: usize,
    factor: i64,
) -> Result<(), LatticeError> {
    if factor == 0 {
        return Ok(());
    }
    for j in 0..m.ncols() {
        m[(dst, j)] = add_multiple(m[(dst, j)], factor, m[(src, j)], "row operation")?;
    }
    Ok(())
}

/// `col[dst] += factor · col[src]`
pub(crate) fn add_col_multiple(
    m: &mut IntMatrix,
    dst: usize,
    src: usize,
    factor: i64,
) -> Result<(), LatticeError> {
    if factor == 0 {
        return Ok(());
    }
    for i in 0..m.nrows() {
        m[(i, dst)] = add_multiple(m[(i, dst)], factor, m[(i, src)], "column operation")?;
    }
    Ok(())
}

#[inline]
pub(crate) fn negate(x: i64) -> Result<i64, LatticeError> {
    x.checked_neg().ok_or_else(|| overflow("negation"))
}

pub(crate) fn negate_row(m: &mut IntMatrix, i: usize) -> Result<(), LatticeError> {
    for j in 0..m.ncols() {
        m[(i, j)] = negate(m[(i, j)])?;
    }
    Ok(())
}

/// `a / b` rounded toward zero; `i64::MIN / -1` is the only failure.
#[inline]
pub(crate) fn quotient(a: i64, b: i64) -> Result<i64, LatticeError> {
    a.checked_div(b).ok_or_else(|| overflow("division"))
}
