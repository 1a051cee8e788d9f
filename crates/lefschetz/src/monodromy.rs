//! Monodromy matrices and base paths.
//!
//! Conventions
//! - A monodromy matrix acts on column vectors of the fibre lattice ℤⁿ.
//! - Critical points are traversed in input order; the total monodromy of
//!   `[M₁, …, M_k]` is `M_k ⋯ M₁` (the first loop acts first).
//! - Paths are opaque vertex lists supplied upstream; only concatenation and
//!   reversal matter here.

use crate::error::{LatticeError, LefschetzError};
use crate::lattice::{self, IntMatrix, IntVector};

/// Square integer automorphism of the fibre lattice at one critical point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonodromyMatrix(IntMatrix);

impl MonodromyMatrix {
    pub fn new(m: IntMatrix) -> Result<Self, LefschetzError> {
        if !m.is_square() {
            return Err(LefschetzError::invalid(format!(
                "monodromy matrix must be square, got {}x{}",
                m.nrows(),
                m.ncols()
            )));
        }
        Ok(Self(m))
    }

    /// Row-major constructor, e.g. `from_row_slice(2, &[1, 1, 0, 1])`.
    pub fn from_row_slice(n: usize, data: &[i64]) -> Result<Self, LefschetzError> {
        if data.len() != n * n {
            return Err(LefschetzError::invalid(format!(
                "expected {} entries for a {n}x{n} matrix, got {}",
                n * n,
                data.len()
            )));
        }
        Ok(Self(IntMatrix::from_row_slice(n, n, data)))
    }

    /// `[[a, b], [c, d]]`.
    pub fn from_2x2(rows: [[i64; 2]; 2]) -> Self {
        let [[a, b], [c, d]] = rows;
        Self(IntMatrix::from_row_slice(2, 2, &[a, b, c, d]))
    }

    pub fn identity(n: usize) -> Self {
        Self(IntMatrix::identity(n, n))
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.0.nrows()
    }

    #[inline]
    pub fn matrix(&self) -> &IntMatrix {
        &self.0
    }

    pub fn into_inner(self) -> IntMatrix {
        self.0
    }

    /// `M - I`.
    pub fn defect(&self) -> Result<IntMatrix, LatticeError> {
        let mut n = self.0.clone();
        for i in 0..self.dim() {
            n[(i, i)] = n[(i, i)]
                .checked_sub(1)
                .ok_or(LatticeError::Overflow { op: "defect" })?;
        }
        Ok(n)
    }

    pub fn defect_rank(&self) -> Result<usize, LatticeError> {
        lattice::rank(&self.defect()?)
    }

    pub fn is_identity(&self) -> bool {
        self.0 == IntMatrix::identity(self.dim(), self.dim())
    }

    pub fn determinant(&self) -> Result<i128, LatticeError> {
        lattice::determinant(&self.0)
    }

    pub fn inverse(&self) -> Result<Self, LefschetzError> {
        Ok(Self(lattice::inverse(&self.0)?))
    }

    /// `self · other`: first `other`, then `self`.
    pub fn compose(&self, other: &Self) -> Result<Self, LatticeError> {
        Ok(Self(lattice::checked_mul(&self.0, &other.0)?))
    }

    /// `self · other · self⁻¹`.
    pub fn conjugate(&self, other: &Self) -> Result<Self, LefschetzError> {
        Ok(self.compose(other)?.compose(&self.inverse()?)?)
    }

    #[inline]
    pub fn apply(&self, v: &IntVector) -> Result<IntVector, LatticeError> {
        lattice::checked_apply(&self.0, v)
    }

    /// `n`-th power for `n >= 0`.
    pub fn pow(&self, n: usize) -> Result<Self, LatticeError> {
        (0..n).try_fold(Self::identity(self.dim()), |acc, _| self.compose(&acc))
    }
}

/// Ordered product `M_k ⋯ M₁`; the identity of size `dim` for an empty list.
pub fn total_monodromy(
    ms: &[MonodromyMatrix],
    dim: usize,
) -> Result<MonodromyMatrix, LatticeError> {
    ms.iter()
        .try_fold(MonodromyMatrix::identity(dim), |acc, m| m.compose(&acc))
}

/// Opaque ordered list of base-point identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn new(vertices: Vec<usize>) -> Self {
        Self(vertices)
    }

    #[inline]
    pub fn vertices(&self) -> &[usize] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn concat(&self, other: &Path) -> Path {
        let mut v = self.0.clone();
        v.extend_from_slice(&other.0);
        Path(v)
    }

    pub fn reversed(&self) -> Path {
        Path(self.0.iter().rev().copied().collect())
    }

    /// Drop repeated vertices (`a a → a`) and immediate back-tracking (`a b a → a`).
    pub fn simplified(&self) -> Path {
        let mut out: Vec<usize> = Vec::with_capacity(self.0.len());
        for &v in &self.0 {
            if out.last() == Some(&v) {
                continue;
            }
            if out.len() >= 2 && out[out.len() - 2] == v {
                out.pop();
                continue;
            }
            out.push(v);
        }
        Path(out)
    }
}

impl From<Vec<usize>> for Path {
    fn from(v: Vec<usize>) -> Self {
        Self(v)
    }
}

/// Path of the synthetic point at infinity: all paths in order, reversed.
pub fn path_at_infinity(paths: &[Path]) -> Path {
    paths
        .iter()
        .fold(Path::default(), |acc, p| acc.concat(p))
        .reversed()
        .simplified()
}
