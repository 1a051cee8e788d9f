//! Permuting and vanishing cycles of a single critical point.
//!
//! Purpose
//! - From `N = M - I` and its Smith form `D = U · N · V`, every column `V · eⱼ`
//!   with `D[j, j] != 0` is a permuting cycle `p`; its boundary `N · p` is the
//!   matching vanishing cycle. The permuting cycles span a complement of
//!   `ker N` on which `N` is injective.
//! - For an elementary (rank-1) point the sign of `p` is fixed so that `N · p`
//!   is exactly the Hermite generator of the image of `N` (first non-zero
//!   coordinate positive).
//!
//! References
//! - Code cross-refs: `lattice::SmithForm`, `boundary::BoundaryMap`

use crate::cfg::FibrationCfg;
use crate::error::{LatticeError, LefschetzError};
use crate::lattice::{
    self, checked_apply, matrix_from_rows, negated, IntMatrix, IntVector, SmithForm,
};
use crate::monodromy::MonodromyMatrix;
use rayon::prelude::*;

/// Cycles of one critical point; `vanishing[k] = (M - I) · permuting[k]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CriticalCycles {
    pub permuting: Vec<IntVector>,
    pub vanishing: Vec<IntVector>,
}

impl CriticalCycles {
    #[inline]
    pub fn len(&self) -> usize {
        self.permuting.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.permuting.is_empty()
    }

    /// Vanishing cycles as rows (`len × dim`).
    pub fn vanishing_matrix(&self, dim: usize) -> IntMatrix {
        matrix_from_rows(&self.vanishing, dim)
    }
}

/// Generator of the image of `N` (Hermite row of `Nᵗ`), or `None` when `N = 0`.
/// Only meaningful for rank-1 `N`.
pub fn vanishing_generator(defect: &IntMatrix) -> Result<Option<IntVector>, LatticeError> {
    let basis = lattice::row_space(&defect.transpose())?;
    Ok((basis.nrows() > 0).then(|| lattice::row_vector(&basis, 0)))
}

/// Cycles of the critical point `index` with monodromy `m`.
pub fn extract_cycles(
    index: usize,
    m: &MonodromyMatrix,
    cfg: &FibrationCfg,
) -> Result<CriticalCycles, LefschetzError> {
    let n = m.defect()?;
    let smith = SmithForm::new(&n)?;
    if smith.rank > 1 && !cfg.allow_singular_fibres && !cfg.relaxed {
        return Err(LefschetzError::UnexpectedSingularityType {
            index,
            rank: smith.rank,
            matrix: m.matrix().clone(),
        });
    }
    let mut permuting: Vec<IntVector> = (0..smith.rank)
        .map(|j| smith.v.column(j).into_owned())
        .collect();
    if smith.rank == 1 {
        let generator = vanishing_generator(&n)?;
        let image = checked_apply(&n, &permuting[0])?;
        if generator.as_ref() != Some(&image) {
            // `N · V · e₀ = d₀ · U⁻¹ · e₀` generates the image of `N`; only the sign can differ.
            debug_assert_eq!(generator.as_ref(), negated(&image).ok().as_ref());
            permuting[0] = negated(&permuting[0])?;
        }
    }
    let vanishing = permuting
        .iter()
        .map(|p| checked_apply(&n, p))
        .collect::<Result<_, _>>()?;
    Ok(CriticalCycles {
        permuting,
        vanishing,
    })
}

/// [`extract_cycles`] for every critical point, in parallel, collected in order.
pub fn extract_all(
    ms: &[MonodromyMatrix],
    cfg: &FibrationCfg,
) -> Result<Vec<CriticalCycles>, LefschetzError> {
    ms.par_iter()
        .enumerate()
        .map(|(i, m)| extract_cycles(i, m, cfg))
        .collect()
}

/// Permuting cycle of an elementary factor `e`: `p = V · e₀` from the Smith form
/// of `e - I`, signed so that `(e - I) · p = vanishing`.
pub fn simple_permuting_cycle(
    index: usize,
    e: &MonodromyMatrix,
    vanishing: &IntVector,
) -> Result<IntVector, LefschetzError> {
    let n = e.defect()?;
    let smith = SmithForm::new(&n)?;
    let mismatch = || LefschetzError::UnexpectedSingularityType {
        index,
        rank: smith.rank,
        matrix: e.matrix().clone(),
    };
    if smith.rank != 1 {
        return Err(mismatch());
    }
    let p: IntVector = smith.v.column(0).into_owned();
    let image = checked_apply(&n, &p)?;
    if &image == vanishing {
        Ok(p)
    } else if &negated(&image)? == vanishing {
        Ok(negated(&p)?)
    } else {
        Err(mismatch())
    }
}
