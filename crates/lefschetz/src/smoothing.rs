//! Homology of the desingularised model.
//!
//! Purpose
//! - Each singular fibre of type `I_ν` is replaced by `ν` elementary fibres
//!   (`resolve::decompose`). Homology is rebuilt on the smoothed thimbles; the
//!   resulting form is unimodular for an elliptic surface, and the kernel of
//!   each point's vanishing cycles yields the fibre components that miss the
//!   zero section.
//!
//! Why this design (short)
//! - `confluence` maps original thimbles to smoothed thimbles, so the original
//!   loops at infinity are reused (`loops · confluence`) instead of being
//!   recomputed.
//!
//! References
//! - Code cross-refs: `resolve::decompose`, `quotient::quotient_basis`,
//!   `intersection::thimble_form`

use crate::cfg::FibrationCfg;
use crate::cycles::{simple_permuting_cycle, vanishing_generator, CriticalCycles};
use crate::error::LefschetzError;
use crate::intersection;
use crate::lattice::{
    self, block_diagonal, checked_apply, checked_mul, matrix_from_rows, solve_left, stack,
    unit_vector, IntMatrix, IntVector,
};
use crate::monodromy::MonodromyMatrix;
use crate::quotient::{quotient_basis, QuotientBasis};
use crate::resolve::decompose_all;

/// Smoothed thimbles and the homology built on them.
///
/// Invariants:
/// - `matrices[i]` multiplies back to the monodromy of point `i`.
/// - `(E - I) · permuting[t] = vanishing_matrix().row(t)` for every smoothed thimble `t`.
/// - `infinity_loops == original_loops · confluence`.
#[derive(Clone, Debug)]
pub struct Smoothing {
    matrices: Vec<Vec<MonodromyMatrix>>,
    vanishing: Vec<Vec<IntVector>>,
    permuting: Vec<IntVector>,
    confluence: IntMatrix,
    extensions: IntMatrix,
    infinity_loops: IntMatrix,
    homology: QuotientBasis,
    fibre_rank: usize,
}

impl Smoothing {
    /// Smooth the critical points `ms` whose original cycles and loops are given.
    pub fn new(
        ms: &[MonodromyMatrix],
        cycles: &[CriticalCycles],
        original_loops: &IntMatrix,
        fibre_rank: usize,
    ) -> Result<Self, LefschetzError> {
        let matrices = decompose_all(ms)?;

        let mut vanishing = Vec::with_capacity(matrices.len());
        for (i, factors) in matrices.iter().enumerate() {
            let mut vs = Vec::with_capacity(factors.len());
            for e in factors {
                let v = vanishing_generator(&e.defect()?)?.ok_or_else(|| {
                    LefschetzError::UnexpectedSingularityType {
                        index: i,
                        rank: 0,
                        matrix: e.matrix().clone(),
                    }
                })?;
                vs.push(v);
            }
            vanishing.push(vs);
        }

        let mut permuting = Vec::new();
        for (i, (factors, vs)) in matrices.iter().zip(&vanishing).enumerate() {
            for (e, v) in factors.iter().zip(vs) {
                permuting.push(simple_permuting_cycle(i, e, v)?);
            }
        }

        let mut blocks = Vec::with_capacity(matrices.len());
        for (c, (factors, vs)) in cycles.iter().zip(matrices.iter().zip(&vanishing)) {
            blocks.push(confluence_block(c, factors, vs)?);
        }
        let confluence = block_diagonal(&blocks);

        let flat: Vec<IntVector> = vanishing.iter().flatten().cloned().collect();
        let extensions = lattice::left_kernel(&matrix_from_rows(&flat, fibre_rank))?;
        let infinity_loops = checked_mul(original_loops, &confluence)?;
        let homology = quotient_basis(&extensions, &infinity_loops)?;

        Ok(Self {
            matrices,
            vanishing,
            permuting,
            confluence,
            extensions,
            infinity_loops,
            homology,
            fibre_rank,
        })
    }

    /// Elementary factors per critical point.
    pub fn matrices(&self) -> &[Vec<MonodromyMatrix>] {
        &self.matrices
    }

    /// Vanishing cycle of each factor, per critical point.
    pub fn vanishing(&self) -> &[Vec<IntVector>] {
        &self.vanishing
    }

    pub fn permuting(&self) -> &[IntVector] {
        &self.permuting
    }

    pub fn confluence(&self) -> &IntMatrix {
        &self.confluence
    }

    pub fn extensions(&self) -> &IntMatrix {
        &self.extensions
    }

    pub fn infinity_loops(&self) -> &IntMatrix {
        &self.infinity_loops
    }

    pub fn homology(&self) -> &QuotientBasis {
        &self.homology
    }

    pub fn thimble_count(&self) -> usize {
        self.permuting.len()
    }

    /// Smoothed vanishing cycles as rows.
    pub fn vanishing_matrix(&self) -> IntMatrix {
        let flat: Vec<IntVector> = self.vanishing.iter().flatten().cloned().collect();
        matrix_from_rows(&flat, self.fibre_rank)
    }

    /// Thimble pairing on the smoothed thimbles.
    pub fn thimble_form(&self, fibre_form: &IntMatrix) -> Result<IntMatrix, LefschetzError> {
        let flat: Vec<IntVector> = self.vanishing.iter().flatten().cloned().collect();
        Ok(intersection::thimble_form(&self.permuting, &flat, fibre_form)?)
    }

    /// Form on the smoothed homology; unimodular unless `cfg.relaxed`.
    pub fn intersection_form(
        &self,
        fibre_form: &IntMatrix,
        cfg: &FibrationCfg,
    ) -> Result<IntMatrix, LefschetzError> {
        intersection::intersection_form(
            &self.thimble_form(fibre_form)?,
            &self.homology.representatives,
            cfg,
            true,
        )
    }

    /// Per critical point, the fibre components missing the zero section, as
    /// rows in homology coordinates.
    pub fn singular_components(&self) -> Result<Vec<IntMatrix>, LefschetzError> {
        let total = self.thimble_count();
        let h = self.homology.rank();
        let basis = stack(&self.homology.representatives, &self.infinity_loops);
        let mut offset = 0;
        let mut out = Vec::with_capacity(self.vanishing.len());
        for vs in &self.vanishing {
            let kernel = lattice::left_kernel(&matrix_from_rows(vs, self.fibre_rank))?;
            let padded = IntMatrix::from_fn(kernel.nrows(), total, |i, j| {
                if j >= offset && j < offset + vs.len() {
                    kernel[(i, j - offset)]
                } else {
                    0
                }
            });
            let coords = solve_left(&basis, &padded)?;
            out.push(IntMatrix::from_fn(coords.nrows(), h, |i, j| coords[(i, j)]));
            offset += vs.len();
        }
        Ok(out)
    }

    /// Singular components padded by two coordinates, then the fibre and section classes.
    pub fn trivial_lattice(&self) -> Result<IntMatrix, LefschetzError> {
        let h = self.homology.rank();
        let components = self.singular_components()?;
        let rows: Vec<IntVector> = components
            .iter()
            .flat_map(lattice::rows_of)
            .map(|r| IntVector::from_fn(h + 2, |j, _| if j < h { r[j] } else { 0 }))
            .chain([unit_vector(h + 2, h), unit_vector(h + 2, h + 1)])
            .collect();
        Ok(matrix_from_rows(&rows, h + 2))
    }
}

/// Smoothed coordinates of the thimbles of one point: walk the factors,
/// recording `(Eₖ - I) · p` as a multiple of `vₖ` and moving `p ← Eₖ · p`.
fn confluence_block(
    cycles: &CriticalCycles,
    factors: &[MonodromyMatrix],
    vanishing: &[IntVector],
) -> Result<IntMatrix, LefschetzError> {
    let mut block = IntMatrix::zeros(cycles.len(), factors.len());
    for (row, p) in cycles.permuting.iter().enumerate() {
        let mut p = p.clone();
        for (k, (e, v)) in factors.iter().zip(vanishing).enumerate() {
            let direction = IntMatrix::from_fn(1, v.len(), |_, j| v[j]);
            let image = checked_apply(&e.defect()?, &p)?;
            let multiple = lattice::solve_left_vector(&direction, &image)?;
            block[(row, k)] = multiple[0];
            p = e.apply(&p)?;
        }
    }
    Ok(block)
}
