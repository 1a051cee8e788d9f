//! Fibration facade: monodromy data in, homology and intersection form out.
//!
//! Purpose
//! - Own the inputs of one fibration and every quantity derived from them.
//! - Run the pipeline `cycles → boundary → loops at infinity → extensions →
//!   quotient` eagerly in the constructor; the forms, the smoothing and the
//!   periods are computed on first access and cached.
//!
//! Why this design (short)
//! - Stages are free functions taking their inputs explicitly
//!   (`cycles::extract_all`, `boundary::infinity_loops`, …); this type only
//!   sequences them and owns the results.
//! - Lazy values live in `OnceCell`s: computed at most once per instance, never
//!   mutated afterwards. The only invalidation is
//!   [`Fibration::forget_thimble_integrals`], which drops numerical data and
//!   keeps every lattice result.
//! - A non-trivial total monodromy is repaired once by appending a point at
//!   infinity with the inverse monodromy and the reversed concatenated path.
//!
//! References
//! - Code cross-refs: `boundary::infinity_loops`, `quotient::quotient_basis`,
//!   `smoothing::Smoothing`

use crate::boundary::{self, BoundaryMap, Thimble};
use crate::cfg::FibrationCfg;
use crate::cycles::{extract_all, extract_cycles, CriticalCycles};
use crate::error::LefschetzError;
use crate::intersection;
use crate::lattice::{matrix_from_rows, rows_repr, IntMatrix, IntVector};
use crate::monodromy::{path_at_infinity, MonodromyMatrix, Path};
use crate::periods::{self, ComplexMatrix};
use crate::quotient::{quotient_basis, QuotientBasis};
use crate::smoothing::Smoothing;
use std::cell::OnceCell;
use std::time::Instant;
use tracing::{debug, info};

#[cfg(test)]
mod tests;

/// Inputs supplied by the upstream collaborators.
///
/// Invariants (checked by [`Fibration::new`]):
/// - every matrix has the size of `fibre_form`;
/// - one path per matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FibrationInput {
    pub monodromy: Vec<MonodromyMatrix>,
    pub paths: Vec<Path>,
    /// Intersection form of the fibre itself.
    pub fibre_form: IntMatrix,
}

impl FibrationInput {
    /// Input with trivial paths `[i]` for critical point `i`.
    pub fn new(monodromy: Vec<MonodromyMatrix>, fibre_form: IntMatrix) -> Self {
        let paths = (0..monodromy.len()).map(|i| Path::new(vec![i])).collect();
        Self {
            monodromy,
            paths,
            fibre_form,
        }
    }

    pub fn with_paths(mut self, paths: Vec<Path>) -> Self {
        self.paths = paths;
        self
    }
}

/// Homology reconstruction of one fibration.
#[derive(Debug)]
pub struct Fibration {
    cfg: FibrationCfg,
    monodromy: Vec<MonodromyMatrix>,
    paths: Vec<Path>,
    fibre_form: IntMatrix,
    has_point_at_infinity: bool,

    cycles: Vec<CriticalCycles>,
    boundary: BoundaryMap,
    extensions: IntMatrix,
    infinity_loops: IntMatrix,
    homology: QuotientBasis,

    intersection_form: OnceCell<IntMatrix>,
    smoothing: OnceCell<Smoothing>,
    smoothing_intersection_form: OnceCell<IntMatrix>,

    thimble_integrals: Option<ComplexMatrix>,
    period_matrix: OnceCell<ComplexMatrix>,
}

impl Fibration {
    pub fn new(input: FibrationInput, cfg: FibrationCfg) -> Result<Self, LefschetzError> {
        let start = Instant::now();
        validate(&input, &cfg)?;
        let FibrationInput {
            mut monodromy,
            mut paths,
            fibre_form,
        } = input;
        let dim = fibre_form.nrows();

        let mut cycles = extract_all(&monodromy, &cfg)?;
        let mut bmap = BoundaryMap::new(&cycles, dim);
        let mut has_point_at_infinity = false;
        let infinity_loops = match boundary::infinity_loops(&monodromy, &bmap) {
            Ok(loops) => loops,
            Err(LefschetzError::TrivialTotalMonodromyViolated { total, .. }) => {
                debug!(
                    points = monodromy.len(),
                    total = %rows_repr(&total),
                    "total monodromy not trivial, adding a point at infinity"
                );
                let at_infinity = MonodromyMatrix::new(total)?.inverse()?;
                cycles.push(extract_cycles(monodromy.len(), &at_infinity, &cfg)?);
                paths.push(path_at_infinity(&paths));
                monodromy.push(at_infinity);
                bmap = BoundaryMap::new(&cycles, dim);
                has_point_at_infinity = true;
                boundary::infinity_loops(&monodromy, &bmap).map_err(|e| match e {
                    LefschetzError::TrivialTotalMonodromyViolated { total, .. } => {
                        LefschetzError::TrivialTotalMonodromyViolated {
                            total,
                            retried: true,
                        }
                    }
                    other => other,
                })?
            }
            Err(e) => return Err(e),
        };

        let extensions = boundary::extensions(&bmap)?;
        let homology = quotient_basis(&extensions, &infinity_loops)?;
        info!(
            thimbles = bmap.thimble_count(),
            extension_rank = extensions.nrows(),
            relation_rank = homology.relation_rank,
            homology_rank = homology.rank(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "homology reconstructed"
        );

        Ok(Self {
            cfg,
            monodromy,
            paths,
            fibre_form,
            has_point_at_infinity,
            cycles,
            boundary: bmap,
            extensions,
            infinity_loops,
            homology,
            intersection_form: OnceCell::new(),
            smoothing: OnceCell::new(),
            smoothing_intersection_form: OnceCell::new(),
            thimble_integrals: None,
            period_matrix: OnceCell::new(),
        })
    }

    #[inline]
    pub fn cfg(&self) -> &FibrationCfg {
        &self.cfg
    }

    /// Monodromy per critical point, including a synthesised point at infinity.
    #[inline]
    pub fn monodromy_matrices(&self) -> &[MonodromyMatrix] {
        &self.monodromy
    }

    #[inline]
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    #[inline]
    pub fn fibre_form(&self) -> &IntMatrix {
        &self.fibre_form
    }

    #[inline]
    pub fn fibre_rank(&self) -> usize {
        self.fibre_form.nrows()
    }

    #[inline]
    pub fn has_point_at_infinity(&self) -> bool {
        self.has_point_at_infinity
    }

    #[inline]
    pub fn cycles(&self) -> &[CriticalCycles] {
        &self.cycles
    }

    /// Permuting cycles of all thimbles, as rows.
    pub fn permuting_cycles(&self) -> IntMatrix {
        let rows: Vec<IntVector> = self
            .cycles
            .iter()
            .flat_map(|c| c.permuting.iter().cloned())
            .collect();
        matrix_from_rows(&rows, self.fibre_rank())
    }

    /// Vanishing cycles of all thimbles, as rows (the boundary matrix `Δ`).
    #[inline]
    pub fn vanishing_cycles(&self) -> &IntMatrix {
        self.boundary.delta()
    }

    pub fn thimbles(&self) -> Vec<Thimble> {
        boundary::thimbles(&self.cycles, &self.paths)
    }

    #[inline]
    pub fn boundary(&self) -> &BoundaryMap {
        &self.boundary
    }

    #[inline]
    pub fn extensions(&self) -> &IntMatrix {
        &self.extensions
    }

    #[inline]
    pub fn infinity_loops(&self) -> &IntMatrix {
        &self.infinity_loops
    }

    #[inline]
    pub fn homology(&self) -> &QuotientBasis {
        &self.homology
    }

    /// Thimble pairing of the original (unsmoothed) thimbles.
    pub fn thimble_form(&self) -> Result<IntMatrix, LefschetzError> {
        let permuting: Vec<IntVector> = self
            .cycles
            .iter()
            .flat_map(|c| c.permuting.iter().cloned())
            .collect();
        let boundaries: Vec<IntVector> = self
            .cycles
            .iter()
            .flat_map(|c| c.vanishing.iter().cloned())
            .collect();
        Ok(intersection::thimble_form(
            &permuting,
            &boundaries,
            &self.fibre_form,
        )?)
    }

    /// Intersection form on [`Self::homology`]; checked unimodular when
    /// `cfg.expect_unimodular`.
    pub fn intersection_form(&self) -> Result<&IntMatrix, LefschetzError> {
        memoised(&self.intersection_form, || {
            intersection::intersection_form(
                &self.thimble_form()?,
                &self.homology.representatives,
                &self.cfg,
                self.cfg.expect_unimodular,
            )
        })
    }

    /// Desingularised model (every critical point resolved into elementary factors).
    pub fn smoothing(&self) -> Result<&Smoothing, LefschetzError> {
        memoised(&self.smoothing, || {
            Smoothing::new(
                &self.monodromy,
                &self.cycles,
                &self.infinity_loops,
                self.fibre_rank(),
            )
        })
    }

    /// Form on the smoothed homology; unimodular unless relaxed.
    pub fn smoothing_intersection_form(&self) -> Result<&IntMatrix, LefschetzError> {
        memoised(&self.smoothing_intersection_form, || {
            self.smoothing()?
                .intersection_form(&self.fibre_form, &self.cfg)
        })
    }

    /// Attach upstream thimble integrals (rows = forms, one column per thimble).
    /// Replaces earlier integrals and their cached periods.
    pub fn attach_thimble_integrals(
        &mut self,
        integrals: ComplexMatrix,
    ) -> Result<(), LefschetzError> {
        if integrals.ncols() != self.boundary.thimble_count() {
            return Err(LefschetzError::invalid(format!(
                "expected {} thimble integral columns, got {}",
                self.boundary.thimble_count(),
                integrals.ncols()
            )));
        }
        self.thimble_integrals = Some(integrals);
        self.period_matrix.take();
        Ok(())
    }

    #[inline]
    pub fn thimble_integrals(&self) -> Option<&ComplexMatrix> {
        self.thimble_integrals.as_ref()
    }

    /// Periods of the homology basis (`integrals · Hᵗ`).
    pub fn period_matrix(&self) -> Result<&ComplexMatrix, LefschetzError> {
        memoised(&self.period_matrix, || {
            let integrals = self
                .thimble_integrals
                .as_ref()
                .ok_or_else(|| LefschetzError::invalid("no thimble integrals attached"))?;
            periods::period_matrix(integrals, &self.homology.representatives)
        })
    }

    /// Drop numerical integration results; lattice results stay cached.
    pub fn forget_thimble_integrals(&mut self) {
        self.thimble_integrals = None;
        self.period_matrix.take();
    }
}

fn memoised<'a, T>(
    cell: &'a OnceCell<T>,
    compute: impl FnOnce() -> Result<T, LefschetzError>,
) -> Result<&'a T, LefschetzError> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = compute()?;
    Ok(cell.get_or_init(|| value))
}

fn validate(input: &FibrationInput, cfg: &FibrationCfg) -> Result<(), LefschetzError> {
    let f = &input.fibre_form;
    if !f.is_square() {
        return Err(LefschetzError::invalid(format!(
            "fibre form must be square, got {}x{}",
            f.nrows(),
            f.ncols()
        )));
    }
    if input.paths.len() != input.monodromy.len() {
        return Err(LefschetzError::invalid(format!(
            "{} paths for {} monodromy matrices",
            input.paths.len(),
            input.monodromy.len()
        )));
    }
    for (index, m) in input.monodromy.iter().enumerate() {
        if m.dim() != f.nrows() {
            return Err(LefschetzError::invalid(format!(
                "monodromy matrix {index} is {}x{}, fibre rank is {}",
                m.dim(),
                m.dim(),
                f.nrows()
            )));
        }
        if cfg.relaxed {
            continue;
        }
        let determinant = m.determinant()?;
        if determinant.unsigned_abs() != 1 {
            return Err(LefschetzError::NotUnimodular {
                index,
                determinant,
                matrix: m.matrix().clone(),
            });
        }
    }
    Ok(())
}
