//! Reproducible monodromy fixtures.
//!
//! Purpose
//! - Provide elliptic fibrations with known answers for tests, benches and demos.
//! - Start from the standard I1 factorisation `[A, B]^k` (`(BA)^6 = I`, so
//!   `k = 6` is a rational elliptic surface and `k = 12` a K3 surface), scramble
//!   it by Hurwitz moves and optionally merge equal neighbours into `I_n` fibres.
//!   Both operations keep the total monodromy.
//!
//! Why this design
//! - Every sample carries its params and a seed replay token; `regenerate`
//!   rebuilds the identical sequence from the token.
//! - `FibrationGenerator` exposes streaming (`generate_next`) and replay
//!   (`regenerate`) so callers can take either path.
//!
//! References
//! - Code cross-refs: `monodromy::total_monodromy`, `fibration::Fibration`

use crate::error::LefschetzError;
use crate::monodromy::MonodromyMatrix;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// `A = [[1, 1], [0, 1]]`.
pub fn elementary_a() -> MonodromyMatrix {
    MonodromyMatrix::from_2x2([[1, 1], [0, 1]])
}

/// `B = [[1, 0], [-1, 1]]`.
pub fn elementary_b() -> MonodromyMatrix {
    MonodromyMatrix::from_2x2([[1, 0], [-1, 1]])
}

/// `[A, B]` repeated `copies` times.
pub fn standard_factorisation(copies: usize) -> Vec<MonodromyMatrix> {
    let (a, b) = (elementary_a(), elementary_b());
    (0..copies).flat_map(|_| [a.clone(), b.clone()]).collect()
}

/// `[…, M₁, M₂, …] → […, M₂, M₂ · M₁ · M₂⁻¹, …]` at positions `i`, `i + 1`.
pub fn hurwitz_move(ms: &mut [MonodromyMatrix], i: usize) -> Result<(), LefschetzError> {
    if i + 1 >= ms.len() {
        return Err(LefschetzError::invalid(format!(
            "hurwitz move at {i} needs two matrices, have {}",
            ms.len()
        )));
    }
    let conjugated = ms[i + 1].conjugate(&ms[i])?;
    ms[i] = ms[i + 1].clone();
    ms[i + 1] = conjugated;
    Ok(())
}

/// Merge every run of equal neighbours into a single power (`[M, M, M] → [M³]`).
pub fn merge_equal_neighbours(
    ms: Vec<MonodromyMatrix>,
) -> Result<Vec<MonodromyMatrix>, LefschetzError> {
    merge_with(ms, |_| true)
}

fn merge_with(
    ms: Vec<MonodromyMatrix>,
    mut accept: impl FnMut(&MonodromyMatrix) -> bool,
) -> Result<Vec<MonodromyMatrix>, LefschetzError> {
    let mut out: Vec<(MonodromyMatrix, MonodromyMatrix)> = Vec::with_capacity(ms.len());
    for m in ms {
        if let Some((base, power)) = out.last_mut() {
            if *base == m && accept(&m) {
                *power = m.compose(power)?;
                continue;
            }
        }
        out.push((m.clone(), m));
    }
    Ok(out.into_iter().map(|(_, power)| power).collect())
}

/// Parameters of [`HurwitzFibrationGenerator`].
#[derive(Clone, Debug, PartialEq)]
pub struct HurwitzParams {
    /// Copies of `[A, B]`.
    pub copies: usize,
    pub moves: usize,
    /// Probability of merging a pair of equal neighbours.
    pub merge_probability: f64,
}

impl Default for HurwitzParams {
    fn default() -> Self {
        Self {
            copies: 6,
            moves: 16,
            merge_probability: 0.5,
        }
    }
}

impl HurwitzParams {
    fn validate(&self) -> Result<(), LefschetzError> {
        if self.copies == 0 {
            return Err(LefschetzError::invalid("need at least one copy of [A, B]"));
        }
        if !(0.0..=1.0).contains(&self.merge_probability) {
            return Err(LefschetzError::invalid("merge_probability must lie in [0, 1]"));
        }
        Ok(())
    }
}

/// Replay token storing the seed that regenerates the same sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedReplay {
    pub seed: u64,
}

/// A monodromy sequence plus replay metadata.
#[derive(Clone, Debug)]
pub struct FibrationSample<P, R> {
    pub monodromy: Vec<MonodromyMatrix>,
    pub params: P,
    pub replay: R,
}

/// Common trait for reproducible monodromy sources.
pub trait FibrationGenerator {
    type Params: Clone;
    type Replay: Clone;

    fn params(&self) -> &Self::Params;

    fn generate_next(
        &mut self,
    ) -> Result<FibrationSample<Self::Params, Self::Replay>, LefschetzError>;

    fn regenerate(&self, replay: &Self::Replay) -> Result<Vec<MonodromyMatrix>, LefschetzError>;
}

/// Seeded stream of Hurwitz-equivalent elliptic fibrations.
pub struct HurwitzFibrationGenerator {
    params: HurwitzParams,
    master_rng: StdRng,
}

impl HurwitzFibrationGenerator {
    pub fn new(params: HurwitzParams, seed: u64) -> Result<Self, LefschetzError> {
        params.validate()?;
        Ok(Self {
            params,
            master_rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn generate_single(
        params: &HurwitzParams,
        seed: u64,
    ) -> Result<Vec<MonodromyMatrix>, LefschetzError> {
        params.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut ms = standard_factorisation(params.copies);
        for _ in 0..params.moves {
            let i = rng.gen_range(0..ms.len() - 1);
            hurwitz_move(&mut ms, i)?;
        }
        merge_with(ms, |_| rng.gen_bool(params.merge_probability))
    }
}

impl FibrationGenerator for HurwitzFibrationGenerator {
    type Params = HurwitzParams;
    type Replay = SeedReplay;

    fn params(&self) -> &Self::Params {
        &self.params
    }

    fn generate_next(
        &mut self,
    ) -> Result<FibrationSample<Self::Params, Self::Replay>, LefschetzError> {
        let sample_seed = self.master_rng.next_u64();
        Ok(FibrationSample {
            monodromy: Self::generate_single(&self.params, sample_seed)?,
            params: self.params.clone(),
            replay: SeedReplay { seed: sample_seed },
        })
    }

    fn regenerate(&self, replay: &Self::Replay) -> Result<Vec<MonodromyMatrix>, LefschetzError> {
        Self::generate_single(&self.params, replay.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::FibrationCfg;
    use crate::error::LatticeError;
    use crate::fibration::{Fibration, FibrationInput};
    use crate::lattice::{self, determinant, stack, IntMatrix};
    use crate::monodromy::total_monodromy;
    use proptest::prelude::*;

    fn torus_form() -> IntMatrix {
        IntMatrix::from_row_slice(2, 2, &[0, 1, -1, 0])
    }

    fn is_overflow(e: &LefschetzError) -> bool {
        matches!(e, LefschetzError::Lattice(LatticeError::Overflow { .. }))
    }

    #[test]
    fn standard_factorisation_closes_after_six_copies() {
        let half = total_monodromy(&standard_factorisation(3), 2).unwrap();
        assert!(total_monodromy(&standard_factorisation(6), 2).unwrap().is_identity());
        assert!(!half.is_identity());
        assert!(half.compose(&half).unwrap().is_identity());
    }

    #[test]
    fn hurwitz_move_swaps_and_conjugates() {
        let mut ms = vec![elementary_a(), elementary_b()];
        let before = total_monodromy(&ms, 2).unwrap();
        hurwitz_move(&mut ms, 0).unwrap();
        assert_eq!(ms[0], elementary_b());
        assert_eq!(ms[1], elementary_b().conjugate(&elementary_a()).unwrap());
        assert_eq!(total_monodromy(&ms, 2).unwrap(), before);
        assert!(hurwitz_move(&mut ms, 1).is_err());
    }

    #[test]
    fn hurwitz_move_reports_overflow() {
        let mut ms = vec![
            MonodromyMatrix::from_2x2([[1, 0], [1 << 40, 1]]),
            MonodromyMatrix::from_2x2([[1, 1 << 40], [0, 1]]),
        ];
        let err = hurwitz_move(&mut ms, 0).unwrap_err();
        assert!(is_overflow(&err), "{err}");
    }

    #[test]
    fn long_move_sequences_never_panic() {
        let params = HurwitzParams {
            copies: 12,
            moves: 200,
            ..HurwitzParams::default()
        };
        for seed in 0..4 {
            match HurwitzFibrationGenerator::generate_single(&params, seed) {
                Ok(ms) => match total_monodromy(&ms, 2) {
                    Ok(total) => assert!(total.is_identity()),
                    Err(e) => assert!(is_overflow(&LefschetzError::from(e))),
                },
                Err(e) => assert!(is_overflow(&e), "seed {seed}: {e}"),
            }
        }
    }

    #[test]
    fn merging_builds_powers() {
        let a = elementary_a();
        let merged =
            merge_equal_neighbours(vec![a.clone(), a.clone(), a.clone(), elementary_b()]).unwrap();
        assert_eq!(merged, vec![a.pow(3).unwrap(), elementary_b()]);
    }

    #[test]
    fn generator_replays_from_seed() {
        let mut g = HurwitzFibrationGenerator::new(HurwitzParams::default(), 7).unwrap();
        let s1 = g.generate_next().unwrap();
        let s2 = g.generate_next().unwrap();
        assert_ne!(s1.replay, s2.replay);
        assert_eq!(s1.params, *g.params());
        assert_eq!(g.regenerate(&s1.replay).unwrap(), s1.monodromy);
        assert!(total_monodromy(&s1.monodromy, 2).unwrap().is_identity());

        let bad = HurwitzParams {
            merge_probability: 1.5,
            ..HurwitzParams::default()
        };
        assert!(HurwitzFibrationGenerator::new(bad, 0).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn hurwitz_equivalent_surfaces_share_invariants(seed in any::<u64>()) {
            let ms = HurwitzFibrationGenerator::generate_single(&HurwitzParams::default(), seed)
                .unwrap();
            prop_assert!(total_monodromy(&ms, 2).unwrap().is_identity());
            let fib = Fibration::new(FibrationInput::new(ms, torus_form()), FibrationCfg::default())
                .unwrap();
            let loops_rank = lattice::rank(fib.infinity_loops()).unwrap();
            let h = fib.homology();
            prop_assert_eq!(h.rank(), fib.extensions().nrows() - loops_rank);
            // Homology and loops together span every extension.
            let spanned = stack(&h.representatives, fib.infinity_loops());
            prop_assert!(lattice::solve_left(&spanned, fib.extensions()).is_ok());

            let direct = fib.intersection_form().unwrap().clone();
            prop_assert_eq!(&direct, &direct.transpose());
            prop_assert_eq!(fib.intersection_form().unwrap(), &direct);

            let smoothed = fib.smoothing_intersection_form().unwrap();
            prop_assert_eq!(smoothed.shape(), (10, 10));
            prop_assert_eq!(smoothed, &smoothed.transpose());
            prop_assert_eq!(determinant(smoothed).unwrap().abs(), 1);
            prop_assert_eq!(fib.smoothing().unwrap().homology().rank(), 8);
        }
    }
}
