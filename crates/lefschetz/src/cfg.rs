//! Pipeline configuration.
//!
//! Policy
//! - Defaults are the strict production settings. `relaxed` is the documented
//!   debug mode for inspecting intermediate non-integral results; it is never on
//!   by default.

use crate::lattice::IntMatrix;

/// Parity of the middle-dimensional intersection form of the total space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FormParity {
    /// Symmetric form (surfaces). Projection sign `-1`, block `[[0,1],[1,-2]]`.
    #[default]
    Even,
    /// Antisymmetric form (curves). Projection sign `+1`, block `[[0,1],[-1,0]]`.
    Odd,
}

impl FormParity {
    /// Sign applied to `H · T · Hᵗ` when projecting the thimble form.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Self::Even => -1,
            Self::Odd => 1,
        }
    }

    /// Rank-2 block carrying the fibre class and an auxiliary section.
    pub fn block(self) -> IntMatrix {
        match self {
            Self::Even => IntMatrix::from_row_slice(2, 2, &[0, 1, 1, -2]),
            Self::Odd => IntMatrix::from_row_slice(2, 2, &[0, 1, -1, 0]),
        }
    }
}

/// Knobs of the homology reconstruction.
///
/// Invariants:
/// - `relaxed` only removes checks; it never changes a successful result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FibrationCfg {
    /// Skip the unimodularity checks on inputs and forms and the defect-rank assertions.
    pub relaxed: bool,
    /// Accept critical points with `rank(M - I) > 1`. When `false` (Lefschetz
    /// hypersurface mode) such points are rejected.
    pub allow_singular_fibres: bool,
    pub parity: FormParity,
    /// Append the parity block to the projected form.
    pub extend_with_block: bool,
    /// Require `|det| = 1` for the directly assembled intersection form.
    pub expect_unimodular: bool,
}

impl Default for FibrationCfg {
    fn default() -> Self {
        Self {
            relaxed: false,
            allow_singular_fibres: true,
            parity: FormParity::Even,
            extend_with_block: true,
            expect_unimodular: false,
        }
    }
}

impl FibrationCfg {
    /// Settings for a fibred curve: odd parity, no block.
    pub fn curve() -> Self {
        Self {
            parity: FormParity::Odd,
            extend_with_block: false,
            ..Self::default()
        }
    }

    /// Debug mode: skip the unimodularity and defect-rank assertions.
    pub fn relaxed() -> Self {
        Self {
            relaxed: true,
            ..Self::default()
        }
    }
}
