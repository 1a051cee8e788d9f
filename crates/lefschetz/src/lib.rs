//! Homology of Lefschetz fibrations from monodromy data.
//!
//! Input: one integer monodromy matrix per critical value (acting on the
//! homology lattice of a regular fibre), a path per critical value and the
//! intersection form of the fibre. Output: a ℤ-basis of the homology of the
//! total space in thimble coordinates, its intersection form, and for
//! elliptic surfaces the smoothed model with its trivial lattice.
//!
//! Pipeline
//! - `lattice`: exact integer algebra (Smith and Hermite forms, kernels, solves).
//! - `cycles` → `boundary` → `quotient` → `intersection`, sequenced by
//!   [`fibration::Fibration`].
//! - `resolve` + `smoothing`: resolution of singular fibres into elementary
//!   factors.
//! - `periods`: pairing of upstream thimble integrals with the homology basis.
//! - `rand`: seeded Hurwitz-equivalent fixtures.
//!
//! API Policy
//! - This crate is project-internal. There is no stable public API.

pub mod boundary;
pub mod cfg;
pub mod cycles;
pub mod error;
pub mod fibration;
pub mod intersection;
pub mod lattice;
pub mod monodromy;
pub mod periods;
pub mod quotient;
pub mod rand;
pub mod resolve;
pub mod smoothing;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cfg::{FibrationCfg, FormParity};
pub use error::{LatticeError, LefschetzError};
pub use fibration::{Fibration, FibrationInput};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::boundary::{BoundaryMap, Thimble};
    pub use crate::cfg::{FibrationCfg, FormParity};
    pub use crate::cycles::CriticalCycles;
    pub use crate::error::{LatticeError, LefschetzError};
    pub use crate::fibration::{Fibration, FibrationInput};
    pub use crate::lattice::{IntMatrix, IntVector, SmithForm};
    pub use crate::monodromy::{total_monodromy, MonodromyMatrix, Path};
    pub use crate::periods::ComplexMatrix;
    pub use crate::quotient::QuotientBasis;
    pub use crate::rand::{
        FibrationGenerator, HurwitzFibrationGenerator, HurwitzParams, SeedReplay,
    };
    pub use crate::smoothing::Smoothing;
}
