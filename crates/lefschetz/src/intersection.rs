//! Intersection pairing on thimbles and its projection onto homology.
//!
//! Rule for thimbles `i`, `j` with boundaries `dᵢ = (Mᵢ - I) · pᵢ` and fibre form `F`:
//! - `i < j`: `dᵢ · F · dⱼ`
//! - `i == j`: `-pᵢ · F · dᵢ`
//! - `i > j`: `0`
//!
//! The order along the base decides the asymmetry; the projected form
//! `sign · H · T · Hᵗ` is symmetric (even parity) or antisymmetric (odd parity)
//! on closed cycles.

use crate::cfg::{FibrationCfg, FormParity};
use crate::error::{LatticeError, LefschetzError};
use crate::lattice::{
    bilinear, block_diagonal, checked_mul, checked_scale, determinant, negate, IntMatrix,
    IntVector,
};

/// Thimble-indexed pairing (upper triangular plus diagonal).
pub fn thimble_form(
    permuting: &[IntVector],
    boundaries: &[IntVector],
    fibre_form: &IntMatrix,
) -> Result<IntMatrix, LatticeError> {
    debug_assert_eq!(permuting.len(), boundaries.len());
    let r = permuting.len();
    let mut t = IntMatrix::zeros(r, r);
    for i in 0..r {
        for j in i..r {
            t[(i, j)] = if i == j {
                negate(bilinear(&permuting[i], fibre_form, &boundaries[i])?)?
            } else {
                bilinear(&boundaries[i], fibre_form, &boundaries[j])?
            };
        }
    }
    Ok(t)
}

/// `sign · H · T · Hᵗ` for homology rows `H` in thimble coordinates.
pub fn project(
    thimble_form: &IntMatrix,
    homology: &IntMatrix,
    parity: FormParity,
) -> Result<IntMatrix, LatticeError> {
    let ht = checked_mul(homology, thimble_form)?;
    checked_scale(&checked_mul(&ht, &homology.transpose())?, parity.sign())
}

/// `form ⊕ parity.block()`.
pub fn extend_with_block(form: &IntMatrix, parity: FormParity) -> IntMatrix {
    block_diagonal(&[form.clone(), parity.block()])
}

/// Fails with `NonUnimodularIntersectionForm` unless `|det form| = 1`.
pub fn check_unimodular(form: &IntMatrix) -> Result<(), LefschetzError> {
    let det = determinant(form)?;
    if det.unsigned_abs() != 1 {
        return Err(LefschetzError::NonUnimodularIntersectionForm {
            determinant: det,
            form: form.clone(),
        });
    }
    Ok(())
}

/// Projected (and, per `cfg`, block-extended) form; checked unimodular when
/// `check` is set and `cfg` is not relaxed.
pub fn intersection_form(
    thimble_form: &IntMatrix,
    homology: &IntMatrix,
    cfg: &FibrationCfg,
    check: bool,
) -> Result<IntMatrix, LefschetzError> {
    let projected = project(thimble_form, homology, cfg.parity)?;
    let form = if cfg.extend_with_block {
        extend_with_block(&projected, cfg.parity)
    } else {
        projected
    };
    if check && !cfg.relaxed {
        check_unimodular(&form)?;
    }
    Ok(form)
}
