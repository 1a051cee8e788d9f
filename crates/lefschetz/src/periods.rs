//! Periods: thimble integrals paired with the homology basis.
//!
//! The integrals come from an upstream numerical integrator (rows = forms,
//! columns = thimbles). This module only checks shapes and multiplies.

use crate::error::LefschetzError;
use crate::lattice::IntMatrix;
use nalgebra::{Complex, DMatrix};

pub type ComplexMatrix = DMatrix<Complex<f64>>;

/// `integrals · Hᵗ` (forms × homology classes).
pub fn period_matrix(
    integrals: &ComplexMatrix,
    homology: &IntMatrix,
) -> Result<ComplexMatrix, LefschetzError> {
    if integrals.ncols() != homology.ncols() {
        return Err(LefschetzError::invalid(format!(
            "thimble integrals have {} columns, homology has {} thimble coordinates",
            integrals.ncols(),
            homology.ncols()
        )));
    }
    let h = homology.map(|x| Complex::new(x as f64, 0.0));
    Ok(integrals * h.transpose())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periods_sum_thimble_integrals() {
        let integrals = ComplexMatrix::from_row_slice(
            1,
            3,
            &[
                Complex::new(1.0, 0.5),
                Complex::new(0.0, 2.0),
                Complex::new(-1.0, 0.0),
            ],
        );
        let h = IntMatrix::from_row_slice(2, 3, &[1, 0, 1, 0, 2, 0]);
        let p = period_matrix(&integrals, &h).unwrap();
        assert_eq!(p.shape(), (1, 2));
        assert!((p[(0, 0)] - Complex::new(0.0, 0.5)).norm() < 1e-12);
        assert!((p[(0, 1)] - Complex::new(0.0, 4.0)).norm() < 1e-12);
        assert!(period_matrix(&integrals, &IntMatrix::zeros(1, 2)).is_err());
    }
}
