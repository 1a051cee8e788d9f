//! Resolution of a singular fibre into elementary (I1-type) factors.
//!
//! A point with `rank(M - I) = 1` and image generator `v` of content `g` is
//! replaced by `g` copies of `E = (M - I) / g + I`. The product of the copies
//! must reproduce `M`; when it does not the fibre is not of the supported type
//! and the point is reported as a `DecompositionMismatch`.

use crate::cycles::vanishing_generator;
use crate::error::LefschetzError;
use crate::lattice::{self, content, IntMatrix};
use crate::monodromy::{total_monodromy, MonodromyMatrix};
use rayon::prelude::*;

/// Elementary factors of critical point `index`, in traversal order.
/// The identity yields an empty list.
pub fn decompose(
    index: usize,
    m: &MonodromyMatrix,
) -> Result<Vec<MonodromyMatrix>, LefschetzError> {
    let defect = m.defect()?;
    let rank = lattice::rank(&defect)?;
    if rank == 0 {
        return Ok(Vec::new());
    }
    let generator = match vanishing_generator(&defect)? {
        Some(v) if rank == 1 => v,
        _ => {
            return Err(LefschetzError::UnexpectedSingularityType {
                index,
                rank,
                matrix: m.matrix().clone(),
            })
        }
    };
    let g = content(generator.iter());
    // Every column of a rank-1 defect is a multiple of the generator, so the division is exact.
    let elementary = defect.map(|x| x / g) + IntMatrix::identity(m.dim(), m.dim());
    let factor = MonodromyMatrix::new(elementary)?;
    let parts = vec![factor; g as usize];
    let product = total_monodromy(&parts, m.dim())?;
    if &product != m {
        return Err(LefschetzError::DecompositionMismatch {
            index,
            matrix: m.matrix().clone(),
            product: product.into_inner(),
        });
    }
    Ok(parts)
}

/// [`decompose`] for every critical point, in parallel, collected in order.
pub fn decompose_all(
    ms: &[MonodromyMatrix],
) -> Result<Vec<Vec<MonodromyMatrix>>, LefschetzError> {
    ms.par_iter()
        .enumerate()
        .map(|(i, m)| decompose(i, m))
        .collect()
}
