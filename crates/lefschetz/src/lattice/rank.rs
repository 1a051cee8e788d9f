//! Incremental ℚ-rank of a growing set of integer rows.

use crate::error::LatticeError;
use num_integer::Integer;

/// Fraction-free echelon rows; [`RankTracker::insert`] reports whether a
/// vector raised the rank.
///
/// Invariants:
/// - Row `k` vanishes at the pivot of every earlier row, so reducing a candidate
///   against the rows in insertion order leaves zero iff it lies in their ℚ-span.
/// - Stored rows are primitive (content 1), which keeps entries small.
#[derive(Clone, Debug)]
pub struct RankTracker {
    dim: usize,
    rows: Vec<(usize, Vec<i128>)>,
}

impl RankTracker {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            rows: Vec::new(),
        }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.rows.len() == self.dim
    }

    pub fn contains(&self, v: &[i64]) -> Result<bool, LatticeError> {
        Ok(self.reduce(v)?.iter().all(|&x| x == 0))
    }

    /// Add `v`; returns `true` iff the rank grew by one.
    pub fn insert(&mut self, v: &[i64]) -> Result<bool, LatticeError> {
        let w = self.reduce(v)?;
        Ok(match w.iter().position(|&x| x != 0) {
            Some(pivot) => {
                self.rows.push((pivot, w));
                true
            }
            None => false,
        })
    }

    fn reduce(&self, v: &[i64]) -> Result<Vec<i128>, LatticeError> {
        debug_assert_eq!(v.len(), self.dim);
        let mut w: Vec<i128> = v.iter().map(|&x| i128::from(x)).collect();
        for (pivot, row) in &self.rows {
            let b = w[*pivot];
            if b == 0 {
                continue;
            }
            let a = row[*pivot];
            let g = a.gcd(&b);
            let (a, b) = (a / g, b / g);
            for (x, r) in w.iter_mut().zip(row) {
                *x = a
                    .checked_mul(*x)
                    .zip(b.checked_mul(*r))
                    .and_then(|(ax, br)| ax.checked_sub(br))
                    .ok_or(LatticeError::Overflow { op: "rank reduction" })?;
            }
            make_primitive(&mut w);
        }
        make_primitive(&mut w);
        Ok(w)
    }
}

fn make_primitive(w: &mut [i128]) {
    let c = w.iter().fold(0i128, |acc, x| acc.gcd(x));
    if c > 1 {
        for x in w.iter_mut() {
            *x /= c;
        }
    }
}
