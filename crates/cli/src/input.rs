//! JSON fibration descriptions and nested-list matrix conversions.

use anyhow::{bail, Context, Result};
use lefschetz::lattice::IntMatrix;
use lefschetz::monodromy::{MonodromyMatrix, Path as BasePath};
use lefschetz::{FibrationInput, FormParity};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Even,
    Odd,
}

impl From<Parity> for FormParity {
    fn from(p: Parity) -> Self {
        match p {
            Parity::Even => FormParity::Even,
            Parity::Odd => FormParity::Odd,
        }
    }
}

/// `{ "monodromy": [[[..]]], "paths": [[..]], "fibre_form": [[..]], "parity": "even" }`
#[derive(Debug, Deserialize)]
pub struct FibrationFile {
    pub monodromy: Vec<Vec<Vec<i64>>>,
    #[serde(default)]
    pub paths: Option<Vec<Vec<usize>>>,
    pub fibre_form: Vec<Vec<i64>>,
    #[serde(default)]
    pub parity: Option<Parity>,
}

impl FibrationFile {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn to_input(&self) -> Result<FibrationInput> {
        let monodromy = self
            .monodromy
            .iter()
            .enumerate()
            .map(|(i, rows)| -> Result<MonodromyMatrix> {
                let m = matrix_from_nested(rows).with_context(|| format!("monodromy matrix {i}"))?;
                Ok(MonodromyMatrix::new(m)?)
            })
            .collect::<Result<Vec<_>>>()?;
        let fibre_form = matrix_from_nested(&self.fibre_form).context("fibre_form")?;
        let input = FibrationInput::new(monodromy, fibre_form);
        Ok(match &self.paths {
            Some(paths) => input.with_paths(paths.iter().cloned().map(BasePath::new).collect()),
            None => input,
        })
    }
}

/// Parse `[[1, 3], [0, 1]]`.
pub fn parse_matrix(text: &str) -> Result<IntMatrix> {
    let rows: Vec<Vec<i64>> =
        serde_json::from_str(text).with_context(|| format!("parsing matrix {text}"))?;
    matrix_from_nested(&rows)
}

pub fn matrix_from_nested(rows: &[Vec<i64>]) -> Result<IntMatrix> {
    let ncols = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
        bail!("row {i} has {} entries, expected {ncols}", row.len());
    }
    Ok(IntMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j]))
}

pub fn nested(m: &IntMatrix) -> Vec<Vec<i64>> {
    (0..m.nrows())
        .map(|i| m.row(i).iter().copied().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fibration_file_with_defaults() {
        let file: FibrationFile = serde_json::from_str(
            r#"{"monodromy": [[[1, 1], [0, 1]], [[1, 0], [-1, 1]]], "fibre_form": [[0, 1], [-1, 0]]}"#,
        )
        .unwrap();
        assert_eq!(file.parity, None);
        let input = file.to_input().unwrap();
        assert_eq!(input.monodromy.len(), 2);
        assert_eq!(input.paths[1], BasePath::new(vec![1]));
        assert_eq!(nested(&input.fibre_form), vec![vec![0, 1], vec![-1, 0]]);
    }

    #[test]
    fn rejects_ragged_and_non_square() {
        assert!(parse_matrix("[[1, 2], [3]]").is_err());
        let file: FibrationFile = serde_json::from_str(
            r#"{"monodromy": [[[1, 1, 0], [0, 1, 0]]], "fibre_form": [[0]], "parity": "odd"}"#,
        )
        .unwrap();
        assert_eq!(file.parity, Some(Parity::Odd));
        assert!(file.to_input().is_err());
    }

    #[test]
    fn parse_matrix_reads_rows() {
        let m = parse_matrix("[[1, 3], [0, 1]]").unwrap();
        assert_eq!(m, IntMatrix::from_row_slice(2, 2, &[1, 3, 0, 1]));
    }
}
