//! Homology of two elliptic surfaces from their monodromy.
//!
//! Purpose
//! - Show the full pipeline on inputs with known answers: a K3 surface from 24
//!   I1 fibres (`[A, B]^12`) and a rational elliptic surface with one I2 fibre.
//! - Print ranks, determinants and timings as a quick sanity check.
//!
//! Run with `cargo run --release -p lefschetz --example k3_fibration`.

use std::time::Instant;

use lefschetz::lattice::{determinant, rows_repr, IntMatrix};
use lefschetz::prelude::*;
use lefschetz::rand::{elementary_a, elementary_b, standard_factorisation};

fn torus_form() -> IntMatrix {
    IntMatrix::from_row_slice(2, 2, &[0, 1, -1, 0])
}

fn main() -> Result<(), LefschetzError> {
    let start = Instant::now();
    let cfg = FibrationCfg {
        expect_unimodular: true,
        ..FibrationCfg::default()
    };
    let k3 = Fibration::new(
        FibrationInput::new(standard_factorisation(12), torus_form()),
        cfg,
    )?;
    let form = k3.intersection_form()?;
    println!(
        "K3: thimbles={} extensions={} homology={} form={}x{} det={} ({:.1} ms)",
        k3.boundary().thimble_count(),
        k3.extensions().nrows(),
        k3.homology().rank(),
        form.nrows(),
        form.ncols(),
        determinant(form)?,
        start.elapsed().as_secs_f64() * 1e3
    );

    // [A, B, A², B, A, A, B, A, B, A, B]: ten I1 fibres and one I2 fibre.
    let (a, b) = (elementary_a(), elementary_b());
    let ms = vec![
        a.clone(),
        b.clone(),
        a.pow(2)?,
        b.clone(),
        a.clone(),
        a.clone(),
        b.clone(),
        a.clone(),
        b.clone(),
        a,
        b,
    ];
    let rational = Fibration::new(FibrationInput::new(ms, torus_form()), FibrationCfg::default())?;
    let smoothing = rational.smoothing()?;
    let smoothed_form = rational.smoothing_intersection_form()?;
    println!(
        "rational: points={} smoothed thimbles={} homology={} det={}",
        rational.monodromy_matrices().len(),
        smoothing.thimble_count(),
        smoothing.homology().rank(),
        determinant(smoothed_form)?
    );
    println!("trivial lattice: {}", rows_repr(&smoothing.trivial_lattice()?));
    Ok(())
}
