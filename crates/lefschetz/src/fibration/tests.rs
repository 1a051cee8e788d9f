use super::*;
use crate::cfg::FormParity;
use crate::error::LatticeError;
use crate::lattice::{self, determinant, unit_vector};
use crate::rand::{elementary_a, elementary_b, standard_factorisation};
use nalgebra::{dvector, Complex};

fn m(n: usize, data: &[i64]) -> MonodromyMatrix {
    MonodromyMatrix::from_row_slice(n, data).unwrap()
}

fn torus_form() -> IntMatrix {
    IntMatrix::from_row_slice(2, 2, &[0, 1, -1, 0])
}

fn elliptic(ms: Vec<MonodromyMatrix>) -> Fibration {
    Fibration::new(FibrationInput::new(ms, torus_form()), FibrationCfg::default()).unwrap()
}

fn transposition(i: usize, j: usize) -> MonodromyMatrix {
    let mut t = IntMatrix::identity(3, 3);
    t[(i, i)] = 0;
    t[(j, j)] = 0;
    t[(i, j)] = 1;
    t[(j, i)] = 1;
    MonodromyMatrix::new(t).unwrap()
}

/// `[A, B, A², B, A, A, B, A, B, A, B]`: ten I1 fibres and one I2 fibre.
fn with_i2_fibre() -> Vec<MonodromyMatrix> {
    let (a, b) = (elementary_a(), elementary_b());
    let a2 = m(2, &[1, 2, 0, 1]);
    vec![
        a.clone(),
        b.clone(),
        a2,
        b.clone(),
        a.clone(),
        a.clone(),
        b.clone(),
        a.clone(),
        b.clone(),
        a,
        b,
    ]
}

fn assert_symmetric(f: &IntMatrix) {
    assert_eq!(f, &f.transpose());
}

#[test]
fn single_shear_is_closed_at_infinity() {
    let fib = elliptic(vec![elementary_a()]);
    assert!(fib.has_point_at_infinity());
    assert_eq!(fib.cycles()[0].permuting, vec![dvector![0, 1]]);
    assert_eq!(fib.cycles()[0].vanishing, vec![dvector![1, 0]]);
    assert_eq!(fib.monodromy_matrices()[1], m(2, &[1, -1, 0, 1]));
    assert_eq!(fib.extensions().nrows(), 1);
    assert!(fib.homology().is_empty());
}

#[test]
fn open_fibration_gets_a_point_at_infinity() {
    let input = FibrationInput::new(vec![elementary_a(), elementary_b()], torus_form())
        .with_paths(vec![Path::new(vec![0, 1]), Path::new(vec![1, 2])]);
    let fib = Fibration::new(input, FibrationCfg::default()).unwrap();
    assert!(fib.has_point_at_infinity());
    assert_eq!(fib.monodromy_matrices().len(), 3);
    assert_eq!(fib.monodromy_matrices()[2], m(2, &[0, -1, 1, 1]));
    assert_eq!(fib.paths()[2], Path::new(vec![2, 1, 0]));
    assert_eq!(fib.boundary().thimble_count(), 4);
    assert_eq!(fib.extensions().nrows(), 2);
    assert_eq!(
        fib.extensions(),
        &IntMatrix::from_row_slice(2, 4, &[1, 0, 1, 1, 0, 1, 0, 1])
    );
    assert_eq!(lattice::rank(fib.infinity_loops()).unwrap(), 2);
    assert!(fib.homology().is_empty());
    let thimbles = fib.thimbles();
    assert_eq!(thimbles.len(), 4);
    assert_eq!(thimbles[3].point, 2);
    assert_eq!(thimbles[3].path, Path::new(vec![2, 1, 0]));
}

#[test]
fn identity_point_has_no_thimbles() {
    let ms = vec![
        transposition(0, 1),
        MonodromyMatrix::identity(3),
        transposition(0, 1),
    ];
    let input = FibrationInput::new(ms, IntMatrix::identity(3, 3));
    let fib = Fibration::new(input, FibrationCfg::curve()).unwrap();
    assert!(!fib.has_point_at_infinity());
    assert!(fib.cycles()[1].is_empty());
    assert_eq!(fib.boundary().thimbles_of(1), 1..1);
    assert_eq!(fib.extensions().nrows(), 1);
    assert!(fib.homology().is_empty());
}

#[test]
fn rational_elliptic_surface_gives_e8() {
    let fib = elliptic(standard_factorisation(6));
    assert!(!fib.has_point_at_infinity());
    assert_eq!(fib.extensions().nrows(), 10);
    assert_eq!(lattice::rank(fib.infinity_loops()).unwrap(), 2);
    let h = fib.homology();
    assert_eq!(h.rank(), 8);
    assert_eq!(
        h.rank(),
        fib.extensions().nrows() - lattice::rank(fib.infinity_loops()).unwrap()
    );

    let form = fib.intersection_form().unwrap();
    assert_eq!(form.shape(), (10, 10));
    assert_symmetric(form);
    assert_eq!(determinant(form).unwrap(), -1);
    let e8 = form.view((0, 0), (8, 8)).into_owned();
    assert_eq!(determinant(&e8).unwrap(), 1);
    for i in 0..8 {
        assert_eq!(e8[(i, i)], -2);
    }
}

#[test]
fn k3_surface_from_twenty_four_shears() {
    let cfg = FibrationCfg {
        expect_unimodular: true,
        ..FibrationCfg::default()
    };
    let input = FibrationInput::new(standard_factorisation(12), torus_form());
    let fib = Fibration::new(input, cfg).unwrap();
    assert_eq!(fib.extensions().nrows(), 22);
    assert_eq!(fib.homology().rank(), 20);
    let form = fib.intersection_form().unwrap();
    assert_symmetric(form);
    assert_eq!(determinant(form).unwrap(), -1);
    assert!((0..form.nrows()).all(|i| form[(i, i)] % 2 == 0));
}

#[test]
fn derived_values_are_memoised_and_reproducible() {
    let fib = elliptic(standard_factorisation(6));
    let first = fib.intersection_form().unwrap();
    let second = fib.intersection_form().unwrap();
    assert!(std::ptr::eq(first, second));

    let again = elliptic(standard_factorisation(6));
    assert_eq!(again.homology(), fib.homology());
    assert_eq!(again.intersection_form().unwrap(), first);
    assert!(std::ptr::eq(
        fib.smoothing().unwrap(),
        fib.smoothing().unwrap()
    ));
}

#[test]
fn i2_fibre_direct_route_is_not_unimodular() {
    let fib = elliptic(with_i2_fibre());
    assert!(!fib.has_point_at_infinity());
    assert_eq!(fib.extensions().nrows(), 9);
    assert_eq!(fib.homology().rank(), 7);
    let form = fib.intersection_form().unwrap();
    assert_symmetric(form);
    assert_eq!(determinant(form).unwrap(), 2);

    let cfg = FibrationCfg {
        expect_unimodular: true,
        ..FibrationCfg::default()
    };
    let strict = Fibration::new(FibrationInput::new(with_i2_fibre(), torus_form()), cfg).unwrap();
    assert!(matches!(
        strict.intersection_form(),
        Err(LefschetzError::NonUnimodularIntersectionForm { determinant: 2, .. })
    ));
}

#[test]
fn i2_fibre_smoothing_restores_unimodularity() {
    let fib = elliptic(with_i2_fibre());
    let s = fib.smoothing().unwrap();
    assert_eq!(s.matrices()[2].len(), 2);
    assert_eq!(s.thimble_count(), 12);
    assert_eq!(s.confluence().shape(), (11, 12));
    let row: Vec<i64> = s.confluence().row(2).iter().copied().collect();
    assert_eq!(row, vec![0, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0]);
    let factors: Vec<&MonodromyMatrix> = s.matrices().iter().flatten().collect();
    let vanishing = s.vanishing_matrix();
    for (t, e) in factors.iter().enumerate() {
        assert_eq!(
            e.defect().unwrap() * &s.permuting()[t],
            lattice::row_vector(&vanishing, t)
        );
    }
    assert_eq!(s.homology().rank(), 8);

    let form = fib.smoothing_intersection_form().unwrap();
    assert_symmetric(form);
    assert_eq!(determinant(form).unwrap(), -1);
    for i in 0..8 {
        assert_eq!(form[(i, i)], -2);
    }

    let components = s.singular_components().unwrap();
    assert_eq!(components.len(), 11);
    for (i, c) in components.iter().enumerate() {
        assert_eq!(c.nrows(), usize::from(i == 2));
    }
    let trivial = s.trivial_lattice().unwrap();
    assert_eq!(trivial.shape(), (3, 10));
    let gram = &trivial * form * trivial.transpose();
    assert_eq!(
        gram,
        IntMatrix::from_row_slice(3, 3, &[-2, 0, 0, 0, 0, 1, 0, 1, -2])
    );
}

#[test]
fn smoothing_rejects_non_lefschetz_points() {
    let fib = elliptic(vec![elementary_a(), elementary_b()]);
    assert!(matches!(
        fib.smoothing(),
        Err(LefschetzError::UnexpectedSingularityType { index: 2, rank: 2, .. })
    ));
}

#[test]
fn cubic_curve_has_antisymmetric_form() {
    let (t01, t12) = (transposition(0, 1), transposition(1, 2));
    let ms = vec![
        t01.clone(),
        t01.clone(),
        t12.clone(),
        t12,
        t01.clone(),
        t01,
    ];
    let input = FibrationInput::new(ms, IntMatrix::identity(3, 3));
    let fib = Fibration::new(input, FibrationCfg::curve()).unwrap();
    assert_eq!(fib.extensions().nrows(), 4);
    assert_eq!(fib.homology().rank(), 2);
    let form = fib.intersection_form().unwrap();
    assert_eq!(form, &IntMatrix::from_row_slice(2, 2, &[0, 1, -1, 0]));

    let ms = vec![
        transposition(0, 1),
        transposition(1, 2),
        transposition(0, 2),
        transposition(0, 1),
        transposition(1, 2),
        transposition(0, 2),
    ];
    let input = FibrationInput::new(ms, IntMatrix::identity(3, 3));
    let fib = Fibration::new(input, FibrationCfg::curve()).unwrap();
    let form = fib.intersection_form().unwrap();
    assert_eq!(form, &IntMatrix::from_row_slice(2, 2, &[0, -1, 1, 0]));
    assert_eq!(form, &-form.transpose());
}

#[test]
fn odd_parity_appends_the_symplectic_block() {
    let cfg = FibrationCfg {
        parity: FormParity::Odd,
        ..FibrationCfg::default()
    };
    let ms = vec![transposition(0, 1); 2];
    let input = FibrationInput::new(ms, IntMatrix::identity(3, 3));
    let fib = Fibration::new(input, cfg).unwrap();
    assert!(fib.homology().is_empty());
    assert_eq!(fib.intersection_form().unwrap(), &FormParity::Odd.block());
}

#[test]
fn invalid_inputs_are_rejected() {
    let err = Fibration::new(
        FibrationInput::new(vec![m(2, &[2, 0, 0, 1])], torus_form()),
        FibrationCfg::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        LefschetzError::NotUnimodular { index: 0, determinant: 2, .. }
    ));

    let err = Fibration::new(
        FibrationInput::new(vec![elementary_a(), MonodromyMatrix::identity(3)], torus_form()),
        FibrationCfg::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LefschetzError::InvalidInput { .. }));

    let err = Fibration::new(
        FibrationInput::new(vec![elementary_a()], torus_form()).with_paths(vec![]),
        FibrationCfg::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LefschetzError::InvalidInput { .. }));

    let hypersurface = FibrationCfg {
        allow_singular_fibres: false,
        ..FibrationCfg::default()
    };
    let err = Fibration::new(
        FibrationInput::new(vec![elementary_a(), elementary_b()], torus_form()),
        hypersurface,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        LefschetzError::UnexpectedSingularityType { index: 2, rank: 2, .. }
    ));
}

#[test]
fn periods_follow_attached_integrals() {
    let mut fib = elliptic(standard_factorisation(6));
    assert!(fib.period_matrix().is_err());
    let thimbles = fib.boundary().thimble_count();
    let integrals = ComplexMatrix::from_fn(1, thimbles, |_, j| Complex::new(j as f64, 1.0));
    fib.attach_thimble_integrals(integrals).unwrap();
    let periods = fib.period_matrix().unwrap().clone();
    assert_eq!(periods.shape(), (1, 8));
    let h0 = &fib.homology().representatives;
    let expected: Complex<f64> = (0..thimbles)
        .map(|j| Complex::new(j as f64, 1.0) * h0[(0, j)] as f64)
        .sum();
    assert!((periods[(0, 0)] - expected).norm() < 1e-9);

    let homology = fib.homology().clone();
    fib.forget_thimble_integrals();
    assert!(fib.thimble_integrals().is_none());
    assert!(fib.period_matrix().is_err());
    assert_eq!(fib.homology(), &homology);

    assert!(fib
        .attach_thimble_integrals(ComplexMatrix::zeros(1, thimbles + 1))
        .is_err());
}

#[test]
fn loops_are_closed_and_homology_is_closed() {
    let fib = elliptic(with_i2_fibre());
    let bm = fib.boundary();
    for i in 0..fib.infinity_loops().nrows() {
        let l = lattice::row_vector(fib.infinity_loops(), i);
        assert_eq!(bm.apply(&l).unwrap(), dvector![0, 0]);
    }
    let h = &fib.homology().representatives;
    for i in 0..h.nrows() {
        assert_eq!(bm.apply(&lattice::row_vector(h, i)).unwrap(), dvector![0, 0]);
    }
    assert_eq!(
        bm.apply(&unit_vector(bm.thimble_count(), 2)).unwrap(),
        dvector![2, 0]
    );
}

/// `[A, B]^6` conjugated by `g`; Hurwitz-equivalent data for the same surface.
fn conjugated_e8(g: &MonodromyMatrix) -> Vec<MonodromyMatrix> {
    standard_factorisation(6)
        .iter()
        .map(|m| g.conjugate(m).unwrap())
        .collect()
}

#[test]
fn large_conjugated_entries_keep_the_e8_answer() {
    let g = m(2, &[1, 1, 1, 2]).pow(10).unwrap();
    let fib = elliptic(conjugated_e8(&g));
    assert!(!fib.has_point_at_infinity());
    assert_eq!(fib.homology().rank(), 8);
    assert_eq!(determinant(fib.intersection_form().unwrap()).unwrap(), -1);
}

#[test]
fn entries_near_the_i64_limit_fail_without_panicking() {
    // Conjugates have entries around 1e12; their products leave i64 before they telescope.
    let g = m(2, &[1, 1, 1, 2]).pow(15).unwrap();
    let input = FibrationInput::new(conjugated_e8(&g), torus_form());
    match Fibration::new(input, FibrationCfg::default()) {
        Ok(fib) => assert_eq!(fib.homology().rank(), 8),
        Err(e) => assert!(
            matches!(e, LefschetzError::Lattice(LatticeError::Overflow { .. })),
            "{e}"
        ),
    }

    let huge = m(2, &[1, 1 << 62, 0, 1]);
    let err = Fibration::new(
        FibrationInput::new(vec![huge.clone(), huge], torus_form()),
        FibrationCfg::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        LefschetzError::Lattice(LatticeError::Overflow {
            op: "matrix product"
        })
    ));
}
