// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use lsm_reinit::{
    compute_reinit_rhs, Field, GridBox, ReinitError, ReinitInputs, ReinitKernel, SignFunction,
    SignMode,
};

/// Level set sampled on a ghosted grid over the unit cube, with one-sided
/// differences evaluated from the same function at neighboring points.
struct Sampled<const N: usize> {
    phi: Field<f64, N>,
    plus: Vec<Field<f64, N>>,
    minus: Vec<Field<f64, N>>,
    h: f64,
    ghost: usize,
}

impl<const N: usize> Sampled<N> {
    /// `deriv_ghost` may be smaller than `ghost`; derivative arrays then
    /// cover a box centered inside phi's.
    fn new(n: usize, ghost: usize, deriv_ghost: usize, f: impl Fn([f64; N]) -> f64) -> Self {
        let h = 1.0 / n as f64;
        let at = |idx: [i64; N], shift: i64| -> [f64; N] {
            std::array::from_fn(|d| (idx[d] + shift - ghost as i64) as f64 * h)
        };

        let phi = Field::from_fn(GridBox::from_shape([n + 2 * ghost; N]), |idx| f(at(idx, 0)));

        let deriv_box = GridBox::from_shape([n + 2 * deriv_ghost; N]);
        let shift = (ghost - deriv_ghost) as i64;
        let one_sided = |d: usize, forward: bool| {
            Field::from_fn(deriv_box, |idx| {
                let x = at(idx, shift);
                let mut y = x;
                if forward {
                    y[d] += h;
                    (f(y) - f(x)) / h
                } else {
                    y[d] -= h;
                    (f(x) - f(y)) / h
                }
            })
        };
        let plus = (0..N).map(|d| one_sided(d, true)).collect();
        let minus = (0..N).map(|d| one_sided(d, false)).collect();

        Sampled {
            phi,
            plus,
            minus,
            h,
            ghost,
        }
    }

    fn inputs<'a>(&'a self, sign_mode: SignMode<'a, f64, N>) -> ReinitInputs<'a, f64, N> {
        ReinitInputs::new(
            self.phi.view(),
            self.ghost,
            std::array::from_fn(|d| self.plus[d].view()),
            std::array::from_fn(|d| self.minus[d].view()),
            [self.h; N],
            sign_mode,
        )
        .unwrap()
    }

    fn coord(&self, idx: [i64; N]) -> [f64; N] {
        std::array::from_fn(|d| (idx[d] - self.ghost as i64) as f64 * self.h)
    }
}

fn sphere_distance<const N: usize>(x: [f64; N]) -> f64 {
    x.iter().map(|&v| (v - 0.5).powi(2)).sum::<f64>().sqrt() - 0.25
}

fn distance_to_center<const N: usize>(x: [f64; N]) -> f64 {
    sphere_distance(x) + 0.25
}

/// Largest |RHS| over fill cells at least `margin` from the sphere's center.
fn max_residual<const N: usize>(s: &Sampled<N>, rhs: &Field<f64, N>, margin: f64) -> f64 {
    let inputs = s.inputs(SignMode::Phi);
    inputs
        .fill_box()
        .indices()
        .filter(|&idx| distance_to_center(s.coord(idx)) > margin)
        .map(|idx| rhs.get(idx).abs())
        .fold(0.0, f64::max)
}

/// Test 1: Signed distance in 1D.
/// phi = |x - 0.5| - 0.25 is piecewise linear, so one-sided differences are
/// exact away from the kink and the right-hand side vanishes there.
#[test]
fn signed_distance_1d_is_steady() {
    let s = Sampled::<1>::new(64, 2, 2, sphere_distance);
    let rhs = ReinitKernel::new().compute(&s.inputs(SignMode::Phi)).unwrap();

    let inputs = s.inputs(SignMode::Phi);
    for idx in inputs.fill_box().indices() {
        if distance_to_center(s.coord(idx)) > 1.5 * s.h {
            assert!(
                rhs.get(idx).abs() < 1e-9,
                "cell {:?}: rhs = {}",
                idx,
                rhs.get(idx)
            );
        }
    }
}

/// Test 2: Circle signed distance in 2D.
/// Away from the center the residual is first order in h.
#[test]
fn circle_signed_distance_2d_is_nearly_steady() {
    let run = |n: usize| -> (f64, f64) {
        let s = Sampled::<2>::new(n, 3, 3, sphere_distance);
        let rhs = ReinitKernel::new().compute(&s.inputs(SignMode::Phi)).unwrap();
        (max_residual(&s, &rhs, 0.1), s.h)
    };

    let (err_coarse, h_coarse) = run(64);
    let (err_fine, h_fine) = run(128);

    assert!(err_coarse < 10.0 * h_coarse, "coarse residual {}", err_coarse);
    assert!(err_fine < 10.0 * h_fine, "fine residual {}", err_fine);
    assert!(
        err_fine < 0.8 * err_coarse,
        "residual did not shrink under refinement: {} -> {}",
        err_coarse,
        err_fine
    );
}

/// Test 3: Sphere signed distance in 3D.
#[test]
fn sphere_signed_distance_3d_is_nearly_steady() {
    let s = Sampled::<3>::new(32, 2, 2, sphere_distance);
    let rhs = ReinitKernel::new()
        .with_threads(2)
        .compute(&s.inputs(SignMode::Phi))
        .unwrap();
    let err = max_residual(&s, &rhs, 0.15);
    assert!(err < 10.0 * s.h, "3D residual {}", err);
}

/// Test 4: A stretched level set is pulled back toward unit slope.
/// phi = 3 * dist has |grad phi| = 3, so RHS = sign(phi) * (1 - 3).
#[test]
fn stretched_level_set_is_flattened() {
    let s = Sampled::<2>::new(48, 2, 2, |x| 3.0 * sphere_distance(x));
    let rhs = ReinitKernel::new().compute(&s.inputs(SignMode::Phi)).unwrap();

    let inputs = s.inputs(SignMode::Phi);
    for idx in inputs.fill_box().indices() {
        let x = s.coord(idx);
        let r = distance_to_center(x);
        if r > 0.2 && sphere_distance(x).abs() > 2.0 * s.h {
            let expected = -2.0 * sphere_distance(x).signum();
            assert!(
                (rhs.get(idx) - expected).abs() < 0.5,
                "cell {:?}: rhs = {}, expected about {}",
                idx,
                rhs.get(idx),
                expected
            );
        }
    }
}

/// Test 5: The worked 1D example with literal values.
#[test]
fn literal_one_dimensional_example() {
    let gb = GridBox::from_shape([5]);
    let phi = Field::from_fn(gb, |[i]| i as f64 - 2.0);
    let ones = Field::from_fn(gb, |_| 1.0);

    let rhs = compute_reinit_rhs(phi.view(), 1, [ones.view()], [ones.view()], [0.1]).unwrap();
    assert_eq!(rhs.as_slice(), &[0.0, 0.0, 0.0, 0.0, 0.0]);
}

/// Test 6: Ghost cells of the output are zero whatever the inputs hold.
#[test]
fn ghost_layer_is_zero() {
    let s = Sampled::<2>::new(20, 3, 3, |x| 5.0 * sphere_distance(x));
    let inputs = s.inputs(SignMode::Phi);
    let rhs = ReinitKernel::new().compute(&inputs).unwrap();

    assert_eq!(rhs.grid_box(), s.phi.grid_box());
    for idx in s.phi.grid_box().indices() {
        if !inputs.fill_box().contains(idx) {
            assert_eq!(rhs.get(idx), 0.0, "ghost cell {:?}", idx);
        }
    }
}

/// Test 7: Repeated runs and different thread counts agree bitwise.
#[test]
fn result_is_independent_of_thread_count() {
    let s = Sampled::<3>::new(24, 2, 2, |x| 2.0 * sphere_distance(x));
    let inputs = s.inputs(SignMode::Phi);

    let reference = ReinitKernel::new().with_threads(1).compute(&inputs).unwrap();
    let again = ReinitKernel::new().with_threads(1).compute(&inputs).unwrap();
    assert_eq!(reference.as_slice(), again.as_slice());

    for threads in [2, 3, 4] {
        let rhs = ReinitKernel::new()
            .with_threads(threads)
            .compute(&inputs)
            .unwrap();
        assert_eq!(
            reference.as_slice(),
            rhs.as_slice(),
            "{} threads differ from 1",
            threads
        );
    }

    let global = ReinitKernel::new().compute(&inputs).unwrap();
    assert_eq!(reference.as_slice(), global.as_slice());
}

/// Test 8: Derivatives with a narrower ghost width give the same answer once
/// centered inside phi's box.
#[test]
fn narrow_derivative_ghost_matches_full_ghost() {
    let full = Sampled::<2>::new(30, 3, 3, |x| 2.0 * sphere_distance(x));
    let narrow = Sampled::<2>::new(30, 3, 1, |x| 2.0 * sphere_distance(x));

    let inputs = narrow.inputs(SignMode::Phi);
    assert_eq!(inputs.alignment_offset(), [2, 2]);

    let a = ReinitKernel::new().compute(&full.inputs(SignMode::Phi)).unwrap();
    let b = ReinitKernel::new().compute(&inputs).unwrap();
    assert_eq!(a.as_slice(), b.as_slice());
}

/// Test 9: A frozen reference field decides upwinding, not phi.
#[test]
fn frozen_sign_uses_reference_field() {
    let s = Sampled::<2>::new(64, 2, 2, |x| 2.0 * sphere_distance(x));
    let negated = Field::from_fn(*s.phi.grid_box(), |idx| -s.phi.get(idx));

    let own = ReinitKernel::new().compute(&s.inputs(SignMode::Phi)).unwrap();
    let frozen_same = ReinitKernel::new()
        .compute(&s.inputs(SignMode::Frozen(s.phi.view())))
        .unwrap();
    assert_eq!(own.as_slice(), frozen_same.as_slice());

    // Flipping the sign source flips sign(phi) and swaps the upwind choice;
    // with |grad phi| = 2 on both sides the magnitudes match.
    let flipped = ReinitKernel::new()
        .compute(&s.inputs(SignMode::Frozen(negated.view())))
        .unwrap();
    let inputs = s.inputs(SignMode::Phi);
    for idx in inputs.fill_box().indices() {
        let x = s.coord(idx);
        if distance_to_center(x) > 0.2 && sphere_distance(x).abs() > 2.0 * s.h {
            assert!(
                (own.get(idx) + flipped.get(idx)).abs() < 0.5,
                "cell {:?}: {} vs {}",
                idx,
                own.get(idx),
                flipped.get(idx)
            );
        }
    }
}

/// Test 10: A smoothed sign keeps the sign of the sharp one and never
/// exceeds it in magnitude.
#[test]
fn smoothed_sign_is_bounded_by_sharp() {
    let s = Sampled::<2>::new(32, 2, 2, |x| 2.0 * sphere_distance(x));
    let inputs = s.inputs(SignMode::Phi);

    let sharp = ReinitKernel::new().compute(&inputs).unwrap();
    let smooth = ReinitKernel::new()
        .with_sign_function(SignFunction::smoothed_for_spacing(&[s.h, s.h]))
        .compute(&inputs)
        .unwrap();

    for idx in inputs.fill_box().indices() {
        let (a, b) = (sharp.get(idx), smooth.get(idx));
        assert!(b.abs() <= a.abs() + 1e-12, "cell {:?}: {} vs {}", idx, a, b);
        assert!(a * b >= 0.0, "cell {:?}: sign flipped ({} vs {})", idx, a, b);
    }
}

/// Test 11: Single precision runs the same kernel.
#[test]
fn single_precision_kernel() {
    let gb = GridBox::<2>::from_shape([6, 6]);
    let phi = Field::from_fn(gb, |[i, j]| (i + j) as f32 - 5.0);
    let steep = Field::from_fn(gb, |_| 2.0_f32);

    let rhs = compute_reinit_rhs(
        phi.view(),
        1,
        [steep.view(), steep.view()],
        [steep.view(), steep.view()],
        [1.0, 1.0],
    )
    .unwrap();

    let inputs = ReinitInputs::new(
        phi.view(),
        1,
        [steep.view(), steep.view()],
        [steep.view(), steep.view()],
        [1.0, 1.0],
        SignMode::Phi,
    )
    .unwrap();
    let expected = 1.0_f32 - 8.0_f32.sqrt();
    for idx in inputs.fill_box().indices() {
        let s = phi.get(idx).signum();
        let v = rhs.get(idx);
        if phi.get(idx) == 0.0 {
            assert_eq!(v, 0.0);
        } else {
            assert!((v - s * expected).abs() < 1e-5, "cell {:?}: {}", idx, v);
        }
    }
}

/// Test 12: Validation errors surface before any work is done.
#[test]
fn mismatched_derivative_boxes_are_rejected() {
    let s = Sampled::<2>::new(10, 2, 2, sphere_distance);
    let odd = Field::<f64, 2>::zeros(GridBox::from_shape([12, 13]));

    let err = ReinitInputs::new(
        s.phi.view(),
        2,
        [s.plus[0].view(), s.plus[1].view()],
        [s.minus[0].view(), odd.view()],
        [s.h, s.h],
        SignMode::Phi,
    )
    .err()
    .unwrap();
    assert!(matches!(err, ReinitError::DerivativeBoxMismatch { .. }));

    let err = ReinitInputs::new(
        s.phi.view(),
        2,
        [s.plus[0].view(), s.plus[1].view()],
        [s.minus[0].view(), s.minus[1].view()],
        [s.h, 0.0],
        SignMode::Phi,
    )
    .err()
    .unwrap();
    assert!(matches!(err, ReinitError::InvalidGridSpacing { axis: 1, .. }));
}
