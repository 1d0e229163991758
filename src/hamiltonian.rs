// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::core::Real;

/// Squared upwind derivative along one axis.
///
/// Godunov selection for H(∇φ) = |∇φ| with characteristics moving along
/// `sign * ∇φ`. For `sign >= 0`:
/// `max(max(minus, 0)^2, min(plus, 0)^2)`; for `sign < 0`:
/// `max(min(minus, 0)^2, max(plus, 0)^2)`.
#[inline]
pub fn upwind_contribution<T: Real>(sign: T, plus: T, minus: T) -> T {
    let zero = T::zero();
    let (from_minus, from_plus) = if sign >= zero {
        (minus.max(zero), plus.min(zero))
    } else {
        (minus.min(zero), plus.max(zero))
    };
    (from_minus * from_minus).max(from_plus * from_plus)
}

/// Godunov approximation of |∇φ| from the one-sided derivatives of every axis.
///
/// `plus[d]` and `minus[d]` are the forward and backward derivative
/// approximations along axis `d`.
#[inline]
pub fn godunov_gradient_norm<T: Real, const N: usize>(
    sign: T,
    plus: &[T; N],
    minus: &[T; N],
) -> T {
    let mut sum = T::zero();
    for (&p, &m) in plus.iter().zip(minus.iter()) {
        sum = sum + upwind_contribution(sign, p, m);
    }
    sum.sqrt()
}

/// Right-hand side `sign * (1 - |∇φ|)` of the reinitialization equation.
///
/// Cells with `sign == 0` lie on the interface and get exactly zero.
#[inline]
pub fn reinit_rhs_value<T: Real, const N: usize>(
    sign: T,
    plus: &[T; N],
    minus: &[T; N],
) -> T {
    if sign == T::zero() {
        return T::zero();
    }
    sign * (T::one() - godunov_gradient_norm(sign, plus, minus))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upwind_picks_backward_derivative_for_positive_sign() {
        // both one-sided slopes positive: information arrives from the minus side
        assert_eq!(upwind_contribution(1.0, 3.0, 2.0), 4.0);
        // both negative: information arrives from the plus side
        assert_eq!(upwind_contribution(1.0, -3.0, -2.0), 9.0);
    }

    #[test]
    fn upwind_picks_forward_derivative_for_negative_sign() {
        assert_eq!(upwind_contribution(-1.0, 3.0, 2.0), 9.0);
        assert_eq!(upwind_contribution(-1.0, -3.0, -2.0), 4.0);
    }

    #[test]
    fn upwind_expansion_and_kink() {
        // local minimum of phi with positive sign: expansion, no contribution
        assert_eq!(upwind_contribution(1.0, 1.0, -1.0), 0.0);
        // local maximum with positive sign: both sides flow in, take the larger
        assert_eq!(upwind_contribution(1.0, -0.5, 2.0), 4.0);
        // mirrored cases for negative sign
        assert_eq!(upwind_contribution(-1.0, -1.0, 1.0), 0.0);
        assert_eq!(upwind_contribution(-1.0, 0.5, -2.0), 4.0);
    }

    #[test]
    fn zero_sign_gives_zero_rhs() {
        let plus = [5.0, -7.0, 0.3];
        let minus = [-2.0, 11.0, 1e6];
        assert_eq!(reinit_rhs_value(0.0, &plus, &minus), 0.0);
        assert_eq!(reinit_rhs_value(-0.0f32, &[3.0f32], &[4.0f32]), 0.0);
    }

    #[test]
    fn agreeing_derivatives_reduce_to_euclidean_norm() {
        let c = [0.6, -0.8, 1.2];
        let expected = (0.36f64 + 0.64 + 1.44).sqrt();
        for &s in &[1.0, -1.0, 0.25] {
            let g = godunov_gradient_norm(s, &c, &c);
            assert!((g - expected).abs() < 1e-12, "s={} g={}", s, g);
        }
    }

    #[test]
    fn negating_phi_negates_rhs() {
        let cases: [([f64; 2], [f64; 2]); 4] = [
            ([0.3, -1.2], [0.9, 0.4]),
            ([2.0, 2.0], [-1.0, 0.5]),
            ([-0.1, 0.0], [0.0, -3.0]),
            ([1.0, 1.0], [1.0, 1.0]),
        ];
        for (plus, minus) in cases {
            for &s in &[1.0, 0.4] {
                let rhs = reinit_rhs_value(s, &plus, &minus);
                // phi -> -phi flips the sign and negates every derivative
                let neg_plus = [-plus[0], -plus[1]];
                let neg_minus = [-minus[0], -minus[1]];
                let rhs_neg = reinit_rhs_value(-s, &neg_plus, &neg_minus);
                assert_eq!(
                    rhs_neg, -rhs,
                    "plus={:?} minus={:?} s={}",
                    plus, minus, s
                );
            }
        }
    }

    #[test]
    fn unit_gradient_is_steady() {
        let rhs = reinit_rhs_value(-1.0, &[1.0], &[1.0]);
        assert_eq!(rhs, 0.0);
        let diag = std::f64::consts::FRAC_1_SQRT_2;
        let rhs = reinit_rhs_value(1.0, &[diag, diag], &[diag, diag]);
        assert!(rhs.abs() < 1e-15);
    }

    #[test]
    fn steep_field_is_flattened() {
        // |grad phi| = 2 on the positive side: phi must decrease
        let rhs = reinit_rhs_value(1.0, &[2.0, 0.0], &[2.0, 0.0]);
        assert_eq!(rhs, -1.0);
        // and increase on the negative side
        let rhs = reinit_rhs_value(-1.0, &[2.0, 0.0], &[2.0, 0.0]);
        assert_eq!(rhs, 1.0);
    }

    #[test]
    fn no_nan_for_finite_inputs() {
        let values = [-1e30, -1.0, -1e-30, 0.0, 1e-30, 1.0, 1e30];
        for &s in &[-1.0f64, 0.0, 1.0] {
            for &p in &values {
                for &m in &values {
                    let rhs = reinit_rhs_value(s, &[p], &[m]);
                    assert!(!rhs.is_nan(), "NaN for s={} plus={} minus={}", s, p, m);
                }
            }
        }
    }
}
