// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::core::{FieldView, Real};
use crate::error::{ReinitError, Result};

/// Which field supplies the sign that orients upwinding.
///
/// Chosen once per call and applied to every cell of the fill box.
#[derive(Debug, Clone, Copy)]
pub enum SignMode<'a, T, const N: usize> {
    /// Take the sign from `phi` itself.
    Phi,
    /// Take the sign from a frozen reference field `phi0` stored over the
    /// same ghost box as `phi`. Keeps the zero level set from drifting when
    /// reinitialization perturbs the sign of `phi` near the interface.
    Frozen(FieldView<'a, T, N>),
}

impl<'a, T: Real, const N: usize> SignMode<'a, T, N> {
    /// True for [`SignMode::Frozen`].
    pub fn is_frozen(&self) -> bool {
        matches!(self, SignMode::Frozen(_))
    }

    /// The value whose sign orients upwinding at `idx`.
    #[inline]
    pub fn source_value(&self, phi: &FieldView<'a, T, N>, idx: [i64; N]) -> T {
        match self {
            SignMode::Phi => phi.get(idx),
            SignMode::Frozen(phi0) => phi0.get(idx),
        }
    }
}

/// How a field value is turned into the upwinding sign.
///
/// The choice changes results near the interface: the sharp sign jumps
/// between -1 and +1 across a single cell, the smoothed sign ramps over a
/// width of about `epsilon`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignFunction<T> {
    /// `+1` above `zero_tol`, `-1` below `-zero_tol`, `0` in between.
    Sharp {
        /// Half-width of the band treated as lying on the interface.
        zero_tol: T,
    },
    /// `v / sqrt(v^2 + epsilon^2)`, valued in `(-1, 1)`.
    Smoothed {
        /// Smoothing width, usually one grid spacing.
        epsilon: T,
    },
}

impl<T: Real> Default for SignFunction<T> {
    fn default() -> Self {
        SignFunction::Sharp { zero_tol: T::zero() }
    }
}

impl<T: Real> SignFunction<T> {
    /// Sharp sign with a zero band of half-width `zero_tol`.
    ///
    /// # Errors
    /// Returns `InvalidSignParameter` if `zero_tol` is negative or not finite.
    pub fn sharp(zero_tol: T) -> Result<Self> {
        let sign = SignFunction::Sharp { zero_tol };
        sign.validate()?;
        Ok(sign)
    }

    /// Check that the band or smoothing width is non-negative and finite.
    pub fn validate(&self) -> Result<()> {
        let (name, value) = match *self {
            SignFunction::Sharp { zero_tol } => ("zero_tol", zero_tol),
            SignFunction::Smoothed { epsilon } => ("epsilon", epsilon),
        };
        if value.is_finite() && value >= T::zero() {
            Ok(())
        } else {
            Err(ReinitError::InvalidSignParameter {
                name,
                value: value.to_f64().unwrap_or(f64::NAN),
            })
        }
    }

    /// Smoothed sign with `epsilon` equal to the smallest grid spacing.
    pub fn smoothed_for_spacing(spacing: &[T]) -> Self {
        let epsilon = spacing
            .iter()
            .copied()
            .fold(T::infinity(), |acc, h| acc.min(h));
        SignFunction::Smoothed { epsilon }
    }

    /// Evaluate the sign of `value`.
    #[inline]
    pub fn eval(&self, value: T) -> T {
        match *self {
            SignFunction::Sharp { zero_tol } => {
                if value > zero_tol {
                    T::one()
                } else if value < -zero_tol {
                    -T::one()
                } else {
                    T::zero()
                }
            }
            SignFunction::Smoothed { epsilon } => {
                if value == T::zero() {
                    return T::zero();
                }
                value / (value * value + epsilon * epsilon).sqrt()
            }
        }
    }
}
