// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use log::{debug, warn};
use rayon::prelude::*;

use crate::core::{Field, FieldView, GridBox, Real};
use crate::error::{ReinitError, Result};
use crate::hamiltonian::reinit_rhs_value;
use crate::sign::{SignFunction, SignMode};

/// Validated inputs for one evaluation of the reinitialization right-hand side.
///
/// Construction performs every boundary check: field sizes, a single
/// shared derivative ghost box, positive spacing, and coverage of the fill
/// box by the centered derivative box. A value of this type is therefore
/// always safe to hand to [`ReinitKernel::compute`].
#[derive(Debug, Clone, Copy)]
pub struct ReinitInputs<'a, T, const N: usize> {
    phi: FieldView<'a, T, N>,
    ghost_width: usize,
    plus: [FieldView<'a, T, N>; N],
    minus: [FieldView<'a, T, N>; N],
    spacing: [T; N],
    sign_mode: SignMode<'a, T, N>,
    fill_box: GridBox<N>,
    deriv_box: GridBox<N>,
}

#[allow(clippy::needless_range_loop)]
impl<'a, T: Real, const N: usize> ReinitInputs<'a, T, N> {
    /// Bundle and validate the inputs.
    ///
    /// # Parameters
    /// - `phi`: Level set function over its ghost box
    /// - `ghost_width`: Ghost cell width of `phi`; the fill box is `phi`'s box
    ///   shrunk by this many cells on every side
    /// - `plus`, `minus`: One-sided derivatives along each axis, all over one
    ///   shared ghost box that is centered inside `phi`'s box
    /// - `spacing`: Grid spacing along each axis
    /// - `sign_mode`: Field supplying the upwinding sign
    ///
    /// # Errors
    /// Returns an error if spacing is not positive and finite, if `phi0`
    /// does not share `phi`'s box, if the derivative fields do not share one
    /// box, or if that box does not cover the fill box once centered.
    pub fn new(
        phi: FieldView<'a, T, N>,
        ghost_width: usize,
        plus: [FieldView<'a, T, N>; N],
        minus: [FieldView<'a, T, N>; N],
        spacing: [T; N],
        sign_mode: SignMode<'a, T, N>,
    ) -> Result<Self> {
        for (axis, &h) in spacing.iter().enumerate() {
            if !h.is_finite() || h <= T::zero() {
                return Err(ReinitError::InvalidGridSpacing {
                    axis,
                    value: h.to_f64().unwrap_or(f64::NAN),
                });
            }
        }

        let phi_box = *phi.grid_box();
        if let SignMode::Frozen(phi0) = &sign_mode {
            if *phi0.grid_box() != phi_box {
                return Err(ReinitError::ShapeMismatch {
                    field: "phi0".to_string(),
                    expected: phi_box.shape().to_vec(),
                    got: phi0.grid_box().shape().to_vec(),
                });
            }
        }

        let shared = *plus[0].grid_box();
        for (kind, views) in [("plus", &plus), ("minus", &minus)] {
            for (axis, view) in views.iter().enumerate() {
                if *view.grid_box() != shared {
                    return Err(ReinitError::DerivativeBoxMismatch {
                        field: format!("{}[{}]", kind, axis),
                        expected: shared.to_string(),
                        got: view.grid_box().to_string(),
                    });
                }
            }
        }

        let fill_box = phi_box.shrink(ghost_width);
        let deriv_box = shared.centered_in(&phi_box);
        if !fill_box.is_empty() {
            let (fill_lo, fill_hi) = (fill_box.lo(), fill_box.hi());
            let (deriv_lo, deriv_hi) = (deriv_box.lo(), deriv_box.hi());
            for axis in 0..N {
                if fill_lo[axis] < deriv_lo[axis] || fill_hi[axis] > deriv_hi[axis] {
                    return Err(ReinitError::DerivativeBoxTooSmall {
                        axis,
                        fill: (fill_lo[axis], fill_hi[axis]),
                        deriv: (deriv_lo[axis], deriv_hi[axis]),
                    });
                }
            }
        }

        Ok(ReinitInputs {
            phi,
            ghost_width,
            plus,
            minus,
            spacing,
            sign_mode,
            fill_box,
            deriv_box,
        })
    }

    /// The level set function.
    pub fn phi(&self) -> &FieldView<'a, T, N> {
        &self.phi
    }

    /// Ghost cell width of `phi`.
    pub fn ghost_width(&self) -> usize {
        self.ghost_width
    }

    /// Grid spacing along each axis.
    pub fn spacing(&self) -> [T; N] {
        self.spacing
    }

    /// Field supplying the upwinding sign.
    pub fn sign_mode(&self) -> &SignMode<'a, T, N> {
        &self.sign_mode
    }

    /// Region of `phi`'s box where the right-hand side is computed.
    pub fn fill_box(&self) -> GridBox<N> {
        self.fill_box
    }

    /// Derivative ghost box expressed in `phi`'s index space.
    pub fn derivative_box(&self) -> GridBox<N> {
        self.deriv_box
    }

    /// Offset that centers the derivative box inside `phi`'s box.
    pub fn alignment_offset(&self) -> [i64; N] {
        let mut offset = [0i64; N];
        let (deriv_lo, phi_lo) = (self.deriv_box.lo(), self.phi.grid_box().lo());
        for d in 0..N {
            offset[d] = deriv_lo[d] - phi_lo[d];
        }
        offset
    }
}

/// Evaluates the Godunov right-hand side of the reinitialization equation
/// over the fill box of a [`ReinitInputs`].
///
/// Every output cell depends only on read-only inputs, so the sweep is split
/// into slabs along the first axis and run on a rayon pool. Results are
/// bitwise identical for any thread count.
#[derive(Debug, Clone)]
pub struct ReinitKernel<T> {
    sign_function: SignFunction<T>,
    num_threads: Option<usize>,
}

impl<T: Real> Default for ReinitKernel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Real> ReinitKernel<T> {
    /// A kernel using the exact sign and the global rayon pool.
    pub fn new() -> Self {
        ReinitKernel {
            sign_function: SignFunction::default(),
            num_threads: None,
        }
    }

    /// Set the sign function (builder method).
    pub fn with_sign_function(mut self, sign_function: SignFunction<T>) -> Self {
        self.sign_function = sign_function;
        self
    }

    /// Run sweeps on a dedicated pool of `threads` workers (builder method).
    /// If not specified, the global rayon pool is used.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// The sign function in use.
    pub fn sign_function(&self) -> SignFunction<T> {
        self.sign_function
    }

    /// Compute the right-hand side over `phi`'s ghost box.
    ///
    /// The result is zero outside the fill box. An empty fill box yields an
    /// all-zero field.
    ///
    /// # Errors
    /// Returns `InvalidSignParameter` for a negative or non-finite sign
    /// parameter, or an error if a dedicated thread pool cannot be created.
    pub fn compute<const N: usize>(
        &self,
        inputs: &ReinitInputs<'_, T, N>,
    ) -> Result<Field<T, N>> {
        self.sign_function.validate()?;
        let phi_box = *inputs.phi.grid_box();
        let mut rhs = Field::zeros(phi_box);

        if inputs.fill_box.is_empty() {
            warn!(
                "fill box is empty (ghost box {}, ghost width {}); output is all zero",
                phi_box, inputs.ghost_width
            );
            return Ok(rhs);
        }

        debug!(
            "reinit rhs: ghost box {}, fill box {}, derivative box {} (offset {:?}), frozen sign: {}",
            phi_box,
            inputs.fill_box,
            inputs.deriv_box,
            inputs.alignment_offset(),
            inputs.sign_mode.is_frozen()
        );

        match self.num_threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| ReinitError::Other(e.to_string()))?;
                debug!("sweeping fill box on {} threads", threads);
                pool.install(|| self.sweep(inputs, &mut rhs));
            }
            None => self.sweep(inputs, &mut rhs),
        }

        Ok(rhs)
    }

    fn sweep<const N: usize>(&self, inputs: &ReinitInputs<'_, T, N>, rhs: &mut Field<T, N>) {
        let phi_box = *rhs.grid_box();
        let fill = inputs.fill_box;
        let phi_strides = phi_box.strides();
        let deriv_strides = inputs.deriv_box.strides();
        let slab_len = phi_strides[0];
        let first_lo = phi_box.lo()[0];
        let (fill_first_lo, fill_first_hi) = (fill.lo()[0], fill.hi()[0]);

        rhs.as_mut_slice()
            .par_chunks_mut(slab_len)
            .enumerate()
            .for_each(|(row, slab)| {
                let i = first_lo + row as i64;
                if i < fill_first_lo || i > fill_first_hi {
                    return;
                }
                let base = row * slab_len;
                for idx in fill.slab(0, i).indices() {
                    slab[phi_box.linear_index_with(&phi_strides, idx) - base] =
                        self.cell_value(inputs, &deriv_strides, idx);
                }
            });
    }

    #[inline]
    fn cell_value<const N: usize>(
        &self,
        inputs: &ReinitInputs<'_, T, N>,
        deriv_strides: &[usize; N],
        idx: [i64; N],
    ) -> T {
        let sign = self
            .sign_function
            .eval(inputs.sign_mode.source_value(&inputs.phi, idx));
        if sign == T::zero() {
            return T::zero();
        }

        let flat = inputs.deriv_box.linear_index_with(deriv_strides, idx);
        let mut plus = [T::zero(); N];
        let mut minus = [T::zero(); N];
        for (d, (p, m)) in plus.iter_mut().zip(minus.iter_mut()).enumerate() {
            *p = inputs.plus[d].as_slice()[flat];
            *m = inputs.minus[d].as_slice()[flat];
        }
        reinit_rhs_value(sign, &plus, &minus)
    }
}

/// Compute the reinitialization right-hand side with the exact sign of `phi`.
///
/// Shorthand for validating [`ReinitInputs`] with [`SignMode::Phi`] and
/// running a default [`ReinitKernel`].
///
/// # Errors
/// Returns any validation error from [`ReinitInputs::new`].
pub fn compute_reinit_rhs<T: Real, const N: usize>(
    phi: FieldView<'_, T, N>,
    ghost_width: usize,
    plus: [FieldView<'_, T, N>; N],
    minus: [FieldView<'_, T, N>; N],
    spacing: [T; N],
) -> Result<Field<T, N>> {
    let inputs = ReinitInputs::new(phi, ghost_width, plus, minus, spacing, SignMode::Phi)?;
    ReinitKernel::new().compute(&inputs)
}
