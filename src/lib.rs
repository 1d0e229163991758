// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Right-hand side of the level-set reinitialization equation.
//!
//! Given a level set function φ and its one-sided (upwind) derivatives, this
//! library evaluates `S(φ)(1 - |∇φ|)` on a ghosted Cartesian grid of any
//! dimension, approximating |∇φ| with the Godunov numerical Hamiltonian.
//! Derivative arrays may carry a different ghost width than φ; they are
//! centered inside φ's ghost box before use. Only the fill box (φ's box
//! minus its ghost cells) is computed; ghost cells of the output are zero.

#![warn(missing_docs)]

/// Grid boxes, field storage, and precision.
pub mod core;
/// Error types for the library.
pub mod error;
/// Godunov upwind evaluation of |∇φ| and the right-hand side.
pub mod hamiltonian;
/// File I/O for loading input fields and saving the right-hand side.
pub mod io;
/// Input validation and the parallel sweep over the fill box.
pub mod kernel;
/// Sign source and sign function used to orient upwinding.
pub mod sign;

pub use crate::core::{alignment_offset, Field, FieldView, GridBox, LsmReal, Real};
pub use crate::error::{ReinitError, Result};
pub use crate::kernel::{compute_reinit_rhs, ReinitInputs, ReinitKernel};
pub use crate::sign::{SignFunction, SignMode};
