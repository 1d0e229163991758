// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

/// Errors reported by the input boundary before any numerical work starts.
///
/// The kernel itself has no error channel: once a `ReinitInputs` value
/// exists, computing the right-hand side cannot fail for numerical reasons.
#[derive(Debug)]
pub enum ReinitError {
    /// Field stored with a floating-point precision other than the build's.
    PrecisionMismatch {
        /// Name of the offending field.
        field: String,
        /// Precision the kernel was built for.
        expected: &'static str,
        /// Precision found in the input.
        got: &'static str,
    },
    /// Field rank differs from the kernel dimension.
    DimensionMismatch {
        /// Name of the offending field.
        field: String,
        /// Expected number of dimensions.
        expected: usize,
        /// Number of dimensions found.
        got: usize,
    },
    /// Field data does not match the shape of its box.
    ShapeMismatch {
        /// Name of the offending field.
        field: String,
        /// The expected shape.
        expected: Vec<usize>,
        /// The actual shape encountered.
        got: Vec<usize>,
    },
    /// Wrong number of arguments of one kind were supplied.
    ArgumentCount {
        /// What was being counted.
        what: &'static str,
        /// Required count.
        expected: usize,
        /// Supplied count.
        got: usize,
    },
    /// Box bounds are inverted by more than one cell on some axis.
    InvalidGridBox {
        /// The axis index.
        axis: usize,
        /// Lower bound.
        lo: i64,
        /// Upper bound.
        hi: i64,
    },
    /// Grid spacing is not positive and finite.
    InvalidGridSpacing {
        /// The axis index.
        axis: usize,
        /// The spacing provided.
        value: f64,
    },
    /// Sign function parameter is negative or not finite.
    InvalidSignParameter {
        /// Parameter name (`zero_tol` or `epsilon`).
        name: &'static str,
        /// The value provided.
        value: f64,
    },
    /// Derivative fields do not all share one ghost box.
    DerivativeBoxMismatch {
        /// Name of the first field whose box differs.
        field: String,
        /// Box shared by the earlier derivative fields.
        expected: String,
        /// Box of the offending field.
        got: String,
    },
    /// After centering, the derivative box does not cover the fill box.
    DerivativeBoxTooSmall {
        /// The axis index.
        axis: usize,
        /// Fill box bounds on that axis.
        fill: (i64, i64),
        /// Centered derivative box bounds on that axis.
        deriv: (i64, i64),
    },
    /// Unsupported data type in file.
    UnsupportedDtype(String),
    /// Unsupported file format (unrecognized extension).
    UnsupportedFileFormat(String),
    /// Expected MAT variable not found in file.
    MatVariableNotFound {
        /// The variable name that was requested.
        expected: String,
        /// The variable names that are available.
        available: Vec<String>,
    },
    /// I/O error occurred.
    IoError(std::io::Error),
    /// Other error with a descriptive message.
    Other(String),
}

impl fmt::Display for ReinitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReinitError::PrecisionMismatch {
                field,
                expected,
                got,
            } => {
                write!(
                    f,
                    "incompatible precision: built for {}-precision but {} is {}-precision",
                    expected, field, got
                )
            }
            ReinitError::DimensionMismatch {
                field,
                expected,
                got,
            } => {
                write!(
                    f,
                    "{} should be a {} dimensional array (got {} dimensions)",
                    field, expected, got
                )
            }
            ReinitError::ShapeMismatch {
                field,
                expected,
                got,
            } => {
                write!(
                    f,
                    "shape mismatch for {}: expected {:?}, got {:?}",
                    field, expected, got
                )
            }
            ReinitError::ArgumentCount {
                what,
                expected,
                got,
            } => {
                write!(f, "expected {} {}, got {}", expected, what, got)
            }
            ReinitError::InvalidGridBox { axis, lo, hi } => {
                write!(f, "invalid grid box: axis {} has lo {} > hi {} + 1", axis, lo, hi)
            }
            ReinitError::InvalidGridSpacing { axis, value } => {
                write!(
                    f,
                    "invalid grid spacing on axis {}: {} (must be positive and finite)",
                    axis, value
                )
            }
            ReinitError::InvalidSignParameter { name, value } => {
                write!(
                    f,
                    "invalid sign function {}: {} (must be non-negative and finite)",
                    name, value
                )
            }
            ReinitError::DerivativeBoxMismatch {
                field,
                expected,
                got,
            } => {
                write!(
                    f,
                    "derivative fields must share one ghost box: {} spans {}, expected {}",
                    field, got, expected
                )
            }
            ReinitError::DerivativeBoxTooSmall { axis, fill, deriv } => {
                write!(
                    f,
                    "derivative box [{}, {}] does not cover fill box [{}, {}] on axis {}",
                    deriv.0, deriv.1, fill.0, fill.1, axis
                )
            }
            ReinitError::UnsupportedDtype(dtype) => {
                write!(f, "unsupported dtype: {}", dtype)
            }
            ReinitError::UnsupportedFileFormat(ext) => {
                write!(f, "unsupported file format: {}", ext)
            }
            ReinitError::MatVariableNotFound {
                expected,
                available,
            } => {
                write!(
                    f,
                    "MAT variable '{}' not found; available variables: {:?}",
                    expected, available
                )
            }
            ReinitError::IoError(e) => write!(f, "I/O error: {}", e),
            ReinitError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ReinitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReinitError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReinitError {
    fn from(e: std::io::Error) -> Self {
        ReinitError::IoError(e)
    }
}

/// Convenience type alias for Results with ReinitError.
pub type Result<T> = std::result::Result<T, ReinitError>;
