// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::io::Write;
use std::path::Path;

use log::debug;
use ndarray::{ArrayD, IxDyn, ShapeBuilder};
use ndarray_npy::{ReadNpyError, ReadableElement, WritableElement};

use crate::core::{Field, GridBox, Real};
use crate::error::{ReinitError, Result};

// MAT-File Level 5 data types and array classes.
const MI_INT8: u32 = 1;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_SINGLE: u32 = 7;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MX_DOUBLE_CLASS: u32 = 6;
const MX_SINGLE_CLASS: u32 = 7;

/// A [`Real`] that can be read from and written to `.npy` and `.mat` files.
pub trait FileElement: Real + ReadableElement + WritableElement {
    /// MAT array class written for this type.
    const MAT_CLASS: u32;
    /// MAT data element type written for this type.
    const MAT_TYPE: u32;

    /// Extract MAT data stored in exactly this precision.
    fn from_mat(data: &matfile::NumericData) -> Option<Vec<Self>>;

    /// Write the little-endian bytes of `self`.
    fn write_le<W: Write>(self, w: &mut W) -> std::io::Result<()>;
}

impl FileElement for f64 {
    const MAT_CLASS: u32 = MX_DOUBLE_CLASS;
    const MAT_TYPE: u32 = MI_DOUBLE;

    fn from_mat(data: &matfile::NumericData) -> Option<Vec<Self>> {
        match data {
            matfile::NumericData::Double { real, imag: _ } => Some(real.clone()),
            _ => None,
        }
    }

    fn write_le<W: Write>(self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&self.to_le_bytes())
    }
}

impl FileElement for f32 {
    const MAT_CLASS: u32 = MX_SINGLE_CLASS;
    const MAT_TYPE: u32 = MI_SINGLE;

    fn from_mat(data: &matfile::NumericData) -> Option<Vec<Self>> {
        match data {
            matfile::NumericData::Single { real, imag: _ } => Some(real.clone()),
            _ => None,
        }
    }

    fn write_le<W: Write>(self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&self.to_le_bytes())
    }
}

/// Supported file formats for field I/O.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    /// NumPy .npy format.
    Npy,
    /// MATLAB .mat format (Level 5).
    Mat,
}

/// Infer file format from extension.
pub fn infer_format(path: &Path) -> Result<FileFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("npy") => Ok(FileFormat::Npy),
        Some("mat") => Ok(FileFormat::Mat),
        Some(ext) => Err(ReinitError::UnsupportedFileFormat(ext.to_string())),
        None => Err(ReinitError::UnsupportedFileFormat(
            "(no extension)".to_string(),
        )),
    }
}

/// Load a field from a .npy file.
///
/// Returns the shape and the data in row-major order.
///
/// # Errors
/// Returns `IoError` if the file cannot be read, `PrecisionMismatch` if it
/// holds the other floating-point precision, and `DimensionMismatch` if its
/// rank is not `ndim`.
pub fn load_npy_field<T: FileElement>(
    path: &Path,
    name: &str,
    ndim: usize,
) -> Result<(Vec<usize>, Vec<T>)> {
    let arr: ArrayD<T> = match ndarray_npy::read_npy(path) {
        Ok(a) => a,
        Err(ReadNpyError::Io(e)) => return Err(ReinitError::IoError(e)),
        Err(e) => {
            return Err(match stored_npy_precision(path) {
                Some(got) => ReinitError::PrecisionMismatch {
                    field: name.to_string(),
                    expected: T::PRECISION,
                    got,
                },
                None => ReinitError::UnsupportedDtype(format!("{}: {}", name, e)),
            });
        }
    };

    if arr.ndim() != ndim {
        return Err(ReinitError::DimensionMismatch {
            field: name.to_string(),
            expected: ndim,
            got: arr.ndim(),
        });
    }

    // Fortran-order .npy files would otherwise give column-major data.
    let shape = arr.shape().to_vec();
    Ok((shape, arr.as_standard_layout().to_owned().into_raw_vec()))
}

fn stored_npy_precision(path: &Path) -> Option<&'static str> {
    if ndarray_npy::read_npy::<_, ArrayD<f64>>(path).is_ok() {
        Some(f64::PRECISION)
    } else if ndarray_npy::read_npy::<_, ArrayD<f32>>(path).is_ok() {
        Some(f32::PRECISION)
    } else {
        None
    }
}

/// Load a field from a .mat file.
///
/// The variable named `name` is used; a file holding a single array is
/// accepted under any name. MAT data is column-major and is re-laid into
/// row-major order with the axis order unchanged, so element `(i, j)` in
/// MATLAB is element `[i, j]` here. Row and column vectors load as 1D
/// fields when `ndim` is 1. Other arrays must have exactly `ndim`
/// dimensions as stored; an `a x b x 1` array saved by MATLAB is 2D.
///
/// # Errors
/// Returns `PrecisionMismatch` if the array is stored in the other
/// floating-point precision, and `DimensionMismatch` if its rank is not
/// `ndim`.
pub fn load_mat_field<T: FileElement>(
    path: &Path,
    name: &str,
    ndim: usize,
) -> Result<(Vec<usize>, Vec<T>)> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let mat = matfile::MatFile::parse(&mut reader)
        .map_err(|e| ReinitError::Other(format!("MAT parse error: {}", e)))?;

    let array = match mat.find_by_name(name) {
        Some(array) => array,
        None if mat.arrays().len() == 1 => &mat.arrays()[0],
        None => {
            return Err(ReinitError::MatVariableNotFound {
                expected: name.to_string(),
                available: mat.arrays().iter().map(|a| a.name().to_string()).collect(),
            })
        }
    };

    let data = match T::from_mat(array.data()) {
        Some(data) => data,
        None => {
            let got = match array.data() {
                matfile::NumericData::Double { .. } => f64::PRECISION,
                matfile::NumericData::Single { .. } => f32::PRECISION,
                _ => {
                    return Err(ReinitError::UnsupportedDtype(format!(
                        "MAT variable '{}' is not a floating-point array",
                        array.name()
                    )))
                }
            };
            return Err(ReinitError::PrecisionMismatch {
                field: name.to_string(),
                expected: T::PRECISION,
                got,
            });
        }
    };

    let mut dims: Vec<usize> = array.size().to_vec();
    if ndim == 1 && dims.len() == 2 && (dims[0] == 1 || dims[1] == 1) {
        dims = vec![dims[0] * dims[1]];
    }
    if dims.len() != ndim {
        return Err(ReinitError::DimensionMismatch {
            field: name.to_string(),
            expected: ndim,
            got: dims.len(),
        });
    }

    let arr = ArrayD::from_shape_vec(IxDyn(&dims).f(), data).map_err(|_| {
        ReinitError::ShapeMismatch {
            field: name.to_string(),
            expected: dims.clone(),
            got: array.size().to_vec(),
        }
    })?;
    Ok((dims, arr.as_standard_layout().to_owned().into_raw_vec()))
}

/// Load an `N`-dimensional field, inferring the format from the extension.
///
/// The field's ghost box is `[0, shape[d] - 1]` on every axis.
pub fn load_field<T: FileElement, const N: usize>(path: &Path, name: &str) -> Result<Field<T, N>> {
    let (shape, data) = match infer_format(path)? {
        FileFormat::Npy => load_npy_field::<T>(path, name, N)?,
        FileFormat::Mat => load_mat_field::<T>(path, name, N)?,
    };
    debug!("loaded {} from {} with shape {:?}", name, path.display(), shape);

    let mut box_shape = [0usize; N];
    box_shape.copy_from_slice(&shape);
    Field::new(GridBox::from_shape(box_shape), data).map_err(|_| ReinitError::ShapeMismatch {
        field: name.to_string(),
        expected: shape,
        got: box_shape.to_vec(),
    })
}

/// Save a field to a .npy file.
pub fn save_npy<T: FileElement, const N: usize>(field: &Field<T, N>, path: &Path) -> Result<()> {
    let shape = field.grid_box().shape().to_vec();
    let arr = ArrayD::from_shape_vec(IxDyn(&shape), field.as_slice().to_vec())
        .map_err(|e| ReinitError::Other(format!("shape error: {}", e)))?;

    ndarray_npy::write_npy(path, &arr)
        .map_err(|e| ReinitError::Other(format!("npy write error: {}", e)))?;

    Ok(())
}

/// Save a field to a .mat file (Level 5) as variable `var_name`.
///
/// The axis order is kept, matching [`load_mat_field`]. 1D fields are
/// written as column vectors.
pub fn save_mat<T: FileElement, const N: usize>(
    field: &Field<T, N>,
    path: &Path,
    var_name: &str,
) -> Result<()> {
    let mut dims = field.grid_box().shape().to_vec();
    let arr = ArrayD::from_shape_vec(IxDyn(&dims), field.as_slice().to_vec())
        .map_err(|e| ReinitError::Other(format!("shape error: {}", e)))?;

    // Row-major storage of the transpose is column-major storage of `arr`
    let col_major: Vec<T> = arr.t().as_standard_layout().to_owned().into_raw_vec();

    if dims.len() == 1 {
        dims.push(1);
    }
    write_mat_level5(path, var_name, &dims, &col_major)
}

/// Save a field, inferring the format from the extension.
pub fn save_field<T: FileElement, const N: usize>(field: &Field<T, N>, path: &Path) -> Result<()> {
    match infer_format(path)? {
        FileFormat::Npy => save_npy(field, path),
        FileFormat::Mat => save_mat(field, path, "reinit_rhs"),
    }
}

/// Minimal MAT-file Level 5 writer for a single real numeric array.
///
/// The `matfile` crate only reads, so the writer is done by hand: a 128-byte
/// header followed by one uncompressed miMATRIX element holding array flags,
/// dimensions, name, and the real part. Every sub-element is padded to an
/// 8-byte boundary.
fn write_mat_level5<T: FileElement>(
    path: &Path,
    var_name: &str,
    dimensions: &[usize],
    data: &[T],
) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut w = std::io::BufWriter::new(file);

    // Header: 116 bytes of text, 8 bytes subsystem offset, version, endianness
    let desc = b"MATLAB 5.0 MAT-file, created by lsm-reinit";
    let mut header_text = [b' '; 116];
    header_text[..desc.len()].copy_from_slice(desc);
    w.write_all(&header_text)?;
    w.write_all(&[0u8; 8])?;
    w.write_all(&0x0100u16.to_le_bytes())?;
    w.write_all(b"IM")?;

    let dims_size = (dimensions.len() * 4) as u32;
    let name = var_name.as_bytes();
    let name_size = name.len() as u32;
    let real_size = (data.len() * std::mem::size_of::<T>()) as u32;
    let matrix_size =
        element_len(8) + element_len(dims_size) + element_len(name_size) + element_len(real_size);

    write_tag(&mut w, MI_MATRIX, matrix_size)?;

    write_tag(&mut w, MI_UINT32, 8)?;
    w.write_all(&T::MAT_CLASS.to_le_bytes())?;
    w.write_all(&0u32.to_le_bytes())?;

    write_tag(&mut w, MI_INT32, dims_size)?;
    for &d in dimensions {
        w.write_all(&(d as i32).to_le_bytes())?;
    }
    write_padding(&mut w, dims_size)?;

    write_tag(&mut w, MI_INT8, name_size)?;
    w.write_all(name)?;
    write_padding(&mut w, name_size)?;

    write_tag(&mut w, T::MAT_TYPE, real_size)?;
    for &v in data {
        v.write_le(&mut w)?;
    }
    write_padding(&mut w, real_size)?;

    w.flush()?;
    Ok(())
}

/// Size of a tagged sub-element with `data_size` payload bytes, padded.
fn element_len(data_size: u32) -> u32 {
    8 + data_size.div_ceil(8) * 8
}

fn write_tag<W: Write>(w: &mut W, data_type: u32, size: u32) -> std::io::Result<()> {
    w.write_all(&data_type.to_le_bytes())?;
    w.write_all(&size.to_le_bytes())
}

fn write_padding<W: Write>(w: &mut W, data_size: u32) -> std::io::Result<()> {
    let pad = (data_size.div_ceil(8) * 8 - data_size) as usize;
    if pad > 0 {
        w.write_all(&[0u8; 8][..pad])?;
    }
    Ok(())
}
