// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt::{self, Debug, Display};

use num_traits::Float;

use crate::error::{ReinitError, Result};

/// Floating-point type the kernel computes in.
///
/// One precision is used for every field of a call; the boundary layer
/// rejects inputs stored in any other precision.
pub trait Real: Float + Debug + Display + Send + Sync + 'static {
    /// Human-readable precision name ("single" or "double").
    const PRECISION: &'static str;

    /// Convert from an `f64` literal or configuration value.
    fn from_f64(v: f64) -> Self;
}

impl Real for f64 {
    const PRECISION: &'static str = "double";

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
}

impl Real for f32 {
    const PRECISION: &'static str = "single";

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

/// Precision selected at build time for the command-line tool.
#[cfg(not(feature = "single-precision"))]
pub type LsmReal = f64;

/// Precision selected at build time for the command-line tool.
#[cfg(feature = "single-precision")]
pub type LsmReal = f32;

/// An axis-aligned index box with inclusive `[lo, hi]` bounds per axis.
///
/// A box with `lo > hi` on any axis is empty. Storage over a box is always
/// row-major: the last axis varies fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBox<const N: usize> {
    lo: [i64; N],
    hi: [i64; N],
}

#[allow(clippy::needless_range_loop)]
impl<const N: usize> GridBox<N> {
    /// Create a box from inclusive bounds.
    ///
    /// # Errors
    /// Returns an error if `lo > hi + 1` on some axis. `lo == hi + 1` is
    /// accepted and describes an empty axis.
    pub fn new(lo: [i64; N], hi: [i64; N]) -> Result<Self> {
        assert!(N >= 1, "GridBox needs at least one axis");
        for axis in 0..N {
            if lo[axis] > hi[axis] + 1 {
                return Err(ReinitError::InvalidGridBox {
                    axis,
                    lo: lo[axis],
                    hi: hi[axis],
                });
            }
        }
        Ok(GridBox { lo, hi })
    }

    /// The box `[0, shape[d] - 1]` on every axis.
    pub fn from_shape(shape: [usize; N]) -> Self {
        let lo = [0i64; N];
        let mut hi = [0i64; N];
        for d in 0..N {
            hi[d] = shape[d] as i64 - 1;
        }
        GridBox { lo, hi }
    }

    /// Lower bounds (inclusive).
    pub fn lo(&self) -> [i64; N] {
        self.lo
    }

    /// Upper bounds (inclusive).
    pub fn hi(&self) -> [i64; N] {
        self.hi
    }

    /// Number of cells along `axis`, zero when the axis is empty.
    pub fn extent(&self, axis: usize) -> usize {
        (self.hi[axis] - self.lo[axis] + 1).max(0) as usize
    }

    /// Number of cells along every axis.
    pub fn shape(&self) -> [usize; N] {
        let mut shape = [0usize; N];
        for d in 0..N {
            shape[d] = self.extent(d);
        }
        shape
    }

    /// Total number of cells.
    pub fn num_cells(&self) -> usize {
        self.shape().iter().product()
    }

    /// True if some axis has no cells.
    pub fn is_empty(&self) -> bool {
        (0..N).any(|d| self.lo[d] > self.hi[d])
    }

    /// True if `idx` lies inside the box.
    pub fn contains(&self, idx: [i64; N]) -> bool {
        (0..N).all(|d| self.lo[d] <= idx[d] && idx[d] <= self.hi[d])
    }

    /// True if every cell of `other` lies inside this box. An empty box is
    /// contained in every box.
    pub fn contains_box(&self, other: &GridBox<N>) -> bool {
        other.is_empty()
            || (0..N).all(|d| self.lo[d] <= other.lo[d] && other.hi[d] <= self.hi[d])
    }

    /// Shrink every axis inward by `width` cells.
    ///
    /// This is how a fill box is derived from a ghost box. The result is
    /// empty when `width` reaches half the extent of some axis, however
    /// large `width` is.
    pub fn shrink(&self, width: usize) -> Self {
        let mut lo = self.lo;
        let mut hi = self.hi;
        for d in 0..N {
            // Shrinking by the full extent already empties the axis.
            let w = width.min(self.extent(d)) as i64;
            lo[d] += w;
            hi[d] -= w;
        }
        GridBox { lo, hi }
    }

    /// Re-express this box in the index space of `outer`, centered by
    /// [`alignment_offset`].
    ///
    /// The returned box keeps this box's extents; its lower corner sits at
    /// `outer.lo + alignment_offset(outer, self)`.
    pub fn centered_in(&self, outer: &GridBox<N>) -> Self {
        let offset = alignment_offset(outer, self);
        let mut lo = [0i64; N];
        let mut hi = [0i64; N];
        for d in 0..N {
            lo[d] = outer.lo[d] + offset[d];
            hi[d] = lo[d] + self.extent(d) as i64 - 1;
        }
        GridBox { lo, hi }
    }

    /// Restrict `axis` to the single index `at`.
    pub fn slab(&self, axis: usize, at: i64) -> Self {
        let mut lo = self.lo;
        let mut hi = self.hi;
        lo[axis] = at;
        hi[axis] = at;
        GridBox { lo, hi }
    }

    /// Row-major strides for storage over this box.
    pub fn strides(&self) -> [usize; N] {
        let shape = self.shape();
        let mut strides = [0usize; N];
        strides[N - 1] = 1;
        for d in (0..N - 1).rev() {
            strides[d] = strides[d + 1] * shape[d + 1];
        }
        strides
    }

    /// Offset of `idx` in row-major storage over this box.
    ///
    /// `idx` must lie inside the box.
    #[inline]
    pub fn linear_index(&self, idx: [i64; N]) -> usize {
        self.linear_index_with(&self.strides(), idx)
    }

    /// [`linear_index`](Self::linear_index) with strides computed once by
    /// the caller through [`strides`](Self::strides).
    #[inline]
    pub fn linear_index_with(&self, strides: &[usize; N], idx: [i64; N]) -> usize {
        debug_assert!(
            self.contains(idx),
            "index {:?} outside box {:?}",
            idx,
            self
        );
        let mut flat = 0usize;
        for d in 0..N {
            flat += (idx[d] - self.lo[d]) as usize * strides[d];
        }
        flat
    }

    /// Iterate over every index of the box in storage order.
    pub fn indices(&self) -> BoxIndices<N> {
        BoxIndices {
            lo: self.lo,
            hi: self.hi,
            next: if self.is_empty() { None } else { Some(self.lo) },
        }
    }
}

impl<const N: usize> fmt::Display for GridBox<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in 0..N {
            if d > 0 {
                write!(f, " x ")?;
            }
            write!(f, "[{}, {}]", self.lo[d], self.hi[d])?;
        }
        Ok(())
    }
}

/// Per-axis offset that centers box `b` inside box `a`.
///
/// On each axis the offset is `floor((extent_a - extent_b) / 2)` when the
/// extents differ and zero otherwise. A coordinate `x` in `a`'s index space
/// corresponds to `x - a.lo - offset + b.lo` in `b`'s own index space.
pub fn alignment_offset<const N: usize>(a: &GridBox<N>, b: &GridBox<N>) -> [i64; N] {
    let mut offset = [0i64; N];
    for (d, off) in offset.iter_mut().enumerate() {
        let ea = a.extent(d) as i64;
        let eb = b.extent(d) as i64;
        if ea != eb {
            *off = (ea - eb).div_euclid(2);
        }
    }
    offset
}

/// Row-major iterator over the indices of a [`GridBox`].
#[derive(Debug, Clone)]
pub struct BoxIndices<const N: usize> {
    lo: [i64; N],
    hi: [i64; N],
    next: Option<[i64; N]>,
}

impl<const N: usize> Iterator for BoxIndices<N> {
    type Item = [i64; N];

    fn next(&mut self) -> Option<[i64; N]> {
        let current = self.next?;
        let mut idx = current;
        self.next = None;
        for d in (0..N).rev() {
            if idx[d] < self.hi[d] {
                idx[d] += 1;
                self.next = Some(idx);
                break;
            }
            idx[d] = self.lo[d];
        }
        Some(current)
    }
}

/// A dense scalar field owning its storage over a ghost box.
#[derive(Debug, Clone, PartialEq)]
pub struct Field<T, const N: usize> {
    grid_box: GridBox<N>,
    data: Box<[T]>,
}

impl<T: Real, const N: usize> Field<T, N> {
    /// A field of zeros over `grid_box`.
    pub fn zeros(grid_box: GridBox<N>) -> Self {
        Field {
            grid_box,
            data: vec![T::zero(); grid_box.num_cells()].into_boxed_slice(),
        }
    }

    /// Wrap row-major `data` laid out over `grid_box`.
    ///
    /// # Errors
    /// Returns an error if `data.len()` differs from the number of cells.
    pub fn new(grid_box: GridBox<N>, data: Vec<T>) -> Result<Self> {
        check_len(&grid_box, data.len())?;
        Ok(Field {
            grid_box,
            data: data.into_boxed_slice(),
        })
    }

    /// Build a field by evaluating `f` at every index of `grid_box`.
    pub fn from_fn(grid_box: GridBox<N>, f: impl FnMut([i64; N]) -> T) -> Self {
        Field {
            grid_box,
            data: grid_box.indices().map(f).collect::<Vec<_>>().into_boxed_slice(),
        }
    }

    /// The ghost box the field is stored over.
    pub fn grid_box(&self) -> &GridBox<N> {
        &self.grid_box
    }

    /// Value at `idx`.
    #[inline]
    pub fn get(&self, idx: [i64; N]) -> T {
        self.data[self.grid_box.linear_index(idx)]
    }

    /// Overwrite the value at `idx`.
    #[inline]
    pub fn set(&mut self, idx: [i64; N], value: T) {
        let flat = self.grid_box.linear_index(idx);
        self.data[flat] = value;
    }

    /// Row-major storage.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the field and return its row-major storage.
    pub fn into_vec(self) -> Vec<T> {
        self.data.into_vec()
    }

    /// Borrow the field read-only.
    pub fn view(&self) -> FieldView<'_, T, N> {
        FieldView {
            grid_box: self.grid_box,
            data: &self.data,
        }
    }
}

/// A read-only borrow of row-major field data over a ghost box.
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'a, T, const N: usize> {
    grid_box: GridBox<N>,
    data: &'a [T],
}

impl<'a, T: Real, const N: usize> FieldView<'a, T, N> {
    /// Borrow `data` as a field over `grid_box`.
    ///
    /// # Errors
    /// Returns an error if `data.len()` differs from the number of cells.
    pub fn new(grid_box: GridBox<N>, data: &'a [T]) -> Result<Self> {
        check_len(&grid_box, data.len())?;
        Ok(FieldView { grid_box, data })
    }

    /// The ghost box the data is laid out over.
    pub fn grid_box(&self) -> &GridBox<N> {
        &self.grid_box
    }

    /// Value at `idx`.
    #[inline]
    pub fn get(&self, idx: [i64; N]) -> T {
        self.data[self.grid_box.linear_index(idx)]
    }

    /// Row-major storage.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }
}

fn check_len<const N: usize>(grid_box: &GridBox<N>, len: usize) -> Result<()> {
    if len != grid_box.num_cells() {
        return Err(ReinitError::ShapeMismatch {
            field: "field data".to_string(),
            expected: grid_box.shape().to_vec(),
            got: vec![len],
        });
    }
    Ok(())
}
