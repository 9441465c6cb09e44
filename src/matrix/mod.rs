//! Core matrix data structure and view management.
//!
//! # Matrix
//!
//! A [`Matrix<T>`] is an N-dimensional view over a shared
//! [`MemoryBlock`]: per-dimension extents and strides, a base offset, a
//! [`MajorOrder`] and a [`Backend`]. Sub-matrices, transposes and reshapes
//! are new views over the same block; nothing is copied until
//! [`Clone::clone`] is called.
//!
//! ## Design Highlights
//! - Extents are all ≥ 1 and `size() == product(dims())`
//! - Contiguity is cached per view and recomputed for every derived view
//! - Binary operations require equal sizes, and (for copy-like operations)
//!   equal major orders; violations are reported as contract errors
//! - The block is reference counted; the last view dropped frees it
//!
//! ## Example
//!
//! ```rust
//! use april_matrix::{MajorOrder, Matrix};
//!
//! let mut m = Matrix::<f32>::new(&[3, 4]).unwrap();
//! m.fill(2.0);
//! m.scalar_add(1.0);
//! assert_eq!(m.sum(), 36.0);
//! assert_eq!(m.major_order(), MajorOrder::RowMajor);
//! ```

mod convert;
mod math;

use crate::backend::{Backend, Dispatch};
use crate::error::{Error, Result};
use crate::memory::{MemoryBlock, SharedBlock};
use crate::ops::span::{self, Layout, SpanIter, ZipSpans};
use crate::scalar::Scalar;
use parking_lot::RwLockWriteGuard;
use std::sync::Arc;

/// Which dimension varies fastest in linear memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MajorOrder {
    /// Last dimension fastest (C order).
    #[default]
    RowMajor,
    /// First dimension fastest (Fortran order).
    ColMajor,
}

impl MajorOrder {
    /// Tag used by the serialization header.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::RowMajor => "row_major",
            Self::ColMajor => "col_major",
        }
    }

    /// Parses a serialization header tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "row_major" => Some(Self::RowMajor),
            "col_major" => Some(Self::ColMajor),
            _ => None,
        }
    }
}

/// An N-dimensional strided view over a shared memory block.
#[derive(Debug)]
pub struct Matrix<T> {
    block: SharedBlock<T>,
    dims: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
    order: MajorOrder,
    backend: Backend,
    total_size: usize,
    contiguous: bool,
}

fn validate_dims(dims: &[usize]) -> Result<usize> {
    if dims.is_empty() || dims.contains(&0) {
        return Err(Error::InvalidDimensions(dims.to_vec()));
    }
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| Error::InvalidDimensions(dims.to_vec()))
}

/// Write-locks two distinct blocks in address order.
fn lock_both<'a, T>(
    a: &'a SharedBlock<T>,
    b: &'a SharedBlock<T>,
) -> (
    RwLockWriteGuard<'a, MemoryBlock<T>>,
    RwLockWriteGuard<'a, MemoryBlock<T>>,
) {
    if Arc::as_ptr(a) < Arc::as_ptr(b) {
        let ga = a.write();
        let gb = b.write();
        (ga, gb)
    } else {
        let gb = b.write();
        let ga = a.write();
        (ga, gb)
    }
}

impl<T: Scalar> Matrix<T> {
    /// Creates a zero-filled row-major matrix on the CPU backend.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimensions`] if `dims` is empty or has a zero extent
    /// - [`Error::AllocationFailed`] if the block cannot be allocated
    pub fn new(dims: &[usize]) -> Result<Self> {
        Self::with_options(dims, MajorOrder::RowMajor, Backend::Cpu)
    }

    /// Creates a zero-filled matrix with explicit layout and backend.
    ///
    /// # Errors
    ///
    /// Same as [`Matrix::new`].
    pub fn with_options(dims: &[usize], order: MajorOrder, backend: Backend) -> Result<Self> {
        let total = validate_dims(dims)?;
        let block = MemoryBlock::allocate(total)?;
        Ok(Self::from_block(block.into_shared(), dims.to_vec(), order, backend))
    }

    /// Creates a matrix from elements given in traversal order.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimensions`] for bad extents
    /// - [`Error::SizeMismatch`] if `data.len()` differs from the extents' product
    pub fn from_vec(dims: &[usize], order: MajorOrder, data: Vec<T>) -> Result<Self> {
        let total = validate_dims(dims)?;
        if data.len() != total {
            return Err(Error::SizeMismatch {
                op: "from_vec",
                left: total,
                right: data.len(),
            });
        }
        Ok(Self::from_block(
            MemoryBlock::from_vec(data).into_shared(),
            dims.to_vec(),
            order,
            Backend::Cpu,
        ))
    }

    fn from_block(block: SharedBlock<T>, dims: Vec<usize>, order: MajorOrder, backend: Backend) -> Self {
        let strides = span::canonical_strides(&dims, order);
        let total_size = dims.iter().product();
        Self {
            block,
            dims,
            strides,
            offset: 0,
            order,
            backend,
            total_size,
            contiguous: true,
        }
    }

    fn derive(&self, dims: Vec<usize>, strides: Vec<usize>, offset: usize, order: MajorOrder) -> Self {
        let contiguous = span::is_contiguous(&dims, &strides, order);
        Self {
            block: Arc::clone(&self.block),
            total_size: dims.iter().product(),
            dims,
            strides,
            offset,
            order,
            backend: self.backend,
            contiguous,
        }
    }

    /// Extent of every dimension.
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Stride of every dimension, in elements.
    #[must_use]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Index of the first element within the block.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Number of dimensions.
    #[must_use]
    pub fn num_dim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.total_size
    }

    /// Major order of the view.
    #[must_use]
    pub const fn major_order(&self) -> MajorOrder {
        self.order
    }

    /// Backend used by this view.
    #[must_use]
    pub const fn backend(&self) -> Backend {
        self.backend
    }

    /// Switches the backend of this view only.
    pub fn set_backend(&mut self, backend: Backend) {
        self.backend = backend;
    }

    /// Whether the strides are canonical for the extents and major order.
    #[must_use]
    pub const fn is_contiguous(&self) -> bool {
        self.contiguous
    }

    /// Borrowed geometry, as consumed by the span iterator.
    #[must_use]
    pub fn layout(&self) -> Layout<'_> {
        Layout {
            dims: &self.dims,
            strides: &self.strides,
            offset: self.offset,
            order: self.order,
            contiguous: self.contiguous,
        }
    }

    /// Spans of this view in traversal order.
    #[must_use]
    pub fn spans(&self) -> SpanIter {
        SpanIter::new(&self.layout())
    }

    /// Spans of this view paired with those of `other`.
    #[must_use]
    pub fn zip_spans(&self, other: &Self) -> ZipSpans {
        ZipSpans::new(self.spans(), other.spans())
    }

    /// Returns `true` if both views alias the same block.
    #[must_use]
    pub fn shares_block(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.block, &other.block)
    }

    /// Number of views currently sharing the block.
    #[must_use]
    pub fn block_refs(&self) -> usize {
        Arc::strong_count(&self.block)
    }

    fn is_same_view(&self, other: &Self) -> bool {
        self.shares_block(other)
            && self.offset == other.offset
            && self.dims == other.dims
            && self.strides == other.strides
    }

    /// `true` iff both matrices have the same extents.
    #[must_use]
    pub fn same_dim(&self, other: &Self) -> bool {
        self.dims == other.dims
    }

    fn linear_index(&self, coords: &[usize]) -> Result<usize> {
        if coords.len() != self.dims.len() || coords.iter().zip(&self.dims).any(|(c, d)| c >= d) {
            return Err(Error::IndexOutOfBounds {
                coords: coords.to_vec(),
                dims: self.dims.clone(),
            });
        }
        Ok(self.offset
            + coords
                .iter()
                .zip(&self.strides)
                .map(|(c, s)| c * s)
                .sum::<usize>())
    }

    /// Reads the element at `coords`.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfBounds`] for wrong arity or out-of-range coordinates.
    pub fn get(&self, coords: &[usize]) -> Result<T> {
        let index = self.linear_index(coords)?;
        let mut block = self.block.write();
        Ok(block.slice(self.backend)[index])
    }

    /// Writes the element at `coords`.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfBounds`] for wrong arity or out-of-range coordinates.
    pub fn set(&mut self, coords: &[usize], value: T) -> Result<()> {
        let index = self.linear_index(coords)?;
        let mut block = self.block.write();
        block.slice_mut(self.backend)[index] = value;
        Ok(())
    }

    /// Copies the elements out in traversal order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        let spans = self.spans();
        self.with_data(|data| spans.flat_map(span::Span::indices).map(|i| data[i]).collect())
    }

    /// Shallow alias of this view.
    #[must_use]
    pub fn view(&self) -> Self {
        self.derive(self.dims.clone(), self.strides.clone(), self.offset, self.order)
    }

    /// Window of extents `sizes` starting at `coords`.
    ///
    /// # Errors
    ///
    /// - [`Error::IndexOutOfBounds`] if the window leaves the matrix
    /// - [`Error::InvalidDimensions`] if a size is zero
    pub fn sub_matrix(&self, coords: &[usize], sizes: &[usize]) -> Result<Self> {
        validate_dims(sizes)?;
        let fits = coords.len() == self.dims.len()
            && sizes.len() == self.dims.len()
            && coords
                .iter()
                .zip(sizes)
                .zip(&self.dims)
                .all(|((c, s), d)| c + s <= *d);
        if !fits {
            return Err(Error::IndexOutOfBounds {
                coords: coords.to_vec(),
                dims: self.dims.clone(),
            });
        }
        let offset = self.offset
            + coords
                .iter()
                .zip(&self.strides)
                .map(|(c, s)| c * s)
                .sum::<usize>();
        Ok(self.derive(sizes.to_vec(), self.strides.clone(), offset, self.order))
    }

    /// View with dimension `dim` fixed at `index` and removed.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimensions`] on a 1-D matrix
    /// - [`Error::IndexOutOfBounds`] for a bad `dim` or `index`
    pub fn select(&self, dim: usize, index: usize) -> Result<Self> {
        if self.dims.len() < 2 {
            return Err(Error::InvalidDimensions(Vec::new()));
        }
        if dim >= self.dims.len() || index >= self.dims[dim] {
            return Err(Error::IndexOutOfBounds {
                coords: vec![dim, index],
                dims: self.dims.clone(),
            });
        }
        let mut dims = self.dims.clone();
        let mut strides = self.strides.clone();
        dims.remove(dim);
        let stride = strides.remove(dim);
        Ok(self.derive(dims, strides, self.offset + index * stride, self.order))
    }

    /// View with extents and strides reversed.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let dims = self.dims.iter().rev().copied().collect();
        let strides = self.strides.iter().rev().copied().collect();
        self.derive(dims, strides, self.offset, self.order)
    }

    /// Same elements under new extents.
    ///
    /// # Errors
    ///
    /// - [`Error::SizeMismatch`] if the element count changes
    /// - [`Error::NotContiguous`] if this view is strided
    pub fn rewrap(&self, dims: &[usize]) -> Result<Self> {
        let total = validate_dims(dims)?;
        if total != self.total_size {
            return Err(Error::SizeMismatch {
                op: "rewrap",
                left: self.total_size,
                right: total,
            });
        }
        if !self.contiguous {
            return Err(Error::NotContiguous { op: "rewrap" });
        }
        let strides = span::canonical_strides(dims, self.order);
        Ok(self.derive(dims.to_vec(), strides, self.offset, self.order))
    }

    /// The same logical elements, traversed in `order`.
    pub(crate) fn reordered(&self, order: MajorOrder) -> Self {
        self.derive(self.dims.clone(), self.strides.clone(), self.offset, order)
    }

    /// Same extents, layout and backend over a fresh zeroed block.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailed`] if the block cannot be allocated.
    pub fn clone_only_dims(&self) -> Result<Self> {
        Self::with_options(&self.dims, self.order, self.backend)
    }

    pub(crate) fn check_size(&self, op: &'static str, other: usize) -> Result<()> {
        if self.total_size == other {
            Ok(())
        } else {
            Err(Error::SizeMismatch {
                op,
                left: self.total_size,
                right: other,
            })
        }
    }

    pub(crate) fn check_order(&self, op: &'static str, other: &Self) -> Result<()> {
        if self.order == other.order {
            Ok(())
        } else {
            Err(Error::MajorOrderMismatch { op })
        }
    }

    pub(crate) const fn parallel(&self, policy: Dispatch) -> bool {
        policy.runs_parallel(self.backend, self.total_size)
    }

    pub(crate) fn with_data<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let mut block = self.block.write();
        f(block.slice(self.backend))
    }

    pub(crate) fn with_data_mut<R>(&mut self, f: impl FnOnce(&mut [T]) -> R) -> R {
        let mut block = self.block.write();
        f(block.slice_mut(self.backend))
    }

    /// Read access to both operands on this view's backend.
    pub(crate) fn with_pair<R>(&self, other: &Self, f: impl FnOnce(&[T], &[T]) -> R) -> R {
        let backend = self.backend;
        if self.shares_block(other) {
            let mut block = self.block.write();
            let data = block.slice(backend);
            return f(data, data);
        }
        let (mut a, mut b) = lock_both(&self.block, &other.block);
        f(a.slice(backend), b.slice(backend))
    }

    /// Write access to `self` and read access to `other`.
    ///
    /// When both alias one block the source is read from a snapshot taken
    /// before any write.
    pub(crate) fn with_pair_mut<R>(&mut self, other: &Self, f: impl FnOnce(&mut [T], &[T]) -> R) -> R {
        let backend = self.backend;
        if self.shares_block(other) {
            let mut block = self.block.write();
            let data = block.slice_mut(backend);
            let snapshot = data.to_vec();
            return f(data, &snapshot);
        }
        let (mut dest, mut source) = lock_both(&self.block, &other.block);
        let src = source.slice(backend);
        f(dest.slice_mut(backend), src)
    }
}

impl<T: Scalar> Clone for Matrix<T> {
    /// Deep copy: same extents, major order and backend, compact layout.
    fn clone(&self) -> Self {
        Self::from_block(
            MemoryBlock::from_vec(self.to_vec()).into_shared(),
            self.dims.clone(),
            self.order,
            self.backend,
        )
    }
}
