//! Span iteration over strided N-dimensional layouts.
//!
//! A matrix view of any stride pattern is decomposed into *spans*: maximal
//! runs along its fastest varying dimension, each described by a start
//! offset, a stride and a length. Element-wise kernels only ever see one
//! span at a time, so they are written once for 1-D strided data.
//!
//! # Traversal
//!
//! 1. The fastest dimension (last for row-major, first for column-major)
//!    gives the span length and stride.
//! 2. The remaining dimensions are walked odometer style, next-fastest
//!    first, and each combination yields the offset of one span.
//!
//! Contiguous views and 1-D views skip the walk and yield a single span;
//! both paths visit the same elements in the same order.

use crate::matrix::MajorOrder;

/// A run of `len` elements starting at `offset`, `stride` elements apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Index of the first element in the block.
    pub offset: usize,
    /// Distance between consecutive elements.
    pub stride: usize,
    /// Number of elements.
    pub len: usize,
}

impl Span {
    /// Creates a span.
    #[must_use]
    pub const fn new(offset: usize, stride: usize, len: usize) -> Self {
        Self {
            offset,
            stride,
            len,
        }
    }

    /// Index of the last element.
    #[must_use]
    pub const fn last(&self) -> usize {
        self.offset + (self.len - 1) * self.stride
    }

    /// Block indices covered by the span, in order.
    pub fn indices(self) -> impl Iterator<Item = usize> {
        (0..self.len).map(move |i| self.offset + i * self.stride)
    }

    /// Drops the first `n` elements.
    #[must_use]
    pub const fn advance(self, n: usize) -> Self {
        Self {
            offset: self.offset + n * self.stride,
            stride: self.stride,
            len: self.len - n,
        }
    }

    /// The same span truncated or extended to `len` elements.
    #[must_use]
    pub const fn with_len(self, len: usize) -> Self {
        Self {
            offset: self.offset,
            stride: self.stride,
            len,
        }
    }

    /// The same span rebased so that its first element sits at `offset`.
    #[must_use]
    pub const fn rebased(self, offset: usize) -> Self {
        Self {
            offset,
            stride: self.stride,
            len: self.len,
        }
    }
}

/// Borrowed geometry of a matrix view.
#[derive(Debug, Clone, Copy)]
pub struct Layout<'a> {
    /// Extent of every dimension.
    pub dims: &'a [usize],
    /// Stride of every dimension, in elements.
    pub strides: &'a [usize],
    /// Index of the first element in the block.
    pub offset: usize,
    /// Fastest varying dimension convention.
    pub order: MajorOrder,
    /// Whether `strides` are canonical for `dims` and `order`.
    pub contiguous: bool,
}

/// Dimension indices from fastest to slowest varying.
#[must_use]
pub fn traversal_axes(ndim: usize, order: MajorOrder) -> Vec<usize> {
    match order {
        MajorOrder::RowMajor => (0..ndim).rev().collect(),
        MajorOrder::ColMajor => (0..ndim).collect(),
    }
}

/// Canonical strides of a freshly allocated matrix.
#[must_use]
pub fn canonical_strides(dims: &[usize], order: MajorOrder) -> Vec<usize> {
    let mut strides = vec![0; dims.len()];
    let mut step = 1;
    for axis in traversal_axes(dims.len(), order) {
        strides[axis] = step;
        step *= dims[axis];
    }
    strides
}

/// Checks that every stride equals the product of the faster extents.
///
/// Dimensions of extent 1 never move the cursor, so their stride is ignored.
#[must_use]
pub fn is_contiguous(dims: &[usize], strides: &[usize], order: MajorOrder) -> bool {
    let mut expected = 1;
    for axis in traversal_axes(dims.len(), order) {
        if dims[axis] != 1 && strides[axis] != expected {
            return false;
        }
        expected *= dims[axis];
    }
    true
}

/// Iterator over the spans of one layout, in traversal order.
#[derive(Debug, Clone)]
pub struct SpanIter {
    outer_dims: Vec<usize>,
    outer_strides: Vec<usize>,
    counters: Vec<usize>,
    base: usize,
    stride: usize,
    len: usize,
    remaining: usize,
}

impl SpanIter {
    /// Plans the spans of `layout`.
    #[must_use]
    pub fn new(layout: &Layout<'_>) -> Self {
        if layout.contiguous {
            let total = layout.dims.iter().product();
            return Self::single(Span::new(layout.offset, 1, total));
        }
        if layout.dims.len() == 1 {
            return Self::single(Span::new(layout.offset, layout.strides[0], layout.dims[0]));
        }

        let axes = traversal_axes(layout.dims.len(), layout.order);
        let fast = axes[0];
        let outer_dims: Vec<usize> = axes[1..].iter().map(|&a| layout.dims[a]).collect();
        let outer_strides = axes[1..].iter().map(|&a| layout.strides[a]).collect();
        let remaining = outer_dims.iter().product();
        Self {
            counters: vec![0; outer_dims.len()],
            outer_dims,
            outer_strides,
            base: layout.offset,
            stride: layout.strides[fast],
            len: layout.dims[fast],
            remaining,
        }
    }

    fn single(span: Span) -> Self {
        Self {
            outer_dims: Vec::new(),
            outer_strides: Vec::new(),
            counters: Vec::new(),
            base: span.offset,
            stride: span.stride,
            len: span.len,
            remaining: 1,
        }
    }

    /// Length shared by every span of this iterator.
    #[must_use]
    pub const fn span_len(&self) -> usize {
        self.len
    }
}

impl Iterator for SpanIter {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        if self.remaining == 0 {
            return None;
        }
        let offset = self.base
            + self
                .counters
                .iter()
                .zip(&self.outer_strides)
                .map(|(c, s)| c * s)
                .sum::<usize>();
        self.remaining -= 1;
        for (counter, &dim) in self.counters.iter_mut().zip(&self.outer_dims) {
            *counter += 1;
            if *counter < dim {
                break;
            }
            *counter = 0;
        }
        Some(Span::new(offset, self.stride, self.len))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for SpanIter {}

/// Walks two layouts of equal size in lock step.
///
/// Span boundaries of the two operands need not agree; each yielded pair
/// covers the longest run that stays inside one span of both.
#[derive(Debug, Clone)]
pub struct ZipSpans {
    a: SpanIter,
    b: SpanIter,
    pending_a: Option<Span>,
    pending_b: Option<Span>,
}

impl ZipSpans {
    /// Pairs the spans of `a` and `b`.
    #[must_use]
    pub const fn new(a: SpanIter, b: SpanIter) -> Self {
        Self {
            a,
            b,
            pending_a: None,
            pending_b: None,
        }
    }
}

impl Iterator for ZipSpans {
    type Item = (Span, Span);

    fn next(&mut self) -> Option<(Span, Span)> {
        let a = match self.pending_a.take() {
            Some(span) => span,
            None => self.a.next()?,
        };
        let b = match self.pending_b.take() {
            Some(span) => span,
            None => self.b.next()?,
        };
        let len = a.len.min(b.len);
        if a.len > len {
            self.pending_a = Some(a.advance(len));
        }
        if b.len > len {
            self.pending_b = Some(b.advance(len));
        }
        Some((
            Span::new(a.offset, a.stride, len),
            Span::new(b.offset, b.stride, len),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout<'a>(
        dims: &'a [usize],
        strides: &'a [usize],
        offset: usize,
        order: MajorOrder,
    ) -> Layout<'a> {
        Layout {
            dims,
            strides,
            offset,
            order,
            contiguous: is_contiguous(dims, strides, order),
        }
    }

    #[test]
    fn canonical_strides_follow_major_order() {
        assert_eq!(canonical_strides(&[2, 3, 4], MajorOrder::RowMajor), vec![12, 4, 1]);
        assert_eq!(canonical_strides(&[2, 3, 4], MajorOrder::ColMajor), vec![1, 2, 6]);
    }

    #[test]
    fn contiguous_view_is_one_span() {
        let strides = canonical_strides(&[3, 4], MajorOrder::RowMajor);
        let spans: Vec<_> = SpanIter::new(&layout(&[3, 4], &strides, 0, MajorOrder::RowMajor)).collect();
        assert_eq!(spans, vec![Span::new(0, 1, 12)]);
    }

    #[test]
    fn sub_matrix_yields_one_span_per_row() {
        // 2x2 window at (1, 1) of a 4x4 row-major matrix
        let l = layout(&[2, 2], &[4, 1], 5, MajorOrder::RowMajor);
        assert!(!l.contiguous);
        let spans: Vec<_> = SpanIter::new(&l).collect();
        assert_eq!(spans, vec![Span::new(5, 1, 2), Span::new(9, 1, 2)]);
    }

    #[test]
    fn col_major_walks_first_dimension_fastest() {
        // 3x2 window of a 4x4 column-major matrix
        let l = layout(&[3, 2], &[1, 4], 0, MajorOrder::ColMajor);
        let spans: Vec<_> = SpanIter::new(&l).collect();
        assert_eq!(spans, vec![Span::new(0, 1, 3), Span::new(4, 1, 3)]);
    }

    #[test]
    fn three_dimensional_odometer() {
        // every other element along the last axis
        let l = layout(&[2, 2, 2], &[8, 4, 2], 0, MajorOrder::RowMajor);
        let offsets: Vec<_> = SpanIter::new(&l).map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 4, 8, 12]);
        assert!(SpanIter::new(&l).all(|s| s.stride == 2 && s.len == 2));
    }

    #[test]
    fn extent_one_dims_do_not_break_contiguity() {
        assert!(is_contiguous(&[1, 5], &[99, 1], MajorOrder::RowMajor));
        assert!(!is_contiguous(&[2, 5], &[6, 1], MajorOrder::RowMajor));
    }

    #[test]
    fn zip_splits_mismatched_spans() {
        // 2x3 contiguous against a transposed 3x2 view
        let a = layout(&[2, 3], &[3, 1], 0, MajorOrder::RowMajor);
        let b = layout(&[3, 2], &[1, 3], 0, MajorOrder::RowMajor);
        let pairs: Vec<_> = ZipSpans::new(SpanIter::new(&a), SpanIter::new(&b)).collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0], (Span::new(0, 1, 2), Span::new(0, 3, 2)));
        assert_eq!(pairs[1], (Span::new(2, 1, 2), Span::new(1, 3, 2)));
        assert_eq!(pairs[2], (Span::new(4, 1, 2), Span::new(2, 3, 2)));
    }

    #[test]
    fn zip_chunks_when_lengths_differ() {
        // 6-element vector against a 2x3 row-major sub-matrix of a 2x4 block
        let a = layout(&[6], &[1], 0, MajorOrder::RowMajor);
        let b = layout(&[2, 3], &[4, 1], 0, MajorOrder::RowMajor);
        let pairs: Vec<_> = ZipSpans::new(SpanIter::new(&a), SpanIter::new(&b)).collect();
        assert_eq!(
            pairs,
            vec![
                (Span::new(0, 1, 3), Span::new(0, 1, 3)),
                (Span::new(3, 1, 3), Span::new(4, 1, 3)),
            ]
        );
    }
}
