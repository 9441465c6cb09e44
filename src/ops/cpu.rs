//! Scalar backend kernels.
//!
//! Each primitive works on a single span of a buffer. The buffer handed in
//! is the side of the memory block selected by the matrix backend (host or
//! accelerator mirror); operands of one call always come from the same side.
//!
//! Unit-stride spans take slice fast paths; everything else walks
//! `Span::indices`.

use crate::ops::span::Span;
use crate::scalar::{Norm, Numeric, Scalar};
use core::ops::Range;
use num_traits::{Float, Zero};

#[inline]
const fn run(span: Span) -> Range<usize> {
    span.offset..span.offset + span.len
}

/// Sets every element of the span to `value`.
pub fn fill<T: Scalar>(data: &mut [T], span: Span, value: T) {
    if span.stride == 1 {
        data[run(span)].fill(value);
    } else {
        for i in span.indices() {
            data[i] = value;
        }
    }
}

/// Applies `f` to every element of the span in place.
pub fn map<T: Scalar, F: Fn(T) -> T>(data: &mut [T], span: Span, f: F) {
    if span.stride == 1 {
        for x in &mut data[run(span)] {
            *x = f(*x);
        }
    } else {
        for i in span.indices() {
            data[i] = f(data[i]);
        }
    }
}

/// Adds `value` to every element.
pub fn scalar_add<T: Numeric>(data: &mut [T], span: Span, value: T) {
    map(data, span, |x| x + value);
}

/// Multiplies every element by `value`.
pub fn scal<T: Numeric>(data: &mut [T], span: Span, value: T) {
    map(data, span, |x| x * value);
}

/// Limits every element to `[lower, upper]`.
pub fn clamp<T: Scalar + PartialOrd>(data: &mut [T], span: Span, lower: T, upper: T) {
    map(data, span, |x| crate::scalar::clamp(x, lower, upper));
}

/// `dest[d] = f(src[s])` element by element.
pub fn map_from<T: Scalar, U: Scalar, F: Fn(U) -> T>(
    dest: &mut [T],
    d: Span,
    src: &[U],
    s: Span,
    f: F,
) {
    if d.stride == 1 && s.stride == 1 {
        for (x, &y) in dest[run(d)].iter_mut().zip(&src[run(s)]) {
            *x = f(y);
        }
    } else {
        for (i, j) in d.indices().zip(s.indices()) {
            dest[i] = f(src[j]);
        }
    }
}

/// Copies `src[s]` into `dest[d]`.
pub fn copy<T: Scalar>(dest: &mut [T], d: Span, src: &[T], s: Span) {
    if d.stride == 1 && s.stride == 1 {
        dest[run(d)].copy_from_slice(&src[run(s)]);
    } else {
        map_from(dest, d, src, s, |x| x);
    }
}

/// Component-wise product: `dest[d] *= src[s]`.
pub fn cmul<T: Numeric>(dest: &mut [T], d: Span, src: &[T], s: Span) {
    for (i, j) in d.indices().zip(s.indices()) {
        dest[i] = dest[i] * src[j];
    }
}

/// `dest[d] += alpha * src[s]`.
pub fn axpy<T: Numeric>(dest: &mut [T], d: Span, alpha: T, src: &[T], s: Span) {
    for (i, j) in d.indices().zip(s.indices()) {
        dest[i] = dest[i] + alpha * src[j];
    }
}

/// Sum of the span, seeded with `seed`.
pub fn sum<T: Numeric>(data: &[T], span: Span, seed: T) -> T {
    if span.stride == 1 {
        data[run(span)].iter().fold(seed, |acc, &x| acc + x)
    } else {
        span.indices().fold(seed, |acc, i| acc + data[i])
    }
}

/// Sum of products of two spans.
pub fn dot<T: Numeric>(a: &[T], sa: Span, b: &[T], sb: Span) -> T {
    sa.indices()
        .zip(sb.indices())
        .fold(T::zero(), |acc, (i, j)| acc + a[i] * b[j])
}

/// Euclidean norm of the span.
pub fn nrm2<T: Norm>(data: &[T], span: Span) -> T::Real {
    span.indices()
        .fold(T::Real::zero(), |acc, i| acc + data[i].abs_sq())
        .sqrt()
}

/// Approximate equality of two spans.
pub fn equals<T: Scalar>(a: &[T], sa: Span, b: &[T], sb: Span, epsilon: f32) -> bool {
    sa.indices()
        .zip(sb.indices())
        .all(|(i, j)| a[i].approx_eq(b[j], epsilon))
}
