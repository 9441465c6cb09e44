//! Functor Dispatch Layer
//!
//! Generic higher-order drivers that feed spans to a per-span functor:
//!
//! - [`apply_unary`] — in-place operation on one operand;
//! - [`apply_binary`] — in-place operation reading a second operand;
//! - [`reduce`] / [`reduce_pairs`] — fold per-span partial results;
//! - [`all_pairs`] — binary predicate folded with logical AND.
//!
//! Every driver takes a `parallel` flag (see
//! [`Dispatch::runs_parallel`](crate::Dispatch::runs_parallel)). In-place
//! drivers only go parallel when the spans occupy disjoint index ranges of
//! the written buffer; otherwise they fall back to the sequential walk.
//! Reductions compute span partials concurrently but always combine them
//! left to right, so both policies produce identical values.

use crate::ops::span::{Span, SpanIter, ZipSpans};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Longest run handed to one parallel task.
#[cfg(feature = "parallel")]
const CHUNK_LEN: usize = 1 << 12;

#[cfg(feature = "parallel")]
fn chunks(span: Span) -> impl Iterator<Item = Span> {
    (0..span.len)
        .step_by(CHUNK_LEN)
        .map(move |start| span.advance(start).with_len(CHUNK_LEN.min(span.len - start)))
}

#[cfg(feature = "parallel")]
fn pair_chunks((a, b): (Span, Span)) -> impl Iterator<Item = (Span, Span)> {
    chunks(a).zip(chunks(b))
}

/// Sorts by the written span and checks that no two ranges overlap.
#[cfg(feature = "parallel")]
fn sorted_disjoint<X>(items: &mut [(Span, X)]) -> bool {
    items.sort_by_key(|(span, _)| span.offset);
    items.windows(2).all(|w| w[0].0.last() < w[1].0.offset)
}

/// Splits `data` into one mutable piece per span, spans rebased to zero.
///
/// `items` must be sorted and disjoint.
#[cfg(feature = "parallel")]
fn carve<T, X>(mut data: &mut [T], items: Vec<(Span, X)>) -> Vec<(&mut [T], Span, X)> {
    let mut pieces = Vec::with_capacity(items.len());
    let mut consumed = 0;
    for (span, extra) in items {
        let rest = core::mem::take(&mut data);
        let (_, rest) = rest.split_at_mut(span.offset - consumed);
        let (piece, rest) = rest.split_at_mut(span.last() + 1 - span.offset);
        data = rest;
        consumed = span.last() + 1;
        pieces.push((piece, span.rebased(0), extra));
    }
    pieces
}

/// Applies `f` to every span of `data`.
pub fn apply_unary<T, F>(data: &mut [T], spans: SpanIter, parallel: bool, f: F)
where
    T: Send,
    F: Fn(&mut [T], Span) + Send + Sync,
{
    #[cfg(feature = "parallel")]
    if parallel {
        let mut items: Vec<(Span, ())> = spans.flat_map(chunks).map(|s| (s, ())).collect();
        if sorted_disjoint(&mut items) {
            tracing::trace!(tasks = items.len(), "parallel unary dispatch");
            carve(data, items)
                .into_par_iter()
                .for_each(|(piece, span, ())| f(piece, span));
        } else {
            tracing::trace!("overlapping spans, sequential unary dispatch");
            for (span, ()) in items {
                f(data, span);
            }
        }
        return;
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    for span in spans {
        f(data, span);
    }
}

/// Applies `f` to every pair of spans, writing into `dest` and reading `src`.
pub fn apply_binary<T, U, F>(dest: &mut [T], src: &[U], pairs: ZipSpans, parallel: bool, f: F)
where
    T: Send,
    U: Sync,
    F: Fn(&mut [T], Span, &[U], Span) + Send + Sync,
{
    #[cfg(feature = "parallel")]
    if parallel {
        let mut items: Vec<(Span, Span)> = pairs.flat_map(pair_chunks).collect();
        if sorted_disjoint(&mut items) {
            tracing::trace!(tasks = items.len(), "parallel binary dispatch");
            carve(dest, items)
                .into_par_iter()
                .for_each(|(piece, d, s)| f(piece, d, src, s));
        } else {
            tracing::trace!("overlapping spans, sequential binary dispatch");
            for (d, s) in items {
                f(dest, d, src, s);
            }
        }
        return;
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    for (d, s) in pairs {
        f(dest, d, src, s);
    }
}

/// Folds `map(span)` over every span, starting from `init`.
///
/// `combine(acc, partial)` is always applied in traversal order.
pub fn reduce<T, R, M, C>(data: &[T], spans: SpanIter, parallel: bool, map: M, combine: C, init: R) -> R
where
    T: Sync,
    R: Send,
    M: Fn(&[T], Span) -> R + Send + Sync,
    C: Fn(R, R) -> R,
{
    #[cfg(feature = "parallel")]
    if parallel {
        let spans: Vec<Span> = spans.collect();
        let partials: Vec<R> = spans.par_iter().map(|&s| map(data, s)).collect();
        return partials.into_iter().fold(init, combine);
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    spans.fold(init, |acc, span| combine(acc, map(data, span)))
}

/// Folds `map(span_a, span_b)` over every pair, starting from `init`.
pub fn reduce_pairs<T, U, R, M, C>(
    a: &[T],
    b: &[U],
    pairs: ZipSpans,
    parallel: bool,
    map: M,
    combine: C,
    init: R,
) -> R
where
    T: Sync,
    U: Sync,
    R: Send,
    M: Fn(&[T], Span, &[U], Span) -> R + Send + Sync,
    C: Fn(R, R) -> R,
{
    #[cfg(feature = "parallel")]
    if parallel {
        let pairs: Vec<(Span, Span)> = pairs.collect();
        let partials: Vec<R> = pairs.par_iter().map(|&(sa, sb)| map(a, sa, b, sb)).collect();
        return partials.into_iter().fold(init, combine);
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    pairs.fold(init, |acc, (sa, sb)| combine(acc, map(a, sa, b, sb)))
}

/// Returns `true` if `f` holds for every pair of spans.
///
/// The sequential walk stops at the first failing pair.
pub fn all_pairs<T, U, F>(a: &[T], b: &[U], pairs: ZipSpans, parallel: bool, f: F) -> bool
where
    T: Sync,
    U: Sync,
    F: Fn(&[T], Span, &[U], Span) -> bool + Send + Sync,
{
    #[cfg(feature = "parallel")]
    if parallel {
        let pairs: Vec<(Span, Span)> = pairs.flat_map(pair_chunks).collect();
        return pairs.par_iter().all(|&(sa, sb)| f(a, sa, b, sb));
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    let mut pairs = pairs;
    pairs.all(|(sa, sb)| f(a, sa, b, sb))
}
