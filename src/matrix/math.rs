//! Element-wise operations and reductions on [`Matrix`].
//!
//! Every operation walks the view span by span through
//! [`crate::ops::dispatch`], so strided views and sub-matrices behave
//! exactly like compact ones. In-place operations may run in parallel;
//! reductions default to the sequential walk so their results never depend
//! on the worker count.

use super::Matrix;
use crate::backend::Dispatch;
use crate::error::{Error, Result};
use crate::ops::span::Span;
use crate::ops::{cpu, dispatch};
use crate::scalar::{Norm, Numeric, Scalar};
use num_traits::{Float, Zero};

impl<T: Scalar> Matrix<T> {
    /// Sets every element to `value`.
    pub fn fill(&mut self, value: T) {
        let parallel = self.parallel(Dispatch::Parallel);
        let spans = self.spans();
        self.with_data_mut(|data| {
            dispatch::apply_unary(data, spans, parallel, |d, s| cpu::fill(d, s, value));
        });
    }

    /// Replaces every element `x` with `f(x)`.
    pub fn map<F>(&mut self, f: F)
    where
        F: Fn(T) -> T + Send + Sync,
    {
        let parallel = self.parallel(Dispatch::Parallel);
        let spans = self.spans();
        self.with_data_mut(|data| {
            dispatch::apply_unary(data, spans, parallel, |d, s| cpu::map(d, s, &f));
        });
    }

    /// Sets every element of `self` to `f` of the corresponding element of
    /// `src`, both walked in traversal order.
    ///
    /// # Errors
    ///
    /// - [`Error::SizeMismatch`] if the sizes differ
    /// - [`Error::MajorOrderMismatch`] if the major orders differ
    pub fn map_from<F>(&mut self, src: &Self, f: F) -> Result<()>
    where
        F: Fn(T) -> T + Send + Sync,
    {
        self.check_size("map_from", src.size())?;
        self.check_order("map_from", src)?;
        let parallel = self.parallel(Dispatch::Parallel);
        let pairs = self.zip_spans(src);
        self.with_pair_mut(src, |dest, src| {
            dispatch::apply_binary(dest, src, pairs, parallel, |d, sd, s, ss| {
                cpu::map_from(d, sd, s, ss, &f);
            });
        });
        Ok(())
    }

    /// Copies the elements of `other` into `self`.
    ///
    /// Copying a view onto itself is a no-op.
    ///
    /// # Errors
    ///
    /// - [`Error::SizeMismatch`] if the sizes differ
    /// - [`Error::MajorOrderMismatch`] if the major orders differ
    /// - [`Error::DimensionMismatch`] if the extents differ
    pub fn copy(&mut self, other: &Self) -> Result<()> {
        if self.is_same_view(other) {
            return Ok(());
        }
        self.check_size("copy", other.size())?;
        self.check_order("copy", other)?;
        if !self.same_dim(other) {
            return Err(Error::DimensionMismatch {
                op: "copy",
                left: self.dims.clone(),
                right: other.dims.clone(),
            });
        }
        let parallel = self.parallel(Dispatch::Parallel);
        let pairs = self.zip_spans(other);
        self.with_pair_mut(other, |dest, src| {
            dispatch::apply_binary(dest, src, pairs, parallel, cpu::copy::<T>);
        });
        Ok(())
    }

    /// Approximate equality within relative tolerance `epsilon`.
    ///
    /// Returns `Ok(false)` immediately when the extents differ.
    ///
    /// # Errors
    ///
    /// [`Error::MajorOrderMismatch`] if the major orders differ.
    pub fn equals(&self, other: &Self, epsilon: f32) -> Result<bool> {
        if !self.same_dim(other) {
            return Ok(false);
        }
        self.check_order("equals", other)?;
        let parallel = self.parallel(Dispatch::Parallel);
        let pairs = self.zip_spans(other);
        Ok(self.with_pair(other, |a, b| {
            dispatch::all_pairs(a, b, pairs, parallel, |a, sa, b, sb| {
                cpu::equals(a, sa, b, sb, epsilon)
            })
        }))
    }
}

impl<T: Scalar + PartialOrd> Matrix<T> {
    /// Limits every element to `[lower, upper]`.
    pub fn clamp(&mut self, lower: T, upper: T) {
        let parallel = self.parallel(Dispatch::Parallel);
        let spans = self.spans();
        self.with_data_mut(|data| {
            dispatch::apply_unary(data, spans, parallel, |d, s| cpu::clamp(d, s, lower, upper));
        });
    }
}

impl<T: Numeric> Matrix<T> {
    /// Adds `value` to every element.
    pub fn scalar_add(&mut self, value: T) {
        let parallel = self.parallel(Dispatch::Parallel);
        let spans = self.spans();
        self.with_data_mut(|data| {
            dispatch::apply_unary(data, spans, parallel, |d, s| cpu::scalar_add(d, s, value));
        });
    }

    /// Multiplies every element by `value`.
    pub fn scal(&mut self, value: T) {
        let parallel = self.parallel(Dispatch::Parallel);
        let spans = self.spans();
        self.with_data_mut(|data| {
            dispatch::apply_unary(data, spans, parallel, |d, s| cpu::scal(d, s, value));
        });
    }

    /// Component-wise product: `self[i] *= other[i]` in traversal order.
    ///
    /// # Errors
    ///
    /// - [`Error::SizeMismatch`] if the sizes differ
    /// - [`Error::MajorOrderMismatch`] if the major orders differ
    pub fn cmul(&mut self, other: &Self) -> Result<()> {
        self.check_size("cmul", other.size())?;
        self.check_order("cmul", other)?;
        let parallel = self.parallel(Dispatch::Parallel);
        let pairs = self.zip_spans(other);
        self.with_pair_mut(other, |dest, src| {
            dispatch::apply_binary(dest, src, pairs, parallel, cpu::cmul::<T>);
        });
        Ok(())
    }

    /// `self += alpha * other`.
    ///
    /// # Errors
    ///
    /// - [`Error::SizeMismatch`] if the sizes differ
    /// - [`Error::MajorOrderMismatch`] if the major orders differ
    pub fn axpy(&mut self, alpha: T, other: &Self) -> Result<()> {
        self.check_size("axpy", other.size())?;
        self.check_order("axpy", other)?;
        let parallel = self.parallel(Dispatch::Parallel);
        let pairs = self.zip_spans(other);
        self.with_pair_mut(other, |dest, src| {
            dispatch::apply_binary(dest, src, pairs, parallel, |d, sd, s, ss| {
                cpu::axpy(d, sd, alpha, s, ss);
            });
        });
        Ok(())
    }

    /// Sum of all elements, reduced sequentially.
    #[must_use]
    pub fn sum(&self) -> T {
        self.sum_with(Dispatch::Sequential)
    }

    /// Sum of all elements under an explicit dispatch policy.
    ///
    /// Span partials are always combined in traversal order, so both
    /// policies return the same value.
    #[must_use]
    pub fn sum_with(&self, policy: Dispatch) -> T {
        let parallel = self.parallel(policy);
        let spans = self.spans();
        self.with_data(|data| {
            dispatch::reduce(
                data,
                spans,
                parallel,
                |d, s| cpu::sum(d, s, <T as Scalar>::zero()),
                |acc, part| acc + part,
                <T as Scalar>::zero(),
            )
        })
    }

    /// Sum of the products of corresponding elements.
    ///
    /// # Errors
    ///
    /// - [`Error::SizeMismatch`] if the sizes differ
    /// - [`Error::MajorOrderMismatch`] if the major orders differ
    pub fn dot(&self, other: &Self) -> Result<T> {
        self.check_size("dot", other.size())?;
        self.check_order("dot", other)?;
        let pairs = self.zip_spans(other);
        Ok(self.with_pair(other, |a, b| {
            dispatch::reduce_pairs(
                a,
                b,
                pairs,
                false,
                cpu::dot::<T>,
                |acc, part| acc + part,
                <T as Scalar>::zero(),
            )
        }))
    }
}

impl<T: Norm> Matrix<T> {
    /// Euclidean norm.
    ///
    /// Contiguous and 1-D views go straight to the norm kernel; other views
    /// accumulate squared magnitudes span by span.
    #[must_use]
    pub fn norm2(&self) -> T::Real {
        if self.contiguous || self.dims.len() == 1 {
            let span = self
                .spans()
                .next()
                .unwrap_or(Span::new(self.offset, 1, 0));
            return self.with_data(|data| cpu::nrm2(data, span));
        }
        let spans = self.spans();
        let squares = self.with_data(|data| {
            dispatch::reduce(
                data,
                spans,
                false,
                |d, s| {
                    s.indices()
                        .fold(T::Real::zero(), |acc, i| acc + d[i].abs_sq())
                },
                |acc, part| acc + part,
                T::Real::zero(),
            )
        });
        Float::sqrt(squares)
    }
}
