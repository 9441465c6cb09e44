//! Backend and dispatch selection.
//!
//! This module defines where a matrix's elements are read and written
//! (its residency backend) and how operations over its spans are scheduled.
//!
//! # Supported Backends
//!
//! - `Cpu` — kernels run on the host copy of the memory block (default).
//! - `Accelerator` — kernels run on the accelerator mirror of the block.
//!
//! Unlike a process-wide switch, the backend is a plain value carried by
//! every [`Matrix`](crate::Matrix) and chosen at construction time. Views
//! inherit it from the matrix they were taken from.
//!
//! # Dispatch
//!
//! [`Dispatch::Parallel`] lets an operation spread independent spans over
//! the `rayon` pool (when the `parallel` feature is on), while
//! [`Dispatch::Sequential`] visits spans strictly left to right.

use core::convert::TryFrom;

/// Minimum number of elements an operation must touch before parallel
/// dispatch is attempted.
pub const PARALLEL_MIN_LEN: usize = 1 << 15;

/// Enumeration of residency backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Backend {
    /// Host memory, CPU kernels (default).
    #[default]
    Cpu = 0,
    /// Accelerator mirror of the memory block.
    Accelerator = 1,
}

impl TryFrom<u8> for Backend {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Cpu),
            1 => Ok(Self::Accelerator),
            _ => Err(()),
        }
    }
}

impl Backend {
    /// Returns `true` for the accelerator residency.
    #[must_use]
    pub const fn is_accelerator(self) -> bool {
        matches!(self, Self::Accelerator)
    }
}

/// Span scheduling policy for a single operation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dispatch {
    /// Independent spans may be processed concurrently.
    #[default]
    Parallel,
    /// Spans are processed one after another in traversal order.
    Sequential,
}

impl Dispatch {
    /// Decides whether an operation over `len` elements on `backend` really
    /// runs in parallel.
    ///
    /// Accelerator access is never concurrent, and small operations are not
    /// worth the scheduling overhead.
    #[must_use]
    pub const fn runs_parallel(self, backend: Backend, len: usize) -> bool {
        cfg!(feature = "parallel")
            && matches!(self, Self::Parallel)
            && !backend.is_accelerator()
            && len >= PARALLEL_MIN_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_round_trips_through_u8() {
        assert_eq!(Backend::try_from(Backend::Cpu as u8), Ok(Backend::Cpu));
        assert_eq!(
            Backend::try_from(Backend::Accelerator as u8),
            Ok(Backend::Accelerator)
        );
        assert!(Backend::try_from(7).is_err());
    }

    #[test]
    fn accelerator_never_runs_parallel() {
        assert!(!Dispatch::Parallel.runs_parallel(Backend::Accelerator, usize::MAX));
        assert!(!Dispatch::Sequential.runs_parallel(Backend::Cpu, usize::MAX));
        assert!(!Dispatch::Parallel.runs_parallel(Backend::Cpu, 4));
    }
}
