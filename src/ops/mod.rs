//! # Operation Dispatch Layer
//!
//! The machinery every [`Matrix`](crate::Matrix) operation is built on.
//!
//! ## Submodules
//!
//! - [`span`] — decomposition of strided views into 1-D spans
//! - [`dispatch`] — drivers that feed spans to per-span functors, in
//!   parallel when the written ranges are disjoint
//! - [`cpu`] — per-span scalar kernels
//!
//! ## Adding an operation
//!
//! 1. Write the per-span kernel in [`cpu`]
//! 2. Pick the driver in [`dispatch`] that matches its shape (unary,
//!   binary, reduction or predicate)
//! 3. Add size and layout checks on the `Matrix` method that calls it
//!
//! ## Feature Flags
//!
//! - `parallel` — enables `rayon` in [`dispatch`]

pub mod cpu;
pub mod dispatch;
pub mod span;
