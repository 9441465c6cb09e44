//! # `april_matrix`
//!
//! A typed N-dimensional matrix engine: strided views over shared,
//! dual-resident memory blocks, element-wise and BLAS-1 style operations
//! driven span by span, and a text/binary serialization codec.
//!
//! ## Features
//!
//! - **Matrices**: sub-matrices, selections, transposes and reshapes are
//!   zero-copy views over one reference-counted [`memory::MemoryBlock`]
//! - **Span traversal**: any stride pattern is reduced to 1-D strided runs,
//!   so every kernel is written once for strided slices
//! - **Dispatch**: in-place operations spread disjoint spans over `rayon`
//!   (feature `parallel`); reductions are deterministic regardless of policy
//! - **Codec**: self-describing ASCII or packed little-endian streams, to
//!   buffers, writers or files
//! - **Tokens**: tagged payloads with a stable byte encoding
//!
//! ## Example
//!
//! ```rust
//! use april_matrix::{codec, Matrix};
//!
//! let mut m = Matrix::<f32>::new(&[2, 3]).unwrap();
//! m.fill(1.5);
//! let mut row = m.select(0, 1).unwrap();
//! row.scal(2.0);
//! assert_eq!(m.sum(), 13.5);
//!
//! let bytes = codec::write_to_bytes(&m, codec::Format::Ascii);
//! let back: Matrix<f32> = codec::read_matrix(&bytes).unwrap();
//! assert!(back.equals(&m, 1e-6).unwrap());
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::many_single_char_names,
    clippy::cast_possible_truncation,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::module_name_repetitions
)]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod codec;
pub mod error;
pub mod matrix;
pub mod memory;
pub mod ops;
pub mod scalar;
pub mod token;

pub use backend::{Backend, Dispatch};
pub use error::{DecodeError, Error, ErrorKind, OrAbort, Result};
pub use matrix::{MajorOrder, Matrix};
pub use scalar::{Norm, Numeric, Scalar, ScalarType};
pub use token::{Token, TokenCode, TokenMemoryBlock, TokenVector};
