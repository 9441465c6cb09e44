//! Matrix serialization.
//!
//! # Stream Format
//!
//! ```text
//! <ndim>\n
//! <d0> <d1> ... <dn-1>\n
//! <ascii|binary> <row_major|col_major>\n
//! <body>
//! ```
//!
//! The body holds every element in traversal order of the recorded major
//! order, encoded by either [`Ascii`] or [`Binary`]. The element type is not
//! recorded; the reader names it.
//!
//! ## Decoding
//! - The header is validated before anything is allocated
//! - A failed decode never yields a partial matrix
//! - Only ASCII whitespace may follow the body
//!
//! # Example
//!
//! ```rust
//! use april_matrix::codec::{self, Format};
//! use april_matrix::{MajorOrder, Matrix};
//!
//! let m = Matrix::from_vec(&[2, 2], MajorOrder::RowMajor, vec![1.0f64, 2.0, 3.0, 4.0]).unwrap();
//! let bytes = codec::write_to_bytes(&m, Format::Binary);
//! let back: Matrix<f64> = codec::read_matrix(&bytes).unwrap();
//! assert!(back.equals(&m, 0.0).unwrap());
//! ```

mod ascii;
mod binary;
mod cursor;

pub use ascii::{Ascii, ELEMENTS_PER_LINE};
pub use binary::Binary;
pub use cursor::ByteCursor;

use crate::error::{DecodeError, Result};
use crate::matrix::{MajorOrder, Matrix};
use crate::scalar::Scalar;
use briny::prelude::*;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Body encoding recorded in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Whitespace-delimited decimal tokens.
    Ascii,
    /// Packed little-endian values.
    #[default]
    Binary,
}

impl Format {
    /// Header tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Binary => "binary",
        }
    }

    /// Parses a header tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ascii" => Some(Self::Ascii),
            "binary" => Some(Self::Binary),
            _ => None,
        }
    }
}

/// A per-type sizer, coder and extractor set.
pub trait Encoding {
    /// Tag written to the header.
    const FORMAT: Format;

    /// Exact number of bytes `encode` appends for `values`.
    fn body_len<T: Scalar>(values: &[T]) -> usize;

    /// Appends the encoded `values` to `out`.
    fn encode<T: Scalar>(values: &[T], out: &mut Vec<u8>);

    /// Reads exactly `count` elements from `cursor`.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Truncated`] or [`DecodeError::MalformedToken`].
    fn decode<T: Scalar>(cursor: &mut ByteCursor<'_>, count: usize) -> core::result::Result<Vec<T>, DecodeError>;
}

/// Parsed stream header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Extent of every dimension.
    pub dims: Vec<usize>,
    /// Body encoding.
    pub format: Format,
    /// Traversal order of the body.
    pub order: MajorOrder,
}

impl Validate for Header {
    fn validate(&self) -> core::result::Result<(), ValidationError> {
        if self.dims.is_empty() || self.dims.contains(&0) {
            return Err(ValidationError);
        }
        if self
            .dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .is_none()
        {
            return Err(ValidationError);
        }
        Ok(())
    }
}

impl Header {
    /// Number of elements announced.
    #[must_use]
    pub fn count(&self) -> usize {
        self.dims.iter().product()
    }

    fn encode(&self, out: &mut Vec<u8>) {
        let extents: Vec<String> = self.dims.iter().map(ToString::to_string).collect();
        let text = format!(
            "{}\n{}\n{} {}\n",
            self.dims.len(),
            extents.join(" "),
            self.format.tag(),
            self.order.tag()
        );
        out.extend_from_slice(text.as_bytes());
    }

    /// Parses and validates the three header lines.
    ///
    /// # Errors
    ///
    /// [`DecodeError::BadHeader`], [`DecodeError::UnknownFormat`] or
    /// [`DecodeError::UnknownOrder`].
    pub fn parse(cursor: &mut ByteCursor<'_>) -> core::result::Result<Self, DecodeError> {
        let bad = |what: &str| DecodeError::BadHeader(what.to_owned());

        let ndim: usize = cursor
            .line()
            .and_then(|l| l.trim().parse().ok())
            .ok_or_else(|| bad("missing dimension count"))?;
        let dims = cursor
            .line()
            .ok_or_else(|| bad("missing extents"))?
            .split_ascii_whitespace()
            .map(str::parse)
            .collect::<core::result::Result<Vec<usize>, _>>()
            .map_err(|_| bad("non-numeric extent"))?;
        if dims.len() != ndim {
            return Err(DecodeError::BadHeader(format!(
                "{ndim} dimensions announced, {} extents given",
                dims.len()
            )));
        }

        let tags = cursor.line().ok_or_else(|| bad("missing format line"))?;
        let mut tags = tags.split_ascii_whitespace();
        let format_tag = tags.next().unwrap_or_default();
        let format = Format::from_tag(format_tag).ok_or_else(|| DecodeError::UnknownFormat(format_tag.to_owned()))?;
        let order_tag = tags.next().unwrap_or_default();
        let order = MajorOrder::from_tag(order_tag).ok_or_else(|| DecodeError::UnknownOrder(order_tag.to_owned()))?;
        if tags.next().is_some() {
            return Err(bad("extra tokens after major order"));
        }

        TrustedData::new(Self { dims, format, order })
            .map(|trusted| trusted.into_inner())
            .map_err(|_| bad("extents must be positive and their product must fit in usize"))
    }
}

fn encode_with<E: Encoding, T: Scalar>(m: &Matrix<T>, values: &[T]) -> Vec<u8> {
    let header = Header {
        dims: m.dims().to_vec(),
        format: E::FORMAT,
        order: m.major_order(),
    };
    let mut out = Vec::with_capacity(32 + E::body_len(values));
    header.encode(&mut out);
    E::encode(values, &mut out);
    out
}

/// Serializes `m` into a fresh buffer.
#[must_use]
pub fn write_to_bytes<T: Scalar>(m: &Matrix<T>, format: Format) -> Vec<u8> {
    let values = m.to_vec();
    let bytes = match format {
        Format::Ascii => encode_with::<Ascii, T>(m, &values),
        Format::Binary => encode_with::<Binary, T>(m, &values),
    };
    tracing::debug!(
        ty = T::TYPE.name(),
        format = format.tag(),
        elements = values.len(),
        bytes = bytes.len(),
        "matrix encoded"
    );
    bytes
}

/// Serializes `m` to `writer` and returns the number of bytes written.
///
/// # Errors
///
/// [`crate::Error::Io`] if the writer fails.
pub fn write_matrix<T: Scalar, W: Write>(m: &Matrix<T>, format: Format, writer: &mut W) -> Result<usize> {
    let bytes = write_to_bytes(m, format);
    writer.write_all(&bytes)?;
    Ok(bytes.len())
}

/// Serializes `m` to the file at `path`, replacing it.
///
/// # Errors
///
/// [`crate::Error::Io`] if the file cannot be created or written.
pub fn write_to_file<T: Scalar, P: AsRef<Path>>(m: &Matrix<T>, format: Format, path: P) -> Result<usize> {
    let mut file = BufWriter::new(File::create(path)?);
    let written = write_matrix(m, format, &mut file)?;
    file.flush()?;
    Ok(written)
}

/// Decodes one matrix from `bytes`.
///
/// # Errors
///
/// [`crate::Error::Decode`] for any malformed input, or
/// [`crate::Error::AllocationFailed`] if the announced size cannot be held.
pub fn read_matrix<T: Scalar>(bytes: &[u8]) -> Result<Matrix<T>> {
    let mut cursor = ByteCursor::new(bytes);
    let header = Header::parse(&mut cursor)?;
    let count = header.count();
    let values = match header.format {
        Format::Ascii => Ascii::decode::<T>(&mut cursor, count)?,
        Format::Binary => Binary::decode::<T>(&mut cursor, count)?,
    };
    let trailing = cursor.trailing();
    if trailing > 0 {
        return Err(DecodeError::TrailingData(trailing).into());
    }
    tracing::debug!(
        ty = T::TYPE.name(),
        format = header.format.tag(),
        elements = count,
        "matrix decoded"
    );
    Matrix::from_vec(&header.dims, header.order, values)
}

/// Decodes one matrix from everything `reader` yields.
///
/// # Errors
///
/// Same as [`read_matrix`], plus [`crate::Error::Io`].
pub fn read_matrix_from<T: Scalar, R: Read>(reader: &mut R) -> Result<Matrix<T>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    read_matrix(&bytes)
}

/// Decodes one matrix from the file at `path`.
///
/// # Errors
///
/// Same as [`read_matrix_from`].
pub fn read_from_file<T: Scalar, P: AsRef<Path>>(path: P) -> Result<Matrix<T>> {
    let mut file = BufReader::new(File::open(path)?);
    read_matrix_from(&mut file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let mut out = Vec::new();
        Header {
            dims: vec![2, 3],
            format: Format::Ascii,
            order: MajorOrder::ColMajor,
        }
        .encode(&mut out);
        assert_eq!(out, b"2\n2 3\nascii col_major\n");
    }

    #[test]
    fn header_rejects_zero_extent() {
        let err = Header::parse(&mut ByteCursor::new(b"2\n2 0\nbinary row_major\n")).unwrap_err();
        assert!(matches!(err, DecodeError::BadHeader(_)));
    }

    #[test]
    fn header_rejects_unknown_tags() {
        let err = Header::parse(&mut ByteCursor::new(b"1\n4\nhex row_major\n")).unwrap_err();
        assert_eq!(err, DecodeError::UnknownFormat("hex".into()));
        let err = Header::parse(&mut ByteCursor::new(b"1\n4\nascii diagonal\n")).unwrap_err();
        assert_eq!(err, DecodeError::UnknownOrder("diagonal".into()));
    }

    #[test]
    fn header_rejects_extent_count_mismatch() {
        let err = Header::parse(&mut ByteCursor::new(b"3\n2 2\nascii row_major\n")).unwrap_err();
        assert!(matches!(err, DecodeError::BadHeader(_)));
    }
}
