//! Packed little-endian encoding.

use super::Encoding;
use super::Format;
use super::cursor::ByteCursor;
use crate::error::DecodeError;
use crate::scalar::Scalar;

/// Fixed-width encoding: `BYTE_WIDTH` little-endian bytes per element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Binary;

impl Encoding for Binary {
    const FORMAT: Format = Format::Binary;

    fn body_len<T: Scalar>(values: &[T]) -> usize {
        values.len() * T::BYTE_WIDTH
    }

    fn encode<T: Scalar>(values: &[T], out: &mut Vec<u8>) {
        for &v in values {
            v.write_le(out);
        }
    }

    fn decode<T: Scalar>(cursor: &mut ByteCursor<'_>, count: usize) -> Result<Vec<T>, DecodeError> {
        // the count comes from the header; reserve no more than the body can hold
        let mut values = Vec::with_capacity(count.min(cursor.remaining().len() / T::BYTE_WIDTH));
        for index in 0..count {
            let raw = cursor.take(T::BYTE_WIDTH).ok_or(DecodeError::Truncated {
                expected: count,
                found: index,
            })?;
            let value = T::read_le(raw).ok_or_else(|| DecodeError::MalformedToken {
                index,
                token: format!("{raw:02x?}"),
            })?;
            values.push(value);
        }
        Ok(values)
    }
}
