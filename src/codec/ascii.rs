//! Whitespace-delimited text encoding.

use super::Encoding;
use super::Format;
use super::cursor::ByteCursor;
use crate::error::DecodeError;
use crate::scalar::Scalar;

/// Elements written per line.
pub const ELEMENTS_PER_LINE: usize = 10;

/// Text encoding: one token group per element, ten elements per line.
///
/// Floats are printed in their shortest round-trip form, so decoding
/// restores the exact values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ascii;

impl Encoding for Ascii {
    const FORMAT: Format = Format::Ascii;

    fn body_len<T: Scalar>(values: &[T]) -> usize {
        let mut scratch = String::new();
        values
            .iter()
            .map(|&v| {
                scratch.clear();
                v.write_ascii(&mut scratch);
                // separator or line break after every element
                scratch.len() + 1
            })
            .sum()
    }

    fn encode<T: Scalar>(values: &[T], out: &mut Vec<u8>) {
        let mut line = String::new();
        for chunk in values.chunks(ELEMENTS_PER_LINE) {
            line.clear();
            for (i, &v) in chunk.iter().enumerate() {
                if i > 0 {
                    line.push(' ');
                }
                v.write_ascii(&mut line);
            }
            line.push('\n');
            out.extend_from_slice(line.as_bytes());
        }
    }

    fn decode<T: Scalar>(cursor: &mut ByteCursor<'_>, count: usize) -> Result<Vec<T>, DecodeError> {
        // every element takes at least one byte plus a separator
        let mut values = Vec::with_capacity(count.min(cursor.remaining().len() / 2 + 1));
        let mut tokens: Vec<&str> = Vec::with_capacity(T::ASCII_TOKENS);
        for index in 0..count {
            tokens.clear();
            for _ in 0..T::ASCII_TOKENS {
                let raw = cursor.token().ok_or(DecodeError::Truncated {
                    expected: count,
                    found: index,
                })?;
                let text = core::str::from_utf8(raw).map_err(|_| DecodeError::MalformedToken {
                    index,
                    token: String::from_utf8_lossy(raw).into_owned(),
                })?;
                tokens.push(text);
            }
            let value = T::parse_ascii(&tokens).ok_or_else(|| DecodeError::MalformedToken {
                index,
                token: tokens.join(" "),
            })?;
            values.push(value);
        }
        Ok(values)
    }
}
