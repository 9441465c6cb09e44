//! Tagged payloads passed across the embedding boundary.
//!
//! A [`Token`] is a closed set of cloneable, serializable payloads. The
//! [`TokenCode`] written as the first byte of the serialized form decides
//! which variant is rebuilt on decode.
//!
//! # Wire Format
//!
//! ```text
//! ┌──────────┬──────────────┬──────────────────────────────┐
//! │ u8 code  │ u64 LE count │ payload                      │
//! └──────────┴──────────────┴──────────────────────────────┘
//! ```
//!
//! - memory block: `count` little-endian `f32` (the used prefix)
//! - vectors: `count` little-endian elements
//! - bunch: `count` entries of `u64 LE length` followed by a nested token

use crate::codec::ByteCursor;
use crate::error::{DecodeError, Result};
use crate::memory::MemoryBlock;
use crate::scalar::Scalar;
use core::ops::{Index, IndexMut};

/// Type code of every token variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenCode {
    /// [`TokenMemoryBlock`].
    MemoryBlock = 1,
    /// Vector of `f32`.
    VectorF32 = 2,
    /// Vector of `f64`.
    VectorF64 = 3,
    /// Vector of `i32`.
    VectorI32 = 4,
    /// Vector of `u32`.
    VectorU32 = 5,
    /// Vector of bytes.
    VectorChar = 6,
    /// Vector of nested tokens.
    Bunch = 7,
}

impl TryFrom<u8> for TokenCode {
    type Error = DecodeError;

    fn try_from(value: u8) -> core::result::Result<Self, DecodeError> {
        Ok(match value {
            1 => Self::MemoryBlock,
            2 => Self::VectorF32,
            3 => Self::VectorF64,
            4 => Self::VectorI32,
            5 => Self::VectorU32,
            6 => Self::VectorChar,
            7 => Self::Bunch,
            other => return Err(DecodeError::UnknownTokenCode(other)),
        })
    }
}

/// Growable vector payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenVector<T> {
    values: Vec<T>,
}

impl<T> TokenVector<T> {
    /// Empty vector.
    #[must_use]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Takes ownership of `values`.
    #[must_use]
    pub const fn from_vec(values: Vec<T>) -> Self {
        Self { values }
    }

    /// Appends one element.
    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }
}

impl<T> Index<usize> for TokenVector<T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.values[i]
    }
}

impl<T> IndexMut<usize> for TokenVector<T> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.values[i]
    }
}

/// A float memory block with a used size below its capacity.
#[derive(Debug, Clone)]
pub struct TokenMemoryBlock {
    block: MemoryBlock<f32>,
}

impl TokenMemoryBlock {
    /// Zeroed block of `capacity` elements with nothing in use yet.
    ///
    /// Call [`TokenMemoryBlock::resize`] to claim elements.
    ///
    /// # Errors
    ///
    /// [`crate::Error::AllocationFailed`] if the block cannot be allocated.
    pub fn new(capacity: usize) -> Result<Self> {
        let mut block = MemoryBlock::allocate(capacity)?;
        block.resize(0)?;
        Ok(Self { block })
    }

    /// Sets the used size; the block is only reallocated past its capacity.
    ///
    /// # Errors
    ///
    /// [`crate::Error::AllocationFailed`] if growing fails.
    pub fn resize(&mut self, len: usize) -> Result<()> {
        self.block.resize(len)
    }

    /// Used size.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.block.len()
    }

    /// Returns `true` if nothing is in use.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

    /// Allocated size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.block.capacity()
    }

    /// Used elements.
    pub fn values(&mut self) -> &[f32] {
        self.block.host()
    }

    /// Used elements, writable.
    pub fn values_mut(&mut self) -> &mut [f32] {
        self.block.host_mut()
    }
}

/// A tagged payload.
#[derive(Debug, Clone)]
pub enum Token {
    /// Float memory block.
    MemoryBlock(TokenMemoryBlock),
    /// Vector of `f32`.
    VectorF32(TokenVector<f32>),
    /// Vector of `f64`.
    VectorF64(TokenVector<f64>),
    /// Vector of `i32`.
    VectorI32(TokenVector<i32>),
    /// Vector of `u32`.
    VectorU32(TokenVector<u32>),
    /// Vector of bytes.
    VectorChar(TokenVector<u8>),
    /// Vector of tokens.
    Bunch(TokenVector<Token>),
}

/// Deepest bunch nesting accepted by [`Token::from_bytes`].
pub const MAX_BUNCH_DEPTH: usize = 64;

fn put_len(len: usize, out: &mut Vec<u8>) {
    out.extend_from_slice(&(len as u64).to_le_bytes());
}

fn take_len(cursor: &mut ByteCursor<'_>) -> core::result::Result<usize, DecodeError> {
    let raw = cursor.take(8).ok_or(DecodeError::Truncated { expected: 8, found: 0 })?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(raw);
    usize::try_from(u64::from_le_bytes(buf)).map_err(|_| DecodeError::MalformedToken {
        index: 0,
        token: format!("{raw:02x?}"),
    })
}

fn put_values<T: Scalar>(values: &[T], out: &mut Vec<u8>) {
    put_len(values.len(), out);
    for &v in values {
        v.write_le(out);
    }
}

fn take_values<T: Scalar>(cursor: &mut ByteCursor<'_>) -> core::result::Result<Vec<T>, DecodeError> {
    let count = take_len(cursor)?;
    // the count comes from the wire; never reserve more than the bytes left
    let mut values = Vec::with_capacity(count.min(cursor.remaining().len() / T::BYTE_WIDTH));
    for index in 0..count {
        let raw = cursor.take(T::BYTE_WIDTH).ok_or(DecodeError::Truncated {
            expected: count,
            found: index,
        })?;
        values.push(T::read_le(raw).ok_or_else(|| DecodeError::MalformedToken {
            index,
            token: format!("{raw:02x?}"),
        })?);
    }
    Ok(values)
}

fn text_of<T: Scalar>(values: &[T]) -> String {
    let mut out = String::new();
    for (i, &v) in values.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        v.write_ascii(&mut out);
    }
    out
}

fn parse_text<T: Scalar>(text: &str) -> core::result::Result<TokenVector<T>, DecodeError> {
    let tokens: Vec<&str> = text.split_ascii_whitespace().collect();
    tokens
        .chunks(T::ASCII_TOKENS)
        .enumerate()
        .map(|(index, group)| {
            T::parse_ascii(group).ok_or_else(|| DecodeError::MalformedToken {
                index,
                token: group.join(" "),
            })
        })
        .collect::<core::result::Result<Vec<T>, _>>()
        .map(TokenVector::from_vec)
}

impl Token {
    /// Type code of this variant.
    #[must_use]
    pub const fn code(&self) -> TokenCode {
        match self {
            Self::MemoryBlock(_) => TokenCode::MemoryBlock,
            Self::VectorF32(_) => TokenCode::VectorF32,
            Self::VectorF64(_) => TokenCode::VectorF64,
            Self::VectorI32(_) => TokenCode::VectorI32,
            Self::VectorU32(_) => TokenCode::VectorU32,
            Self::VectorChar(_) => TokenCode::VectorChar,
            Self::Bunch(_) => TokenCode::Bunch,
        }
    }

    /// Serializes the code byte followed by the payload.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![self.code() as u8];
        self.encode_payload(&mut out);
        out
    }

    fn encode_payload(&self, out: &mut Vec<u8>) {
        match self {
            Self::MemoryBlock(m) => put_values(m.block.authoritative(), out),
            Self::VectorF32(v) => put_values(v.as_slice(), out),
            Self::VectorF64(v) => put_values(v.as_slice(), out),
            Self::VectorI32(v) => put_values(v.as_slice(), out),
            Self::VectorU32(v) => put_values(v.as_slice(), out),
            Self::VectorChar(v) => put_values(v.as_slice(), out),
            Self::Bunch(tokens) => {
                put_len(tokens.len(), out);
                for token in tokens.as_slice() {
                    let nested = token.to_bytes();
                    put_len(nested.len(), out);
                    out.extend_from_slice(&nested);
                }
            }
        }
    }

    /// Rebuilds a token from [`Token::to_bytes`] output.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Decode`] for an unknown code, a short or malformed
    /// payload, or bytes left over.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(bytes);
        let token = Self::decode(&mut cursor, 0)?;
        let left = cursor.remaining().len();
        if left > 0 {
            return Err(DecodeError::TrailingData(left).into());
        }
        Ok(token)
    }

    fn decode(cursor: &mut ByteCursor<'_>, depth: usize) -> core::result::Result<Self, DecodeError> {
        let code = cursor.take(1).ok_or(DecodeError::Truncated { expected: 1, found: 0 })?;
        Ok(match TokenCode::try_from(code[0])? {
            TokenCode::MemoryBlock => {
                let values: Vec<f32> = take_values(cursor)?;
                Self::MemoryBlock(TokenMemoryBlock {
                    block: MemoryBlock::from_vec(values),
                })
            }
            TokenCode::VectorF32 => Self::VectorF32(TokenVector::from_vec(take_values(cursor)?)),
            TokenCode::VectorF64 => Self::VectorF64(TokenVector::from_vec(take_values(cursor)?)),
            TokenCode::VectorI32 => Self::VectorI32(TokenVector::from_vec(take_values(cursor)?)),
            TokenCode::VectorU32 => Self::VectorU32(TokenVector::from_vec(take_values(cursor)?)),
            TokenCode::VectorChar => Self::VectorChar(TokenVector::from_vec(take_values(cursor)?)),
            TokenCode::Bunch => {
                if depth >= MAX_BUNCH_DEPTH {
                    return Err(DecodeError::NestingTooDeep(MAX_BUNCH_DEPTH));
                }
                let count = take_len(cursor)?;
                let mut tokens = TokenVector::new();
                for index in 0..count {
                    let len = take_len(cursor)?;
                    let nested = cursor.take(len).ok_or(DecodeError::Truncated {
                        expected: count,
                        found: index,
                    })?;
                    let mut inner = ByteCursor::new(nested);
                    tokens.push(Self::decode(&mut inner, depth + 1)?);
                    let left = inner.remaining().len();
                    if left > 0 {
                        return Err(DecodeError::TrailingData(left));
                    }
                }
                Self::Bunch(tokens)
            }
        })
    }

    /// Space separated text form of flat vectors.
    ///
    /// Memory blocks and bunches have no text form and return `None`.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::VectorF32(v) => Some(text_of(v.as_slice())),
            Self::VectorF64(v) => Some(text_of(v.as_slice())),
            Self::VectorI32(v) => Some(text_of(v.as_slice())),
            Self::VectorU32(v) => Some(text_of(v.as_slice())),
            Self::VectorChar(v) => Some(text_of(v.as_slice())),
            Self::MemoryBlock(_) | Self::Bunch(_) => None,
        }
    }

    /// Parses the text form of a token of kind `code`.
    ///
    /// Returns `Ok(None)` for kinds without a text form.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Decode`] if an element does not parse.
    pub fn from_text(code: TokenCode, text: &str) -> Result<Option<Self>> {
        Ok(Some(match code {
            TokenCode::VectorF32 => Self::VectorF32(parse_text(text)?),
            TokenCode::VectorF64 => Self::VectorF64(parse_text(text)?),
            TokenCode::VectorI32 => Self::VectorI32(parse_text(text)?),
            TokenCode::VectorU32 => Self::VectorU32(parse_text(text)?),
            TokenCode::VectorChar => Self::VectorChar(parse_text(text)?),
            TokenCode::MemoryBlock | TokenCode::Bunch => return Ok(None),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_byte_leads() {
        let t = Token::VectorI32(TokenVector::from_vec(vec![-1, 2]));
        let bytes = t.to_bytes();
        assert_eq!(bytes[0], TokenCode::VectorI32 as u8);
        assert_eq!(&bytes[1..9], &2u64.to_le_bytes());
        assert_eq!(bytes.len(), 1 + 8 + 2 * 4);
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(matches!(
            Token::from_bytes(&[42, 0]),
            Err(crate::Error::Decode(DecodeError::UnknownTokenCode(42)))
        ));
    }

    #[test]
    fn memory_block_grows_only_past_capacity() {
        let mut t = TokenMemoryBlock::new(4).unwrap();
        assert_eq!((t.len(), t.capacity()), (0, 4));
        t.resize(4).unwrap();
        t.values_mut()[1] = 2.5;
        t.resize(2).unwrap();
        assert_eq!((t.len(), t.capacity()), (2, 4));
        t.resize(3).unwrap();
        assert_eq!(t.capacity(), 4);
        t.resize(6).unwrap();
        assert_eq!((t.len(), t.capacity()), (6, 6));
        assert_eq!(t.values()[1], 2.5);
    }
}
