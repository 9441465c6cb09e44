//! Element types supported by [`Matrix`](crate::Matrix).
//!
//! One generic matrix serves every element type; what differs between types
//! lives in this trait bundle:
//!
//! - [`Scalar`] — identity element, approximate equality and the per-type
//!   ASCII and binary codecs. Every element type implements it.
//! - [`Numeric`] — addition and multiplication, enabling `sum`, `scal`,
//!   `cmul`, `axpy` and `dot`.
//! - [`Norm`] — squared magnitude in an associated real type, enabling
//!   `norm2`.
//!
//! Instantiated for `f32`, `f64`, [`Complex32`], `i32`, `u32`, `u8` (the
//! char matrix) and `bool`.

use core::fmt::Debug;
use core::ops::{Add, Mul};
use num_complex::Complex32;
use num_traits::Float;

/// Runtime tag of an element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Pair of 32-bit floats.
    ComplexF32,
    /// 32-bit signed integer.
    I32,
    /// 32-bit unsigned integer.
    U32,
    /// Single byte character.
    Char,
    /// Boolean.
    Bool,
}

impl ScalarType {
    /// Short name of the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::F32 => "float",
            Self::F64 => "double",
            Self::ComplexF32 => "complex",
            Self::I32 => "int32",
            Self::U32 => "uint32",
            Self::Char => "char",
            Self::Bool => "bool",
        }
    }
}

/// Behaviour shared by every matrix element type.
pub trait Scalar: Copy + Debug + PartialEq + Send + Sync + 'static {
    /// Runtime type tag.
    const TYPE: ScalarType;
    /// Width of one element in the binary encoding.
    const BYTE_WIDTH: usize;
    /// Whitespace separated tokens per element in the ASCII encoding.
    const ASCII_TOKENS: usize = 1;

    /// Identity element of addition (`false` for booleans).
    fn zero() -> Self;

    /// Compares two elements with the given tolerance.
    fn approx_eq(self, other: Self, epsilon: f32) -> bool;

    /// Appends the little-endian encoding of `self`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decodes one element from exactly [`Self::BYTE_WIDTH`] bytes.
    fn read_le(bytes: &[u8]) -> Option<Self>;

    /// Appends the textual encoding of `self`.
    fn write_ascii(self, out: &mut String);

    /// Parses one element from [`Self::ASCII_TOKENS`] tokens.
    fn parse_ascii(tokens: &[&str]) -> Option<Self>;
}

/// Element types with addition and multiplication.
pub trait Numeric: Scalar + Add<Output = Self> + Mul<Output = Self> {}

/// Element types with a Euclidean magnitude.
pub trait Norm: Numeric {
    /// Real type the magnitude is expressed in.
    type Real: Float + Debug + Send + Sync + 'static;

    /// Squared magnitude of the element.
    fn abs_sq(self) -> Self::Real;
}

/// Limits `val` to `[lower, upper]`.
pub fn clamp<T: PartialOrd>(val: T, lower: T, upper: T) -> T {
    if val > upper {
        upper
    } else if val < lower {
        lower
    } else {
        val
    }
}

fn float_eq<F: Float>(a: F, b: F, epsilon: F) -> bool {
    if a == b {
        return true;
    }
    let diff = (a - b).abs();
    diff <= epsilon || diff <= epsilon * a.abs().max(b.abs())
}

macro_rules! impl_float_scalar {
    ($t:ty, $tag:expr, $width:expr) => {
        impl Scalar for $t {
            const TYPE: ScalarType = $tag;
            const BYTE_WIDTH: usize = $width;

            fn zero() -> Self {
                0.0
            }

            fn approx_eq(self, other: Self, epsilon: f32) -> bool {
                // identical bits (NaN included) always match
                self.to_bits() == other.to_bits() || float_eq(self, other, <$t>::from(epsilon))
            }

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Option<Self> {
                bytes.try_into().ok().map(<$t>::from_le_bytes)
            }

            fn write_ascii(self, out: &mut String) {
                out.push_str(&self.to_string());
            }

            fn parse_ascii(tokens: &[&str]) -> Option<Self> {
                tokens.first()?.parse().ok()
            }
        }

        impl Numeric for $t {}

        impl Norm for $t {
            type Real = $t;

            fn abs_sq(self) -> Self::Real {
                self * self
            }
        }
    };
}

impl_float_scalar!(f32, ScalarType::F32, 4);
impl_float_scalar!(f64, ScalarType::F64, 8);

macro_rules! impl_int_scalar {
    ($t:ty, $tag:expr, $width:expr) => {
        impl Scalar for $t {
            const TYPE: ScalarType = $tag;
            const BYTE_WIDTH: usize = $width;

            fn zero() -> Self {
                0
            }

            fn approx_eq(self, other: Self, epsilon: f32) -> bool {
                self == other || (f64::from(self) - f64::from(other)).abs() <= f64::from(epsilon)
            }

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Option<Self> {
                bytes.try_into().ok().map(<$t>::from_le_bytes)
            }

            fn write_ascii(self, out: &mut String) {
                out.push_str(&self.to_string());
            }

            fn parse_ascii(tokens: &[&str]) -> Option<Self> {
                tokens.first()?.parse().ok()
            }
        }
    };
}

impl_int_scalar!(i32, ScalarType::I32, 4);
impl_int_scalar!(u32, ScalarType::U32, 4);
impl_int_scalar!(u8, ScalarType::Char, 1);

impl Numeric for i32 {}
impl Numeric for u32 {}

impl Scalar for Complex32 {
    const TYPE: ScalarType = ScalarType::ComplexF32;
    const BYTE_WIDTH: usize = 8;
    const ASCII_TOKENS: usize = 2;

    fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    fn approx_eq(self, other: Self, epsilon: f32) -> bool {
        self.re.approx_eq(other.re, epsilon) && self.im.approx_eq(other.im, epsilon)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        self.re.write_le(out);
        self.im.write_le(out);
    }

    fn read_le(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::BYTE_WIDTH {
            return None;
        }
        let (re, im) = bytes.split_at(4);
        Some(Self::new(f32::read_le(re)?, f32::read_le(im)?))
    }

    fn write_ascii(self, out: &mut String) {
        out.push_str(&format!("{} {}", self.re, self.im));
    }

    fn parse_ascii(tokens: &[&str]) -> Option<Self> {
        match tokens {
            [re, im] => Some(Self::new(re.parse().ok()?, im.parse().ok()?)),
            _ => None,
        }
    }
}

impl Numeric for Complex32 {}

impl Norm for Complex32 {
    type Real = f32;

    fn abs_sq(self) -> f32 {
        self.norm_sqr()
    }
}

impl Scalar for bool {
    const TYPE: ScalarType = ScalarType::Bool;
    const BYTE_WIDTH: usize = 1;

    fn zero() -> Self {
        false
    }

    fn approx_eq(self, other: Self, _epsilon: f32) -> bool {
        self == other
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }

    fn read_le(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0] => Some(false),
            [1] => Some(true),
            _ => None,
        }
    }

    fn write_ascii(self, out: &mut String) {
        out.push(if self { '1' } else { '0' });
    }

    fn parse_ascii(tokens: &[&str]) -> Option<Self> {
        match *tokens.first()? {
            "1" => Some(true),
            "0" => Some(false),
            _ => None,
        }
    }
}
