//! Scalar value types that flow through kernel expressions.
//!
//! The type system uses a closed enum of scalar types. Kernel expressions
//! only ever produce booleans, 8-bit samples, 16/32-bit intermediates, or
//! single precision floats, so an enum keeps evaluation a plain `match`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of an expression or runtime parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// Result of comparisons.
    Bool,
    /// Unsigned 8-bit sample.
    UInt8,
    /// Signed 16-bit intermediate.
    Int16,
    /// Signed 32-bit intermediate or runtime integer.
    Int32,
    /// Single precision float.
    Float32,
}

/// A concrete scalar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ScalarValue {
    Bool(bool),
    UInt8(u8),
    Int16(i16),
    Int32(i32),
    Float32(f32),
}

/// One of the three axes of an RGBA image buffer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Dim {
    X,
    Y,
    Channel,
}

impl Dim {
    /// Index of this axis in a buffer's dimension array.
    pub fn index(self) -> usize {
        match self {
            Dim::X => 0,
            Dim::Y => 1,
            Dim::Channel => 2,
        }
    }

    /// All axes in storage order.
    pub fn all() -> [Dim; 3] {
        [Dim::X, Dim::Y, Dim::Channel]
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::X => write!(f, "x"),
            Dim::Y => write!(f, "y"),
            Dim::Channel => write!(f, "ch"),
        }
    }
}

// ============================================================================
// ScalarType Implementation
// ============================================================================

impl ScalarType {
    /// Whether the type is an integer (bool excluded).
    pub fn is_int(self) -> bool {
        matches!(self, ScalarType::UInt8 | ScalarType::Int16 | ScalarType::Int32)
    }

    /// Bit width of the type.
    pub fn bits(self) -> u32 {
        match self {
            ScalarType::Bool => 1,
            ScalarType::UInt8 => 8,
            ScalarType::Int16 => 16,
            ScalarType::Int32 | ScalarType::Float32 => 32,
        }
    }

    /// Common type two operands are promoted to before a binary operation.
    ///
    /// Floats win over integers; otherwise the wider integer is used.
    pub fn promote(self, other: ScalarType) -> ScalarType {
        if self == other {
            return self;
        }
        if self == ScalarType::Float32 || other == ScalarType::Float32 {
            return ScalarType::Float32;
        }
        if self.bits() >= other.bits() {
            self
        } else {
            other
        }
    }

    /// Name used in generated C declarations.
    pub fn c_name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::UInt8 => "uint8_t",
            ScalarType::Int16 => "int16_t",
            ScalarType::Int32 => "int32_t",
            ScalarType::Float32 => "float",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Bool => "bool",
            ScalarType::UInt8 => "uint8",
            ScalarType::Int16 => "int16",
            ScalarType::Int32 => "int32",
            ScalarType::Float32 => "float32",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// ScalarValue Implementation
// ============================================================================

impl ScalarValue {
    /// Get the type of this value.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ScalarValue::Bool(_) => ScalarType::Bool,
            ScalarValue::UInt8(_) => ScalarType::UInt8,
            ScalarValue::Int16(_) => ScalarType::Int16,
            ScalarValue::Int32(_) => ScalarType::Int32,
            ScalarValue::Float32(_) => ScalarType::Float32,
        }
    }

    /// Zero of the given type.
    pub fn zero(ty: ScalarType) -> Self {
        match ty {
            ScalarType::Bool => ScalarValue::Bool(false),
            ScalarType::UInt8 => ScalarValue::UInt8(0),
            ScalarType::Int16 => ScalarValue::Int16(0),
            ScalarType::Int32 => ScalarValue::Int32(0),
            ScalarType::Float32 => ScalarValue::Float32(0.0),
        }
    }

    /// Widen to i64 (floats truncate toward zero, saturating).
    pub fn as_i64(&self) -> i64 {
        match *self {
            ScalarValue::Bool(b) => b as i64,
            ScalarValue::UInt8(v) => v as i64,
            ScalarValue::Int16(v) => v as i64,
            ScalarValue::Int32(v) => v as i64,
            ScalarValue::Float32(v) => v as i64,
        }
    }

    /// Convert to f32.
    pub fn as_f32(&self) -> f32 {
        match *self {
            ScalarValue::Bool(b) => b as u8 as f32,
            ScalarValue::UInt8(v) => v as f32,
            ScalarValue::Int16(v) => v as f32,
            ScalarValue::Int32(v) => v as f32,
            ScalarValue::Float32(v) => v,
        }
    }

    /// Truthiness (non-zero).
    pub fn as_bool(&self) -> bool {
        match *self {
            ScalarValue::Bool(b) => b,
            ScalarValue::Float32(v) => v != 0.0,
            other => other.as_i64() != 0,
        }
    }

    /// Explicit conversion. Narrowing conversions saturate to the target range.
    pub fn cast(self, ty: ScalarType) -> ScalarValue {
        if self.scalar_type() == ty {
            return self;
        }
        match ty {
            ScalarType::Bool => ScalarValue::Bool(self.as_bool()),
            ScalarType::Float32 => ScalarValue::Float32(self.as_f32()),
            ScalarType::UInt8 => match self {
                ScalarValue::Float32(v) => ScalarValue::UInt8(v as u8),
                other => ScalarValue::UInt8(other.as_i64().clamp(0, u8::MAX as i64) as u8),
            },
            ScalarType::Int16 => match self {
                ScalarValue::Float32(v) => ScalarValue::Int16(v as i16),
                other => ScalarValue::Int16(
                    other.as_i64().clamp(i16::MIN as i64, i16::MAX as i64) as i16,
                ),
            },
            ScalarType::Int32 => match self {
                ScalarValue::Float32(v) => ScalarValue::Int32(v as i32),
                other => ScalarValue::Int32(
                    other.as_i64().clamp(i32::MIN as i64, i32::MAX as i64) as i32,
                ),
            },
        }
    }

    /// Reinterpret an i64 arithmetic result in `ty`, wrapping like machine
    /// arithmetic of that width.
    pub(crate) fn wrap_int(value: i64, ty: ScalarType) -> ScalarValue {
        match ty {
            ScalarType::Bool => ScalarValue::Bool(value != 0),
            ScalarType::UInt8 => ScalarValue::UInt8(value as u8),
            ScalarType::Int16 => ScalarValue::Int16(value as i16),
            ScalarType::Int32 => ScalarValue::Int32(value as i32),
            ScalarType::Float32 => ScalarValue::Float32(value as f32),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bool(v) => write!(f, "{}", v),
            ScalarValue::UInt8(v) => write!(f, "{}u8", v),
            ScalarValue::Int16(v) => write!(f, "{}i16", v),
            ScalarValue::Int32(v) => write!(f, "{}", v),
            ScalarValue::Float32(v) => write!(f, "{:?}f", v),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        ScalarValue::Bool(v)
    }
}

impl From<u8> for ScalarValue {
    fn from(v: u8) -> Self {
        ScalarValue::UInt8(v)
    }
}

impl From<i16> for ScalarValue {
    fn from(v: i16) -> Self {
        ScalarValue::Int16(v)
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        ScalarValue::Int32(v)
    }
}

impl From<f32> for ScalarValue {
    fn from(v: f32) -> Self {
        ScalarValue::Float32(v)
    }
}
