//! Element types and the static type-descriptor table.
//!
//! Tensor element types travel across the boundary as small integer tags,
//! using the native format's stable values. The full tag space is
//! representable so that values produced by the engine can carry kinds the
//! boundary does not marshal (half precision, complex, string); whether a
//! kind may actually cross the boundary is decided by a lookup in
//! [`SUPPORTED_TYPES`], never by the enum itself.

use crate::error::{CoreError, Result};
use std::fmt;
use std::str::FromStr;

/// Element type of a tensor, tagged with the native wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ElementType {
    /// 32-bit IEEE float.
    F32 = 1,
    /// Unsigned 8-bit integer.
    U8 = 2,
    /// Signed 8-bit integer.
    I8 = 3,
    /// Unsigned 16-bit integer.
    U16 = 4,
    /// Signed 16-bit integer.
    I16 = 5,
    /// Signed 32-bit integer.
    I32 = 6,
    /// Signed 64-bit integer.
    I64 = 7,
    /// Variable-length string (not marshaled).
    Str = 8,
    /// Boolean, one byte per element.
    Bool = 9,
    /// 16-bit IEEE float (not marshaled).
    F16 = 10,
    /// 64-bit IEEE float.
    F64 = 11,
    /// Unsigned 32-bit integer.
    U32 = 12,
    /// Unsigned 64-bit integer.
    U64 = 13,
    /// Single-precision complex (not marshaled).
    Complex64 = 14,
    /// Double-precision complex (not marshaled).
    Complex128 = 15,
    /// Brain float 16 (not marshaled).
    BF16 = 16,
}

/// One row of the dispatch table: an element type the boundary can marshal
/// and its fixed byte width.
#[derive(Debug, Clone, Copy)]
pub struct TypeDescriptor {
    /// The element type this row describes.
    pub dtype: ElementType,
    /// Bytes per element.
    pub width: usize,
    /// Canonical lowercase name.
    pub name: &'static str,
}

/// The closed set of element types that may cross the boundary, in the
/// native format's tag order.
pub const SUPPORTED_TYPES: [TypeDescriptor; 11] = [
    TypeDescriptor { dtype: ElementType::F32, width: 4, name: "float32" },
    TypeDescriptor { dtype: ElementType::U8, width: 1, name: "uint8" },
    TypeDescriptor { dtype: ElementType::I8, width: 1, name: "int8" },
    TypeDescriptor { dtype: ElementType::U16, width: 2, name: "uint16" },
    TypeDescriptor { dtype: ElementType::I16, width: 2, name: "int16" },
    TypeDescriptor { dtype: ElementType::I32, width: 4, name: "int32" },
    TypeDescriptor { dtype: ElementType::I64, width: 8, name: "int64" },
    TypeDescriptor { dtype: ElementType::Bool, width: 1, name: "bool" },
    TypeDescriptor { dtype: ElementType::F64, width: 8, name: "float64" },
    TypeDescriptor { dtype: ElementType::U32, width: 4, name: "uint32" },
    TypeDescriptor { dtype: ElementType::U64, width: 8, name: "uint64" },
];

impl ElementType {
    /// Resolve a wire tag. Tag 0 is the undefined sentinel and resolves to
    /// an error, as does any tag outside the known space.
    pub fn from_wire(tag: i32) -> Result<Self> {
        match tag {
            1 => Ok(ElementType::F32),
            2 => Ok(ElementType::U8),
            3 => Ok(ElementType::I8),
            4 => Ok(ElementType::U16),
            5 => Ok(ElementType::I16),
            6 => Ok(ElementType::I32),
            7 => Ok(ElementType::I64),
            8 => Ok(ElementType::Str),
            9 => Ok(ElementType::Bool),
            10 => Ok(ElementType::F16),
            11 => Ok(ElementType::F64),
            12 => Ok(ElementType::U32),
            13 => Ok(ElementType::U64),
            14 => Ok(ElementType::Complex64),
            15 => Ok(ElementType::Complex128),
            16 => Ok(ElementType::BF16),
            other => Err(CoreError::UnknownTypeTag(other)),
        }
    }

    /// The stable wire tag for this type.
    pub fn to_wire(self) -> i32 {
        self as i32
    }

    /// Dispatch-table row for this type, `None` if the boundary cannot
    /// marshal it.
    pub fn descriptor(self) -> Option<&'static TypeDescriptor> {
        SUPPORTED_TYPES.iter().find(|d| d.dtype == self)
    }

    /// Bytes per element, `None` for kinds outside the dispatch table.
    pub fn byte_width(self) -> Option<usize> {
        self.descriptor().map(|d| d.width)
    }

    /// Whether this type may cross the boundary.
    pub fn is_supported(self) -> bool {
        self.descriptor().is_some()
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::F32 => "float32",
            ElementType::U8 => "uint8",
            ElementType::I8 => "int8",
            ElementType::U16 => "uint16",
            ElementType::I16 => "int16",
            ElementType::I32 => "int32",
            ElementType::I64 => "int64",
            ElementType::Str => "string",
            ElementType::Bool => "bool",
            ElementType::F16 => "float16",
            ElementType::F64 => "float64",
            ElementType::U32 => "uint32",
            ElementType::U64 => "uint64",
            ElementType::Complex64 => "complex64",
            ElementType::Complex128 => "complex128",
            ElementType::BF16 => "bfloat16",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let dtype = match s {
            "float32" => ElementType::F32,
            "uint8" => ElementType::U8,
            "int8" => ElementType::I8,
            "uint16" => ElementType::U16,
            "int16" => ElementType::I16,
            "int32" => ElementType::I32,
            "int64" => ElementType::I64,
            "string" => ElementType::Str,
            "bool" => ElementType::Bool,
            "float16" => ElementType::F16,
            "float64" => ElementType::F64,
            "uint32" => ElementType::U32,
            "uint64" => ElementType::U64,
            "complex64" => ElementType::Complex64,
            "complex128" => ElementType::Complex128,
            "bfloat16" => ElementType::BF16,
            other => return Err(CoreError::UnknownTypeName(other.to_string())),
        };
        Ok(dtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_round_trip_for_supported_types() {
        for desc in &SUPPORTED_TYPES {
            let tag = desc.dtype.to_wire();
            assert_eq!(ElementType::from_wire(tag).unwrap(), desc.dtype);
        }
    }

    #[test]
    fn exactly_eleven_supported_types() {
        assert_eq!(SUPPORTED_TYPES.len(), 11);
        for unsupported in [
            ElementType::Str,
            ElementType::F16,
            ElementType::Complex64,
            ElementType::Complex128,
            ElementType::BF16,
        ] {
            assert!(!unsupported.is_supported());
            assert!(unsupported.byte_width().is_none());
        }
    }

    #[test]
    fn undefined_and_unknown_tags_are_rejected() {
        assert!(matches!(
            ElementType::from_wire(0),
            Err(CoreError::UnknownTypeTag(0))
        ));
        assert!(matches!(
            ElementType::from_wire(42),
            Err(CoreError::UnknownTypeTag(42))
        ));
    }

    #[test]
    fn widths_match_native_sizes() {
        assert_eq!(ElementType::F32.byte_width(), Some(4));
        assert_eq!(ElementType::U8.byte_width(), Some(1));
        assert_eq!(ElementType::I64.byte_width(), Some(8));
        assert_eq!(ElementType::Bool.byte_width(), Some(1));
        assert_eq!(ElementType::F64.byte_width(), Some(8));
    }

    #[test]
    fn name_round_trip() {
        for desc in &SUPPORTED_TYPES {
            assert_eq!(desc.name.parse::<ElementType>().unwrap(), desc.dtype);
            assert_eq!(desc.dtype.as_str(), desc.name);
        }
    }
}
