//! Field type definitions and their size/alignment rules

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::descriptor::StructDescriptor;

/// Byte order for all scalar fields of a descriptor, fixed at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    Little,
    Big,
}

impl Default for ByteOrder {
    fn default() -> Self {
        // Matches the dominant native layout for files shared with C code
        Self::Little
    }
}

/// Packing mode for a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Packing {
    /// Fields aligned to their natural alignment, trailing padding up to the
    /// struct alignment, as a C compiler lays out an unannotated struct
    Natural,
    /// Fields placed back-to-back with no padding at all
    Packed,
}

/// Integer field width in bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    /// Size of the integer in bytes
    pub fn size(&self) -> usize {
        match self {
            IntWidth::W8 => 1,
            IntWidth::W16 => 2,
            IntWidth::W32 => 4,
            IntWidth::W64 => 8,
        }
    }
}

/// Float field width in bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    W32,
    W64,
}

impl FloatWidth {
    /// Size of the float in bytes
    pub fn size(&self) -> usize {
        match self {
            FloatWidth::W32 => 4,
            FloatWidth::W64 => 8,
        }
    }
}

/// Type of a single field within a struct layout
#[derive(Debug, Clone)]
pub enum FieldType {
    /// Fixed-width integer, signed or unsigned
    Int { width: IntWidth, signed: bool },
    /// IEEE-754 float
    Float { width: FloatWidth },
    /// Opaque byte run of a fixed length, alignment 1
    FixedBytes { len: usize },
    /// Homogeneous inline array
    Array { element: Box<FieldType>, count: usize },
    /// Embedded struct with its own descriptor
    Nested { descriptor: Arc<StructDescriptor> },
}

impl FieldType {
    /// Size of the field in bytes
    ///
    /// Saturates at `usize::MAX` for oversized specs; descriptor construction
    /// rejects those before any layout is built.
    pub fn size(&self) -> usize {
        self.checked_size().unwrap_or(usize::MAX)
    }

    /// Size of the field in bytes, or `None` if it overflows `usize`
    pub fn checked_size(&self) -> Option<usize> {
        match self {
            FieldType::Int { width, .. } => Some(width.size()),
            FieldType::Float { width } => Some(width.size()),
            FieldType::FixedBytes { len } => Some(*len),
            FieldType::Array { element, count } => element.checked_size()?.checked_mul(*count),
            FieldType::Nested { descriptor } => Some(descriptor.total_size()),
        }
    }

    /// Natural alignment of the field in bytes
    ///
    /// Scalars align to their own size, byte runs to 1, arrays to their
    /// element alignment and nested structs to their descriptor's alignment.
    pub fn alignment(&self) -> usize {
        match self {
            FieldType::Int { width, .. } => width.size(),
            FieldType::Float { width } => width.size(),
            FieldType::FixedBytes { .. } => 1,
            FieldType::Array { element, .. } => element.alignment(),
            FieldType::Nested { descriptor } => descriptor.alignment(),
        }
    }

    /// Short type name used in diagnostics
    pub fn type_name(&self) -> String {
        match self {
            FieldType::Int { width, signed } => {
                format!("{}{}", if *signed { "i" } else { "u" }, width.size() * 8)
            }
            FieldType::Float { width } => format!("f{}", width.size() * 8),
            FieldType::FixedBytes { len } => format!("bytes[{}]", len),
            FieldType::Array { element, count } => {
                format!("[{}; {}]", element.type_name(), count)
            }
            FieldType::Nested { descriptor } => {
                format!("struct({} bytes)", descriptor.total_size())
            }
        }
    }

    /// Shorthand for a signed integer field
    pub fn int(width: IntWidth) -> Self {
        FieldType::Int {
            width,
            signed: true,
        }
    }

    /// Shorthand for an unsigned integer field
    pub fn uint(width: IntWidth) -> Self {
        FieldType::Int {
            width,
            signed: false,
        }
    }

    /// Shorthand for an array field
    pub fn array(element: FieldType, count: usize) -> Self {
        FieldType::Array {
            element: Box::new(element),
            count,
        }
    }

    /// Shorthand for a nested struct field
    pub fn nested(descriptor: Arc<StructDescriptor>) -> Self {
        FieldType::Nested { descriptor }
    }
}
