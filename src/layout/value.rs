//! Runtime values and their byte-level encoding
//!
//! Conversion between [`Value`] and raw mapped bytes respects the byte order
//! chosen at descriptor build time. Out-of-range integers and wrong-shape
//! values are rejected; nothing is ever silently truncated or coerced.

use crate::error::{MapStructError, Result};

use super::field::{ByteOrder, FieldType, FloatWidth, IntWidth};

/// A value read from or written to a single field
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed integer of any declared width
    Int(i64),
    /// Unsigned integer of any declared width
    UInt(u64),
    F32(f32),
    F64(f64),
    /// Raw bytes for FixedBytes fields and whole scalar arrays
    Bytes(Vec<u8>),
}

impl Value {
    /// Short variant name used in diagnostics
    pub fn variant_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Bytes(_) => "bytes",
        }
    }
}

fn read_uint(bytes: &[u8], order: ByteOrder) -> u64 {
    let mut buf = [0u8; 8];
    match order {
        ByteOrder::Little => buf[..bytes.len()].copy_from_slice(bytes),
        ByteOrder::Big => buf[8 - bytes.len()..].copy_from_slice(bytes),
    }
    match order {
        ByteOrder::Little => u64::from_le_bytes(buf),
        ByteOrder::Big => u64::from_be_bytes(buf),
    }
}

fn read_int(bytes: &[u8], order: ByteOrder) -> i64 {
    let raw = read_uint(bytes, order);
    let shift = 64 - bytes.len() * 8;
    // Sign-extend from the declared width
    ((raw << shift) as i64) >> shift
}

fn write_uint(out: &mut [u8], value: u64, order: ByteOrder) {
    match order {
        ByteOrder::Little => out.copy_from_slice(&value.to_le_bytes()[..out.len()]),
        ByteOrder::Big => out.copy_from_slice(&value.to_be_bytes()[8 - out.len()..]),
    }
}

/// Inclusive signed range for an integer width
fn signed_range(width: IntWidth) -> (i64, i64) {
    match width {
        IntWidth::W8 => (i8::MIN as i64, i8::MAX as i64),
        IntWidth::W16 => (i16::MIN as i64, i16::MAX as i64),
        IntWidth::W32 => (i32::MIN as i64, i32::MAX as i64),
        IntWidth::W64 => (i64::MIN, i64::MAX),
    }
}

/// Inclusive unsigned maximum for an integer width
fn unsigned_max(width: IntWidth) -> u64 {
    match width {
        IntWidth::W8 => u8::MAX as u64,
        IntWidth::W16 => u16::MAX as u64,
        IntWidth::W32 => u32::MAX as u64,
        IntWidth::W64 => u64::MAX,
    }
}

/// True for types whose whole-field value form is raw bytes inside an array
fn is_scalar(ty: &FieldType) -> bool {
    matches!(
        ty,
        FieldType::Int { .. } | FieldType::Float { .. } | FieldType::FixedBytes { .. }
    )
}

/// Check that a field type has a single-value form for whole-field access
///
/// Nested structs and arrays of non-scalar elements must be traversed through
/// sub-views instead.
pub fn readable_as_value(field: &str, ty: &FieldType) -> Result<()> {
    match ty {
        FieldType::Nested { .. } => Err(MapStructError::type_mismatch(
            field,
            "traversal via sub_view",
            "whole-struct read",
        )),
        FieldType::Array { element, .. } if !is_scalar(element) => {
            Err(MapStructError::type_mismatch(
                field,
                "per-element access via sub_view_at",
                "whole-array read of non-scalar elements",
            ))
        }
        _ => Ok(()),
    }
}

/// Decode `bytes` (exactly `ty.size()` long) into a [`Value`]
pub fn decode(field: &str, ty: &FieldType, bytes: &[u8], order: ByteOrder) -> Result<Value> {
    debug_assert_eq!(bytes.len(), ty.size());
    match ty {
        FieldType::Int { signed: true, .. } => Ok(Value::Int(read_int(bytes, order))),
        FieldType::Int { signed: false, .. } => Ok(Value::UInt(read_uint(bytes, order))),
        FieldType::Float {
            width: FloatWidth::W32,
        } => Ok(Value::F32(f32::from_bits(read_uint(bytes, order) as u32))),
        FieldType::Float {
            width: FloatWidth::W64,
        } => Ok(Value::F64(f64::from_bits(read_uint(bytes, order)))),
        FieldType::FixedBytes { .. } => Ok(Value::Bytes(bytes.to_vec())),
        FieldType::Array { element, .. } if is_scalar(element) => {
            Ok(Value::Bytes(bytes.to_vec()))
        }
        FieldType::Array { .. } => Err(MapStructError::type_mismatch(
            field,
            "per-element access via sub_view_at",
            "whole-array read of non-scalar elements",
        )),
        FieldType::Nested { .. } => Err(MapStructError::type_mismatch(
            field,
            "traversal via sub_view",
            "whole-struct read",
        )),
    }
}

/// Encode `value` into `out` (exactly `ty.size()` long)
pub fn encode(
    field: &str,
    ty: &FieldType,
    value: &Value,
    order: ByteOrder,
    out: &mut [u8],
) -> Result<()> {
    debug_assert_eq!(out.len(), ty.size());
    match ty {
        FieldType::Int {
            width,
            signed: true,
        } => {
            let x = match value {
                Value::Int(x) => *x,
                // An unsigned value is fine as long as it fits the width
                Value::UInt(x) if *x <= signed_range(*width).1 as u64 => *x as i64,
                Value::UInt(x) => {
                    return Err(MapStructError::type_mismatch(
                        field,
                        format!("integer in range of {}", ty.type_name()),
                        format!("{}", x),
                    ))
                }
                other => {
                    return Err(MapStructError::type_mismatch(
                        field,
                        ty.type_name(),
                        other.variant_name(),
                    ))
                }
            };
            let (min, max) = signed_range(*width);
            if x < min || x > max {
                return Err(MapStructError::type_mismatch(
                    field,
                    format!("integer in [{}, {}]", min, max),
                    format!("{}", x),
                ));
            }
            write_uint(out, x as u64, order);
            Ok(())
        }
        FieldType::Int {
            width,
            signed: false,
        } => {
            let x = match value {
                Value::UInt(x) => *x,
                Value::Int(x) if *x >= 0 => *x as u64,
                Value::Int(x) => {
                    return Err(MapStructError::type_mismatch(
                        field,
                        format!("integer in range of {}", ty.type_name()),
                        format!("{}", x),
                    ))
                }
                other => {
                    return Err(MapStructError::type_mismatch(
                        field,
                        ty.type_name(),
                        other.variant_name(),
                    ))
                }
            };
            let max = unsigned_max(*width);
            if x > max {
                return Err(MapStructError::type_mismatch(
                    field,
                    format!("integer in [0, {}]", max),
                    format!("{}", x),
                ));
            }
            write_uint(out, x, order);
            Ok(())
        }
        FieldType::Float {
            width: FloatWidth::W32,
        } => match value {
            Value::F32(x) => {
                write_uint(out, x.to_bits() as u64, order);
                Ok(())
            }
            other => Err(MapStructError::type_mismatch(
                field,
                "f32",
                other.variant_name(),
            )),
        },
        FieldType::Float {
            width: FloatWidth::W64,
        } => match value {
            Value::F64(x) => {
                write_uint(out, x.to_bits(), order);
                Ok(())
            }
            other => Err(MapStructError::type_mismatch(
                field,
                "f64",
                other.variant_name(),
            )),
        },
        FieldType::FixedBytes { len } => match value {
            Value::Bytes(bytes) if bytes.len() == *len => {
                out.copy_from_slice(bytes);
                Ok(())
            }
            Value::Bytes(bytes) => Err(MapStructError::type_mismatch(
                field,
                format!("{} bytes", len),
                format!("{} bytes", bytes.len()),
            )),
            other => Err(MapStructError::type_mismatch(
                field,
                ty.type_name(),
                other.variant_name(),
            )),
        },
        FieldType::Array { element, .. } if is_scalar(element) => match value {
            Value::Bytes(bytes) if bytes.len() == ty.size() => {
                out.copy_from_slice(bytes);
                Ok(())
            }
            Value::Bytes(bytes) => Err(MapStructError::type_mismatch(
                field,
                format!("{} bytes", ty.size()),
                format!("{} bytes", bytes.len()),
            )),
            other => Err(MapStructError::type_mismatch(
                field,
                ty.type_name(),
                other.variant_name(),
            )),
        },
        FieldType::Array { .. } => Err(MapStructError::type_mismatch(
            field,
            "per-element access via sub_view_at",
            "whole-array write of non-scalar elements",
        )),
        FieldType::Nested { .. } => Err(MapStructError::type_mismatch(
            field,
            "traversal via sub_view",
            "whole-struct write",
        )),
    }
}
