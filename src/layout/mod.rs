//! Struct layout engine: field types, offset computation and value codecs
//!
//! Pure computation, no I/O. A descriptor is built once (packing mode and
//! byte order fixed at that point) and then shared by reference among views.

pub mod descriptor;
pub mod field;
pub mod value;

pub use descriptor::{Field, StructDescriptor};
pub use field::{ByteOrder, FieldType, FloatWidth, IntWidth, Packing};
pub use value::Value;

use std::sync::Arc;

use crate::error::Result;

/// Build an immutable struct descriptor from an ordered field list
pub fn describe(
    fields: Vec<(String, FieldType)>,
    packing: Packing,
    byte_order: ByteOrder,
) -> Result<Arc<StructDescriptor>> {
    Ok(Arc::new(StructDescriptor::compute(
        fields, packing, byte_order,
    )?))
}
