//! Struct descriptor construction: offsets, padding and total size

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{MapStructError, Result};

use super::field::{ByteOrder, FieldType, Packing};

/// A placed field: declaration-order name and type plus its computed offset
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
    pub offset: usize,
    pub size: usize,
}

/// Compiled, immutable layout for a named sequence of fields
///
/// Offsets are computed once at build time and never change; descriptors are
/// shared by reference (`Arc`) among any number of views.
#[derive(Debug)]
pub struct StructDescriptor {
    fields: Vec<Field>,
    by_name: HashMap<String, usize>,
    total_size: usize,
    alignment: usize,
    packing: Packing,
    byte_order: ByteOrder,
}

/// Round `cursor` up to the next multiple of `alignment`
fn align_up(cursor: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment > 0);
    Some(cursor.checked_add(alignment - 1)? / alignment * alignment)
}

impl StructDescriptor {
    /// Compute a descriptor from an ordered field list
    ///
    /// In `Natural` mode each field is placed at the next multiple of its
    /// alignment and the total size is rounded up to the struct alignment,
    /// matching default C compiler packing. In `Packed` mode fields are
    /// placed back-to-back and the struct alignment is 1.
    pub fn compute(
        fields: Vec<(String, FieldType)>,
        packing: Packing,
        byte_order: ByteOrder,
    ) -> Result<Self> {
        let mut placed = Vec::with_capacity(fields.len());
        let mut by_name = HashMap::with_capacity(fields.len());
        let mut cursor = 0usize;
        let mut max_alignment = 1usize;

        for (name, ty) in fields {
            Self::validate_field(&name, &ty, byte_order)?;

            if by_name.contains_key(&name) {
                return Err(MapStructError::duplicate_field(&name));
            }

            let size = ty.checked_size().ok_or_else(|| {
                MapStructError::invalid_field(&name, "field size overflows usize")
            })?;
            let alignment = ty.alignment();
            max_alignment = max_alignment.max(alignment);

            let offset = match packing {
                Packing::Natural => align_up(cursor, alignment),
                Packing::Packed => Some(cursor),
            }
            .ok_or_else(|| {
                MapStructError::invalid_field(&name, "field offset overflows usize")
            })?;
            cursor = offset.checked_add(size).ok_or_else(|| {
                MapStructError::invalid_field(&name, "struct size overflows usize")
            })?;

            by_name.insert(name.clone(), placed.len());
            placed.push(Field {
                name,
                ty,
                offset,
                size,
            });
        }

        let (total_size, alignment) = match packing {
            Packing::Natural => {
                let total = align_up(cursor, max_alignment).ok_or_else(|| {
                    MapStructError::size(cursor, "total struct size overflows usize")
                })?;
                (total, max_alignment)
            }
            Packing::Packed => (cursor, 1),
        };

        Ok(Self {
            fields: placed,
            by_name,
            total_size,
            alignment,
            packing,
            byte_order,
        })
    }

    /// Single-field packed descriptor wrapping one scalar type
    ///
    /// Used for array-element sub-views over scalar elements; the field is
    /// named `"value"`.
    pub fn scalar(ty: FieldType, byte_order: ByteOrder) -> Result<Arc<Self>> {
        Ok(Arc::new(Self::compute(
            vec![("value".to_string(), ty)],
            Packing::Packed,
            byte_order,
        )?))
    }

    fn validate_field(name: &str, ty: &FieldType, byte_order: ByteOrder) -> Result<()> {
        if name.is_empty() {
            return Err(MapStructError::invalid_field(
                name,
                "field name cannot be empty",
            ));
        }
        match ty {
            FieldType::FixedBytes { len: 0 } => Err(MapStructError::invalid_field(
                name,
                "fixed byte run cannot be empty",
            )),
            FieldType::Array { count: 0, .. } => Err(MapStructError::invalid_field(
                name,
                "array count cannot be zero",
            )),
            FieldType::Array { element, .. } => Self::validate_field(name, element, byte_order),
            FieldType::Nested { descriptor } => {
                if descriptor.total_size() == 0 {
                    return Err(MapStructError::invalid_field(
                        name,
                        "nested descriptor has zero size",
                    ));
                }
                if descriptor.byte_order() != byte_order {
                    return Err(MapStructError::invalid_field(
                        name,
                        "nested descriptor byte order differs from enclosing struct",
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Result<&Field> {
        self.by_name
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| MapStructError::unknown_field(name))
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Total struct size including any trailing padding
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Overall struct alignment (1 for packed descriptors)
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Packing mode chosen at build time
    pub fn packing(&self) -> Packing {
        self.packing
    }

    /// Byte order chosen at build time
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }
}
