//! Typed views binding a struct descriptor to a live mapped region

use std::sync::{Arc, Weak};

use crate::error::{MapStructError, Result};
use crate::layout::{
    descriptor::{Field, StructDescriptor},
    field::FieldType,
    value::{self, Value},
};
use crate::mapping::region::{MappedRegion, RegionInner};

/// Typed accessor over `descriptor.total_size()` bytes of a mapped region
///
/// A view never owns its region: it holds a weak handle and re-derives the
/// mapping on every access, so a view can never dereference freed memory.
/// After the region is closed every access fails with a closed error; after
/// a shrink, accesses whose range ends past the new length fail with a
/// bounds error at the time of the access.
#[derive(Debug, Clone)]
pub struct StructView {
    region: Weak<RegionInner>,
    base_offset: usize,
    descriptor: Arc<StructDescriptor>,
}

impl StructView {
    /// Bind a descriptor to `descriptor.total_size()` bytes at `base_offset`
    pub fn bind(
        region: &MappedRegion,
        base_offset: usize,
        descriptor: Arc<StructDescriptor>,
    ) -> Result<Self> {
        if region.is_closed() {
            return Err(MapStructError::Closed);
        }
        let available = region.len();
        let needed = descriptor.total_size();
        if base_offset
            .checked_add(needed)
            .map_or(true, |end| end > available)
        {
            return Err(MapStructError::bounds(base_offset, needed, available));
        }
        Ok(Self {
            region: Arc::downgrade(region.inner()),
            base_offset,
            descriptor,
        })
    }

    /// Byte offset of the view within its region
    pub fn base_offset(&self) -> usize {
        self.base_offset
    }

    /// Descriptor the view was bound with
    pub fn descriptor(&self) -> &Arc<StructDescriptor> {
        &self.descriptor
    }

    fn region(&self) -> Result<Arc<RegionInner>> {
        self.region.upgrade().ok_or(MapStructError::Closed)
    }

    fn resolve(&self, name: &str) -> Result<(&Field, usize)> {
        let field = self.descriptor.field(name)?;
        Ok((field, self.base_offset + field.offset))
    }

    /// Read a field as a typed value
    ///
    /// Nested fields and arrays of non-scalar elements have no single-value
    /// form and must be traversed via [`sub_view`](Self::sub_view) /
    /// [`sub_view_at`](Self::sub_view_at).
    pub fn get(&self, name: &str) -> Result<Value> {
        let region = self.region()?;
        let (field, offset) = self.resolve(name)?;
        // Reject shapeless reads before touching the mapping
        value::readable_as_value(name, &field.ty)?;
        let mut buf = vec![0u8; field.size];
        region.read_at(offset, &mut buf)?;
        value::decode(name, &field.ty, &buf, self.descriptor.byte_order())
    }

    /// Write a field from a typed value
    ///
    /// The write is immediate and visible to every other view over the same
    /// region as soon as the call returns.
    pub fn set(&self, name: &str, value: &Value) -> Result<()> {
        let region = self.region()?;
        let (field, offset) = self.resolve(name)?;
        let mut buf = vec![0u8; field.size];
        value::encode(name, &field.ty, value, self.descriptor.byte_order(), &mut buf)?;
        region.write_at(offset, &buf)
    }

    /// Sub-view over a nested struct field
    pub fn sub_view(&self, name: &str) -> Result<StructView> {
        let (field, offset) = self.resolve(name)?;
        match &field.ty {
            FieldType::Nested { descriptor } => Ok(StructView {
                region: self.region.clone(),
                base_offset: offset,
                descriptor: Arc::clone(descriptor),
            }),
            other => Err(MapStructError::type_mismatch(
                name,
                "nested struct",
                other.type_name(),
            )),
        }
    }

    /// Sub-view over one element of an array field
    ///
    /// Nested elements yield a view over their own descriptor; scalar
    /// elements yield a single-field view whose field is named `"value"`.
    pub fn sub_view_at(&self, name: &str, index: usize) -> Result<StructView> {
        let (field, offset) = self.resolve(name)?;
        let (element, count) = match &field.ty {
            FieldType::Array { element, count } => (element.as_ref(), *count),
            other => {
                return Err(MapStructError::type_mismatch(
                    name,
                    "array",
                    other.type_name(),
                ))
            }
        };
        if index >= count {
            return Err(MapStructError::index(index, count));
        }

        let descriptor = match element {
            FieldType::Nested { descriptor } => Arc::clone(descriptor),
            scalar => StructDescriptor::scalar(scalar.clone(), self.descriptor.byte_order())?,
        };
        Ok(StructView {
            region: self.region.clone(),
            base_offset: offset + index * element.size(),
            descriptor,
        })
    }
}
