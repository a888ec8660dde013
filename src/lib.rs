//! # mapstruct - Typed Zero-Copy Struct Views over Memory-Mapped Files
//!
//! mapstruct lets a caller declare a C-compatible struct shape once and then
//! read and write individual fields directly against the mapped bytes of a
//! file (or anonymous memory), with no intermediate copying or parsing.
//!
//! ## Features
//!
//! - **Layout engine**: natural (C default) or packed field placement, with
//!   offsets, padding and total size computed once at build time
//! - **Mapping lifecycle**: create/open, grow, shrink, flush and close over
//!   file-backed or anonymous regions
//! - **Typed views**: bounds-checked get/set per field, nested sub-views and
//!   array element access
//! - **Stale-view safety**: views hold weak region handles and fail with a
//!   reported error instead of touching unmapped memory
//!
//! ## Architecture
//!
//! ```text
//! declare fields ──► StructDescriptor (offsets, size, alignment)
//!                              │
//! open_mapping ──► MappedRegion (mmap, grow/shrink/flush/close)
//!                              │
//!            bind(region, offset, descriptor)
//!                              │
//!                        StructView ──► get / set / sub_view
//! ```
//!
//! On disk a region is exactly the raw struct bytes of the computed layout:
//! no header, no magic number, byte-for-byte compatible with the equivalent
//! native struct definition under the chosen packing mode and byte order.
//!
//! ## Example
//!
//! ```no_run
//! use mapstruct::{describe, open_mapping, bind};
//! use mapstruct::{AccessMode, ByteOrder, FieldType, IntWidth, Packing, Value};
//!
//! # fn main() -> mapstruct::Result<()> {
//! let descriptor = describe(
//!     vec![
//!         ("seq".to_string(), FieldType::uint(IntWidth::W64)),
//!         ("flags".to_string(), FieldType::uint(IntWidth::W16)),
//!     ],
//!     Packing::Natural,
//!     ByteOrder::Little,
//! )?;
//!
//! let region = open_mapping(
//!     Some(std::path::Path::new("/tmp/records.bin")),
//!     AccessMode::CreateReadWrite,
//!     descriptor.total_size() * 16,
//! )?;
//!
//! let record = bind(&region, 0, descriptor.clone())?;
//! record.set("seq", &Value::UInt(1))?;
//! assert_eq!(record.get("seq")?, Value::UInt(1));
//! region.flush()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod layout;
pub mod mapping;
pub mod view;

pub use error::{MapStructError, Result};
pub use layout::{
    describe, ByteOrder, Field, FieldType, FloatWidth, IntWidth, Packing, StructDescriptor, Value,
};
pub use mapping::{AccessMode, BackingKind, MappedRegion, MappingConfig, RegionRegistry, RegionStats};
pub use view::StructView;

use std::path::Path;
use std::sync::Arc;

/// Open or create a mapped region
///
/// A `path` of `None` allocates a zero-initialized anonymous region, which
/// only supports [`AccessMode::CreateReadWrite`]. File targets are extended
/// with zero bytes if shorter than `initial_size`.
pub fn open_mapping(
    path: Option<&Path>,
    mode: AccessMode,
    initial_size: usize,
) -> Result<MappedRegion> {
    let mut config = MappingConfig::new(initial_size).with_mode(mode);
    if let Some(path) = path {
        config = config.with_path(path);
    }
    MappedRegion::open(config)
}

/// Bind a descriptor to `descriptor.total_size()` bytes of a region
pub fn bind(
    region: &MappedRegion,
    base_offset: usize,
    descriptor: Arc<StructDescriptor>,
) -> Result<StructView> {
    StructView::bind(region, base_offset, descriptor)
}
