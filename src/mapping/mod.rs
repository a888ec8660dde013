//! Mapping lifecycle management

pub mod config;
pub mod region;
pub mod registry;

pub use config::{AccessMode, BackingKind, MappingConfig};
pub use region::{MappedRegion, RegionStats};
pub use registry::RegionRegistry;
