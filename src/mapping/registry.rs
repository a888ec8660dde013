//! Named registry for multiple mapped regions

use std::{
    collections::HashMap,
    sync::RwLock,
};

use crate::error::{MapStructError, Result};

use super::{
    config::MappingConfig,
    region::{MappedRegion, RegionStats},
};

/// Collection of mapped regions addressed by name
///
/// Regions are cheap handles; the registry keeps one clone of each so that a
/// region stays open for as long as it is registered.
#[derive(Debug, Default)]
pub struct RegionRegistry {
    regions: RwLock<HashMap<String, MappedRegion>>,
}

impl RegionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a region per the configuration and register it under `name`
    ///
    /// The write lock is held across the open so a duplicate name is rejected
    /// before any backing file is created or truncated.
    pub fn create(&self, name: &str, config: MappingConfig) -> Result<MappedRegion> {
        let mut regions = self.regions.write().unwrap();
        if regions.contains_key(name) {
            return Err(MapStructError::region_exists(name));
        }

        let region = MappedRegion::open(config)?;
        regions.insert(name.to_string(), region.clone());
        Ok(region)
    }

    /// Get a registered region
    pub fn get(&self, name: &str) -> Result<MappedRegion> {
        let regions = self.regions.read().unwrap();
        regions
            .get(name)
            .cloned()
            .ok_or_else(|| MapStructError::region_not_found(name))
    }

    /// Remove a region from the registry
    ///
    /// The region itself stays open until its last handle is dropped or it is
    /// closed explicitly.
    pub fn remove(&self, name: &str) -> Result<MappedRegion> {
        let mut regions = self.regions.write().unwrap();
        regions
            .remove(name)
            .ok_or_else(|| MapStructError::region_not_found(name))
    }

    /// Whether a region is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.regions.read().unwrap().contains_key(name)
    }

    /// Names of all registered regions
    pub fn names(&self) -> Vec<String> {
        self.regions.read().unwrap().keys().cloned().collect()
    }

    /// Number of registered regions
    pub fn len(&self) -> usize {
        self.regions.read().unwrap().len()
    }

    /// Whether the registry holds no regions
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush every registered region to its backing file
    pub fn flush_all(&self) -> Result<()> {
        let regions = self.regions.read().unwrap();
        for region in regions.values() {
            region.flush()?;
        }
        Ok(())
    }

    /// Stats snapshot for every registered region
    pub fn stats(&self) -> Vec<(String, RegionStats)> {
        let regions = self.regions.read().unwrap();
        regions
            .iter()
            .map(|(name, region)| (name.clone(), region.stats()))
            .collect()
    }

    /// Total mapped bytes across all registered regions
    pub fn total_mapped_bytes(&self) -> usize {
        let regions = self.regions.read().unwrap();
        regions.values().map(|region| region.len()).sum()
    }
}
