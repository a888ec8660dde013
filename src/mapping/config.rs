//! Configuration types for mapped regions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{MapStructError, Result};

/// Kind of storage behind a mapped region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackingKind {
    /// Region backed by a regular file on disk
    File,
    /// Region backed by anonymous memory (memfd on Linux)
    Anonymous,
}

impl BackingKind {
    /// Human-readable name for the backing kind
    pub fn name(&self) -> &'static str {
        match self {
            BackingKind::File => "file-backed",
            BackingKind::Anonymous => "anonymous",
        }
    }
}

/// Access mode requested when opening a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMode {
    /// Map an existing file read-only; writes and resizes are rejected
    ReadOnly,
    /// Map an existing file read-write
    ReadWrite,
    /// Create the file if missing, then map read-write
    CreateReadWrite,
}

impl AccessMode {
    /// Whether this mode permits writes through the mapping
    pub fn is_writable(&self) -> bool {
        !matches!(self, AccessMode::ReadOnly)
    }
}

/// Configuration for opening or creating a mapped region
#[derive(Debug, Clone)]
pub struct MappingConfig {
    /// Backing file path; `None` maps anonymous memory
    pub path: Option<PathBuf>,
    /// Requested access mode
    pub mode: AccessMode,
    /// Initial mapping length in bytes, must be nonzero
    pub initial_size: usize,
    /// Unix permissions used when creating the backing file
    pub permissions: u32,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            path: None,
            mode: AccessMode::CreateReadWrite,
            initial_size: 0,
            permissions: 0o644,
        }
    }
}

impl MappingConfig {
    /// Create a new configuration with the given initial size
    pub fn new(initial_size: usize) -> Self {
        Self {
            initial_size,
            ..Default::default()
        }
    }

    /// Set the backing file path
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the access mode
    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the permissions used when creating the backing file
    pub fn with_permissions(mut self, permissions: u32) -> Self {
        self.permissions = permissions;
        self
    }

    /// Backing kind implied by the configuration
    pub fn backing_kind(&self) -> BackingKind {
        if self.path.is_some() {
            BackingKind::File
        } else {
            BackingKind::Anonymous
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.initial_size == 0 {
            return Err(MapStructError::size(
                0,
                "initial mapping size must be greater than 0",
            ));
        }

        // Anonymous memory has no existing content to open
        if self.path.is_none() && self.mode != AccessMode::CreateReadWrite {
            return Err(MapStructError::invalid_parameter(
                "mode",
                "anonymous regions only support CreateReadWrite",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = MappingConfig::new(4096)
            .with_path("/tmp/mapstruct_test")
            .with_mode(AccessMode::ReadWrite)
            .with_permissions(0o600);

        assert_eq!(config.initial_size, 4096);
        assert_eq!(config.mode, AccessMode::ReadWrite);
        assert_eq!(config.permissions, 0o600);
        assert_eq!(config.backing_kind(), BackingKind::File);
    }

    #[test]
    fn test_config_validation() {
        // Zero size should fail
        let config = MappingConfig::new(0);
        assert!(matches!(
            config.validate().unwrap_err(),
            MapStructError::Size { .. }
        ));

        // Anonymous read-only makes no sense
        let config = MappingConfig::new(4096).with_mode(AccessMode::ReadOnly);
        assert!(config.validate().is_err());

        let config = MappingConfig::new(4096);
        assert!(config.validate().is_ok());
        assert_eq!(config.backing_kind(), BackingKind::Anonymous);
    }

    #[test]
    fn test_access_mode_writability() {
        assert!(!AccessMode::ReadOnly.is_writable());
        assert!(AccessMode::ReadWrite.is_writable());
        assert!(AccessMode::CreateReadWrite.is_writable());
    }
}
