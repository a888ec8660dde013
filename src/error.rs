//! Error types and handling for mapstruct

/// Result type alias for mapstruct operations
pub type Result<T> = std::result::Result<T, MapStructError>;

/// Error types for layout construction, mapping lifecycle and field access
#[derive(Debug, thiserror::Error)]
pub enum MapStructError {
    /// OS-level open/mmap/remap/msync failure
    #[error("Mapping error: {message}")]
    Mapping {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Invalid requested region size
    #[error("Invalid size {requested}: {message}")]
    Size { requested: usize, message: String },

    /// Grow/shrink failed; the region is left in its prior valid state
    #[error("Resize failed: {message}")]
    Resize { message: String },

    /// Access or binding exceeds the region extent
    #[error("Out of bounds: offset {offset} + {requested} bytes exceeds region length {available}")]
    Bounds {
        offset: usize,
        requested: usize,
        available: usize,
    },

    /// Use of a region or view after close
    #[error("Region is closed")]
    Closed,

    /// Write attempted through a read-only mapping
    #[error("Cannot modify a read-only mapping")]
    ReadOnlyRegion,

    /// Field name repeated within one descriptor
    #[error("Duplicate field: {name}")]
    DuplicateField { name: String },

    /// Zero-size or otherwise malformed field specification
    #[error("Invalid field {name}: {message}")]
    InvalidField { name: String, message: String },

    /// Field name absent from the descriptor
    #[error("Unknown field: {name}")]
    UnknownField { name: String },

    /// Value shape or range doesn't match the declared field type
    #[error("Type mismatch for field {field}: expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// Array index outside [0, count)
    #[error("Index {index} out of range for array of {count} elements")]
    Index { index: usize, count: usize },

    /// Region name already present in a registry
    #[error("Region already exists: {name}")]
    RegionExists { name: String },

    /// Region name absent from a registry
    #[error("Region not found: {name}")]
    RegionNotFound { name: String },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },
}

impl MapStructError {
    /// Create a mapping error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Mapping {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create a mapping error without an I/O source
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping {
            message: message.into(),
            source: None,
        }
    }

    /// Create a size error
    pub fn size(requested: usize, message: impl Into<String>) -> Self {
        Self::Size {
            requested,
            message: message.into(),
        }
    }

    /// Create a resize error
    pub fn resize(message: impl Into<String>) -> Self {
        Self::Resize {
            message: message.into(),
        }
    }

    /// Create a bounds error
    pub fn bounds(offset: usize, requested: usize, available: usize) -> Self {
        Self::Bounds {
            offset,
            requested,
            available,
        }
    }

    /// Create a duplicate field error
    pub fn duplicate_field(name: impl Into<String>) -> Self {
        Self::DuplicateField { name: name.into() }
    }

    /// Create an invalid field error
    pub fn invalid_field(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField { name: name.into() }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an index error
    pub fn index(index: usize, count: usize) -> Self {
        Self::Index { index, count }
    }

    /// Create a region exists error
    pub fn region_exists(name: impl Into<String>) -> Self {
        Self::RegionExists { name: name.into() }
    }

    /// Create a region not found error
    pub fn region_not_found(name: impl Into<String>) -> Self {
        Self::RegionNotFound { name: name.into() }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for MapStructError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}
