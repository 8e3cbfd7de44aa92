use std::path::PathBuf;

use thiserror::Error;

/// Main library error type covering packet construction, validation and IO
#[derive(Error, Debug)]
pub enum VoeventError {
    #[error("Invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("Unsupported author field: {field}")]
    UnsupportedAuthorField { field: String },

    #[error("Invalid coordinate system: {token}")]
    InvalidCoordinateSystem { token: String },

    #[error("Schema violation at {path}: {reason}")]
    SchemaViolation { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("VOEvent parsing error: {details}")]
    Parse { details: String },

    #[error("Invalid value for {field}: '{value}'")]
    InvalidValue { field: String, value: String },

    #[error("Schema loading error: {source_name} - {details}")]
    SchemaLoad { source_name: String, details: String },

    #[error("LibXML2 internal error: {details}")]
    LibXml2Internal { details: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system traversal error: {path} - {reason}")]
    FileSystemTraversal { path: PathBuf, reason: String },
}

impl VoeventError {
    pub(crate) fn parse(details: impl Into<String>) -> Self {
        VoeventError::Parse {
            details: details.into(),
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        VoeventError::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// LibXML2-specific error types
#[derive(Error, Debug)]
pub enum LibXml2Error {
    #[error("Schema parsing failed: null pointer returned")]
    SchemaParseFailed,

    #[error("Validation context creation failed")]
    ValidationContextCreationFailed,

    #[error("Document is not well-formed XML: {name}")]
    MalformedDocument { name: String },

    #[error("Validation of {name} failed with internal code {code}")]
    ValidationFailed { code: i32, name: String },

    #[error("Memory allocation failed in libxml2")]
    MemoryAllocation,

    #[error("Document too large for libxml2: {size} bytes")]
    DocumentTooLarge { size: usize },
}

impl From<LibXml2Error> for VoeventError {
    fn from(err: LibXml2Error) -> Self {
        VoeventError::LibXml2Internal {
            details: err.to_string(),
        }
    }
}

impl From<crate::config::ConfigError> for VoeventError {
    fn from(err: crate::config::ConfigError) -> Self {
        VoeventError::Config(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, VoeventError>;

/// LibXML2 result type alias
pub type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;
