//! Error types for schema compilation
//!
//! A schema that cannot be compiled is a configuration error of the stage
//! that owns it, never a property of the document being validated.

use thiserror::Error;

/// Errors raised while compiling a schema document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Keyword outside the Draft 2020-12 vocabulary (strict mode)
    #[error("unknown schema keyword '{keyword}' at {location}")]
    UnknownKeyword { keyword: String, location: String },

    /// Keyword present but its value has the wrong shape
    #[error("invalid value for '{keyword}' at {location}: {reason}")]
    InvalidKeyword {
        keyword: String,
        location: String,
        reason: String,
    },

    /// `format` value the validator does not implement
    #[error("unknown format '{format}' at {location}")]
    UnknownFormat { format: String, location: String },

    /// `$ref` pointing at a location the document does not contain
    #[error("unresolved reference '{reference}'")]
    UnresolvedRef { reference: String },

    /// `$ref` chain that returns to itself without descending into the instance
    #[error("reference cycle through '{reference}'")]
    RefCycle { reference: String },

    /// Schema rejected by the validator build (bad regex, meta-schema violation)
    #[error("schema rejected: {reason}")]
    Rejected { reason: String },

    /// Schema root is neither an object nor a boolean
    #[error("schema root must be an object or boolean")]
    InvalidRoot,
}

impl SchemaError {
    pub(crate) fn invalid(
        keyword: impl Into<String>,
        location: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SchemaError::InvalidKeyword {
            keyword: keyword.into(),
            location: location.into(),
            reason: reason.into(),
        }
    }
}
