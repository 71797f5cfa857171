//! Codec error types.

use thiserror::Error;

/// Errors that can occur when building, encoding or decoding messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A builder field failed its constraint.
    #[error("invalid value for field `{field}`: {constraint}")]
    Validation {
        /// Name of the offending field.
        field: String,
        /// The violated constraint, in words.
        constraint: String,
    },

    /// Not enough bytes to decode the message or field.
    #[error("truncated message: expected at least {expected} bytes, got {actual}")]
    TruncatedMessage {
        /// Bytes required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// The (class, method) pair is not in the catalog.
    #[error("unknown message kind: class 0x{class:02X}, method 0x{method:02X}")]
    UnknownMessageKind {
        /// Class byte from the header.
        class: u8,
        /// Method byte from the header.
        method: u8,
    },

    /// An enumerated field carried a tag with no matching variant.
    #[error("unknown value {tag} (0x{tag:X}) for enumerated field `{field}`")]
    UnknownEnumValue {
        /// Name of the field.
        field: String,
        /// Raw numeric tag.
        tag: u32,
    },

    /// A value does not fit the declared field width.
    #[error("value {value} does not fit field `{field}` (max {max})")]
    Range {
        /// Name of the field.
        field: String,
        /// Offending value.
        value: i64,
        /// Largest encodable value.
        max: i64,
    },

    /// No message with this name is in the catalog.
    #[error("unknown message name `{0}`")]
    UnknownMessageName(String),

    /// A message kind was registered twice.
    #[error("message kind 0x{class:02X}/0x{method:02X} already registered as `{existing}`")]
    DuplicateKind {
        /// Class byte.
        class: u8,
        /// Method byte.
        method: u8,
        /// Name of the descriptor already holding the pair.
        existing: String,
    },

    /// A catalog definition could not be turned into descriptors.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Codec configuration could not be parsed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl CodecError {
    /// Create a validation error for a field.
    pub fn validation(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        CodecError::Validation {
            field: field.into(),
            constraint: constraint.into(),
        }
    }

    /// Create a truncation error.
    pub fn truncated(expected: usize, actual: usize) -> Self {
        CodecError::TruncatedMessage { expected, actual }
    }

    /// Create a catalog definition error.
    pub fn invalid_catalog(message: impl Into<String>) -> Self {
        CodecError::InvalidCatalog(message.into())
    }

    /// Name of the field this error is about, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            CodecError::Validation { field, .. }
            | CodecError::UnknownEnumValue { field, .. }
            | CodecError::Range { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Whether buffering more bytes could make the input decodable.
    pub fn is_truncation(&self) -> bool {
        matches!(self, CodecError::TruncatedMessage { .. })
    }
}

/// Result type alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
