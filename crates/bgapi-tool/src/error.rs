//! Tool error types.

use std::path::PathBuf;

use bgapi_codec::CodecError;
use thiserror::Error;

/// Errors reported by the command line tool.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Encoding, decoding or catalog failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A config or catalog file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Input was not valid hex.
    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),

    /// JSON rendering failed.
    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A field assignment was not `name=value`.
    #[error("invalid assignment `{0}`, expected name=value")]
    Assignment(String),

    /// A field value could not be parsed for its wire type.
    #[error("field `{field}`: {reason}")]
    Field {
        /// Field name.
        field: String,
        /// What went wrong.
        reason: String,
    },
}

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;
