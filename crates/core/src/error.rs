//! Error types for xmodal
//!
//! Every fallible operation in the workspace returns [`XmodalError`]. Variants
//! map 1:1 onto the error taxonomy exposed at the transport boundary, see
//! [`XmodalError::kind`] and [`XmodalError::status_code`].
//!
//! Expected conditions are not errors: searching an empty collection returns
//! an empty list and loading a collection with no files on disk returns
//! `Ok(None)`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::modality::Modality;

/// Result type alias for xmodal operations
pub type XmodalResult<T> = std::result::Result<T, XmodalError>;

/// Stable, transport-neutral error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad or missing input, rejected before any mutation
    Validation,
    /// Embedding has the wrong length
    DimensionMismatch,
    /// The external encoder failed
    EncoderFailure,
    /// Persisted files are inconsistent
    CorruptState,
    /// Operation intentionally not supported
    UnsupportedOperation,
    /// Entity unknown
    NotFound,
    /// Entity already present
    AlreadyExists,
    /// Infrastructure failure (I/O, codec, invariant breach)
    Internal,
}

impl ErrorKind {
    /// Stable string code for clients
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::DimensionMismatch => "dimension_mismatch",
            ErrorKind::EncoderFailure => "encoder_failure",
            ErrorKind::CorruptState => "corrupt_state",
            ErrorKind::UnsupportedOperation => "unsupported_operation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Error type for the cross-modal index
#[derive(Debug, Error)]
pub enum XmodalError {
    /// Bad or missing input (empty text, oversized file, unsupported extension)
    #[error("Validation error: {reason}")]
    Validation {
        /// Human-readable reason
        reason: String,
    },

    /// Vector dimension doesn't match the collection dimension
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Collection dimension
        expected: usize,
        /// Length of the provided vector
        got: usize,
    },

    /// Embedding producer returned a failure
    #[error("Encoder failure ({modality}): {reason}")]
    EncoderFailure {
        /// Modality of the failing encoder
        modality: Modality,
        /// Reason reported by the encoder
        reason: String,
    },

    /// Persisted state failed a consistency check on load
    #[error("Corrupt state in {}: {reason}", path.display())]
    CorruptState {
        /// File that failed the check
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Operation is unsupported (single-item deletion)
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation {
        /// Operation name
        operation: String,
    },

    /// Named collection (or other entity) is unknown
    #[error("Not found: {entity}")]
    NotFound {
        /// Description of the missing entity
        entity: String,
    },

    /// Collection with this name already exists
    #[error("Already exists: {name}")]
    AlreadyExists {
        /// Collection name
        name: String,
    },

    /// Ordinal past the end of the catalog
    #[error("Ordinal {ordinal} out of range (len {len})")]
    IndexOutOfRange {
        /// Requested ordinal
        ordinal: u64,
        /// Catalog length
        len: usize,
    },

    /// Collection name is invalid
    #[error("Invalid collection name: {name} ({reason})")]
    InvalidCollectionName {
        /// The invalid name
        name: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Storage layer error
    #[error("Storage error: {message}")]
    Storage {
        /// Description including the path involved
        message: String,
        /// Underlying I/O error, if any
        #[source]
        source: Option<io::Error>,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Codec message
        message: String,
    },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal {
        /// Description
        message: String,
    },
}

impl XmodalError {
    /// Create a validation error
    pub fn validation(reason: impl Into<String>) -> Self {
        XmodalError::Validation {
            reason: reason.into(),
        }
    }

    /// Create a storage error wrapping an I/O error
    pub fn storage(message: impl Into<String>, source: io::Error) -> Self {
        XmodalError::Storage {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a corrupt-state error for a file
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        XmodalError::CorruptState {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        XmodalError::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        XmodalError::Internal {
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(entity: impl Into<String>) -> Self {
        XmodalError::NotFound {
            entity: entity.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            XmodalError::Validation { .. } | XmodalError::InvalidCollectionName { .. } => {
                ErrorKind::Validation
            }
            XmodalError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            XmodalError::EncoderFailure { .. } => ErrorKind::EncoderFailure,
            XmodalError::CorruptState { .. } => ErrorKind::CorruptState,
            XmodalError::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            XmodalError::NotFound { .. } | XmodalError::IndexOutOfRange { .. } => {
                ErrorKind::NotFound
            }
            XmodalError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            XmodalError::Storage { .. }
            | XmodalError::Serialization { .. }
            | XmodalError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// HTTP-style status code for transport adapters
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::DimensionMismatch => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::AlreadyExists => 409,
            ErrorKind::UnsupportedOperation => 501,
            ErrorKind::EncoderFailure | ErrorKind::CorruptState | ErrorKind::Internal => 500,
        }
    }

    /// Check if this error was raised before any state was touched
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation | ErrorKind::DimensionMismatch
        )
    }

    /// Check if this error indicates the collection/item was not found
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Whether an operator must reset or restore from backup
    pub fn requires_intervention(&self) -> bool {
        matches!(self, XmodalError::CorruptState { .. })
    }
}
