//! Error types for the markup engine
//!
//! Foreseeable invalid input (locked shapes, empty stacks, shapes without
//! resolvable bounds) never produces an error; those paths are silent no-ops.
//! The variants here describe data-model violations and API misuse.

use crate::annotation::AnnotationId;
use crate::document::DocumentId;

/// Errors raised by annotation, document, and session operations
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EngineError {
    /// A type tag that does not name any known annotation type
    #[error("unknown annotation type tag: {0}")]
    UnknownTypeTag(String),

    /// An annotation whose geometry lacks a field its type requires
    #[error("annotation {id} is missing required geometry: {detail}")]
    MissingGeometry { id: AnnotationId, detail: String },

    /// No open document with the given id
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// No annotation with the given id in the target document
    #[error("annotation not found: {0}")]
    AnnotationNotFound(AnnotationId),

    /// An annotation id that already exists in the target document
    #[error("annotation already exists: {0}")]
    DuplicateAnnotation(AnnotationId),

    /// Page index outside the document
    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: u16, count: u16 },

    /// Watermark or bookmark id not present in the target document
    #[error("{kind} not found: {id}")]
    EntityNotFound { kind: &'static str, id: uuid::Uuid },

    /// Gesture call made in the wrong session state
    #[error("invalid gesture state: {0}")]
    GestureState(&'static str),
}

impl EngineError {
    /// Returns true for errors that indicate an upstream data-model violation
    pub fn is_consistency_fault(&self) -> bool {
        matches!(
            self,
            EngineError::UnknownTypeTag(_) | EngineError::MissingGeometry { .. }
        )
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while loading an [`EngineConfig`](crate::config::EngineConfig)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading a configuration file
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    /// A value that parsed but is out of range, or an unparsable env var
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistency_fault_classification() {
        assert!(EngineError::UnknownTypeTag("blob".into()).is_consistency_fault());
        assert!(EngineError::MissingGeometry {
            id: uuid::Uuid::nil(),
            detail: "empty point list".into(),
        }
        .is_consistency_fault());
        assert!(!EngineError::DocumentNotFound(3).is_consistency_fault());
    }

    #[test]
    fn test_error_messages() {
        let err = EngineError::UnknownTypeTag("blob".into());
        assert_eq!(err.to_string(), "unknown annotation type tag: blob");

        let err = ConfigError::InvalidValue("undo_limit".into());
        assert_eq!(err.to_string(), "invalid config value: undo_limit");
    }
}
