//! Error types for `toolspec-openapi`.

use thiserror::Error;

/// Fatal errors for an import attempt.
///
/// Per-node resolution problems (circular, unresolvable, or unsupported `$ref`s) are
/// deliberately *not* represented here; they surface as
/// [`ResolveDiagnostic`](crate::resolver::ResolveDiagnostic) values so that one malformed
/// schema fragment does not abort extraction of the remaining, valid, tools.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Neither JSON nor YAML decoding succeeded.
    #[error("invalid document format (JSON: {json}; YAML: {yaml})")]
    InvalidFormat {
        #[source]
        json: serde_json::Error,
        yaml: serde_yaml::Error,
    },

    /// The document carries neither a legacy (`swagger`) nor a current (`openapi`)
    /// version marker.
    #[error("unrecognized schema version: document has no 'swagger' or 'openapi' marker")]
    UnrecognizedSchemaVersion,

    /// The legacy-upgrade collaborator rejected or failed to convert a Swagger 2 document.
    #[error("legacy document upgrade failed: {0}")]
    LegacyUpgrade(String),

    /// Operation extraction failed.
    #[error("operation extraction failed: {0}")]
    Extraction(String),

    /// The normalized document does not deserialize as an `OpenAPI` 3 description.
    #[error("document is not a valid OpenAPI 3 description: {0}")]
    Spec(#[source] serde_json::Error),

    /// JSON (de)serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;
