//! Document normalization: format detection, reference resolution, version detection.
//!
//! `normalize` turns raw text into a single, self-contained, current-version document:
//!
//! 1. decode as JSON, falling back to YAML;
//! 2. expand internal `$ref`s with [`RefResolver`] (the document is its own root);
//! 3. detect the description version: a legacy `swagger` marker delegates to the
//!    [`LegacyUpgrade`] collaborator, a current `openapi` marker is used as-is, and a
//!    document with neither fails with an explicit
//!    [`ImportError::UnrecognizedSchemaVersion`].

use crate::error::{ImportError, Result};
use crate::resolver::{RefResolver, ResolveDiagnostic};
use serde_json::Value;

/// Converts a legacy (Swagger 2) document into a current-version document.
///
/// Treated as a black box by the pipeline: implementations may shell out to an external
/// converter, embed their own, or reject legacy input outright.
pub trait LegacyUpgrade {
    /// # Errors
    ///
    /// Returns [`ImportError::LegacyUpgrade`] when the document cannot be converted.
    fn upgrade(&self, legacy: Value) -> Result<Value>;
}

/// Default collaborator for deployments without a Swagger 2 converter: always rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectLegacy;

impl LegacyUpgrade for RejectLegacy {
    fn upgrade(&self, _legacy: Value) -> Result<Value> {
        Err(ImportError::LegacyUpgrade(
            "document uses the Swagger 2.0 format and no upgrade collaborator is configured"
                .to_string(),
        ))
    }
}

/// A resolved, current-version document plus the diagnostics its resolution produced.
#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    document: Value,
    diagnostics: Vec<ResolveDiagnostic>,
}

impl NormalizedDocument {
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Non-fatal resolution problems encountered while expanding references.
    #[must_use]
    pub fn diagnostics(&self) -> &[ResolveDiagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn into_parts(self) -> (Value, Vec<ResolveDiagnostic>) {
        (self.document, self.diagnostics)
    }

    /// Typed view of the document.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Spec`] if the document does not deserialize as OpenAPI 3.
    pub fn to_openapi(&self) -> Result<openapiv3::OpenAPI> {
        serde_json::from_value(self.document.clone()).map_err(ImportError::Spec)
    }
}

enum DetectedVersion {
    Legacy,
    Current,
    Unknown,
}

/// Normalize raw description text into a resolved, current-version document.
///
/// # Errors
///
/// - [`ImportError::InvalidFormat`] when the text is neither JSON nor YAML;
/// - [`ImportError::LegacyUpgrade`] when the upgrade collaborator fails;
/// - [`ImportError::UnrecognizedSchemaVersion`] when no version marker is present.
pub fn normalize(text: &str, upgrader: &dyn LegacyUpgrade) -> Result<NormalizedDocument> {
    let parsed = decode(text)?;

    let mut resolver = RefResolver::new();
    let resolved = resolver.resolve_document(&parsed);
    let diagnostics = resolver.into_diagnostics();

    let document = match detect_version(&resolved) {
        DetectedVersion::Legacy => {
            tracing::info!("legacy version marker found, delegating upgrade");
            upgrader.upgrade(resolved)?
        }
        DetectedVersion::Current => resolved,
        DetectedVersion::Unknown => return Err(ImportError::UnrecognizedSchemaVersion),
    };

    Ok(NormalizedDocument {
        document,
        diagnostics,
    })
}

fn decode(text: &str) -> Result<Value> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(json) => {
            serde_yaml::from_str(text).map_err(|yaml| ImportError::InvalidFormat { json, yaml })
        }
    }
}

fn detect_version(document: &Value) -> DetectedVersion {
    let has_marker = |key: &str| document.get(key).is_some_and(|v| !v.is_null());
    if has_marker("swagger") {
        DetectedVersion::Legacy
    } else if has_marker("openapi") {
        DetectedVersion::Current
    } else {
        DetectedVersion::Unknown
    }
}
