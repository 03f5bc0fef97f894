//! One-call import pipeline: normalize, extract, assemble.

use crate::assembly::{self, ToolSpecification};
use crate::contracts::OperationExtractor;
use crate::error::Result;
use crate::normalizer::{self, LegacyUpgrade};
use crate::resolver::ResolveDiagnostic;

/// Result of a full import: the assembled specification plus any degradations recorded
/// while resolving references.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub specification: ToolSpecification,
    pub diagnostics: Vec<ResolveDiagnostic>,
}

/// Import an OpenAPI document (JSON or YAML text) into a tool specification.
pub fn import_document(
    text: &str,
    extractor: &dyn OperationExtractor,
    upgrader: &dyn LegacyUpgrade,
) -> Result<ImportOutcome> {
    let normalized = normalizer::normalize(text, upgrader)?;
    let config = extractor.extract(&normalized)?;
    let (_, diagnostics) = normalized.into_parts();

    Ok(ImportOutcome {
        specification: assembly::assemble(config),
        diagnostics,
    })
}
