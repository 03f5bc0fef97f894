//! Wire contracts shared by the normalizer, extractor, synthesizer, and assembler.
//!
//! Field names follow the persisted specification format (camelCase) so that extracted
//! records round-trip unchanged through storage and the downstream template runtime.

use crate::error::Result;
use crate::normalizer::NormalizedDocument;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Where a tool argument's value belongs within an HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgPosition {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

/// Declared argument type. The set is open-ended in real-world documents; anything outside
/// the JSON-schema primitives maps to [`ArgType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    #[serde(other)]
    Unknown,
}

impl ArgType {
    /// Complex types cannot be hand-written into a literal body template; the runtime must
    /// JSON-encode them itself.
    #[must_use]
    pub fn is_complex(self) -> bool {
        matches!(self, ArgType::Object | ArgType::Array)
    }
}

/// One argument of an extracted tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolArgument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared type. May be absent; [`ToolArgument::effective_type`] falls back to
    /// `schema.type`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub arg_type: Option<ArgType>,
    /// Declared location of this argument in the original API operation (OpenAPI `in:`).
    pub position: ArgPosition,
    #[serde(default)]
    pub required: bool,
    /// Nested property schemas for object-typed arguments (kept opaque).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    /// Raw schema fragment for this argument (kept opaque).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl ToolArgument {
    /// Declared type, falling back to `schema.type` when the argument carries none.
    #[must_use]
    pub fn effective_type(&self) -> ArgType {
        if let Some(t) = self.arg_type {
            return t;
        }
        self.schema
            .as_ref()
            .and_then(|s| s.get("type"))
            .and_then(|t| serde_json::from_value(t.clone()).ok())
            .unwrap_or(ArgType::Unknown)
    }
}

/// One extracted tool: the intermediate form between operation extraction and synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub args: Vec<ToolArgument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_template: Option<RequestTemplate>,
    /// Response template fragment, passed through to the output untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_template: Option<Value>,
}

/// An ordered request header entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

/// The request template consumed by the downstream substitution runtime.
///
/// Invariant: a literal `body` and any of the three bulk-encoding flags are mutually
/// exclusive signals; whenever a literal body ends up on the template, synthesis clears all
/// flags (see [`crate::template::synthesize`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTemplate {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Headers keep their order; source documents may declare them as either an ordered
    /// list or a string map, both deserialize here.
    #[serde(
        default,
        deserialize_with = "deserialize_headers",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub headers: Vec<HeaderEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Instructs the runtime to serialize all arguments as query parameters.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub args_to_url_param: bool,
    /// Instructs the runtime to JSON-encode all arguments into the body.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub args_to_json_body: bool,
    /// Instructs the runtime to form-encode all arguments into the body.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub args_to_form_body: bool,
}

impl RequestTemplate {
    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.key.eq_ignore_ascii_case(key))
            .map(|h| h.value.as_str())
    }

    #[must_use]
    pub fn has_header(&self, key: &str) -> bool {
        self.header_value(key).is_some()
    }

    /// Lower-cased `Content-Type` value, empty when absent.
    #[must_use]
    pub fn content_type(&self) -> String {
        self.header_value("content-type")
            .map(str::to_lowercase)
            .unwrap_or_default()
    }
}

fn deserialize_headers<'de, D>(deserializer: D) -> std::result::Result<Vec<HeaderEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        List(Vec<HeaderEntry>),
        Map(serde_json::Map<String, Value>),
    }

    match Repr::deserialize(deserializer)? {
        Repr::List(entries) => Ok(entries),
        Repr::Map(map) => Ok(map
            .into_iter()
            .map(|(key, value)| HeaderEntry {
                key,
                value: header_value_to_string(&value),
            })
            .collect()),
    }
}

fn header_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Top-level server metadata produced by extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedServer {
    /// Security-scheme declarations (kept opaque; the persistence layer interprets them).
    #[serde(default)]
    pub security_schemes: Vec<Value>,
}

/// Output contract of the operation-extraction step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedConfig {
    #[serde(default)]
    pub tools: Vec<ToolRecord>,
    #[serde(default)]
    pub server: ExtractedServer,
}

/// Turns a normalized, current-version document into an ordered list of tool records.
///
/// The import pipeline treats this as a collaborator seam; [`crate::extract::DefaultExtractor`]
/// is the built-in implementation.
pub trait OperationExtractor {
    /// # Errors
    ///
    /// Returns an error if the document shape prevents extraction entirely. Per-operation
    /// problems should degrade to skipped tools, not failures.
    fn extract(&self, doc: &NormalizedDocument) -> Result<ExtractedConfig>;
}
