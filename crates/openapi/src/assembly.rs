//! Final tool-specification assembly.
//!
//! Takes the extracted tool records, runs template synthesis over each, and packages the
//! result into the wire shape a gateway consumes: a `tools` list of callable definitions
//! plus a `toolsMeta` map carrying per-tool templates keyed by engine id.

use crate::contracts::{ArgPosition, ExtractedConfig, RequestTemplate, ToolArgument};
use crate::error::Result;
use crate::template;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Engine id the synthesized templates target.
pub const TEMPLATE_ENGINE_ID: &str = "json-go-template";

/// Complete importable specification: callable definitions plus invocation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpecification {
    pub tools: Vec<ToolDefinition>,
    pub tools_meta: BTreeMap<String, ToolMeta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_schemes: Vec<Value>,
}

/// A single callable tool as advertised to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Per-tool invocation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMeta {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub templates: BTreeMap<String, ToolTemplates>,
}

fn default_enabled() -> bool {
    true
}

/// Templates for one engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolTemplates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_template: Option<RequestTemplate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_template: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args_position: Option<BTreeMap<String, ArgPosition>>,
}

impl ToolSpecification {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Assemble the final specification from extracted tool records.
///
/// Tools carrying a base request template get a synthesized one; tools without keep their
/// raw argument positions in the metadata so a downstream engine can encode them itself.
pub fn assemble(config: ExtractedConfig) -> ToolSpecification {
    let mut tools = Vec::with_capacity(config.tools.len());
    let mut tools_meta = BTreeMap::new();

    for record in config.tools {
        tools.push(ToolDefinition {
            name: record.name.clone(),
            description: record.description.clone(),
            input_schema: build_input_schema(&record.args),
        });

        let templates = match &record.request_template {
            Some(base) => {
                let synthesized = template::synthesize(&record, base);
                ToolTemplates {
                    request_template: Some(synthesized.template),
                    response_template: record.response_template.clone(),
                    args_position: synthesized
                        .retain_args_position
                        .then(|| args_position_map(&record.args)),
                }
            }
            None => ToolTemplates {
                request_template: None,
                response_template: record.response_template.clone(),
                args_position: Some(args_position_map(&record.args)),
            },
        };

        tools_meta.insert(
            record.name,
            ToolMeta {
                enabled: true,
                templates: BTreeMap::from([(TEMPLATE_ENGINE_ID.to_string(), templates)]),
            },
        );
    }

    ToolSpecification {
        tools,
        tools_meta,
        security_schemes: config.server.security_schemes,
    }
}

/// JSON Schema advertised for a tool's arguments. The `required` list is always present,
/// even when empty.
pub fn build_input_schema(args: &[ToolArgument]) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for arg in args {
        let mut prop = serde_json::Map::new();
        if let Some(ty) = arg.arg_type {
            prop.insert("type".to_string(), serde_json::to_value(ty).unwrap_or(Value::Null));
        } else if let Some(ty) = arg.schema.as_ref().and_then(|s| s.get("type")) {
            prop.insert("type".to_string(), ty.clone());
        }
        if let Some(desc) = &arg.description {
            prop.insert("description".to_string(), Value::String(desc.clone()));
        }
        if let Some(props) = &arg.properties {
            prop.insert("properties".to_string(), props.clone());
        }
        if let Some(items) = arg.schema.as_ref().and_then(|s| s.get("items")) {
            prop.insert("items".to_string(), items.clone());
        }
        properties.insert(arg.name.clone(), Value::Object(prop));

        if arg.required {
            required.push(Value::String(arg.name.clone()));
        }
    }

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn args_position_map(args: &[ToolArgument]) -> BTreeMap<String, ArgPosition> {
    args.iter().map(|a| (a.name.clone(), a.position)).collect()
}
