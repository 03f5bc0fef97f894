//! Default operation extraction.
//!
//! Walks a normalized (fully `$ref`-resolved, current-version) document and produces the
//! abstract tool records consumed by template synthesis. Extraction degrades per operation:
//! a parameter or body it cannot interpret is skipped with a warning rather than failing
//! the whole document.

use crate::contracts::{
    ArgPosition, ArgType, ExtractedConfig, ExtractedServer, HeaderEntry, OperationExtractor,
    RequestTemplate, ToolArgument, ToolRecord,
};
use crate::error::Result;
use crate::normalizer::NormalizedDocument;
use serde_json::Value;

const METHODS: [&str; 5] = ["get", "post", "put", "delete", "patch"];

/// Body media types we know how to map onto a template, in preference order.
const BODY_MEDIA_TYPES: [&str; 3] = [
    "application/json",
    "application/x-www-form-urlencoded",
    "multipart/form-data",
];

/// Built-in [`OperationExtractor`]: one tool per path/method operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExtractor;

impl OperationExtractor for DefaultExtractor {
    fn extract(&self, doc: &NormalizedDocument) -> Result<ExtractedConfig> {
        Ok(extract_document(doc.document()))
    }
}

fn extract_document(document: &Value) -> ExtractedConfig {
    let mut tools = Vec::new();

    if let Some(paths) = document.get("paths").and_then(Value::as_object) {
        for (path, item) in paths {
            let Some(item) = item.as_object() else {
                tracing::warn!(%path, "skipping non-object path item");
                continue;
            };
            let shared_params = item
                .get("parameters")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();

            for method in METHODS {
                if let Some(operation) = item.get(method).and_then(Value::as_object) {
                    tools.push(operation_to_tool(path, method, operation, shared_params));
                }
            }
        }
    }

    ExtractedConfig {
        tools,
        server: ExtractedServer {
            security_schemes: extract_security_schemes(document),
        },
    }
}

fn operation_to_tool(
    path: &str,
    method: &str,
    operation: &serde_json::Map<String, Value>,
    shared_params: &[Value],
) -> ToolRecord {
    let name = operation
        .get("operationId")
        .and_then(Value::as_str)
        .map_or_else(|| canonical_name(method, path), str::to_string);

    let description = operation
        .get("summary")
        .or_else(|| operation.get("description"))
        .and_then(Value::as_str)
        .map_or_else(
            || format!("Calls {} {}", method.to_uppercase(), path),
            str::to_string,
        );

    let mut args = merged_parameters(shared_params, operation.get("parameters"));
    let mut headers: Vec<HeaderEntry> = Vec::new();

    if let Some(body) = operation.get("requestBody").and_then(Value::as_object) {
        extract_body_args(body, &mut args, &mut headers);
    }

    let request_template = RequestTemplate {
        url: path.to_string(),
        method: Some(method.to_uppercase()),
        headers,
        ..RequestTemplate::default()
    };

    ToolRecord {
        name,
        description,
        args,
        request_template: Some(request_template),
        response_template: None,
    }
}

/// Path-item parameters merged with operation parameters; the operation-level declaration
/// wins when both declare the same (name, location) pair.
fn merged_parameters(shared: &[Value], operation_params: Option<&Value>) -> Vec<ToolArgument> {
    let mut merged: Vec<ToolArgument> = shared.iter().filter_map(parameter_to_arg).collect();

    let op_params = operation_params
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for arg in op_params.iter().filter_map(parameter_to_arg) {
        if let Some(existing) = merged
            .iter_mut()
            .find(|m| m.name == arg.name && m.position == arg.position)
        {
            *existing = arg;
        } else {
            merged.push(arg);
        }
    }

    merged
}

fn parameter_to_arg(param: &Value) -> Option<ToolArgument> {
    let obj = param.as_object()?;
    let name = obj.get("name").and_then(Value::as_str)?.to_string();
    let position: ArgPosition = obj
        .get("in")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .or_else(|| {
            tracing::warn!(%name, "skipping parameter with unknown location");
            None
        })?;

    let schema = obj.get("schema").cloned();
    let arg_type = schema
        .as_ref()
        .and_then(|s| s.get("type"))
        .and_then(|t| serde_json::from_value(t.clone()).ok());

    Some(ToolArgument {
        name,
        description: obj
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        arg_type,
        position,
        // Path parameters are always required regardless of the declaration.
        required: position == ArgPosition::Path
            || obj.get("required").and_then(Value::as_bool).unwrap_or(false),
        properties: schema
            .as_ref()
            .and_then(|s| s.get("properties"))
            .cloned(),
        schema,
    })
}

/// Flatten a request body into body-placed arguments.
///
/// Object schemas contribute one argument per top-level property; anything else becomes a
/// single `body` argument. Form and multipart media types carry their content type into
/// the base template headers so the synthesizer picks the matching encoding.
fn extract_body_args(
    body: &serde_json::Map<String, Value>,
    args: &mut Vec<ToolArgument>,
    headers: &mut Vec<HeaderEntry>,
) {
    let Some(content) = body.get("content").and_then(Value::as_object) else {
        return;
    };
    let Some((media_type, media)) = pick_media_type(content) else {
        return;
    };

    if media_type != "application/json" {
        headers.push(HeaderEntry {
            key: "Content-Type".to_string(),
            value: media_type.to_string(),
        });
    }

    let body_required = body.get("required").and_then(Value::as_bool).unwrap_or(false);
    let Some(schema) = media.get("schema") else {
        return;
    };

    let properties = schema.get("properties").and_then(Value::as_object);
    if schema.get("type").and_then(Value::as_str) == Some("object")
        && let Some(properties) = properties
    {
        let required_names: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        for (prop_name, prop_schema) in properties {
            if args.iter().any(|a| a.name == *prop_name) {
                tracing::warn!(name = %prop_name, "body property collides with a parameter, skipping");
                continue;
            }
            args.push(ToolArgument {
                name: prop_name.clone(),
                description: prop_schema
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                arg_type: prop_schema
                    .get("type")
                    .and_then(|t| serde_json::from_value(t.clone()).ok()),
                position: ArgPosition::Body,
                required: body_required && required_names.contains(&prop_name.as_str()),
                properties: prop_schema.get("properties").cloned(),
                schema: Some(prop_schema.clone()),
            });
        }
    } else if !args.iter().any(|a| a.name == "body") {
        // Non-object bodies are exposed as a single opaque argument.
        args.push(ToolArgument {
            name: "body".to_string(),
            description: body
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            arg_type: schema
                .get("type")
                .and_then(|t| serde_json::from_value(t.clone()).ok())
                .or(Some(ArgType::Object)),
            position: ArgPosition::Body,
            required: body_required,
            properties: None,
            schema: Some(schema.clone()),
        });
    }
}

fn pick_media_type(
    content: &serde_json::Map<String, Value>,
) -> Option<(&str, &serde_json::Map<String, Value>)> {
    for candidate in BODY_MEDIA_TYPES {
        if let Some((key, media)) = content
            .iter()
            .find(|(k, _)| k.to_lowercase().starts_with(candidate))
        {
            return media.as_object().map(|m| (key.as_str(), m));
        }
    }
    content
        .iter()
        .next()
        .and_then(|(k, v)| v.as_object().map(|m| (k.as_str(), m)))
}

/// Canonical tool name for operations without an `operationId`, e.g.
/// `GET /pet/{petId}` -> `get_pet_petId`.
fn canonical_name(method: &str, path: &str) -> String {
    let cleaned: String = path
        .chars()
        .filter(|c| *c != '{' && *c != '}')
        .collect::<String>()
        .replace('/', "_");
    let trimmed = cleaned.trim_matches('_');
    format!("{method}_{trimmed}")
}

fn extract_security_schemes(document: &Value) -> Vec<Value> {
    let Some(schemes) = document
        .pointer("/components/securitySchemes")
        .and_then(Value::as_object)
    else {
        return Vec::new();
    };

    schemes
        .iter()
        .map(|(id, scheme)| {
            let mut entry = serde_json::Map::new();
            entry.insert("id".to_string(), Value::String(id.clone()));
            if let Some(obj) = scheme.as_object() {
                for (k, v) in obj {
                    entry.insert(k.clone(), v.clone());
                }
            }
            Value::Object(entry)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{RejectLegacy, normalize};

    fn extract(text: &str) -> ExtractedConfig {
        let doc = normalize(text, &RejectLegacy).unwrap();
        DefaultExtractor.extract(&doc).unwrap()
    }

    #[test]
    fn canonical_names_strip_braces_and_slashes() {
        assert_eq!(canonical_name("get", "/pet/{petId}"), "get_pet_petId");
        assert_eq!(canonical_name("post", "/store/order"), "post_store_order");
        assert_eq!(
            canonical_name("get", "/user/{username}/repos"),
            "get_user_username_repos"
        );
    }

    #[test]
    fn extracts_operations_with_parameters() {
        let config = extract(
            r#"
openapi: "3.0.0"
paths:
  /users/{id}:
    parameters:
      - name: id
        in: path
        required: true
        schema: { type: string }
    get:
      operationId: getUser
      summary: Fetch one user
      parameters:
        - name: verbose
          in: query
          schema: { type: boolean }
"#,
        );
        assert_eq!(config.tools.len(), 1);
        let tool = &config.tools[0];
        assert_eq!(tool.name, "getUser");
        assert_eq!(tool.description, "Fetch one user");

        let id = tool.args.iter().find(|a| a.name == "id").unwrap();
        assert_eq!(id.position, ArgPosition::Path);
        assert!(id.required);

        let verbose = tool.args.iter().find(|a| a.name == "verbose").unwrap();
        assert_eq!(verbose.position, ArgPosition::Query);
        assert_eq!(verbose.effective_type(), ArgType::Boolean);

        let tmpl = tool.request_template.as_ref().unwrap();
        assert_eq!(tmpl.url, "/users/{id}");
        assert_eq!(tmpl.method.as_deref(), Some("GET"));
    }

    #[test]
    fn operation_parameter_overrides_shared_declaration() {
        let config = extract(
            r#"
openapi: "3.0.0"
paths:
  /users:
    parameters:
      - name: q
        in: query
        required: false
        schema: { type: string }
    get:
      operationId: listUsers
      parameters:
        - name: q
          in: query
          required: true
          schema: { type: string }
"#,
        );
        let q = &config.tools[0].args[0];
        assert_eq!(q.name, "q");
        assert!(q.required);
        assert_eq!(config.tools[0].args.len(), 1);
    }

    #[test]
    fn flattens_json_request_body_properties() {
        let config = extract(
            r#"
openapi: "3.0.0"
paths:
  /users:
    post:
      operationId: createUser
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
              required: [name]
              properties:
                name: { type: string }
                age: { type: integer }
"#,
        );
        let tool = &config.tools[0];
        let name = tool.args.iter().find(|a| a.name == "name").unwrap();
        let age = tool.args.iter().find(|a| a.name == "age").unwrap();
        assert_eq!(name.position, ArgPosition::Body);
        assert!(name.required);
        assert!(!age.required);
        // JSON bodies carry no pre-set content type; synthesis adds the default.
        assert!(tool.request_template.as_ref().unwrap().headers.is_empty());
    }

    #[test]
    fn form_body_carries_content_type_into_template() {
        let config = extract(
            r#"
openapi: "3.0.0"
paths:
  /login:
    post:
      operationId: login
      requestBody:
        content:
          application/x-www-form-urlencoded:
            schema:
              type: object
              properties:
                user: { type: string }
                pass: { type: string }
"#,
        );
        let tool = &config.tools[0];
        assert_eq!(
            tool.request_template.as_ref().unwrap().content_type(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(
            tool.args.iter().filter(|a| a.position == ArgPosition::Body).count(),
            2
        );
    }

    #[test]
    fn non_object_body_becomes_single_argument() {
        let config = extract(
            r#"
openapi: "3.0.0"
paths:
  /tags:
    put:
      operationId: replaceTags
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: array
              items: { type: string }
"#,
        );
        let tool = &config.tools[0];
        let body = tool.args.iter().find(|a| a.name == "body").unwrap();
        assert_eq!(body.position, ArgPosition::Body);
        assert_eq!(body.effective_type(), ArgType::Array);
        assert!(body.required);
    }

    #[test]
    fn missing_operation_id_gets_canonical_name_and_fallback_description() {
        let config = extract(
            r#"
openapi: "3.0.0"
paths:
  /pets/{petId}:
    delete: {}
"#,
        );
        let tool = &config.tools[0];
        assert_eq!(tool.name, "delete_pets_petId");
        assert_eq!(tool.description, "Calls DELETE /pets/{petId}");
    }

    #[test]
    fn collects_security_schemes_with_ids() {
        let config = extract(
            r#"
openapi: "3.0.0"
paths: {}
components:
  securitySchemes:
    apiKey:
      type: apiKey
      in: header
      name: X-API-Key
"#,
        );
        assert_eq!(config.server.security_schemes.len(), 1);
        let scheme = &config.server.security_schemes[0];
        assert_eq!(scheme["id"], "apiKey");
        assert_eq!(scheme["type"], "apiKey");
    }

    #[test]
    fn unknown_parameter_location_is_skipped() {
        let config = extract(
            r#"
openapi: "3.0.0"
paths:
  /x:
    get:
      operationId: weird
      parameters:
        - name: ok
          in: query
          schema: { type: string }
        - name: nope
          in: matrix
          schema: { type: string }
"#,
        );
        let tool = &config.tools[0];
        assert_eq!(tool.args.len(), 1);
        assert_eq!(tool.args[0].name, "ok");
    }
}
