//! Internal `$ref` resolver.
//!
//! Expands internal JSON-pointer references (`#/a/b/c`) in a decoded document into inline
//! values. Resolution is **total**: cycles produce a sentinel error node, dangling pointers
//! and external references pass through unresolved, and every degraded node is recorded as a
//! [`ResolveDiagnostic`] instead of failing the whole document.
//!
//! External references (other files, URLs) are out of scope; the resolver never performs
//! network or filesystem access.

use serde_json::{Value, json};
use std::collections::HashSet;
use std::fmt;

/// A non-fatal condition encountered while resolving references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveDiagnostic {
    /// The pointer was already on the active recursion path; the node was replaced with a
    /// sentinel error value.
    CircularReference { pointer: String },
    /// An internal pointer whose path does not exist in the document; the original reference
    /// node was kept unchanged.
    UnresolvableReference { pointer: String },
    /// External or absolute references are passed through unresolved.
    UnsupportedReference { pointer: String },
}

impl ResolveDiagnostic {
    /// The offending `$ref` value.
    #[must_use]
    pub fn pointer(&self) -> &str {
        match self {
            ResolveDiagnostic::CircularReference { pointer }
            | ResolveDiagnostic::UnresolvableReference { pointer }
            | ResolveDiagnostic::UnsupportedReference { pointer } => pointer,
        }
    }
}

impl fmt::Display for ResolveDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveDiagnostic::CircularReference { pointer } => {
                write!(f, "circular $ref detected: {pointer}")
            }
            ResolveDiagnostic::UnresolvableReference { pointer } => {
                write!(f, "unresolvable $ref path: {pointer}")
            }
            ResolveDiagnostic::UnsupportedReference { pointer } => {
                write!(f, "unsupported $ref kind (external reference?): {pointer}")
            }
        }
    }
}

/// Recursive `$ref` expander with cycle detection.
///
/// The *visiting set* holds the pointers currently being expanded on the active recursion
/// path. Each descent through a reference extends a **copy** of the set (extend-and-drop,
/// never shared mutation), so sibling subtrees that happen to share a pointer are not
/// falsely flagged as cycles.
#[derive(Debug, Default)]
pub struct RefResolver {
    diagnostics: Vec<ResolveDiagnostic>,
}

impl RefResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every `$ref` in `document`, using the document itself as the lookup root.
    #[must_use]
    pub fn resolve_document(&mut self, document: &Value) -> Value {
        self.resolve(document, document, &HashSet::new())
    }

    /// Resolve `node` against `root` with the given visiting set.
    ///
    /// Side-effect free on its inputs; resolving the same document twice yields identical
    /// output.
    #[must_use]
    pub fn resolve(&mut self, node: &Value, root: &Value, visiting: &HashSet<String>) -> Value {
        match node {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve(item, root, visiting))
                    .collect(),
            ),
            Value::Object(map) => {
                if let Some(Value::String(pointer)) = map.get("$ref") {
                    return self.resolve_pointer(pointer, node, root, visiting);
                }
                let mut out = serde_json::Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), self.resolve(value, root, visiting));
                }
                Value::Object(out)
            }
            scalar => scalar.clone(),
        }
    }

    /// Diagnostics accumulated so far, in encounter order.
    #[must_use]
    pub fn diagnostics(&self) -> &[ResolveDiagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<ResolveDiagnostic> {
        self.diagnostics
    }

    fn resolve_pointer(
        &mut self,
        pointer: &str,
        original: &Value,
        root: &Value,
        visiting: &HashSet<String>,
    ) -> Value {
        if visiting.contains(pointer) {
            tracing::warn!(pointer, "circular $ref detected");
            self.diagnostics.push(ResolveDiagnostic::CircularReference {
                pointer: pointer.to_string(),
            });
            return json!({ "error": "circular reference" });
        }

        let Some(rest) = pointer.strip_prefix("#/") else {
            tracing::warn!(pointer, "unsupported $ref kind");
            self.diagnostics.push(ResolveDiagnostic::UnsupportedReference {
                pointer: pointer.to_string(),
            });
            return original.clone();
        };

        let mut target = root;
        for segment in rest.split('/') {
            let next = match target {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(value) => target = value,
                None => {
                    tracing::warn!(pointer, "unresolvable $ref path");
                    self.diagnostics
                        .push(ResolveDiagnostic::UnresolvableReference {
                            pointer: pointer.to_string(),
                        });
                    // Never guess: keep the original reference node intact.
                    return original.clone();
                }
            }
        }

        let mut extended = visiting.clone();
        extended.insert(pointer.to_string());
        self.resolve(target, root, &extended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(doc: &Value) -> (Value, Vec<ResolveDiagnostic>) {
        let mut resolver = RefResolver::new();
        let resolved = resolver.resolve_document(doc);
        (resolved, resolver.into_diagnostics())
    }

    #[test]
    fn scalars_and_plain_trees_pass_through() {
        let doc = json!({
            "a": 1,
            "b": [true, "x", null],
            "c": { "d": { "e": 2.5 } }
        });
        let (resolved, diags) = resolve(&doc);
        assert_eq!(resolved, doc);
        assert!(diags.is_empty());
    }

    #[test]
    fn internal_ref_is_inlined() {
        let doc = json!({
            "components": { "schemas": { "Pet": { "type": "object" } } },
            "schema": { "$ref": "#/components/schemas/Pet" }
        });
        let (resolved, diags) = resolve(&doc);
        assert_eq!(resolved["schema"], json!({ "type": "object" }));
        assert!(diags.is_empty());
    }

    #[test]
    fn nested_refs_resolve_transitively() {
        let doc = json!({
            "components": { "schemas": {
                "Inner": { "type": "string" },
                "Outer": { "type": "object", "properties": {
                    "inner": { "$ref": "#/components/schemas/Inner" }
                } }
            } },
            "schema": { "$ref": "#/components/schemas/Outer" }
        });
        let (resolved, _) = resolve(&doc);
        assert_eq!(
            resolved["schema"]["properties"]["inner"],
            json!({ "type": "string" })
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let doc = json!({
            "components": { "schemas": { "Pet": { "type": "object" } } },
            "schema": { "$ref": "#/components/schemas/Pet" }
        });
        let (once, _) = resolve(&doc);
        let (twice, diags) = resolve(&once);
        assert_eq!(once, twice);
        assert!(diags.is_empty());
    }

    #[test]
    fn self_reference_yields_sentinel() {
        let doc = json!({
            "components": { "schemas": {
                "Node": { "type": "object", "properties": {
                    "next": { "$ref": "#/components/schemas/Node" }
                } }
            } },
            "schema": { "$ref": "#/components/schemas/Node" }
        });
        let (resolved, diags) = resolve(&doc);
        assert_eq!(
            resolved["schema"]["properties"]["next"],
            json!({ "error": "circular reference" })
        );
        assert!(matches!(
            diags.as_slice(),
            [ResolveDiagnostic::CircularReference { .. }, ..]
        ));
    }

    #[test]
    fn mutual_references_terminate() {
        let doc = json!({
            "a": { "child": { "$ref": "#/b" } },
            "b": { "child": { "$ref": "#/a" } },
            "root": { "$ref": "#/a" }
        });
        let (resolved, diags) = resolve(&doc);
        // a -> b -> a closes the cycle at the second hop back into "#/a".
        assert_eq!(
            resolved["root"]["child"]["child"],
            json!({ "error": "circular reference" })
        );
        assert!(
            diags
                .iter()
                .any(|d| matches!(d, ResolveDiagnostic::CircularReference { .. }))
        );
    }

    #[test]
    fn siblings_sharing_a_pointer_are_not_a_cycle() {
        let doc = json!({
            "components": { "schemas": { "Pet": { "type": "object" } } },
            "first": { "$ref": "#/components/schemas/Pet" },
            "second": { "$ref": "#/components/schemas/Pet" }
        });
        let (resolved, diags) = resolve(&doc);
        assert_eq!(resolved["first"], json!({ "type": "object" }));
        assert_eq!(resolved["second"], json!({ "type": "object" }));
        assert!(diags.is_empty());
    }

    #[test]
    fn missing_path_keeps_original_reference() {
        let doc = json!({
            "schema": { "$ref": "#/components/schemas/Missing" }
        });
        let (resolved, diags) = resolve(&doc);
        assert_eq!(
            resolved["schema"],
            json!({ "$ref": "#/components/schemas/Missing" })
        );
        assert_eq!(
            diags,
            vec![ResolveDiagnostic::UnresolvableReference {
                pointer: "#/components/schemas/Missing".to_string()
            }]
        );
    }

    #[test]
    fn external_reference_passes_through() {
        let doc = json!({
            "schema": { "$ref": "./common.yaml#/components/schemas/Pet" }
        });
        let (resolved, diags) = resolve(&doc);
        assert_eq!(resolved["schema"], doc["schema"]);
        assert_eq!(
            diags,
            vec![ResolveDiagnostic::UnsupportedReference {
                pointer: "./common.yaml#/components/schemas/Pet".to_string()
            }]
        );
    }

    #[test]
    fn array_elements_resolve_in_order() {
        let doc = json!({
            "defs": { "A": 1, "B": 2 },
            "list": [{ "$ref": "#/defs/A" }, { "$ref": "#/defs/B" }, 3]
        });
        let (resolved, _) = resolve(&doc);
        assert_eq!(resolved["list"], json!([1, 2, 3]));
    }

    #[test]
    fn pointer_can_index_into_arrays() {
        let doc = json!({
            "servers": [{ "url": "https://a" }, { "url": "https://b" }],
            "pick": { "$ref": "#/servers/1" }
        });
        let (resolved, diags) = resolve(&doc);
        assert_eq!(resolved["pick"], json!({ "url": "https://b" }));
        assert!(diags.is_empty());
    }
}
