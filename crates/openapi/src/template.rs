//! Request-template synthesis.
//!
//! Given one tool's arguments and its base request template, `synthesize` produces a
//! complete template that embeds `{{.args.<name>}}` placeholders into the URL path, query
//! string, headers, cookie header, or body. The body strategy depends on the declared
//! content type and on how the arguments are distributed across placements: either a
//! literal, hand-written body text or a bulk-encoding instruction flag for the runtime.
//!
//! Synthesis is a pure function of its inputs, has no I/O, and never fails: an argument
//! class that cannot be applied leaves the base template's value for that class untouched.

use crate::contracts::{ArgPosition, ArgType, HeaderEntry, RequestTemplate, ToolArgument, ToolRecord};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM: &str = "multipart/form-data";

/// Result of synthesizing one tool's template.
#[derive(Debug, Clone)]
pub struct SynthesizedTemplate {
    pub template: RequestTemplate,
    /// Whether the per-argument placement map must accompany the template so the runtime
    /// can interpret a flag-encoded body (see the retention rule below).
    pub retain_args_position: bool,
}

/// The runtime placeholder substituted with the caller-supplied value for `name`.
#[must_use]
pub fn placeholder(name: &str) -> String {
    format!("{{{{.args.{name}}}}}")
}

/// Synthesize a complete request template for `tool` on top of `base`.
///
/// Placement map retention: the map survives to the output only when the body step marks
/// it (complex-JSON-body or mixed-form-body) *and* neither the all-query nor the all-body
/// shortcut applies; those shortcuts are fully self-describing via the flags alone.
#[must_use]
pub fn synthesize(tool: &ToolRecord, base: &RequestTemplate) -> SynthesizedTemplate {
    let mut template = base.clone();

    let args_of = |position: ArgPosition| -> Vec<&ToolArgument> {
        tool.args.iter().filter(|a| a.position == position).collect()
    };
    let path_args = args_of(ArgPosition::Path);
    let query_args = args_of(ArgPosition::Query);
    let header_args = args_of(ArgPosition::Header);
    let cookie_args = args_of(ArgPosition::Cookie);
    let body_args = args_of(ArgPosition::Body);

    let total = tool.args.len();
    let all_in_query = total > 0 && query_args.len() == total;
    let all_in_body = total > 0 && body_args.len() == total;
    let has_explicit = base.body.is_some()
        || base.args_to_url_param
        || base.args_to_json_body
        || base.args_to_form_body;

    apply_path_args(&mut template, &path_args);
    apply_query_args(&mut template, &query_args, all_in_query);
    apply_header_args(&mut template, &header_args);
    apply_cookie_args(&mut template, &cookie_args);
    let marked = apply_body_args(&mut template, &body_args, all_in_body, has_explicit);

    // A literal body and the bulk-encoding flags are mutually exclusive signals.
    if template.body.is_some() {
        template.args_to_url_param = false;
        template.args_to_json_body = false;
        template.args_to_form_body = false;
    }

    SynthesizedTemplate {
        template,
        retain_args_position: marked && !all_in_query && !all_in_body,
    }
}

/// Replace every literal `{name}` in the URL with the argument's placeholder.
///
/// Matching is literal-brace, not schema-aware: a name that never appears as `{name}` is
/// silently skipped, and an unrelated `{literal}` segment that coincides with an argument
/// name is rewritten (known limitation, kept for runtime compatibility).
fn apply_path_args(template: &mut RequestTemplate, path_args: &[&ToolArgument]) {
    for arg in path_args {
        let pattern = format!("{{{}}}", arg.name);
        template.url = template.url.replace(&pattern, &placeholder(&arg.name));
    }
}

fn apply_query_args(template: &mut RequestTemplate, query_args: &[&ToolArgument], all_in_query: bool) {
    if all_in_query {
        // Every argument is a query argument: let the runtime serialize them itself.
        template.args_to_url_param = true;
        return;
    }
    if query_args.is_empty() {
        return;
    }

    let pairs: Vec<String> = query_args
        .iter()
        .map(|a| format!("{}={}", a.name, placeholder(&a.name)))
        .collect();
    let connector = if template.url.contains('?') { '&' } else { '?' };
    template.url = format!("{}{}{}", template.url, connector, pairs.join("&"));
}

fn apply_header_args(template: &mut RequestTemplate, header_args: &[&ToolArgument]) {
    for arg in header_args {
        if !template.has_header(&arg.name) {
            template.headers.push(HeaderEntry {
                key: arg.name.clone(),
                value: placeholder(&arg.name),
            });
        }
    }
}

/// Merge all cookie arguments into exactly one `Cookie` header line.
fn apply_cookie_args(template: &mut RequestTemplate, cookie_args: &[&ToolArgument]) {
    if cookie_args.is_empty() {
        return;
    }

    let cookie_value = cookie_args
        .iter()
        .map(|a| format!("{}={}", a.name, placeholder(&a.name)))
        .collect::<Vec<_>>()
        .join("; ");

    if let Some(existing) = template
        .headers
        .iter_mut()
        .find(|h| h.key.eq_ignore_ascii_case("cookie"))
    {
        if existing.value.is_empty() {
            existing.value = cookie_value;
        } else {
            existing.value = format!("{}; {}", existing.value, cookie_value);
        }
    } else {
        template.headers.push(HeaderEntry {
            key: "Cookie".to_string(),
            value: cookie_value,
        });
    }
}

/// Apply the body placement strategy. Returns whether the placement map was marked for
/// retention.
fn apply_body_args(
    template: &mut RequestTemplate,
    body_args: &[&ToolArgument],
    all_in_body: bool,
    has_explicit: bool,
) -> bool {
    if body_args.is_empty() {
        return false;
    }

    let mut marked = false;
    let content_type = template.content_type();

    if all_in_body {
        // Every argument goes to the body: a single flag fully describes the encoding.
        if content_type.contains(FORM_URLENCODED) || content_type.contains(MULTIPART_FORM) {
            template.args_to_form_body = true;
        } else {
            template.args_to_json_body = true;
            ensure_json_content_type(template);
        }
    } else if !has_explicit {
        if content_type.contains(FORM_URLENCODED) {
            let pairs: Vec<String> = body_args
                .iter()
                .map(|a| format!("{}={}", a.name, placeholder(&a.name)))
                .collect();
            template.body = Some(pairs.join("&"));
        } else if body_args.iter().any(|a| a.effective_type().is_complex()) {
            // Nested structures cannot be hand-written into a literal body text; the
            // runtime needs the placement map to know which top-level JSON fields come
            // from which arguments.
            template.args_to_json_body = true;
            marked = true;
            ensure_json_content_type(template);
        } else {
            template.body = Some(literal_json_body(body_args));
            ensure_json_content_type(template);
        }
    }

    // Mixed placements over a form content type with an explicit base: no literal body was
    // produced, so instruct the runtime to form-encode and keep the map.
    if template.body.is_none() && !all_in_body && template.content_type().contains(FORM_URLENCODED)
    {
        template.args_to_form_body = true;
        marked = true;
    }

    marked
}

/// Hand-written JSON object body for scalar-only body arguments: string-typed values get a
/// double-quoted placeholder, everything else an unquoted one.
fn literal_json_body(body_args: &[&ToolArgument]) -> String {
    let fields: Vec<String> = body_args
        .iter()
        .map(|a| {
            let value = if a.effective_type() == ArgType::String {
                format!("\"{}\"", placeholder(&a.name))
            } else {
                placeholder(&a.name)
            };
            format!("  \"{}\": {}", a.name, value)
        })
        .collect();
    format!("{{\n{}\n}}", fields.join(",\n"))
}

fn ensure_json_content_type(template: &mut RequestTemplate) {
    if !template.has_header("content-type") {
        template.headers.push(HeaderEntry {
            key: "Content-Type".to_string(),
            value: JSON_CONTENT_TYPE.to_string(),
        });
    }
}
