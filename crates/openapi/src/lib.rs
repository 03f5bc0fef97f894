//! OpenAPI -> MCP tool-specification import.
//!
//! This crate turns a machine-written API description (OpenAPI 2/3, JSON or YAML) into a
//! tool specification consumable by a REST->MCP protocol-translation runtime:
//!
//! - [`normalizer`] detects the serialization format and description version and produces a
//!   single, self-contained document (all internal `$ref`s expanded by [`resolver`]).
//! - [`extract`] walks the normalized document and produces abstract tool records.
//! - [`template`] synthesizes, per tool, a wire-level request template that places caller
//!   arguments into the URL path, query string, headers, cookies, or body.
//! - [`assembly`] packages everything into the final specification object.
//!
//! The crate intentionally performs **no** HTTP execution and **no** persistence; it produces
//! an in-memory description handed to a separate runtime.

pub mod assembly;
pub mod contracts;
pub mod error;
pub mod extract;
pub mod import;
pub mod normalizer;
pub mod resolver;
pub mod template;
