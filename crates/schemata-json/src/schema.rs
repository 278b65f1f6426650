//! Parsed JSON Schema documents.
//!
//! The model keeps the schema as `serde_json::Value` (JSON Schema is
//! JSON) and layers draft selection and reference resolution on top.
//! Accessors live with the checker; this module owns the document
//! shape.

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Any error that may happen when parsing a JSON Schema document.
#[derive(Debug, Error)]
pub enum JsonParseError {
    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid schema: {0}")]
    Invalid(String),
}

/// JSON Schema draft dialect.
///
/// The dialect decides which tuple/definition keywords apply:
/// draft-07 uses `definitions`, array-form `items` and
/// `additionalItems`; draft 2020-12 uses `$defs`, `prefixItems` and
/// single-schema `items`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Draft {
    #[default]
    Draft7,
    Draft2020,
}

/// A parsed JSON Schema with its dialect and resolvable dependencies.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonSchema {
    pub draft: Draft,
    pub root: Value,
    /// Referenced documents by reference name (`$ref` targets that are
    /// not fragment-local).
    pub externals: HashMap<String, JsonSchema>,
}

impl JsonSchema {
    /// Parse a standalone schema document.
    pub fn parse(text: &str) -> Result<Self, JsonParseError> {
        Self::parse_with_dependencies(text, &[])
    }

    /// Parse a document whose `$ref`s may target named dependency
    /// schemas.
    pub fn parse_with_dependencies(
        text: &str,
        dependencies: &[(&str, &JsonSchema)],
    ) -> Result<Self, JsonParseError> {
        let root: Value = serde_json::from_str(text)?;
        if !matches!(root, Value::Object(_) | Value::Bool(_)) {
            return Err(JsonParseError::Invalid(
                "schema root must be an object or boolean".to_string(),
            ));
        }
        let draft = detect_draft(&root);
        let externals = dependencies
            .iter()
            .map(|(name, schema)| (name.to_string(), (*schema).clone()))
            .collect();
        Ok(JsonSchema {
            draft,
            root,
            externals,
        })
    }

    /// Follow a `$ref` chain starting at `value`, staying within this
    /// document or hopping into a named external.
    ///
    /// Unresolvable references degrade to the permissive schema rather
    /// than failing: reference integrity is the resolver's concern, not
    /// the checker's.
    pub fn deref<'a>(&'a self, value: &'a Value) -> &'a Value {
        const TRUE: &Value = &Value::Bool(true);
        let mut current = value;
        let mut doc = self;
        for _ in 0..32 {
            let Some(target) = current.get("$ref").and_then(Value::as_str) else {
                return current;
            };
            match doc.resolve_ref(target) {
                Some((next_doc, next)) => {
                    doc = next_doc;
                    current = next;
                }
                None => return TRUE,
            }
        }
        TRUE
    }

    fn resolve_ref<'a>(&'a self, target: &str) -> Option<(&'a JsonSchema, &'a Value)> {
        if let Some(pointer) = target.strip_prefix('#') {
            return self.root.pointer(pointer).map(|v| (self, v));
        }
        let (name, fragment) = match target.split_once('#') {
            Some((name, fragment)) => (name, Some(fragment)),
            None => (target, None),
        };
        let external = self.externals.get(name)?;
        match fragment {
            Some(pointer) => external.root.pointer(pointer).map(|v| (external, v)),
            None => Some((external, &external.root)),
        }
    }
}

fn detect_draft(root: &Value) -> Draft {
    match root.get("$schema").and_then(Value::as_str) {
        Some(url) if url.contains("2020-12") || url.contains("2019-09") => Draft::Draft2020,
        _ => Draft::Draft7,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn draft_detection_defaults_to_draft7() {
        let schema = JsonSchema::parse(r#"{"type": "object"}"#).unwrap();
        assert_eq!(schema.draft, Draft::Draft7);

        let schema = JsonSchema::parse(
            r#"{"$schema": "http://json-schema.org/draft-07/schema#", "type": "object"}"#,
        )
        .unwrap();
        assert_eq!(schema.draft, Draft::Draft7);

        let schema = JsonSchema::parse(
            r#"{"$schema": "https://json-schema.org/draft/2020-12/schema", "type": "object"}"#,
        )
        .unwrap();
        assert_eq!(schema.draft, Draft::Draft2020);
    }

    #[test]
    fn boolean_root_is_a_schema() {
        assert!(JsonSchema::parse("true").is_ok());
        assert!(JsonSchema::parse("[]").is_err());
        assert!(JsonSchema::parse("3").is_err());
    }

    #[test]
    fn fragment_local_refs_resolve() {
        let schema = JsonSchema::parse(
            r##"{
                "definitions": {"name": {"type": "string"}},
                "properties": {"name": {"$ref": "#/definitions/name"}}
            }"##,
        )
        .unwrap();
        let reference = schema.root.pointer("/properties/name").unwrap();
        assert_eq!(schema.deref(reference), &json!({"type": "string"}));
    }

    #[test]
    fn external_refs_resolve_by_name() {
        let address = JsonSchema::parse(r#"{"type": "object"}"#).unwrap();
        let order = JsonSchema::parse_with_dependencies(
            r#"{"properties": {"shipTo": {"$ref": "address.json"}}}"#,
            &[("address.json", &address)],
        )
        .unwrap();
        let reference = order.root.pointer("/properties/shipTo").unwrap();
        assert_eq!(order.deref(reference), &json!({"type": "object"}));
    }

    #[test]
    fn unresolvable_ref_degrades_to_permissive() {
        let schema = JsonSchema::parse(r##"{"$ref": "#/definitions/missing"}"##).unwrap();
        assert_eq!(schema.deref(&schema.root), &Value::Bool(true));
    }

    #[test]
    fn circular_refs_terminate() {
        let schema = JsonSchema::parse(
            r##"{"definitions": {"a": {"$ref": "#/definitions/a"}}, "$ref": "#/definitions/a"}"##,
        )
        .unwrap();
        let _ = schema.deref(&schema.root);
    }
}
