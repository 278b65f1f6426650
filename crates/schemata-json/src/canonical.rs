//! Canonical form of a JSON Schema document.
//!
//! Semantically identical schema texts must produce identical canonical
//! bytes, so the renderer sorts object keys, drops insignificant
//! whitespace, escapes strings minimally, and strips the annotation
//! keywords (`title`, `description`, `$comment`, `examples`) that do
//! not affect which instances a schema accepts.
//!
//! Stripping is schema-position aware: a *property named* `title`
//! inside `properties` is data and is kept; a `title` keyword in a
//! schema object is an annotation and is dropped.

use crate::schema::JsonSchema;
use serde_json::Value;

/// Annotation keywords removed from schema objects.
const ANNOTATIONS: [&str; 4] = ["title", "description", "$comment", "examples"];

/// Keywords whose value is a single schema.
const SCHEMA_VALUED: [&str; 10] = [
    "items",
    "additionalItems",
    "additionalProperties",
    "propertyNames",
    "contains",
    "not",
    "if",
    "then",
    "else",
    "unevaluatedProperties",
];

/// Keywords whose value is an array of schemas.
const SCHEMA_LIST_VALUED: [&str; 4] = ["allOf", "anyOf", "oneOf", "prefixItems"];

/// Keywords whose value maps arbitrary names to schemas.
const SCHEMA_MAP_VALUED: [&str; 5] = [
    "properties",
    "patternProperties",
    "definitions",
    "$defs",
    "dependentSchemas",
];

/// Render the canonical text of a parsed schema.
pub fn canonical_form(schema: &JsonSchema) -> String {
    let mut out = String::new();
    write_schema(&mut out, &schema.root);
    out
}

fn write_schema(out: &mut String, value: &Value) {
    let Value::Object(obj) = value else {
        write_value(out, value);
        return;
    };

    let mut entries: Vec<(&String, &Value)> = obj
        .iter()
        .filter(|(key, _)| !ANNOTATIONS.contains(&key.as_str()))
        .collect();
    entries.sort_by(|(a, _), (b, _)| compare_utf16(a, b));

    out.push('{');
    for (i, (key, entry)) in entries.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        if SCHEMA_VALUED.contains(&key.as_str()) {
            // Draft-07 array-form `items` holds schemas positionally.
            match entry {
                Value::Array(items) => write_schema_list(out, items),
                other => write_schema(out, other),
            }
        } else if SCHEMA_LIST_VALUED.contains(&key.as_str()) {
            match entry {
                Value::Array(items) => write_schema_list(out, items),
                other => write_value(out, other),
            }
        } else if SCHEMA_MAP_VALUED.contains(&key.as_str()) {
            write_schema_map(out, entry);
        } else if key.as_str() == "dependencies" {
            // Map of name -> (schema | array of property names).
            write_dependencies(out, entry);
        } else {
            write_value(out, entry);
        }
    }
    out.push('}');
}

fn write_schema_list(out: &mut String, items: &[Value]) {
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_schema(out, item);
    }
    out.push(']');
}

fn write_schema_map(out: &mut String, value: &Value) {
    let Value::Object(obj) = value else {
        write_value(out, value);
        return;
    };
    let mut entries: Vec<(&String, &Value)> = obj.iter().collect();
    entries.sort_by(|(a, _), (b, _)| compare_utf16(a, b));
    out.push('{');
    for (i, (key, entry)) in entries.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_schema(out, entry);
    }
    out.push('}');
}

fn write_dependencies(out: &mut String, value: &Value) {
    let Value::Object(obj) = value else {
        write_value(out, value);
        return;
    };
    let mut entries: Vec<(&String, &Value)> = obj.iter().collect();
    entries.sort_by(|(a, _), (b, _)| compare_utf16(a, b));
    out.push('{');
    for (i, (key, entry)) in entries.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        match entry {
            Value::Array(_) => write_value(out, entry),
            schema => write_schema(out, schema),
        }
    }
    out.push('}');
}

/// Canonicalize a plain (non-schema) JSON value: sorted keys, minimal
/// escaping, no insignificant whitespace.
fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(obj) => {
            let mut entries: Vec<(&String, &Value)> = obj.iter().collect();
            entries.sort_by(|(a, _), (b, _)| compare_utf16(a, b));
            out.push('{');
            for (i, (key, entry)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, entry);
            }
            out.push('}');
        }
    }
}

fn write_number(out: &mut String, n: &serde_json::Number) {
    if let Some(i) = n.as_i64() {
        out.push_str(&i.to_string());
        return;
    }
    if let Some(u) = n.as_u64() {
        out.push_str(&u.to_string());
        return;
    }
    match n.as_f64() {
        // Whole-number floats render without a fraction.
        Some(f) if f.fract() == 0.0 && f.abs() < (i64::MAX as f64) => {
            out.push_str(&(f as i64).to_string());
        }
        Some(f) => out.push_str(&f.to_string()),
        None => out.push_str(&n.to_string()),
    }
}

/// Minimal escaping: `"`, `\`, and control characters only.
fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\x08' => out.push_str("\\b"),
            '\x0C' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\x20' => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Key comparison by UTF-16 code units (RFC 8785 §3.2.3); equivalent to
/// byte order for ASCII keys.
fn compare_utf16(a: &str, b: &str) -> std::cmp::Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::JsonSchema;

    fn canon(text: &str) -> String {
        canonical_form(&JsonSchema::parse(text).unwrap())
    }

    #[test]
    fn key_order_and_whitespace_are_insignificant() {
        let a = canon(r#"{"type": "object", "required": ["name"]}"#);
        let b = canon(r#"{ "required":["name"] ,  "type":"object" }"#);
        assert_eq!(a, b);
        assert_eq!(a, r#"{"required":["name"],"type":"object"}"#);
    }

    #[test]
    fn annotations_are_stripped() {
        let bare = canon(r#"{"type": "string"}"#);
        let annotated = canon(
            r#"{
                "type": "string",
                "title": "A name",
                "description": "Someone's name",
                "$comment": "internal",
                "examples": ["Ada"]
            }"#,
        );
        assert_eq!(bare, annotated);
    }

    #[test]
    fn property_named_like_annotation_is_kept() {
        let schema = canon(
            r#"{"type": "object", "properties": {"title": {"type": "string"}}}"#,
        );
        assert!(schema.contains(r#""title":{"type":"string"}"#));
    }

    #[test]
    fn nested_schema_annotations_are_stripped() {
        let a = canon(r#"{"properties": {"age": {"type": "integer"}}}"#);
        let b = canon(
            r#"{"properties": {"age": {"type": "integer", "description": "years"}}}"#,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn enum_values_are_data_not_schemas() {
        let schema = canon(r#"{"enum": [{"title": "kept"}]}"#);
        assert!(schema.contains(r#"{"title":"kept"}"#));
    }

    #[test]
    fn draft7_tuple_items_canonicalize_positionally() {
        let schema = canon(
            r#"{"items": [{"type": "string", "title": "x"}, {"type": "integer"}]}"#,
        );
        assert_eq!(schema, r#"{"items":[{"type":"string"},{"type":"integer"}]}"#);
    }

    #[test]
    fn semantic_default_keyword_is_kept() {
        let with_default = canon(r#"{"type": "integer", "default": 5}"#);
        assert!(with_default.contains(r#""default":5"#));
    }
}
