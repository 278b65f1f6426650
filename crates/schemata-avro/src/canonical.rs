//! Canonical form of an Avro schema.
//!
//! The canonical text is a normalized JSON rendering with namespaces
//! folded into fullnames, attribute keys in a fixed order, and `doc` and
//! aliases dropped. Field defaults and union branch order are kept: both
//! are semantic to compatibility, so schemas differing there must not
//! collapse to one fingerprint.

use crate::schema::{AvroSchema, AvroType};

/// Render the canonical text of a parsed schema.
pub fn canonical_form(schema: &AvroSchema) -> String {
    let mut out = String::new();
    write_type(&mut out, &schema.root);
    out
}

fn write_type(out: &mut String, ty: &AvroType) {
    match ty {
        AvroType::Null => out.push_str("\"null\""),
        AvroType::Boolean => out.push_str("\"boolean\""),
        AvroType::Int => out.push_str("\"int\""),
        AvroType::Long => out.push_str("\"long\""),
        AvroType::Float => out.push_str("\"float\""),
        AvroType::Double => out.push_str("\"double\""),
        AvroType::Bytes => out.push_str("\"bytes\""),
        AvroType::String => out.push_str("\"string\""),
        AvroType::Ref(fullname) => write_json_string(out, fullname),
        AvroType::Union(branches) => {
            out.push('[');
            for (i, branch) in branches.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_type(out, branch);
            }
            out.push(']');
        }
        AvroType::Array(items) => {
            out.push_str("{\"type\":\"array\",\"items\":");
            write_type(out, items);
            out.push('}');
        }
        AvroType::Map(values) => {
            out.push_str("{\"type\":\"map\",\"values\":");
            write_type(out, values);
            out.push('}');
        }
        AvroType::Record(record) => {
            out.push_str("{\"name\":");
            write_json_string(out, &record.name.fullname());
            out.push_str(",\"type\":\"record\",\"fields\":[");
            for (i, field) in record.fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str("{\"name\":");
                write_json_string(out, &field.name);
                out.push_str(",\"type\":");
                write_type(out, &field.schema);
                if let Some(default) = &field.default {
                    out.push_str(",\"default\":");
                    // serde_json renders object keys sorted, which keeps
                    // default values deterministic.
                    out.push_str(&default.to_string());
                }
                out.push('}');
            }
            out.push_str("]}");
        }
        AvroType::Enum(parsed) => {
            out.push_str("{\"name\":");
            write_json_string(out, &parsed.name.fullname());
            out.push_str(",\"type\":\"enum\",\"symbols\":[");
            for (i, symbol) in parsed.symbols.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_string(out, symbol);
            }
            out.push(']');
            if let Some(default) = &parsed.default {
                out.push_str(",\"default\":");
                write_json_string(out, default);
            }
            out.push('}');
        }
        AvroType::Fixed(fixed) => {
            out.push_str("{\"name\":");
            write_json_string(out, &fixed.name.fullname());
            out.push_str(",\"type\":\"fixed\",\"size\":");
            out.push_str(&fixed.size.to_string());
            out.push('}');
        }
    }
}

fn write_json_string(out: &mut String, s: &str) {
    // Display on a JSON string value performs the escaping and cannot
    // fail.
    out.push_str(&serde_json::Value::String(s.to_string()).to_string());
}
