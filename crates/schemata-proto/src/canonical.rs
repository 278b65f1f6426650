//! Normalized textual form of a `.proto` file.
//!
//! The canonical text renders the descriptor tree with fixed formatting:
//! messages, enums and services sorted by name, fields sorted by number,
//! enum values by number, methods by name. Comments, options and layout
//! never reach the descriptor, so they cannot influence the fingerprint.

use crate::model::{
    EnumDescriptor, FieldDescriptor, FileDescriptor, MessageDescriptor, ProtoSchema,
    ServiceDescriptor,
};
use std::fmt::Write;

/// Render the canonical text of a parsed schema.
pub fn canonical_form(schema: &ProtoSchema) -> String {
    let mut out = String::new();
    write_file(&mut out, &schema.file);
    out
}

fn write_file(out: &mut String, file: &FileDescriptor) {
    let _ = writeln!(out, "syntax = \"{}\";", file.syntax.as_str());
    if let Some(package) = &file.package {
        let _ = writeln!(out, "package {package};");
    }
    let mut imports = file.imports.clone();
    imports.sort();
    for import in imports {
        let _ = writeln!(out, "import \"{import}\";");
    }

    let mut messages: Vec<&MessageDescriptor> = file.messages.iter().collect();
    messages.sort_by(|a, b| a.name.cmp(&b.name));
    for message in messages {
        write_message(out, message, 0);
    }

    let mut enums: Vec<&EnumDescriptor> = file.enums.iter().collect();
    enums.sort_by(|a, b| a.name.cmp(&b.name));
    for parsed in enums {
        write_enum(out, parsed, 0);
    }

    let mut services: Vec<&ServiceDescriptor> = file.services.iter().collect();
    services.sort_by(|a, b| a.name.cmp(&b.name));
    for service in services {
        write_service(out, service);
    }
}

fn write_message(out: &mut String, message: &MessageDescriptor, depth: usize) {
    let pad = "  ".repeat(depth);
    let _ = writeln!(out, "{pad}message {} {{", message.name);

    let mut nested: Vec<&MessageDescriptor> = message.nested_messages.iter().collect();
    nested.sort_by(|a, b| a.name.cmp(&b.name));
    for inner in nested {
        write_message(out, inner, depth + 1);
    }

    let mut enums: Vec<&EnumDescriptor> = message.nested_enums.iter().collect();
    enums.sort_by(|a, b| a.name.cmp(&b.name));
    for parsed in enums {
        write_enum(out, parsed, depth + 1);
    }

    let mut fields: Vec<&FieldDescriptor> = message.fields.iter().collect();
    fields.sort_by_key(|field| field.number);
    for field in fields {
        write_field(out, field, depth + 1);
    }

    let mut reserved = message.reserved_numbers.clone();
    reserved.sort();
    for (low, high) in reserved {
        if low == high {
            let _ = writeln!(out, "{pad}  reserved {low};");
        } else {
            let _ = writeln!(out, "{pad}  reserved {low} to {high};");
        }
    }
    let mut names = message.reserved_names.clone();
    names.sort();
    for name in names {
        let _ = writeln!(out, "{pad}  reserved \"{name}\";");
    }

    let _ = writeln!(out, "{pad}}}");
}

fn write_field(out: &mut String, field: &FieldDescriptor, depth: usize) {
    let pad = "  ".repeat(depth);
    let label = match field.cardinality {
        crate::model::Cardinality::Singular => "",
        crate::model::Cardinality::Optional => "optional ",
        crate::model::Cardinality::Required => "required ",
        crate::model::Cardinality::Repeated => "repeated ",
    };
    let oneof = field
        .oneof
        .as_ref()
        .map(|name| format!(" // oneof {name}"))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "{pad}{label}{} {} = {};{oneof}",
        field.ty.render(),
        field.name,
        field.number
    );
}

fn write_enum(out: &mut String, parsed: &EnumDescriptor, depth: usize) {
    let pad = "  ".repeat(depth);
    let _ = writeln!(out, "{pad}enum {} {{", parsed.name);
    let mut values = parsed.values.clone();
    values.sort_by_key(|(_, number)| *number);
    for (symbol, number) in values {
        let _ = writeln!(out, "{pad}  {symbol} = {number};");
    }
    let _ = writeln!(out, "{pad}}}");
}

fn write_service(out: &mut String, service: &ServiceDescriptor) {
    let _ = writeln!(out, "service {} {{", service.name);
    let mut methods: Vec<_> = service.methods.iter().collect();
    methods.sort_by(|a, b| a.name.cmp(&b.name));
    for method in methods {
        let input_stream = if method.client_streaming { "stream " } else { "" };
        let output_stream = if method.server_streaming { "stream " } else { "" };
        let _ = writeln!(
            out,
            "  rpc {} ({input_stream}{}) returns ({output_stream}{});",
            method.name, method.input, method.output
        );
    }
    let _ = writeln!(out, "}}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    #[test]
    fn layout_and_comments_are_insignificant() {
        let compact = parse(
            r#"syntax="proto3";package p;message A{string id=1;int32 n=2;}"#,
        )
        .unwrap();
        let verbose = parse(
            r#"
            syntax = "proto3";
            package p;

            // A well-commented message.
            message A {
                string id = 1; // the identifier
                int32 n = 2;
            }
            "#,
        )
        .unwrap();
        assert_eq!(canonical_form(&compact), canonical_form(&verbose));
    }

    #[test]
    fn declaration_order_is_normalized() {
        let a_then_b = parse(r#"syntax="proto3";message A{}message B{}"#).unwrap();
        let b_then_a = parse(r#"syntax="proto3";message B{}message A{}"#).unwrap();
        assert_eq!(canonical_form(&a_then_b), canonical_form(&b_then_a));
    }

    #[test]
    fn field_order_follows_numbers() {
        let schema = parse(
            r#"syntax="proto3";message M{int32 b=2;string a=1;}"#,
        )
        .unwrap();
        let canonical = canonical_form(&schema);
        let a_pos = canonical.find("a = 1").unwrap();
        let b_pos = canonical.find("b = 2").unwrap();
        assert!(a_pos < b_pos);
    }

    #[test]
    fn field_numbers_drive_identity() {
        let one = parse(r#"syntax="proto3";message M{string a=1;}"#).unwrap();
        let two = parse(r#"syntax="proto3";message M{string a=2;}"#).unwrap();
        assert_ne!(canonical_form(&one), canonical_form(&two));
    }
}
