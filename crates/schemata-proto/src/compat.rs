//! Reader/writer compatibility for Protobuf schemas.
//!
//! Messages match by fully qualified name and fields by number. A
//! matched field pair must stay in the same wire-compatibility group;
//! the reader must know every writer field number (a reservation counts
//! as knowing it is gone), every writer enum value, and every writer
//! service method.

use crate::model::{EnumDescriptor, FieldType, MessageDescriptor, NamedType, ProtoSchema};
use schemata_model::CheckResult;

/// Check that `reader` can consume data (and serve calls) written
/// against `writer`.
pub fn check(reader: &ProtoSchema, writer: &ProtoSchema) -> CheckResult {
    let mut messages = Vec::new();

    if reader.file.syntax != writer.file.syntax {
        messages.push(format!(
            "syntax changed from {} to {}",
            writer.file.syntax.as_str(),
            reader.file.syntax.as_str()
        ));
    }
    if reader.file.package != writer.file.package {
        messages.push(format!(
            "package changed from '{}' to '{}'",
            writer.file.package.as_deref().unwrap_or(""),
            reader.file.package.as_deref().unwrap_or("")
        ));
    }

    let reader_messages = reader.own_messages();
    for (fqn, writer_message) in writer.own_messages() {
        match reader_messages.get(&fqn) {
            None => messages.push(format!("message '{fqn}' was removed")),
            Some(reader_message) => check_message(
                reader,
                writer,
                &fqn,
                reader_message,
                writer_message,
                &mut messages,
            ),
        }
    }

    let reader_enums = reader.own_enums();
    for (fqn, writer_enum) in writer.own_enums() {
        match reader_enums.get(&fqn) {
            None => messages.push(format!("enum '{fqn}' was removed")),
            Some(reader_enum) => check_enum(&fqn, reader_enum, writer_enum, &mut messages),
        }
    }

    let reader_services = reader.own_services();
    for (fqn, writer_service) in writer.own_services() {
        let Some(reader_service) = reader_services.get(&fqn) else {
            messages.push(format!("service '{fqn}' was removed"));
            continue;
        };
        for writer_method in &writer_service.methods {
            let Some(reader_method) = reader_service.method(&writer_method.name) else {
                messages.push(format!(
                    "method '{}' was removed from service '{fqn}'",
                    writer_method.name
                ));
                continue;
            };
            let scope = reader.file.package.clone().unwrap_or_default();
            let reader_input = resolved_name(reader, &scope, &reader_method.input);
            let writer_input = resolved_name(writer, &scope, &writer_method.input);
            if reader_input != writer_input {
                messages.push(format!(
                    "method '{}' of service '{fqn}' changed its input from '{}' to '{}'",
                    writer_method.name, writer_method.input, reader_method.input
                ));
            }
            let reader_output = resolved_name(reader, &scope, &reader_method.output);
            let writer_output = resolved_name(writer, &scope, &writer_method.output);
            if reader_output != writer_output {
                messages.push(format!(
                    "method '{}' of service '{fqn}' changed its output from '{}' to '{}'",
                    writer_method.name, writer_method.output, reader_method.output
                ));
            }
            if reader_method.client_streaming != writer_method.client_streaming
                || reader_method.server_streaming != writer_method.server_streaming
            {
                messages.push(format!(
                    "method '{}' of service '{fqn}' changed its streaming mode",
                    writer_method.name
                ));
            }
        }
    }

    CheckResult::from_messages(messages)
}

fn check_message(
    reader_doc: &ProtoSchema,
    writer_doc: &ProtoSchema,
    fqn: &str,
    reader: &MessageDescriptor,
    writer: &MessageDescriptor,
    messages: &mut Vec<String>,
) {
    for writer_field in &writer.fields {
        let Some(reader_field) = reader.field_by_number(writer_field.number) else {
            if !reader.reserves_number(writer_field.number) {
                messages.push(format!(
                    "field '{}' (number {}) was removed from message '{fqn}' without reserving it",
                    writer_field.name, writer_field.number
                ));
            }
            continue;
        };

        let reader_group = wire_group(reader_doc, fqn, &reader_field.ty);
        let writer_group = wire_group(writer_doc, fqn, &writer_field.ty);
        if reader_group != writer_group {
            messages.push(format!(
                "field number {} of message '{fqn}' moved from wire group {} to {}",
                writer_field.number,
                writer_group.describe(),
                reader_group.describe()
            ));
        }

        if writer_field.cardinality.is_repeated() && !reader_field.cardinality.is_repeated() {
            messages.push(format!(
                "field number {} of message '{fqn}' changed from repeated to singular",
                writer_field.number
            ));
        }
    }
    // Reader-only field numbers are new fields; writers never produce
    // them, so they need no check.
}

fn check_enum(
    fqn: &str,
    reader: &EnumDescriptor,
    writer: &EnumDescriptor,
    messages: &mut Vec<String>,
) {
    for (symbol, number) in &writer.values {
        if reader.value_by_number(*number).is_none() {
            messages.push(format!(
                "enum value '{symbol}' (number {number}) was removed from enum '{fqn}'"
            ));
        }
    }
}

/// Wire-compatibility groups. Types in one group serialize
/// interchangeably; crossing groups breaks decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WireGroup {
    /// `int32`, `sint32`, `sfixed32` and enums.
    VarintI32,
    /// `int64`, `sint64`, `sfixed64`.
    VarintI64,
    /// `uint32`, `fixed32`.
    Unsigned32,
    /// `uint64`, `fixed64`.
    Unsigned64,
    /// `string`, `bytes`.
    LengthDelimited,
    Bool,
    Float,
    Double,
    /// Message types match by fully qualified name.
    Message(String),
    Map(Box<WireGroup>, Box<WireGroup>),
}

impl WireGroup {
    fn describe(&self) -> String {
        match self {
            WireGroup::VarintI32 => "int32".to_string(),
            WireGroup::VarintI64 => "int64".to_string(),
            WireGroup::Unsigned32 => "uint32".to_string(),
            WireGroup::Unsigned64 => "uint64".to_string(),
            WireGroup::LengthDelimited => "string/bytes".to_string(),
            WireGroup::Bool => "bool".to_string(),
            WireGroup::Float => "float".to_string(),
            WireGroup::Double => "double".to_string(),
            WireGroup::Message(name) => format!("message {name}"),
            WireGroup::Map(key, value) => {
                format!("map<{}, {}>", key.describe(), value.describe())
            }
        }
    }
}

fn wire_group(doc: &ProtoSchema, scope: &str, ty: &FieldType) -> WireGroup {
    match ty {
        FieldType::Int32 | FieldType::Sint32 | FieldType::Sfixed32 => WireGroup::VarintI32,
        FieldType::Int64 | FieldType::Sint64 | FieldType::Sfixed64 => WireGroup::VarintI64,
        FieldType::Uint32 | FieldType::Fixed32 => WireGroup::Unsigned32,
        FieldType::Uint64 | FieldType::Fixed64 => WireGroup::Unsigned64,
        FieldType::String | FieldType::Bytes => WireGroup::LengthDelimited,
        FieldType::Bool => WireGroup::Bool,
        FieldType::Float => WireGroup::Float,
        FieldType::Double => WireGroup::Double,
        FieldType::Map(key, value) => WireGroup::Map(
            Box::new(wire_group(doc, scope, key)),
            Box::new(wire_group(doc, scope, value)),
        ),
        FieldType::Named(name) => match doc.resolve(scope, name) {
            Some((_, NamedType::Enum(_))) => WireGroup::VarintI32,
            Some((fqn, NamedType::Message(_))) => WireGroup::Message(fqn),
            // Unresolved names (unsatisfied imports) compare textually.
            None => WireGroup::Message(name.trim_start_matches('.').to_string()),
        },
    }
}

fn resolved_name(doc: &ProtoSchema, scope: &str, name: &str) -> String {
    doc.resolve(scope, name)
        .map(|(fqn, _)| fqn)
        .unwrap_or_else(|| name.trim_start_matches('.').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    fn assert_compatible(reader: &str, writer: &str) {
        let reader = parse(reader).unwrap();
        let writer = parse(writer).unwrap();
        let result = check(&reader, &writer);
        assert!(
            result.is_compatible(),
            "expected compatible, got: {:?}",
            result.messages()
        );
    }

    fn assert_incompatible(reader: &str, writer: &str) {
        let reader = parse(reader).unwrap();
        let writer = parse(writer).unwrap();
        let result = check(&reader, &writer);
        assert!(!result.is_compatible(), "expected incompatible");
        assert!(!result.messages().is_empty());
    }

    #[test]
    fn removing_a_field_is_incompatible() {
        assert_incompatible(
            r#"syntax="proto3";message Event{string id=1;}"#,
            r#"syntax="proto3";message Event{string id=1;string source=2;}"#,
        );
    }

    #[test]
    fn removing_a_field_with_reservation_is_compatible() {
        assert_compatible(
            r#"syntax="proto3";message Event{string id=1;reserved 2;}"#,
            r#"syntax="proto3";message Event{string id=1;string source=2;}"#,
        );
    }

    #[test]
    fn adding_a_field_is_compatible() {
        assert_compatible(
            r#"syntax="proto3";message Event{string id=1;string source=2;}"#,
            r#"syntax="proto3";message Event{string id=1;}"#,
        );
    }

    #[test]
    fn same_wire_group_changes_are_compatible() {
        assert_compatible(
            r#"syntax="proto3";message M{sint32 n=1;bytes b=2;}"#,
            r#"syntax="proto3";message M{int32 n=1;string b=2;}"#,
        );
    }

    #[test]
    fn crossing_wire_groups_is_incompatible() {
        assert_incompatible(
            r#"syntax="proto3";message M{int64 n=1;}"#,
            r#"syntax="proto3";message M{int32 n=1;}"#,
        );
        assert_incompatible(
            r#"syntax="proto3";message M{fixed32 n=1;}"#,
            r#"syntax="proto3";message M{int32 n=1;}"#,
        );
    }

    #[test]
    fn singular_to_repeated_is_one_way() {
        assert_compatible(
            r#"syntax="proto3";message M{repeated string v=1;}"#,
            r#"syntax="proto3";message M{string v=1;}"#,
        );
        assert_incompatible(
            r#"syntax="proto3";message M{string v=1;}"#,
            r#"syntax="proto3";message M{repeated string v=1;}"#,
        );
    }

    #[test]
    fn package_and_syntax_changes_are_incompatible() {
        assert_incompatible(
            r#"syntax="proto3";package a;message M{}"#,
            r#"syntax="proto3";package b;message M{}"#,
        );
        assert_incompatible(
            r#"syntax="proto2";message M{optional int32 a=1;}"#,
            r#"syntax="proto3";message M{int32 a=1;}"#,
        );
    }

    #[test]
    fn message_rename_is_incompatible() {
        assert_incompatible(
            r#"syntax="proto3";message New{}"#,
            r#"syntax="proto3";message Old{}"#,
        );
    }

    #[test]
    fn field_number_reuse_with_message_rename_is_incompatible() {
        assert_incompatible(
            r#"syntax="proto3";message A{}message B{}message M{B x=1;}"#,
            r#"syntax="proto3";message A{}message B{}message M{A x=1;}"#,
        );
    }

    #[test]
    fn enum_value_addition_is_reader_side_only() {
        // Reader knowing more values than the writer is fine.
        assert_compatible(
            r#"syntax="proto3";enum E{E_UNSPECIFIED=0;A=1;B=2;}message M{E e=1;}"#,
            r#"syntax="proto3";enum E{E_UNSPECIFIED=0;A=1;}message M{E e=1;}"#,
        );
        // The writer producing values the reader lacks is not.
        assert_incompatible(
            r#"syntax="proto3";enum E{E_UNSPECIFIED=0;A=1;}message M{E e=1;}"#,
            r#"syntax="proto3";enum E{E_UNSPECIFIED=0;A=1;B=2;}message M{E e=1;}"#,
        );
    }

    #[test]
    fn service_and_method_removal_is_incompatible() {
        let full = r#"syntax="proto3";package p;message Q{}message R{}
            service S{rpc Get(Q) returns (R);rpc List(Q) returns (stream R);}"#;
        let without_method = r#"syntax="proto3";package p;message Q{}message R{}
            service S{rpc Get(Q) returns (R);}"#;
        let without_service = r#"syntax="proto3";package p;message Q{}message R{}"#;
        assert_compatible(full, without_method);
        assert_incompatible(without_method, full);
        assert_incompatible(without_service, full);
    }

    #[test]
    fn method_streaming_mode_change_is_incompatible() {
        assert_incompatible(
            r#"syntax="proto3";package p;message Q{}message R{}service S{rpc Get(Q) returns (stream R);}"#,
            r#"syntax="proto3";package p;message Q{}message R{}service S{rpc Get(Q) returns (R);}"#,
        );
    }

    #[test]
    fn method_input_swap_is_incompatible() {
        assert_incompatible(
            r#"syntax="proto3";package p;message Q{}message R{}service S{rpc Get(R) returns (Q);}"#,
            r#"syntax="proto3";package p;message Q{}message R{}service S{rpc Get(Q) returns (R);}"#,
        );
    }

    #[test]
    fn oneof_branch_addition_is_compatible() {
        assert_compatible(
            r#"syntax="proto3";message M{oneof pay{string card=1;string iban=2;}}"#,
            r#"syntax="proto3";message M{oneof pay{string card=1;}}"#,
        );
        assert_incompatible(
            r#"syntax="proto3";message M{oneof pay{string card=1;}}"#,
            r#"syntax="proto3";message M{oneof pay{string card=1;string iban=2;}}"#,
        );
    }

    #[test]
    fn map_fields_compare_key_and_value_groups() {
        assert_compatible(
            r#"syntax="proto3";message M{map<string,int32> kv=1;}"#,
            r#"syntax="proto3";message M{map<string,sint32> kv=1;}"#,
        );
        assert_incompatible(
            r#"syntax="proto3";message M{map<string,int64> kv=1;}"#,
            r#"syntax="proto3";message M{map<string,int32> kv=1;}"#,
        );
    }

    #[test]
    fn nested_message_fields_are_checked() {
        assert_incompatible(
            r#"syntax="proto3";message Outer{message Inner{int64 v=1;}Inner i=1;}"#,
            r#"syntax="proto3";message Outer{message Inner{int32 v=1;}Inner i=1;}"#,
        );
    }
}
