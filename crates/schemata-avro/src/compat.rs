//! Reader/writer compatibility for Avro schemas.
//!
//! `check(reader, writer)` decides whether every datum written with the
//! writer schema can be decoded with the reader schema, following the
//! Avro schema-resolution rules: field matching by name then reader
//! alias, defaults for reader-only fields, the numeric promotion
//! lattice, union branch resolution, enum symbol subsets and named-type
//! identity.

use crate::schema::{AvroSchema, AvroType, EnumType, FixedType, RecordType};
use schemata_model::CheckResult;
use std::collections::HashSet;

/// Check that `reader` can consume data written with `writer`.
pub fn check(reader: &AvroSchema, writer: &AvroSchema) -> CheckResult {
    let mut checker = Checker {
        reader_doc: reader,
        writer_doc: writer,
        in_progress: HashSet::new(),
    };
    let messages = checker.check_types(&reader.root, &writer.root, "");
    CheckResult::from_messages(messages)
}

struct Checker<'a> {
    reader_doc: &'a AvroSchema,
    writer_doc: &'a AvroSchema,
    /// Record name pairs currently being compared; a revisit means the
    /// pair is recursive and may be assumed compatible at this point.
    in_progress: HashSet<(String, String)>,
}

impl Checker<'_> {
    fn check_types(&mut self, reader: &AvroType, writer: &AvroType, path: &str) -> Vec<String> {
        let reader = self.reader_doc.resolve(reader).clone();
        let writer = self.writer_doc.resolve(writer).clone();

        match (&reader, &writer) {
            (AvroType::Union(r_branches), AvroType::Union(w_branches)) => {
                let mut messages = Vec::new();
                for (i, w_branch) in w_branches.iter().enumerate() {
                    if !self.any_branch_reads(r_branches, w_branch) {
                        messages.push(format!(
                            "{}: writer union branch {} ({}) is not readable by any reader branch",
                            location(path),
                            i,
                            self.writer_doc.resolve(w_branch).describe()
                        ));
                    }
                }
                messages
            }
            (AvroType::Union(r_branches), _) => {
                if self.any_branch_reads(r_branches, &writer) {
                    Vec::new()
                } else {
                    vec![format!(
                        "{}: writer type {} is not readable by any reader union branch",
                        location(path),
                        writer.describe()
                    )]
                }
            }
            (_, AvroType::Union(w_branches)) => {
                let mut messages = Vec::new();
                for (i, w_branch) in w_branches.iter().enumerate() {
                    if !self.reads_silently(&reader, w_branch) {
                        messages.push(format!(
                            "{}: reader type {} cannot read writer union branch {} ({})",
                            location(path),
                            reader.describe(),
                            i,
                            self.writer_doc.resolve(w_branch).describe()
                        ));
                    }
                }
                messages
            }
            (AvroType::Array(r_items), AvroType::Array(w_items)) => {
                self.check_types(r_items, w_items, &format!("{path}/items"))
            }
            (AvroType::Map(r_values), AvroType::Map(w_values)) => {
                self.check_types(r_values, w_values, &format!("{path}/values"))
            }
            (AvroType::Record(r_record), AvroType::Record(w_record)) => {
                self.check_records(r_record, w_record, path)
            }
            (AvroType::Enum(r_enum), AvroType::Enum(w_enum)) => {
                check_enums(r_enum, w_enum, path)
            }
            (AvroType::Fixed(r_fixed), AvroType::Fixed(w_fixed)) => {
                check_fixed(r_fixed, w_fixed, path)
            }
            _ => {
                if promotable(&reader, &writer) {
                    Vec::new()
                } else {
                    vec![format!(
                        "{}: reader type {} is not compatible with writer type {}",
                        location(path),
                        reader.describe(),
                        writer.describe()
                    )]
                }
            }
        }
    }

    fn check_records(
        &mut self,
        reader: &RecordType,
        writer: &RecordType,
        path: &str,
    ) -> Vec<String> {
        let r_name = reader.name.fullname();
        let w_name = writer.name.fullname();
        if r_name != w_name && !reader.aliases.contains(&w_name) {
            return vec![format!(
                "{}: reader record name '{}' does not match writer record name '{}'",
                location(path),
                r_name,
                w_name
            )];
        }

        let pair = (r_name, w_name);
        if !self.in_progress.insert(pair.clone()) {
            // Recursive pair already on the stack: assumed compatible.
            return Vec::new();
        }

        let mut messages = Vec::new();
        for r_field in &reader.fields {
            let matched = writer.fields.iter().find(|w_field| {
                w_field.name == r_field.name || r_field.aliases.contains(&w_field.name)
            });
            match matched {
                Some(w_field) => {
                    let field_path = format!("{path}/fields/{}", r_field.name);
                    messages.extend(self.check_types(
                        &r_field.schema,
                        &w_field.schema,
                        &field_path,
                    ));
                }
                None => {
                    if r_field.default.is_none() {
                        messages.push(format!(
                            "{}: reader field '{}' has no default value and is missing in the writer schema",
                            location(path),
                            r_field.name
                        ));
                    }
                }
            }
        }
        // Writer-only fields are discarded by the reader.

        if !messages.is_empty() {
            // A settled-compatible pair stays marked; the comparison is
            // context-free. A failed pair must be re-examined.
            self.in_progress.remove(&pair);
        }
        messages
    }

    fn any_branch_reads(&mut self, reader_branches: &[AvroType], writer: &AvroType) -> bool {
        reader_branches
            .iter()
            .any(|branch| self.reads_silently(branch, writer))
    }

    fn reads_silently(&mut self, reader: &AvroType, writer: &AvroType) -> bool {
        self.check_types(reader, writer, "").is_empty()
    }
}

fn check_enums(reader: &EnumType, writer: &EnumType, path: &str) -> Vec<String> {
    let r_name = reader.name.fullname();
    let w_name = writer.name.fullname();
    if r_name != w_name && !reader.aliases.contains(&w_name) {
        return vec![format!(
            "{}: reader enum name '{}' does not match writer enum name '{}'",
            location(path),
            r_name,
            w_name
        )];
    }

    let missing: Vec<&String> = writer
        .symbols
        .iter()
        .filter(|symbol| !reader.symbols.contains(*symbol))
        .collect();
    if missing.is_empty() || reader.default.is_some() {
        Vec::new()
    } else {
        vec![format!(
            "{}: reader enum '{}' is missing writer symbols [{}] and declares no default",
            location(path),
            r_name,
            missing
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )]
    }
}

fn check_fixed(reader: &FixedType, writer: &FixedType, path: &str) -> Vec<String> {
    let r_name = reader.name.fullname();
    let w_name = writer.name.fullname();
    if r_name != w_name && !reader.aliases.contains(&w_name) {
        return vec![format!(
            "{}: reader fixed name '{}' does not match writer fixed name '{}'",
            location(path),
            r_name,
            w_name
        )];
    }
    if reader.size != writer.size {
        return vec![format!(
            "{}: fixed '{}' size changed from {} to {}",
            location(path),
            r_name,
            writer.size,
            reader.size
        )];
    }
    Vec::new()
}

/// The directional promotion lattice: can `reader` decode a value
/// written as `writer`?
fn promotable(reader: &AvroType, writer: &AvroType) -> bool {
    use AvroType::*;
    matches!(
        (reader, writer),
        (Null, Null)
            | (Boolean, Boolean)
            | (Int, Int)
            | (Long, Long)
            | (Float, Float)
            | (Double, Double)
            | (Bytes, Bytes)
            | (String, String)
            | (Long, Int)
            | (Float, Int)
            | (Float, Long)
            | (Double, Int)
            | (Double, Long)
            | (Double, Float)
            | (String, Bytes)
            | (Bytes, String)
    )
}

fn location(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
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
    fn added_field_with_default_is_backward_compatible() {
        assert_compatible(
            r#"{"type":"record","name":"R","fields":[
                {"name":"f1","type":"string"},
                {"name":"f2","type":"string","default":"foo"}]}"#,
            r#"{"type":"record","name":"R","fields":[{"name":"f1","type":"string"}]}"#,
        );
    }

    #[test]
    fn added_field_without_default_is_incompatible() {
        assert_incompatible(
            r#"{"type":"record","name":"R","fields":[
                {"name":"f1","type":"string"},
                {"name":"f2","type":"string"}]}"#,
            r#"{"type":"record","name":"R","fields":[{"name":"f1","type":"string"}]}"#,
        );
    }

    #[test]
    fn removed_field_is_ignored_by_reader() {
        assert_compatible(
            r#"{"type":"record","name":"R","fields":[{"name":"f1","type":"string"}]}"#,
            r#"{"type":"record","name":"R","fields":[
                {"name":"f1","type":"string"},
                {"name":"f2","type":"long"}]}"#,
        );
    }

    #[test]
    fn int_promotes_to_long_one_way() {
        assert_compatible(r#""long""#, r#""int""#);
        assert_incompatible(r#""int""#, r#""long""#);
    }

    #[test]
    fn string_and_bytes_promote_both_ways() {
        assert_compatible(r#""string""#, r#""bytes""#);
        assert_compatible(r#""bytes""#, r#""string""#);
    }

    #[test]
    fn reader_union_accepts_narrower_writer() {
        assert_compatible(r#"["null","string"]"#, r#""string""#);
        assert_incompatible(r#""string""#, r#"["null","string"]"#);
    }

    #[test]
    fn writer_union_must_be_fully_covered() {
        assert_compatible(r#"["null","string","long"]"#, r#"["null","string"]"#);
        assert_incompatible(r#"["null","string"]"#, r#"["null","string","long"]"#);
    }

    #[test]
    fn enum_symbol_superset_is_compatible() {
        assert_compatible(
            r#"{"type":"enum","name":"Color","symbols":["RED","GREEN","BLUE"]}"#,
            r#"{"type":"enum","name":"Color","symbols":["RED","GREEN"]}"#,
        );
        assert_incompatible(
            r#"{"type":"enum","name":"Color","symbols":["RED"]}"#,
            r#"{"type":"enum","name":"Color","symbols":["RED","GREEN"]}"#,
        );
    }

    #[test]
    fn enum_default_covers_unknown_symbols() {
        assert_compatible(
            r#"{"type":"enum","name":"Color","symbols":["RED"],"default":"RED"}"#,
            r#"{"type":"enum","name":"Color","symbols":["RED","GREEN"]}"#,
        );
    }

    #[test]
    fn record_rename_with_alias_matches() {
        assert_compatible(
            r#"{"type":"record","name":"NewName","aliases":["OldName"],"fields":[]}"#,
            r#"{"type":"record","name":"OldName","fields":[]}"#,
        );
        assert_incompatible(
            r#"{"type":"record","name":"NewName","fields":[]}"#,
            r#"{"type":"record","name":"OldName","fields":[]}"#,
        );
    }

    #[test]
    fn field_rename_with_alias_matches() {
        assert_compatible(
            r#"{"type":"record","name":"R","fields":[
                {"name":"renamed","aliases":["original"],"type":"string"}]}"#,
            r#"{"type":"record","name":"R","fields":[{"name":"original","type":"string"}]}"#,
        );
    }

    #[test]
    fn fixed_size_change_is_incompatible() {
        assert_incompatible(
            r#"{"type":"fixed","name":"Hash","size":32}"#,
            r#"{"type":"fixed","name":"Hash","size":16}"#,
        );
    }

    #[test]
    fn maps_and_arrays_recurse() {
        assert_compatible(
            r#"{"type":"array","items":"long"}"#,
            r#"{"type":"array","items":"int"}"#,
        );
        assert_incompatible(
            r#"{"type":"map","values":"int"}"#,
            r#"{"type":"map","values":"long"}"#,
        );
    }

    #[test]
    fn recursive_records_terminate() {
        let node = r#"{"type":"record","name":"Node","fields":[
            {"name":"value","type":"long"},
            {"name":"next","type":["null","Node"],"default":null}]}"#;
        assert_compatible(node, node);
    }

    #[test]
    fn incompatible_outcome_carries_ordered_messages() {
        let reader = parse(
            r#"{"type":"record","name":"R","fields":[
                {"name":"a","type":"int"},
                {"name":"b","type":"int"}]}"#,
        )
        .unwrap();
        let writer = parse(
            r#"{"type":"record","name":"R","fields":[
                {"name":"a","type":"string"},
                {"name":"b","type":"string"}]}"#,
        )
        .unwrap();
        let result = check(&reader, &writer);
        let messages = result.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("/fields/a"));
        assert!(messages[1].contains("/fields/b"));
    }
}
