//! Per-format dispatch.
//!
//! The engine speaks one vocabulary over three schema formats. This
//! module routes parsing, canonicalization, fingerprinting and
//! compatibility checks to the format crates, and classifies their
//! parse failures as `INVALID_SCHEMA`.

use crate::resolver::ResolvedReference;
use schemata_model::{
    CheckResult, Fingerprint, RegistryError, Result, SchemaFormat, SchemaReference,
};
use std::collections::HashMap;

/// A schema parsed into its format's comparison model.
#[derive(Debug, Clone)]
pub enum ParsedSchema {
    Avro(schemata_avro::AvroSchema),
    Json(schemata_json::JsonSchema),
    Protobuf(schemata_proto::ProtoSchema),
}

impl ParsedSchema {
    pub fn format(&self) -> SchemaFormat {
        match self {
            ParsedSchema::Avro(_) => SchemaFormat::Avro,
            ParsedSchema::Json(_) => SchemaFormat::Json,
            ParsedSchema::Protobuf(_) => SchemaFormat::Protobuf,
        }
    }

    /// The canonical text fingerprints are computed over.
    pub fn canonical_form(&self) -> String {
        match self {
            ParsedSchema::Avro(schema) => schemata_avro::canonical_form(schema),
            ParsedSchema::Json(schema) => schemata_json::canonical_form(schema),
            ParsedSchema::Protobuf(schema) => schemata_proto::canonical_form(schema),
        }
    }
}

/// Parse a schema whose references have been resolved to a dependency
/// closure (topological order, dependencies first).
pub fn parse_with_closure(
    format: SchemaFormat,
    text: &str,
    references: &[SchemaReference],
    closure: &[ResolvedReference],
) -> Result<ParsedSchema> {
    let mut parsed: HashMap<(String, u32), ParsedSchema> = HashMap::new();
    for resolved in closure {
        let dependencies = named_dependencies(&resolved.schema.references, &parsed)?;
        let item = parse_one(
            resolved.schema.format,
            &resolved.schema.schema_text,
            &dependencies,
        )?;
        parsed.insert(
            (
                resolved.reference.subject.clone(),
                resolved.reference.version,
            ),
            item,
        );
    }
    let dependencies = named_dependencies(references, &parsed)?;
    parse_one(format, text, &dependencies)
}

/// Parse and fingerprint in one step.
pub fn canonicalize(
    format: SchemaFormat,
    text: &str,
    references: &[SchemaReference],
    closure: &[ResolvedReference],
) -> Result<(ParsedSchema, String, Fingerprint)> {
    let parsed = parse_with_closure(format, text, references, closure)?;
    let canonical = parsed.canonical_form();
    let fingerprint = Fingerprint::compute(format, canonical.as_bytes(), references);
    Ok((parsed, canonical, fingerprint))
}

/// Reader/writer compatibility across the format boundary.
///
/// A format change is never compatible; within one format the check is
/// delegated to that format's checker.
pub fn check(reader: &ParsedSchema, writer: &ParsedSchema) -> CheckResult {
    match (reader, writer) {
        (ParsedSchema::Avro(r), ParsedSchema::Avro(w)) => schemata_avro::check(r, w),
        (ParsedSchema::Json(r), ParsedSchema::Json(w)) => schemata_json::check(r, w),
        (ParsedSchema::Protobuf(r), ParsedSchema::Protobuf(w)) => schemata_proto::check(r, w),
        (reader, writer) => CheckResult::Incompatible {
            messages: vec![format!(
                "schema type changed from {} to {}",
                writer.format(),
                reader.format()
            )],
        },
    }
}

fn named_dependencies<'r, 'p>(
    references: &'r [SchemaReference],
    parsed: &'p HashMap<(String, u32), ParsedSchema>,
) -> Result<Vec<(&'r str, &'p ParsedSchema)>> {
    let mut out = Vec::with_capacity(references.len());
    for reference in references {
        let key = (reference.subject.clone(), reference.version);
        // The closure is in dependency order, so a miss here is a
        // resolver bug rather than user input.
        let schema = parsed
            .get(&key)
            .ok_or_else(|| RegistryError::MissingReference {
                name: reference.name.clone(),
                subject: reference.subject.clone(),
                version: reference.version,
            })?;
        out.push((reference.name.as_str(), schema));
    }
    Ok(out)
}

fn parse_one(
    format: SchemaFormat,
    text: &str,
    dependencies: &[(&str, &ParsedSchema)],
) -> Result<ParsedSchema> {
    match format {
        SchemaFormat::Avro => {
            let deps: Vec<&schemata_avro::AvroSchema> = dependencies
                .iter()
                .map(|(_, schema)| match schema {
                    ParsedSchema::Avro(avro) => Ok(avro),
                    other => Err(format_mismatch(format, other.format())),
                })
                .collect::<Result<Vec<_>>>()?;
            let parsed = schemata_avro::parse_with_dependencies(text, &deps)
                .map_err(|e| RegistryError::InvalidSchema(e.to_string()))?;
            Ok(ParsedSchema::Avro(parsed))
        }
        SchemaFormat::Json => {
            let deps: Vec<(&str, &schemata_json::JsonSchema)> = dependencies
                .iter()
                .map(|(name, schema)| match schema {
                    ParsedSchema::Json(json) => Ok((*name, json)),
                    other => Err(format_mismatch(format, other.format())),
                })
                .collect::<Result<Vec<_>>>()?;
            let parsed = schemata_json::JsonSchema::parse_with_dependencies(text, &deps)
                .map_err(|e| RegistryError::InvalidSchema(e.to_string()))?;
            Ok(ParsedSchema::Json(parsed))
        }
        SchemaFormat::Protobuf => {
            let deps: Vec<&schemata_proto::ProtoSchema> = dependencies
                .iter()
                .map(|(_, schema)| match schema {
                    ParsedSchema::Protobuf(proto) => Ok(proto),
                    other => Err(format_mismatch(format, other.format())),
                })
                .collect::<Result<Vec<_>>>()?;
            let parsed = schemata_proto::parse_with_dependencies(text, &deps)
                .map_err(|e| RegistryError::InvalidSchema(e.to_string()))?;
            Ok(ParsedSchema::Protobuf(parsed))
        }
    }
}

fn format_mismatch(expected: SchemaFormat, found: SchemaFormat) -> RegistryError {
    RegistryError::InvalidSchema(format!(
        "referenced schema is {found}, expected {expected}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_failures_classify_as_invalid_schema() {
        let err = parse_with_closure(SchemaFormat::Avro, "{", &[], &[]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema(_)));
        let err = parse_with_closure(SchemaFormat::Protobuf, "message {", &[], &[]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema(_)));
    }

    #[test]
    fn canonicalize_is_stable_across_formatting() {
        let (_, canonical_a, fp_a) = canonicalize(
            SchemaFormat::Json,
            r#"{"type":"string","title":"x"}"#,
            &[],
            &[],
        )
        .unwrap();
        let (_, canonical_b, fp_b) =
            canonicalize(SchemaFormat::Json, r#"{ "type" : "string" }"#, &[], &[]).unwrap();
        assert_eq!(canonical_a, canonical_b);
        assert_eq!(fp_a, fp_b);
    }

    #[test]
    fn cross_format_check_is_incompatible() {
        let avro = parse_with_closure(SchemaFormat::Avro, r#""string""#, &[], &[]).unwrap();
        let json = parse_with_closure(SchemaFormat::Json, r#"{"type":"string"}"#, &[], &[]).unwrap();
        let result = check(&avro, &json);
        assert!(!result.is_compatible());
        assert!(result.messages()[0].contains("schema type changed"));
    }
}
