//! Avro schema parsing.
//!
//! Schemas arrive as JSON text. Parsing goes through `serde_json` into
//! the [`AvroType`] tree, resolving names against the enclosing
//! namespace as it descends. Named types must be defined before use
//! within a document; types contributed by referenced schemas are seeded
//! into the name registry up front.

use crate::schema::{
    AvroSchema, AvroType, EnumType, FixedType, Name, RecordField, RecordType,
};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Any error that may happen when parsing a schema from JSON text.
#[derive(Debug, Error)]
pub enum AvroParseError {
    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown type reference '{0}'")]
    UnknownReference(String),

    #[error("duplicate definition of '{0}'")]
    DuplicateName(String),

    #[error("invalid name '{0}'")]
    InvalidName(String),

    #[error("invalid schema: {0}")]
    Invalid(String),
}

/// Parse a standalone schema document.
pub fn parse(text: &str) -> Result<AvroSchema, AvroParseError> {
    parse_with_dependencies(text, &[])
}

/// Parse a schema document whose text refers to named types defined by
/// already-parsed dependency schemas.
pub fn parse_with_dependencies(
    text: &str,
    dependencies: &[&AvroSchema],
) -> Result<AvroSchema, AvroParseError> {
    let value: Value = serde_json::from_str(text)?;

    let mut parser = Parser {
        types: HashMap::new(),
        unresolved: Vec::new(),
    };
    for dependency in dependencies {
        for (fullname, ty) in &dependency.types {
            parser.types.entry(fullname.clone()).or_insert_with(|| ty.clone());
        }
    }

    let root = parser.parse_node(&value, None)?;

    for name in &parser.unresolved {
        if !parser.types.contains_key(name) {
            return Err(AvroParseError::UnknownReference(name.clone()));
        }
    }

    Ok(AvroSchema {
        root,
        types: parser.types,
    })
}

struct Parser {
    types: HashMap<String, AvroType>,
    unresolved: Vec<String>,
}

impl Parser {
    fn parse_node(
        &mut self,
        value: &Value,
        enclosing_ns: Option<&str>,
    ) -> Result<AvroType, AvroParseError> {
        match value {
            Value::String(s) => self.parse_type_name(s, enclosing_ns),
            Value::Array(branches) => self.parse_union(branches, enclosing_ns),
            Value::Object(obj) => {
                let type_attr = obj
                    .get("type")
                    .ok_or_else(|| AvroParseError::Invalid("missing 'type' attribute".into()))?;
                match type_attr {
                    Value::String(t) => self.parse_complex(t, obj, enclosing_ns),
                    // `{"type": {...}}` and `{"type": [...]}` wrap another schema.
                    nested => self.parse_node(nested, enclosing_ns),
                }
            }
            other => Err(AvroParseError::Invalid(format!(
                "expected string, array or object, got {other}"
            ))),
        }
    }

    fn parse_type_name(
        &mut self,
        name: &str,
        enclosing_ns: Option<&str>,
    ) -> Result<AvroType, AvroParseError> {
        if let Some(primitive) = primitive(name) {
            return Ok(primitive);
        }
        // A non-primitive string is a reference to a named type,
        // resolved against the enclosing namespace.
        let qualified = qualify(name, enclosing_ns);
        if self.types.contains_key(&qualified) {
            return Ok(AvroType::Ref(qualified));
        }
        if !name.contains('.') && self.types.contains_key(name) {
            return Ok(AvroType::Ref(name.to_string()));
        }
        self.unresolved.push(qualified.clone());
        Ok(AvroType::Ref(qualified))
    }

    fn parse_union(
        &mut self,
        branches: &[Value],
        enclosing_ns: Option<&str>,
    ) -> Result<AvroType, AvroParseError> {
        let mut parsed = Vec::with_capacity(branches.len());
        for branch in branches {
            let ty = self.parse_node(branch, enclosing_ns)?;
            if matches!(ty, AvroType::Union(_)) {
                return Err(AvroParseError::Invalid(
                    "unions may not immediately contain other unions".into(),
                ));
            }
            parsed.push(ty);
        }
        Ok(AvroType::Union(parsed))
    }

    fn parse_complex(
        &mut self,
        type_name: &str,
        obj: &serde_json::Map<String, Value>,
        enclosing_ns: Option<&str>,
    ) -> Result<AvroType, AvroParseError> {
        match type_name {
            "record" | "error" => self.parse_record(obj, enclosing_ns),
            "enum" => self.parse_enum(obj, enclosing_ns),
            "fixed" => self.parse_fixed(obj, enclosing_ns),
            "array" => {
                let items = obj
                    .get("items")
                    .ok_or_else(|| AvroParseError::Invalid("array without 'items'".into()))?;
                Ok(AvroType::Array(Box::new(
                    self.parse_node(items, enclosing_ns)?,
                )))
            }
            "map" => {
                let values = obj
                    .get("values")
                    .ok_or_else(|| AvroParseError::Invalid("map without 'values'".into()))?;
                Ok(AvroType::Map(Box::new(
                    self.parse_node(values, enclosing_ns)?,
                )))
            }
            // `{"type": "long", "logicalType": "timestamp-millis"}` and
            // friends compare by their underlying type.
            other => self.parse_type_name(other, enclosing_ns),
        }
    }

    fn parse_record(
        &mut self,
        obj: &serde_json::Map<String, Value>,
        enclosing_ns: Option<&str>,
    ) -> Result<AvroType, AvroParseError> {
        let name = self.declared_name(obj, enclosing_ns)?;
        let fullname = name.fullname();
        self.register_placeholder(&fullname)?;
        let ns = name.namespace.clone();
        let aliases = alias_list(obj, ns.as_deref())?;

        let fields_attr = obj
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| AvroParseError::Invalid(format!("record {fullname} without fields")))?;

        let mut fields = Vec::with_capacity(fields_attr.len());
        for field in fields_attr {
            let field = field
                .as_object()
                .ok_or_else(|| AvroParseError::Invalid("record field must be an object".into()))?;
            let field_name = field
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| AvroParseError::Invalid("record field without name".into()))?;
            let schema_attr = field.get("type").ok_or_else(|| {
                AvroParseError::Invalid(format!("field '{field_name}' without type"))
            })?;
            let schema = self.parse_node(schema_attr, ns.as_deref())?;
            let field_aliases = match field.get("aliases") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(|v| {
                        v.as_str().map(str::to_string).ok_or_else(|| {
                            AvroParseError::Invalid("field alias must be a string".into())
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                _ => Vec::new(),
            };
            fields.push(RecordField {
                name: field_name.to_string(),
                aliases: field_aliases,
                schema,
                default: field.get("default").cloned(),
            });
        }

        let record = AvroType::Record(RecordType {
            name,
            aliases,
            fields,
        });
        self.types.insert(fullname, record.clone());
        Ok(record)
    }

    fn parse_enum(
        &mut self,
        obj: &serde_json::Map<String, Value>,
        enclosing_ns: Option<&str>,
    ) -> Result<AvroType, AvroParseError> {
        let name = self.declared_name(obj, enclosing_ns)?;
        let fullname = name.fullname();
        self.register_placeholder(&fullname)?;
        let aliases = alias_list(obj, name.namespace.as_deref())?;

        let symbols = obj
            .get("symbols")
            .and_then(Value::as_array)
            .ok_or_else(|| AvroParseError::Invalid(format!("enum {fullname} without symbols")))?
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| AvroParseError::Invalid("enum symbol must be a string".into()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let default = obj.get("default").and_then(Value::as_str).map(str::to_string);

        let parsed = AvroType::Enum(EnumType {
            name,
            aliases,
            symbols,
            default,
        });
        self.types.insert(fullname, parsed.clone());
        Ok(parsed)
    }

    fn parse_fixed(
        &mut self,
        obj: &serde_json::Map<String, Value>,
        enclosing_ns: Option<&str>,
    ) -> Result<AvroType, AvroParseError> {
        let name = self.declared_name(obj, enclosing_ns)?;
        let fullname = name.fullname();
        self.register_placeholder(&fullname)?;
        let aliases = alias_list(obj, name.namespace.as_deref())?;

        let size = obj
            .get("size")
            .and_then(Value::as_u64)
            .ok_or_else(|| AvroParseError::Invalid(format!("fixed {fullname} without size")))?;

        let parsed = AvroType::Fixed(FixedType {
            name,
            aliases,
            size,
        });
        self.types.insert(fullname, parsed.clone());
        Ok(parsed)
    }

    fn declared_name(
        &self,
        obj: &serde_json::Map<String, Value>,
        enclosing_ns: Option<&str>,
    ) -> Result<Name, AvroParseError> {
        let raw = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AvroParseError::Invalid("named type without 'name'".into()))?;

        // A dotted name carries its own namespace and ignores both the
        // `namespace` attribute and the enclosing namespace.
        if let Some(split) = raw.rfind('.') {
            let (ns, simple) = raw.split_at(split);
            validate_simple_name(simple.trim_start_matches('.'))?;
            return Ok(Name::new(
                simple.trim_start_matches('.'),
                Some(ns.to_string()),
            ));
        }

        validate_simple_name(raw)?;
        let namespace = obj
            .get("namespace")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| enclosing_ns.map(str::to_string));
        Ok(Name::new(raw, namespace))
    }

    fn register_placeholder(&mut self, fullname: &str) -> Result<(), AvroParseError> {
        // Registered before the body parses so recursive references
        // inside the definition resolve to this name.
        if self
            .types
            .insert(fullname.to_string(), AvroType::Ref(fullname.to_string()))
            .is_some()
        {
            return Err(AvroParseError::DuplicateName(fullname.to_string()));
        }
        Ok(())
    }
}

fn primitive(name: &str) -> Option<AvroType> {
    match name {
        "null" => Some(AvroType::Null),
        "boolean" => Some(AvroType::Boolean),
        "int" => Some(AvroType::Int),
        "long" => Some(AvroType::Long),
        "float" => Some(AvroType::Float),
        "double" => Some(AvroType::Double),
        "bytes" => Some(AvroType::Bytes),
        "string" => Some(AvroType::String),
        _ => None,
    }
}

fn qualify(name: &str, enclosing_ns: Option<&str>) -> String {
    if name.contains('.') {
        return name.to_string();
    }
    match enclosing_ns {
        Some(ns) if !ns.is_empty() => format!("{ns}.{name}"),
        _ => name.to_string(),
    }
}

fn alias_list(
    obj: &serde_json::Map<String, Value>,
    namespace: Option<&str>,
) -> Result<Vec<String>, AvroParseError> {
    match obj.get("aliases") {
        None => Ok(Vec::new()),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| {
                v.as_str()
                    .map(|alias| qualify(alias, namespace))
                    .ok_or_else(|| AvroParseError::Invalid("alias must be a string".into()))
            })
            .collect(),
        Some(_) => Err(AvroParseError::Invalid("'aliases' must be an array".into())),
    }
}

fn validate_simple_name(name: &str) -> Result<(), AvroParseError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AvroParseError::InvalidName(name.to_string()))
    }
}
