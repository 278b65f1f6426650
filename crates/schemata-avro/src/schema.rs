//! In-memory Avro schema model.
//!
//! A parsed schema is a tree of [`AvroType`] nodes plus a registry of
//! named types by fullname. The first occurrence of a named type holds
//! its definition inline; later occurrences (including self-references
//! inside recursive records) are [`AvroType::Ref`] nodes that resolve
//! through the registry.

use std::collections::HashMap;
use std::fmt;

/// A possibly-namespaced Avro name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub name: String,
    pub namespace: Option<String>,
}

impl Name {
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Name {
            name: name.into(),
            namespace,
        }
    }

    /// Dotted fullname, e.g. `com.acme.Address`.
    pub fn fullname(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}.{}", self.name),
            _ => self.name.clone(),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fullname())
    }
}

/// One field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    /// Alternative names this field may be matched by on the reader side.
    pub aliases: Vec<String>,
    pub schema: AvroType,
    /// Default value in Avro JSON encoding, if declared.
    pub default: Option<serde_json::Value>,
}

/// A record definition.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub name: Name,
    /// Fullname aliases declared on the record.
    pub aliases: Vec<String>,
    pub fields: Vec<RecordField>,
}

/// An enum definition.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: Name,
    pub aliases: Vec<String>,
    pub symbols: Vec<String>,
    /// Symbol used when the writer wrote a symbol the reader lacks.
    pub default: Option<String>,
}

/// A fixed definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedType {
    pub name: Name,
    pub aliases: Vec<String>,
    pub size: u64,
}

/// One node of the schema tree.
#[derive(Debug, Clone, PartialEq)]
pub enum AvroType {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Array(Box<AvroType>),
    Map(Box<AvroType>),
    /// Ordered union branches; order is significant and preserved.
    Union(Vec<AvroType>),
    Record(RecordType),
    Enum(EnumType),
    Fixed(FixedType),
    /// Reference to a named type by fullname.
    Ref(String),
}

impl AvroType {
    /// Short describer used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            AvroType::Null => "null".to_string(),
            AvroType::Boolean => "boolean".to_string(),
            AvroType::Int => "int".to_string(),
            AvroType::Long => "long".to_string(),
            AvroType::Float => "float".to_string(),
            AvroType::Double => "double".to_string(),
            AvroType::Bytes => "bytes".to_string(),
            AvroType::String => "string".to_string(),
            AvroType::Array(_) => "array".to_string(),
            AvroType::Map(_) => "map".to_string(),
            AvroType::Union(branches) => format!("union of {} branches", branches.len()),
            AvroType::Record(r) => format!("record {}", r.name),
            AvroType::Enum(e) => format!("enum {}", e.name),
            AvroType::Fixed(f) => format!("fixed {}", f.name),
            AvroType::Ref(name) => name.clone(),
        }
    }

    /// The fullname of a named type, if this node is one.
    pub fn fullname(&self) -> Option<String> {
        match self {
            AvroType::Record(r) => Some(r.name.fullname()),
            AvroType::Enum(e) => Some(e.name.fullname()),
            AvroType::Fixed(f) => Some(f.name.fullname()),
            AvroType::Ref(name) => Some(name.clone()),
            _ => None,
        }
    }
}

/// A fully parsed Avro schema document.
#[derive(Debug, Clone, PartialEq)]
pub struct AvroSchema {
    pub root: AvroType,
    /// Every named type in the document and its dependencies, by fullname.
    pub types: HashMap<String, AvroType>,
}

impl AvroSchema {
    /// Follow `Ref` nodes to the underlying definition.
    ///
    /// Returns the node unchanged when it is not a reference. Unknown
    /// references cannot occur in a successfully parsed document.
    pub fn resolve<'a>(&'a self, ty: &'a AvroType) -> &'a AvroType {
        match ty {
            AvroType::Ref(name) => self.types.get(name).unwrap_or(ty),
            other => other,
        }
    }
}
