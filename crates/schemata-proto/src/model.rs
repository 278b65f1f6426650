//! Protobuf descriptor model.
//!
//! A `.proto` file parses into a [`FileDescriptor`] tree. Field numbers
//! drive identity; names matter only for nested-type resolution and
//! diagnostics.

use std::collections::BTreeMap;

/// Protobuf language edition of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Syntax {
    Proto2,
    #[default]
    Proto3,
}

impl Syntax {
    pub fn as_str(&self) -> &'static str {
        match self {
            Syntax::Proto2 => "proto2",
            Syntax::Proto3 => "proto3",
        }
    }
}

/// Field cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Plain proto3 field (or proto2 without a label keyword).
    Singular,
    /// Explicit `optional`.
    Optional,
    /// Proto2 `required`.
    Required,
    /// `repeated`.
    Repeated,
}

impl Cardinality {
    pub fn is_repeated(&self) -> bool {
        matches!(self, Cardinality::Repeated)
    }
}

/// Scalar and composite field types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    /// Message or enum type by written name (possibly relative).
    Named(String),
    /// `map<key, value>`.
    Map(Box<FieldType>, Box<FieldType>),
}

impl FieldType {
    /// The type name as written in `.proto` text.
    pub fn render(&self) -> String {
        match self {
            FieldType::Double => "double".to_string(),
            FieldType::Float => "float".to_string(),
            FieldType::Int32 => "int32".to_string(),
            FieldType::Int64 => "int64".to_string(),
            FieldType::Uint32 => "uint32".to_string(),
            FieldType::Uint64 => "uint64".to_string(),
            FieldType::Sint32 => "sint32".to_string(),
            FieldType::Sint64 => "sint64".to_string(),
            FieldType::Fixed32 => "fixed32".to_string(),
            FieldType::Fixed64 => "fixed64".to_string(),
            FieldType::Sfixed32 => "sfixed32".to_string(),
            FieldType::Sfixed64 => "sfixed64".to_string(),
            FieldType::Bool => "bool".to_string(),
            FieldType::String => "string".to_string(),
            FieldType::Bytes => "bytes".to_string(),
            FieldType::Named(name) => name.clone(),
            FieldType::Map(key, value) => format!("map<{}, {}>", key.render(), value.render()),
        }
    }
}

/// One field of a message (map entries included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub number: i32,
    pub cardinality: Cardinality,
    pub ty: FieldType,
    /// Name of the containing `oneof`, when the field is a branch.
    pub oneof: Option<String>,
}

/// A message definition with its nested types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub oneofs: Vec<String>,
    pub nested_messages: Vec<MessageDescriptor>,
    pub nested_enums: Vec<EnumDescriptor>,
    /// Inclusive reserved number ranges.
    pub reserved_numbers: Vec<(i32, i32)>,
    pub reserved_names: Vec<String>,
}

impl MessageDescriptor {
    pub fn field_by_number(&self, number: i32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.number == number)
    }

    pub fn reserves_number(&self, number: i32) -> bool {
        self.reserved_numbers
            .iter()
            .any(|(low, high)| (*low..=*high).contains(&number))
    }
}

/// An enum definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub name: String,
    /// `(symbol, number)` pairs in declaration order.
    pub values: Vec<(String, i32)>,
    pub reserved_numbers: Vec<(i32, i32)>,
    pub reserved_names: Vec<String>,
}

impl EnumDescriptor {
    pub fn value_by_number(&self, number: i32) -> Option<&(String, i32)> {
        self.values.iter().find(|(_, n)| *n == number)
    }
}

/// An rpc method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub input: String,
    pub output: String,
    pub client_streaming: bool,
    pub server_streaming: bool,
}

/// A service definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub methods: Vec<MethodDescriptor>,
}

impl ServiceDescriptor {
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|method| method.name == name)
    }
}

/// A parsed `.proto` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDescriptor {
    pub syntax: Syntax,
    pub package: Option<String>,
    pub imports: Vec<String>,
    pub messages: Vec<MessageDescriptor>,
    pub enums: Vec<EnumDescriptor>,
    pub services: Vec<ServiceDescriptor>,
}

/// A named type visible to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamedType {
    Message(MessageDescriptor),
    Enum(EnumDescriptor),
}

/// A parsed schema with its visible type universe (own definitions plus
/// those of referenced schemas).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoSchema {
    pub file: FileDescriptor,
    /// Fully qualified name → definition, own types and dependencies.
    pub types: BTreeMap<String, NamedType>,
}

impl ProtoSchema {
    /// Resolve a written type name from inside `scope` (a fully
    /// qualified message name or the package) to a defined type.
    ///
    /// Protobuf scoping: a leading dot is absolute; otherwise the name
    /// is tried against each enclosing scope from innermost outward,
    /// then bare.
    pub fn resolve(&self, scope: &str, name: &str) -> Option<(String, &NamedType)> {
        if let Some(absolute) = name.strip_prefix('.') {
            return self
                .types
                .get(absolute)
                .map(|ty| (absolute.to_string(), ty));
        }
        let mut prefix = scope;
        loop {
            let candidate = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}.{name}")
            };
            if let Some(ty) = self.types.get(&candidate) {
                return Some((candidate, ty));
            }
            match prefix.rfind('.') {
                Some(idx) => prefix = &prefix[..idx],
                None if !prefix.is_empty() => prefix = "",
                None => return None,
            }
        }
    }

    /// Fully qualified names of the messages defined in this file
    /// (dependencies excluded), with their descriptors.
    pub fn own_messages(&self) -> BTreeMap<String, &MessageDescriptor> {
        let mut out = BTreeMap::new();
        let prefix = self.file.package.clone().unwrap_or_default();
        for message in &self.file.messages {
            collect_messages(&prefix, message, &mut out);
        }
        out
    }

    /// Fully qualified names of the enums defined in this file.
    pub fn own_enums(&self) -> BTreeMap<String, &EnumDescriptor> {
        let mut out = BTreeMap::new();
        let prefix = self.file.package.clone().unwrap_or_default();
        for parsed in &self.file.enums {
            out.insert(qualify(&prefix, &parsed.name), parsed);
        }
        let mut stack: Vec<(String, &MessageDescriptor)> = self
            .file
            .messages
            .iter()
            .map(|m| (qualify(&prefix, &m.name), m))
            .collect();
        while let Some((fqn, message)) = stack.pop() {
            for parsed in &message.nested_enums {
                out.insert(qualify(&fqn, &parsed.name), parsed);
            }
            for nested in &message.nested_messages {
                stack.push((qualify(&fqn, &nested.name), nested));
            }
        }
        out
    }

    /// Fully qualified names of the services defined in this file.
    pub fn own_services(&self) -> BTreeMap<String, &ServiceDescriptor> {
        let prefix = self.file.package.clone().unwrap_or_default();
        self.file
            .services
            .iter()
            .map(|service| (qualify(&prefix, &service.name), service))
            .collect()
    }
}

fn collect_messages<'a>(
    prefix: &str,
    message: &'a MessageDescriptor,
    out: &mut BTreeMap<String, &'a MessageDescriptor>,
) {
    let fqn = qualify(prefix, &message.name);
    for nested in &message.nested_messages {
        collect_messages(&fqn, nested, out);
    }
    out.insert(fqn, message);
}

pub(crate) fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
