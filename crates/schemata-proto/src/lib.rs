//! # Schemata Protobuf
//!
//! Protobuf support for the Schemata registry: `.proto` text parsing
//! into a descriptor model, the normalized form fingerprints are
//! computed over, and the wire-group compatibility check.

pub mod canonical;
pub mod compat;
pub mod model;
pub mod parse;

pub use canonical::canonical_form;
pub use compat::check;
pub use model::{
    Cardinality, EnumDescriptor, FieldDescriptor, FieldType, FileDescriptor, MessageDescriptor,
    MethodDescriptor, NamedType, ProtoSchema, ServiceDescriptor, Syntax,
};
pub use parse::{parse, parse_with_dependencies, ProtoParseError};
