//! # Schemata Avro
//!
//! Avro support for the Schemata registry: parsing schema JSON into a
//! named-type model, rendering the canonical form the fingerprint is
//! computed over, and the reader/writer compatibility check.

pub mod canonical;
pub mod compat;
pub mod parse;
pub mod schema;

pub use canonical::canonical_form;
pub use compat::check;
pub use parse::{parse, parse_with_dependencies, AvroParseError};
pub use schema::{AvroSchema, AvroType, EnumType, FixedType, Name, RecordField, RecordType};
