//! # Schemata Model
//!
//! Shared vocabulary of the Schemata schema registry: formats,
//! compatibility levels, modes, qualified subjects, references, content
//! fingerprints, wire-shape records and the error taxonomy.
//!
//! Everything here is transport-agnostic. Format crates parse and
//! compare schemas, the store keeps them, the core orchestrates; all of
//! them speak in these types.

pub mod api;
pub mod error;
pub mod fingerprint;
pub mod subject;
pub mod types;

pub use api::{
    CompatibilityCheckResponse, ConfigRequest, ConfigResponse, ModeBody, RegisterSchemaRequest,
    RegisterSchemaResponse, SchemaByIdResponse, SchemaListEntry, SchemaVersionResponse,
    SubjectVersionPair,
};
pub use error::{ErrorPayload, RegistryError, Result};
pub use fingerprint::Fingerprint;
pub use subject::{validate_context_name, QualifiedSubject, DEFAULT_CONTEXT};
pub use types::{CheckResult, CompatibilityLevel, Mode, SchemaFormat, SchemaReference};
