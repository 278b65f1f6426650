//! # Schemata Core
//!
//! The schema-evolution engine: reference resolution, the seven-level
//! compatibility policy engine, and the [`SchemaRegistry`] facade that
//! orchestrates registration, lookup, compatibility checks, deletion
//! and config/mode administration over the format crates and the store.
//!
//! The engine is transport-free; an HTTP layer maps endpoints onto
//! [`SchemaRegistry`] methods one-to-one.

pub mod format;
pub mod policy;
pub mod resolver;
pub mod service;

pub use format::ParsedSchema;
pub use policy::HistoricalVersion;
pub use resolver::{resolve_references, ResolvedReference};
pub use service::SchemaRegistry;

pub use schemata_model::{
    CheckResult, CompatibilityLevel, Mode, QualifiedSubject, RegistryError, Result, SchemaFormat,
    SchemaReference,
};
pub use schemata_store::{MemoryStore, Page, SledStore, Store};
