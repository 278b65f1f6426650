//! # Schemata JSON Schema
//!
//! JSON Schema support for the Schemata registry: draft-aware parsing
//! (draft-07 and draft 2020-12), canonical-form rendering for
//! fingerprints, and the instance-set compatibility check.

pub mod canonical;
pub mod compat;
pub mod schema;

pub use canonical::canonical_form;
pub use compat::check;
pub use schema::{Draft, JsonParseError, JsonSchema};
