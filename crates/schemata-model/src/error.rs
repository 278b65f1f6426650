//! Error taxonomy for registry operations.
//!
//! Every failure a public operation can surface is one of these kinds.
//! Each kind maps to an HTTP status and a Confluent-style numeric error
//! code so a transport can render the wire payload without inspecting
//! variants.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure kinds surfaced by registry operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Schema text failed to parse for the declared format.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// The `schemaType` value is not one the registry supports.
    #[error("Unsupported schema type: {0}")]
    UnsupportedSchemaType(String),

    /// A reference named a subject version that does not exist in the
    /// request context.
    #[error("Invalid schema: reference '{name}' to subject '{subject}' version {version} could not be resolved")]
    MissingReference {
        name: String,
        subject: String,
        version: u32,
    },

    /// The reference graph contains a cycle.
    #[error("Invalid schema: reference cycle through subject '{subject}'")]
    ReferenceCycle { subject: String },

    /// The proposed schema violates the effective compatibility policy.
    #[error("Schema being registered is incompatible with an earlier schema")]
    IncompatibleSchema { messages: Vec<String> },

    /// The effective mode does not permit this operation.
    #[error("Subject '{subject}' is in {mode} mode; {operation} is not permitted")]
    ModeForbidsOperation {
        subject: String,
        mode: String,
        operation: String,
    },

    /// Deletion is blocked because a live schema still references the
    /// target.
    #[error("One or more references exist to the schema {subject} version {version}")]
    ReferenceExists { subject: String, version: u32 },

    /// Import supplied an id already bound to a different schema.
    #[error("Overwrite new schema with id {id} is not permitted")]
    IdConflict { id: i32 },

    /// Import supplied a subject version already bound to a different
    /// schema.
    #[error("Version {version} of subject '{subject}' is already registered with a different schema")]
    VersionConflict { subject: String, version: u32 },

    /// Subject does not exist (or is soft-deleted and the call did not
    /// ask for deleted entries).
    #[error("Subject '{0}' not found")]
    SubjectNotFound(String),

    /// Version does not exist under the subject.
    #[error("Version {version} not found for subject '{subject}'")]
    VersionNotFound { subject: String, version: u32 },

    /// No schema carries the given id.
    #[error("Schema {0} not found")]
    SchemaNotFound(i32),

    /// Lookup found no live version of the subject with this schema.
    #[error("Schema not found for subject '{0}'")]
    SchemaNotRegistered(String),

    /// Permanent deletion requires a prior soft delete.
    #[error("Subject '{subject}' was not deleted first before being permanently deleted")]
    NotSoftDeleted { subject: String },

    /// Compatibility level string is not one of the seven values.
    #[error("Invalid compatibility level: {0}")]
    InvalidCompatibilityLevel(String),

    /// Mode string is not one of the three values.
    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    /// Qualified subject or context name failed validation.
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),

    /// Version selector was not a positive integer or `latest`.
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    /// Malformed request body.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The store failed; retried once internally before surfacing.
    #[error("Store error: {0}")]
    Store(String),
}

impl RegistryError {
    /// Confluent-style numeric error code carried in the wire payload.
    pub fn error_code(&self) -> u32 {
        match self {
            RegistryError::SubjectNotFound(_) => 40401,
            RegistryError::VersionNotFound { .. } => 40402,
            RegistryError::SchemaNotFound(_) | RegistryError::SchemaNotRegistered(_) => 40403,
            RegistryError::NotSoftDeleted { .. } => 40405,
            RegistryError::IncompatibleSchema { .. } => 409,
            RegistryError::InvalidSchema(_)
            | RegistryError::UnsupportedSchemaType(_)
            | RegistryError::MissingReference { .. }
            | RegistryError::ReferenceCycle { .. }
            | RegistryError::InvalidSubject(_) => 42201,
            RegistryError::InvalidVersion(_) => 42202,
            RegistryError::InvalidCompatibilityLevel(_) => 42203,
            RegistryError::InvalidMode(_) => 42204,
            RegistryError::ModeForbidsOperation { .. } => 42205,
            RegistryError::ReferenceExists { .. } => 42206,
            RegistryError::IdConflict { .. } | RegistryError::VersionConflict { .. } => 42207,
            RegistryError::BadRequest(_) => 400,
            RegistryError::Store(_) => 50001,
        }
    }

    /// HTTP status the transport should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            RegistryError::SubjectNotFound(_)
            | RegistryError::VersionNotFound { .. }
            | RegistryError::SchemaNotFound(_)
            | RegistryError::SchemaNotRegistered(_)
            | RegistryError::NotSoftDeleted { .. } => 404,
            RegistryError::IncompatibleSchema { .. } => 409,
            RegistryError::BadRequest(_) => 400,
            RegistryError::Store(_) => 500,
            _ => 422,
        }
    }

    /// Wire payload for this error.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            error_code: self.error_code(),
            message: self.to_string(),
        }
    }
}

/// Body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error_code: u32,
    pub message: String,
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
