//! Wire-shape request and response records.
//!
//! Registration payloads are nominally free-form JSON; these records pin
//! the accepted shape explicitly, with optional fields for `id`,
//! `version`, `schemaType` and `references`. Field names follow the
//! Confluent surface (camelCase except where the contract says
//! otherwise, e.g. `is_compatible`).

use crate::types::{CompatibilityLevel, Mode, SchemaFormat, SchemaReference};
use serde::{Deserialize, Serialize};

/// Body of `POST /subjects/{subject}/versions` and `POST /subjects/{subject}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSchemaRequest {
    /// Schema text in the declared format.
    pub schema: String,

    /// Format of `schema`; `AVRO` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaFormat>,

    /// Named references to other subject versions in the same context.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SchemaReference>,

    /// Caller-supplied schema id; only accepted in `IMPORT` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,

    /// Caller-supplied version; only accepted in `IMPORT` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl RegisterSchemaRequest {
    /// Minimal request carrying only schema text in the given format.
    pub fn new(schema: impl Into<String>, schema_type: SchemaFormat) -> Self {
        RegisterSchemaRequest {
            schema: schema.into(),
            schema_type: Some(schema_type),
            references: Vec::new(),
            id: None,
            version: None,
        }
    }

    /// Effective format of the payload (`AVRO` when omitted).
    pub fn format(&self) -> SchemaFormat {
        self.schema_type.unwrap_or_default()
    }
}

/// Response of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSchemaResponse {
    pub id: i32,
    pub version: u32,
}

/// A concrete subject version with its schema.
///
/// Returned by `GET /subjects/{subject}/versions/{v}` and by lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaVersionResponse {
    pub subject: String,
    pub version: u32,
    pub id: i32,
    pub schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaFormat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SchemaReference>,
}

/// A schema fetched by id via `GET /schemas/ids/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaByIdResponse {
    pub schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaFormat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SchemaReference>,
}

/// Entry of the `GET /schemas` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaListEntry {
    pub subject: String,
    pub version: u32,
    pub id: i32,
    pub schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaFormat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SchemaReference>,
}

/// A `(subject, version)` pair, as listed by `/schemas/ids/{id}/versions`
/// and `/subjects/{s}/versions/{v}/referencedby` callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectVersionPair {
    pub subject: String,
    pub version: u32,
}

/// Result of a compatibility check.
///
/// `messages` is present only when the caller asked for `verbose=true`
/// and the outcome was incompatible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityCheckResponse {
    pub is_compatible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<String>>,
}

/// Body of `PUT /config[/{subject}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRequest {
    pub compatibility: CompatibilityLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize: Option<bool>,
}

/// Response of `GET /config[/{subject}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub compatibility_level: CompatibilityLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize: Option<bool>,
}

/// Body and response of the `/mode` endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeBody {
    pub mode: Mode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_defaults() {
        let request: RegisterSchemaRequest =
            serde_json::from_str(r#"{"schema": "\"string\""}"#).unwrap();
        assert_eq!(request.format(), SchemaFormat::Avro);
        assert!(request.references.is_empty());
        assert!(request.id.is_none());
        assert!(request.version.is_none());
    }

    #[test]
    fn register_request_accepts_full_import_shape() {
        let request: RegisterSchemaRequest = serde_json::from_str(
            r#"{
                "schema": "{}",
                "schemaType": "JSON",
                "references": [{"name": "other.json", "subject": "other", "version": 2}],
                "id": 71023,
                "version": 3
            }"#,
        )
        .unwrap();
        assert_eq!(request.format(), SchemaFormat::Json);
        assert_eq!(request.references[0].version, 2);
        assert_eq!(request.id, Some(71023));
        assert_eq!(request.version, Some(3));
    }

    #[test]
    fn compat_response_omits_absent_messages() {
        let response = CompatibilityCheckResponse {
            is_compatible: true,
            messages: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"is_compatible":true}"#);
    }

    #[test]
    fn config_response_uses_compatibility_level_key() {
        let response = ConfigResponse {
            compatibility_level: CompatibilityLevel::Full,
            normalize: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"compatibilityLevel":"FULL"}"#);
    }
}
