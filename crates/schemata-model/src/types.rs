//! Core vocabulary shared by every registry component.
//!
//! The types here mirror the Confluent wire surface: formats, the seven
//! compatibility levels, operational modes and schema references all
//! serialize to the exact strings the HTTP contract uses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Serialization format of a registered schema.
///
/// The registry stores schemas for three formats. When a registration
/// request omits the format, `AVRO` is assumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaFormat {
    /// Apache Avro (JSON schema declaration).
    #[default]
    #[serde(rename = "AVRO")]
    Avro,

    /// JSON Schema (draft-07 or draft 2020-12).
    #[serde(rename = "JSON")]
    Json,

    /// Protocol Buffers (`.proto` text, proto2 or proto3).
    #[serde(rename = "PROTOBUF")]
    Protobuf,
}

impl SchemaFormat {
    /// All formats the registry understands, in the order the
    /// `/schemas/types` listing reports them.
    pub const ALL: [SchemaFormat; 3] = [
        SchemaFormat::Avro,
        SchemaFormat::Protobuf,
        SchemaFormat::Json,
    ];

    /// The wire name of the format (`AVRO`, `JSON`, `PROTOBUF`).
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaFormat::Avro => "AVRO",
            SchemaFormat::Json => "JSON",
            SchemaFormat::Protobuf => "PROTOBUF",
        }
    }
}

impl fmt::Display for SchemaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaFormat {
    type Err = crate::error::RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVRO" => Ok(SchemaFormat::Avro),
            "JSON" => Ok(SchemaFormat::Json),
            "PROTOBUF" => Ok(SchemaFormat::Protobuf),
            other => Err(crate::error::RegistryError::UnsupportedSchemaType(
                other.to_string(),
            )),
        }
    }
}

/// Compatibility policy controlling permitted schema evolution.
///
/// `BACKWARD` variants constrain new readers against old writers,
/// `FORWARD` variants the reverse, and `FULL` both. The `_TRANSITIVE`
/// variants apply the same directional check against every live
/// historical version instead of only the latest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompatibilityLevel {
    /// No compatibility checking.
    #[serde(rename = "NONE")]
    None,

    /// New schema can read data written with the latest schema.
    #[default]
    #[serde(rename = "BACKWARD")]
    Backward,

    /// New schema can read data written with every live schema.
    #[serde(rename = "BACKWARD_TRANSITIVE")]
    BackwardTransitive,

    /// Latest schema can read data written with the new schema.
    #[serde(rename = "FORWARD")]
    Forward,

    /// Every live schema can read data written with the new schema.
    #[serde(rename = "FORWARD_TRANSITIVE")]
    ForwardTransitive,

    /// Both backward and forward against the latest schema.
    #[serde(rename = "FULL")]
    Full,

    /// Both backward and forward against every live schema.
    #[serde(rename = "FULL_TRANSITIVE")]
    FullTransitive,
}

impl CompatibilityLevel {
    /// Whether the level checks against all live versions rather than
    /// only the latest.
    pub fn is_transitive(&self) -> bool {
        matches!(
            self,
            CompatibilityLevel::BackwardTransitive
                | CompatibilityLevel::ForwardTransitive
                | CompatibilityLevel::FullTransitive
        )
    }

    /// Whether the new schema acts as reader (backward direction).
    pub fn checks_backward(&self) -> bool {
        matches!(
            self,
            CompatibilityLevel::Backward
                | CompatibilityLevel::BackwardTransitive
                | CompatibilityLevel::Full
                | CompatibilityLevel::FullTransitive
        )
    }

    /// Whether the old schema acts as reader (forward direction).
    pub fn checks_forward(&self) -> bool {
        matches!(
            self,
            CompatibilityLevel::Forward
                | CompatibilityLevel::ForwardTransitive
                | CompatibilityLevel::Full
                | CompatibilityLevel::FullTransitive
        )
    }

    /// The wire name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompatibilityLevel::None => "NONE",
            CompatibilityLevel::Backward => "BACKWARD",
            CompatibilityLevel::BackwardTransitive => "BACKWARD_TRANSITIVE",
            CompatibilityLevel::Forward => "FORWARD",
            CompatibilityLevel::ForwardTransitive => "FORWARD_TRANSITIVE",
            CompatibilityLevel::Full => "FULL",
            CompatibilityLevel::FullTransitive => "FULL_TRANSITIVE",
        }
    }
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompatibilityLevel {
    type Err = crate::error::RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(CompatibilityLevel::None),
            "BACKWARD" => Ok(CompatibilityLevel::Backward),
            "BACKWARD_TRANSITIVE" => Ok(CompatibilityLevel::BackwardTransitive),
            "FORWARD" => Ok(CompatibilityLevel::Forward),
            "FORWARD_TRANSITIVE" => Ok(CompatibilityLevel::ForwardTransitive),
            "FULL" => Ok(CompatibilityLevel::Full),
            "FULL_TRANSITIVE" => Ok(CompatibilityLevel::FullTransitive),
            other => Err(crate::error::RegistryError::InvalidCompatibilityLevel(
                other.to_string(),
            )),
        }
    }
}

/// Operational mode gating mutating registry calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Normal operation: registration and deletion allowed.
    #[default]
    #[serde(rename = "READWRITE")]
    ReadWrite,

    /// All mutating calls are rejected.
    #[serde(rename = "READONLY")]
    ReadOnly,

    /// Registration with caller-supplied ids and versions; policy
    /// checks are bypassed.
    #[serde(rename = "IMPORT")]
    Import,
}

impl Mode {
    /// The wire name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::ReadWrite => "READWRITE",
            Mode::ReadOnly => "READONLY",
            Mode::Import => "IMPORT",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = crate::error::RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "READWRITE" => Ok(Mode::ReadWrite),
            "READONLY" => Ok(Mode::ReadOnly),
            "IMPORT" => Ok(Mode::Import),
            other => Err(crate::error::RegistryError::InvalidMode(other.to_string())),
        }
    }
}

/// A named edge from a schema to a concrete subject version.
///
/// References are resolved within the context of the referring subject.
/// The `name` is the identifier the schema text uses to pull the
/// dependency in (an Avro fullname, a JSON `$ref` target, a proto
/// import path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaReference {
    /// Identifier used inside the referring schema text.
    pub name: String,

    /// Subject the referenced schema lives under (same context).
    pub subject: String,

    /// Version of the referenced subject.
    pub version: u32,
}

impl SchemaReference {
    pub fn new(name: impl Into<String>, subject: impl Into<String>, version: u32) -> Self {
        SchemaReference {
            name: name.into(),
            subject: subject.into(),
            version,
        }
    }
}

/// Outcome of a single reader/writer compatibility check.
///
/// Checkers are pure functions over parsed schema models; an
/// incompatible outcome always carries at least one ordered
/// human-readable message naming the decision point that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    /// Every instance the writer produces is readable by the reader.
    Compatible,

    /// At least one decision point failed.
    Incompatible {
        /// One message per incompatible decision point, in discovery order.
        messages: Vec<String>,
    },
}

impl CheckResult {
    /// Build a result from collected incompatibility messages.
    pub fn from_messages(messages: Vec<String>) -> Self {
        if messages.is_empty() {
            CheckResult::Compatible
        } else {
            CheckResult::Incompatible { messages }
        }
    }

    pub fn is_compatible(&self) -> bool {
        matches!(self, CheckResult::Compatible)
    }

    /// The diagnostic messages, empty when compatible.
    pub fn messages(&self) -> &[String] {
        match self {
            CheckResult::Compatible => &[],
            CheckResult::Incompatible { messages } => messages,
        }
    }

    /// Fold another result into this one, concatenating messages.
    pub fn merge(self, other: CheckResult) -> CheckResult {
        let mut messages = self.messages().to_vec();
        messages.extend(other.messages().iter().cloned());
        CheckResult::from_messages(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_round_trips_through_wire_names() {
        for format in SchemaFormat::ALL {
            assert_eq!(format.as_str().parse::<SchemaFormat>().unwrap(), format);
        }
        assert!("THRIFT".parse::<SchemaFormat>().is_err());
    }

    #[test]
    fn default_format_is_avro() {
        assert_eq!(SchemaFormat::default(), SchemaFormat::Avro);
    }

    #[test]
    fn level_direction_helpers() {
        assert!(CompatibilityLevel::Backward.checks_backward());
        assert!(!CompatibilityLevel::Backward.checks_forward());
        assert!(CompatibilityLevel::Forward.checks_forward());
        assert!(CompatibilityLevel::Full.checks_backward());
        assert!(CompatibilityLevel::Full.checks_forward());
        assert!(CompatibilityLevel::FullTransitive.is_transitive());
        assert!(!CompatibilityLevel::Full.is_transitive());
    }

    #[test]
    fn level_serializes_to_screaming_snake() {
        let json = serde_json::to_string(&CompatibilityLevel::BackwardTransitive).unwrap();
        assert_eq!(json, "\"BACKWARD_TRANSITIVE\"");
    }

    #[test]
    fn check_result_merge_concatenates_messages() {
        let a = CheckResult::from_messages(vec!["first".into()]);
        let b = CheckResult::from_messages(vec!["second".into()]);
        let merged = a.merge(b);
        assert_eq!(merged.messages(), ["first", "second"]);

        let ok = CheckResult::Compatible.merge(CheckResult::Compatible);
        assert!(ok.is_compatible());
    }
}
