//! Content fingerprints for deduplication.
//!
//! A schema's identity in the registry is its fingerprint: a SHA-256
//! digest over the format tag, the canonical schema bytes, and a
//! deterministic encoding of the reference list. Two registrations with
//! equal fingerprints always resolve to the same schema id, regardless
//! of subject or context.
//!
//! The reference list participates in the digest because a schema text
//! that pulls in `Address` version 1 is not the same schema as one that
//! pulls in `Address` version 2, even though the texts match.

use crate::types::{SchemaFormat, SchemaReference};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 digest size in bytes.
pub const FINGERPRINT_SIZE: usize = 32;

/// A 256-bit schema content fingerprint.
///
/// Rendered as lowercase hex on the wire and in logs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_SIZE]);

impl Fingerprint {
    /// Compute the fingerprint of a canonical schema.
    ///
    /// The digest covers, in order: the format wire name, a NUL
    /// separator, the canonical bytes, and each reference as
    /// `name`/`subject`/`version` fields with length-prefix framing so
    /// that no two distinct reference lists collide.
    pub fn compute(
        format: SchemaFormat,
        canonical: &[u8],
        references: &[SchemaReference],
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update((canonical.len() as u64).to_be_bytes());
        hasher.update(canonical);
        hasher.update((references.len() as u64).to_be_bytes());
        for reference in references {
            for part in [reference.name.as_bytes(), reference.subject.as_bytes()] {
                hasher.update((part.len() as u64).to_be_bytes());
                hasher.update(part);
            }
            hasher.update(u64::from(reference.version).to_be_bytes());
        }
        Fingerprint(hasher.finalize().into())
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_SIZE] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(FINGERPRINT_SIZE * 2);
        for byte in self.0 {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }

    /// Parse the hex rendering back into a fingerprint.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != FINGERPRINT_SIZE * 2 {
            return None;
        }
        let mut bytes = [0u8; FINGERPRINT_SIZE];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let high = (chunk[0] as char).to_digit(16)?;
            let low = (chunk[1] as char).to_digit(16)?;
            bytes[i] = (high * 16 + low) as u8;
        }
        Some(Fingerprint(bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Fingerprint::from_hex(&hex)
            .ok_or_else(|| D::Error::custom(format!("invalid fingerprint '{hex}'")))
    }
}
