//! Contexts and qualified subject names.
//!
//! A subject lives in exactly one context. On the wire a subject may be
//! qualified with its context as `:.orders:invoice` (or the equivalent
//! `:.orders.:invoice`); a bare name lands in the default context `"."`.

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The default context every unqualified subject belongs to.
pub const DEFAULT_CONTEXT: &str = ".";

/// A subject resolved to its `(context, name)` primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedSubject {
    /// Context name, `"."` for the default context.
    pub context: String,

    /// Subject name within the context.
    pub name: String,
}

impl QualifiedSubject {
    /// Build a subject key in the default context.
    pub fn in_default_context(name: impl Into<String>) -> Self {
        QualifiedSubject {
            context: DEFAULT_CONTEXT.to_string(),
            name: name.into(),
        }
    }

    /// Build a subject key in a named context.
    pub fn new(context: impl Into<String>, name: impl Into<String>) -> Self {
        QualifiedSubject {
            context: context.into(),
            name: name.into(),
        }
    }

    /// Parse a wire-form subject.
    ///
    /// Accepted forms:
    /// - `name`: subject in the default context
    /// - `:.ctx:name`: subject `name` in context `ctx`
    /// - `:.ctx.:name`: equivalent trailing-dot form
    /// - `:.:name` / `:..:name`: explicit default context
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(RegistryError::InvalidSubject("empty subject".to_string()));
        }

        let Some(rest) = input.strip_prefix(":.") else {
            if input.contains(':') {
                return Err(RegistryError::InvalidSubject(input.to_string()));
            }
            return Ok(QualifiedSubject::in_default_context(input));
        };

        let Some(colon) = rest.find(':') else {
            return Err(RegistryError::InvalidSubject(input.to_string()));
        };
        let (ctx_part, name) = rest.split_at(colon);
        let name = &name[1..];
        if name.is_empty() || name.contains(':') {
            return Err(RegistryError::InvalidSubject(input.to_string()));
        }

        // Both `:.ctx:` and `:.ctx.:` qualify the same context.
        let ctx = ctx_part.strip_suffix('.').unwrap_or(ctx_part);
        if ctx.is_empty() {
            return Ok(QualifiedSubject::in_default_context(name));
        }
        validate_context_name(ctx)?;
        Ok(QualifiedSubject::new(ctx, name))
    }

    /// Whether this subject lives in the default context.
    pub fn is_default_context(&self) -> bool {
        self.context == DEFAULT_CONTEXT
    }

    /// The wire form of this subject: bare for the default context,
    /// `:.ctx:name` otherwise.
    pub fn qualified_name(&self) -> String {
        if self.is_default_context() {
            self.name.clone()
        } else {
            format!(":.{}:{}", self.context, self.name)
        }
    }
}

impl fmt::Display for QualifiedSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Validate a context name: non-empty, letters, digits, dash, underscore.
///
/// The literal `"."` is also accepted as the default context.
pub fn validate_context_name(ctx: &str) -> Result<()> {
    if ctx == DEFAULT_CONTEXT {
        return Ok(());
    }
    if ctx.is_empty() {
        return Err(RegistryError::InvalidSubject(
            "empty context name".to_string(),
        ));
    }
    if ctx
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(RegistryError::InvalidSubject(format!(
            "invalid context name '{ctx}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_lands_in_default_context() {
        let subject = QualifiedSubject::parse("orders-value").unwrap();
        assert_eq!(subject.context, DEFAULT_CONTEXT);
        assert_eq!(subject.name, "orders-value");
        assert_eq!(subject.qualified_name(), "orders-value");
    }

    #[test]
    fn qualified_forms_parse_identically() {
        let plain = QualifiedSubject::parse(":.prod:orders").unwrap();
        let dotted = QualifiedSubject::parse(":.prod.:orders").unwrap();
        assert_eq!(plain, dotted);
        assert_eq!(plain.context, "prod");
        assert_eq!(plain.name, "orders");
        assert_eq!(plain.qualified_name(), ":.prod:orders");
    }

    #[test]
    fn empty_context_prefix_is_default() {
        let subject = QualifiedSubject::parse(":.:orders").unwrap();
        assert!(subject.is_default_context());
        assert_eq!(subject.name, "orders");
    }

    #[test]
    fn mixed_case_and_separators_allowed_in_context() {
        let subject = QualifiedSubject::parse(":.Env_2-test:user").unwrap();
        assert_eq!(subject.context, "Env_2-test");
    }

    #[test]
    fn malformed_subjects_rejected() {
        assert!(QualifiedSubject::parse("").is_err());
        assert!(QualifiedSubject::parse(":.ctx").is_err());
        assert!(QualifiedSubject::parse(":.ctx:").is_err());
        assert!(QualifiedSubject::parse(":.c!tx:name").is_err());
        assert!(QualifiedSubject::parse("a:b").is_err());
        assert!(QualifiedSubject::parse(":.ctx:a:b").is_err());
    }
}
