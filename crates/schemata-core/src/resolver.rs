//! Reference resolution.
//!
//! A registration may reference other subject versions by name. The
//! resolver expands the caller-supplied list into a full dependency
//! closure of concrete `(subject, version, schema)` entries, in
//! topological order (dependencies before dependents). Lookups stay
//! inside the request context: a subject that only exists in another
//! context is a missing reference.

use schemata_model::{QualifiedSubject, RegistryError, Result, SchemaReference};
use schemata_store::{Store, StoredSchema, VersionSelector};
use std::collections::HashSet;
use tracing::debug;

/// A reference resolved to its stored schema.
#[derive(Debug, Clone)]
pub struct ResolvedReference {
    pub reference: SchemaReference,
    pub schema: StoredSchema,
}

/// Expand `references` into a dependency closure within `context`.
///
/// Every caller-supplied entry must resolve, referenced or not: an
/// unreferenced entry still pins its subject version. Soft-deleted
/// versions resolve only when `include_deleted` is set (used when
/// re-parsing historical versions whose dependencies may have been
/// soft-deleted since).
pub fn resolve_references(
    store: &dyn Store,
    context: &str,
    references: &[SchemaReference],
    include_deleted: bool,
) -> Result<Vec<ResolvedReference>> {
    let mut resolver = Resolver {
        store,
        context,
        include_deleted,
        resolved: Vec::new(),
        done: HashSet::new(),
        in_progress: HashSet::new(),
    };
    for reference in references {
        resolver.visit(reference)?;
    }
    debug!(
        context,
        count = resolver.resolved.len(),
        "resolved reference closure"
    );
    Ok(resolver.resolved)
}

struct Resolver<'a> {
    store: &'a dyn Store,
    context: &'a str,
    include_deleted: bool,
    resolved: Vec<ResolvedReference>,
    done: HashSet<(String, u32)>,
    in_progress: HashSet<(String, u32)>,
}

impl Resolver<'_> {
    fn visit(&mut self, reference: &SchemaReference) -> Result<()> {
        let key = (reference.subject.clone(), reference.version);
        if self.done.contains(&key) {
            return Ok(());
        }
        if !self.in_progress.insert(key.clone()) {
            return Err(RegistryError::ReferenceCycle {
                subject: reference.subject.clone(),
            });
        }

        let subject = QualifiedSubject::new(self.context, reference.subject.clone());
        let binding = self
            .store
            .get_version(
                &subject,
                VersionSelector::Number(reference.version),
                self.include_deleted,
            )?
            .ok_or_else(|| RegistryError::MissingReference {
                name: reference.name.clone(),
                subject: reference.subject.clone(),
                version: reference.version,
            })?;
        let schema = self
            .store
            .schema_by_id(binding.schema_id, true)?
            .ok_or_else(|| RegistryError::MissingReference {
                name: reference.name.clone(),
                subject: reference.subject.clone(),
                version: reference.version,
            })?;

        for transitive in &schema.references {
            self.visit(transitive)?;
        }

        self.in_progress.remove(&key);
        self.done.insert(key);
        self.resolved.push(ResolvedReference {
            reference: reference.clone(),
            schema,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemata_model::{Fingerprint, SchemaFormat};
    use schemata_store::{MemoryStore, NewSchema};

    fn put(
        store: &MemoryStore,
        context: &str,
        subject: &str,
        canonical: &str,
        references: Vec<SchemaReference>,
    ) {
        let schema = NewSchema {
            format: SchemaFormat::Avro,
            schema_text: canonical.to_string(),
            canonical_text: canonical.to_string(),
            fingerprint: Fingerprint::compute(
                SchemaFormat::Avro,
                canonical.as_bytes(),
                &references,
            ),
            references,
            id: None,
            version: None,
        };
        store
            .insert_version(&QualifiedSubject::new(context, subject), schema)
            .unwrap();
    }

    fn reference(subject: &str, version: u32) -> SchemaReference {
        SchemaReference::new(format!("ref.{subject}"), subject, version)
    }

    #[test]
    fn closure_is_in_dependency_order() {
        let store = MemoryStore::new();
        put(&store, ".", "leaf", "\"leaf\"", vec![]);
        put(&store, ".", "mid", "\"mid\"", vec![reference("leaf", 1)]);
        put(&store, ".", "top", "\"top\"", vec![reference("mid", 1)]);

        let closure =
            resolve_references(&store, ".", &[reference("top", 1)], false).unwrap();
        let order: Vec<&str> = closure
            .iter()
            .map(|r| r.reference.subject.as_str())
            .collect();
        assert_eq!(order, vec!["leaf", "mid", "top"]);
    }

    #[test]
    fn missing_reference_is_reported() {
        let store = MemoryStore::new();
        let err = resolve_references(&store, ".", &[reference("ghost", 1)], false).unwrap_err();
        assert!(matches!(err, RegistryError::MissingReference { .. }));
    }

    #[test]
    fn cross_context_lookup_is_not_found() {
        let store = MemoryStore::new();
        put(&store, "B", "user", "\"user\"", vec![]);
        let err = resolve_references(&store, "A", &[reference("user", 1)], false).unwrap_err();
        assert!(matches!(err, RegistryError::MissingReference { .. }));
        assert!(resolve_references(&store, "B", &[reference("user", 1)], false).is_ok());
    }

    #[test]
    fn soft_deleted_targets_need_include_deleted() {
        let store = MemoryStore::new();
        put(&store, ".", "gone", "\"gone\"", vec![]);
        store
            .soft_delete_version(&QualifiedSubject::in_default_context("gone"), 1)
            .unwrap();
        assert!(resolve_references(&store, ".", &[reference("gone", 1)], false).is_err());
        assert!(resolve_references(&store, ".", &[reference("gone", 1)], true).is_ok());
    }

    #[test]
    fn duplicate_entries_resolve_once() {
        let store = MemoryStore::new();
        put(&store, ".", "shared", "\"shared\"", vec![]);
        let closure = resolve_references(
            &store,
            ".",
            &[reference("shared", 1), reference("shared", 1)],
            false,
        )
        .unwrap();
        assert_eq!(closure.len(), 1);
    }
}
