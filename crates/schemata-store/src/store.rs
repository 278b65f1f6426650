//! The storage seam of the registry.
//!
//! Every operation is transactional at the granularity of a single
//! call. The engine assumes per-subject linearizable writes and
//! repeatable reads; both implementations in this crate satisfy that
//! with a single state lock.

use crate::records::{ConfigEntry, NewSchema, StoredSchema, VersionBinding};
use schemata_model::{Mode, QualifiedSubject, Result};

/// Selects a version of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector {
    /// Highest visible version.
    Latest,
    Number(u32),
}

/// Offset/limit pagination applied to every listing operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Page {
    /// No offset, no limit.
    pub fn all() -> Self {
        Page::default()
    }

    pub fn new(offset: usize, limit: Option<usize>) -> Self {
        Page { offset, limit }
    }

    /// Apply this page to an already-ordered listing.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Scope of a config or mode entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Global,
    Subject(QualifiedSubject),
}

/// Abstract registry storage.
///
/// Implementations guarantee: `(subject, version)` uniqueness, the
/// fingerprint → id bijection, and IDs allocated strictly above every
/// id ever observed (imported ids included).
pub trait Store: Send + Sync {
    /// Ordered context names with at least one subject, plus the
    /// default context.
    fn list_contexts(&self) -> Result<Vec<String>>;

    /// Ordered subject keys within a context, optionally filtered by
    /// name prefix.
    fn list_subjects(
        &self,
        context: &str,
        name_prefix: Option<&str>,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<QualifiedSubject>>;

    fn subject_exists(&self, subject: &QualifiedSubject, include_deleted: bool) -> Result<bool>;

    fn list_versions(
        &self,
        subject: &QualifiedSubject,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<u32>>;

    fn get_version(
        &self,
        subject: &QualifiedSubject,
        selector: VersionSelector,
        include_deleted: bool,
    ) -> Result<Option<VersionBinding>>;

    /// Live bindings in ascending version order.
    fn live_bindings(&self, subject: &QualifiedSubject) -> Result<Vec<VersionBinding>>;

    fn find_binding_by_fingerprint(
        &self,
        subject: &QualifiedSubject,
        fingerprint: &schemata_model::Fingerprint,
        include_deleted: bool,
    ) -> Result<Option<VersionBinding>>;

    /// A schema is visible without `include_deleted` only while some
    /// live binding still points at it.
    fn schema_by_id(&self, id: i32, include_deleted: bool) -> Result<Option<StoredSchema>>;

    fn schema_by_fingerprint(
        &self,
        fingerprint: &schemata_model::Fingerprint,
    ) -> Result<Option<StoredSchema>>;

    fn subjects_for_schema_id(
        &self,
        id: i32,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<QualifiedSubject>>;

    fn versions_for_schema_id(
        &self,
        id: i32,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<(QualifiedSubject, u32)>>;

    /// Live subject versions (same context) whose schema references the
    /// given subject version.
    fn referenced_by(
        &self,
        subject: &QualifiedSubject,
        version: u32,
        page: Page,
    ) -> Result<Vec<(QualifiedSubject, u32)>>;

    /// Every live `(subject, binding, schema)` row in a context,
    /// ordered by subject then version.
    fn list_schemas(
        &self,
        context: &str,
        name_prefix: Option<&str>,
        page: Page,
    ) -> Result<Vec<(QualifiedSubject, VersionBinding, StoredSchema)>>;

    /// Commit a schema under a subject.
    ///
    /// Applies fingerprint dedup, the import conflict rules when `id`
    /// or `version` is supplied, and monotonic id/version allocation
    /// otherwise. Returns the bound `(id, version)`.
    fn insert_version(
        &self,
        subject: &QualifiedSubject,
        schema: NewSchema,
    ) -> Result<(i32, u32)>;

    fn soft_delete_version(&self, subject: &QualifiedSubject, version: u32) -> Result<()>;

    /// Requires the binding to be soft-deleted already.
    fn permanent_delete_version(&self, subject: &QualifiedSubject, version: u32) -> Result<()>;

    /// Marks every live version deleted; returns their numbers.
    fn soft_delete_subject(&self, subject: &QualifiedSubject) -> Result<Vec<u32>>;

    /// Removes the subject, its bindings, and its config/mode overlays;
    /// returns the removed version numbers.
    fn permanent_delete_subject(&self, subject: &QualifiedSubject) -> Result<Vec<u32>>;

    fn get_config(&self, scope: &Scope) -> Result<Option<ConfigEntry>>;
    fn set_config(&self, scope: &Scope, entry: ConfigEntry) -> Result<()>;
    fn delete_config(&self, scope: &Scope) -> Result<()>;

    fn get_mode(&self, scope: &Scope) -> Result<Option<Mode>>;
    fn set_mode(&self, scope: &Scope, mode: Mode) -> Result<()>;
    fn delete_mode(&self, scope: &Scope) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_applies_offset_and_limit() {
        let items = vec![1, 2, 3, 4, 5];
        assert_eq!(Page::all().apply(items.clone()), vec![1, 2, 3, 4, 5]);
        assert_eq!(Page::new(2, None).apply(items.clone()), vec![3, 4, 5]);
        assert_eq!(Page::new(1, Some(2)).apply(items.clone()), vec![2, 3]);
        assert_eq!(Page::new(9, Some(2)).apply(items), Vec::<i32>::new());
    }
}
