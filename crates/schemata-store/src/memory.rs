//! In-memory store.
//!
//! The reference implementation of [`Store`]: a single `RwLock` over
//! nested BTreeMaps. Per-subject writes are linearizable because every
//! mutation holds the write lock for the whole compute-and-commit of
//! the call.

use crate::records::{ConfigEntry, NewSchema, StoredSchema, SubjectState, VersionBinding};
use crate::store::{Page, Scope, Store, VersionSelector};
use schemata_model::{
    Fingerprint, Mode, QualifiedSubject, RegistryError, Result, DEFAULT_CONTEXT,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
pub(crate) struct State {
    pub(crate) schemas: BTreeMap<i32, StoredSchema>,
    pub(crate) by_fingerprint: HashMap<Fingerprint, i32>,
    /// context name → subject name → state
    pub(crate) contexts: BTreeMap<String, BTreeMap<String, SubjectState>>,
    pub(crate) global_config: Option<ConfigEntry>,
    pub(crate) global_mode: Option<Mode>,
    /// High-water mark over every id ever observed.
    pub(crate) max_id: i32,
}

impl State {
    fn subject(&self, subject: &QualifiedSubject) -> Option<&SubjectState> {
        self.contexts
            .get(&subject.context)
            .and_then(|subjects| subjects.get(&subject.name))
    }

    fn subject_mut(&mut self, subject: &QualifiedSubject) -> &mut SubjectState {
        self.contexts
            .entry(subject.context.clone())
            .or_default()
            .entry(subject.name.clone())
            .or_default()
    }

    fn schema_has_live_binding(&self, id: i32) -> bool {
        self.contexts.values().any(|subjects| {
            subjects.values().any(|state| {
                state
                    .versions
                    .values()
                    .any(|binding| !binding.deleted && binding.schema_id == id)
            })
        })
    }
}

/// Registry storage backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        // A poisoned lock means a panic while writing; the store is
        // process-local, so propagating the panic is the right call.
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn export_subject(&self, subject: &QualifiedSubject) -> Option<SubjectState> {
        self.read().subject(subject).cloned()
    }

    pub(crate) fn export_schema(&self, id: i32) -> Option<StoredSchema> {
        self.read().schemas.get(&id).cloned()
    }

    pub(crate) fn export_meta(&self) -> (Option<ConfigEntry>, Option<Mode>, i32) {
        let state = self.read();
        (state.global_config, state.global_mode, state.max_id)
    }

    pub(crate) fn restore_subject(&self, subject: &QualifiedSubject, restored: SubjectState) {
        self.write()
            .contexts
            .entry(subject.context.clone())
            .or_default()
            .insert(subject.name.clone(), restored);
    }

    pub(crate) fn restore_schema(&self, schema: StoredSchema) {
        let mut state = self.write();
        state.by_fingerprint.insert(schema.fingerprint, schema.id);
        state.max_id = state.max_id.max(schema.id);
        state.schemas.insert(schema.id, schema);
    }

    pub(crate) fn restore_meta(
        &self,
        config: Option<ConfigEntry>,
        mode: Option<Mode>,
        max_id: i32,
    ) {
        let mut state = self.write();
        state.global_config = config;
        state.global_mode = mode;
        state.max_id = state.max_id.max(max_id);
    }
}

impl Store for MemoryStore {
    fn list_contexts(&self) -> Result<Vec<String>> {
        let state = self.read();
        let mut contexts: Vec<String> = state
            .contexts
            .iter()
            .filter(|(_, subjects)| {
                subjects
                    .values()
                    .any(|subject| subject.has_live_versions())
            })
            .map(|(name, _)| name.clone())
            .collect();
        if !contexts.iter().any(|name| name == DEFAULT_CONTEXT) {
            contexts.push(DEFAULT_CONTEXT.to_string());
        }
        contexts.sort();
        Ok(contexts)
    }

    fn list_subjects(
        &self,
        context: &str,
        name_prefix: Option<&str>,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<QualifiedSubject>> {
        let state = self.read();
        let Some(subjects) = state.contexts.get(context) else {
            return Ok(Vec::new());
        };
        let listed: Vec<QualifiedSubject> = subjects
            .iter()
            .filter(|(name, subject)| {
                let visible = if include_deleted {
                    !subject.versions.is_empty()
                } else {
                    subject.has_live_versions()
                };
                visible && name_prefix.map_or(true, |prefix| name.starts_with(prefix))
            })
            .map(|(name, _)| QualifiedSubject::new(context, name.clone()))
            .collect();
        Ok(page.apply(listed))
    }

    fn subject_exists(&self, subject: &QualifiedSubject, include_deleted: bool) -> Result<bool> {
        let state = self.read();
        Ok(state.subject(subject).is_some_and(|s| {
            if include_deleted {
                !s.versions.is_empty()
            } else {
                s.has_live_versions()
            }
        }))
    }

    fn list_versions(
        &self,
        subject: &QualifiedSubject,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<u32>> {
        let state = self.read();
        let versions = state
            .subject(subject)
            .map(|s| {
                s.versions
                    .values()
                    .filter(|binding| include_deleted || !binding.deleted)
                    .map(|binding| binding.version)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(page.apply(versions))
    }

    fn get_version(
        &self,
        subject: &QualifiedSubject,
        selector: VersionSelector,
        include_deleted: bool,
    ) -> Result<Option<VersionBinding>> {
        let state = self.read();
        let Some(subject_state) = state.subject(subject) else {
            return Ok(None);
        };
        Ok(match selector {
            VersionSelector::Latest => subject_state
                .versions
                .values()
                .rev()
                .find(|binding| include_deleted || !binding.deleted)
                .copied(),
            VersionSelector::Number(version) => subject_state
                .versions
                .get(&version)
                .filter(|binding| include_deleted || !binding.deleted)
                .copied(),
        })
    }

    fn live_bindings(&self, subject: &QualifiedSubject) -> Result<Vec<VersionBinding>> {
        let state = self.read();
        Ok(state
            .subject(subject)
            .map(|s| {
                s.versions
                    .values()
                    .filter(|binding| !binding.deleted)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn find_binding_by_fingerprint(
        &self,
        subject: &QualifiedSubject,
        fingerprint: &Fingerprint,
        include_deleted: bool,
    ) -> Result<Option<VersionBinding>> {
        let state = self.read();
        let Some(&id) = state.by_fingerprint.get(fingerprint) else {
            return Ok(None);
        };
        Ok(state.subject(subject).and_then(|s| {
            s.versions
                .values()
                .rev()
                .find(|binding| {
                    binding.schema_id == id && (include_deleted || !binding.deleted)
                })
                .copied()
        }))
    }

    fn schema_by_id(&self, id: i32, include_deleted: bool) -> Result<Option<StoredSchema>> {
        let state = self.read();
        let Some(schema) = state.schemas.get(&id) else {
            return Ok(None);
        };
        if include_deleted || state.schema_has_live_binding(id) {
            Ok(Some(schema.clone()))
        } else {
            Ok(None)
        }
    }

    fn schema_by_fingerprint(&self, fingerprint: &Fingerprint) -> Result<Option<StoredSchema>> {
        let state = self.read();
        Ok(state
            .by_fingerprint
            .get(fingerprint)
            .and_then(|id| state.schemas.get(id))
            .cloned())
    }

    fn subjects_for_schema_id(
        &self,
        id: i32,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<QualifiedSubject>> {
        let state = self.read();
        let mut subjects = Vec::new();
        for (context, names) in &state.contexts {
            for (name, subject_state) in names {
                let bound = subject_state
                    .versions
                    .values()
                    .any(|b| b.schema_id == id && (include_deleted || !b.deleted));
                if bound {
                    subjects.push(QualifiedSubject::new(context.clone(), name.clone()));
                }
            }
        }
        Ok(page.apply(subjects))
    }

    fn versions_for_schema_id(
        &self,
        id: i32,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<(QualifiedSubject, u32)>> {
        let state = self.read();
        let mut pairs = Vec::new();
        for (context, names) in &state.contexts {
            for (name, subject_state) in names {
                for binding in subject_state.versions.values() {
                    if binding.schema_id == id && (include_deleted || !binding.deleted) {
                        pairs.push((
                            QualifiedSubject::new(context.clone(), name.clone()),
                            binding.version,
                        ));
                    }
                }
            }
        }
        Ok(page.apply(pairs))
    }

    fn referenced_by(
        &self,
        subject: &QualifiedSubject,
        version: u32,
        page: Page,
    ) -> Result<Vec<(QualifiedSubject, u32)>> {
        let state = self.read();
        let mut referrers = Vec::new();
        // References are context-local, so only the subject's own
        // context can hold referrers.
        if let Some(names) = state.contexts.get(&subject.context) {
            for (name, subject_state) in names {
                for binding in subject_state.versions.values() {
                    if binding.deleted {
                        continue;
                    }
                    let Some(schema) = state.schemas.get(&binding.schema_id) else {
                        continue;
                    };
                    let refers = schema
                        .references
                        .iter()
                        .any(|r| r.subject == subject.name && r.version == version);
                    if refers {
                        referrers.push((
                            QualifiedSubject::new(subject.context.clone(), name.clone()),
                            binding.version,
                        ));
                    }
                }
            }
        }
        Ok(page.apply(referrers))
    }

    fn list_schemas(
        &self,
        context: &str,
        name_prefix: Option<&str>,
        page: Page,
    ) -> Result<Vec<(QualifiedSubject, VersionBinding, StoredSchema)>> {
        let state = self.read();
        let mut rows = Vec::new();
        if let Some(names) = state.contexts.get(context) {
            for (name, subject_state) in names {
                if !name_prefix.map_or(true, |prefix| name.starts_with(prefix)) {
                    continue;
                }
                for binding in subject_state.versions.values() {
                    if binding.deleted {
                        continue;
                    }
                    if let Some(schema) = state.schemas.get(&binding.schema_id) {
                        rows.push((
                            QualifiedSubject::new(context, name.clone()),
                            *binding,
                            schema.clone(),
                        ));
                    }
                }
            }
        }
        Ok(page.apply(rows))
    }

    fn insert_version(
        &self,
        subject: &QualifiedSubject,
        schema: NewSchema,
    ) -> Result<(i32, u32)> {
        let mut state = self.write();

        let existing_id = state.by_fingerprint.get(&schema.fingerprint).copied();
        let id = match (schema.id, existing_id) {
            (Some(requested), Some(known)) if requested != known => {
                return Err(RegistryError::IdConflict { id: requested });
            }
            (Some(requested), _) => {
                if let Some(existing) = state.schemas.get(&requested) {
                    if existing.fingerprint != schema.fingerprint {
                        return Err(RegistryError::IdConflict { id: requested });
                    }
                }
                requested
            }
            (None, Some(known)) => known,
            (None, None) => state.max_id + 1,
        };

        let subject_state = state.subject_mut(subject);
        let version = match schema.version {
            Some(requested) => {
                if let Some(existing) = subject_state.versions.get(&requested) {
                    if !existing.deleted && existing.schema_id == id {
                        return Ok((id, requested));
                    }
                    return Err(RegistryError::VersionConflict {
                        subject: subject.qualified_name(),
                        version: requested,
                    });
                }
                requested
            }
            None => subject_state
                .versions
                .keys()
                .next_back()
                .map(|v| v + 1)
                .unwrap_or(1),
        };

        subject_state.versions.insert(
            version,
            VersionBinding {
                version,
                schema_id: id,
                deleted: false,
            },
        );

        state.max_id = state.max_id.max(id);
        state.by_fingerprint.insert(schema.fingerprint, id);
        state.schemas.entry(id).or_insert_with(|| StoredSchema {
            id,
            format: schema.format,
            schema_text: schema.schema_text,
            canonical_text: schema.canonical_text,
            fingerprint: schema.fingerprint,
            references: schema.references,
        });

        debug!(
            subject = %subject.qualified_name(),
            id,
            version,
            "committed schema version"
        );
        Ok((id, version))
    }

    fn soft_delete_version(&self, subject: &QualifiedSubject, version: u32) -> Result<()> {
        let mut state = self.write();
        let subject_name = subject.qualified_name();
        let Some(subject_state) = state
            .contexts
            .get_mut(&subject.context)
            .and_then(|names| names.get_mut(&subject.name))
        else {
            return Err(RegistryError::SubjectNotFound(subject_name));
        };
        match subject_state.versions.get_mut(&version) {
            Some(binding) if !binding.deleted => {
                binding.deleted = true;
                Ok(())
            }
            _ => Err(RegistryError::VersionNotFound {
                subject: subject_name,
                version,
            }),
        }
    }

    fn permanent_delete_version(&self, subject: &QualifiedSubject, version: u32) -> Result<()> {
        let mut state = self.write();
        let subject_name = subject.qualified_name();
        let Some(names) = state.contexts.get_mut(&subject.context) else {
            return Err(RegistryError::SubjectNotFound(subject_name));
        };
        let Some(subject_state) = names.get_mut(&subject.name) else {
            return Err(RegistryError::SubjectNotFound(subject_name));
        };
        let already_deleted = match subject_state.versions.get(&version) {
            None => {
                return Err(RegistryError::VersionNotFound {
                    subject: subject_name,
                    version,
                })
            }
            Some(binding) => binding.deleted,
        };
        if !already_deleted {
            return Err(RegistryError::NotSoftDeleted {
                subject: subject_name,
            });
        }
        subject_state.versions.remove(&version);
        let prune = subject_state.versions.is_empty()
            && subject_state.config.is_none()
            && subject_state.mode.is_none();
        if prune {
            names.remove(&subject.name);
        }
        Ok(())
    }

    fn soft_delete_subject(&self, subject: &QualifiedSubject) -> Result<Vec<u32>> {
        let mut state = self.write();
        let subject_name = subject.qualified_name();
        let Some(subject_state) = state
            .contexts
            .get_mut(&subject.context)
            .and_then(|names| names.get_mut(&subject.name))
        else {
            return Err(RegistryError::SubjectNotFound(subject_name));
        };
        let mut deleted = Vec::new();
        for binding in subject_state.versions.values_mut() {
            if !binding.deleted {
                binding.deleted = true;
                deleted.push(binding.version);
            }
        }
        if deleted.is_empty() {
            return Err(RegistryError::SubjectNotFound(subject_name));
        }
        Ok(deleted)
    }

    fn permanent_delete_subject(&self, subject: &QualifiedSubject) -> Result<Vec<u32>> {
        let mut state = self.write();
        let subject_name = subject.qualified_name();
        let Some(names) = state.contexts.get_mut(&subject.context) else {
            return Err(RegistryError::SubjectNotFound(subject_name));
        };
        let Some(subject_state) = names.get(&subject.name) else {
            return Err(RegistryError::SubjectNotFound(subject_name));
        };
        if subject_state.has_live_versions() {
            return Err(RegistryError::NotSoftDeleted {
                subject: subject_name,
            });
        }
        let versions = subject_state.versions.keys().copied().collect();
        names.remove(&subject.name);
        if names.is_empty() {
            state.contexts.remove(&subject.context);
        }
        Ok(versions)
    }

    fn get_config(&self, scope: &Scope) -> Result<Option<ConfigEntry>> {
        let state = self.read();
        Ok(match scope {
            Scope::Global => state.global_config,
            Scope::Subject(subject) => state.subject(subject).and_then(|s| s.config),
        })
    }

    fn set_config(&self, scope: &Scope, entry: ConfigEntry) -> Result<()> {
        let mut state = self.write();
        match scope {
            Scope::Global => state.global_config = Some(entry),
            Scope::Subject(subject) => state.subject_mut(subject).config = Some(entry),
        }
        Ok(())
    }

    fn delete_config(&self, scope: &Scope) -> Result<()> {
        let mut state = self.write();
        match scope {
            Scope::Global => state.global_config = None,
            Scope::Subject(subject) => {
                if let Some(subject_state) = state
                    .contexts
                    .get_mut(&subject.context)
                    .and_then(|names| names.get_mut(&subject.name))
                {
                    subject_state.config = None;
                }
            }
        }
        Ok(())
    }

    fn get_mode(&self, scope: &Scope) -> Result<Option<Mode>> {
        let state = self.read();
        Ok(match scope {
            Scope::Global => state.global_mode,
            Scope::Subject(subject) => state.subject(subject).and_then(|s| s.mode),
        })
    }

    fn set_mode(&self, scope: &Scope, mode: Mode) -> Result<()> {
        let mut state = self.write();
        match scope {
            Scope::Global => state.global_mode = Some(mode),
            Scope::Subject(subject) => state.subject_mut(subject).mode = Some(mode),
        }
        Ok(())
    }

    fn delete_mode(&self, scope: &Scope) -> Result<()> {
        let mut state = self.write();
        match scope {
            Scope::Global => state.global_mode = None,
            Scope::Subject(subject) => {
                if let Some(subject_state) = state
                    .contexts
                    .get_mut(&subject.context)
                    .and_then(|names| names.get_mut(&subject.name))
                {
                    subject_state.mode = None;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemata_model::SchemaFormat;

    fn new_schema(canonical: &str) -> NewSchema {
        NewSchema {
            format: SchemaFormat::Avro,
            schema_text: canonical.to_string(),
            canonical_text: canonical.to_string(),
            fingerprint: Fingerprint::compute(SchemaFormat::Avro, canonical.as_bytes(), &[]),
            references: Vec::new(),
            id: None,
            version: None,
        }
    }

    fn subject(name: &str) -> QualifiedSubject {
        QualifiedSubject::in_default_context(name)
    }

    #[test]
    fn versions_start_at_one_and_increase() {
        let store = MemoryStore::new();
        let (id1, v1) = store.insert_version(&subject("s"), new_schema("\"a\"")).unwrap();
        let (id2, v2) = store.insert_version(&subject("s"), new_schema("\"b\"")).unwrap();
        assert_eq!((v1, v2), (1, 2));
        assert!(id2 > id1);
    }

    #[test]
    fn fingerprint_dedup_reuses_id_across_subjects() {
        let store = MemoryStore::new();
        let (id1, _) = store.insert_version(&subject("s1"), new_schema("\"x\"")).unwrap();
        let (id2, _) = store.insert_version(&subject("s2"), new_schema("\"x\"")).unwrap();
        assert_eq!(id1, id2);
    }

    #[test]
    fn fingerprint_lookup_returns_the_schema_row() {
        let store = MemoryStore::new();
        let schema = new_schema("\"x\"");
        let fingerprint = schema.fingerprint;
        let (id, _) = store.insert_version(&subject("s"), schema).unwrap();

        let row = store.schema_by_fingerprint(&fingerprint).unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.canonical_text, "\"x\"");

        let other = Fingerprint::compute(SchemaFormat::Avro, b"\"other\"", &[]);
        assert!(store.schema_by_fingerprint(&other).unwrap().is_none());
    }

    #[test]
    fn imported_ids_raise_the_high_water_mark() {
        let store = MemoryStore::new();
        let mut imported = new_schema("\"imported\"");
        imported.id = Some(71023);
        imported.version = Some(3);
        store.insert_version(&subject("s"), imported).unwrap();

        let (id, _) = store.insert_version(&subject("s"), new_schema("\"next\"")).unwrap();
        assert!(id > 71023);
    }

    #[test]
    fn import_conflicts_are_detected() {
        let store = MemoryStore::new();
        let mut first = new_schema("\"one\"");
        first.id = Some(10);
        first.version = Some(1);
        store.insert_version(&subject("s"), first.clone()).unwrap();

        // Same id, different fingerprint.
        let mut clash = new_schema("\"two\"");
        clash.id = Some(10);
        clash.version = Some(2);
        assert!(matches!(
            store.insert_version(&subject("s"), clash),
            Err(RegistryError::IdConflict { id: 10 })
        ));

        // Same version, different schema.
        let mut clash = new_schema("\"three\"");
        clash.id = Some(11);
        clash.version = Some(1);
        assert!(matches!(
            store.insert_version(&subject("s"), clash),
            Err(RegistryError::VersionConflict { .. })
        ));

        // Exact re-import is idempotent.
        let (id, version) = store.insert_version(&subject("s"), first).unwrap();
        assert_eq!((id, version), (10, 1));
    }

    #[test]
    fn out_of_order_import_keeps_versions_sorted() {
        let store = MemoryStore::new();
        for (version, id, text) in [(3, 71023, "\"c\""), (1, 71021, "\"a\""), (2, 71022, "\"b\"")] {
            let mut imported = new_schema(text);
            imported.id = Some(id);
            imported.version = Some(version);
            store.insert_version(&subject("s"), imported).unwrap();
        }
        let versions = store
            .list_versions(&subject("s"), false, Page::all())
            .unwrap();
        assert_eq!(versions, vec![1, 2, 3]);
        let latest = store
            .get_version(&subject("s"), VersionSelector::Latest, false)
            .unwrap()
            .unwrap();
        assert_eq!(latest.version, 3);
    }

    #[test]
    fn soft_delete_hides_and_deleted_flag_reveals() {
        let store = MemoryStore::new();
        store.insert_version(&subject("s"), new_schema("\"a\"")).unwrap();
        store.insert_version(&subject("s"), new_schema("\"b\"")).unwrap();
        store.soft_delete_version(&subject("s"), 2).unwrap();

        assert_eq!(
            store.list_versions(&subject("s"), false, Page::all()).unwrap(),
            vec![1]
        );
        assert_eq!(
            store.list_versions(&subject("s"), true, Page::all()).unwrap(),
            vec![1, 2]
        );
        let latest = store
            .get_version(&subject("s"), VersionSelector::Latest, false)
            .unwrap()
            .unwrap();
        assert_eq!(latest.version, 1);
    }

    #[test]
    fn reregistration_after_soft_delete_gets_a_new_version() {
        let store = MemoryStore::new();
        store.insert_version(&subject("s"), new_schema("\"a\"")).unwrap();
        store.soft_delete_version(&subject("s"), 1).unwrap();
        let (_, version) = store.insert_version(&subject("s"), new_schema("\"a\"")).unwrap();
        assert_eq!(version, 2);
    }

    #[test]
    fn permanent_delete_requires_soft_delete_first() {
        let store = MemoryStore::new();
        store.insert_version(&subject("s"), new_schema("\"a\"")).unwrap();
        assert!(matches!(
            store.permanent_delete_version(&subject("s"), 1),
            Err(RegistryError::NotSoftDeleted { .. })
        ));
        store.soft_delete_version(&subject("s"), 1).unwrap();
        store.permanent_delete_version(&subject("s"), 1).unwrap();
        assert!(!store.subject_exists(&subject("s"), true).unwrap());
    }

    #[test]
    fn contexts_isolate_subjects() {
        let store = MemoryStore::new();
        let in_a = QualifiedSubject::new("A", "User");
        let in_b = QualifiedSubject::new("B", "User");
        store.insert_version(&in_a, new_schema("\"age\"")).unwrap();
        store.insert_version(&in_b, new_schema("\"email\"")).unwrap();

        let a_subjects = store.list_subjects("A", None, false, Page::all()).unwrap();
        assert_eq!(a_subjects, vec![in_a.clone()]);
        let binding = store
            .get_version(&in_a, VersionSelector::Latest, false)
            .unwrap()
            .unwrap();
        let schema = store.schema_by_id(binding.schema_id, false).unwrap().unwrap();
        assert_eq!(schema.canonical_text, "\"age\"");

        let contexts = store.list_contexts().unwrap();
        assert_eq!(contexts, vec![".".to_string(), "A".to_string(), "B".to_string()]);
    }

    #[test]
    fn referenced_by_sees_only_live_same_context_referrers() {
        let store = MemoryStore::new();
        let address = QualifiedSubject::new("C", "address");
        let order = QualifiedSubject::new("C", "order");
        store.insert_version(&address, new_schema("\"addr\"")).unwrap();

        let mut referring = new_schema("\"order\"");
        referring.references = vec![schemata_model::SchemaReference::new(
            "Address", "address", 1,
        )];
        referring.fingerprint =
            Fingerprint::compute(SchemaFormat::Avro, b"\"order\"", &referring.references);
        store.insert_version(&order, referring).unwrap();

        let referrers = store.referenced_by(&address, 1, Page::all()).unwrap();
        assert_eq!(referrers, vec![(order.clone(), 1)]);

        store.soft_delete_version(&order, 1).unwrap();
        assert!(store.referenced_by(&address, 1, Page::all()).unwrap().is_empty());
    }

    #[test]
    fn schema_visibility_follows_live_bindings() {
        let store = MemoryStore::new();
        let (id, _) = store.insert_version(&subject("s"), new_schema("\"a\"")).unwrap();
        assert!(store.schema_by_id(id, false).unwrap().is_some());

        store.soft_delete_version(&subject("s"), 1).unwrap();
        assert!(store.schema_by_id(id, false).unwrap().is_none());
        assert!(store.schema_by_id(id, true).unwrap().is_some());
    }

    #[test]
    fn config_and_mode_scopes_are_independent() {
        let store = MemoryStore::new();
        let scope = Scope::Subject(subject("s"));
        assert!(store.get_config(&scope).unwrap().is_none());

        store
            .set_config(
                &scope,
                ConfigEntry {
                    compatibility: schemata_model::CompatibilityLevel::Full,
                    normalize: None,
                },
            )
            .unwrap();
        assert!(store.get_config(&Scope::Global).unwrap().is_none());
        assert_eq!(
            store.get_config(&scope).unwrap().unwrap().compatibility,
            schemata_model::CompatibilityLevel::Full
        );

        store.set_mode(&Scope::Global, Mode::ReadOnly).unwrap();
        assert_eq!(store.get_mode(&Scope::Global).unwrap(), Some(Mode::ReadOnly));
        assert_eq!(store.get_mode(&scope).unwrap(), None);

        store.delete_config(&scope).unwrap();
        assert!(store.get_config(&scope).unwrap().is_none());
    }
}
