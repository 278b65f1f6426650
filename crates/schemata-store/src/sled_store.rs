//! Durable store backed by Sled.
//!
//! Record families live in separate trees:
//!
//! | Tree | Key | Value |
//! |------|-----|-------|
//! | `schemas` | schema id (BE bytes) | serialized [`StoredSchema`] |
//! | `subjects` | `context 0x1F name` | serialized [`SubjectState`] |
//! | `meta` | `global_config` / `global_mode` / `max_id` | serialized entry |
//!
//! On open the whole keyspace is replayed into an in-memory index; reads
//! are served from the index and every mutation writes through to the
//! trees before returning. The ID high-water mark is persisted so
//! monotonicity survives restarts.

use crate::memory::MemoryStore;
use crate::records::{ConfigEntry, NewSchema, StoredSchema, SubjectState, VersionBinding};
use crate::store::{Page, Scope, Store, VersionSelector};
use schemata_model::{Fingerprint, Mode, QualifiedSubject, RegistryError, Result};
use std::path::Path;
use tracing::{info, warn};

const SCHEMA_TREE: &str = "schemas";
const SUBJECT_TREE: &str = "subjects";
const META_TREE: &str = "meta";

/// Separator between context and subject name in subject keys. Context
/// names are restricted to `[A-Za-z0-9_-]` (or `.`), so the byte cannot
/// collide.
const KEY_SEPARATOR: u8 = 0x1F;

/// Registry storage persisted in a Sled database.
pub struct SledStore {
    db: sled::Db,
    schemas: sled::Tree,
    subjects: sled::Tree,
    meta: sled::Tree,
    index: MemoryStore,
}

impl SledStore {
    /// Open or create a database at the given path and rebuild the
    /// in-memory index from it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path).map_err(store_err)?;
        Self::from_db(db)
    }

    /// An in-memory database discarded on drop; for tests.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(store_err)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        let schemas = db.open_tree(SCHEMA_TREE).map_err(store_err)?;
        let subjects = db.open_tree(SUBJECT_TREE).map_err(store_err)?;
        let meta = db.open_tree(META_TREE).map_err(store_err)?;
        let index = MemoryStore::new();

        let mut schema_count = 0usize;
        for entry in schemas.iter() {
            let (_, value) = entry.map_err(store_err)?;
            let schema: StoredSchema = decode(&value)?;
            index.restore_schema(schema);
            schema_count += 1;
        }

        let mut subject_count = 0usize;
        for entry in subjects.iter() {
            let (key, value) = entry.map_err(store_err)?;
            let subject = decode_subject_key(&key)?;
            let state: SubjectState = decode(&value)?;
            index.restore_subject(&subject, state);
            subject_count += 1;
        }

        let global_config = match meta.get("global_config").map_err(store_err)? {
            Some(value) => Some(decode::<ConfigEntry>(&value)?),
            None => None,
        };
        let global_mode = match meta.get("global_mode").map_err(store_err)? {
            Some(value) => Some(decode::<Mode>(&value)?),
            None => None,
        };
        let max_id = match meta.get("max_id").map_err(store_err)? {
            Some(value) => decode::<i32>(&value)?,
            None => 0,
        };
        index.restore_meta(global_config, global_mode, max_id);

        info!(schema_count, subject_count, "opened schema store");
        Ok(SledStore {
            db,
            schemas,
            subjects,
            meta,
            index,
        })
    }

    /// Ensure all writes have reached disk.
    pub fn flush(&self) -> Result<()> {
        retry_once(|| self.db.flush())?;
        Ok(())
    }

    fn persist_subject(&self, subject: &QualifiedSubject) -> Result<()> {
        let key = subject_key(subject);
        match self.index.export_subject(subject) {
            Some(state) => {
                let value = encode(&state)?;
                retry_once(|| self.subjects.insert(key.clone(), value.clone()))?;
            }
            None => {
                retry_once(|| self.subjects.remove(key.clone()))?;
            }
        }
        Ok(())
    }

    fn persist_schema(&self, id: i32) -> Result<()> {
        if let Some(schema) = self.index.export_schema(id) {
            let value = encode(&schema)?;
            retry_once(|| self.schemas.insert(id.to_be_bytes(), value.clone()))?;
        }
        Ok(())
    }

    fn persist_meta(&self) -> Result<()> {
        let (config, mode, max_id) = self.index.export_meta();
        match config {
            Some(entry) => {
                let value = encode(&entry)?;
                retry_once(|| self.meta.insert("global_config", value.clone()))?;
            }
            None => {
                retry_once(|| self.meta.remove("global_config"))?;
            }
        }
        match mode {
            Some(entry) => {
                let value = encode(&entry)?;
                retry_once(|| self.meta.insert("global_mode", value.clone()))?;
            }
            None => {
                retry_once(|| self.meta.remove("global_mode"))?;
            }
        }
        let value = encode(&max_id)?;
        retry_once(|| self.meta.insert("max_id", value.clone()))?;
        Ok(())
    }
}

/// Transient database failures get one immediate retry before they
/// surface to the caller.
fn retry_once<T>(op: impl Fn() -> sled::Result<T>) -> Result<T> {
    match op() {
        Ok(value) => Ok(value),
        Err(first) => {
            warn!(error = %first, "store write failed, retrying once");
            op().map_err(store_err)
        }
    }
}

impl Store for SledStore {
    fn list_contexts(&self) -> Result<Vec<String>> {
        self.index.list_contexts()
    }

    fn list_subjects(
        &self,
        context: &str,
        name_prefix: Option<&str>,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<QualifiedSubject>> {
        self.index
            .list_subjects(context, name_prefix, include_deleted, page)
    }

    fn subject_exists(&self, subject: &QualifiedSubject, include_deleted: bool) -> Result<bool> {
        self.index.subject_exists(subject, include_deleted)
    }

    fn list_versions(
        &self,
        subject: &QualifiedSubject,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<u32>> {
        self.index.list_versions(subject, include_deleted, page)
    }

    fn get_version(
        &self,
        subject: &QualifiedSubject,
        selector: VersionSelector,
        include_deleted: bool,
    ) -> Result<Option<VersionBinding>> {
        self.index.get_version(subject, selector, include_deleted)
    }

    fn live_bindings(&self, subject: &QualifiedSubject) -> Result<Vec<VersionBinding>> {
        self.index.live_bindings(subject)
    }

    fn find_binding_by_fingerprint(
        &self,
        subject: &QualifiedSubject,
        fingerprint: &Fingerprint,
        include_deleted: bool,
    ) -> Result<Option<VersionBinding>> {
        self.index
            .find_binding_by_fingerprint(subject, fingerprint, include_deleted)
    }

    fn schema_by_id(&self, id: i32, include_deleted: bool) -> Result<Option<StoredSchema>> {
        self.index.schema_by_id(id, include_deleted)
    }

    fn schema_by_fingerprint(&self, fingerprint: &Fingerprint) -> Result<Option<StoredSchema>> {
        self.index.schema_by_fingerprint(fingerprint)
    }

    fn subjects_for_schema_id(
        &self,
        id: i32,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<QualifiedSubject>> {
        self.index.subjects_for_schema_id(id, include_deleted, page)
    }

    fn versions_for_schema_id(
        &self,
        id: i32,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<(QualifiedSubject, u32)>> {
        self.index.versions_for_schema_id(id, include_deleted, page)
    }

    fn referenced_by(
        &self,
        subject: &QualifiedSubject,
        version: u32,
        page: Page,
    ) -> Result<Vec<(QualifiedSubject, u32)>> {
        self.index.referenced_by(subject, version, page)
    }

    fn list_schemas(
        &self,
        context: &str,
        name_prefix: Option<&str>,
        page: Page,
    ) -> Result<Vec<(QualifiedSubject, VersionBinding, StoredSchema)>> {
        self.index.list_schemas(context, name_prefix, page)
    }

    fn insert_version(&self, subject: &QualifiedSubject, schema: NewSchema) -> Result<(i32, u32)> {
        let (id, version) = self.index.insert_version(subject, schema)?;
        self.persist_schema(id)?;
        self.persist_subject(subject)?;
        self.persist_meta()?;
        Ok((id, version))
    }

    fn soft_delete_version(&self, subject: &QualifiedSubject, version: u32) -> Result<()> {
        self.index.soft_delete_version(subject, version)?;
        self.persist_subject(subject)
    }

    fn permanent_delete_version(&self, subject: &QualifiedSubject, version: u32) -> Result<()> {
        self.index.permanent_delete_version(subject, version)?;
        self.persist_subject(subject)
    }

    fn soft_delete_subject(&self, subject: &QualifiedSubject) -> Result<Vec<u32>> {
        let versions = self.index.soft_delete_subject(subject)?;
        self.persist_subject(subject)?;
        Ok(versions)
    }

    fn permanent_delete_subject(&self, subject: &QualifiedSubject) -> Result<Vec<u32>> {
        let versions = self.index.permanent_delete_subject(subject)?;
        self.persist_subject(subject)?;
        Ok(versions)
    }

    fn get_config(&self, scope: &Scope) -> Result<Option<ConfigEntry>> {
        self.index.get_config(scope)
    }

    fn set_config(&self, scope: &Scope, entry: ConfigEntry) -> Result<()> {
        self.index.set_config(scope, entry)?;
        self.persist_scope(scope)
    }

    fn delete_config(&self, scope: &Scope) -> Result<()> {
        self.index.delete_config(scope)?;
        self.persist_scope(scope)
    }

    fn get_mode(&self, scope: &Scope) -> Result<Option<Mode>> {
        self.index.get_mode(scope)
    }

    fn set_mode(&self, scope: &Scope, mode: Mode) -> Result<()> {
        self.index.set_mode(scope, mode)?;
        self.persist_scope(scope)
    }

    fn delete_mode(&self, scope: &Scope) -> Result<()> {
        self.index.delete_mode(scope)?;
        self.persist_scope(scope)
    }
}

impl SledStore {
    fn persist_scope(&self, scope: &Scope) -> Result<()> {
        match scope {
            Scope::Global => self.persist_meta(),
            Scope::Subject(subject) => self.persist_subject(subject),
        }
    }
}

fn subject_key(subject: &QualifiedSubject) -> Vec<u8> {
    let mut key = Vec::with_capacity(subject.context.len() + 1 + subject.name.len());
    key.extend_from_slice(subject.context.as_bytes());
    key.push(KEY_SEPARATOR);
    key.extend_from_slice(subject.name.as_bytes());
    key
}

fn decode_subject_key(key: &[u8]) -> Result<QualifiedSubject> {
    let split = key
        .iter()
        .position(|byte| *byte == KEY_SEPARATOR)
        .ok_or_else(|| RegistryError::Store("malformed subject key".to_string()))?;
    let context = String::from_utf8(key[..split].to_vec())
        .map_err(|e| RegistryError::Store(e.to_string()))?;
    let name = String::from_utf8(key[split + 1..].to_vec())
        .map_err(|e| RegistryError::Store(e.to_string()))?;
    Ok(QualifiedSubject::new(context, name))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| RegistryError::Store(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| RegistryError::Store(e.to_string()))
}

fn store_err(error: sled::Error) -> RegistryError {
    RegistryError::Store(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemata_model::SchemaFormat;
    use tempfile::TempDir;

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

    #[test]
    fn state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let subject = QualifiedSubject::in_default_context("orders");

        let (id, version) = {
            let store = SledStore::open(dir.path().join("registry.db")).unwrap();
            let out = store.insert_version(&subject, new_schema("\"a\"")).unwrap();
            store
                .set_config(
                    &Scope::Global,
                    ConfigEntry {
                        compatibility: schemata_model::CompatibilityLevel::Full,
                        normalize: None,
                    },
                )
                .unwrap();
            store.flush().unwrap();
            out
        };

        let store = SledStore::open(dir.path().join("registry.db")).unwrap();
        let binding = store
            .get_version(&subject, VersionSelector::Number(version), false)
            .unwrap()
            .unwrap();
        assert_eq!(binding.schema_id, id);
        let schema = store.schema_by_id(id, false).unwrap().unwrap();
        assert_eq!(schema.canonical_text, "\"a\"");
        assert_eq!(
            store.get_config(&Scope::Global).unwrap().unwrap().compatibility,
            schemata_model::CompatibilityLevel::Full
        );
    }

    #[test]
    fn id_monotonicity_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let subject = QualifiedSubject::in_default_context("orders");

        {
            let store = SledStore::open(dir.path().join("registry.db")).unwrap();
            let mut imported = new_schema("\"imported\"");
            imported.id = Some(500);
            imported.version = Some(1);
            store.insert_version(&subject, imported).unwrap();
            store.flush().unwrap();
        }

        let store = SledStore::open(dir.path().join("registry.db")).unwrap();
        let (id, _) = store.insert_version(&subject, new_schema("\"next\"")).unwrap();
        assert!(id > 500);
    }

    #[test]
    fn temporary_store_works_without_a_path() {
        let store = SledStore::temporary().unwrap();
        let subject = QualifiedSubject::in_default_context("s");
        let (_, version) = store.insert_version(&subject, new_schema("\"x\"")).unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn deletes_write_through() {
        let dir = TempDir::new().unwrap();
        let subject = QualifiedSubject::in_default_context("s");
        {
            let store = SledStore::open(dir.path().join("db")).unwrap();
            store.insert_version(&subject, new_schema("\"x\"")).unwrap();
            store.soft_delete_subject(&subject).unwrap();
            store.flush().unwrap();
        }
        let store = SledStore::open(dir.path().join("db")).unwrap();
        assert!(!store.subject_exists(&subject, false).unwrap());
        assert!(store.subject_exists(&subject, true).unwrap());
    }
}
