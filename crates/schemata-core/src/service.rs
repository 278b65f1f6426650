//! The registration and lifecycle service.
//!
//! [`SchemaRegistry`] is the engine behind the HTTP surface: every
//! operation here corresponds to one endpoint. The preamble of each
//! mutating call resolves the effective mode (subject overlay, then
//! global) and rejects what the mode forbids; registration then runs
//! reference resolution, canonicalization, fingerprint dedup and the
//! compatibility policy before a single store commit.
//!
//! Writes to one subject are serialized by a per-subject async mutex
//! around the compute-verdict-then-commit section. Nothing is written
//! before that commit call, so a caller dropping the future early
//! observes no state change.

use crate::format::{self, canonicalize};
use crate::policy::{self, HistoricalVersion};
use crate::resolver::resolve_references;
use schemata_model::{
    CompatibilityCheckResponse, CompatibilityLevel, ConfigRequest, ConfigResponse, Mode, ModeBody,
    QualifiedSubject, RegisterSchemaRequest, RegisterSchemaResponse, RegistryError, Result,
    SchemaByIdResponse, SchemaFormat, SchemaListEntry, SchemaVersionResponse, SubjectVersionPair,
    DEFAULT_CONTEXT,
};
use schemata_store::{
    ConfigEntry, MemoryStore, NewSchema, Page, Scope, Store, StoredSchema, VersionBinding,
    VersionSelector,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Target of a compatibility check.
enum CheckTarget {
    Latest,
    Version(u32),
    /// Every live version (`POST /compatibility/subjects/{s}/versions`).
    All,
}

/// The schema registry engine.
pub struct SchemaRegistry {
    store: Arc<dyn Store>,
    locks: Mutex<HashMap<QualifiedSubject, Arc<tokio::sync::Mutex<()>>>>,
}

impl SchemaRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        SchemaRegistry {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// A registry over a fresh in-memory store; for tests and tools.
    pub fn in_memory() -> Self {
        SchemaRegistry::new(Arc::new(MemoryStore::new()))
    }

    // -----------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------

    /// `POST /subjects/{subject}/versions`
    pub async fn register(
        &self,
        subject: &str,
        request: &RegisterSchemaRequest,
    ) -> Result<RegisterSchemaResponse> {
        let subject = QualifiedSubject::parse(subject)?;
        let mode = self.effective_mode(Some(&subject))?;
        match mode {
            Mode::ReadOnly => Err(mode_forbids(&subject, mode, "registering a schema")),
            Mode::Import => self.register_import(&subject, request).await,
            Mode::ReadWrite => self.register_normal(&subject, request).await,
        }
    }

    async fn register_normal(
        &self,
        subject: &QualifiedSubject,
        request: &RegisterSchemaRequest,
    ) -> Result<RegisterSchemaResponse> {
        if request.id.is_some() || request.version.is_some() {
            return Err(mode_forbids(
                subject,
                Mode::ReadWrite,
                "supplying an explicit id or version",
            ));
        }

        let lock = self.subject_lock(subject);
        let _guard = lock.lock().await;

        let closure =
            resolve_references(self.store.as_ref(), &subject.context, &request.references, false)?;
        let (candidate, canonical, fingerprint) = canonicalize(
            request.format(),
            &request.schema,
            &request.references,
            &closure,
        )?;

        // Idempotent retry: the same canonical schema under the same
        // subject returns the existing binding.
        if let Some(binding) =
            self.store
                .find_binding_by_fingerprint(subject, &fingerprint, false)?
        {
            debug!(subject = %subject, id = binding.schema_id, "dedup hit");
            return Ok(RegisterSchemaResponse {
                id: binding.schema_id,
                version: binding.version,
            });
        }

        let config = self.effective_config(Some(subject))?;
        if config.compatibility != CompatibilityLevel::None {
            let history = self.parsed_history(subject)?;
            let verdict = policy::evaluate(config.compatibility, &candidate, &history);
            if !verdict.is_compatible() {
                warn!(
                    subject = %subject,
                    level = %config.compatibility,
                    "registration rejected as incompatible"
                );
                return Err(RegistryError::IncompatibleSchema {
                    messages: verdict.messages().to_vec(),
                });
            }
        }

        let (id, version) = self.store.insert_version(
            subject,
            NewSchema {
                format: request.format(),
                schema_text: request.schema.clone(),
                canonical_text: canonical,
                fingerprint,
                references: request.references.clone(),
                id: None,
                version: None,
            },
        )?;
        info!(subject = %subject, id, version, "registered schema");
        Ok(RegisterSchemaResponse { id, version })
    }

    async fn register_import(
        &self,
        subject: &QualifiedSubject,
        request: &RegisterSchemaRequest,
    ) -> Result<RegisterSchemaResponse> {
        let Some(id) = request.id else {
            return Err(RegistryError::BadRequest(
                "import registration requires an explicit id".to_string(),
            ));
        };

        let lock = self.subject_lock(subject);
        let _guard = lock.lock().await;

        let closure =
            resolve_references(self.store.as_ref(), &subject.context, &request.references, false)?;
        let (_, canonical, fingerprint) = canonicalize(
            request.format(),
            &request.schema,
            &request.references,
            &closure,
        )?;

        // Policy checks are bypassed in import mode.
        let (id, version) = self.store.insert_version(
            subject,
            NewSchema {
                format: request.format(),
                schema_text: request.schema.clone(),
                canonical_text: canonical,
                fingerprint,
                references: request.references.clone(),
                id: Some(id),
                version: request.version,
            },
        )?;
        info!(subject = %subject, id, version, "imported schema");
        Ok(RegisterSchemaResponse { id, version })
    }

    /// `POST /subjects/{subject}`: find the version binding of an
    /// already-registered schema.
    pub async fn lookup(
        &self,
        subject: &str,
        request: &RegisterSchemaRequest,
    ) -> Result<SchemaVersionResponse> {
        let subject = QualifiedSubject::parse(subject)?;
        let mode = self.effective_mode(Some(&subject))?;
        if mode == Mode::Import {
            return Err(mode_forbids(&subject, mode, "schema lookup"));
        }

        let closure =
            resolve_references(self.store.as_ref(), &subject.context, &request.references, false)?;
        let (_, _, fingerprint) = canonicalize(
            request.format(),
            &request.schema,
            &request.references,
            &closure,
        )?;

        match self
            .store
            .find_binding_by_fingerprint(&subject, &fingerprint, false)?
        {
            Some(binding) => {
                let schema = self.stored_schema(binding.schema_id)?;
                Ok(version_response(&subject, binding, schema))
            }
            None => {
                if self.store.subject_exists(&subject, false)? {
                    Err(RegistryError::SchemaNotRegistered(subject.qualified_name()))
                } else {
                    Err(RegistryError::SubjectNotFound(subject.qualified_name()))
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Compatibility
    // -----------------------------------------------------------------

    /// `POST /compatibility/subjects/{subject}/versions[/{v}]`
    pub async fn check_compatibility(
        &self,
        subject: &str,
        version: &str,
        request: &RegisterSchemaRequest,
        verbose: bool,
    ) -> Result<CompatibilityCheckResponse> {
        let subject = QualifiedSubject::parse(subject)?;
        let target = match version.trim() {
            "" | "all" => CheckTarget::All,
            "latest" | "-1" => CheckTarget::Latest,
            v => CheckTarget::Version(parse_version_number(v)?),
        };

        let closure =
            resolve_references(self.store.as_ref(), &subject.context, &request.references, false)?;
        let (candidate, _, _) = canonicalize(
            request.format(),
            &request.schema,
            &request.references,
            &closure,
        )?;

        let bindings = self.store.live_bindings(&subject)?;
        if bindings.is_empty() {
            return Err(RegistryError::SubjectNotFound(subject.qualified_name()));
        }

        let level = self.effective_config(Some(&subject))?.compatibility;
        let (level, history) = match target {
            CheckTarget::All => (
                transitive(level),
                self.parsed_history(&subject)?,
            ),
            CheckTarget::Latest => {
                let binding = bindings[bindings.len() - 1];
                (level, vec![self.parsed_version(&subject, binding)?])
            }
            CheckTarget::Version(number) => {
                let binding = bindings
                    .iter()
                    .find(|binding| binding.version == number)
                    .copied()
                    .ok_or_else(|| RegistryError::VersionNotFound {
                        subject: subject.qualified_name(),
                        version: number,
                    })?;
                (level, vec![self.parsed_version(&subject, binding)?])
            }
        };

        let verdict = policy::evaluate(level, &candidate, &history);
        Ok(CompatibilityCheckResponse {
            is_compatible: verdict.is_compatible(),
            messages: verbose.then(|| verdict.messages().to_vec()),
        })
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    /// `GET /subjects/{subject}/versions/{version}`
    pub async fn get_version(
        &self,
        subject: &str,
        version: &str,
        include_deleted: bool,
    ) -> Result<SchemaVersionResponse> {
        let subject = QualifiedSubject::parse(subject)?;
        let selector = parse_version_selector(version)?;
        let binding = self.find_binding(&subject, selector, include_deleted)?;
        let schema = self.stored_schema(binding.schema_id)?;
        Ok(version_response(&subject, binding, schema))
    }

    /// `GET /subjects/{subject}/versions/{version}/schema`
    pub async fn get_version_schema(&self, subject: &str, version: &str) -> Result<String> {
        let subject = QualifiedSubject::parse(subject)?;
        let selector = parse_version_selector(version)?;
        let binding = self.find_binding(&subject, selector, false)?;
        Ok(self.stored_schema(binding.schema_id)?.canonical_text)
    }

    /// `GET /subjects`
    pub async fn list_subjects(
        &self,
        prefix: Option<&str>,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<String>> {
        let (context, name_prefix) = split_subject_prefix(prefix)?;
        let subjects =
            self.store
                .list_subjects(&context, name_prefix.as_deref(), include_deleted, page)?;
        Ok(subjects
            .into_iter()
            .map(|subject| subject.qualified_name())
            .collect())
    }

    /// `GET /subjects/{subject}/versions`
    pub async fn list_versions(
        &self,
        subject: &str,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<u32>> {
        let subject = QualifiedSubject::parse(subject)?;
        if !self.store.subject_exists(&subject, include_deleted)? {
            return Err(RegistryError::SubjectNotFound(subject.qualified_name()));
        }
        self.store.list_versions(&subject, include_deleted, page)
    }

    /// `GET /subjects/{subject}/versions/{version}/referencedby`
    pub async fn referenced_by(
        &self,
        subject: &str,
        version: &str,
        page: Page,
    ) -> Result<Vec<SubjectVersionPair>> {
        let subject = QualifiedSubject::parse(subject)?;
        let selector = parse_version_selector(version)?;
        let binding = self.find_binding(&subject, selector, true)?;
        let referrers = self.store.referenced_by(&subject, binding.version, page)?;
        Ok(referrers
            .into_iter()
            .map(|(referrer, version)| SubjectVersionPair {
                subject: referrer.qualified_name(),
                version,
            })
            .collect())
    }

    /// `GET /schemas/ids/{id}`
    pub async fn schema_by_id(
        &self,
        id: i32,
        include_deleted: bool,
    ) -> Result<SchemaByIdResponse> {
        let schema = self
            .store
            .schema_by_id(id, include_deleted)?
            .ok_or(RegistryError::SchemaNotFound(id))?;
        Ok(SchemaByIdResponse {
            schema: schema.schema_text,
            schema_type: wire_format(schema.format),
            references: schema.references,
        })
    }

    /// `GET /schemas/ids/{id}/subjects`
    pub async fn subjects_for_id(
        &self,
        id: i32,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<String>> {
        self.stored_schema(id)?;
        let subjects = self.store.subjects_for_schema_id(id, include_deleted, page)?;
        Ok(subjects
            .into_iter()
            .map(|subject| subject.qualified_name())
            .collect())
    }

    /// `GET /schemas/ids/{id}/versions`
    pub async fn versions_for_id(
        &self,
        id: i32,
        include_deleted: bool,
        page: Page,
    ) -> Result<Vec<SubjectVersionPair>> {
        self.stored_schema(id)?;
        let pairs = self.store.versions_for_schema_id(id, include_deleted, page)?;
        Ok(pairs
            .into_iter()
            .map(|(subject, version)| SubjectVersionPair {
                subject: subject.qualified_name(),
                version,
            })
            .collect())
    }

    /// `GET /schemas`
    pub async fn list_schemas(
        &self,
        prefix: Option<&str>,
        page: Page,
    ) -> Result<Vec<SchemaListEntry>> {
        let (context, name_prefix) = split_subject_prefix(prefix)?;
        let rows = self
            .store
            .list_schemas(&context, name_prefix.as_deref(), page)?;
        Ok(rows
            .into_iter()
            .map(|(subject, binding, schema)| SchemaListEntry {
                subject: subject.qualified_name(),
                version: binding.version,
                id: schema.id,
                schema: schema.schema_text,
                schema_type: wire_format(schema.format),
                references: schema.references,
            })
            .collect())
    }

    /// `GET /contexts`
    pub async fn contexts(&self) -> Result<Vec<String>> {
        self.store.list_contexts()
    }

    /// `GET /schemas/types`
    pub fn schema_types(&self) -> Vec<&'static str> {
        SchemaFormat::ALL.iter().map(|format| format.as_str()).collect()
    }

    // -----------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------

    /// `DELETE /subjects/{subject}[?permanent=]`
    pub async fn delete_subject(&self, subject: &str, permanent: bool) -> Result<Vec<u32>> {
        let subject = QualifiedSubject::parse(subject)?;
        let mode = self.effective_mode(Some(&subject))?;
        if mode == Mode::ReadOnly {
            return Err(mode_forbids(&subject, mode, "deleting a subject"));
        }

        let lock = self.subject_lock(&subject);
        let _guard = lock.lock().await;

        let versions = self.store.list_versions(&subject, true, Page::all())?;
        if versions.is_empty() {
            return Err(RegistryError::SubjectNotFound(subject.qualified_name()));
        }
        for version in &versions {
            self.ensure_unreferenced(&subject, *version, true)?;
        }

        let deleted = if permanent {
            self.store.permanent_delete_subject(&subject)?
        } else {
            self.store.soft_delete_subject(&subject)?
        };
        info!(subject = %subject, permanent, "deleted subject");
        Ok(deleted)
    }

    /// `DELETE /subjects/{subject}/versions/{version}[?permanent=]`
    pub async fn delete_version(
        &self,
        subject: &str,
        version: &str,
        permanent: bool,
    ) -> Result<u32> {
        let subject = QualifiedSubject::parse(subject)?;
        let mode = self.effective_mode(Some(&subject))?;
        if mode == Mode::ReadOnly {
            return Err(mode_forbids(&subject, mode, "deleting a version"));
        }

        let lock = self.subject_lock(&subject);
        let _guard = lock.lock().await;

        let selector = parse_version_selector(version)?;
        let binding = self.find_binding(&subject, selector, permanent)?;
        self.ensure_unreferenced(&subject, binding.version, false)?;

        if permanent {
            self.store
                .permanent_delete_version(&subject, binding.version)?;
        } else {
            self.store.soft_delete_version(&subject, binding.version)?;
        }
        info!(subject = %subject, version = binding.version, permanent, "deleted version");
        Ok(binding.version)
    }

    // -----------------------------------------------------------------
    // Config & mode
    // -----------------------------------------------------------------

    /// `GET /config[/{subject}]`
    pub async fn get_config(&self, subject: Option<&str>) -> Result<ConfigResponse> {
        let subject = subject.map(QualifiedSubject::parse).transpose()?;
        let entry = self.effective_config(subject.as_ref())?;
        Ok(config_response(entry))
    }

    /// `PUT /config[/{subject}]`
    pub async fn set_config(
        &self,
        subject: Option<&str>,
        request: &ConfigRequest,
    ) -> Result<ConfigResponse> {
        let scope = parse_scope(subject)?;
        let entry = ConfigEntry {
            compatibility: request.compatibility,
            normalize: request.normalize,
        };
        self.store.set_config(&scope, entry)?;
        info!(?scope, level = %entry.compatibility, "updated compatibility config");
        Ok(config_response(entry))
    }

    /// `DELETE /config[/{subject}]`: drop the override, report the
    /// now-effective config.
    pub async fn delete_config(&self, subject: Option<&str>) -> Result<ConfigResponse> {
        let scope = parse_scope(subject)?;
        self.store.delete_config(&scope)?;
        let subject = match &scope {
            Scope::Global => None,
            Scope::Subject(subject) => Some(subject.clone()),
        };
        let entry = self.effective_config(subject.as_ref())?;
        Ok(config_response(entry))
    }

    /// `GET /mode[/{subject}]`
    pub async fn get_mode(&self, subject: Option<&str>) -> Result<ModeBody> {
        let subject = subject.map(QualifiedSubject::parse).transpose()?;
        Ok(ModeBody {
            mode: self.effective_mode(subject.as_ref())?,
        })
    }

    /// `PUT /mode[/{subject}][?force=]`
    pub async fn set_mode(
        &self,
        subject: Option<&str>,
        mode: Mode,
        force: bool,
    ) -> Result<ModeBody> {
        let scope = parse_scope(subject)?;
        let current = match &scope {
            Scope::Global => self.effective_mode(None)?,
            Scope::Subject(subject) => self.effective_mode(Some(subject))?,
        };

        // Entering or leaving IMPORT with schemas present loses the
        // id-allocation audit trail; the caller must say so explicitly.
        let import_toggle = (mode == Mode::Import) != (current == Mode::Import);
        if import_toggle && !force {
            let has_schemas = match &scope {
                Scope::Global => self.has_any_subjects()?,
                Scope::Subject(subject) => self.store.subject_exists(subject, true)?,
            };
            if has_schemas {
                let subject_name = match &scope {
                    Scope::Global => DEFAULT_CONTEXT.to_string(),
                    Scope::Subject(subject) => subject.qualified_name(),
                };
                return Err(RegistryError::ModeForbidsOperation {
                    subject: subject_name,
                    mode: current.to_string(),
                    operation: format!("changing mode to {mode} without force"),
                });
            }
        }

        self.store.set_mode(&scope, mode)?;
        info!(?scope, %mode, "updated mode");
        Ok(ModeBody { mode })
    }

    /// `DELETE /mode/{subject}`: drop the override, report the
    /// now-effective mode.
    pub async fn delete_mode(&self, subject: &str) -> Result<ModeBody> {
        let parsed = QualifiedSubject::parse(subject)?;
        self.store
            .delete_mode(&Scope::Subject(parsed.clone()))?;
        Ok(ModeBody {
            mode: self.effective_mode(Some(&parsed))?,
        })
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn subject_lock(&self, subject: &QualifiedSubject) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(subject.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Subject overlay, then global, then the default.
    fn effective_mode(&self, subject: Option<&QualifiedSubject>) -> Result<Mode> {
        if let Some(subject) = subject {
            if let Some(mode) = self
                .store
                .get_mode(&Scope::Subject(subject.clone()))?
            {
                return Ok(mode);
            }
        }
        Ok(self
            .store
            .get_mode(&Scope::Global)?
            .unwrap_or_default())
    }

    fn effective_config(&self, subject: Option<&QualifiedSubject>) -> Result<ConfigEntry> {
        if let Some(subject) = subject {
            if let Some(entry) = self
                .store
                .get_config(&Scope::Subject(subject.clone()))?
            {
                return Ok(entry);
            }
        }
        Ok(self
            .store
            .get_config(&Scope::Global)?
            .unwrap_or_default())
    }

    fn stored_schema(&self, id: i32) -> Result<StoredSchema> {
        self.store
            .schema_by_id(id, true)?
            .ok_or(RegistryError::SchemaNotFound(id))
    }

    fn find_binding(
        &self,
        subject: &QualifiedSubject,
        selector: VersionSelector,
        include_deleted: bool,
    ) -> Result<VersionBinding> {
        match self.store.get_version(subject, selector, include_deleted)? {
            Some(binding) => Ok(binding),
            None => {
                let exists = self.store.subject_exists(subject, true)?;
                Err(match selector {
                    VersionSelector::Number(version) if exists => {
                        RegistryError::VersionNotFound {
                            subject: subject.qualified_name(),
                            version,
                        }
                    }
                    _ => RegistryError::SubjectNotFound(subject.qualified_name()),
                })
            }
        }
    }

    /// Every live version parsed into its comparison model, ascending.
    fn parsed_history(&self, subject: &QualifiedSubject) -> Result<Vec<HistoricalVersion>> {
        self.store
            .live_bindings(subject)?
            .into_iter()
            .map(|binding| self.parsed_version(subject, binding))
            .collect()
    }

    fn parsed_version(
        &self,
        subject: &QualifiedSubject,
        binding: VersionBinding,
    ) -> Result<HistoricalVersion> {
        let schema = self.stored_schema(binding.schema_id)?;
        // Dependencies of a historical version may have been
        // soft-deleted since it was registered.
        let closure = resolve_references(
            self.store.as_ref(),
            &subject.context,
            &schema.references,
            true,
        )?;
        let parsed = format::parse_with_closure(
            schema.format,
            &schema.schema_text,
            &schema.references,
            &closure,
        )?;
        Ok(HistoricalVersion {
            version: binding.version,
            schema: parsed,
        })
    }

    /// Fail with `REFERENCE_EXISTS` when a live schema outside the
    /// delete target still references `(subject, version)`. For a
    /// subject-wide delete, referrers inside the subject go down with
    /// it and do not block.
    fn ensure_unreferenced(
        &self,
        subject: &QualifiedSubject,
        version: u32,
        whole_subject: bool,
    ) -> Result<()> {
        let referrers = self.store.referenced_by(subject, version, Page::all())?;
        let blocking = referrers
            .iter()
            .any(|(referrer, _)| !whole_subject || referrer != subject);
        if blocking {
            return Err(RegistryError::ReferenceExists {
                subject: subject.qualified_name(),
                version,
            });
        }
        Ok(())
    }

    fn has_any_subjects(&self) -> Result<bool> {
        for context in self.store.list_contexts()? {
            let subjects =
                self.store
                    .list_subjects(&context, None, true, Page::new(0, Some(1)))?;
            if !subjects.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn mode_forbids(subject: &QualifiedSubject, mode: Mode, operation: &str) -> RegistryError {
    RegistryError::ModeForbidsOperation {
        subject: subject.qualified_name(),
        mode: mode.to_string(),
        operation: operation.to_string(),
    }
}

fn parse_scope(subject: Option<&str>) -> Result<Scope> {
    Ok(match subject {
        None => Scope::Global,
        Some(subject) => Scope::Subject(QualifiedSubject::parse(subject)?),
    })
}

fn parse_version_selector(version: &str) -> Result<VersionSelector> {
    match version.trim() {
        "latest" | "-1" => Ok(VersionSelector::Latest),
        other => Ok(VersionSelector::Number(parse_version_number(other)?)),
    }
}

fn parse_version_number(version: &str) -> Result<u32> {
    match version.parse::<u32>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(RegistryError::InvalidVersion(version.to_string())),
    }
}

/// Context and name-prefix filter for a listing, from a (possibly
/// context-qualified) `subjectPrefix` parameter.
fn split_subject_prefix(prefix: Option<&str>) -> Result<(String, Option<String>)> {
    let Some(prefix) = prefix else {
        return Ok((DEFAULT_CONTEXT.to_string(), None));
    };
    if let Some(rest) = prefix.strip_prefix(":.") {
        // `:.ctx:name-prefix`, `:.ctx:` or `:.ctx` all select `ctx`.
        let (context, name_prefix) = match rest.split_once(':') {
            Some((context, name)) => (context, (!name.is_empty()).then(|| name.to_string())),
            None => (rest, None),
        };
        let context = context.strip_suffix('.').unwrap_or(context);
        if context.is_empty() {
            return Ok((DEFAULT_CONTEXT.to_string(), name_prefix));
        }
        schemata_model::validate_context_name(context)?;
        return Ok((context.to_string(), name_prefix));
    }
    Ok((DEFAULT_CONTEXT.to_string(), Some(prefix.to_string())))
}

fn version_response(
    subject: &QualifiedSubject,
    binding: VersionBinding,
    schema: StoredSchema,
) -> SchemaVersionResponse {
    SchemaVersionResponse {
        subject: subject.qualified_name(),
        version: binding.version,
        id: schema.id,
        schema: schema.schema_text,
        schema_type: wire_format(schema.format),
        references: schema.references,
    }
}

fn config_response(entry: ConfigEntry) -> ConfigResponse {
    ConfigResponse {
        compatibility_level: entry.compatibility,
        normalize: entry.normalize,
    }
}

/// `schemaType` is omitted on the wire for the default format.
fn wire_format(format: SchemaFormat) -> Option<SchemaFormat> {
    (format != SchemaFormat::Avro).then_some(format)
}

fn transitive(level: CompatibilityLevel) -> CompatibilityLevel {
    match level {
        CompatibilityLevel::Backward => CompatibilityLevel::BackwardTransitive,
        CompatibilityLevel::Forward => CompatibilityLevel::ForwardTransitive,
        CompatibilityLevel::Full => CompatibilityLevel::FullTransitive,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_selectors_parse() {
        assert_eq!(
            parse_version_selector("latest").unwrap(),
            VersionSelector::Latest
        );
        assert_eq!(parse_version_selector("-1").unwrap(), VersionSelector::Latest);
        assert_eq!(
            parse_version_selector("3").unwrap(),
            VersionSelector::Number(3)
        );
        assert!(parse_version_selector("0").is_err());
        assert!(parse_version_selector("abc").is_err());
    }

    #[test]
    fn subject_prefix_splits_context() {
        assert_eq!(
            split_subject_prefix(None).unwrap(),
            (".".to_string(), None)
        );
        assert_eq!(
            split_subject_prefix(Some("orders")).unwrap(),
            (".".to_string(), Some("orders".to_string()))
        );
        assert_eq!(
            split_subject_prefix(Some(":.prod:orders")).unwrap(),
            ("prod".to_string(), Some("orders".to_string()))
        );
        assert_eq!(
            split_subject_prefix(Some(":.prod:")).unwrap(),
            ("prod".to_string(), None)
        );
        assert_eq!(
            split_subject_prefix(Some(":.prod")).unwrap(),
            ("prod".to_string(), None)
        );
    }

    #[test]
    fn transitive_promotion_covers_directional_levels() {
        assert_eq!(
            transitive(CompatibilityLevel::Backward),
            CompatibilityLevel::BackwardTransitive
        );
        assert_eq!(
            transitive(CompatibilityLevel::None),
            CompatibilityLevel::None
        );
    }
}
