//! Model Registry - binds entity names to definitions and the shared backend

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use molti_validation::{JsonSchemaValidator, Validator};

use crate::backends::{MemoryBackend, PostgresBackend, QueryBackend};
use crate::config::ConnectionConfig;
use crate::error::{ModelError, ModelResult};
use crate::model::{Model, ModelDefinition};
use crate::relationships::{infer_descriptor, RelationshipDescriptor};

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

struct RegistryInner {
    id: u64,
    entities: DashMap<String, Arc<ModelDefinition>>,
    descriptors: DashMap<(String, String), Arc<RelationshipDescriptor>>,
    backend: Arc<dyn QueryBackend>,
    validator: Arc<dyn Validator>,
}

/// Process-scoped mapping of entity names to definitions.
///
/// Cloning is cheap; clones share the same entities, descriptor cache and
/// backend handle.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// Registry over `backend` using the default JSON-Schema validator
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self::with_validator(backend, Arc::new(JsonSchemaValidator::new()))
    }

    pub fn with_validator(backend: Arc<dyn QueryBackend>, validator: Arc<dyn Validator>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
                entities: DashMap::new(),
                descriptors: DashMap::new(),
                backend,
                validator,
            }),
        }
    }

    /// Open the configured backend and register `definitions` in order
    pub async fn connect<I, D>(config: ConnectionConfig, definitions: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<Arc<ModelDefinition>>,
    {
        let backend: Arc<dyn QueryBackend> = match config {
            ConnectionConfig::Memory => Arc::new(MemoryBackend::new()),
            ConnectionConfig::Postgres(database) => Arc::new(PostgresBackend::connect(&database).await?),
        };

        let registry = Self::new(backend);
        for definition in definitions {
            registry.register(definition)?;
        }

        tracing::info!(
            backend = registry.inner.backend.backend_name(),
            models = registry.inner.entities.len(),
            "registry connected"
        );
        Ok(registry)
    }

    /// Bind a definition to this registry and return its handle
    pub fn register(&self, definition: impl Into<Arc<ModelDefinition>>) -> ModelResult<Model> {
        let definition = definition.into();
        definition.bind_registry(self.inner.id)?;

        let name = definition.name().to_string();
        if self.inner.entities.insert(name.clone(), definition.clone()).is_some() {
            tracing::warn!(model = %name, "model re-registered, replacing previous definition");
            self.inner
                .descriptors
                .retain(|(owner, _), descriptor| owner != &name && descriptor.related.name() != name);
        }
        tracing::debug!(model = %name, table = %definition.table_name(), "model registered");

        Ok(Model::new(self.clone(), definition))
    }

    pub fn model(&self, name: &str) -> ModelResult<Model> {
        self.definition(name).map(|definition| Model::new(self.clone(), definition))
    }

    pub fn definition(&self, name: &str) -> ModelResult<Arc<ModelDefinition>> {
        self.inner
            .entities
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ModelError::UnknownEntity(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.entities.contains_key(name)
    }

    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.entities.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Normalized descriptor for `relationship` declared on `owner`.
    ///
    /// The target entity is looked up lazily so that definitions may refer
    /// to entities registered after them.
    pub fn descriptor(&self, owner: &ModelDefinition, relationship: &str) -> ModelResult<Arc<RelationshipDescriptor>> {
        let key = (owner.name().to_string(), relationship.to_string());
        if let Some(descriptor) = self.inner.descriptors.get(&key) {
            return Ok(descriptor.value().clone());
        }

        let field = owner
            .relationship(relationship)
            .ok_or_else(|| ModelError::UnknownRelationship {
                entity: owner.name().to_string(),
                relationship: relationship.to_string(),
            })?;
        let related = self.definition(&field.related_model_name())?;
        let descriptor = Arc::new(infer_descriptor(owner, field, related)?);

        self.inner.descriptors.insert(key, descriptor.clone());
        Ok(descriptor)
    }

    pub fn backend(&self) -> &Arc<dyn QueryBackend> {
        &self.inner.backend
    }

    pub fn validator(&self) -> &Arc<dyn Validator> {
        &self.inner.validator
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.inner.id)
            .field("backend", &self.inner.backend.backend_name())
            .field("models", &self.model_names())
            .finish()
    }
}
