//! Named-Collection Registry
//!
//! Maps collection names to independent Index Services, each backed by its
//! own `<name>.index` + `<name>_metadata.msgpack` pair in the registry
//! directory. Services stay resident once opened; distinct collections
//! share no locks.
//!
//! With `flush_on_write` every `add_to` persists the collection before
//! returning, so a named collection is never behind its files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use xmodal_core::{
    CollectionInfo, CollectionName, ExtraMetadata, Modality, SearchHit, XmodalError,
    XmodalResult,
};
use xmodal_durability::{
    collection_name_from_index_file, CollectionPaths, PersistenceManager, SaveOutcome,
};

use crate::collection::validate_collection_name;
use crate::service::{AddReceipt, IndexOptions, IndexService};

/// Registry tuning derived from `XmodalConfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryOptions {
    /// Options for every collection
    pub index: IndexOptions,
    /// Persist after every add
    pub flush_on_write: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        RegistryOptions {
            index: IndexOptions::default(),
            flush_on_write: true,
        }
    }
}

impl RegistryOptions {
    fn service_options(&self) -> IndexOptions {
        if self.flush_on_write {
            self.index.with_save_interval(1)
        } else {
            self.index
        }
    }
}

/// Named collections under one directory
#[derive(Debug)]
pub struct CollectionRegistry {
    root: PathBuf,
    options: RegistryOptions,
    collections: DashMap<String, Arc<IndexService>>,
}

impl CollectionRegistry {
    /// Open the registry rooted at `root`, creating the directory if needed
    ///
    /// Collections are loaded lazily on first access.
    pub fn open(root: impl Into<PathBuf>, options: RegistryOptions) -> XmodalResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            XmodalError::storage(format!("failed to create {}", root.display()), e)
        })?;
        info!(
            target: "xmodal::registry",
            root = %root.display(),
            flush_on_write = options.flush_on_write,
            "Collection registry opened"
        );
        Ok(CollectionRegistry {
            root,
            options,
            collections: DashMap::new(),
        })
    }

    /// Directory holding the collection files
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn paths(&self, name: &str) -> CollectionPaths {
        CollectionPaths::named(&self.root, name)
    }

    fn open_service(&self, name: &str) -> XmodalResult<IndexService> {
        IndexService::open(
            CollectionName::Named(name.to_string()),
            self.paths(name),
            self.options.service_options(),
        )
    }

    /// Create an empty collection and write its backing files
    pub fn create(&self, name: &str) -> XmodalResult<Arc<IndexService>> {
        validate_collection_name(name)?;
        match self.collections.entry(name.to_string()) {
            Entry::Occupied(_) => Err(XmodalError::AlreadyExists {
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                let paths = self.paths(name);
                if paths.vector_file().exists() || paths.metadata_file().exists() {
                    return Err(XmodalError::AlreadyExists {
                        name: name.to_string(),
                    });
                }
                PersistenceManager::new(paths).initialize_empty(self.options.index.dimension)?;
                let service = Arc::new(self.open_service(name)?);
                slot.insert(Arc::clone(&service));
                info!(target: "xmodal::registry", collection = name, "Collection created");
                Ok(service)
            }
        }
    }

    /// Names of the collections on disk, sorted
    pub fn list(&self) -> XmodalResult<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            XmodalError::storage(format!("failed to list {}", self.root.display()), e)
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                XmodalError::storage(format!("failed to list {}", self.root.display()), e)
            })?;
            if let Some(name) = collection_name_from_index_file(&entry.path()) {
                if validate_collection_name(&name).is_ok() {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Resident service for `name`, loading it from disk if needed
    pub fn get(&self, name: &str) -> XmodalResult<Arc<IndexService>> {
        validate_collection_name(name)?;
        if let Some(service) = self.collections.get(name) {
            return Ok(Arc::clone(service.value()));
        }
        match self.collections.entry(name.to_string()) {
            Entry::Occupied(existing) => Ok(Arc::clone(existing.get())),
            Entry::Vacant(slot) => {
                let paths = self.paths(name);
                if !paths.vector_file().is_file() || !paths.metadata_file().is_file() {
                    return Err(XmodalError::not_found(format!("collection {name}")));
                }
                let service = Arc::new(self.open_service(name)?);
                slot.insert(Arc::clone(&service));
                debug!(
                    target: "xmodal::registry",
                    collection = name,
                    items = service.len(),
                    "Collection loaded"
                );
                Ok(service)
            }
        }
    }

    /// Add an embedding to `name`
    pub fn add_to(
        &self,
        name: &str,
        source_path: &str,
        embedding: &[f32],
        modality: Modality,
        extra: ExtraMetadata,
    ) -> XmodalResult<AddReceipt> {
        self.get(name)?.add(source_path, embedding, modality, extra)
    }

    /// Search within `name`
    pub fn search_in(&self, name: &str, embedding: &[f32], k: usize) -> XmodalResult<Vec<SearchHit>> {
        self.get(name)?.search(embedding, k)
    }

    /// Summary of `name`
    pub fn info(&self, name: &str) -> XmodalResult<CollectionInfo> {
        Ok(self.get(name)?.info())
    }

    /// Persist `name` now
    pub fn flush(&self, name: &str) -> XmodalResult<SaveOutcome> {
        self.get(name)?.save()
    }

    /// Persist every resident collection
    ///
    /// All collections are attempted; the first error is returned.
    pub fn flush_all(&self) -> XmodalResult<usize> {
        let services: Vec<(String, Arc<IndexService>)> = self
            .collections
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();

        let mut saved = 0;
        let mut first_error = None;
        for (name, service) in services {
            match service.save() {
                Ok(outcome) => {
                    if outcome.is_saved() {
                        saved += 1;
                    }
                }
                Err(e) => {
                    warn!(
                        target: "xmodal::registry",
                        collection = %name,
                        error = %e,
                        "Flush failed"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(saved),
        }
    }

    /// Delete `name` from disk and memory
    ///
    /// The map entry is held while the files are removed, so a concurrent
    /// `get` cannot reload the collection from files about to disappear.
    pub fn drop_collection(&self, name: &str) -> XmodalResult<()> {
        validate_collection_name(name)?;
        match self.collections.entry(name.to_string()) {
            Entry::Occupied(resident) => {
                resident.get().reset()?;
                resident.remove();
            }
            Entry::Vacant(_absent) => {
                let persistence = PersistenceManager::new(self.paths(name));
                if !persistence.paths().vector_file().exists()
                    && !persistence.paths().metadata_file().exists()
                {
                    return Err(XmodalError::not_found(format!("collection {name}")));
                }
                persistence.reset()?;
            }
        }
        info!(target: "xmodal::registry", collection = name, "Collection dropped");
        Ok(())
    }

    /// Names of collections currently held in memory, sorted
    pub fn resident(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
