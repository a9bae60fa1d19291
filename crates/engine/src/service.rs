//! Index Service
//!
//! Façade owning one collection and its Persistence Manager. Every public
//! operation takes the collection lock once: `add`, `reset` and `save` hold
//! the write lock for their full duration (persistence included), read-only
//! operations hold the read lock.
//!
//! ## Checkpoints
//!
//! After a successful add the service saves when the item count is a
//! multiple of `save_interval`. A failed checkpoint is reported in the
//! receipt and logged; the item stays in memory and will be written by the
//! next successful save.

use std::fs;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use xmodal_core::{
    CollectionInfo, CollectionName, CollectionState, ExtraMetadata, IndexStats, ItemRecord,
    Modality, Ordinal, SearchHit, XmodalError, XmodalResult, DEFAULT_RECENT_ITEMS,
    DEFAULT_SAVE_INTERVAL, EMBEDDING_DIM,
};
use xmodal_durability::{CollectionPaths, PersistenceManager, SaveOutcome};

use crate::collection::Collection;
use crate::vector::{ensure_finite, normalized};

/// Per-service tuning derived from `XmodalConfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Embedding dimension
    pub dimension: usize,
    /// Save after every Nth item; 0 disables periodic saves
    pub save_interval: usize,
    /// Default number of recent records in `stats`
    pub recent_items: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions {
            dimension: EMBEDDING_DIM,
            save_interval: DEFAULT_SAVE_INTERVAL,
            recent_items: DEFAULT_RECENT_ITEMS,
        }
    }
}

impl IndexOptions {
    /// Options with a different dimension
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Options with a different checkpoint interval
    pub fn with_save_interval(mut self, save_interval: usize) -> Self {
        self.save_interval = save_interval;
        self
    }

    fn checkpoint_due(&self, len: usize) -> bool {
        self.save_interval > 0 && len > 0 && len % self.save_interval == 0
    }
}

/// Persistence result of an add
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Checkpoint {
    /// No save was due
    NotDue,
    /// The collection was saved
    Saved,
    /// The save was due but failed; in-memory state is intact
    Failed(String),
}

/// Outcome of a successful add
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddReceipt {
    /// Ordinal assigned to the item
    pub ordinal: Ordinal,
    /// Items in the collection after the add
    pub total_items: usize,
    /// Persistence outcome
    pub checkpoint: Checkpoint,
}

/// One collection plus its persistence policy
#[derive(Debug)]
pub struct IndexService {
    name: CollectionName,
    options: IndexOptions,
    persistence: PersistenceManager,
    collection: RwLock<Collection>,
}

impl IndexService {
    /// Open a collection, restoring it from `paths` if both files exist
    pub fn open(
        name: CollectionName,
        paths: CollectionPaths,
        options: IndexOptions,
    ) -> XmodalResult<Self> {
        if options.dimension == 0 {
            return Err(XmodalError::validation("dimension must be positive"));
        }
        let persistence = PersistenceManager::new(paths);
        let collection = match persistence.load()? {
            Some(loaded) => {
                if loaded.dimension != options.dimension {
                    return Err(XmodalError::corrupt(
                        persistence.paths().vector_file(),
                        format!(
                            "stored dimension {} does not match configured dimension {}",
                            loaded.dimension, options.dimension
                        ),
                    ));
                }
                Collection::restore(name.clone(), loaded)?
            }
            None => Collection::new(name.clone(), options.dimension),
        };

        info!(
            target: "xmodal::index",
            collection = %name,
            items = collection.len(),
            dimension = options.dimension,
            save_interval = options.save_interval,
            "Index service opened"
        );
        Ok(IndexService {
            name,
            options,
            persistence,
            collection: RwLock::new(collection),
        })
    }

    /// Open the default collection stored in `dir`
    pub fn open_default(dir: &Path, options: IndexOptions) -> XmodalResult<Self> {
        Self::open(
            CollectionName::Default,
            CollectionPaths::default_in(dir),
            options,
        )
    }

    /// Collection identity
    pub fn name(&self) -> &CollectionName {
        &self.name
    }

    /// Options in effect
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Embedding dimension
    pub fn dimension(&self) -> usize {
        self.options.dimension
    }

    /// Backing files
    pub fn paths(&self) -> &CollectionPaths {
        self.persistence.paths()
    }

    fn prepare(&self, embedding: &[f32]) -> XmodalResult<Vec<f32>> {
        ensure_finite(embedding)?;
        if embedding.len() != self.options.dimension {
            return Err(XmodalError::DimensionMismatch {
                expected: self.options.dimension,
                got: embedding.len(),
            });
        }
        Ok(normalized(embedding))
    }

    /// Store an embedding with its metadata
    ///
    /// The embedding is normalized before storage. For image and audio
    /// items `source_path` is stat'ed for `size_bytes`; text items and paths
    /// that are not files record 0.
    pub fn add(
        &self,
        source_path: &str,
        embedding: &[f32],
        modality: Modality,
        extra: ExtraMetadata,
    ) -> XmodalResult<AddReceipt> {
        let vector = self.prepare(embedding)?;
        let size_bytes = if modality.is_file_based() {
            fs::metadata(source_path)
                .ok()
                .filter(|m| m.is_file())
                .map(|m| m.len())
                .unwrap_or(0)
        } else {
            0
        };
        let record = ItemRecord::new(source_path, modality, Utc::now(), size_bytes, extra);

        let mut collection = self.collection.write();
        let ordinal = collection.append(&vector, record)?;
        let total_items = collection.len();

        let checkpoint = if self.options.checkpoint_due(total_items) {
            match self.persist(&mut collection) {
                Ok(_) => Checkpoint::Saved,
                Err(e) => {
                    warn!(
                        target: "xmodal::index",
                        collection = %self.name,
                        items = total_items,
                        error = %e,
                        "Checkpoint failed, item kept in memory"
                    );
                    Checkpoint::Failed(e.to_string())
                }
            }
        } else {
            Checkpoint::NotDue
        };

        debug!(
            target: "xmodal::index",
            collection = %self.name,
            ordinal = ordinal.as_u64(),
            modality = %modality,
            items = total_items,
            "Item added"
        );
        Ok(AddReceipt {
            ordinal,
            total_items,
            checkpoint,
        })
    }

    fn persist(&self, collection: &mut Collection) -> XmodalResult<SaveOutcome> {
        let outcome = self.persistence.save(
            collection.dimension(),
            collection.raw_vectors(),
            collection.records(),
        )?;
        if let SaveOutcome::Saved { at, .. } = outcome {
            collection.mark_saved(at);
        }
        Ok(outcome)
    }

    /// The `k` stored items most similar to `embedding`
    pub fn search(&self, embedding: &[f32], k: usize) -> XmodalResult<Vec<SearchHit>> {
        let query = self.prepare(embedding)?;
        let started = Instant::now();
        let collection = self.collection.read();
        let hits = collection.search(&query, k)?;
        debug!(
            target: "xmodal::index",
            collection = %self.name,
            k,
            hits = hits.len(),
            scanned = collection.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Search complete"
        );
        Ok(hits)
    }

    /// Delete the backing files and empty the collection
    ///
    /// Memory is cleared even when a file cannot be removed; the removal
    /// error is still returned.
    pub fn reset(&self) -> XmodalResult<()> {
        let mut collection = self.collection.write();
        let dropped = collection.len();
        collection.clear();
        self.persistence.reset()?;
        info!(
            target: "xmodal::index",
            collection = %self.name,
            dropped,
            "Collection reset"
        );
        Ok(())
    }

    /// Totals, per-modality and per-encoder counts, recent records
    ///
    /// `recent_n` defaults to `IndexOptions::recent_items`.
    pub fn stats(&self, recent_n: Option<usize>) -> IndexStats {
        let n = recent_n.unwrap_or(self.options.recent_items);
        self.collection.read().stats(n)
    }

    /// Persist the collection now
    pub fn save(&self) -> XmodalResult<SaveOutcome> {
        let mut collection = self.collection.write();
        self.persist(&mut collection)
    }

    /// Summary of the collection
    pub fn info(&self) -> CollectionInfo {
        self.collection.read().info()
    }

    /// Record stored at `ordinal`
    pub fn record(&self, ordinal: Ordinal) -> XmodalResult<ItemRecord> {
        self.collection.read().record(ordinal).cloned()
    }

    /// Stored (normalized) vector at `ordinal`
    pub fn vector(&self, ordinal: Ordinal) -> XmodalResult<Vec<f32>> {
        let collection = self.collection.read();
        collection
            .vector(ordinal)
            .map(<[f32]>::to_vec)
            .ok_or(XmodalError::IndexOutOfRange {
                ordinal: ordinal.as_u64(),
                len: collection.len(),
            })
    }

    /// Single-item deletion is not supported by the flat index
    pub fn delete(&self, ordinal: Ordinal) -> XmodalResult<()> {
        Err(XmodalError::UnsupportedOperation {
            operation: format!("delete {ordinal}: items cannot be removed individually, use reset"),
        })
    }

    /// Lifecycle state
    pub fn state(&self) -> CollectionState {
        self.collection.read().state()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.collection.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.collection.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::l2_norm;
    use tempfile::TempDir;
    use xmodal_core::{MAX_SEARCH_K, NORM_TOLERANCE};

    fn options(dimension: usize) -> IndexOptions {
        IndexOptions::default().with_dimension(dimension)
    }

    fn axis(dimension: usize, i: usize) -> Vec<f32> {
        let mut v = vec![0.0; dimension];
        v[i % dimension] = 1.0;
        v
    }

    #[test]
    fn test_add_normalizes() {
        let dir = TempDir::new().unwrap();
        let service = IndexService::open_default(dir.path(), options(2)).unwrap();
        let receipt = service
            .add("a.png", &[3.0, 4.0], Modality::Image, ExtraMetadata::new())
            .unwrap();
        let stored = service.vector(receipt.ordinal).unwrap();
        assert!((stored[0] - 0.6).abs() < 1e-6);
        assert!((stored[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_stored_as_is() {
        let dir = TempDir::new().unwrap();
        let service = IndexService::open_default(dir.path(), options(3)).unwrap();
        let receipt = service
            .add("z.png", &[0.0; 3], Modality::Image, ExtraMetadata::new())
            .unwrap();
        assert_eq!(service.vector(receipt.ordinal).unwrap(), vec![0.0; 3]);
    }

    #[test]
    fn test_non_finite_rejected() {
        let dir = TempDir::new().unwrap();
        let service = IndexService::open_default(dir.path(), options(2)).unwrap();
        let err = service
            .add("a.png", &[f32::NAN, 1.0], Modality::Image, ExtraMetadata::new())
            .unwrap_err();
        assert!(err.is_validation_error());
        assert_eq!(service.len(), 0);
    }

    #[test]
    fn test_dimension_mismatch_leaves_count() {
        let dir = TempDir::new().unwrap();
        let service = IndexService::open_default(dir.path(), IndexOptions::default()).unwrap();
        let err = service
            .add("a.png", &vec![0.1; 256], Modality::Image, ExtraMetadata::new())
            .unwrap_err();
        assert!(matches!(
            err,
            XmodalError::DimensionMismatch {
                expected: 512,
                got: 256
            }
        ));
        assert_eq!(service.len(), 0);
        assert_eq!(service.state(), CollectionState::Uninitialized);
    }

    #[test]
    fn test_periodic_checkpoint() {
        let dir = TempDir::new().unwrap();
        let service = IndexService::open_default(dir.path(), options(4)).unwrap();
        for i in 0..4 {
            let receipt = service
                .add("a.png", &axis(4, i), Modality::Image, ExtraMetadata::new())
                .unwrap();
            assert_eq!(receipt.checkpoint, Checkpoint::NotDue);
        }
        assert!(!service.paths().vector_file().exists());

        let receipt = service
            .add("a.png", &axis(4, 4), Modality::Image, ExtraMetadata::new())
            .unwrap();
        assert_eq!(receipt.checkpoint, Checkpoint::Saved);
        assert!(service.paths().vector_file().exists());
        assert!(service.info().last_saved.is_some());
    }

    #[test]
    fn test_zero_interval_never_checkpoints() {
        let dir = TempDir::new().unwrap();
        let service =
            IndexService::open_default(dir.path(), options(2).with_save_interval(0)).unwrap();
        for i in 0..10 {
            let receipt = service
                .add("a.png", &axis(2, i), Modality::Image, ExtraMetadata::new())
                .unwrap();
            assert_eq!(receipt.checkpoint, Checkpoint::NotDue);
        }
        assert!(!service.paths().vector_file().exists());
    }

    #[test]
    fn test_failed_checkpoint_keeps_item() {
        let dir = TempDir::new().unwrap();
        let blocked = dir.path().join("blocked");
        fs::write(&blocked, b"a file where a directory is expected").unwrap();

        let service =
            IndexService::open_default(&blocked, options(2).with_save_interval(1)).unwrap();
        let receipt = service
            .add("a.png", &[1.0, 0.0], Modality::Image, ExtraMetadata::new())
            .unwrap();
        assert!(matches!(receipt.checkpoint, Checkpoint::Failed(_)));
        assert_eq!(service.len(), 1);
        assert_eq!(service.search(&[1.0, 0.0], 1).unwrap().len(), 1);
    }

    #[test]
    fn test_explicit_save_of_empty_is_skipped() {
        let dir = TempDir::new().unwrap();
        let service = IndexService::open_default(dir.path(), options(2)).unwrap();
        assert_eq!(service.save().unwrap(), SaveOutcome::SkippedEmpty);
        assert!(!service.paths().vector_file().exists());
    }

    #[test]
    fn test_reset_twice() {
        let dir = TempDir::new().unwrap();
        let service = IndexService::open_default(dir.path(), options(2)).unwrap();
        service
            .add("a.png", &[1.0, 0.0], Modality::Image, ExtraMetadata::new())
            .unwrap();
        service.save().unwrap();

        service.reset().unwrap();
        service.reset().unwrap();
        assert_eq!(service.len(), 0);
        assert_eq!(service.state(), CollectionState::Uninitialized);
        assert!(!service.paths().vector_file().exists());
        assert!(service.search(&[1.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_ordinals_restart_after_reset() {
        let dir = TempDir::new().unwrap();
        let service = IndexService::open_default(dir.path(), options(2)).unwrap();
        service
            .add("a.png", &[1.0, 0.0], Modality::Image, ExtraMetadata::new())
            .unwrap();
        service.reset().unwrap();
        let receipt = service
            .add("b.png", &[0.0, 1.0], Modality::Image, ExtraMetadata::new())
            .unwrap();
        assert_eq!(receipt.ordinal, Ordinal::new(0));
    }

    #[test]
    fn test_delete_unsupported() {
        let dir = TempDir::new().unwrap();
        let service = IndexService::open_default(dir.path(), options(2)).unwrap();
        let err = service.delete(Ordinal::new(0)).unwrap_err();
        assert_eq!(err.status_code(), 501);
    }

    #[test]
    fn test_record_out_of_range() {
        let dir = TempDir::new().unwrap();
        let service = IndexService::open_default(dir.path(), options(2)).unwrap();
        assert!(service.record(Ordinal::new(3)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_stats_default_recent() {
        let dir = TempDir::new().unwrap();
        let service = IndexService::open_default(dir.path(), options(2)).unwrap();
        for i in 0..12 {
            service
                .add(&format!("{i}.png"), &axis(2, i), Modality::Image, ExtraMetadata::new())
                .unwrap();
        }
        let stats = service.stats(None);
        assert_eq!(stats.total_items, 12);
        assert_eq!(stats.recent.len(), DEFAULT_RECENT_ITEMS);
        assert_eq!(stats.recent[0].filename, "11.png");
        assert_eq!(service.stats(Some(3)).recent.len(), 3);
    }

    #[test]
    fn test_large_k_returns_everything() {
        let dir = TempDir::new().unwrap();
        let service = IndexService::open_default(dir.path(), options(2)).unwrap();
        service
            .add("a.png", &[1.0, 0.0], Modality::Image, ExtraMetadata::new())
            .unwrap();
        assert_eq!(service.search(&[1.0, 0.0], MAX_SEARCH_K).unwrap().len(), 1);
    }

    #[test]
    fn test_size_bytes_from_disk() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("clip.wav");
        fs::write(&file, vec![0u8; 1234]).unwrap();
        let service = IndexService::open_default(dir.path(), options(2)).unwrap();
        let receipt = service
            .add(
                file.to_str().unwrap(),
                &[1.0, 0.0],
                Modality::Audio,
                ExtraMetadata::new(),
            )
            .unwrap();
        let record = service.record(receipt.ordinal).unwrap();
        assert_eq!(record.size_bytes, 1234);
        assert_eq!(record.filename, "clip.wav");
    }

    #[test]
    fn test_text_item_never_stats_source_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("text:hello");
        fs::write(&file, vec![0u8; 64]).unwrap();
        let service = IndexService::open_default(dir.path(), options(2)).unwrap();
        let receipt = service
            .add(
                file.to_str().unwrap(),
                &[1.0, 0.0],
                Modality::Text,
                ExtraMetadata::new(),
            )
            .unwrap();
        assert_eq!(service.record(receipt.ordinal).unwrap().size_bytes, 0);
    }

    #[test]
    fn test_reset_clears_memory_when_removal_fails() {
        let dir = TempDir::new().unwrap();
        let service = IndexService::open_default(dir.path(), options(2)).unwrap();
        service
            .add("a.png", &[1.0, 0.0], Modality::Image, ExtraMetadata::new())
            .unwrap();
        // A directory cannot be removed as a file
        fs::create_dir_all(service.paths().vector_file()).unwrap();

        let err = service.reset().unwrap_err();
        assert!(matches!(err, XmodalError::Storage { .. }));
        assert_eq!(service.len(), 0);
        assert_eq!(service.state(), CollectionState::Uninitialized);
        assert!(service.search(&[1.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_extreme_magnitudes_stored_unit_length() {
        let dir = TempDir::new().unwrap();
        let service = IndexService::open_default(dir.path(), IndexOptions::default()).unwrap();

        let mut huge = vec![0.0f32; 512];
        huge[0] = 1e20;
        let receipt = service
            .add("huge.png", &huge, Modality::Image, ExtraMetadata::new())
            .unwrap();
        let stored = service.vector(receipt.ordinal).unwrap();
        assert!((l2_norm(&stored) - 1.0).abs() <= NORM_TOLERANCE);
        let hits = service.search(&huge, 1).unwrap();
        assert!((hits[0].similarity_score - 1.0).abs() <= NORM_TOLERANCE);

        let receipt = service
            .add("tiny.png", &vec![1e-24; 512], Modality::Image, ExtraMetadata::new())
            .unwrap();
        let stored = service.vector(receipt.ordinal).unwrap();
        assert!((l2_norm(&stored) - 1.0).abs() <= NORM_TOLERANCE);
    }

    #[test]
    fn test_open_rejects_dimension_change() {
        let dir = TempDir::new().unwrap();
        {
            let service = IndexService::open_default(dir.path(), options(2)).unwrap();
            service
                .add("a.png", &[1.0, 0.0], Modality::Image, ExtraMetadata::new())
                .unwrap();
            service.save().unwrap();
        }
        let err = IndexService::open_default(dir.path(), options(3)).unwrap_err();
        assert!(err.requires_intervention());
    }
}
