//! Persistence Manager
//!
//! Saves and restores one collection as a vector file plus a metadata file.
//! Each file is replaced atomically; the vector file is written first so a
//! crash between the two writes leaves a count mismatch that `load` reports
//! as corruption instead of silently serving misaligned metadata.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use xmodal_core::{ItemRecord, XmodalError, XmodalResult};

use crate::atomic::{remove_if_exists, temp_path, write_atomic};
use crate::format::{
    decode_catalog_file, decode_vector_file, write_catalog_file, write_vector_file,
    CatalogFileRef, FormatError,
};
use crate::paths::CollectionPaths;

/// Result of a save request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Both files were written
    Saved {
        /// Items persisted
        items: usize,
        /// Timestamp stored in the metadata file
        at: DateTime<Utc>,
    },
    /// Nothing to persist; files were left untouched
    SkippedEmpty,
}

impl SaveOutcome {
    /// Whether files were written
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

/// A collection restored from disk
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCollection {
    /// Components per vector
    pub dimension: usize,
    /// Row-major vectors in ordinal order
    pub vectors: Vec<f32>,
    /// Records in ordinal order
    pub records: Vec<ItemRecord>,
    /// When the pair was written
    pub last_updated: DateTime<Utc>,
}

impl LoadedCollection {
    /// Number of items
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no items were stored
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads and writes the file pair of a single collection
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    paths: CollectionPaths,
}

impl PersistenceManager {
    /// Manager for the given file pair
    pub fn new(paths: CollectionPaths) -> Self {
        PersistenceManager { paths }
    }

    /// Backing files
    pub fn paths(&self) -> &CollectionPaths {
        &self.paths
    }

    /// Both files are present
    pub fn exists(&self) -> bool {
        self.paths.vector_file().is_file() && self.paths.metadata_file().is_file()
    }

    /// Persist `vectors` and `records`
    ///
    /// `vectors` holds `records.len()` rows of `dimension` floats. An empty
    /// collection is not written.
    pub fn save(
        &self,
        dimension: usize,
        vectors: &[f32],
        records: &[ItemRecord],
    ) -> XmodalResult<SaveOutcome> {
        if records.is_empty() {
            warn!(
                target: "xmodal::persist",
                path = %self.paths.vector_file().display(),
                "Skipping save of empty collection"
            );
            return Ok(SaveOutcome::SkippedEmpty);
        }
        let at = self.write_pair(dimension, vectors, records)?;
        info!(
            target: "xmodal::persist",
            path = %self.paths.vector_file().display(),
            items = records.len(),
            dimension,
            "Collection saved"
        );
        Ok(SaveOutcome::Saved {
            items: records.len(),
            at,
        })
    }

    /// Write an empty file pair so the collection is discoverable on disk
    pub fn initialize_empty(&self, dimension: usize) -> XmodalResult<()> {
        self.write_pair(dimension, &[], &[])?;
        info!(
            target: "xmodal::persist",
            path = %self.paths.vector_file().display(),
            dimension,
            "Initialized empty collection files"
        );
        Ok(())
    }

    fn write_pair(
        &self,
        dimension: usize,
        vectors: &[f32],
        records: &[ItemRecord],
    ) -> XmodalResult<DateTime<Utc>> {
        if dimension == 0 || vectors.len() != records.len() * dimension {
            return Err(XmodalError::internal(format!(
                "cannot save {} floats with {} records at dimension {}",
                vectors.len(),
                records.len(),
                dimension
            )));
        }

        let at = Utc::now();
        write_atomic(self.paths.vector_file(), |w| {
            write_vector_file(w, dimension, vectors)
        })?;
        let view = CatalogFileRef::new(dimension, records, at);
        write_atomic(self.paths.metadata_file(), |w| write_catalog_file(w, &view))?;
        Ok(at)
    }

    /// Restore the collection
    ///
    /// Returns `None` unless both files exist. Any decoding failure or
    /// disagreement between the two files is `CorruptState`.
    pub fn load(&self) -> XmodalResult<Option<LoadedCollection>> {
        let vector_path = self.paths.vector_file();
        let metadata_path = self.paths.metadata_file();
        match (vector_path.is_file(), metadata_path.is_file()) {
            (true, true) => {}
            (false, false) => {
                debug!(
                    target: "xmodal::persist",
                    path = %vector_path.display(),
                    "No saved collection"
                );
                return Ok(None);
            }
            (has_vectors, has_metadata) => {
                warn!(
                    target: "xmodal::persist",
                    vector_file = has_vectors,
                    metadata_file = has_metadata,
                    path = %vector_path.display(),
                    "Only one collection file present, starting empty"
                );
                return Ok(None);
            }
        }

        let vector_bytes = read_file(vector_path)?;
        let vectors = decode_vector_file(&vector_bytes).map_err(|e| corrupt(vector_path, e))?;
        drop(vector_bytes);

        let metadata_bytes = read_file(metadata_path)?;
        let catalog =
            decode_catalog_file(&metadata_bytes).map_err(|e| corrupt(metadata_path, e))?;

        if vectors.count != catalog.records.len() {
            return Err(XmodalError::corrupt(
                metadata_path,
                format!(
                    "{} vectors but {} metadata records",
                    vectors.count,
                    catalog.records.len()
                ),
            ));
        }
        if vectors.dimension != catalog.dimension {
            return Err(XmodalError::corrupt(
                metadata_path,
                format!(
                    "vector file has dimension {} but metadata records dimension {}",
                    vectors.dimension, catalog.dimension
                ),
            ));
        }

        info!(
            target: "xmodal::persist",
            path = %vector_path.display(),
            items = vectors.count,
            dimension = vectors.dimension,
            "Collection loaded"
        );
        Ok(Some(LoadedCollection {
            dimension: vectors.dimension,
            vectors: vectors.data,
            records: catalog.records,
            last_updated: catalog.last_updated,
        }))
    }

    /// Delete both files and any leftover temp files
    ///
    /// Missing files are not an error.
    pub fn reset(&self) -> XmodalResult<()> {
        let mut removed = 0;
        for path in [self.paths.vector_file(), self.paths.metadata_file()] {
            if remove_if_exists(path)? {
                removed += 1;
            }
            remove_if_exists(&temp_path(path))?;
        }
        info!(
            target: "xmodal::persist",
            path = %self.paths.vector_file().display(),
            removed,
            "Collection files reset"
        );
        Ok(())
    }
}

fn read_file(path: &Path) -> XmodalResult<Vec<u8>> {
    fs::read(path)
        .map_err(|e| XmodalError::storage(format!("failed to read {}", path.display()), e))
}

fn corrupt(path: &Path, err: FormatError) -> XmodalError {
    XmodalError::corrupt(path, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use xmodal_core::{ExtraMetadata, Modality};

    fn manager(dir: &TempDir) -> PersistenceManager {
        PersistenceManager::new(CollectionPaths::default_in(dir.path()))
    }

    fn records(n: usize) -> Vec<ItemRecord> {
        (0..n)
            .map(|i| {
                ItemRecord::new(
                    format!("static/{i}.png"),
                    Modality::Image,
                    Utc::now(),
                    i as u64,
                    ExtraMetadata::new(),
                )
            })
            .collect()
    }

    #[test]
    fn test_load_without_files_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(manager(&dir).load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let pm = manager(&dir);
        let vectors = vec![1.0, 0.0, 0.0, 1.0];
        let recs = records(2);

        let outcome = pm.save(2, &vectors, &recs).unwrap();
        assert!(outcome.is_saved());
        assert!(pm.exists());

        let loaded = pm.load().unwrap().unwrap();
        assert_eq!(loaded.dimension, 2);
        assert_eq!(loaded.vectors, vectors);
        assert_eq!(loaded.records, recs);
    }

    #[test]
    fn test_empty_save_is_skipped() {
        let dir = TempDir::new().unwrap();
        let pm = manager(&dir);
        assert_eq!(pm.save(4, &[], &[]).unwrap(), SaveOutcome::SkippedEmpty);
        assert!(!pm.exists());
    }

    #[test]
    fn test_save_rejects_misaligned_input() {
        let dir = TempDir::new().unwrap();
        let err = manager(&dir).save(2, &[1.0, 0.0], &records(2)).unwrap_err();
        assert_eq!(err.kind(), xmodal_core::ErrorKind::Internal);
    }

    #[test]
    fn test_initialize_empty_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let pm = manager(&dir);
        pm.initialize_empty(16).unwrap();
        assert!(pm.exists());
        let loaded = pm.load().unwrap().unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.dimension, 16);
    }

    #[test]
    fn test_single_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let pm = manager(&dir);
        pm.save(1, &[1.0], &records(1)).unwrap();
        fs::remove_file(pm.paths().metadata_file()).unwrap();
        assert!(pm.load().unwrap().is_none());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let pm = manager(&dir);
        pm.save(1, &[1.0], &records(1)).unwrap();
        fs::write(temp_path(pm.paths().vector_file()), b"junk").unwrap();

        pm.reset().unwrap();
        assert!(!pm.exists());
        assert!(!temp_path(pm.paths().vector_file()).exists());
        pm.reset().unwrap();
        assert!(pm.load().unwrap().is_none());
    }

    #[test]
    fn test_count_mismatch_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let pm = manager(&dir);
        pm.save(1, &[1.0, 1.0], &records(2)).unwrap();

        let other = PersistenceManager::new(CollectionPaths::new(
            dir.path().join("other.bin"),
            pm.paths().metadata_file(),
        ));
        other.save(1, &[1.0], &records(1)).unwrap();

        let err = pm.load().unwrap_err();
        assert!(err.requires_intervention());
    }

    #[test]
    fn test_dimension_mismatch_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let pm = manager(&dir);
        pm.save(2, &[1.0, 0.0], &records(1)).unwrap();
        write_atomic(pm.paths().vector_file(), |w| write_vector_file(w, 1, &[1.0])).unwrap();

        let err = pm.load().unwrap_err();
        assert!(err.requires_intervention());
        assert!(err.to_string().contains("dimension"));
    }

    #[test]
    fn test_garbage_vector_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let pm = manager(&dir);
        pm.save(1, &[1.0], &records(1)).unwrap();
        fs::write(pm.paths().vector_file(), b"not an index").unwrap();
        let err = pm.load().unwrap_err();
        assert!(err.requires_intervention());
    }
}
