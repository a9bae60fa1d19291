//! Collection: one Vector Store plus its aligned Metadata Catalog
//!
//! All mutation goes through `append`, which writes the vector first and
//! the record second, so a dimension failure leaves both sides untouched.

use chrono::{DateTime, Utc};
use xmodal_core::{
    CollectionInfo, CollectionName, CollectionState, IndexStats, ItemRecord, Ordinal, SearchHit,
    XmodalError, XmodalResult, MAX_COLLECTION_NAME_LEN,
};
use xmodal_durability::LoadedCollection;

use crate::catalog::MetadataCatalog;
use crate::vector::VectorStore;

/// Validate a registry collection name
///
/// Names are non-empty, at most `MAX_COLLECTION_NAME_LEN` chars, made of
/// ASCII alphanumerics, `-` and `_`, and do not start with `_` or `.`.
pub fn validate_collection_name(name: &str) -> XmodalResult<()> {
    let invalid = |reason: &str| XmodalError::InvalidCollectionName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name.chars().count() > MAX_COLLECTION_NAME_LEN {
        return Err(invalid("name is too long"));
    }
    if name.starts_with('_') || name.starts_with('.') {
        return Err(invalid("name must not start with '_' or '.'"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(invalid(&format!("character {c:?} is not allowed")));
    }
    Ok(())
}

/// In-memory state of one collection
#[derive(Debug)]
pub struct Collection {
    name: CollectionName,
    store: VectorStore,
    catalog: MetadataCatalog,
    state: CollectionState,
    last_saved: Option<DateTime<Utc>>,
}

impl Collection {
    /// Empty, uninitialized collection
    pub fn new(name: CollectionName, dimension: usize) -> Self {
        Collection {
            name,
            store: VectorStore::new(dimension),
            catalog: MetadataCatalog::new(),
            state: CollectionState::Uninitialized,
            last_saved: None,
        }
    }

    /// Collection rebuilt from persisted state
    pub fn restore(name: CollectionName, loaded: LoadedCollection) -> XmodalResult<Self> {
        let mut collection = Collection::new(name, loaded.dimension);
        collection.store.restore(loaded.vectors)?;
        if collection.store.len() != loaded.records.len() {
            return Err(XmodalError::internal(format!(
                "restored {} vectors but {} records",
                collection.store.len(),
                loaded.records.len()
            )));
        }
        collection.catalog = MetadataCatalog::from_records(loaded.records);
        collection.state = CollectionState::Active;
        collection.last_saved = Some(loaded.last_updated);
        Ok(collection)
    }

    /// Collection identity
    pub fn name(&self) -> &CollectionName {
        &self.name
    }

    /// Components per vector
    pub fn dimension(&self) -> usize {
        self.store.dimension()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Lifecycle state
    pub fn state(&self) -> CollectionState {
        self.state
    }

    /// Last successful save
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Record a successful save
    pub fn mark_saved(&mut self, at: DateTime<Utc>) {
        self.last_saved = Some(at);
    }

    /// Store a normalized vector and its record under the same ordinal
    pub fn append(&mut self, vector: &[f32], record: ItemRecord) -> XmodalResult<Ordinal> {
        let ordinal = self.store.add(vector)?;
        let record_ordinal = self.catalog.append(record);
        debug_assert_eq!(ordinal, record_ordinal);
        self.state = CollectionState::Active;
        Ok(ordinal)
    }

    /// Ranked hits for a normalized query
    pub fn search(&self, query: &[f32], k: usize) -> XmodalResult<Vec<SearchHit>> {
        let scored = self.store.search(query, k)?;
        scored
            .into_iter()
            .enumerate()
            .map(|(i, (ordinal, score))| {
                let record = self.catalog.get(ordinal)?;
                Ok(SearchHit {
                    rank: i + 1,
                    similarity_score: score,
                    source_path: record.source_path.clone(),
                    filename: record.filename.clone(),
                    modality: record.modality,
                })
            })
            .collect()
    }

    /// Record at `ordinal`
    pub fn record(&self, ordinal: Ordinal) -> XmodalResult<&ItemRecord> {
        self.catalog.get(ordinal)
    }

    /// Stored (normalized) vector at `ordinal`
    pub fn vector(&self, ordinal: Ordinal) -> Option<&[f32]> {
        self.store.get(ordinal)
    }

    /// Row-major vectors for persistence
    pub fn raw_vectors(&self) -> &[f32] {
        self.store.raw_data()
    }

    /// Records for persistence
    pub fn records(&self) -> &[ItemRecord] {
        self.catalog.records()
    }

    /// Derived statistics
    pub fn stats(&self, recent_n: usize) -> IndexStats {
        IndexStats {
            total_items: self.catalog.len(),
            by_modality: self.catalog.modality_counts(),
            by_encoder: self.catalog.encoder_counts(),
            recent: self.catalog.recent(recent_n),
        }
    }

    /// Summary for listings
    pub fn info(&self) -> CollectionInfo {
        let modalities: Vec<_> = self.catalog.modality_counts().into_keys().collect();
        CollectionInfo {
            name: self.name.clone(),
            item_count: self.len(),
            dimension: self.dimension(),
            modalities,
            last_saved: self.last_saved,
            state: self.state,
        }
    }

    /// Drop every item and return to `Uninitialized`
    pub fn clear(&mut self) {
        self.store.clear();
        self.catalog.clear();
        self.state = CollectionState::Uninitialized;
        self.last_saved = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmodal_core::{ExtraMetadata, Modality};

    fn record(path: &str, modality: Modality) -> ItemRecord {
        ItemRecord::new(path, modality, Utc::now(), 0, ExtraMetadata::new())
    }

    #[test]
    fn test_valid_names() {
        for name in ["pets", "my-photos", "audio_2024", "A1", "x".repeat(128).as_str()] {
            assert!(validate_collection_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "_hidden", ".dot", "a/b", "white space", "ünï", "x".repeat(129).as_str()] {
            let err = validate_collection_name(name).unwrap_err();
            assert!(
                matches!(err, XmodalError::InvalidCollectionName { .. }),
                "{name}"
            );
            assert_eq!(err.status_code(), 400);
        }
    }

    #[test]
    fn test_append_keeps_alignment_on_dimension_error() {
        let mut c = Collection::new(CollectionName::Default, 2);
        c.append(&[1.0, 0.0], record("a.png", Modality::Image)).unwrap();
        assert!(c.append(&[1.0], record("b.png", Modality::Image)).is_err());
        assert_eq!(c.len(), 1);
        assert_eq!(c.raw_vectors().len(), 2);
    }

    #[test]
    fn test_state_transitions() {
        let mut c = Collection::new(CollectionName::Default, 2);
        assert_eq!(c.state(), CollectionState::Uninitialized);
        c.append(&[1.0, 0.0], record("a.png", Modality::Image)).unwrap();
        assert_eq!(c.state(), CollectionState::Active);
        c.clear();
        assert_eq!(c.state(), CollectionState::Uninitialized);
        assert!(c.is_empty());
    }

    #[test]
    fn test_search_joins_records() {
        let mut c = Collection::new(CollectionName::Default, 2);
        c.append(&[1.0, 0.0], record("static/a.png", Modality::Image)).unwrap();
        c.append(&[0.0, 1.0], record("static/b.wav", Modality::Audio)).unwrap();

        let hits = c.search(&[0.0, 1.0], 2).unwrap();
        assert_eq!(hits[0].rank, 1);
        assert_eq!(hits[0].filename, "b.wav");
        assert_eq!(hits[0].modality, Modality::Audio);
        assert_eq!(hits[1].rank, 2);
        assert_eq!(hits[1].source_path, "static/a.png");
    }

    #[test]
    fn test_info_lists_modalities() {
        let mut c = Collection::new(CollectionName::Named("pets".into()), 2);
        c.append(&[1.0, 0.0], record("b.wav", Modality::Audio)).unwrap();
        c.append(&[0.0, 1.0], record("a.png", Modality::Image)).unwrap();
        let info = c.info();
        assert_eq!(info.item_count, 2);
        assert_eq!(info.modalities, vec![Modality::Image, Modality::Audio]);
        assert_eq!(info.name.as_str(), "pets");
    }
}
