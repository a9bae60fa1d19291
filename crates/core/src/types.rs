//! Data model types shared by the engine and durability layers
//!
//! - Ordinal: position of an item, the join key between vectors and records
//! - CollectionName: identity of a collection (default or named)
//! - ItemRecord: per-item metadata aligned with the vector store
//! - SearchHit / IndexStats / CollectionInfo: read-side results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::metadata::{ExtraMetadata, MetadataValue, ENCODER_KEY};
use crate::modality::Modality;

/// Position of an item within a collection
///
/// Ordinals are assigned sequentially from 0 and are never renumbered or
/// reused for the lifetime of a collection. Only `reset` starts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ordinal(pub u64);

impl Ordinal {
    /// Create a new Ordinal
    pub fn new(ordinal: u64) -> Self {
        Ordinal(ordinal)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Position as a slice index
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for Ordinal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a collection
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CollectionName {
    /// The single unnamed collection of the default service
    Default,
    /// A collection managed by the registry
    Named(String),
}

impl CollectionName {
    /// Name for display and logging
    pub fn as_str(&self) -> &str {
        match self {
            CollectionName::Default => "default",
            CollectionName::Named(name) => name,
        }
    }
}

impl std::fmt::Display for CollectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionState {
    /// No items and nothing loaded; searches return empty results
    Uninitialized,
    /// At least one add or a successful load since the last reset
    Active,
}

/// Metadata for one stored vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Where the original file lives, or a synthetic marker for text
    pub source_path: String,
    /// Input modality
    pub modality: Modality,
    /// Display name derived from `source_path`
    pub filename: String,
    /// Insertion time
    pub added_at: DateTime<Utc>,
    /// File size on disk at insertion, 0 if not a file
    pub size_bytes: u64,
    /// Caller-supplied attributes
    #[serde(default)]
    pub extra: ExtraMetadata,
}

impl ItemRecord {
    /// Create a record, deriving `filename` from `source_path`
    pub fn new(
        source_path: impl Into<String>,
        modality: Modality,
        added_at: DateTime<Utc>,
        size_bytes: u64,
        extra: ExtraMetadata,
    ) -> Self {
        let source_path = source_path.into();
        let filename = display_name(&source_path);
        ItemRecord {
            source_path,
            modality,
            filename,
            added_at,
            size_bytes,
            extra,
        }
    }

    /// Name of the encoder that produced this item's embedding
    pub fn encoder(&self) -> Option<&str> {
        self.extra.get(ENCODER_KEY).and_then(MetadataValue::as_str)
    }
}

/// Final path component, or the whole string for synthetic markers
pub fn display_name(source_path: &str) -> String {
    Path::new(source_path)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| source_path.to_string())
}

/// One ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// 1-based rank
    pub rank: usize,
    /// Cosine similarity with the query
    pub similarity_score: f32,
    /// Source path of the matched item
    pub source_path: String,
    /// Display name of the matched item
    pub filename: String,
    /// Modality the matched item was indexed from
    pub modality: Modality,
}

/// Derived, read-only statistics for a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total items stored
    pub total_items: usize,
    /// Item count per modality
    pub by_modality: BTreeMap<Modality, usize>,
    /// Item count per producing encoder
    pub by_encoder: BTreeMap<String, usize>,
    /// Most recently added records, newest first
    pub recent: Vec<ItemRecord>,
}

/// Summary of a collection for listing endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Collection identity
    pub name: CollectionName,
    /// Items stored
    pub item_count: usize,
    /// Embedding dimension
    pub dimension: usize,
    /// Distinct modalities present, sorted
    pub modalities: Vec<Modality>,
    /// Last time the collection was persisted, if ever
    pub last_saved: Option<DateTime<Utc>>,
    /// Lifecycle state
    pub state: CollectionState,
}
