//! Core types for xmodal
//!
//! This crate defines the foundational types used throughout the system:
//! - XmodalError: error taxonomy shared by every layer
//! - Modality: image / audio / text / unknown
//! - MetadataValue: typed caller-supplied attributes
//! - Ordinal, ItemRecord: the stored data model
//! - SearchHit, IndexStats, CollectionInfo: read-side results
//! - Limits: default dimension, checkpoint interval, upload size

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;
pub mod metadata;
pub mod modality;
pub mod types;

pub use error::{ErrorKind, XmodalError, XmodalResult};
pub use limits::{
    DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_RECENT_ITEMS, DEFAULT_SAVE_INTERVAL, EMBEDDING_DIM,
    MAX_COLLECTION_NAME_LEN, MAX_SEARCH_K, NORM_TOLERANCE, TEXT_MARKER_CHARS,
};
pub use metadata::{
    extra_from_json, ExtraMetadata, MetadataValue, DESCRIPTION_KEY, ENCODER_KEY,
    ORIGINAL_FILENAME_KEY,
};
pub use modality::{Modality, AUDIO_EXTENSIONS, IMAGE_EXTENSIONS};
pub use types::{
    display_name, CollectionInfo, CollectionName, CollectionState, IndexStats, ItemRecord,
    Ordinal, SearchHit,
};
