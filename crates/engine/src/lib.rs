//! Similarity search engine for xmodal
//!
//! This crate owns everything above the file formats:
//! - VectorStore: normalized embeddings behind a pluggable backend
//! - MetadataCatalog: one record per ordinal
//! - IndexService: one collection with locking and periodic checkpoints
//! - CollectionRegistry: named collections under one directory
//! - Pipeline: input validation, encoder dispatch, batch ingestion
//! - XmodalConfig: `xmodal.toml`
//!
//! Ordinals are shared: the vector at ordinal N and the catalog record at
//! ordinal N always describe the same item.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod collection;
pub mod config;
pub mod encoder;
pub mod pipeline;
pub mod registry;
pub mod service;
pub mod vector;

pub use catalog::{MetadataCatalog, UNKNOWN_ENCODER};
pub use collection::{validate_collection_name, Collection};
pub use config::{XmodalConfig, CONFIG_FILE_NAME};
pub use encoder::{Encoder, EncoderAvailability, EncoderSet, FnEncoder, RawInput};
pub use pipeline::{
    text_marker, AddRequest, BatchItemResult, BatchReport, Pipeline, PipelineOptions,
    ServiceStatus, TEXT_MARKER_PREFIX,
};
pub use registry::{CollectionRegistry, RegistryOptions};
pub use service::{AddReceipt, Checkpoint, IndexOptions, IndexService};
pub use vector::{
    BruteForceBackend, IndexBackendFactory, VectorHeap, VectorIndexBackend, VectorStore,
};
