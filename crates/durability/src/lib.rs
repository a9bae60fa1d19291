//! Durability layer for xmodal
//!
//! This crate handles everything that touches disk:
//!
//! - Atomic file replacement (temp file, fsync, rename, directory fsync)
//! - Binary on-disk formats for the vector file and the metadata file
//! - Collection file naming for the default and named collections
//! - Persistence Manager: save, load, reset of one collection's file pair

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod atomic; // Crash-safe file replacement
pub mod format; // Vector and metadata file formats
pub mod paths; // File naming for collections
pub mod persistence; // Save/load/reset of a collection's file pair

pub use atomic::{remove_if_exists, temp_path, write_atomic};
pub use format::FormatError;
pub use paths::{
    collection_name_from_index_file, CollectionPaths, DEFAULT_METADATA_FILE,
    DEFAULT_VECTOR_FILE, NAMED_METADATA_SUFFIX, NAMED_VECTOR_SUFFIX,
};
pub use persistence::{LoadedCollection, PersistenceManager, SaveOutcome};
