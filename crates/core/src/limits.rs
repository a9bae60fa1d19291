//! Default limits and tunables
//!
//! These are the defaults applied when no `xmodal.toml` overrides them.

/// Embedding dimension shared by the image, audio and text encoders
pub const EMBEDDING_DIM: usize = 512;

/// Successful adds between automatic checkpoints
pub const DEFAULT_SAVE_INTERVAL: usize = 5;

/// Records returned by default in the "recent items" section of stats
pub const DEFAULT_RECENT_ITEMS: usize = 10;

/// Largest file accepted for ingestion (50 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Maximum collection name length
pub const MAX_COLLECTION_NAME_LEN: usize = 128;

/// Maximum result count for a single search
pub const MAX_SEARCH_K: usize = 1000;

/// Tolerance used when checking that stored vectors are unit length
pub const NORM_TOLERANCE: f32 = 1e-5;

/// Characters of a text query kept in its synthetic source marker
pub const TEXT_MARKER_CHARS: usize = 64;
