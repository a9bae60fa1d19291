//! Vector Index Backend trait
//!
//! Defines the interface for swappable vector index implementations.
//! BruteForceBackend (O(n) exact search) is the only implementation.

use xmodal_core::{Ordinal, XmodalResult};

use super::brute_force::BruteForceBackend;

/// Trait for swappable vector index implementations
///
/// Backends receive vectors already validated and normalized by the
/// Vector Store; they own storage layout and search strategy only.
pub trait VectorIndexBackend: Send + Sync {
    /// Append a vector, returning its ordinal
    fn append(&mut self, embedding: &[f32]) -> XmodalResult<Ordinal>;

    /// Search for the k most similar vectors
    ///
    /// Returns (Ordinal, score) pairs sorted by (score desc, ordinal asc).
    fn search(&self, query: &[f32], k: usize) -> Vec<(Ordinal, f32)>;

    /// Get number of indexed vectors
    fn len(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get embedding dimension
    fn dimension(&self) -> usize;

    /// Get a vector by ordinal
    fn get(&self, ordinal: Ordinal) -> Option<&[f32]>;

    /// Row-major copy source for persistence
    fn raw_data(&self) -> &[f32];

    /// Replace contents with a restored matrix
    fn restore(&mut self, data: Vec<f32>) -> XmodalResult<()>;

    /// Remove every vector
    fn clear(&mut self);
}

/// Factory for creating index backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexBackendFactory {
    /// Brute-force O(n) search
    #[default]
    BruteForce,
}

impl IndexBackendFactory {
    /// Create a new backend instance
    pub fn create(&self, dimension: usize) -> Box<dyn VectorIndexBackend> {
        match self {
            IndexBackendFactory::BruteForce => Box::new(BruteForceBackend::new(dimension)),
        }
    }
}
