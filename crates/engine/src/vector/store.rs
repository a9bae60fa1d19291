//! Vector Store
//!
//! Dimension-checked façade over a `VectorIndexBackend`. Callers pass
//! vectors that are already normalized; the store never rescales.

use xmodal_core::{Ordinal, XmodalError, XmodalResult};

use super::backend::{IndexBackendFactory, VectorIndexBackend};

/// In-memory vector container for one collection
pub struct VectorStore {
    backend: Box<dyn VectorIndexBackend>,
}

impl VectorStore {
    /// Empty store using the default backend
    pub fn new(dimension: usize) -> Self {
        Self::with_backend(IndexBackendFactory::default(), dimension)
    }

    /// Empty store using the given backend
    pub fn with_backend(factory: IndexBackendFactory, dimension: usize) -> Self {
        VectorStore {
            backend: factory.create(dimension),
        }
    }

    /// Components per vector
    pub fn dimension(&self) -> usize {
        self.backend.dimension()
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    fn check_dimension(&self, v: &[f32]) -> XmodalResult<()> {
        if v.len() != self.dimension() {
            return Err(XmodalError::DimensionMismatch {
                expected: self.dimension(),
                got: v.len(),
            });
        }
        Ok(())
    }

    /// Append a vector, returning its ordinal
    pub fn add(&mut self, vector: &[f32]) -> XmodalResult<Ordinal> {
        self.check_dimension(vector)?;
        self.backend.append(vector)
    }

    /// Top `min(k, len)` ordinals by inner product with `query`
    pub fn search(&self, query: &[f32], k: usize) -> XmodalResult<Vec<(Ordinal, f32)>> {
        self.check_dimension(query)?;
        Ok(self.backend.search(query, k))
    }

    /// Stored vector at `ordinal`
    pub fn get(&self, ordinal: Ordinal) -> Option<&[f32]> {
        self.backend.get(ordinal)
    }

    /// Row-major view of every stored vector
    pub fn raw_data(&self) -> &[f32] {
        self.backend.raw_data()
    }

    /// Replace contents with a restored matrix
    pub fn restore(&mut self, data: Vec<f32>) -> XmodalResult<()> {
        self.backend.restore(data)
    }

    /// Remove every vector
    pub fn clear(&mut self) {
        self.backend.clear();
    }
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("dimension", &self.dimension())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_search() {
        let mut store = VectorStore::new(2);
        store.add(&[1.0, 0.0]).unwrap();
        store.add(&[0.0, 1.0]).unwrap();
        let hits = store.search(&[0.0, 1.0], 1).unwrap();
        assert_eq!(hits, vec![(Ordinal::new(1), 1.0)]);
    }

    #[test]
    fn test_wrong_dimension_rejected() {
        let mut store = VectorStore::new(512);
        let err = store.add(&vec![0.5; 256]).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(store.len(), 0);
        assert!(store.search(&[1.0], 5).is_err());
    }

    #[test]
    fn test_empty_search_is_empty() {
        let store = VectorStore::new(3);
        assert!(store.search(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());
    }
}
