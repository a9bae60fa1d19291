//! Vector Heap - Contiguous embedding storage
//!
//! VectorHeap stores embeddings in a contiguous Vec<f32> for cache-friendly
//! similarity computation. Row `i` is the vector with ordinal `i`.
//!
//! # Invariants
//!
//! - `data.len() == len() * dimension` at all times
//! - Ordinals are assigned by append position and never reused; only
//!   `clear` starts over

use xmodal_core::{Ordinal, XmodalError, XmodalResult};

/// Append-only vector storage
#[derive(Debug, Clone)]
pub struct VectorHeap {
    /// Components per vector
    dimension: usize,

    /// Layout: [v0_dim0, v0_dim1, ..., v0_dimN, v1_dim0, v1_dim1, ...]
    data: Vec<f32>,
}

impl VectorHeap {
    /// Create an empty heap for vectors of `dimension` components
    pub fn new(dimension: usize) -> Self {
        VectorHeap {
            dimension,
            data: Vec::new(),
        }
    }

    /// Rebuild a heap from a row-major matrix (for recovery)
    pub fn from_data(dimension: usize, data: Vec<f32>) -> XmodalResult<Self> {
        if dimension == 0 || data.len() % dimension != 0 {
            return Err(XmodalError::internal(format!(
                "{} floats do not form rows of dimension {}",
                data.len(),
                dimension
            )));
        }
        Ok(VectorHeap { dimension, data })
    }

    /// Get the dimension of vectors in this heap
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get the number of stored vectors
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append a vector, returning its ordinal
    pub fn push(&mut self, embedding: &[f32]) -> XmodalResult<Ordinal> {
        if embedding.len() != self.dimension {
            return Err(XmodalError::DimensionMismatch {
                expected: self.dimension,
                got: embedding.len(),
            });
        }
        let ordinal = Ordinal::new(self.len() as u64);
        self.data.extend_from_slice(embedding);
        Ok(ordinal)
    }

    /// Get embedding by ordinal
    pub fn get(&self, ordinal: Ordinal) -> Option<&[f32]> {
        let start = ordinal.as_usize().checked_mul(self.dimension)?;
        let end = start.checked_add(self.dimension)?;
        self.data.get(start..end)
    }

    /// Iterate all vectors in ordinal order
    pub fn iter(&self) -> impl Iterator<Item = (Ordinal, &[f32])> {
        self.data
            .chunks_exact(self.dimension.max(1))
            .enumerate()
            .map(|(i, row)| (Ordinal::new(i as u64), row))
    }

    /// Get raw data slice (for persistence)
    pub fn raw_data(&self) -> &[f32] {
        &self.data
    }

    /// Remove every vector
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_sequential_ordinals() {
        let mut heap = VectorHeap::new(3);
        assert_eq!(heap.push(&[1.0, 0.0, 0.0]).unwrap(), Ordinal::new(0));
        assert_eq!(heap.push(&[0.0, 1.0, 0.0]).unwrap(), Ordinal::new(1));
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.get(Ordinal::new(1)).unwrap(), &[0.0, 1.0, 0.0]);
        assert!(heap.get(Ordinal::new(2)).is_none());
    }

    #[test]
    fn test_push_rejects_wrong_dimension() {
        let mut heap = VectorHeap::new(4);
        let err = heap.push(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            XmodalError::DimensionMismatch {
                expected: 4,
                got: 2
            }
        ));
        assert!(heap.is_empty());
    }

    #[test]
    fn test_iter_in_ordinal_order() {
        let mut heap = VectorHeap::new(2);
        heap.push(&[1.0, 0.0]).unwrap();
        heap.push(&[0.0, 1.0]).unwrap();
        let ordinals: Vec<u64> = heap.iter().map(|(o, _)| o.as_u64()).collect();
        assert_eq!(ordinals, vec![0, 1]);
    }

    #[test]
    fn test_from_data_validates_shape() {
        assert!(VectorHeap::from_data(3, vec![0.0; 6]).is_ok());
        assert!(VectorHeap::from_data(3, vec![0.0; 5]).is_err());
        assert!(VectorHeap::from_data(0, vec![]).is_err());
    }

    #[test]
    fn test_clear_restarts_ordinals() {
        let mut heap = VectorHeap::new(1);
        heap.push(&[1.0]).unwrap();
        heap.clear();
        assert!(heap.is_empty());
        assert_eq!(heap.push(&[1.0]).unwrap(), Ordinal::new(0));
    }
}
