//! Brute-Force Vector Search Backend
//!
//! Exact O(N·D) scan over the heap. Sufficient for the collection sizes a
//! single service holds; performance degrades linearly with N.

use std::cmp::Ordering;

use xmodal_core::{Ordinal, XmodalResult};

use super::backend::VectorIndexBackend;
use super::distance::dot_product;
use super::heap::VectorHeap;

/// Brute-force vector search backend
pub struct BruteForceBackend {
    heap: VectorHeap,
}

impl BruteForceBackend {
    /// Create a new brute-force backend
    pub fn new(dimension: usize) -> Self {
        BruteForceBackend {
            heap: VectorHeap::new(dimension),
        }
    }
}

impl VectorIndexBackend for BruteForceBackend {
    fn append(&mut self, embedding: &[f32]) -> XmodalResult<Ordinal> {
        self.heap.push(embedding)
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<(Ordinal, f32)> {
        if k == 0 || self.heap.is_empty() || query.len() != self.heap.dimension() {
            return Vec::new();
        }

        let mut results: Vec<(Ordinal, f32)> = self
            .heap
            .iter()
            .map(|(ordinal, embedding)| (ordinal, dot_product(query, embedding)))
            .collect();

        // score desc, then ordinal asc so equal scores rank stably
        results.sort_by(|(ord_a, score_a), (ord_b, score_b)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(Ordering::Equal)
                .then_with(|| ord_a.cmp(ord_b))
        });

        results.truncate(k);
        results
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn dimension(&self) -> usize {
        self.heap.dimension()
    }

    fn get(&self, ordinal: Ordinal) -> Option<&[f32]> {
        self.heap.get(ordinal)
    }

    fn raw_data(&self) -> &[f32] {
        self.heap.raw_data()
    }

    fn restore(&mut self, data: Vec<f32>) -> XmodalResult<()> {
        self.heap = VectorHeap::from_data(self.heap.dimension(), data)?;
        Ok(())
    }

    fn clear(&mut self) {
        self.heap.clear();
    }
}
