//! Vector Store
//!
//! - `heap`: contiguous f32 storage indexed by ordinal
//! - `distance`: inner product, norm and normalization helpers
//! - `backend`: swappable index backend trait and factory
//! - `brute_force`: exact O(N·D) backend
//! - `store`: dimension-checked façade used by collections

pub mod backend;
pub mod brute_force;
pub mod distance;
pub mod heap;
pub mod store;

pub use backend::{IndexBackendFactory, VectorIndexBackend};
pub use brute_force::BruteForceBackend;
pub use distance::{dot_product, ensure_finite, l2_norm, normalize_in_place, normalized};
pub use heap::VectorHeap;
pub use store::VectorStore;
