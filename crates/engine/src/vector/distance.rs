//! Distance and normalization helpers
//!
//! Stored vectors and queries are unit length, so cosine similarity is a
//! plain inner product. Scores are "higher = more similar".

use xmodal_core::{XmodalError, XmodalResult};

/// Dot product (inner product)
///
/// Equals cosine similarity when both inputs are unit length.
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Dimension mismatch in dot product");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2 norm (Euclidean length)
///
/// Squares are summed in f64 so finite components near the ends of the
/// f32 range neither overflow nor flush to zero.
pub fn l2_norm(v: &[f32]) -> f32 {
    l2_norm_f64(v) as f32
}

fn l2_norm_f64(v: &[f32]) -> f64 {
    v.iter()
        .map(|x| {
            let x = f64::from(*x);
            x * x
        })
        .sum::<f64>()
        .sqrt()
}

/// Scale `v` to unit length in place
///
/// The all-zero vector is left unchanged. Returns the original norm.
pub fn normalize_in_place(v: &mut [f32]) -> f32 {
    let norm = l2_norm_f64(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x = (f64::from(*x) / norm) as f32;
        }
    }
    norm as f32
}

/// Unit-length copy of `v`
pub fn normalized(v: &[f32]) -> Vec<f32> {
    let mut out = v.to_vec();
    normalize_in_place(&mut out);
    out
}

/// Reject NaN and infinite components
pub fn ensure_finite(v: &[f32]) -> XmodalResult<()> {
    match v.iter().position(|x| !x.is_finite()) {
        None => Ok(()),
        Some(i) => Err(XmodalError::validation(format!(
            "embedding component {} is not finite ({})",
            i, v[i]
        ))),
    }
}
