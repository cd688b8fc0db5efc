//! Embedding generation for semantic search and retrieval.

mod bert;

pub use bert::BertEmbedder;

use crate::error::{Result, SamleError};
use async_trait::async_trait;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Scale `vector` to unit L2 norm in place.
///
/// Zero and non-finite vectors have no direction and are rejected.
pub fn l2_normalize(vector: &mut [f32]) -> Result<()> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Err(SamleError::Embedding(format!(
            "cannot normalize vector with norm {norm}"
        )));
    }
    for x in vector.iter_mut() {
        *x /= norm;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_normalize_scales_to_unit_length() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v).unwrap();
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((norm(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut v = vec![0.1, -0.7, 0.3, 0.2];
        l2_normalize(&mut v).unwrap();
        let once = v.clone();
        l2_normalize(&mut v).unwrap();
        for (a, b) in once.iter().zip(&v) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_normalize_rejects_degenerate_vectors() {
        assert!(l2_normalize(&mut [0.0, 0.0, 0.0]).is_err());
        assert!(l2_normalize(&mut [f32::NAN, 1.0]).is_err());
        assert!(l2_normalize(&mut []).is_err());
    }
}
