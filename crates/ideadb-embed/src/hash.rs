//! Deterministic hash-based embedder for offline runs and tests.
//!
//! Not a semantic model: texts sharing tokens get correlated vectors and
//! identical texts get identical vectors. That is enough to exercise the
//! index and engine mechanics without model weights on disk.

use std::hash::{Hash, Hasher};

use ideadb_core::traits::Embedder;
use twox_hash::XxHash64;

const MAX_TOKENS: usize = 256;

pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Embedder for HashEmbedder {
    fn id(&self) -> String {
        format!("hash:xx64:d{}", self.dim)
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        MAX_TOKENS
    }

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().take(MAX_TOKENS).enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            // small positional jitter so shuffled texts do not collide
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }
}
