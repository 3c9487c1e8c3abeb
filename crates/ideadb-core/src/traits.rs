use crate::error::Result;

/// Maps normalized text to fixed-length unit-norm vectors.
///
/// Implementations must be deterministic for a given input and return
/// L2-normalized vectors of exactly `dim()` elements.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g., `hash:d384`).
    /// Snapshots record it so an index is never reloaded into a
    /// different embedding space.
    fn id(&self) -> String;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Append-only nearest-neighbor index over unit-norm vectors.
///
/// Callers pre-normalize every vector, stored and query alike; the index
/// performs no normalization of its own. Positions are assigned
/// sequentially and never reused, so position `i` here always pairs with
/// row `i` of the item table.
pub trait VectorIndex: Send + Sync {
    fn dim(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Appends a vector and returns its ordinal position. Dimension
    /// mismatch is a fatal precondition violation, never a silent
    /// truncate or pad.
    fn insert(&mut self, vector: &[f32]) -> Result<usize>;
    /// Up to `k` `(position, score)` pairs ordered by descending
    /// inner-product score, ties broken by ascending position.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>>;
    /// The stored vector at `position`, for snapshot export.
    fn vector(&self, position: usize) -> Option<&[f32]>;
    /// Drops all vectors; used when restoring from a snapshot.
    fn clear(&mut self);
}
