//! Exact flat inner-product index.
//!
//! Vectors live in one contiguous row-major buffer; search is a full
//! scan. At the corpus sizes this serves (thousands to low hundreds of
//! thousands of items) an exact scan over unit-norm vectors is fast
//! enough, and it never trades recall away.

use ideadb_core::error::{Error, Result};
use ideadb_core::traits::VectorIndex;

pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, data: Vec::new() }
    }

    pub fn with_capacity(dim: usize, rows: usize) -> Self {
        Self { dim, data: Vec::with_capacity(dim.saturating_mul(rows)) }
    }

    fn rows(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }
}

impl VectorIndex for FlatIndex {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.rows()
    }

    fn insert(&mut self, vector: &[f32]) -> Result<usize> {
        if self.dim == 0 || vector.len() != self.dim {
            return Err(Error::CorruptIndexState(format!(
                "cannot insert dim-{} vector into dim-{} index",
                vector.len(),
                self.dim
            )));
        }
        let position = self.rows();
        self.data.extend_from_slice(vector);
        Ok(position)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if self.dim == 0 || query.len() != self.dim {
            return Err(Error::CorruptIndexState(format!(
                "cannot search dim-{} query against dim-{} index",
                query.len(),
                self.dim
            )));
        }
        if self.data.is_empty() {
            return Ok(Vec::new());
        }
        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .map(|row| row.iter().zip(query.iter()).map(|(a, b)| a * b).sum::<f32>())
            .enumerate()
            .collect();
        // descending score; equal scores resolve to the earliest insertion
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);
        Ok(scored)
    }

    fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dim)?;
        let end = start.checked_add(self.dim)?;
        self.data.get(start..end)
    }

    fn clear(&mut self) {
        self.data.clear();
    }
}
