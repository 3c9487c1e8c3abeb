//! Embedding providers and their config-driven selection.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use ideadb_core::config::{expand_path, Config, PROVIDER_HASH, PROVIDER_LOCAL};
use ideadb_core::traits::Embedder;

pub mod hash;
pub mod model;

pub use hash::HashEmbedder;
pub use model::LocalEmbedder;

/// Builds the provider named by `embedding.provider` (`hash` or `local`).
///
/// The choice is made once, here, at startup. A provider that fails to
/// load is surfaced as an error, never silently substituted: an index
/// must not become a mixture of two embedding spaces.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn Embedder>> {
    let provider: String = config.get_or("embedding.provider", PROVIDER_HASH.to_string());
    match provider.as_str() {
        PROVIDER_HASH => {
            let dim: usize = config.get_or("embedding.dim", 384);
            Ok(Arc::new(HashEmbedder::new(dim)))
        }
        PROVIDER_LOCAL => {
            let model_dir: String = config.get("embedding.model_dir")?;
            let max_len: usize = config.get_or("embedding.max_len", 256);
            Ok(Arc::new(LocalEmbedder::load(&expand_path(model_dir), max_len)?))
        }
        other => Err(anyhow!("Unknown embedding.provider '{other}'")),
    }
}
