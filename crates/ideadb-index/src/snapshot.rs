//! One-file persistence for the aligned (items, vectors) pair.
//!
//! The table and its vectors are saved and loaded as a single artifact so
//! they cannot drift apart on disk. Load validates every alignment
//! property before anything reaches a live engine; a snapshot that fails
//! validation is rejected outright rather than partially applied.

use std::fs;
use std::path::Path;

use ideadb_core::error::{Error, Result};
use ideadb_core::types::{Interaction, Item};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u32,
    pub embedder_id: String,
    pub dim: usize,
    pub items: Vec<Item>,
    pub vectors: Vec<Vec<f32>>,
    /// Raw interaction log; absent in artifacts written before it existed.
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

impl Snapshot {
    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(Error::CorruptIndexState(format!(
                "snapshot schema {} (supported {})",
                self.schema_version, SCHEMA_VERSION
            )));
        }
        if self.items.len() != self.vectors.len() {
            return Err(Error::CorruptIndexState(format!(
                "snapshot holds {} items but {} vectors",
                self.items.len(),
                self.vectors.len()
            )));
        }
        if let Some((i, v)) = self.vectors.iter().enumerate().find(|(_, v)| v.len() != self.dim) {
            return Err(Error::CorruptIndexState(format!(
                "snapshot vector {} has dim {} (expected {})",
                i,
                v.len(),
                self.dim
            )));
        }
        Ok(())
    }

    /// Writes via a temp file plus rename so a crash mid-save never
    /// leaves a truncated artifact behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let snapshot: Snapshot = serde_json::from_slice(&data)
            .map_err(|e| Error::CorruptIndexState(format!("unreadable snapshot: {e}")))?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}
