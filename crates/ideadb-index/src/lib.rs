//! Aligned storage: the item table, the flat vector index, and the
//! unified snapshot that persists both as one artifact.

pub mod flat;
pub mod snapshot;
pub mod store;

pub use flat::FlatIndex;
pub use snapshot::{Snapshot, SCHEMA_VERSION};
pub use store::ItemStore;
