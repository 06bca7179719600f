//! Derived views over the knowledge store.
//!
//! Both views are recomputed from a store snapshot on every read; records
//! are personal-scale, so a full rebuild stays cheap.

pub mod folders;
pub mod timeline;

pub use folders::ParaFolders;
pub use timeline::{Timeline, TimelineDay};
