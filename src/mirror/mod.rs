//! Static asset mirroring
//!
//! Walks the saved HTML tree, resolves every referenced asset onto the local
//! mirror layout and fetches what is not yet on disk.

mod links;
mod resolver;
mod walker;

pub use links::extract_references;
pub use resolver::{local_path_for, MirrorResolver, MirrorTarget, SkipReason, DIRECTORY_INDEX};
pub use walker::{AlternatingDelay, AssetReport, AssetWalker};
