//! Path re-rooting between the two mirrored endpoints.

use std::path::{Path, PathBuf};

/// Translate `path` from the coordinate space of `from_root` into
/// `to_root`. Returns `None` when `path` does not live under `from_root`,
/// which the engine treats as an event outside the managed trees and drops.
///
/// The match is component-wise, so `/a/bc/x` is not considered to be under
/// `/a/b`. No `..` resolution, symlink following, or case folding happens
/// here; paths are taken exactly as the watcher reported them.
pub fn map_across(path: &Path, from_root: &Path, to_root: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(from_root).ok()?;
    Some(to_root.join(rel))
}
