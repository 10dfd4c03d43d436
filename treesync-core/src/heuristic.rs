//! Newest-wins-by-margin propagation gate.

use std::fs::Metadata;
use std::io;
use std::time::{Duration, SystemTime};

/// Minimum age advantage the source must have over the destination before an
/// overwrite is propagated. Absorbs filesystem timestamp granularity and the
/// engine's own copy echo in two-way mode: a fresh copy stamps the other side
/// with "now", which must not read as "newer" when the roles swap.
pub const PROPAGATE_MARGIN: Duration = Duration::from_secs(2);

/// The coarse signals the engine is allowed to look at: size and mtime.
/// No hashing, no content diffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFacts {
    pub len: u64,
    pub modified: SystemTime,
}

impl FileFacts {
    pub fn of(meta: &Metadata) -> io::Result<Self> {
        Ok(Self {
            len: meta.len(),
            modified: meta.modified()?,
        })
    }
}

/// Overwrite the destination only when the source is at least
/// [`PROPAGATE_MARGIN`] newer AND the sizes differ. Size inequality is a
/// cheap proxy for "content actually changed"; equal sizes with a fresh
/// timestamp are treated as an echo or a metadata-only event and skipped.
///
/// This is a heuristic, not a guarantee: edits on both sides within the
/// margin, or clocks skewed between volumes, can lose a change.
pub fn should_propagate(src: &FileFacts, dest: &FileFacts) -> bool {
    src.modified >= dest.modified + PROPAGATE_MARGIN && src.len != dest.len
}
