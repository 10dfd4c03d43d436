use notify::{
    event::{CreateKind, ModifyKind, RemoveKind, RenameMode},
    EventKind,
};
use std::path::{Path, PathBuf};

/// A change observed on one of the watched roots, reduced to the four cases
/// the engine dispatches on. Whether a `Created`/`Removed` path is a file or
/// a directory is decided later by probing, not carried here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawChange {
    Created(PathBuf),
    Changed(PathBuf),
    Removed(PathBuf),
    Renamed(PathBuf, PathBuf),
}

/// The mutation actually performed on the opposite root, as reported to
/// observers. All paths are in the mutated side's coordinate space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
    Created(PathBuf),
    Changed(PathBuf),
    Deleted(PathBuf),
    Renamed(PathBuf, PathBuf),
}

/// Decode a `notify::Event` into zero or more raw changes.
///
/// Renames only survive as `Renamed` when notify delivers both ends in one
/// event; a single-sided `From` is a disappearance and a single-sided `To`
/// an appearance, since there is no batching layer here to re-pair them.
pub fn raw_changes(event: notify::Event) -> Vec<RawChange> {
    let mut out = Vec::new();
    match event.kind {
        EventKind::Create(CreateKind::File)
        | EventKind::Create(CreateKind::Folder)
        | EventKind::Create(CreateKind::Any)
        | EventKind::Create(CreateKind::Other) => {
            for p in event.paths {
                out.push(RawChange::Created(p));
            }
        }
        EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Metadata(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Other) => {
            // Some backends (Windows in particular) report every content
            // write as Modify(Any); it must decode like a data change.
            for p in event.paths {
                out.push(RawChange::Changed(p));
            }
        }
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::Both if event.paths.len() == 2 => {
                let [from, to]: [PathBuf; 2] =
                    event.paths.try_into().expect("expected exactly 2 paths");
                out.push(RawChange::Renamed(from, to));
            }
            RenameMode::From => {
                for p in event.paths {
                    out.push(RawChange::Removed(p));
                }
            }
            RenameMode::To => {
                for p in event.paths {
                    out.push(RawChange::Created(p));
                }
            }
            _ => {
                // Ambiguous rename: classify each path by whether it still exists.
                for p in event.paths {
                    if p.exists() {
                        out.push(RawChange::Created(p));
                    } else {
                        out.push(RawChange::Removed(p));
                    }
                }
            }
        },
        EventKind::Remove(RemoveKind::File)
        | EventKind::Remove(RemoveKind::Folder)
        | EventKind::Remove(RemoveKind::Any)
        | EventKind::Remove(RemoveKind::Other) => {
            for p in event.paths {
                out.push(RawChange::Removed(p));
            }
        }
        _ => {}
    }
    out
}

impl RawChange {
    /// The path the ignore filter is evaluated against. Renames are filtered
    /// on both ends; see [`RawChange::other_path`].
    pub fn path(&self) -> &Path {
        match self {
            RawChange::Created(p) | RawChange::Changed(p) | RawChange::Removed(p) => p,
            RawChange::Renamed(from, _) => from,
        }
    }

    pub fn other_path(&self) -> Option<&Path> {
        match self {
            RawChange::Renamed(_, to) => Some(to),
            _ => None,
        }
    }
}
