//! The mirroring engine: watches one or both roots and replays every change
//! onto the opposite side.

use crate::config::MirrorConfig;
use crate::error::EngineError;
use crate::event::{raw_changes, MirrorEvent, RawChange};
use crate::filter::PathFilter;
use crate::heuristic::{should_propagate, FileFacts};
use crate::mapping::map_across;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Receives a notification after each mutation the engine performs on the
/// opposite root. Callbacks run synchronously on the watcher's delivery
/// thread, in mutation order. Observers must not panic; a panic unwinds the
/// delivery thread and kills that subscription.
pub trait MirrorObserver: Send + Sync {
    fn on_created(&self, _path: &Path) {}
    fn on_changed(&self, _path: &Path) {}
    fn on_deleted(&self, _path: &Path) {}
    fn on_renamed(&self, _old: &Path, _new: &Path) {}
}

impl<T: MirrorObserver + ?Sized> MirrorObserver for Arc<T> {
    fn on_created(&self, path: &Path) {
        (**self).on_created(path)
    }
    fn on_changed(&self, path: &Path) {
        (**self).on_changed(path)
    }
    fn on_deleted(&self, path: &Path) {
        (**self).on_deleted(path)
    }
    fn on_renamed(&self, old: &Path, new: &Path) {
        (**self).on_renamed(old, new)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Stopped,
    OneWay,
    TwoWay,
}

/// Which root a raw event was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Source,
    Destination,
}

enum RunState {
    Stopped,
    Running {
        two_way: bool,
        // Dropping the handles tears the subscriptions down.
        _watchers: Vec<RecommendedWatcher>,
    },
}

/// Read-only after start, apart from the observer list.
struct EngineShared {
    cfg: MirrorConfig,
    filter: PathFilter,
    observers: RwLock<Vec<Box<dyn MirrorObserver>>>,
}

/// Mirrors `cfg.source` into `cfg.destination` (and back, in two-way mode)
/// by reacting to live change notifications. Holds no sync state between
/// events: every decision is made from the current filesystem alone, and
/// every filesystem operation is best-effort (failures are logged at debug
/// level and dropped, never retried, never surfaced to observers).
pub struct SyncEngine {
    shared: Arc<EngineShared>,
    state: Mutex<RunState>,
}

impl SyncEngine {
    pub fn new(cfg: MirrorConfig) -> Self {
        let filter = PathFilter::new(&cfg.ignore);
        Self {
            shared: Arc::new(EngineShared {
                cfg,
                filter,
                observers: RwLock::new(Vec::new()),
            }),
            state: Mutex::new(RunState::Stopped),
        }
    }

    pub fn id(&self) -> Uuid {
        self.shared.cfg.id
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.shared.cfg
    }

    /// Register an observer. Attach-only: observers cannot be removed.
    pub fn attach_observer(&self, observer: impl MirrorObserver + 'static) {
        self.shared
            .observers
            .write()
            .unwrap()
            .push(Box::new(observer));
    }

    /// Begin watching. One-way watches the source root only; two-way watches
    /// both roots, relying on the propagation heuristic to stop the echo of
    /// each copy from ping-ponging back.
    pub fn start(&self, two_way: bool) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        if !matches!(*state, RunState::Stopped) {
            return Err(EngineError::AlreadyRunning);
        }

        let cfg = &self.shared.cfg;
        if !cfg.source.is_dir() {
            return Err(EngineError::BadRoot(cfg.source.clone()));
        }
        if two_way && !cfg.destination.is_dir() {
            return Err(EngineError::BadRoot(cfg.destination.clone()));
        }

        let mut watchers = Vec::with_capacity(if two_way { 2 } else { 1 });
        watchers.push(self.spawn_watcher(Origin::Source)?);
        if two_way {
            watchers.push(self.spawn_watcher(Origin::Destination)?);
        }

        info!(
            source = %cfg.source.display(),
            destination = %cfg.destination.display(),
            two_way,
            "sync engine started"
        );
        *state = RunState::Running {
            two_way,
            _watchers: watchers,
        };
        Ok(())
    }

    /// Tear down the watch subscriptions. A mutation already in flight on a
    /// delivery thread completes; no further events are processed.
    pub fn stop(&self) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        match std::mem::replace(&mut *state, RunState::Stopped) {
            RunState::Stopped => Err(EngineError::NotRunning),
            RunState::Running { .. } => {
                info!(source = %self.shared.cfg.source.display(), "sync engine stopped");
                Ok(())
            }
        }
    }

    pub fn status(&self) -> EngineStatus {
        match *self.state.lock().unwrap() {
            RunState::Stopped => EngineStatus::Stopped,
            RunState::Running { two_way: false, .. } => EngineStatus::OneWay,
            RunState::Running { two_way: true, .. } => EngineStatus::TwoWay,
        }
    }

    fn spawn_watcher(&self, origin: Origin) -> Result<RecommendedWatcher, EngineError> {
        let shared = Arc::clone(&self.shared);
        let root = match origin {
            Origin::Source => self.shared.cfg.source.clone(),
            Origin::Destination => self.shared.cfg.destination.clone(),
        };
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    for change in raw_changes(event) {
                        shared.handle_raw(change, origin);
                    }
                }
                Err(e) => debug!(error = %e, "watcher error"),
            },
            notify::Config::default(),
        )?;
        watcher.watch(&root, RecursiveMode::Recursive)?;
        Ok(watcher)
    }
}

impl EngineShared {
    fn roots(&self, origin: Origin) -> (&Path, &Path) {
        match origin {
            Origin::Source => (&self.cfg.source, &self.cfg.destination),
            Origin::Destination => (&self.cfg.destination, &self.cfg.source),
        }
    }

    /// Handle one raw change, fully, on the calling (delivery) thread:
    /// filter, map across the roots, mutate the opposite side, notify.
    fn handle_raw(&self, change: RawChange, origin: Origin) {
        if self.filter.ignores(change.path()) {
            return;
        }
        if let Some(other) = change.other_path() {
            if self.filter.ignores(other) {
                return;
            }
        }

        let (from, to) = self.roots(origin);
        match change {
            RawChange::Created(path) => {
                let Some(target) = map_across(&path, from, to) else {
                    return;
                };
                self.mirror_create(&path, &target);
            }
            RawChange::Changed(path) => {
                let Some(target) = map_across(&path, from, to) else {
                    return;
                };
                self.mirror_change(&path, &target);
            }
            RawChange::Removed(path) => {
                let Some(target) = map_across(&path, from, to) else {
                    return;
                };
                self.mirror_remove(&target);
            }
            RawChange::Renamed(old, new) => {
                let (old_target, new_target) =
                    match (map_across(&old, from, to), map_across(&new, from, to)) {
                        (Some(o), Some(n)) => (o, n),
                        _ => return,
                    };
                self.mirror_rename(&new, &old_target, &new_target);
            }
        }
    }

    fn mirror_create(&self, src: &Path, target: &Path) {
        let smeta = match fs::metadata(src) {
            Ok(m) => m,
            Err(e) => {
                debug!(path = %src.display(), error = %e, "source vanished before create");
                return;
            }
        };
        if smeta.is_dir() {
            if !target.exists() {
                match fs::create_dir_all(target) {
                    Ok(()) => self.emit(MirrorEvent::Created(target.to_path_buf())),
                    Err(e) => debug!(path = %target.display(), error = %e, "mkdir failed"),
                }
            }
            return;
        }
        self.sync_file(src, &smeta, target);
    }

    fn mirror_change(&self, src: &Path, target: &Path) {
        let smeta = match fs::metadata(src) {
            Ok(m) => m,
            // Source already gone; the removal event will converge us.
            Err(_) => return,
        };
        // Directories are mirrored through create/delete only.
        if smeta.is_dir() {
            return;
        }
        self.sync_file(src, &smeta, target);
    }

    /// Shared file path for Created and Changed: a missing (or unreadable)
    /// target is copied unconditionally and reported as `Created`; an
    /// existing target goes through the propagation heuristic and is
    /// reported as `Changed` when overwritten.
    fn sync_file(&self, src: &Path, smeta: &fs::Metadata, target: &Path) {
        match fs::metadata(target) {
            Err(_) => {
                if self.overwrite_copy(src, target) {
                    self.emit(MirrorEvent::Created(target.to_path_buf()));
                }
            }
            Ok(dmeta) => {
                let src_facts = match FileFacts::of(smeta) {
                    Ok(f) => f,
                    Err(e) => {
                        debug!(path = %src.display(), error = %e, "source mtime unreadable");
                        return;
                    }
                };
                let dest_facts = match FileFacts::of(&dmeta) {
                    Ok(f) => f,
                    Err(_) => {
                        // Target metadata unusable: treat as not really there.
                        if self.overwrite_copy(src, target) {
                            self.emit(MirrorEvent::Created(target.to_path_buf()));
                        }
                        return;
                    }
                };
                if should_propagate(&src_facts, &dest_facts) && self.overwrite_copy(src, target) {
                    self.emit(MirrorEvent::Changed(target.to_path_buf()));
                }
            }
        }
    }

    fn mirror_remove(&self, target: &Path) {
        match fs::metadata(target) {
            // Already converged.
            Err(_) => {}
            Ok(m) if m.is_dir() => {
                // Non-recursive: a non-empty directory stays, silently.
                match fs::remove_dir(target) {
                    Ok(()) => self.emit(MirrorEvent::Deleted(target.to_path_buf())),
                    Err(e) => debug!(path = %target.display(), error = %e, "rmdir failed"),
                }
            }
            Ok(_) => {
                clear_readonly(target);
                match fs::remove_file(target) {
                    Ok(()) => self.emit(MirrorEvent::Deleted(target.to_path_buf())),
                    Err(e) => debug!(path = %target.display(), error = %e, "unlink failed"),
                }
            }
        }
    }

    fn mirror_rename(&self, src_new: &Path, old_target: &Path, new_target: &Path) {
        if old_target.exists() {
            match fs::rename(old_target, new_target) {
                Ok(()) => self.emit(MirrorEvent::Renamed(
                    old_target.to_path_buf(),
                    new_target.to_path_buf(),
                )),
                Err(e) => {
                    debug!(
                        from = %old_target.display(),
                        to = %new_target.display(),
                        error = %e,
                        "rename failed"
                    );
                }
            }
        } else {
            // Our view of the old name was already stale (an earlier event
            // was dropped or never seen). A rename is not reconstructible, so
            // degrade to a fresh create at the new location.
            self.mirror_create(src_new, new_target);
        }
    }

    /// Best-effort overwrite copy. Returns whether the copy succeeded; a
    /// failure is logged and dropped (the next change re-triggers it).
    fn overwrite_copy(&self, src: &Path, target: &Path) -> bool {
        match copy_over(src, target) {
            Ok(()) => true,
            Err(e) => {
                debug!(
                    from = %src.display(),
                    to = %target.display(),
                    error = %e,
                    "copy failed"
                );
                false
            }
        }
    }

    fn emit(&self, event: MirrorEvent) {
        let Ok(observers) = self.observers.read() else {
            return;
        };
        for obs in observers.iter() {
            match &event {
                MirrorEvent::Created(p) => obs.on_created(p),
                MirrorEvent::Changed(p) => obs.on_changed(p),
                MirrorEvent::Deleted(p) => obs.on_deleted(p),
                MirrorEvent::Renamed(old, new) => obs.on_renamed(old, new),
            }
        }
    }
}

fn copy_over(src: &Path, target: &Path) -> io::Result<()> {
    // Directory events can be dropped or arrive out of order; making the
    // parent here keeps a later file copy from failing forever.
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    clear_readonly(target);
    fs::copy(src, target)?;
    Ok(())
}

/// Strip a write-protection bit that would block an overwrite or delete.
/// Best-effort; errors are ignored.
fn clear_readonly(path: &Path) {
    let Ok(meta) = fs::metadata(path) else {
        return;
    };
    let mut perms = meta.permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = perms.mode();
        if mode & 0o200 == 0 {
            perms.set_mode(mode | 0o200);
            let _ = fs::set_permissions(path, perms);
        }
    }
    #[cfg(not(unix))]
    {
        if perms.readonly() {
            perms.set_readonly(false);
            let _ = fs::set_permissions(path, perms);
        }
    }
}
