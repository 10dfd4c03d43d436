//! Core library for TreeSync – live directory-tree mirroring engine.

mod config;
mod engine;
mod error;
mod event;
mod filter;
mod heuristic;
mod manager;
mod mapping;

pub use config::{MirrorConfig, Pattern};
pub use engine::{EngineStatus, MirrorObserver, SyncEngine};
pub use error::EngineError;
pub use event::{raw_changes, MirrorEvent, RawChange};
pub use filter::PathFilter;
pub use heuristic::{should_propagate, FileFacts, PROPAGATE_MARGIN};
pub use manager::MirrorManager;
pub use mapping::map_across;
