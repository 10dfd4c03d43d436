use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Glob pattern (wrapper type for clarity)
/// Stored as a plain String; compilation happens in `PathFilter` at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern(pub String);

/// Configuration for one mirrored directory pair.
///
/// `source` and `destination` must be absolute, disjoint, non-nested
/// directories; nesting them produces propagation loops the engine does not
/// guard against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    #[serde(default = "MirrorConfig::default_id")]
    pub id:          Uuid,
    #[serde(default)]
    pub name:        String,
    pub source:      PathBuf,
    pub destination: PathBuf,
    /// Events whose reported path matches any of these are dropped entirely.
    #[serde(default)]
    pub ignore:      Vec<Pattern>,
    /// Watch both roots and propagate in both directions.
    #[serde(default)]
    pub two_way:     bool,
}

impl MirrorConfig {
    fn default_id() -> Uuid {
        Uuid::new_v4()
    }
}
