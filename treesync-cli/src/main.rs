use anyhow::{anyhow, Result};
use clap::Parser;
use std::{fs, path::Path, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;
use treesync_core::{MirrorConfig, MirrorManager, MirrorObserver, SyncEngine};

#[derive(Parser)]
#[command(name = "treesync", version, about = "TreeSync – directory mirroring CLI")]
struct Cli {
    /// Path to config file (YAML / JSON): a list of mirror pairs
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

/// Reports every mirrored mutation through tracing.
struct LogObserver;

impl MirrorObserver for LogObserver {
    fn on_created(&self, path: &Path) {
        info!(path = %path.display(), "created");
    }
    fn on_changed(&self, path: &Path) {
        info!(path = %path.display(), "changed");
    }
    fn on_deleted(&self, path: &Path) {
        info!(path = %path.display(), "deleted");
    }
    fn on_renamed(&self, old: &Path, new: &Path) {
        info!(from = %old.display(), to = %new.display(), "renamed");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let text = fs::read_to_string(&cli.config)
        .map_err(|e| anyhow!("read config {} failed: {e}", cli.config))?;

    // Detect format by extension
    let ext = Path::new(&cli.config)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let pairs: Vec<MirrorConfig> = match ext {
        "json" => serde_json::from_str(&text)?,
        _ => serde_yaml::from_str(&text)?, // default to yaml
    };

    if pairs.is_empty() {
        return Err(anyhow!("no mirror pairs defined in config"));
    }

    let mut manager = MirrorManager::new();
    for cfg in pairs {
        let name = if cfg.name.is_empty() {
            cfg.id.to_string()
        } else {
            cfg.name.clone()
        };
        let two_way = cfg.two_way;
        let engine = Arc::new(SyncEngine::new(cfg));
        engine.attach_observer(LogObserver);
        manager.start(engine)?;
        info!(pair = %name, two_way, "mirroring");
    }

    println!("TreeSync running... press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    println!("Stopping");
    manager.stop_all();
    Ok(())
}
