use crate::{engine::SyncEngine, error::EngineError};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Keeps a set of running engines keyed by their config id, so a caller can
/// run many mirror pairs and tear them all down together.
#[derive(Default)]
pub struct MirrorManager {
    engines: HashMap<Uuid, Arc<SyncEngine>>,
}

impl MirrorManager {
    pub fn new() -> Self {
        Self {
            engines: HashMap::new(),
        }
    }

    /// Start the engine in the mode its config asks for and keep it. A
    /// second start for the same id is a no-op; a start failure is returned
    /// and the engine is not kept.
    pub fn start(&mut self, engine: Arc<SyncEngine>) -> Result<(), EngineError> {
        let id = engine.id();
        if self.engines.contains_key(&id) {
            return Ok(());
        }
        engine.start(engine.config().two_way)?;
        self.engines.insert(id, engine);
        Ok(())
    }

    pub fn stop(&mut self, id: Uuid) {
        if let Some(engine) = self.engines.remove(&id) {
            let _ = engine.stop();
        }
    }

    pub fn stop_all(&mut self) {
        for (_, engine) in self.engines.drain() {
            let _ = engine.stop();
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Arc<SyncEngine>> {
        self.engines.get(&id)
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MirrorConfig;
    use crate::engine::EngineStatus;

    fn pair(two_way: bool) -> (tempfile::TempDir, tempfile::TempDir, Arc<SyncEngine>) {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let cfg = MirrorConfig {
            id: Uuid::new_v4(),
            name: String::new(),
            source: a.path().to_path_buf(),
            destination: b.path().to_path_buf(),
            ignore: Vec::new(),
            two_way,
        };
        let engine = Arc::new(SyncEngine::new(cfg));
        (a, b, engine)
    }

    #[test]
    fn starts_and_stops_engines() {
        let (_a, _b, engine) = pair(false);
        let id = engine.id();
        let mut mgr = MirrorManager::new();

        mgr.start(Arc::clone(&engine)).unwrap();
        assert_eq!(engine.status(), EngineStatus::OneWay);
        assert_eq!(mgr.len(), 1);

        // Same id again: kept as-is.
        mgr.start(Arc::clone(&engine)).unwrap();
        assert_eq!(mgr.len(), 1);

        mgr.stop(id);
        assert_eq!(engine.status(), EngineStatus::Stopped);
        assert!(mgr.is_empty());
    }

    #[test]
    fn start_mode_comes_from_the_config() {
        let (_a, _b, engine) = pair(true);
        let mut mgr = MirrorManager::new();

        mgr.start(Arc::clone(&engine)).unwrap();
        assert_eq!(engine.status(), EngineStatus::TwoWay);
        mgr.stop_all();
    }

    #[test]
    fn stop_all_stops_everything() {
        let (_a1, _b1, e1) = pair(false);
        let (_a2, _b2, e2) = pair(false);
        let mut mgr = MirrorManager::new();
        mgr.start(Arc::clone(&e1)).unwrap();
        mgr.start(Arc::clone(&e2)).unwrap();

        mgr.stop_all();
        assert_eq!(e1.status(), EngineStatus::Stopped);
        assert_eq!(e2.status(), EngineStatus::Stopped);
        assert!(mgr.is_empty());
    }
}
