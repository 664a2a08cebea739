use std::sync::mpsc;
use std::thread;

use tracing::{debug, warn};

use crate::error::LoadError;
use crate::gltf_loader;
use crate::handle::AssetHandle;
use crate::scene::SceneGraph;

/// A non-blocking handle to an asset load running on a worker thread.
/// Call `try_recv()` each frame and draw a placeholder until it resolves.
pub struct PendingLoad {
    receiver: mpsc::Receiver<Result<SceneGraph, LoadError>>,
}

impl PendingLoad {
    /// Non-blocking check for the result. Returns `None` while still loading.
    ///
    /// A worker that exits without sending (for example by panicking) is
    /// reported as [`LoadError::Interrupted`].
    pub fn try_recv(&self) -> Option<Result<SceneGraph, LoadError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(LoadError::Interrupted)),
        }
    }

    /// Blocking wait for the result.
    pub fn wait(self) -> Result<SceneGraph, LoadError> {
        self.receiver.recv().map_err(|_| LoadError::Interrupted)?
    }

    /// Wrap an already-known outcome.
    pub fn ready(result: Result<SceneGraph, LoadError>) -> Self {
        let (tx, pending) = Self::channel();
        let _ = tx.send(result);
        pending
    }

    /// A pending load fed by the returned sender, for hosts that load
    /// scenes some other way.
    pub fn channel() -> (mpsc::Sender<Result<SceneGraph, LoadError>>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { receiver: rx })
    }
}

/// Start loading `handle` on a background thread.
pub fn spawn_load(handle: AssetHandle) -> PendingLoad {
    let (tx, rx) = mpsc::channel();
    let name = handle.name().to_string();

    let spawned = thread::Builder::new()
        .name(format!("asset-load-{}", handle.id()))
        .spawn(move || {
            let result = gltf_loader::load_scene(&handle);
            if let Err(e) = &result {
                debug!("Load of '{}' failed: {}", handle.name(), e);
            }
            // The receiver is gone when the viewer has moved on; nothing to do.
            let _ = tx.send(result);
        });

    if let Err(e) = spawned {
        warn!("Could not start loader thread for '{}': {}", name, e);
        return PendingLoad::ready(Err(LoadError::Interrupted));
    }

    PendingLoad { receiver: rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::GlbBuilder;
    use crate::format::AssetFormat;

    #[test]
    fn test_pending_load_try_recv_none_then_result() {
        let (tx, rx) = mpsc::channel();
        let pending = PendingLoad { receiver: rx };

        assert!(pending.try_recv().is_none());

        tx.send(Ok(SceneGraph::default())).unwrap();
        assert!(matches!(pending.try_recv(), Some(Ok(_))));
    }

    #[test]
    fn test_dropped_sender_reports_interrupted() {
        let (tx, rx) = mpsc::channel::<Result<SceneGraph, LoadError>>();
        let pending = PendingLoad { receiver: rx };
        drop(tx);
        assert!(matches!(pending.try_recv(), Some(Err(LoadError::Interrupted))));
    }

    #[test]
    fn test_spawn_load_delivers_scene() {
        let bytes = GlbBuilder::new().cuboid([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]).build();
        let handle = AssetHandle::from_bytes("cube.glb", AssetFormat::Glb, bytes);
        let scene = spawn_load(handle).wait().unwrap();
        assert_eq!(scene.geometry_node_count(), 1);
    }

    #[test]
    fn test_spawn_load_delivers_errors() {
        let handle = AssetHandle::from_bytes("bad.glb", AssetFormat::Glb, b"nope".to_vec());
        assert!(spawn_load(handle).wait().is_err());
    }
}
