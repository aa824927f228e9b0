//! Shared plugin state for uzones.

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::engine::ZoneEngine;
use crate::geometry::Position;
use crate::host::{Host, NamedColor};
use crate::zone::MarkerId;

/// Shared state passed to event handlers and command executors.
///
/// The engine sits behind one lock; every read or write of zones or membership holds it
/// for the whole operation.
#[derive(Clone)]
pub struct PluginState {
    pub engine: Arc<Mutex<ZoneEngine>>,
    pub host: Arc<dyn Host>,
}

impl PluginState {
    #[must_use]
    pub fn new(engine: ZoneEngine, host: Arc<dyn Host>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            host,
        }
    }

    pub async fn message(&self, player: Uuid, text: impl Into<String>, color: NamedColor) {
        self.host.send_message(player, text.into(), color).await;
    }

    /// Destroy every marker in `markers`.
    pub async fn destroy_markers(&self, markers: impl IntoIterator<Item = MarkerId>) {
        for marker in markers {
            self.host.destroy_marker(marker).await;
        }
    }

    /// Record `marker` on node `index` of `zone`, or destroy it when that node moved or is
    /// gone since the marker was spawned at `at`. Returns whether it was attached.
    pub async fn attach_marker(&self, zone: &str, index: usize, at: Position, marker: MarkerId) -> bool {
        let attached = self.engine.lock().await.attach_marker(zone, index, at, marker);
        match attached {
            Ok(displaced) => {
                self.destroy_markers(displaced).await;
                true
            }
            Err(orphan) => {
                self.host.destroy_marker(orphan).await;
                false
            }
        }
    }
}
