//! uZones plugin for Pumpkin-style hosts
//!
//! Named polygon zones on the ground plane with:
//! - Admin-built boundaries, one node at a time from the admin's position
//! - Per-zone flags and flag packs that veto host actions (build, damage, vehicles, ...)
//! - Enter/exit tracking with chat notifications
//! - Per-flag permission overrides (`override.<flag>`)
//!
//! Zones persist to `zones.json` and the flag registry to `config.json` in the host's data folder.

pub mod commands;
pub mod engine;
pub mod error;
pub mod events;
pub mod flags;
pub mod gate;
pub mod geometry;
pub mod host;
pub mod membership;
pub mod state;
pub mod store;
pub mod zone;

use std::sync::Arc;
use std::{future::Future, pin::Pin};

pub use commands::{CommandSender, UZonesCommand, ZoneCommand};
pub use engine::ZoneEngine;
pub use error::ZoneError;
pub use events::{GateEvent, PlayerJoinEvent, PlayerMoveEvent};
pub use gate::{Gate, GateSubject};
pub use geometry::Position;
pub use host::{Host, NamedColor};
pub use state::PluginState;

// ---------------------------------------------------------------------------
// Plugin metadata
// ---------------------------------------------------------------------------

pub struct PluginMetadata<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub authors: &'a str,
    pub description: &'a str,
}

pub static METADATA: PluginMetadata<'static> = PluginMetadata {
    name: "uzones",
    version: env!("CARGO_PKG_VERSION"),
    authors: "uZones",
    description: "Polygon zones with flags, flag packs and enter/exit notifications",
};

// ---------------------------------------------------------------------------
// Plugin struct
// ---------------------------------------------------------------------------

/// Everything the host wires up after a successful load.
pub struct Handlers {
    pub move_handler: Arc<events::ZoneMoveHandler>,
    pub join_handler: Arc<events::ZoneJoinHandler>,
    pub gate_handler: Arc<events::ZoneGateHandler>,
    pub command: Arc<UZonesCommand>,
}

#[derive(Default)]
pub struct UZonesPlugin {
    state: Option<PluginState>,
    handlers: Option<Handlers>,
}

impl UZonesPlugin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> Option<&PluginState> {
        self.state.as_ref()
    }

    /// Handlers to register with the host. `None` until `on_load` succeeded.
    #[must_use]
    pub const fn handlers(&self) -> Option<&Handlers> {
        self.handlers.as_ref()
    }

    pub fn on_load(
        &mut self,
        host: Arc<dyn Host>,
    ) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>> {
        let data_folder = host.data_folder();
        if let Err(e) = std::fs::create_dir_all(&data_folder) {
            let e = format!("create data folder {}: {e}", data_folder.display());
            log::error!("uzones: Failed to load: {e}");
            return Box::pin(async move { Err(e) });
        }

        let engine = match ZoneEngine::load(&data_folder) {
            Ok(engine) => engine,
            Err(e) => {
                log::error!("uzones: Failed to load zones: {e}");
                let e = e.to_string();
                return Box::pin(async move { Err(e) });
            }
        };
        let ready = engine.store().ready_zones().count();
        log::info!(
            "uzones: Loaded {} zones ({ready} ready) from {}",
            engine.store().list_all().len(),
            engine.data_path().display()
        );

        let plugin_state = PluginState::new(engine, host);
        self.handlers = Some(Handlers {
            move_handler: Arc::new(events::ZoneMoveHandler {
                state: plugin_state.clone(),
            }),
            join_handler: Arc::new(events::ZoneJoinHandler {
                state: plugin_state.clone(),
            }),
            gate_handler: Arc::new(events::ZoneGateHandler {
                state: plugin_state.clone(),
            }),
            command: Arc::new(UZonesCommand::new(plugin_state.clone())),
        });
        self.state = Some(plugin_state);

        Box::pin(async move {
            log::info!("uzones: Loaded successfully");
            Ok(())
        })
    }

    pub fn on_unload(&mut self) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>> {
        Box::pin(async move {
            self.handlers = None;
            if let Some(state) = self.state.take() {
                let engine = state.engine.lock().await;
                let markers: Vec<_> = engine
                    .store()
                    .list_all()
                    .iter()
                    .flat_map(|z| z.nodes.iter().filter_map(|n| n.marker))
                    .collect();
                let flushed = engine.flush();
                drop(engine);

                state.destroy_markers(markers).await;
                if let Err(e) = flushed {
                    log::error!("uzones: Final save failed: {e}");
                    return Err(e.to_string());
                }
            }
            log::info!("uzones: Unloaded");
            Ok(())
        })
    }
}
