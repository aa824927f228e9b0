//! Event handlers: membership updates on join/move and action gates.

use uuid::Uuid;

use crate::gate::{Gate, GateSubject, override_node};
use crate::geometry::Position;
use crate::host::{HostFuture, NamedColor};
use crate::membership::Transition;
use crate::state::PluginState;

pub trait EventHandler<E>: Send + Sync {
    fn handle<'a>(&'a self, event: &'a E) -> HostFuture<'a, ()>;
}

/// A tracked player reported a new position.
#[derive(Debug, Clone)]
pub struct PlayerMoveEvent {
    pub player: Uuid,
    pub name: String,
    pub to: Position,
}

/// A player joined; `position` is where they spawned.
#[derive(Debug, Clone)]
pub struct PlayerJoinEvent {
    pub player: Uuid,
    pub name: String,
    pub position: Position,
}

/// An action the host asks permission for.
#[derive(Debug, Clone, Copy)]
pub struct GateEvent {
    pub gate: Gate,
    pub subject: GateSubject,
}

async fn update_and_notify(state: &PluginState, player: Uuid, name: &str, pos: &Position) -> Transition {
    let transition = state.engine.lock().await.update_position(player, pos);

    for zone in &transition.exited {
        log::info!("uzones: {name} has left zone: {zone}");
        state
            .message(player, format!("You left {zone}"), NamedColor::Red)
            .await;
    }
    for zone in &transition.entered {
        log::info!("uzones: {name} has entered zone: {zone}");
        state
            .message(player, format!("You entered {zone}"), NamedColor::Green)
            .await;
    }
    transition
}

// ───────────────────────────── Player Move ─────────────────────────────

pub struct ZoneMoveHandler {
    pub state: PluginState,
}

impl EventHandler<PlayerMoveEvent> for ZoneMoveHandler {
    fn handle<'a>(&'a self, event: &'a PlayerMoveEvent) -> HostFuture<'a, ()> {
        Box::pin(async move {
            update_and_notify(&self.state, event.player, &event.name, &event.to).await;
        })
    }
}

// ───────────────────────────── Player Join ─────────────────────────────

pub struct ZoneJoinHandler {
    pub state: PluginState,
}

impl EventHandler<PlayerJoinEvent> for ZoneJoinHandler {
    fn handle<'a>(&'a self, event: &'a PlayerJoinEvent) -> HostFuture<'a, ()> {
        Box::pin(async move {
            let transition =
                update_and_notify(&self.state, event.player, &event.name, &event.position).await;
            let engine = self.state.engine.lock().await;
            let zones = engine
                .tracker()
                .zones_of(&event.player)
                .map_or(0, std::collections::BTreeSet::len);
            log::info!(
                "uzones: {} joined inside {zones} zone(s) ({} entered, {} left while away)",
                event.name,
                transition.entered.len(),
                transition.exited.len(),
            );
        })
    }
}

// ───────────────────────────── Action gates ─────────────────────────────

pub struct ZoneGateHandler {
    pub state: PluginState,
}

impl ZoneGateHandler {
    /// Decide whether the host must veto the action. `true` blocks it.
    ///
    /// The override permission is fetched from the host before the engine lock is taken,
    /// then handed to the resolver as its authorizer.
    pub fn is_blocked<'a>(&'a self, event: &'a GateEvent) -> HostFuture<'a, bool> {
        Box::pin(async move {
            let flag = event.gate.flag();
            let overridden = match event.subject {
                GateSubject::Entity(entity) => {
                    self.state
                        .host
                        .has_permission(entity, &override_node(flag))
                        .await
                }
                GateSubject::Position(_) => false,
            };

            let blocked = self.state.engine.lock().await.check_gate(
                event.gate,
                &event.subject,
                &|_: Uuid, _: &str| overridden,
            );
            if blocked {
                match event.subject {
                    GateSubject::Entity(entity) => {
                        log::debug!("uzones: blocked {} for {entity} by {flag}", event.gate);
                    }
                    GateSubject::Position(pos) => log::debug!(
                        "uzones: blocked {} at ({:.1}, {:.1}, {:.1}) by {flag}",
                        event.gate,
                        pos.x,
                        pos.y,
                        pos.z
                    ),
                }
            }
            blocked
        })
    }
}
