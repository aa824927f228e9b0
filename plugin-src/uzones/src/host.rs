//! What the plugin needs from the hosting server.
//!
//! The host owns command argument binding, the permission backend, chat, teleporting
//! and world objects. Everything here is async because hosts dispatch on their own runtime.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use uuid::Uuid;

use crate::geometry::Position;
use crate::zone::MarkerId;

pub type HostFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Chat colors used in replies and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedColor {
    Green,
    Red,
    Yellow,
    Aqua,
    Gold,
}

pub trait Host: Send + Sync {
    /// Folder holding `config.json` and `zones.json`.
    fn data_folder(&self) -> PathBuf;

    fn has_permission<'a>(&'a self, player: Uuid, node: &'a str) -> HostFuture<'a, bool>;

    fn send_message<'a>(&'a self, player: Uuid, text: String, color: NamedColor) -> HostFuture<'a, ()>;

    /// Current position of an online player.
    fn position<'a>(&'a self, player: Uuid) -> HostFuture<'a, Option<Position>>;

    fn teleport<'a>(&'a self, player: Uuid, to: Position) -> HostFuture<'a, bool>;

    /// Spawn a world object marking `at`; `None` if the host could not place one.
    fn spawn_marker<'a>(&'a self, at: Position) -> HostFuture<'a, Option<MarkerId>>;

    /// Destroy a marker. Markers that no longer exist are ignored.
    fn destroy_marker<'a>(&'a self, marker: MarkerId) -> HostFuture<'a, ()>;
}
