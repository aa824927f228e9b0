//! `visualize nodes <name> on|off`: world markers on a zone's nodes.

use crate::commands::{
    CommandExecutor, CommandResult, CommandSender, ZoneCommand, fail, player_only, reply,
};
use crate::error::ZoneError;
use crate::geometry::Position;
use crate::host::NamedColor;
use crate::state::PluginState;
use crate::zone::{MarkerId, Node};

/// Shows or hides a marker object on every node of a zone.
pub struct VisualizeExecutor(pub PluginState);

impl VisualizeExecutor {
    /// Node positions of `name` and the markers taken off its nodes, under one lock.
    async fn detach(&self, name: &str) -> Result<(Vec<Position>, Vec<MarkerId>), ZoneError> {
        let mut engine = self.0.engine.lock().await;
        let positions: Vec<Position> = engine
            .zone(name)
            .ok_or_else(|| ZoneError::ZoneNotFound(name.to_string()))?
            .nodes
            .iter()
            .map(Node::position)
            .collect();
        let markers = engine.take_markers(name, None);
        Ok((positions, markers))
    }

    async fn show(&self, name: &str, positions: Vec<Position>) -> usize {
        let state = &self.0;
        let mut shown = 0;
        for (index, pos) in positions.into_iter().enumerate() {
            let Some(marker) = state.host.spawn_marker(pos).await else {
                continue;
            };
            if state.attach_marker(name, index, pos, marker).await {
                shown += 1;
            }
        }
        shown
    }
}

impl CommandExecutor for VisualizeExecutor {
    fn execute<'a>(&'a self, sender: &'a CommandSender, command: &'a ZoneCommand) -> CommandResult<'a> {
        Box::pin(async move {
            let state = &self.0;
            let ZoneCommand::Visualize { name, on } = command else {
                return Ok(0);
            };
            if sender.as_player().is_none() {
                return player_only(state, sender).await;
            }

            let (positions, old) = match self.detach(name).await {
                Ok(detached) => detached,
                Err(e) => return fail(state, sender, &e).await,
            };
            let hidden = old.len();
            state.destroy_markers(old).await;

            if *on {
                let shown = self.show(name, positions).await;
                log::info!("uzones: {} showed {shown} node(s) of zone '{name}'", sender.name());
                reply(
                    state,
                    sender,
                    format!("Showing {shown} node(s) of zone {name}."),
                    NamedColor::Green,
                )
                .await;
            } else {
                log::info!("uzones: {} hid {hidden} node(s) of zone '{name}'", sender.name());
                reply(
                    state,
                    sender,
                    format!("Hid {hidden} node(s) of zone {name}."),
                    NamedColor::Green,
                )
                .await;
            }
            Ok(1)
        })
    }
}
