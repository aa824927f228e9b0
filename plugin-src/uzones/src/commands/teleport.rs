//! `tp` and `getpos`: node teleports and position readout.

use crate::commands::{
    CommandExecutor, CommandResult, CommandSender, ZoneCommand, fail, player_only, reply,
};
use crate::error::ZoneError;
use crate::geometry::Position;
use crate::host::NamedColor;
use crate::state::PluginState;
use crate::zone::Node;

pub struct TeleportExecutor(pub PluginState);

fn describe(pos: &Position) -> String {
    format!("({:.2}, {:.2}, {:.2})", pos.x, pos.y, pos.z)
}

impl CommandExecutor for TeleportExecutor {
    fn execute<'a>(&'a self, sender: &'a CommandSender, command: &'a ZoneCommand) -> CommandResult<'a> {
        Box::pin(async move {
            let state = &self.0;
            let Some(player) = sender.as_player() else {
                return player_only(state, sender).await;
            };

            match command {
                ZoneCommand::Teleport { name, index } => {
                    let target = {
                        let engine = state.engine.lock().await;
                        let node = match engine.zone(name) {
                            None => Err(ZoneError::ZoneNotFound(name.clone())),
                            Some(zone) => zone.nodes.get(*index).map(Node::position).ok_or_else(|| {
                                ZoneError::IndexOutOfRange {
                                    zone: name.clone(),
                                    index: *index,
                                    len: zone.nodes.len(),
                                }
                            }),
                        };
                        node
                    };
                    let to = match target {
                        Ok(to) => to,
                        Err(e) => return fail(state, sender, &e).await,
                    };

                    if !state.host.teleport(player, to).await {
                        reply(state, sender, "Teleport failed.", NamedColor::Red).await;
                        return Ok(0);
                    }
                    log::info!(
                        "uzones: teleported {} to node {index} of zone '{name}'",
                        sender.name()
                    );
                    reply(
                        state,
                        sender,
                        format!("Teleported to node {index} in zone {name}."),
                        NamedColor::Green,
                    )
                    .await;
                }

                ZoneCommand::GetPos => {
                    let Some(pos) = state.host.position(player).await else {
                        reply(state, sender, "Could not read your position.", NamedColor::Red).await;
                        return Ok(0);
                    };
                    let text = describe(&pos);
                    log::info!("uzones: {} is at {text}", sender.name());
                    reply(state, sender, format!("Position: {text}"), NamedColor::Aqua).await;
                }

                _ => return Ok(0),
            }
            Ok(1)
        })
    }
}
