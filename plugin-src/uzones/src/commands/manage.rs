//! `add`, `remove` and `replace`: zone, node and flag management.

use crate::commands::{
    CommandExecutor, CommandResult, CommandSender, ZoneCommand, fail, player_only, reply,
};
use crate::host::NamedColor;
use crate::state::PluginState;

pub struct ManageExecutor(pub PluginState);

impl ManageExecutor {
    /// Position of the sender, for commands that place nodes where the player stands.
    async fn sender_position(&self, sender: &CommandSender) -> Option<crate::geometry::Position> {
        let uuid = sender.as_player()?;
        self.0.host.position(uuid).await
    }
}

impl CommandExecutor for ManageExecutor {
    fn execute<'a>(&'a self, sender: &'a CommandSender, command: &'a ZoneCommand) -> CommandResult<'a> {
        Box::pin(async move {
            let state = &self.0;
            match command {
                ZoneCommand::AddZone { name } => {
                    let result = state.engine.lock().await.create_zone(name);
                    if let Err(e) = result {
                        return fail(state, sender, &e).await;
                    }
                    log::info!("uzones: {} created zone '{name}'", sender.name());
                    reply(state, sender, format!("Zone {name} added."), NamedColor::Green).await;
                }

                ZoneCommand::AddNode { name } => {
                    let Some(pos) = self.sender_position(sender).await else {
                        return player_only(state, sender).await;
                    };
                    let result = state.engine.lock().await.add_node(name, pos);
                    match result {
                        Ok(became_ready) => {
                            reply(state, sender, format!("Node added to zone {name}."), NamedColor::Green)
                                .await;
                            if became_ready {
                                log::info!("uzones: zone '{name}' is now active");
                                reply(
                                    state,
                                    sender,
                                    format!("Zone {name} now has enough nodes and is active."),
                                    NamedColor::Gold,
                                )
                                .await;
                            }
                        }
                        Err(e) => return fail(state, sender, &e).await,
                    }
                }

                ZoneCommand::AddFlag { name, flag } => {
                    let result = state.engine.lock().await.add_flag(name, flag);
                    let outcome = match result {
                        Ok(outcome) => outcome,
                        Err(e) => return fail(state, sender, &e).await,
                    };
                    if !outcome.added.is_empty() {
                        log::info!(
                            "uzones: {} added {} to zone '{name}'",
                            sender.name(),
                            outcome.added.join(", ")
                        );
                        reply(
                            state,
                            sender,
                            format!("Added {} to zone {name}.", outcome.added.join(", ")),
                            NamedColor::Green,
                        )
                        .await;
                    }
                    if !outcome.already_present.is_empty() {
                        reply(
                            state,
                            sender,
                            format!(
                                "Already set on zone {name}: {}.",
                                outcome.already_present.join(", ")
                            ),
                            NamedColor::Yellow,
                        )
                        .await;
                    }
                }

                ZoneCommand::RemoveZone { name } => {
                    let (markers, result) = {
                        let mut engine = state.engine.lock().await;
                        let markers = engine.take_markers(name, None);
                        (markers, engine.remove_zone(name))
                    };
                    state.destroy_markers(markers).await;
                    if let Err(e) = result {
                        return fail(state, sender, &e).await;
                    }
                    log::info!("uzones: {} removed zone '{name}'", sender.name());
                    reply(state, sender, format!("Zone {name} removed."), NamedColor::Green).await;
                }

                ZoneCommand::RemoveNode { name, index } => {
                    let (markers, result) = {
                        let mut engine = state.engine.lock().await;
                        let markers = engine.take_markers(name, Some(*index));
                        (markers, engine.remove_node(name, *index))
                    };
                    state.destroy_markers(markers).await;
                    if let Err(e) = result {
                        return fail(state, sender, &e).await;
                    }
                    reply(
                        state,
                        sender,
                        format!("Node {index} removed from zone {name}."),
                        NamedColor::Green,
                    )
                    .await;
                }

                ZoneCommand::RemoveFlag { name, flag } => {
                    let result = state.engine.lock().await.remove_flag(name, flag);
                    if let Err(e) = result {
                        return fail(state, sender, &e).await;
                    }
                    reply(
                        state,
                        sender,
                        format!("Flag {flag} removed from zone {name}."),
                        NamedColor::Green,
                    )
                    .await;
                }

                ZoneCommand::RenameZone { name, new_name } => {
                    let result = state.engine.lock().await.rename_zone(name, new_name);
                    if let Err(e) = result {
                        return fail(state, sender, &e).await;
                    }
                    log::info!("uzones: {} renamed zone '{name}' to '{new_name}'", sender.name());
                    reply(
                        state,
                        sender,
                        format!("Zone {name} renamed to {new_name}."),
                        NamedColor::Green,
                    )
                    .await;
                }

                ZoneCommand::ReplaceNode { name, index } => {
                    let Some(pos) = self.sender_position(sender).await else {
                        return player_only(state, sender).await;
                    };
                    let (markers, result) = {
                        let mut engine = state.engine.lock().await;
                        let markers = engine.take_markers(name, Some(*index));
                        (markers, engine.replace_node(name, *index, pos))
                    };
                    // A visualized node keeps a marker, moved to the new spot. The node sits
                    // there in memory even when the save failed.
                    let visualized = !markers.is_empty();
                    state.destroy_markers(markers).await;
                    if visualized {
                        if let Some(marker) = state.host.spawn_marker(pos).await {
                            state.attach_marker(name, *index, pos, marker).await;
                        }
                    }
                    if let Err(e) = result {
                        return fail(state, sender, &e).await;
                    }
                    reply(
                        state,
                        sender,
                        format!("Node {index} in zone {name} replaced."),
                        NamedColor::Green,
                    )
                    .await;
                }

                _ => return Ok(0),
            }
            Ok(1)
        })
    }
}
