//! `list zones|zone|nodes|flags`: read-only zone reports.

use crate::commands::{CommandExecutor, CommandResult, CommandSender, ZoneCommand, fail, reply};
use crate::engine::ZoneEngine;
use crate::error::ZoneError;
use crate::host::NamedColor;
use crate::state::PluginState;
use crate::zone::Zone;

pub struct ListExecutor(pub PluginState);

fn find<'e>(engine: &'e ZoneEngine, name: &str) -> Result<&'e Zone, ZoneError> {
    engine
        .zone(name)
        .ok_or_else(|| ZoneError::ZoneNotFound(name.to_string()))
}

fn summary(zone: &Zone) -> String {
    let state = if zone.is_ready { "ready" } else { "not ready" };
    format!(
        "{} ({} nodes, {state}, {} flags)",
        zone.zone_name,
        zone.nodes.len(),
        zone.flags.len()
    )
}

fn details(zone: &Zone) -> Vec<String> {
    let flags = if zone.flags.is_empty() {
        "none".to_string()
    } else {
        zone.flags.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    vec![
        format!("--- Zone {} ---", zone.zone_name),
        format!("Nodes: {}", zone.nodes.len()),
        format!("Ready: {}", if zone.is_ready { "yes" } else { "no" }),
        format!("Flags: {flags}"),
        format!("Players inside: {}", zone.members.len()),
    ]
}

fn node_lines(zone: &Zone) -> Vec<String> {
    zone.nodes
        .iter()
        .enumerate()
        .map(|(i, n)| format!("Node {i}: x={:.2}, y={:.2}, z={:.2}", n.x, n.y, n.z))
        .collect()
}

impl CommandExecutor for ListExecutor {
    fn execute<'a>(&'a self, sender: &'a CommandSender, command: &'a ZoneCommand) -> CommandResult<'a> {
        Box::pin(async move {
            let state = &self.0;

            // Render under the lock, reply after releasing it.
            let rendered: Result<(String, Vec<String>), ZoneError> = {
                let engine = state.engine.lock().await;
                let out = match command {
                    ZoneCommand::ListZones => {
                        let zones = engine.store().list_all();
                        Ok((
                            format!("--- Zones ({}) ---", zones.len()),
                            zones.iter().map(summary).collect(),
                        ))
                    }
                    ZoneCommand::ListZone { name } => find(&engine, name).map(|z| (String::new(), details(z))),
                    ZoneCommand::ListNodes { name } => find(&engine, name).map(|z| {
                        let header = format!("--- Nodes of {} ({}) ---", z.zone_name, z.nodes.len());
                        (header, node_lines(z))
                    }),
                    ZoneCommand::ListFlags { name } => find(&engine, name).map(|z| {
                        let header = format!("--- Flags of {} ({}) ---", z.zone_name, z.flags.len());
                        (header, z.flags.iter().cloned().collect())
                    }),
                    _ => return Ok(0),
                };
                out
            };

            let (header, lines) = match rendered {
                Ok(r) => r,
                Err(e) => return fail(state, sender, &e).await,
            };

            if matches!(command, ZoneCommand::ListZones) && lines.is_empty() {
                reply(state, sender, "No zones defined.", NamedColor::Yellow).await;
                return Ok(1);
            }

            if !header.is_empty() {
                reply(state, sender, header, NamedColor::Aqua).await;
            }
            for line in lines {
                reply(state, sender, line, NamedColor::Yellow).await;
            }
            Ok(1)
        })
    }
}
