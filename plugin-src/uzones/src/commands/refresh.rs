//! `json refresh`: reload the flag registry.

use crate::commands::{CommandExecutor, CommandResult, CommandSender, ZoneCommand, fail, reply};
use crate::host::NamedColor;
use crate::state::PluginState;

/// `json refresh`: re-read `config.json` without restarting.
pub struct RefreshExecutor(pub PluginState);

impl CommandExecutor for RefreshExecutor {
    fn execute<'a>(&'a self, sender: &'a CommandSender, command: &'a ZoneCommand) -> CommandResult<'a> {
        Box::pin(async move {
            let state = &self.0;
            if !matches!(command, ZoneCommand::RefreshConfig) {
                return Ok(0);
            }

            let counts = {
                let mut engine = state.engine.lock().await;
                let result = engine.reload_flags().map(|()| {
                    let config = engine.flags().config();
                    (config.predefined_flags.len(), config.flag_packs.len())
                });
                result
            };
            let (flags, packs) = match counts {
                Ok(counts) => counts,
                Err(e) => return fail(state, sender, &e).await,
            };

            log::info!("uzones: config reloaded by {} ({flags} flags, {packs} packs)", sender.name());
            reply(
                state,
                sender,
                format!("Config reloaded: {flags} flags, {packs} packs."),
                NamedColor::Green,
            )
            .await;
            Ok(1)
        })
    }
}
