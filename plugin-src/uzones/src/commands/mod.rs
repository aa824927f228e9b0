//! `/uzones` commands.
//!
//! Management (uzones:manage):
//!   add zone <name> | add node <name> | add flag <name> <flag|pack>
//!   remove zone <name> | remove node <name> <index> | remove flag <name> <flag>
//!   replace zone <name> <newName> | replace node <name> <index>
//!
//! Other:
//!   list zones | list zone <name> | list nodes <name> | list flags <name>   (uzones:view)
//!   tp <name> <index>                                                       (uzones:teleport)
//!   getpos                                                                  (uzones:getpos)
//!   visualize nodes <name> on|off                                           (uzones:visualize)
//!   json refresh                                                            (uzones:refresh)

mod list;
mod manage;
mod refresh;
mod teleport;
mod visualize;

use thiserror::Error;
use uuid::Uuid;

use crate::error::ZoneError;
use crate::host::{HostFuture, NamedColor};
use crate::state::PluginState;

pub const PERM_MANAGE: &str = "uzones:manage";
pub const PERM_VIEW: &str = "uzones:view";
pub const PERM_TELEPORT: &str = "uzones:teleport";
pub const PERM_GETPOS: &str = "uzones:getpos";
pub const PERM_VISUALIZE: &str = "uzones:visualize";
pub const PERM_REFRESH: &str = "uzones:refresh";

/// `Ok(1)` on success, `Ok(0)` when a failure was already reported to the sender.
pub type CommandResult<'a> = HostFuture<'a, Result<i32, CommandError>>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Usage: /uzones {0}")]
    Usage(&'static str),
    #[error("You do not have permission to do that ({0}).")]
    PermissionDenied(&'static str),
}

/// Who ran a command.
#[derive(Debug, Clone)]
pub enum CommandSender {
    Player { uuid: Uuid, name: String },
    Console,
}

impl CommandSender {
    #[must_use]
    pub const fn as_player(&self) -> Option<Uuid> {
        match self {
            Self::Player { uuid, .. } => Some(*uuid),
            Self::Console => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Player { name, .. } => name,
            Self::Console => "console",
        }
    }
}

/// A parsed `/uzones` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneCommand {
    AddZone { name: String },
    AddNode { name: String },
    AddFlag { name: String, flag: String },
    RemoveZone { name: String },
    RemoveNode { name: String, index: usize },
    RemoveFlag { name: String, flag: String },
    RenameZone { name: String, new_name: String },
    ReplaceNode { name: String, index: usize },
    ListZones,
    ListZone { name: String },
    ListNodes { name: String },
    ListFlags { name: String },
    Teleport { name: String, index: usize },
    GetPos,
    Visualize { name: String, on: bool },
    RefreshConfig,
}

const USAGE_ADD: &str = "add <zone|node> <name> | add flag <name> <flag|pack>";
const USAGE_REMOVE: &str = "remove zone <name> | remove node <name> <index> | remove flag <name> <flag>";
const USAGE_REPLACE: &str = "replace zone <name> <newName> | replace node <name> <index>";
const USAGE_LIST: &str = "list zones | list <zone|nodes|flags> <name>";
const USAGE_TP: &str = "tp <name> <index>";
const USAGE_VISUALIZE: &str = "visualize nodes <name> <on|off>";
const USAGE_JSON: &str = "json refresh";
const USAGE_ROOT: &str = "<add|remove|replace|list|tp|getpos|visualize|json> ...";

fn index_arg(arg: &str, usage: &'static str) -> Result<usize, CommandError> {
    arg.parse().map_err(|_| CommandError::Usage(usage))
}

impl ZoneCommand {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        let cmd = match args {
            ["add", "zone", name] => Self::AddZone { name: name.to_string() },
            ["add", "node", name] => Self::AddNode { name: name.to_string() },
            ["add", "flag", name, flag] => Self::AddFlag {
                name: name.to_string(),
                flag: flag.to_string(),
            },
            ["add", ..] => return Err(CommandError::Usage(USAGE_ADD)),

            ["remove", "zone", name] => Self::RemoveZone { name: name.to_string() },
            ["remove", "node", name, index] => Self::RemoveNode {
                name: name.to_string(),
                index: index_arg(index, USAGE_REMOVE)?,
            },
            ["remove", "flag", name, flag] => Self::RemoveFlag {
                name: name.to_string(),
                flag: flag.to_string(),
            },
            ["remove", ..] => return Err(CommandError::Usage(USAGE_REMOVE)),

            ["replace", "zone", name, new_name] => Self::RenameZone {
                name: name.to_string(),
                new_name: new_name.to_string(),
            },
            ["replace", "node", name, index] => Self::ReplaceNode {
                name: name.to_string(),
                index: index_arg(index, USAGE_REPLACE)?,
            },
            ["replace", ..] => return Err(CommandError::Usage(USAGE_REPLACE)),

            ["list", "zones"] => Self::ListZones,
            ["list", "zone", name] => Self::ListZone { name: name.to_string() },
            ["list", "nodes", name] => Self::ListNodes { name: name.to_string() },
            ["list", "flags", name] => Self::ListFlags { name: name.to_string() },
            ["list", ..] => return Err(CommandError::Usage(USAGE_LIST)),

            ["tp", name, index] => Self::Teleport {
                name: name.to_string(),
                index: index_arg(index, USAGE_TP)?,
            },
            ["tp", ..] => return Err(CommandError::Usage(USAGE_TP)),

            ["getpos"] => Self::GetPos,

            ["visualize", "nodes", name, "on"] => Self::Visualize {
                name: name.to_string(),
                on: true,
            },
            ["visualize", "nodes", name, "off"] => Self::Visualize {
                name: name.to_string(),
                on: false,
            },
            ["visualize", ..] => return Err(CommandError::Usage(USAGE_VISUALIZE)),

            ["json", "refresh"] => Self::RefreshConfig,
            ["json", ..] => return Err(CommandError::Usage(USAGE_JSON)),

            _ => return Err(CommandError::Usage(USAGE_ROOT)),
        };
        Ok(cmd)
    }

    #[must_use]
    pub const fn permission(&self) -> &'static str {
        match self {
            Self::AddZone { .. }
            | Self::AddNode { .. }
            | Self::AddFlag { .. }
            | Self::RemoveZone { .. }
            | Self::RemoveNode { .. }
            | Self::RemoveFlag { .. }
            | Self::RenameZone { .. }
            | Self::ReplaceNode { .. } => PERM_MANAGE,
            Self::ListZones | Self::ListZone { .. } | Self::ListNodes { .. } | Self::ListFlags { .. } => {
                PERM_VIEW
            }
            Self::Teleport { .. } => PERM_TELEPORT,
            Self::GetPos => PERM_GETPOS,
            Self::Visualize { .. } => PERM_VISUALIZE,
            Self::RefreshConfig => PERM_REFRESH,
        }
    }
}

pub trait CommandExecutor: Send + Sync {
    fn execute<'a>(&'a self, sender: &'a CommandSender, command: &'a ZoneCommand) -> CommandResult<'a>;
}

/// Send a reply to a player, or log it for the console.
pub(crate) async fn reply(state: &PluginState, sender: &CommandSender, text: impl Into<String>, color: NamedColor) {
    let text = text.into();
    match sender.as_player() {
        Some(uuid) => state.message(uuid, text, color).await,
        None => log::info!("uzones: {text}"),
    }
}

/// Report a failed zone operation to the sender and the log.
pub(crate) async fn fail(state: &PluginState, sender: &CommandSender, e: &ZoneError) -> Result<i32, CommandError> {
    log::warn!("uzones: command by {} failed: {e}", sender.name());
    reply(state, sender, e.to_string(), NamedColor::Red).await;
    Ok(0)
}

/// Reply that only players can run this command.
pub(crate) async fn player_only(state: &PluginState, sender: &CommandSender) -> Result<i32, CommandError> {
    reply(state, sender, "Only players can run this command.", NamedColor::Red).await;
    Ok(0)
}

/// Entry point for `/uzones`: parse, check permission, dispatch.
pub struct UZonesCommand {
    state: PluginState,
    manage: manage::ManageExecutor,
    list: list::ListExecutor,
    teleport: teleport::TeleportExecutor,
    visualize: visualize::VisualizeExecutor,
    refresh: refresh::RefreshExecutor,
}

impl UZonesCommand {
    #[must_use]
    pub fn new(state: PluginState) -> Self {
        Self {
            manage: manage::ManageExecutor(state.clone()),
            list: list::ListExecutor(state.clone()),
            teleport: teleport::TeleportExecutor(state.clone()),
            visualize: visualize::VisualizeExecutor(state.clone()),
            refresh: refresh::RefreshExecutor(state.clone()),
            state,
        }
    }

    fn executor_for(&self, command: &ZoneCommand) -> &dyn CommandExecutor {
        match command {
            ZoneCommand::ListZones
            | ZoneCommand::ListZone { .. }
            | ZoneCommand::ListNodes { .. }
            | ZoneCommand::ListFlags { .. } => &self.list,
            ZoneCommand::Teleport { .. } | ZoneCommand::GetPos => &self.teleport,
            ZoneCommand::Visualize { .. } => &self.visualize,
            ZoneCommand::RefreshConfig => &self.refresh,
            _ => &self.manage,
        }
    }

    pub fn run<'a>(&'a self, sender: &'a CommandSender, args: &'a [&'a str]) -> CommandResult<'a> {
        Box::pin(async move {
            let command = match ZoneCommand::parse(args) {
                Ok(command) => command,
                Err(e) => {
                    reply(&self.state, sender, e.to_string(), NamedColor::Red).await;
                    return Err(e);
                }
            };

            let node = command.permission();
            if let Some(uuid) = sender.as_player() {
                if !self.state.host.has_permission(uuid, node).await {
                    let e = CommandError::PermissionDenied(node);
                    reply(&self.state, sender, e.to_string(), NamedColor::Red).await;
                    return Err(e);
                }
            }

            self.executor_for(&command).execute(sender, &command).await
        })
    }
}
