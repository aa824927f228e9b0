//! Flag registry: recognized flags and flag packs, loaded from `config.json`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ZoneError;
use crate::store::atomic_write;

pub const NO_BUILD: &str = "nobuild";
pub const NO_CRAFT: &str = "nocraft";
pub const NO_DAMAGE: &str = "nodamage";
pub const NO_STRUCTURE_DAMAGE: &str = "nostructuredamage";
pub const NO_BARRICADE_DAMAGE: &str = "nobarricadedamage";
pub const NO_VEHICLE_DAMAGE: &str = "novehicledamage";
pub const NO_TIRE_DAMAGE: &str = "notiredamage";
pub const NO_CARJACK: &str = "nocarjack";
pub const NO_SIPHON: &str = "nosiphon";
pub const NO_VEHICLE_HOOK: &str = "novehiclehook";
pub const NO_LOCKPICK: &str = "nolockpick";
pub const NO_ITEM_PICKUP: &str = "noitempickup";

const VEHICLE_FLAGS: [&str; 6] = [
    NO_VEHICLE_DAMAGE,
    NO_TIRE_DAMAGE,
    NO_CARJACK,
    NO_SIPHON,
    NO_VEHICLE_HOOK,
    NO_LOCKPICK,
];

/// On-disk layout of the configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagsConfig {
    #[serde(default)]
    pub predefined_flags: BTreeSet<String>,
    /// Pack name -> constituent flags, in the order they are applied.
    #[serde(default)]
    pub flag_packs: BTreeMap<String, Vec<String>>,
    /// Reserved for extension; carried through untouched.
    #[serde(default)]
    pub custom_flags: BTreeMap<String, serde_json::Value>,
}

impl Default for FlagsConfig {
    fn default() -> Self {
        let predefined: BTreeSet<String> = [
            NO_BUILD,
            NO_CRAFT,
            NO_DAMAGE,
            NO_STRUCTURE_DAMAGE,
            NO_BARRICADE_DAMAGE,
            NO_ITEM_PICKUP,
        ]
        .into_iter()
        .chain(VEHICLE_FLAGS)
        .map(str::to_owned)
        .collect();

        let mut packs = BTreeMap::new();
        packs.insert("safezone".to_owned(), predefined.iter().cloned().collect());
        packs.insert(
            "novehicle".to_owned(),
            VEHICLE_FLAGS.iter().map(|f| (*f).to_owned()).collect(),
        );
        packs.insert(
            "noraid".to_owned(),
            vec![
                NO_STRUCTURE_DAMAGE.to_owned(),
                NO_BARRICADE_DAMAGE.to_owned(),
                NO_LOCKPICK.to_owned(),
            ],
        );

        Self {
            predefined_flags: predefined,
            flag_packs: packs,
            custom_flags: BTreeMap::new(),
        }
    }
}

impl FlagsConfig {
    /// Read the document at `path`. A missing or blank file yields `Ok(None)`.
    pub fn read(path: &Path) -> Result<Option<Self>, ZoneError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ZoneError::malformed(path, e)),
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ZoneError::malformed(path, e))
    }

    pub fn write(&self, path: &Path) -> Result<(), ZoneError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| ZoneError::persistence(path, e))?;
        atomic_write(path, json.as_bytes()).map_err(|e| ZoneError::persistence(path, e))
    }

    fn warn_unknown_pack_members(&self) {
        for (pack, members) in &self.flag_packs {
            for flag in members {
                if !self.predefined_flags.contains(flag) {
                    log::warn!(
                        "uzones: pack '{pack}' lists '{flag}', which is not a predefined flag; it will be skipped"
                    );
                }
            }
        }
    }
}

/// Recognized flags and packs.
#[derive(Debug, Clone)]
pub struct FlagRegistry {
    path: PathBuf,
    config: FlagsConfig,
}

impl FlagRegistry {
    /// Build a registry that is not backed by a document.
    #[must_use]
    pub fn in_memory(config: FlagsConfig) -> Self {
        Self {
            path: PathBuf::new(),
            config,
        }
    }

    /// Load from `path`, writing the built-in default when the document is absent.
    /// A malformed document falls back to the default in memory and is left untouched on disk.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ZoneError> {
        let path = path.into();
        let config = match FlagsConfig::read(&path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                let config = FlagsConfig::default();
                config.write(&path)?;
                log::info!("uzones: Created default flag config at {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("uzones: {e}; using built-in flag defaults");
                FlagsConfig::default()
            }
        };
        config.warn_unknown_pack_members();
        Ok(Self { path, config })
    }

    /// Re-read the document and write it back normalized. A missing document is
    /// re-materialized from the default. On a parse failure the current configuration
    /// stays in force; a failed write-back keeps the freshly read one.
    pub fn reload(&mut self) -> Result<(), ZoneError> {
        let config = FlagsConfig::read(&self.path)?.unwrap_or_default();
        config.warn_unknown_pack_members();
        self.config = config;
        self.config.write(&self.path)
    }

    #[must_use]
    pub const fn config(&self) -> &FlagsConfig {
        &self.config
    }

    #[must_use]
    pub fn is_flag(&self, name: &str) -> bool {
        self.config.predefined_flags.contains(name)
    }

    #[must_use]
    pub fn is_pack(&self, name: &str) -> bool {
        self.config.flag_packs.contains_key(name)
    }

    #[must_use]
    pub fn is_recognized(&self, name: &str) -> bool {
        self.is_flag(name) || self.is_pack(name)
    }

    /// A plain flag expands to itself, a pack to its predefined constituents.
    /// Plain flags shadow packs of the same name.
    pub fn expand(&self, name: &str) -> Result<Vec<String>, ZoneError> {
        if self.is_flag(name) {
            return Ok(vec![name.to_owned()]);
        }
        match self.config.flag_packs.get(name) {
            Some(members) => Ok(members
                .iter()
                .filter(|f| self.is_flag(f))
                .cloned()
                .collect()),
            None => Err(ZoneError::UnknownFlag(name.to_owned())),
        }
    }
}
