//! Zone storage: the in-memory zone list and its write-through JSON document.
//!
//! Every mutating call persists the whole collection before returning. A failed write is
//! reported as [`ZoneError::PersistenceFailed`] but the in-memory change is kept, so memory
//! and disk stay diverged until the next successful persist.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ZoneError;
use crate::flags::FlagRegistry;
use crate::geometry::Position;
use crate::zone::{MIN_READY_NODES, Node, Zone};

/// Write `data` to `{path}.tmp`, sync it, then rename over `path`.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");

    let mut file = File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)
}

/// Result of adding a flag or pack to a zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagOutcome {
    pub added: Vec<String>,
    /// Flags that were already set. Informational, not an error.
    pub already_present: Vec<String>,
}

pub struct ZoneStore {
    path: PathBuf,
    zones: Vec<Zone>,
}

impl ZoneStore {
    /// An empty store that will persist to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            zones: Vec::new(),
        }
    }

    /// Load the zone document at `path`.
    ///
    /// Missing or blank documents give an empty store. After parsing, `is_ready` is
    /// re-derived from each zone's node count and zones that are not ready are dropped,
    /// as are repeated names after their first occurrence.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ZoneError> {
        let mut store = Self::new(path);
        store.zones = store.read_document()?;
        Ok(store)
    }

    fn read_document(&self) -> Result<Vec<Zone>, ZoneError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ZoneError::malformed(&self.path, e)),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let parsed: Vec<Zone> =
            serde_json::from_str(&text).map_err(|e| ZoneError::malformed(&self.path, e))?;

        let mut seen = HashSet::new();
        let mut zones = Vec::with_capacity(parsed.len());
        for mut zone in parsed {
            zone.is_ready = zone.nodes.len() >= MIN_READY_NODES;
            if !zone.is_ready {
                log::warn!(
                    "uzones: dropping zone '{}' on load: {} nodes, at least {MIN_READY_NODES} required",
                    zone.zone_name,
                    zone.nodes.len()
                );
                continue;
            }
            if !seen.insert(zone.zone_name.clone()) {
                log::warn!(
                    "uzones: dropping duplicate zone '{}' on load",
                    zone.zone_name
                );
                continue;
            }
            zones.push(zone);
        }
        Ok(zones)
    }

    /// Write every zone to the document.
    pub fn persist(&self) -> Result<(), ZoneError> {
        let json = serde_json::to_string_pretty(&self.zones)
            .map_err(|e| ZoneError::persistence(&self.path, e))?;
        atomic_write(&self.path, json.as_bytes()).map_err(|e| {
            log::warn!("uzones: failed to save zones to {}: {e}", self.path.display());
            ZoneError::persistence(&self.path, e)
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.zone_name == name)
    }

    #[must_use]
    pub fn list_all(&self) -> &[Zone] {
        &self.zones
    }

    /// Zones eligible for containment and gating.
    pub fn ready_zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter().filter(|z| z.is_ready)
    }

    pub(crate) fn zones_mut(&mut self) -> &mut [Zone] {
        &mut self.zones
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Zone, ZoneError> {
        self.zones
            .iter_mut()
            .find(|z| z.zone_name == name)
            .ok_or_else(|| ZoneError::ZoneNotFound(name.to_owned()))
    }

    pub fn create_zone(&mut self, name: &str) -> Result<(), ZoneError> {
        if self.find_by_name(name).is_some() {
            return Err(ZoneError::DuplicateZone(name.to_owned()));
        }
        self.zones.push(Zone::new(name));
        self.persist()
    }

    /// Remove a zone and hand it back so its node markers can be cleaned up.
    pub fn remove_zone(&mut self, name: &str) -> Result<Zone, ZoneError> {
        let idx = self
            .zones
            .iter()
            .position(|z| z.zone_name == name)
            .ok_or_else(|| ZoneError::ZoneNotFound(name.to_owned()))?;
        let zone = self.zones.remove(idx);
        self.persist()?;
        Ok(zone)
    }

    pub fn rename_zone(&mut self, name: &str, new_name: &str) -> Result<(), ZoneError> {
        if name != new_name && self.find_by_name(new_name).is_some() {
            return Err(ZoneError::DuplicateZone(new_name.to_owned()));
        }
        self.get_mut(name)?.zone_name = new_name.to_owned();
        self.persist()
    }

    /// Append a node. Returns whether this call made the zone ready.
    pub fn add_node(&mut self, zone_name: &str, pos: Position) -> Result<bool, ZoneError> {
        let zone = self.get_mut(zone_name)?;
        let was_ready = zone.is_ready;
        zone.push_node(Node::at(pos));
        let became_ready = !was_ready && zone.is_ready;
        self.persist()?;
        Ok(became_ready)
    }

    /// Remove the node at `index`, returning it. `is_ready` is left as is.
    pub fn remove_node(&mut self, zone_name: &str, index: usize) -> Result<Node, ZoneError> {
        let zone = self.get_mut(zone_name)?;
        check_index(zone, index)?;
        let node = zone.nodes.remove(index);
        self.persist()?;
        Ok(node)
    }

    /// Move the node at `index` to `pos`, returning the node it replaced.
    pub fn replace_node(
        &mut self,
        zone_name: &str,
        index: usize,
        pos: Position,
    ) -> Result<Node, ZoneError> {
        let zone = self.get_mut(zone_name)?;
        check_index(zone, index)?;
        let old = std::mem::replace(&mut zone.nodes[index], Node::at(pos));
        self.persist()?;
        Ok(old)
    }

    /// Add a flag, or every flag of a pack. Nothing is mutated for an unknown name.
    pub fn add_flag(
        &mut self,
        zone_name: &str,
        flag_or_pack: &str,
        registry: &FlagRegistry,
    ) -> Result<FlagOutcome, ZoneError> {
        // Resolve the zone first so a missing zone wins over an unknown flag.
        self.get_mut(zone_name)?;
        let flags = registry.expand(flag_or_pack)?;

        let zone = self.get_mut(zone_name)?;
        let mut outcome = FlagOutcome::default();
        for flag in flags {
            if zone.flags.insert(flag.clone()) {
                outcome.added.push(flag);
            } else {
                outcome.already_present.push(flag);
            }
        }
        if !outcome.added.is_empty() {
            self.persist()?;
        }
        Ok(outcome)
    }

    pub fn remove_flag(&mut self, zone_name: &str, flag: &str) -> Result<(), ZoneError> {
        let zone = self.get_mut(zone_name)?;
        if !zone.flags.remove(flag) {
            return Err(ZoneError::FlagNotSet {
                zone: zone_name.to_owned(),
                flag: flag.to_owned(),
            });
        }
        self.persist()
    }
}

fn check_index(zone: &Zone, index: usize) -> Result<(), ZoneError> {
    if index < zone.nodes.len() {
        Ok(())
    } else {
        Err(ZoneError::IndexOutOfRange {
            zone: zone.zone_name.clone(),
            index,
            len: zone.nodes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{FlagsConfig, NO_BUILD, NO_CARJACK, NO_DAMAGE};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ZoneStore {
        ZoneStore::new(dir.path().join("zones.json"))
    }

    fn registry() -> FlagRegistry {
        FlagRegistry::in_memory(FlagsConfig::default())
    }

    fn add_square(store: &mut ZoneStore, name: &str, origin: f64, size: f64) {
        store.create_zone(name).unwrap();
        for (x, z) in [(0.0, 0.0), (0.0, size), (size, size), (size, 0.0)] {
            store
                .add_node(name, Position::new(origin + x, 64.0, origin + z))
                .unwrap();
        }
    }

    #[test]
    fn create_rejects_duplicate_name() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.create_zone("spawn").unwrap();
        assert!(matches!(
            store.create_zone("spawn"),
            Err(ZoneError::DuplicateZone(n)) if n == "spawn"
        ));
        assert_eq!(store.list_all().len(), 1);
    }

    #[test]
    fn create_persists_immediately() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.create_zone("spawn").unwrap();
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"zoneName\": \"spawn\""));
    }

    #[test]
    fn third_node_sets_ready_and_removal_keeps_it() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.create_zone("a").unwrap();
        assert!(!store.add_node("a", Position::new(0.0, 0.0, 0.0)).unwrap());
        assert!(!store.add_node("a", Position::new(0.0, 0.0, 5.0)).unwrap());
        assert!(store.add_node("a", Position::new(5.0, 0.0, 5.0)).unwrap());
        assert!(!store.add_node("a", Position::new(5.0, 0.0, 0.0)).unwrap());

        store.remove_node("a", 0).unwrap();
        store.remove_node("a", 0).unwrap();
        let zone = store.find_by_name("a").unwrap();
        assert_eq!(zone.nodes.len(), 2);
        assert!(zone.is_ready);
    }

    #[test]
    fn node_ops_check_zone_and_index() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        assert!(matches!(
            store.add_node("ghost", Position::default()),
            Err(ZoneError::ZoneNotFound(_))
        ));
        add_square(&mut store, "sq", 0.0, 10.0);
        assert!(matches!(
            store.remove_node("sq", 4),
            Err(ZoneError::IndexOutOfRange { index: 4, len: 4, .. })
        ));
        assert!(matches!(
            store.replace_node("sq", 9, Position::default()),
            Err(ZoneError::IndexOutOfRange { .. })
        ));

        let old = store
            .replace_node("sq", 1, Position::new(-2.0, 70.0, 12.0))
            .unwrap();
        assert_eq!(old.position(), Position::new(0.0, 64.0, 10.0));
        let zone = store.find_by_name("sq").unwrap();
        assert_eq!(zone.nodes[1].position(), Position::new(-2.0, 70.0, 12.0));
        assert_eq!(zone.nodes.len(), 4);
    }

    #[test]
    fn rename_checks_target_name() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.create_zone("a").unwrap();
        store.create_zone("b").unwrap();
        assert!(matches!(
            store.rename_zone("a", "b"),
            Err(ZoneError::DuplicateZone(_))
        ));
        store.rename_zone("a", "a").unwrap();
        store.rename_zone("a", "c").unwrap();
        assert!(store.find_by_name("a").is_none());
        assert!(store.find_by_name("c").is_some());
        assert!(matches!(
            store.rename_zone("zz", "yy"),
            Err(ZoneError::ZoneNotFound(_))
        ));
    }

    #[test]
    fn remove_zone_returns_record() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        add_square(&mut store, "gone", 0.0, 4.0);
        let zone = store.remove_zone("gone").unwrap();
        assert_eq!(zone.nodes.len(), 4);
        assert!(store.list_all().is_empty());
        assert!(matches!(
            store.remove_zone("gone"),
            Err(ZoneError::ZoneNotFound(_))
        ));
    }

    #[test]
    fn add_flag_pack_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let registry = registry();
        store.create_zone("garage").unwrap();

        let first = store.add_flag("garage", NO_CARJACK, &registry).unwrap();
        assert_eq!(first.added, vec![NO_CARJACK.to_owned()]);

        let again = store.add_flag("garage", NO_CARJACK, &registry).unwrap();
        assert!(again.added.is_empty());
        assert_eq!(again.already_present, vec![NO_CARJACK.to_owned()]);

        let pack = store.add_flag("garage", "novehicle", &registry).unwrap();
        assert_eq!(pack.added.len(), 5);
        assert_eq!(pack.already_present, vec![NO_CARJACK.to_owned()]);
        assert_eq!(store.find_by_name("garage").unwrap().flags.len(), 6);
    }

    #[test]
    fn add_unknown_flag_mutates_nothing() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.create_zone("z").unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        assert!(matches!(
            store.add_flag("z", "nofun", &registry()),
            Err(ZoneError::UnknownFlag(_))
        ));
        assert!(store.find_by_name("z").unwrap().flags.is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn remove_flag_requires_flag_set() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.create_zone("z").unwrap();
        assert!(matches!(
            store.remove_flag("z", NO_BUILD),
            Err(ZoneError::FlagNotSet { .. })
        ));
        store.add_flag("z", NO_BUILD, &registry()).unwrap();
        store.remove_flag("z", NO_BUILD).unwrap();
        assert!(store.find_by_name("z").unwrap().flags.is_empty());
    }

    #[test]
    fn reload_keeps_ready_zones_and_drops_incomplete_ones() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let registry = registry();
        add_square(&mut store, "first", 0.0, 10.0);
        store.create_zone("draft").unwrap();
        store.add_node("draft", Position::new(1.0, 0.0, 1.0)).unwrap();
        add_square(&mut store, "second", 50.0, 5.0);
        store.add_flag("second", NO_DAMAGE, &registry).unwrap();
        store.add_flag("second", NO_BUILD, &registry).unwrap();

        let reloaded = ZoneStore::load(store.path()).unwrap();
        let names: Vec<&str> = reloaded.list_all().iter().map(Zone::name).collect();
        assert_eq!(names, vec!["first", "second"]);
        for name in names {
            let before = store.find_by_name(name).unwrap();
            let after = reloaded.find_by_name(name).unwrap();
            assert_eq!(before.nodes, after.nodes);
            assert_eq!(before.flags, after.flags);
            assert!(after.is_ready);
        }
    }

    #[test]
    fn load_rederives_ready_and_drops_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zones.json");
        let tri = r#"[{"x":0,"y":0,"z":0},{"x":0,"y":0,"z":4},{"x":4,"y":0,"z":4}]"#;
        let doc = format!(
            r#"[
                {{"zoneName": "a", "nodes": {tri}, "isReady": false}},
                {{"zoneName": "a", "nodes": {tri}, "isReady": true, "flags": ["nobuild"]}},
                {{"zoneName": "b", "nodes": [{{"x":0,"y":0,"z":0}}], "isReady": true}}
            ]"#
        );
        fs::write(&path, doc).unwrap();

        let store = ZoneStore::load(&path).unwrap();
        assert_eq!(store.list_all().len(), 1);
        let a = store.find_by_name("a").unwrap();
        assert!(a.is_ready);
        assert!(a.flags.is_empty());
    }

    #[test]
    fn missing_or_blank_document_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zones.json");
        assert!(ZoneStore::load(&path).unwrap().list_all().is_empty());
        fs::write(&path, "  \n").unwrap();
        assert!(ZoneStore::load(&path).unwrap().list_all().is_empty());
    }

    #[test]
    fn malformed_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zones.json");
        fs::write(&path, r#"{"zoneName": 3}"#).unwrap();
        assert!(matches!(
            ZoneStore::load(&path),
            Err(ZoneError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn persist_failure_keeps_memory_change() {
        let dir = TempDir::new().unwrap();
        // A directory where the document should be makes the rename fail.
        let path = dir.path().join("zones.json");
        fs::create_dir_all(path.join("blocker")).unwrap();
        let mut store = ZoneStore::new(&path);

        assert!(matches!(
            store.create_zone("kept"),
            Err(ZoneError::PersistenceFailed { .. })
        ));
        assert!(store.find_by_name("kept").is_some());
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("zones.json");
        atomic_write(&path, b"[]").unwrap();
        atomic_write(&path, b"[1]").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"[1]");
        assert!(!dir.path().join("nested").join("zones.json.tmp").exists());
    }
}
