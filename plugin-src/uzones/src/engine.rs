//! Zone engine: owns the zone store, flag registry and membership index.
//!
//! Mutations that rename or remove zones go through here so the membership index
//! stays consistent with the store.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::ZoneError;
use crate::flags::FlagRegistry;
use crate::gate::{Authorizer, Gate, GateResolver, GateSubject};
use crate::geometry::Position;
use crate::membership::{MembershipTracker, Transition};
use crate::store::{FlagOutcome, ZoneStore};
use crate::zone::{MarkerId, Node, Zone};

pub const CONFIG_FILE: &str = "config.json";
pub const ZONES_FILE: &str = "zones.json";

pub struct ZoneEngine {
    store: ZoneStore,
    flags: FlagRegistry,
    tracker: MembershipTracker,
}

/// Whether an in-memory change was applied, even if saving it failed.
fn applied<T>(result: &Result<T, ZoneError>) -> bool {
    matches!(result, Ok(_) | Err(ZoneError::PersistenceFailed { .. }))
}

impl ZoneEngine {
    #[must_use]
    pub fn new(store: ZoneStore, flags: FlagRegistry) -> Self {
        let tracker = MembershipTracker::from_zones(store.list_all());
        Self {
            store,
            flags,
            tracker,
        }
    }

    /// Load both documents from `data_folder`.
    pub fn load(data_folder: &Path) -> Result<Self, ZoneError> {
        let flags = FlagRegistry::load(data_folder.join(CONFIG_FILE))?;
        let store = ZoneStore::load(data_folder.join(ZONES_FILE))?;
        Ok(Self::new(store, flags))
    }

    #[must_use]
    pub const fn store(&self) -> &ZoneStore {
        &self.store
    }

    #[must_use]
    pub const fn flags(&self) -> &FlagRegistry {
        &self.flags
    }

    #[must_use]
    pub const fn tracker(&self) -> &MembershipTracker {
        &self.tracker
    }

    #[must_use]
    pub const fn gates(&self) -> GateResolver<'_> {
        GateResolver::new(&self.store, &self.tracker)
    }

    #[must_use]
    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.store.find_by_name(name)
    }

    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.store.path().to_path_buf()
    }

    pub fn create_zone(&mut self, name: &str) -> Result<(), ZoneError> {
        self.store.create_zone(name)
    }

    pub fn remove_zone(&mut self, name: &str) -> Result<Zone, ZoneError> {
        let result = self.store.remove_zone(name);
        if applied(&result) {
            self.tracker.forget_zone(name);
        }
        result
    }

    pub fn rename_zone(&mut self, name: &str, new_name: &str) -> Result<(), ZoneError> {
        let result = self.store.rename_zone(name, new_name);
        if applied(&result) {
            self.tracker.rename_zone(name, new_name);
        }
        result
    }

    pub fn add_node(&mut self, zone_name: &str, pos: Position) -> Result<bool, ZoneError> {
        self.store.add_node(zone_name, pos)
    }

    pub fn remove_node(&mut self, zone_name: &str, index: usize) -> Result<Node, ZoneError> {
        self.store.remove_node(zone_name, index)
    }

    pub fn replace_node(
        &mut self,
        zone_name: &str,
        index: usize,
        pos: Position,
    ) -> Result<Node, ZoneError> {
        self.store.replace_node(zone_name, index, pos)
    }

    pub fn add_flag(&mut self, zone_name: &str, flag_or_pack: &str) -> Result<FlagOutcome, ZoneError> {
        self.store.add_flag(zone_name, flag_or_pack, &self.flags)
    }

    pub fn remove_flag(&mut self, zone_name: &str, flag: &str) -> Result<(), ZoneError> {
        self.store.remove_flag(zone_name, flag)
    }

    fn node_mut(&mut self, zone_name: &str, index: usize) -> Option<&mut Node> {
        self.store
            .zones_mut()
            .iter_mut()
            .find(|z| z.zone_name == zone_name)?
            .nodes
            .get_mut(index)
    }

    /// Detach the markers of a zone, or of one node when `index` is given.
    ///
    /// Taken before a removal or replacement so the handles survive a failed save.
    pub fn take_markers(&mut self, zone_name: &str, index: Option<usize>) -> Vec<MarkerId> {
        if let Some(index) = index {
            return self
                .node_mut(zone_name, index)
                .and_then(|n| n.marker.take())
                .into_iter()
                .collect();
        }
        self.store
            .zones_mut()
            .iter_mut()
            .find(|z| z.zone_name == zone_name)
            .map(|z| z.nodes.iter_mut().filter_map(|n| n.marker.take()).collect())
            .unwrap_or_default()
    }

    /// Attach a freshly spawned marker to node `index`, provided the node still sits at `at`.
    ///
    /// Returns the marker it displaced. `Err` hands the marker back when the zone or node
    /// changed since it was spawned.
    pub fn attach_marker(
        &mut self,
        zone_name: &str,
        index: usize,
        at: Position,
        marker: MarkerId,
    ) -> Result<Option<MarkerId>, MarkerId> {
        match self.node_mut(zone_name, index) {
            Some(node) if node.position() == at => Ok(node.marker.replace(marker)),
            _ => Err(marker),
        }
    }

    pub fn update_position(&mut self, entity: Uuid, pos: &Position) -> Transition {
        self.tracker.update(&mut self.store, entity, pos)
    }

    /// Decide `gate` for `subject`. `true` means the host must veto the action.
    #[must_use]
    pub fn check_gate<A: Authorizer + ?Sized>(&self, gate: Gate, subject: &GateSubject, authz: &A) -> bool {
        self.gates().check(gate, subject, authz)
    }

    pub fn reload_flags(&mut self) -> Result<(), ZoneError> {
        self.flags.reload()
    }

    pub fn flush(&self) -> Result<(), ZoneError> {
        self.store.persist()
    }
}
