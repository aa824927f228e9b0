//! Membership tracking: which ready zones each entity is currently inside.
//!
//! An entity can be inside several overlapping zones at once. Each position update
//! recomputes the full set and diffs it against the previous one.

use std::collections::{BTreeSet, HashMap};

use uuid::Uuid;

use crate::geometry::Position;
use crate::store::ZoneStore;
use crate::zone::Zone;

/// Zones entered and left by one position update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub entered: BTreeSet<String>,
    pub exited: BTreeSet<String>,
}

impl Transition {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct MembershipTracker {
    by_entity: HashMap<Uuid, BTreeSet<String>>,
}

impl MembershipTracker {
    /// Rebuild the index from the member sets persisted on each zone.
    #[must_use]
    pub fn from_zones(zones: &[Zone]) -> Self {
        let mut by_entity: HashMap<Uuid, BTreeSet<String>> = HashMap::new();
        for zone in zones.iter().filter(|z| z.is_ready) {
            for member in &zone.members {
                by_entity
                    .entry(*member)
                    .or_default()
                    .insert(zone.zone_name.clone());
            }
        }
        Self { by_entity }
    }

    /// Zone names the entity was last recorded in.
    #[must_use]
    pub fn zones_of(&self, entity: &Uuid) -> Option<&BTreeSet<String>> {
        self.by_entity.get(entity)
    }

    #[must_use]
    pub fn is_member(&self, entity: &Uuid, zone_name: &str) -> bool {
        self.by_entity
            .get(entity)
            .is_some_and(|zones| zones.contains(zone_name))
    }

    /// Recompute the entity's membership at `pos` and apply the difference.
    ///
    /// Zone member sets are updated in place and the store is persisted when anything
    /// changed. A failed save is logged; memory keeps the new membership.
    pub fn update(&mut self, store: &mut ZoneStore, entity: Uuid, pos: &Position) -> Transition {
        let current: BTreeSet<String> = store
            .ready_zones()
            .filter(|z| z.contains(pos))
            .map(|z| z.zone_name.clone())
            .collect();
        let previous = self.by_entity.get(&entity).cloned().unwrap_or_default();

        let transition = Transition {
            entered: current.difference(&previous).cloned().collect(),
            exited: previous.difference(&current).cloned().collect(),
        };
        if transition.is_empty() {
            return transition;
        }

        for zone in store.zones_mut() {
            if transition.entered.contains(&zone.zone_name) {
                zone.members.insert(entity);
            } else if transition.exited.contains(&zone.zone_name) {
                zone.members.remove(&entity);
            }
        }

        if current.is_empty() {
            self.by_entity.remove(&entity);
        } else {
            self.by_entity.insert(entity, current);
        }

        if let Err(e) = store.persist() {
            log::warn!("uzones: membership change for {entity} not saved: {e}");
        }
        transition
    }

    pub fn rename_zone(&mut self, old: &str, new: &str) {
        for zones in self.by_entity.values_mut() {
            if zones.remove(old) {
                zones.insert(new.to_owned());
            }
        }
    }

    /// Drop a zone from every entity's set without reporting an exit.
    pub fn forget_zone(&mut self, name: &str) {
        self.by_entity.retain(|_, zones| {
            zones.remove(name);
            !zones.is_empty()
        });
    }
}
