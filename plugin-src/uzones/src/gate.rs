//! Flag gates for host actions.
//!
//! A flag is in force for an entity when any zone it is a member of carries the flag.
//! The entity escapes the gate if it holds `override.<flag>`. Actions with no entity
//! behind them are checked against the zones containing a fixed position instead.

use std::fmt;

use uuid::Uuid;

use crate::flags;
use crate::geometry::Position;
use crate::membership::MembershipTracker;
use crate::store::ZoneStore;

/// Host actions that can be vetoed, one flag each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    Build,
    Craft,
    PlayerDamage,
    StructureDamage,
    BarricadeDamage,
    VehicleDamage,
    VehicleTireDamage,
    VehicleCarjack,
    VehicleSiphon,
    VehicleHook,
    VehicleLockpick,
    ItemTake,
}

impl Gate {
    pub const ALL: [Self; 12] = [
        Self::Build,
        Self::Craft,
        Self::PlayerDamage,
        Self::StructureDamage,
        Self::BarricadeDamage,
        Self::VehicleDamage,
        Self::VehicleTireDamage,
        Self::VehicleCarjack,
        Self::VehicleSiphon,
        Self::VehicleHook,
        Self::VehicleLockpick,
        Self::ItemTake,
    ];

    /// The flag that blocks this action.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Build => flags::NO_BUILD,
            Self::Craft => flags::NO_CRAFT,
            Self::PlayerDamage => flags::NO_DAMAGE,
            Self::StructureDamage => flags::NO_STRUCTURE_DAMAGE,
            Self::BarricadeDamage => flags::NO_BARRICADE_DAMAGE,
            Self::VehicleDamage => flags::NO_VEHICLE_DAMAGE,
            Self::VehicleTireDamage => flags::NO_TIRE_DAMAGE,
            Self::VehicleCarjack => flags::NO_CARJACK,
            Self::VehicleSiphon => flags::NO_SIPHON,
            Self::VehicleHook => flags::NO_VEHICLE_HOOK,
            Self::VehicleLockpick => flags::NO_LOCKPICK,
            Self::ItemTake => flags::NO_ITEM_PICKUP,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Craft => "craft",
            Self::PlayerDamage => "player-damage",
            Self::StructureDamage => "structure-damage",
            Self::BarricadeDamage => "barricade-damage",
            Self::VehicleDamage => "vehicle-damage",
            Self::VehicleTireDamage => "vehicle-tire-damage",
            Self::VehicleCarjack => "vehicle-carjack",
            Self::VehicleSiphon => "vehicle-siphon",
            Self::VehicleHook => "vehicle-hook",
            Self::VehicleLockpick => "vehicle-lockpick",
            Self::ItemTake => "item-take",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who or what an action is attributed to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateSubject {
    Entity(Uuid),
    /// No initiating entity, e.g. environmental damage to a structure.
    Position(Position),
}

/// Permission node exempting an entity from `flag`.
#[must_use]
pub fn override_node(flag: &str) -> String {
    format!("override.{flag}")
}

/// Source of per-entity override permissions.
pub trait Authorizer {
    fn has_permission(&self, entity: Uuid, node: &str) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(Uuid, &str) -> bool,
{
    fn has_permission(&self, entity: Uuid, node: &str) -> bool {
        self(entity, node)
    }
}

/// Read-only view answering gate questions.
pub struct GateResolver<'a> {
    store: &'a ZoneStore,
    tracker: &'a MembershipTracker,
}

impl<'a> GateResolver<'a> {
    #[must_use]
    pub const fn new(store: &'a ZoneStore, tracker: &'a MembershipTracker) -> Self {
        Self { store, tracker }
    }

    /// Names of the entity's zones carrying `flag`.
    #[must_use]
    pub fn zones_enforcing(&self, entity: &Uuid, flag: &str) -> Vec<&'a str> {
        let Some(names) = self.tracker.zones_of(entity) else {
            return Vec::new();
        };
        names
            .iter()
            .filter_map(|name| self.store.find_by_name(name))
            .filter(|z| z.is_ready && z.has_flag(flag))
            .map(|z| z.name())
            .collect()
    }

    #[must_use]
    pub fn flag_in_force(&self, entity: &Uuid, flag: &str) -> bool {
        !self.zones_enforcing(entity, flag).is_empty()
    }

    #[must_use]
    pub fn is_blocked<A: Authorizer + ?Sized>(&self, entity: Uuid, flag: &str, authz: &A) -> bool {
        self.flag_in_force(&entity, flag) && !authz.has_permission(entity, &override_node(flag))
    }

    /// Gate for actions with no entity: no override is possible.
    #[must_use]
    pub fn is_blocked_at(&self, pos: &Position, flag: &str) -> bool {
        self.store
            .ready_zones()
            .any(|z| z.has_flag(flag) && z.contains(pos))
    }

    /// Decide `gate` for `subject`. `true` means the host must veto the action.
    #[must_use]
    pub fn check<A: Authorizer + ?Sized>(&self, gate: Gate, subject: &GateSubject, authz: &A) -> bool {
        match subject {
            GateSubject::Entity(entity) => self.is_blocked(*entity, gate.flag(), authz),
            GateSubject::Position(pos) => self.is_blocked_at(pos, gate.flag()),
        }
    }
}
