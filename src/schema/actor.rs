use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::location::{Cell, MapId, WorldPos};

/// Newtype wrapper for actor IDs. Stable for the lifetime of the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

/// Broad body plan of an actor, used by the speaker and target filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    #[default]
    Humanlike,
    Animal,
    Mechanoid,
}

/// The weapon an actor is holding, as rule packs get to name it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub label: String,
    /// Material it is made of, e.g. "plasteel".
    pub stuff: Option<String>,
    pub quality: Option<String>,
    /// Art title, for weapons that carry one.
    pub title: Option<String>,
}

impl Weapon {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stuff: None,
            quality: None,
            title: None,
        }
    }
}

/// A snapshot of an actor as reported by the host.
///
/// The engine never holds on to an `Actor`; it asks the host for a fresh
/// snapshot whenever it needs one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub label: String,
    pub kind: ActorKind,
    pub dead: bool,
    /// Present on a map (not carried, not in a caravan, not despawned).
    pub spawned: bool,
    pub can_talk: bool,
    pub in_mental_state: bool,
    pub traits: FxHashSet<String>,
    pub weapon: Option<Weapon>,
    pub map: MapId,
    pub cell: Cell,
    /// Exact draw position, used for free-floating text.
    pub draw_pos: WorldPos,
}

impl Actor {
    /// A healthy, spawned, talking humanlike actor standing in `cell`.
    pub fn new(id: ActorId, label: impl Into<String>, map: MapId, cell: Cell) -> Self {
        Self {
            id,
            label: label.into(),
            kind: ActorKind::Humanlike,
            dead: false,
            spawned: true,
            can_talk: true,
            in_mental_state: false,
            traits: FxHashSet::default(),
            weapon: None,
            map,
            cell,
            draw_pos: WorldPos::new(cell.x as f32 + 0.5, 0.0, cell.z as f32 + 0.5),
        }
    }

    /// Returns true if this actor has the given trait.
    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.contains(name)
    }

    pub fn is_humanlike(&self) -> bool {
        self.kind == ActorKind::Humanlike
    }

    /// Alive and present on a map.
    pub fn is_active(&self) -> bool {
        !self.dead && self.spawned
    }
}
