/// Capabilities the engine borrows from the host game.
use thiserror::Error;

use crate::core::registry::TimeBase;
use crate::schema::actor::{Actor, ActorId};
use crate::schema::effect::{Color, FloatingText};
use crate::schema::location::{Cell, MapId};

/// Host-side identifier of a spawned text mote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectHandle(pub u64);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpawnError {
    /// The target cell is outside the map. The effect is dropped.
    #[error("cell {cell:?} is outside map {map:?}")]
    OutOfBounds { map: MapId, cell: Cell },
    /// The map no longer exists. Every effect queued for it is dropped.
    #[error("map {0:?} is not available")]
    MapUnavailable(MapId),
    /// The owner of an attached effect is gone.
    #[error("actor {0:?} cannot carry text")]
    NoOwner(ActorId),
}

/// Spawns free-floating text motes.
pub trait TextSpawner {
    fn spawn_text(&mut self, mote: &FloatingText) -> Result<EffectHandle, SpawnError>;
}

/// Everything else the callout pipeline needs from the game.
pub trait Host: TextSpawner {
    /// A fresh snapshot of the actor, or `None` if it no longer exists.
    fn actor(&self, id: ActorId) -> Option<Actor>;

    /// Host-defined capability check, e.g. whether the actor can talk.
    fn is_eligible_speaker(&self, actor: &Actor) -> bool {
        actor.can_talk
    }

    /// Shows text that follows `owner` around.
    fn attach_text(
        &mut self,
        owner: ActorId,
        text: &str,
        color: Color,
        fade_delay: Option<f32>,
    ) -> Result<EffectHandle, SpawnError>;

    /// Monotonic counter for the given time base.
    fn current_time(&self, base: TimeBase) -> u64;

    fn is_paused(&self) -> bool;
}
