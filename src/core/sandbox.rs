/// In-memory host used by the preview tool and the test suites.
///
/// Holds a handful of rectangular maps and actors, a tick and a frame
/// counter, and records every text mote it is asked to show.
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use crate::core::host::{EffectHandle, Host, SpawnError, TextSpawner};
use crate::core::registry::TimeBase;
use crate::schema::actor::{Actor, ActorId};
use crate::schema::effect::{Color, FloatingText};
use crate::schema::location::{Cell, MapId};

#[derive(Debug, Clone, PartialEq)]
pub enum ShownKind {
    Floating { map: MapId, cell: Cell },
    Attached { owner: ActorId },
}

/// One mote the sandbox displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct ShownText {
    pub handle: EffectHandle,
    pub tick: u64,
    pub frame: u64,
    pub text: String,
    pub color: Color,
    pub kind: ShownKind,
}

#[derive(Debug, Clone, Default)]
pub struct SandboxHost {
    maps: FxHashMap<MapId, (i32, i32)>,
    actors: BTreeMap<ActorId, Actor>,
    tick: u64,
    frame: u64,
    paused: bool,
    shown: Vec<ShownText>,
    next_handle: u64,
}

impl SandboxHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host with one `width` x `height` map with id 0.
    pub fn with_map(width: i32, height: i32) -> Self {
        let mut host = Self::new();
        host.add_map(MapId(0), width, height);
        host
    }

    pub fn add_map(&mut self, map: MapId, width: i32, height: i32) {
        self.maps.insert(map, (width, height));
    }

    pub fn remove_map(&mut self, map: MapId) {
        self.maps.remove(&map);
    }

    pub fn add_actor(&mut self, actor: Actor) {
        self.actors.insert(actor.id, actor);
    }

    pub fn remove_actor(&mut self, id: ActorId) -> Option<Actor> {
        self.actors.remove(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    pub fn advance_frame(&mut self) {
        self.frame += 1;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn shown(&self) -> &[ShownText] {
        &self.shown
    }

    pub fn take_shown(&mut self) -> Vec<ShownText> {
        std::mem::take(&mut self.shown)
    }

    fn in_bounds(&self, map: MapId, cell: Cell) -> Result<(), SpawnError> {
        let &(width, height) = self.maps.get(&map).ok_or(SpawnError::MapUnavailable(map))?;
        if cell.x < 0 || cell.z < 0 || cell.x >= width || cell.z >= height {
            return Err(SpawnError::OutOfBounds { map, cell });
        }
        Ok(())
    }

    fn record(&mut self, text: &str, color: Color, kind: ShownKind) -> EffectHandle {
        self.next_handle += 1;
        let handle = EffectHandle(self.next_handle);
        self.shown.push(ShownText {
            handle,
            tick: self.tick,
            frame: self.frame,
            text: text.to_string(),
            color,
            kind,
        });
        handle
    }
}

impl TextSpawner for SandboxHost {
    fn spawn_text(&mut self, mote: &FloatingText) -> Result<EffectHandle, SpawnError> {
        let cell = mote.pos.cell();
        self.in_bounds(mote.map, cell)?;
        Ok(self.record(
            &mote.text,
            mote.color,
            ShownKind::Floating {
                map: mote.map,
                cell,
            },
        ))
    }
}

impl Host for SandboxHost {
    fn actor(&self, id: ActorId) -> Option<Actor> {
        self.actors.get(&id).cloned()
    }

    fn attach_text(
        &mut self,
        owner: ActorId,
        text: &str,
        color: Color,
        _fade_delay: Option<f32>,
    ) -> Result<EffectHandle, SpawnError> {
        let (map, cell) = match self.actors.get(&owner) {
            Some(actor) if actor.spawned => (actor.map, actor.cell),
            _ => return Err(SpawnError::NoOwner(owner)),
        };
        self.in_bounds(map, cell)?;
        Ok(self.record(text, color, ShownKind::Attached { owner }))
    }

    fn current_time(&self, base: TimeBase) -> u64 {
        match base {
            TimeBase::Tick => self.tick,
            TimeBase::RealTime => self.frame,
        }
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}
