/// Registries of per-cell mote queues, one per time base.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::host::TextSpawner;
use crate::core::mote_queue::TextMoteQueue;
use crate::schema::effect::FloatingText;
use crate::schema::location::BucketKey;

/// Clock that drives a registry.
///
/// Game ticks freeze while the game is paused, so text thrown during a pause
/// is scheduled against real frames instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeBase {
    Tick,
    RealTime,
}

/// Owns every active queue for one time base.
#[derive(Debug, Clone)]
pub struct MoteQueueRegistry {
    queues: FxHashMap<BucketKey, TextMoteQueue>,
    delay: u32,
}

impl MoteQueueRegistry {
    pub fn new(delay: u32) -> Self {
        Self {
            queues: FxHashMap::default(),
            delay,
        }
    }

    /// Queues `mote` in its bucket, creating the queue on first use.
    /// Returns the release offset.
    pub fn route(&mut self, key: BucketKey, mote: FloatingText) -> u32 {
        let delay = self.delay;
        self.queues
            .entry(key)
            .or_insert_with(|| TextMoteQueue::new(delay))
            .enqueue(mote)
    }

    /// Advances every queue one step and compacts away queues that have
    /// drained and settled. Returns how many queues were pruned.
    pub fn sweep<S: TextSpawner + ?Sized>(&mut self, spawner: &mut S) -> usize {
        let mut cleanup = false;
        for (key, queue) in self.queues.iter_mut() {
            match queue.advance(spawner) {
                Ok(busy) => cleanup |= !busy,
                Err(err) => {
                    tracing::warn!("Discarding text mote queue {:?}: {}", key, err);
                    cleanup = true;
                }
            }
        }

        if !cleanup {
            return 0;
        }
        let before = self.queues.len();
        self.queues.retain(|_, queue| queue.is_valid());
        let pruned = before - self.queues.len();
        if pruned > 0 {
            tracing::debug!("Pruned {} idle text mote queues", pruned);
        }
        pruned
    }

    pub fn queue(&self, key: BucketKey) -> Option<&TextMoteQueue> {
        self.queues.get(&key)
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Motes waiting across all queues.
    pub fn pending_len(&self) -> usize {
        self.queues.values().map(TextMoteQueue::pending_len).sum()
    }
}

/// The tick-driven and frame-driven registries side by side.
#[derive(Debug, Clone)]
pub struct QueueRegistries {
    tick_based: MoteQueueRegistry,
    real_time: MoteQueueRegistry,
}

impl QueueRegistries {
    pub fn new(tick_delay: u32, frame_delay: u32) -> Self {
        Self {
            tick_based: MoteQueueRegistry::new(tick_delay),
            real_time: MoteQueueRegistry::new(frame_delay),
        }
    }

    pub fn registry(&self, base: TimeBase) -> &MoteQueueRegistry {
        match base {
            TimeBase::Tick => &self.tick_based,
            TimeBase::RealTime => &self.real_time,
        }
    }

    fn registry_mut(&mut self, base: TimeBase) -> &mut MoteQueueRegistry {
        match base {
            TimeBase::Tick => &mut self.tick_based,
            TimeBase::RealTime => &mut self.real_time,
        }
    }

    pub fn route(&mut self, key: BucketKey, mote: FloatingText, base: TimeBase) -> u32 {
        self.registry_mut(base).route(key, mote)
    }

    pub fn sweep<S: TextSpawner + ?Sized>(&mut self, base: TimeBase, spawner: &mut S) -> usize {
        self.registry_mut(base).sweep(spawner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::{EffectHandle, SpawnError};
    use crate::schema::location::{Cell, MapId, WorldPos};

    #[derive(Default)]
    struct CountingSpawner {
        spawned: Vec<String>,
        lost_maps: Vec<MapId>,
    }

    impl TextSpawner for CountingSpawner {
        fn spawn_text(&mut self, mote: &FloatingText) -> Result<EffectHandle, SpawnError> {
            if self.lost_maps.contains(&mote.map) {
                return Err(SpawnError::MapUnavailable(mote.map));
            }
            self.spawned.push(mote.text.clone());
            Ok(EffectHandle(self.spawned.len() as u64))
        }
    }

    fn mote_at(map: u32, x: f32, text: &str) -> FloatingText {
        FloatingText::new(MapId(map), WorldPos::new(x, 0.0, 1.0), text)
    }

    #[test]
    fn route_creates_queue_lazily() {
        let mut registry = MoteQueueRegistry::new(10);
        assert!(registry.is_empty());

        let a = mote_at(0, 1.0, "a");
        let key = a.bucket();
        assert_eq!(registry.route(key, a), 0);
        assert_eq!(registry.route(key, mote_at(0, 1.5, "b")), 10);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.pending_len(), 2);
    }

    #[test]
    fn separate_cells_do_not_stagger_each_other() {
        let mut registry = MoteQueueRegistry::new(10);
        let a = mote_at(0, 1.0, "a");
        let b = mote_at(0, 2.0, "b");
        assert_eq!(registry.route(a.bucket(), a), 0);
        assert_eq!(registry.route(b.bucket(), b), 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn sweep_keeps_queue_with_pending_motes() {
        let mut registry = MoteQueueRegistry::new(3);
        let mut spawner = CountingSpawner::default();
        let key = BucketKey::new(MapId(0), Cell::new(1, 1));
        registry.route(key, mote_at(0, 1.0, "a"));
        registry.route(key, mote_at(0, 1.0, "b"));

        for _ in 0..3 {
            registry.sweep(&mut spawner);
            assert!(registry.queue(key).is_some());
        }
        assert_eq!(spawner.spawned, vec!["a"]);
    }

    #[test]
    fn sweep_prunes_settled_queues() {
        let mut registry = MoteQueueRegistry::new(2);
        let mut spawner = CountingSpawner::default();
        let a = mote_at(0, 1.0, "a");
        registry.route(a.bucket(), a);

        assert_eq!(registry.sweep(&mut spawner), 0);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.sweep(&mut spawner), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn lost_map_queue_is_pruned_without_touching_others() {
        let mut registry = MoteQueueRegistry::new(5);
        let mut spawner = CountingSpawner {
            lost_maps: vec![MapId(9)],
            ..Default::default()
        };
        let doomed = mote_at(9, 1.0, "doomed");
        let fine = mote_at(0, 1.0, "fine");
        let later = mote_at(0, 1.0, "later");
        registry.route(doomed.bucket(), doomed.clone());
        registry.route(doomed.bucket(), doomed.clone());
        registry.route(fine.bucket(), fine.clone());
        registry.route(fine.bucket(), later);

        registry.sweep(&mut spawner);
        assert!(registry.queue(doomed.bucket()).is_none());
        assert_eq!(registry.queue(fine.bucket()).map(|q| q.pending_len()), Some(1));
        assert_eq!(spawner.spawned, vec!["fine"]);
    }

    #[test]
    fn time_bases_are_independent() {
        let mut registries = QueueRegistries::new(10, 4);
        let mut spawner = CountingSpawner::default();
        let a = mote_at(0, 1.0, "a");
        let key = a.bucket();

        registries.route(key, a.clone(), TimeBase::Tick);
        registries.route(key, a.clone(), TimeBase::Tick);
        assert_eq!(registries.route(key, a, TimeBase::RealTime), 0);

        registries.sweep(TimeBase::RealTime, &mut spawner);
        assert_eq!(spawner.spawned.len(), 1);
        assert_eq!(registries.registry(TimeBase::Tick).pending_len(), 2);
        assert_eq!(registries.registry(TimeBase::RealTime).pending_len(), 0);
    }
}
