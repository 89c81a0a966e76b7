/// Property tests for cooldowns, frequency scaling and mote staggering.

use callout_engine::core::cooldown::CooldownTracker;
use callout_engine::core::frequency::FrequencyScaler;
use callout_engine::core::host::{EffectHandle, SpawnError, TextSpawner};
use callout_engine::core::mote_queue::TextMoteQueue;
use callout_engine::core::registry::MoteQueueRegistry;
use callout_engine::schema::actor::ActorId;
use callout_engine::schema::effect::FloatingText;
use callout_engine::schema::location::{BucketKey, Cell, MapId, WorldPos};
use callout_engine::schema::pool::PoolId;
use proptest::prelude::*;

#[derive(Default)]
struct CountingSpawner {
    spawned: u64,
}

impl TextSpawner for CountingSpawner {
    fn spawn_text(&mut self, _mote: &FloatingText) -> Result<EffectHandle, SpawnError> {
        self.spawned += 1;
        Ok(EffectHandle(self.spawned))
    }
}

fn mote(x: i32, z: i32) -> FloatingText {
    FloatingText::new(MapId(0), WorldPos::new(x as f32 + 0.5, 0.0, z as f32 + 0.5), "hit")
}

proptest! {
    #[test]
    fn scale_stays_in_unit_interval(counts in prop::collection::vec(0usize..500, 1..40)) {
        let scaler = FrequencyScaler::new();
        let pool = PoolId::new("pool");
        for count in counts {
            let before = scaler.max_rules_seen();
            let scale = scaler.scale_for(&pool, count);
            prop_assert!(scale > 0.0 && scale <= 1.0);
            prop_assert_eq!(scale == 1.0, count.max(1) >= before);
        }
    }

    #[test]
    fn max_rules_seen_never_decreases(counts in prop::collection::vec(0usize..500, 1..40)) {
        let scaler = FrequencyScaler::new();
        let shared = scaler.clone();
        let mut last = scaler.max_rules_seen();
        for (i, count) in counts.into_iter().enumerate() {
            let handle = if i % 2 == 0 { &scaler } else { &shared };
            handle.scale_for(&PoolId::new(format!("pool{}", i % 3)), count);
            prop_assert!(scaler.max_rules_seen() >= last);
            prop_assert!(scaler.max_rules_seen() >= count);
            last = scaler.max_rules_seen();
        }
    }

    #[test]
    fn cooldown_holds_for_full_duration(
        salt in 0u64..1_000_000,
        start in 0u64..100_000,
        cooldown in 1u64..1_000,
        probe in 0u64..2_000,
    ) {
        let mut tracker = CooldownTracker::new(salt);
        tracker.record(ActorId(1), start, cooldown);
        let now = start + probe;
        if tracker.sweep_due(now, 60) {
            tracker.sweep(now);
        }
        prop_assert_eq!(tracker.is_cooling(ActorId(1), now), probe < cooldown);
    }

    #[test]
    fn stagger_offsets_are_evenly_spaced(delay in 0u32..50, count in 1usize..20) {
        let mut queue = TextMoteQueue::new(delay);
        let offsets: Vec<u32> = (0..count).map(|_| queue.enqueue(mote(1, 1))).collect();
        for (i, offset) in offsets.iter().enumerate() {
            prop_assert_eq!(*offset, i as u32 * delay);
        }
    }

    #[test]
    fn queue_drains_after_enough_steps(delay in 0u32..10, count in 1usize..15) {
        let mut queue = TextMoteQueue::new(delay);
        let mut spawner = CountingSpawner::default();
        for _ in 0..count {
            queue.enqueue(mote(2, 2));
        }
        let steps = count * (delay as usize + 1);
        let mut busy = true;
        for _ in 0..steps {
            busy = queue.advance(&mut spawner).unwrap();
        }
        prop_assert!(!busy);
        prop_assert_eq!(queue.pending_len(), 0);
        prop_assert_eq!(spawner.spawned, count as u64);
    }

    #[test]
    fn sweep_never_prunes_pending_queues(
        delay in 1u32..8,
        cells in prop::collection::vec((0i32..4, 0i32..4), 1..30),
        steps in 1usize..40,
    ) {
        let mut registry = MoteQueueRegistry::new(delay);
        let mut spawner = CountingSpawner::default();
        for (x, z) in &cells {
            registry.route(BucketKey::new(MapId(0), Cell::new(*x, *z)), mote(*x, *z));
        }
        for _ in 0..steps {
            registry.sweep(&mut spawner);
            prop_assert_eq!(spawner.spawned as usize + registry.pending_len(), cells.len());
            for (x, z) in &cells {
                let key = BucketKey::new(MapId(0), Cell::new(*x, *z));
                if let Some(queue) = registry.queue(key) {
                    prop_assert!(queue.is_valid());
                }
            }
        }
    }
}
