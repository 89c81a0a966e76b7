/// Per-actor callout cooldowns.
///
/// Expiries are stored offset by a per-session salt. Every comparison adds
/// the same salt to `now`, so the offset cancels out for correctness and
/// only shifts the phase at which the periodic sweep fires.
use rustc_hash::FxHashMap;

use crate::schema::actor::ActorId;

#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    expiries: FxHashMap<ActorId, u64>,
    salt: u64,
}

impl CooldownTracker {
    pub fn new(salt: u64) -> Self {
        Self {
            expiries: FxHashMap::default(),
            salt,
        }
    }

    pub fn salt(&self) -> u64 {
        self.salt
    }

    fn salted(&self, now: u64) -> u64 {
        now.saturating_add(self.salt)
    }

    /// True while the actor's last callout is younger than its cooldown.
    ///
    /// Entries past expiry that the sweep has not reached yet do not block.
    pub fn is_cooling(&self, actor: ActorId, now: u64) -> bool {
        let now = self.salted(now);
        self.expiries.get(&actor).is_some_and(|&expiry| expiry > now)
    }

    /// Puts the actor on cooldown for `cooldown` time units from `now`,
    /// replacing any earlier entry.
    pub fn record(&mut self, actor: ActorId, now: u64, cooldown: u64) {
        let expiry = self.salted(now).saturating_add(cooldown);
        self.expiries.insert(actor, expiry);
    }

    /// Salted expiry for an actor, if one is tracked.
    pub fn expiry(&self, actor: ActorId) -> Option<u64> {
        self.expiries.get(&actor).copied()
    }

    /// Whether the periodic sweep should run at `now`.
    pub fn sweep_due(&self, now: u64, interval: u64) -> bool {
        interval > 0 && self.salted(now) % interval == 0
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn sweep(&mut self, now: u64) -> usize {
        let now = self.salted(now);
        let before = self.expiries.len();
        self.expiries.retain(|_, expiry| *expiry > now);
        before - self.expiries.len()
    }

    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}
