/// Per-session callout state: who is on cooldown and which text is waiting
/// to be shown.
///
/// A tracker lives exactly as long as one game session. Starting a new
/// session builds a new tracker rather than clearing the old one, so actor
/// ids reused by the next session never inherit stale cooldowns or queues.
use crate::core::cooldown::CooldownTracker;
use crate::core::host::{EffectHandle, Host, SpawnError};
use crate::core::registry::{QueueRegistries, TimeBase};
use crate::core::settings::{CalloutSettings, SpeakerFilter};
use crate::schema::actor::{Actor, ActorId};
use crate::schema::effect::{FloatingText, TextEffect};

/// Where a text effect ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Attached(EffectHandle),
    Queued { base: TimeBase, offset: u32 },
    Spawned(EffectHandle),
    Dropped,
}

/// What one scheduler step did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub cooldowns_expired: usize,
    pub queues_pruned: usize,
}

#[derive(Debug, Clone)]
pub struct CalloutTracker {
    cooldowns: CooldownTracker,
    queues: QueueRegistries,
}

impl CalloutTracker {
    pub fn new(settings: &CalloutSettings, salt: u64) -> Self {
        Self {
            cooldowns: CooldownTracker::new(salt),
            queues: QueueRegistries::new(
                settings.stagger_delay_ticks,
                settings.stagger_delay_frames,
            ),
        }
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    pub fn queues(&self) -> &QueueRegistries {
        &self.queues
    }

    /// Alive, present, admitted by the filter, able to speak according to
    /// the host, and not on cooldown.
    pub fn can_callout_now<H: Host + ?Sized>(
        &self,
        host: &H,
        actor: &Actor,
        filter: SpeakerFilter,
    ) -> bool {
        actor.is_active()
            && filter.admits(actor)
            && !self
                .cooldowns
                .is_cooling(actor.id, host.current_time(TimeBase::Tick))
            && host.is_eligible_speaker(actor)
    }

    pub fn record_callout(&mut self, actor: ActorId, now: u64, cooldown: u64) {
        self.cooldowns.record(actor, now, cooldown);
    }

    /// Shows a text effect. Attached text goes straight to the host;
    /// floating text is staggered in its cell's queue, on real frames while
    /// the game is paused.
    pub fn show<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        effect: TextEffect,
        queue_while_paused: bool,
    ) -> Placement {
        match effect {
            TextEffect::Attached {
                owner,
                text,
                color,
                fade_delay,
            } => match host.attach_text(owner, &text, color, fade_delay) {
                Ok(handle) => Placement::Attached(handle),
                Err(err) => dropped(&text, err),
            },
            TextEffect::Floating(mote) => self.throw_text(host, mote, queue_while_paused),
        }
    }

    fn throw_text<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        mote: FloatingText,
        queue_while_paused: bool,
    ) -> Placement {
        let base = if host.is_paused() {
            if !queue_while_paused {
                return match host.spawn_text(&mote) {
                    Ok(handle) => Placement::Spawned(handle),
                    Err(err) => dropped(&mote.text, err),
                };
            }
            TimeBase::RealTime
        } else {
            TimeBase::Tick
        };
        let offset = self.queues.route(mote.bucket(), mote, base);
        Placement::Queued { base, offset }
    }

    /// Once per game tick: periodic cooldown cleanup and the tick-based
    /// queues.
    pub fn tick<H: Host + ?Sized>(&mut self, host: &mut H, sweep_interval: u64) -> SweepReport {
        let now = host.current_time(TimeBase::Tick);
        let mut report = SweepReport::default();
        if self.cooldowns.sweep_due(now, sweep_interval) {
            report.cooldowns_expired = self.cooldowns.sweep(now);
        }
        report.queues_pruned = self.queues.sweep(TimeBase::Tick, host);
        report
    }

    /// Once per rendered frame. Real-time queues move while paused, and
    /// afterwards until they have drained.
    pub fn frame<H: Host + ?Sized>(&mut self, host: &mut H) -> SweepReport {
        if !host.is_paused() && self.queues.registry(TimeBase::RealTime).is_empty() {
            return SweepReport::default();
        }
        SweepReport {
            cooldowns_expired: 0,
            queues_pruned: self.queues.sweep(TimeBase::RealTime, host),
        }
    }
}

fn dropped(text: &str, err: SpawnError) -> Placement {
    tracing::debug!("Dropping text '{}': {}", text, err);
    Placement::Dropped
}
