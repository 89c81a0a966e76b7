/// The callout pipeline: eligibility → phrasing → text effect → cooldown.
///
/// `CalloutEngine` is what the host talks to. Event hooks call
/// `request_callout` (or `attempt`, see `events`), the host's per-tick and
/// per-frame hooks call `tick_scheduler` and `frame_scheduler`, and loading
/// a new game calls `start_session`.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use thiserror::Error;

use crate::core::frequency::FrequencyScaler;
use crate::core::grammar::{
    GrammarError, GrammarRequest, RulePackSet, TemplateResolver, ROOT_KEYWORD,
};
use crate::core::host::Host;
use crate::core::registry::TimeBase;
use crate::core::settings::{CalloutSettings, SettingsError, TraitConstant};
use crate::core::tracker::{CalloutTracker, Placement, SweepReport};
use crate::schema::actor::{Actor, ActorId};
use crate::schema::effect::{Color, FloatingText, TextEffect};
use crate::schema::pool::PoolId;

/// Constant set for actors that are in a mental break.
pub const SPICY_CONSTANT: &str = "SPICY";

/// Upper bound for the per-session cooldown salt.
const SESSION_SALT_RANGE: u64 = 1 << 20;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of asking for a callout. Failures are outcomes, not errors: a
/// callout that does not happen must never disturb the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalloutOutcome {
    /// Gone, dead, filtered out, unable to speak or on cooldown.
    Ineligible,
    /// The event targets something callouts are not aimed at.
    TargetFiltered,
    ChanceFailed,
    /// No applicable phrasing. The speaker still goes on cooldown.
    NoText,
    Shown(Placement),
}

pub struct CalloutEngine<R = RulePackSet> {
    settings: CalloutSettings,
    resolver: R,
    scaler: FrequencyScaler,
    tracker: CalloutTracker,
    rng: StdRng,
    sessions_started: u64,
}

/// Builder for constructing a `CalloutEngine`.
pub struct CalloutEngineBuilder {
    settings_path: Option<String>,
    rule_packs_dir: Option<String>,
    seed: u64,
    /// Directly provided settings (for testing without files).
    settings: Option<CalloutSettings>,
    /// Directly provided rule packs (for testing without files).
    rule_packs: Option<RulePackSet>,
    scaler: Option<FrequencyScaler>,
}

impl CalloutEngine<RulePackSet> {
    pub fn builder() -> CalloutEngineBuilder {
        CalloutEngineBuilder {
            settings_path: None,
            rule_packs_dir: None,
            seed: 0,
            settings: None,
            rule_packs: None,
            scaler: None,
        }
    }
}

impl<R: TemplateResolver> CalloutEngine<R> {
    pub fn settings(&self) -> &CalloutSettings {
        &self.settings
    }

    /// Replace the settings. Stagger delays take effect from the next
    /// session; everything else immediately.
    pub fn set_settings(&mut self, settings: CalloutSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn scaler(&self) -> &FrequencyScaler {
        &self.scaler
    }

    pub fn tracker(&self) -> &CalloutTracker {
        &self.tracker
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Discards all cooldowns and queued text and starts a fresh session.
    /// The frequency scaler is process-wide and survives.
    pub fn start_session(&mut self) {
        let salt = self.rng.gen_range(0..SESSION_SALT_RANGE);
        self.tracker = CalloutTracker::new(&self.settings, salt);
        self.sessions_started += 1;
        tracing::info!("Callout session {} started", self.sessions_started);
    }

    /// Whether `actor` could produce a callout right now.
    pub fn can_trigger<H: Host + ?Sized>(&self, host: &H, actor: ActorId) -> bool {
        host.actor(actor).is_some_and(|actor| {
            self.tracker.can_callout_now(host, &actor, self.settings.speaker_filter)
        })
    }

    /// `base_callout_chance` scaled by the size of the pool.
    pub fn scaled_chance(&self, pool: &PoolId) -> f32 {
        let rule_count = self.resolver.rule_count(pool, ROOT_KEYWORD);
        self.settings.base_callout_chance * self.scaler.scale_for(pool, rule_count)
    }

    pub fn roll_chance(&mut self, pool: &PoolId) -> bool {
        let chance = self.scaled_chance(pool);
        self.rng.gen::<f32>() < chance
    }

    /// Resolve a phrase from `pool` for `actor` and show it.
    ///
    /// The actor is put on cooldown whenever it was eligible, even if no
    /// phrasing applied, so a pack without matching rules cannot be retried
    /// every tick.
    pub fn request_callout<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        actor: ActorId,
        pool: &PoolId,
        mut request: GrammarRequest,
    ) -> CalloutOutcome {
        let Some(actor) = host.actor(actor) else {
            return CalloutOutcome::Ineligible;
        };
        if !self.tracker.can_callout_now(&*host, &actor, self.settings.speaker_filter) {
            return CalloutOutcome::Ineligible;
        }

        apply_state_constants(&actor, &self.settings.trait_constants, &mut request);

        let outcome = match self.resolver.resolve(pool, &request, &mut self.rng) {
            Some(text) => {
                tracing::debug!("Callout resolved for {}: {}", actor.label, text);
                let effect = self.callout_effect(&actor, text);
                let placement = self.tracker.show(host, effect, self.settings.queue_while_paused);
                CalloutOutcome::Shown(placement)
            }
            None => {
                tracing::debug!("Could not find text for requested {} by {}", pool, actor.label);
                CalloutOutcome::NoText
            }
        };

        let now = host.current_time(TimeBase::Tick);
        self.tracker.record_callout(actor.id, now, self.settings.cooldown_ticks);
        outcome
    }

    fn callout_effect(&self, actor: &Actor, text: String) -> TextEffect {
        if self.settings.attach_callout_text {
            TextEffect::Attached {
                owner: actor.id,
                text,
                color: Color::WHITE,
                fade_delay: None,
            }
        } else {
            let mut mote = FloatingText::new(actor.map, actor.draw_pos, text);
            mote.label_background = self.settings.draw_label_background;
            TextEffect::Floating(mote)
        }
    }

    /// Show arbitrary text through the same attach/queue routing.
    pub fn show_text<H: Host + ?Sized>(&mut self, host: &mut H, effect: TextEffect) -> Placement {
        self.tracker.show(host, effect, self.settings.queue_while_paused)
    }

    /// Must be called once per game tick.
    pub fn tick_scheduler<H: Host + ?Sized>(&mut self, host: &mut H) -> SweepReport {
        self.tracker.tick(host, self.settings.sweep_interval_ticks)
    }

    /// Must be called once per rendered frame.
    pub fn frame_scheduler<H: Host + ?Sized>(&mut self, host: &mut H) -> SweepReport {
        self.tracker.frame(host)
    }
}

/// Mental breaks force `SPICY`; otherwise each trait mapping sets its
/// constant if the actor has any of its traits.
fn apply_state_constants(actor: &Actor, mappings: &[TraitConstant], request: &mut GrammarRequest) {
    if actor.in_mental_state {
        request.set_constant(SPICY_CONSTANT, "true");
        return;
    }
    for mapping in mappings {
        if mapping.traits.iter().any(|t| actor.has_trait(t)) {
            request.set_constant(mapping.constant.clone(), mapping.value.clone());
        }
    }
}

impl CalloutEngineBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn settings_file(mut self, path: &str) -> Self {
        self.settings_path = Some(path.to_string());
        self
    }

    pub fn rule_packs_dir(mut self, path: &str) -> Self {
        self.rule_packs_dir = Some(path.to_string());
        self
    }

    /// Provide settings directly (for testing without files).
    pub fn with_settings(mut self, settings: CalloutSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Provide rule packs directly (for testing without files).
    pub fn with_rule_packs(mut self, packs: RulePackSet) -> Self {
        self.rule_packs = Some(packs);
        self
    }

    /// Share the largest-pool counter with another engine.
    pub fn with_scaler(mut self, scaler: FrequencyScaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    pub fn build(mut self) -> Result<CalloutEngine<RulePackSet>, EngineError> {
        let mut packs = self.rule_packs.take().unwrap_or_default();

        // Packs on disk override directly provided ones
        if let Some(ref dir) = self.rule_packs_dir {
            if Path::new(dir).exists() {
                load_ron_files_from_dir(dir, |path| {
                    packs.merge(RulePackSet::load_from_ron(path)?);
                    Ok(())
                })?;
            }
        }
        tracing::info!("Loaded {} rule packs", packs.len());

        self.build_with_resolver(packs)
    }

    /// Build around a host-provided resolver instead of rule packs.
    pub fn build_with_resolver<R: TemplateResolver>(
        self,
        resolver: R,
    ) -> Result<CalloutEngine<R>, EngineError> {
        let settings = match (self.settings, self.settings_path) {
            (Some(settings), _) => settings,
            (None, Some(path)) if Path::new(&path).exists() => {
                CalloutSettings::load(Path::new(&path))?
            }
            (None, _) => CalloutSettings::default(),
        };
        settings.validate()?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let salt = rng.gen_range(0..SESSION_SALT_RANGE);
        let tracker = CalloutTracker::new(&settings, salt);

        Ok(CalloutEngine {
            settings,
            resolver,
            scaler: self.scaler.unwrap_or_default(),
            tracker,
            rng,
            sessions_started: 1,
        })
    }
}

/// Load all .ron files from a directory, calling `loader` for each.
fn load_ron_files_from_dir<F>(dir: &str, mut loader: F) -> Result<(), EngineError>
where
    F: FnMut(&Path) -> Result<(), EngineError>,
{
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    paths.sort();
    for path in paths {
        if path.extension().and_then(|s| s.to_str()) == Some("ron") {
            loader(&path)?;
        }
    }
    Ok(())
}
