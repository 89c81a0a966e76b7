/// Entry points for the host's combat hooks.
///
/// Each event names who speaks, who they are speaking at and which rule pack
/// the phrasing comes from. `attempt` fills in the context symbols the packs
/// reference (`INITIATOR_label`, `RECIPIENT_WEAPON_label`, ...), rolls the
/// scaled chance and hands over to `request_callout`.
use rand::Rng;

use crate::core::engine::{CalloutEngine, CalloutOutcome};
use crate::core::grammar::{GrammarRequest, TemplateResolver};
use crate::core::host::Host;
use crate::core::settings::{CalloutSettings, WoundSeverity};
use crate::core::tracker::Placement;
use crate::schema::actor::{Actor, ActorId, ActorKind, Weapon};
use crate::schema::effect::{Color, Drift, FloatingText, TextEffect};
use crate::schema::location::{MapId, WorldPos};
use crate::schema::pool::PoolId;

/// Symbol prefixes filled in from event context rather than rule packs.
pub const CONTEXT_PREFIXES: &[&str] = &["INITIATOR_", "RECIPIENT_"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalloutEvent {
    Drafted {
        actor: ActorId,
    },
    MeleeAttack {
        initiator: ActorId,
        recipient: Option<ActorId>,
    },
    RangedAttack {
        initiator: ActorId,
        target: Option<ActorId>,
        /// Cover shielding the initiator from the target.
        initiator_cover: Option<String>,
        /// Cover shielding the target from the initiator.
        recipient_cover: Option<String>,
    },
}

impl CalloutEvent {
    pub fn initiator(&self) -> ActorId {
        match self {
            Self::Drafted { actor } => *actor,
            Self::MeleeAttack { initiator, .. } | Self::RangedAttack { initiator, .. } => {
                *initiator
            }
        }
    }

    pub fn recipient(&self) -> Option<ActorId> {
        match self {
            Self::Drafted { .. } => None,
            Self::MeleeAttack { recipient, .. } => *recipient,
            Self::RangedAttack { target, .. } => *target,
        }
    }

    pub fn pool(&self) -> PoolId {
        match self {
            Self::Drafted { .. } => PoolId::drafted(),
            Self::MeleeAttack { .. } => PoolId::melee_attack(),
            Self::RangedAttack { .. } => PoolId::ranged_attack(),
        }
    }
}

fn kind_label(kind: ActorKind) -> &'static str {
    match kind {
        ActorKind::Humanlike => "humanlike",
        ActorKind::Animal => "animal",
        ActorKind::Mechanoid => "mechanoid",
    }
}

/// Adds `{symbol}_label`, `{symbol}_kind` and, when armed, the
/// `{symbol}_WEAPON_*` rules for `actor`.
pub fn collect_actor_rules(actor: &Actor, symbol: &str, request: &mut GrammarRequest) {
    request.set_rule(format!("{}_label", symbol), actor.label.clone());
    request.set_rule(format!("{}_kind", symbol), kind_label(actor.kind));
    if let Some(ref weapon) = actor.weapon {
        collect_weapon_rules(weapon, &format!("{}_WEAPON", symbol), request);
    }
}

/// `_label` always; `_stuffLabel`, `_quality` and `_title` when known.
fn collect_weapon_rules(weapon: &Weapon, prefix: &str, request: &mut GrammarRequest) {
    request.set_rule(format!("{}_label", prefix), weapon.label.clone());
    let optional = [
        ("stuffLabel", &weapon.stuff),
        ("quality", &weapon.quality),
        ("title", &weapon.title),
    ];
    for (suffix, value) in optional {
        if let Some(value) = value {
            request.set_rule(format!("{}_{}", prefix, suffix), value.clone());
        }
    }
}

/// Whether callouts may be aimed at `target`.
pub fn can_callout_at_target(target: &Actor, settings: &CalloutSettings) -> bool {
    target.is_humanlike() || settings.allow_callouts_targeting_animals
}

impl<R: TemplateResolver> CalloutEngine<R> {
    /// Try to produce a callout for a combat event.
    pub fn attempt<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        event: &CalloutEvent,
    ) -> CalloutOutcome {
        let Some(initiator) = host.actor(event.initiator()) else {
            return CalloutOutcome::Ineligible;
        };
        if !self.can_trigger(&*host, initiator.id) {
            return CalloutOutcome::Ineligible;
        }

        let mut request = GrammarRequest::new();
        collect_actor_rules(&initiator, "INITIATOR", &mut request);

        if let Some(recipient) = event.recipient().and_then(|id| host.actor(id)) {
            if !can_callout_at_target(&recipient, self.settings()) {
                return CalloutOutcome::TargetFiltered;
            }
            collect_actor_rules(&recipient, "RECIPIENT", &mut request);
        }

        if let CalloutEvent::RangedAttack {
            initiator_cover,
            recipient_cover,
            ..
        } = event
        {
            if let Some(cover) = initiator_cover {
                request.set_rule("INITIATOR_COVER_label", cover.clone());
            }
            if let Some(cover) = recipient_cover {
                request.set_rule("RECIPIENT_COVER_label", cover.clone());
            }
        }

        let pool = event.pool();
        if !self.roll_chance(&pool) {
            return CalloutOutcome::ChanceFailed;
        }
        self.request_callout(host, initiator.id, &pool, request)
    }

    /// Throw a damage label at `pos` if wounds of this severity are shown.
    /// The label drifts off at a random heading so stacked labels fan out.
    pub fn show_wound<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        map: MapId,
        pos: WorldPos,
        text: &str,
        color: Color,
        severity: WoundSeverity,
    ) -> Option<Placement> {
        if !self.settings().show_wound_level.shows(severity) {
            return None;
        }

        let rng = self.rng_mut();
        let drift = Drift {
            angle: rng.gen_range(5.0..35.0),
            speed: rng.gen_range(0.42..0.45),
        };
        let mut mote = FloatingText::new(map, pos, text);
        mote.color = color;
        mote.drift = Some(drift);
        mote.label_background = self.settings().draw_label_background;

        Some(self.show_text(host, TextEffect::Floating(mote)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grammar::RulePackSet;
    use crate::core::registry::TimeBase;
    use crate::core::sandbox::SandboxHost;
    use crate::core::settings::ShowWoundLevel;
    use crate::schema::location::Cell;

    const PACKS: &str = r#"{
        "drafted": Pack(rules: [(keyword: "rule", text: "Moving out!")]),
        "melee_attack": Pack(rules: [
            (keyword: "rule", text: "Eat my {INITIATOR_WEAPON_label}, {RECIPIENT_label}!"),
        ]),
        "ranged_attack": Pack(rules: [
            (keyword: "rule", text: "Get out from behind that {RECIPIENT_COVER_label}!"),
        ]),
    }"#;

    fn certain_engine() -> CalloutEngine {
        CalloutEngine::builder()
            .seed(11)
            .with_settings(CalloutSettings {
                base_callout_chance: 1.0,
                ..Default::default()
            })
            .with_rule_packs(RulePackSet::parse_ron(PACKS).unwrap())
            .build()
            .unwrap()
    }

    fn arena() -> SandboxHost {
        let mut host = SandboxHost::with_map(30, 30);
        let mut fighter = Actor::new(ActorId(1), "Ada", MapId(0), Cell::new(3, 3));
        fighter.weapon = Some(Weapon {
            stuff: Some("plasteel".to_string()),
            quality: Some("masterwork".to_string()),
            ..Weapon::new("longsword")
        });
        host.add_actor(fighter);
        host.add_actor(Actor::new(ActorId(2), "raider", MapId(0), Cell::new(4, 3)));
        let mut boar = Actor::new(ActorId(3), "boar", MapId(0), Cell::new(5, 3));
        boar.kind = ActorKind::Animal;
        host.add_actor(boar);
        host
    }

    #[test]
    fn event_pools() {
        let drafted = CalloutEvent::Drafted { actor: ActorId(1) };
        assert_eq!(drafted.pool(), PoolId::drafted());
        assert_eq!(drafted.recipient(), None);

        let melee = CalloutEvent::MeleeAttack {
            initiator: ActorId(1),
            recipient: Some(ActorId(2)),
        };
        assert_eq!(melee.initiator(), ActorId(1));
        assert_eq!(melee.recipient(), Some(ActorId(2)));
        assert_eq!(melee.pool(), PoolId::melee_attack());
    }

    #[test]
    fn collect_actor_rules_sets_symbols() {
        let host = arena();
        let mut request = GrammarRequest::new();
        collect_actor_rules(&host.actor(ActorId(1)).unwrap(), "INITIATOR", &mut request);
        assert_eq!(request.rules["INITIATOR_label"], "Ada");
        assert_eq!(request.rules["INITIATOR_kind"], "humanlike");
        assert_eq!(request.rules["INITIATOR_WEAPON_label"], "longsword");
        assert_eq!(request.rules["INITIATOR_WEAPON_stuffLabel"], "plasteel");
        assert_eq!(request.rules["INITIATOR_WEAPON_quality"], "masterwork");
        assert!(!request.rules.contains_key("INITIATOR_WEAPON_title"));

        let mut request = GrammarRequest::new();
        collect_actor_rules(&host.actor(ActorId(2)).unwrap(), "RECIPIENT", &mut request);
        assert!(!request.rules.contains_key("RECIPIENT_WEAPON_label"));
    }

    #[test]
    fn melee_callout_uses_both_sides() {
        let mut engine = certain_engine();
        let mut host = arena();
        let outcome = engine.attempt(
            &mut host,
            &CalloutEvent::MeleeAttack {
                initiator: ActorId(1),
                recipient: Some(ActorId(2)),
            },
        );
        assert!(matches!(outcome, CalloutOutcome::Shown(Placement::Attached(_))));
        assert_eq!(host.shown()[0].text, "Eat my longsword, raider!");
    }

    #[test]
    fn ranged_callout_uses_cover() {
        let mut engine = certain_engine();
        let mut host = arena();
        engine.attempt(
            &mut host,
            &CalloutEvent::RangedAttack {
                initiator: ActorId(1),
                target: Some(ActorId(2)),
                initiator_cover: None,
                recipient_cover: Some("sandbags".to_string()),
            },
        );
        assert_eq!(host.shown()[0].text, "Get out from behind that sandbags!");
    }

    #[test]
    fn animal_targets_are_filtered() {
        let mut engine = certain_engine();
        let mut host = arena();
        let event = CalloutEvent::MeleeAttack {
            initiator: ActorId(1),
            recipient: Some(ActorId(3)),
        };
        assert_eq!(engine.attempt(&mut host, &event), CalloutOutcome::TargetFiltered);
        assert!(engine.can_trigger(&host, ActorId(1)));

        let mut settings = engine.settings().clone();
        settings.allow_callouts_targeting_animals = true;
        engine.set_settings(settings).unwrap();
        assert!(matches!(
            engine.attempt(&mut host, &event),
            CalloutOutcome::Shown(_)
        ));
    }

    #[test]
    fn zero_chance_never_calls_out() {
        let mut engine = certain_engine();
        let mut settings = engine.settings().clone();
        settings.base_callout_chance = 0.0;
        engine.set_settings(settings).unwrap();
        let mut host = arena();

        let event = CalloutEvent::Drafted { actor: ActorId(1) };
        assert_eq!(engine.attempt(&mut host, &event), CalloutOutcome::ChanceFailed);
        assert!(engine.can_trigger(&host, ActorId(1)));
    }

    #[test]
    fn cooling_actor_skips_roll() {
        let mut engine = certain_engine();
        let mut host = arena();
        let event = CalloutEvent::Drafted { actor: ActorId(1) };
        assert!(matches!(engine.attempt(&mut host, &event), CalloutOutcome::Shown(_)));
        assert_eq!(engine.attempt(&mut host, &event), CalloutOutcome::Ineligible);
    }

    #[test]
    fn wounds_respect_level_and_drift() {
        let mut engine = certain_engine();
        let mut host = arena();
        let pos = WorldPos::new(3.5, 0.0, 3.5);

        let placement = engine.show_wound(
            &mut host,
            MapId(0),
            pos,
            "-12",
            Color::RED,
            WoundSeverity::Minor,
        );
        assert_eq!(
            placement,
            Some(Placement::Queued {
                base: TimeBase::Tick,
                offset: 0
            })
        );

        let mut settings = engine.settings().clone();
        settings.show_wound_level = ShowWoundLevel::Major;
        engine.set_settings(settings).unwrap();
        assert!(engine
            .show_wound(&mut host, MapId(0), pos, "-3", Color::RED, WoundSeverity::Serious)
            .is_none());

        engine.tick_scheduler(&mut host);
        assert_eq!(host.shown().len(), 1);
        assert_eq!(host.shown()[0].color, Color::RED);
    }
}
