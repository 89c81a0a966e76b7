/// Callout Preview: runs a scripted skirmish against the sandbox host and
/// prints every callout and damage label as it appears.
///
/// Usage: callout_preview [--rule-packs <dir>] [--settings <file>] [--seed <n>]
///                        [--ticks <n>] [--fighters <n>] [--pause-at <tick>]

use callout_engine::core::engine::{CalloutEngine, CalloutOutcome};
use callout_engine::core::events::CalloutEvent;
use callout_engine::core::registry::TimeBase;
use callout_engine::core::sandbox::{SandboxHost, ShownKind, ShownText};
use callout_engine::core::settings::WoundSeverity;
use callout_engine::schema::actor::{Actor, ActorId, Weapon};
use callout_engine::schema::effect::Color;
use callout_engine::schema::location::{Cell, MapId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

const NAMES: &[&str] = &["Ada", "Bram", "Cass", "Dov", "Esme", "Fitz", "Gale", "Hux"];
const WEAPONS: &[&str] = &["revolver", "knife", "assault rifle", "club", "bolt-action rifle"];
const QUALITIES: &[&str] = &["poor", "normal", "good", "excellent"];
const COVERS: &[&str] = &["sandbags", "wall", "boulder", "tree"];
const PAUSE_FRAMES: u64 = 90;

struct Options {
    rule_packs: String,
    settings: String,
    seed: u64,
    ticks: u64,
    fighters: u64,
    pause_at: Option<u64>,
}

fn main() {
    let options = parse_args();

    let engine = CalloutEngine::builder()
        .seed(options.seed)
        .settings_file(&options.settings)
        .rule_packs_dir(&options.rule_packs)
        .build();
    let mut engine = match engine {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let default_level = engine.settings().default_log_level();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let mut host = SandboxHost::with_map(60, 60);
    let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(1));
    for i in 0..options.fighters {
        let name = NAMES[i as usize % NAMES.len()];
        let cell = Cell::new(10 + (i as i32 % 4) * 2, 10 + i as i32 / 4);
        let mut actor = Actor::new(ActorId(i + 1), name, MapId(0), cell);
        let mut weapon = Weapon::new(WEAPONS[rng.gen_range(0..WEAPONS.len())]);
        weapon.quality = Some(QUALITIES[rng.gen_range(0..QUALITIES.len())].to_string());
        actor.weapon = Some(weapon);
        if rng.gen_bool(0.1) {
            actor.in_mental_state = true;
        }
        host.add_actor(actor);
    }

    let mut stats: BTreeMap<&'static str, u64> = BTreeMap::new();
    for _ in 0..options.ticks {
        host.advance_tick();

        if options.pause_at == Some(host.tick()) {
            run_paused(&mut engine, &mut host, &mut rng, options.fighters, &mut stats);
        }

        let event = random_event(&mut rng, options.fighters);
        if let Some(event) = event {
            *stats.entry(outcome_name(engine.attempt(&mut host, &event))).or_default() += 1;
        }

        if rng.gen_bool(0.15) {
            throw_wound(&mut engine, &mut host, &mut rng, options.fighters);
        }

        engine.tick_scheduler(&mut host);
        host.advance_frame();
        engine.frame_scheduler(&mut host);
        print_shown(&mut host);
    }

    println!("\n=== Outcomes ===");
    for (name, count) in &stats {
        println!("  {:<15} {}", name, count);
    }
    println!(
        "  pending motes   {} (ticks) / {} (frames)",
        engine.tracker().queues().registry(TimeBase::Tick).pending_len(),
        engine.tracker().queues().registry(TimeBase::RealTime).pending_len()
    );
}

/// Pause the game for a while and keep fighting on real frames.
fn run_paused(
    engine: &mut CalloutEngine,
    host: &mut SandboxHost,
    rng: &mut StdRng,
    fighters: u64,
    stats: &mut BTreeMap<&'static str, u64>,
) {
    println!("-- paused at tick {} --", host.tick());
    host.set_paused(true);
    for frame in 0..PAUSE_FRAMES {
        if frame % 10 == 0 {
            throw_wound(engine, host, rng, fighters);
        }
        if frame == 0 {
            if let Some(event) = random_event(rng, fighters) {
                *stats.entry(outcome_name(engine.attempt(host, &event))).or_default() += 1;
            }
        }
        host.advance_frame();
        engine.frame_scheduler(host);
        print_shown(host);
    }
    host.set_paused(false);
    println!("-- resumed --");
}

fn random_event(rng: &mut StdRng, fighters: u64) -> Option<CalloutEvent> {
    if fighters == 0 {
        return None;
    }
    let initiator = ActorId(rng.gen_range(1..=fighters));
    let recipient = ActorId(rng.gen_range(1..=fighters));
    let event = match rng.gen_range(0..10) {
        0 => CalloutEvent::Drafted { actor: initiator },
        1..=4 => CalloutEvent::MeleeAttack {
            initiator,
            recipient: Some(recipient),
        },
        5..=8 => CalloutEvent::RangedAttack {
            initiator,
            target: Some(recipient),
            initiator_cover: rng
                .gen_bool(0.5)
                .then(|| COVERS[rng.gen_range(0..COVERS.len())].to_string()),
            recipient_cover: rng
                .gen_bool(0.5)
                .then(|| COVERS[rng.gen_range(0..COVERS.len())].to_string()),
        },
        _ => return None,
    };
    Some(event)
}

fn throw_wound(
    engine: &mut CalloutEngine,
    host: &mut SandboxHost,
    rng: &mut StdRng,
    fighters: u64,
) {
    if fighters == 0 {
        return;
    }
    let Some(target) = host.actors().nth(rng.gen_range(0..fighters as usize)).cloned() else {
        return;
    };
    let (severity, color) = match rng.gen_range(0..4) {
        0 => (WoundSeverity::Minor, Color::YELLOW),
        1 => (WoundSeverity::Serious, Color::ORANGE),
        2 => (WoundSeverity::Major, Color::RED),
        _ => (WoundSeverity::Destroyed, Color::RED),
    };
    let damage = rng.gen_range(1..30);
    engine.show_wound(host, target.map, target.draw_pos, &format!("-{}", damage), color, severity);
}

fn outcome_name(outcome: CalloutOutcome) -> &'static str {
    match outcome {
        CalloutOutcome::Ineligible => "ineligible",
        CalloutOutcome::TargetFiltered => "target filtered",
        CalloutOutcome::ChanceFailed => "chance failed",
        CalloutOutcome::NoText => "no text",
        CalloutOutcome::Shown(_) => "shown",
    }
}

fn print_shown(host: &mut SandboxHost) {
    for ShownText { tick, frame, text, kind, .. } in host.take_shown() {
        match kind {
            ShownKind::Attached { owner } => {
                let name = host
                    .actors()
                    .find(|a| a.id == owner)
                    .map(|a| a.label.clone())
                    .unwrap_or_default();
                println!("[t{:>4} f{:>4}] {:>6}: \"{}\"", tick, frame, name, text);
            }
            ShownKind::Floating { cell, .. } => {
                println!("[t{:>4} f{:>4}]   ({:>2},{:>2}) {}", tick, frame, cell.x, cell.z, text);
            }
        }
    }
}

fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        rule_packs: "callout_data/rule_packs".to_string(),
        settings: "callout_data/settings.ron".to_string(),
        seed: 42,
        ticks: 600,
        fighters: 6,
        pause_at: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--rule-packs" if i + 1 < args.len() => {
                i += 1;
                options.rule_packs = args[i].clone();
            }
            "--settings" if i + 1 < args.len() => {
                i += 1;
                options.settings = args[i].clone();
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                options.seed = args[i].parse().unwrap_or(42);
            }
            "--ticks" if i + 1 < args.len() => {
                i += 1;
                options.ticks = args[i].parse().unwrap_or(600);
            }
            "--fighters" if i + 1 < args.len() => {
                i += 1;
                options.fighters = args[i].parse().unwrap_or(6);
            }
            "--pause-at" if i + 1 < args.len() => {
                i += 1;
                options.pause_at = args[i].parse().ok();
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }
    options
}

fn print_usage() {
    println!("Usage: callout_preview [--rule-packs <dir>] [--settings <file>] [--seed <n>]");
    println!("                       [--ticks <n>] [--fighters <n>] [--pause-at <tick>]");
}
