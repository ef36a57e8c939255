//! Block Stage native demo
//!
//! Usage: `block-stage [settings.json] [scene.json]`
//!
//! Loads a scene (or the built-in demo), presses play and drives the session
//! at 60 Hz until the run stops, logging every sprite as it goes.

use std::path::Path;

use block_stage::Settings;
use block_stage::consts::FRAME_MS;
use block_stage::scene::Scene;
use block_stage::sim::{Session, SimEvent, TickInput};

/// Give up after this much virtual time if auto-stop is disabled
const MAX_RUN_MS: u64 = 60_000;

fn main() {
    env_logger::init();
    log::info!("Block Stage (native) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = args
        .first()
        .map(|p| Settings::load(Path::new(p)))
        .unwrap_or_default();
    let scene = match args.get(1) {
        Some(path) => Scene::load(Path::new(path)).unwrap_or_else(Scene::demo),
        None => Scene::demo(),
    };

    let mut session = Session::empty(settings);
    if let Err(e) = scene.install(&mut session) {
        log::error!("Failed to install scene: {}", e);
        std::process::exit(1);
    }
    if args.get(1).is_none() {
        log::info!("No scene given, running the built-in demo");
    }

    let mut input = TickInput {
        play: true,
        ..Default::default()
    };
    let mut last_report = 0;
    loop {
        session.tick(&input, FRAME_MS);
        input.play = false;

        for event in session.drain_events() {
            match event {
                SimEvent::Started { run, at_ms } => log::info!("Run {} started at {}ms", run.0, at_ms),
                SimEvent::Stopped { at_ms, automatic, .. } => {
                    log::info!("Stopped at {}ms (auto: {})", at_ms, automatic)
                }
                SimEvent::Collision { at_ms, outcome } => log::info!("{}ms: {:?}", at_ms, outcome),
            }
        }

        if session.clock_ms() - last_report >= 250 || !session.is_playing() {
            last_report = session.clock_ms();
            report(&session);
        }

        if !session.is_playing() || session.clock_ms() >= MAX_RUN_MS {
            break;
        }
    }

    session.stop();
    log::info!("Block Stage finished at {}ms", session.clock_ms());
}

/// Log every sprite the way the stage HUD shows it
fn report(session: &Session) {
    let stage = session.stage();
    for sprite in stage.sprites() {
        let (Some(live), Some(pos)) = (stage.live(&sprite.id), stage.logical_position(&sprite.id)) else {
            continue;
        };
        log::info!(
            "{} [{}] x: {}, y: {}, rotation: {}{}",
            sprite.name,
            sprite.id,
            pos.x,
            pos.y,
            live.rotation,
            if live.message.is_empty() {
                String::new()
            } else {
                format!(", says \"{}\"", live.message)
            }
        );
    }
}
