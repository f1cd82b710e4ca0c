//! SaberForge - lightsaber workbench and first-person arena, driven headless from the command line.

mod cli;
mod combat;
mod config;
mod maker;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use engine_core::Time;
use input::{ElementState, InputState, KeyCode, MouseButton};
use saber::{ConfigStore, FileStore, KeyValueStore, SaberConfiguration, Stage};

use cli::{Cli, CombatAction, Command, MakerAction};
use combat::CombatArena;
use config::GameConfig;
use maker::SaberMaker;
use report::SaberReport;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                           SaberForge                             ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║  MAKER:   section=type  drag=dx,dy  zoom=n  power  shuffle       ║");
    println!("║           reset  fight                                           ║");
    println!("║  COMBAT:  swing  jump                                            ║");
    println!("║  --write-config saves settings to saberforge.ron                 ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");

    let cli = Cli::parse();
    let settings = GameConfig::load();
    if cli.write_config {
        settings.save();
        log::info!("Wrote settings to {:?}", config::config_path());
    }
    let seed = settings.seed.unwrap_or_else(rand::random);
    log::info!("Starting SaberForge (seed {}, saves in {:?})", seed, settings.storage_dir);

    let store = FileStore::new(settings.storage_dir.clone());
    match cli.command() {
        Command::Maker { actions } => {
            if let Some(config) = run_maker(&settings, seed, store, &actions)? {
                run_combat(&settings, seed, config, &[]);
            }
        }
        Command::Combat { actions } => {
            let config = ConfigStore::new(store).load_or_default();
            run_combat(&settings, seed, config, &actions);
        }
    }

    Ok(())
}

/// Step `step` at the fixed simulation rate for the configured duration. Returns the step count.
fn simulate(settings: &GameConfig, mut step: impl FnMut(f32)) -> u64 {
    let mut time = Time::with_fixed_rate(settings.sim_rate_hz);
    let frames = (f64::from(settings.run_seconds) * settings.sim_rate_hz).round() as u64;
    let mut steps = 0;
    for _ in 0..frames {
        time.advance(time.fixed_timestep());
        while time.should_fixed_update() {
            step(time.fixed_timestep_seconds());
            steps += 1;
        }
    }
    log::debug!("Simulated {:.2}s over {} frames", time.elapsed().as_secs_f32(), time.frame_count());
    steps
}

/// One frame of pointer input: a held left-button drag plus wheel notches.
fn pointer_frame(dx: f32, dy: f32, scroll: f32) -> InputState {
    let mut input = InputState::new();
    input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
    input.process_mouse_motion((f64::from(dx), f64::from(dy)));
    input.process_scroll(scroll);
    input.begin_frame();
    input
}

fn run_maker<S: KeyValueStore>(
    settings: &GameConfig,
    seed: u64,
    store: S,
    actions: &[MakerAction],
) -> Result<Option<SaberConfiguration>> {
    let mut maker = SaberMaker::new(Stage::new(seed), store).with_drag_sensitivity(settings.drag_sensitivity);
    let mut fight = None;

    for action in actions {
        match action {
            MakerAction::Select { section, value } => {
                maker.menu_event(section, value);
            }
            MakerAction::Drag(dx, dy) => maker.handle_input(&pointer_frame(*dx, *dy, 0.0)),
            MakerAction::Zoom(notches) => maker.handle_input(&pointer_frame(0.0, 0.0, *notches)),
            MakerAction::Power => maker.toggle_power(),
            MakerAction::Shuffle => maker.shuffle(),
            MakerAction::Reset => {
                let deleted = maker
                    .reset(|saved| {
                        log::info!(
                            "Deleting saved saber: {} blade, {} pommel ({}), {} grip ({}), {} emitter ({})",
                            saved.blade_color,
                            saved.pommel_type,
                            saved.part_colors.pommel,
                            saved.grip_type,
                            saved.part_colors.grip,
                            saved.emitter_type,
                            saved.part_colors.emitter
                        );
                        true
                    })
                    .context("Failed to delete saved saber")?;
                if deleted {
                    log::info!("Saved data deleted, new random saber generated");
                }
            }
            MakerAction::Fight => {
                fight = Some(maker.fight().context("Failed to save saber before combat")?);
            }
        }
    }

    let steps = simulate(settings, |dt| {
        for event in maker.update(dt) {
            log::info!("Blade {:?}", event);
        }
    });
    log::info!(
        "Maker after {} steps (camera radius {:.1}):\n{}",
        steps,
        maker.camera().radius,
        SaberReport::collect(maker.stage(), maker.saber(), maker.config())
    );

    maker.shutdown().context("Failed to save saber on exit")?;
    Ok(fight)
}

fn run_combat(settings: &GameConfig, seed: u64, config: SaberConfiguration, actions: &[CombatAction]) {
    let mut arena = CombatArena::new(Stage::new(seed), config).with_mouse_sensitivity(settings.mouse_sensitivity);
    let mut input = InputState::new();
    if actions.contains(&CombatAction::Swing) {
        input.set_cursor_locked(true);
    }

    let mut frame = 0u64;
    let steps = simulate(settings, |dt| {
        input.begin_frame();
        if frame == 0 {
            for action in actions {
                match action {
                    CombatAction::Swing => input.process_mouse_button(MouseButton::Left, ElementState::Pressed),
                    CombatAction::Jump => input.process_keyboard(KeyCode::Space, ElementState::Pressed),
                }
            }
        }
        for event in arena.update(&mut input, dt) {
            log::info!("Blade {:?}", event);
        }
        frame += 1;
    });

    log::info!(
        "Combat after {} steps: [{}] player at {:.2}, swinging: {}\n{}",
        steps,
        arena.status(),
        arena.player().transform.position,
        arena.is_swinging(),
        SaberReport::collect(arena.stage(), arena.saber(), arena.config())
    );
}
