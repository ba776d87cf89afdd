/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use env_logger::{Env, Target};
use log::{info, warn};

use config::GameConfig;
use domain::entity::MoveDir;
use sim::event::GameEvent;
use sim::step;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{Sfx, SoundEngine};

fn main() {
    let (config, config_error) = match GameConfig::load() {
        Ok(c) => (c, None),
        Err(e) => (GameConfig::default(), Some(e)),
    };

    init_logging(config.log_file.as_deref());
    if let Some(e) = &config_error {
        warn!("{e}; using default settings");
    }

    let mut world = WorldState::new(&config);
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }
    if let Some(e) = config_error {
        eprintln!("Note: config.toml was ignored ({e})");
    }

    println!();
    println!("Thanks for playing AI Dungeon Master!");
    let fate = if world.player.is_dead() { "Fell" } else { "Left" };
    println!(
        "{fate} at depth {} with {} treasure(s) and {} health.",
        world.depth, world.treasure_count, world.player.health
    );
}

/// The terminal belongs to the game, so logs go to a file or nowhere.
fn init_logging(path: Option<&Path>) {
    let Some(path) = path else { return };
    match File::create(path) {
        Ok(file) => {
            let built = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
                .target(Target::Pipe(Box::new(file)))
                .try_init();
            if let Err(e) = built {
                eprintln!("Logger init failed: {e}");
            }
        }
        Err(e) => eprintln!("Could not open log file {}: {e}", path.display()),
    }
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let frame = Duration::from_millis(config.timing.frame_ms);
    let mut paused = false;

    loop {
        let frame_start = Instant::now();
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.quit_pressed() {
            info!("quit at depth {}", world.depth);
            break;
        }

        if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
            world.restart();
            paused = false;
        } else if kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed() {
            if !world.is_game_over() {
                paused = !paused;
            }
        } else if !paused {
            let events = step::step(world, detect_movement(&kb, &gp));
            process_sound_events(sound, &events);
        }

        renderer.render(world, paused)?;

        if let Some(rest) = frame.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let Some(sfx) = sound else { return };
    for event in events {
        if let Some(effect) = Sfx::for_event(event) {
            sfx.play(effect);
        }
    }
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P'), KeyCode::F(1)];

/// First movement key pressed this frame wins; the gamepad is consulted after.
fn detect_movement(kb: &InputState, gp: &GamepadState) -> Option<MoveDir> {
    const GROUPS: [(&[KeyCode], MoveDir); 4] = [
        (KEYS_LEFT, MoveDir::Left),
        (KEYS_RIGHT, MoveDir::Right),
        (KEYS_UP, MoveDir::Up),
        (KEYS_DOWN, MoveDir::Down),
    ];

    kb.first_pressed(&GROUPS).or_else(|| gp.movement_pressed())
}
