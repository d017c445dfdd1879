/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::io;
use std::sync::Mutex;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use sim::clock::FrameClock;
use sim::level;
use sim::step::{self, ClockView};
use sim::world::{Phase, World};
use ui::input::InputState;
use ui::renderer::Renderer;

fn main() -> anyhow::Result<()> {
    let config = GameConfig::load();
    init_logging(&config);
    for w in &config.warnings {
        warn!("config: {w}");
    }
    info!(
        fps = config.timing.fps,
        max_delta_ms = config.timing.max_delta_ms,
        world = %config.world_file.display(),
        "starting"
    );

    let mut world = load_world(&config)?;

    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;
    let result = game_loop(&mut world, &mut renderer, &config);
    let cleanup = renderer.cleanup();
    result?;
    cleanup.context("terminal cleanup failed")?;

    println!();
    println!("Thanks for playing Cave Runner!");
    println!("Coins: {}  Lives left: {}", world.player.coins, world.player.lives.max(0));
    Ok(())
}

/// Log to the configured file; the terminal belongs to the renderer.
fn init_logging(config: &GameConfig) {
    let file = match File::create(&config.log_file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Logging disabled: cannot create {}: {e}", config.log_file.display());
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

/// The configured world file, or the built-in world when there is none.
fn load_world(config: &GameConfig) -> anyhow::Result<World> {
    let path = &config.world_file;
    match std::fs::read_to_string(path) {
        Ok(text) => level::load_world(&text, config)
            .with_context(|| format!("invalid world file {}", path.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "world file not found, using the built-in world");
            Ok(level::default_world(config)?)
        }
        Err(e) => Err(e).with_context(|| format!("failed reading {}", path.display())),
    }
}

fn game_loop(world: &mut World, renderer: &mut Renderer, config: &GameConfig) -> anyhow::Result<()> {
    let mut input = InputState::new();
    let mut clock = FrameClock::new(config.timing.fps, config.timing.max_delta_ms);

    loop {
        clock.wait_for_next_frame();

        // Quit is only honoured here, between frames.
        input.drain_events();
        if input.quit_requested() {
            info!("quit requested");
            break;
        }

        let view = ClockView {
            frame_ms: clock.elapsed_frame_time(),
            total_ms: clock.elapsed_total_time(),
        };
        let events = step::step(world, input.intent(), view);
        renderer.note(&events);
        renderer.render(world).context("render failed")?;

        if world.phase == Phase::Quit {
            break;
        }
    }

    info!(
        frames = clock.frame_count(),
        fps = clock.current_fps(),
        "session ended"
    );
    Ok(())
}
