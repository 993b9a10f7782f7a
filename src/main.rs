/// Entry point and frame driver.

mod app;
mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::path::Path;
use std::time::Duration;

use crossterm::event::KeyCode;

use app::App;
use config::Config;
use sim::event::GameEvent;
use sim::save::FileBlobStore;
use ui::input::{is_interrupt, poll_key_presses};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const LOG_FILE: &str = "vimarcade.log";

/// Dumps the live state to the log when `general.debug` is on.
const INSPECT_KEY: KeyCode = KeyCode::F(12);

fn main() {
    let loaded = Config::load();
    let config = loaded.config;
    let data_dir = config.data_dir();

    init_logging(&data_dir);
    for warning in &loaded.warnings {
        log::warn!("{}", warning);
    }
    match &loaded.source {
        Some(path) => log::info!("config loaded from {}", path.display()),
        None => log::info!("no config.toml found, using defaults"),
    }
    log::info!("data directory: {}", data_dir.display());

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();
    if sound.is_none() {
        log::warn!("no audio output device, sound disabled");
    }

    let frame_sleep = Duration::from_millis(config.timing.frame_sleep_ms);
    let mut app = App::new(config, FileBlobStore::new(data_dir), renderer.viewport());

    let result = run(&mut app, &mut renderer, sound.as_ref(), frame_sleep);
    app.shutdown();

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop aborted: {}", e);
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Vim Motions Arcade!");
}

/// `warn` by default, `RUST_LOG` overrides. The terminal belongs to the
/// game, so records go to a file in the data directory when possible.
fn init_logging(data_dir: &Path) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    let file = std::fs::create_dir_all(data_dir)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(data_dir.join(LOG_FILE)));
    match file {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => eprintln!("Warning: could not open {}: {e}; logging to stderr", LOG_FILE),
    }
    builder.init();
}

fn run(
    app: &mut App,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    frame_sleep: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        for key in poll_key_presses() {
            if is_interrupt(&key) {
                return Ok(());
            }
            if key.code == INSPECT_KEY {
                if let Some(json) = app.inspect() {
                    log::info!("state snapshot: {}", json);
                }
                continue;
            }
            app.handle_key(&key);
        }
        if app.should_exit() {
            return Ok(());
        }

        let events = app.update();
        process_sound_events(sound, &events);

        renderer.render(&app.frame())?;
        // Picks up terminal resizes seen by the render pass
        app.set_viewport(renderer.viewport());

        std::thread::sleep(frame_sleep);
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let Some(sfx) = sound else {
        return;
    };
    for event in events {
        match event {
            GameEvent::CoinCollected { .. } => sfx.play_coin(),
            GameEvent::MoveBlocked { .. } => sfx.play_bump(),
            GameEvent::CommandExecuted { .. } => sfx.play_command(),
            GameEvent::CommandFailed { .. } => sfx.play_error(),
            GameEvent::LevelWon(_) => sfx.play_win(),
            GameEvent::LevelLost(_) => sfx.play_lose(),
            GameEvent::QuitRequested => {}
        }
    }
}
