mod audio;
mod audio_api;
mod config;
mod error;
mod middle;
mod pipeline;
mod shared;
mod tui;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use middle::SequencerContext;
use shared::InputEvent;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dir: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    init_logging(&project_dir)?;

    let config = config::load_config(&project_dir)?;
    // audio failure is fatal; report it before the terminal goes raw
    let (audio, link) = audio::start_audio(config.master_volume)?;
    let mut context = SequencerContext::new(&config, &project_dir, link);
    let notifications = context.notifications();
    log::info!(
        "stepbeat ready: {} tracks x {} steps, export to {}",
        config.tracks.len(),
        config.steps,
        config.export_dir(&project_dir).display()
    );

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    // input is polled often so clock ticks are serviced promptly; the screen
    // only redraws at ~60fps
    let poll_rate = Duration::from_millis(4);
    let frame_rate = Duration::from_millis(16);
    let mut last_draw = Instant::now() - frame_rate;
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        for note in notifications.try_iter() {
            tui_state.observe(note);
        }

        if last_draw.elapsed() >= frame_rate {
            let ds = context.display_state();
            tui_state.sync(&ds);
            term.draw(|frame| {
                let area = frame.area();
                tui::view::render(frame, area, &ds, &tui_state);
            })?;
            last_draw = Instant::now();
        }

        let events = tui::input::poll_input(poll_rate, &mut tui_state)?;
        for event in events {
            if event == InputEvent::Quit {
                if context.is_recording() {
                    context.stop_recording();
                }
                drop(term);
                drop(audio);
                return Ok(());
            }
            if let Err(e) = context.handle_input(event) {
                log::warn!("command rejected: {e}");
            }
        }

        context.poll();
    }
}

fn init_logging(project_dir: &Path) -> anyhow::Result<()> {
    let dir = project_dir.join(config::STEPBEAT_DIR);
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let file = File::create(dir.join("stepbeat.log")).context("opening log file")?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
