use std::io::stdout;
use std::path::PathBuf;
use std::sync::Once;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use clatter::audio::{CuePlayer, CueSink};
use clatter::clipboard::SystemClipboard;
use clatter::config::Config;
use clatter::key::Key;
use clatter::render;
use clatter::storage::{FileStore, Persistence};
use clatter::typewriter::{Outcome, Peripherals, Typewriter};

const LOG_FILENAME: &str = "clatter.log";

/// A typewriter for the terminal. No backspace.
#[derive(Parser, Debug)]
#[command(name = "clatter", version, about)]
struct Args {
    /// Config file (defaults to the per-user `clatter/config.toml`).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Where the page and onboarding flag are kept.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Minimum milliseconds between keystrokes before the machine jams (0 disables).
    #[arg(long)]
    speed: Option<u64>,
    /// Scroll the view instead of feeding the paper.
    #[arg(long)]
    no_typewriter_mode: bool,
    /// Cue volume between 0 and 1.
    #[arg(long)]
    volume: Option<f32>,
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen, Hide)?;
        Ok(TerminalGuard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(stdout(), LeaveAlternateScreen, Show);
}

fn configure_logging(dir: &std::path::Path) -> Option<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(dir, LOG_FILENAME);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Some(guard),
        // Subscriber already installed; drop the guard so the writer shuts down.
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_terminal();
            tracing::error!(target: "runtime.panic", %info, "panic");
            default_panic(info);
        }));
    });
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref()).context("loading config")?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if let Some(speed) = args.speed {
        config.typing_speed_ms = speed;
    }
    if args.no_typewriter_mode {
        config.typewriter_mode = false;
    }
    if let Some(volume) = args.volume {
        config.volume = volume.clamp(0.0, 1.0);
    }
    Ok(config)
}

fn mount(config: &Config) -> Result<Typewriter> {
    let data_dir = config.resolved_data_dir();
    let store = FileStore::open(&data_dir)
        .with_context(|| format!("opening data dir {}", data_dir.display()))?;
    info!(target: "typewriter.storage", dir = %store.dir().display(), "store_opened");

    let mut audio = CuePlayer::new(cue_sink(), config.volume, &config.resolved_sound_dir());
    audio.add_sounds(config);

    let peripherals = Peripherals {
        audio,
        clipboard: Box::new(SystemClipboard::new()),
        persistence: Persistence::new(Box::new(store)),
    };
    Ok(Typewriter::mount(config, peripherals, Instant::now()))
}

#[cfg(feature = "sound")]
fn cue_sink() -> Box<dyn CueSink> {
    Box::new(clatter::audio::RodioSink::open())
}

#[cfg(not(feature = "sound"))]
fn cue_sink() -> Box<dyn CueSink> {
    Box::new(clatter::audio::TerminalSink)
}

fn run(typewriter: &mut Typewriter) -> Result<()> {
    let mut out = stdout();
    loop {
        let now = Instant::now();
        typewriter.tick(now);
        let (cols, rows) = terminal::size()?;
        render::draw(&mut out, typewriter, cols, rows, now)?;

        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(event) = event::read()? {
                if event.kind != KeyEventKind::Press {
                    continue;
                }
                if typewriter.handle_key(Key::from(event), Instant::now()) == Outcome::Quit {
                    return Ok(());
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let data_dir = config.resolved_data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;
    let _log_guard = configure_logging(&data_dir);
    install_panic_hook();

    let mut typewriter = mount(&config)?;

    let guard = TerminalGuard::enter()?;
    let result = run(&mut typewriter);
    drop(guard);

    info!(target: "typewriter.session", chars = typewriter.buffer().len(), "session_ended");
    result
}
