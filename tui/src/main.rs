mod app;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use config::{PathManager, Profile, Settings, load_env_file};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, MouseEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use folio_core::{ChatSessionManager, FileStore, TranscriptStore};
use llm::{GeminiProvider, ModelProvider};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::path::PathBuf;

#[cfg(not(debug_assertions))]
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "folio", about = "Portfolio career assistant in the terminal")]
struct Args {
    /// Gemini model to talk to (overrides settings.toml)
    #[arg(short, long)]
    model: Option<String>,

    /// Profile the assistant answers for
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Settings file to use instead of the one in the config directory
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Keep data (history, logs) under this directory
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn load_profile(path: Option<PathBuf>) -> Result<Profile> {
    match path {
        Some(path) if path.exists() => Profile::load(&path).map_err(anyhow::Error::msg),
        Some(path) => {
            tracing::warn!("Profile {} not found, using defaults", path.display());
            Ok(Profile::default())
        }
        None => Ok(Profile::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(dir) = args.data_dir.clone() {
        PathManager::set_data_dir(dir);
    }
    PathManager::ensure_dirs_exist().context("failed to create data directories")?;

    // Dev builds write ./folio.log fresh on each run; release builds rotate
    // daily under the platform log directory.
    #[cfg(debug_assertions)]
    let log_file = {
        let path = PathBuf::from("./folio.log");
        let _ = std::fs::remove_file(&path);
        std::fs::File::create(&path)?
    };
    #[cfg(debug_assertions)]
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    #[cfg(not(debug_assertions))]
    let (non_blocking, _guard) = {
        let log_dir = PathManager::logs_dir().unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&log_dir)?;
        let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "folio.log");
        tracing_appender::non_blocking(file_appender)
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,folio_core=debug,folio_voice=debug,llm=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!("Starting folio TUI");

    load_env_file();
    let settings = match &args.settings {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let model_name = args.model.clone().unwrap_or_else(|| settings.model_name().to_string());
    let profile = load_profile(args.profile.clone().or_else(|| settings.profile_path()))?;

    let provider = GeminiProvider::from_env(settings.api_base_url.as_deref())?;
    let model = provider
        .create_chat_model(&model_name)
        .with_context(|| format!("unknown model '{model_name}'"))?;

    let store_dir = PathManager::store_dir().context("could not determine a data directory")?;
    let store = TranscriptStore::new(FileStore::new(store_dir)?);
    let voice = folio_voice::from_settings(&settings.voice);
    let manager = ChatSessionManager::with_voice(model, profile, store, voice)?;
    let mut app = App::new(manager, settings.export_dir());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app).await;
    app.close();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        app.tick();

        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => {
                    if !app.handle_key_event(key).await? {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => app.scroll_up(3),
                    MouseEventKind::ScrollDown => app.scroll_down(3),
                    _ => {}
                },
                _ => {}
            }
        }
    }
}
