use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod action;
mod app;
mod backend;
mod config;
mod controller;
mod gate;
mod handler;
mod session;
#[cfg(test)]
mod testutil;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "pytutor")]
#[command(about = "TUI Python assistant backed by a local AI engine")]
struct Cli {
    /// Backend base URL (overrides PYTUTOR_BACKEND_URL and the config file)
    #[arg(short, long)]
    backend: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging()?;

    // First run: materialize the config file so it can be found and edited
    if let Ok(config) = config::Config::load() {
        if config.backend_url.is_none() {
            let _ = config.save();
        }
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(std::time::Duration::from_millis(300));
    let mut app = App::new(cli.backend).await;

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(
    terminal: &mut tui::Tui,
    events: &mut tui::EventHandler,
    app: &mut App,
) -> Result<()> {
    tracing::info!(
        thread_id = app.controller.thread_id(),
        backend = app.controller.backend_url(),
        "session started"
    );

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;
        if let Some(event) = events.next().await {
            handler::handle_event(app, event);
        }
        app.reap_pending().await;
    }

    Ok(())
}

/// Log to a file under the config dir; the terminal belongs to the TUI.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("pytutor")
        .join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, "pytutor.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
