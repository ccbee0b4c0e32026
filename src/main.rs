use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

mod api;
mod app;
mod catalog;
mod config;
mod conversation;
mod handler;
mod identity;
mod suggestions;
mod tui;
mod ui;

use api::ChatClient;
use app::App;
use catalog::Catalog;
use config::{Config, DEFAULT_API_URL};

#[derive(Parser)]
#[command(name = "lyon")]
#[command(about = "Terminal guide to Lyon with a conversational tourism assistant")]
struct Cli {
    /// Base URL of the answering service
    #[arg(long)]
    api_url: Option<String>,

    /// Load the place catalog from a JSON file instead of the built-in data
    #[arg(long)]
    data: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    let config = Config::load().unwrap_or_default();
    let api_url = cli
        .api_url
        .or(config.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let catalog = match &cli.data {
        Some(path) => Catalog::from_file(path).await?,
        None => Catalog::builtin()?,
    };

    let conversation_id = identity::get_or_create_id();
    tracing::info!(%api_url, places = catalog.len(), "starting");

    let client = ChatClient::new(&api_url);
    let mut app = App::new(catalog, client, conversation_id);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(Duration::from_millis(250));

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event)?,
            None => break,
        }

        // Collect a finished assistant request, if any
        app.poll_chat().await;
    }

    tui::restore()?;
    Ok(())
}

/// Logs go to a file under the config directory; the terminal belongs to
/// the TUI. Verbosity comes from RUST_LOG, and failing to set up logging
/// is not fatal.
fn init_logging() {
    let Some(dir) = dirs::config_dir().map(|d| d.join("lyon-assist")) else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }

    let appender = tracing_appender::rolling::never(dir, "lyon.log");
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(appender)
        .with_ansi(false)
        .try_init();
}
