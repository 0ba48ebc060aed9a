mod api;
mod app;
mod config;
mod theme;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::BackendClient;
use app::App;
use config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "sotsu")]
#[command(version)]
#[command(about = "Check that a frontend can reach its backend: health, users and echo")]
struct Args {
    /// Backend base URL (overrides the config file)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Run the checks once and print the results as JSON instead of opening the TUI
    #[arg(long)]
    check: bool,

    /// Message to send to /echo in --check mode
    #[arg(short, long, requires = "check")]
    message: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.check);

    let config = AppConfig::load().with_base_url(args.base_url);
    tracing::info!("Using backend {}", config.base_url);
    let client = BackendClient::new(config.base_url.clone());

    if args.check {
        return print_check(&client, args.message).await;
    }

    run_tui(client, &config).await
}

/// Headless mode logs to stderr; the TUI owns the terminal, so it logs to a
/// file under the cache dir (or nowhere, if that can't be opened).
fn init_logging(headless: bool) {
    let filter = log_filter(std::env::var("RUST_LOG").ok());

    if headless {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init();
        return;
    }

    let log_file = dirs::cache_dir()
        .map(|dir| dir.join("sotsu"))
        .and_then(|dir| {
            std::fs::create_dir_all(&dir).ok()?;
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("sotsu.log"))
                .ok()
        });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .with(filter)
            .init();
    }
}

/// `RUST_LOG` if it parses, otherwise `info` so flow events reach the log
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

async fn print_check(client: &BackendClient, message: Option<String>) -> Result<()> {
    println!("{}", serde_json::to_string(&check_report(client, message).await)?);
    Ok(())
}

/// Run the flows once, with the same fallbacks as the panel
async fn check_report(client: &BackendClient, message: Option<String>) -> serde_json::Value {
    let health = app::health_flow(client).await;
    let users = app::users_flow(client).await;

    // Same rule as the panel: a blank message is never sent
    let echo = match message.filter(|m| !m.trim().is_empty()) {
        Some(message) => Some(app::echo_flow(client, &message).await),
        None => None,
    };

    serde_json::json!({
        "health": health,
        "users": users,
        "echo": echo,
    })
}

async fn run_tui(client: BackendClient, config: &AppConfig) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(client);
    if config.check_on_start {
        app.check_health();
    }

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Pick up finished requests before drawing so the flag and slots agree
        app.tick();
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
