use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use taskdeck::{logging, ui, ApiClient, App, AppEvent, Config, Route};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args: Vec<String> = std::env::args().collect();
    let mut route = Route::Users;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--route" => {
                let Some(path) = args.get(i + 1) else {
                    eprintln!("Error: --route requires a path argument");
                    std::process::exit(1);
                };
                route = match Route::parse(path) {
                    Some(route) => route,
                    None => {
                        eprintln!("Error: unknown route '{}' (use /, /tasks or /<userId>/tasks)", path);
                        std::process::exit(1);
                    }
                };
                i += 2;
            }
            "--help" | "-h" => {
                println!("Usage: taskdeck [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --route <PATH>  Start at /, /tasks or /<userId>/tasks");
                println!("  --help, -h      Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                std::process::exit(1);
            }
        }
    }

    let log_path = logging::init()?;
    let config = Config::from_env()?;
    tracing::info!(api_url = %config.api_url, log = %log_path.display(), "starting taskdeck");

    let api = ApiClient::new(&config.api_url, config.request_timeout)
        .context("failed to build HTTP client")?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let res = run_app(&mut terminal, Arc::new(api), &config, route).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "taskdeck exited with an error");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    api: Arc<ApiClient>,
    config: &Config,
    route: Route,
) -> Result<()> {
    // Create event channel
    let (tx, mut rx) = mpsc::channel::<AppEvent>(100);

    // Spawn input handler
    let tx_input = tx.clone();
    tokio::spawn(async move {
        loop {
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press {
                        let _ = tx_input.send(AppEvent::Key(key)).await;
                    }
                }
            }
            // Tick drives the search debounce and UI refresh
            if tx_input.send(AppEvent::Tick).await.is_err() {
                break;
            }
        }
    });

    let mut app = App::new(api, tx, config.task_list(), route);
    app.start();

    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        match rx.recv().await {
            Some(event) => {
                if app.handle_event(event) {
                    return Ok(());
                }
            }
            None => return Ok(()),
        }
    }
}
