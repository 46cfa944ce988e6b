use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info};

use eventwatch::app::App;
use eventwatch::cli::CliArgs;
use eventwatch::config::{resolve_log_path, Config};
use eventwatch::dashboard::snapshot;
use eventwatch::fetch::{EventSource, HttpEventSource};
use eventwatch::ui::render_plain;

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();

    match log_file {
        // The TUI owns stdout, so logs go to a file or stderr.
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }

    Ok(())
}

async fn run_loop<B: Backend>(app: &mut App, terminal: &mut Terminal<B>) -> Result<()> {
    let mut needs_redraw = true;

    loop {
        if app.pump() {
            needs_redraw = true;
        }

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key.code, key.modifiers);
                    needs_redraw = true;
                }
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }

        if needs_redraw {
            terminal.draw(|f| app.ui(f))?;
            needs_redraw = false;
        }

        // Let fetch tasks make progress between input polls.
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    Ok(())
}

async fn run_tui(config: Config, source: Arc<dyn EventSource>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, source);
    app.start();
    let res = run_loop(&mut app, &mut terminal).await;
    app.stop();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_once(config: &Config, source: Arc<dyn EventSource>) {
    let state = snapshot(source.as_ref(), config.ui.initial_filter.clone()).await;
    println!("{}", render_plain(&state, config.ui.show_branch_transition));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let log_path = resolve_log_path(&cli_args)?;
    init_tracing(log_path.as_deref())?;

    info!("Starting eventwatch");

    let config = Config::from_cli_and_file(cli_args.clone(), cli_args.config.clone())?;

    let source = HttpEventSource::new(config.endpoint.clone(), config.request_timeout())
        .context("Failed to set up events client")?;
    info!("Polling events from {}", source.endpoint());
    let source: Arc<dyn EventSource> = Arc::new(source);

    if cli_args.once {
        run_once(&config, source).await;
    } else if let Err(err) = run_tui(config, source).await {
        error!("Application error: {}", err);
        eprintln!("Error: {}", err);
    }

    info!("eventwatch shut down cleanly");
    Ok(())
}
