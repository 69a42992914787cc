mod aws;
mod config;
mod debug;
mod keymap;
mod theme;
mod ui;

use crate::aws::AwsCli;
use crate::config::{Args, Config};
use anyhow::Context;
use chrono::Utc;
use clap::error::ErrorKind;
use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::{File, OpenOptions},
    io::{self, Stdout},
    path::Path,
    process::ExitCode,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use waterfall_core::{
    DataSet, Effect, NavigationState, RefreshCoordinator, RefreshError, StackEventSource,
};

const CONFIG_EXIT: u8 = 1;
const TERMINAL_EXIT: u8 = 8;
const UNKNOWN_EXIT: u8 = 4;

type Tui = Terminal<CrosstermBackend<Stdout>>;
type RefreshOutcome = Result<Arc<DataSet>, RefreshError>;

/// Startup failure reported on stdout before the terminal UI takes over.
struct Failure {
    code: u8,
    summary: String,
    detail: String,
}

impl Failure {
    fn new(code: u8, summary: impl Into<String>, detail: impl ToString) -> Self {
        Self {
            code,
            summary: summary.into(),
            detail: detail.to_string(),
        }
    }

    fn report(&self, verbose: bool) -> ExitCode {
        println!("Error: {}", self.summary);
        if verbose {
            println!("{}", self.detail);
        }
        ExitCode::from(self.code)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(CONFIG_EXIT);
        }
    };
    let config = match Config::try_from(args) {
        Ok(config) => config,
        Err(err) => return Failure::new(CONFIG_EXIT, err.to_string(), &err).report(false),
    };
    init_logging(config.log_file.as_deref());

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(event = "startup_failed", code = failure.code, error = %failure.detail);
            failure.report(config.verbose)
        }
    }
}

async fn run(config: &Config) -> Result<(), Failure> {
    let source = Arc::new(AwsCli::new(config.profile.clone(), config.region.clone()));
    let stack_name = config.stack_name.clone();
    let discover_nested = config.discover_nested;
    info!(event = "startup", stack = %stack_name, discover_nested);

    let started = tokio::task::spawn_blocking(move || {
        RefreshCoordinator::start(source, &stack_name, discover_nested, Utc::now())
    })
    .await
    .map_err(|err| Failure::new(UNKNOWN_EXIT, "unknown error", err))?;
    let (coordinator, data) =
        started.map_err(|err| Failure::new(err.exit_code() as u8, err.summary(), &err))?;

    if config.debug {
        let mut stdout = io::stdout().lock();
        return debug::dump(&data, &mut stdout)
            .map_err(|err| Failure::new(UNKNOWN_EXIT, "failed to write debug output", err));
    }

    let mut terminal = setup_terminal().map_err(|err| {
        Failure::new(TERMINAL_EXIT, "failed to initialize screen", format!("{err:#}"))
    })?;
    let outcome = run_ui(
        &mut terminal,
        Arc::new(coordinator),
        data,
        config.refresh_interval,
    )
    .await;
    let restored = restore_terminal(&mut terminal);

    outcome
        .and(restored)
        .map_err(|err| Failure::new(TERMINAL_EXIT, "terminal error", format!("{err:#}")))
}

fn setup_terminal() -> anyhow::Result<Tui> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Tui) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_ui<S: StackEventSource + 'static>(
    terminal: &mut Tui,
    coordinator: Arc<RefreshCoordinator<S>>,
    data: Arc<DataSet>,
    refresh_interval: Option<Duration>,
) -> anyhow::Result<()> {
    let mut nav = NavigationState::new(data);
    let (refresh_tx, mut refresh_rx) = mpsc::channel::<RefreshOutcome>(4);
    let mut events = EventStream::new();
    let mut refresh_ticker = refresh_interval.map(|period| {
        tokio::time::interval_at(tokio::time::Instant::now() + period, period)
    });

    loop {
        let snapshot = nav.snapshot(coordinator.is_loading());
        terminal.draw(|frame| ui::render(frame, &snapshot))?;

        tokio::select! {
            _ = next_tick(&mut refresh_ticker) => {
                spawn_refresh(&coordinator, &refresh_tx);
            }
            Some(outcome) = refresh_rx.recv() => {
                apply_refresh(&mut nav, outcome);
            }
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(event)) => match handle_input(event, &mut nav) {
                        Effect::Quit => break,
                        Effect::Refresh => spawn_refresh(&coordinator, &refresh_tx),
                        Effect::None => {}
                    },
                    Some(Err(err)) => return Err(err.into()),
                    None => break,
                }
            }
        }
    }
    Ok(())
}

async fn next_tick(ticker: &mut Option<tokio::time::Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn handle_input(event: Event, nav: &mut NavigationState) -> Effect {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => keymap::command_for(key, nav)
            .map(|command| nav.apply(command))
            .unwrap_or(Effect::None),
        _ => Effect::None,
    }
}

/// Runs one refresh off the input loop. The in-flight slot is claimed before spawning, so the
/// next frame already shows the loading state. Skipped while another one is in flight.
fn spawn_refresh<S: StackEventSource + 'static>(
    coordinator: &Arc<RefreshCoordinator<S>>,
    results: &mpsc::Sender<RefreshOutcome>,
) {
    let Some(ticket) = coordinator.try_begin() else {
        debug!(event = "refresh_skipped", reason = "in_flight");
        return;
    };
    let results = results.clone();
    tokio::spawn(async move {
        match tokio::task::spawn_blocking(move || ticket.run(Utc::now())).await {
            Ok(outcome) => {
                let _ = results.send(outcome).await;
            }
            Err(err) => warn!(event = "refresh_task_failed", error = %err),
        }
    });
}

fn apply_refresh(nav: &mut NavigationState, outcome: RefreshOutcome) {
    match outcome {
        Ok(data) => nav.publish(data),
        Err(RefreshError::InFlight) => {
            debug!(event = "refresh_skipped", reason = "in_flight");
        }
        Err(err) => {
            warn!(event = "refresh_failed", error = %err);
            nav.record_refresh_error(err.to_string());
        }
    }
}

fn init_logging(log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file = log_file.and_then(|path| {
        open_log_file(path)
            .map_err(|err| eprintln!("log_file_error: {err}"))
            .ok()
    });
    match file {
        Some(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
