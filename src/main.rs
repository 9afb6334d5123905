// ============================================================================
// Stock Viz - Tableau de bord des actions brésiliennes
// ============================================================================
// Programme TUI : une page avec un sélecteur d'action et le graphique en
// chandeliers japonais de son historique journalier sur un an (API brapi)
//
// ARCHITECTURE :
// 1. Thread principal : event loop (input → update → render), possède App
// 2. Worker thread : exécute les fetchs async sur le runtime tokio
// 3. Communication par mpsc channels (commandes → worker, résultats ← worker)
// ============================================================================

use std::io;
use std::sync::{mpsc, Arc};

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use stockviz::api::StockFetcher;
use stockviz::app::{App, Command};
use stockviz::config::Config;
use stockviz::models::{plot_candlesticks, PriceSeries};
use stockviz::ui::{events::EventHandler, render};

// ============================================================================
// Commandes et résultats du worker
// ============================================================================

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    DirectoryLoaded(Arc<Vec<String>>),
    DirectoryFailed(String),
    HistoryLoaded { ticker: String, series: Arc<PriceSeries> },
    HistoryFailed { ticker: String, error: String },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : on log vers un
// fichier, avec rotation quotidienne
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Répertoire : STOCKVIZ_LOG_DIR, sinon ~/.local/share/stockviz/logs (Linux)
///
/// ```bash
/// tail -f ~/.local/share/stockviz/logs/stockviz.log
/// RUST_LOG=stockviz=trace cargo run
/// ```
fn init_logging(config: &Config) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = config.log_dir();

    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "stockviz.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour stockviz, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockviz=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let config = Config::from_env().context("Configuration invalide")?;

    init_logging(&config).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(base_url = %config.api.base_url, cache_ttl = ?config.cache_ttl, "Stock Viz starting up");

    // Le runtime vit dans le thread principal, le worker n'a qu'un Handle
    let runtime = tokio::runtime::Runtime::new()?;
    let fetcher = Arc::new(StockFetcher::from_config(&config)?);

    let (command_tx, command_rx) = mpsc::channel::<Command>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(runtime.handle().clone(), fetcher, command_rx, result_tx);

    // Comme un select HTML : la page commence par charger ses options
    let mut app = App::new();
    let command = app.load_directory(false);
    dispatch(&mut app, &command_tx, command);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &command_tx, &result_rx);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    // Ferme le channel : le worker sort de sa boucle
    drop(command_tx);

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Worker thread
// ============================================================================

/// Worker thread qui exécute les fetchs en arrière-plan
///
/// block_on bloque le worker, pas l'UI. Le fetcher (et ses caches) n'est
/// utilisé que depuis ce thread, derrière un Arc.
fn spawn_background_worker(
    handle: Handle,
    fetcher: Arc<StockFetcher>,
    command_rx: mpsc::Receiver<Command>,
    result_tx: mpsc::Sender<AppResult>,
) {
    std::thread::spawn(move || {
        while let Ok(command) = command_rx.recv() {
            info!(?command, "Worker received command");
            let fetcher = fetcher.as_ref();

            let result = match command {
                Command::LoadDirectory { force } => handle.block_on(async move {
                    if force {
                        fetcher.invalidate_directory().await;
                    }
                    match fetcher.get_all_stocks().await {
                        Ok(stocks) => {
                            info!(count = stocks.len(), "Stock list loaded");
                            AppResult::DirectoryLoaded(stocks)
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to load stock list");
                            AppResult::DirectoryFailed(e.to_string())
                        }
                    }
                }),

                Command::LoadHistory { ticker, force } => handle.block_on(async move {
                    if force {
                        fetcher.invalidate_history(&ticker).await;
                    }
                    match fetcher.get_stock_time_history(&ticker).await {
                        Ok(series) => {
                            info!(ticker = %ticker, candles = series.len(), "History loaded");
                            AppResult::HistoryLoaded { ticker, series }
                        }
                        Err(e) => {
                            error!(ticker = %ticker, error = %e, "Failed to load history");
                            AppResult::HistoryFailed {
                                ticker,
                                error: e.to_string(),
                            }
                        }
                    }
                }),
            };

            if result_tx.send(result).is_err() {
                break;
            }
        }

        info!("Worker thread exiting (channel closed)");
    });
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. Résultats du worker
//   1. Render
//   2. Input
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    command_tx: &mpsc::Sender<Command>,
    result_rx: &mpsc::Receiver<AppResult>,
) -> Result<()> {
    let mut worker_alive = true;

    while app.is_running() {
        while worker_alive {
            match result_rx.try_recv() {
                Ok(result) => apply_result(app, result, command_tx),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Worker thread disconnected");
                    app.on_worker_stopped();
                    worker_alive = false;
                }
            }
        }

        terminal.draw(|frame| render(frame, &*app))?;

        match events.next() {
            Ok(event) => {
                if let Some(command) = app.handle_event(&event) {
                    dispatch(app, command_tx, command);
                }
            }
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

/// Intègre un résultat du worker dans l'état
fn apply_result(app: &mut App, result: AppResult, command_tx: &mpsc::Sender<Command>) {
    match result {
        AppResult::DirectoryLoaded(stocks) => {
            if let Some(command) = app.on_directory_loaded(stocks.as_ref().clone()) {
                dispatch(app, command_tx, command);
            }
        }
        AppResult::DirectoryFailed(error) => app.on_directory_failed(error),
        AppResult::HistoryLoaded { ticker, series } => {
            let chart = plot_candlesticks(&series, &ticker);
            if !app.show_chart(&ticker, chart) {
                debug!(ticker = %ticker, "Discarding chart for a stock no longer selected");
            }
        }
        AppResult::HistoryFailed { ticker, error } => {
            if !app.on_history_failed(ticker, error) {
                debug!("Discarding error for a stock no longer selected");
            }
        }
    }
}

/// Envoie une commande au worker
///
/// Si le worker est mort, l'échec s'affiche à la place du graphique
fn dispatch(app: &mut App, command_tx: &mpsc::Sender<Command>, command: Command) {
    if let Err(e) = command_tx.send(command) {
        error!(command = ?e.0, "Worker thread unavailable, command dropped");
        app.on_worker_stopped();
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

/// Configure le terminal en mode TUI (raw mode + alternate screen)
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    Ok(())
}
