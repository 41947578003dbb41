mod app;
mod backend;
mod cli;
mod config;
mod contexts;
mod event;
mod highlight;
mod input;
mod k8s;
mod model;
mod router;
mod screen;
mod screens;
#[cfg(test)]
mod testing;
mod ui;
mod widgets;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use cli::CliArgs;
use config::LoadedConfig;
use contexts::KubeconfigStore;
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use event::AppEvent;
use futures::StreamExt;
use input::KeyBindings;
use k8s::KubeGateway;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use router::Router;
use screen::{Effect, SharedState};
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::time::{Duration, Interval, MissedTickBehavior, interval, timeout};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

const CLEANUP_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let result = bootstrap(&args).await;
    if let Err(error) = &result {
        error!("{error:#}");
    }
    result
}

async fn bootstrap(args: &CliArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => LoadedConfig::load(path)?,
        None => LoadedConfig::discover()?,
    };
    if let Some(page_size) = args.page_size {
        config.settings.page_size = page_size;
    }
    if let Some(refresh_secs) = args.refresh_secs {
        config.refresh_secs = refresh_secs;
    }
    info!(source = ?config.source, "configuration loaded");

    let store = KubeconfigStore::discover(args.kubeconfig.clone())?;
    let gateway = KubeGateway::connect(Some(store.path()), args.namespace.as_deref())
        .await
        .context("failed to construct the cluster client")?;

    let state = SharedState {
        backend: Arc::new(gateway),
        contexts: Arc::new(store),
        keys: KeyBindings::default(),
        settings: config.settings,
    };
    let (root, params) = args.root_screen();
    let router = Router::new(screens::registry(), root, &state, params)?;
    let mut app = App::new(router, state, config.theme);

    run(&mut app, config.refresh_secs).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact();

    // The terminal belongs to the UI, so logs go to a file or nowhere.
    let _ = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(io::sink).try_init(),
    };

    Ok(())
}

async fn run(app: &mut App, refresh_secs: u64) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, refresh_secs).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);
    finish_cleanup(app.take_cleanup()).await;

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(terminal: &mut TuiTerminal, app: &mut App, refresh_secs: u64) -> Result<()> {
    let (effect_tx, mut effect_rx) = unbounded_channel::<AppEvent>();
    let mut reader = EventStream::new();
    let mut ticker = (refresh_secs > 0).then(|| {
        let mut ticker = interval(Duration::from_secs(refresh_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    });

    spawn_effects(app.start(), &effect_tx);

    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        let event = tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                    Some(Ok(Event::Resize(width, height))) => AppEvent::Resize(width, height),
                    Some(Ok(_)) => continue,
                    Some(Err(error)) => {
                        warn!("terminal event error: {error}");
                        continue;
                    }
                    None => {
                        warn!("terminal event stream closed");
                        break;
                    }
                }
            }
            Some(event) = effect_rx.recv() => event,
            _ = next_tick(&mut ticker) => AppEvent::Tick,
        };

        if let AppEvent::Key(key) = &event {
            debug!(code = ?key.code, modifiers = ?key.modifiers, "key");
        }
        spawn_effects(app.handle_event(event), &effect_tx);
    }

    Ok(())
}

/// Hands each effect to the runtime; its event comes back through `tx`.
fn spawn_effects(effects: Vec<Effect>, tx: &UnboundedSender<AppEvent>) {
    for effect in effects {
        let tx = tx.clone();
        debug!(label = effect.label(), "effect scheduled");
        tokio::spawn(async move {
            let event = effect.into_future().await;
            // The receiver only goes away at shutdown.
            let _ = tx.send(event);
        });
    }
}

/// Gives the last screen's cleanup effects a short window before the runtime stops.
async fn finish_cleanup(effects: Vec<Effect>) {
    for effect in effects {
        let label = effect.label().to_string();
        match timeout(CLEANUP_GRACE, effect.into_future()).await {
            Ok(_) => debug!(%label, "cleanup finished"),
            Err(_) => warn!(%label, "cleanup abandoned at shutdown"),
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
