//! Counter - minimal lit-up example
//!
//! - Model: what the app knows
//! - Updates: named functions that change it, registered under string keys
//! - View: what the model looks like
//! - Render: paints the view into the terminal
//!
//! Keys: k/Up = increment, j/Down = decrement, r = reset, q = quit
//!
//! ```sh
//! cargo run -p counter-demo -- --step 5 --log counter.log --log-exclude count.reset
//! ```

use std::fs::File;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use clap::Parser;
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use lit_up::prelude::*;
use lit_up::{PollerConfig, BOOTSTRAP_KEY};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Flex, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Counter - lit-up example
#[derive(Parser, Debug)]
#[command(name = "counter")]
#[command(about = "A counter TUI demonstrating lit-up dispatch")]
struct Args {
    /// Amount added or removed per key press
    #[arg(long, short, default_value = "1")]
    step: i64,

    /// Write dispatch logs to this file
    #[arg(long)]
    log: Option<PathBuf>,

    /// Only log updates matching these comma-separated patterns
    #[arg(long)]
    log_include: Option<String>,

    /// Never log updates matching these comma-separated patterns
    #[arg(long)]
    log_exclude: Option<String>,
}

// ============================================================================
// Model and updates
// ============================================================================

#[derive(Debug, Default)]
struct Counter {
    count: i64,
    step: i64,
}

fn bootstrap(inv: Invocation<Counter>) {
    let step = inv
        .registry
        .as_ref()
        .and_then(|registry| registry.value("settings.step"))
        .and_then(|value| value.as_i64())
        .unwrap_or(1);
    inv.model.update(|m| m.step = step);
}

fn inc(inv: Invocation<Counter>) {
    inv.model.update(|m| m.count += m.step);
}

fn dec(inv: Invocation<Counter>) {
    inv.model.update(|m| m.count -= m.step);
}

fn reset(inv: Invocation<Counter>) {
    inv.model.update(|m| m.count = 0);
}

fn registry(step: i64) -> Registry<Counter> {
    let mut registry = Registry::new()
        .with(BOOTSTRAP_KEY, handler!(bootstrap))
        .with("count.inc", handler!(inc))
        .with("count.dec", handler!(dec))
        .with("count.reset", handler!(reset));
    registry.insert_value("settings.step", step.into());
    registry
}

// ============================================================================
// View and render
// ============================================================================

struct CounterView {
    count: i64,
    step: i64,
}

fn view(model: &Counter, _: &Up<Counter>) -> CounterView {
    CounterView {
        count: model.count,
        step: model.step,
    }
}

type Screen = Mutex<Terminal<CrosstermBackend<Stdout>>>;

fn paint(screen: &Screen, view: CounterView) -> Result<(), RenderError> {
    let mut terminal = screen.lock().unwrap_or_else(PoisonError::into_inner);
    terminal.draw(|frame| {
        let area = frame.area();

        let [_, center, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(5),
            Constraint::Fill(1),
        ])
        .areas(area);

        let [_, center, _] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(30),
            Constraint::Fill(1),
        ])
        .flex(Flex::Center)
        .areas(center);

        let block = Block::default()
            .title(format!(" Counter (step {}) ", view.step))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let paragraph = Paragraph::new(view.count.to_string())
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, center);

        let [_, help_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        let help = Paragraph::new("k/Up: +  j/Down: -  r: reset  q: quit")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, help_area);
    })?;
    Ok(())
}

// ============================================================================
// Main - setup terminal, run event loop, cleanup
// ============================================================================

fn init_tracing(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log {
        init_tracing(path)?;
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run_app(terminal, &args).await;

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)?;

    result
}

async fn run_app(terminal: Terminal<CrosstermBackend<Stdout>>, args: &Args) -> io::Result<()> {
    let screen = Mutex::new(terminal);
    let filter = LogFilter::new(args.log_include.as_deref(), args.log_exclude.as_deref());

    let up = App::new(
        Counter::default(),
        view,
        render_fn(move |view: CounterView| paint(&screen, view)),
    )
    .registry(registry(args.step))
    .logger(args.log.is_some())
    .config(AppConfig::default().with_log_filter(filter))
    .start()
    .await
    .map_err(io::Error::other)?;

    let bindings = Bindings::new()
        .bind("k", up.dispatch("count.inc"))
        .and_then(|b| b.bind("up", up.dispatch("count.inc")))
        .and_then(|b| b.bind("j", up.dispatch("count.dec")))
        .and_then(|b| b.bind("down", up.dispatch("count.dec")))
        .and_then(|b| b.bind("r", up.dispatch("count.reset")))
        .map_err(io::Error::other)?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<RawEvent>();
    let cancel_token = CancellationToken::new();
    let _handle = spawn_event_poller(event_tx, PollerConfig::default(), cancel_token.clone());

    while let Some(raw_event) = event_rx.recv().await {
        let event = process_raw_event(raw_event);

        if event.key().is_some_and(is_quit) {
            break;
        }
        if matches!(event.kind, EventKind::Resize(..)) {
            up.render().await.map_err(io::Error::other)?;
            continue;
        }
        if let Some(dispatch) = bindings.handle(event) {
            dispatch.await.map_err(io::Error::other)?;
        }
    }

    cancel_token.cancel();
    Ok(())
}

fn is_quit(key: &crossterm::event::KeyEvent) -> bool {
    use crossterm::event::KeyCode;
    matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
}
