//! Mirror - lit-up example with input, selection and an async fetch
//!
//! - Typed characters are mirrored back as you type
//! - Tab/Shift+Tab cycles through a fixed set of options
//! - Enter fetches `--url` in the background; the screen shows "Loading"
//!   right away and the response once it arrives
//! - Ctrl+U clears text and selection in one fan-out dispatch
//!
//! Esc quits.
//!
//! ```sh
//! cargo run -p mirror-demo -- --url https://httpbin.org/uuid --log mirror.log
//! ```

use std::fs::File;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use crossterm::event::KeyCode;
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::stream::{FuturesUnordered, StreamExt};
use lit_up::prelude::*;
use lit_up::PollerConfig;
use ratatui::{backend::CrosstermBackend, Terminal};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const OPTIONS: [&str; 3] = ["Apples", "Oranges", "Pears"];

/// Mirror - lit-up example
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(about = "Mirrors input and fetches JSON, demonstrating async lit-up updates")]
struct Args {
    /// JSON endpoint fetched on Enter
    #[arg(long, short, default_value = "https://httpbin.org/uuid")]
    url: String,

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
// Model
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Fetch {
    Idle,
    Loading,
    Loaded(String),
    Failed(String),
}

#[derive(Debug)]
struct Mirror {
    text: String,
    selected: usize,
    url: String,
    fetch: Fetch,
}

impl Mirror {
    fn new(url: String) -> Self {
        Self {
            text: String::new(),
            selected: 0,
            url,
            fetch: Fetch::Idle,
        }
    }
}

// ============================================================================
// Updates
// ============================================================================

fn mirror_key(inv: Invocation<Mirror>) {
    let Some(key) = inv.event.as_ref().and_then(Event::key) else {
        return;
    };
    match key.code {
        KeyCode::Char(c) => inv.model.update(|m| m.text.push(c)),
        KeyCode::Backspace => inv.model.update(|m| {
            m.text.pop();
        }),
        _ => {}
    }
}

fn select(inv: Invocation<Mirror>) {
    let delta = inv.data.as_i64().unwrap_or(1);
    inv.model.update(|m| {
        let len = OPTIONS.len() as i64;
        m.selected = (m.selected as i64 + delta).rem_euclid(len) as usize;
    });
}

fn clear_text(inv: Invocation<Mirror>) {
    inv.model.update(|m| m.text.clear());
}

fn clear_selection(inv: Invocation<Mirror>) {
    inv.model.update(|m| m.selected = 0);
}

fn clear(_: Invocation<Mirror>) -> Step<Mirror> {
    Step::fork([handler!(clear_text), handler!(clear_selection)])
}

fn fetch(inv: Invocation<Mirror>) -> Step<Mirror> {
    let url = inv.model.update(|m| {
        m.fetch = Fetch::Loading;
        m.url.clone()
    });
    let model = inv.model.clone();
    Step::pending(async move {
        let fetched = match fetch_json(&url).await {
            Ok(body) => Fetch::Loaded(body),
            Err(err) => {
                warn!(url = %url, error = %err, "fetch failed");
                Fetch::Failed(err.to_string())
            }
        };
        model.update(|m| m.fetch = fetched);
    })
}

async fn fetch_json(url: &str) -> Result<String, reqwest::Error> {
    let body: Value = reqwest::get(url).await?.error_for_status()?.json().await?;
    Ok(body.to_string())
}

// ============================================================================
// View
// ============================================================================

fn view(model: &Mirror, _: &Up<Mirror>) -> Text<'static> {
    let options: Vec<String> = OPTIONS
        .iter()
        .enumerate()
        .map(|(i, option)| {
            if i == model.selected {
                format!("[{}]", option)
            } else {
                format!(" {} ", option)
            }
        })
        .collect();

    let fetch = match &model.fetch {
        Fetch::Idle => "Press Enter to fetch".to_string(),
        Fetch::Loading => format!("Loading {} ...", model.url),
        Fetch::Loaded(body) => body.clone(),
        Fetch::Failed(err) => format!("Error: {}", err),
    };

    Text::from(vec![
        Line::from(format!("Type something: {}", model.text)),
        Line::from(format!("You typed: {}", model.text)),
        Line::from(""),
        Line::from(format!("Pick one: {}", options.join(" "))),
        Line::from(format!("You picked: {}", OPTIONS[model.selected])),
        Line::from(""),
        Line::from(fetch),
        Line::from(""),
        Line::from("Tab/Shift+Tab: pick  Enter: fetch  Ctrl+U: clear  Esc: quit"),
    ])
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

    let result = run_app(terminal, args).await;

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)?;

    result
}

async fn run_app(terminal: Terminal<CrosstermBackend<Stdout>>, args: Args) -> io::Result<()> {
    let filter = LogFilter::new(args.log_include.as_deref(), args.log_exclude.as_deref());

    let up = App::new(Mirror::new(args.url), view, TerminalRender::new(terminal))
        .logger(args.log.is_some())
        .config(AppConfig::default().with_log_filter(filter))
        .start()
        .await
        .map_err(io::Error::other)?;

    let bindings = Bindings::new()
        .bind("tab", up.up(handler!(select), 1_i64))
        .and_then(|b| b.bind("shift+tab", up.up(handler!(select), -1_i64)))
        .and_then(|b| b.bind("enter", up.dispatch(handler!(fetch))))
        .and_then(|b| b.bind("ctrl+u", up.dispatch(handler!(clear))))
        .map_err(io::Error::other)?
        .otherwise(up.dispatch(handler!(mirror_key)));

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<RawEvent>();
    let cancel_token = CancellationToken::new();
    let _handle = spawn_event_poller(event_tx, PollerConfig::default(), cancel_token.clone());

    // Dispatches still settling, so a slow fetch never blocks typing
    let mut running = FuturesUnordered::new();

    loop {
        tokio::select! {
            Some(raw_event) = event_rx.recv() => {
                let event = process_raw_event(raw_event);
                if event.key().is_some_and(|key| key.code == KeyCode::Esc) {
                    break;
                }
                if matches!(event.kind, EventKind::Resize(..)) {
                    up.render().await.map_err(io::Error::other)?;
                    continue;
                }
                if let Some(dispatch) = bindings.handle(event) {
                    running.push(dispatch);
                }
            }

            Some(result) = running.next(), if !running.is_empty() => {
                result.map_err(io::Error::other)?;
            }

            else => break,
        }
    }

    cancel_token.cancel();
    Ok(())
}
