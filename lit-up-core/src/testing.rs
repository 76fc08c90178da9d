//! Test utilities for lit-up applications
//!
//! - [`MemorySurface`]: render target that keeps what was painted
//! - [`TestEvent`]: minimal host event recording suppression calls
//! - [`key`] / [`key_event`]: key events from strings such as `"ctrl+p"`
//! - [`wait`]: sleep helper for async updates
//! - [`buffer_to_string_plain`]: ratatui buffer contents as text
//!
//! Pair these with [`DispatchLog`](crate::logger::DispatchLog) to assert on
//! log entries.
//!
//! # Example
//!
//! ```ignore
//! use lit_up::testing::MemorySurface;
//!
//! let surface = MemorySurface::new();
//! let up = App::new(model, view, surface.render()).start().await?;
//! up.up(handler!(set_name), "Bob").fire().await?;
//! assert_eq!(surface.body(), "Hello, Bob!");
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use futures::future;
use futures::FutureExt;
use ratatui::buffer::Buffer;

use crate::error::RenderError;
use crate::event::{Event, EventController};
use crate::keys::parse_key;
use crate::render::{Render, RenderFuture};

/// Create a `KeyEvent` from a key string.
///
/// # Panics
///
/// Panics if the key string cannot be parsed.
pub fn key(s: &str) -> KeyEvent {
    parse_key(s).unwrap_or_else(|err| panic!("Invalid key string: {}", err))
}

/// Create a `KeyEvent` for a character with no modifiers.
pub fn char_key(c: char) -> KeyEvent {
    KeyEvent {
        code: KeyCode::Char(c),
        modifiers: KeyModifiers::empty(),
        kind: KeyEventKind::Press,
        state: KeyEventState::empty(),
    }
}

/// Create a host [`Event`] for a key string.
pub fn key_event(s: &str) -> Event {
    Event::from(key(s))
}

/// Sleep for `ms` milliseconds.
pub async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Buffer contents as plain text, one line per row with trailing blanks
/// trimmed.
pub fn buffer_to_string_plain(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut lines = Vec::with_capacity(area.height as usize);
    for y in area.top()..area.bottom() {
        let mut line = String::new();
        for x in area.left()..area.right() {
            line.push_str(buffer[(x, y)].symbol());
        }
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

#[derive(Debug, Default)]
struct Painted {
    history: Vec<String>,
}

/// In-memory render target.
///
/// Cheap to clone; clones share the painted history.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    painted: Arc<Mutex<Painted>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Painted> {
        self.painted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Render function painting into this surface.
    pub fn render(&self) -> SurfaceRender {
        SurfaceRender {
            surface: self.clone(),
            delay: None,
        }
    }

    /// Render function that takes `ms` milliseconds to finish each paint.
    pub fn render_slow(&self, ms: u64) -> SurfaceRender {
        SurfaceRender {
            surface: self.clone(),
            delay: Some(Duration::from_millis(ms)),
        }
    }

    /// Most recently painted text, empty before the first paint.
    pub fn body(&self) -> String {
        self.lock().history.last().cloned().unwrap_or_default()
    }

    /// Every painted text, oldest first
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    pub fn paint_count(&self) -> usize {
        self.lock().history.len()
    }

    fn paint(&self, text: String) {
        self.lock().history.push(text);
    }
}

/// [`Render`] for a [`MemorySurface`].
#[derive(Debug, Clone)]
pub struct SurfaceRender {
    surface: MemorySurface,
    delay: Option<Duration>,
}

impl<V: Into<String>> Render<V> for SurfaceRender {
    fn render(&self, view: V) -> RenderFuture {
        let text = view.into();
        match self.delay {
            None => {
                self.surface.paint(text);
                future::ok(()).boxed()
            }
            Some(delay) => {
                let surface = self.surface.clone();
                async move {
                    tokio::time::sleep(delay).await;
                    surface.paint(text);
                    Ok::<(), RenderError>(())
                }
                .boxed()
            }
        }
    }
}

/// Minimal host event for tests.
///
/// Clones share suppression state.
#[derive(Debug, Clone, Default)]
pub struct TestEvent {
    pub value: Option<String>,
    default_suppressed: Arc<AtomicBool>,
    propagation_suppressed: Arc<AtomicBool>,
}

impl TestEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// An event whose target carries `value`.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn default_suppressed(&self) -> bool {
        self.default_suppressed.load(Ordering::SeqCst)
    }

    pub fn propagation_suppressed(&self) -> bool {
        self.propagation_suppressed.load(Ordering::SeqCst)
    }
}

impl EventController for TestEvent {
    fn suppress_default(&self) {
        self.default_suppressed.store(true, Ordering::SeqCst);
    }

    fn suppress_propagation(&self) {
        self.propagation_suppressed.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// Time control (requires "testing-time" feature)
// ============================================================================

/// Pause tokio time; sleeps then complete only when time is advanced.
#[cfg(feature = "testing-time")]
pub fn pause_time() {
    tokio::time::pause();
}

#[cfg(feature = "testing-time")]
pub fn resume_time() {
    tokio::time::resume();
}

/// Advance paused time by `ms` milliseconds.
#[cfg(feature = "testing-time")]
pub async fn advance_time(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::layout::Rect;
    use ratatui::style::Style;

    #[test]
    fn test_key_helpers() {
        assert_eq!(key("ctrl+p").modifiers, KeyModifiers::CONTROL);
        assert_eq!(char_key('x').code, KeyCode::Char('x'));
        assert!(key_event("esc").key().is_some());
    }

    #[test]
    #[should_panic(expected = "Invalid key string")]
    fn test_key_panics_on_garbage() {
        key("not-a-key");
    }

    #[test]
    fn test_buffer_to_string_plain() {
        let mut buffer = Buffer::empty(Rect::new(0, 0, 8, 2));
        buffer.set_string(0, 0, "Hi", Style::default());
        buffer.set_string(2, 1, "there", Style::default());

        assert_eq!(buffer_to_string_plain(&buffer), "Hi\n  there");
    }

    #[tokio::test]
    async fn test_memory_surface_keeps_history() {
        let surface = MemorySurface::new();
        let render = surface.render();
        assert_eq!(surface.body(), "");

        Render::<&str>::render(&render, "one").await.unwrap();
        Render::<String>::render(&render, "two".to_string()).await.unwrap();

        assert_eq!(surface.body(), "two");
        assert_eq!(surface.history(), vec!["one", "two"]);
        assert_eq!(surface.paint_count(), 2);
    }

    #[tokio::test]
    async fn test_slow_render_paints_after_delay() {
        let surface = MemorySurface::new();
        let pending = Render::<&str>::render(&surface.render_slow(10), "late");
        assert_eq!(surface.paint_count(), 0);

        pending.await.unwrap();
        assert_eq!(surface.body(), "late");
    }

    #[test]
    fn test_event_records_suppression() {
        let event = TestEvent::with_value("Tim");
        let clone = event.clone();
        clone.suppress_default();

        assert!(event.default_suppressed());
        assert!(!event.propagation_suppressed());
        assert_eq!(event.value.as_deref(), Some("Tim"));
    }
}
