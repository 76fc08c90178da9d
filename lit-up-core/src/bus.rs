//! Terminal event plumbing: the crossterm poller and key bindings

use crossterm::event::{self, KeyEvent, KeyEventKind, MouseEventKind};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::PollerConfig;
use crate::dispatch::{DispatchFuture, Trigger};
use crate::event::{Event, EventKind};
use crate::keys::{key_matches, parse_key, KeyParseError};

/// Raw event from crossterm before processing
#[derive(Debug)]
pub enum RawEvent {
    Key(KeyEvent),
    Mouse(event::MouseEvent),
    Resize(u16, u16),
}

/// Spawn the event polling task with cancellation support
///
/// Polls crossterm and forwards raw events through `tx` until the token is
/// cancelled or the receiver is dropped.
pub fn spawn_event_poller(
    tx: mpsc::UnboundedSender<RawEvent>,
    config: PollerConfig,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        const MAX_EVENTS_PER_BATCH: usize = 20;

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Event poller cancelled, draining buffer");
                    while event::poll(Duration::ZERO).unwrap_or(false) {
                        let _ = event::read();
                    }
                    break;
                }
                _ = tokio::time::sleep(config.loop_sleep) => {
                    let mut events_processed = 0;
                    while events_processed < MAX_EVENTS_PER_BATCH
                        && event::poll(config.poll_timeout).unwrap_or(false)
                    {
                        events_processed += 1;
                        let raw = match event::read() {
                            Ok(event::Event::Key(key)) => RawEvent::Key(key),
                            Ok(event::Event::Mouse(mouse)) => RawEvent::Mouse(mouse),
                            Ok(event::Event::Resize(w, h)) => RawEvent::Resize(w, h),
                            _ => continue,
                        };
                        if tx.send(raw).is_err() {
                            debug!("Event channel closed, stopping poller");
                            return;
                        }
                    }
                }
            }
        }
    })
}

/// Turn a raw terminal event into a host [`Event`].
pub fn process_raw_event(raw: RawEvent) -> Event {
    let kind = match raw {
        RawEvent::Key(key) => EventKind::Key(key),
        RawEvent::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollDown => EventKind::Scroll {
                column: mouse.column,
                row: mouse.row,
                delta: 1,
            },
            MouseEventKind::ScrollUp => EventKind::Scroll {
                column: mouse.column,
                row: mouse.row,
                delta: -1,
            },
            _ => EventKind::Mouse(mouse),
        },
        RawEvent::Resize(w, h) => EventKind::Resize(w, h),
    };
    Event::new(kind)
}

/// Key-to-trigger table, the terminal counterpart of attaching handlers to
/// UI elements.
pub struct Bindings<M> {
    keys: Vec<(KeyEvent, Trigger<M>)>,
    fallback: Option<Trigger<M>>,
}

impl<M> Default for Bindings<M> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            fallback: None,
        }
    }
}

impl<M: Send + 'static> Bindings<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a key string such as `"ctrl+s"` to a trigger.
    pub fn bind(mut self, key: &str, trigger: Trigger<M>) -> Result<Self, KeyParseError> {
        self.keys.push((parse_key(key)?, trigger));
        Ok(self)
    }

    /// Trigger for key presses no binding claims.
    pub fn otherwise(mut self, trigger: Trigger<M>) -> Self {
        self.fallback = Some(trigger);
        self
    }

    /// The trigger `event` would run, if any.
    pub fn lookup(&self, event: &Event) -> Option<&Trigger<M>> {
        let key = event.key()?;
        if key.kind == KeyEventKind::Release {
            return None;
        }
        self.keys
            .iter()
            .find(|(bound, _)| key_matches(bound, key))
            .map(|(_, trigger)| trigger)
            .or(self.fallback.as_ref())
    }

    /// Run the matching trigger with `event`.
    pub fn handle(&self, event: Event) -> Option<DispatchFuture> {
        match self.lookup(&event) {
            Some(trigger) => Some(trigger.handle(event)),
            None => {
                trace!(kind = ?event.kind, "unbound event");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use crate::testing::{key_event, MemorySurface};
    use crate::update::Invocation;
    use crate::Handler;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers, MouseEvent};

    #[test]
    fn test_process_raw_event_key() {
        let key_event = KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::empty(),
        };

        let event = process_raw_event(RawEvent::Key(key_event));
        assert!(matches!(event.kind, EventKind::Key(_)));
        assert!(event.target.id.is_none());
    }

    #[test]
    fn test_process_raw_event_scroll() {
        let scroll_down = MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 10,
            row: 20,
            modifiers: KeyModifiers::NONE,
        };

        match process_raw_event(RawEvent::Mouse(scroll_down)).kind {
            EventKind::Scroll { column, row, delta } => {
                assert_eq!((column, row, delta), (10, 20, 1));
            }
            other => panic!("Expected Scroll event, got {:?}", other),
        }
    }

    #[test]
    fn test_process_raw_event_resize() {
        let event = process_raw_event(RawEvent::Resize(80, 24));
        assert!(matches!(event.kind, EventKind::Resize(80, 24)));
    }

    #[tokio::test]
    async fn test_bindings_dispatch_matching_trigger() {
        let surface = MemorySurface::new();
        let up = App::new(0_i32, |n: &i32, _: &_| format!("{}", n), surface.render())
            .start()
            .await
            .unwrap();

        let inc = Handler::new("inc", |inv: Invocation<i32>| inv.model.update(|n| *n += 1));
        let typed = Handler::new("typed", |inv: Invocation<i32>| {
            inv.model.replace(-1);
        });
        let bindings = Bindings::new()
            .bind("+", up.dispatch(inc))
            .unwrap()
            .otherwise(up.dispatch(typed));

        bindings.handle(key_event("+")).unwrap().await.unwrap();
        assert_eq!(surface.body(), "1");

        bindings.handle(key_event("x")).unwrap().await.unwrap();
        assert_eq!(surface.body(), "-1");

        assert!(bindings.handle(Event::new(EventKind::Tick)).is_none());
        assert!(Bindings::<i32>::new().bind("hyper+q", up.dispatch("x")).is_err());
    }
}
