//! Host events and the suppression policy applied before dispatch

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use bitflags::bitflags;
use crossterm::event::{KeyEvent, MouseEvent};
use serde::{Deserialize, Serialize};

/// Capability the dispatch core needs from a host event.
///
/// Methods take `&self`: one event is shared by every frame of a chain, so
/// implementations record suppression through interior mutability.
pub trait EventController: Send + Sync + 'static {
    /// Prevent the host's default action for this event.
    fn suppress_default(&self);

    /// Stop the event from reaching containing structures.
    fn suppress_propagation(&self);
}

/// Bound for event types accepted by the dispatcher.
pub trait HostEvent: EventController + Clone + fmt::Debug {}

impl<T: EventController + Clone + fmt::Debug> HostEvent for T {}

/// Per-dispatch event handling options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpOptions {
    /// Let the host run its default action for the event.
    pub do_default: bool,
    /// Let the event propagate to containing structures.
    pub propagate: bool,
}

impl UpOptions {
    /// Options that keep both the default action and propagation.
    pub fn passthrough() -> Self {
        Self {
            do_default: true,
            propagate: true,
        }
    }
}

/// Apply the suppression policy to the triggering event, if there is one.
pub fn apply_event_policy<E: EventController>(event: Option<&E>, options: UpOptions) {
    let Some(event) = event else {
        return;
    };
    if !options.do_default {
        event.suppress_default();
    }
    if !options.propagate {
        event.suppress_propagation();
    }
}

bitflags! {
    /// Suppression state recorded on an [`Event`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventFlags: u8 {
        const DEFAULT_PREVENTED = 1 << 0;
        const PROPAGATION_STOPPED = 1 << 1;
    }
}

/// The event payload
#[derive(Debug, Clone)]
pub enum EventKind {
    /// Keyboard event
    Key(KeyEvent),
    /// Mouse click/drag events
    Mouse(MouseEvent),
    /// Scroll event with position and delta
    Scroll { column: u16, row: u16, delta: isize },
    /// Terminal resize
    Resize(u16, u16),
    /// Periodic tick
    Tick,
    /// Value of an input element changed
    Input,
    /// An element was activated
    Click,
}

/// Element an event originated from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: Option<String>,
    pub value: Option<String>,
}

/// Host event delivered to updates.
///
/// Clones share suppression state.
#[derive(Clone)]
pub struct Event {
    pub kind: EventKind,
    pub target: Target,
    flags: Arc<AtomicU8>,
}

impl Event {
    /// Create an event with an empty target
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            target: Target::default(),
            flags: Arc::new(AtomicU8::new(0)),
        }
    }

    /// An input event carrying the element's new value
    pub fn input(value: impl Into<String>) -> Self {
        Self::new(EventKind::Input).with_value(value)
    }

    /// A click on the element with the given id
    pub fn click(id: impl Into<String>) -> Self {
        Self::new(EventKind::Click).with_id(id)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.target.id = Some(id.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.target.value = Some(value.into());
        self
    }

    /// The target element's value, if any
    pub fn value(&self) -> Option<&str> {
        self.target.value.as_deref()
    }

    /// Key event payload, if this is a key event
    pub fn key(&self) -> Option<&KeyEvent> {
        match &self.kind {
            EventKind::Key(key) => Some(key),
            _ => None,
        }
    }

    pub fn flags(&self) -> EventFlags {
        EventFlags::from_bits_truncate(self.flags.load(Ordering::SeqCst))
    }

    pub fn default_prevented(&self) -> bool {
        self.flags().contains(EventFlags::DEFAULT_PREVENTED)
    }

    pub fn propagation_stopped(&self) -> bool {
        self.flags().contains(EventFlags::PROPAGATION_STOPPED)
    }

    fn set(&self, flag: EventFlags) {
        self.flags.fetch_or(flag.bits(), Ordering::SeqCst);
    }
}

impl EventController for Event {
    fn suppress_default(&self) {
        self.set(EventFlags::DEFAULT_PREVENTED);
    }

    fn suppress_propagation(&self) {
        self.set(EventFlags::PROPAGATION_STOPPED);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("flags", &self.flags())
            .finish()
    }
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        Self::new(kind)
    }
}

impl From<KeyEvent> for Event {
    fn from(key: KeyEvent) -> Self {
        Self::new(EventKind::Key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_suppresses_by_default() {
        let event = Event::click("save");
        apply_event_policy(Some(&event), UpOptions::default());

        assert!(event.default_prevented());
        assert!(event.propagation_stopped());
    }

    #[test]
    fn test_policy_respects_options() {
        let event = Event::input("x");
        apply_event_policy(
            Some(&event),
            UpOptions {
                do_default: true,
                propagate: false,
            },
        );
        assert!(!event.default_prevented());
        assert!(event.propagation_stopped());

        let event = Event::input("x");
        apply_event_policy(Some(&event), UpOptions::passthrough());
        assert_eq!(event.flags(), EventFlags::empty());
    }

    #[test]
    fn test_policy_without_event_is_noop() {
        apply_event_policy::<Event>(None, UpOptions::default());
    }

    #[test]
    fn test_clones_share_flags() {
        let event = Event::input("Bob");
        let copy = event.clone();
        copy.suppress_default();

        assert!(event.default_prevented());
        assert_eq!(event.value(), Some("Bob"));
    }

    #[test]
    fn test_key_event_conversion() {
        use crossterm::event::{KeyCode, KeyModifiers};

        let event = Event::from(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE));
        assert_eq!(event.key().map(|k| k.code), Some(KeyCode::Char('k')));
        assert_eq!(event.value(), None);
    }
}
