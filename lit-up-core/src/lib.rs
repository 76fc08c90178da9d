//! Core types for lit-up
//!
//! A single mutable model, a view that projects it, a render function that
//! paints the projection, and named update functions that mutate the model.
//! Every dispatched update repaints.
//!
//! # Core Concepts
//!
//! - **Model**: shared handle over the application's single model
//! - **Update**: named function mutating the model; returns a [`Step`]
//! - **Up**: dispatch factory binding updates to events
//! - **Registry**: updates addressable by dot-separated string keys
//! - **Logger**: hook observing every update before it runs
//!
//! # Basic Example
//!
//! ```ignore
//! use lit_up_core::prelude::*;
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: i32,
//! }
//!
//! fn inc(inv: Invocation<Counter>) {
//!     inv.model.update(|m| m.count += 1);
//! }
//!
//! fn view(model: &Counter, _: &Up<Counter>) -> String {
//!     format!("Count: {}", model.count)
//! }
//!
//! let up = App::new(Counter::default(), view, TerminalRender::new(terminal))
//!     .start()
//!     .await?;
//! up.dispatch(handler!(inc)).fire().await?;
//! ```
//!
//! # Async Updates
//!
//! An update that has more work to do returns [`Step::Pending`]. The model
//! is painted as it stands while the pending work runs, and again once it
//! settles:
//!
//! ```ignore
//! fn load(inv: Invocation<Weather>) -> Step<Weather> {
//!     inv.model.update(|m| m.loading = true);
//!     let model = inv.model.clone();
//!     Step::pending(async move {
//!         let report = fetch_report().await?;
//!         model.update(|m| {
//!             m.loading = false;
//!             m.report = Some(report);
//!         });
//!         Ok::<_, UpdateError>(())
//!     })
//! }
//! ```

pub mod app;
pub mod bus;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod keys;
pub mod logger;
pub mod model;
pub mod registry;
pub mod render;
pub mod testing;
pub mod update;

// Core exports
pub use app::App;
pub use config::{AppConfig, ForkPolicy, PollerConfig};
pub use dispatch::{DispatchFuture, EventHandler, Trigger, Up};
pub use error::{DispatchError, RenderError, UpdateError};
pub use model::Model;
pub use update::{Chained, Data, Handler, Invocation, IntoStep, Step, Update, UpdateResult};

// Event system exports
pub use bus::{process_raw_event, spawn_event_poller, Bindings, RawEvent};
pub use event::{
    apply_event_policy, Event, EventController, EventFlags, EventKind, HostEvent, Target,
    UpOptions,
};
pub use keys::{format_key, key_matches, parse_key, KeyParseError};

// Registry exports
pub use registry::{Entry, Lookup, Registry, BOOTSTRAP_KEY};

// Render exports
pub use render::{
    default_view, render_async, render_fn, AsyncRender, FnRender, Render, RenderFuture,
    TerminalRender, NO_VIEW,
};

// Logging exports
pub use logger::{glob_match, DispatchLog, LogEntry, LogFilter, LogRecord, Logger, Phase};

// Re-export ratatui types for convenience
pub use ratatui::text::{Line, Span, Text};

// Testing exports
pub use testing::{
    buffer_to_string_plain, char_key, key, key_event, wait, MemorySurface, SurfaceRender,
    TestEvent,
};

#[cfg(feature = "testing-time")]
pub use testing::{advance_time, pause_time, resume_time};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::app::App;
    pub use crate::bus::{process_raw_event, spawn_event_poller, Bindings, RawEvent};
    pub use crate::config::{AppConfig, ForkPolicy, PollerConfig};
    pub use crate::dispatch::{Trigger, Up};
    pub use crate::error::{DispatchError, RenderError, UpdateError};
    pub use crate::event::{Event, EventController, EventKind, UpOptions};
    pub use crate::handler;
    pub use crate::logger::{DispatchLog, LogEntry, LogFilter, Logger};
    pub use crate::model::Model;
    pub use crate::registry::{Lookup, Registry};
    pub use crate::render::{render_async, render_fn, Render, TerminalRender};
    pub use crate::update::{Chained, Data, Handler, Invocation, Step, Update};

    // Re-export ratatui types
    pub use ratatui::text::{Line, Span, Text};
}
