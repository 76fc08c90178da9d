//! lit-up: minimal state management for rendered user interfaces
//!
//! One model, one view, one render function. Updates are named functions
//! bound to events through the `up` dispatch factory; every dispatch
//! repaints, including before and after asynchronous work.
//!
//! # Example
//! ```ignore
//! use lit_up::prelude::*;
//!
//! #[derive(Default)]
//! struct Greeting {
//!     name: String,
//! }
//!
//! fn set_name(inv: Invocation<Greeting>) {
//!     let name = inv.data.as_str().unwrap_or_default().to_string();
//!     inv.model.update(|m| m.name = name);
//! }
//!
//! fn view(model: &Greeting, _: &Up<Greeting>) -> String {
//!     format!("Hello, {}!", model.name)
//! }
//!
//! let up = App::new(Greeting::default(), view, render).start().await?;
//! up.up(handler!(set_name), "Bob").fire().await?;
//! ```

// Re-export everything from core
pub use lit_up_core::*;

/// Prelude for convenient imports
pub mod prelude {
    // Application
    pub use lit_up_core::{App, AppConfig, ForkPolicy, Model, Trigger, Up};

    // Updates
    pub use lit_up_core::{
        handler, Chained, Data, Handler, Invocation, Registry, Step, Update, UpdateError,
    };

    // Events
    pub use lit_up_core::{
        process_raw_event, spawn_event_poller, Bindings, Event, EventController, EventKind,
        RawEvent, UpOptions,
    };

    // Rendering
    pub use lit_up_core::{render_async, render_fn, Render, RenderError, TerminalRender};

    // Logging
    pub use lit_up_core::{DispatchLog, LogEntry, LogFilter, Logger};

    // Errors
    pub use lit_up_core::DispatchError;

    // Ratatui re-exports
    pub use lit_up_core::{Line, Span, Text};
}
