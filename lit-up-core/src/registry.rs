//! Named collection of updates addressable by dot-separated paths
//!
//! ```
//! use lit_up_core::{Handler, Lookup, Registry};
//!
//! let registry: Registry<i32> = Registry::new()
//!     .with("inc", Handler::new("inc", |inv: lit_up_core::Invocation<i32>| {
//!         inv.model.update(|n| *n += 1)
//!     }))
//!     .with("todos.clear", Handler::noop("clear"));
//!
//! assert!(matches!(registry.resolve("todos.clear"), Lookup::Found(_)));
//! assert!(matches!(registry.resolve("todos"), Lookup::NotCallable));
//! assert!(matches!(registry.resolve("todos.add"), Lookup::Missing));
//! ```

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::event::Event;
use crate::update::Handler;

/// Name of the entry run at startup when no explicit bootstrap is given.
pub const BOOTSTRAP_KEY: &str = "bootstrap";

/// A registry slot.
pub enum Entry<M, E = Event> {
    Handler(Handler<M, E>),
    Namespace(Registry<M, E>),
    /// Plain data kept alongside the updates.
    Value(Value),
}

impl<M, E> fmt::Debug for Entry<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Handler(handler) => handler.fmt(f),
            Entry::Namespace(registry) => registry.fmt(f),
            Entry::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// Outcome of resolving a path.
#[derive(Debug)]
pub enum Lookup<M, E = Event> {
    Found(Handler<M, E>),
    /// The path exists but names a namespace or a value.
    NotCallable,
    Missing,
}

impl<M, E> Lookup<M, E> {
    pub fn handler(self) -> Option<Handler<M, E>> {
        match self {
            Lookup::Found(handler) => Some(handler),
            Lookup::NotCallable | Lookup::Missing => None,
        }
    }
}

/// Nested map from names to updates.
pub struct Registry<M, E = Event> {
    entries: HashMap<String, Entry<M, E>>,
}

impl<M, E> Default for Registry<M, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, E> fmt::Debug for Registry<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<M, E> Registry<M, E> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Insert a handler at `path`, creating intermediate namespaces.
    ///
    /// A value or handler sitting where a namespace is needed is replaced.
    pub fn insert(&mut self, path: &str, handler: Handler<M, E>) -> &mut Self {
        self.insert_entry(path, Entry::Handler(handler))
    }

    /// Insert plain data at `path`.
    pub fn insert_value(&mut self, path: &str, value: Value) -> &mut Self {
        self.insert_entry(path, Entry::Value(value))
    }

    /// Mount a whole registry under `name`.
    pub fn mount(&mut self, name: &str, registry: Registry<M, E>) -> &mut Self {
        self.insert_entry(name, Entry::Namespace(registry))
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, path: &str, handler: Handler<M, E>) -> Self {
        self.insert(path, handler);
        self
    }

    /// Builder form of [`mount`](Self::mount).
    pub fn nest(mut self, name: &str, registry: Registry<M, E>) -> Self {
        self.mount(name, registry);
        self
    }

    fn insert_entry(&mut self, path: &str, entry: Entry<M, E>) -> &mut Self {
        match path.split_once('.') {
            None => {
                self.entries.insert(path.to_string(), entry);
            }
            Some((head, rest)) => {
                let slot = self
                    .entries
                    .entry(head.to_string())
                    .or_insert_with(|| Entry::Namespace(Registry::new()));
                if !matches!(slot, Entry::Namespace(_)) {
                    *slot = Entry::Namespace(Registry::new());
                }
                if let Entry::Namespace(inner) = slot {
                    inner.insert_entry(rest, entry);
                }
            }
        }
        self
    }

    /// Walk `path` one segment at a time.
    pub fn get(&self, path: &str) -> Option<&Entry<M, E>> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut entry = self.entries.get(first)?;
        for segment in segments {
            match entry {
                Entry::Namespace(inner) => entry = inner.entries.get(segment)?,
                Entry::Handler(_) | Entry::Value(_) => return None,
            }
        }
        Some(entry)
    }

    /// Resolve `path` to a callable update.
    pub fn resolve(&self, path: &str) -> Lookup<M, E> {
        match self.get(path) {
            Some(Entry::Handler(handler)) => Lookup::Found(handler.clone()),
            Some(Entry::Namespace(_)) | Some(Entry::Value(_)) => Lookup::NotCallable,
            None => Lookup::Missing,
        }
    }

    /// Plain data stored at `path`.
    pub fn value(&self, path: &str) -> Option<&Value> {
        match self.get(path) {
            Some(Entry::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// The `bootstrap` entry, if it is callable.
    pub fn bootstrap(&self) -> Option<Handler<M, E>> {
        self.resolve(BOOTSTRAP_KEY).handler()
    }

    /// Top-level names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
