//! Structured logging of dispatched frames
//!
//! Every frame produces a [`LogEntry`] just before its update runs. A frame
//! whose update finished asynchronously produces a second entry, with a
//! fresh timestamp, once the pending result settles.
//!
//! # Example
//!
//! ```ignore
//! use lit_up::{App, DispatchLog, Logger};
//!
//! // Debug events through `tracing`
//! let app = App::new(model, view, render).logger(true);
//!
//! // Keep the last 50 records in memory
//! let log = DispatchLog::new(50);
//! let app = App::new(model, view, render).logger(log.clone());
//! for record in log.recent(10) {
//!     println!("{} {}", record.name, record.data);
//! }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::Event;
use crate::model::Model;
use crate::update::{Data, Handler};

/// Which of a frame's entries this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Taken immediately before the update runs
    Before,
    /// Taken after an asynchronous update settled
    Settled,
}

/// Snapshot of one frame handed to the logger.
pub struct LogEntry<M, E = Event> {
    pub name: String,
    pub update: Handler<M, E>,
    pub data: Data<M, E>,
    pub event: Option<E>,
    pub model: Model<M>,
    pub time: SystemTime,
    pub chained: bool,
    pub phase: Phase,
}

impl<M, E> LogEntry<M, E> {
    /// Milliseconds since the Unix epoch
    pub fn time_ms(&self) -> u64 {
        millis_since_epoch(self.time)
    }

    /// Same entry with a fresh timestamp, marked as settled.
    pub fn settled(&self) -> Self
    where
        E: Clone,
    {
        Self {
            time: SystemTime::now(),
            phase: Phase::Settled,
            ..self.clone()
        }
    }
}

impl<M, E: Clone> Clone for LogEntry<M, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            update: self.update.clone(),
            data: self.data.clone(),
            event: self.event.clone(),
            model: self.model.clone(),
            time: self.time,
            chained: self.chained,
            phase: self.phase,
        }
    }
}

impl<M, E: fmt::Debug> fmt::Debug for LogEntry<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogEntry")
            .field("name", &self.name)
            .field("data", &self.data)
            .field("event", &self.event)
            .field("time_ms", &self.time_ms())
            .field("chained", &self.chained)
            .field("phase", &self.phase)
            .finish()
    }
}

fn millis_since_epoch(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

type LogFn<M, E> = dyn Fn(&LogEntry<M, E>) + Send + Sync;

/// Where log entries go.
pub enum Logger<M, E = Event> {
    Off,
    /// One `tracing::debug!` event per entry
    Tracing,
    Custom(Arc<LogFn<M, E>>),
}

impl<M, E> Logger<M, E> {
    pub fn custom(f: impl Fn(&LogEntry<M, E>) + Send + Sync + 'static) -> Self
    where
        M: 'static,
        E: 'static,
    {
        Logger::Custom(Arc::new(f))
    }

    pub fn is_off(&self) -> bool {
        matches!(self, Logger::Off)
    }

    pub fn log(&self, entry: &LogEntry<M, E>) {
        match self {
            Logger::Off => {}
            Logger::Tracing => {
                tracing::debug!(
                    update = %entry.name,
                    data = ?entry.data,
                    chained = entry.chained,
                    phase = ?entry.phase,
                    time_ms = entry.time_ms(),
                    "lit-up dispatch"
                );
            }
            Logger::Custom(f) => f(entry),
        }
    }
}

impl<M, E> Default for Logger<M, E> {
    fn default() -> Self {
        Logger::Off
    }
}

impl<M, E> Clone for Logger<M, E> {
    fn clone(&self) -> Self {
        match self {
            Logger::Off => Logger::Off,
            Logger::Tracing => Logger::Tracing,
            Logger::Custom(f) => Logger::Custom(Arc::clone(f)),
        }
    }
}

impl<M, E> fmt::Debug for Logger<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logger::Off => f.write_str("Off"),
            Logger::Tracing => f.write_str("Tracing"),
            Logger::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl<M, E> From<bool> for Logger<M, E> {
    fn from(enabled: bool) -> Self {
        if enabled {
            Logger::Tracing
        } else {
            Logger::Off
        }
    }
}

impl<M: 'static, E: 'static> From<DispatchLog> for Logger<M, E> {
    fn from(log: DispatchLog) -> Self {
        Logger::custom(move |entry| log.record(entry))
    }
}

/// Include/exclude filter over update names.
///
/// Patterns support:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
/// - Literal text matches exactly
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    /// If non-empty, only log updates matching these patterns
    pub include_patterns: Vec<String>,
    /// Exclude updates matching these patterns (applied after include)
    pub exclude_patterns: Vec<String>,
}

impl LogFilter {
    /// Create a filter from comma-separated pattern strings
    ///
    /// # Example
    /// ```
    /// use lit_up_core::LogFilter;
    ///
    /// let filter = LogFilter::new(Some("todos.*,select"), Some("*.tick"));
    /// assert!(filter.should_log("todos.add"));
    /// assert!(filter.should_log("select"));
    /// assert!(!filter.should_log("todos.tick"));
    /// assert!(!filter.should_log("inc"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include_patterns: split_patterns(include),
            exclude_patterns: split_patterns(exclude),
        }
    }

    /// Check if an update name passes the include/exclude patterns
    pub fn should_log(&self, name: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self.include_patterns.iter().any(|p| glob_match(p, name))
        {
            return false;
        }
        !self.exclude_patterns.iter().any(|p| glob_match(p, name))
    }
}

fn split_patterns(patterns: Option<&str>) -> Vec<String> {
    patterns
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Match an update name against a pattern where `*` spans any run of
/// characters (dots included) and `?` stands for exactly one.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    match_from(&pattern, &name)
}

fn match_from(pattern: &[char], name: &[char]) -> bool {
    match pattern.split_first() {
        None => name.is_empty(),
        Some((&'*', rest)) => (0..=name.len()).any(|skip| match_from(rest, &name[skip..])),
        Some((&expected, rest)) => match name.split_first() {
            Some((&c, tail)) if expected == '?' || expected == c => match_from(rest, tail),
            _ => false,
        },
    }
}

// ============================================================================
// In-Memory Dispatch Log
// ============================================================================

/// Serializable summary of a [`LogEntry`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Sequence number for ordering
    pub sequence: u64,
    pub name: String,
    pub data: Value,
    pub chained: bool,
    pub phase: Phase,
    pub time_ms: u64,
}

#[derive(Debug)]
struct Ring {
    records: VecDeque<LogRecord>,
    capacity: usize,
    next_sequence: u64,
}

/// Bounded in-memory log of recent frames.
///
/// Clones share the same buffer, so one clone can be handed to the app as
/// its logger while another is kept for inspection. Older records are
/// discarded when capacity is reached.
#[derive(Debug, Clone)]
pub struct DispatchLog {
    ring: Arc<Mutex<Ring>>,
}

impl Default for DispatchLog {
    fn default() -> Self {
        Self::new(100)
    }
}

impl DispatchLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Arc::new(Mutex::new(Ring {
                records: VecDeque::with_capacity(capacity),
                capacity,
                next_sequence: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ring> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record for `entry`.
    pub fn record<M, E>(&self, entry: &LogEntry<M, E>) {
        let mut ring = self.lock();
        if ring.capacity == 0 {
            return;
        }
        let record = LogRecord {
            sequence: ring.next_sequence,
            name: entry.name.clone(),
            data: entry.data.to_log_value(),
            chained: entry.chained,
            phase: entry.phase,
            time_ms: entry.time_ms(),
        };
        ring.next_sequence += 1;

        if ring.records.len() >= ring.capacity {
            ring.records.pop_front();
        }
        ring.records.push_back(record);
    }

    /// All records, oldest first
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().records.iter().cloned().collect()
    }

    /// The most recent N records, newest first
    pub fn recent(&self, count: usize) -> Vec<LogRecord> {
        self.lock().records.iter().rev().take(count).cloned().collect()
    }

    /// Record names, oldest first
    pub fn names(&self) -> Vec<String> {
        self.lock().records.iter().map(|r| r.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    pub fn clear(&self) {
        self.lock().records.clear();
    }
}
