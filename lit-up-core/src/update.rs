//! Updates, their invocation context and their results
//!
//! An update is a named function that mutates the model. What it returns
//! decides what happens next:
//!
//! - [`Step::Done`]: the chain ends (returning `()` means the same)
//! - [`Step::Next`]: run another update with the same data and event
//! - [`Step::NextWith`]: run another update with substituted data/event
//! - [`Step::Fork`]: run several continuations concurrently
//! - [`Step::Pending`]: the rest of the work is asynchronous
//!
//! # Example
//!
//! ```
//! use lit_up_core::{handler, Invocation, Step};
//!
//! #[derive(Default)]
//! struct Counter { count: i32 }
//!
//! fn inc(inv: Invocation<Counter>) {
//!     inv.model.update(|m| m.count += 1);
//! }
//!
//! fn inc_twice(_: Invocation<Counter>) -> Step<Counter> {
//!     Step::fork([handler!(inc), handler!(inc)])
//! }
//!
//! let update = handler!(inc_twice);
//! assert_eq!(update.name(), "inc_twice");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use crate::dispatch::Up;
use crate::error::UpdateError;
use crate::event::{Event, HostEvent};
use crate::model::Model;
use crate::registry::Registry;

/// What an update returns.
pub type UpdateResult<M, E = Event> = Result<Step<M, E>, UpdateError>;

type UpdateFn<M, E> = dyn Fn(Invocation<M, E>) -> UpdateResult<M, E> + Send + Sync;

/// Build a [`Handler`] named after a function.
///
/// ```ignore
/// let update = handler!(set_name);
/// assert_eq!(update.name(), "set_name");
/// ```
#[macro_export]
macro_rules! handler {
    ($f:ident) => {
        $crate::Handler::new(stringify!($f), $f)
    };
}

/// Named update function.
pub struct Handler<M, E = Event> {
    name: Cow<'static, str>,
    f: Arc<UpdateFn<M, E>>,
}

impl<M, E> Clone for Handler<M, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            f: Arc::clone(&self.f),
        }
    }
}

impl<M, E> Handler<M, E>
where
    M: Send + 'static,
    E: HostEvent,
{
    /// Wrap a function. The return value may be `()`, a [`Step`], another
    /// handler, or a `Result` of any of those.
    pub fn new<F, R>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Invocation<M, E>) -> R + Send + Sync + 'static,
        R: IntoStep<M, E>,
    {
        Self {
            name: name.into(),
            f: Arc::new(move |inv| f(inv).into_step()),
        }
    }

    /// Wrap an async function. Its whole body runs as the pending part of
    /// the frame; mutate the model before returning [`Step::pending`] from a
    /// plain handler if the change must paint before the first await.
    pub fn from_async<F, Fut, R>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Invocation<M, E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoStep<M, E> + 'static,
    {
        Self::new(name, move |inv| Step::pending(f(inv)))
    }

    /// A handler that does nothing.
    pub fn noop(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, |_| ())
    }
}

impl<M, E> Handler<M, E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the function.
    pub fn call(&self, inv: Invocation<M, E>) -> UpdateResult<M, E> {
        (self.f)(inv)
    }

    /// Whether both handles wrap the same function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

impl<M, E> fmt::Debug for Handler<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.name).finish()
    }
}

/// An update given either directly or as a registry path.
pub enum Update<M, E = Event> {
    Fn(Handler<M, E>),
    Key(String),
}

impl<M, E> Update<M, E> {
    /// Handler name or registry path.
    pub fn name(&self) -> &str {
        match self {
            Update::Fn(handler) => handler.name(),
            Update::Key(key) => key,
        }
    }
}

impl<M, E> Clone for Update<M, E> {
    fn clone(&self) -> Self {
        match self {
            Update::Fn(handler) => Update::Fn(handler.clone()),
            Update::Key(key) => Update::Key(key.clone()),
        }
    }
}

impl<M, E> fmt::Debug for Update<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Fn(handler) => handler.fmt(f),
            Update::Key(key) => f.debug_tuple("Key").field(key).finish(),
        }
    }
}

impl<M, E> From<Handler<M, E>> for Update<M, E> {
    fn from(handler: Handler<M, E>) -> Self {
        Update::Fn(handler)
    }
}

impl<M, E> From<&str> for Update<M, E> {
    fn from(key: &str) -> Self {
        Update::Key(key.to_string())
    }
}

impl<M, E> From<String> for Update<M, E> {
    fn from(key: String) -> Self {
        Update::Key(key)
    }
}

/// Data attached to a dispatch.
pub enum Data<M, E = Event> {
    Value(Value),
    /// The dispatch factory itself, handed to the bootstrap update.
    Up(Up<M, E>),
}

impl<M, E> Data<M, E> {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Data::Value(value) => Some(value),
            Data::Up(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    pub fn as_up(&self) -> Option<&Up<M, E>> {
        match self {
            Data::Up(up) => Some(up),
            Data::Value(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Data::Value(Value::Null))
    }

    /// JSON form used in log records.
    pub fn to_log_value(&self) -> Value {
        match self {
            Data::Value(value) => value.clone(),
            Data::Up(_) => Value::String("up".into()),
        }
    }
}

impl<M, E> Default for Data<M, E> {
    fn default() -> Self {
        Data::Value(Value::Null)
    }
}

impl<M, E> Clone for Data<M, E> {
    fn clone(&self) -> Self {
        match self {
            Data::Value(value) => Data::Value(value.clone()),
            Data::Up(up) => Data::Up(up.clone()),
        }
    }
}

impl<M, E> fmt::Debug for Data<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Data::Value(value) => write!(f, "{}", value),
            Data::Up(_) => f.write_str("up"),
        }
    }
}

impl<M, E> From<Value> for Data<M, E> {
    fn from(value: Value) -> Self {
        Data::Value(value)
    }
}

impl<M, E> From<&str> for Data<M, E> {
    fn from(value: &str) -> Self {
        Data::Value(Value::String(value.to_string()))
    }
}

impl<M, E> From<String> for Data<M, E> {
    fn from(value: String) -> Self {
        Data::Value(Value::String(value))
    }
}

impl<M, E> From<i64> for Data<M, E> {
    fn from(value: i64) -> Self {
        Data::Value(Value::from(value))
    }
}

impl<M, E> From<bool> for Data<M, E> {
    fn from(value: bool) -> Self {
        Data::Value(Value::Bool(value))
    }
}

impl<M, E> From<Up<M, E>> for Data<M, E> {
    fn from(up: Up<M, E>) -> Self {
        Data::Up(up)
    }
}

/// Everything an update receives when it runs.
pub struct Invocation<M, E = Event> {
    pub model: Model<M>,
    pub data: Data<M, E>,
    pub event: Option<E>,
    /// Dispatch factory for programmatic dispatch.
    pub up: Up<M, E>,
    /// Registry the update was resolved from, when given by key.
    pub registry: Option<Arc<Registry<M, E>>>,
    pub chained: bool,
}

/// A continuation with optional data/event overrides.
///
/// Overrides left as `None` inherit the parent frame's values.
pub struct Chained<M, E = Event> {
    pub update: Update<M, E>,
    pub data: Option<Data<M, E>>,
    pub event: Option<E>,
}

impl<M, E> Chained<M, E> {
    pub fn new(update: impl Into<Update<M, E>>) -> Self {
        Self {
            update: update.into(),
            data: None,
            event: None,
        }
    }

    pub fn data(mut self, data: impl Into<Data<M, E>>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn event(mut self, event: E) -> Self {
        self.event = Some(event);
        self
    }
}

/// Result of running an update.
pub enum Step<M, E = Event> {
    Done,
    Next(Update<M, E>),
    NextWith(Chained<M, E>),
    Fork(Vec<Step<M, E>>),
    Pending(BoxFuture<'static, UpdateResult<M, E>>),
}

impl<M, E> Step<M, E>
where
    M: Send + 'static,
    E: HostEvent,
{
    /// Continue with another update.
    pub fn next(update: impl Into<Update<M, E>>) -> Self {
        Step::Next(update.into())
    }

    /// Continue with another update and substituted data.
    pub fn next_with(update: impl Into<Update<M, E>>, data: impl Into<Data<M, E>>) -> Self {
        Step::NextWith(Chained::new(update).data(data))
    }

    /// Continue with several updates at once.
    pub fn fork<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Step<M, E>>,
    {
        Step::Fork(steps.into_iter().map(Into::into).collect())
    }

    /// Finish asynchronously.
    pub fn pending<Fut, R>(future: Fut) -> Self
    where
        Fut: Future<Output = R> + Send + 'static,
        R: IntoStep<M, E> + 'static,
    {
        Step::Pending(future.map(IntoStep::into_step).boxed())
    }
}

impl<M, E> Step<M, E> {
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done)
    }
}

impl<M, E> fmt::Debug for Step<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Done => f.write_str("Done"),
            Step::Next(update) => f.debug_tuple("Next").field(update).finish(),
            Step::NextWith(chained) => f
                .debug_struct("NextWith")
                .field("update", &chained.update)
                .field("data", &chained.data)
                .finish(),
            Step::Fork(steps) => f.debug_tuple("Fork").field(steps).finish(),
            Step::Pending(_) => f.write_str("Pending"),
        }
    }
}

impl<M, E> From<()> for Step<M, E> {
    fn from(_: ()) -> Self {
        Step::Done
    }
}

impl<M, E> From<Update<M, E>> for Step<M, E> {
    fn from(update: Update<M, E>) -> Self {
        Step::Next(update)
    }
}

impl<M, E> From<Handler<M, E>> for Step<M, E> {
    fn from(handler: Handler<M, E>) -> Self {
        Step::Next(Update::Fn(handler))
    }
}

impl<M, E> From<Chained<M, E>> for Step<M, E> {
    fn from(chained: Chained<M, E>) -> Self {
        Step::NextWith(chained)
    }
}

impl<M, E> From<Vec<Step<M, E>>> for Step<M, E> {
    fn from(steps: Vec<Step<M, E>>) -> Self {
        Step::Fork(steps)
    }
}

/// Conversion from an update function's return value.
pub trait IntoStep<M, E>: Send {
    fn into_step(self) -> UpdateResult<M, E>;
}

impl<M, E> IntoStep<M, E> for () {
    fn into_step(self) -> UpdateResult<M, E> {
        Ok(Step::Done)
    }
}

impl<M: Send, E: Send> IntoStep<M, E> for Step<M, E> {
    fn into_step(self) -> UpdateResult<M, E> {
        Ok(self)
    }
}

impl<M: Send, E: Send> IntoStep<M, E> for Handler<M, E> {
    fn into_step(self) -> UpdateResult<M, E> {
        Ok(self.into())
    }
}

impl<M: Send, E: Send> IntoStep<M, E> for Chained<M, E> {
    fn into_step(self) -> UpdateResult<M, E> {
        Ok(self.into())
    }
}

impl<M: Send, E: Send> IntoStep<M, E> for Vec<Step<M, E>> {
    fn into_step(self) -> UpdateResult<M, E> {
        Ok(Step::Fork(self))
    }
}

impl<M, E, T> IntoStep<M, E> for Result<T, UpdateError>
where
    T: IntoStep<M, E>,
{
    fn into_step(self) -> UpdateResult<M, E> {
        self.and_then(IntoStep::into_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type Tally = Vec<&'static str>;

    #[test]
    fn test_into_step_conversions() {
        assert!(matches!(IntoStep::<Tally, Event>::into_step(()), Ok(Step::Done)));

        let next: Handler<Tally> = Handler::noop("next");
        assert!(matches!(next.clone().into_step(), Ok(Step::Next(Update::Fn(_)))));

        let failed: Result<(), UpdateError> = Err("nope".into());
        let result: UpdateResult<Tally> = failed.into_step();
        assert_eq!(result.unwrap_err().message(), "nope");

        let fork: UpdateResult<Tally> = vec![Step::from(next.clone()), Step::Done].into_step();
        assert!(matches!(fork, Ok(Step::Fork(steps)) if steps.len() == 2));
    }

    #[test]
    fn test_update_names() {
        let handler: Handler<Tally> = Handler::noop("select");
        assert_eq!(Update::from(handler).name(), "select");
        assert_eq!(Update::<Tally>::from("todos.add").name(), "todos.add");
    }

    #[test]
    fn test_handler_macro_uses_fn_name() {
        fn mirror_value(_: Invocation<Tally>) {}

        let handler = handler!(mirror_value);
        assert_eq!(handler.name(), "mirror_value");
        assert!(handler.ptr_eq(&handler.clone()));
    }

    #[test]
    fn test_data_accessors() {
        let data: Data<Tally> = "Bob".into();
        assert_eq!(data.as_str(), Some("Bob"));
        assert_eq!(data.as_i64(), None);
        assert_eq!(format!("{:?}", data), "\"Bob\"");

        let data: Data<Tally> = json!({ "id": 3 }).into();
        assert_eq!(data.to_log_value(), json!({ "id": 3 }));

        assert!(Data::<Tally>::default().is_null());
    }

    #[test]
    fn test_chained_overrides() {
        let chained: Chained<Tally> = Chained::new("load").data(7_i64);
        assert_eq!(chained.update.name(), "load");
        assert_eq!(chained.data.as_ref().and_then(Data::as_i64), Some(7));
        assert!(chained.event.is_none());
    }

    #[tokio::test]
    async fn test_pending_step_resolves() {
        let step: Step<Tally> = Step::pending(async { Handler::<Tally>::noop("after") });
        let Step::Pending(future) = step else {
            panic!("expected pending step");
        };
        let resolved = future.await.unwrap();
        assert!(matches!(resolved, Step::Next(update) if update.name() == "after"));
    }
}
