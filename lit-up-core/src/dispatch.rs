//! The dispatch factory and the frame engine behind it
//!
//! [`Up::dispatch`] captures an update and returns a [`Trigger`]; running the
//! trigger (optionally with an event) resolves the whole chain:
//!
//! 1. the event policy is applied to the event, once
//! 2. the update is resolved (registry keys through the [`Registry`])
//! 3. a log entry is recorded and the update runs
//! 4. the current model is painted
//! 5. the returned [`Step`] decides what runs next
//!
//! An update that returns [`Step::Pending`] paints the model as it stands
//! while the pending work is awaited, logs a second entry once it settles,
//! and paints again before following the settled step.
//!
//! A forked step runs its branches concurrently inside the caller's task.
//! The trigger completes only after every branch has finished.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::SystemTime;

use futures::future::{self, BoxFuture};
use futures::{FutureExt, TryFutureExt};
use tracing::{debug, error, trace};

use crate::config::{AppConfig, ForkPolicy};
use crate::error::{DispatchError, UpdateError};
use crate::event::{apply_event_policy, Event, HostEvent, UpOptions};
use crate::logger::{LogEntry, Logger, Phase};
use crate::model::Model;
use crate::registry::{Lookup, Registry};
use crate::render::Painter;
use crate::update::{Chained, Data, Handler, Invocation, Step, Update, UpdateResult};

/// Pending completion of a dispatch.
pub type DispatchFuture = BoxFuture<'static, Result<(), DispatchError>>;

/// A trigger converted into a plain event callback.
pub type EventHandler<E = Event> = Arc<dyn Fn(Option<E>) -> DispatchFuture + Send + Sync>;

/// Everything a dispatch needs, shared by all handles of one app.
pub(crate) struct AppContext<M, E> {
    pub(crate) model: Model<M>,
    pub(crate) painter: Painter<M, E>,
    pub(crate) registry: Arc<Registry<M, E>>,
    pub(crate) logger: Logger<M, E>,
    pub(crate) config: AppConfig,
}

/// The dispatch factory.
///
/// Cheap to clone; every clone drives the same app instance.
pub struct Up<M, E = Event> {
    ctx: Arc<AppContext<M, E>>,
}

impl<M, E> Clone for Up<M, E> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
        }
    }
}

impl<M, E> fmt::Debug for Up<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Up")
            .field("registry", &self.ctx.registry)
            .field("logger", &self.ctx.logger)
            .field("config", &self.ctx.config)
            .finish()
    }
}

struct Frame<M, E> {
    update: Update<M, E>,
    data: Data<M, E>,
    event: Option<E>,
    chained: bool,
}

impl<M, E> Up<M, E> {
    pub(crate) fn from_context(ctx: AppContext<M, E>) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    /// The shared model handle.
    pub fn model(&self) -> &Model<M> {
        &self.ctx.model
    }

    pub fn registry(&self) -> &Registry<M, E> {
        &self.ctx.registry
    }

    pub fn config(&self) -> &AppConfig {
        &self.ctx.config
    }

    /// Whether both handles drive the same app instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ctx, &other.ctx)
    }
}

impl<M, E> Up<M, E>
where
    M: Send + 'static,
    E: HostEvent,
{
    /// Capture an update for later execution.
    pub fn dispatch(&self, update: impl Into<Update<M, E>>) -> Trigger<M, E> {
        Trigger {
            up: self.clone(),
            update: update.into(),
            data: Data::default(),
            options: UpOptions::default(),
        }
    }

    /// Capture an update together with its data.
    pub fn up(
        &self,
        update: impl Into<Update<M, E>>,
        data: impl Into<Data<M, E>>,
    ) -> Trigger<M, E> {
        self.dispatch(update).data(data)
    }

    /// Paint the current model.
    pub fn render(&self) -> impl Future<Output = Result<(), DispatchError>> + Send + 'static {
        let painting = self.ctx.painter.paint(&self.ctx.model, self);
        async move {
            trace!("render");
            painting.await.map_err(|err| {
                error!(error = %err, "render failed");
                DispatchError::from(err)
            })
        }
    }

    fn resolve(&self, update: &Update<M, E>) -> Option<(Handler<M, E>, Option<Arc<Registry<M, E>>>)> {
        match update {
            Update::Fn(handler) => Some((handler.clone(), None)),
            Update::Key(key) => match self.ctx.registry.resolve(key) {
                Lookup::Found(handler) => Some((handler, Some(Arc::clone(&self.ctx.registry)))),
                Lookup::NotCallable => {
                    trace!(key = %key, "registry entry is not callable");
                    None
                }
                Lookup::Missing => {
                    trace!(key = %key, "no registry entry");
                    None
                }
            },
        }
    }

    fn log(&self, entry: &LogEntry<M, E>) {
        if self.ctx.config.log_filter.should_log(&entry.name) {
            self.ctx.logger.log(entry);
        }
    }

    fn fault(&self, entry: &LogEntry<M, E>, source: UpdateError) -> DispatchError {
        error!(
            update = %entry.name,
            data = ?entry.data,
            event = ?entry.event,
            chained = entry.chained,
            error = %source,
            "update failed"
        );
        DispatchError::Update {
            update: entry.name.clone(),
            source,
        }
    }

    fn run_frame(&self, frame: Frame<M, E>) -> DispatchFuture {
        let up = self.clone();
        async move {
            let Some((handler, registry)) = up.resolve(&frame.update) else {
                if !frame.chained && up.ctx.config.render_on_miss {
                    up.render().await?;
                }
                return Ok(());
            };

            let entry = LogEntry {
                name: frame.update.name().to_string(),
                update: handler.clone(),
                data: frame.data.clone(),
                event: frame.event.clone(),
                model: up.ctx.model.clone(),
                time: SystemTime::now(),
                chained: frame.chained,
                phase: Phase::Before,
            };
            up.log(&entry);
            debug!(update = %entry.name, chained = frame.chained, "running update");

            let invocation = Invocation {
                model: up.ctx.model.clone(),
                data: frame.data.clone(),
                event: frame.event.clone(),
                up: up.clone(),
                registry,
                chained: frame.chained,
            };
            let step = handler
                .call(invocation)
                .map_err(|err| up.fault(&entry, err))?;

            let step = match step {
                Step::Pending(pending) => up.settle(&entry, pending).await?,
                step => {
                    up.render().await?;
                    step
                }
            };
            up.follow(step, &entry, frame.data, frame.event).await
        }
        .boxed()
    }

    /// Paint while `pending` runs, then log the settled entry and paint again.
    ///
    /// A failed pending result skips the second paint.
    async fn settle(
        &self,
        entry: &LogEntry<M, E>,
        pending: BoxFuture<'static, UpdateResult<M, E>>,
    ) -> Result<Step<M, E>, DispatchError> {
        let (painted, settled) = future::join(self.render(), pending).await;
        let step = settled.map_err(|err| self.fault(entry, err))?;
        painted?;
        self.log(&entry.settled());
        self.render().await?;
        Ok(step)
    }

    fn follow(
        &self,
        step: Step<M, E>,
        parent: &LogEntry<M, E>,
        data: Data<M, E>,
        event: Option<E>,
    ) -> DispatchFuture {
        match step {
            Step::Done => future::ok(()).boxed(),
            Step::Next(update) => self.run_frame(Frame {
                update,
                data,
                event,
                chained: true,
            }),
            Step::NextWith(Chained {
                update,
                data: data_override,
                event: event_override,
            }) => self.run_frame(Frame {
                update,
                data: data_override.unwrap_or(data),
                event: event_override.or(event),
                chained: true,
            }),
            Step::Fork(steps) => {
                let branches: Vec<_> = steps
                    .into_iter()
                    .map(|step| self.follow(step, parent, data.clone(), event.clone()))
                    .collect();
                self.join(branches)
            }
            Step::Pending(pending) => {
                let up = self.clone();
                let parent = parent.clone();
                async move {
                    let step = up.settle(&parent, pending).await?;
                    up.follow(step, &parent, data, event).await
                }
                .boxed()
            }
        }
    }

    fn join(&self, branches: Vec<DispatchFuture>) -> DispatchFuture {
        match self.ctx.config.fork_policy {
            ForkPolicy::Settle => future::join_all(branches)
                .map(|results| results.into_iter().collect::<Result<Vec<_>, _>>().map(|_| ()))
                .boxed(),
            ForkPolicy::CancelSiblings => future::try_join_all(branches).map_ok(|_| ()).boxed(),
        }
    }
}

/// A captured update waiting for its triggering event.
pub struct Trigger<M, E = Event> {
    up: Up<M, E>,
    update: Update<M, E>,
    data: Data<M, E>,
    options: UpOptions,
}

impl<M, E: Clone> Clone for Trigger<M, E> {
    fn clone(&self) -> Self {
        Self {
            up: self.up.clone(),
            update: self.update.clone(),
            data: self.data.clone(),
            options: self.options,
        }
    }
}

impl<M, E> fmt::Debug for Trigger<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("update", &self.update)
            .field("data", &self.data)
            .field("options", &self.options)
            .finish()
    }
}

impl<M, E> Trigger<M, E>
where
    M: Send + 'static,
    E: HostEvent,
{
    pub fn data(mut self, data: impl Into<Data<M, E>>) -> Self {
        self.data = data.into();
        self
    }

    pub fn options(mut self, options: UpOptions) -> Self {
        self.options = options;
        self
    }

    /// Let the host run the event's default action.
    pub fn do_default(mut self) -> Self {
        self.options.do_default = true;
        self
    }

    /// Let the event propagate.
    pub fn propagate(mut self) -> Self {
        self.options.propagate = true;
        self
    }

    /// Run with an optional triggering event.
    ///
    /// The event policy is applied before this returns; the chain runs when
    /// the returned future is polled.
    pub fn run(&self, event: Option<E>) -> DispatchFuture {
        apply_event_policy(event.as_ref(), self.options);
        self.up.run_frame(Frame {
            update: self.update.clone(),
            data: self.data.clone(),
            event,
            chained: false,
        })
    }

    /// Run programmatically, without an event.
    pub fn fire(&self) -> DispatchFuture {
        self.run(None)
    }

    /// Run in response to `event`.
    pub fn handle(&self, event: E) -> DispatchFuture {
        self.run(Some(event))
    }

    /// Convert into a callback suitable for attaching to a UI binding.
    pub fn into_handler(self) -> EventHandler<E> {
        Arc::new(move |event| self.run(event))
    }
}
