//! Application setup and bootstrap

use std::fmt;

use tracing::info;

use crate::config::AppConfig;
use crate::dispatch::{AppContext, Up};
use crate::error::DispatchError;
use crate::event::{Event, HostEvent};
use crate::logger::Logger;
use crate::model::Model;
use crate::registry::{Registry, BOOTSTRAP_KEY};
use crate::render::{default_view, Painter, Render};
use crate::update::{Data, Handler, Update};

/// An application waiting to be started.
///
/// ```ignore
/// let up = App::new(Counter::default(), view, TerminalRender::new(terminal))
///     .registry(registry)
///     .logger(Logger::Tracing)
///     .start()
///     .await?;
/// ```
pub struct App<M, E = Event> {
    model: M,
    painter: Painter<M, E>,
    registry: Registry<M, E>,
    bootstrap: Option<Update<M, E>>,
    logger: Logger<M, E>,
    config: AppConfig,
}

impl<M: Send + 'static> App<M> {
    /// App driven by terminal events.
    pub fn new<V, F, R>(model: M, view: F, render: R) -> Self
    where
        F: Fn(&M, &Up<M>) -> V + Send + Sync + 'static,
        R: Render<V>,
    {
        Self::with_events(model, view, render)
    }

    /// App whose view is the "No view specified" warning.
    pub fn without_view<R: Render<String>>(model: M, render: R) -> Self {
        Self::with_events(model, default_view, render)
    }
}

impl<M, E> App<M, E>
where
    M: Send + 'static,
    E: HostEvent,
{
    /// App driven by a custom host event type.
    pub fn with_events<V, F, R>(model: M, view: F, render: R) -> Self
    where
        F: Fn(&M, &Up<M, E>) -> V + Send + Sync + 'static,
        R: Render<V>,
    {
        Self {
            model,
            painter: Painter::new(view, render),
            registry: Registry::new(),
            bootstrap: None,
            logger: Logger::default(),
            config: AppConfig::default(),
        }
    }

    /// Updates addressable by string key.
    pub fn registry(mut self, registry: Registry<M, E>) -> Self {
        self.registry = registry;
        self
    }

    /// Update run once at startup, ahead of any registry `bootstrap` entry.
    pub fn bootstrap(mut self, update: impl Into<Update<M, E>>) -> Self {
        self.bootstrap = Some(update.into());
        self
    }

    pub fn logger(mut self, logger: impl Into<Logger<M, E>>) -> Self {
        self.logger = logger.into();
        self
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the bootstrap chain to completion and hand back the dispatch
    /// factory.
    ///
    /// The bootstrap update receives the factory as its data.
    pub async fn start(self) -> Result<Up<M, E>, DispatchError> {
        let App {
            model,
            painter,
            registry,
            bootstrap,
            logger,
            config,
        } = self;

        let bootstrap = match bootstrap {
            Some(update) => update,
            None if registry.bootstrap().is_some() => Update::from(BOOTSTRAP_KEY),
            None => Update::Fn(Handler::noop(BOOTSTRAP_KEY)),
        };
        info!(bootstrap = %bootstrap.name(), entries = registry.len(), "starting app");

        let up = Up::from_context(AppContext {
            model: Model::new(model),
            painter,
            registry: registry.into(),
            logger,
            config,
        });
        up.up(bootstrap, Data::Up(up.clone())).fire().await?;
        Ok(up)
    }
}

impl<M, E> fmt::Debug for App<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("registry", &self.registry)
            .field("bootstrap", &self.bootstrap)
            .field("logger", &self.logger)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::DispatchLog;
    use crate::render::NO_VIEW;
    use crate::testing::MemorySurface;
    use crate::update::Invocation;

    #[derive(Debug, Default)]
    struct Boot {
        booted_by: Option<&'static str>,
        saw_up: bool,
    }

    fn view(model: &Boot, _: &Up<Boot>) -> String {
        format!("{:?}", model.booted_by)
    }

    fn mark(name: &'static str) -> Handler<Boot> {
        Handler::new(name, move |inv: Invocation<Boot>| {
            let saw_up = inv.data.as_up().is_some();
            inv.model.update(|m| {
                m.booted_by = Some(name);
                m.saw_up = saw_up;
            });
        })
    }

    #[tokio::test]
    async fn test_without_view_paints_warning() {
        let surface = MemorySurface::new();
        App::without_view((), surface.render()).start().await.unwrap();

        assert_eq!(surface.body(), NO_VIEW);
        assert_eq!(surface.paint_count(), 1);
    }

    #[tokio::test]
    async fn test_explicit_bootstrap_wins() {
        let surface = MemorySurface::new();
        let up = App::new(Boot::default(), view, surface.render())
            .registry(Registry::new().with(BOOTSTRAP_KEY, mark("registry")))
            .bootstrap(mark("explicit"))
            .start()
            .await
            .unwrap();

        assert_eq!(up.model().read(|m| m.booted_by), Some("explicit"));
        assert!(up.model().read(|m| m.saw_up));
    }

    #[tokio::test]
    async fn test_registry_bootstrap_gets_up() {
        let surface = MemorySurface::new();
        let log = DispatchLog::default();
        let up = App::new(Boot::default(), view, surface.render())
            .registry(Registry::new().with(BOOTSTRAP_KEY, mark("registry")))
            .logger(log.clone())
            .start()
            .await
            .unwrap();

        assert_eq!(up.model().read(|m| m.booted_by), Some("registry"));
        assert_eq!(surface.body(), "Some(\"registry\")");

        let records = log.records();
        assert_eq!(records[0].name, BOOTSTRAP_KEY);
        assert_eq!(records[0].data, serde_json::json!("up"));
    }

    #[tokio::test]
    async fn test_noop_bootstrap_still_logs_and_paints() {
        let surface = MemorySurface::new();
        let log = DispatchLog::default();
        App::new(Boot::default(), view, surface.render())
            .logger(log.clone())
            .start()
            .await
            .unwrap();

        assert_eq!(log.names(), vec![BOOTSTRAP_KEY.to_string()]);
        assert_eq!(surface.body(), "None");
    }

    #[tokio::test]
    async fn test_instances_are_independent() {
        let first = MemorySurface::new();
        let second = MemorySurface::new();
        let a = App::new(Boot::default(), view, first.render())
            .bootstrap(mark("a"))
            .start()
            .await
            .unwrap();
        let b = App::new(Boot::default(), view, second.render())
            .start()
            .await
            .unwrap();

        assert!(!a.ptr_eq(&b));
        assert_eq!(first.body(), "Some(\"a\")");
        assert_eq!(second.body(), "None");
    }
}
