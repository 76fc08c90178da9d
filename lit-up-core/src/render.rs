//! View projection and render functions
//!
//! A view turns the model into a renderable value; a render function paints
//! that value into a surface it owns. Rendering may be synchronous or
//! asynchronous, so every render returns a [`RenderFuture`].

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use ratatui::backend::Backend;
use ratatui::text::Text;
use ratatui::widgets::Paragraph;
use ratatui::Terminal;

use crate::dispatch::Up;
use crate::error::RenderError;
use crate::model::Model;

/// Text painted when an app is started without a view.
pub const NO_VIEW: &str = "lit-up: No view specified";

/// Pending completion of a render.
pub type RenderFuture = BoxFuture<'static, Result<(), RenderError>>;

/// Paints a view value into a target surface.
pub trait Render<V>: Send + Sync + 'static {
    fn render(&self, view: V) -> RenderFuture;
}

/// Synchronous render function, see [`render_fn`].
pub struct FnRender<F>(F);

/// Adapt a synchronous closure into a [`Render`].
pub fn render_fn<V, F>(f: F) -> FnRender<F>
where
    F: Fn(V) -> Result<(), RenderError> + Send + Sync + 'static,
{
    FnRender(f)
}

impl<V, F> Render<V> for FnRender<F>
where
    F: Fn(V) -> Result<(), RenderError> + Send + Sync + 'static,
{
    fn render(&self, view: V) -> RenderFuture {
        future::ready((self.0)(view)).boxed()
    }
}

/// Asynchronous render function, see [`render_async`].
pub struct AsyncRender<F>(F);

/// Adapt an async closure into a [`Render`].
pub fn render_async<V, F, Fut>(f: F) -> AsyncRender<F>
where
    F: Fn(V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RenderError>> + Send + 'static,
{
    AsyncRender(f)
}

impl<V, F, Fut> Render<V> for AsyncRender<F>
where
    F: Fn(V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RenderError>> + Send + 'static,
{
    fn render(&self, view: V) -> RenderFuture {
        (self.0)(view).boxed()
    }
}

/// Paints text views into a ratatui terminal.
pub struct TerminalRender<B: Backend> {
    terminal: Mutex<Terminal<B>>,
}

impl<B: Backend> TerminalRender<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self {
            terminal: Mutex::new(terminal),
        }
    }

    /// Access the terminal, e.g. to inspect a test backend's buffer.
    pub fn with_terminal<R>(&self, f: impl FnOnce(&mut Terminal<B>) -> R) -> R {
        let mut terminal = self.terminal.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut terminal)
    }

    /// Take the terminal back, e.g. for cleanup on exit.
    pub fn into_terminal(self) -> Terminal<B> {
        self.terminal
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B, V> Render<V> for TerminalRender<B>
where
    B: Backend + Send + 'static,
    V: Into<Text<'static>>,
{
    fn render(&self, view: V) -> RenderFuture {
        let text = view.into();
        let result = self.with_terminal(|terminal| {
            terminal
                .draw(|frame| frame.render_widget(Paragraph::new(text), frame.area()))
                .map(|_| ())
        });
        future::ready(result.map_err(RenderError::from)).boxed()
    }
}

type PaintFn<M, E> = dyn Fn(&Model<M>, &Up<M, E>) -> RenderFuture + Send + Sync;

/// A view and a render function, with the view's value type erased.
pub(crate) struct Painter<M, E> {
    paint: Box<PaintFn<M, E>>,
}

impl<M: 'static, E: 'static> Painter<M, E> {
    pub(crate) fn new<V, F, R>(view: F, render: R) -> Self
    where
        F: Fn(&M, &Up<M, E>) -> V + Send + Sync + 'static,
        R: Render<V>,
    {
        Self {
            paint: Box::new(move |model: &Model<M>, up: &Up<M, E>| {
                let value = model.read(|m| view(m, up));
                render.render(value)
            }),
        }
    }

    /// Project the current model and start painting it.
    pub(crate) fn paint(&self, model: &Model<M>, up: &Up<M, E>) -> RenderFuture {
        (self.paint)(model, up)
    }
}

/// View used when none is supplied.
pub fn default_view<M, E>(_: &M, _: &Up<M, E>) -> String {
    NO_VIEW.to_string()
}
