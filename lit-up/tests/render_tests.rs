//! Rendering through a ratatui terminal backed by `TestBackend`

use std::sync::Arc;

use lit_up::prelude::*;
use lit_up::testing::{buffer_to_string_plain, wait, MemorySurface};
use lit_up::{render_async, RenderError, NO_VIEW};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

#[derive(Debug, Default)]
struct Counter {
    count: i32,
}

fn view(model: &Counter, _: &Up<Counter>) -> Text<'static> {
    Text::from(vec![
        Line::from("Counter"),
        Line::from(format!("Count: {}", model.count)),
    ])
}

fn inc(inv: Invocation<Counter>) {
    inv.model.update(|m| m.count += 1);
}

/// Render handle shared between the app and the test.
struct Shared(Arc<TerminalRender<TestBackend>>);

impl Render<Text<'static>> for Shared {
    fn render(&self, view: Text<'static>) -> lit_up::RenderFuture {
        self.0.render(view)
    }
}

impl Render<String> for Shared {
    fn render(&self, view: String) -> lit_up::RenderFuture {
        self.0.render(view)
    }
}

fn terminal(width: u16, height: u16) -> Arc<TerminalRender<TestBackend>> {
    let terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    Arc::new(TerminalRender::new(terminal))
}

fn screen(render: &TerminalRender<TestBackend>) -> String {
    render.with_terminal(|t| buffer_to_string_plain(t.backend().buffer()))
}

#[tokio::test]
async fn test_render_initial_view() {
    let render = terminal(20, 2);
    App::new(Counter::default(), view, Shared(Arc::clone(&render)))
        .start()
        .await
        .unwrap();

    assert_eq!(screen(&render), "Counter\nCount: 0");
}

#[tokio::test]
async fn test_render_after_dispatch() {
    let render = terminal(20, 3);
    let up = App::new(Counter::default(), view, Shared(Arc::clone(&render)))
        .start()
        .await
        .unwrap();

    up.dispatch(handler!(inc)).fire().await.unwrap();
    up.dispatch(handler!(inc)).fire().await.unwrap();

    assert!(screen(&render).contains("Count: 2"));
}

#[tokio::test]
async fn test_render_without_view() {
    let render = terminal(40, 1);
    App::without_view(Counter::default(), Shared(Arc::clone(&render)))
        .start()
        .await
        .unwrap();

    assert_eq!(screen(&render), NO_VIEW);
}

#[tokio::test]
async fn test_on_demand_render() {
    let render = terminal(20, 3);
    let up = App::new(Counter::default(), view, Shared(Arc::clone(&render)))
        .start()
        .await
        .unwrap();

    // Mutating outside a dispatch does not paint by itself
    up.model().update(|m| m.count = 42);
    assert!(screen(&render).contains("Count: 0"));

    up.render().await.unwrap();
    assert!(screen(&render).contains("Count: 42"));
}

#[tokio::test]
async fn test_slow_render_overlaps_pending_update() {
    let surface = MemorySurface::new();
    let up = App::new(
        Counter::default(),
        |m: &Counter, _: &Up<Counter>| format!("Count: {}", m.count),
        surface.render_slow(10),
    )
    .start()
    .await
    .unwrap();

    let slow = Handler::from_async("slow", |inv: Invocation<Counter>| async move {
        wait(5).await;
        inv.model.update(|m| m.count = 3);
    });
    up.dispatch(slow).fire().await.unwrap();

    let history = surface.history();
    assert_eq!(history[history.len() - 2], "Count: 0");
    assert_eq!(surface.body(), "Count: 3");
}

#[tokio::test]
async fn test_render_failure_is_reported() {
    let up = App::new(
        Counter::default(),
        |m: &Counter, _: &Up<Counter>| m.count,
        render_async(|count: i32| async move {
            if count > 0 {
                Err(RenderError::Failed("surface gone".into()))
            } else {
                Ok(())
            }
        }),
    )
    .start()
    .await
    .unwrap();

    let err = up.dispatch(handler!(inc)).fire().await.unwrap_err();
    assert!(matches!(err, DispatchError::Render(_)));
    assert_eq!(err.update_name(), None);
}
