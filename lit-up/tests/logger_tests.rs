use std::sync::{Arc, Mutex};

use lit_up::prelude::*;
use lit_up::testing::{wait, MemorySurface};
use lit_up::Phase;
use serde_json::json;

#[derive(Debug, Default)]
struct Notes {
    text: String,
}

fn view(model: &Notes, _: &Up<Notes>) -> String {
    model.text.clone()
}

fn set_text(inv: Invocation<Notes>) {
    let text = inv.data.as_str().unwrap_or_default().to_string();
    inv.model.update(|m| m.text = text);
}

#[tokio::test]
async fn test_logger_sees_every_dispatch_in_order() {
    let log = DispatchLog::default();
    let up = App::new(Notes::default(), view, MemorySurface::new().render())
        .logger(log.clone())
        .start()
        .await
        .unwrap();

    up.up(handler!(set_text), "first").fire().await.unwrap();
    up.up(handler!(set_text), "second").fire().await.unwrap();

    let records = log.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].name, "bootstrap");
    assert_eq!(records[0].data, json!("up"));
    assert_eq!(records[1].name, "set_text");
    assert_eq!(records[1].data, json!("first"));
    assert_eq!(records[2].data, json!("second"));
    assert!(records.iter().all(|r| !r.chained));
    assert!(records.windows(2).all(|w| w[0].sequence < w[1].sequence));
}

#[tokio::test]
async fn test_custom_logger_runs_before_the_update() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let logger = Logger::custom(move |entry: &LogEntry<Notes>| {
        let text = entry.model.read(|m| m.text.clone());
        sink.lock().unwrap().push((entry.name.clone(), text, entry.phase));
    });

    let up = App::new(Notes::default(), view, MemorySurface::new().render())
        .logger(logger)
        .start()
        .await
        .unwrap();
    up.up(handler!(set_text), "after").fire().await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen.last().cloned(),
        Some(("set_text".to_string(), String::new(), Phase::Before))
    );
}

#[tokio::test]
async fn test_async_update_logs_settled_entry() {
    let log = DispatchLog::default();
    let up = App::new(Notes::default(), view, MemorySurface::new().render())
        .logger(log.clone())
        .start()
        .await
        .unwrap();
    log.clear();

    let save = Handler::from_async("save", |inv: Invocation<Notes>| async move {
        wait(20).await;
        inv.model.update(|m| m.text = "saved".into());
    });
    up.up(save, json!({ "id": 1 })).fire().await.unwrap();

    let records = log.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].phase, Phase::Before);
    assert_eq!(records[1].phase, Phase::Settled);
    assert_eq!(records[1].data, json!({ "id": 1 }));
    assert!(records[1].time_ms >= records[0].time_ms + 15);
}

#[tokio::test]
async fn test_log_filter_hides_matching_updates() {
    fn tick(_: Invocation<Notes>) {}

    let log = DispatchLog::default();
    let config = AppConfig::default().with_log_filter(LogFilter::new(None, Some("tick,boot*")));
    let up = App::new(Notes::default(), view, MemorySurface::new().render())
        .logger(log.clone())
        .config(config)
        .start()
        .await
        .unwrap();

    up.dispatch(handler!(tick)).fire().await.unwrap();
    up.up(handler!(set_text), "kept").fire().await.unwrap();

    assert_eq!(log.names(), vec!["set_text".to_string()]);
}

#[tokio::test]
async fn test_registry_keys_log_under_their_path() {
    let log = DispatchLog::default();
    let up = App::new(Notes::default(), view, MemorySurface::new().render())
        .registry(Registry::new().with("notes.set", handler!(set_text)))
        .logger(log.clone())
        .start()
        .await
        .unwrap();
    log.clear();

    up.up("notes.set", "hello").fire().await.unwrap();
    up.dispatch("notes.missing").fire().await.unwrap();

    assert_eq!(log.names(), vec!["notes.set".to_string()]);
}

#[tokio::test]
async fn test_disabled_logger_records_nothing() {
    let up = App::new(Notes::default(), view, MemorySurface::new().render())
        .logger(false)
        .start()
        .await
        .unwrap();

    up.up(handler!(set_text), "quiet").fire().await.unwrap();
    assert_eq!(up.model().read(|m| m.text.clone()), "quiet");
}
