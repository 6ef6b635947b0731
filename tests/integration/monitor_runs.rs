//! Integration tests for the Monitor Runner driven end-to-end through its
//! public API: composer, throttle gate, evaluator, materializer, alert
//! store and notifier wired together against in-memory collaborators.

use alerting_engine::clock::FixedClock;
use alerting_engine::external::{HandlebarsTemplateEngine, InMemoryPqlExecutor, LoggingNotifier};
use alerting_engine::query::{Column, QueryResponse};
use alerting_engine::runner::{MonitorRunner, TriggerOutcome};
use alerting_engine::settings::SettingsHandle;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::helpers::*;

fn runner(store: Arc<InMemoryStore>, executor: Arc<InMemoryPqlExecutor>) -> MonitorRunner {
    MonitorRunner::new(
        executor,
        Arc::new(LoggingNotifier::new()),
        Arc::new(HandlebarsTemplateEngine),
        store.clone(),
        store,
        Arc::new(FixedClock(Utc::now())),
        SettingsHandle::default(),
    )
}

#[tokio::test]
async fn number_of_results_trigger_fires_and_persists_one_alert() {
    let monitor = number_of_results_monitor("m-nor", "t-nor");
    let store = Arc::new(InMemoryStore::new());
    store.seed_monitor(monitor.clone()).await;

    let executor = Arc::new(InMemoryPqlExecutor::new());
    executor
        .on_query_containing(
            "source=logs",
            QueryResponse {
                schema: vec![Column { name: "cnt".into(), type_name: "int".into() }, Column { name: "host".into(), type_name: "string".into() }],
                datarows: vec![vec![json!(42), json!("web-1")]],
                total: 1,
                size: 1,
            },
        )
        .await;

    let result = runner(store.clone(), executor).run(&monitor, false, false).await;

    assert_eq!(result.fired_trigger_ids().len(), 1);
    assert_eq!(result.alerts.len(), 1);
    assert_eq!(store.active_alerts().await.len(), 1);

    let updated = store.monitor("m-nor").await.unwrap();
    assert!(updated.triggers[0].last_fired_time.is_some());
}

#[tokio::test]
async fn number_of_results_trigger_does_not_fire_on_empty_result_set() {
    let monitor = number_of_results_monitor("m-empty", "t-empty");
    let store = Arc::new(InMemoryStore::new());
    store.seed_monitor(monitor.clone()).await;

    let executor = Arc::new(InMemoryPqlExecutor::new());
    executor.on_query_containing("source=logs", QueryResponse::empty()).await;

    let result = runner(store.clone(), executor).run(&monitor, false, false).await;

    assert!(matches!(result.trigger_results[0].outcome, TriggerOutcome::NotFired));
    assert!(store.active_alerts().await.is_empty());
}

#[tokio::test]
async fn custom_per_result_trigger_fires_one_alert_per_matching_row() {
    let monitor = custom_per_result_monitor("m-custom", "t-custom");
    let store = Arc::new(InMemoryStore::new());
    store.seed_monitor(monitor.clone()).await;

    let executor = Arc::new(InMemoryPqlExecutor::new());
    executor
        .on_query_containing(
            "source=logs",
            QueryResponse {
                schema: vec![Column { name: "cnt".into(), type_name: "int".into() }, Column { name: "host".into(), type_name: "string".into() }],
                datarows: vec![
                    vec![json!(3), json!("web-1")],
                    vec![json!(20), json!("web-2")],
                    vec![json!(15), json!("web-3")],
                ],
                total: 3,
                size: 3,
            },
        )
        .await;

    let result = runner(store.clone(), executor).run(&monitor, false, false).await;

    assert_eq!(result.alerts.len(), 2);
    assert_eq!(store.active_alerts().await.len(), 2);
}

#[tokio::test]
async fn throttled_trigger_skips_query_execution_and_produces_no_alert() {
    let mut monitor = number_of_results_monitor("m-throttle", "t-throttle");
    monitor.triggers[0].throttle_duration_minutes = Some(30);
    monitor.triggers[0].last_fired_time = Some(Utc::now());
    let store = Arc::new(InMemoryStore::new());
    store.seed_monitor(monitor.clone()).await;

    // No fixture registered: if the executor were called, the run would
    // surface a Failed outcome instead of Throttled.
    let executor = Arc::new(InMemoryPqlExecutor::new());

    let result = runner(store.clone(), executor).run(&monitor, false, false).await;

    assert!(matches!(result.trigger_results[0].outcome, TriggerOutcome::Throttled));
    assert!(store.active_alerts().await.is_empty());
}

#[tokio::test]
async fn manual_run_bypasses_throttle_window() {
    let mut monitor = number_of_results_monitor("m-manual", "t-manual");
    monitor.triggers[0].throttle_duration_minutes = Some(30);
    monitor.triggers[0].last_fired_time = Some(Utc::now());
    let store = Arc::new(InMemoryStore::new());
    store.seed_monitor(monitor.clone()).await;

    let executor = Arc::new(InMemoryPqlExecutor::new());
    executor.on_query_containing("source=logs", QueryResponse { total: 1, size: 1, ..Default::default() }).await;

    let result = runner(store.clone(), executor).run(&monitor, true, false).await;

    assert_eq!(result.fired_trigger_ids().len(), 1);
}

#[tokio::test]
async fn query_executor_failure_is_isolated_to_its_own_trigger() {
    let monitor = number_of_results_monitor("m-fail", "t-fail");
    let store = Arc::new(InMemoryStore::new());
    store.seed_monitor(monitor.clone()).await;

    // No fixture registered for this query, so execution fails.
    let executor = Arc::new(InMemoryPqlExecutor::new());

    let result = runner(store.clone(), executor).run(&monitor, false, false).await;

    assert!(matches!(result.trigger_results[0].outcome, TriggerOutcome::Failed { .. }));
    // A failed trigger still produces a persisted error alert.
    assert_eq!(result.alerts.len(), 1);
    assert!(result.alerts[0].error_message.is_some());
}
