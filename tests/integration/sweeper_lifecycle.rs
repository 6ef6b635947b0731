//! Integration tests for the Alert Lifecycle Sweeper driven through its
//! public [`SweeperHandle`].

use alerting_engine::clock::FixedClock;
use alerting_engine::external::FixedLeadership;
use alerting_engine::model::alert::{Alert, AlertId, AlertSeverity, ExecutionId};
use alerting_engine::model::monitor::{MonitorId, Owner};
use alerting_engine::model::trigger::TriggerId;
use alerting_engine::query::QueryResponse;
use alerting_engine::settings::{Settings, SettingsHandle};
use alerting_engine::sweeper::SweeperHandle;
use chrono::Utc;
use std::sync::Arc;

use crate::helpers::*;

fn alert(monitor_id: &str, trigger_id: &str, expiration_time: chrono::DateTime<Utc>) -> Alert {
    Alert {
        id: Some(AlertId(format!("a-{monitor_id}-{trigger_id}"))),
        monitor_id: MonitorId(monitor_id.into()),
        monitor_name: monitor_id.into(),
        monitor_version: 1,
        monitor_user: Owner { principal_name: "alice".into(), backend_roles: vec![], roles: vec![] },
        trigger_id: TriggerId(trigger_id.into()),
        trigger_name: trigger_id.into(),
        query: "source=logs".into(),
        query_results: QueryResponse::empty(),
        triggered_time: Utc::now(),
        expiration_time,
        severity: AlertSeverity::Warn,
        error_message: None,
        execution_id: ExecutionId::new(),
    }
}

#[tokio::test]
async fn expired_alert_moves_to_history_when_history_enabled() {
    let store = Arc::new(InMemoryStore::new());
    let now = Utc::now();
    store.seed_monitor(number_of_results_monitor("m1", "t1")).await;
    store.save_alerts(vec![alert("m1", "t1", now - chrono::Duration::minutes(1))]).await.unwrap();

    let handle = SweeperHandle::spawn(
        store.clone(),
        store.clone(),
        Arc::new(FixedClock(now)),
        Arc::new(FixedLeadership(true)),
        SettingsHandle::default(),
    );

    let stats = handle.sweep_now().await.unwrap();
    assert_eq!(stats.expired, 1);
    assert_eq!(stats.archived, 1);
    assert!(store.active_alerts().await.is_empty());
    assert_eq!(store.archived_alerts().await.len(), 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn expired_alert_is_deleted_when_history_disabled() {
    let store = Arc::new(InMemoryStore::new());
    let now = Utc::now();
    store.seed_monitor(number_of_results_monitor("m2", "t2")).await;
    store.save_alerts(vec![alert("m2", "t2", now - chrono::Duration::minutes(1))]).await.unwrap();

    let settings = SettingsHandle::new(Settings { history_enabled: false, ..Settings::default() });

    let handle = SweeperHandle::spawn(
        store.clone(),
        store.clone(),
        Arc::new(FixedClock(now)),
        Arc::new(FixedLeadership(true)),
        settings,
    );

    let stats = handle.sweep_now().await.unwrap();
    assert_eq!(stats.deleted, 1);
    assert!(store.active_alerts().await.is_empty());
    assert!(store.archived_alerts().await.is_empty());

    handle.shutdown().await;
}

#[tokio::test]
async fn alert_for_deleted_monitor_is_swept_as_orphaned() {
    let store = Arc::new(InMemoryStore::new());
    let now = Utc::now();
    // No monitor seeded at all: the owning monitor has been deleted.
    store.save_alerts(vec![alert("m-gone", "t1", now + chrono::Duration::hours(1))]).await.unwrap();

    let handle = SweeperHandle::spawn(
        store.clone(),
        store.clone(),
        Arc::new(FixedClock(now)),
        Arc::new(FixedLeadership(true)),
        SettingsHandle::default(),
    );

    let stats = handle.sweep_now().await.unwrap();
    assert_eq!(stats.expired, 1);
    assert!(store.active_alerts().await.is_empty());

    handle.shutdown().await;
}

#[tokio::test]
async fn shutdown_stops_accepting_further_sweeps() {
    let store = Arc::new(InMemoryStore::new());
    let now = Utc::now();

    let handle = SweeperHandle::spawn(
        store.clone(),
        store.clone(),
        Arc::new(FixedClock(now)),
        Arc::new(FixedLeadership(true)),
        SettingsHandle::default(),
    );

    handle.shutdown().await;
    // Give the actor a moment to observe the shutdown command and exit.
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    assert!(handle.sweep_now().await.is_err());
}
