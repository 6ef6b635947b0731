//! Test helpers and utilities for integration tests.

use alerting_engine::alert_store::{AlertStore, MonitorStore, StoreError, StoreResult};
use alerting_engine::model::alert::{Alert, AlertId, AlertSeverity};
use alerting_engine::model::monitor::{Monitor, MonitorId, Owner, QueryLanguage, Schedule, ScheduleUnit};
use alerting_engine::model::trigger::{Action, ComparisonOp, Trigger, TriggerCondition, TriggerId, TriggerMode};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// A monitor with a single NUMBER_OF_RESULTS / ResultSet trigger, firing
/// whenever the query returns at least one row.
pub fn number_of_results_monitor(monitor_id: &str, trigger_id: &str) -> Monitor {
    Monitor {
        id: MonitorId(monitor_id.to_string()),
        version: 1,
        name: format!("{monitor_id} monitor"),
        enabled: true,
        enabled_time: Some(Utc::now()),
        owner: Owner { principal_name: "alice".into(), backend_roles: vec!["admin".into()], roles: vec![] },
        schedule: Schedule { interval: 1, unit: ScheduleUnit::Minutes },
        look_back_window_minutes: Some(15),
        timestamp_field: "@timestamp".into(),
        query_language: QueryLanguage::Pql,
        query: "source=logs | stats count() as cnt by host".into(),
        triggers: vec![Trigger {
            id: TriggerId(trigger_id.to_string()),
            name: format!("{trigger_id} trigger"),
            severity: AlertSeverity::Warn,
            mode: TriggerMode::ResultSet,
            condition: TriggerCondition::NumberOfResults { op: ComparisonOp::Gt, value: 0 },
            throttle_duration_minutes: Some(5),
            expire_duration_minutes: 60,
            actions: vec![Action {
                destination_id: "console".into(),
                subject_template: "{{monitor_name}} fired".into(),
                message_template: "{{trigger_name}} matched {{results.total}} rows".into(),
            }],
            last_fired_time: None,
        }],
    }
}

/// A monitor with a single CUSTOM / PerResult trigger over a `host` column,
/// firing once per row whose `eval flag = …` column is truthy.
pub fn custom_per_result_monitor(monitor_id: &str, trigger_id: &str) -> Monitor {
    let mut monitor = number_of_results_monitor(monitor_id, trigger_id);
    monitor.query = "source=logs | stats count() as cnt by host".into();
    monitor.triggers[0].mode = TriggerMode::PerResult;
    monitor.triggers[0].condition = TriggerCondition::Custom { fragment: "eval flag = cnt > 10".into() };
    monitor.triggers[0].throttle_duration_minutes = None;
    monitor
}

/// An in-memory [`AlertStore`]/[`MonitorStore`] shared across the runner
/// and sweeper integration tests, keyed by monitor id.
#[derive(Default)]
pub struct InMemoryStore {
    alerts: Mutex<Vec<Alert>>,
    archived: Mutex<Vec<Alert>>,
    monitors: Mutex<HashMap<String, Monitor>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_monitor(&self, monitor: Monitor) {
        self.monitors.lock().await.insert(monitor.id.0.clone(), monitor);
    }

    pub async fn monitor(&self, id: &str) -> Option<Monitor> {
        self.monitors.lock().await.get(id).cloned()
    }

    pub async fn active_alerts(&self) -> Vec<Alert> {
        self.alerts.lock().await.clone()
    }

    pub async fn archived_alerts(&self) -> Vec<Alert> {
        self.archived.lock().await.clone()
    }
}

#[async_trait]
impl AlertStore for InMemoryStore {
    async fn save_alerts(&self, alerts: Vec<Alert>) -> StoreResult<Vec<Alert>> {
        let mut saved = Vec::with_capacity(alerts.len());
        for mut alert in alerts {
            if alert.id.is_none() {
                alert.id = Some(AlertId(format!("{}-{}", alert.monitor_id, alert.trigger_id)));
            }
            saved.push(alert);
        }
        self.alerts.lock().await.extend(saved.clone());
        Ok(saved)
    }

    async fn active_alerts_for_monitor(&self, monitor_id: &MonitorId) -> StoreResult<Vec<Alert>> {
        Ok(self.alerts.lock().await.iter().filter(|a| &a.monitor_id == monitor_id).cloned().collect())
    }

    async fn all_active_alerts(&self) -> StoreResult<Vec<Alert>> {
        Ok(self.alerts.lock().await.clone())
    }

    async fn archive_alerts(&self, alerts: Vec<Alert>) -> StoreResult<usize> {
        let ids: Vec<AlertId> = alerts.iter().filter_map(|a| a.id.clone()).collect();
        self.alerts.lock().await.retain(|a| a.id.as_ref().map(|id| !ids.contains(id)).unwrap_or(true));
        let count = alerts.len();
        self.archived.lock().await.extend(alerts);
        Ok(count)
    }

    async fn delete_alerts(&self, ids: &[AlertId]) -> StoreResult<usize> {
        let before = self.alerts.lock().await.len();
        self.alerts.lock().await.retain(|a| a.id.as_ref().map(|id| !ids.contains(id)).unwrap_or(true));
        let after = self.alerts.lock().await.len();
        Ok(before - after)
    }

    async fn purge_history_before(&self, _before: DateTime<Utc>) -> StoreResult<usize> {
        Ok(0)
    }
}

#[async_trait]
impl MonitorStore for InMemoryStore {
    async fn get_monitor(&self, id: &MonitorId) -> StoreResult<Monitor> {
        self.monitors.lock().await.get(&id.0).cloned().ok_or_else(|| StoreError::NotFound(format!("{id}")))
    }

    async fn list_enabled_monitors(&self) -> StoreResult<Vec<Monitor>> {
        Ok(self.monitors.lock().await.values().filter(|m| m.enabled).cloned().collect())
    }

    async fn update_fired_triggers(&self, monitor_id: &MonitorId, fired_trigger_ids: &[TriggerId], fired_at: DateTime<Utc>) -> StoreResult<()> {
        if let Some(monitor) = self.monitors.lock().await.get_mut(&monitor_id.0) {
            monitor.record_fired_triggers(fired_trigger_ids, fired_at);
        }
        Ok(())
    }
}
