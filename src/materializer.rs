//! Alert Materializer (spec §4.4): turns fired-trigger result slices
//! into concrete [`Alert`] documents, and wraps per-trigger execution
//! failures into error alerts with IP-like substrings obfuscated before
//! anything is persisted (spec §7).

use chrono::{DateTime, Utc};

use crate::model::alert::{Alert, AlertId, AlertSeverity, ExecutionId};
use crate::model::monitor::Monitor;
use crate::model::trigger::Trigger;
use crate::trigger_eval::evaluator::ResultSlice;
use crate::util::obfuscate_ips;

/// Builds one alert per [`ResultSlice`] produced by the evaluator for a
/// fired trigger (spec §4.2, §4.4). `triggered_time` is the run's period
/// end; `expiration_time` is derived from the trigger's
/// `expireDurationMinutes` (invariant 4, spec §8).
pub fn build_alerts(
    monitor: &Monitor,
    trigger: &Trigger,
    slices: Vec<ResultSlice>,
    triggered_time: DateTime<Utc>,
    execution_id: ExecutionId,
) -> Vec<Alert> {
    let expiration_time = triggered_time + chrono::Duration::minutes(trigger.expire_duration_minutes as i64);

    slices
        .into_iter()
        .map(|slice| Alert {
            id: None,
            monitor_id: monitor.id.clone(),
            monitor_name: monitor.name.clone(),
            monitor_version: monitor.version,
            monitor_user: monitor.owner.clone(),
            trigger_id: trigger.id.clone(),
            trigger_name: trigger.name.clone(),
            query: monitor.query.clone(),
            query_results: slice.response,
            triggered_time,
            expiration_time,
            severity: trigger.severity,
            error_message: None,
            execution_id: execution_id.clone(),
        })
        .collect()
}

/// Builds a single error alert for a trigger whose evaluation failed
/// (spec §4.4, §4.6 step 5 "isolated per trigger"). The error message is
/// obfuscated before the alert is ever handed to the store.
pub fn build_error_alert(
    monitor: &Monitor,
    trigger: &Trigger,
    error_message: &str,
    triggered_time: DateTime<Utc>,
    execution_id: ExecutionId,
) -> Alert {
    let expiration_time = triggered_time + chrono::Duration::minutes(trigger.expire_duration_minutes as i64);

    Alert {
        id: None,
        monitor_id: monitor.id.clone(),
        monitor_name: monitor.name.clone(),
        monitor_version: monitor.version,
        monitor_user: monitor.owner.clone(),
        trigger_id: trigger.id.clone(),
        trigger_name: trigger.name.clone(),
        query: monitor.query.clone(),
        query_results: crate::query::QueryResponse::empty(),
        triggered_time,
        expiration_time,
        severity: AlertSeverity::Error,
        error_message: Some(obfuscate_ips(error_message)),
        execution_id,
    }
}

impl Alert {
    /// Convenience for tests/demo code that need to preset an id (spec
    /// §4.5 "re-save path").
    pub fn with_id(mut self, id: AlertId) -> Self {
        self.id = Some(id);
        self
    }
}
