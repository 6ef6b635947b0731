//! Monitor Runner (spec §4.6): one invocation of a monitor's schedule.
//! Orchestrates, per trigger, the composer → throttle gate → query
//! executor → evaluator → materializer → alert store → notifier
//! pipeline, isolating a single trigger's failure from the rest of the
//! run (spec §4.6 step 5, §7).

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::clock::Clock;
use crate::error::Error;
use crate::external::{Notifier, PqlExecutor, RenderedNotification, TemplateEngine, TriggerExecutionContext};
use crate::alert_store::{AlertStore, MonitorStore};
use crate::materializer::{build_alerts, build_error_alert};
use crate::model::alert::{Alert, ExecutionId};
use crate::model::monitor::Monitor;
use crate::model::trigger::{Trigger, TriggerCondition, TriggerId};
use crate::pql;
use crate::principal::with_principal;
use crate::settings::SettingsHandle;
use crate::trigger_eval::{evaluate, is_throttled, materialize_result_slices};

/// What happened to a single trigger during a run, for callers that want
/// run-level observability beyond the persisted alerts themselves.
#[derive(Debug, Clone)]
pub enum TriggerOutcome {
    NotFired,
    Throttled,
    Fired { alert_count: usize },
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct TriggerResult {
    pub trigger_id: TriggerId,
    pub outcome: TriggerOutcome,
}

/// The full outcome of one [`MonitorRunner::run`] invocation (spec §4.6).
#[derive(Debug, Clone)]
pub struct RunResult {
    pub execution_id: ExecutionId,
    pub trigger_results: Vec<TriggerResult>,
    pub alerts: Vec<Alert>,
    /// The executor's response for each trigger that ran, before the
    /// byte-size/row cap the materializer applies (spec §4.6 step 5.4: "a
    /// copy of the *uncapped* response" is kept for the API caller). A
    /// trigger that was throttled has no entry here.
    pub raw_responses: HashMap<TriggerId, crate::query::QueryResponse>,
}

impl RunResult {
    pub fn fired_trigger_ids(&self) -> Vec<TriggerId> {
        self.trigger_results
            .iter()
            .filter(|r| matches!(r.outcome, TriggerOutcome::Fired { .. }))
            .map(|r| r.trigger_id.clone())
            .collect()
    }
}

/// External collaborators a runner needs, bundled so callers construct
/// one of these once and reuse it across every monitor invocation.
pub struct MonitorRunner {
    executor: Arc<dyn PqlExecutor>,
    notifier: Arc<dyn Notifier>,
    templates: Arc<dyn TemplateEngine>,
    alert_store: Arc<dyn AlertStore>,
    monitor_store: Arc<dyn MonitorStore>,
    clock: Arc<dyn Clock>,
    settings: SettingsHandle,
}

impl MonitorRunner {
    pub fn new(
        executor: Arc<dyn PqlExecutor>,
        notifier: Arc<dyn Notifier>,
        templates: Arc<dyn TemplateEngine>,
        alert_store: Arc<dyn AlertStore>,
        monitor_store: Arc<dyn MonitorStore>,
        clock: Arc<dyn Clock>,
        settings: SettingsHandle,
    ) -> Self {
        Self { executor, notifier, templates, alert_store, monitor_store, clock, settings }
    }

    /// Runs one invocation of `monitor` (spec §4.6). `manual` bypasses
    /// throttling (invariant 6); `dry_run` evaluates and materializes
    /// alerts without persisting anything or updating `lastFiredTime`
    /// (useful for a "test monitor" RPC, out of scope here but a natural
    /// caller of this flag).
    #[instrument(skip(self, monitor), fields(monitor_id = %monitor.id, manual, dry_run))]
    pub async fn run(&self, monitor: &Monitor, manual: bool, dry_run: bool) -> RunResult {
        let execution_id = ExecutionId::new();
        let period_end = self.clock.now();
        let window = monitor.lookback_start(period_end).map(|lookback_start| pql::TimeWindow {
            lookback_start,
            period_end,
        });

        let settings = self.settings.current();
        let base_query = pql::compose_time_filtered(&monitor.query, window, &monitor.timestamp_field);

        let mut trigger_results = Vec::with_capacity(monitor.triggers.len());
        let mut alerts_to_save = Vec::new();
        let mut raw_responses = HashMap::new();

        for trigger in &monitor.triggers {
            let outcome = self
                .run_trigger(
                    monitor,
                    trigger,
                    &base_query,
                    period_end,
                    manual,
                    &execution_id,
                    &settings,
                    &mut alerts_to_save,
                    &mut raw_responses,
                )
                .await;
            trigger_results.push(TriggerResult { trigger_id: trigger.id.clone(), outcome });
        }

        let result = RunResult { execution_id: execution_id.clone(), trigger_results, alerts: alerts_to_save, raw_responses };

        if !dry_run {
            self.persist(monitor, &result, period_end).await;
        }

        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_trigger(
        &self,
        monitor: &Monitor,
        trigger: &Trigger,
        base_query: &str,
        period_end: chrono::DateTime<chrono::Utc>,
        manual: bool,
        execution_id: &ExecutionId,
        settings: &crate::settings::Settings,
        alerts_to_save: &mut Vec<Alert>,
        raw_responses: &mut HashMap<TriggerId, crate::query::QueryResponse>,
    ) -> TriggerOutcome {
        if is_throttled(trigger, period_end, manual) {
            debug!(trigger_id = %trigger.id, "trigger throttled, skipping");
            return TriggerOutcome::Throttled;
        }

        let composed = match &trigger.condition {
            TriggerCondition::Custom { fragment } => pql::compose_with_custom_condition(base_query, fragment),
            TriggerCondition::NumberOfResults { .. } => base_query.to_string(),
        };
        let composed = pql::cap(&composed, settings.query_results_max_datarows);

        let owner = monitor.owner.clone();
        let params = serde_json::Map::new();
        let response = with_principal(owner, || async { self.executor.execute(&composed, &params).await }).await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(trigger_id = %trigger.id, error = %err, "query execution failed for trigger");
                let alert = build_error_alert(monitor, trigger, &err.to_string(), period_end, execution_id.clone());
                alerts_to_save.push(alert);
                return TriggerOutcome::Failed { message: err.to_string() };
            }
        };

        raw_responses.insert(trigger.id.clone(), response.clone());

        match evaluate(trigger, &response) {
            Ok(true) => {}
            Ok(false) => return TriggerOutcome::NotFired,
            Err(err) => {
                warn!(trigger_id = %trigger.id, error = %err, "trigger evaluation failed");
                let alert = build_error_alert(monitor, trigger, &err.to_string(), period_end, execution_id.clone());
                alerts_to_save.push(alert);
                return TriggerOutcome::Failed { message: err.to_string() };
            }
        }

        let slices = match materialize_result_slices(
            trigger,
            &response,
            settings.query_results_max_size_bytes,
            settings.per_result_trigger_max_alerts,
        ) {
            Ok(slices) => slices,
            Err(err) => {
                warn!(trigger_id = %trigger.id, error = %err, "materialization failed");
                let alert = build_error_alert(monitor, trigger, &err.to_string(), period_end, execution_id.clone());
                alerts_to_save.push(alert);
                return TriggerOutcome::Failed { message: err.to_string() };
            }
        };

        let alert_count = slices.len();
        let alerts = build_alerts(monitor, trigger, slices, period_end, execution_id.clone());

        for alert in &alerts {
            self.dispatch_notifications(monitor, trigger, alert, execution_id.clone()).await;
        }

        alerts_to_save.extend(alerts);
        info!(trigger_id = %trigger.id, alert_count, "trigger fired");
        TriggerOutcome::Fired { alert_count }
    }

    async fn dispatch_notifications(&self, monitor: &Monitor, trigger: &Trigger, alert: &Alert, execution_id: ExecutionId) {
        let ctx = TriggerExecutionContext::new(monitor, trigger, alert.query_results.clone(), execution_id);

        for action in &trigger.actions {
            let owner = monitor.owner.clone();
            let rendered = match (self.templates.render(&action.subject_template, &ctx), self.templates.render(&action.message_template, &ctx)) {
                (Ok(subject), Ok(message)) => RenderedNotification { destination_id: action.destination_id.clone(), subject, message },
                (subject, message) => {
                    let err = subject.err().or(message.err()).unwrap_or_else(|| Error::fatal("template render failed"));
                    warn!(trigger_id = %trigger.id, error = %err, "notification template render failed");
                    continue;
                }
            };

            if rendered.message.is_empty() {
                let err = Error::validation("rendered notification message is empty");
                warn!(trigger_id = %trigger.id, destination_id = %action.destination_id, error = %err, "notification action failed, skipping send");
                continue;
            }

            let notifier = &self.notifier;
            let result = with_principal(owner, || async { notifier.notify(alert, &rendered).await }).await;
            if let Err(err) = result {
                warn!(trigger_id = %trigger.id, destination_id = %action.destination_id, error = %err, "notification dispatch failed");
            }
        }
    }

    async fn persist(&self, monitor: &Monitor, result: &RunResult, period_end: chrono::DateTime<chrono::Utc>) {
        if !result.alerts.is_empty()
            && let Err(err) = self.alert_store.save_alerts(result.alerts.clone()).await
        {
            error!(monitor_id = %monitor.id, error = %err, "failed to persist alerts for run");
        }

        let fired = result.fired_trigger_ids();
        if !fired.is_empty()
            && let Err(err) = self.monitor_store.update_fired_triggers(&monitor.id, &fired, period_end).await
        {
            error!(monitor_id = %monitor.id, error = %err, "failed to persist lastFiredTime");
        }
    }
}
