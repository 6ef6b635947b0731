//! Monitor document (spec §3 "Monitor").
//!
//! A monitor is mutated only through the create/update RPC (external,
//! §1) or, internally, by the Monitor Runner strictly to persist each
//! trigger's `lastFiredTime` (spec §4.5, §4.6 step 6). Nothing else in
//! this crate should construct a `Monitor` by hand outside of tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::trigger::Trigger;

/// Monitor identity. Distinct from [`crate::model::trigger::TriggerId`] so
/// the two can never be accidentally swapped at a call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorId(pub String);

impl std::fmt::Display for MonitorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unit for [`Schedule::interval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleUnit {
    Minutes,
    Hours,
    Days,
}

/// How often the external scheduler should invoke this monitor. The
/// scheduler itself is out of scope (§1) — this is just the knob it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub interval: u32,
    pub unit: ScheduleUnit,
}

/// Snapshot of the principal that owns a monitor (spec §5 "Principal
/// context"). Captured at create/update time and stored on the monitor so
/// runs execute under the owner's identity rather than the calling user's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub principal_name: String,
    pub backend_roles: Vec<String>,
    pub roles: Vec<String>,
}

/// The query language a monitor's `query` is written in. Today only PQL
/// exists; keeping this as a tag (rather than matching on it everywhere)
/// leaves room for the sibling "SearchInput" monitor variant from spec §9
/// without reshaping this struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryLanguage {
    Pql,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor {
    pub id: MonitorId,
    pub version: u64,
    pub name: String,
    pub enabled: bool,
    pub enabled_time: Option<DateTime<Utc>>,
    pub owner: Owner,
    pub schedule: Schedule,
    pub look_back_window_minutes: Option<u32>,
    pub timestamp_field: String,
    pub query_language: QueryLanguage,
    pub query: String,
    pub triggers: Vec<Trigger>,
}

impl Monitor {
    /// Validates the invariants from spec §8 (1-3) that are checkable
    /// purely from the monitor document: enabled/enabled-time consistency,
    /// trigger count, and per-trigger duration bounds.
    pub fn validate(&self) -> Result<()> {
        if self.enabled != self.enabled_time.is_some() {
            return Err(Error::validation(
                "monitor.enabled must be set iff enabledTime is set",
            ));
        }

        if self.triggers.is_empty() || self.triggers.len() > 10 {
            return Err(Error::validation(format!(
                "monitor must have between 1 and 10 triggers, got {}",
                self.triggers.len()
            )));
        }

        if self.look_back_window_minutes.is_some() && self.timestamp_field.trim().is_empty() {
            return Err(Error::validation(
                "timestampField is required when lookBackWindow is set",
            ));
        }

        for trigger in &self.triggers {
            trigger.validate()?;
        }

        Ok(())
    }

    /// The lower bound of the lookback window ending at `period_end`, or
    /// `None` if the monitor has no lookback window configured. Used by
    /// the composer (spec §4.1) and by the runner (spec §4.6 step 4).
    pub fn lookback_start(&self, period_end: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.look_back_window_minutes
            .map(|minutes| period_end - chrono::Duration::minutes(minutes as i64))
    }

    /// Applies `now` to every trigger that fired this run, preserving
    /// trigger and action ids (spec §9 "Open question — id stability").
    /// Internal-only mutation path, distinct from the create/update RPC.
    pub fn record_fired_triggers(&mut self, fired_trigger_ids: &[crate::model::trigger::TriggerId], now: DateTime<Utc>) {
        for trigger in &mut self.triggers {
            if fired_trigger_ids.contains(&trigger.id) {
                trigger.last_fired_time = Some(now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::trigger::{ComparisonOp, Trigger, TriggerCondition, TriggerId, TriggerMode};
    use crate::model::AlertSeverity;

    fn sample_trigger() -> Trigger {
        Trigger {
            id: TriggerId("t1".into()),
            name: "t1".into(),
            severity: AlertSeverity::Warn,
            mode: TriggerMode::ResultSet,
            condition: TriggerCondition::NumberOfResults {
                op: ComparisonOp::Gt,
                value: 0,
            },
            throttle_duration_minutes: None,
            expire_duration_minutes: 60,
            actions: vec![],
            last_fired_time: None,
        }
    }

    fn sample_monitor() -> Monitor {
        Monitor {
            id: MonitorId("m1".into()),
            version: 1,
            name: "sample".into(),
            enabled: true,
            enabled_time: Some(Utc::now()),
            owner: Owner {
                principal_name: "alice".into(),
                backend_roles: vec![],
                roles: vec![],
            },
            schedule: Schedule {
                interval: 1,
                unit: ScheduleUnit::Minutes,
            },
            look_back_window_minutes: None,
            timestamp_field: "@timestamp".into(),
            query_language: QueryLanguage::Pql,
            query: "source = logs".into(),
            triggers: vec![sample_trigger()],
        }
    }

    #[test]
    fn enabled_time_mismatch_is_rejected() {
        let mut m = sample_monitor();
        m.enabled_time = None;
        assert!(matches!(m.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn trigger_count_bounds_are_enforced() {
        let mut m = sample_monitor();
        m.triggers.clear();
        assert!(m.validate().is_err());

        for i in 0..11 {
            let mut t = sample_trigger();
            t.id = TriggerId(format!("t{i}"));
            m.triggers.push(t);
        }
        assert!(m.validate().is_err());
    }

    #[test]
    fn record_fired_triggers_preserves_other_triggers_timestamps() {
        let mut m = sample_monitor();
        let mut second = sample_trigger();
        second.id = TriggerId("t2".into());
        m.triggers.push(second);

        let now = Utc::now();
        m.record_fired_triggers(&[TriggerId("t1".into())], now);

        assert_eq!(m.triggers[0].last_fired_time, Some(now));
        assert_eq!(m.triggers[1].last_fired_time, None);
    }
}
