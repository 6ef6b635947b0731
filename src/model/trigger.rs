//! Trigger definition (spec §3 "Trigger").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::alert::AlertSeverity;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerId(pub String);

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a trigger produces one alert per matching row, or a single
/// alert for the whole result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerMode {
    ResultSet,
    PerResult,
}

/// Tag derived from [`TriggerCondition`]; kept as its own type because it
/// is wire-visible independent of the condition payload (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionType {
    NumberOfResults,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl ComparisonOp {
    pub fn apply(&self, total: u64, value: u64) -> bool {
        match self {
            ComparisonOp::Gt => total > value,
            ComparisonOp::Gte => total >= value,
            ComparisonOp::Lt => total < value,
            ComparisonOp::Lte => total <= value,
            ComparisonOp::Eq => total == value,
            ComparisonOp::Ne => total != value,
        }
    }
}

/// Exactly one of these is present on a trigger, selected by
/// `conditionType` (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "conditionType")]
pub enum TriggerCondition {
    #[serde(rename = "NUMBER_OF_RESULTS")]
    NumberOfResults { op: ComparisonOp, value: u64 },
    /// `fragment` is a PQL snippet producing an `eval <name> = <bool-expr>`
    /// column; the column name is extracted by the evaluator (spec §4.2).
    #[serde(rename = "CUSTOM")]
    Custom { fragment: String },
}

impl TriggerCondition {
    pub fn condition_type(&self) -> ConditionType {
        match self {
            TriggerCondition::NumberOfResults { .. } => ConditionType::NumberOfResults,
            TriggerCondition::Custom { .. } => ConditionType::Custom,
        }
    }
}

/// A destination to notify when a trigger's slices are materialized into
/// alerts (spec §3, §4.6). Template expansion itself is delegated to an
/// external [`crate::external::TemplateEngine`]; this just carries the
/// raw templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub destination_id: String,
    pub subject_template: String,
    pub message_template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub id: TriggerId,
    pub name: String,
    pub severity: AlertSeverity,
    pub mode: TriggerMode,
    pub condition: TriggerCondition,
    pub throttle_duration_minutes: Option<u32>,
    pub expire_duration_minutes: u32,
    pub actions: Vec<Action>,
    /// Mutable field, updated only by the Monitor Runner (spec §3, §4.6).
    pub last_fired_time: Option<DateTime<Utc>>,
}

impl Trigger {
    pub fn condition_type(&self) -> ConditionType {
        self.condition.condition_type()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(throttle) = self.throttle_duration_minutes
            && throttle < 1
        {
            return Err(Error::validation(format!(
                "trigger {}: throttleDuration must be >= 1 minute",
                self.id
            )));
        }

        if self.expire_duration_minutes < 1 {
            return Err(Error::validation(format!(
                "trigger {}: expireDuration must be >= 1 minute",
                self.id
            )));
        }

        if let TriggerCondition::Custom { fragment } = &self.condition
            && fragment.trim().is_empty()
        {
            return Err(Error::validation(format!(
                "trigger {}: CUSTOM condition requires a non-empty fragment",
                self.id
            )));
        }

        Ok(())
    }
}
