//! Trigger Evaluator (spec §4.2).

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::model::trigger::{Trigger, TriggerCondition, TriggerMode};
use crate::query::QueryResponse;

/// One alert-sized portion of a query response (spec Glossary "Slice").
#[derive(Debug, Clone)]
pub struct ResultSlice {
    pub response: QueryResponse,
}

fn eval_column_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\beval\s+([A-Za-z_]\w*)\s*=").expect("static regex is valid"))
}

/// Locates the column name produced by a `CUSTOM` condition's `eval <name>
/// = <bool-expr>` fragment (spec §4.2).
pub fn custom_condition_column(fragment: &str) -> Result<String> {
    eval_column_regex()
        .captures(fragment)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            Error::query_failed(format!(
                "custom condition fragment has no `eval <name> = …` assignment: {fragment}"
            ))
        })
}

/// A JSON value is "truthy" for the purposes of a CUSTOM trigger's
/// eval-result column if it isn't one of JSON's natural falsy forms.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !matches!(s.as_str(), "" | "false" | "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Decides `fired/not-fired` for a trigger given the raw query response
/// (spec §4.2).
pub fn evaluate(trigger: &Trigger, response: &QueryResponse) -> Result<bool> {
    match &trigger.condition {
        TriggerCondition::NumberOfResults { op, value } => Ok(op.apply(response.total, *value)),
        TriggerCondition::Custom { fragment } => {
            let column = custom_condition_column(fragment)?;
            let idx = response.column_index(&column).ok_or_else(|| {
                Error::not_found(format!(
                    "eval column `{column}` not present in query response schema"
                ))
            })?;

            Ok(response
                .datarows
                .iter()
                .any(|row| row.get(idx).map(is_truthy).unwrap_or(false)))
        }
    }
}

/// Which rows in `response` "satisfy" the trigger, for PER_RESULT slicing.
/// For a CUSTOM condition this is every row whose eval column is truthy.
/// A NUMBER_OF_RESULTS condition is not row-scoped, so once the trigger
/// has fired every row in the response is considered matching (see
/// DESIGN.md for this open-question resolution).
fn matching_row_indices(trigger: &Trigger, response: &QueryResponse) -> Result<Vec<usize>> {
    match &trigger.condition {
        TriggerCondition::NumberOfResults { .. } => Ok((0..response.datarows.len()).collect()),
        TriggerCondition::Custom { fragment } => {
            let column = custom_condition_column(fragment)?;
            let idx = response.column_index(&column).ok_or_else(|| {
                Error::not_found(format!(
                    "eval column `{column}` not present in query response schema"
                ))
            })?;

            Ok(response
                .datarows
                .iter()
                .enumerate()
                .filter(|(_, row)| row.get(idx).map(is_truthy).unwrap_or(false))
                .map(|(i, _)| i)
                .collect())
        }
    }
}

/// Size-caps a slice's response in place (spec §4.2): if the serialized
/// size exceeds `max_result_bytes`, `datarows` is replaced by a single
/// explanatory row while `schema`, `total`, `size` are preserved.
fn cap_slice_size(mut response: QueryResponse, max_result_bytes: usize) -> QueryResponse {
    if response.approximate_size_bytes() > max_result_bytes {
        response.datarows = vec![vec![Value::String(
            "The … results were too large and thus excluded".to_string(),
        )]];
    }
    response
}

/// Builds the per-alert payloads for a fired trigger (spec §4.2).
pub fn materialize_result_slices(
    trigger: &Trigger,
    response: &QueryResponse,
    max_result_bytes: usize,
    max_alerts: usize,
) -> Result<Vec<ResultSlice>> {
    match trigger.mode {
        TriggerMode::ResultSet => Ok(vec![ResultSlice {
            response: cap_slice_size(response.clone(), max_result_bytes),
        }]),
        TriggerMode::PerResult => {
            let indices = matching_row_indices(trigger, response)?;
            Ok(indices
                .into_iter()
                .take(max_alerts)
                .map(|idx| {
                    let row_response = QueryResponse {
                        schema: response.schema.clone(),
                        datarows: vec![response.datarows[idx].clone()],
                        total: 1,
                        size: 1,
                    };
                    ResultSlice {
                        response: cap_slice_size(row_response, max_result_bytes),
                    }
                })
                .collect())
        }
    }
}
