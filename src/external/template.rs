//! Subject/message rendering for trigger actions (spec §3 "Action",
//! §4.6 step 6). Templates use handlebars `{{ctx.field}}` placeholders
//! bound against the firing trigger's execution context, the same
//! mustache-like templating family as the hub's Discord embed rendering
//! in `discord.rs`, swapped to handlebars because that's what
//! other_examples/ reaches for when a crate needs a general-purpose
//! template language rather than a bespoke one.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::alert::ExecutionId;
use crate::model::monitor::{Monitor, Owner};
use crate::model::trigger::Trigger;
use crate::query::QueryResponse;

/// Bound into every template render (spec §3 "ctx" variables referenced
/// by `subject_template`/`message_template`).
#[derive(Debug, Clone, Serialize)]
pub struct TriggerExecutionContext {
    pub monitor_id: String,
    pub monitor_name: String,
    pub monitor_owner: Owner,
    pub trigger_id: String,
    pub trigger_name: String,
    pub query: String,
    pub results: QueryResponse,
    pub execution_id: ExecutionId,
}

impl TriggerExecutionContext {
    pub fn new(monitor: &Monitor, trigger: &Trigger, results: QueryResponse, execution_id: ExecutionId) -> Self {
        TriggerExecutionContext {
            monitor_id: monitor.id.0.clone(),
            monitor_name: monitor.name.clone(),
            monitor_owner: monitor.owner.clone(),
            trigger_id: trigger.id.0.clone(),
            trigger_name: trigger.name.clone(),
            query: monitor.query.clone(),
            results,
            execution_id,
        }
    }
}

pub trait TemplateEngine: Send + Sync {
    fn render(&self, template: &str, ctx: &TriggerExecutionContext) -> Result<String>;
}

/// Default engine, backed by `handlebars`. Templates are rendered
/// standalone — not precompiled and cached — since triggers are edited
/// far more often than they fire (mirrors the hub's approach of
/// formatting Discord embed strings fresh on every notification rather
/// than templating a persistent registry).
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlebarsTemplateEngine;

impl TemplateEngine for HandlebarsTemplateEngine {
    fn render(&self, template: &str, ctx: &TriggerExecutionContext) -> Result<String> {
        let registry = Handlebars::new();
        registry
            .render_template(template, ctx)
            .map_err(|e| Error::validation(format!("template render failed: {e}")))
    }
}
