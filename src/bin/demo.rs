//! Demo binary wiring a [`MonitorRunner`] and [`SweeperHandle`] against a
//! SQLite-backed store, an in-memory PQL executor fixture, and a logging
//! notifier — the equivalent of the hub's `hub.rs` entry point, minus the
//! API server and collector fan-out this crate has no counterpart for.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

use alerting_engine::alert_store::SqliteAlertStore;
use alerting_engine::clock::SystemClock;
use alerting_engine::external::{FixedLeadership, HandlebarsTemplateEngine, InMemoryPqlExecutor, LoggingNotifier};
use alerting_engine::model::monitor::{Monitor, MonitorId, Owner, QueryLanguage, Schedule, ScheduleUnit};
use alerting_engine::model::trigger::{Action, ComparisonOp, Trigger, TriggerCondition, TriggerId, TriggerMode};
use alerting_engine::model::alert::AlertSeverity;
use alerting_engine::query::{Column, QueryResponse};
use alerting_engine::runner::MonitorRunner;
use alerting_engine::settings::SettingsHandle;
use alerting_engine::sweeper::SweeperHandle;

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Path to the SQLite database file backing alerts and monitors
    #[arg(short, long, default_value = "./alerting-demo.db")]
    db: String,

    /// Run the seeded monitor once and exit, instead of looping
    #[arg(long)]
    once: bool,
}

fn init_tracing() {
    let filter = filter::Targets::new().with_targets(vec![("alerting_engine", LevelFilter::DEBUG)]);
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn seed_monitor() -> Monitor {
    Monitor {
        id: MonitorId("demo-monitor".into()),
        version: 1,
        name: "disk usage spikes".into(),
        enabled: true,
        enabled_time: Some(chrono::Utc::now()),
        owner: Owner { principal_name: "demo-user".into(), backend_roles: vec!["admin".into()], roles: vec![] },
        schedule: Schedule { interval: 1, unit: ScheduleUnit::Minutes },
        look_back_window_minutes: Some(15),
        timestamp_field: "@timestamp".into(),
        query_language: QueryLanguage::Pql,
        query: "source=logs | stats count() as cnt by host".into(),
        triggers: vec![Trigger {
            id: TriggerId("high-volume".into()),
            name: "high volume".into(),
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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let store = Arc::new(SqliteAlertStore::new(&args.db).await?);

    let monitor = seed_monitor();
    store.put_monitor(&monitor).await?;
    info!(monitor_id = %monitor.id, "seeded demo monitor");

    let executor = Arc::new(InMemoryPqlExecutor::new());
    executor
        .on_query_containing(
            "source=logs",
            QueryResponse {
                schema: vec![Column { name: "cnt".into(), type_name: "int".into() }, Column { name: "host".into(), type_name: "string".into() }],
                datarows: vec![vec![serde_json::json!(42), serde_json::json!("web-1")]],
                total: 1,
                size: 1,
            },
        )
        .await;

    let settings = SettingsHandle::default();
    let clock = Arc::new(SystemClock);

    let runner = MonitorRunner::new(
        executor,
        Arc::new(LoggingNotifier::new()),
        Arc::new(HandlebarsTemplateEngine),
        store.clone(),
        store.clone(),
        clock.clone(),
        settings.clone(),
    );

    let sweeper = SweeperHandle::spawn(store.clone(), store.clone(), clock, Arc::new(FixedLeadership(true)), settings);

    let result = runner.run(&monitor, false, false).await;
    info!(execution_id = %result.execution_id, fired = result.fired_trigger_ids().len(), "run complete");

    if args.once {
        sweeper.shutdown().await;
        return Ok(());
    }

    info!("press Ctrl+C to shutdown gracefully");
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("unable to listen for shutdown signal: {err}");
    }

    sweeper.shutdown().await;
    info!("demo stopped");
    Ok(())
}
