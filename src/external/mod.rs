//! External collaborators (spec §6): the search cluster query executor
//! and the notification dispatcher are both authoritative systems this
//! crate calls into but never reimplements, matching how the hub treats
//! `discord::post_webhook` as a boundary rather than inlining Discord's
//! API. The leadership signal is the one addition the distilled spec
//! only implies (§4.7) but never names a trait for.

pub mod leadership;
pub mod notifier;
pub mod pql_executor;
pub mod template;

pub use leadership::{FixedLeadership, LeadershipSource, WatchLeadership};
pub use notifier::{LoggingNotifier, Notifier, RenderedNotification};
pub use pql_executor::{InMemoryPqlExecutor, PqlExecutor};
pub use template::{HandlebarsTemplateEngine, TemplateEngine, TriggerExecutionContext};
