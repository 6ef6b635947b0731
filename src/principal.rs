//! Scoped acquisition of a monitor's captured principal (spec §5
//! "Principal context").
//!
//! Every external query/notification call is wrapped in a scoped
//! acquisition of the monitor's stored user, backend roles, and roles,
//! pushed onto a task-local context before the call and released on all
//! exit paths including failure. This replaces calling-user identity with
//! stored-owner identity for the duration of the side effect.

use tokio::task_local;

use crate::model::monitor::Owner;

task_local! {
    static CURRENT_PRINCIPAL: Owner;
}

/// Runs `f` with `owner` installed as the current principal context,
/// guaranteed to be released when `f` completes or panics — `task_local`
/// scoping is itself the guard, there's no separate `Drop` impl needed.
pub async fn with_principal<F, Fut, T>(owner: Owner, f: F) -> T
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = T>,
{
    CURRENT_PRINCIPAL.scope(owner, f()).await
}

/// The principal installed by the nearest enclosing [`with_principal`]
/// call. Panics if called outside such a scope — every suspension point
/// listed in spec §5 is required to run inside one.
pub fn current_principal() -> Owner {
    CURRENT_PRINCIPAL.with(|owner| owner.clone())
}

/// Like [`current_principal`], but returns `None` instead of panicking
/// when called outside a scope (useful in tests that don't care).
pub fn try_current_principal() -> Option<Owner> {
    CURRENT_PRINCIPAL.try_with(|owner| owner.clone()).ok()
}
