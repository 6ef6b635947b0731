//! The PQL executor collaborator (spec §6): accepts `{query, params}` and
//! returns `{schema, datarows, total, size}`. Authoritative for PQL syntax
//! and semantics; never implemented for real inside this crate.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::query::{QueryParams, QueryResponse};

#[async_trait]
pub trait PqlExecutor: Send + Sync {
    async fn execute(&self, query: &str, params: &QueryParams) -> Result<QueryResponse>;
}

/// A minimal in-memory test double: queries are resolved by an exact
/// match against a fixture table keyed on the literal composed query
/// string. Not a PQL implementation — just enough to drive integration
/// tests and the demo binary without a real search cluster (§1 scope).
#[derive(Default)]
pub struct InMemoryPqlExecutor {
    fixtures: Mutex<HashMap<String, QueryResponse>>,
}

impl InMemoryPqlExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a canned response for queries whose composed text
    /// *contains* `query_substring`. Later registrations win ties, so
    /// register broad fixtures first and overrides after.
    pub async fn on_query_containing(&self, query_substring: impl Into<String>, response: QueryResponse) {
        self.fixtures.lock().await.insert(query_substring.into(), response);
    }
}

#[async_trait]
impl PqlExecutor for InMemoryPqlExecutor {
    async fn execute(&self, query: &str, _params: &QueryParams) -> Result<QueryResponse> {
        let fixtures = self.fixtures.lock().await;
        fixtures
            .iter()
            .find(|(substring, _)| query.contains(substring.as_str()))
            .map(|(_, response)| response.clone())
            .ok_or_else(|| Error::query_failed(format!("no fixture registered matching query: {query}")))
    }
}
