//! The PQL executor's response shape (spec §4.2, §6): `{schema, datarows,
//! total, size}`. The core never parses PQL itself, except the narrow
//! regex the evaluator uses to locate the eval-result column (§4.2).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub schema: Vec<Column>,
    pub datarows: Vec<Vec<Value>>,
    pub total: u64,
    pub size: u64,
}

impl QueryResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index of the named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.iter().position(|c| c.name == name)
    }

    /// Rough serialized size in bytes, used by the evaluator's size
    /// capping (spec §4.2, §4.5) and by the runner's RunResult payload
    /// (the HTTP layer is responsible for its own, possibly stricter,
    /// limits).
    pub fn approximate_size_bytes(&self) -> usize {
        serde_json::to_vec(self).map(|bytes| bytes.len()).unwrap_or(0)
    }
}

/// Parameters passed alongside a composed query string to the executor
/// (spec §6 "PQL executor"). Left as an opaque bag since the core never
/// interprets PQL parameters itself.
pub type QueryParams = serde_json::Map<String, Value>;
