use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final snapshot of a stopped session, handed to external persistence.
/// Wall-clock bounds come from the host clock; `active_ms` spans the
/// first to the last observed frame timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub rep_count: u32,
    pub active_ms: u64,
}
