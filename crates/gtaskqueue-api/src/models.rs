//! Wire DTOs for the `v2beta2` task surface.
//!
//! Tasks are kept mostly opaque: only the name and the pull payload are typed,
//! everything else rides along in `extra` so printed output stays faithful to
//! what the service returned.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A task as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Full resource name (`projects/../queues/../tasks/..`).
    #[serde(default)]
    pub name: String,
    /// Pull-queue message; present on pull tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_message: Option<PullMessage>,
    /// Remaining fields (schedule time, view, status, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Length in bytes of the encoded payload, zero when absent.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.pull_message
            .as_ref()
            .and_then(|message| message.payload.as_deref())
            .map_or(0, str::len)
    }
}

/// Pull message carried by a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullMessage {
    /// Base64-encoded payload bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Optional tag used for lease filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How much of each task the service should return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseView {
    /// Omits large fields such as the payload.
    #[default]
    Basic,
    /// Every field, payload included.
    Full,
}

impl ResponseView {
    /// Query-string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::Full => "FULL",
        }
    }
}

/// Options accepted by the list operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// View requested for each task.
    pub response_view: ResponseView,
    /// Upper bound on tasks per page; the service picks when unset.
    pub page_size: Option<u32>,
    /// Continuation token from a previous page.
    pub page_token: Option<String>,
}

impl ListOptions {
    /// Query pairs for the request URL.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("responseView", self.response_view.as_str().to_string())];
        if let Some(size) = self.page_size {
            pairs.push(("pageSize", size.to_string()));
        }
        if let Some(token) = &self.page_token {
            pairs.push(("pageToken", token.clone()));
        }
        pairs
    }
}

/// Response body of the list operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksResponse {
    /// Tasks in this page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,
    /// Token for the next page, absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Request body of the lease operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseTasksRequest {
    /// Maximum number of tasks to lease.
    pub max_tasks: u32,
    /// Lease duration encoded as `{seconds}s`.
    pub lease_duration: String,
    /// View requested for each leased task.
    pub response_view: ResponseView,
}

impl LeaseTasksRequest {
    /// Lease up to `max_tasks` tasks for `lease_secs` seconds with full payloads.
    #[must_use]
    pub fn new(max_tasks: u32, lease_secs: u64) -> Self {
        Self {
            max_tasks,
            lease_duration: format!("{lease_secs}s"),
            response_view: ResponseView::Full,
        }
    }
}

/// Response body of the lease operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaseTasksResponse {
    /// Leased tasks, possibly empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub(crate) error: ErrorStatus,
}

/// Status payload inside [`ErrorEnvelope`].
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorStatus {
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<String>,
}
