//! Bounded batch deletion.
//!
//! Lists the queue a page at a time and deletes what it sees until the budget
//! runs out or the queue looks empty. Tasks enqueued concurrently by other
//! producers may or may not be picked up; a failed delete aborts the run with
//! earlier deletions already applied.

use async_trait::async_trait;
use gtaskqueue_api::{ListOptions, QueueRef, ResponseView, TasksApi};
use serde::Serialize;
use serde_json::Value;

use crate::cli::ClearArgs;
use crate::client::CliResult;
use crate::commands::TaskCommand;
use crate::output::to_json;

/// Largest page the list call is asked for.
pub(crate) const CLEAR_PAGE_SIZE: u32 = 100;

/// Delete up to `max_delete` tasks from a queue.
#[derive(Debug)]
pub(crate) struct ClearQueue {
    parent: String,
    max_delete: u32,
}

impl ClearQueue {
    pub(crate) fn new(queue: &QueueRef, args: ClearArgs) -> Self {
        Self {
            parent: queue.name(),
            max_delete: args.max_delete,
        }
    }
}

#[async_trait]
impl TaskCommand for ClearQueue {
    async fn execute(&self, api: &dyn TasksApi) -> CliResult<Value> {
        let summary = clear_queue(api, &self.parent, self.max_delete).await?;
        to_json(&summary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct ClearSummary {
    pub(crate) deleted: u32,
}

pub(crate) async fn clear_queue(
    api: &dyn TasksApi,
    parent: &str,
    max_delete: u32,
) -> CliResult<ClearSummary> {
    let options = ListOptions {
        response_view: ResponseView::Basic,
        page_size: Some(CLEAR_PAGE_SIZE),
        page_token: None,
    };
    let mut remaining = max_delete;
    let mut deleted = 0;

    while remaining > 0 {
        let page = api.list(parent, &options).await?;
        if page.tasks.is_empty() {
            break;
        }
        let drained = page.tasks.len() < CLEAR_PAGE_SIZE as usize && page.next_page_token.is_none();

        let mut deleted_this_page = 0;
        for task in page.tasks.iter().take(remaining as usize) {
            eprintln!("Deleting: {}", task.name);
            api.delete(&task.name).await?;
            deleted_this_page += 1;
        }
        remaining -= deleted_this_page;
        deleted += deleted_this_page;
        tracing::info!(deleted_this_page, remaining, "batch cleared");

        if deleted_this_page == 0 || drained {
            break;
        }
    }

    tracing::info!(queue = parent, deleted, "queue cleared");
    Ok(ClearSummary { deleted })
}
