use async_trait::async_trait;
use gtaskqueue_api::{LeaseTasksRequest, ListOptions, QueueRef, Task, TasksApi};
use serde_json::{Value, json};

use crate::cli::{LeaseArgs, ListArgs, TaskArgs};
use crate::client::{CliError, CliResult};
use crate::commands::TaskCommand;
use crate::output::{elide_payloads, to_json};

/// Fetch one task.
#[derive(Debug)]
pub(crate) struct GetTask {
    name: String,
}

impl GetTask {
    pub(crate) fn new(queue: &QueueRef, args: TaskArgs) -> Self {
        Self {
            name: queue.task(&args.task_name),
        }
    }
}

#[async_trait]
impl TaskCommand for GetTask {
    async fn execute(&self, api: &dyn TasksApi) -> CliResult<Value> {
        let task = api.get(&self.name).await?;
        to_json(&task)
    }
}

/// Delete one task.
#[derive(Debug)]
pub(crate) struct DeleteTask {
    name: String,
}

impl DeleteTask {
    pub(crate) fn new(queue: &QueueRef, args: TaskArgs) -> Self {
        Self {
            name: queue.task(&args.task_name),
        }
    }
}

#[async_trait]
impl TaskCommand for DeleteTask {
    async fn execute(&self, api: &dyn TasksApi) -> CliResult<Value> {
        api.delete(&self.name).await?;
        tracing::info!(task = %self.name, "task deleted");
        Ok(json!({}))
    }
}

/// List the tasks of a queue (one page).
#[derive(Debug)]
pub(crate) struct ListTasks {
    parent: String,
    options: ListOptions,
}

impl ListTasks {
    pub(crate) fn new(queue: &QueueRef, args: ListArgs) -> Self {
        Self {
            parent: queue.name(),
            options: ListOptions {
                response_view: args.response_view.into(),
                page_size: args.page_size,
                page_token: args.page_token,
            },
        }
    }
}

#[async_trait]
impl TaskCommand for ListTasks {
    async fn execute(&self, api: &dyn TasksApi) -> CliResult<Value> {
        let page = api.list(&self.parent, &self.options).await?;
        to_json(&page)
    }
}

/// Lease tasks and show them with oversized payloads elided.
#[derive(Debug)]
pub(crate) struct LeaseTask {
    parent: String,
    request: LeaseTasksRequest,
    payload_size_to_display: usize,
}

impl LeaseTask {
    pub(crate) fn new(queue: &QueueRef, args: LeaseArgs) -> CliResult<Self> {
        let lease_secs = args
            .lease_secs
            .filter(|secs| *secs > 0)
            .ok_or_else(|| CliError::validation("lease_secs must be specified"))?;
        if args.num_tasks == 0 {
            return Err(CliError::validation("num_tasks must be at least 1"));
        }
        Ok(Self {
            parent: queue.name(),
            request: LeaseTasksRequest::new(args.num_tasks, lease_secs),
            payload_size_to_display: args.payload_size_to_display,
        })
    }
}

#[async_trait]
impl TaskCommand for LeaseTask {
    async fn execute(&self, api: &dyn TasksApi) -> CliResult<Value> {
        let leased = api.lease(&self.parent, &self.request).await?;
        let payload_bytes: usize = leased.tasks.iter().map(Task::payload_len).sum();
        tracing::info!(count = leased.tasks.len(), payload_bytes, "tasks leased");
        to_json(&leased)
    }

    fn present(&self, result: Value) -> Value {
        elide_payloads(result, self.payload_size_to_display)
    }
}
