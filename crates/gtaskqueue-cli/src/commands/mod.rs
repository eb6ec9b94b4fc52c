//! Command handlers and the verb registry.
//!
//! Each verb resolves to a [`TaskCommand`] built from the queue reference and
//! its own arguments. Construction performs usage validation so that bad flags
//! are reported before any credential is touched.

mod clear;
mod tasks;

use async_trait::async_trait;
use gtaskqueue_api::{QueueRef, TasksApi};
use serde_json::Value;

use crate::cli::Command;
use crate::client::CliResult;

pub(crate) use clear::ClearQueue;
pub(crate) use tasks::{DeleteTask, GetTask, LeaseTask, ListTasks};

/// A single verb, ready to run against an API handle.
#[async_trait]
pub(crate) trait TaskCommand: Send + Sync {
    /// Issue the request(s) and return the raw result.
    async fn execute(&self, api: &dyn TasksApi) -> CliResult<Value>;

    /// Shape the result for display.
    fn present(&self, result: Value) -> Value {
        result
    }
}

fn boxed<C: TaskCommand + 'static>(command: CliResult<C>) -> CliResult<Box<dyn TaskCommand>> {
    command.map(|command| Box::new(command) as Box<dyn TaskCommand>)
}

/// Resolve a parsed verb to its command.
pub(crate) fn build(command: Command, queue: &QueueRef) -> CliResult<Box<dyn TaskCommand>> {
    match command {
        Command::GetTask(args) => boxed(Ok(GetTask::new(queue, args))),
        Command::DeleteTask(args) => boxed(Ok(DeleteTask::new(queue, args))),
        Command::ListTasks(args) => boxed(Ok(ListTasks::new(queue, args))),
        Command::LeaseTask(args) => boxed(LeaseTask::new(queue, args)),
        Command::Clear(args) => boxed(Ok(ClearQueue::new(queue, args))),
    }
}

/// Execute `command` and shape its result for printing.
pub(crate) async fn run_command(command: &dyn TaskCommand, api: &dyn TasksApi) -> CliResult<Value> {
    let result = command.execute(api).await?;
    Ok(command.present(result))
}
