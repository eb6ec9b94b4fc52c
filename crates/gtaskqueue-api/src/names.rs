//! Canonical resource paths.
//!
//! Every request addresses a queue or a task through a hierarchical name of
//! the form `projects/{p}/locations/{l}/queues/{q}[/tasks/{t}]`. Inputs are
//! taken as-is; callers own validation.

use std::fmt::{self, Display, Formatter};

/// Build the resource name of a queue.
#[must_use]
pub fn queue_name(project: &str, location: &str, queue: &str) -> String {
    format!("projects/{project}/locations/{location}/queues/{queue}")
}

/// Build the resource name of a task inside a queue.
#[must_use]
pub fn task_name(project: &str, location: &str, queue: &str, task: &str) -> String {
    format!("{}/tasks/{task}", queue_name(project, location, queue))
}

/// Coordinates of a queue, shared by every command of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRef {
    /// Project identifier.
    pub project: String,
    /// Location (region) hosting the queue.
    pub location: String,
    /// Queue identifier.
    pub queue: String,
}

impl QueueRef {
    /// Construct a queue reference.
    #[must_use]
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        queue: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            location: location.into(),
            queue: queue.into(),
        }
    }

    /// Resource name of the queue itself.
    #[must_use]
    pub fn name(&self) -> String {
        queue_name(&self.project, &self.location, &self.queue)
    }

    /// Resource name of a task in this queue.
    #[must_use]
    pub fn task(&self, task: &str) -> String {
        task_name(&self.project, &self.location, &self.queue, task)
    }
}

impl Display for QueueRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.name())
    }
}
