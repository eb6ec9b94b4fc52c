//! In-memory [`TasksApi`] that records every call.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use gtaskqueue_api::{
    ApiError, ApiResult, LeaseTasksRequest, LeaseTasksResponse, ListOptions, ListTasksResponse,
    Task, TasksApi,
};
use reqwest::StatusCode;

/// One recorded call against [`InMemoryTasksApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// `get(name)`.
    Get(String),
    /// `list(parent, options)`.
    List {
        /// Queue name.
        parent: String,
        /// Options passed by the caller.
        options: ListOptions,
    },
    /// `lease(parent, request)`.
    Lease {
        /// Queue name.
        parent: String,
        /// Lease request body.
        request: LeaseTasksRequest,
    },
    /// `delete(name)`.
    Delete(String),
}

#[derive(Default)]
struct State {
    tasks: VecDeque<Task>,
    calls: Vec<RecordedCall>,
    failing_deletes: BTreeSet<String>,
    page_cap: Option<usize>,
}

/// Queue held in memory; list pages come from the front in insertion order.
#[derive(Default)]
pub struct InMemoryTasksApi {
    state: Mutex<State>,
}

impl InMemoryTasksApi {
    /// Seed the queue with `tasks`.
    #[must_use]
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let api = Self::default();
        api.lock().tasks.extend(tasks);
        api
    }

    /// Make deletion of `name` fail with a 500.
    #[must_use]
    pub fn failing_delete(self, name: impl Into<String>) -> Self {
        self.lock().failing_deletes.insert(name.into());
        self
    }

    /// Cap every list page at `cap` tasks whatever page size is requested,
    /// the way the service may return short pages that still carry a token.
    #[must_use]
    pub fn with_page_cap(self, cap: usize) -> Self {
        self.lock().page_cap = Some(cap);
        self
    }

    /// Every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Number of list calls so far.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.count(|call| matches!(call, RecordedCall::List { .. }))
    }

    /// Number of delete calls so far, failed ones included.
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.count(|call| matches!(call, RecordedCall::Delete(_)))
    }

    /// Tasks still in the queue.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lock().tasks.len()
    }

    fn count(&self, predicate: impl Fn(&RecordedCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(name: &str) -> ApiError {
    ApiError::Status {
        status: StatusCode::NOT_FOUND,
        message: format!("NOT_FOUND: {name}"),
    }
}

#[async_trait]
impl TasksApi for InMemoryTasksApi {
    async fn get(&self, name: &str) -> ApiResult<Task> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::Get(name.to_string()));
        state
            .tasks
            .iter()
            .find(|task| task.name == name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    async fn list(&self, parent: &str, options: &ListOptions) -> ApiResult<ListTasksResponse> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::List {
            parent: parent.to_string(),
            options: options.clone(),
        });
        let requested = options
            .page_size
            .map_or(state.tasks.len(), |size| size as usize);
        let limit = state.page_cap.map_or(requested, |cap| requested.min(cap));
        let tasks: Vec<Task> = state.tasks.iter().take(limit).cloned().collect();
        let next_page_token = (state.tasks.len() > tasks.len()).then(|| "more".to_string());
        Ok(ListTasksResponse {
            tasks,
            next_page_token,
        })
    }

    async fn lease(
        &self,
        parent: &str,
        request: &LeaseTasksRequest,
    ) -> ApiResult<LeaseTasksResponse> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::Lease {
            parent: parent.to_string(),
            request: request.clone(),
        });
        let tasks = state
            .tasks
            .iter()
            .take(request.max_tasks as usize)
            .cloned()
            .collect();
        Ok(LeaseTasksResponse { tasks })
    }

    async fn delete(&self, name: &str) -> ApiResult<()> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::Delete(name.to_string()));
        if state.failing_deletes.contains(name) {
            return Err(ApiError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("INTERNAL: cannot delete {name}"),
            });
        }
        let position = state
            .tasks
            .iter()
            .position(|task| task.name == name)
            .ok_or_else(|| not_found(name))?;
        state.tasks.remove(position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{sample_queue, tasks};

    #[tokio::test]
    async fn list_pages_from_the_front() {
        let queue = sample_queue();
        let api = InMemoryTasksApi::with_tasks(tasks(&queue, 3));
        let options = ListOptions {
            page_size: Some(2),
            ..ListOptions::default()
        };

        let page = api.list(&queue.name(), &options).await.expect("list");
        assert_eq!(page.tasks.len(), 2);
        assert_eq!(page.next_page_token.as_deref(), Some("more"));
        assert_eq!(api.list_calls(), 1);
    }

    #[tokio::test]
    async fn page_cap_shortens_pages_but_keeps_token() {
        let queue = sample_queue();
        let api = InMemoryTasksApi::with_tasks(tasks(&queue, 5)).with_page_cap(2);
        let options = ListOptions {
            page_size: Some(100),
            ..ListOptions::default()
        };

        let page = api.list(&queue.name(), &options).await.expect("list");
        assert_eq!(page.tasks.len(), 2);
        assert_eq!(page.next_page_token.as_deref(), Some("more"));
    }

    #[tokio::test]
    async fn delete_removes_and_records() {
        let queue = sample_queue();
        let api = InMemoryTasksApi::with_tasks(tasks(&queue, 2));

        api.delete(&queue.task("t0")).await.expect("delete");
        assert_eq!(api.remaining(), 1);
        assert!(api.delete(&queue.task("t0")).await.is_err());
        assert_eq!(api.delete_calls(), 2);
    }

    #[tokio::test]
    async fn configured_delete_failure_keeps_task() {
        let queue = sample_queue();
        let api = InMemoryTasksApi::with_tasks(tasks(&queue, 1)).failing_delete(queue.task("t0"));

        let err = api.delete(&queue.task("t0")).await.expect_err("delete fails");
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(api.remaining(), 1);
    }
}
