//! Task builders.

use gtaskqueue_api::{PullMessage, QueueRef, Task};

/// Queue used by most tests.
#[must_use]
pub fn sample_queue() -> QueueRef {
    QueueRef::new("acme", "us-central1", "pull")
}

/// A task named `{queue}/tasks/{id}` with no payload.
#[must_use]
pub fn task(queue: &QueueRef, id: &str) -> Task {
    Task {
        name: queue.task(id),
        ..Task::default()
    }
}

/// A task carrying `payload` in its pull message.
#[must_use]
pub fn task_with_payload(queue: &QueueRef, id: &str, payload: &str) -> Task {
    Task {
        name: queue.task(id),
        pull_message: Some(PullMessage {
            payload: Some(payload.to_string()),
            ..PullMessage::default()
        }),
        ..Task::default()
    }
}

/// `count` payload-less tasks with ids `t0..t{count-1}`.
#[must_use]
pub fn tasks(queue: &QueueRef, count: usize) -> Vec<Task> {
    (0..count).map(|index| task(queue, &format!("t{index}"))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_use_queue_names() {
        let queue = sample_queue();
        let built = tasks(&queue, 3);
        assert_eq!(built.len(), 3);
        assert_eq!(
            built[2].name,
            "projects/acme/locations/us-central1/queues/pull/tasks/t2"
        );
        assert_eq!(task_with_payload(&queue, "p", "abcd").payload_len(), 4);
    }
}
