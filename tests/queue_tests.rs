//! Integration tests for job admission, FIFO dispatch and cancellation.

mod common;

use articleforge::{ForgeError, JobStatus};
use common::{engine_with_backend, topic_request, wait_for_terminal, MockBackend};
use std::time::Duration;

// ============================================================================
// Submission and validation
// ============================================================================

#[tokio::test]
async fn test_submit_returns_queued_snapshot() {
    let backend = MockBackend::new("mock-a");
    let engine = engine_with_backend(backend).await;

    let job = engine.submit_job("alice", topic_request(&["rust"])).await.unwrap();

    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.queue_position, Some(1));
    assert_eq!(job.completed_count, 0);
    assert_eq!(job.failed_count, 0);
    assert_eq!(job.progress, 0);
}

#[tokio::test]
async fn test_submit_rejects_zero_articles() {
    let backend = MockBackend::new("mock-a");
    let engine = engine_with_backend(backend).await;

    let mut request = topic_request(&["rust"]);
    request.article_count = 0;

    let result = engine.submit_job("alice", request).await;
    assert!(matches!(result, Err(ForgeError::Validation(_))));
}

#[tokio::test]
async fn test_submit_rejects_oversized_bulk() {
    let backend = MockBackend::new("mock-a");
    let engine = engine_with_backend(backend).await;

    let mut request = topic_request(&["rust"]);
    request.article_count = 51;

    let result = engine.submit_job("alice", request).await;
    assert!(matches!(result, Err(ForgeError::Validation(_))));
}

#[tokio::test]
async fn test_submit_requires_topics() {
    let backend = MockBackend::new("mock-a");
    let engine = engine_with_backend(backend).await;

    let mut request = topic_request(&[]);
    request.article_count = 1;

    let result = engine.submit_job("alice", request).await;
    assert!(matches!(result, Err(ForgeError::Validation(_))));
}

// ============================================================================
// FIFO ordering
// ============================================================================

#[tokio::test]
async fn test_queue_positions_increase_in_submission_order() {
    // A slow backend keeps later submissions waiting in the queue.
    let backend = MockBackend::with_delay("mock-a", Duration::from_millis(300));
    let engine = engine_with_backend(backend).await;

    let first = engine.submit_job("alice", topic_request(&["one"])).await.unwrap();
    // Give the dispatcher time to move the first job into processing.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = engine.submit_job("alice", topic_request(&["two"])).await.unwrap();
    let third = engine.submit_job("alice", topic_request(&["three"])).await.unwrap();
    let fourth = engine.submit_job("alice", topic_request(&["four"])).await.unwrap();

    let p2 = second.queue_position.unwrap();
    let p3 = third.queue_position.unwrap();
    let p4 = fourth.queue_position.unwrap();
    assert!(p2 < p3 && p3 < p4);

    wait_for_terminal(&engine, &first.id, "alice").await;
    wait_for_terminal(&engine, &fourth.id, "alice").await;
}

#[tokio::test]
async fn test_dispatch_order_equals_submission_order() {
    let backend = MockBackend::with_delay("mock-a", Duration::from_millis(20));
    let engine = engine_with_backend(backend.clone()).await;

    let mut ids = Vec::new();
    for topic in ["one", "two", "three", "four", "five"] {
        let job = engine.submit_job("alice", topic_request(&[topic])).await.unwrap();
        ids.push(job.id);
    }

    for id in &ids {
        wait_for_terminal(&engine, id, "alice").await;
    }

    let prompts = backend.recorded_prompts().await;
    assert_eq!(prompts.len(), 5);
    for (prompt, topic) in prompts.iter().zip(["one", "two", "three", "four", "five"]) {
        assert!(prompt.contains(topic), "expected '{}' in '{}'", topic, prompt);
    }
}

// ============================================================================
// Query and listing
// ============================================================================

#[tokio::test]
async fn test_get_is_scoped_to_owner() {
    let backend = MockBackend::new("mock-a");
    let engine = engine_with_backend(backend).await;

    let job = engine.submit_job("alice", topic_request(&["rust"])).await.unwrap();

    let result = engine.get_job(&job.id, "bob").await;
    assert!(matches!(result, Err(ForgeError::NotFound(_))));
}

#[tokio::test]
async fn test_list_filters_by_status_and_owner() {
    let backend = MockBackend::new("mock-a");
    let engine = engine_with_backend(backend).await;

    let first = engine.submit_job("alice", topic_request(&["one"])).await.unwrap();
    let second = engine.submit_job("alice", topic_request(&["two"])).await.unwrap();
    wait_for_terminal(&engine, &first.id, "alice").await;
    wait_for_terminal(&engine, &second.id, "alice").await;

    let completed = engine.list_jobs("alice", Some(JobStatus::Completed)).await;
    assert_eq!(completed.len(), 2);

    let queued = engine.list_jobs("alice", Some(JobStatus::Queued)).await;
    assert!(queued.is_empty());

    let foreign = engine.list_jobs("bob", None).await;
    assert!(foreign.is_empty());
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_queued_job_runs_no_tasks() {
    let backend = MockBackend::with_delay("mock-a", Duration::from_millis(300));
    let engine = engine_with_backend(backend.clone()).await;

    let blocker = engine.submit_job("alice", topic_request(&["blocker"])).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let queued = engine.submit_job("alice", topic_request(&["victim"])).await.unwrap();

    let cancelled = engine.cancel_job(&queued.id, "alice").await.unwrap();
    assert_eq!(cancelled.status, JobStatus::Cancelled);
    assert_eq!(cancelled.completed_count, 0);
    assert_eq!(cancelled.failed_count, 0);

    wait_for_terminal(&engine, &blocker.id, "alice").await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Only the blocker's task ever reached the backend.
    assert_eq!(backend.call_count(), 1);
    let still_cancelled = engine.get_job(&queued.id, "alice").await.unwrap();
    assert_eq!(still_cancelled.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_terminal_job_conflicts() {
    let backend = MockBackend::new("mock-a");
    let engine = engine_with_backend(backend).await;

    let job = engine.submit_job("alice", topic_request(&["rust"])).await.unwrap();
    wait_for_terminal(&engine, &job.id, "alice").await;

    let result = engine.cancel_job(&job.id, "alice").await;
    assert!(matches!(result, Err(ForgeError::Conflict(_))));
}

#[tokio::test]
async fn test_cancel_unknown_or_foreign_job() {
    let backend = MockBackend::new("mock-a");
    let engine = engine_with_backend(backend).await;

    let result = engine.cancel_job("no-such-job", "alice").await;
    assert!(matches!(result, Err(ForgeError::NotFound(_))));

    let job = engine.submit_job("alice", topic_request(&["rust"])).await.unwrap();
    let result = engine.cancel_job(&job.id, "bob").await;
    assert!(matches!(result, Err(ForgeError::NotFound(_))));
}
