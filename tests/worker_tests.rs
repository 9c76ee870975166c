//! Integration tests for task fan-out, aggregation and cooperative
//! cancellation.

mod common;

use articleforge::{GenerationBackend, GenerationEngine, GroupSpec, JobStatus, RoutingStrategy};
use common::{engine_with_backend, topic_request, wait_for_terminal, MockBackend};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Bulk execution and partial failure
// ============================================================================

#[tokio::test]
async fn test_bulk_partial_failure_still_completes() {
    let backend = MockBackend::with_fail_marker("mock-a", "fail");
    let engine = engine_with_backend(backend).await;

    let topics: Vec<String> = (0..10)
        .map(|i| if i < 7 { format!("good-{}", i) } else { format!("fail-{}", i) })
        .collect();
    let topic_refs: Vec<&str> = topics.iter().map(|t| t.as_str()).collect();

    let job = engine.submit_job("alice", topic_request(&topic_refs)).await.unwrap();
    let finished = wait_for_terminal(&engine, &job.id, "alice").await;

    assert_eq!(finished.status, JobStatus::Completed);
    assert_eq!(finished.completed_count, 7);
    assert_eq!(finished.failed_count, 3);
    assert_eq!(finished.progress, 100);
    assert!(finished.error.is_some());
    assert!(finished.message.contains("3 failed"));
}

#[tokio::test]
async fn test_all_tasks_failing_fails_the_job() {
    let backend = MockBackend::with_fail_marker("mock-a", "fail");
    let engine = engine_with_backend(backend).await;

    let job = engine
        .submit_job("alice", topic_request(&["fail-1", "fail-2", "fail-3"]))
        .await
        .unwrap();
    let finished = wait_for_terminal(&engine, &job.id, "alice").await;

    assert_eq!(finished.status, JobStatus::Failed);
    assert_eq!(finished.completed_count, 0);
    assert_eq!(finished.failed_count, 3);
    assert_eq!(finished.progress, 100);
    assert!(finished.message.contains("All 3 generation tasks failed"));
}

#[tokio::test]
async fn test_single_failure_does_not_abort_siblings() {
    let backend = MockBackend::with_fail_marker("mock-a", "fail");
    let engine = engine_with_backend(backend.clone()).await;

    let job = engine
        .submit_job("alice", topic_request(&["good-1", "fail-1", "good-2"]))
        .await
        .unwrap();
    let finished = wait_for_terminal(&engine, &job.id, "alice").await;

    // Every task ran despite the failure in the middle.
    assert_eq!(backend.call_count(), 3);
    assert_eq!(finished.completed_count, 2);
    assert_eq!(finished.failed_count, 1);
}

// ============================================================================
// Progress reporting
// ============================================================================

#[tokio::test]
async fn test_progress_is_monotonic_and_reaches_100() {
    let backend = MockBackend::with_delay("mock-a", Duration::from_millis(40));
    let engine = engine_with_backend(backend).await;

    let job = engine
        .submit_job("alice", topic_request(&["a", "b", "c", "d", "e"]))
        .await
        .unwrap();

    let mut observed = Vec::new();
    loop {
        let snapshot = engine.get_job(&job.id, "alice").await.unwrap();
        observed.push(snapshot.progress);
        if snapshot.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    for window in observed.windows(2) {
        assert!(window[0] <= window[1], "progress went backwards: {:?}", observed);
    }
    assert_eq!(*observed.last().unwrap(), 100);

    let finished = engine.get_job(&job.id, "alice").await.unwrap();
    assert_eq!(finished.status, JobStatus::Completed);
    assert!(finished.queue_position.is_none());
    assert!(finished.started_at.is_some());
    assert!(finished.completed_at.is_some());
}

// ============================================================================
// Deadlines
// ============================================================================

#[tokio::test]
async fn test_task_timeout_counts_as_failure() {
    let backend = MockBackend::with_delay("slow", Duration::from_millis(500));
    let backend_id = backend.id().to_string();

    let engine = GenerationEngine::builder()
        .register_backend(backend)
        .define_group(GroupSpec {
            name: "default".to_string(),
            description: String::new(),
            models: vec![backend_id],
            strategy: RoutingStrategy::RoundRobin,
            weights: None,
            is_active: true,
        })
        .default_model_group("default")
        .task_timeout(Duration::from_millis(100))
        .build()
        .await
        .unwrap();
    let engine = Arc::new(engine);

    let job = engine.submit_job("alice", topic_request(&["a", "b"])).await.unwrap();
    let finished = wait_for_terminal(&engine, &job.id, "alice").await;

    assert_eq!(finished.status, JobStatus::Failed);
    assert_eq!(finished.failed_count, 2);
    assert!(finished.error.unwrap().contains("timed out"));
}

// ============================================================================
// Cooperative cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_processing_job_starts_no_new_tasks() {
    let backend = MockBackend::with_delay("mock-a", Duration::from_millis(200));
    let engine = GenerationEngine::builder()
        .register_backend(backend.clone())
        .define_group(GroupSpec {
            name: "default".to_string(),
            description: String::new(),
            models: vec!["mock-a".to_string()],
            strategy: RoutingStrategy::RoundRobin,
            weights: None,
            is_active: true,
        })
        .default_model_group("default")
        .task_concurrency(1)
        .build()
        .await
        .unwrap();
    let engine = Arc::new(engine);

    let job = engine
        .submit_job("alice", topic_request(&["a", "b", "c", "d", "e"]))
        .await
        .unwrap();

    // Wait for the first task to reach the backend, then cancel.
    for _ in 0..200 {
        if backend.call_count() >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(backend.call_count() >= 1, "first task never started");

    let acknowledged = engine.cancel_job(&job.id, "alice").await.unwrap();
    assert!(!acknowledged.status.is_terminal() || acknowledged.status == JobStatus::Cancelled);

    let finished = wait_for_terminal(&engine, &job.id, "alice").await;
    assert_eq!(finished.status, JobStatus::Cancelled);

    // In-flight work finished and was counted, but the tail of the job
    // never started.
    let calls = backend.call_count();
    assert!(calls < 5, "cancellation did not stop new tasks (calls = {})", calls);
    assert_eq!(
        finished.completed_count + finished.failed_count,
        calls as u32
    );
    assert!(finished.progress < 100);
}

#[tokio::test]
async fn test_cancelled_job_wins_over_task_successes() {
    let backend = MockBackend::with_delay("mock-a", Duration::from_millis(150));
    let engine = engine_with_backend(backend.clone()).await;

    let job = engine
        .submit_job("alice", topic_request(&["a", "b", "c", "d", "e", "f", "g", "h"]))
        .await
        .unwrap();

    for _ in 0..200 {
        if backend.call_count() >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    engine.cancel_job(&job.id, "alice").await.unwrap();

    let finished = wait_for_terminal(&engine, &job.id, "alice").await;

    // Some tasks may have succeeded before the flag was observed; the
    // terminal status is cancelled regardless.
    assert_eq!(finished.status, JobStatus::Cancelled);
}

// ============================================================================
// Routing failures inside tasks
// ============================================================================

#[tokio::test]
async fn test_job_without_any_group_fails() {
    let backend = MockBackend::new("mock-a");
    let engine = GenerationEngine::builder()
        .register_backend(backend)
        .build()
        .await
        .unwrap();
    let engine = Arc::new(engine);

    let job = engine.submit_job("alice", topic_request(&["a"])).await.unwrap();
    let finished = wait_for_terminal(&engine, &job.id, "alice").await;

    assert_eq!(finished.status, JobStatus::Failed);
    assert!(finished.error.unwrap().contains("no model group"));
}

#[tokio::test]
async fn test_inactive_group_fails_tasks() {
    let backend = MockBackend::new("mock-a");
    let engine = GenerationEngine::builder()
        .register_backend(backend)
        .define_group(GroupSpec {
            name: "dormant".to_string(),
            description: String::new(),
            models: vec!["mock-a".to_string()],
            strategy: RoutingStrategy::RoundRobin,
            weights: None,
            is_active: false,
        })
        .default_model_group("dormant")
        .build()
        .await
        .unwrap();
    let engine = Arc::new(engine);

    let job = engine.submit_job("alice", topic_request(&["a"])).await.unwrap();
    let finished = wait_for_terminal(&engine, &job.id, "alice").await;

    assert_eq!(finished.status, JobStatus::Failed);
    assert!(finished.error.unwrap().contains("inactive"));
}

#[tokio::test]
async fn test_unreachable_backend_marks_tasks_failed() {
    let backend = common::UnreachableBackend::new("down");
    let engine = engine_with_backend(backend).await;

    let job = engine.submit_job("alice", topic_request(&["a", "b"])).await.unwrap();
    let finished = wait_for_terminal(&engine, &job.id, "alice").await;

    assert_eq!(finished.status, JobStatus::Failed);
    assert_eq!(finished.failed_count, 2);
    assert!(finished.error.unwrap().contains("unavailable"));
}
