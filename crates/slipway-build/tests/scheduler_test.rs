mod common;

use common::{StubDocker, unit, unit_with_tags};
use slipway_build::{CancelToken, RunConfig, run, run_with_token};
use std::time::{Duration, Instant};

fn config(stub: &StubDocker, push: bool, parallel: Option<usize>, only: Option<&str>) -> RunConfig {
    RunConfig::new(push, true, parallel, only.map(str::to_string))
        .with_docker_bin(stub.bin.to_string_lossy())
        .with_poll_interval(Duration::from_millis(10))
}

#[tokio::test]
async fn test_sequential_all_success_in_manifest_order() {
    let stub = StubDocker::ok();
    let units = [unit("a"), unit("b"), unit("c")];

    let code = run(&units, &config(&stub, false, None, None)).await;

    assert_eq!(code, 0);
    let calls = stub.invocations();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].contains("--tag=a:latest"));
    assert!(calls[1].contains("--tag=b:latest"));
    assert!(calls[2].contains("--tag=c:latest"));
}

#[tokio::test]
async fn test_sequential_stops_after_first_failure() {
    // A builds, B fails with 1, C must never be attempted.
    let stub = StubDocker::new(r#"case "$*" in *--tag=b:latest*) exit 1;; esac"#);
    let units = [unit("a"), unit("b"), unit("c")];

    let code = run(&units, &config(&stub, false, None, None)).await;

    assert_eq!(code, 1);
    let calls = stub.invocations();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].contains("--tag=b:latest"));
    assert!(!calls.iter().any(|call| call.contains("c:latest")));
}

#[tokio::test]
async fn test_push_runs_after_build_in_tag_order() {
    let stub = StubDocker::ok();
    let units = [unit_with_tags("a", &["v1", "v2"])];

    let code = run(&units, &config(&stub, true, None, None)).await;

    assert_eq!(code, 0);
    let calls = stub.invocations();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].starts_with("build"));
    assert_eq!(calls[1], "push a:v1");
    assert_eq!(calls[2], "push a:v2");
}

#[tokio::test]
async fn test_push_stops_at_first_failing_tag() {
    let stub = StubDocker::new(r#"case "$1:$2" in push:a:v2) exit 5;; esac"#);
    let units = [unit_with_tags("a", &["v1", "v2", "v3"])];

    let code = run(&units, &config(&stub, true, None, None)).await;

    assert_eq!(code, 5);
    let calls = stub.invocations();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2], "push a:v2");
    assert!(!calls.iter().any(|call| call.contains("a:v3")));
}

#[tokio::test]
async fn test_build_failure_skips_push() {
    let stub = StubDocker::new(r#"case "$1" in build) exit 3;; esac"#);
    let units = [unit("a")];

    let code = run(&units, &config(&stub, true, None, None)).await;

    assert_eq!(code, 3);
    assert_eq!(stub.invocations().len(), 1);
}

#[tokio::test]
async fn test_parallel_pool_runs_units_concurrently() {
    // Three half-second builds through a three-slot pool finish well
    // under the sequential 1.5s floor.
    let stub = StubDocker::new("sleep 0.5");
    let units = [unit("a"), unit("b"), unit("c")];

    let start = Instant::now();
    let code = run(&units, &config(&stub, false, Some(3), None)).await;

    assert_eq!(code, 0);
    assert!(start.elapsed() < Duration::from_millis(1300));
    assert_eq!(stub.invocations().len(), 3);
}

#[tokio::test]
async fn test_parallel_failure_stops_queued_units() {
    // Single slot: A's failure cancels the run before B or C get a
    // worker, and the exit code is A's.
    let stub = StubDocker::new(r#"case "$*" in *--tag=a:latest*) exit 4;; esac"#);
    let units = [unit("a"), unit("b"), unit("c")];

    let code = run(&units, &config(&stub, false, Some(1), None)).await;

    assert_eq!(code, 4);
    let calls = stub.invocations();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("--tag=a:latest"));
}

#[tokio::test]
async fn test_parallel_push_failure_reports_first_failure_code() {
    // Both builds succeed; A's only push fails. The sibling's outcome
    // contributes nothing: the recorded code is A's.
    let stub = StubDocker::new(r#"case "$1:$2" in push:a:latest) exit 9;; esac"#);
    let units = [unit("a"), unit("b")];

    let code = run(&units, &config(&stub, true, Some(2), None)).await;

    assert_eq!(code, 9);
}

#[tokio::test]
async fn test_container_filter_disables_parallelism() {
    let stub = StubDocker::ok();
    let units = [unit("a"), unit("b")];

    let config = config(&stub, false, Some(4), Some("b"));
    assert!(config.parallel.is_none());

    let code = run(&units, &config).await;

    assert_eq!(code, 0);
    let calls = stub.invocations();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("--tag=b:latest"));
}

#[tokio::test]
async fn test_cancelled_run_dispatches_nothing() {
    let stub = StubDocker::ok();
    let units = [unit("a"), unit("b")];
    let token = CancelToken::new();
    token.request(None);

    let code = run_with_token(&units, &config(&stub, false, None, None), &token).await;

    assert_eq!(code, 0);
    assert!(stub.invocations().is_empty());
}

#[tokio::test]
async fn test_operator_cancellation_is_not_a_failure() {
    // A long build killed by cancellation must exit 0: nobody failed.
    let stub = StubDocker::new("sleep 30");
    let units = [unit("a")];
    let token = CancelToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.request(None);
    });

    let start = Instant::now();
    let code = run_with_token(&units, &config(&stub, false, None, None), &token).await;

    assert_eq!(code, 0);
    assert!(start.elapsed() < Duration::from_secs(5));
}
