use codejudge::FailureKind;
use serde_json::json;

use super::TestEnv;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_executions_keep_their_own_results() {
    let env = TestEnv::shell();

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let runner = env.runner.clone();
            tokio::spawn(async move {
                let input = json!({"id": i, "tag": format!("run-{i}")});
                let outcome = runner.execute(r#"printf '%s' "$1""#, "shell", &input).await;
                (input, outcome)
            })
        })
        .collect();

    for handle in handles {
        let (input, outcome) = handle.await.expect("task panicked");
        assert_eq!(outcome.value(), Some(&input));
    }
    env.assert_no_workspaces();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_timeouts_do_not_affect_neighbours() {
    let env = TestEnv::shell();

    let slow: Vec<_> = (0..3)
        .map(|_| {
            let runner = env.runner.clone();
            tokio::spawn(async move { runner.execute("while :; do :; done", "shell", &json!({})).await })
        })
        .collect();
    let fast: Vec<_> = (0..7)
        .map(|i| {
            let runner = env.runner.clone();
            tokio::spawn(async move { runner.execute(&format!("printf {i}"), "shell", &json!({})).await })
        })
        .collect();

    for (i, handle) in fast.into_iter().enumerate() {
        let outcome = handle.await.expect("task panicked");
        assert_eq!(outcome.value(), Some(&json!(i)));
    }
    for handle in slow {
        let outcome = handle.await.expect("task panicked");
        assert_eq!(outcome.kind(), Some(FailureKind::Timeout));
    }
    env.assert_no_workspaces();
}
