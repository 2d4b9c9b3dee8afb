use codejudge::{ExecutionOutcome, FailureKind};
use serde_json::json;

use super::TestEnv;

#[tokio::test]
async fn test_identity_returns_input() {
    let env = TestEnv::shell();

    let outcome = env
        .runner
        .execute(r#"printf '%s' "$1""#, "shell", &json!({"a": 1}))
        .await;

    assert_eq!(outcome, ExecutionOutcome::Success { value: json!({"a": 1}) });
}

#[tokio::test]
async fn test_nested_input_round_trips() {
    let env = TestEnv::shell();
    let input = json!({"xs": [1, 2.5, {"k": null}], "s": "a b", "t": true});

    let outcome = env.runner.execute(r#"printf '%s' "$1""#, "shell", &input).await;

    assert_eq!(outcome.value(), Some(&input));
}

#[tokio::test]
async fn test_multiline_code_is_a_function_body() {
    let env = TestEnv::shell();
    let code = "n=2\nif [ \"$n\" -eq 2 ]; then\n  printf '[1, 2]'\nfi";

    let outcome = env.runner.execute(code, "shell", &json!({})).await;

    assert_eq!(outcome.value(), Some(&json!([1, 2])));
}

#[tokio::test]
async fn test_runtime_error_carries_stderr() {
    let env = TestEnv::shell();

    let outcome = env
        .runner
        .execute("echo 'boom: bad input' >&2\nexit 3", "shell", &json!({}))
        .await;

    let ExecutionOutcome::Failure { kind, message } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(kind, FailureKind::RuntimeError);
    assert!(message.contains("boom: bad input"), "message: {message}");
}

#[tokio::test]
async fn test_runtime_error_without_stderr_has_message() {
    let env = TestEnv::shell();

    let outcome = env.runner.execute("exit 7", "shell", &json!({})).await;

    assert_eq!(
        outcome,
        ExecutionOutcome::failure(FailureKind::RuntimeError, "process exited with code 7")
    );
}

#[tokio::test]
async fn test_plain_text_is_malformed() {
    let env = TestEnv::shell();

    let outcome = env.runner.execute("echo hello world", "shell", &json!({})).await;

    assert_eq!(outcome.kind(), Some(FailureKind::MalformedOutput));
}

#[tokio::test]
async fn test_output_over_cap_is_malformed() {
    let env = TestEnv::shell();

    // 100 KB of digits against a 64 KB cap
    let outcome = env
        .runner
        .execute("head -c 100000 /dev/zero | tr '\\0' 7", "shell", &json!({}))
        .await;

    let ExecutionOutcome::Failure { kind, message } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(kind, FailureKind::MalformedOutput);
    assert!(message.contains("64 KB"), "message: {message}");
}

#[tokio::test]
async fn test_environment_is_scrubbed() {
    let env = TestEnv::shell();

    let outcome = env
        .runner
        .execute(r#"printf '"%s"' "${HOME:-unset}""#, "shell", &json!({}))
        .await;

    assert_eq!(outcome.value(), Some(&json!("unset")));
}

#[tokio::test]
async fn test_recipe_environment_is_passed() {
    let env = TestEnv::shell();

    let outcome = env
        .runner
        .execute(r#"printf '%s' "$judge_mode""#, "shell", &json!({}))
        .await;

    assert_eq!(outcome.value(), Some(&json!(1)));
}

#[tokio::test]
async fn test_runs_inside_workspace() {
    let env = TestEnv::shell();

    let outcome = env
        .runner
        .execute(r#"printf '"%s"' "$(ls)""#, "shell", &json!({}))
        .await;

    assert_eq!(outcome.value(), Some(&json!("Solution.sh")));
}
