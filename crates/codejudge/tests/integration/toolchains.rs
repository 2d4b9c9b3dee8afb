//! End-to-end runs against the real compilers and interpreters

use codejudge::compare::values_equal;
use codejudge::{ExecutionOutcome, FailureKind};
use serde_json::json;

use super::TestEnv;

async fn assert_identity(language: &str, code: &str) {
    let env = TestEnv::defaults();
    let input = json!({"a": 1});

    let outcome = env.runner.execute(code, language, &input).await;

    // Gson turns every number into a double
    let value = outcome.value().unwrap_or_else(|| panic!("{language}: {outcome:?}"));
    assert!(values_equal(value, &input), "{language}: {value}");
    env.assert_no_workspaces();
}

async fn assert_failure(language: &str, code: &str, expected: FailureKind) -> String {
    let env = TestEnv::defaults();

    let outcome = env.runner.execute(code, language, &json!({})).await;

    env.assert_no_workspaces();
    match outcome {
        ExecutionOutcome::Failure { kind, message } => {
            assert_eq!(kind, expected, "{language}: {message}");
            assert!(!message.is_empty());
            message
        }
        other => panic!("{language}: expected {expected}, got {other:?}"),
    }
}

#[tokio::test]
async fn test_python_identity() {
    assert_identity("python3", "return input_data").await;
}

#[tokio::test]
async fn test_javascript_identity() {
    assert_identity("javascript", "return input_data;").await;
}

#[tokio::test]
async fn test_cpp_identity() {
    assert_identity("cpp17", "return input_data;").await;
}

#[tokio::test]
async fn test_java_identity() {
    assert_identity("java", "return inputData;").await;
}

#[tokio::test]
async fn test_python_exception_is_runtime_error() {
    let message = assert_failure(
        "python3",
        "raise ValueError('boom')",
        FailureKind::RuntimeError,
    )
    .await;
    assert!(message.contains("ValueError"), "message: {message}");
}

#[tokio::test]
async fn test_javascript_throw_is_runtime_error() {
    let message = assert_failure(
        "javascript",
        "throw new Error('boom');",
        FailureKind::RuntimeError,
    )
    .await;
    assert!(message.contains("boom"), "message: {message}");
}

#[tokio::test]
async fn test_cpp_syntax_error_is_compile_error() {
    assert_failure("cpp17", "return input_data", FailureKind::CompileError).await;
}

#[tokio::test]
async fn test_java_syntax_error_is_compile_error() {
    assert_failure("java", "return inputData", FailureKind::CompileError).await;
}

#[tokio::test]
async fn test_python_busy_loop_times_out() {
    assert_failure("python3", "while True:\n    pass", FailureKind::Timeout).await;
}

#[tokio::test]
async fn test_python_print_is_malformed() {
    assert_failure(
        "python3",
        "print('debugging')\nreturn 1",
        FailureKind::MalformedOutput,
    )
    .await;
}

#[tokio::test]
async fn test_python_memory_bomb_is_contained() {
    let env = TestEnv::defaults();

    let outcome = env
        .runner
        .execute("x = bytearray(10 ** 9)\nreturn len(x)", "python3", &json!({}))
        .await;

    assert!(
        matches!(
            outcome.kind(),
            Some(FailureKind::RuntimeError | FailureKind::Timeout)
        ),
        "{outcome:?}"
    );
    env.assert_no_workspaces();
}
