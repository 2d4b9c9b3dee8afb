use codejudge::FailureKind;
use serde_json::json;

use super::TestEnv;

#[tokio::test]
async fn test_workspace_removed_after_every_outcome() {
    let env = TestEnv::shell();
    let cases: [(&str, &str, Option<FailureKind>); 6] = [
        ("shell", "printf 1", None),
        ("shell", "exit 1", Some(FailureKind::RuntimeError)),
        ("shell", "while :; do :; done", Some(FailureKind::Timeout)),
        ("shell", "echo nonsense", Some(FailureKind::MalformedOutput)),
        ("shellc", "if then fi", Some(FailureKind::CompileError)),
        ("cobol", "DISPLAY 1", Some(FailureKind::InternalError)),
    ];

    for (language, code, expected_kind) in cases {
        let outcome = env.runner.execute(code, language, &json!({})).await;
        assert_eq!(outcome.kind(), expected_kind, "{language}: {code}");
        env.assert_no_workspaces();
    }
}

#[tokio::test]
async fn test_files_written_by_program_are_removed() {
    let env = TestEnv::shell();
    let code = "mkdir -p out/nested\necho data > out/nested/file.txt\necho more > scratch.txt\nprintf 1";

    let outcome = env.runner.execute(code, "shell", &json!({})).await;

    assert!(outcome.is_success(), "{outcome:?}");
    env.assert_no_workspaces();
}

#[tokio::test]
async fn test_unsupported_language_creates_no_workspace() {
    let env = TestEnv::shell();

    let outcome = env.runner.execute("return 1", "fortran", &json!({})).await;

    let codejudge::ExecutionOutcome::Failure { kind, message } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(kind, FailureKind::InternalError);
    assert!(message.contains("fortran"), "message: {message}");
    env.assert_no_workspaces();
}

#[tokio::test]
async fn test_each_execution_gets_a_fresh_workspace() {
    let env = TestEnv::shell();
    let code = "if [ -e leftover ]; then exit 9; fi\ntouch leftover\nprintf 1";

    for _ in 0..3 {
        let outcome = env.runner.execute(code, "shell", &json!({})).await;
        assert_eq!(outcome.value(), Some(&json!(1)));
    }
}
