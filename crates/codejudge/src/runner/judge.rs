//! Test-case judging

use tracing::{debug, instrument};

use crate::runner::Runner;
use crate::types::{TestCase, TestReport, TestVerdict};

/// Execute once per case, one after another, and compare each result
#[instrument(skip(runner, code, cases), fields(cases = cases.len()))]
pub(crate) async fn judge(
    runner: &Runner,
    code: &str,
    language: &str,
    cases: &[TestCase],
) -> Vec<TestReport> {
    let mut reports = Vec::with_capacity(cases.len());

    for (index, case) in cases.iter().enumerate() {
        let outcome = runner.execute(code, language, &case.input).await;
        let verdict = TestVerdict::assemble(outcome, &case.expected);
        debug!(index, passed = verdict.is_passed(), "test case judged");

        reports.push(TestReport {
            input: case.input.clone(),
            expected: case.expected.clone(),
            verdict,
        });
    }

    reports
}
