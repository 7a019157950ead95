/// Output Evaluator - Format-Aware Verdicts
///
/// **Core Responsibility:**
/// Judge one execution outcome against a test case's expected output.
///
/// **Critical Properties:**
/// - Knows nothing about toolchains or processes
/// - Pure functions: (execution outcome, test case) → status
///
/// **Comparison Rules:**
/// - `plain`: both sides trimmed, then exact, case-sensitive equality
/// - `structured`: both sides parsed as JSON and compared structurally;
///   object key order is irrelevant, unparseable output is a mismatch
///
/// **Status Priority:**
/// 1. Timeout
/// 2. Nonzero exit code (even if stdout matches)
/// 3. Output comparison

use polyjudge_common::types::{ExecutionOutcome, TestCase, TestFormat};
use serde_json::{Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Passed,
    Failed,
    RuntimeError,
    TimeLimitExceeded,
}

/// Trim surrounding whitespace; internal whitespace and case are preserved
fn normalize_output(output: &str) -> &str {
    output.trim()
}

/// Compare actual stdout with the test case's expected output
pub fn compare(test_case: &TestCase, actual_stdout: &str) -> bool {
    match test_case.format {
        TestFormat::Plain => {
            normalize_output(&test_case.expected_output) == normalize_output(actual_stdout)
        }
        TestFormat::Structured => {
            let expected = serde_json::from_str::<Value>(&test_case.expected_output);
            let actual = serde_json::from_str::<Value>(normalize_output(actual_stdout));
            match (expected, actual) {
                (Ok(expected), Ok(actual)) => structurally_equal(&expected, &actual),
                _ => false,
            }
        }
    }
}

/// Deep equality over parsed JSON.
///
/// Objects match when they have the same key set and equal values per key.
/// Arrays match element-wise. Numbers match by value, so `1` equals `1.0`.
pub fn structurally_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| structurally_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| structurally_equal(x, y)))
        }
        _ => false,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x == y;
    }
    x.as_f64() == y.as_f64()
}

/// Classify a single test-case run
pub fn evaluate_test(outcome: &ExecutionOutcome, test_case: &TestCase) -> TestStatus {
    if outcome.timed_out {
        TestStatus::TimeLimitExceeded
    } else if outcome.exit_code != 0 {
        TestStatus::RuntimeError
    } else if compare(test_case, &outcome.stdout) {
        TestStatus::Passed
    } else {
        TestStatus::Failed
    }
}

/// A task passes only when every test case passed
pub fn all_passed(statuses: &[TestStatus]) -> bool {
    statuses.iter().all(|s| *s == TestStatus::Passed)
}
