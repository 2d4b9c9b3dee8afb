//! Decoding of the program's `{"result": ...}` line

use serde_json::Value;

use crate::runner::RunnerError;

const RESULT_FIELD: &str = "result";

/// Parse captured stdout and extract the `result` field
///
/// Surrounding whitespace is ignored. Anything else besides the single JSON
/// object, such as stray debug prints, makes the output malformed.
pub fn decode_result(stdout: &str) -> Result<Value, RunnerError> {
    let payload: Value = serde_json::from_str(stdout.trim())
        .map_err(|e| RunnerError::MalformedOutput(format!("output is not valid JSON: {e}")))?;

    match payload {
        Value::Object(mut fields) => fields.remove(RESULT_FIELD).ok_or_else(|| {
            RunnerError::MalformedOutput(format!("output has no '{RESULT_FIELD}' field"))
        }),
        other => Err(RunnerError::MalformedOutput(format!(
            "output is not a JSON object: {}",
            kind_name(&other)
        ))),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
