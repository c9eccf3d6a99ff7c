use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{ComplianceResult, ComplianceStatus, Severity};

/// Why one raw row could not become a [`ComplianceResult`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("row is not a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' must be {expected}")]
    WrongType { field: &'static str, expected: &'static str },

    #[error("invalid JSON: {0}")]
    Syntax(String),
}

/// Outcome for one non-blank line of a JSON-lines input.
#[derive(Debug)]
pub struct RowOutcome {
    /// 1-based line number in the input.
    pub line: usize,
    pub result: Result<ComplianceResult, DecodeError>,
}

fn required_str(obj: &Map<String, Value>, field: &'static str) -> Result<String, DecodeError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(DecodeError::MissingField(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(DecodeError::MissingField(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(DecodeError::WrongType { field, expected: "a string" }),
    }
}

fn optional_str(obj: &Map<String, Value>, field: &'static str) -> Result<String, DecodeError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(DecodeError::WrongType { field, expected: "a string" }),
    }
}

fn string_list(obj: &Map<String, Value>, field: &'static str) -> Result<Vec<String>, DecodeError> {
    let wrong = DecodeError::WrongType { field, expected: "an array of strings" };
    match obj.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).ok_or_else(|| wrong.clone()))
            .collect(),
        Some(_) => Err(wrong),
    }
}

/// Decode one raw row. Structural problems are errors; unrecognised
/// status or severity values are normalized instead.
pub fn decode_row(value: Value) -> Result<ComplianceResult, DecodeError> {
    let Value::Object(obj) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let control_id = required_str(&obj, "control_id")?;
    let benchmark_id = required_str(&obj, "benchmark_id")?;
    let integration_id = required_str(&obj, "integration_id")?;

    let status = ComplianceStatus::parse_lenient(&optional_str(&obj, "status")?);
    let severity = Severity::parse_lenient(&optional_str(&obj, "severity")?);

    let cost_impact = match obj.get("cost_impact") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.as_f64().ok_or(DecodeError::WrongType {
            field: "cost_impact",
            expected: "a number",
        })?),
    };

    let evaluated_at = match obj.get("evaluated_at") {
        None | Some(Value::Null) => 0,
        Some(v) => v.as_i64().ok_or(DecodeError::WrongType {
            field: "evaluated_at",
            expected: "an integer (epoch milliseconds)",
        })?,
    };

    Ok(ComplianceResult {
        control_id,
        benchmark_id,
        parent_benchmarks: string_list(&obj, "parent_benchmarks")?,
        resource_type: optional_str(&obj, "resource_type")?,
        platform_resource_id: optional_str(&obj, "platform_resource_id")?,
        integration_id,
        status,
        severity,
        cost_impact,
        resource_collections: string_list(&obj, "resource_collections")?,
        evaluated_at,
    })
}

/// Decode newline-delimited JSON. Blank lines are skipped; every other line
/// produces exactly one outcome.
pub fn decode_jsonl(input: &str) -> Vec<RowOutcome> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| RowOutcome {
            line: idx + 1,
            result: serde_json::from_str::<Value>(line)
                .map_err(|e| DecodeError::Syntax(e.to_string()))
                .and_then(decode_row),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "control_id": "iam-mfa",
            "benchmark_id": "cis",
            "integration_id": "acct-1",
            "resource_type": "aws::iam::user",
            "platform_resource_id": "arn:aws:iam::1:user/alice",
            "status": "ALARM",
            "severity": "High",
            "cost_impact": 12.5,
            "resource_collections": ["prod"],
            "evaluated_at": 1_700_000_000_000i64
        })
    }

    #[test]
    fn test_decode_valid_row() {
        let r = decode_row(valid()).unwrap();
        assert_eq!(r.control_id, "iam-mfa");
        assert_eq!(r.status, ComplianceStatus::Alarm);
        assert_eq!(r.severity, Severity::High);
        assert_eq!(r.cost_impact, Some(12.5));
        assert_eq!(r.resource_collections, vec!["prod"]);
        assert!(r.parent_benchmarks.is_empty());
    }

    #[test]
    fn test_decode_normalizes_enums() {
        let mut row = valid();
        row["status"] = json!("exploded");
        row["severity"] = json!("");
        let r = decode_row(row).unwrap();
        assert_eq!(r.status, ComplianceStatus::Error);
        assert_eq!(r.severity, Severity::None);
    }

    #[test]
    fn test_decode_missing_required_field() {
        let mut row = valid();
        row.as_object_mut().unwrap().remove("integration_id");
        assert_eq!(decode_row(row).unwrap_err(), DecodeError::MissingField("integration_id"));

        let mut row = valid();
        row["control_id"] = json!("  ");
        assert_eq!(decode_row(row).unwrap_err(), DecodeError::MissingField("control_id"));
    }

    #[test]
    fn test_decode_wrong_types() {
        let mut row = valid();
        row["cost_impact"] = json!("free");
        assert!(matches!(
            decode_row(row).unwrap_err(),
            DecodeError::WrongType { field: "cost_impact", .. }
        ));

        let mut row = valid();
        row["resource_collections"] = json!(["prod", 3]);
        assert!(matches!(
            decode_row(row).unwrap_err(),
            DecodeError::WrongType { field: "resource_collections", .. }
        ));

        assert_eq!(decode_row(json!([1, 2])).unwrap_err(), DecodeError::NotAnObject);
    }

    #[test]
    fn test_decode_null_cost_is_none() {
        let mut row = valid();
        row["cost_impact"] = Value::Null;
        assert_eq!(decode_row(row).unwrap().cost_impact, None);
    }

    #[test]
    fn test_decode_jsonl_line_numbers() {
        let input = format!("{}\n\n{{broken\n{}\n", valid(), json!({"benchmark_id": "cis"}));
        let outcomes = decode_jsonl(&input);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].line, 1);
        assert!(outcomes[0].result.is_ok());
        assert_eq!(outcomes[1].line, 3);
        assert!(matches!(outcomes[1].result, Err(DecodeError::Syntax(_))));
        assert_eq!(outcomes[2].line, 4);
        assert_eq!(outcomes[2].result.as_ref().unwrap_err(), &DecodeError::MissingField("control_id"));
    }
}
