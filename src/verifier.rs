//! Output normalizer / verifier
//!
//! Parses the expected text (JSON or plain form) and the driver's stdout (line
//! protocol) into `Value`s according to the problem's `OutputFormat`, then
//! compares them. Unordered formats are canonicalized before comparison.

use serde::Serialize;

use crate::core::value::DEFAULT_FLOAT_TOLERANCE;
use crate::core::Value;
use crate::problems::OutputFormat;

/// Outcome of comparing one test case's output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub passed: bool,
    pub normalized_expected: String,
    pub normalized_actual: String,
}

/// Compare with the default float tolerance
pub fn verify(expected: &str, actual: &str, format: OutputFormat) -> Verification {
    verify_with_tolerance(expected, actual, format, DEFAULT_FLOAT_TOLERANCE)
}

pub fn verify_with_tolerance(
    expected: &str,
    actual: &str,
    format: OutputFormat,
    tolerance: f64,
) -> Verification {
    match format {
        OutputFormat::Boolean => compare_text(
            expected.trim().to_lowercase(),
            actual.trim().to_lowercase(),
        ),
        OutputFormat::String => compare_text(unquote(expected.trim()), actual.trim().to_string()),
        OutputFormat::SingleNumber => {
            let expected = Value::parse_token(expected);
            let actual = Value::parse_token(actual);
            compare_values(&expected, Some(actual), tolerance, false)
        }
        OutputFormat::ArraySpaceSeparated | OutputFormat::ArrayJson => compare_values(
            &parse_expected_array(expected),
            Some(parse_actual_array(actual)),
            tolerance,
            false,
        ),
        OutputFormat::UnorderedArray => compare_values(
            &canonical(parse_expected_array(expected), 1),
            Some(canonical(parse_actual_array(actual), 1)),
            tolerance,
            false,
        ),
        OutputFormat::Array2dJson | OutputFormat::Array2dRows => {
            let expected = parse_expected_matrix(expected);
            let actual = parse_actual_matrix(actual, row_count(&expected));
            compare_values(&expected, actual, tolerance, false)
        }
        OutputFormat::UnorderedArray2d => {
            let expected = canonical(parse_expected_matrix(expected), 2);
            let actual = parse_actual_matrix(actual, row_count(&expected)).map(|v| canonical(v, 2));
            compare_values(&expected, actual, tolerance, false)
        }
        OutputFormat::ClassResults => verify_call_log(expected, actual, None, tolerance),
    }
}

/// Compare a replayed call log.
///
/// `actual` must open with the constructor's `null` line. `calls` is the number
/// of method calls after the constructor; when unknown it is taken from the
/// log. The expectation may list the constructor's `null` or leave it out.
pub fn verify_call_log(
    expected: &str,
    actual: &str,
    calls: Option<usize>,
    tolerance: f64,
) -> Verification {
    let expected_items = parse_expected_log(expected);
    let mut actual_items = parse_call_log(actual);

    if actual_items.first() != Some(&Value::Null) {
        return compare_values(
            &Value::Array(align_expected(expected_items, calls)),
            None,
            tolerance,
            true,
        );
    }
    let actual_items = actual_items.split_off(1);

    let calls = calls.unwrap_or(actual_items.len());
    compare_values(
        &Value::Array(align_expected(expected_items, Some(calls))),
        Some(Value::Array(actual_items)),
        tolerance,
        true,
    )
}

/// Split into scalar tokens; a double-quoted token may contain separators
fn split_tokens(text: &str, is_separator: impl Fn(char) -> bool) -> Vec<Value> {
    let mut values = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if is_separator(c) {
            chars.next();
            continue;
        }

        let mut end = text.len();
        if c == '"' {
            chars.next();
            let mut escaped = false;
            for (idx, c) in chars.by_ref() {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => {
                        end = idx + 1;
                        break;
                    }
                    _ => {}
                }
            }
        } else {
            while let Some(&(idx, c)) = chars.peek() {
                if is_separator(c) {
                    end = idx;
                    break;
                }
                chars.next();
            }
        }
        values.push(Value::parse_token(&text[start..end]));
    }
    values
}

/// JSON array, or tokens separated by whitespace and/or commas
fn parse_expected_array(expected: &str) -> Value {
    if let Some(items) = parse_json_array(expected) {
        return Value::Array(items);
    }
    Value::Array(split_tokens(expected, |c| c.is_whitespace() || c == ','))
}

/// One line of space-separated tokens; text elements arrive JSON-quoted
fn parse_actual_array(actual: &str) -> Value {
    Value::Array(split_tokens(actual, char::is_whitespace))
}

fn parse_row(line: &str) -> Value {
    parse_actual_array(line)
}

/// JSON list of lists, or one row per line with an optional leading row count
fn parse_expected_matrix(expected: &str) -> Value {
    if let Some(items) = parse_json_array(expected) {
        return Value::Array(items);
    }

    let lines: Vec<&str> = expected.trim().lines().collect();
    if lines.is_empty() {
        return Value::Array(Vec::new());
    }
    let body = match lines[0].trim().parse::<usize>() {
        Ok(count) if count.checked_add(1) == Some(lines.len()) => &lines[1..],
        Ok(0) if lines.len() == 1 => &lines[1..],
        _ => &lines[..],
    };
    Value::Array(body.iter().map(|line| parse_row(line)).collect())
}

fn row_count(value: &Value) -> usize {
    value.as_array().map_or(0, |rows| rows.len())
}

/// Row count line followed by that many rows.
///
/// Rows missing at the end count as empty rows (their newlines may have been
/// trimmed), but only up to `expected_rows`; a larger count is malformed.
fn parse_actual_matrix(actual: &str, expected_rows: usize) -> Option<Value> {
    let lines: Vec<&str> = actual
        .lines()
        .skip_while(|line| line.trim().is_empty())
        .collect();
    let (header, body) = lines.split_first()?;
    let count: usize = header.trim().parse().ok()?;

    if count > body.len() && count > expected_rows {
        return None;
    }
    let (rows, extra) = body.split_at(count.min(body.len()));
    if extra.iter().any(|line| !line.trim().is_empty()) {
        return None;
    }

    let mut rows: Vec<Value> = rows.iter().map(|line| parse_row(line)).collect();
    rows.resize(count, Value::Array(Vec::new()));
    Some(Value::Array(rows))
}

/// One call-log entry: a bracketed list or a scalar token
fn parse_log_item(line: &str) -> Value {
    match parse_json_array(line) {
        Some(items) => Value::Array(items),
        None => Value::parse_token(line),
    }
}

fn parse_call_log(actual: &str) -> Vec<Value> {
    actual
        .trim_end()
        .lines()
        .skip_while(|line| line.trim().is_empty())
        .map(parse_log_item)
        .collect()
}

fn parse_expected_log(expected: &str) -> Vec<Value> {
    match parse_json_array(expected) {
        Some(items) => items,
        None => parse_call_log(expected),
    }
}

/// Drop a leading constructor `null` when the expectation lists one entry per
/// call plus the constructor
fn align_expected(mut expected: Vec<Value>, calls: Option<usize>) -> Vec<Value> {
    let with_constructor = match calls {
        Some(calls) => expected.len() == calls + 1,
        None => true,
    };
    if with_constructor && expected.first() == Some(&Value::Null) {
        expected.remove(0);
    }
    expected
}
