//! Input decoder
//!
//! Turns a raw test-case input string into language-neutral `Arguments`
//! according to the problem's `InputFormat`. Malformed input is reported as a
//! `DecodeError`; it fails that one test case and never the submission.

use thiserror::Error;

use crate::core::Value;
use crate::problems::InputFormat;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("input is empty")]
    Empty,

    #[error("input ended while reading {0}")]
    MissingToken(String),

    #[error("'{token}' is not a valid number ({what})")]
    InvalidNumber { token: String, what: String },

    #[error("'{token}' is not a valid length ({what})")]
    InvalidLength { token: String, what: String },

    #[error("{what}: expected {expected} values, found {found}")]
    TooFewValues {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("malformed literal '{0}'")]
    MalformedLiteral(String),

    #[error("{0}")]
    Shape(String),
}

type Result<T> = std::result::Result<T, DecodeError>;

/// Upper bound on allocations sized by a declared length
const PREALLOC_LIMIT: usize = 1024;

/// A replayed call sequence for a design problem
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Method names; the first one is the constructor
    pub methods: Vec<String>,
    /// Arguments for each call, parallel to `methods`
    pub args: Vec<Vec<Value>>,
}

impl Transaction {
    pub fn class_name(&self) -> &str {
        &self.methods[0]
    }

    pub fn constructor_args(&self) -> &[Value] {
        &self.args[0]
    }

    /// Method calls after the constructor, in order
    pub fn calls(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.methods
            .iter()
            .zip(&self.args)
            .skip(1)
            .map(|(name, args)| (name.as_str(), args.as_slice()))
    }
}

/// Decoded test-case input
#[derive(Debug, Clone, PartialEq)]
pub enum Arguments {
    /// Positional arguments for one function call
    Call(Vec<Value>),
    Transaction(Transaction),
}

/// Whitespace token stream with typed accessors
struct Tokens<'a> {
    iter: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            iter: input.split_whitespace(),
        }
    }

    fn next_token(&mut self, what: &str) -> Result<&'a str> {
        self.iter
            .next()
            .ok_or_else(|| DecodeError::MissingToken(what.to_string()))
    }

    fn next_number(&mut self, what: &str) -> Result<Value> {
        let token = self.next_token(what)?;
        parse_number(token, what)
    }

    fn next_length(&mut self, what: &str) -> Result<usize> {
        let token = self.next_token(what)?;
        parse_length(token, what)
    }

    fn take_array(&mut self, n: usize, what: &str) -> Result<Vec<Value>> {
        // `n` comes from the test data; grow as values actually arrive
        let mut values = Vec::with_capacity(n.min(PREALLOC_LIMIT));
        for i in 0..n {
            match self.iter.next() {
                Some(token) => values.push(parse_number(token, what)?),
                None => {
                    return Err(DecodeError::TooFewValues {
                        what: what.to_string(),
                        expected: n,
                        found: i,
                    })
                }
            }
        }
        Ok(values)
    }

    fn remaining(&mut self) -> usize {
        self.iter.by_ref().count()
    }
}

fn parse_number(token: &str, what: &str) -> Result<Value> {
    Value::parse_number(token).ok_or_else(|| DecodeError::InvalidNumber {
        token: token.to_string(),
        what: what.to_string(),
    })
}

fn parse_length(token: &str, what: &str) -> Result<usize> {
    token.parse::<usize>().map_err(|_| DecodeError::InvalidLength {
        token: token.to_string(),
        what: what.to_string(),
    })
}

fn non_empty_lines(input: &str) -> Vec<&str> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

fn parse_json_literal(text: &str) -> Result<Value> {
    serde_json::from_str::<serde_json::Value>(text)
        .map(|json| Value::from_json(&json))
        .map_err(|_| DecodeError::MalformedLiteral(text.to_string()))
}

/// Parse one array written either as a JSON literal or as separated numbers
fn parse_array_line(line: &str, what: &str) -> Result<Vec<Value>> {
    let line = line.trim();
    if line.starts_with('[') {
        return match parse_json_literal(line)? {
            Value::Array(items) => Ok(items),
            _ => Err(DecodeError::MalformedLiteral(line.to_string())),
        };
    }
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| parse_number(t, what))
        .collect()
}

/// Keep the first `n` values of a line-decoded array
fn truncate_to(mut values: Vec<Value>, n: usize, what: &str) -> Result<Vec<Value>> {
    if values.len() < n {
        return Err(DecodeError::TooFewValues {
            what: what.to_string(),
            expected: n,
            found: values.len(),
        });
    }
    values.truncate(n);
    Ok(values)
}

/// Decode a test-case input string according to `format`
pub fn decode(input: &str, format: InputFormat) -> Result<Arguments> {
    if input.trim().is_empty() {
        return Err(DecodeError::Empty);
    }

    match format {
        InputFormat::SingleNumber => decode_single_number(input),
        InputFormat::NThenArray => {
            let mut tokens = Tokens::new(input);
            let n = tokens.next_length("array length")?;
            let array = tokens.take_array(n, "array")?;
            Ok(Arguments::Call(vec![Value::Array(array)]))
        }
        InputFormat::ArrayOnly => {
            let array = parse_array_line(&input.replace('\n', " "), "array")?;
            Ok(Arguments::Call(vec![Value::Array(array)]))
        }
        InputFormat::NArrayK => decode_n_array_k(input),
        InputFormat::TwoArrays => decode_two_arrays(input),
        InputFormat::NM2dMatrix => decode_matrix(input),
        InputFormat::NMArrayTarget => {
            let mut tokens = Tokens::new(input);
            let n = tokens.next_length("first array length")?;
            let m = tokens.next_length("second array length")?;
            let first = tokens.take_array(n, "first array")?;
            let second = tokens.take_array(m, "second array")?;
            let target = tokens.next_number("target")?;
            Ok(Arguments::Call(vec![
                Value::Array(first),
                Value::Array(second),
                target,
            ]))
        }
        InputFormat::TwoNumbersArray => decode_two_numbers_array(input),
        InputFormat::ClassTransaction => decode_transaction(input),
        InputFormat::Custom => Ok(Arguments::Call(
            non_empty_lines(input)
                .into_iter()
                .map(decode_custom_line)
                .collect(),
        )),
    }
}

fn decode_single_number(input: &str) -> Result<Arguments> {
    let mut tokens = Tokens::new(input);
    let value = tokens.next_number("number")?;
    let extra = tokens.remaining();
    if extra > 0 {
        return Err(DecodeError::Shape(format!(
            "expected a single number, found {} extra token(s)",
            extra
        )));
    }
    Ok(Arguments::Call(vec![value]))
}

/// `n k` on the first line followed by the array, or `n`, the array, then `k`
fn decode_n_array_k(input: &str) -> Result<Arguments> {
    let header_tokens = input
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.split_whitespace().count())
        .unwrap_or(0);

    let mut tokens = Tokens::new(input);
    let n = tokens.next_length("array length")?;
    let (array, k) = if header_tokens == 2 {
        let k = tokens.next_number("k")?;
        (tokens.take_array(n, "array")?, k)
    } else {
        let array = tokens.take_array(n, "array")?;
        (array, tokens.next_number("k")?)
    };
    Ok(Arguments::Call(vec![Value::Array(array), k]))
}

fn decode_two_arrays(input: &str) -> Result<Arguments> {
    let lines = non_empty_lines(input);
    let (first, second) = match lines.len() {
        2 => (
            parse_array_line(lines[0], "first array")?,
            parse_array_line(lines[1], "second array")?,
        ),
        3 => {
            let mut header = Tokens::new(lines[0]);
            let n = header.next_length("first array length")?;
            let m = header.next_length("second array length")?;
            (
                truncate_to(parse_array_line(lines[1], "first array")?, n, "first array")?,
                truncate_to(parse_array_line(lines[2], "second array")?, m, "second array")?,
            )
        }
        4 => {
            let n = parse_length(lines[0], "first array length")?;
            let m = parse_length(lines[2], "second array length")?;
            (
                truncate_to(parse_array_line(lines[1], "first array")?, n, "first array")?,
                truncate_to(parse_array_line(lines[3], "second array")?, m, "second array")?,
            )
        }
        found => {
            return Err(DecodeError::Shape(format!(
                "two arrays need 2, 3 or 4 lines, found {}",
                found
            )))
        }
    };
    Ok(Arguments::Call(vec![Value::Array(first), Value::Array(second)]))
}

/// `n m`, then `n * m` values row by row, then an optional scalar
fn decode_matrix(input: &str) -> Result<Arguments> {
    let mut tokens = Tokens::new(input);
    let n = tokens.next_length("row count")?;
    let m = tokens.next_length("column count")?;

    let mut rows = Vec::with_capacity(n.min(PREALLOC_LIMIT));
    for r in 0..n {
        let row = tokens.take_array(m, &format!("row {}", r + 1))?;
        rows.push(Value::Array(row));
    }

    let mut args = vec![Value::Array(rows)];
    if let Some(token) = tokens.iter.next() {
        args.push(parse_number(token, "trailing parameter")?);
    }
    Ok(Arguments::Call(args))
}

/// `m n`, `nums1` (m values, or m + n with trailing slack), `nums2`
fn decode_two_numbers_array(input: &str) -> Result<Arguments> {
    let lines = non_empty_lines(input);
    let header = lines.first().ok_or(DecodeError::Empty)?;
    let mut header_tokens = Tokens::new(header);
    let m = header_tokens.next_length("m")?;
    let n = header_tokens.next_length("n")?;

    let line_values = |idx: usize, what: &str, required: usize| -> Result<Vec<Value>> {
        match lines.get(idx) {
            Some(line) => parse_array_line(line, what),
            None if required == 0 => Ok(Vec::new()),
            None => Err(DecodeError::MissingToken(what.to_string())),
        }
    };

    let total = m.checked_add(n).ok_or_else(|| {
        DecodeError::Shape(format!("merged length {} + {} is out of range", m, n))
    })?;

    // With an empty nums1 the second line already belongs to nums2
    let nums2_line = if total == 0 { 1 } else { 2 };
    let nums2 = truncate_to(line_values(nums2_line, "nums2", n)?, n, "nums2")?;

    // nums2 holds n real values, so the padding below is bounded by the input
    let mut nums1 = line_values(1, "nums1", total)?;
    if nums1.len() == m {
        nums1.extend(std::iter::repeat(Value::Int(0)).take(n));
    }
    let nums1 = truncate_to(nums1, total, "nums1")?;

    Ok(Arguments::Call(vec![
        Value::Array(nums1),
        Value::Int(m as i64),
        Value::Array(nums2),
        Value::Int(n as i64),
    ]))
}

fn decode_transaction(input: &str) -> Result<Arguments> {
    let lines = non_empty_lines(input);
    if lines.len() < 2 {
        return Err(DecodeError::Shape(
            "class transaction needs a method line and an argument line".to_string(),
        ));
    }

    let methods: Vec<String> = serde_json::from_str(lines[0])
        .map_err(|_| DecodeError::MalformedLiteral(lines[0].to_string()))?;

    let args = match parse_json_literal(lines[1])? {
        Value::Array(calls) => calls
            .into_iter()
            .map(|call| match call {
                Value::Array(items) => items,
                Value::Null => Vec::new(),
                scalar => vec![scalar],
            })
            .collect::<Vec<_>>(),
        _ => return Err(DecodeError::MalformedLiteral(lines[1].to_string())),
    };

    if methods.is_empty() {
        return Err(DecodeError::Shape("method list is empty".to_string()));
    }
    if methods.len() != args.len() {
        return Err(DecodeError::Shape(format!(
            "{} method names but {} argument lists",
            methods.len(),
            args.len()
        )));
    }

    Ok(Arguments::Transaction(Transaction { methods, args }))
}

fn decode_custom_line(line: &str) -> Value {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(line) {
        return Value::from_json(&json);
    }
    Value::parse_number(line).unwrap_or_else(|| Value::Str(line.to_string()))
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_json().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn shape_error(format: InputFormat) -> DecodeError {
    DecodeError::Shape(format!("arguments do not fit {:?}", format))
}

fn array_arg(values: &[Value], idx: usize, format: InputFormat) -> Result<&[Value]> {
    values
        .get(idx)
        .and_then(Value::as_array)
        .ok_or_else(|| shape_error(format))
}

fn scalar_arg(values: &[Value], idx: usize, format: InputFormat) -> Result<&Value> {
    values
        .get(idx)
        .filter(|v| !v.is_array())
        .ok_or_else(|| shape_error(format))
}

/// Re-encode decoded arguments in `format`'s input layout
pub fn encode(args: &Arguments, format: InputFormat) -> Result<String> {
    let values = match (args, format) {
        (Arguments::Transaction(tx), InputFormat::ClassTransaction) => {
            let methods = serde_json::to_string(&tx.methods)
                .map_err(|e| DecodeError::Shape(e.to_string()))?;
            let calls = serde_json::Value::Array(
                tx.args
                    .iter()
                    .map(|call| serde_json::Value::Array(call.iter().map(Value::to_json).collect()))
                    .collect(),
            );
            return Ok(format!("{}\n{}", methods, calls));
        }
        (Arguments::Call(values), _) => values,
        _ => return Err(shape_error(format)),
    };

    let array_at = |idx: usize| array_arg(values, idx, format);
    let scalar_at = |idx: usize| scalar_arg(values, idx, format);

    let text = match format {
        InputFormat::SingleNumber => scalar_at(0)?.to_string(),
        InputFormat::NThenArray => {
            let a = array_at(0)?;
            format!("{}\n{}", a.len(), join_values(a))
        }
        InputFormat::ArrayOnly => Value::Array(array_at(0)?.to_vec()).to_json().to_string(),
        InputFormat::NArrayK => {
            let a = array_at(0)?;
            format!("{} {}\n{}", a.len(), scalar_at(1)?, join_values(a))
        }
        InputFormat::TwoArrays => format!(
            "{}\n{}",
            Value::Array(array_at(0)?.to_vec()).to_json(),
            Value::Array(array_at(1)?.to_vec()).to_json()
        ),
        InputFormat::NMArrayTarget => {
            let (a, b) = (array_at(0)?, array_at(1)?);
            format!(
                "{} {}\n{}\n{}\n{}",
                a.len(),
                b.len(),
                join_values(a),
                join_values(b),
                scalar_at(2)?
            )
        }
        InputFormat::TwoNumbersArray => {
            let (nums1, nums2) = (array_at(0)?, array_at(2)?);
            format!(
                "{} {}\n{}\n{}",
                scalar_at(1)?,
                scalar_at(3)?,
                Value::Array(nums1.to_vec()).to_json(),
                Value::Array(nums2.to_vec()).to_json()
            )
        }
        InputFormat::NM2dMatrix => {
            let rows = array_at(0)?;
            let cols = rows.first().and_then(Value::as_array).map_or(0, |r| r.len());
            let mut out = format!("{} {}", rows.len(), cols);
            for row in rows {
                let row = row.as_array().ok_or_else(|| shape_error(format))?;
                out.push('\n');
                out.push_str(&join_values(row));
            }
            if let Some(extra) = values.get(1) {
                out.push('\n');
                out.push_str(&extra.to_string());
            }
            out
        }
        InputFormat::Custom => values
            .iter()
            .map(|v| v.to_json().to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        InputFormat::ClassTransaction => return Err(shape_error(format)),
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Value {
        Value::Array(values.iter().map(|&v| Value::Int(v)).collect())
    }

    fn call(args: Arguments) -> Vec<Value> {
        match args {
            Arguments::Call(values) => values,
            other => panic!("expected call arguments, got {:?}", other),
        }
    }

    fn assert_round_trip(input: &str, format: InputFormat) {
        let decoded = decode(input, format).unwrap();
        let encoded = encode(&decoded, format).unwrap();
        assert_eq!(decode(&encoded, format).unwrap(), decoded, "{}", encoded);
    }

    #[test]
    fn test_single_number() {
        assert_eq!(
            call(decode(" 5\n", InputFormat::SingleNumber).unwrap()),
            vec![Value::Int(5)]
        );
        assert!(matches!(
            decode("5 6", InputFormat::SingleNumber),
            Err(DecodeError::Shape(_))
        ));
        assert!(matches!(
            decode("five", InputFormat::SingleNumber),
            Err(DecodeError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_n_then_array_trusts_declared_length() {
        let args = call(decode("3\n1 2 3 4\n\n", InputFormat::NThenArray).unwrap());
        assert_eq!(args, vec![ints(&[1, 2, 3])]);

        let err = decode("4\n1 2", InputFormat::NThenArray).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TooFewValues {
                what: "array".into(),
                expected: 4,
                found: 2
            }
        );
    }

    #[test]
    fn test_array_only_forms() {
        assert_eq!(
            call(decode("[1, 2, 3]", InputFormat::ArrayOnly).unwrap()),
            vec![ints(&[1, 2, 3])]
        );
        assert_eq!(
            call(decode("1 2\n3", InputFormat::ArrayOnly).unwrap()),
            vec![ints(&[1, 2, 3])]
        );
    }

    #[test]
    fn test_n_array_k_header_layout() {
        let args = call(decode("4 9\n2 7 11 15", InputFormat::NArrayK).unwrap());
        assert_eq!(args, vec![ints(&[2, 7, 11, 15]), Value::Int(9)]);
    }

    #[test]
    fn test_n_array_k_trailing_layout() {
        let args = call(decode("4\n2 7 11 15\n9", InputFormat::NArrayK).unwrap());
        assert_eq!(args, vec![ints(&[2, 7, 11, 15]), Value::Int(9)]);

        let err = decode("4\n2 7 11 15", InputFormat::NArrayK).unwrap_err();
        assert_eq!(err, DecodeError::MissingToken("k".into()));
    }

    #[test]
    fn test_two_arrays_layouts() {
        let expected = vec![ints(&[1, 2]), ints(&[3])];
        assert_eq!(
            call(decode("[1,2]\n[3]", InputFormat::TwoArrays).unwrap()),
            expected
        );
        assert_eq!(
            call(decode("2 1\n1 2\n3", InputFormat::TwoArrays).unwrap()),
            expected
        );
        assert_eq!(
            call(decode("2\n1 2\n1\n3", InputFormat::TwoArrays).unwrap()),
            expected
        );
        assert!(decode("1 2", InputFormat::TwoArrays).is_err());
    }

    #[test]
    fn test_matrix_with_optional_target() {
        let args = call(decode("2 3\n1 2 3\n4 5 6", InputFormat::NM2dMatrix).unwrap());
        assert_eq!(
            args,
            vec![Value::Array(vec![ints(&[1, 2, 3]), ints(&[4, 5, 6])])]
        );

        let args = call(decode("1 2\n1 3\n3", InputFormat::NM2dMatrix).unwrap());
        assert_eq!(args[1], Value::Int(3));

        assert!(decode("2 2\n1 2\n3", InputFormat::NM2dMatrix).is_err());
    }

    #[test]
    fn test_n_m_array_target() {
        let args = call(decode("2 3\n1 2\n3 4 5\n6", InputFormat::NMArrayTarget).unwrap());
        assert_eq!(args, vec![ints(&[1, 2]), ints(&[3, 4, 5]), Value::Int(6)]);
    }

    #[test]
    fn test_two_numbers_array_pads_slack() {
        let expected = vec![
            ints(&[1, 2, 3, 0, 0, 0]),
            Value::Int(3),
            ints(&[2, 5, 6]),
            Value::Int(3),
        ];
        assert_eq!(
            call(decode("3 3\n1 2 3 0 0 0\n2 5 6", InputFormat::TwoNumbersArray).unwrap()),
            expected
        );
        assert_eq!(
            call(decode("3 3\n1 2 3\n2 5 6", InputFormat::TwoNumbersArray).unwrap()),
            expected
        );

        let args = call(decode("1 0\n1", InputFormat::TwoNumbersArray).unwrap());
        assert_eq!(args[2], ints(&[]));
    }

    #[test]
    fn test_huge_declared_lengths_are_errors() {
        let err = decode("1000000000000000000\n1 2", InputFormat::NThenArray).unwrap_err();
        assert!(matches!(err, DecodeError::TooFewValues { found: 2, .. }));

        let err = decode("1000000000000000000 1\n1", InputFormat::NM2dMatrix).unwrap_err();
        assert!(matches!(err, DecodeError::TooFewValues { .. }));

        let err = decode("18446744073709551615 1\n1\n2", InputFormat::TwoNumbersArray).unwrap_err();
        assert!(matches!(err, DecodeError::Shape(_)));

        let err = decode("1 1000000000000000000\n1\n2", InputFormat::TwoNumbersArray).unwrap_err();
        assert!(matches!(err, DecodeError::TooFewValues { .. }));

        assert!(decode("1000000000000000000 2\n1 2", InputFormat::NArrayK).is_err());
    }

    #[test]
    fn test_class_transaction() {
        let input = "[\"Stack\",\"push\",\"push\",\"pop\"]\n[[],[1],[2],[]]";
        let Arguments::Transaction(tx) = decode(input, InputFormat::ClassTransaction).unwrap()
        else {
            panic!("expected a transaction");
        };
        assert_eq!(tx.class_name(), "Stack");
        assert!(tx.constructor_args().is_empty());
        let calls: Vec<_> = tx.calls().collect();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], ("push", &[Value::Int(1)][..]));
        assert_eq!(calls[2].0, "pop");
    }

    #[test]
    fn test_class_transaction_length_mismatch() {
        let input = "[\"Stack\",\"push\"]\n[[]]";
        assert!(matches!(
            decode(input, InputFormat::ClassTransaction),
            Err(DecodeError::Shape(_))
        ));
    }

    #[test]
    fn test_custom_lines() {
        let args = call(
            decode(
                "A man, a plan, a canal: Panama\n[\"flower\",\"flow\"]\n7",
                InputFormat::Custom,
            )
            .unwrap(),
        );
        assert_eq!(args[0], Value::Str("A man, a plan, a canal: Panama".into()));
        assert_eq!(
            args[1],
            Value::Array(vec![Value::Str("flower".into()), Value::Str("flow".into())])
        );
        assert_eq!(args[2], Value::Int(7));
    }

    #[test]
    fn test_empty_input_rejected() {
        for format in [InputFormat::SingleNumber, InputFormat::Custom] {
            assert_eq!(decode("  \n ", format).unwrap_err(), DecodeError::Empty);
        }
    }

    #[test]
    fn test_round_trips() {
        assert_round_trip("7", InputFormat::SingleNumber);
        assert_round_trip("3\n1 2 3", InputFormat::NThenArray);
        assert_round_trip("[1,-2,3]", InputFormat::ArrayOnly);
        assert_round_trip("4 9\n2 7 11 15", InputFormat::NArrayK);
        assert_round_trip("2 1\n1 2\n3", InputFormat::TwoArrays);
        assert_round_trip("2 2\n1 2\n3 4", InputFormat::NM2dMatrix);
        assert_round_trip("2 2\n1 3\n5 7\n3", InputFormat::NM2dMatrix);
        assert_round_trip("2 1\n1 2\n3\n4", InputFormat::NMArrayTarget);
        assert_round_trip("3 3\n1 2 3\n2 5 6", InputFormat::TwoNumbersArray);
        assert_round_trip(
            "[\"MinStack\",\"push\",\"getMin\"]\n[[],[-2],[]]",
            InputFormat::ClassTransaction,
        );
        assert_round_trip("\"race a car\"\n[[1,3],[2,6]]", InputFormat::Custom);
    }
}
