//! Language-neutral values
//!
//! `Value` is the common currency between the input decoder, the wrapper
//! synthesizers (which embed values as source literals) and the verifier
//! (which parses program output back into values before comparing).

use std::cmp::Ordering;
use std::fmt;

/// Default tolerance used when either side of a numeric comparison is a float
pub const DEFAULT_FLOAT_TOLERANCE: f64 = 1e-5;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    Array(Vec<Value>),
}

impl Value {
    /// Parse a numeric token, preferring integers
    pub fn parse_number(token: &str) -> Option<Value> {
        let token = token.trim();
        if let Ok(n) = token.parse::<i64>() {
            return Some(Value::Int(n));
        }
        match token.parse::<f64>() {
            Ok(f) if f.is_finite() => Some(Value::Float(f)),
            _ => None,
        }
    }

    /// Lenient scalar parsing used for program output and hand-written expectations.
    ///
    /// Anything that is not null, a boolean or a number is kept as a string
    /// (surrounding double quotes are stripped).
    pub fn parse_token(token: &str) -> Value {
        let token = token.trim();
        if token == "null" || token == "None" {
            return Value::Null;
        }
        if token.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if token.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        if let Some(n) = Value::parse_number(token) {
            return n;
        }
        if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
            if let Ok(serde_json::Value::String(s)) = serde_json::from_str(token) {
                return Value::Str(s);
            }
            return Value::Str(token[1..token.len() - 1].to_string());
        }
        Value::Str(token.to_string())
    }

    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(_) => Value::Str(json.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Null => serde_json::Value::Null,
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Equality with numeric tolerance.
    ///
    /// Integers compare exactly; when either side is a float the values must
    /// agree within `tolerance`, absolute or relative to the larger magnitude.
    pub fn approx_eq(&self, other: &Value, tolerance: f64) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(_), Value::Int(_) | Value::Float(_))
            | (Value::Int(_), Value::Float(_)) => {
                let (a, b) = match (self.as_f64(), other.as_f64()) {
                    (Some(a), Some(b)) => (a, b),
                    _ => return false,
                };
                let diff = (a - b).abs();
                diff <= tolerance || diff <= tolerance * a.abs().max(b.abs())
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.approx_eq(y, tolerance))
            }
            _ => self == other,
        }
    }

    /// Total order used to canonicalize unordered collections
    pub fn canonical_cmp(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Int(_) | Value::Float(_) => 2,
                Value::Str(_) => 3,
                Value::Array(_) => 4,
            }
        }

        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let a = self.as_f64().unwrap_or(f64::NAN);
                let b = other.as_f64().unwrap_or(f64::NAN);
                a.total_cmp(&b)
            }
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => {
                for (x, y) in a.iter().zip(b) {
                    let ord = x.canonical_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => rank(self).cmp(&rank(other)),
        }
    }

    /// Sort array elements (and, recursively, nested arrays) into canonical order
    pub fn canonicalize(&mut self, depth: usize) {
        if let Value::Array(items) = self {
            if depth > 1 {
                for item in items.iter_mut() {
                    item.canonicalize(depth - 1);
                }
            }
            items.sort_by(|a, b| a.canonical_cmp(b));
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_kinds() {
        assert_eq!(Value::parse_token("42"), Value::Int(42));
        assert_eq!(Value::parse_token("-3.5"), Value::Float(-3.5));
        assert_eq!(Value::parse_token("True"), Value::Bool(true));
        assert_eq!(Value::parse_token("null"), Value::Null);
        assert_eq!(Value::parse_token("\"ab c\""), Value::Str("ab c".into()));
        assert_eq!(Value::parse_token("fl"), Value::Str("fl".into()));
    }

    #[test]
    fn test_approx_eq_tolerance() {
        assert!(Value::Float(2.5).approx_eq(&Value::Float(2.500001), 1e-5));
        assert!(Value::Int(2).approx_eq(&Value::Float(2.0), 1e-5));
        assert!(!Value::Float(2.5).approx_eq(&Value::Float(2.6), 1e-5));
        assert!(!Value::Int(2).approx_eq(&Value::Int(3), 1e-5));
    }

    #[test]
    fn test_canonicalize_nested() {
        let mut v = Value::Array(vec![
            Value::Array(vec![Value::Int(2), Value::Int(-1), Value::Int(-1)]),
            Value::Array(vec![Value::Int(1), Value::Int(0), Value::Int(-1)]),
        ]);
        v.canonicalize(2);
        assert_eq!(v.to_string(), "[[-1,-1,2],[-1,0,1]]");
    }

    #[test]
    fn test_display_string_is_raw() {
        assert_eq!(Value::Str("fl".into()).to_string(), "fl");
        assert_eq!(
            Value::Array(vec![Value::Str("a".into())]).to_string(),
            "[\"a\"]"
        );
    }
}
