//! Default coercions, applied when no meta-method overrides them.
//!
//! | kind     | int         | float     | str         | bool      |
//! |----------|-------------|-----------|-------------|-----------|
//! | nil      | error       | error     | `nil`       | false     |
//! | bool     | 1 / 0       | 1.0 / 0.0 | true/false  | itself    |
//! | number   | truncate    | widen     | display     | non-zero  |
//! | string   | parse       | parse     | itself      | non-empty |
//! | object   | error       | error     | display     | true      |
//! | function | error       | error     | display     | true      |

use crate::errors::{cannot_coerce, EvalError};
use crate::value::{Number, Str, Value};

impl Value {
    pub fn coerce_int(&self) -> Result<i64, EvalError> {
        match self {
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Number(n) => n.to_i64().ok_or_else(|| cannot_coerce(&n.to_string(), "int")),
            Value::Str(s) => parse_number(s)
                .and_then(Number::to_i64)
                .ok_or_else(|| cannot_coerce(&format!("{s:?}"), "int")),
            _ => Err(cannot_coerce(self.type_name(), "int")),
        }
    }

    pub fn coerce_float(&self) -> Result<f64, EvalError> {
        match self {
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => Ok(n.as_f64()),
            Value::Str(s) => parse_number(s)
                .map(Number::as_f64)
                .ok_or_else(|| cannot_coerce(&format!("{s:?}"), "float")),
            _ => Err(cannot_coerce(self.type_name(), "float")),
        }
    }

    /// Numeric view: numbers as-is, bools as 0/1, numeric strings
    /// parsed. Used where a meta-method result must be a number.
    pub fn coerce_number(&self) -> Result<Number, EvalError> {
        match self {
            Value::Bool(b) => Ok(Number::Int(i64::from(*b))),
            Value::Number(n) => Ok(*n),
            Value::Str(s) => parse_number(s).ok_or_else(|| cannot_coerce(&format!("{s:?}"), "number")),
            _ => Err(cannot_coerce(self.type_name(), "number")),
        }
    }

    /// Never fails: every value has a display form.
    pub fn coerce_str(&self) -> Str {
        match self {
            Value::Str(s) => s.clone(),
            other => Str::from(other.to_string()),
        }
    }

    /// Truthiness.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !n.is_zero(),
            Value::Str(s) => !s.is_empty(),
            Value::Object(_) | Value::Function(_) => true,
        }
    }
}

/// Parse a trimmed decimal integer or float literal.
pub(crate) fn parse_number(s: &str) -> Option<Number> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(Number::Int(n));
    }
    s.parse::<f64>().ok().map(Number::Float)
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, reason = "tests")]

    use pretty_assertions::assert_eq;

    use crate::{FailureKind, Value};

    #[test]
    fn nil_has_no_numeric_form() {
        assert_eq!(Value::Nil.coerce_int().unwrap_err().category(), FailureKind::TypeError);
        assert_eq!(Value::Nil.coerce_float().unwrap_err().category(), FailureKind::TypeError);
        assert_eq!(Value::Nil.coerce_str().as_str(), "nil");
        assert!(!Value::Nil.truthy());
    }

    #[test]
    fn bools_coerce_to_one_and_zero() {
        assert_eq!(Value::Bool(true).coerce_int().unwrap(), 1);
        assert_eq!(Value::Bool(false).coerce_float().unwrap(), 0.0);
        assert_eq!(Value::Bool(true).coerce_str().as_str(), "true");
    }

    #[test]
    fn floats_truncate_toward_zero() {
        assert_eq!(Value::float(3.9).coerce_int().unwrap(), 3);
        assert_eq!(Value::float(-3.9).coerce_int().unwrap(), -3);
        assert!(Value::float(f64::NAN).coerce_int().is_err());
        assert!(Value::float(1e300).coerce_int().is_err());
    }

    #[test]
    fn strings_parse_after_trimming() {
        assert_eq!(Value::from(" 42 ").coerce_int().unwrap(), 42);
        assert_eq!(Value::from("2.5").coerce_int().unwrap(), 2);
        assert_eq!(Value::from("2.5").coerce_float().unwrap(), 2.5);
        let err = Value::from("forty").coerce_int().unwrap_err();
        assert_eq!(err.category(), FailureKind::TypeError);
        assert_eq!(err.message, "cannot convert \"forty\" to int");
    }

    #[test]
    fn references_refuse_numeric_coercion() {
        let obj = Value::empty_object();
        assert!(obj.coerce_int().is_err());
        assert!(obj.truthy());
        assert_eq!(obj.coerce_str().as_str(), "{}");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::int(0).truthy());
        assert!(!Value::float(0.0).truthy());
        assert!(Value::int(-1).truthy());
        assert!(!Value::from("").truthy());
        assert!(Value::from("0").truthy());
    }
}
