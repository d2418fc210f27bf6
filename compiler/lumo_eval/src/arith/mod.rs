//! Pluggable arithmetic and ordering.
//!
//! The interpreter resolves meta-methods first; only operands without an
//! override reach the context's `Arithmetic` strategy. Strategies are chosen
//! per context, so two contexts in one process may disagree on, say,
//! overflow behavior.

use std::cmp::Ordering;
use std::fmt;

use lumo_ir::{BinaryOp, UnaryOp};
use lumo_value::{
    division_by_zero, integer_overflow, modulo_by_zero, unsupported_binary,
    unsupported_comparison, unsupported_unary, EvalError, EvalResult, Number, Value,
};

/// Arithmetic and comparison over values with no meta-method override.
pub trait Arithmetic: Send + Sync + fmt::Debug {
    fn add(&self, lhs: &Value, rhs: &Value) -> EvalResult;
    fn sub(&self, lhs: &Value, rhs: &Value) -> EvalResult;
    fn mul(&self, lhs: &Value, rhs: &Value) -> EvalResult;
    fn div(&self, lhs: &Value, rhs: &Value) -> EvalResult;
    fn rem(&self, lhs: &Value, rhs: &Value) -> EvalResult;
    fn negate(&self, operand: &Value) -> EvalResult;
    fn compare(&self, lhs: &Value, rhs: &Value) -> Result<Ordering, EvalError>;

    /// Dispatch a binary operator to the matching method.
    fn binary(&self, op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalResult {
        match op {
            BinaryOp::Add => self.add(lhs, rhs),
            BinaryOp::Sub => self.sub(lhs, rhs),
            BinaryOp::Mul => self.mul(lhs, rhs),
            BinaryOp::Div => self.div(lhs, rhs),
            BinaryOp::Mod => self.rem(lhs, rhs),
        }
    }
}

/// What integer arithmetic does when the exact result does not fit in `i64`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Overflow {
    /// Fail with an `ArithmeticError`.
    #[default]
    Checked,
    /// Two's-complement wraparound.
    Wrapping,
    /// Clamp to `i64::MIN` / `i64::MAX`.
    Saturating,
}

/// The default strategy: integers and floats with promotion.
///
/// - `Int op Int` stays integral, following the overflow policy.
/// - Any float operand promotes the operation to `f64`.
/// - `/` on integers yields an integer when the division is exact and a
///   float otherwise. Division or remainder by zero always fails.
/// - `%` takes the sign of the dividend.
/// - `+` concatenates two strings, or a string and a number's display
///   form. Any other operand next to a string is a type error.
#[derive(Copy, Clone, Debug, Default)]
pub struct NumericArithmetic {
    pub overflow: Overflow,
}

impl NumericArithmetic {
    pub const fn new(overflow: Overflow) -> Self {
        NumericArithmetic { overflow }
    }

    /// Pick the result for the configured policy.
    #[inline]
    fn settle(
        &self,
        checked: Option<i64>,
        wrapping: i64,
        saturating: i64,
        operation: &str,
    ) -> EvalResult {
        match self.overflow {
            Overflow::Checked => checked
                .map(Value::int)
                .ok_or_else(|| integer_overflow(operation)),
            Overflow::Wrapping => Ok(Value::int(wrapping)),
            Overflow::Saturating => Ok(Value::int(saturating)),
        }
    }

    fn numbers(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<(Number, Number), EvalError> {
        match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
            _ => Err(unsupported_binary(op, lhs.type_name(), rhs.type_name())),
        }
    }

    fn int_div(&self, a: i64, b: i64) -> EvalResult {
        match a.checked_rem(b) {
            // `None` only for `i64::MIN / -1`, whose exact result overflows.
            Some(0) | None => self.settle(
                a.checked_div(b),
                a.wrapping_div(b),
                a.saturating_div(b),
                "division",
            ),
            Some(_) => Ok(Value::float(Number::Int(a).as_f64() / Number::Int(b).as_f64())),
        }
    }
}

impl Arithmetic for NumericArithmetic {
    fn add(&self, lhs: &Value, rhs: &Value) -> EvalResult {
        match (lhs, rhs) {
            (Value::Str(a), Value::Str(b)) => return Ok(Value::string(format!("{a}{b}"))),
            (Value::Str(a), Value::Number(b)) => return Ok(Value::string(format!("{a}{b}"))),
            (Value::Number(a), Value::Str(b)) => return Ok(Value::string(format!("{a}{b}"))),
            _ => {}
        }
        match Self::numbers(BinaryOp::Add, lhs, rhs)? {
            (Number::Int(a), Number::Int(b)) => self.settle(
                a.checked_add(b),
                a.wrapping_add(b),
                a.saturating_add(b),
                "addition",
            ),
            (a, b) => Ok(Value::float(a.as_f64() + b.as_f64())),
        }
    }

    fn sub(&self, lhs: &Value, rhs: &Value) -> EvalResult {
        match Self::numbers(BinaryOp::Sub, lhs, rhs)? {
            (Number::Int(a), Number::Int(b)) => self.settle(
                a.checked_sub(b),
                a.wrapping_sub(b),
                a.saturating_sub(b),
                "subtraction",
            ),
            (a, b) => Ok(Value::float(a.as_f64() - b.as_f64())),
        }
    }

    fn mul(&self, lhs: &Value, rhs: &Value) -> EvalResult {
        match Self::numbers(BinaryOp::Mul, lhs, rhs)? {
            (Number::Int(a), Number::Int(b)) => self.settle(
                a.checked_mul(b),
                a.wrapping_mul(b),
                a.saturating_mul(b),
                "multiplication",
            ),
            (a, b) => Ok(Value::float(a.as_f64() * b.as_f64())),
        }
    }

    fn div(&self, lhs: &Value, rhs: &Value) -> EvalResult {
        let (a, b) = Self::numbers(BinaryOp::Div, lhs, rhs)?;
        if b.is_zero() {
            return Err(division_by_zero());
        }
        match (a, b) {
            (Number::Int(a), Number::Int(b)) => self.int_div(a, b),
            (a, b) => Ok(Value::float(a.as_f64() / b.as_f64())),
        }
    }

    fn rem(&self, lhs: &Value, rhs: &Value) -> EvalResult {
        let (a, b) = Self::numbers(BinaryOp::Mod, lhs, rhs)?;
        if b.is_zero() {
            return Err(modulo_by_zero());
        }
        match (a, b) {
            // `i64::MIN % -1` is mathematically 0 under every policy.
            (Number::Int(a), Number::Int(b)) => Ok(Value::int(a.wrapping_rem(b))),
            (a, b) => Ok(Value::float(a.as_f64() % b.as_f64())),
        }
    }

    fn negate(&self, operand: &Value) -> EvalResult {
        match operand {
            Value::Number(Number::Int(n)) => self.settle(
                n.checked_neg(),
                n.wrapping_neg(),
                n.saturating_neg(),
                "negation",
            ),
            Value::Number(Number::Float(x)) => Ok(Value::float(-x)),
            other => Err(unsupported_unary(UnaryOp::Neg, other.type_name())),
        }
    }

    fn compare(&self, lhs: &Value, rhs: &Value) -> Result<Ordering, EvalError> {
        match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => a
                .partial_cmp_num(*b)
                .ok_or_else(|| unsupported_comparison(&a.to_string(), &b.to_string())),
            (Value::Str(a), Value::Str(b)) => Ok(a.as_str().cmp(b.as_str())),
            _ => Err(unsupported_comparison(lhs.type_name(), rhs.type_name())),
        }
    }
}

#[cfg(test)]
mod tests;
