//! The number kind: one script-visible type, two representations.

use std::cmp::Ordering;
use std::fmt;

/// A script number.
///
/// Integers stay exact until an operation needs a float; the arithmetic
/// strategy decides how integer overflow behaves.
#[derive(Copy, Clone, Debug)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Widen to `f64`.
    #[inline]
    #[allow(clippy::cast_precision_loss, reason = "float promotion is the documented semantics")]
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(x) => x == 0.0,
        }
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Truncate toward zero, failing for NaN and out-of-range floats.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        reason = "range is checked before the cast"
    )]
    pub fn to_i64(self) -> Option<i64> {
        match self {
            Number::Int(n) => Some(n),
            Number::Float(x) => {
                let t = x.trunc();
                if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
                    Some(t as i64)
                } else {
                    None
                }
            }
        }
    }

    /// Numeric ordering across representations; `None` when a NaN is involved.
    pub fn partial_cmp_num(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp_num(*other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.partial_cmp_num(*other)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::Int(n)
    }
}

impl From<f64> for Number {
    fn from(x: f64) -> Self {
        Number::Float(x)
    }
}

/// Integral floats print with a trailing `.0` so they stay distinguishable
/// from integers.
impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}
