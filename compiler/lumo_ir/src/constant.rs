//! Constant-pool literals.

use std::fmt;

use crate::Name;

/// A literal stored in a prototype's constant pool.
///
/// Only primitive kinds can be constants; objects and functions are always
/// built at run time.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Name),
}

impl Constant {
    /// Identity comparison used for constant-pool deduplication.
    ///
    /// Floats compare by bit pattern so `NaN` constants deduplicate and
    /// `0.0` stays distinct from `-0.0`.
    pub(crate) fn same_as(&self, other: &Constant) -> bool {
        match (self, other) {
            (Constant::Float(a), Constant::Float(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Nil => write!(f, "nil"),
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Int(n) => write!(f, "{n}"),
            Constant::Float(x) => {
                if x.fract() == 0.0 && x.is_finite() {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Constant::Str(s) => write!(f, "{s:?}"),
        }
    }
}
