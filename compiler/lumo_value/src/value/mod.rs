//! Runtime values for the Lumo runtime.
//!
//! # Arc Enforcement
//!
//! Reference kinds are reachable only through their handle types:
//!
//! ```text
//! let o = Value::object(Object::new());      // OK
//! let f = Value::function(func_value);       // OK
//! let o = Value::Object(ObjectRef(...));     // ERROR: ObjectRef's field is private
//! ```
//!
//! Cloning a `Value` is always cheap: primitives copy, strings and
//! references bump an `Arc` count.

mod number;

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

pub use number::Number;

use crate::function::{FunctionRef, FunctionValue};
use crate::meta::MetaKey;
use crate::object::{Object, ObjectRef};

/// Immutable shared string.
///
/// Strings are values, not references: there is no way to mutate one, so
/// sharing the buffer between clones is unobservable from scripts.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Str(Arc<str>);

impl Str {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of Unicode scalar values.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl Deref for Str {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Str {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Str {
    fn from(s: &str) -> Self {
        Str(Arc::from(s))
    }
}

impl From<String> for Str {
    fn from(s: String) -> Self {
        Str(Arc::from(s))
    }
}

impl From<Arc<str>> for Str {
    fn from(s: Arc<str>) -> Self {
        Str(s)
    }
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

/// Runtime value in the Lumo runtime.
#[derive(Clone, Default)]
pub enum Value {
    // Value kinds (copied / compared structurally)
    /// Absence of a value.
    #[default]
    Nil,
    Bool(bool),
    Number(Number),
    Str(Str),

    // Reference kinds (aliased / compared by identity)
    /// Ordered key/value mapping.
    Object(ObjectRef),
    /// Script closure or host function.
    Function(FunctionRef),
}

// Factory Methods

impl Value {
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Number(Number::Int(n))
    }

    #[inline]
    pub fn float(x: f64) -> Self {
        Value::Number(Number::Float(x))
    }

    /// Create a string value.
    #[inline]
    pub fn string(s: impl Into<Str>) -> Self {
        Value::Str(s.into())
    }

    /// Wrap an object in a fresh reference.
    ///
    /// Every call creates a new identity, even for equal contents.
    #[inline]
    pub fn object(object: Object) -> Self {
        Value::Object(ObjectRef::new(object))
    }

    /// Create a new, empty object.
    #[inline]
    pub fn empty_object() -> Self {
        Value::object(Object::new())
    }

    #[inline]
    pub fn function(func: FunctionValue) -> Self {
        Value::Function(FunctionRef::new(func))
    }
}

// Value Methods

impl Value {
    /// Whether this value is one of the reference kinds.
    #[inline]
    pub fn is_reference(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Function(_))
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Get the type name for error messages and the `type` builtin.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The integer payload of an `Int` number; floats are not narrowed.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Number(Number::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionRef> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Look up a meta-method bound on this value.
    ///
    /// Only objects carry meta-methods, and only a `Function` binding counts.
    pub fn meta(&self, key: MetaKey) -> Option<FunctionRef> {
        match self {
            Value::Object(o) => o.meta(key),
            _ => None,
        }
    }

    /// Default equality: structural for value kinds, identity for references.
    ///
    /// Numbers compare across representations (`1 == 1.0`). The engine
    /// consults `__eq` before falling back to this.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Render for display, quoting strings nested inside objects.
    ///
    /// `seen` holds the objects currently being rendered; revisiting one
    /// prints `{...}` instead of recursing forever on cyclic graphs.
    ///
    /// Purely structural: `__str` metas are not consulted at any depth. Script
    /// string coercion goes through the interpreter, which honors them.
    pub(crate) fn write_display(
        &self,
        f: &mut fmt::Formatter<'_>,
        nested: bool,
        seen: &mut Vec<*const ()>,
    ) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) if nested => write!(f, "{s:?}"),
            Value::Str(s) => f.write_str(s),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::Object(o) => {
                let ptr = o.as_ptr();
                if seen.contains(&ptr) {
                    return f.write_str("{...}");
                }
                seen.push(ptr);
                let entries = o.entries();
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    k.write_display(f, true, seen)?;
                    f.write_str(": ")?;
                    v.write_display(f, true, seen)?;
                }
                seen.pop();
                f.write_str("}")
            }
        }
    }
}

// Conversions

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::float(x)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<Str> for Value {
    fn from(s: Str) -> Self {
        Value::Str(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl From<FunctionRef> for Value {
    fn from(f: FunctionRef) -> Self {
        Value::Function(f)
    }
}

// Trait Implementations

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Object(o) => write!(f, "Object({:p}, {} entries)", o.as_ptr(), o.len()),
            Value::Function(func) => write!(f, "Function({})", func.name()),
        }
    }
}

/// Default display form; the `__str` meta-method is applied by the engine.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_display(f, false, &mut Vec::new())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

#[cfg(test)]
mod tests;
