//! Callback interface from host functions into the running engine.

use crate::errors::{EvalError, EvalResult};
use crate::value::{Str, Value};

/// Operations a host function may perform on the interpreter that invoked it.
///
/// Every method applies the same meta-method rules scripts see, so a host
/// function that coerces an argument with `to_int` honors `__int` exactly as
/// the `int` builtin would.
pub trait Engine {
    /// Call `callee` with an explicit receiver (Nil for a free call).
    fn call(&mut self, callee: &Value, receiver: Value, args: &[Value]) -> EvalResult;

    /// Call `thunk` with no arguments, intercepting any failure.
    ///
    /// Returns Nil on success or the failure converted to a Value.
    fn recover(&mut self, thunk: &Value) -> EvalResult;

    /// Load and run the module `id`, returning its (memoized) value.
    fn import(&mut self, id: &str) -> EvalResult;

    /// Read `target[key]`, consulting `__index` on a miss.
    fn index(&mut self, target: &Value, key: &Value) -> EvalResult;

    /// Write `target[key] = value`, consulting `__setindex`.
    fn set_index(&mut self, target: &Value, key: Value, value: Value) -> Result<(), EvalError>;

    fn equals(&mut self, lhs: &Value, rhs: &Value) -> Result<bool, EvalError>;

    fn to_int(&mut self, value: &Value) -> Result<i64, EvalError>;

    fn to_float(&mut self, value: &Value) -> Result<f64, EvalError>;

    fn to_str(&mut self, value: &Value) -> Result<Str, EvalError>;

    fn to_bool(&mut self, value: &Value) -> Result<bool, EvalError>;

    /// Length of a string, object, or `__len` override.
    fn length(&mut self, value: &Value) -> Result<i64, EvalError>;

    /// Write text to the context's output binding.
    fn print(&mut self, text: &str);
}
