//! Callable values: script closures and host functions.

use std::fmt;
use std::sync::Arc;

use lumo_ir::{Name, Prototype};

use crate::engine::Engine;
use crate::errors::{type_mismatch, EvalError, EvalResult};
use crate::object::ObjectRef;
use crate::scope::SharedScope;
use crate::value::{Str, Value};

/// Signature of a host function body.
pub type NativeFn = dyn Fn(&mut NativeCall<'_>) -> EvalResult + Send + Sync;

/// Number of arguments a host function accepts.
///
/// Checked by the engine before the host closure runs. Script functions have
/// no arity: missing parameters read as Nil and extra arguments are ignored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    /// Inclusive range.
    Between(usize, usize),
    Any,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Between(min, max) => (min..=max).contains(&count),
            Arity::Any => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Between(min, max) => write!(f, "{min} to {max}"),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

/// A prototype instantiated over the scope it was created in.
///
/// The scope is captured by reference: assignments made through any closure
/// sharing it are visible to the others.
#[derive(Clone)]
pub struct Closure {
    pub proto: Arc<Prototype>,
    /// Id of the module whose unit contains `proto`.
    pub module: Name,
    pub scope: SharedScope,
}

impl Closure {
    pub fn new(proto: Arc<Prototype>, module: Name, scope: SharedScope) -> Self {
        Closure {
            proto,
            module,
            scope,
        }
    }
}

/// A host function exposed to scripts.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: Name,
    pub arity: Arity,
    pub func: Arc<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: &str, arity: Arity, func: F) -> Self
    where
        F: Fn(&mut NativeCall<'_>) -> EvalResult + Send + Sync + 'static,
    {
        NativeFunction {
            name: Name::from(name),
            arity,
            func: Arc::new(func),
        }
    }

    /// Wrap into a script-visible value.
    pub fn into_value(self) -> Value {
        Value::function(FunctionValue::Native(self))
    }
}

/// The two function variants. Both are called with a receiver (Nil for free
/// calls) and an argument list, and may fail.
#[derive(Clone)]
pub enum FunctionValue {
    Script(Closure),
    Native(NativeFunction),
}

impl FunctionValue {
    pub fn name(&self) -> &str {
        match self {
            FunctionValue::Script(c) => &c.proto.name,
            FunctionValue::Native(n) => &n.name,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, FunctionValue::Native(_))
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionValue::Script(c) => f
                .debug_struct("Script")
                .field("name", &c.proto.name)
                .field("module", &c.module)
                .finish_non_exhaustive(),
            FunctionValue::Native(n) => f
                .debug_struct("Native")
                .field("name", &n.name)
                .field("arity", &n.arity)
                .finish_non_exhaustive(),
        }
    }
}

/// Shared, identity-compared handle to a function.
#[derive(Clone)]
pub struct FunctionRef(Arc<FunctionValue>);

impl FunctionRef {
    pub fn new(func: FunctionValue) -> Self {
        FunctionRef(Arc::new(func))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &FunctionRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Underlying host handle, stable for the function's lifetime.
    #[inline]
    pub fn as_ptr(&self) -> *const () {
        Arc::as_ptr(&self.0).cast()
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn get(&self) -> &FunctionValue {
        &self.0
    }
}

impl std::ops::Deref for FunctionRef {
    type Target = FunctionValue;

    fn deref(&self) -> &FunctionValue {
        &self.0
    }
}

impl fmt::Debug for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionRef({:?})", self.0)
    }
}

/// Invocation context handed to a host function.
///
/// Gives access to the receiver, the raw arguments, and the running engine
/// so the host can call back into script values.
pub struct NativeCall<'a> {
    pub engine: &'a mut dyn Engine,
    pub receiver: Value,
    pub args: &'a [Value],
    pub name: &'a str,
}

impl<'a> NativeCall<'a> {
    pub fn new(
        engine: &'a mut dyn Engine,
        name: &'a str,
        receiver: Value,
        args: &'a [Value],
    ) -> Self {
        NativeCall {
            engine,
            receiver,
            args,
            name,
        }
    }

    /// Argument `i`, or Nil when not supplied.
    pub fn arg(&self, i: usize) -> Value {
        self.args.get(i).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Argument `i`, which must already be a string.
    pub fn str_arg(&self, i: usize) -> Result<Str, EvalError> {
        match self.args.get(i) {
            Some(Value::Str(s)) => Ok(s.clone()),
            other => Err(self.mismatch("string", other)),
        }
    }

    pub fn object_arg(&self, i: usize) -> Result<ObjectRef, EvalError> {
        match self.args.get(i) {
            Some(Value::Object(o)) => Ok(o.clone()),
            other => Err(self.mismatch("object", other)),
        }
    }

    pub fn function_arg(&self, i: usize) -> Result<Value, EvalError> {
        match self.args.get(i) {
            Some(v @ Value::Function(_)) => Ok(v.clone()),
            other => Err(self.mismatch("function", other)),
        }
    }

    /// Argument `i` coerced to an integer, honoring `__int`.
    pub fn int_arg(&mut self, i: usize) -> Result<i64, EvalError> {
        let v = self.arg(i);
        self.engine.to_int(&v)
    }

    /// Argument `i` coerced to a float, honoring `__float`.
    pub fn float_arg(&mut self, i: usize) -> Result<f64, EvalError> {
        let v = self.arg(i);
        self.engine.to_float(&v)
    }

    /// Call a script or host function through the engine.
    pub fn call(&mut self, callee: &Value, args: &[Value]) -> EvalResult {
        self.engine.call(callee, Value::Nil, args)
    }

    #[cold]
    fn mismatch(&self, expected: &str, got: Option<&Value>) -> EvalError {
        let got = got.map_or("nothing", Value::type_name);
        let mut err = type_mismatch(expected, got);
        err.message = format!("{}: {}", self.name, err.message);
        err
    }
}

#[cfg(test)]
mod tests;
