//! Error types for script evaluation.
//!
//! Every run-time failure travels through one channel: `EvalError`, returned
//! in the `Err` arm of `EvalResult`. There is no separate exception path, so
//! `recover` can intercept any failure regardless of its kind.
//!
//! # Structured Error Categories
//!
//! `EvalErrorKind` carries typed data for each condition and maps onto the
//! coarse, script-visible `FailureKind` taxonomy via `category()`. Factory
//! functions (e.g., `division_by_zero()`) are the public API; they fill both
//! `kind` and `message`.

use std::fmt;

use lumo_ir::{BinaryOp, Location, UnaryOp};

use crate::function::Arity;
use crate::meta::MetaKey;
use crate::object::Object;
use crate::value::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Script-visible failure taxonomy.
///
/// This is what `recover` exposes as the `kind` field of the failure value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    TypeError,
    ArithmeticError,
    ArityError,
    /// Raised explicitly by a script with a payload value.
    ScriptError,
    ImportError,
    RuntimeError,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::TypeError => "TypeError",
            FailureKind::ArithmeticError => "ArithmeticError",
            FailureKind::ArityError => "ArityError",
            FailureKind::ScriptError => "ScriptError",
            FailureKind::ImportError => "ImportError",
            FailureKind::RuntimeError => "RuntimeError",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Arithmetic
    DivisionByZero,
    ModuloByZero,
    IntegerOverflow {
        operation: String,
    },

    // Type/Operator
    TypeMismatch {
        expected: String,
        got: String,
    },
    UnsupportedBinary {
        op: BinaryOp,
        left: String,
        right: String,
    },
    UnsupportedUnary {
        op: UnaryOp,
        operand: String,
    },
    UnsupportedComparison {
        left: String,
        right: String,
    },
    CannotCoerce {
        from: String,
        to: String,
    },
    InvalidMetaResult {
        meta: MetaKey,
        got: String,
    },
    NotIndexable {
        type_name: String,
    },
    NotCallable {
        type_name: String,
    },

    // Function
    ArityMismatch {
        name: String,
        expected: String,
        got: usize,
    },

    // Script-raised
    ScriptFailure,

    // Modules
    ImportFailed {
        id: String,
        reason: String,
    },
    CyclicImport {
        id: String,
    },

    // Runtime
    UndefinedVariable {
        name: String,
    },
    StackOverflow {
        depth: usize,
    },
    NativePanic {
        name: String,
        message: String,
    },

    /// Runtime failure without a more specific structure.
    Custom {
        message: String,
    },
}

impl EvalErrorKind {
    /// Map onto the script-visible taxonomy.
    pub fn category(&self) -> FailureKind {
        match self {
            Self::DivisionByZero | Self::ModuloByZero | Self::IntegerOverflow { .. } => {
                FailureKind::ArithmeticError
            }
            Self::TypeMismatch { .. }
            | Self::UnsupportedBinary { .. }
            | Self::UnsupportedUnary { .. }
            | Self::UnsupportedComparison { .. }
            | Self::CannotCoerce { .. }
            | Self::InvalidMetaResult { .. }
            | Self::NotIndexable { .. }
            | Self::NotCallable { .. } => FailureKind::TypeError,
            Self::ArityMismatch { .. } => FailureKind::ArityError,
            Self::ScriptFailure => FailureKind::ScriptError,
            Self::ImportFailed { .. } | Self::CyclicImport { .. } => FailureKind::ImportError,
            Self::UndefinedVariable { .. }
            | Self::StackOverflow { .. }
            | Self::NativePanic { .. }
            | Self::Custom { .. } => FailureKind::RuntimeError,
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Arithmetic
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::ModuloByZero => write!(f, "modulo by zero"),
            Self::IntegerOverflow { operation } => {
                write!(f, "integer overflow in {operation}")
            }

            // Type/Operator
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }
            Self::UnsupportedBinary { op, left, right } => write!(
                f,
                "operator `{}` cannot be applied to {left} and {right}",
                op.as_symbol()
            ),
            Self::UnsupportedUnary { op, operand } => write!(
                f,
                "operator `{}` cannot be applied to {operand}",
                op.as_symbol()
            ),
            Self::UnsupportedComparison { left, right } => {
                write!(f, "cannot compare {left} with {right}")
            }
            Self::CannotCoerce { from, to } => write!(f, "cannot convert {from} to {to}"),
            Self::InvalidMetaResult { meta, got } => {
                write!(f, "meta-method {meta} returned unusable {got}")
            }
            Self::NotIndexable { type_name } => write!(f, "{type_name} is not indexable"),
            Self::NotCallable { type_name } => write!(f, "{type_name} is not callable"),

            // Function
            Self::ArityMismatch {
                name,
                expected,
                got,
            } => {
                let arg_word = if expected == "1" {
                    "argument"
                } else {
                    "arguments"
                };
                write!(f, "{name} expects {expected} {arg_word}, got {got}")
            }

            Self::ScriptFailure => write!(f, "script failure"),

            // Modules
            Self::ImportFailed { id, reason } => write!(f, "cannot import '{id}': {reason}"),
            Self::CyclicImport { id } => write!(f, "cyclic import of '{id}'"),

            // Runtime
            Self::UndefinedVariable { name } => write!(f, "undefined variable: {name}"),
            Self::StackOverflow { depth } => {
                write!(f, "maximum call depth exceeded (limit: {depth})")
            }
            Self::NativePanic { name, message } => {
                write!(f, "native function {name} panicked: {message}")
            }
            Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// A single frame in an evaluation backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    /// Function name (`<main>` for a module body).
    pub name: String,
    /// Id of the module the function was compiled from.
    pub module: String,
    /// Location of the instruction executing in this frame.
    pub location: Option<Location>,
}

/// Snapshot of the call stack at a failure site, innermost frame first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "  {i}: {} ({}", frame.name, frame.module)?;
            if let Some(loc) = frame.location {
                write!(f, ":{loc}")?;
            }
            writeln!(f, ")")?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Human-readable message. For factory-created errors this equals
    /// `kind.to_string()`, except script failures, which carry the display
    /// form of their payload.
    pub message: String,
    /// Value raised by `fail`, surfaced as the `value` field on recovery.
    pub payload: Option<Value>,
    /// Source location of the failing instruction, when known.
    pub location: Option<Location>,
    /// Call stack at the failure site. Populated by the engine.
    pub backtrace: Option<EvalBacktrace>,
}

impl EvalError {
    /// Create a runtime error with just a message.
    ///
    /// Uses `Custom` kind. Prefer the specific factory functions.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_parts(
            EvalErrorKind::Custom {
                message: message.clone(),
            },
            message,
        )
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self::from_parts(kind, message)
    }

    fn from_parts(kind: EvalErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
            payload: None,
            location: None,
            backtrace: None,
        }
    }

    #[inline]
    pub fn category(&self) -> FailureKind {
        self.kind.category()
    }

    /// Attach a source location.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach a source location unless one is already recorded.
    ///
    /// Failures bubbling out of a callee keep the innermost location.
    #[must_use]
    pub fn or_location(mut self, location: Option<Location>) -> Self {
        if self.location.is_none() {
            self.location = location;
        }
        self
    }

    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        self.backtrace = Some(backtrace);
        self
    }

    /// Convert into the value `recover` hands back to scripts:
    /// `{kind, message, value?}`.
    pub fn to_value(&self) -> Value {
        let mut object = Object::new();
        object.set(Value::from("kind"), Value::from(self.category().as_str()));
        object.set(Value::from("message"), Value::from(self.message.as_str()));
        if let Some(payload) = &self.payload {
            object.set(Value::from("value"), payload.clone());
        }
        Value::object(object)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category(), self.message)?;
        if let Some(loc) = self.location {
            write!(f, " at {loc}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

// Arithmetic Errors

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn modulo_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ModuloByZero)
}

/// Integer overflow under the checked policy.
#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerOverflow {
        operation: operation.to_string(),
    })
}

// Type Errors

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

/// Arithmetic operator applied to operand kinds with no default behavior.
#[cold]
pub fn unsupported_binary(op: BinaryOp, left: &str, right: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnsupportedBinary {
        op,
        left: left.to_string(),
        right: right.to_string(),
    })
}

#[cold]
pub fn unsupported_unary(op: UnaryOp, operand: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnsupportedUnary {
        op,
        operand: operand.to_string(),
    })
}

/// Ordering requested between values that have none.
#[cold]
pub fn unsupported_comparison(left: &str, right: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnsupportedComparison {
        left: left.to_string(),
        right: right.to_string(),
    })
}

#[cold]
pub fn cannot_coerce(from: &str, to: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::CannotCoerce {
        from: from.to_string(),
        to: to.to_string(),
    })
}

/// A meta-method returned a value the operation cannot use.
#[cold]
pub fn invalid_meta_result(meta: MetaKey, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidMetaResult {
        meta,
        got: got.to_string(),
    })
}

#[cold]
pub fn not_indexable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotIndexable {
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

// Function Errors

#[cold]
pub fn arity_mismatch(name: &str, expected: Arity, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        got,
    })
}

/// Failure raised by a script with an arbitrary payload.
#[cold]
pub fn script_failure(payload: Value) -> EvalError {
    let mut err = EvalError::from_parts(EvalErrorKind::ScriptFailure, payload.to_string());
    err.payload = Some(payload);
    err
}

// Module Errors

#[cold]
pub fn import_failed(id: &str, reason: impl fmt::Display) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ImportFailed {
        id: id.to_string(),
        reason: reason.to_string(),
    })
}

#[cold]
pub fn cyclic_import(id: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::CyclicImport { id: id.to_string() })
}

// Runtime Errors

#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedVariable {
        name: name.to_string(),
    })
}

#[cold]
pub fn recursion_limit_exceeded(limit: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth: limit })
}

#[cold]
pub fn native_panic(name: &str, message: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NativePanic {
        name: name.to_string(),
        message: message.to_string(),
    })
}

#[cold]
pub fn runtime_error(message: impl Into<String>) -> EvalError {
    EvalError::new(message)
}

#[cfg(test)]
mod tests;
