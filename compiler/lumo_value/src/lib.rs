#![allow(
    clippy::result_large_err,
    reason = "EvalError is the single failure channel; boxing would add noise across every crate"
)]
//! Lumo Value - Runtime value model for the Lumo runtime.
//!
//! This crate provides:
//! - Runtime values (`Value`, `Number`, `Str`) with value semantics for
//!   primitives and reference semantics for objects and functions
//! - Ordered, identity-shared objects (`Object`, `ObjectRef`) with
//!   meta-method overrides (`MetaKey`)
//! - Script closures and host functions (`FunctionValue`, `FunctionRef`)
//! - Lexical scopes shared by reference between closures (`Scope`,
//!   `SharedScope`)
//! - The unified failure type (`EvalError`, `EvalResult`)
//! - The `Engine` trait that host functions use to call back into the
//!   running interpreter
//!
//! # Reference vs. Value Semantics
//!
//! `Nil`, `Bool`, `Number` and `Str` copy by value (strings are immutable,
//! so sharing their buffer is invisible). `Object` and `Function` hold
//! `Arc` handles: cloning a `Value` aliases the same instance, and identity
//! is pointer identity. Handles can only be created through their
//! constructors (`ObjectRef::new`, `FunctionRef::new`).

mod coerce;
mod engine;
mod errors;
mod function;
mod meta;
mod object;
mod scope;
mod value;

pub use engine::Engine;
pub use errors::{
    BacktraceFrame, EvalBacktrace, EvalError, EvalErrorKind, EvalResult, FailureKind,
};
pub use function::{Arity, Closure, FunctionRef, FunctionValue, NativeCall, NativeFn, NativeFunction};
pub use meta::MetaKey;
pub use object::{Object, ObjectBuilder, ObjectKey, ObjectRef};
pub use scope::{AssignError, Scope, SharedScope};
pub use value::{Number, Str, Value};

// Re-export error constructors for use by other crates
pub use errors::{
    arity_mismatch, cannot_coerce, cyclic_import, division_by_zero, import_failed,
    integer_overflow, invalid_meta_result, modulo_by_zero, native_panic, not_callable,
    not_indexable, recursion_limit_exceeded, runtime_error, script_failure, type_mismatch,
    undefined_variable, unsupported_binary, unsupported_comparison, unsupported_unary,
};

pub use lumo_ir::Name;
