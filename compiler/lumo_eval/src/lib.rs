#![allow(
    clippy::result_large_err,
    reason = "EvalError is the single failure channel; boxing would add noise across every crate"
)]
//! Lumo Eval - Execution engine for the Lumo runtime.
//!
//! This crate runs compiled units produced by a `lumo_ir::Compiler`.
//!
//! # Architecture
//!
//! - `Context`: execution context owning the module cache, native module
//!   registry, arithmetic strategy, output binding and limits
//! - `Module`: a cached unit or native module with run-once memoization
//! - `Interpreter`: stack machine with an explicit call stack and the
//!   failure/recovery state machine (`ExecState`)
//! - `Arithmetic`: pluggable arithmetic and ordering (`NumericArithmetic`)
//! - `Resolver`: maps module ids to source text or precompiled units
//! - `NativeModule`: host-implemented modules exposed to scripts
//!
//! # Example
//!
//! ```ignore
//! let context = Context::builder()
//!     .resolver(MemoryResolver::new().with_text("main", source))
//!     .compiler(Assembler::new())
//!     .build();
//! let value = context.run("main", &[])?;
//! ```

mod arith;
mod builtins;
mod context;
mod diagnostics;
pub mod errors;
mod interpreter;
mod loader;
mod module;
mod native;
mod print_handler;
mod stack;

use std::sync::Once;

pub use arith::{Arithmetic, NumericArithmetic, Overflow};
pub use builtins::{sequence, Builtins};
pub use context::{Context, ContextBuilder, EvalConfig};
pub use diagnostics::{CallFrame, CallStack};
pub use errors::{HostError, LoadError, RegisterError, ResolveError};
pub use interpreter::{ExecState, Interpreter};
pub use loader::{FileResolver, MemoryResolver, Resolver, Source};
pub use module::Module;
pub use native::{NativeModule, NativeModuleFn};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, PrintHandler, SharedPrintHandler,
};
pub use stack::ensure_sufficient_stack;

// Re-export the value model so embedders need a single dependency.
pub use lumo_value::{
    Arity, Engine, EvalError, EvalErrorKind, EvalResult, FailureKind, MetaKey, NativeCall,
    NativeFunction, Object, ObjectBuilder, ObjectRef, Value,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing subscriber for debugging.
///
/// Safe to call multiple times. Enable with `RUST_LOG=lumo_eval=debug` or
/// `RUST_LOG=lumo_eval=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            // Another subscriber may already be installed by the host.
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
