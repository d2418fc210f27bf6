//! The Execution Context: global runtime state shared by every module run.
//!
//! A `Context` owns the module cache, the native module registry, the
//! arithmetic strategy, the output binding and runtime configuration. It is
//! a cheap clonable handle; independent contexts share nothing.

mod builder;

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::debug;

use lumo_ir::Compiler;
use lumo_value::{EvalResult, Name, Value};

use crate::arith::Arithmetic;
use crate::builtins::Builtins;
use crate::errors::{HostError, LoadError, RegisterError};
use crate::interpreter::Interpreter;
use crate::loader::{Resolver, Source};
use crate::module::Module;
use crate::native::NativeModule;
use crate::print_handler::SharedPrintHandler;

pub use builder::ContextBuilder;

/// Runtime limits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EvalConfig {
    /// Maximum number of simultaneously active calls, script and native.
    pub max_call_depth: usize,
}

impl EvalConfig {
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 512;
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            max_call_depth: Self::DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Shared handle to an execution context.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

pub(crate) struct ContextInner {
    resolver: Arc<dyn Resolver>,
    compiler: Arc<dyn Compiler>,
    arithmetic: Arc<dyn Arithmetic>,
    print_handler: SharedPrintHandler,
    config: EvalConfig,
    builtins: Builtins,
    natives: RwLock<FxHashMap<Name, Arc<dyn NativeModule>>>,
    /// Write-once: a module never leaves the cache or changes identity.
    cache: Mutex<FxHashMap<Name, Arc<Module>>>,
}

impl Context {
    /// A context with default strategy, output and limits.
    pub fn new(resolver: impl Resolver + 'static, compiler: impl Compiler + 'static) -> Self {
        ContextBuilder::new()
            .resolver(resolver)
            .compiler(compiler)
            .build()
    }

    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub(crate) fn from_inner(inner: Arc<ContextInner>) -> Self {
        Context { inner }
    }

    /// Resolve, compile and cache module `id`, or return the cached module.
    ///
    /// The cache lock is held for the whole operation, so concurrent loads
    /// of one id resolve and compile it exactly once. A failed load caches
    /// nothing.
    #[tracing::instrument(level = "debug", skip_all, fields(id = %id))]
    pub fn load(&self, id: &str) -> Result<Arc<Module>, LoadError> {
        let mut cache = self.inner.cache.lock();
        if let Some(module) = cache.get(id) {
            debug!("cache hit");
            return Ok(Arc::clone(module));
        }
        debug!("cache miss");

        let weak = Arc::downgrade(&self.inner);
        let native = self.inner.natives.read().get(id).cloned();
        let module = match native {
            Some(native) => Module::native(Name::from(id), native, weak),
            None => {
                let source =
                    self.inner
                        .resolver
                        .resolve(id)
                        .map_err(|source| LoadError::Resolution {
                            id: id.to_string(),
                            source,
                        })?;
                let unit = match source {
                    Source::Text(bytes) => Arc::new(self.inner.compiler.compile(id, &bytes)?),
                    Source::Precompiled(unit) => unit,
                };
                debug!(instructions = unit.main.instruction_count(), "compiled");
                Module::compiled(Name::from(id), unit, weak)
            }
        };

        let module = Arc::new(module);
        cache.insert(Name::from(id), Arc::clone(&module));
        Ok(module)
    }

    /// Register a native module under its id.
    ///
    /// Replaces an earlier registration, but only until a module with that
    /// id has been loaded; afterwards the cached module is authoritative.
    pub fn register(&self, module: Arc<dyn NativeModule>) -> Result<(), RegisterError> {
        let id = Name::from(module.id());
        let cache = self.inner.cache.lock();
        if cache.contains_key(&id) {
            return Err(RegisterError::AlreadyLoaded { id: id.to_string() });
        }
        debug!(id = %id, "registered native module");
        self.inner.natives.write().insert(id, module);
        Ok(())
    }

    /// Load and run a module in one step.
    pub fn run(&self, id: &str, args: &[Value]) -> Result<Value, HostError> {
        let module = self.load(id)?;
        Ok(module.run(args)?)
    }

    /// Call a function value from host code, e.g. one exported by a module.
    pub fn call(&self, callee: &Value, args: &[Value]) -> EvalResult {
        self.interpreter().call_from_host(callee, Value::Nil, args)
    }

    /// A fresh interpreter bound to this context.
    pub fn interpreter(&self) -> Interpreter {
        Interpreter::new(self.clone())
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.inner.cache.lock().contains_key(id)
    }

    /// Ids of every cached module, sorted.
    pub fn loaded_ids(&self) -> Vec<Name> {
        let mut ids: Vec<Name> = self.inner.cache.lock().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    pub fn arithmetic(&self) -> &dyn Arithmetic {
        &*self.inner.arithmetic
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.inner.print_handler
    }

    pub fn config(&self) -> EvalConfig {
        self.inner.config
    }

    pub(crate) fn builtin(&self, name: &str) -> Option<Value> {
        self.inner.builtins.get(name)
    }

    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("arithmetic", &self.inner.arithmetic)
            .field("config", &self.inner.config)
            .field("loaded", &self.loaded_ids())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
