//! `ContextBuilder` for creating contexts with custom collaborators.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use lumo_ir::{CompileError, CompiledUnit, Compiler, Location};
use lumo_value::Name;

use super::{Context, ContextInner, EvalConfig};
use crate::arith::{Arithmetic, NumericArithmetic};
use crate::builtins::Builtins;
use crate::loader::{MemoryResolver, Resolver};
use crate::native::NativeModule;
use crate::print_handler::{stdout_handler, SharedPrintHandler};

/// Builder for `Context`.
///
/// Every collaborator has a default: an empty `MemoryResolver`, a compiler
/// that rejects text sources, checked `NumericArithmetic`, stdout output and
/// `EvalConfig::default()`.
pub struct ContextBuilder {
    resolver: Option<Arc<dyn Resolver>>,
    compiler: Option<Arc<dyn Compiler>>,
    arithmetic: Option<Arc<dyn Arithmetic>>,
    print_handler: Option<SharedPrintHandler>,
    config: EvalConfig,
    natives: Vec<Arc<dyn NativeModule>>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        ContextBuilder {
            resolver: None,
            compiler: None,
            arithmetic: None,
            print_handler: None,
            config: EvalConfig::default(),
            natives: Vec::new(),
        }
    }

    #[must_use]
    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    #[must_use]
    pub fn compiler(mut self, compiler: impl Compiler + 'static) -> Self {
        self.compiler = Some(Arc::new(compiler));
        self
    }

    /// Set the arithmetic/comparison strategy for this context only.
    #[must_use]
    pub fn arithmetic(mut self, arithmetic: impl Arithmetic + 'static) -> Self {
        self.arithmetic = Some(Arc::new(arithmetic));
        self
    }

    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.config.max_call_depth = depth;
        self
    }

    #[must_use]
    pub fn config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a native module up front. Later registrations with the same
    /// id replace earlier ones.
    #[must_use]
    pub fn native(mut self, module: impl NativeModule + 'static) -> Self {
        self.natives.push(Arc::new(module));
        self
    }

    pub fn build(self) -> Context {
        let mut natives: FxHashMap<Name, Arc<dyn NativeModule>> = FxHashMap::default();
        for module in self.natives {
            let id = Name::from(module.id());
            natives.insert(id, module);
        }
        let inner = ContextInner {
            resolver: self
                .resolver
                .unwrap_or_else(|| Arc::new(MemoryResolver::new())),
            compiler: self.compiler.unwrap_or_else(|| Arc::new(NoCompiler)),
            arithmetic: self
                .arithmetic
                .unwrap_or_else(|| Arc::new(NumericArithmetic::default())),
            print_handler: self.print_handler.unwrap_or_else(stdout_handler),
            config: self.config,
            builtins: Builtins::standard(),
            natives: RwLock::new(natives),
            cache: Mutex::new(FxHashMap::default()),
        };
        Context::from_inner(Arc::new(inner))
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Stand-in for contexts that only run native or precompiled modules.
struct NoCompiler;

impl Compiler for NoCompiler {
    fn compile(&self, id: &str, _source: &[u8]) -> Result<CompiledUnit, CompileError> {
        Err(CompileError::new(
            id,
            "no compiler configured for source modules",
            Location::UNKNOWN,
        ))
    }
}
