//! Loaded modules and their run-once semantics.

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::ReentrantMutex;
use tracing::debug;

use lumo_ir::CompiledUnit;
use lumo_value::{cyclic_import, runtime_error, EvalResult, Name, Value};

use crate::context::{Context, ContextInner};
use crate::interpreter::Interpreter;
use crate::native::NativeModule;

enum ModuleKind {
    Compiled(Arc<CompiledUnit>),
    Native(Arc<dyn NativeModule>),
}

enum RunState {
    Pending,
    /// Top-level code is executing; re-entry on the same thread is a cycle.
    Running,
    Done(Value),
}

/// A cached module: a compiled unit or a native module, plus the memoized
/// result of its first successful run.
///
/// Runs are serialized per module. A second thread calling `run` while the
/// first is executing blocks until it finishes, then sees the memoized
/// value. A failed run memoizes nothing, so the next `run` retries.
pub struct Module {
    id: Name,
    kind: ModuleKind,
    context: Weak<ContextInner>,
    state: ReentrantMutex<RefCell<RunState>>,
}

impl Module {
    pub(crate) fn compiled(id: Name, unit: Arc<CompiledUnit>, context: Weak<ContextInner>) -> Self {
        Module::with_kind(id, ModuleKind::Compiled(unit), context)
    }

    pub(crate) fn native(
        id: Name,
        module: Arc<dyn NativeModule>,
        context: Weak<ContextInner>,
    ) -> Self {
        Module::with_kind(id, ModuleKind::Native(module), context)
    }

    fn with_kind(id: Name, kind: ModuleKind, context: Weak<ContextInner>) -> Self {
        Module {
            id,
            kind,
            context,
            state: ReentrantMutex::new(RefCell::new(RunState::Pending)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_native(&self) -> bool {
        matches!(self.kind, ModuleKind::Native(_))
    }

    /// The compiled unit backing a script module.
    pub fn unit(&self) -> Option<&Arc<CompiledUnit>> {
        match &self.kind {
            ModuleKind::Compiled(unit) => Some(unit),
            ModuleKind::Native(_) => None,
        }
    }

    /// The memoized result, if a run has completed successfully.
    pub fn value(&self) -> Option<Value> {
        let guard = self.state.lock();
        let state = guard.borrow();
        match &*state {
            RunState::Done(v) => Some(v.clone()),
            RunState::Pending | RunState::Running => None,
        }
    }

    /// Run the module's top-level code with `args` bound to its parameters,
    /// or return the memoized result of an earlier successful run.
    #[tracing::instrument(level = "debug", skip_all, fields(id = %self.id))]
    pub fn run(&self, args: &[Value]) -> EvalResult {
        let inner = self.context.upgrade().ok_or_else(|| {
            runtime_error(format!(
                "execution context of module '{}' has been dropped",
                self.id
            ))
        })?;
        let mut interpreter = Interpreter::new(Context::from_inner(inner));
        interpreter.run_module(self, args)
    }

    /// Run on an existing interpreter; used by nested imports so the call
    /// stack and depth limit span the whole import chain.
    pub(crate) fn run_in(&self, interpreter: &mut Interpreter, args: &[Value]) -> EvalResult {
        let guard = self.state.lock();
        match &*guard.borrow() {
            RunState::Done(v) => {
                debug!(id = %self.id, "memoized");
                return Ok(v.clone());
            }
            RunState::Running => return Err(cyclic_import(&self.id)),
            RunState::Pending => {}
        }

        *guard.borrow_mut() = RunState::Running;
        let result = match &self.kind {
            ModuleKind::Compiled(unit) => interpreter.run_unit(unit, &self.id, args),
            ModuleKind::Native(native) => interpreter.build_native(&self.id, &**native, args),
        };
        *guard.borrow_mut() = match &result {
            Ok(v) => RunState::Done(v.clone()),
            Err(_) => RunState::Pending,
        };
        result
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("native", &self.is_native())
            .finish_non_exhaustive()
    }
}
