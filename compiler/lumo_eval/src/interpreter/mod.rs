//! The Call/Execution Engine.
//!
//! An `Interpreter` runs compiled prototypes on behalf of one logical call
//! stack. Failures unwind by `Result` propagation only: there are no
//! panics or exceptions on the failure path, which is what lets `recover`
//! intercept any failure with a plain `match`.
//!
//! # Failure states
//!
//! ```text
//!   Running --failure--> Failing --recover--> Recovered --> Running
//!                           |
//!                           +--reaches the host--> Propagating
//! ```

mod exec;
mod ops;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use lumo_ir::CompiledUnit;
use lumo_value::{
    arity_mismatch, import_failed, native_panic, not_callable, Closure, Engine, EvalError,
    EvalResult, FunctionRef, FunctionValue, Name, NativeCall, NativeFunction, SharedScope, Str,
    Value,
};

use crate::context::Context;
use crate::diagnostics::{CallFrame, CallStack};
use crate::module::Module;
use crate::native::NativeModule;
use crate::stack::ensure_sufficient_stack;

/// Observable phase of the failure/recovery state machine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ExecState {
    #[default]
    Running,
    /// A failure is unwinding through script frames.
    Failing,
    /// A `recover` boundary intercepted the failure.
    Recovered,
    /// The failure left the outermost module run and was handed to the host.
    Propagating,
}

/// Interpreter for one logical call stack.
pub struct Interpreter {
    context: Context,
    call_stack: CallStack,
    state: ExecState,
}

impl Interpreter {
    pub fn new(context: Context) -> Self {
        let call_stack = CallStack::new(context.config().max_call_depth);
        Interpreter {
            context,
            call_stack,
            state: ExecState::Running,
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    /// Number of active calls.
    pub fn depth(&self) -> usize {
        self.call_stack.depth()
    }

    fn transition(&mut self, next: ExecState) {
        if self.state != next {
            trace!(from = ?self.state, to = ?next, "exec state");
            self.state = next;
        }
    }

    /// Enter the failing state and attach the current backtrace.
    #[cold]
    fn fail(&mut self, err: EvalError) -> EvalError {
        self.transition(ExecState::Failing);
        self.call_stack.attach_backtrace(err)
    }

    /// Run a module, entering the propagating state if its failure reaches
    /// the host.
    pub fn run_module(&mut self, module: &Module, args: &[Value]) -> EvalResult {
        let outermost = self.call_stack.is_empty();
        if outermost {
            self.transition(ExecState::Running);
        }
        let result = module.run_in(self, args);
        if outermost && result.is_err() {
            self.transition(ExecState::Propagating);
        }
        result
    }

    /// Call `callee` on behalf of the host. Like [`Interpreter::run_module`],
    /// a failure that leaves the outermost call enters the propagating state.
    pub fn call_from_host(&mut self, callee: &Value, receiver: Value, args: &[Value]) -> EvalResult {
        let outermost = self.call_stack.is_empty();
        if outermost {
            self.transition(ExecState::Running);
        }
        let result = self.call_value(callee, receiver, args);
        if outermost && result.is_err() {
            self.transition(ExecState::Propagating);
        }
        result
    }

    /// Execute a unit's top-level prototype in a fresh module scope.
    pub(crate) fn run_unit(&mut self, unit: &CompiledUnit, module: &Name, args: &[Value]) -> EvalResult {
        let closure = Closure::new(Arc::clone(&unit.main), module.clone(), SharedScope::new());
        self.call_closure(&closure, Value::Nil, args)
    }

    /// Run a native module's `build` behind the same panic boundary as
    /// native function calls.
    pub(crate) fn build_native(
        &mut self,
        id: &Name,
        module: &dyn NativeModule,
        args: &[Value],
    ) -> EvalResult {
        self.call_stack
            .push(CallFrame::new(Name::from("<build>"), id.clone()))
            .map_err(|err| self.fail(err))?;
        let depth = self.call_stack.depth();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| module.build(self, args)));
        self.call_stack.truncate(depth);
        let result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(&*payload);
                warn!(module = %id, %message, "native module panicked");
                Err(native_panic(id, &message))
            }
        };
        let result = result.map_err(|err| self.fail(err));
        self.call_stack.pop();
        result
    }

    /// Call any value. Non-functions fail at the call site.
    pub fn call_value(&mut self, callee: &Value, receiver: Value, args: &[Value]) -> EvalResult {
        match callee {
            Value::Function(f) => self.call_function(f, receiver, args),
            other => Err(self.fail(not_callable(other.type_name()))),
        }
    }

    pub(crate) fn call_function(
        &mut self,
        func: &FunctionRef,
        receiver: Value,
        args: &[Value],
    ) -> EvalResult {
        match func.get() {
            FunctionValue::Script(closure) => self.call_closure(closure, receiver, args),
            FunctionValue::Native(native) => self.call_native(native, receiver, args),
        }
    }

    /// Call a script function: parameters bind positionally in a new scope
    /// whose parent is the captured scope. Missing arguments read as Nil and
    /// extra ones are only reachable through `arg`/`args`.
    fn call_closure(&mut self, closure: &Closure, receiver: Value, args: &[Value]) -> EvalResult {
        let proto = &closure.proto;
        self.call_stack
            .push(CallFrame::new(proto.name.clone(), closure.module.clone()))
            .map_err(|err| self.fail(err))?;
        trace!(name = %proto.name, module = %closure.module, depth = self.call_stack.depth(), "call");

        let scope = closure.scope.child();
        for (i, param) in proto.params.iter().enumerate() {
            scope.define(param.clone(), args.get(i).cloned().unwrap_or_default());
        }
        let result = ensure_sufficient_stack(|| self.execute(closure, scope, receiver, args));
        self.call_stack.pop();
        result
    }

    /// Call a host function after checking its declared arity. A panic in
    /// the host closure becomes a `NativePanic` failure.
    fn call_native(&mut self, native: &NativeFunction, receiver: Value, args: &[Value]) -> EvalResult {
        if !native.arity.accepts(args.len()) {
            return Err(self.fail(arity_mismatch(&native.name, native.arity, args.len())));
        }
        self.call_stack
            .push(CallFrame::new(native.name.clone(), Name::from("<native>")))
            .map_err(|err| self.fail(err))?;
        trace!(name = %native.name, args = args.len(), "native call");

        let depth = self.call_stack.depth();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut call = NativeCall::new(self, &native.name, receiver, args);
            (*native.func)(&mut call)
        }));
        // A panic may have skipped the pops of frames pushed below us.
        self.call_stack.truncate(depth);
        let result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(&*payload);
                warn!(name = %native.name, %message, "native function panicked");
                Err(native_panic(&native.name, &message))
            }
        };
        let result = result.map_err(|err| self.fail(err));
        self.call_stack.pop();
        result
    }

    /// Call `thunk` with no arguments. Success yields Nil; a failure is
    /// intercepted, the call stack is cut back to this boundary, and the
    /// failure is returned as a value.
    pub fn recover(&mut self, thunk: &Value) -> EvalResult {
        let depth = self.call_stack.depth();
        match self.call_value(thunk, Value::Nil, &[]) {
            Ok(_) => Ok(Value::Nil),
            Err(err) => {
                self.call_stack.truncate(depth);
                self.transition(ExecState::Recovered);
                debug!(kind = %err.category(), message = %err.message, "recovered failure");
                self.transition(ExecState::Running);
                Ok(err.to_value())
            }
        }
    }

    /// Load module `id` through the context and run it on this call stack.
    pub fn import(&mut self, id: &str) -> EvalResult {
        let module = match self.context.load(id) {
            Ok(module) => module,
            Err(err) => return Err(self.fail(import_failed(id, err))),
        };
        module.run_in(self, &[])
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl Engine for Interpreter {
    fn call(&mut self, callee: &Value, receiver: Value, args: &[Value]) -> EvalResult {
        self.call_value(callee, receiver, args)
    }

    fn recover(&mut self, thunk: &Value) -> EvalResult {
        Interpreter::recover(self, thunk)
    }

    fn import(&mut self, id: &str) -> EvalResult {
        Interpreter::import(self, id)
    }

    fn index(&mut self, target: &Value, key: &Value) -> EvalResult {
        self.get_index(target, key)
    }

    fn set_index(&mut self, target: &Value, key: Value, value: Value) -> Result<(), EvalError> {
        self.put_index(target, key, value)
    }

    fn equals(&mut self, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
        self.values_equal(lhs, rhs)
    }

    fn to_int(&mut self, value: &Value) -> Result<i64, EvalError> {
        self.coerce_int(value)
    }

    fn to_float(&mut self, value: &Value) -> Result<f64, EvalError> {
        self.coerce_float(value)
    }

    fn to_str(&mut self, value: &Value) -> Result<Str, EvalError> {
        self.coerce_str(value)
    }

    fn to_bool(&mut self, value: &Value) -> Result<bool, EvalError> {
        self.truthy(value)
    }

    fn length(&mut self, value: &Value) -> Result<i64, EvalError> {
        self.length_of(value)
    }

    fn print(&mut self, text: &str) {
        self.context.print_handler().write(text);
    }
}
