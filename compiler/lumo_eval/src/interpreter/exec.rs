//! Dispatch loop for one activation.

use std::sync::Arc;

use smallvec::SmallVec;

use lumo_ir::{Constant, Instr};
use lumo_value::{
    runtime_error, undefined_variable, Closure, EvalError, EvalResult, FunctionValue, Object,
    SharedScope, Str, Value,
};

use super::Interpreter;
use crate::builtins::sequence;

type ArgBuffer = SmallVec<[Value; 8]>;

enum Flow {
    Next,
    Jump(u32),
    Return(Value),
}

/// State of one running activation.
struct Frame<'a> {
    closure: &'a Closure,
    receiver: Value,
    args: &'a [Value],
    stack: SmallVec<[Value; 16]>,
    scope: SharedScope,
    /// Nested scopes opened by `PushScope` and not yet closed.
    scope_depth: usize,
}

impl Frame<'_> {
    #[inline]
    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    #[inline]
    fn pop(&mut self) -> Result<Value, EvalError> {
        self.stack.pop().ok_or_else(stack_underflow)
    }

    fn peek(&self) -> Result<&Value, EvalError> {
        self.stack.last().ok_or_else(stack_underflow)
    }

    /// Pop the top `n` values, oldest first.
    fn pop_n(&mut self, n: usize) -> Result<ArgBuffer, EvalError> {
        let at = self
            .stack
            .len()
            .checked_sub(n)
            .ok_or_else(stack_underflow)?;
        Ok(self.stack.drain(at..).collect())
    }
}

#[cold]
fn stack_underflow() -> EvalError {
    runtime_error("operand stack underflow")
}

fn constant_value(constant: &Constant) -> Value {
    match constant {
        Constant::Nil => Value::Nil,
        Constant::Bool(b) => Value::Bool(*b),
        Constant::Int(n) => Value::int(*n),
        Constant::Float(x) => Value::float(*x),
        Constant::Str(s) => Value::Str(Str::from(Arc::clone(s))),
    }
}

impl Interpreter {
    /// Run the body of `closure` with its parameters already bound in
    /// `scope`. Falling off the end of the code returns Nil.
    pub(super) fn execute(
        &mut self,
        closure: &Closure,
        scope: SharedScope,
        receiver: Value,
        args: &[Value],
    ) -> EvalResult {
        let proto = &*closure.proto;
        let mut frame = Frame {
            closure,
            receiver,
            args,
            stack: SmallVec::new(),
            scope,
            scope_depth: 0,
        };
        let mut ip = 0;
        while let Some(instr) = proto.code.get(ip) {
            let location = proto.location_of(ip);
            self.call_stack.set_location(location);
            match self.step(&mut frame, instr) {
                Ok(Flow::Next) => ip += 1,
                Ok(Flow::Jump(target)) => ip = target as usize,
                Ok(Flow::Return(value)) => return Ok(value),
                Err(err) => return Err(self.fail(err.or_location(location))),
            }
        }
        Ok(Value::Nil)
    }

    fn step(&mut self, frame: &mut Frame<'_>, instr: &Instr) -> Result<Flow, EvalError> {
        let closure = frame.closure;
        let proto = &*closure.proto;
        match instr {
            Instr::Nil => frame.push(Value::Nil),
            Instr::True => frame.push(Value::Bool(true)),
            Instr::False => frame.push(Value::Bool(false)),
            Instr::Const(i) => {
                let constant = proto
                    .constants
                    .get(*i as usize)
                    .ok_or_else(|| runtime_error(format!("constant #{i} out of range")))?;
                frame.push(constant_value(constant));
            }
            Instr::Pop => {
                frame.pop()?;
            }
            Instr::Dup => {
                let top = frame.peek()?.clone();
                frame.push(top);
            }
            Instr::Load(name) => {
                let value = match frame.scope.lookup(name) {
                    Some(value) => value,
                    None => self
                        .context
                        .builtin(name)
                        .ok_or_else(|| undefined_variable(name))?,
                };
                frame.push(value);
            }
            Instr::Store(name) => {
                let value = frame.pop()?;
                frame
                    .scope
                    .assign(name, value)
                    .map_err(|_| undefined_variable(name))?;
            }
            Instr::Define(name) => {
                let value = frame.pop()?;
                frame.scope.define(name.clone(), value);
            }
            Instr::PushScope => {
                frame.scope = frame.scope.child();
                frame.scope_depth += 1;
            }
            Instr::PopScope => {
                let parent = frame
                    .scope
                    .parent()
                    .filter(|_| frame.scope_depth > 0)
                    .ok_or_else(|| runtime_error("endscope without a matching scope"))?;
                frame.scope = parent;
                frame.scope_depth -= 1;
            }
            Instr::Binary(op) => {
                let rhs = frame.pop()?;
                let lhs = frame.pop()?;
                let result = self.binary(*op, &lhs, &rhs)?;
                frame.push(result);
            }
            Instr::Compare(op) => {
                let rhs = frame.pop()?;
                let lhs = frame.pop()?;
                let result = self.compare(*op, &lhs, &rhs)?;
                frame.push(Value::Bool(result));
            }
            Instr::Unary(op) => {
                let operand = frame.pop()?;
                let result = self.unary(*op, &operand)?;
                frame.push(result);
            }
            Instr::Jump(target) => return Ok(Flow::Jump(*target)),
            Instr::JumpIfFalse(target) => {
                let cond = frame.pop()?;
                if !self.truthy(&cond)? {
                    return Ok(Flow::Jump(*target));
                }
            }
            Instr::JumpIfTrue(target) => {
                let cond = frame.pop()?;
                if self.truthy(&cond)? {
                    return Ok(Flow::Jump(*target));
                }
            }
            Instr::Closure(i) => {
                let child = proto
                    .children
                    .get(*i as usize)
                    .ok_or_else(|| runtime_error(format!("function #{i} out of range")))?;
                let captured =
                    Closure::new(Arc::clone(child), closure.module.clone(), frame.scope.clone());
                frame.push(Value::function(FunctionValue::Script(captured)));
            }
            Instr::Call(n) => {
                let args = frame.pop_n(*n as usize)?;
                let callee = frame.pop()?;
                let result = self.call_value(&callee, Value::Nil, &args)?;
                frame.push(result);
            }
            Instr::Invoke(n) => {
                let args = frame.pop_n(*n as usize)?;
                let key = frame.pop()?;
                let receiver = frame.pop()?;
                let callee = self.get_index(&receiver, &key)?;
                let result = self.call_value(&callee, receiver, &args)?;
                frame.push(result);
            }
            Instr::GetIndex => {
                let key = frame.pop()?;
                let target = frame.pop()?;
                let value = self.get_index(&target, &key)?;
                frame.push(value);
            }
            Instr::SetIndex => {
                let value = frame.pop()?;
                let key = frame.pop()?;
                let target = frame.pop()?;
                self.put_index(&target, key, value)?;
            }
            Instr::NewObject(n) => {
                let items = frame.pop_n(*n as usize * 2)?;
                let mut object = Object::new();
                let mut items = items.into_iter();
                while let (Some(key), Some(value)) = (items.next(), items.next()) {
                    object.set(key, value);
                }
                frame.push(Value::object(object));
            }
            Instr::Receiver => {
                let receiver = frame.receiver.clone();
                frame.push(receiver);
            }
            Instr::Arg(i) => {
                let arg = frame.args.get(*i as usize).cloned().unwrap_or_default();
                frame.push(arg);
            }
            Instr::Args => {
                let all = sequence(frame.args.to_vec());
                frame.push(all);
            }
            Instr::IterStart => {
                let source = frame.pop()?;
                let iter = self.iterate(&source)?;
                frame.push(iter);
            }
            Instr::IterNext(target) => {
                let iter = frame.peek()?.clone();
                let item = self.call_value(&iter, Value::Nil, &[])?;
                if item.is_nil() {
                    frame.pop()?;
                    return Ok(Flow::Jump(*target));
                }
                frame.push(item);
            }
            Instr::Return => return frame.pop().map(Flow::Return),
        }
        Ok(Flow::Next)
    }
}
