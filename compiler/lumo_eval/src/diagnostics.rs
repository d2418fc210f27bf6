//! Live call stack tracking for the interpreter.
//!
//! `CallStack` bounds recursion depth and snapshots itself into an
//! `EvalBacktrace` at failure sites.

use lumo_ir::{Location, Name};
use lumo_value::{recursion_limit_exceeded, BacktraceFrame, EvalBacktrace, EvalError};

/// A single activation on the live call stack.
#[derive(Clone, Debug)]
pub struct CallFrame {
    /// Function name, or the native function's registered name.
    pub name: Name,
    /// Module the function belongs to (`<native>` for host functions).
    pub module: Name,
    /// Location of the instruction currently executing in this frame.
    pub location: Option<Location>,
}

impl CallFrame {
    pub fn new(name: Name, module: Name) -> Self {
        CallFrame {
            name,
            module,
            location: None,
        }
    }
}

/// Bounded stack of activations.
///
/// # Example
///
/// ```ignore
/// let mut stack = CallStack::new(512);
/// stack.push(CallFrame::new(name, module))?;
/// // ... execute the body ...
/// stack.pop();
/// ```
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: usize,
}

impl CallStack {
    pub fn new(max_depth: usize) -> Self {
        CallStack {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame, failing with a stack overflow error at the limit.
    /// The frame is not pushed on overflow.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), EvalError> {
        if self.frames.len() >= self.max_depth {
            return Err(recursion_limit_exceeded(self.max_depth));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    /// Drop every frame above `depth`.
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn current_frame(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Record the executing location of the innermost frame.
    #[inline]
    pub fn set_location(&mut self, location: Option<Location>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.location = location;
        }
    }

    /// Snapshot as a backtrace, most recent call first.
    pub fn capture(&self) -> EvalBacktrace {
        let frames = self
            .frames
            .iter()
            .rev()
            .map(|f| BacktraceFrame {
                name: f.name.to_string(),
                module: f.module.to_string(),
                location: f.location,
            })
            .collect();
        EvalBacktrace::new(frames)
    }

    /// Attach a backtrace unless the error already carries one from a
    /// deeper frame.
    pub fn attach_backtrace(&self, err: EvalError) -> EvalError {
        if self.frames.is_empty() || err.backtrace.is_some() {
            return err;
        }
        err.with_backtrace(self.capture())
    }
}
