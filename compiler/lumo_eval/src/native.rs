//! Native module bridge.
//!
//! A native module is a host-provided capability (filesystem access, a
//! clock, a math library) that scripts obtain through `import` exactly like
//! a script module. The context wraps it in a `Module`, so `build` runs at
//! most once successfully and its value is memoized.

use std::fmt;

use lumo_value::{Engine, EvalResult, Value};

/// A host capability exposed under a module id.
pub trait NativeModule: Send + Sync {
    /// Id scripts import this module by.
    fn id(&self) -> &str;

    /// Produce the module's value, usually an object of native functions.
    ///
    /// `args` are the arguments of the first `run`; imports pass none.
    fn build(&self, engine: &mut dyn Engine, args: &[Value]) -> EvalResult;
}

/// Adapts a closure into a `NativeModule`.
///
/// ```text
/// let math = NativeModuleFn::new("math", |_, _| {
///     Ok(Object::builder().field("pi", std::f64::consts::PI).build())
/// });
/// ```
pub struct NativeModuleFn<F> {
    id: String,
    build: F,
}

impl<F> NativeModuleFn<F>
where
    F: Fn(&mut dyn Engine, &[Value]) -> EvalResult + Send + Sync,
{
    pub fn new(id: impl Into<String>, build: F) -> Self {
        NativeModuleFn {
            id: id.into(),
            build,
        }
    }
}

impl<F> NativeModule for NativeModuleFn<F>
where
    F: Fn(&mut dyn Engine, &[Value]) -> EvalResult + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn build(&self, engine: &mut dyn Engine, args: &[Value]) -> EvalResult {
        (self.build)(engine, args)
    }
}

impl<F> fmt::Debug for NativeModuleFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeModuleFn")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl<M: NativeModule + ?Sized> NativeModule for std::sync::Arc<M> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn build(&self, engine: &mut dyn Engine, args: &[Value]) -> EvalResult {
        (**self).build(engine, args)
    }
}
