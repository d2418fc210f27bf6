//! Script-visible global functions.
//!
//! Builtins sit behind every scope chain: a `load` that finds no binding
//! falls back to this table. They are ordinary native functions and go
//! through the same arity check as host functions.

use rustc_hash::FxHashMap;

use lumo_value::{script_failure, Arity, Name, NativeCall, NativeFunction, Object, Value};

/// Read-only table of builtin functions, shared by every interpreter of a
/// context.
pub struct Builtins {
    table: FxHashMap<Name, Value>,
}

impl Builtins {
    pub fn standard() -> Self {
        let mut builtins = Builtins {
            table: FxHashMap::default(),
        };
        builtins.define("import", Arity::Exactly(1), |call| {
            let id = call.str_arg(0)?;
            call.engine.import(&id)
        });
        builtins.define("recover", Arity::Exactly(1), |call| {
            let thunk = call.function_arg(0)?;
            call.engine.recover(&thunk)
        });
        builtins.define("fail", Arity::Between(0, 1), |call| {
            Err(script_failure(call.arg(0)))
        });
        builtins.define("keys", Arity::Exactly(1), |call| {
            let object = call.object_arg(0)?;
            Ok(sequence(object.keys()))
        });
        builtins.define("len", Arity::Exactly(1), |call| {
            let v = call.arg(0);
            call.engine.length(&v).map(Value::int)
        });
        builtins.define("type", Arity::Exactly(1), |call| {
            Ok(Value::from(call.arg(0).type_name()))
        });
        builtins.define("int", Arity::Exactly(1), |call| call.int_arg(0).map(Value::int));
        builtins.define("float", Arity::Exactly(1), |call| {
            call.float_arg(0).map(Value::float)
        });
        builtins.define("str", Arity::Exactly(1), |call| {
            let v = call.arg(0);
            call.engine.to_str(&v).map(Value::Str)
        });
        builtins.define("bool", Arity::Exactly(1), |call| {
            let v = call.arg(0);
            call.engine.to_bool(&v).map(Value::Bool)
        });
        builtins.define("print", Arity::Any, |call| print_args(call, ""));
        builtins.define("println", Arity::Any, |call| print_args(call, "\n"));
        builtins
    }

    fn define<F>(&mut self, name: &str, arity: Arity, func: F)
    where
        F: Fn(&mut NativeCall<'_>) -> lumo_value::EvalResult + Send + Sync + 'static,
    {
        let value = NativeFunction::new(name, arity, func).into_value();
        self.table.insert(Name::from(name), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.table.get(name).cloned()
    }

    /// Builtin names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.keys().map(|k| &**k).collect();
        names.sort_unstable();
        names
    }
}

/// An object keyed `0..n`, the runtime's list shape.
pub fn sequence(items: Vec<Value>) -> Value {
    let mut object = Object::new();
    for (i, item) in (0_i64..).zip(items) {
        object.set(Value::int(i), item);
    }
    Value::object(object)
}

/// Space-separated string forms of every argument, honoring `__str`.
fn print_args(call: &mut NativeCall<'_>, terminator: &str) -> lumo_value::EvalResult {
    let args = call.args;
    let mut line = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&call.engine.to_str(arg)?);
    }
    line.push_str(terminator);
    call.engine.print(&line);
    Ok(Value::Nil)
}
