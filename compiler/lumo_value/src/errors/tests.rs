use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_factory_messages() {
    assert_eq!(division_by_zero().message, "division by zero");
    assert_eq!(modulo_by_zero().message, "modulo by zero");
    assert_eq!(
        integer_overflow("addition").message,
        "integer overflow in addition"
    );
    assert_eq!(
        unsupported_binary(BinaryOp::Add, "nil", "number").message,
        "operator `+` cannot be applied to nil and number"
    );
    assert_eq!(
        arity_mismatch("greet", Arity::Exactly(1), 0).message,
        "greet expects 1 argument, got 0"
    );
    assert_eq!(
        arity_mismatch("max", Arity::AtLeast(2), 1).message,
        "max expects at least 2 arguments, got 1"
    );
    assert_eq!(undefined_variable("x").message, "undefined variable: x");
}

#[test]
fn test_categories() {
    assert_eq!(division_by_zero().category(), FailureKind::ArithmeticError);
    assert_eq!(integer_overflow("*").category(), FailureKind::ArithmeticError);
    assert_eq!(type_mismatch("a", "b").category(), FailureKind::TypeError);
    assert_eq!(not_callable("nil").category(), FailureKind::TypeError);
    assert_eq!(not_indexable("number").category(), FailureKind::TypeError);
    assert_eq!(cannot_coerce("nil", "int").category(), FailureKind::TypeError);
    assert_eq!(
        invalid_meta_result(MetaKey::ToInt, "object").category(),
        FailureKind::TypeError
    );
    assert_eq!(
        arity_mismatch("f", Arity::Exactly(0), 1).category(),
        FailureKind::ArityError
    );
    assert_eq!(script_failure(Value::Nil).category(), FailureKind::ScriptError);
    assert_eq!(import_failed("m", "boom").category(), FailureKind::ImportError);
    assert_eq!(cyclic_import("m").category(), FailureKind::ImportError);
    assert_eq!(undefined_variable("x").category(), FailureKind::RuntimeError);
    assert_eq!(recursion_limit_exceeded(8).category(), FailureKind::RuntimeError);
    assert_eq!(native_panic("f", "oops").category(), FailureKind::RuntimeError);
    assert_eq!(runtime_error("custom").category(), FailureKind::RuntimeError);
}

#[test]
fn test_to_value_shape() {
    let v = division_by_zero().to_value();
    let o = v.as_object().cloned().unwrap_or_else(|| crate::ObjectRef::new(Object::new()));
    assert_eq!(o.keys(), vec![Value::from("kind"), Value::from("message")]);
    assert_eq!(o.get_str("kind"), Value::from("ArithmeticError"));
    assert_eq!(o.get_str("message"), Value::from("division by zero"));
}

#[test]
fn test_script_failure_carries_payload() {
    let payload = Value::empty_object();
    let err = script_failure(payload.clone());
    let v = err.to_value();
    let o = v.as_object().cloned().unwrap_or_else(|| crate::ObjectRef::new(Object::new()));
    assert_eq!(o.get_str("kind"), Value::from("ScriptError"));
    // identity is preserved through the failure value
    assert_eq!(o.get_str("value"), payload);

    let err = script_failure(Value::from("boom"));
    assert_eq!(err.message, "boom");
}

#[test]
fn test_location_is_kept_innermost() {
    let err = division_by_zero()
        .with_location(Location::new(3, 4))
        .or_location(Some(Location::new(9, 9)));
    assert_eq!(err.location, Some(Location::new(3, 4)));
    assert_eq!(err.to_string(), "ArithmeticError: division by zero at 3:4");
}

#[test]
fn test_backtrace_display() {
    let bt = EvalBacktrace::new(vec![
        BacktraceFrame {
            name: "inner".into(),
            module: "m".into(),
            location: Some(Location::new(2, 1)),
        },
        BacktraceFrame {
            name: "<main>".into(),
            module: "m".into(),
            location: None,
        },
    ]);
    assert_eq!(bt.len(), 2);
    assert_eq!(
        bt.to_string(),
        "stack backtrace:\n  0: inner (m:2:1)\n  1: <main> (m)\n"
    );
}
