use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_arity_accepts() {
    assert!(Arity::Exactly(2).accepts(2));
    assert!(!Arity::Exactly(2).accepts(1));
    assert!(Arity::AtLeast(1).accepts(5));
    assert!(!Arity::AtLeast(1).accepts(0));
    assert!(Arity::Between(1, 2).accepts(2));
    assert!(!Arity::Between(1, 2).accepts(3));
    assert!(Arity::Any.accepts(0));
}

#[test]
fn test_arity_display() {
    assert_eq!(Arity::Exactly(1).to_string(), "1");
    assert_eq!(Arity::AtLeast(2).to_string(), "at least 2");
    assert_eq!(Arity::Between(1, 3).to_string(), "1 to 3");
}

#[test]
fn test_function_ref_identity() {
    let f = FunctionRef::new(FunctionValue::Native(NativeFunction::new(
        "f",
        Arity::Any,
        |_| Ok(Value::Nil),
    )));
    let g = f.clone();
    assert!(f.ptr_eq(&g));
    assert_eq!(f.as_ptr(), g.as_ptr());
    assert_eq!(f.name(), "f");
    assert!(f.is_native());
}

#[test]
fn test_closure_name_comes_from_prototype() {
    let proto = Arc::new(lumo_ir::PrototypeBuilder::new("adder").param("x").build());
    let closure = Closure::new(proto, Name::from("m"), SharedScope::new());
    let f = FunctionValue::Script(closure);
    assert_eq!(f.name(), "adder");
    assert!(!f.is_native());
}
