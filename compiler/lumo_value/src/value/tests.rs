#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use super::*;
use crate::function::{Arity, NativeFunction};

#[test]
fn test_type_names() {
    assert_eq!(Value::Nil.type_name(), "nil");
    assert_eq!(Value::Bool(true).type_name(), "bool");
    assert_eq!(Value::int(1).type_name(), "number");
    assert_eq!(Value::float(1.5).type_name(), "number");
    assert_eq!(Value::from("x").type_name(), "string");
    assert_eq!(Value::empty_object().type_name(), "object");
}

#[test]
fn test_numbers_compare_across_representations() {
    assert_eq!(Value::int(1), Value::float(1.0));
    assert_ne!(Value::int(1), Value::float(1.5));
    assert_ne!(Value::int(0), Value::Bool(false));
    assert_ne!(Value::Nil, Value::Bool(false));
}

#[test]
fn test_strings_compare_by_content() {
    let a = Value::string(String::from("abc"));
    let b = Value::from("abc");
    assert_eq!(a, b);
}

#[test]
fn test_objects_compare_by_identity() {
    let a = Value::empty_object();
    let b = Value::empty_object();
    assert_ne!(a, b);
    let alias = a.clone();
    assert_eq!(a, alias);
}

#[test]
fn test_clone_aliases_objects() {
    let a = Value::empty_object();
    let b = a.clone();
    b.as_object().unwrap().set("x", 1);
    assert_eq!(a.as_object().unwrap().get(&Value::from("x")), Value::int(1));
    assert!(a.is_reference());
    assert!(!Value::from("s").is_reference());
}

#[test]
fn test_display_primitives() {
    assert_eq!(Value::Nil.to_string(), "nil");
    assert_eq!(Value::Bool(false).to_string(), "false");
    assert_eq!(Value::int(-7).to_string(), "-7");
    assert_eq!(Value::float(3.0).to_string(), "3.0");
    assert_eq!(Value::float(2.5).to_string(), "2.5");
    assert_eq!(Value::from("hi").to_string(), "hi");
}

#[test]
fn test_display_objects_quotes_nested_strings() {
    let v = Object::builder()
        .field("name", "lumo")
        .field(1, true)
        .build();
    assert_eq!(v.to_string(), r#"{"name": "lumo", 1: true}"#);
}

#[test]
fn test_display_cyclic_object() {
    let v = Value::empty_object();
    let o = v.as_object().unwrap();
    o.set("self", v.clone());
    assert_eq!(v.to_string(), r#"{"self": {...}}"#);
    // break the cycle so the test does not leak
    o.set("self", Value::Nil);
}

#[test]
fn test_display_function() {
    let f = NativeFunction::new("greet", Arity::Any, |_| Ok(Value::Nil)).into_value();
    assert_eq!(f.to_string(), "<function greet>");
    assert_eq!(format!("{f:?}"), "Function(greet)");
}

#[test]
fn test_meta_requires_function_binding() {
    let v = Object::builder().field("__int", 42).build();
    assert!(v.meta(MetaKey::ToInt).is_none());

    let v = Object::builder()
        .meta(MetaKey::ToInt, Arity::Any, |_| Ok(Value::int(42)))
        .build();
    assert!(v.meta(MetaKey::ToInt).is_some());
    assert!(Value::int(1).meta(MetaKey::ToInt).is_none());
}

#[test]
fn test_str_char_len_counts_scalars() {
    let s = Str::from("héllo");
    assert_eq!(s.char_len(), 5);
    assert_eq!(s.len(), 6);
}
