use pretty_assertions::assert_eq;

use super::*;

fn name(s: &str) -> Name {
    Name::from(s)
}

#[test]
fn test_define_lookup() {
    let scope = SharedScope::new();
    scope.define(name("x"), Value::int(42));
    assert_eq!(scope.lookup("x"), Some(Value::int(42)));
    assert_eq!(scope.lookup("y"), None);
}

#[test]
fn test_child_sees_parent_and_shadows() {
    let parent = SharedScope::new();
    parent.define(name("x"), Value::int(1));
    let child = parent.child();
    assert_eq!(child.lookup("x"), Some(Value::int(1)));
    child.define(name("x"), Value::int(2));
    assert_eq!(child.lookup("x"), Some(Value::int(2)));
    assert_eq!(parent.lookup("x"), Some(Value::int(1)));
}

#[test]
fn test_assign_updates_nearest_binding() {
    let parent = SharedScope::new();
    parent.define(name("count"), Value::int(0));
    let child = parent.child();
    assert_eq!(child.assign("count", Value::int(5)), Ok(()));
    assert_eq!(parent.lookup("count"), Some(Value::int(5)));
}

#[test]
fn test_assign_undefined_fails() {
    let scope = SharedScope::new().child();
    assert_eq!(
        scope.assign("nope", Value::Nil),
        Err(AssignError::Undefined)
    );
}

#[test]
fn test_shared_handles_observe_each_other() {
    let scope = SharedScope::new();
    let alias = scope.clone();
    alias.define(name("v"), Value::from("shared"));
    assert_eq!(scope.lookup("v"), Some(Value::from("shared")));
    assert!(scope.ptr_eq(&alias));
    assert!(scope.child().parent().is_some_and(|p| p.ptr_eq(&scope)));
}
