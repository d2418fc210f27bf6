//! Ordered objects with identity semantics.
//!
//! `Object` is the plain data structure; `ObjectRef` is the shared handle a
//! `Value` holds. The handle's lock only makes sharing memory-safe: each
//! method takes and releases it, so callers never observe a partially
//! applied write, but sequences of calls are not atomic.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashMap;

use crate::function::{Arity, FunctionRef, FunctionValue, NativeCall, NativeFunction};
use crate::meta::MetaKey;
use crate::value::{Number, Str, Value};
use crate::EvalResult;

/// Hashable form of a `Value` used as an object key.
///
/// Value kinds compare structurally; integral floats normalize to integers
/// so `1` and `1.0` address the same entry. Objects and functions compare
/// by identity, and meta-methods are never consulted for key equality.
#[derive(Clone, Debug)]
pub enum ObjectKey {
    Nil,
    Bool(bool),
    Int(i64),
    /// Non-integral float, stored as its bit pattern.
    Float(u64),
    Str(Str),
    Object(ObjectRef),
    Function(FunctionRef),
}

impl ObjectKey {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Nil => ObjectKey::Nil,
            Value::Bool(b) => ObjectKey::Bool(*b),
            Value::Number(Number::Int(n)) => ObjectKey::Int(*n),
            Value::Number(Number::Float(x)) => match Number::Float(*x).to_i64() {
                Some(n) if x.fract() == 0.0 => ObjectKey::Int(n),
                _ => ObjectKey::Float(x.to_bits()),
            },
            Value::Str(s) => ObjectKey::Str(s.clone()),
            Value::Object(o) => ObjectKey::Object(o.clone()),
            Value::Function(f) => ObjectKey::Function(f.clone()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ObjectKey::Nil => Value::Nil,
            ObjectKey::Bool(b) => Value::Bool(*b),
            ObjectKey::Int(n) => Value::int(*n),
            ObjectKey::Float(bits) => Value::float(f64::from_bits(*bits)),
            ObjectKey::Str(s) => Value::Str(s.clone()),
            ObjectKey::Object(o) => Value::Object(o.clone()),
            ObjectKey::Function(f) => Value::Function(f.clone()),
        }
    }
}

impl PartialEq for ObjectKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ObjectKey::Nil, ObjectKey::Nil) => true,
            (ObjectKey::Bool(a), ObjectKey::Bool(b)) => a == b,
            (ObjectKey::Int(a), ObjectKey::Int(b)) => a == b,
            (ObjectKey::Float(a), ObjectKey::Float(b)) => a == b,
            (ObjectKey::Str(a), ObjectKey::Str(b)) => a == b,
            (ObjectKey::Object(a), ObjectKey::Object(b)) => a.ptr_eq(b),
            (ObjectKey::Function(a), ObjectKey::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Eq for ObjectKey {}

impl Hash for ObjectKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ObjectKey::Nil => {}
            ObjectKey::Bool(b) => b.hash(state),
            ObjectKey::Int(n) => n.hash(state),
            ObjectKey::Float(bits) => bits.hash(state),
            ObjectKey::Str(s) => s.hash(state),
            ObjectKey::Object(o) => o.as_ptr().hash(state),
            ObjectKey::Function(f) => f.as_ptr().hash(state),
        }
    }
}

/// Insertion-ordered mapping from keys to values.
///
/// Overwriting a key keeps its position; removing it and inserting it again
/// moves it to the end. Nil is never stored: setting a key to Nil removes it.
#[derive(Clone, Default)]
pub struct Object {
    entries: Vec<(ObjectKey, Value)>,
    index: FxHashMap<ObjectKey, usize>,
}

impl Object {
    pub fn new() -> Self {
        Object::default()
    }

    pub fn builder() -> ObjectBuilder {
        ObjectBuilder::new()
    }

    /// Raw lookup; Nil when absent.
    pub fn get(&self, key: &Value) -> Value {
        self.get_key(&ObjectKey::from_value(key))
    }

    /// Raw lookup by string key.
    pub fn get_str(&self, key: &str) -> Value {
        self.get_key(&ObjectKey::Str(Str::from(key)))
    }

    fn get_key(&self, key: &ObjectKey) -> Value {
        self.index
            .get(key)
            .and_then(|&i| self.entries.get(i))
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, key: &Value) -> bool {
        self.index.contains_key(&ObjectKey::from_value(key))
    }

    /// Insert or overwrite; a Nil value removes the key.
    pub fn set(&mut self, key: Value, value: Value) {
        let key = ObjectKey::from_value(&key);
        if value.is_nil() {
            self.remove_key(&key);
            return;
        }
        if let Some(&i) = self.index.get(&key) {
            if let Some(slot) = self.entries.get_mut(i) {
                slot.1 = value;
                return;
            }
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }

    /// Remove a key, returning its previous value.
    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        self.remove_key(&ObjectKey::from_value(key))
    }

    fn remove_key(&mut self, key: &ObjectKey) -> Option<Value> {
        let pos = self.index.remove(key)?;
        let (_, value) = self.entries.remove(pos);
        for (k, _) in &self.entries[pos..] {
            if let Some(i) = self.index.get_mut(k) {
                *i -= 1;
            }
        }
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<Value> {
        self.entries.iter().map(|(k, _)| k.to_value()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.to_value(), v.clone()))
            .collect()
    }

    /// The Function bound under `key`'s well-known name, if any.
    pub fn meta(&self, key: MetaKey) -> Option<FunctionRef> {
        match self.get_str(key.key()) {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

/// Shared, identity-compared handle to an `Object`.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    /// Allocate a new object identity.
    pub fn new(object: Object) -> Self {
        ObjectRef(Arc::new(RwLock::new(object)))
    }

    /// Whether two handles alias the same object.
    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Underlying host handle, stable for the object's lifetime.
    #[inline]
    pub fn as_ptr(&self) -> *const () {
        Arc::as_ptr(&self.0).cast()
    }

    /// Borrow the object for reading.
    ///
    /// Do not hold the guard across calls into script code: a script that
    /// writes to the same object would deadlock.
    pub fn read(&self) -> RwLockReadGuard<'_, Object> {
        self.0.read()
    }

    /// Borrow the object for writing. Same caveat as `read`.
    pub fn write(&self) -> RwLockWriteGuard<'_, Object> {
        self.0.write()
    }

    pub fn get(&self, key: &Value) -> Value {
        self.read().get(key)
    }

    pub fn get_str(&self, key: &str) -> Value {
        self.read().get_str(key)
    }

    pub fn set(&self, key: impl Into<Value>, value: impl Into<Value>) {
        self.write().set(key.into(), value.into());
    }

    pub fn remove(&self, key: &Value) -> Option<Value> {
        self.write().remove(key)
    }

    pub fn contains(&self, key: &Value) -> bool {
        self.read().contains(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.read().keys()
    }

    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.read().entries()
    }

    pub fn meta(&self, key: MetaKey) -> Option<FunctionRef> {
        self.read().meta(key)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:p})", self.as_ptr())
    }
}

/// Fluent construction of objects for host code.
///
/// ```text
/// let math = Object::builder()
///     .field("pi", std::f64::consts::PI)
///     .function("abs", Arity::Exactly(1), |call| { ... })
///     .build();
/// ```
#[derive(Default)]
pub struct ObjectBuilder {
    object: Object,
}

impl ObjectBuilder {
    pub fn new() -> Self {
        ObjectBuilder::default()
    }

    #[must_use]
    pub fn field(mut self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.object.set(key.into(), value.into());
        self
    }

    /// Nest a sub-object built with another builder.
    #[must_use]
    pub fn object(self, key: impl Into<Value>, nested: ObjectBuilder) -> Self {
        self.field(key, nested.build())
    }

    /// Bind a host function under `name`.
    #[must_use]
    pub fn function<F>(self, name: &str, arity: Arity, func: F) -> Self
    where
        F: Fn(&mut NativeCall<'_>) -> EvalResult + Send + Sync + 'static,
    {
        let value = Value::function(FunctionValue::Native(NativeFunction::new(name, arity, func)));
        self.field(name, value)
    }

    /// Bind a meta-method.
    #[must_use]
    pub fn meta<F>(self, key: MetaKey, arity: Arity, func: F) -> Self
    where
        F: Fn(&mut NativeCall<'_>) -> EvalResult + Send + Sync + 'static,
    {
        let value = Value::function(FunctionValue::Native(NativeFunction::new(
            key.key(),
            arity,
            func,
        )));
        self.field(key.key(), value)
    }

    /// Finish as a raw `Object`.
    pub fn into_object(self) -> Object {
        self.object
    }

    /// Finish as a new object reference.
    pub fn build(self) -> Value {
        Value::object(self.object)
    }
}
