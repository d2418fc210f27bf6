//! Lexical scopes for variable bindings.
//!
//! Scopes form a parent chain. A closure keeps the scope it was created in
//! alive through a `SharedScope` handle, so every closure over the same
//! scope observes the same bindings.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use lumo_ir::Name;

use crate::value::Value;

/// Error returned by `SharedScope::assign`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignError {
    /// Variable not found in any scope.
    Undefined,
}

/// A single scope containing variable bindings.
#[derive(Default)]
pub struct Scope {
    bindings: FxHashMap<Name, Value>,
    parent: Option<SharedScope>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn with_parent(parent: SharedScope) -> Self {
        Scope {
            bindings: FxHashMap::default(),
            parent: Some(parent),
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.bindings.keys().map(|k| &**k).collect();
        names.sort_unstable();
        f.debug_struct("Scope")
            .field("bindings", &names)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Shared handle to a `Scope`.
#[derive(Clone, Default)]
pub struct SharedScope(Arc<RwLock<Scope>>);

impl SharedScope {
    /// A fresh root scope.
    pub fn new() -> Self {
        SharedScope::from_scope(Scope::new())
    }

    pub fn from_scope(scope: Scope) -> Self {
        SharedScope(Arc::new(RwLock::new(scope)))
    }

    /// A fresh scope whose parent is `self`.
    #[must_use]
    pub fn child(&self) -> Self {
        SharedScope::from_scope(Scope::with_parent(self.clone()))
    }

    pub fn parent(&self) -> Option<SharedScope> {
        self.0.read().parent.clone()
    }

    /// Create or overwrite a binding in this scope.
    #[inline]
    pub fn define(&self, name: Name, value: Value) {
        self.0.write().bindings.insert(name, value);
    }

    /// Look up a variable, walking the parent chain.
    ///
    /// Each scope's lock is released before moving to its parent.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let parent = {
                let scope = current.0.read();
                if let Some(value) = scope.bindings.get(name) {
                    return Some(value.clone());
                }
                scope.parent.clone()
            };
            current = parent?;
        }
    }

    /// Assign to the nearest existing binding.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), AssignError> {
        let mut current = self.clone();
        loop {
            let parent = {
                let mut scope = current.0.write();
                if let Some(slot) = scope.bindings.get_mut(name) {
                    *slot = value;
                    return Ok(());
                }
                scope.parent.clone()
            };
            current = parent.ok_or(AssignError::Undefined)?;
        }
    }

    #[inline]
    pub fn ptr_eq(&self, other: &SharedScope) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SharedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedScope").field(&*self.0.read()).finish()
    }
}

#[cfg(test)]
mod tests;
