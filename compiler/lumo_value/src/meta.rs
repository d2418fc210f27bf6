//! Meta-method keys.
//!
//! A meta-method is an ordinary object entry under a well-known string key.
//! When the entry is bound to a Function, the engine calls it instead of
//! applying the default behavior for the operation.

use std::fmt;

use lumo_ir::BinaryOp;

/// Operations an object can override.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MetaKey {
    /// Integer coercion: `__int(self) -> number`.
    ToInt,
    /// Float coercion: `__float(self) -> number`.
    ToFloat,
    /// String coercion and display: `__str(self) -> string`.
    ToStr,
    /// Truthiness: `__bool(self) -> bool`.
    ToBool,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    /// Negation: `__neg(self)`.
    Neg,
    /// Equality: `__eq(lhs, rhs) -> bool`.
    Eq,
    /// Three-way comparison: `__cmp(lhs, rhs) -> number` (<0, 0, >0).
    Compare,
    /// Read of a missing key: `__index(self, key)`.
    Index,
    /// Every write: `__setindex(self, key, value)`.
    SetIndex,
    /// Length: `__len(self) -> number`.
    Len,
    /// Iteration: `__iter(self) -> function`.
    Iter,
}

impl MetaKey {
    pub const ALL: [MetaKey; 16] = [
        MetaKey::ToInt,
        MetaKey::ToFloat,
        MetaKey::ToStr,
        MetaKey::ToBool,
        MetaKey::Add,
        MetaKey::Sub,
        MetaKey::Mul,
        MetaKey::Div,
        MetaKey::Mod,
        MetaKey::Neg,
        MetaKey::Eq,
        MetaKey::Compare,
        MetaKey::Index,
        MetaKey::SetIndex,
        MetaKey::Len,
        MetaKey::Iter,
    ];

    /// The object key this meta-method is stored under.
    pub const fn key(self) -> &'static str {
        match self {
            MetaKey::ToInt => "__int",
            MetaKey::ToFloat => "__float",
            MetaKey::ToStr => "__str",
            MetaKey::ToBool => "__bool",
            MetaKey::Add => "__add",
            MetaKey::Sub => "__sub",
            MetaKey::Mul => "__mul",
            MetaKey::Div => "__div",
            MetaKey::Mod => "__mod",
            MetaKey::Neg => "__neg",
            MetaKey::Eq => "__eq",
            MetaKey::Compare => "__cmp",
            MetaKey::Index => "__index",
            MetaKey::SetIndex => "__setindex",
            MetaKey::Len => "__len",
            MetaKey::Iter => "__iter",
        }
    }

    pub fn from_key(key: &str) -> Option<MetaKey> {
        MetaKey::ALL.into_iter().find(|m| m.key() == key)
    }

    /// Meta-method overriding an arithmetic operator.
    pub const fn for_binary(op: BinaryOp) -> MetaKey {
        match op {
            BinaryOp::Add => MetaKey::Add,
            BinaryOp::Sub => MetaKey::Sub,
            BinaryOp::Mul => MetaKey::Mul,
            BinaryOp::Div => MetaKey::Div,
            BinaryOp::Mod => MetaKey::Mod,
        }
    }
}

impl fmt::Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
