//! Lumo IR - Compiled-unit representation.
//!
//! This crate contains the data structures shared between a compiler
//! front end and the Lumo execution engine:
//! - `Location` for source positions attached to instructions
//! - `Instr` and the operator enums for the stack machine
//! - `Constant` literals stored in a prototype's constant pool
//! - `Prototype` / `CompiledUnit` as the compiler's output
//! - The `Compiler` collaborator trait and its `CompileError`
//!
//! # Design Philosophy
//!
//! - **Immutable after build**: prototypes are shared behind `Arc` and never
//!   mutated once a unit is compiled, so one unit may back many closures.
//! - **Index everything**: constants, nested prototypes and jump targets are
//!   `u32` indices into per-prototype tables.

mod compile;
mod constant;
mod instr;
mod location;
mod unit;

use std::sync::Arc;

pub use compile::{CompileError, Compiler};
pub use constant::Constant;
pub use instr::{BinaryOp, CompareOp, Instr, UnaryOp};
pub use location::Location;
pub use unit::{CompiledUnit, Prototype, PrototypeBuilder};

/// Shared identifier used for variable, parameter and prototype names.
pub type Name = Arc<str>;

#[cfg(test)]
mod tests;
