//! The `Compiler` collaborator interface.

use crate::{CompiledUnit, Location};

/// Failure to compile source text, with the offending location.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{id}:{location}: {message}")]
pub struct CompileError {
    /// Module id the source was compiled for.
    pub id: String,
    pub message: String,
    pub location: Location,
}

impl CompileError {
    pub fn new(id: impl Into<String>, message: impl Into<String>, location: Location) -> Self {
        CompileError {
            id: id.into(),
            message: message.into(),
            location,
        }
    }
}

/// Turns resolved source bytes into a compiled unit.
///
/// Implementations must be pure with respect to the engine: the context
/// caches the resulting unit and never asks for the same id twice.
pub trait Compiler: Send + Sync {
    fn compile(&self, id: &str, source: &[u8]) -> Result<CompiledUnit, CompileError>;
}

impl<C: Compiler + ?Sized> Compiler for std::sync::Arc<C> {
    fn compile(&self, id: &str, source: &[u8]) -> Result<CompiledUnit, CompileError> {
        (**self).compile(id, source)
    }
}
