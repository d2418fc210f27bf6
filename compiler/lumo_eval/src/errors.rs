//! Host-facing errors for module loading and registration.
//!
//! Script failures during execution use `lumo_value::EvalError`; these types
//! cover everything that happens before a module's code runs.

use std::path::PathBuf;

use lumo_ir::CompileError;
use lumo_value::EvalError;

/// A `Resolver` could not produce source for an id.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("module '{id}' not found")]
    NotFound { id: String },

    #[error("invalid module id '{id}': {reason}")]
    InvalidId { id: String, reason: &'static str },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of `Context::load`.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot resolve module '{id}': {source}")]
    Resolution {
        id: String,
        #[source]
        source: ResolveError,
    },

    #[error("compile error in {0}")]
    Compile(#[from] CompileError),
}

impl LoadError {
    /// Id of the module that failed to load.
    pub fn id(&self) -> &str {
        match self {
            LoadError::Resolution { id, .. } => id,
            LoadError::Compile(err) => &err.id,
        }
    }
}

/// Failure of `Context::register`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    #[error("module '{id}' is already loaded and cannot be replaced")]
    AlreadyLoaded { id: String },
}

/// Anything `Context::run` can fail with.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Run(#[from] EvalError),
}

impl HostError {
    /// The script failure, if the module loaded but its run failed.
    pub fn as_eval(&self) -> Option<&EvalError> {
        match self {
            HostError::Run(err) => Some(err),
            HostError::Load(_) => None,
        }
    }
}
