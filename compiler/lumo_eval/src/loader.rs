//! Module resolution: mapping ids to source text or precompiled units.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use lumo_ir::CompiledUnit;

use crate::errors::ResolveError;

/// What a resolver found for an id.
#[derive(Clone, Debug)]
pub enum Source {
    /// Raw bytes to hand to the context's `Compiler`.
    Text(Vec<u8>),
    /// A unit compiled ahead of time; the compiler is skipped.
    Precompiled(Arc<CompiledUnit>),
}

/// Maps a module id to its source.
///
/// The context calls `resolve` at most once per id and caches the result,
/// so implementations need not memoize.
pub trait Resolver: Send + Sync {
    fn resolve(&self, id: &str) -> Result<Source, ResolveError>;
}

impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    fn resolve(&self, id: &str) -> Result<Source, ResolveError> {
        (**self).resolve(id)
    }
}

/// In-memory resolver for embedders and tests.
///
/// Entries may be added after the resolver has been handed to a context by
/// keeping an `Arc` to it.
#[derive(Default)]
pub struct MemoryResolver {
    entries: RwLock<FxHashMap<String, Source>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        MemoryResolver::default()
    }

    /// Builder-style `insert_text`.
    #[must_use]
    pub fn with_text(self, id: &str, text: impl Into<String>) -> Self {
        self.insert_text(id, text);
        self
    }

    /// Builder-style `insert_unit`.
    #[must_use]
    pub fn with_unit(self, unit: CompiledUnit) -> Self {
        self.insert_unit(unit);
        self
    }

    pub fn insert_text(&self, id: &str, text: impl Into<String>) {
        let bytes = text.into().into_bytes();
        self.entries.write().insert(id.to_string(), Source::Text(bytes));
    }

    /// Register a precompiled unit under its own id.
    pub fn insert_unit(&self, unit: CompiledUnit) {
        let id = unit.id.to_string();
        self.entries
            .write()
            .insert(id, Source::Precompiled(Arc::new(unit)));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }
}

impl Resolver for MemoryResolver {
    fn resolve(&self, id: &str) -> Result<Source, ResolveError> {
        self.entries
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound { id: id.to_string() })
    }
}

/// Resolves `a/b` to `<root>/a/b.<extension>` on the filesystem.
///
/// Ids must be relative and may not contain `..`, so a script can never
/// import a file outside `root`.
#[derive(Clone, Debug)]
pub struct FileResolver {
    root: PathBuf,
    extension: String,
}

impl FileResolver {
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        FileResolver {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file an id maps to, after validation.
    pub fn path_for(&self, id: &str) -> Result<PathBuf, ResolveError> {
        let invalid = |reason| ResolveError::InvalidId {
            id: id.to_string(),
            reason,
        };
        if id.is_empty() {
            return Err(invalid("empty id"));
        }
        let relative = Path::new(id);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                Component::ParentDir => return Err(invalid("parent segments are not allowed")),
                Component::CurDir => return Err(invalid("'.' segments are not allowed")),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid("absolute ids are not allowed"))
                }
            }
        }
        let mut path = self.root.join(relative);
        if !self.extension.is_empty() {
            path.set_extension(&self.extension);
        }
        Ok(path)
    }
}

impl Resolver for FileResolver {
    fn resolve(&self, id: &str) -> Result<Source, ResolveError> {
        let path = self.path_for(id)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Source::Text(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ResolveError::NotFound { id: id.to_string() })
            }
            Err(source) => Err(ResolveError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn memory_resolver_returns_text() {
        let resolver = MemoryResolver::new().with_text("main", "nil\nret\n");
        match resolver.resolve("main").unwrap() {
            Source::Text(bytes) => assert_eq!(bytes, b"nil\nret\n"),
            Source::Precompiled(_) => panic!("expected text"),
        }
        assert!(matches!(
            resolver.resolve("other"),
            Err(ResolveError::NotFound { .. })
        ));
    }

    #[test]
    fn memory_resolver_accepts_units() {
        let unit = CompiledUnit::new("pre", lumo_ir::PrototypeBuilder::new("<main>").build());
        let resolver = MemoryResolver::new().with_unit(unit);
        assert!(matches!(
            resolver.resolve("pre").unwrap(),
            Source::Precompiled(u) if &*u.id == "pre"
        ));
    }

    #[test]
    fn file_resolver_rejects_escapes() {
        let resolver = FileResolver::new("/srv/scripts", "lasm");
        assert!(matches!(
            resolver.path_for("../etc/passwd"),
            Err(ResolveError::InvalidId { .. })
        ));
        assert!(matches!(
            resolver.path_for("/etc/passwd"),
            Err(ResolveError::InvalidId { .. })
        ));
        assert!(resolver.path_for("").is_err());
        assert_eq!(
            resolver.path_for("lib/util").unwrap(),
            PathBuf::from("/srv/scripts/lib/util.lasm")
        );
    }

    #[test]
    fn file_resolver_reads_files() {
        let dir = std::env::temp_dir().join(format!("lumo-resolver-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("greet.lasm"), "const 1\nret\n").unwrap();

        let resolver = FileResolver::new(&dir, ".lasm");
        assert!(matches!(resolver.resolve("greet").unwrap(), Source::Text(b) if b == b"const 1\nret\n"));
        assert!(matches!(
            resolver.resolve("missing"),
            Err(ResolveError::NotFound { .. })
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
