//! Prototypes and compiled units.

use std::fmt;
use std::sync::Arc;

use crate::{Constant, Instr, Location, Name};

/// The compiled body of one function (or of a module's top level).
///
/// A prototype is immutable once built. Closures created from it at run time
/// share it through `Arc<Prototype>`.
#[derive(Debug, PartialEq)]
pub struct Prototype {
    /// Display name used in backtraces (`<main>` for a module body).
    pub name: Name,
    /// Declared parameter names, bound positionally on call.
    pub params: Vec<Name>,
    pub code: Vec<Instr>,
    /// Source location per instruction; empty when the producer had none.
    pub locations: Vec<Location>,
    pub constants: Vec<Constant>,
    /// Nested prototypes referenced by `Instr::Closure`.
    pub children: Vec<Arc<Prototype>>,
}

impl Prototype {
    /// Location of the instruction at `ip`, if recorded.
    #[inline]
    pub fn location_of(&self, ip: usize) -> Option<Location> {
        self.locations.get(ip).copied().filter(|l| l.is_known())
    }

    /// Total instruction count including nested prototypes.
    pub fn instruction_count(&self) -> usize {
        self.code.len()
            + self
                .children
                .iter()
                .map(|c| c.instruction_count())
                .sum::<usize>()
    }

    fn write_listing(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        write!(f, "{indent}.func {}", self.name)?;
        for p in &self.params {
            write!(f, " {p}")?;
        }
        writeln!(f)?;
        for (i, c) in self.constants.iter().enumerate() {
            writeln!(f, "{indent}  ; #{i} = {c}")?;
        }
        for child in &self.children {
            child.write_listing(f, depth + 1)?;
        }
        for (ip, instr) in self.code.iter().enumerate() {
            write!(f, "{indent}  {ip:04} {instr}")?;
            if let Some(loc) = self.location_of(ip) {
                write!(f, "  ; {loc}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{indent}.end")
    }
}

/// Incremental builder for a `Prototype`.
///
/// Used by compilers and by hosts that assemble units programmatically.
pub struct PrototypeBuilder {
    name: Name,
    params: Vec<Name>,
    code: Vec<Instr>,
    locations: Vec<Location>,
    constants: Vec<Constant>,
    children: Vec<Arc<Prototype>>,
}

impl PrototypeBuilder {
    pub fn new(name: impl Into<Name>) -> Self {
        PrototypeBuilder {
            name: name.into(),
            params: Vec::new(),
            code: Vec::new(),
            locations: Vec::new(),
            constants: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Declare a parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<Name>) -> Self {
        self.params.push(name.into());
        self
    }

    /// Replace the declared parameter list.
    pub fn set_params(&mut self, params: Vec<Name>) {
        self.params = params;
    }

    /// Append an instruction without a source location.
    pub fn emit(&mut self, instr: Instr) -> usize {
        self.emit_at(instr, Location::UNKNOWN)
    }

    /// Append an instruction and return its index.
    pub fn emit_at(&mut self, instr: Instr, location: Location) -> usize {
        self.code.push(instr);
        self.locations.push(location);
        self.code.len() - 1
    }

    /// Intern a constant and return its pool index.
    pub fn constant(&mut self, constant: Constant) -> u32 {
        if let Some(i) = self.constants.iter().position(|c| c.same_as(&constant)) {
            return index_u32(i);
        }
        self.constants.push(constant);
        index_u32(self.constants.len() - 1)
    }

    /// Add a nested prototype and return its child index.
    pub fn child(&mut self, proto: Prototype) -> u32 {
        self.children.push(Arc::new(proto));
        index_u32(self.children.len() - 1)
    }

    /// Rewrite the target of the jump at `at`.
    ///
    /// Non-jump instructions are left untouched.
    pub fn patch_jump(&mut self, at: usize, target: u32) {
        if let Some(instr) = self.code.get_mut(at) {
            match instr {
                Instr::Jump(t) | Instr::JumpIfFalse(t) | Instr::JumpIfTrue(t) | Instr::IterNext(t) => {
                    *t = target;
                }
                _ => {}
            }
        }
    }

    /// Index the next emitted instruction will have.
    #[inline]
    pub fn next_index(&self) -> u32 {
        index_u32(self.code.len())
    }

    /// Whether the last emitted instruction is a `Return`.
    pub fn ends_with_return(&self) -> bool {
        matches!(self.code.last(), Some(Instr::Return))
    }

    pub fn build(self) -> Prototype {
        Prototype {
            name: self.name,
            params: self.params,
            code: self.code,
            locations: self.locations,
            constants: self.constants,
            children: self.children,
        }
    }
}

#[inline]
fn index_u32(i: usize) -> u32 {
    u32::try_from(i).unwrap_or(u32::MAX)
}

/// Output of a `Compiler`: a module's top-level prototype tagged with the
/// module id it was compiled for.
#[derive(Debug, PartialEq)]
pub struct CompiledUnit {
    pub id: Name,
    pub main: Arc<Prototype>,
}

impl CompiledUnit {
    pub fn new(id: impl Into<Name>, main: Prototype) -> Self {
        CompiledUnit {
            id: id.into(),
            main: Arc::new(main),
        }
    }
}

/// Disassembly listing.
impl fmt::Display for CompiledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; unit {}", self.id)?;
        self.main.write_listing(f, 0)
    }
}
