//! Source locations for compiled instructions.

use std::fmt;

/// Line/column position of an instruction in its source text.
///
/// Both fields are 1-based. `Location::UNKNOWN` (0:0) marks generated code
/// or units built without source positions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    /// Location for instructions without a source position.
    pub const UNKNOWN: Location = Location { line: 0, column: 0 };

    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Location { line, column }
    }

    /// Returns `true` if this location points into real source text.
    #[inline]
    pub fn is_known(self) -> bool {
        self.line != 0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
