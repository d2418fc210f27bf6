//! Lumo Asm - Text assembler for Lumo compiled units.
//!
//! Provides `Assembler`, a `lumo_ir::Compiler` for a line-oriented
//! assembly format, so hosts and tests can write modules without a full
//! language front end.
//!
//! # Format
//!
//! ```text
//! ; comments start with a semicolon
//! .params name            ; module parameters
//! .func greet who         ; nested function with parameters
//!     const "Hello, "
//!     load who
//!     add
//!     ret
//! .end
//!     closure greet
//!     load name
//!     call 1
//! done:                   ; jump target
//!     ret
//! ```
//!
//! A block without a trailing `ret` returns nil. Errors carry the line and
//! column of the offending token.

mod assembler;
mod lexer;

pub use assembler::{Assembler, MAIN_NAME};
pub use lexer::{lex_line, LexError, Token, TokenKind};

#[cfg(test)]
mod tests;
