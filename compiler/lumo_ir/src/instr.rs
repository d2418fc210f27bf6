//! Stack-machine instructions.
//!
//! The engine evaluates a prototype's `code` with an operand stack per
//! activation. Stack effects are documented as `[before] -> [after]`, with
//! the top of the stack on the right.

use std::fmt;

use crate::Name;

/// Arithmetic operators dispatched through the context's arithmetic strategy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// Source-level symbol, used in error messages.
    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Mod => "mod",
        }
    }
}

/// Comparison operators. Equality goes through `__eq`, ordering through
/// `__cmp` and the arithmetic strategy's `compare`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    pub fn as_symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::NotEq => "ne",
            CompareOp::Lt => "lt",
            CompareOp::LtEq => "le",
            CompareOp::Gt => "gt",
            CompareOp::GtEq => "ge",
        }
    }

    /// Whether this operator is an equality test rather than an ordering.
    #[inline]
    pub fn is_equality(self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::NotEq)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation (`__neg`).
    Neg,
    /// Logical not of the operand's truthiness (`__bool`).
    Not,
}

impl UnaryOp {
    pub fn as_symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Not => "not",
        }
    }
}

/// A single stack-machine instruction.
///
/// Jump targets are absolute instruction indices within the same prototype.
#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    /// `[] -> [nil]`
    Nil,
    /// `[] -> [true]`
    True,
    /// `[] -> [false]`
    False,
    /// `[] -> [constants[i]]`
    Const(u32),
    /// `[v] -> []`
    Pop,
    /// `[v] -> [v v]`
    Dup,
    /// `[] -> [value]`: scope chain, then builtins.
    Load(Name),
    /// `[v] -> []`: assign to the nearest existing binding.
    Store(Name),
    /// `[v] -> []`: create a binding in the innermost scope.
    Define(Name),
    /// Open a nested lexical scope.
    PushScope,
    /// Close the innermost lexical scope.
    PopScope,
    /// `[a b] -> [a op b]`
    Binary(BinaryOp),
    /// `[a b] -> [bool]`
    Compare(CompareOp),
    /// `[a] -> [op a]`
    Unary(UnaryOp),
    Jump(u32),
    /// `[cond] -> []`, jump when `cond` is falsy.
    JumpIfFalse(u32),
    /// `[cond] -> []`, jump when `cond` is truthy.
    JumpIfTrue(u32),
    /// `[] -> [closure]` over `children[i]`, capturing the current scope.
    Closure(u32),
    /// `[callee a1..an] -> [result]`, receiver is nil.
    Call(u32),
    /// `[receiver key a1..an] -> [result]`, callee is `receiver[key]`.
    Invoke(u32),
    /// `[obj key] -> [obj[key]]`
    GetIndex,
    /// `[obj key value] -> []`
    SetIndex,
    /// `[k1 v1 .. kn vn] -> [object]`
    NewObject(u32),
    /// `[] -> [receiver]`
    Receiver,
    /// `[] -> [args[i]]` (nil when absent)
    Arg(u32),
    /// `[] -> [object of all args keyed 0..n]`
    Args,
    /// `[v] -> [iterator]`
    IterStart,
    /// `[iterator] -> [iterator item]`, or pop the iterator and jump when
    /// the iterator returns nil.
    IterNext(u32),
    /// `[v] -> ` return `v` from the current activation.
    Return,
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Nil => write!(f, "nil"),
            Instr::True => write!(f, "true"),
            Instr::False => write!(f, "false"),
            Instr::Const(i) => write!(f, "const #{i}"),
            Instr::Pop => write!(f, "pop"),
            Instr::Dup => write!(f, "dup"),
            Instr::Load(name) => write!(f, "load {name}"),
            Instr::Store(name) => write!(f, "store {name}"),
            Instr::Define(name) => write!(f, "define {name}"),
            Instr::PushScope => write!(f, "scope"),
            Instr::PopScope => write!(f, "endscope"),
            Instr::Binary(op) => write!(f, "{}", op.mnemonic()),
            Instr::Compare(op) => write!(f, "{}", op.mnemonic()),
            Instr::Unary(op) => write!(f, "{}", op.mnemonic()),
            Instr::Jump(t) => write!(f, "jmp @{t}"),
            Instr::JumpIfFalse(t) => write!(f, "jmpf @{t}"),
            Instr::JumpIfTrue(t) => write!(f, "jmpt @{t}"),
            Instr::Closure(i) => write!(f, "closure #{i}"),
            Instr::Call(n) => write!(f, "call {n}"),
            Instr::Invoke(n) => write!(f, "invoke {n}"),
            Instr::GetIndex => write!(f, "get"),
            Instr::SetIndex => write!(f, "set"),
            Instr::NewObject(n) => write!(f, "object {n}"),
            Instr::Receiver => write!(f, "this"),
            Instr::Arg(i) => write!(f, "arg {i}"),
            Instr::Args => write!(f, "args"),
            Instr::IterStart => write!(f, "iter"),
            Instr::IterNext(t) => write!(f, "next @{t}"),
            Instr::Return => write!(f, "ret"),
        }
    }
}
