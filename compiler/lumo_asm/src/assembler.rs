//! Assembly of line-oriented source into a `CompiledUnit`.

use rustc_hash::FxHashMap;

use lumo_ir::{
    BinaryOp, CompareOp, CompileError, CompiledUnit, Compiler, Constant, Instr, Location, Name,
    Prototype, PrototypeBuilder, UnaryOp,
};

use crate::lexer::{lex_line, Token, TokenKind};

/// Name given to a module's top-level prototype.
pub const MAIN_NAME: &str = "<main>";

/// Compiler for the Lumo assembly format.
///
/// ```text
/// .params name
///     const "Hello, "
///     load name
///     add
///     ret
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct Assembler;

impl Assembler {
    pub fn new() -> Self {
        Assembler
    }

    /// Assemble `source` as module `id`.
    pub fn assemble(&self, id: &str, source: &str) -> Result<CompiledUnit, CompileError> {
        let mut parser = Parser::new(id);
        for (index, text) in source.lines().enumerate() {
            let line = u32::try_from(index + 1).unwrap_or(u32::MAX);
            parser.line(line, text)?;
        }
        parser.finish()
    }
}

impl Compiler for Assembler {
    fn compile(&self, id: &str, source: &[u8]) -> Result<CompiledUnit, CompileError> {
        let text = std::str::from_utf8(source).map_err(|err| {
            let valid = &source[..err.valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
            CompileError::new(
                id,
                "source is not valid UTF-8",
                Location::new(u32::try_from(line).unwrap_or(u32::MAX), 1),
            )
        })?;
        self.assemble(id, text)
    }
}

/// An instruction whose operand may refer to something defined later.
enum Pending {
    Ready(Instr),
    Jump(fn(u32) -> Instr, String),
    Closure(String),
}

/// A `.func` body (or the module body) being assembled.
struct Block {
    builder: PrototypeBuilder,
    name: Name,
    opened_at: Location,
    code: Vec<(Pending, Location)>,
    labels: FxHashMap<String, u32>,
    functions: FxHashMap<String, u32>,
}

impl Block {
    fn new(name: &str, opened_at: Location) -> Self {
        Block {
            builder: PrototypeBuilder::new(name),
            name: Name::from(name),
            opened_at,
            code: Vec::new(),
            labels: FxHashMap::default(),
            functions: FxHashMap::default(),
        }
    }

    /// Resolve label and function references and build the prototype.
    fn finish(mut self, id: &str) -> Result<Prototype, CompileError> {
        for (pending, at) in std::mem::take(&mut self.code) {
            let instr = match pending {
                Pending::Ready(instr) => instr,
                Pending::Jump(make, label) => match self.labels.get(&label) {
                    Some(&target) => make(target),
                    None => {
                        return Err(CompileError::new(id, format!("undefined label `{label}`"), at))
                    }
                },
                Pending::Closure(name) => match self.functions.get(&name) {
                    Some(&index) => Instr::Closure(index),
                    None => {
                        return Err(CompileError::new(
                            id,
                            format!("undefined function `{name}` in `{}`", self.name),
                            at,
                        ))
                    }
                },
            };
            self.builder.emit_at(instr, at);
        }
        Ok(self.builder.build())
    }
}

struct Parser<'a> {
    id: &'a str,
    /// Open blocks, module body first.
    blocks: Vec<Block>,
}

impl<'a> Parser<'a> {
    fn new(id: &'a str) -> Self {
        Parser {
            id,
            blocks: vec![Block::new(MAIN_NAME, Location::new(1, 1))],
        }
    }

    #[cold]
    fn error(&self, message: impl Into<String>, at: Location) -> CompileError {
        CompileError::new(self.id, message, at)
    }

    fn current(&mut self) -> &mut Block {
        // The module block is never popped before `finish`.
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }

    fn line(&mut self, line: u32, text: &str) -> Result<(), CompileError> {
        let tokens = lex_line(text)
            .map_err(|err| self.error(err.to_string(), Location::new(line, err.column())))?;

        let mut rest = tokens.as_slice();
        while let [Token { kind: TokenKind::Label(label), column }, tail @ ..] = rest {
            self.define_label(label, Location::new(line, *column))?;
            rest = tail;
        }
        let Some((head, operands)) = rest.split_first() else {
            return Ok(());
        };
        let at = Location::new(line, head.column);
        match &head.kind {
            TokenKind::Directive(directive) => self.directive(directive, operands, at),
            TokenKind::Ident(mnemonic) => self.instruction(mnemonic, operands, at),
            _ => Err(self.error("expected an instruction or directive", at)),
        }
    }

    fn define_label(&mut self, label: &str, at: Location) -> Result<(), CompileError> {
        let block = self.current();
        let target = u32::try_from(block.code.len()).unwrap_or(u32::MAX);
        if block.labels.insert(label.to_string(), target).is_some() {
            return Err(self.error(format!("duplicate label `{label}`"), at));
        }
        Ok(())
    }

    fn directive(&mut self, directive: &str, operands: &[Token], at: Location) -> Result<(), CompileError> {
        match directive {
            "func" => {
                let (name, params) = operands
                    .split_first()
                    .ok_or_else(|| self.error(".func needs a name", at))?;
                let name = self.ident(name, "function name", at.line)?;
                let params = self.idents(params, at.line)?;
                let mut block = Block::new(&name, at);
                block.builder.set_params(params);
                self.blocks.push(block);
                Ok(())
            }
            "end" => {
                self.no_operands("end", operands, at)?;
                let block = if self.blocks.len() > 1 {
                    self.blocks.pop()
                } else {
                    None
                };
                let Some(block) = block else {
                    return Err(self.error(".end without a matching .func", at));
                };
                let name = block.name.to_string();
                let proto = block.finish(self.id)?;
                let parent = self.current();
                let index = parent.builder.child(proto);
                if parent.functions.insert(name.clone(), index).is_some() {
                    return Err(self.error(format!("duplicate function `{name}`"), at));
                }
                Ok(())
            }
            "params" => {
                let params = self.idents(operands, at.line)?;
                self.current().builder.set_params(params);
                Ok(())
            }
            other => Err(self.error(format!("unknown directive `.{other}`"), at)),
        }
    }

    fn instruction(&mut self, mnemonic: &str, operands: &[Token], at: Location) -> Result<(), CompileError> {
        let pending = if let Some(instr) = simple_instruction(mnemonic) {
            self.no_operands(mnemonic, operands, at)?;
            Pending::Ready(instr)
        } else {
            match mnemonic {
                "const" => {
                    let constant = self.literal(operands, at)?;
                    let index = self.current().builder.constant(constant);
                    Pending::Ready(Instr::Const(index))
                }
                "load" => Pending::Ready(Instr::Load(self.name_operand(operands, at)?)),
                "store" => Pending::Ready(Instr::Store(self.name_operand(operands, at)?)),
                "define" => Pending::Ready(Instr::Define(self.name_operand(operands, at)?)),
                "jmp" => Pending::Jump(Instr::Jump, self.label(operands, at)?),
                "jmpf" => Pending::Jump(Instr::JumpIfFalse, self.label(operands, at)?),
                "jmpt" => Pending::Jump(Instr::JumpIfTrue, self.label(operands, at)?),
                "next" => Pending::Jump(Instr::IterNext, self.label(operands, at)?),
                "closure" => Pending::Closure(self.label(operands, at)?),
                "call" => Pending::Ready(Instr::Call(self.count(operands, at)?)),
                "invoke" => Pending::Ready(Instr::Invoke(self.count(operands, at)?)),
                "object" => Pending::Ready(Instr::NewObject(self.count(operands, at)?)),
                "arg" => Pending::Ready(Instr::Arg(self.count(operands, at)?)),
                other => return Err(self.error(format!("unknown instruction `{other}`"), at)),
            }
        };
        self.current().code.push((pending, at));
        Ok(())
    }

    fn finish(mut self) -> Result<CompiledUnit, CompileError> {
        if self.blocks.len() > 1 {
            let open = &self.blocks[self.blocks.len() - 1];
            return Err(self.error(format!("unterminated .func `{}`", open.name), open.opened_at));
        }
        let Some(main) = self.blocks.pop() else {
            return Err(self.error("empty unit", Location::new(1, 1)));
        };
        let proto = main.finish(self.id)?;
        Ok(CompiledUnit::new(self.id, proto))
    }

    // Operands

    fn no_operands(&self, mnemonic: &str, operands: &[Token], at: Location) -> Result<(), CompileError> {
        match operands.first() {
            None => Ok(()),
            Some(extra) => Err(self.error(
                format!("`{mnemonic}` takes no operands"),
                Location::new(at.line, extra.column),
            )),
        }
    }

    fn single<'t>(&self, operands: &'t [Token], at: Location) -> Result<&'t Token, CompileError> {
        match operands {
            [only] => Ok(only),
            [] => Err(self.error("missing operand", at)),
            [_, extra, ..] => {
                Err(self.error("too many operands", Location::new(at.line, extra.column)))
            }
        }
    }

    fn ident(&self, token: &Token, what: &str, line: u32) -> Result<String, CompileError> {
        match &token.kind {
            TokenKind::Ident(name) => Ok(name.clone()),
            _ => Err(self.error(format!("expected {what}"), Location::new(line, token.column))),
        }
    }

    fn idents(&self, tokens: &[Token], line: u32) -> Result<Vec<Name>, CompileError> {
        tokens
            .iter()
            .map(|t| self.ident(t, "parameter name", line).map(Name::from))
            .collect()
    }

    fn name_operand(&self, operands: &[Token], at: Location) -> Result<Name, CompileError> {
        let token = self.single(operands, at)?;
        match &token.kind {
            TokenKind::Ident(name) => Ok(Name::from(name.as_str())),
            _ => Err(self.error("expected a name", Location::new(at.line, token.column))),
        }
    }

    /// A label or function reference.
    fn label(&self, operands: &[Token], at: Location) -> Result<String, CompileError> {
        self.name_operand(operands, at).map(|name| name.to_string())
    }

    fn count(&self, operands: &[Token], at: Location) -> Result<u32, CompileError> {
        let token = self.single(operands, at)?;
        match token.kind {
            TokenKind::Int(n) => u32::try_from(n).map_err(|_| {
                self.error(format!("count out of range: {n}"), Location::new(at.line, token.column))
            }),
            _ => Err(self.error("expected a count", Location::new(at.line, token.column))),
        }
    }

    fn literal(&self, operands: &[Token], at: Location) -> Result<Constant, CompileError> {
        let token = self.single(operands, at)?;
        match &token.kind {
            TokenKind::Int(n) => Ok(Constant::Int(*n)),
            TokenKind::Float(x) => Ok(Constant::Float(*x)),
            TokenKind::Str(s) => Ok(Constant::Str(Name::from(s.as_str()))),
            TokenKind::Ident(word) => match word.as_str() {
                "nil" => Ok(Constant::Nil),
                "true" => Ok(Constant::Bool(true)),
                "false" => Ok(Constant::Bool(false)),
                _ => Err(self.error(
                    format!("expected a literal, found `{word}`"),
                    Location::new(at.line, token.column),
                )),
            },
            _ => Err(self.error("expected a literal", Location::new(at.line, token.column))),
        }
    }
}

/// Instructions without operands.
fn simple_instruction(mnemonic: &str) -> Option<Instr> {
    Some(match mnemonic {
        "nil" => Instr::Nil,
        "true" => Instr::True,
        "false" => Instr::False,
        "pop" => Instr::Pop,
        "dup" => Instr::Dup,
        "scope" => Instr::PushScope,
        "endscope" => Instr::PopScope,
        "add" => Instr::Binary(BinaryOp::Add),
        "sub" => Instr::Binary(BinaryOp::Sub),
        "mul" => Instr::Binary(BinaryOp::Mul),
        "div" => Instr::Binary(BinaryOp::Div),
        "mod" => Instr::Binary(BinaryOp::Mod),
        "neg" => Instr::Unary(UnaryOp::Neg),
        "not" => Instr::Unary(UnaryOp::Not),
        "eq" => Instr::Compare(CompareOp::Eq),
        "ne" => Instr::Compare(CompareOp::NotEq),
        "lt" => Instr::Compare(CompareOp::Lt),
        "le" => Instr::Compare(CompareOp::LtEq),
        "gt" => Instr::Compare(CompareOp::Gt),
        "ge" => Instr::Compare(CompareOp::GtEq),
        "get" => Instr::GetIndex,
        "set" => Instr::SetIndex,
        "this" => Instr::Receiver,
        "args" => Instr::Args,
        "iter" => Instr::IterStart,
        "ret" => Instr::Return,
        _ => return None,
    })
}
