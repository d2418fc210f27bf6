#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use super::*;
use lumo_ir::{BinaryOp, CompareOp, Compiler, Constant, Instr, Location, Name};
use pretty_assertions::assert_eq;

fn assemble(source: &str) -> lumo_ir::CompiledUnit {
    Assembler::new().assemble("test", source).unwrap()
}

fn error(source: &str) -> lumo_ir::CompileError {
    Assembler::new().assemble("test", source).unwrap_err()
}

#[test]
fn test_module_body() {
    let unit = assemble(
        "
        const 1
        const 2.5
        add
        ret
        ",
    );
    assert_eq!(unit.id.as_ref(), "test");
    assert_eq!(unit.main.name.as_ref(), MAIN_NAME);
    assert_eq!(
        unit.main.code,
        vec![
            Instr::Const(0),
            Instr::Const(1),
            Instr::Binary(BinaryOp::Add),
            Instr::Return,
        ]
    );
    assert_eq!(unit.main.constants, vec![Constant::Int(1), Constant::Float(2.5)]);
}

#[test]
fn test_locations_point_at_mnemonics() {
    let unit = assemble("nil\n  ; comment\n    ret");
    assert_eq!(unit.main.location_of(0), Some(Location::new(1, 1)));
    assert_eq!(unit.main.location_of(1), Some(Location::new(3, 5)));
}

#[test]
fn test_params_and_nested_functions() {
    let unit = assemble(
        r#"
.params name
.func greet who
    const "Hello, "
    load who
    add
    ret
.end
    closure greet
    load name
    call 1
    ret
"#,
    );
    assert_eq!(unit.main.params, vec![Name::from("name")]);
    assert_eq!(unit.main.children.len(), 1);
    let greet = &unit.main.children[0];
    assert_eq!(greet.name.as_ref(), "greet");
    assert_eq!(greet.params, vec![Name::from("who")]);
    assert_eq!(greet.constants, vec![Constant::Str("Hello, ".into())]);
    assert_eq!(unit.main.code[0], Instr::Closure(0));
    assert_eq!(unit.main.code[2], Instr::Call(1));
}

#[test]
fn test_forward_labels_and_functions() {
    let unit = assemble(
        "
    closure later
    pop
    true
    jmpf done
    nil
done: ret
.func later
.end
",
    );
    assert_eq!(unit.main.code[0], Instr::Closure(0));
    assert_eq!(unit.main.code[3], Instr::JumpIfFalse(5));
    assert_eq!(unit.main.code[5], Instr::Return);
    assert!(unit.main.children[0].code.is_empty());
}

#[test]
fn test_loop_shape() {
    let unit = assemble(
        "
    load xs
    iter
top: next end
    pop
    jmp top
end: lt
",
    );
    assert_eq!(
        unit.main.code,
        vec![
            Instr::Load("xs".into()),
            Instr::IterStart,
            Instr::IterNext(5),
            Instr::Pop,
            Instr::Jump(2),
            Instr::Compare(CompareOp::Lt),
        ]
    );
}

#[test]
fn test_literal_words() {
    let unit = assemble("const nil\nconst true\nconst \"a\\nb\"");
    assert_eq!(
        unit.main.constants,
        vec![Constant::Nil, Constant::Bool(true), Constant::Str("a\nb".into())]
    );
}

#[test]
fn test_listing_round_trips_mnemonics() {
    let unit = assemble("object 2\nthis\narg 1\nargs\ninvoke 0\nget\nset");
    let listing = unit.to_string();
    for expected in ["object 2", "this", "arg 1", "args", "invoke 0", "get", "set"] {
        assert!(listing.contains(expected), "missing {expected} in {listing}");
    }
}

#[test]
fn test_unknown_instruction() {
    let err = error("nil\n   frobnicate");
    assert_eq!(err.location, Location::new(2, 4));
    assert_eq!(err.message, "unknown instruction `frobnicate`");
    assert_eq!(err.to_string(), "test:2:4: unknown instruction `frobnicate`");
}

#[test]
fn test_operand_errors() {
    assert_eq!(error("add 1").message, "`add` takes no operands");
    assert_eq!(error("load").message, "missing operand");
    assert_eq!(error("call x").message, "expected a count");
    assert_eq!(error("call -1").message, "count out of range: -1");
    assert_eq!(error("const foo").message, "expected a literal, found `foo`");
    let err = error("load a b");
    assert_eq!(err.message, "too many operands");
    assert_eq!(err.location, Location::new(1, 8));
}

#[test]
fn test_undefined_references() {
    assert_eq!(error("jmp nowhere").message, "undefined label `nowhere`");
    assert_eq!(
        error("closure ghost").message,
        "undefined function `ghost` in `<main>`"
    );
}

#[test]
fn test_block_structure_errors() {
    let err = error("nil\n.func f\nret");
    assert_eq!(err.message, "unterminated .func `f`");
    assert_eq!(err.location, Location::new(2, 1));

    assert_eq!(error(".end").message, ".end without a matching .func");
    assert_eq!(error(".func f\n.end\n.func f\n.end").message, "duplicate function `f`");
    assert_eq!(error("a: nil\na: ret").message, "duplicate label `a`");
    assert_eq!(error(".global x").message, "unknown directive `.global`");
}

#[test]
fn test_lex_errors_carry_position() {
    let err = error("nil\nconst \"open");
    assert_eq!(err.location, Location::new(2, 7));
    assert_eq!(err.message, "unterminated string literal");
}

#[test]
fn test_compiler_rejects_invalid_utf8() {
    let err = Assembler::new()
        .compile("bin", b"nil\n\xff\xfe")
        .unwrap_err();
    assert_eq!(err.id, "bin");
    assert_eq!(err.location.line, 2);
}

#[test]
fn test_compiler_accepts_bytes() {
    let unit = Assembler::new().compile("m", b"true\nret").unwrap();
    assert_eq!(unit.main.code, vec![Instr::True, Instr::Return]);
}
