use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_constant_dedup() {
    let mut b = PrototypeBuilder::new("<main>");
    let a = b.constant(Constant::Int(1));
    let s = b.constant(Constant::Str("hi".into()));
    let a2 = b.constant(Constant::Int(1));
    let f = b.constant(Constant::Float(0.0));
    let nf = b.constant(Constant::Float(-0.0));
    assert_eq!(a, a2);
    assert_ne!(a, s);
    assert_ne!(f, nf);
    assert_eq!(b.build().constants.len(), 4);
}

#[test]
fn test_patch_jump() {
    let mut b = PrototypeBuilder::new("f");
    let j = b.emit(Instr::JumpIfFalse(0));
    b.emit(Instr::Nil);
    let target = b.next_index();
    b.emit(Instr::Return);
    b.patch_jump(j, target);
    let proto = b.build();
    assert_eq!(proto.code[0], Instr::JumpIfFalse(2));
}

#[test]
fn test_patch_jump_ignores_non_jumps() {
    let mut b = PrototypeBuilder::new("f");
    let at = b.emit(Instr::Nil);
    b.patch_jump(at, 7);
    assert_eq!(b.build().code[0], Instr::Nil);
}

#[test]
fn test_location_of_skips_unknown() {
    let mut b = PrototypeBuilder::new("f");
    b.emit(Instr::Nil);
    b.emit_at(Instr::Return, Location::new(3, 5));
    let proto = b.build();
    assert_eq!(proto.location_of(0), None);
    assert_eq!(proto.location_of(1), Some(Location::new(3, 5)));
    assert_eq!(proto.location_of(9), None);
}

#[test]
fn test_disassembly_listing() {
    let mut child = PrototypeBuilder::new("greet").param("name");
    let c = child.constant(Constant::Str("Hello, ".into()));
    child.emit(Instr::Const(c));
    child.emit(Instr::Load("name".into()));
    child.emit(Instr::Binary(BinaryOp::Add));
    child.emit(Instr::Return);

    let mut main = PrototypeBuilder::new("<main>");
    let idx = main.child(child.build());
    main.emit(Instr::Closure(idx));
    main.emit(Instr::Return);

    let unit = CompiledUnit::new("greet", main.build());
    let listing = unit.to_string();
    assert!(listing.starts_with("; unit greet\n.func <main>\n"));
    assert!(listing.contains("  .func greet name\n"));
    assert!(listing.contains("; #0 = \"Hello, \""));
    assert!(listing.contains("0002 add"));
    assert!(listing.contains("0000 closure #0"));
    assert_eq!(unit.main.instruction_count(), 6);
}

#[test]
fn test_compile_error_display() {
    let err = CompileError::new("app/main", "unknown mnemonic `frob`", Location::new(4, 3));
    assert_eq!(err.to_string(), "app/main:4:3: unknown mnemonic `frob`");
}
