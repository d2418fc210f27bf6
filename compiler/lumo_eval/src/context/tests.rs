#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;

use lumo_asm::Assembler;
use lumo_ir::Location;
use lumo_value::{runtime_error, FailureKind, ObjectBuilder};

use super::*;
use crate::arith::{NumericArithmetic, Overflow};
use crate::errors::ResolveError;
use crate::loader::MemoryResolver;
use crate::native::NativeModuleFn;
use crate::print_handler::buffer_handler;

fn context(modules: &[(&str, &str)]) -> Context {
    let resolver = MemoryResolver::new();
    for (id, text) in modules {
        resolver.insert_text(id, *text);
    }
    Context::builder()
        .resolver(resolver)
        .compiler(Assembler::new())
        .print_handler(buffer_handler())
        .build()
}

// Loading

#[test]
fn test_load_is_cached() {
    let ctx = context(&[("main", "const 1\nret")]);
    assert!(!ctx.is_loaded("main"));
    let first = ctx.load("main").unwrap();
    let second = ctx.load("main").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(ctx.is_loaded("main"));
    assert_eq!(first.id(), "main");
    assert!(!first.is_native());
    assert!(first.unit().is_some());
}

#[test]
fn test_load_unknown_id() {
    let ctx = context(&[]);
    let err = ctx.load("missing").unwrap_err();
    assert_eq!(err.id(), "missing");
    assert!(matches!(
        err,
        LoadError::Resolution {
            source: ResolveError::NotFound { .. },
            ..
        }
    ));
    assert!(!ctx.is_loaded("missing"));
}

#[test]
fn test_compile_error_carries_location() {
    let ctx = context(&[("bad", "nil\n  bogus")]);
    let err = ctx.load("bad").unwrap_err();
    let LoadError::Compile(compile) = &err else {
        panic!("expected compile error, got {err:?}");
    };
    assert_eq!(compile.id, "bad");
    assert_eq!(compile.location, Location::new(2, 3));
    assert_eq!(err.id(), "bad");
    assert!(!ctx.is_loaded("bad"));
}

#[test]
fn test_no_compiler_rejects_text_sources() {
    let ctx = Context::builder()
        .resolver(MemoryResolver::new().with_text("main", "nil"))
        .build();
    let err = ctx.load("main").unwrap_err();
    assert!(err.to_string().contains("no compiler configured"));
}

#[test]
fn test_precompiled_units_skip_the_compiler() {
    let unit = Assembler::new().assemble("pre", "const 7\nret").unwrap();
    let ctx = Context::builder()
        .resolver(MemoryResolver::new().with_unit(unit))
        .build();
    assert_eq!(ctx.run("pre", &[]).unwrap(), Value::int(7));
}

#[test]
fn test_loaded_ids_are_sorted() {
    let ctx = context(&[("b", "nil"), ("a", "nil")]);
    ctx.load("b").unwrap();
    ctx.load("a").unwrap();
    let loaded = ctx.loaded_ids();
    let ids: Vec<&str> = loaded.iter().map(|id| &**id).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_contexts_share_nothing() {
    let one = context(&[("main", "nil")]);
    let two = context(&[("main", "nil")]);
    let a = one.load("main").unwrap();
    let b = two.load("main").unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(!one.ptr_eq(&two));
    assert!(one.ptr_eq(&one.clone()));
}

// Running

#[test]
fn test_run_is_memoized() {
    let ctx = context(&[(
        "main",
        "
.params name
    load println
    load name
    call 1
    pop
    object 0
    ret
",
    )]);
    let module = ctx.load("main").unwrap();
    assert_eq!(module.value(), None);
    let first = module.run(&[Value::from("once")]).unwrap();
    let second = module.run(&[Value::from("twice")]).unwrap();
    assert_eq!(ctx.print_handler().output(), "once\n");
    assert!(first.as_object().unwrap().ptr_eq(second.as_object().unwrap()));
    assert_eq!(module.value(), Some(first));
}

#[test]
fn test_failed_run_is_retried() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let ctx = Context::builder()
        .native(NativeModuleFn::new("flaky", move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(runtime_error("not ready"));
            }
            Ok(Value::from("ready"))
        }))
        .build();

    let module = ctx.load("flaky").unwrap();
    assert!(module.is_native());
    let err = module.run(&[]).unwrap_err();
    assert_eq!(err.category(), FailureKind::RuntimeError);
    assert_eq!(module.value(), None);

    assert_eq!(module.run(&[]).unwrap(), Value::from("ready"));
    assert_eq!(module.run(&[]).unwrap(), Value::from("ready"));
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[test]
fn test_run_after_context_dropped() {
    let ctx = context(&[("main", "nil")]);
    let module = ctx.load("main").unwrap();
    drop(ctx);
    let err = module.run(&[]).unwrap_err();
    assert_eq!(err.category(), FailureKind::RuntimeError);
    assert!(err.message.contains("has been dropped"));
}

#[test]
fn test_run_reports_load_and_eval_errors() {
    let ctx = context(&[("boom", "const 1\nconst 0\ndiv")]);
    let err = ctx.run("nope", &[]).unwrap_err();
    assert!(matches!(err, HostError::Load(_)));
    assert!(err.as_eval().is_none());

    let err = ctx.run("boom", &[]).unwrap_err();
    assert_eq!(err.as_eval().unwrap().category(), FailureKind::ArithmeticError);
}

#[test]
fn test_call_exported_function() {
    let ctx = context(&[(
        "lib",
        "
.func double x
    load x
    load x
    add
    ret
.end
    const \"double\"
    closure double
    object 1
    ret
",
    )]);
    let exports = ctx.run("lib", &[]).unwrap();
    let double = exports.as_object().unwrap().get_str("double");
    assert_eq!(ctx.call(&double, &[Value::int(21)]).unwrap(), Value::int(42));

    let err = ctx.call(&Value::int(1), &[]).unwrap_err();
    assert_eq!(err.category(), FailureKind::TypeError);
}

// Native registration

fn greeter(greeting: &'static str) -> Arc<dyn NativeModule> {
    Arc::new(NativeModuleFn::new("greeter", move |_, _| {
        Ok(ObjectBuilder::new().field("greeting", greeting).build())
    }))
}

#[test]
fn test_register_replaces_until_loaded() {
    let ctx = context(&[]);
    ctx.register(greeter("hi")).unwrap();
    ctx.register(greeter("hello")).unwrap();

    let value = ctx.run("greeter", &[]).unwrap();
    assert_eq!(value.as_object().unwrap().get_str("greeting"), Value::from("hello"));

    let err = ctx.register(greeter("hey")).unwrap_err();
    assert_eq!(
        err,
        RegisterError::AlreadyLoaded {
            id: "greeter".to_string()
        }
    );
}

#[test]
fn test_native_shadows_resolver() {
    let ctx = Context::builder()
        .resolver(MemoryResolver::new().with_text("greeter", "const \"script\"\nret"))
        .compiler(Assembler::new())
        .native(greeter("native"))
        .build();
    let module = ctx.load("greeter").unwrap();
    assert!(module.is_native());
    assert!(module.unit().is_none());
}

#[test]
fn test_builder_config() {
    let ctx = Context::builder().max_call_depth(8).build();
    assert_eq!(ctx.config().max_call_depth, 8);
    let ctx = Context::builder().build();
    assert_eq!(ctx.config(), EvalConfig::default());
    assert_eq!(ctx.config().max_call_depth, EvalConfig::DEFAULT_MAX_CALL_DEPTH);
}

#[test]
fn test_arithmetic_strategy_is_per_context() {
    let source = "const 9223372036854775807\nconst 1\nadd\nret";
    let build = |overflow| {
        Context::builder()
            .resolver(MemoryResolver::new().with_text("main", source))
            .compiler(Assembler::new())
            .arithmetic(NumericArithmetic::new(overflow))
            .build()
    };
    let checked = build(Overflow::Checked);
    let wrapping = build(Overflow::Wrapping);

    let err = checked.run("main", &[]).unwrap_err();
    assert_eq!(err.as_eval().unwrap().category(), FailureKind::ArithmeticError);
    assert_eq!(wrapping.run("main", &[]).unwrap(), Value::int(i64::MIN));

    // The default strategy is checked.
    let err = context(&[("main", source)]).run("main", &[]).unwrap_err();
    assert_eq!(err.as_eval().unwrap().category(), FailureKind::ArithmeticError);
}
