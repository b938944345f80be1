// loxide-vm - Compile and runtime error surface tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

mod common;

use common::{new_vm, run_with_vm};

// =============================================================================
// Compile errors
// =============================================================================

#[test]
fn test_missing_semicolon() {
    assert_compile_err!("print 1");
    assert_compile_err!("var a = 1");
    assert_compile_err!("1 + 2");
}

#[test]
fn test_missing_expression() {
    assert_compile_err!("print ;");
    assert_compile_err!("var a = ;");
    assert_compile_err!("1 + ;");
    assert_compile_err!("(;");
}

#[test]
fn test_unbalanced_parens_and_braces() {
    assert_compile_err!("print (1 + 2;");
    assert_compile_err!("{ print 1;");
    assert_compile_err!("if (true print 1;");
}

#[test]
fn test_invalid_assignment_target() {
    assert_compile_err!("1 = 2;");
    assert_compile_err!("a + b = c;");
    assert_compile_err!("(a) = 3;");
}

#[test]
fn test_scan_errors_are_compile_errors() {
    assert_compile_err!("print \"unterminated;");
    assert_compile_err!("print 1 @ 2;");
}

#[test]
fn test_return_at_top_level() {
    assert_compile_err!("return 1;");
    assert_compile_err!("return;");
}

#[test]
fn test_local_in_own_initializer() {
    assert_compile_err!("{ var a = a; }");
}

#[test]
fn test_duplicate_local_in_same_scope() {
    assert_compile_err!("{ var a = 1; var a = 2; }");
}

#[test]
fn test_var_declaration_keeps_scope_rules_straight() {
    // Shadowing in an inner scope stays legal.
    assert_prints!("{ var a = 1; { var a = 2; print a; } print a; }", "2", "1");
}

#[test]
fn test_keywords_without_rules_are_not_expressions() {
    assert_compile_err!("print class;");
    assert_compile_err!("this;");
    assert_compile_err!("super;");
}

#[test]
fn test_error_recovery_reports_later_statements() {
    // The first statement is malformed, but the compiler synchronises
    // and must still reject the second, independent error.
    assert_compile_err!("print ; var 1 = 2;");
    // A valid trailing statement after a bad one still fails overall.
    assert_compile_err!("print ; print 1;");
}

#[test]
fn test_compile_error_does_not_execute() {
    let (mut vm, output) = new_vm();
    assert!(run_with_vm(&mut vm, &output, "print \"side effect\"; print ;").is_err());
    assert_eq!(output.contents(), "");
}

// =============================================================================
// Runtime errors
// =============================================================================

#[test]
fn test_arithmetic_type_errors() {
    assert_runtime_err!("print -\"a\";");
    assert_runtime_err!("print 1 - \"a\";");
    assert_runtime_err!("print \"a\" * 2;");
    assert_runtime_err!("print nil / 2;");
    assert_runtime_err!("print 1 < \"a\";");
    assert_runtime_err!("print true > false;");
}

#[test]
fn test_addition_type_errors() {
    assert_runtime_err!("print 1 + nil;");
    assert_runtime_err!("print 1 + \"a\";");
    assert_runtime_err!("print \"a\" + 1;");
    assert_runtime_err!("print true + false;");
}

#[test]
fn test_undefined_globals() {
    assert_runtime_err!("print missing;");
    assert_runtime_err!("b = 1;");
    // An assignment to an undefined global must not create it.
    let (mut vm, output) = new_vm();
    assert!(run_with_vm(&mut vm, &output, "b = 1;").is_err());
    assert!(run_with_vm(&mut vm, &output, "print b;").is_err());
}

#[test]
fn test_calling_non_callables() {
    assert_runtime_err!("nil();");
    assert_runtime_err!("1();");
    assert_runtime_err!("\"not a function\"();");
    assert_runtime_err!("var s = \"x\"; s();");
}

#[test]
fn test_arity_mismatch() {
    assert_runtime_err!("fun f(a, b) {} f(1);");
    assert_runtime_err!("fun f() {} f(1);");
    assert_prints!("fun f(a, b) { print a + b; } f(1, 2);", "3");
}

#[test]
fn test_frame_overflow() {
    assert_runtime_err!("fun loop() { loop(); } loop();");
}

#[test]
fn test_error_in_nested_call_unwinds() {
    // The failing add is three frames deep; the whole interpret call
    // fails and the VM resets cleanly.
    let (mut vm, output) = new_vm();
    assert!(run_with_vm(
        &mut vm,
        &output,
        "fun c() { return 1 + nil; } fun b() { return c(); } fun a() { return b(); } a();"
    )
    .is_err());
    let printed = run_with_vm(&mut vm, &output, "print \"still alive\";").expect("vm recovered");
    assert_eq!(printed, "still alive\n");
}

#[test]
fn test_condition_type_is_not_an_error() {
    // Conditions use truthiness, never a type check.
    assert_prints!("if (\"s\") print 1;", "1");
    assert_prints!("while (nil) print 1; print 2;", "2");
}

#[test]
fn test_division_by_zero_follows_ieee() {
    // No special-casing: IEEE-754 semantics flow through.
    assert_prints!("print 1 / 0 > 1000000;", "true");
    assert_prints!("print 0 / 0 == 0 / 0;", "false");
}
