// loxide-vm - End-to-end interpreter tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

mod common;

use common::{new_vm, run, run_with_vm};

#[test]
fn test_arithmetic_precedence() {
    assert_prints!("print 1 + 2 * 3;", "7");
    assert_prints!("print (1 + 2) * 3;", "9");
    assert_prints!("print 10 - 4 / 2;", "8");
    assert_prints!("print 1 + 2 - 3 + 4;", "4");
}

#[test]
fn test_unary() {
    assert_prints!("print -3;", "-3");
    assert_prints!("print --3;", "3");
    assert_prints!("print !true;", "false");
    assert_prints!("print !!nil;", "false");
    assert_prints!("print -(1 + 2);", "-3");
}

#[test]
fn test_number_printing() {
    assert_prints!("print 7;", "7");
    assert_prints!("print 2.5;", "2.5");
    assert_prints!("print 10 / 4;", "2.5");
}

#[test]
fn test_literals() {
    assert_prints!("print true;", "true");
    assert_prints!("print false;", "false");
    assert_prints!("print nil;", "nil");
    assert_prints!("print \"hello\";", "hello");
}

#[test]
fn test_comparison_and_equality() {
    assert_prints!("print 1 < 2;", "true");
    assert_prints!("print 2 <= 2;", "true");
    assert_prints!("print 3 > 4;", "false");
    assert_prints!("print 4 >= 5;", "false");
    assert_prints!("print 1 == 1;", "true");
    assert_prints!("print 1 != 2;", "true");
    assert_prints!("print nil == nil;", "true");
    assert_prints!("print nil == false;", "false");
    assert_prints!("print \"a\" == 1;", "false");
}

#[test]
fn test_string_concatenation() {
    assert_prints!(
        "var a = \"foo\"; var b = \"bar\"; print a + b;",
        "foobar"
    );
    // Concatenation interns its result, so equality holds by identity.
    assert_prints!(
        "var a = \"foo\"; var b = \"bar\"; print a + b == \"foobar\";",
        "true"
    );
}

#[test]
fn test_logical_operators() {
    // Short-circuit keeps the deciding operand as the result.
    assert_prints!("print 1 and 2;", "2");
    assert_prints!("print nil and 2;", "nil");
    assert_prints!("print false and 1;", "false");
    assert_prints!("print 1 or 2;", "1");
    assert_prints!("print nil or 2;", "2");
    assert_prints!("print false or nil;", "nil");
}

#[test]
fn test_short_circuit_skips_side_effects() {
    assert_prints!(
        "var a = 1; false and (a = 2); print a;",
        "1"
    );
    assert_prints!(
        "var a = 1; true or (a = 2); print a;",
        "1"
    );
}

#[test]
fn test_global_variables() {
    assert_prints!("var a; print a;", "nil");
    assert_prints!("var a; a = 1; print a;", "1");
    assert_prints!("var a = 1; var b = 2; print a + b;", "3");
    // Assignment is an expression yielding the assigned value.
    assert_prints!("var a; print a = 3;", "3");
    // Redeclaration is allowed at the top level.
    assert_prints!("var a = 1; var a = 2; print a;", "2");
}

#[test]
fn test_local_variables_and_shadowing() {
    assert_prints!("{ var a = 1; print a; }", "1");
    assert_prints!(
        "var a = \"outer\"; { var a = \"inner\"; print a; } print a;",
        "inner",
        "outer"
    );
    assert_prints!(
        "{ var a = 1; { var b = a; print b; var c = 2; print b + c; } }",
        "1",
        "3"
    );
}

#[test]
fn test_if_statement() {
    assert_prints!("if (true) print 1; else print 2;", "1");
    assert_prints!("if (false) print 1; else print 2;", "2");
    assert_prints!("if (nil) print 1; else print 2;", "2");
    // Any non-nil non-false value is truthy.
    assert_prints!("if (0) print 1; else print 2;", "1");
    assert_prints!("if (\"\") print 1; else print 2;", "1");
}

#[test]
fn test_while_loop() {
    assert_prints!(
        "var i = 0; while (i < 3) { print i; i = i + 1; }",
        "0",
        "1",
        "2"
    );
    assert_prints!("while (false) print 1; print 2;", "2");
}

#[test]
fn test_for_loop() {
    assert_prints!(
        "var x = 0; for (var i = 0; i < 5; i = i + 1) { x = x + i; } print x;",
        "10"
    );
    assert_prints!(
        "for (var i = 0; i < 3; i = i + 1) print i;",
        "0",
        "1",
        "2"
    );
    // All three clauses are optional; condition only.
    assert_prints!(
        "var i = 0; for (; i < 2;) { print i; i = i + 1; }",
        "0",
        "1"
    );
}

#[test]
fn test_function_declaration_and_call() {
    assert_prints!(
        "fun add(a, b) { return a + b; } print add(1, 2);",
        "3"
    );
    assert_prints!(
        "fun greet(name) { print \"hi \" + name; } greet(\"there\");",
        "hi there"
    );
    // A function with no return statement returns nil.
    assert_prints!("fun noop() {} print noop();", "nil");
    assert_prints!("fun early() { return; print 1; } print early();", "nil");
}

#[test]
fn test_function_printing() {
    assert_prints!("fun f() {} print f;", "<fn f>");
    assert_prints!("print clock;", "<native fn>");
}

#[test]
fn test_recursion() {
    assert_prints!(
        "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(10);",
        "55"
    );
    assert_prints!(
        "fun fact(n) { if (n <= 1) return 1; return n * fact(n - 1); } print fact(6);",
        "720"
    );
}

#[test]
fn test_closure_captures_parameter_after_return() {
    assert_prints!(
        "fun make(x) { fun get() { return x; } return get; } var g = make(42); print g();",
        "42"
    );
}

#[test]
fn test_closure_counter_keeps_state() {
    assert_prints!(
        "fun counter() { var n = 0; fun inc() { n = n + 1; return n; } return inc; }
         var c = counter();
         print c(); print c(); print c();",
        "1",
        "2",
        "3"
    );
}

#[test]
fn test_closures_share_one_upvalue() {
    assert_prints!(
        "var set; var get;
         fun pair() {
           var n = 0;
           fun setter(v) { n = v; }
           fun getter() { return n; }
           set = setter; get = getter;
         }
         pair();
         set(9);
         print get();",
        "9"
    );
}

#[test]
fn test_closure_captures_variable_not_value() {
    assert_prints!(
        "var f;
         {
           var a = \"captured\";
           fun show() { print a; }
           f = show;
           a = \"updated\";
         }
         f();",
        "updated"
    );
}

#[test]
fn test_nested_upvalue_resolution() {
    // The innermost function reaches x through two function boundaries.
    assert_prints!(
        "fun outer() {
           var x = \"x\";
           fun middle() {
             fun inner() { return x; }
             return inner;
           }
           return middle();
         }
         print outer()();",
        "x"
    );
}

#[test]
fn test_higher_order_functions() {
    assert_prints!(
        "fun twice(f, v) { return f(f(v)); }
         fun inc(n) { return n + 1; }
         print twice(inc, 5);",
        "7"
    );
}

#[test]
fn test_clock_native() {
    assert_prints!("print clock() >= 0;", "true");
    assert_prints!(
        "var before = clock(); var after = clock(); print after >= before;",
        "true"
    );
}

#[test]
fn test_globals_persist_across_interprets() {
    let (mut vm, output) = new_vm();
    run_with_vm(&mut vm, &output, "var a = 40;").expect("declaration runs");
    let printed = run_with_vm(&mut vm, &output, "print a + 2;").expect("use runs");
    assert_eq!(printed, "42\n");
}

#[test]
fn test_vm_usable_after_runtime_error() {
    let (mut vm, output) = new_vm();
    assert!(run_with_vm(&mut vm, &output, "print 1 + nil;").is_err());
    let printed = run_with_vm(&mut vm, &output, "print 2;").expect("vm recovered");
    assert_eq!(printed, "2\n");
}

#[test]
fn test_statement_boundaries_leave_stack_balanced() {
    // A long statement sequence in one script; any stack imbalance
    // would corrupt later statements or underflow on return.
    let mut source = String::new();
    for i in 0..50 {
        source.push_str(&format!("var v{} = {}; v{} = v{} + 1;\n", i, i, i, i));
    }
    source.push_str("print v49;");
    assert_eq!(run(&source).expect("runs"), "50\n");
}
