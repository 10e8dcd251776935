// pepper-vm - Control flow tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! End-to-end tests for conditionals and loops.

mod common;

use common::run;
use pepper_vm::Object;

#[test]
fn test_if_else_as_expression() {
    assert_eq!(run("if (false) { 1 } else { 2 };"), Object::Integer(2));
    assert_eq!(run("if (true) { 3 };"), Object::Integer(3));
    assert_eq!(run("if (false) { 3 };"), Object::Null);
    assert_eq!(run("if (1 < 2) { 10 } else { 20 };"), Object::Integer(10));
    assert_eq!(run("let x = if (true) { 1 } else { 2 }; x;"), Object::Integer(1));
}

#[test]
fn test_if_condition_uses_truthiness() {
    assert_eq!(run("if (0) { 1 } else { 2 };"), Object::Integer(1));
    assert_eq!(run("if (\"\") { 1 } else { 2 };"), Object::Integer(1));
    assert_eq!(run("if (null) { 1 } else { 2 };"), Object::Integer(2));
}

#[test]
fn test_nested_if() {
    assert_eq!(
        run("if (true) { if (false) { 1 } else { 2 } } else { 3 };"),
        Object::Integer(2)
    );
}

#[test]
fn test_while_loop() {
    assert_eq!(
        run("let i = 0; let s = 0; while (i < 5) { s = s + i; i = i + 1; } s;"),
        Object::Integer(10)
    );
    // Body never entered
    assert_eq!(
        run("let n = 0; while (false) { n = 1; } n;"),
        Object::Integer(0)
    );
}

#[test]
fn test_while_with_break() {
    assert_eq!(
        run("let i = 0; while (true) { i = i + 1; if (i == 3) { break; } } i;"),
        Object::Integer(3)
    );
}

#[test]
fn test_while_with_continue() {
    // Skip adding 2; sums 1 + 3 + 4 + 5
    assert_eq!(
        run("let i = 0; let s = 0; while (i < 5) { i = i + 1; if (i == 2) { continue; } s = s + i; } s;"),
        Object::Integer(13)
    );
}

#[test]
fn test_for_loop() {
    assert_eq!(
        run("let s = 0; for (let i = 0; i < 5; i = i + 1) { s = s + i; } s;"),
        Object::Integer(10)
    );
}

#[test]
fn test_for_loop_continue_still_runs_post_statement() {
    // Skips 2 but i keeps advancing: 0 + 1 + 3 + 4
    assert_eq!(
        run("let s = 0; for (let i = 0; i < 5; i = i + 1) { if (i == 2) { continue; } s = s + i; } s;"),
        Object::Integer(8)
    );
}

#[test]
fn test_for_loop_with_empty_header() {
    assert_eq!(
        run("let n = 0; for (;;) { n = n + 1; if (n == 4) { break; } } n;"),
        Object::Integer(4)
    );
}

#[test]
fn test_for_loop_init_can_reuse_outer_binding() {
    assert_eq!(
        run("let i = 100; let s = 0; for (i = 0; i < 3; i = i + 1) { s = s + i; } s + i;"),
        Object::Integer(6)
    );
}

#[test]
fn test_nested_loops_break_only_exits_inner() {
    let src = "
        let total = 0;
        for (let i = 0; i < 3; i = i + 1) {
            for (let j = 0; j < 10; j = j + 1) {
                if (j == 2) { break; }
                total = total + 1;
            }
        }
        total;
    ";
    assert_eq!(run(src), Object::Integer(6));
}

#[test]
fn test_loop_counter_in_nested_while() {
    let src = "
        let i = 0;
        let j = 0;
        let count = 0;
        while (i < 3) {
            j = 0;
            while (j < 3) {
                count = count + 1;
                j = j + 1;
            }
            i = i + 1;
        }
        count;
    ";
    assert_eq!(run(src), Object::Integer(9));
}

#[test]
fn test_early_return_skips_rest_of_function() {
    assert_eq!(
        run("let f = fn(x) { if (x) { return 1; } return 2; }; f(true);"),
        Object::Integer(1)
    );
    assert_eq!(
        run("let f = fn(x) { if (x) { return 1; } return 2; }; f(false);"),
        Object::Integer(2)
    );
}

#[test]
fn test_bare_return_yields_null() {
    assert_eq!(run("let f = fn() { return; }; f();"), Object::Null);
}
