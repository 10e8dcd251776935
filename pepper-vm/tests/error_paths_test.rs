// pepper-vm - Compile and runtime error path tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Tests for error paths:
//! - unknown identifiers and invalid assignment targets
//! - break/continue outside loops
//! - type mismatches, arity errors, division by zero
//! - index and hash-key errors
//! - frame exhaustion

mod common;

use common::expect_error;

// =============================================================================
// Compile errors
// =============================================================================

#[test]
fn unknown_identifier() {
    expect_error("let x = 1; y;", "unknown identifier 'y'");
    expect_error("foo(1);", "unknown identifier 'foo'");
}

#[test]
fn assignment_to_undefined_name() {
    expect_error("y = 1;", "unknown identifier 'y'");
}

#[test]
fn invalid_assignment_targets() {
    expect_error("1 = 2;", "invalid assignment target");
    expect_error("len = 1;", "invalid assignment target");
    expect_error("let a = 1; let b = 2; (a + b) = 1;", "invalid assignment target");
}

#[test]
fn captured_variables_are_read_only() {
    expect_error(
        "let f = fn(x) { fn() { x = 1; }; };",
        "invalid assignment target",
    );
}

#[test]
fn break_outside_loop() {
    expect_error("break;", "'break' outside of a loop");
    expect_error("if (true) { break; };", "'break' outside of a loop");
}

#[test]
fn continue_outside_loop() {
    expect_error("continue;", "'continue' outside of a loop");
}

#[test]
fn break_inside_function_does_not_see_enclosing_loop() {
    expect_error(
        "while (true) { let f = fn() { break; }; }",
        "'break' outside of a loop",
    );
}

#[test]
fn loop_variable_is_scoped_to_the_loop() {
    expect_error(
        "for (let i = 0; i < 3; i = i + 1) { } i;",
        "unknown identifier 'i'",
    );
}

// =============================================================================
// Runtime errors
// =============================================================================

#[test]
fn type_mismatch_in_binary_operations() {
    expect_error("1 + \"a\";", "unsupported operand types for '+'");
    expect_error("\"a\" - \"b\";", "unsupported operand types for '-'");
    expect_error("true + false;", "unsupported operand types for '+'");
    expect_error("[1] + [2];", "unsupported operand types for '+'");
    expect_error("\"a\" < \"b\";", "unsupported operand types for '>'");
}

#[test]
fn type_mismatch_in_unary_minus() {
    expect_error("-\"a\";", "'-' not supported on string");
    expect_error("-true;", "'-' not supported on boolean");
}

#[test]
fn division_and_modulo_by_zero() {
    expect_error("5 / 0;", "division by zero");
    expect_error("5 % 0;", "division by zero");
    expect_error("let f = fn(a, b) { a / b; }; f(1, 0);", "division by zero");
}

#[test]
fn arity_mismatch() {
    expect_error("let f = fn(a) { a; }; f(1, 2);", "expected 1, got 2");
    expect_error("let f = fn(a, b) { a; }; f(1);", "expected 2, got 1");
    expect_error("len();", "expected 1, got 0");
    expect_error("len(\"a\", \"b\");", "expected 1, got 2");
}

#[test]
fn calling_a_non_function() {
    expect_error("5(1);", "cannot call value of type integer");
    expect_error("\"f\"();", "cannot call value of type string");
}

#[test]
fn index_assignment_out_of_range() {
    expect_error("let a = [1, 2]; a[5] = 0;", "index 5 out of range");
    expect_error("let a = []; a[0] = 0;", "index 0 out of range");
    expect_error("let a = [1]; a[-1] = 0;", "index -1 out of range");
}

#[test]
fn index_assignment_on_non_array() {
    expect_error("let m = {}; m[0] = 1;", "'index assignment' not supported on map");
    expect_error("let s = \"abc\"; s[0] = 1;", "not supported on string");
}

#[test]
fn indexing_unsupported_types() {
    expect_error("5[0];", "'index' not supported on integer");
    expect_error("[1][\"a\"];", "'index' not supported on string");
}

#[test]
fn unhashable_map_keys() {
    expect_error("{[1]: 2};", "array cannot be used as a map key");
    expect_error("let m = {}; m[[1]];", "array cannot be used as a map key");
}

#[test]
fn builtin_type_errors() {
    expect_error("len(1);", "'len' not supported on integer");
    expect_error("first(\"abc\");", "'first' not supported on string");
    expect_error("push(1, 2);", "'push' not supported on integer");
}

#[test]
fn unbounded_recursion_overflows_the_frame_stack() {
    expect_error("let f = fn() { f(); }; f();", "call stack overflow");
}
