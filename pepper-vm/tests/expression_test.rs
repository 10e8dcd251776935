// pepper-vm - Expression evaluation tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! End-to-end tests for literals, arithmetic, comparison, and logic.

mod common;

use common::run;
use pepper_vm::Object;

#[test]
fn test_integer_arithmetic() {
    assert_eq!(run("1 + 2 * 3;"), Object::Integer(7));
    assert_eq!(run("(1 + 2) * 3;"), Object::Integer(9));
    assert_eq!(run("10 - 2 - 3;"), Object::Integer(5));
    assert_eq!(run("50 / 2 * 2 + 10 - 5;"), Object::Integer(55));
    assert_eq!(run("7 % 3;"), Object::Integer(1));
    assert_eq!(run("-7 % 3;"), Object::Integer(-1));
    assert_eq!(run("-5 + 10;"), Object::Integer(5));
    assert_eq!(run("5 / 2;"), Object::Integer(2));
}

#[test]
fn test_arithmetic_wraps_on_overflow() {
    assert_eq!(
        run("9223372036854775807 + 1;"),
        Object::Integer(i64::MIN)
    );
    assert_eq!(
        run("0 - 9223372036854775807 - 2;"),
        Object::Integer(i64::MAX)
    );
}

#[test]
fn test_boolean_literals_and_comparison() {
    assert_eq!(run("true;"), Object::Boolean(true));
    assert_eq!(run("false;"), Object::Boolean(false));
    assert_eq!(run("1 < 2;"), Object::Boolean(true));
    assert_eq!(run("1 > 2;"), Object::Boolean(false));
    assert_eq!(run("2 <= 2;"), Object::Boolean(true));
    assert_eq!(run("3 >= 4;"), Object::Boolean(false));
    assert_eq!(run("1 == 1;"), Object::Boolean(true));
    assert_eq!(run("1 != 1;"), Object::Boolean(false));
    assert_eq!(run("true == true;"), Object::Boolean(true));
    assert_eq!(run("true != false;"), Object::Boolean(true));
}

#[test]
fn test_equality_across_types_is_false_not_an_error() {
    assert_eq!(run("1 == \"1\";"), Object::Boolean(false));
    assert_eq!(run("1 != \"1\";"), Object::Boolean(true));
    assert_eq!(run("null == false;"), Object::Boolean(false));
    assert_eq!(run("null == null;"), Object::Boolean(true));
}

#[test]
fn test_logical_operators_are_strict_on_truthiness() {
    assert_eq!(run("true && true;"), Object::Boolean(true));
    assert_eq!(run("true && false;"), Object::Boolean(false));
    assert_eq!(run("false || true;"), Object::Boolean(true));
    assert_eq!(run("false || false;"), Object::Boolean(false));
    // Non-boolean operands combine by truthiness
    assert_eq!(run("1 && 2;"), Object::Boolean(true));
    assert_eq!(run("0 && null;"), Object::Boolean(false));
    assert_eq!(run("null || \"\";"), Object::Boolean(true));
}

#[test]
fn test_prefix_operators() {
    assert_eq!(run("-5;"), Object::Integer(-5));
    assert_eq!(run("--5;"), Object::Integer(5));
    assert_eq!(run("!true;"), Object::Boolean(false));
    assert_eq!(run("!null;"), Object::Boolean(true));
    assert_eq!(run("!0;"), Object::Boolean(false));
    assert_eq!(run("!!5;"), Object::Boolean(true));
}

#[test]
fn test_string_literals_and_concatenation() {
    assert_eq!(run("\"hello\";"), Object::string("hello"));
    assert_eq!(run("\"foo\" + \"bar\";"), Object::string("foobar"));
    assert_eq!(
        run("\"a\" + \"b\" + \"c\";"),
        Object::string("abc")
    );
    assert_eq!(run("\"abc\" == \"abc\";"), Object::Boolean(true));
    assert_eq!(run("\"abc\" == \"abd\";"), Object::Boolean(false));
}

#[test]
fn test_null_literal() {
    assert_eq!(run("null;"), Object::Null);
    assert_eq!(run("!null;"), Object::Boolean(true));
}

#[test]
fn test_global_bindings() {
    assert_eq!(run("let x = 5; let y = 10; x + y;"), Object::Integer(15));
    assert_eq!(run("let x = 5; let y = x + x; y;"), Object::Integer(10));
    // Shadowing rebinds
    assert_eq!(run("let x = 1; let x = x + 1; x;"), Object::Integer(2));
}

#[test]
fn test_assignment_statement() {
    assert_eq!(run("let x = 1; x = 42; x;"), Object::Integer(42));
    assert_eq!(run("let x = 1; x = x + 1; x = x * 10; x;"), Object::Integer(20));
}
