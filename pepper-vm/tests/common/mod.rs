// pepper-vm - Shared test helpers
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Helpers shared by the integration tests: parse, compile, and run a
//! program in one call.

#![allow(dead_code)]

use pepper_parser::Parser;
use pepper_vm::{Compiler, GlobalStore, Object, VM};

/// Parse, compile, and run a program; return the last popped value.
/// Panics on any failure.
pub fn run(src: &str) -> Object {
    match run_result(src) {
        Ok(value) => value,
        Err(e) => panic!("program failed: {} for source: {}", e, src),
    }
}

/// Parse, compile, and run a program, reporting any stage's failure as a
/// prefixed message.
pub fn run_result(src: &str) -> Result<Object, String> {
    let program = Parser::parse_source(src).map_err(|errors| {
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    })?;

    let mut compiler = Compiler::new();
    compiler
        .compile_program(&program)
        .map_err(|e| format!("Compile error: {}", e))?;

    let mut globals = GlobalStore::new();
    let mut vm = VM::new(compiler.bytecode(), &mut globals);
    vm.run().map_err(|e| format!("Runtime error: {}", e))?;
    Ok(vm.last_popped().clone())
}

/// Assert that running `src` fails with a message containing
/// `expected_pattern` (case-insensitive).
pub fn expect_error(src: &str, expected_pattern: &str) {
    match run_result(src) {
        Err(e) => {
            assert!(
                e.to_lowercase().contains(&expected_pattern.to_lowercase()),
                "Error '{}' should contain '{}' for source: {}",
                e,
                expected_pattern,
                src
            );
        }
        Ok(value) => {
            panic!(
                "Expected error containing '{}', but got success: {} for source: {}",
                expected_pattern, value, src
            );
        }
    }
}
