// pepper-vm - Bytecode compiler for the Pepper programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! AST to bytecode compilation.

pub mod codegen;
mod scope;

pub use codegen::{CompileError, Compiler};
