// pepper - An interpreter for the Pepper programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;

use pepper_parser::Parser;
use pepper_vm::{Compiler, ConstantPool, GlobalStore, Object, SymbolTable, VM};

fn main() {
    let args: Vec<String> = env::args().collect();

    // Handle --version flag
    if args.len() == 2 && (args[1] == "--version" || args[1] == "-v") {
        print_version();
        return;
    }

    // If files provided, run them; otherwise start the REPL
    if args.len() > 1 {
        run_files(&args[1..]);
    } else {
        run_repl();
    }
}

fn print_version() {
    println!("Pepper v0.1.0");
}

/// Run a sequence of source files, stopping at the first failure.
fn run_files(files: &[String]) {
    for file_path in files {
        if let Err(e) = run_file(file_path) {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

/// Parse, compile, and execute a single source file.
fn run_file(file_path: &str) -> Result<(), String> {
    let source = fs::read_to_string(file_path)
        .map_err(|e| format!("Error reading '{}': {}", file_path, e))?;

    let program = Parser::parse_source(&source).map_err(|errors| {
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

    Ok(())
}

/// Run the interactive REPL.
///
/// The symbol table, constant pool, and global store survive across
/// submissions so `let` bindings persist between prompts.
fn run_repl() {
    print_version();
    println!("Press CTRL+c to exit");
    println!();

    let mut symbol_table = SymbolTable::new();
    let mut constants = ConstantPool::new();
    let mut globals = GlobalStore::new();

    loop {
        print!(">> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }

                let program = match Parser::parse_source(input) {
                    Ok(program) => program,
                    Err(errors) => {
                        for e in errors {
                            eprintln!("{}", e);
                        }
                        continue;
                    }
                };

                let mut compiler = Compiler::with_state(symbol_table, constants);
                if let Err(e) = compiler.compile_program(&program) {
                    eprintln!("Compile error: {}", e);
                    (symbol_table, constants) = compiler.into_state();
                    continue;
                }
                let chunk = compiler.bytecode();
                (symbol_table, constants) = compiler.into_state();

                let mut vm = VM::new(chunk, &mut globals);
                if let Err(e) = vm.run() {
                    eprintln!("Runtime error: {}", e);
                    continue;
                }

                // Show the result unless it is a function-like value.
                match vm.last_popped() {
                    Object::Closure(_) | Object::CompiledFunction(_) | Object::Builtin(_) => {}
                    other => println!("{}", other),
                }
            }
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }
    }
}
