// pepper-vm - Host builtin functions for Pepper
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Host-provided builtin functions.
//!
//! Builtins live in a fixed registry; `OP_GET_BUILTIN` refers to them by
//! index, so the table order is part of the bytecode contract.

use std::io::Write;

use crate::object::Object;
use crate::vm::{Result, RuntimeError};

/// Signature of a host builtin: called with the argument slice, returns a
/// result value or a runtime error.
pub type BuiltinFunction = fn(&[Object]) -> Result<Object>;

/// A registered builtin function.
#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFunction,
}

/// The builtin registry. Indices are stable: the compiler burns them into
/// `OP_GET_BUILTIN` operands.
pub static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "len",
        func: builtin_len,
    },
    Builtin {
        name: "puts",
        func: builtin_puts,
    },
    Builtin {
        name: "print",
        func: builtin_print,
    },
    Builtin {
        name: "first",
        func: builtin_first,
    },
    Builtin {
        name: "last",
        func: builtin_last,
    },
    Builtin {
        name: "rest",
        func: builtin_rest,
    },
    Builtin {
        name: "push",
        func: builtin_push,
    },
    Builtin {
        name: "type",
        func: builtin_type,
    },
];

/// Look up a builtin by registry index.
pub fn lookup(index: usize) -> Option<&'static Builtin> {
    BUILTINS.get(index)
}

fn check_arity(args: &[Object], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(RuntimeError::ArityMismatch {
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn builtin_len(args: &[Object]) -> Result<Object> {
    check_arity(args, 1)?;
    match &args[0] {
        Object::String(s) => Ok(Object::Integer(s.len() as i64)),
        Object::Array(elements) => Ok(Object::Integer(elements.borrow().len() as i64)),
        other => Err(RuntimeError::UnsupportedType {
            operation: "len",
            got: other.type_name(),
        }),
    }
}

fn builtin_puts(args: &[Object]) -> Result<Object> {
    let parts: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    println!("{}", parts.join(" "));
    Ok(Object::Null)
}

fn builtin_print(args: &[Object]) -> Result<Object> {
    let parts: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    print!("{}", parts.join(" "));
    let _ = std::io::stdout().flush();
    Ok(Object::Null)
}

fn builtin_first(args: &[Object]) -> Result<Object> {
    check_arity(args, 1)?;
    match &args[0] {
        Object::Array(elements) => Ok(elements.borrow().first().cloned().unwrap_or(Object::Null)),
        other => Err(RuntimeError::UnsupportedType {
            operation: "first",
            got: other.type_name(),
        }),
    }
}

fn builtin_last(args: &[Object]) -> Result<Object> {
    check_arity(args, 1)?;
    match &args[0] {
        Object::Array(elements) => Ok(elements.borrow().last().cloned().unwrap_or(Object::Null)),
        other => Err(RuntimeError::UnsupportedType {
            operation: "last",
            got: other.type_name(),
        }),
    }
}

fn builtin_rest(args: &[Object]) -> Result<Object> {
    check_arity(args, 1)?;
    match &args[0] {
        Object::Array(elements) => {
            let elements = elements.borrow();
            if elements.is_empty() {
                Ok(Object::Null)
            } else {
                Ok(Object::array(elements[1..].to_vec()))
            }
        }
        other => Err(RuntimeError::UnsupportedType {
            operation: "rest",
            got: other.type_name(),
        }),
    }
}

fn builtin_push(args: &[Object]) -> Result<Object> {
    check_arity(args, 2)?;
    match &args[0] {
        Object::Array(elements) => {
            elements.borrow_mut().push(args[1].clone());
            Ok(args[0].clone())
        }
        other => Err(RuntimeError::UnsupportedType {
            operation: "push",
            got: other.type_name(),
        }),
    }
}

fn builtin_type(args: &[Object]) -> Result<Object> {
    check_arity(args, 1)?;
    Ok(Object::string(args[0].type_name()))
}
