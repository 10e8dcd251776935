// pepper-vm - Runtime value model for the Pepper programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Runtime values.
//!
//! Every datum the VM touches is an [`Object`]. Scalars (null, booleans,
//! integers, strings) compare structurally; arrays, maps, and callable
//! values compare by reference identity. Arrays and maps are shared
//! heap cells with interior mutability so index assignment is visible
//! through every handle.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::builtins::Builtin;

/// A compiled function body: its instruction bytes plus the frame layout
/// the VM needs to execute it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    /// Byte-encoded instructions for this function's body.
    pub instructions: Vec<u8>,
    /// Number of local slots (parameters included) this function's frame
    /// reserves on the value stack.
    pub num_locals: u16,
    /// Number of declared parameters.
    pub num_parameters: u8,
}

/// A compiled function paired with its captured free-variable values.
#[derive(Debug, Clone)]
pub struct Closure {
    pub function: Rc<CompiledFunction>,
    /// Captured values in definition order, indexed by `OP_GET_FREE`.
    pub free: Vec<Object>,
}

/// The hashable subset of [`Object`], used as map keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKey::Integer(n) => write!(f, "{}", n),
            HashKey::Boolean(b) => write!(f, "{}", b),
            HashKey::String(s) => write!(f, "{}", s),
        }
    }
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    String(Rc<str>),
    Array(Rc<RefCell<Vec<Object>>>),
    Map(Rc<RefCell<BTreeMap<HashKey, Object>>>),
    CompiledFunction(Rc<CompiledFunction>),
    Closure(Rc<Closure>),
    Builtin(&'static Builtin),
}

impl Object {
    /// Create a string value.
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Object::String(s.into())
    }

    /// Create an array value.
    pub fn array(elements: Vec<Object>) -> Self {
        Object::Array(Rc::new(RefCell::new(elements)))
    }

    /// Create a map value.
    pub fn map(pairs: BTreeMap<HashKey, Object>) -> Self {
        Object::Map(Rc::new(RefCell::new(pairs)))
    }

    /// `false` and `null` are falsy; everything else (including `0` and
    /// `""`) is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Null | Object::Boolean(false))
    }

    /// The value's type name, for error messages and the `type` builtin.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Boolean(_) => "boolean",
            Object::Integer(_) => "integer",
            Object::String(_) => "string",
            Object::Array(_) => "array",
            Object::Map(_) => "map",
            Object::CompiledFunction(_) => "function",
            Object::Closure(_) => "function",
            Object::Builtin(_) => "builtin",
        }
    }

    /// The value as a map key, or `None` for unhashable variants.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Integer(n) => Some(HashKey::Integer(*n)),
            Object::Boolean(b) => Some(HashKey::Boolean(*b)),
            Object::String(s) => Some(HashKey::String(Rc::clone(s))),
            _ => None,
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::Null, Object::Null) => true,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Integer(a), Object::Integer(b)) => a == b,
            (Object::String(a), Object::String(b)) => a == b,
            // Reference identity for heap values
            (Object::Array(a), Object::Array(b)) => Rc::ptr_eq(a, b),
            (Object::Map(a), Object::Map(b)) => Rc::ptr_eq(a, b),
            (Object::CompiledFunction(a), Object::CompiledFunction(b)) => Rc::ptr_eq(a, b),
            (Object::Closure(a), Object::Closure(b)) => Rc::ptr_eq(a, b),
            (Object::Builtin(a), Object::Builtin(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Null => write!(f, "null"),
            Object::Boolean(b) => write!(f, "{}", b),
            Object::Integer(n) => write!(f, "{}", n),
            Object::String(s) => write!(f, "{}", s),
            Object::Array(elements) => {
                let elements = elements.borrow();
                let parts: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Object::Map(pairs) => {
                let pairs = pairs.borrow();
                let parts: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Object::CompiledFunction(func) => {
                write!(f, "fn/{}", func.num_parameters)
            }
            Object::Closure(closure) => {
                write!(f, "fn/{}", closure.function.num_parameters)
            }
            Object::Builtin(builtin) => write!(f, "builtin {}", builtin.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_equality_is_structural() {
        assert_eq!(Object::Integer(1), Object::Integer(1));
        assert_ne!(Object::Integer(1), Object::Integer(2));
        assert_eq!(Object::string("a"), Object::string("a"));
        assert_eq!(Object::Null, Object::Null);
        // Different types never compare equal
        assert_ne!(Object::Integer(0), Object::Boolean(false));
    }

    #[test]
    fn test_heap_equality_is_identity() {
        let a = Object::array(vec![Object::Integer(1)]);
        let b = Object::array(vec![Object::Integer(1)]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_truthiness() {
        assert!(!Object::Null.is_truthy());
        assert!(!Object::Boolean(false).is_truthy());
        assert!(Object::Boolean(true).is_truthy());
        assert!(Object::Integer(0).is_truthy());
        assert!(Object::string("").is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Object::Null.to_string(), "null");
        assert_eq!(
            Object::array(vec![Object::Integer(1), Object::string("x")]).to_string(),
            "[1, x]"
        );
        let mut pairs = BTreeMap::new();
        pairs.insert(HashKey::String("a".into()), Object::Integer(1));
        assert_eq!(Object::map(pairs).to_string(), "{a: 1}");
    }
}
