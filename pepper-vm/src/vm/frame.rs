// pepper-vm - Call frames for the Pepper VM
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Call frames: one per active closure invocation.

use std::rc::Rc;

use crate::object::Closure;

/// A call frame on the VM's frame stack.
#[derive(Debug)]
pub struct Frame {
    /// The closure being executed.
    pub closure: Rc<Closure>,

    /// Instruction pointer: byte offset into the closure's instructions.
    pub ip: usize,

    /// Value-stack index where this frame's local slots begin.
    pub base_pointer: usize,
}

impl Frame {
    /// Create a frame starting at the function's first instruction.
    pub fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Frame {
            closure,
            ip: 0,
            base_pointer,
        }
    }

    /// The instruction bytes this frame executes.
    #[inline]
    pub fn instructions(&self) -> &[u8] {
        &self.closure.function.instructions
    }
}
