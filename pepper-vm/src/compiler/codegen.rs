// pepper-vm - Bytecode compiler for the Pepper programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Code generation: single-pass lowering of the AST to bytecode.
//!
//! The compiler drives a depth-first traversal of the AST, resolving names
//! through the [`SymbolTable`] as it goes and emitting byte-encoded
//! instructions into a stack of per-function scopes. Forward jumps are
//! emitted with a zero placeholder and patched in place once their target
//! offset is known.

use std::fmt;
use std::rc::Rc;

use pepper_parser::ast::{
    BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement,
};

use crate::builtins::BUILTINS;
use crate::chunk::{Chunk, ConstantPool};
use crate::object::{CompiledFunction, Object};
use crate::opcode::{self, OpCode};
use crate::symbol_table::{Symbol, SymbolScope, SymbolTable};

use super::scope::{CompilationScope, EmittedInstruction, LoopScope};

/// Error during compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Reference to a name that resolves nowhere.
    UnknownIdentifier(String),
    /// Assignment to something that is not an identifier, an index
    /// expression, or a writable binding.
    InvalidAssignmentTarget,
    /// `break` outside any loop.
    BreakOutsideLoop,
    /// `continue` outside any loop.
    ContinueOutsideLoop,
    /// Constant pool overflow.
    TooManyConstants,
    /// Too many local variables in one function.
    TooManyLocals,
    /// Too many parameters in a function literal.
    TooManyParameters,
    /// Too many arguments at a call site.
    TooManyArguments,
    /// Too many captured variables in one function.
    TooManyFreeVariables,
    /// Array literal too long to encode.
    TooManyArrayElements,
    /// Map literal too long to encode.
    TooManyMapEntries,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnknownIdentifier(name) => {
                write!(f, "unknown identifier '{}'", name)
            }
            CompileError::InvalidAssignmentTarget => write!(f, "invalid assignment target"),
            CompileError::BreakOutsideLoop => write!(f, "'break' outside of a loop"),
            CompileError::ContinueOutsideLoop => write!(f, "'continue' outside of a loop"),
            CompileError::TooManyConstants => write!(f, "too many constants in program"),
            CompileError::TooManyLocals => write!(f, "too many local variables in function"),
            CompileError::TooManyParameters => write!(f, "too many parameters in function"),
            CompileError::TooManyArguments => write!(f, "too many arguments in call"),
            CompileError::TooManyFreeVariables => {
                write!(f, "too many captured variables in function")
            }
            CompileError::TooManyArrayElements => write!(f, "array literal too long"),
            CompileError::TooManyMapEntries => write!(f, "map literal too long"),
        }
    }
}

impl std::error::Error for CompileError {}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

/// The bytecode compiler.
pub struct Compiler {
    constants: ConstantPool,
    symbol_table: SymbolTable,
    /// Per-function scopes, outermost first. Index 0 is the main program.
    scopes: Vec<CompilationScope>,
}

impl Compiler {
    /// Create a compiler with fresh state.
    pub fn new() -> Self {
        Self::with_state(SymbolTable::new(), ConstantPool::new())
    }

    /// Create a compiler that extends existing state, so REPL submissions
    /// keep earlier bindings and constant indices.
    pub fn with_state(mut symbol_table: SymbolTable, constants: ConstantPool) -> Self {
        for (index, builtin) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(index as u16, builtin.name);
        }
        Compiler {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::new()],
        }
    }

    /// Compile a program into the outermost scope.
    pub fn compile_program(&mut self, program: &Program) -> Result<()> {
        for statement in &program.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    /// The compiled program: top-level instructions plus the constant pool.
    pub fn bytecode(&self) -> Chunk {
        Chunk {
            code: self.scopes[0].instructions.clone(),
            constants: self.constants.values().to_vec(),
        }
    }

    /// Surrender the symbol table and constant pool for the next REPL
    /// submission. An aborted compilation may have left function or block
    /// scopes open; they are unwound so the next submission starts clean.
    pub fn into_state(mut self) -> (SymbolTable, ConstantPool) {
        self.symbol_table.unwind_to_global();
        (self.symbol_table, self.constants)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn compile_statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Let { name, value } => {
                self.compile_expression(value)?;
                let symbol = self.symbol_table.define(name);
                self.emit_store(&symbol)
            }

            Statement::Expression { expression } => match expression {
                // Assignment consumes its value, so statement position
                // needs no trailing pop.
                Expression::Assign { target, value } => self.compile_assignment(target, value),
                _ => {
                    self.compile_expression(expression)?;
                    self.emit(OpCode::Pop, &[]);
                    Ok(())
                }
            },

            Statement::Return { value } => {
                match value {
                    Some(value) => {
                        self.compile_expression(value)?;
                        self.emit(OpCode::ReturnValue, &[]);
                    }
                    None => {
                        self.emit(OpCode::Return, &[]);
                    }
                }
                Ok(())
            }

            Statement::While { condition, body } => self.compile_while(condition, body),

            Statement::For {
                init,
                condition,
                post,
                body,
            } => self.compile_for(init.as_deref(), condition.as_ref(), post.as_deref(), body),

            Statement::Break => {
                if self.scope().loops.is_empty() {
                    return Err(CompileError::BreakOutsideLoop);
                }
                let pos = self.emit(OpCode::Jump, &[0]);
                self.current_loop().break_positions.push(pos);
                Ok(())
            }

            Statement::Continue => {
                if self.scope().loops.is_empty() {
                    return Err(CompileError::ContinueOutsideLoop);
                }
                let pos = self.emit(OpCode::Jump, &[0]);
                self.current_loop().continue_positions.push(pos);
                Ok(())
            }
        }
    }

    fn compile_block(&mut self, block: &BlockStatement) -> Result<()> {
        for statement in &block.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    fn compile_while(&mut self, condition: &Expression, body: &BlockStatement) -> Result<()> {
        let condition_pos = self.current_offset();
        self.compile_expression(condition)?;
        let exit_jump = self.emit(OpCode::JumpIfFalse, &[0]);

        self.enter_loop();
        self.compile_block(body)?;
        let loop_scope = self.leave_loop();

        self.emit(OpCode::Jump, &[condition_pos]);
        let end = self.current_offset();

        self.change_operand(exit_jump, end);
        for pos in loop_scope.break_positions {
            self.change_operand(pos, end);
        }
        for pos in loop_scope.continue_positions {
            self.change_operand(pos, condition_pos);
        }
        Ok(())
    }

    /// Lower `for (init; cond; post) body` to `{ init; while (cond) { body;
    /// post; } }`. The block scope confines loop-local `let`s to the loop;
    /// `continue` re-enters at the post statement.
    fn compile_for(
        &mut self,
        init: Option<&Statement>,
        condition: Option<&Expression>,
        post: Option<&Statement>,
        body: &BlockStatement,
    ) -> Result<()> {
        self.symbol_table.push_block_scope();

        let result = (|| -> Result<()> {
            if let Some(init) = init {
                self.compile_statement(init)?;
            }

            let condition_pos = self.current_offset();
            match condition {
                Some(condition) => self.compile_expression(condition)?,
                // An empty condition loops until break.
                None => {
                    self.emit(OpCode::True, &[]);
                }
            }
            let exit_jump = self.emit(OpCode::JumpIfFalse, &[0]);

            self.enter_loop();
            self.compile_block(body)?;
            let loop_scope = self.leave_loop();

            let post_pos = self.current_offset();
            if let Some(post) = post {
                self.compile_statement(post)?;
            }
            self.emit(OpCode::Jump, &[condition_pos]);
            let end = self.current_offset();

            self.change_operand(exit_jump, end);
            for pos in loop_scope.break_positions {
                self.change_operand(pos, end);
            }
            for pos in loop_scope.continue_positions {
                self.change_operand(pos, post_pos);
            }
            Ok(())
        })();

        self.symbol_table.pop_scope();
        result
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn compile_expression(&mut self, expression: &Expression) -> Result<()> {
        match expression {
            Expression::Identifier(name) => {
                let symbol = self
                    .symbol_table
                    .resolve(name)
                    .ok_or_else(|| CompileError::UnknownIdentifier(name.clone()))?;
                self.load_symbol(&symbol)
            }

            Expression::IntegerLiteral(n) => {
                let idx = self.add_constant(Object::Integer(*n))?;
                self.emit(OpCode::Constant, &[idx as usize]);
                Ok(())
            }

            Expression::StringLiteral(s) => {
                let idx = self.add_constant(Object::string(s.as_str()))?;
                self.emit(OpCode::Constant, &[idx as usize]);
                Ok(())
            }

            Expression::BooleanLiteral(true) => {
                self.emit(OpCode::True, &[]);
                Ok(())
            }
            Expression::BooleanLiteral(false) => {
                self.emit(OpCode::False, &[]);
                Ok(())
            }
            Expression::NullLiteral => {
                self.emit(OpCode::Null, &[]);
                Ok(())
            }

            Expression::Prefix { operator, right } => {
                self.compile_expression(right)?;
                match operator {
                    PrefixOperator::Minus => self.emit(OpCode::Minus, &[]),
                    PrefixOperator::Bang => self.emit(OpCode::Bang, &[]),
                };
                Ok(())
            }

            Expression::Infix {
                operator,
                left,
                right,
            } => self.compile_infix(*operator, left, right),

            Expression::If {
                condition,
                consequence,
                alternative,
            } => self.compile_if(condition, consequence, alternative.as_ref()),

            Expression::Function {
                name,
                parameters,
                body,
            } => self.compile_function(name.as_deref(), parameters, body),

            Expression::Call {
                function,
                arguments,
            } => {
                self.compile_expression(function)?;
                if arguments.len() > u8::MAX as usize {
                    return Err(CompileError::TooManyArguments);
                }
                for argument in arguments {
                    self.compile_expression(argument)?;
                }
                self.emit(OpCode::Call, &[arguments.len()]);
                Ok(())
            }

            Expression::Array(elements) => {
                if elements.len() > u16::MAX as usize {
                    return Err(CompileError::TooManyArrayElements);
                }
                for element in elements {
                    self.compile_expression(element)?;
                }
                self.emit(OpCode::Array, &[elements.len()]);
                Ok(())
            }

            Expression::Map(pairs) => {
                if pairs.len() * 2 > u16::MAX as usize {
                    return Err(CompileError::TooManyMapEntries);
                }
                for (key, value) in pairs {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(OpCode::Hash, &[pairs.len() * 2]);
                Ok(())
            }

            Expression::Index { left, index } => {
                self.compile_expression(left)?;
                self.compile_expression(index)?;
                self.emit(OpCode::Index, &[]);
                Ok(())
            }

            // Assignment used for its value: store, then yield null.
            Expression::Assign { target, value } => {
                self.compile_assignment(target, value)?;
                self.emit(OpCode::Null, &[]);
                Ok(())
            }
        }
    }

    fn compile_infix(
        &mut self,
        operator: InfixOperator,
        left: &Expression,
        right: &Expression,
    ) -> Result<()> {
        // The VM only carries greater-than comparisons; `<` and `<=`
        // compile to the swapped operand order.
        if matches!(operator, InfixOperator::Lt | InfixOperator::LtEq) {
            self.compile_expression(right)?;
            self.compile_expression(left)?;
            let op = if operator == InfixOperator::Lt {
                OpCode::Gt
            } else {
                OpCode::GtEq
            };
            self.emit(op, &[]);
            return Ok(());
        }

        self.compile_expression(left)?;
        self.compile_expression(right)?;
        let op = match operator {
            InfixOperator::Add => OpCode::Add,
            InfixOperator::Sub => OpCode::Sub,
            InfixOperator::Mul => OpCode::Mul,
            InfixOperator::Div => OpCode::Div,
            InfixOperator::Mod => OpCode::Mod,
            InfixOperator::Eq => OpCode::Eq,
            InfixOperator::NotEq => OpCode::NotEq,
            InfixOperator::Gt => OpCode::Gt,
            InfixOperator::GtEq => OpCode::GtEq,
            InfixOperator::And => OpCode::And,
            InfixOperator::Or => OpCode::Or,
            InfixOperator::Lt | InfixOperator::LtEq => unreachable!("handled above"),
        };
        self.emit(op, &[]);
        Ok(())
    }

    fn compile_if(
        &mut self,
        condition: &Expression,
        consequence: &BlockStatement,
        alternative: Option<&BlockStatement>,
    ) -> Result<()> {
        self.compile_expression(condition)?;
        let jump_not_truthy = self.emit(OpCode::JumpIfFalse, &[0]);

        self.compile_block(consequence)?;
        self.finish_branch();
        let jump_end = self.emit(OpCode::Jump, &[0]);

        self.patch_jump(jump_not_truthy);
        match alternative {
            Some(alternative) => {
                self.compile_block(alternative)?;
                self.finish_branch();
            }
            None => {
                self.emit(OpCode::Null, &[]);
            }
        }
        self.patch_jump(jump_end);
        Ok(())
    }

    /// Close an `if` branch so it yields exactly one value: elide a
    /// trailing pop to keep the branch's expression value, or push null
    /// when the branch ends in a statement that leaves nothing behind.
    fn finish_branch(&mut self) {
        if self.last_instruction_is(OpCode::Pop) {
            self.remove_last_pop();
        } else {
            self.emit(OpCode::Null, &[]);
        }
    }

    fn compile_function(
        &mut self,
        name: Option<&str>,
        parameters: &[String],
        body: &BlockStatement,
    ) -> Result<()> {
        if parameters.len() > u8::MAX as usize {
            return Err(CompileError::TooManyParameters);
        }

        self.enter_scope();
        if let Some(name) = name {
            self.symbol_table.define_function_name(name);
        }
        for parameter in parameters {
            self.symbol_table.define(parameter);
        }

        self.compile_block(body)?;

        // An implicit return of the last expression value, or null.
        if self.last_instruction_is(OpCode::Pop) {
            self.replace_last_pop_with_return();
        }
        if !self.last_instruction_is(OpCode::ReturnValue)
            && !self.last_instruction_is(OpCode::Return)
        {
            self.emit(OpCode::Return, &[]);
        }

        let (instructions, symbol_scope) = self.leave_scope();
        let num_locals = symbol_scope.num_definitions();
        let free_symbols = symbol_scope.free_symbols().to_vec();

        if num_locals as usize > u8::MAX as usize + 1 {
            return Err(CompileError::TooManyLocals);
        }
        if free_symbols.len() > u8::MAX as usize {
            return Err(CompileError::TooManyFreeVariables);
        }

        // Load each captured value in the enclosing scope so the closure
        // finds its free variables on the stack.
        for symbol in &free_symbols {
            self.load_symbol(symbol)?;
        }

        let function = Object::CompiledFunction(Rc::new(CompiledFunction {
            instructions,
            num_locals,
            num_parameters: parameters.len() as u8,
        }));
        let idx = self.add_constant(function)?;
        self.emit(OpCode::Closure, &[idx as usize, free_symbols.len()]);
        Ok(())
    }

    fn compile_assignment(&mut self, target: &Expression, value: &Expression) -> Result<()> {
        match target {
            Expression::Identifier(name) => {
                self.compile_expression(value)?;
                let symbol = self
                    .symbol_table
                    .resolve(name)
                    .ok_or_else(|| CompileError::UnknownIdentifier(name.clone()))?;
                self.emit_store(&symbol)
            }
            Expression::Index { left, index } => {
                self.compile_expression(value)?;
                self.compile_expression(left)?;
                self.compile_expression(index)?;
                self.emit(OpCode::SetIndex, &[]);
                Ok(())
            }
            _ => Err(CompileError::InvalidAssignmentTarget),
        }
    }

    // ========================================================================
    // Symbol access
    // ========================================================================

    fn load_symbol(&mut self, symbol: &Symbol) -> Result<()> {
        match symbol.scope {
            SymbolScope::Global => {
                self.emit(OpCode::GetGlobal, &[symbol.index as usize]);
            }
            SymbolScope::Local => {
                if symbol.index > u8::MAX as u16 {
                    return Err(CompileError::TooManyLocals);
                }
                self.emit(OpCode::GetLocal, &[symbol.index as usize]);
            }
            SymbolScope::Free => {
                self.emit(OpCode::GetFree, &[symbol.index as usize]);
            }
            SymbolScope::Builtin => {
                self.emit(OpCode::GetBuiltin, &[symbol.index as usize]);
            }
            SymbolScope::Function => {
                self.emit(OpCode::CurrentClosure, &[]);
            }
        }
        Ok(())
    }

    fn emit_store(&mut self, symbol: &Symbol) -> Result<()> {
        match symbol.scope {
            SymbolScope::Global => {
                self.emit(OpCode::SetGlobal, &[symbol.index as usize]);
                Ok(())
            }
            SymbolScope::Local => {
                if symbol.index > u8::MAX as u16 {
                    return Err(CompileError::TooManyLocals);
                }
                self.emit(OpCode::SetLocal, &[symbol.index as usize]);
                Ok(())
            }
            // Captured, builtin, and self-reference bindings are read-only.
            _ => Err(CompileError::InvalidAssignmentTarget),
        }
    }

    // ========================================================================
    // Emission helpers
    // ========================================================================

    fn scope(&self) -> &CompilationScope {
        self.scopes.last().expect("scope stack is never empty")
    }

    fn scope_mut(&mut self) -> &mut CompilationScope {
        self.scopes.last_mut().expect("scope stack is never empty")
    }

    fn current_offset(&self) -> usize {
        self.scope().instructions.len()
    }

    fn emit(&mut self, op: OpCode, operands: &[usize]) -> usize {
        let instruction = opcode::make(op, operands);
        let scope = self.scope_mut();
        let position = scope.instructions.len();
        scope.instructions.extend_from_slice(&instruction);
        scope.previous_instruction = scope.last_instruction;
        scope.last_instruction = Some(EmittedInstruction {
            opcode: op,
            position,
        });
        position
    }

    fn add_constant(&mut self, value: Object) -> Result<u16> {
        self.constants.add(value).ok_or(CompileError::TooManyConstants)
    }

    fn last_instruction_is(&self, op: OpCode) -> bool {
        matches!(self.scope().last_instruction, Some(last) if last.opcode == op)
    }

    /// Drop the trailing `OP_POP` so the preceding expression's value stays
    /// on the stack.
    fn remove_last_pop(&mut self) {
        let scope = self.scope_mut();
        if let Some(last) = scope.last_instruction {
            scope.instructions.truncate(last.position);
            scope.last_instruction = scope.previous_instruction.take();
        }
    }

    /// Rewrite the trailing `OP_POP` into `OP_RETURN_VALUE` (both are one
    /// byte, so this is an in-place overwrite).
    fn replace_last_pop_with_return(&mut self) {
        let scope = self.scope_mut();
        if let Some(last) = &mut scope.last_instruction {
            scope.instructions[last.position] = OpCode::ReturnValue as u8;
            last.opcode = OpCode::ReturnValue;
        }
    }

    /// Overwrite the operand of the instruction at `position` in place.
    fn change_operand(&mut self, position: usize, operand: usize) {
        let scope = self.scope_mut();
        let op = OpCode::from_byte(scope.instructions[position])
            .expect("patch target is a previously emitted opcode");
        let instruction = opcode::make(op, &[operand]);
        scope.instructions[position..position + instruction.len()]
            .copy_from_slice(&instruction);
    }

    /// Point the jump at `position` to the current end of the buffer.
    fn patch_jump(&mut self, position: usize) {
        let target = self.current_offset();
        self.change_operand(position, target);
    }

    fn enter_loop(&mut self) {
        self.scope_mut().loops.push(LoopScope::default());
    }

    fn leave_loop(&mut self) -> LoopScope {
        self.scope_mut()
            .loops
            .pop()
            .expect("leave_loop is only called after enter_loop")
    }

    fn current_loop(&mut self) -> &mut LoopScope {
        self.scope_mut()
            .loops
            .last_mut()
            .expect("loop presence is checked before use")
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::new());
        self.symbol_table.push_scope();
    }

    fn leave_scope(&mut self) -> (Vec<u8>, crate::symbol_table::Scope) {
        let scope = self.scopes.pop().expect("scope stack is never empty");
        let symbol_scope = self.symbol_table.pop_scope();
        (scope.instructions, symbol_scope)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
