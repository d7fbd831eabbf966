//! AST to bytecode lowering.
//!
//! The compiler keeps a stack of compilation scopes, one per function literal
//! being compiled, each with its own instruction buffer and a record of the
//! last two emitted instructions for peephole decisions (dropping a trailing
//! `OpPop`, rewriting it to `OpReturnValue`). Jumps are emitted with a
//! placeholder operand and back-patched once the target offset is known.
//! The constants pool and symbol table are shared across scopes.

use std::mem;
use std::rc::Rc;

use thiserror::Error;

use crate::ast::{
    BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::builtins::BUILTINS;
use crate::bytecode::{Instructions, Opcode, make};
use crate::runtime::value::{CompiledFunction, Object};

pub mod symbol_table;

use symbol_table::{Symbol, SymbolScope, SymbolTable};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("undefined variable {name}")]
    UndefinedVariable { name: String },
    #[error("unknown operator {operator}")]
    UnknownOperator { operator: InfixOperator },
}

/// Compiler output: the top-level instruction stream plus the constants pool
/// shared by every compiled function.
#[derive(Debug, Clone, PartialEq)]
pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Object>,
}

#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    opcode: Opcode,
    position: usize,
}

#[derive(Debug, Default)]
struct CompilationScope {
    instructions: Instructions,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

pub struct Compiler {
    constants: Vec<Object>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (index, builtin) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(index, builtin.name());
        }
        Self {
            constants: Vec::new(),
            symbol_table,
            scopes: vec![CompilationScope::default()],
        }
    }

    /// Continues a previous compilation session: the REPL threads the symbol
    /// table and constants pool through so bindings survive across lines.
    pub fn new_with_state(symbol_table: SymbolTable, constants: Vec<Object>) -> Self {
        Self {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::default()],
        }
    }

    pub fn into_state(self) -> (SymbolTable, Vec<Object>) {
        (self.symbol_table, self.constants)
    }

    pub fn compile(&mut self, program: &Program) -> Result<(), CompileError> {
        for statement in &program.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.current_scope().instructions.clone(),
            constants: self.constants.clone(),
        }
    }

    fn compile_statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
        match statement {
            Statement::Expression(expr) => {
                self.compile_expression(expr)?;
                self.emit(Opcode::Pop, &[]);
            }
            Statement::Let { name, value } => {
                // Define before compiling the value so a function literal can
                // refer to itself by name.
                let symbol = self.symbol_table.define(name);
                if let Expression::FunctionLiteral { parameters, body } = value {
                    self.compile_function_literal(parameters, body, Some(name))?;
                } else {
                    self.compile_expression(value)?;
                }
                match symbol.scope {
                    SymbolScope::Global => self.emit(Opcode::SetGlobal, &[symbol.index]),
                    _ => self.emit(Opcode::SetLocal, &[symbol.index]),
                };
            }
            Statement::Return(value) => {
                self.compile_expression(value)?;
                self.emit(Opcode::ReturnValue, &[]);
            }
        }
        Ok(())
    }

    fn compile_block(&mut self, block: &BlockStatement) -> Result<(), CompileError> {
        for statement in &block.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    fn compile_expression(&mut self, expr: &Expression) -> Result<(), CompileError> {
        match expr {
            Expression::IntegerLiteral(value) => {
                let index = self.add_constant(Object::Integer(*value));
                self.emit(Opcode::Constant, &[index]);
            }
            Expression::StringLiteral(value) => {
                let index = self.add_constant(Object::string(value.clone()));
                self.emit(Opcode::Constant, &[index]);
            }
            Expression::BooleanLiteral(true) => {
                self.emit(Opcode::True, &[]);
            }
            Expression::BooleanLiteral(false) => {
                self.emit(Opcode::False, &[]);
            }
            Expression::Identifier(name) => {
                let symbol = self.symbol_table.resolve(name).ok_or_else(|| {
                    CompileError::UndefinedVariable { name: name.clone() }
                })?;
                self.load_symbol(&symbol);
            }
            Expression::Prefix { operator, right } => {
                self.compile_expression(right)?;
                match operator {
                    PrefixOperator::Bang => self.emit(Opcode::Bang, &[]),
                    PrefixOperator::Minus => self.emit(Opcode::Minus, &[]),
                };
            }
            Expression::Infix {
                operator,
                left,
                right,
            } => {
                // No less-than opcode: compile operands swapped and reuse
                // OpGreaterThan.
                if *operator == InfixOperator::Lt {
                    self.compile_expression(right)?;
                    self.compile_expression(left)?;
                    self.emit(Opcode::GreaterThan, &[]);
                    return Ok(());
                }
                self.compile_expression(left)?;
                self.compile_expression(right)?;
                let opcode = match operator {
                    InfixOperator::Plus => Opcode::Add,
                    InfixOperator::Minus => Opcode::Sub,
                    InfixOperator::Asterisk => Opcode::Mul,
                    InfixOperator::Slash => Opcode::Div,
                    InfixOperator::Percent => Opcode::Mod,
                    InfixOperator::Gt => Opcode::GreaterThan,
                    InfixOperator::Eq => Opcode::Equal,
                    InfixOperator::NotEq => Opcode::NotEqual,
                    other => return Err(CompileError::UnknownOperator { operator: *other }),
                };
                self.emit(opcode, &[]);
            }
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                self.compile_expression(condition)?;

                let jump_not_truthy = self.emit(Opcode::JumpNotTruthy, &[9999]);
                self.compile_block(consequence)?;
                if self.last_instruction_is(Opcode::Pop) {
                    self.remove_last_pop();
                }

                let jump = self.emit(Opcode::Jump, &[9999]);
                let after_consequence = self.current_scope().instructions.len();
                self.change_operand(jump_not_truthy, after_consequence);

                match alternative {
                    Some(alternative) => {
                        self.compile_block(alternative)?;
                        if self.last_instruction_is(Opcode::Pop) {
                            self.remove_last_pop();
                        }
                    }
                    None => {
                        self.emit(Opcode::Null, &[]);
                    }
                }
                let after_alternative = self.current_scope().instructions.len();
                self.change_operand(jump, after_alternative);
            }
            Expression::ArrayLiteral(elements) => {
                for element in elements {
                    self.compile_expression(element)?;
                }
                self.emit(Opcode::Array, &[elements.len()]);
            }
            Expression::HashLiteral(pairs) => {
                for (key, value) in pairs {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(Opcode::Hash, &[pairs.len() * 2]);
            }
            Expression::Index { left, index } => {
                self.compile_expression(left)?;
                self.compile_expression(index)?;
                self.emit(Opcode::Index, &[]);
            }
            Expression::FunctionLiteral { parameters, body } => {
                self.compile_function_literal(parameters, body, None)?;
            }
            Expression::Call {
                function,
                arguments,
            } => {
                self.compile_expression(function)?;
                for argument in arguments {
                    self.compile_expression(argument)?;
                }
                self.emit(Opcode::Call, &[arguments.len()]);
            }
        }
        Ok(())
    }

    fn compile_function_literal(
        &mut self,
        parameters: &[String],
        body: &BlockStatement,
        name: Option<&str>,
    ) -> Result<(), CompileError> {
        self.enter_scope();

        if let Some(name) = name {
            self.symbol_table.define_function_name(name);
        }
        for parameter in parameters {
            self.symbol_table.define(parameter);
        }

        self.compile_block(body)?;

        if self.last_instruction_is(Opcode::Pop) {
            self.replace_last_pop_with_return();
        }
        if !self.last_instruction_is(Opcode::ReturnValue) {
            self.emit(Opcode::Return, &[]);
        }

        let free_symbols = self.symbol_table.free_symbols.clone();
        let num_locals = self.symbol_table.num_definitions;
        let instructions = self.leave_scope();

        for free in &free_symbols {
            self.load_symbol(free);
        }

        let index = self.add_constant(Object::CompiledFunction(Rc::new(CompiledFunction {
            instructions,
            num_locals,
            num_parameters: parameters.len(),
        })));
        self.emit(Opcode::Closure, &[index, free_symbols.len()]);
        Ok(())
    }

    fn load_symbol(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(Opcode::GetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(Opcode::GetLocal, &[symbol.index]),
            SymbolScope::Builtin => self.emit(Opcode::GetBuiltin, &[symbol.index]),
            SymbolScope::Free => self.emit(Opcode::GetFree, &[symbol.index]),
            SymbolScope::Function => self.emit(Opcode::CurrentClosure, &[]),
        };
    }

    fn add_constant(&mut self, value: Object) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    fn emit(&mut self, op: Opcode, operands: &[usize]) -> usize {
        let encoded = make(op, operands);
        let scope = self.current_scope_mut();
        let position = scope.instructions.len();
        scope.instructions.push(&encoded);
        scope.previous_instruction = scope.last_instruction;
        scope.last_instruction = Some(EmittedInstruction {
            opcode: op,
            position,
        });
        position
    }

    fn last_instruction_is(&self, op: Opcode) -> bool {
        self.current_scope()
            .last_instruction
            .is_some_and(|last| last.opcode == op)
    }

    fn remove_last_pop(&mut self) {
        let scope = self.current_scope_mut();
        let last = scope.last_instruction.expect("last instruction tracked");
        scope.instructions.0.truncate(last.position);
        scope.last_instruction = scope.previous_instruction;
    }

    fn replace_last_pop_with_return(&mut self) {
        let scope = self.current_scope_mut();
        let last = scope
            .last_instruction
            .as_mut()
            .expect("last instruction tracked");
        scope.instructions.0[last.position] = Opcode::ReturnValue as u8;
        last.opcode = Opcode::ReturnValue;
    }

    /// Overwrites the 16-bit operand of the jump emitted at `position`.
    fn change_operand(&mut self, position: usize, operand: usize) {
        let bytes = (operand as u16).to_be_bytes();
        let instructions = &mut self.current_scope_mut().instructions.0;
        instructions[position + 1] = bytes[0];
        instructions[position + 2] = bytes[1];
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        let outer = mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> Instructions {
        let scope = self.scopes.pop().expect("scope stack is never empty");
        let table = mem::take(&mut self.symbol_table);
        self.symbol_table = *table.outer.expect("enclosed scope has an outer table");
        scope.instructions
    }

    fn current_scope(&self) -> &CompilationScope {
        self.scopes.last().expect("scope stack is never empty")
    }

    fn current_scope_mut(&mut self) -> &mut CompilationScope {
        self.scopes.last_mut().expect("scope stack is never empty")
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
