//! Execution backends behind a common interface.
//!
//! Both backends take the same parsed program and report the value of the
//! last expression plus the `puts` output, which is what the CLI prints and
//! what the fixture harness compares across backends.

use anyhow::Result;

use crate::ast::Program;
use crate::compiler::Compiler;
use crate::evaluator::Evaluator;
use crate::runtime::{Environment, Object};
use crate::vm::VM;

#[derive(Debug)]
pub struct Execution {
    pub result: Object,
    pub output: Vec<String>,
}

pub trait Backend {
    fn name(&self) -> &'static str;
    fn run(&mut self, program: &Program) -> Result<Execution>;
}

pub fn backends() -> Vec<Box<dyn Backend>> {
    vec![Box::new(Interpreter::new()), Box::new(Machine::new())]
}

/// Tree-walking backend: a fresh evaluator and environment per run.
pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for Interpreter {
    fn name(&self) -> &'static str {
        "interpreter"
    }

    fn run(&mut self, program: &Program) -> Result<Execution> {
        let mut evaluator = Evaluator::new();
        let env = Environment::new();
        let result = evaluator.eval(program, &env)?;
        Ok(Execution {
            result,
            output: evaluator.output,
        })
    }
}

/// Bytecode backend: compile, then run the VM to completion.
pub struct Machine;

impl Machine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for Machine {
    fn name(&self) -> &'static str {
        "vm"
    }

    fn run(&mut self, program: &Program) -> Result<Execution> {
        let mut compiler = Compiler::new();
        compiler.compile(program)?;
        let mut vm = VM::new(compiler.bytecode());
        vm.run()?;
        let result = vm.last_popped_stack_elem();
        Ok(Execution {
            result,
            output: vm.output,
        })
    }
}
