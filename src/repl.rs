//! Read-evaluate-print loop.
//!
//! One line of input is one program. State persists across lines: the
//! tree-walking engine keeps its environment, the bytecode engine threads the
//! symbol table, constants pool and globals array through every compilation
//! so earlier bindings stay visible.

use std::mem;

use anyhow::{Result, bail};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::builtins::BUILTINS;
use crate::compiler::Compiler;
use crate::compiler::symbol_table::SymbolTable;
use crate::evaluator::Evaluator;
use crate::parser::parse;
use crate::runtime::{Env, Environment, Object};
use crate::vm::{GLOBALS_SIZE, VM};

const PROMPT: &str = "==> ";

enum Engine {
    Interpreter {
        evaluator: Evaluator,
        env: Env,
    },
    Machine {
        symbol_table: SymbolTable,
        constants: Vec<Object>,
        globals: Vec<Object>,
    },
}

impl Engine {
    fn new(backend_name: &str) -> Result<Self> {
        match backend_name {
            "interpreter" => Ok(Engine::Interpreter {
                evaluator: Evaluator::new(),
                env: Environment::new(),
            }),
            "vm" => {
                let mut symbol_table = SymbolTable::new();
                for (index, builtin) in BUILTINS.iter().enumerate() {
                    symbol_table.define_builtin(index, builtin.name());
                }
                Ok(Engine::Machine {
                    symbol_table,
                    constants: Vec::new(),
                    globals: vec![Object::Null; GLOBALS_SIZE],
                })
            }
            other => bail!("Unknown backend '{other}'"),
        }
    }

    fn run_line(&mut self, line: &str) {
        let program = match parse(line) {
            Ok(program) => program,
            Err(err) => {
                println!("{err}");
                return;
            }
        };

        match self {
            Engine::Interpreter { evaluator, env } => {
                match evaluator.eval(&program, env) {
                    Ok(result) => {
                        for line in evaluator.output.drain(..) {
                            println!("{line}");
                        }
                        println!("{}", result.inspect());
                    }
                    Err(err) => {
                        for line in evaluator.output.drain(..) {
                            println!("{line}");
                        }
                        println!("ERROR: {err}");
                    }
                }
            }
            Engine::Machine {
                symbol_table,
                constants,
                globals,
            } => {
                let mut compiler =
                    Compiler::new_with_state(mem::take(symbol_table), mem::take(constants));
                let compiled = compiler.compile(&program);
                let bytecode = compiler.bytecode();
                (*symbol_table, *constants) = compiler.into_state();
                if let Err(err) = compiled {
                    println!("{err}");
                    return;
                }

                let mut vm = VM::new_with_globals(bytecode, mem::take(globals));
                let outcome = vm.run();
                for line in vm.output.drain(..) {
                    println!("{line}");
                }
                match outcome {
                    Ok(()) => println!("{}", vm.last_popped_stack_elem().inspect()),
                    Err(err) => println!("{err}"),
                }
                *globals = vm.into_globals();
            }
        }
    }
}

pub fn start(backend_name: &str) -> Result<()> {
    let mut engine = Engine::new(backend_name)?;
    let mut editor = DefaultEditor::new()?;

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if line.trim() == "quit" {
                    return Ok(());
                }
                editor.add_history_entry(line.as_str())?;
                engine.run_line(&line);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
            Err(err) => return Err(err.into()),
        }
    }
}
