//! Stack-based virtual machine.
//!
//! Runs bytecode on a fixed-size data stack with a separate frame stack. Each
//! frame holds the executing closure, its instruction pointer, and the base
//! pointer marking where the frame's locals live on the data stack. Runtime
//! failures abort `run` and leave the instance unusable.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::ast::{InfixOperator, PrefixOperator};
use crate::builtins::BuiltinFunction;
use crate::bytecode::Opcode;
use crate::compiler::Bytecode;
use crate::runtime::error::RuntimeError;
use crate::runtime::ops;
use crate::runtime::value::{Closure, CompiledFunction, HashPair, Object};

pub const STACK_SIZE: usize = 2048;
pub const GLOBALS_SIZE: usize = 65536;
pub const MAX_FRAMES: usize = 1024;

#[derive(Debug)]
struct Frame {
    closure: Rc<Closure>,
    ip: usize,
    base_pointer: usize,
}

impl Frame {
    fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Self {
            closure,
            ip: 0,
            base_pointer,
        }
    }
}

pub struct VM {
    constants: Vec<Object>,
    stack: Vec<Object>,
    sp: usize,
    globals: Vec<Object>,
    frames: Vec<Frame>,
    /// Lines produced by `puts`, in execution order.
    pub output: Vec<String>,
}

impl VM {
    pub fn new(bytecode: Bytecode) -> Self {
        Self::new_with_globals(bytecode, vec![Object::Null; GLOBALS_SIZE])
    }

    /// Runs against an existing globals store, so a REPL session keeps its
    /// bindings across compilations.
    pub fn new_with_globals(bytecode: Bytecode, globals: Vec<Object>) -> Self {
        let main_function = Rc::new(CompiledFunction {
            instructions: bytecode.instructions,
            num_locals: 0,
            num_parameters: 0,
        });
        let main_closure = Rc::new(Closure {
            function: main_function,
            free: Vec::new(),
        });

        let mut frames = Vec::with_capacity(MAX_FRAMES);
        frames.push(Frame::new(main_closure, 0));

        Self {
            constants: bytecode.constants,
            stack: vec![Object::Null; STACK_SIZE],
            sp: 0,
            globals,
            frames,
            output: Vec::new(),
        }
    }

    pub fn into_globals(self) -> Vec<Object> {
        self.globals
    }

    /// The value most recently popped off the stack; the result of the last
    /// expression statement once `run` finishes.
    pub fn last_popped_stack_elem(&self) -> Object {
        self.stack[self.sp].clone()
    }

    pub fn run(&mut self) -> Result<(), RuntimeError> {
        loop {
            let op = {
                let frame = self.current_frame_mut();
                let instructions = &frame.closure.function.instructions.0;
                if frame.ip >= instructions.len() {
                    break;
                }
                let byte = instructions[frame.ip];
                frame.ip += 1;
                Opcode::lookup(byte)?
            };

            match op {
                Opcode::Constant => {
                    let index = self.fetch_u16();
                    self.push(self.constants[index].clone())?;
                }
                Opcode::Pop => {
                    self.pop();
                }
                Opcode::True => self.push(Object::Boolean(true))?,
                Opcode::False => self.push(Object::Boolean(false))?,
                Opcode::Null => self.push(Object::Null)?,
                Opcode::Add
                | Opcode::Sub
                | Opcode::Mul
                | Opcode::Div
                | Opcode::Mod
                | Opcode::Equal
                | Opcode::NotEqual
                | Opcode::GreaterThan => {
                    let right = self.pop();
                    let left = self.pop();
                    let result = ops::binary(infix_operator_for(op), &left, &right)?;
                    self.push(result)?;
                }
                Opcode::Minus => {
                    let operand = self.pop();
                    let result = ops::prefix(PrefixOperator::Minus, &operand)?;
                    self.push(result)?;
                }
                Opcode::Bang => {
                    let operand = self.pop();
                    let result = ops::prefix(PrefixOperator::Bang, &operand)?;
                    self.push(result)?;
                }
                Opcode::JumpNotTruthy => {
                    let target = self.fetch_u16();
                    let condition = self.pop();
                    if !ops::is_truthy(&condition) {
                        self.current_frame_mut().ip = target;
                    }
                }
                Opcode::Jump => {
                    let target = self.fetch_u16();
                    self.current_frame_mut().ip = target;
                }
                Opcode::SetGlobal => {
                    let index = self.fetch_u16();
                    self.globals[index] = self.pop();
                }
                Opcode::GetGlobal => {
                    let index = self.fetch_u16();
                    self.push(self.globals[index].clone())?;
                }
                Opcode::SetLocal => {
                    let index = self.fetch_u8();
                    let base = self.current_frame().base_pointer;
                    self.stack[base + index] = self.pop();
                }
                Opcode::GetLocal => {
                    let index = self.fetch_u8();
                    let base = self.current_frame().base_pointer;
                    self.push(self.stack[base + index].clone())?;
                }
                Opcode::GetBuiltin => {
                    let index = self.fetch_u8();
                    let builtin = BuiltinFunction::by_index(index as u8)
                        .expect("builtin indices are emitted from the builtin table");
                    self.push(Object::Builtin(builtin))?;
                }
                Opcode::GetFree => {
                    let index = self.fetch_u8();
                    let value = self.current_frame().closure.free[index].clone();
                    self.push(value)?;
                }
                Opcode::Closure => {
                    let const_index = self.fetch_u16();
                    let num_free = self.fetch_u8();
                    self.push_closure(const_index, num_free)?;
                }
                Opcode::CurrentClosure => {
                    let closure = self.current_frame().closure.clone();
                    self.push(Object::Closure(closure))?;
                }
                Opcode::Array => {
                    let count = self.fetch_u16();
                    let elements = self.stack[self.sp - count..self.sp].to_vec();
                    self.sp -= count;
                    self.push(Object::array(elements))?;
                }
                Opcode::Hash => {
                    let count = self.fetch_u16();
                    let hash = self.build_hash(self.sp - count, self.sp)?;
                    self.sp -= count;
                    self.push(hash)?;
                }
                Opcode::Index => {
                    let index = self.pop();
                    let left = self.pop();
                    let result = execute_index(&left, &index)?;
                    self.push(result)?;
                }
                Opcode::Call => {
                    let num_args = self.fetch_u8();
                    self.call(num_args)?;
                }
                Opcode::ReturnValue => {
                    let value = self.pop();
                    let frame = self.frames.pop().expect("a frame is executing");
                    if self.frames.is_empty() {
                        // Top-level return: terminate with the value as the
                        // program result.
                        self.sp = frame.base_pointer;
                        self.stack[self.sp] = value;
                        break;
                    }
                    self.sp = frame.base_pointer - 1;
                    self.push(value)?;
                }
                Opcode::Return => {
                    let frame = self.frames.pop().expect("a frame is executing");
                    if self.frames.is_empty() {
                        self.sp = frame.base_pointer;
                        self.stack[self.sp] = Object::Null;
                        break;
                    }
                    self.sp = frame.base_pointer - 1;
                    self.push(Object::Null)?;
                }
            }
        }

        Ok(())
    }

    fn call(&mut self, num_args: usize) -> Result<(), RuntimeError> {
        let callee = self.stack[self.sp - 1 - num_args].clone();
        match callee {
            Object::Closure(closure) => self.call_closure(closure, num_args),
            Object::Builtin(builtin) => {
                let args = self.stack[self.sp - num_args..self.sp].to_vec();
                let result = builtin.apply(&args, &mut self.output)?;
                self.sp -= num_args + 1;
                self.push(result)
            }
            other => Err(RuntimeError::NotCallable { kind: other.kind() }),
        }
    }

    fn call_closure(
        &mut self,
        closure: Rc<Closure>,
        num_args: usize,
    ) -> Result<(), RuntimeError> {
        if num_args != closure.function.num_parameters {
            return Err(RuntimeError::WrongArity {
                want: closure.function.num_parameters,
                got: num_args,
            });
        }
        if self.frames.len() >= MAX_FRAMES {
            return Err(RuntimeError::CallDepthExceeded);
        }

        let base_pointer = self.sp - num_args;
        let new_sp = base_pointer + closure.function.num_locals;
        if new_sp > STACK_SIZE {
            return Err(RuntimeError::StackOverflow);
        }
        self.frames.push(Frame::new(closure, base_pointer));
        self.sp = new_sp;
        Ok(())
    }

    fn push_closure(&mut self, const_index: usize, num_free: usize) -> Result<(), RuntimeError> {
        let function = match self.constants[const_index].clone() {
            Object::CompiledFunction(function) => function,
            other => return Err(RuntimeError::NotCallable { kind: other.kind() }),
        };
        let free = self.stack[self.sp - num_free..self.sp].to_vec();
        self.sp -= num_free;
        self.push(Object::Closure(Rc::new(Closure { function, free })))
    }

    fn build_hash(&self, start: usize, end: usize) -> Result<Object, RuntimeError> {
        let mut pairs = BTreeMap::new();
        let mut i = start;
        while i < end {
            let key = self.stack[i].clone();
            let value = self.stack[i + 1].clone();
            let hash_key = key.hash_key().ok_or(RuntimeError::UnusableHashKey {
                kind: key.kind(),
            })?;
            pairs.insert(hash_key, HashPair { key, value });
            i += 2;
        }
        Ok(Object::Hash(Rc::new(pairs)))
    }

    fn push(&mut self, value: Object) -> Result<(), RuntimeError> {
        if self.sp >= STACK_SIZE {
            return Err(RuntimeError::StackOverflow);
        }
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Object {
        self.sp -= 1;
        self.stack[self.sp].clone()
    }

    fn fetch_u16(&mut self) -> usize {
        let frame = self.current_frame_mut();
        let bytes = &frame.closure.function.instructions.0;
        let value = u16::from_be_bytes([bytes[frame.ip], bytes[frame.ip + 1]]);
        frame.ip += 2;
        usize::from(value)
    }

    fn fetch_u8(&mut self) -> usize {
        let frame = self.current_frame_mut();
        let value = frame.closure.function.instructions.0[frame.ip];
        frame.ip += 1;
        usize::from(value)
    }

    fn current_frame(&self) -> &Frame {
        self.frames.last().expect("a frame is executing")
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("a frame is executing")
    }
}

fn infix_operator_for(op: Opcode) -> InfixOperator {
    match op {
        Opcode::Add => InfixOperator::Plus,
        Opcode::Sub => InfixOperator::Minus,
        Opcode::Mul => InfixOperator::Asterisk,
        Opcode::Div => InfixOperator::Slash,
        Opcode::Mod => InfixOperator::Percent,
        Opcode::Equal => InfixOperator::Eq,
        Opcode::NotEqual => InfixOperator::NotEq,
        Opcode::GreaterThan => InfixOperator::Gt,
        _ => unreachable!("{} is not a binary opcode", op.name()),
    }
}

/// Indexing in the compiled path: array misses push `null` instead of
/// erroring, unlike the evaluator.
fn execute_index(left: &Object, index: &Object) -> Result<Object, RuntimeError> {
    match (left, index) {
        (Object::Array(elements), Object::Integer(i)) => {
            if *i < 0 || *i as usize >= elements.len() {
                return Ok(Object::Null);
            }
            Ok(elements[*i as usize].clone())
        }
        (Object::Hash(pairs), key) => {
            let hash_key = key.hash_key().ok_or(RuntimeError::UnusableHashKey {
                kind: key.kind(),
            })?;
            Ok(pairs
                .get(&hash_key)
                .map(|pair| pair.value.clone())
                .unwrap_or(Object::Null))
        }
        _ => Err(RuntimeError::UnsupportedIndex { kind: left.kind() }),
    }
}
