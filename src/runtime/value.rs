//! Runtime values.
//!
//! Heap-backed values are `Rc`-shared: cloning an `Object` is cheap and the
//! language's `==` compares those values by identity, which falls out of
//! `Rc::ptr_eq`. Only integers, booleans and strings are hashable.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::BlockStatement;
use crate::builtins::BuiltinFunction;
use crate::bytecode::Instructions;
use crate::runtime::environment::Env;

/// A user function in the tree-walking backend: parameter names, the body
/// block, and the environment captured when the literal was evaluated.
#[derive(Debug)]
pub struct Function {
    pub parameters: Vec<String>,
    pub body: BlockStatement,
    pub env: Env,
}

/// A function lowered to bytecode. `num_locals` counts every local slot the
/// frame needs, parameters included.
#[derive(Debug, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    pub num_locals: usize,
    pub num_parameters: usize,
}

/// A compiled function paired with the free variables captured at
/// `OpClosure` time.
#[derive(Debug)]
pub struct Closure {
    pub function: Rc<CompiledFunction>,
    pub free: Vec<Object>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashKeyKind {
    Integer,
    Boolean,
    String,
}

/// Hash-map key: a type tag plus a 64-bit value. Integers hash to themselves,
/// booleans to 0/1, strings to an FNV-1a digest of their bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashKey {
    pub kind: HashKeyKind,
    pub value: u64,
}

/// The original key object next to the stored value, so hashes can render
/// their entries.
#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x100_0000_01b3;
    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    Null,
    String(Rc<String>),
    Array(Rc<Vec<Object>>),
    Hash(Rc<BTreeMap<HashKey, HashPair>>),
    Function(Rc<Function>),
    CompiledFunction(Rc<CompiledFunction>),
    Closure(Rc<Closure>),
    Builtin(BuiltinFunction),
    ReturnValue(Box<Object>),
}

impl Object {
    pub fn from_bool(value: bool) -> Self {
        Object::Boolean(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Object::String(Rc::new(value.into()))
    }

    pub fn array(elements: Vec<Object>) -> Self {
        Object::Array(Rc::new(elements))
    }

    /// Type tag used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::Null => "NULL",
            Object::String(_) => "STRING",
            Object::Array(_) => "ARRAY",
            Object::Hash(_) => "HASH",
            Object::Function(_) => "FUNCTION",
            Object::CompiledFunction(_) => "COMPILED_FUNCTION",
            Object::Closure(_) => "CLOSURE",
            Object::Builtin(_) => "BUILTIN",
            Object::ReturnValue(_) => "RETURN_VALUE",
        }
    }

    /// Human-readable rendering, as shown by the REPL and `puts`.
    pub fn inspect(&self) -> String {
        match self {
            Object::Integer(value) => value.to_string(),
            Object::Boolean(value) => value.to_string(),
            Object::Null => "null".to_string(),
            Object::String(value) => value.as_ref().clone(),
            Object::Array(elements) => {
                let rendered = elements
                    .iter()
                    .map(Object::inspect)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{rendered}]")
            }
            Object::Hash(pairs) => {
                let rendered = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key.inspect(), pair.value.inspect()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{rendered}}}")
            }
            Object::Function(function) => {
                format!("fn({}) {}", function.parameters.join(", "), function.body)
            }
            Object::CompiledFunction(function) => {
                format!("CompiledFunction[{:p}]", Rc::as_ptr(function))
            }
            Object::Closure(closure) => format!("Closure[{:p}]", Rc::as_ptr(closure)),
            Object::Builtin(_) => "builtin function".to_string(),
            Object::ReturnValue(value) => value.inspect(),
        }
    }

    /// Hash-map key for this value, if it is a hashable kind.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Integer(value) => Some(HashKey {
                kind: HashKeyKind::Integer,
                value: *value as u64,
            }),
            Object::Boolean(value) => Some(HashKey {
                kind: HashKeyKind::Boolean,
                value: u64::from(*value),
            }),
            Object::String(value) => Some(HashKey {
                kind: HashKeyKind::String,
                value: fnv1a_64(value.as_bytes()),
            }),
            _ => None,
        }
    }
}

impl PartialEq for Object {
    /// Structural equality for data, identity for function values. This is
    /// what tests and container comparisons use; the language-level `==`
    /// operator lives in `ops`.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Integer(l), Object::Integer(r)) => l == r,
            (Object::Boolean(l), Object::Boolean(r)) => l == r,
            (Object::Null, Object::Null) => true,
            (Object::String(l), Object::String(r)) => l == r,
            (Object::Array(l), Object::Array(r)) => l == r,
            (Object::Hash(l), Object::Hash(r)) => l == r,
            (Object::Function(l), Object::Function(r)) => Rc::ptr_eq(l, r),
            (Object::CompiledFunction(l), Object::CompiledFunction(r)) => l == r,
            (Object::Closure(l), Object::Closure(r)) => Rc::ptr_eq(l, r),
            (Object::Builtin(l), Object::Builtin(r)) => l == r,
            (Object::ReturnValue(l), Object::ReturnValue(r)) => l == r,
            _ => false,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inspect())
    }
}
