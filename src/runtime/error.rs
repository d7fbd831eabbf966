use thiserror::Error;

use crate::ast::{InfixOperator, PrefixOperator};

/// Value-level failures shared by the evaluator and the VM. Every message is
/// surfaced to the user verbatim (the REPL prefixes them with `ERROR: `);
/// nothing here is recoverable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        left: &'static str,
        operator: InfixOperator,
        right: &'static str,
    },
    #[error("unknown operator: {left} {operator} {right}")]
    UnknownInfixOperator {
        left: &'static str,
        operator: InfixOperator,
        right: &'static str,
    },
    #[error("unknown operator: {operator}{operand}")]
    UnknownPrefixOperator {
        operator: PrefixOperator,
        operand: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("identifier not found: {name}")]
    IdentifierNotFound { name: String },
    #[error("not a function: {kind}")]
    NotCallable { kind: &'static str },
    #[error("unusable as hash key: {kind}")]
    UnusableHashKey { kind: &'static str },
    #[error("index out of bounds")]
    IndexOutOfBounds,
    #[error("index operator not supported: {kind}")]
    UnsupportedIndex { kind: &'static str },

    // Builtin argument validation.
    #[error("wrong number of arguments. got={got}, want={want}")]
    WrongArgumentCount { got: usize, want: usize },
    #[error("argument to `{builtin}` not supported, got {kind}")]
    UnsupportedArgument {
        builtin: &'static str,
        kind: &'static str,
    },
    #[error("argument to `{builtin}` must be ARRAY, got {kind}")]
    ArgumentNotArray {
        builtin: &'static str,
        kind: &'static str,
    },

    // VM-only failures.
    #[error("wrong number of arguments: want={want}, got={got}")]
    WrongArity { want: usize, got: usize },
    #[error("stack overflow")]
    StackOverflow,
    #[error("exceeded maximum call depth")]
    CallDepthExceeded,
    #[error("opcode {0} undefined")]
    UndefinedOpcode(u8),
}
