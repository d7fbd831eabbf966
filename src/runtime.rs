//! Shared runtime model used by both execution backends.
//!
//! The evaluator and the VM operate on the same `Object` sum and report
//! value-level failures through the same `RuntimeError`; the operator
//! semantics in `ops` are written once so the two backends cannot drift.

pub mod environment;
pub mod error;
pub mod ops;
pub mod value;

pub use environment::{Env, Environment};
pub use error::RuntimeError;
pub use value::{Closure, CompiledFunction, Function, HashKey, HashPair, Object};
