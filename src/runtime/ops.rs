//! Operator semantics shared by both backends.
//!
//! The evaluator calls these directly from AST nodes; the VM maps opcodes back
//! onto the same functions, so arithmetic, comparison and the error messages
//! they produce cannot diverge between the two execution paths.

use std::rc::Rc;

use crate::ast::{InfixOperator, PrefixOperator};
use crate::runtime::error::RuntimeError;
use crate::runtime::value::Object;

/// `false` and `null` are falsy; every other value, zero included, is truthy.
pub fn is_truthy(value: &Object) -> bool {
    !matches!(value, Object::Boolean(false) | Object::Null)
}

pub fn prefix(operator: PrefixOperator, right: &Object) -> Result<Object, RuntimeError> {
    match operator {
        PrefixOperator::Bang => Ok(Object::from_bool(!is_truthy(right))),
        PrefixOperator::Minus => match right {
            Object::Integer(value) => Ok(Object::Integer(value.wrapping_neg())),
            other => Err(RuntimeError::UnknownPrefixOperator {
                operator,
                operand: other.kind(),
            }),
        },
    }
}

pub fn binary(
    operator: InfixOperator,
    left: &Object,
    right: &Object,
) -> Result<Object, RuntimeError> {
    match (left, right) {
        (Object::Integer(l), Object::Integer(r)) => integer_binary(operator, *l, *r),
        (Object::String(l), Object::String(r))
            if matches!(operator, InfixOperator::Plus | InfixOperator::Shl) =>
        {
            Ok(Object::String(Rc::new(format!("{l}{r}"))))
        }
        (Object::Array(elements), _) if operator == InfixOperator::Shl => {
            let mut appended = elements.as_ref().clone();
            appended.push(right.clone());
            Ok(Object::Array(Rc::new(appended)))
        }
        _ if operator == InfixOperator::Eq => Ok(Object::from_bool(identical(left, right))),
        _ if operator == InfixOperator::NotEq => Ok(Object::from_bool(!identical(left, right))),
        _ if left.kind() != right.kind() => Err(RuntimeError::TypeMismatch {
            left: left.kind(),
            operator,
            right: right.kind(),
        }),
        _ => Err(RuntimeError::UnknownInfixOperator {
            left: left.kind(),
            operator,
            right: right.kind(),
        }),
    }
}

fn integer_binary(operator: InfixOperator, l: i64, r: i64) -> Result<Object, RuntimeError> {
    let value = match operator {
        InfixOperator::Plus => l.wrapping_add(r),
        InfixOperator::Minus => l.wrapping_sub(r),
        InfixOperator::Asterisk => l.wrapping_mul(r),
        InfixOperator::Slash => {
            if r == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            l.wrapping_div(r)
        }
        InfixOperator::Percent => {
            if r == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            l.wrapping_rem(r)
        }
        InfixOperator::Pipe => l | r,
        InfixOperator::Ampersand => l & r,
        InfixOperator::Caret => l ^ r,
        InfixOperator::Shl => l.wrapping_shl(r as u32),
        InfixOperator::Shr => l.wrapping_shr(r as u32),
        InfixOperator::Lt => return Ok(Object::from_bool(l < r)),
        InfixOperator::Gt => return Ok(Object::from_bool(l > r)),
        InfixOperator::Eq => return Ok(Object::from_bool(l == r)),
        InfixOperator::NotEq => return Ok(Object::from_bool(l != r)),
    };
    Ok(Object::Integer(value))
}

/// Identity comparison backing `==`/`!=` for non-integer operands: booleans
/// and null compare by value (they are singletons), heap values by pointer.
fn identical(left: &Object, right: &Object) -> bool {
    match (left, right) {
        (Object::Integer(l), Object::Integer(r)) => l == r,
        (Object::Boolean(l), Object::Boolean(r)) => l == r,
        (Object::Null, Object::Null) => true,
        (Object::String(l), Object::String(r)) => Rc::ptr_eq(l, r),
        (Object::Array(l), Object::Array(r)) => Rc::ptr_eq(l, r),
        (Object::Hash(l), Object::Hash(r)) => Rc::ptr_eq(l, r),
        (Object::Function(l), Object::Function(r)) => Rc::ptr_eq(l, r),
        (Object::CompiledFunction(l), Object::CompiledFunction(r)) => Rc::ptr_eq(l, r),
        (Object::Closure(l), Object::Closure(r)) => Rc::ptr_eq(l, r),
        (Object::Builtin(l), Object::Builtin(r)) => l == r,
        _ => false,
    }
}
