//! Tree-walking backend.
//!
//! Executes the AST directly, single-threaded and recursive. Return values
//! travel as `Object::ReturnValue` wrappers so they escape nested blocks and
//! unwrap at the nearest function body or at the program root; errors
//! short-circuit through `Result`.

use std::rc::Rc;

use crate::ast::{BlockStatement, Expression, Program, Statement};
use crate::builtins::BuiltinFunction;
use crate::runtime::environment::{Env, Environment};
use crate::runtime::error::RuntimeError;
use crate::runtime::ops;
use crate::runtime::value::{Function, HashPair, Object};

pub struct Evaluator {
    /// Lines produced by `puts`, in execution order.
    pub output: Vec<String>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self { output: Vec::new() }
    }

    pub fn eval(&mut self, program: &Program, env: &Env) -> Result<Object, RuntimeError> {
        let mut result = Object::Null;
        for statement in &program.statements {
            match self.eval_statement(statement, env)? {
                Object::ReturnValue(value) => return Ok(*value),
                other => result = other,
            }
        }
        Ok(result)
    }

    fn eval_statement(
        &mut self,
        statement: &Statement,
        env: &Env,
    ) -> Result<Object, RuntimeError> {
        match statement {
            Statement::Let { name, value } => {
                let value = self.eval_expression(value, env)?;
                env.borrow_mut().set(name.clone(), value);
                Ok(Object::Null)
            }
            Statement::Return(value) => {
                let value = self.eval_expression(value, env)?;
                Ok(Object::ReturnValue(Box::new(value)))
            }
            Statement::Expression(expr) => self.eval_expression(expr, env),
        }
    }

    fn eval_block(&mut self, block: &BlockStatement, env: &Env) -> Result<Object, RuntimeError> {
        let mut result = Object::Null;
        for statement in &block.statements {
            result = self.eval_statement(statement, env)?;
            if matches!(result, Object::ReturnValue(_)) {
                // Still wrapped: the enclosing function call or program root
                // unwraps it.
                return Ok(result);
            }
        }
        Ok(result)
    }

    fn eval_expression(&mut self, expr: &Expression, env: &Env) -> Result<Object, RuntimeError> {
        match expr {
            Expression::IntegerLiteral(value) => Ok(Object::Integer(*value)),
            Expression::BooleanLiteral(value) => Ok(Object::from_bool(*value)),
            Expression::StringLiteral(value) => Ok(Object::string(value.clone())),
            Expression::Identifier(name) => self.eval_identifier(name, env),
            Expression::ArrayLiteral(elements) => {
                let elements = self.eval_expressions(elements, env)?;
                Ok(Object::array(elements))
            }
            Expression::HashLiteral(pairs) => self.eval_hash_literal(pairs, env),
            Expression::Prefix { operator, right } => {
                let right = self.eval_expression(right, env)?;
                ops::prefix(*operator, &right)
            }
            Expression::Infix {
                operator,
                left,
                right,
            } => {
                let left = self.eval_expression(left, env)?;
                let right = self.eval_expression(right, env)?;
                ops::binary(*operator, &left, &right)
            }
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.eval_expression(condition, env)?;
                if ops::is_truthy(&condition) {
                    self.eval_block(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.eval_block(alternative, env)
                } else {
                    Ok(Object::Null)
                }
            }
            Expression::FunctionLiteral { parameters, body } => {
                Ok(Object::Function(Rc::new(Function {
                    parameters: parameters.clone(),
                    body: body.clone(),
                    env: env.clone(),
                })))
            }
            Expression::Call {
                function,
                arguments,
            } => {
                let function = self.eval_expression(function, env)?;
                let arguments = self.eval_expressions(arguments, env)?;
                self.apply_function(function, arguments)
            }
            Expression::Index { left, index } => {
                let left = self.eval_expression(left, env)?;
                let index = self.eval_expression(index, env)?;
                self.eval_index(left, index)
            }
        }
    }

    fn eval_expressions(
        &mut self,
        exprs: &[Expression],
        env: &Env,
    ) -> Result<Vec<Object>, RuntimeError> {
        exprs
            .iter()
            .map(|expr| self.eval_expression(expr, env))
            .collect()
    }

    fn eval_identifier(&mut self, name: &str, env: &Env) -> Result<Object, RuntimeError> {
        if let Some(value) = env.borrow().get(name) {
            return Ok(value);
        }
        if let Some(builtin) = BuiltinFunction::lookup(name) {
            return Ok(Object::Builtin(builtin));
        }
        Err(RuntimeError::IdentifierNotFound {
            name: name.to_string(),
        })
    }

    fn apply_function(
        &mut self,
        function: Object,
        arguments: Vec<Object>,
    ) -> Result<Object, RuntimeError> {
        match function {
            Object::Function(function) => {
                // Arity is deliberately not validated: parameters bind
                // positionally, missing ones stay unbound and surface as
                // `identifier not found` when touched.
                let scope = Environment::new_enclosed(function.env.clone());
                for (parameter, argument) in function.parameters.iter().zip(arguments) {
                    scope.borrow_mut().set(parameter.clone(), argument);
                }
                match self.eval_block(&function.body, &scope)? {
                    Object::ReturnValue(value) => Ok(*value),
                    other => Ok(other),
                }
            }
            Object::Builtin(builtin) => builtin.apply(&arguments, &mut self.output),
            other => Err(RuntimeError::NotCallable { kind: other.kind() }),
        }
    }

    fn eval_index(&mut self, left: Object, index: Object) -> Result<Object, RuntimeError> {
        match (&left, &index) {
            (Object::Array(elements), Object::Integer(i)) => {
                if *i < 0 || *i as usize >= elements.len() {
                    return Err(RuntimeError::IndexOutOfBounds);
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

    fn eval_hash_literal(
        &mut self,
        pairs: &[(Expression, Expression)],
        env: &Env,
    ) -> Result<Object, RuntimeError> {
        let mut map = std::collections::BTreeMap::new();
        for (key_expr, value_expr) in pairs {
            let key = self.eval_expression(key_expr, env)?;
            let hash_key = key.hash_key().ok_or(RuntimeError::UnusableHashKey {
                kind: key.kind(),
            })?;
            let value = self.eval_expression(value_expr, env)?;
            map.insert(hash_key, HashPair { key, value });
        }
        Ok(Object::Hash(Rc::new(map)))
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
