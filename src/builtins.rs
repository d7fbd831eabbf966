//! Native functions callable from the language.
//!
//! The table order is load-bearing: `OpGetBuiltin` operands index into
//! `BUILTINS`, so new entries go at the end.

use std::rc::Rc;

use crate::runtime::error::RuntimeError;
use crate::runtime::value::Object;

pub const BUILTINS: [BuiltinFunction; 6] = [
    BuiltinFunction::Len,
    BuiltinFunction::Puts,
    BuiltinFunction::First,
    BuiltinFunction::Last,
    BuiltinFunction::Rest,
    BuiltinFunction::Push,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFunction {
    Len,
    Puts,
    First,
    Last,
    Rest,
    Push,
}

impl BuiltinFunction {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinFunction::Len => "len",
            BuiltinFunction::Puts => "puts",
            BuiltinFunction::First => "first",
            BuiltinFunction::Last => "last",
            BuiltinFunction::Rest => "rest",
            BuiltinFunction::Push => "push",
        }
    }

    pub fn lookup(name: &str) -> Option<Self> {
        BUILTINS
            .iter()
            .copied()
            .find(|builtin| builtin.name() == name)
    }

    pub fn index(self) -> u8 {
        BUILTINS
            .iter()
            .position(|&builtin| builtin == self)
            .expect("every builtin is listed in BUILTINS") as u8
    }

    pub fn by_index(index: u8) -> Option<Self> {
        BUILTINS.get(usize::from(index)).copied()
    }

    /// Invokes the builtin. `puts` appends its lines to `output`; everything
    /// else ignores it.
    pub fn apply(
        self,
        args: &[Object],
        output: &mut Vec<String>,
    ) -> Result<Object, RuntimeError> {
        match self {
            BuiltinFunction::Len => {
                expect_arg_count(args, 1)?;
                match &args[0] {
                    Object::String(value) => Ok(Object::Integer(value.len() as i64)),
                    Object::Array(elements) => Ok(Object::Integer(elements.len() as i64)),
                    other => Err(RuntimeError::UnsupportedArgument {
                        builtin: self.name(),
                        kind: other.kind(),
                    }),
                }
            }
            BuiltinFunction::Puts => {
                for arg in args {
                    output.push(arg.inspect());
                }
                Ok(Object::Null)
            }
            BuiltinFunction::First => {
                expect_arg_count(args, 1)?;
                let elements = expect_array(self, &args[0])?;
                Ok(elements.first().cloned().unwrap_or(Object::Null))
            }
            BuiltinFunction::Last => {
                expect_arg_count(args, 1)?;
                let elements = expect_array(self, &args[0])?;
                Ok(elements.last().cloned().unwrap_or(Object::Null))
            }
            BuiltinFunction::Rest => {
                expect_arg_count(args, 1)?;
                let elements = expect_array(self, &args[0])?;
                if elements.is_empty() {
                    Ok(Object::Null)
                } else {
                    Ok(Object::array(elements[1..].to_vec()))
                }
            }
            BuiltinFunction::Push => {
                expect_arg_count(args, 2)?;
                let elements = expect_array(self, &args[0])?;
                let mut appended = elements.as_ref().clone();
                appended.push(args[1].clone());
                Ok(Object::Array(Rc::new(appended)))
            }
        }
    }
}

fn expect_arg_count(args: &[Object], want: usize) -> Result<(), RuntimeError> {
    if args.len() == want {
        Ok(())
    } else {
        Err(RuntimeError::WrongArgumentCount {
            got: args.len(),
            want,
        })
    }
}

fn expect_array<'v>(
    builtin: BuiltinFunction,
    value: &'v Object,
) -> Result<&'v Rc<Vec<Object>>, RuntimeError> {
    match value {
        Object::Array(elements) => Ok(elements),
        other => Err(RuntimeError::ArgumentNotArray {
            builtin: builtin.name(),
            kind: other.kind(),
        }),
    }
}
