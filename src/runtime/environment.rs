//! Lexically scoped variable environments for the tree-walking backend.
//!
//! Environments form a tree linked through `outer`; the tree is never
//! restructured after creation, only the local maps grow. Closures keep an
//! `Env` handle to the scope that was live when their literal was evaluated.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runtime::value::Object;

pub type Env = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Object>,
    outer: Option<Env>,
}

impl Environment {
    pub fn new() -> Env {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// A fresh scope whose lookups fall through to `outer`.
    pub fn new_enclosed(outer: Env) -> Env {
        Rc::new(RefCell::new(Environment {
            store: HashMap::new(),
            outer: Some(outer),
        }))
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        if let Some(value) = self.store.get(name) {
            return Some(value.clone());
        }
        self.outer.as_ref().and_then(|outer| outer.borrow().get(name))
    }

    /// Binds in the local scope, shadowing any outer binding of the same name.
    pub fn set(&mut self, name: impl Into<String>, value: Object) {
        self.store.insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_searches_outward() {
        let outer = Environment::new();
        outer.borrow_mut().set("a", Object::Integer(1));

        let inner = Environment::new_enclosed(outer);
        assert_eq!(inner.borrow().get("a"), Some(Object::Integer(1)));
        assert_eq!(inner.borrow().get("missing"), None);
    }

    #[test]
    fn set_writes_into_the_local_scope() {
        let outer = Environment::new();
        outer.borrow_mut().set("a", Object::Integer(1));

        let inner = Environment::new_enclosed(outer.clone());
        inner.borrow_mut().set("a", Object::Integer(2));

        assert_eq!(inner.borrow().get("a"), Some(Object::Integer(2)));
        assert_eq!(outer.borrow().get("a"), Some(Object::Integer(1)));
    }
}
