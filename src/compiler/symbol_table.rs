//! Lexical scope resolution for the compiler.
//!
//! Tables nest through `outer`. Resolving a name that lives in an enclosing
//! function (not global, not builtin) lifts it into the current table as a
//! free symbol, so the compiler knows to capture it when it emits `OpClosure`.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Global,
    Local,
    Builtin,
    Free,
    /// The enclosing function's own name, loaded via `OpCurrentClosure`.
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    pub outer: Option<Box<SymbolTable>>,
    store: HashMap<String, Symbol>,
    pub num_definitions: usize,
    /// Originals of the symbols lifted into this table, in capture order.
    pub free_symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_enclosed(outer: SymbolTable) -> Self {
        SymbolTable {
            outer: Some(Box::new(outer)),
            ..SymbolTable::default()
        }
    }

    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.outer.is_none() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index: self.num_definitions,
        };
        self.store.insert(name.to_string(), symbol.clone());
        self.num_definitions += 1;
        symbol
    }

    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Builtin,
            index,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Function,
            index: 0,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }
        let outer = self.outer.as_mut()?;
        let symbol = outer.resolve(name)?;
        if matches!(symbol.scope, SymbolScope::Global | SymbolScope::Builtin) {
            return Some(symbol);
        }
        Some(self.define_free(symbol))
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        let symbol = Symbol {
            name: original.name.clone(),
            scope: SymbolScope::Free,
            index: self.free_symbols.len(),
        };
        self.free_symbols.push(original);
        self.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(name: &str, scope: SymbolScope, index: usize) -> Symbol {
        Symbol {
            name: name.to_string(),
            scope,
            index,
        }
    }

    #[test]
    fn defines_globals_then_locals() {
        let mut global = SymbolTable::new();
        assert_eq!(global.define("a"), symbol("a", SymbolScope::Global, 0));
        assert_eq!(global.define("b"), symbol("b", SymbolScope::Global, 1));

        let mut local = SymbolTable::new_enclosed(global);
        assert_eq!(local.define("c"), symbol("c", SymbolScope::Local, 0));
        assert_eq!(local.define("d"), symbol("d", SymbolScope::Local, 1));
    }

    #[test]
    fn resolves_globals_through_nested_scopes() {
        let mut global = SymbolTable::new();
        global.define("a");
        global.define("b");

        let first = SymbolTable::new_enclosed(global);
        let mut second = SymbolTable::new_enclosed(first);

        assert_eq!(
            second.resolve("a"),
            Some(symbol("a", SymbolScope::Global, 0))
        );
        assert_eq!(
            second.resolve("b"),
            Some(symbol("b", SymbolScope::Global, 1))
        );
        assert_eq!(second.resolve("missing"), None);
    }

    #[test]
    fn resolves_locals_in_their_own_scope() {
        let mut global = SymbolTable::new();
        global.define("a");

        let mut local = SymbolTable::new_enclosed(global);
        local.define("c");

        assert_eq!(local.resolve("a"), Some(symbol("a", SymbolScope::Global, 0)));
        assert_eq!(local.resolve("c"), Some(symbol("c", SymbolScope::Local, 0)));
    }

    #[test]
    fn lifts_enclosing_locals_into_free_symbols() {
        let mut global = SymbolTable::new();
        global.define("a");

        let mut first = SymbolTable::new_enclosed(global);
        first.define("c");
        first.define("d");

        let mut second = SymbolTable::new_enclosed(first);
        second.define("e");

        assert_eq!(second.resolve("a"), Some(symbol("a", SymbolScope::Global, 0)));
        assert_eq!(second.resolve("c"), Some(symbol("c", SymbolScope::Free, 0)));
        assert_eq!(second.resolve("d"), Some(symbol("d", SymbolScope::Free, 1)));
        assert_eq!(second.resolve("e"), Some(symbol("e", SymbolScope::Local, 0)));

        // The lifted originals keep their defining scope.
        assert_eq!(
            second.free_symbols,
            vec![
                symbol("c", SymbolScope::Local, 0),
                symbol("d", SymbolScope::Local, 1),
            ]
        );
    }

    #[test]
    fn repeated_resolution_reuses_the_free_slot() {
        let mut global = SymbolTable::new();
        global.define("a");

        let first = SymbolTable::new_enclosed(global);
        let mut second = SymbolTable::new_enclosed(first);
        // `a` is global, never lifted.
        second.resolve("a");
        second.resolve("a");
        assert!(second.free_symbols.is_empty());

        let mut outer = SymbolTable::new();
        outer.define("g");
        let mut fun = SymbolTable::new_enclosed(outer);
        fun.define("x");
        let mut inner = SymbolTable::new_enclosed(fun);
        assert_eq!(inner.resolve("x"), Some(symbol("x", SymbolScope::Free, 0)));
        assert_eq!(inner.resolve("x"), Some(symbol("x", SymbolScope::Free, 0)));
        assert_eq!(inner.free_symbols.len(), 1);
    }

    #[test]
    fn builtins_resolve_unchanged_at_any_depth() {
        let mut global = SymbolTable::new();
        global.define_builtin(0, "len");
        global.define_builtin(1, "puts");

        let first = SymbolTable::new_enclosed(global);
        let mut second = SymbolTable::new_enclosed(first);

        assert_eq!(
            second.resolve("len"),
            Some(symbol("len", SymbolScope::Builtin, 0))
        );
        assert_eq!(
            second.resolve("puts"),
            Some(symbol("puts", SymbolScope::Builtin, 1))
        );
        assert!(second.free_symbols.is_empty());
    }

    #[test]
    fn function_name_resolves_to_the_function_scope() {
        let global = SymbolTable::new();
        let mut fun = SymbolTable::new_enclosed(global);
        fun.define_function_name("f");
        assert_eq!(fun.resolve("f"), Some(symbol("f", SymbolScope::Function, 0)));
    }

    #[test]
    fn shadowing_the_function_name_wins() {
        let global = SymbolTable::new();
        let mut fun = SymbolTable::new_enclosed(global);
        fun.define_function_name("f");
        fun.define("f");
        assert_eq!(fun.resolve("f"), Some(symbol("f", SymbolScope::Local, 0)));
    }
}
