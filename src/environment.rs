use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

/// One variable slot. The declared type stays with the slot and is checked
/// again on every later write.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub value: Value,
    pub given_type: Option<String>,
}

/// Name → value store of one scope, chained to the enclosing scope.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
    parent: Option<Rc<RefCell<SymbolTable>>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: HashMap::new(),
            parent: None,
        }
    }

    pub fn with_parent(parent: Rc<RefCell<SymbolTable>>) -> Self {
        SymbolTable {
            symbols: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Looks `name` up in this scope, then in every enclosing one.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.lookup(name).map(|symbol| symbol.value)
    }

    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.symbols.get(name) {
            Some(symbol.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().lookup(name)
        } else {
            None
        }
    }

    /// Declares (or overwrites) `name` in this scope only.
    pub fn set(&mut self, name: &str, value: Value, given_type: Option<String>) {
        debug!("Declaring '{}'", name);

        self.symbols
            .insert(name.to_string(), Symbol { value, given_type });
    }

    /// Replaces the value of an existing variable in the scope that owns it.
    /// Returns `false` when no scope in the chain declares `name`.
    pub fn modify(&mut self, name: &str, value: Value) -> bool {
        if let Some(symbol) = self.symbols.get_mut(name) {
            symbol.value = value;
            true
        } else if let Some(parent) = &self.parent {
            parent.borrow_mut().modify(name, value)
        } else {
            false
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.symbols.remove(name).is_some()
    }

    /// Local scope only.
    pub fn does_exist(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }
}

/// Session-wide store of `define` constants and enums.
#[derive(Debug, Default)]
pub struct ConstantRegistry {
    constants: HashMap<String, Value>,
}

impl ConstantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` (and leaves the registry untouched) when `name` is
    /// already registered.
    pub fn define(&mut self, name: &str, value: Value) -> bool {
        if self.constants.contains_key(name) {
            return false;
        }

        debug!("Registering constant '{}'", name);
        self.constants.insert(name.to_string(), value);

        true
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.constants.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(value: Option<Value>) -> Option<f64> {
        match value {
            Some(Value::Number(n)) => Some(n),
            _ => None,
        }
    }

    #[test]
    fn nested_scope_shadows_without_touching_parent() {
        let outer = Rc::new(RefCell::new(SymbolTable::new()));
        outer.borrow_mut().set("x", Value::Number(1.0), None);

        let mut inner = SymbolTable::with_parent(Rc::clone(&outer));
        inner.set("x", Value::Number(2.0), None);

        assert_eq!(number(inner.get("x")), Some(2.0));
        assert_eq!(number(outer.borrow().get("x")), Some(1.0));
    }

    #[test]
    fn modify_reaches_owning_scope() {
        let outer = Rc::new(RefCell::new(SymbolTable::new()));
        outer.borrow_mut().set("x", Value::Number(1.0), None);

        let mut inner = SymbolTable::with_parent(Rc::clone(&outer));
        assert!(inner.modify("x", Value::Number(5.0)));
        assert!(!inner.does_exist("x"));
        assert_eq!(number(outer.borrow().get("x")), Some(5.0));

        assert!(!inner.modify("missing", Value::None));
    }

    #[test]
    fn remove_is_local() {
        let outer = Rc::new(RefCell::new(SymbolTable::new()));
        outer.borrow_mut().set("x", Value::Number(1.0), None);

        let mut inner = SymbolTable::with_parent(Rc::clone(&outer));
        assert!(!inner.remove("x"));
        assert!(outer.borrow_mut().remove("x"));
        assert!(inner.get("x").is_none());
    }

    #[test]
    fn constants_reject_redefinition() {
        let mut registry = ConstantRegistry::new();

        assert!(registry.define("PI", Value::Number(3.14)));
        assert!(!registry.define("PI", Value::Number(3.0)));
        assert_eq!(number(registry.get("PI")), Some(3.14));
    }
}
