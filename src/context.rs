//! Named execution frames.
//!
//! A [`Context`] wraps one [`SymbolTable`] and remembers the frame it was
//! created from. Display names (`<program>`, `<function f>`, `<Class Foo>`,
//! `<method Foo.bar>` ...) label runtime errors and drive the visibility
//! check for private and protected class members.

use std::cell::RefCell;
use std::rc::Rc;

use crate::environment::{ConstantRegistry, Symbol, SymbolTable};
use crate::value::{ClassRef, Value};

/// The method a frame belongs to; `super` resolves from it.
#[derive(Clone)]
pub struct MethodFrame {
    /// Class whose body declared the executing method.
    pub class: ClassRef,
    pub method: String,
}

pub struct Context {
    pub display_name: String,
    pub parent: Option<Rc<Context>>,
    pub symbols: Rc<RefCell<SymbolTable>>,
    pub constants: Rc<RefCell<ConstantRegistry>>,
    pub method_frame: Option<MethodFrame>,
}

impl Context {
    /// Root frame of a program.
    pub fn root(constants: Rc<RefCell<ConstantRegistry>>) -> Rc<Context> {
        Rc::new(Context {
            display_name: "<program>".to_string(),
            parent: None,
            symbols: Rc::new(RefCell::new(SymbolTable::new())),
            constants,
            method_frame: None,
        })
    }

    /// Child frame with a fresh scope chained to `parent`'s.
    pub fn child<S: Into<String>>(parent: &Rc<Context>, display_name: S) -> Rc<Context> {
        Self::child_with_frame(parent, display_name, None)
    }

    pub fn child_with_frame<S: Into<String>>(
        parent: &Rc<Context>,
        display_name: S,
        method_frame: Option<MethodFrame>,
    ) -> Rc<Context> {
        Rc::new(Context {
            display_name: display_name.into(),
            parent: Some(Rc::clone(parent)),
            symbols: Rc::new(RefCell::new(SymbolTable::with_parent(Rc::clone(
                &parent.symbols,
            )))),
            constants: Rc::clone(&parent.constants),
            method_frame,
        })
    }

    /// Constants first, then the scope chain.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        if let Some(value) = self.constants.borrow().get(name) {
            return Some(Symbol {
                value,
                given_type: None,
            });
        }

        self.symbols.borrow().lookup(name)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.lookup(name).map(|symbol| symbol.value)
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.borrow().contains(name)
    }

    /// Nearest method frame in this context or its ancestors.
    pub fn method_frame(&self) -> Option<MethodFrame> {
        if let Some(frame) = &self.method_frame {
            return Some(frame.clone());
        }

        self.parent.as_ref().and_then(|parent| parent.method_frame())
    }

    /// Is some frame in the chain named `name`?
    pub fn is_inside(&self, name: &str) -> bool {
        if self.display_name == name {
            return true;
        }

        match &self.parent {
            Some(parent) => parent.is_inside(name),
            None => false,
        }
    }
}
