//! Runtime values.
//!
//! Scalars (`Number`, `String`, `Boolean`, `None`) are plain data and are
//! copied on every read. Lists, dictionaries and class objects live behind
//! `Rc<RefCell<..>>`, so cloning a [`Value`] clones the *handle*: every
//! alias observes mutations made through any other. [`Value::deep_clone`]
//! is the only way to break that sharing.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::ast::{FuncDef, Visibility};
use crate::context::Context;
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::position::Span;

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type DictRef = Rc<RefCell<OrderedMap<Value>>>;
pub type ClassRef = Rc<RefCell<ClassObject>>;

/// Host callable: receives the interpreter, the evaluated arguments and the
/// span of the call site.
pub type NativeFn = fn(&mut Interpreter, &[Value], Span) -> Result<Value>;

#[derive(Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    None,
    List(ListRef),
    Dict(DictRef),
    Function(Rc<Function>),
    NativeFunction(Rc<NativeFunction>),
    Class(ClassRef),
    NativeClass(Rc<NativeClass>),
    Enum(Rc<EnumValue>),
    Tag(Rc<TagObject>),
    Html(Rc<Html>),
}

/// Insertion-ordered string map. Overwriting a key keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Returns the previous value when the key already existed.
    pub fn insert(&mut self, key: String, value: V) -> Option<V> {
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;

        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// A user function together with the context it was defined in.
pub struct Function {
    pub def: Rc<FuncDef>,
    pub closure: Rc<Context>,

    /// Set when the function was read off an instance (`obj.method`), so
    /// calling it later still binds `self`.
    pub bound: Option<BoundMethod>,
}

#[derive(Clone)]
pub struct BoundMethod {
    pub receiver: ClassRef,

    /// Class whose body declared the method; `super` resolves from here.
    pub owner: Option<ClassRef>,
}

impl Function {
    pub fn name(&self) -> &str {
        self.def.name.as_deref().unwrap_or("<anonymous>")
    }
}

pub struct NativeFunction {
    pub name: &'static str,

    /// `None` accepts any number of arguments.
    pub arity: Option<usize>,
    pub func: NativeFn,
}

/// A property exposed by a native class.
pub enum NativeProperty {
    Data(Value),

    /// Recomputed on every read.
    Computed(fn(Span) -> Result<Value>),
}

pub struct NativeClass {
    pub name: &'static str,
    pub properties: OrderedMap<NativeProperty>,
}

#[derive(Clone)]
pub enum MemberKind {
    Method(Rc<FuncDef>),
    Property(Value),
    Accessor {
        getter: Option<Rc<FuncDef>>,
        setter: Option<Rc<FuncDef>>,
    },
}

#[derive(Clone)]
pub struct Member {
    pub kind: MemberKind,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_override: bool,
    pub given_type: Option<String>,

    /// Declaring class. Weak so a class does not keep itself alive through
    /// its own members.
    pub owner: Weak<RefCell<ClassObject>>,
}

/// A class definition, or an instance of one when `is_instance` is set.
pub struct ClassObject {
    pub name: String,
    pub members: OrderedMap<Member>,
    pub parent: Option<ClassRef>,
    pub is_instance: bool,

    /// Context of the class body; methods run in children of it.
    pub context: Rc<Context>,
}

impl ClassObject {
    /// Does this class, or one of its ancestors, carry `name`?
    pub fn is_a(&self, name: &str) -> bool {
        if self.name == name {
            return true;
        }

        let mut current = self.parent.clone();
        while let Some(class) = current {
            let class = class.borrow();
            if class.name == name {
                return true;
            }
            current = class.parent.clone();
        }

        false
    }

    /// Names of this class and its ancestors, nearest first.
    pub fn lineage(&self) -> Vec<String> {
        let mut names = vec![self.name.clone()];
        let mut current = self.parent.clone();

        while let Some(class) = current {
            let class = class.borrow();
            names.push(class.name.clone());
            current = class.parent.clone();
        }

        names
    }
}

pub struct EnumValue {
    pub name: String,
    pub members: OrderedMap<usize>,
}

#[derive(Clone)]
pub enum TagMemberKind {
    Prop { is_optional: bool },
    State,
    Method(Rc<FuncDef>),
}

#[derive(Clone)]
pub struct TagMember {
    pub kind: TagMemberKind,

    /// Default for props, initial value for state.
    pub value: Value,
    pub given_type: Option<String>,
}

/// A user-defined component.
pub struct TagObject {
    pub name: String,
    pub members: OrderedMap<TagMember>,
    pub context: Rc<Context>,
}

/// Renderable node handed to the external renderer.
pub struct Html {
    pub tagname: String,
    pub classes: Vec<String>,
    pub id: Option<String>,
    pub attributes: Vec<(String, Value)>,
    pub events: Vec<(String, Value)>,
    pub children: Vec<Value>,

    /// Name of the user tag that rendered this node.
    pub component: Option<String>,
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn dict(map: OrderedMap<Value>) -> Value {
        Value::Dict(Rc::new(RefCell::new(map)))
    }

    pub fn string<S: Into<String>>(s: S) -> Value {
        Value::String(s.into())
    }

    /// Type tag checked against declared types and reported by `typeof`.
    /// Instances report their class name.
    pub fn type_name(&self) -> String {
        match self {
            Value::Number(_) => "number".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Boolean(_) => "boolean".to_string(),
            Value::None => "none".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Dict(_) => "dict".to_string(),
            Value::Function(_) | Value::NativeFunction(_) => "function".to_string(),
            Value::Class(class) => {
                let class = class.borrow();
                if class.is_instance {
                    class.name.clone()
                } else {
                    "class".to_string()
                }
            }
            Value::NativeClass(_) => "object".to_string(),
            Value::Enum(_) => "enum".to_string(),
            Value::Tag(_) => "tag".to_string(),
            Value::Html(_) => "html".to_string(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::NativeFunction(_))
    }

    pub fn is_instance(&self) -> bool {
        matches!(self, Value::Class(class) if class.borrow().is_instance)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
            Value::None => false,
            Value::List(items) => !items.borrow().is_empty(),
            Value::Dict(map) => !map.borrow().is_empty(),
            _ => true,
        }
    }

    /// Copy that shares nothing mutable with `self`. Instances get fresh
    /// member maps; classes, functions and other immutable values are shared.
    pub fn deep_clone(&self) -> Value {
        self.clone_with(&mut HashMap::new())
    }

    /// `copies` maps each container already copied to its copy, so shared
    /// and self-referencing structure is reproduced instead of unrolled.
    fn clone_with(&self, copies: &mut HashMap<*const (), Value>) -> Value {
        match self {
            Value::List(items) => {
                let key = Rc::as_ptr(items) as *const ();
                if let Some(copy) = copies.get(&key) {
                    return copy.clone();
                }

                let copy: ListRef = Rc::new(RefCell::new(Vec::new()));
                copies.insert(key, Value::List(Rc::clone(&copy)));

                let cloned: Vec<Value> = items
                    .borrow()
                    .iter()
                    .map(|item| item.clone_with(copies))
                    .collect();
                *copy.borrow_mut() = cloned;

                Value::List(copy)
            }
            Value::Dict(map) => {
                let key = Rc::as_ptr(map) as *const ();
                if let Some(copy) = copies.get(&key) {
                    return copy.clone();
                }

                let copy: DictRef = Rc::new(RefCell::new(OrderedMap::new()));
                copies.insert(key, Value::Dict(Rc::clone(&copy)));

                let cloned: OrderedMap<Value> = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone_with(copies)))
                    .collect();
                *copy.borrow_mut() = cloned;

                Value::Dict(copy)
            }
            Value::Class(class) if class.borrow().is_instance => {
                let key = Rc::as_ptr(class) as *const ();
                if let Some(copy) = copies.get(&key) {
                    return copy.clone();
                }

                let copy: ClassRef = {
                    let class = class.borrow();
                    Rc::new(RefCell::new(ClassObject {
                        name: class.name.clone(),
                        members: OrderedMap::new(),
                        parent: class.parent.clone(),
                        is_instance: true,
                        context: Rc::clone(&class.context),
                    }))
                };
                copies.insert(key, Value::Class(Rc::clone(&copy)));

                let members: OrderedMap<Member> = class
                    .borrow()
                    .members
                    .iter()
                    .map(|(name, member)| {
                        let mut member = member.clone();
                        if let MemberKind::Property(value) = &member.kind {
                            member.kind = MemberKind::Property(value.clone_with(copies));
                        }
                        (name.clone(), member)
                    })
                    .collect();
                copy.borrow_mut().members = members;

                Value::Class(copy)
            }
            other => other.clone(),
        }
    }

    /// Form used when this value is nested inside a list or dictionary.
    pub fn repr(&self) -> String {
        self.render(&mut Vec::new(), true)
    }

    /// `open` holds the containers currently being printed; meeting one
    /// again prints `[...]` or `{...}`.
    fn render(&self, open: &mut Vec<*const ()>, nested: bool) -> String {
        match self {
            Value::String(s) if nested => format!("\"{}\"", s),

            Value::List(items) => {
                let key = Rc::as_ptr(items) as *const ();
                if open.contains(&key) {
                    return "[...]".to_string();
                }

                open.push(key);
                let parts: Vec<String> = items
                    .borrow()
                    .iter()
                    .map(|item| item.render(open, true))
                    .collect();
                open.pop();

                format!("[{}]", parts.join(", "))
            }

            Value::Dict(map) => {
                let key = Rc::as_ptr(map) as *const ();
                if open.contains(&key) {
                    return "{...}".to_string();
                }

                open.push(key);
                let parts: Vec<String> = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("\"{}\": {}", k, v.render(open, true)))
                    .collect();
                open.pop();

                format!("{{{}}}", parts.join(", "))
            }

            other => other.to_string(),
        }
    }
}

/// Does `value` satisfy the declared type `expected`?
pub fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "any" => true,
        "dynamic" => !value.is_none(),
        "object" => matches!(
            value,
            Value::NativeClass(_) | Value::Enum(_)
        ) || value.is_instance(),
        other => value.type_name() == other,
    }
}

/// `3` → "3", `3.5` → "3.5".
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        buf.format(n as i64).to_string()
    } else if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::None => f.write_str("none"),

            Value::List(_) | Value::Dict(_) => f.write_str(&self.render(&mut Vec::new(), false)),

            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::NativeFunction(func) => write!(f, "<native function {}>", func.name),

            Value::Class(class) => {
                let class = class.borrow();
                if class.is_instance {
                    write!(f, "<{} instance>", class.name)
                } else {
                    write!(f, "<Class {}>", class.name)
                }
            }

            Value::NativeClass(class) => write!(f, "<NativeClass {}>", class.name),
            Value::Enum(e) => write!(f, "<Enum {}>", e.name),
            Value::Tag(tag) => write!(f, "<Tag {}>", tag.name),
            Value::Html(html) => write!(f, "<{}>", html.tagname),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_drop_integral_fraction() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(-12.0).to_string(), "-12");
        assert_eq!(Value::Number(3.25).to_string(), "3.25");
    }

    #[test]
    fn nested_strings_are_quoted() {
        let inner = Value::list(vec![Value::string("b"), Value::None]);
        let list = Value::list(vec![Value::Number(1.0), Value::string("a"), inner]);

        assert_eq!(list.to_string(), "[1, \"a\", [\"b\", none]]");
    }

    #[test]
    fn dict_display_keeps_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("z".to_string(), Value::Number(1.0));
        map.insert("a".to_string(), Value::Boolean(true));
        map.insert("z".to_string(), Value::Number(2.0));

        assert_eq!(Value::dict(map).to_string(), "{\"z\": 2, \"a\": true}");
    }

    #[test]
    fn clone_shares_but_deep_clone_does_not() {
        let original = Value::list(vec![Value::list(vec![Value::Number(1.0)])]);
        let alias = original.clone();
        let copy = original.deep_clone();

        if let Value::List(items) = &alias {
            items.borrow_mut().push(Value::None);
        }

        assert_eq!(original.to_string(), "[[1], none]");
        assert_eq!(copy.to_string(), "[[1]]");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::list(Vec::new()).is_truthy());
        assert!(Value::string("x").is_truthy());
    }

    #[test]
    fn declared_types() {
        assert!(type_matches("any", &Value::None));
        assert!(!type_matches("dynamic", &Value::None));
        assert!(type_matches("dynamic", &Value::Number(1.0)));
        assert!(type_matches("number", &Value::Number(1.0)));
        assert!(!type_matches("number", &Value::string("1")));
        assert!(!type_matches("object", &Value::Number(1.0)));
    }
}
