//! **Abstract‑Syntax‑Tree** for Quill.
//!
//! Every construct is a [`Node`]: a closed [`NodeKind`] plus the [`Span`] of
//! the source it came from. The interpreter matches exhaustively on
//! `NodeKind`, so adding a variant is a compile error until every evaluator
//! handles it.
//!
//! Definitions that closures and classes keep alive after parsing
//! (function, class and tag bodies) sit behind `Rc` so a runtime value can
//! hold them without cloning the subtree.

use serde::Serialize;
use std::fmt;
use std::rc::Rc;

use crate::position::Span;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Can this node appear on the left of `=`, `++` or `--`?
    pub fn is_assignable(&self) -> bool {
        match &self.kind {
            NodeKind::VarAccess(name) => name != "self",
            NodeKind::ListAccess { .. }
            | NodeKind::CallProperty { .. }
            | NodeKind::CallStaticProperty { .. } => true,
            _ => false,
        }
    }
}

/// Infix operators evaluated through the coercion matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
    BitAnd,
    BitOr,
    BitXor,
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "**",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::UnsignedShiftRight => ">>>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::GreaterThan => ">",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThanOrEqual => ">=",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Short-circuiting operators: the right side is evaluated lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

impl LogicalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
            LogicalOp::Nullish => "??",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Minus,
    Plus,
    BitNot,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::BitNot => "~",
            UnaryOp::Not => "not",
        }
    }
}

/// One bracket of a list access chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IndexKind {
    /// `a[expr]`
    Expr(Node),

    /// `a[]` – only meaningful as an assignment target.
    Push,

    /// `a[start:end]`, the binary selector.
    Slice {
        start: Option<Node>,
        end: Option<Node>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListIndex {
    pub kind: IndexKind,

    /// Written as `?.[...]`.
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictEntry {
    pub key: String,
    pub value: Node,
    pub span: Span,
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgSpec {
    pub name: String,
    pub given_type: Option<String>,
    pub default: Option<Node>,

    /// `name?` – missing argument becomes `none`.
    pub is_optional: bool,

    /// `...name` – collects the remaining arguments into a list.
    pub is_rest: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuncDef {
    pub name: Option<String>,
    pub args: Vec<ArgSpec>,
    pub body: Node,

    /// `-> expr` bodies return their value; block bodies need `return`.
    pub should_auto_return: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Visibility {
    Private,
    Protected,
    Public,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Public => "public",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ClassMemberKind {
    Property {
        given_type: Option<String>,
        value: Option<Node>,
    },
    Method(Rc<FuncDef>),
    Getter(Rc<FuncDef>),
    Setter(Rc<FuncDef>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMemberDef {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_override: bool,
    pub kind: ClassMemberKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDef {
    pub name: String,
    pub parent: Option<String>,
    pub members: Vec<ClassMemberDef>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TagMemberKind {
    Prop {
        given_type: Option<String>,
        default: Option<Node>,
        is_optional: bool,
    },
    State {
        given_type: Option<String>,
        value: Node,
    },
    Method(Rc<FuncDef>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagMemberDef {
    pub name: String,
    pub kind: TagMemberKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagDef {
    pub name: String,
    pub members: Vec<TagMemberDef>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfCase {
    pub condition: Node,
    pub body: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwitchCase {
    pub conditions: Vec<Node>,
    pub body: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlAttribute {
    pub name: String,
    pub value: Node,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlNode {
    pub tagname: String,
    pub classes: Vec<String>,
    pub id: Option<String>,
    pub attributes: Vec<HtmlAttribute>,
    pub events: Vec<HtmlAttribute>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    Number(f64),
    Str(String),
    Boolean(bool),
    NoneLiteral,
    List(Vec<Node>),
    Dict(Vec<DictEntry>),

    /// A sequence of statements; evaluates to the list of their values.
    Statements(Vec<Node>),

    /// `var name: type = value`
    VarAssign {
        name: String,
        given_type: Option<String>,
        value: Box<Node>,
    },

    /// `define NAME: type = value`
    Define {
        name: String,
        given_type: Option<String>,
        value: Box<Node>,
    },

    /// `name = value` on an existing variable.
    VarModify {
        name: String,
        value: Box<Node>,
    },
    VarAccess(String),

    /// `delete name` or `delete list[...]`
    Delete(Box<Node>),

    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },

    /// `++x` / `--x`
    Prefix {
        target: Box<Node>,
        delta: f64,
    },

    /// `x++` / `x--`
    Postfix {
        target: Box<Node>,
        delta: f64,
    },

    ListAccess {
        base: Box<Node>,
        indices: Vec<ListIndex>,
    },

    /// Wraps a `ListAccess` target.
    ListAssignment {
        access: Box<Node>,
        value: Box<Node>,
    },

    If {
        cases: Vec<IfCase>,
        else_case: Option<Box<Node>>,
    },
    For {
        var_name: String,
        start: Option<Box<Node>>,
        end: Box<Node>,
        step: Option<Box<Node>>,
        body: Box<Node>,
    },
    Foreach {
        iterable: Box<Node>,
        key_name: Option<String>,
        value_name: String,
        body: Box<Node>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
    },

    FuncDef(Rc<FuncDef>),
    Call {
        callee: Box<Node>,
        args: Vec<Node>,

        /// Written as `?.(...)`.
        optional: bool,
    },
    Return(Option<Box<Node>>),
    Continue,
    Break,

    ClassDef(Rc<ClassDef>),

    /// `new Name(args)`
    New {
        class_name: String,
        args: Vec<Node>,
    },

    /// `base.property` or `base?.property`
    CallProperty {
        base: Box<Node>,
        property: String,
        optional: bool,
    },

    /// `base::property` or `base?::property`
    CallStaticProperty {
        base: Box<Node>,
        property: String,
        optional: bool,
    },

    /// Assignment whose target is a `CallProperty` or `CallStaticProperty`.
    AssignProperty {
        target: Box<Node>,
        value: Box<Node>,
    },

    /// `super(args)` inside a method.
    Super(Vec<Node>),

    Enum {
        name: String,
        members: Vec<String>,
    },
    Switch {
        subject: Box<Node>,
        cases: Vec<SwitchCase>,
        default: Option<Box<Node>>,
    },
    Typeof(Box<Node>),
    Instanceof {
        value: Box<Node>,
        class: Box<Node>,
    },

    TagDef(Rc<TagDef>),
    Html(Rc<HtmlNode>),
}
