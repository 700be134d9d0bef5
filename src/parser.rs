/*!
Recursive‑descent parser for Quill.

Consumes the token slice produced by the scanner and builds one
[`Node`] tree. The first unexpected token aborts the parse with a syntax
error; there is no recovery.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| statement / definition rules | `debug`| High‑level descent into grammar branches. |
| Error paths (`consume`, etc.)| `debug`| Context before returning structured error.|

--------------------------------------------------------------------------------
Grammar (condensed)
--------------------------------------------------------------------------------

```text
program     → statements EOF ;
statements  → sep* ( statement ( sep+ statement )* )? sep* ;
statement   → "return" expr? | "continue" | "break" | "delete" expr
            | class_def | tag_def | enum_def | expr ;
expr        → "var" IDENT ( ":" type )? ( "=" expr )?
            | "define" IDENT ( ":" type )? "=" expr
            | logic_or ( assign_op expr )? ;
logic_or    → logic_and ( ( "or" | "||" ) logic_and )* ;
logic_and   → logic_not ( ( "and" | "&&" ) logic_not )* ;
logic_not   → ( "not" | "!" ) logic_not | comparison ;
comparison  → bit_or ( ( "==" | "!=" | "<" | ">" | "<=" | ">="
                       | "??" | "instanceof" ) bit_or )* ;
bit_or      → bit_xor ( "|" bit_xor )* ;
bit_xor     → bit_and ( "^" bit_and )* ;
bit_and     → shift ( "&" shift )* ;
shift       → arith ( ( "<<" | ">>" | ">>>" ) arith )* ;
arith       → term ( ( "+" | "-" ) term )* ;
term        → unary ( ( "*" | "/" | "%" ) unary )* ;
unary       → ( "-" | "+" | "~" | "typeof" ) unary
            | ( "++" | "--" ) unary
            | power ;
power       → call ( "**" unary )? ;
call        → atom ( "." NAME | "?." NAME | "::" NAME | "?::" NAME
                   | "(" args ")" | "?.(" args ")"
                   | "[" index "]" | "?.[" index "]" )* ( "++" | "--" )? ;
atom        → NUMBER | STRING | "true" | "false" | "none" | IDENT | "self"
            | "super" "(" args ")" | "new" IDENT ( "(" args ")" )?
            | "(" expr ")" | list | dict | if | for | foreach | while
            | func | switch | html ;
```
*/

use std::rc::Rc;

use crate::ast::{
    ArgSpec, BinaryOp, ClassDef, ClassMemberDef, ClassMemberKind, DictEntry, FuncDef,
    HtmlAttribute, HtmlNode, IfCase, IndexKind, ListIndex, LogicalOp, Node, NodeKind,
    SwitchCase, TagDef, TagMemberDef, TagMemberKind, UnaryOp, Visibility,
};
use crate::error::{QuillError, Result};
use crate::position::Span;
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Top‑level parser over an immutable slice of tokens.
pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    current: usize,
}

/// Result of parsing the part of a construct after its header.
struct Body {
    node: Node,

    /// `-> expr` form.
    arrow: bool,
}

impl<'a> Parser<'a> {
    /// Construct a new parser. The slice must end with an `EOF` token, which
    /// [`crate::scanner::tokenize`] guarantees.
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self { tokens, current: 0 }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program into a `Statements` node.
    pub fn parse(&mut self) -> Result<Node> {
        info!("Beginning parse phase");

        if self.tokens.is_empty() {
            return Err(QuillError::syntax(Span::default(), "Unexpected end of parsing"));
        }

        let program: Node = self.statements()?;

        if !self.is_at_end() {
            let token = self.peek();
            debug!("Trailing token after program: {:?}", token.token_type);

            return Err(QuillError::syntax(
                token.span,
                format!("Unexpected token '{}'", token.lexeme),
            ));
        }

        info!("Parse phase completed");

        Ok(program)
    }

    // ───────────────────────── statement rules ────────────────────

    /// Statements up to (not including) a block terminator.
    fn statements(&mut self) -> Result<Node> {
        let start: Span = self.peek().span;
        let mut statements: Vec<Node> = Vec::new();

        self.skip_separators();

        while !self.is_block_end() {
            statements.push(self.statement()?);

            if self.is_block_end() {
                break;
            }

            if !self.check(TokenType::NEWLINE) && !self.check(TokenType::SEMICOLON) {
                let token = self.peek();
                return Err(QuillError::syntax(
                    token.span,
                    format!("Expected a new line or ';' before '{}'", token.lexeme),
                ));
            }

            self.skip_separators();
        }

        let span = if statements.is_empty() {
            start
        } else {
            start.to(self.previous().span)
        };

        Ok(Node::new(NodeKind::Statements(statements), span))
    }

    fn statement(&mut self) -> Result<Node> {
        let start: Span = self.peek().span;

        if self.matches(TokenType::RETURN) {
            debug!("Parsing return statement");

            let value = if self.is_statement_end() {
                None
            } else {
                Some(Box::new(self.expression()?))
            };

            return Ok(Node::new(NodeKind::Return(value), self.span_from(start)));
        }

        if self.matches(TokenType::CONTINUE) {
            return Ok(Node::new(NodeKind::Continue, start));
        }

        if self.matches(TokenType::BREAK) {
            return Ok(Node::new(NodeKind::Break, start));
        }

        if self.matches(TokenType::DELETE) {
            let target: Node = self.expression()?;

            if !matches!(
                target.kind,
                NodeKind::VarAccess(_) | NodeKind::ListAccess { .. }
            ) {
                return Err(QuillError::syntax(
                    target.span,
                    "Expected a variable or a list access after 'delete'",
                ));
            }

            return Ok(Node::new(
                NodeKind::Delete(Box::new(target)),
                self.span_from(start),
            ));
        }

        if self.matches(TokenType::CLASS) {
            return self.class_definition(start);
        }

        if self.matches(TokenType::TAG) {
            return self.tag_definition(start);
        }

        if self.matches(TokenType::ENUM) {
            return self.enum_definition(start);
        }

        self.expression()
    }

    // ──────────────────────── declaration rules ───────────────────

    fn class_definition(&mut self, start: Span) -> Result<Node> {
        let name: String = self
            .consume(TokenType::IDENTIFIER, "Expected class name")?
            .lexeme
            .to_string();

        debug!("Parsing class definition '{}'", name);

        let parent: Option<String> = if self.matches(TokenType::EXTENDS) {
            Some(
                self.consume(TokenType::IDENTIFIER, "Expected parent class name after 'extends'")?
                    .lexeme
                    .to_string(),
            )
        } else {
            None
        };

        self.consume(TokenType::COLON, "Expected ':' after class name")?;

        let mut members: Vec<ClassMemberDef> = Vec::new();

        self.skip_separators();
        while !self.check(TokenType::END) {
            if self.is_at_end() {
                return Err(QuillError::syntax(self.peek().span, "Expected 'end' after class body"));
            }

            members.push(self.class_member()?);

            if !self.check(TokenType::END) && !self.is_separator() {
                return Err(QuillError::syntax(
                    self.peek().span,
                    "Expected a new line after a class member",
                ));
            }

            self.skip_separators();
        }

        self.consume(TokenType::END, "Expected 'end' after class body")?;

        let span = self.span_from(start);
        let def = ClassDef {
            name,
            parent,
            members,
            span,
        };

        Ok(Node::new(NodeKind::ClassDef(Rc::new(def)), span))
    }

    fn class_member(&mut self) -> Result<ClassMemberDef> {
        let start: Span = self.peek().span;
        let mut visibility: Option<Visibility> = None;
        let mut is_static: bool = false;
        let mut is_override: bool = false;

        loop {
            let modifier = match self.peek().token_type {
                TokenType::PRIVATE => Some(Visibility::Private),
                TokenType::PROTECTED => Some(Visibility::Protected),
                TokenType::PUBLIC => Some(Visibility::Public),
                _ => None,
            };

            if let Some(v) = modifier {
                if visibility.is_some() {
                    return Err(QuillError::syntax(
                        self.peek().span,
                        "A member can only have one visibility modifier",
                    ));
                }
                visibility = Some(v);
                self.advance();
            } else if self.matches(TokenType::STATIC) {
                is_static = true;
            } else if self.matches(TokenType::OVERRIDE) {
                is_override = true;
            } else {
                break;
            }
        }

        let visibility: Visibility = visibility.unwrap_or(Visibility::Public);

        let (name, kind) = if self.matches(TokenType::PROPERTY) {
            let name = self.consume_word("Expected property name")?;
            let given_type = self.optional_type()?;
            let value = if self.matches(TokenType::EQUAL) {
                Some(self.expression()?)
            } else {
                None
            };

            (name, ClassMemberKind::Property { given_type, value })
        } else if self.matches(TokenType::METHOD) {
            let name = self.consume_word("Expected method name")?;
            let func = self.function_rest(Some(name.clone()), start)?;

            (name, ClassMemberKind::Method(Rc::new(func)))
        } else if self.matches(TokenType::GETTER) {
            let name = self.consume_word("Expected getter name")?;

            if self.matches(TokenType::LEFT_PAREN) {
                self.consume(TokenType::RIGHT_PAREN, "A getter takes no parameters")?;
            }

            let body = self.body()?;
            let func = FuncDef {
                name: Some(name.clone()),
                args: Vec::new(),
                body: body.node,
                should_auto_return: body.arrow,
                span: self.span_from(start),
            };

            (name, ClassMemberKind::Getter(Rc::new(func)))
        } else if self.matches(TokenType::SETTER) {
            let name = self.consume_word("Expected setter name")?;
            let func = self.function_rest(Some(name.clone()), start)?;

            if func.args.len() != 1 || func.args[0].is_rest {
                return Err(QuillError::syntax(
                    func.span,
                    "A setter takes exactly one parameter",
                ));
            }

            (name, ClassMemberKind::Setter(Rc::new(func)))
        } else {
            return Err(QuillError::syntax(
                self.peek().span,
                "Expected 'property', 'method', 'getter' or 'setter'",
            ));
        };

        Ok(ClassMemberDef {
            name,
            visibility,
            is_static,
            is_override,
            kind,
            span: self.span_from(start),
        })
    }

    fn tag_definition(&mut self, start: Span) -> Result<Node> {
        let name: String = self
            .consume(TokenType::IDENTIFIER, "Expected tag name")?
            .lexeme
            .to_string();

        debug!("Parsing tag definition '{}'", name);

        self.consume(TokenType::COLON, "Expected ':' after tag name")?;

        let mut members: Vec<TagMemberDef> = Vec::new();

        self.skip_separators();
        while !self.check(TokenType::END) {
            if self.is_at_end() {
                return Err(QuillError::syntax(self.peek().span, "Expected 'end' after tag body"));
            }

            let member_start: Span = self.peek().span;

            let (member_name, kind) = if self.matches(TokenType::PROP) {
                let member_name = self.consume_word("Expected prop name")?;
                let mut is_optional = self.matches(TokenType::QMARK);
                let given_type = self.optional_type()?;
                let default = if self.matches(TokenType::EQUAL) {
                    is_optional = true;
                    Some(self.expression()?)
                } else {
                    None
                };

                (
                    member_name,
                    TagMemberKind::Prop {
                        given_type,
                        default,
                        is_optional,
                    },
                )
            } else if self.matches(TokenType::STATE) {
                let member_name = self.consume_word("Expected state name")?;
                let given_type = self.optional_type()?;
                self.consume(TokenType::EQUAL, "A state needs an initial value")?;
                let value = self.expression()?;

                (member_name, TagMemberKind::State { given_type, value })
            } else if self.matches(TokenType::METHOD) {
                let member_name = self.consume_word("Expected method name")?;
                let func = self.function_rest(Some(member_name.clone()), member_start)?;

                (member_name, TagMemberKind::Method(Rc::new(func)))
            } else {
                return Err(QuillError::syntax(
                    self.peek().span,
                    "Expected 'prop', 'state' or 'method'",
                ));
            };

            members.push(TagMemberDef {
                name: member_name,
                kind,
                span: self.span_from(member_start),
            });

            if !self.check(TokenType::END) && !self.is_separator() {
                return Err(QuillError::syntax(
                    self.peek().span,
                    "Expected a new line after a tag member",
                ));
            }

            self.skip_separators();
        }

        self.consume(TokenType::END, "Expected 'end' after tag body")?;

        let span = self.span_from(start);
        let def = TagDef {
            name,
            members,
            span,
        };

        Ok(Node::new(NodeKind::TagDef(Rc::new(def)), span))
    }

    fn enum_definition(&mut self, start: Span) -> Result<Node> {
        let name: String = self
            .consume(TokenType::IDENTIFIER, "Expected enum name")?
            .lexeme
            .to_string();

        debug!("Parsing enum definition '{}'", name);

        self.consume(TokenType::COLON, "Expected ':' after enum name")?;

        let mut members: Vec<String> = Vec::new();

        self.skip_newlines();
        while !self.check(TokenType::END) {
            members.push(self.consume_word("Expected enum member name")?);

            self.skip_newlines();
            if !self.matches(TokenType::COMMA) {
                self.skip_newlines();
                break;
            }
            self.skip_newlines();
        }

        self.consume(TokenType::END, "Expected 'end' after enum members")?;

        Ok(Node::new(
            NodeKind::Enum { name, members },
            self.span_from(start),
        ))
    }

    // ─────────────────────── expression rules ─────────────────────

    pub fn expression(&mut self) -> Result<Node> {
        let start: Span = self.peek().span;

        if self.matches(TokenType::VAR) {
            let name: String = self
                .consume(TokenType::IDENTIFIER, "Expected variable name after 'var'")?
                .lexeme
                .to_string();
            let given_type = self.optional_type()?;

            let value: Node = if self.matches(TokenType::EQUAL) {
                self.skip_newlines();
                self.expression()?
            } else {
                Node::new(NodeKind::NoneLiteral, self.previous().span)
            };

            return Ok(Node::new(
                NodeKind::VarAssign {
                    name,
                    given_type,
                    value: Box::new(value),
                },
                self.span_from(start),
            ));
        }

        if self.matches(TokenType::DEFINE) {
            let name: String = self
                .consume(TokenType::IDENTIFIER, "Expected constant name after 'define'")?
                .lexeme
                .to_string();
            let given_type = self.optional_type()?;

            self.consume(TokenType::EQUAL, "Expected '=' after constant name")?;
            self.skip_newlines();
            let value: Node = self.expression()?;

            return Ok(Node::new(
                NodeKind::Define {
                    name,
                    given_type,
                    value: Box::new(value),
                },
                self.span_from(start),
            ));
        }

        let expr: Node = self.logical_or()?;

        let operator = match self.peek().token_type {
            TokenType::EQUAL => Some(None),
            TokenType::PLUS_EQUAL => Some(Some(Compound::Binary(BinaryOp::Add))),
            TokenType::MINUS_EQUAL => Some(Some(Compound::Binary(BinaryOp::Subtract))),
            TokenType::STAR_EQUAL => Some(Some(Compound::Binary(BinaryOp::Multiply))),
            TokenType::SLASH_EQUAL => Some(Some(Compound::Binary(BinaryOp::Divide))),
            TokenType::PERCENT_EQUAL => Some(Some(Compound::Binary(BinaryOp::Modulo))),
            TokenType::POWER_EQUAL => Some(Some(Compound::Binary(BinaryOp::Power))),
            TokenType::NULLISH_EQUAL => Some(Some(Compound::Logical(LogicalOp::Nullish))),
            TokenType::AND_EQUAL => Some(Some(Compound::Logical(LogicalOp::And))),
            TokenType::OR_EQUAL => Some(Some(Compound::Logical(LogicalOp::Or))),
            _ => None,
        };

        let Some(compound) = operator else {
            return Ok(expr);
        };

        let equals: &Token<'_> = self.advance();

        if !expr.is_assignable() {
            debug!("Invalid assignment target: {:?}", expr.kind);

            return Err(QuillError::syntax(equals.span, "Invalid assignment target"));
        }

        self.skip_newlines();
        let rhs: Node = self.expression()?;
        let span: Span = self.span_from(start);

        let value: Node = match compound {
            None => rhs,
            Some(Compound::Binary(op)) => Node::new(
                NodeKind::Binary {
                    op,
                    left: Box::new(expr.clone()),
                    right: Box::new(rhs),
                },
                span,
            ),
            Some(Compound::Logical(op)) => Node::new(
                NodeKind::Logical {
                    op,
                    left: Box::new(expr.clone()),
                    right: Box::new(rhs),
                },
                span,
            ),
        };

        Ok(assignment(expr, value, span))
    }

    fn logical_or(&mut self) -> Result<Node> {
        let mut expr: Node = self.logical_and()?;

        while self.matches(TokenType::OR) || self.matches(TokenType::OR_OR) {
            self.skip_newlines();
            let right: Node = self.logical_and()?;
            expr = logical(LogicalOp::Or, expr, right);
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Node> {
        let mut expr: Node = self.logical_not()?;

        while self.matches(TokenType::AND) || self.matches(TokenType::AND_AND) {
            self.skip_newlines();
            let right: Node = self.logical_not()?;
            expr = logical(LogicalOp::And, expr, right);
        }

        Ok(expr)
    }

    fn logical_not(&mut self) -> Result<Node> {
        let start: Span = self.peek().span;

        if self.matches(TokenType::NOT) || self.matches(TokenType::BANG) {
            let operand: Node = self.logical_not()?;

            return Ok(Node::new(
                NodeKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                self.span_from(start),
            ));
        }

        self.comparison()
    }

    fn comparison(&mut self) -> Result<Node> {
        let mut expr: Node = self.bit_or()?;

        loop {
            let op = match self.peek().token_type {
                TokenType::EQUAL_EQUAL => BinaryOp::Equals,
                TokenType::BANG_EQUAL => BinaryOp::NotEquals,
                TokenType::LESS => BinaryOp::LessThan,
                TokenType::GREATER => BinaryOp::GreaterThan,
                TokenType::LESS_EQUAL => BinaryOp::LessThanOrEqual,
                TokenType::GREATER_EQUAL => BinaryOp::GreaterThanOrEqual,

                TokenType::NULLISH => {
                    self.advance();
                    self.skip_newlines();
                    let right: Node = self.bit_or()?;
                    expr = logical(LogicalOp::Nullish, expr, right);
                    continue;
                }

                TokenType::INSTANCEOF => {
                    self.advance();
                    let right: Node = self.bit_or()?;
                    let span = expr.span.to(right.span);
                    expr = Node::new(
                        NodeKind::Instanceof {
                            value: Box::new(expr),
                            class: Box::new(right),
                        },
                        span,
                    );
                    continue;
                }

                _ => break,
            };

            self.advance();
            self.skip_newlines();
            let right: Node = self.bit_or()?;
            expr = binary(op, expr, right);
        }

        Ok(expr)
    }

    fn bit_or(&mut self) -> Result<Node> {
        let mut expr: Node = self.bit_xor()?;

        while self.matches(TokenType::PIPE) {
            self.skip_newlines();
            let right: Node = self.bit_xor()?;
            expr = binary(BinaryOp::BitOr, expr, right);
        }

        Ok(expr)
    }

    fn bit_xor(&mut self) -> Result<Node> {
        let mut expr: Node = self.bit_and()?;

        while self.matches(TokenType::CARET) {
            self.skip_newlines();
            let right: Node = self.bit_and()?;
            expr = binary(BinaryOp::BitXor, expr, right);
        }

        Ok(expr)
    }

    fn bit_and(&mut self) -> Result<Node> {
        let mut expr: Node = self.shift()?;

        while self.matches(TokenType::AMPERSAND) {
            self.skip_newlines();
            let right: Node = self.shift()?;
            expr = binary(BinaryOp::BitAnd, expr, right);
        }

        Ok(expr)
    }

    fn shift(&mut self) -> Result<Node> {
        let mut expr: Node = self.arith()?;

        loop {
            let op = match self.peek().token_type {
                TokenType::SHIFT_LEFT => BinaryOp::ShiftLeft,
                TokenType::SHIFT_RIGHT => BinaryOp::ShiftRight,
                TokenType::UNSIGNED_SHIFT_RIGHT => BinaryOp::UnsignedShiftRight,
                _ => break,
            };

            self.advance();
            self.skip_newlines();
            let right: Node = self.arith()?;
            expr = binary(op, expr, right);
        }

        Ok(expr)
    }

    fn arith(&mut self) -> Result<Node> {
        let mut expr: Node = self.term()?;

        loop {
            let op = match self.peek().token_type {
                TokenType::PLUS => BinaryOp::Add,
                TokenType::MINUS => BinaryOp::Subtract,
                _ => break,
            };

            self.advance();
            self.skip_newlines();
            let right: Node = self.term()?;
            expr = binary(op, expr, right);
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Node> {
        let mut expr: Node = self.unary()?;

        loop {
            let op = match self.peek().token_type {
                TokenType::STAR => BinaryOp::Multiply,
                TokenType::SLASH => BinaryOp::Divide,
                TokenType::PERCENT => BinaryOp::Modulo,
                _ => break,
            };

            self.advance();
            self.skip_newlines();
            let right: Node = self.unary()?;
            expr = binary(op, expr, right);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Node> {
        let start: Span = self.peek().span;

        let op = match self.peek().token_type {
            TokenType::MINUS => Some(UnaryOp::Minus),
            TokenType::PLUS => Some(UnaryOp::Plus),
            TokenType::TILDE => Some(UnaryOp::BitNot),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand: Node = self.unary()?;

            return Ok(Node::new(
                NodeKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                self.span_from(start),
            ));
        }

        if self.matches(TokenType::TYPEOF) {
            let operand: Node = self.unary()?;

            return Ok(Node::new(
                NodeKind::Typeof(Box::new(operand)),
                self.span_from(start),
            ));
        }

        if self.check(TokenType::INC) || self.check(TokenType::DEC) {
            let delta: f64 = if self.matches(TokenType::INC) {
                1.0
            } else {
                self.advance();
                -1.0
            };

            let target: Node = self.unary()?;

            if !target.is_assignable() {
                return Err(QuillError::syntax(
                    target.span,
                    "Invalid target for a prefix operation",
                ));
            }

            return Ok(Node::new(
                NodeKind::Prefix {
                    target: Box::new(target),
                    delta,
                },
                self.span_from(start),
            ));
        }

        self.power()
    }

    fn power(&mut self) -> Result<Node> {
        let base: Node = self.call()?;

        if self.matches(TokenType::POWER) {
            self.skip_newlines();
            let exponent: Node = self.unary()?;

            return Ok(binary(BinaryOp::Power, base, exponent));
        }

        Ok(base)
    }

    /// Postfix chain: each link wraps the previous result.
    fn call(&mut self) -> Result<Node> {
        let start: Span = self.peek().span;
        let mut expr: Node = self.atom()?;

        loop {
            if self.matches(TokenType::DOT) {
                let property = self.consume_word("Expected property name after '.'")?;
                expr = Node::new(
                    NodeKind::CallProperty {
                        base: Box::new(expr),
                        property,
                        optional: false,
                    },
                    self.span_from(start),
                );
            } else if self.matches(TokenType::OPTIONAL_DOT) {
                if self.matches(TokenType::LEFT_PAREN) {
                    let args = self.arguments()?;
                    expr = Node::new(
                        NodeKind::Call {
                            callee: Box::new(expr),
                            args,
                            optional: true,
                        },
                        self.span_from(start),
                    );
                } else if self.matches(TokenType::LEFT_BRACKET) {
                    expr = self.list_index(expr, true, start)?;
                } else {
                    let property = self.consume_word("Expected property name after '?.'")?;
                    expr = Node::new(
                        NodeKind::CallProperty {
                            base: Box::new(expr),
                            property,
                            optional: true,
                        },
                        self.span_from(start),
                    );
                }
            } else if self.check(TokenType::DOUBLE_COLON) || self.check(TokenType::OPTIONAL_STATIC) {
                let optional = self.matches(TokenType::OPTIONAL_STATIC);
                if !optional {
                    self.advance();
                }

                let property = self.consume_word("Expected static property name after '::'")?;
                expr = Node::new(
                    NodeKind::CallStaticProperty {
                        base: Box::new(expr),
                        property,
                        optional,
                    },
                    self.span_from(start),
                );
            } else if self.matches(TokenType::LEFT_PAREN) {
                let args = self.arguments()?;
                expr = Node::new(
                    NodeKind::Call {
                        callee: Box::new(expr),
                        args,
                        optional: false,
                    },
                    self.span_from(start),
                );
            } else if self.matches(TokenType::LEFT_BRACKET) {
                expr = self.list_index(expr, false, start)?;
            } else {
                break;
            }
        }

        if (self.check(TokenType::INC) || self.check(TokenType::DEC)) && expr.is_assignable() {
            let delta: f64 = if self.matches(TokenType::INC) {
                1.0
            } else {
                self.advance();
                -1.0
            };

            expr = Node::new(
                NodeKind::Postfix {
                    target: Box::new(expr),
                    delta,
                },
                self.span_from(start),
            );
        }

        Ok(expr)
    }

    /// Parses the inside of `[...]` (opening bracket already consumed) and
    /// appends it to `expr`'s index chain when `expr` is already a list access.
    fn list_index(&mut self, expr: Node, optional: bool, start: Span) -> Result<Node> {
        let index_start: Span = self.previous().span;
        self.skip_newlines();

        let kind: IndexKind = if self.check(TokenType::RIGHT_BRACKET) {
            IndexKind::Push
        } else if self.matches(TokenType::COLON) {
            self.skip_newlines();
            let end = if self.check(TokenType::RIGHT_BRACKET) {
                None
            } else {
                Some(self.expression()?)
            };

            IndexKind::Slice { start: None, end }
        } else {
            let first: Node = self.expression()?;
            self.skip_newlines();

            if self.matches(TokenType::COLON) {
                self.skip_newlines();
                let end = if self.check(TokenType::RIGHT_BRACKET) {
                    None
                } else {
                    Some(self.expression()?)
                };

                IndexKind::Slice {
                    start: Some(first),
                    end,
                }
            } else {
                IndexKind::Expr(first)
            }
        };

        self.skip_newlines();
        self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after list index")?;

        let index = ListIndex {
            kind,
            optional,
            span: self.span_from(index_start),
        };

        let span: Span = self.span_from(start);

        Ok(match expr.kind {
            NodeKind::ListAccess { base, mut indices } => {
                indices.push(index);
                Node::new(NodeKind::ListAccess { base, indices }, span)
            }
            _ => Node::new(
                NodeKind::ListAccess {
                    base: Box::new(expr),
                    indices: vec![index],
                },
                span,
            ),
        })
    }

    /// Arguments of a call (opening parenthesis already consumed).
    fn arguments(&mut self) -> Result<Vec<Node>> {
        let mut args: Vec<Node> = Vec::new();

        self.skip_newlines();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                args.push(self.expression()?);
                self.skip_newlines();

                if !self.matches(TokenType::COMMA) {
                    break;
                }
                self.skip_newlines();
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments")?;

        Ok(args)
    }

    fn atom(&mut self) -> Result<Node> {
        let start: Span = self.peek().span;
        let token: &'a Token<'a> = self.peek();

        match &token.token_type {
            TokenType::NUMBER(n) => {
                self.advance();
                Ok(Node::new(NodeKind::Number(*n), start))
            }

            TokenType::STRING(s) => {
                self.advance();
                Ok(Node::new(NodeKind::Str(s.clone()), start))
            }

            TokenType::TRUE => {
                self.advance();
                Ok(Node::new(NodeKind::Boolean(true), start))
            }

            TokenType::FALSE => {
                self.advance();
                Ok(Node::new(NodeKind::Boolean(false), start))
            }

            TokenType::NONE => {
                self.advance();
                Ok(Node::new(NodeKind::NoneLiteral, start))
            }

            TokenType::IDENTIFIER => {
                self.advance();
                Ok(Node::new(NodeKind::VarAccess(token.lexeme.to_string()), start))
            }

            TokenType::SELF_ => {
                self.advance();
                Ok(Node::new(NodeKind::VarAccess("self".to_string()), start))
            }

            TokenType::SUPER => {
                self.advance();
                self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'super'")?;
                let args = self.arguments()?;

                Ok(Node::new(NodeKind::Super(args), self.span_from(start)))
            }

            TokenType::NEW => {
                self.advance();
                let class_name: String = self
                    .consume(TokenType::IDENTIFIER, "Expected class name after 'new'")?
                    .lexeme
                    .to_string();

                let args = if self.matches(TokenType::LEFT_PAREN) {
                    self.arguments()?
                } else {
                    Vec::new()
                };

                Ok(Node::new(
                    NodeKind::New { class_name, args },
                    self.span_from(start),
                ))
            }

            TokenType::LEFT_PAREN => {
                self.advance();
                self.skip_newlines();
                let expr: Node = self.expression()?;
                self.skip_newlines();
                self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;

                Ok(expr)
            }

            TokenType::LEFT_BRACKET => {
                self.advance();
                self.list_literal(start)
            }

            TokenType::LEFT_BRACE => {
                self.advance();
                self.dict_literal(start)
            }

            TokenType::IF => {
                self.advance();
                self.if_expression(start)
            }

            TokenType::FOR => {
                self.advance();
                self.for_expression(start)
            }

            TokenType::FOREACH => {
                self.advance();
                self.foreach_expression(start)
            }

            TokenType::WHILE => {
                self.advance();
                self.while_expression(start)
            }

            TokenType::FUNC => {
                self.advance();
                let name = if self.check(TokenType::IDENTIFIER) {
                    Some(self.advance().lexeme.to_string())
                } else {
                    None
                };

                let func = self.function_rest(name, start)?;
                let span = func.span;

                Ok(Node::new(NodeKind::FuncDef(Rc::new(func)), span))
            }

            TokenType::SWITCH => {
                self.advance();
                self.switch_expression(start)
            }

            TokenType::LESS => {
                self.advance();
                self.html(start)
            }

            TokenType::EOF => Err(QuillError::syntax(start, "Unexpected end of parsing")),

            _ => {
                debug!("No atom starts with {:?}", token.token_type);

                Err(QuillError::syntax(
                    start,
                    format!("Expected an expression, found '{}'", token.lexeme),
                ))
            }
        }
    }

    fn list_literal(&mut self, start: Span) -> Result<Node> {
        let mut elements: Vec<Node> = Vec::new();

        self.skip_newlines();
        while !self.check(TokenType::RIGHT_BRACKET) {
            elements.push(self.expression()?);
            self.skip_newlines();

            if !self.matches(TokenType::COMMA) {
                break;
            }
            self.skip_newlines();
        }

        self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after list elements")?;

        Ok(Node::new(NodeKind::List(elements), self.span_from(start)))
    }

    fn dict_literal(&mut self, start: Span) -> Result<Node> {
        let mut entries: Vec<DictEntry> = Vec::new();

        self.skip_newlines();
        while !self.check(TokenType::RIGHT_BRACE) {
            let key_token: &'a Token<'a> = self.peek();
            let key: String = match &key_token.token_type {
                TokenType::STRING(s) => s.clone(),
                _ if key_token.is_word() => key_token.lexeme.to_string(),
                _ => {
                    return Err(QuillError::syntax(
                        key_token.span,
                        "Expected a string or a name as dictionary key",
                    ));
                }
            };
            self.advance();

            let value: Node = if self.matches(TokenType::COLON) {
                self.skip_newlines();
                self.expression()?
            } else if matches!(key_token.token_type, TokenType::IDENTIFIER) {
                // `{ name }` is shorthand for `{ "name": name }`
                Node::new(NodeKind::VarAccess(key.clone()), key_token.span)
            } else {
                return Err(QuillError::syntax(
                    self.peek().span,
                    "Expected ':' after dictionary key",
                ));
            };

            entries.push(DictEntry {
                key,
                value,
                span: self.span_from(key_token.span),
            });

            self.skip_newlines();
            if !self.matches(TokenType::COMMA) {
                break;
            }
            self.skip_newlines();
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after dictionary entries")?;

        Ok(Node::new(NodeKind::Dict(entries), self.span_from(start)))
    }

    fn if_expression(&mut self, start: Span) -> Result<Node> {
        let mut cases: Vec<IfCase> = Vec::new();
        let mut else_case: Option<Box<Node>> = None;

        let condition: Node = self.expression()?;
        self.consume(TokenType::COLON, "Expected ':' after condition")?;

        if self.check(TokenType::NEWLINE) {
            debug!("Parsing multi-line if");

            let body: Node = self.statements()?;
            cases.push(IfCase { condition, body });

            loop {
                if self.matches(TokenType::ELIF) {
                    let condition: Node = self.expression()?;
                    self.consume(TokenType::COLON, "Expected ':' after condition")?;
                    let body: Node = self.statements()?;
                    cases.push(IfCase { condition, body });
                } else if self.matches(TokenType::ELSE) {
                    self.consume(TokenType::COLON, "Expected ':' after 'else'")?;
                    else_case = Some(Box::new(self.statements()?));
                    break;
                } else {
                    break;
                }
            }

            self.consume(TokenType::END, "Expected 'end' after if")?;
        } else {
            let body: Node = self.statement()?;
            cases.push(IfCase { condition, body });

            loop {
                if self.matches(TokenType::ELIF) {
                    let condition: Node = self.expression()?;
                    self.consume(TokenType::COLON, "Expected ':' after condition")?;
                    let body: Node = self.statement()?;
                    cases.push(IfCase { condition, body });
                } else if self.matches(TokenType::ELSE) {
                    self.matches(TokenType::COLON);
                    else_case = Some(Box::new(self.statement()?));
                    break;
                } else {
                    break;
                }
            }

            self.matches(TokenType::END);
        }

        Ok(Node::new(
            NodeKind::If { cases, else_case },
            self.span_from(start),
        ))
    }

    fn for_expression(&mut self, start: Span) -> Result<Node> {
        let var_name: String = self
            .consume(TokenType::IDENTIFIER, "Expected loop variable after 'for'")?
            .lexeme
            .to_string();

        let start_value = if self.matches(TokenType::EQUAL) {
            Some(Box::new(self.expression()?))
        } else {
            None
        };

        self.consume(TokenType::TO, "Expected 'to' in for loop")?;
        let end: Node = self.expression()?;

        let step = if self.matches(TokenType::STEP) {
            Some(Box::new(self.expression()?))
        } else {
            None
        };

        let body: Node = self.loop_body()?;

        Ok(Node::new(
            NodeKind::For {
                var_name,
                start: start_value,
                end: Box::new(end),
                step,
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    fn foreach_expression(&mut self, start: Span) -> Result<Node> {
        let iterable: Node = self.expression()?;
        self.consume(TokenType::AS, "Expected 'as' after the iterated value")?;

        let first: String = self
            .consume(TokenType::IDENTIFIER, "Expected a variable name after 'as'")?
            .lexeme
            .to_string();

        let (key_name, value_name) = if self.matches(TokenType::COMMA) {
            let second: String = self
                .consume(TokenType::IDENTIFIER, "Expected a variable name after ','")?
                .lexeme
                .to_string();
            (Some(first), second)
        } else {
            (None, first)
        };

        let body: Node = self.loop_body()?;

        Ok(Node::new(
            NodeKind::Foreach {
                iterable: Box::new(iterable),
                key_name,
                value_name,
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    fn while_expression(&mut self, start: Span) -> Result<Node> {
        let condition: Node = self.expression()?;
        let body: Node = self.loop_body()?;

        Ok(Node::new(
            NodeKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    fn loop_body(&mut self) -> Result<Node> {
        self.consume(TokenType::COLON, "Expected ':' before loop body")?;

        if self.check(TokenType::NEWLINE) {
            let body: Node = self.statements()?;
            self.consume(TokenType::END, "Expected 'end' after loop body")?;
            Ok(body)
        } else {
            let body: Node = self.statement()?;
            self.matches(TokenType::END);
            Ok(body)
        }
    }

    fn switch_expression(&mut self, start: Span) -> Result<Node> {
        let subject: Node = self.expression()?;
        self.consume(TokenType::COLON, "Expected ':' after switch subject")?;

        let mut cases: Vec<SwitchCase> = Vec::new();
        let mut default: Option<Box<Node>> = None;

        self.skip_separators();
        loop {
            if self.matches(TokenType::CASE) {
                if default.is_some() {
                    return Err(QuillError::syntax(
                        self.previous().span,
                        "'default' must be the last case of a switch",
                    ));
                }

                let mut conditions: Vec<Node> = vec![self.expression()?];
                while self.matches(TokenType::COMMA) {
                    conditions.push(self.expression()?);
                }

                self.consume(TokenType::COLON, "Expected ':' after case")?;
                let body: Node = self.statements()?;
                cases.push(SwitchCase { conditions, body });
            } else if self.matches(TokenType::DEFAULT) {
                if default.is_some() {
                    return Err(QuillError::syntax(
                        self.previous().span,
                        "A switch can only have one 'default'",
                    ));
                }

                self.consume(TokenType::COLON, "Expected ':' after 'default'")?;
                default = Some(Box::new(self.statements()?));
            } else {
                break;
            }
        }

        self.consume(TokenType::END, "Expected 'end' after switch")?;

        Ok(Node::new(
            NodeKind::Switch {
                subject: Box::new(subject),
                cases,
                default,
            },
            self.span_from(start),
        ))
    }

    /// Parameters and body of a function or method; the name (if any) has
    /// already been consumed.
    fn function_rest(&mut self, name: Option<String>, start: Span) -> Result<FuncDef> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' before parameters")?;

        let mut args: Vec<ArgSpec> = Vec::new();

        self.skip_newlines();
        while !self.check(TokenType::RIGHT_PAREN) {
            let arg_start: Span = self.peek().span;

            if let Some(last) = args.last() {
                if last.is_rest {
                    return Err(QuillError::syntax(
                        arg_start,
                        "A rest parameter must be the last parameter",
                    ));
                }
            }

            let is_rest: bool = self.matches(TokenType::TRIPLE_DOT);
            let arg_name: String = self
                .consume(TokenType::IDENTIFIER, "Expected parameter name")?
                .lexeme
                .to_string();

            if args.iter().any(|a| a.name == arg_name) {
                return Err(QuillError::syntax(
                    self.previous().span,
                    format!("Duplicate parameter '{}'", arg_name),
                ));
            }

            let is_optional: bool = self.matches(TokenType::QMARK);
            let given_type = self.optional_type()?;
            let default = if self.matches(TokenType::EQUAL) {
                if is_rest {
                    return Err(QuillError::syntax(
                        self.previous().span,
                        "A rest parameter cannot have a default value",
                    ));
                }
                Some(self.expression()?)
            } else {
                None
            };

            args.push(ArgSpec {
                name: arg_name,
                given_type,
                default,
                is_optional,
                is_rest,
                span: self.span_from(arg_start),
            });

            self.skip_newlines();
            if !self.matches(TokenType::COMMA) {
                break;
            }
            self.skip_newlines();
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters")?;

        let body: Body = self.body()?;

        Ok(FuncDef {
            name,
            args,
            body: body.node,
            should_auto_return: body.arrow,
            span: self.span_from(start),
        })
    }

    /// `-> expr`, `: statement [end]` or `: NEWLINE statements end`.
    fn body(&mut self) -> Result<Body> {
        if self.matches(TokenType::ARROW) {
            self.skip_newlines();
            return Ok(Body {
                node: self.expression()?,
                arrow: true,
            });
        }

        self.consume(TokenType::COLON, "Expected '->' or ':' before body")?;

        if self.check(TokenType::NEWLINE) {
            let node: Node = self.statements()?;
            self.consume(TokenType::END, "Expected 'end' after body")?;

            Ok(Body { node, arrow: false })
        } else {
            let node: Node = self.statement()?;
            self.matches(TokenType::END);

            Ok(Body { node, arrow: false })
        }
    }

    // ─────────────────────────── HTML ─────────────────────────────

    /// `<name.class#id attr="..." attr={expr} @event={handler}> children </name>`
    /// or the self-closing `<name ... />`. The `<` is already consumed.
    fn html(&mut self, start: Span) -> Result<Node> {
        let tagname: String = self.consume_word("Expected a tag name after '<'")?;

        debug!("Parsing HTML literal <{}>", tagname);

        let mut classes: Vec<String> = Vec::new();
        let mut id: Option<String> = None;
        let mut attributes: Vec<HtmlAttribute> = Vec::new();
        let mut events: Vec<HtmlAttribute> = Vec::new();
        let mut children: Vec<Node> = Vec::new();

        while self.matches(TokenType::DOT) {
            classes.push(self.hyphenated_word("Expected a class name after '.'")?);
        }

        if self.matches(TokenType::HASH) {
            id = Some(self.hyphenated_word("Expected an id after '#'")?);
        }

        self.skip_newlines();
        loop {
            let attr_start: Span = self.peek().span;

            if self.matches(TokenType::AT) {
                let name: String = self.consume_word("Expected an event name after '@'")?;
                self.consume(TokenType::EQUAL, "Expected '=' after event name")?;
                let value: Node = self.attribute_value()?;

                events.push(HtmlAttribute {
                    name,
                    value,
                    span: self.span_from(attr_start),
                });
            } else if self.peek().is_word() {
                let name: String = self.hyphenated_word("Expected an attribute name")?;
                let value: Node = if self.matches(TokenType::EQUAL) {
                    self.attribute_value()?
                } else {
                    // bare attribute, e.g. `disabled`
                    Node::new(NodeKind::Boolean(true), attr_start)
                };

                attributes.push(HtmlAttribute {
                    name,
                    value,
                    span: self.span_from(attr_start),
                });
            } else {
                break;
            }

            self.skip_newlines();
        }

        if self.matches(TokenType::SLASH) {
            self.consume(TokenType::GREATER, "Expected '>' after '/'")?;
        } else {
            self.consume(TokenType::GREATER, "Expected '>' to close the opening tag")?;

            loop {
                self.skip_newlines();

                if self.check(TokenType::LESS) && self.check_next(TokenType::SLASH) {
                    break;
                }

                let child_start: Span = self.peek().span;

                if self.matches(TokenType::LEFT_BRACE) {
                    self.skip_newlines();
                    let child: Node = self.expression()?;
                    self.skip_newlines();
                    self.consume(TokenType::RIGHT_BRACE, "Expected '}' after child expression")?;
                    children.push(child);
                } else if self.matches(TokenType::LESS) {
                    children.push(self.html(child_start)?);
                } else if let TokenType::STRING(s) = &self.peek().token_type {
                    self.advance();
                    children.push(Node::new(NodeKind::Str(s.clone()), child_start));
                } else {
                    return Err(QuillError::syntax(
                        child_start,
                        format!("Expected a child or '</{}>'", tagname),
                    ));
                }
            }

            self.consume(TokenType::LESS, "Expected closing tag")?;
            self.consume(TokenType::SLASH, "Expected '/' in closing tag")?;

            let closing: String = self.consume_word("Expected tag name in closing tag")?;
            if closing != tagname {
                return Err(QuillError::syntax(
                    self.previous().span,
                    format!("Expected '</{}>' but found '</{}>'", tagname, closing),
                ));
            }

            self.consume(TokenType::GREATER, "Expected '>' after closing tag name")?;
        }

        let html = HtmlNode {
            tagname,
            classes,
            id,
            attributes,
            events,
            children,
        };

        Ok(Node::new(NodeKind::Html(Rc::new(html)), self.span_from(start)))
    }

    fn attribute_value(&mut self) -> Result<Node> {
        let start: Span = self.peek().span;

        match &self.peek().token_type {
            TokenType::STRING(s) => {
                self.advance();
                Ok(Node::new(NodeKind::Str(s.clone()), start))
            }
            TokenType::NUMBER(n) => {
                self.advance();
                Ok(Node::new(NodeKind::Number(*n), start))
            }
            TokenType::LEFT_BRACE => {
                self.advance();
                self.skip_newlines();
                let value: Node = self.expression()?;
                self.skip_newlines();
                self.consume(TokenType::RIGHT_BRACE, "Expected '}' after attribute value")?;
                Ok(value)
            }
            _ => Err(QuillError::syntax(
                start,
                "Expected a string, a number or '{expression}' as attribute value",
            )),
        }
    }

    /// `data-user-id`, `btn-primary`: words joined by `-` with no spaces.
    fn hyphenated_word(&mut self, message: &str) -> Result<String> {
        let mut word: String = self.consume_word(message)?;

        while self.check(TokenType::MINUS)
            && self.peek().span.start.idx == self.previous().span.end.idx
            && self.peek_next().is_word()
        {
            self.advance();
            word.push('-');
            word.push_str(self.advance().lexeme);
        }

        Ok(word)
    }

    // ────────────────────── utility helpers ───────────────────────

    fn optional_type(&mut self) -> Result<Option<String>> {
        if self.matches(TokenType::COLON) {
            Ok(Some(self.consume_word("Expected a type after ':'")?))
        } else {
            Ok(None)
        }
    }

    fn consume_word(&mut self, message: &str) -> Result<String> {
        if self.peek().is_word() {
            return Ok(self.advance().lexeme.to_string());
        }

        debug!("consume_word failed at {:?}", self.peek().token_type);

        Err(QuillError::syntax(self.peek().span, message))
    }

    fn span_from(&self, start: Span) -> Span {
        start.to(self.previous().span)
    }

    fn skip_newlines(&mut self) {
        while self.matches(TokenType::NEWLINE) {}
    }

    fn skip_separators(&mut self) {
        while self.matches(TokenType::NEWLINE) || self.matches(TokenType::SEMICOLON) {}
    }

    fn is_separator(&self) -> bool {
        self.check(TokenType::NEWLINE) || self.check(TokenType::SEMICOLON)
    }

    fn is_block_end(&self) -> bool {
        matches!(
            self.peek().token_type,
            TokenType::END
                | TokenType::ELIF
                | TokenType::ELSE
                | TokenType::CASE
                | TokenType::DEFAULT
                | TokenType::EOF
        )
    }

    fn is_statement_end(&self) -> bool {
        self.is_separator() || self.is_block_end()
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token<'a>> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        debug!(
            "consume failed: {} (found {:?})",
            message,
            self.peek().token_type
        );

        if self.is_at_end() {
            return Err(QuillError::syntax(
                self.peek().span,
                format!("Unexpected end of parsing: {}", message),
            ));
        }

        Err(QuillError::syntax(self.peek().span, message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        self.peek().token_type == ttype
    }

    fn check_next(&self, ttype: TokenType) -> bool {
        self.peek_next().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        let index = self.current.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn peek_next(&self) -> &'a Token<'a> {
        let index = (self.current + 1).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token<'a> {
        &self.tokens[self.current.saturating_sub(1)]
    }
}

enum Compound {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

fn binary(op: BinaryOp, left: Node, right: Node) -> Node {
    let span = left.span.to(right.span);

    Node::new(
        NodeKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

fn logical(op: LogicalOp, left: Node, right: Node) -> Node {
    let span = left.span.to(right.span);

    Node::new(
        NodeKind::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

/// Builds the assignment node matching the target's shape. The caller has
/// already checked [`Node::is_assignable`].
fn assignment(target: Node, value: Node, span: Span) -> Node {
    let kind = match target.kind {
        NodeKind::VarAccess(name) => NodeKind::VarModify {
            name,
            value: Box::new(value),
        },
        NodeKind::ListAccess { .. } => NodeKind::ListAssignment {
            access: Box::new(target),
            value: Box::new(value),
        },
        _ => NodeKind::AssignProperty {
            target: Box::new(target),
            value: Box::new(value),
        },
    };

    Node::new(kind, span)
}

/// Scan and parse `source` in one step.
pub fn parse_source(source: &str) -> Result<Node> {
    let tokens = crate::scanner::tokenize(source)?;
    let mut parser = Parser::new(&tokens);

    parser.parse()
}
