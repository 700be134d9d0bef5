//! Tree-walking evaluator.
//!
//! [`Interpreter::visit`] matches exhaustively on [`NodeKind`]; every
//! evaluator returns an [`IResult`]. Runtime errors and the `return`,
//! `break` and `continue` signals share the error channel, so `?` unwinds
//! all of them until a loop or a call boundary consumes the signal.
//!
//! Evaluation is plain recursion: very deep nesting or unbounded user
//! recursion is limited by the host stack.

mod access;
mod classes;
mod html;
pub mod operations;

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::ast::{FuncDef, LogicalOp, Node, NodeKind};
use crate::context::{Context, MethodFrame};
use crate::environment::ConstantRegistry;
use crate::error::{QuillError, Result};
use crate::native;
use crate::position::Span;
use crate::value::{type_matches, EnumValue, Function, OrderedMap, Value};

use self::operations::OperationError;

#[derive(Error, Debug)]
pub enum InterpretError {
    #[error(transparent)]
    Failure(#[from] QuillError),

    #[error("Return signal with value: {0}")]
    ReturnSignal(Value),

    #[error("Break signal")]
    BreakSignal,

    #[error("Continue signal")]
    ContinueSignal,
}

/// Convenient alias for interpreter results.
pub type IResult<T> = std::result::Result<T, InterpretError>;

pub struct Interpreter {
    globals: Rc<Context>,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter writing to stdout, with a fresh constant
    /// registry and the native functions and classes installed.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let constants = Rc::new(RefCell::new(ConstantRegistry::new()));
        let globals = Context::root(constants);

        native::register(&globals);

        Self { globals, output }
    }

    pub fn globals(&self) -> &Rc<Context> {
        &self.globals
    }

    /// Runs a whole program in the global context. A `return` outside any
    /// function ends the program with its value; a stray `break` or
    /// `continue` ends it with `none`.
    pub fn interpret(&mut self, program: &Node) -> Result<Value> {
        let globals = Rc::clone(&self.globals);
        let result = settle(self.visit(program, &globals));

        info!("Interpretation finished (ok: {})", result.is_ok());

        result
    }

    /// Calls a function value from host code (natives, renderers).
    pub fn call(&mut self, callee: &Value, args: Vec<Value>, span: Span) -> Result<Value> {
        let globals = Rc::clone(&self.globals);

        settle(self.call_value(callee, args, &globals, span))
    }

    /// Display form, honouring `__repr` on class instances.
    pub fn stringify(&mut self, value: &Value, span: Span) -> Result<String> {
        settle(self.repr_of(value, span)).map(|value| value.to_string())
    }

    pub(crate) fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{}", line)?;
        self.output.flush()
    }

    // ───────────────────────── dispatch ─────────────────────────

    pub fn visit(&mut self, node: &Node, ctx: &Rc<Context>) -> IResult<Value> {
        debug!("Evaluating node at {} in {}", node.span, ctx.display_name);

        let span = node.span;

        match &node.kind {
            NodeKind::Number(n) => Ok(Value::Number(*n)),
            NodeKind::Str(s) => Ok(Value::String(s.clone())),
            NodeKind::Boolean(b) => Ok(Value::Boolean(*b)),
            NodeKind::NoneLiteral => Ok(Value::None),

            NodeKind::List(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.visit(element, ctx)?);
                }
                Ok(Value::list(items))
            }

            NodeKind::Dict(entries) => {
                let mut map = OrderedMap::new();
                for entry in entries {
                    if map.contains_key(&entry.key) {
                        return Err(runtime(
                            ctx,
                            entry.span,
                            format!("Duplicate key '{}' in dictionary", entry.key),
                        ));
                    }
                    let value = self.visit(&entry.value, ctx)?;
                    map.insert(entry.key.clone(), value);
                }
                Ok(Value::dict(map))
            }

            NodeKind::Statements(statements) => {
                let mut values = Vec::with_capacity(statements.len());
                for statement in statements {
                    values.push(self.visit(statement, ctx)?);
                }
                Ok(Value::list(values))
            }

            NodeKind::VarAssign {
                name,
                given_type,
                value,
            } => self.declare_variable(name, given_type.as_deref(), value, ctx, span),

            NodeKind::Define {
                name,
                given_type,
                value,
            } => self.define_constant(name, given_type.as_deref(), value, ctx, span),

            NodeKind::VarModify { name, value } => {
                let value = self.visit(value, ctx)?;
                self.modify_variable(name, value, ctx, span)
            }

            NodeKind::VarAccess(name) => ctx
                .get(name)
                .ok_or_else(|| runtime(ctx, span, format!("'{}' is not defined", name))),

            NodeKind::Delete(target) => self.delete(target, ctx, span),

            NodeKind::Binary { op, left, right } => {
                let left = self.visit(left, ctx)?;
                let right = self.visit(right, ctx)?;

                operations::binary(*op, &left, &right).map_err(|e| {
                    operation_error(ctx, span, e, || {
                        format!(
                            "Illegal operation: {} {} {}",
                            left.type_name(),
                            op,
                            right.type_name()
                        )
                    })
                })
            }

            NodeKind::Logical { op, left, right } => {
                let left = self.visit(left, ctx)?;

                let short_circuit = match op {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::Nullish => !left.is_none(),
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.visit(right, ctx)
                }
            }

            NodeKind::Unary { op, operand } => {
                let operand = self.visit(operand, ctx)?;

                operations::unary(*op, &operand).map_err(|e| {
                    operation_error(ctx, span, e, || {
                        format!("Illegal operation: {}{}", op.symbol(), operand.type_name())
                    })
                })
            }

            NodeKind::Prefix { target, delta } => {
                let (_, updated) = self.step_value(target, *delta, ctx, span)?;
                Ok(updated)
            }

            NodeKind::Postfix { target, delta } => {
                let (previous, _) = self.step_value(target, *delta, ctx, span)?;
                Ok(previous)
            }

            NodeKind::ListAccess { .. }
            | NodeKind::Call { .. }
            | NodeKind::CallProperty { .. }
            | NodeKind::CallStaticProperty { .. } => {
                Ok(self.visit_link(node, ctx)?.unwrap_or(Value::None))
            }

            NodeKind::ListAssignment { access, value } => {
                let value = self.visit(value, ctx)?;
                self.assign_index(access, value.clone(), ctx)?;
                Ok(value)
            }

            NodeKind::If { cases, else_case } => {
                for case in cases {
                    if self.visit(&case.condition, ctx)?.is_truthy() {
                        let scope = Context::child(ctx, "<if>");
                        return self.visit(&case.body, &scope);
                    }
                }

                match else_case {
                    Some(body) => {
                        let scope = Context::child(ctx, "<else>");
                        self.visit(body, &scope)
                    }
                    None => Ok(Value::None),
                }
            }

            NodeKind::For {
                var_name,
                start,
                end,
                step,
                body,
            } => {
                let start = match start {
                    Some(node) => self.expect_number(node, ctx, "for loop start")?,
                    None => 0.0,
                };
                let end = self.expect_number(end, ctx, "for loop end")?;
                let step = match step {
                    Some(node) => self.expect_number(node, ctx, "for loop step")?,
                    None => 1.0,
                };

                if step == 0.0 {
                    return Err(runtime(ctx, span, "The step of a for loop cannot be 0"));
                }

                debug!("for {} from {} to {} step {}", var_name, start, end, step);

                let mut values = Vec::new();
                let mut i = start;

                while (step > 0.0 && i < end) || (step < 0.0 && i > end) {
                    let scope = Context::child(ctx, "<for>");
                    scope
                        .symbols
                        .borrow_mut()
                        .set(var_name, Value::Number(i), None);

                    if !self.run_iteration(body, &scope, &mut values)? {
                        break;
                    }

                    i += step;
                }

                Ok(Value::list(values))
            }

            NodeKind::Foreach {
                iterable,
                key_name,
                value_name,
                body,
            } => {
                let iterable_value = self.visit(iterable, ctx)?;

                let pairs: Vec<(Value, Value)> = match &iterable_value {
                    Value::List(items) => items
                        .borrow()
                        .iter()
                        .enumerate()
                        .map(|(i, v)| (Value::Number(i as f64), v.clone()))
                        .collect(),
                    Value::Dict(map) => map
                        .borrow()
                        .iter()
                        .map(|(k, v)| (Value::String(k.clone()), v.clone()))
                        .collect(),
                    Value::String(s) => s
                        .chars()
                        .enumerate()
                        .map(|(i, c)| (Value::Number(i as f64), Value::String(c.to_string())))
                        .collect(),
                    other => {
                        return Err(runtime(
                            ctx,
                            iterable.span,
                            format!("Cannot iterate over a value of type '{}'", other.type_name()),
                        ));
                    }
                };

                let mut values = Vec::new();

                for (key, value) in pairs {
                    let scope = Context::child(ctx, "<foreach>");
                    {
                        let mut symbols = scope.symbols.borrow_mut();
                        if let Some(key_name) = key_name {
                            symbols.set(key_name, key, None);
                        }
                        symbols.set(value_name, value, None);
                    }

                    if !self.run_iteration(body, &scope, &mut values)? {
                        break;
                    }
                }

                Ok(Value::list(values))
            }

            NodeKind::While { condition, body } => {
                let mut values = Vec::new();

                while self.visit(condition, ctx)?.is_truthy() {
                    let scope = Context::child(ctx, "<while>");

                    if !self.run_iteration(body, &scope, &mut values)? {
                        break;
                    }
                }

                Ok(Value::list(values))
            }

            NodeKind::FuncDef(def) => {
                let function = Value::Function(Rc::new(Function {
                    def: Rc::clone(def),
                    closure: Rc::clone(ctx),
                    bound: None,
                }));

                if let Some(name) = &def.name {
                    self.ensure_declarable(name, ctx, span)?;
                    info!("Function '{}' defined", name);
                    ctx.symbols.borrow_mut().set(name, function.clone(), None);
                }

                Ok(function)
            }

            NodeKind::Return(value) => {
                let value = match value {
                    Some(node) => self.visit(node, ctx)?,
                    None => Value::None,
                };
                debug!("Returning value: {:?}", value);
                Err(InterpretError::ReturnSignal(value))
            }

            NodeKind::Continue => Err(InterpretError::ContinueSignal),
            NodeKind::Break => Err(InterpretError::BreakSignal),

            NodeKind::ClassDef(def) => self.define_class(def, ctx),

            NodeKind::New { class_name, args } => {
                let args = self.visit_arguments(args, ctx)?;
                self.instantiate(class_name, args, ctx, span)
            }

            NodeKind::AssignProperty { target, value } => {
                let value = self.visit(value, ctx)?;
                self.assign_property(target, value.clone(), ctx)?;
                Ok(value)
            }

            NodeKind::Super(args) => {
                let args = self.visit_arguments(args, ctx)?;
                self.call_super(args, ctx, span)
            }

            NodeKind::Enum { name, members } => {
                let mut map = OrderedMap::new();
                for (ordinal, member) in members.iter().enumerate() {
                    if map.insert(member.clone(), ordinal).is_some() {
                        return Err(runtime(
                            ctx,
                            span,
                            format!("Duplicate member '{}' in enum '{}'", member, name),
                        ));
                    }
                }

                if ctx.symbols.borrow().lookup(name).is_some() {
                    return Err(runtime(ctx, span, format!("'{}' already exists", name)));
                }

                let value = Value::Enum(Rc::new(EnumValue {
                    name: name.clone(),
                    members: map,
                }));

                if !ctx.constants.borrow_mut().define(name, value.clone()) {
                    return Err(runtime(
                        ctx,
                        span,
                        format!("Constant '{}' already exists", name),
                    ));
                }

                info!("Enum '{}' defined with {} members", name, members.len());

                Ok(value)
            }

            NodeKind::Switch {
                subject,
                cases,
                default,
            } => {
                let subject = self.visit(subject, ctx)?;

                for case in cases {
                    for condition in &case.conditions {
                        let candidate = self.visit(condition, ctx)?;
                        if operations::equals(&subject, &candidate) {
                            let scope = Context::child(ctx, "<case>");
                            return self.visit(&case.body, &scope);
                        }
                    }
                }

                match default {
                    Some(body) => {
                        let scope = Context::child(ctx, "<default>");
                        self.visit(body, &scope)
                    }
                    None => Ok(Value::None),
                }
            }

            NodeKind::Typeof(operand) => {
                let value = self.visit(operand, ctx)?;
                Ok(Value::String(value.type_name()))
            }

            NodeKind::Instanceof { value, class } => {
                let value = self.visit(value, ctx)?;
                let class = self.visit(class, ctx)?;

                let class_name = match &class {
                    Value::Class(class) if !class.borrow().is_instance => {
                        class.borrow().name.clone()
                    }
                    other => {
                        return Err(runtime(
                            ctx,
                            span,
                            format!(
                                "The right side of 'instanceof' must be a class, got '{}'",
                                other.type_name()
                            ),
                        ));
                    }
                };

                Ok(Value::Boolean(match &value {
                    Value::Class(object) => {
                        let object = object.borrow();
                        object.is_instance && object.is_a(&class_name)
                    }
                    _ => false,
                }))
            }

            NodeKind::TagDef(def) => self.define_tag(def, ctx),

            NodeKind::Html(html) => self.evaluate_html(html, ctx, span),
        }
    }

    /// Evaluates one link of a postfix chain. `Ok(None)` means an optional
    /// link met `none` and the rest of the chain is skipped.
    fn visit_link(&mut self, node: &Node, ctx: &Rc<Context>) -> IResult<Option<Value>> {
        match &node.kind {
            NodeKind::CallProperty {
                base,
                property,
                optional,
            } => {
                let Some(base) = self.visit_link(base, ctx)? else {
                    return Ok(None);
                };
                if *optional && base.is_none() {
                    return Ok(None);
                }

                self.get_property(&base, property, false, *optional, ctx, node.span)
                    .map(Some)
            }

            NodeKind::CallStaticProperty {
                base,
                property,
                optional,
            } => {
                let Some(base) = self.visit_link(base, ctx)? else {
                    return Ok(None);
                };
                if *optional && base.is_none() {
                    return Ok(None);
                }

                self.get_property(&base, property, true, *optional, ctx, node.span)
                    .map(Some)
            }

            NodeKind::Call {
                callee,
                args,
                optional,
            } => {
                let callee_value = match &callee.kind {
                    // `obj.toString()` is built into every instance
                    NodeKind::CallProperty {
                        base,
                        property,
                        optional: link_optional,
                    } if property == "toString" => {
                        let Some(receiver) = self.visit_link(base, ctx)? else {
                            return Ok(None);
                        };
                        if *link_optional && receiver.is_none() {
                            return Ok(None);
                        }

                        if receiver.is_instance() {
                            if !args.is_empty() {
                                return Err(runtime(
                                    ctx,
                                    node.span,
                                    "'toString' takes no arguments",
                                ));
                            }
                            let text = self.repr_of(&receiver, node.span)?;
                            return Ok(Some(Value::String(text.to_string())));
                        }

                        self.get_property(&receiver, property, false, false, ctx, callee.span)?
                    }

                    _ => match self.visit_link(callee, ctx)? {
                        Some(value) => value,
                        None => return Ok(None),
                    },
                };

                if *optional && callee_value.is_none() {
                    return Ok(None);
                }

                let args = self.visit_arguments(args, ctx)?;

                self.call_value(&callee_value, args, ctx, node.span).map(Some)
            }

            NodeKind::ListAccess { base, indices } => self.access(base, indices, ctx),

            _ => self.visit(node, ctx).map(Some),
        }
    }

    fn visit_arguments(&mut self, args: &[Node], ctx: &Rc<Context>) -> IResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.visit(arg, ctx)?);
        }
        Ok(values)
    }

    /// Runs one loop iteration, collecting its value. Returns `false` when the
    /// body asked to `break`.
    fn run_iteration(
        &mut self,
        body: &Node,
        scope: &Rc<Context>,
        values: &mut Vec<Value>,
    ) -> IResult<bool> {
        match self.visit(body, scope) {
            Ok(value) => {
                values.push(value);
                Ok(true)
            }
            Err(InterpretError::ContinueSignal) => Ok(true),
            Err(InterpretError::BreakSignal) => Ok(false),
            Err(other) => Err(other),
        }
    }

    fn expect_number(&mut self, node: &Node, ctx: &Rc<Context>, what: &str) -> IResult<f64> {
        match self.visit(node, ctx)? {
            Value::Number(n) => Ok(n),
            other => Err(runtime(
                ctx,
                node.span,
                format!("Expected a number as {}, got '{}'", what, other.type_name()),
            )),
        }
    }

    // ───────────────────────── variables ─────────────────────────

    /// Names held by the constant registry or already declared in this very
    /// scope cannot be declared again.
    fn ensure_declarable(&self, name: &str, ctx: &Context, span: Span) -> IResult<()> {
        if ctx.is_constant(name) {
            return Err(runtime(
                ctx,
                span,
                format!("'{}' is a constant and cannot be redeclared", name),
            ));
        }

        if ctx.symbols.borrow().does_exist(name) {
            return Err(runtime(ctx, span, format!("'{}' already exists", name)));
        }

        Ok(())
    }

    fn declare_variable(
        &mut self,
        name: &str,
        given_type: Option<&str>,
        value: &Node,
        ctx: &Rc<Context>,
        span: Span,
    ) -> IResult<Value> {
        self.ensure_declarable(name, ctx, span)?;

        let value = self.visit(value, ctx)?;
        check_type(ctx, span, given_type, &value, name)?;

        debug!("Variable '{}' declared with value: {:?}", name, value);

        ctx.symbols
            .borrow_mut()
            .set(name, value.clone(), given_type.map(str::to_string));

        Ok(value)
    }

    fn define_constant(
        &mut self,
        name: &str,
        given_type: Option<&str>,
        value: &Node,
        ctx: &Rc<Context>,
        span: Span,
    ) -> IResult<Value> {
        if ctx.is_constant(name) {
            return Err(runtime(
                ctx,
                span,
                format!("Constant '{}' already exists", name),
            ));
        }

        let value = self.visit(value, ctx)?;
        check_type(ctx, span, given_type, &value, name)?;

        if !ctx.constants.borrow_mut().define(name, value.clone()) {
            return Err(runtime(
                ctx,
                span,
                format!("Constant '{}' already exists", name),
            ));
        }
        info!("Constant '{}' defined", name);

        Ok(value)
    }

    fn modify_variable(
        &mut self,
        name: &str,
        value: Value,
        ctx: &Rc<Context>,
        span: Span,
    ) -> IResult<Value> {
        if ctx.is_constant(name) {
            return Err(runtime(
                ctx,
                span,
                format!("Cannot assign to constant '{}'", name),
            ));
        }

        let symbol = ctx
            .symbols
            .borrow()
            .lookup(name)
            .ok_or_else(|| runtime(ctx, span, format!("'{}' is not defined", name)))?;

        check_type(ctx, span, symbol.given_type.as_deref(), &value, name)?;

        ctx.symbols.borrow_mut().modify(name, value.clone());

        Ok(value)
    }

    fn delete(&mut self, target: &Node, ctx: &Rc<Context>, span: Span) -> IResult<Value> {
        match &target.kind {
            NodeKind::VarAccess(name) => {
                if ctx.is_constant(name) {
                    return Err(runtime(
                        ctx,
                        span,
                        format!("Cannot delete constant '{}'", name),
                    ));
                }

                if !ctx.symbols.borrow_mut().remove(name) {
                    return Err(runtime(
                        ctx,
                        span,
                        format!("'{}' is not defined in this scope", name),
                    ));
                }

                Ok(Value::None)
            }

            NodeKind::ListAccess { .. } => {
                self.delete_index(target, ctx)?;
                Ok(Value::None)
            }

            _ => Err(runtime(ctx, span, "Invalid target for 'delete'")),
        }
    }

    /// Writes `value` through any assignable target.
    fn assign_to(&mut self, target: &Node, value: Value, ctx: &Rc<Context>) -> IResult<()> {
        match &target.kind {
            NodeKind::VarAccess(name) => {
                self.modify_variable(name, value, ctx, target.span)?;
                Ok(())
            }
            NodeKind::ListAccess { .. } => self.assign_index(target, value, ctx),
            NodeKind::CallProperty { .. } | NodeKind::CallStaticProperty { .. } => {
                self.assign_property(target, value, ctx)
            }
            _ => Err(runtime(ctx, target.span, "Invalid assignment target")),
        }
    }

    /// `++` and `--`: returns the old and the new value.
    fn step_value(
        &mut self,
        target: &Node,
        delta: f64,
        ctx: &Rc<Context>,
        span: Span,
    ) -> IResult<(Value, Value)> {
        let previous = self.visit(target, ctx)?;

        let updated = match &previous {
            Value::Number(n) => Value::Number(n + delta),
            Value::None => Value::Number(delta),
            other => {
                return Err(runtime(
                    ctx,
                    span,
                    format!("Cannot increment or decrement a value of type '{}'", other.type_name()),
                ));
            }
        };

        self.assign_to(target, updated.clone(), ctx)?;

        Ok((previous, updated))
    }

    // ───────────────────────── calls ─────────────────────────

    fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        ctx: &Context,
        span: Span,
    ) -> IResult<Value> {
        match callee {
            Value::NativeFunction(native) => {
                debug!("Calling native function '{}'", native.name);

                if let Some(arity) = native.arity {
                    if args.len() != arity {
                        return Err(runtime(
                            ctx,
                            span,
                            format!(
                                "'{}' expects {} argument(s) but got {}",
                                native.name,
                                arity,
                                args.len()
                            ),
                        ));
                    }
                }

                let result = (native.func)(self, &args, span)?;
                debug!("Native function '{}' returned: {:?}", native.name, result);

                Ok(result)
            }

            Value::Function(function) => self.call_function(function, args, span),

            Value::Class(class) if !class.borrow().is_instance => Err(runtime(
                ctx,
                span,
                format!(
                    "Class '{}' cannot be called; use 'new {}(...)'",
                    class.borrow().name,
                    class.borrow().name
                ),
            )),

            other => Err(runtime(
                ctx,
                span,
                format!("A value of type '{}' is not callable", other.type_name()),
            )),
        }
    }

    /// The call boundary: consumes `return` and swallows stray
    /// `break`/`continue`.
    fn call_function(&mut self, function: &Function, args: Vec<Value>, span: Span) -> IResult<Value> {
        let def: &FuncDef = &function.def;

        let (display_name, frame) = match &function.bound {
            Some(bound) => {
                let class_name = match &bound.owner {
                    Some(owner) => owner.borrow().name.clone(),
                    None => bound.receiver.borrow().name.clone(),
                };
                let frame = bound.owner.as_ref().map(|owner| MethodFrame {
                    class: Rc::clone(owner),
                    method: function.name().to_string(),
                });

                (
                    format!("<method {}.{}>", class_name, function.name()),
                    frame,
                )
            }
            None => (format!("<function {}>", function.name()), None),
        };

        debug!("Calling {}", display_name);

        let scope = Context::child_with_frame(&function.closure, display_name, frame);

        if let Some(bound) = &function.bound {
            scope
                .symbols
                .borrow_mut()
                .set("self", Value::Class(Rc::clone(&bound.receiver)), None);
        }

        self.bind_arguments(def, args, &scope, span)?;

        match self.visit(&def.body, &scope) {
            Ok(value) if def.should_auto_return => Ok(value),
            Ok(_) => Ok(Value::None),
            Err(InterpretError::ReturnSignal(value)) => Ok(value),
            Err(InterpretError::BreakSignal | InterpretError::ContinueSignal) => Ok(Value::None),
            Err(failure) => Err(failure),
        }
    }

    fn bind_arguments(
        &mut self,
        def: &FuncDef,
        args: Vec<Value>,
        scope: &Rc<Context>,
        span: Span,
    ) -> IResult<()> {
        let given = args.len();
        let accepts_rest = def.args.last().is_some_and(|arg| arg.is_rest);

        if !accepts_rest && given > def.args.len() {
            return Err(runtime(
                scope,
                span,
                format!(
                    "Expected at most {} argument(s) but got {}",
                    def.args.len(),
                    given
                ),
            ));
        }

        let mut args = args.into_iter();

        for spec in &def.args {
            let value = if spec.is_rest {
                Value::list(args.by_ref().collect())
            } else {
                match args.next() {
                    Some(value) => value,
                    None => match &spec.default {
                        Some(default) => self.visit(default, scope)?,
                        None if spec.is_optional => Value::None,
                        None => {
                            return Err(runtime(
                                scope,
                                span,
                                format!("Missing argument '{}' ({} given)", spec.name, given),
                            ));
                        }
                    },
                }
            };

            if !(spec.is_optional && value.is_none()) {
                check_type(scope, span, spec.given_type.as_deref(), &value, &spec.name)?;
            }

            scope
                .symbols
                .borrow_mut()
                .set(&spec.name, value, spec.given_type.clone());
        }

        Ok(())
    }
}

/// Turns a boundary result into a plain value: signals that reached the top
/// end evaluation quietly.
fn settle(result: IResult<Value>) -> Result<Value> {
    match result {
        Ok(value) | Err(InterpretError::ReturnSignal(value)) => Ok(value),
        Err(InterpretError::BreakSignal | InterpretError::ContinueSignal) => Ok(Value::None),
        Err(InterpretError::Failure(error)) => Err(error),
    }
}

pub(crate) fn runtime<S: Into<String>>(ctx: &Context, span: Span, msg: S) -> InterpretError {
    QuillError::runtime(span, &ctx.display_name, msg).into()
}

fn operation_error(
    ctx: &Context,
    span: Span,
    error: OperationError,
    illegal: impl FnOnce() -> String,
) -> InterpretError {
    match error {
        OperationError::Illegal => runtime(ctx, span, illegal()),
        other => runtime(ctx, span, other.to_string()),
    }
}

/// Declared-type check shared by variables, constants, arguments, class
/// properties and tag members.
pub(crate) fn check_type(
    ctx: &Context,
    span: Span,
    expected: Option<&str>,
    value: &Value,
    subject: &str,
) -> IResult<()> {
    match expected {
        Some(expected) if !type_matches(expected, value) => Err(QuillError::type_mismatch(
            span,
            &ctx.display_name,
            &value.type_name(),
            expected,
            format!("'{}' has a declared type", subject),
        )
        .into()),
        _ => Ok(()),
    }
}
