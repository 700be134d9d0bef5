//! Classes and instances.
//!
//! A class flattens its parent's non-private members into its own member
//! map when it is defined; there is no live delegation afterwards.
//! Instances copy the non-static members, deep-copying property defaults.
//!
//! Private and protected members are checked by context name: the access
//! must happen inside a frame named `<Class Owner>`, where `Owner` is the
//! instance's class (private) or any class in its lineage (protected).

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{ClassDef, ClassMemberDef, ClassMemberKind, FuncDef, Node, NodeKind, Visibility};
use crate::context::Context;
use crate::position::Span;
use crate::value::{BoundMethod, ClassObject, ClassRef, Function, Member, MemberKind, OrderedMap, Value};

use super::{check_type, runtime, IResult, Interpreter};

const RESERVED: [&str; 2] = ["__name", "toString"];
const SPECIAL_METHODS: [&str; 2] = ["__init", "__repr"];

/// Function value for `member` called on `receiver`.
pub(super) fn bind(def: &Rc<FuncDef>, member: &Member, receiver: &ClassRef) -> Function {
    let owner = member.owner.upgrade();
    let closure = match &owner {
        Some(owner) => Rc::clone(&owner.borrow().context),
        None => Rc::clone(&receiver.borrow().context),
    };

    Function {
        def: Rc::clone(def),
        closure,
        bound: Some(BoundMethod {
            receiver: Rc::clone(receiver),
            owner,
        }),
    }
}

fn check_visibility(
    member: &Member,
    object: &ClassObject,
    name: &str,
    ctx: &Context,
    span: Span,
) -> IResult<()> {
    let allowed = match member.visibility {
        Visibility::Public => true,
        Visibility::Private => ctx.is_inside(&format!("<Class {}>", object.name)),
        Visibility::Protected => object
            .lineage()
            .iter()
            .any(|class| ctx.is_inside(&format!("<Class {}>", class))),
    };

    if allowed {
        Ok(())
    } else {
        Err(runtime(
            ctx,
            span,
            format!(
                "'{}' is {} in class '{}'",
                name, member.visibility, object.name
            ),
        ))
    }
}

fn check_static_access(
    member: &Member,
    name: &str,
    is_static_access: bool,
    ctx: &Context,
    span: Span,
) -> IResult<()> {
    match (member.is_static, is_static_access) {
        (true, false) => Err(runtime(
            ctx,
            span,
            format!("'{}' is static; access it with '::'", name),
        )),
        (false, true) => Err(runtime(
            ctx,
            span,
            format!("'{}' is not static; access it with '.'", name),
        )),
        _ => Ok(()),
    }
}

impl Interpreter {
    pub(super) fn define_class(&mut self, def: &Rc<ClassDef>, ctx: &Rc<Context>) -> IResult<Value> {
        let name = &def.name;

        debug!("Defining class '{}'", name);

        if ctx.is_constant(name) || ctx.symbols.borrow().does_exist(name) {
            return Err(runtime(
                ctx,
                def.span,
                format!("Class '{}' already exists", name),
            ));
        }

        let parent: Option<ClassRef> = match &def.parent {
            Some(parent_name) => match ctx.get(parent_name) {
                Some(Value::Class(class)) if !class.borrow().is_instance => Some(class),
                Some(other) => {
                    return Err(runtime(
                        ctx,
                        def.span,
                        format!(
                            "'{}' is a '{}', classes can only extend classes",
                            parent_name,
                            other.type_name()
                        ),
                    ));
                }
                None => {
                    return Err(runtime(
                        ctx,
                        def.span,
                        format!("Parent class '{}' is not defined", parent_name),
                    ));
                }
            },
            None => None,
        };

        let class_ctx = Context::child(ctx, format!("<Class {}>", name));

        let mut members: OrderedMap<Member> = OrderedMap::new();
        if let Some(parent) = &parent {
            for (member_name, member) in parent.borrow().members.iter() {
                if member.visibility != Visibility::Private {
                    members.insert(member_name.clone(), member.clone());
                }
            }
        }
        let inherited: HashSet<String> = members.keys().cloned().collect();

        let class = Rc::new(RefCell::new(ClassObject {
            name: name.clone(),
            members,
            parent,
            is_instance: false,
            context: Rc::clone(&class_ctx),
        }));

        for member in &def.members {
            self.validate_member(member, &inherited, &class_ctx)?;
        }

        let mut own: HashSet<&str> = HashSet::new();

        let methods = def
            .members
            .iter()
            .filter(|m| matches!(m.kind, ClassMemberKind::Method(_)));
        for member in methods {
            if let ClassMemberKind::Method(func) = &member.kind {
                claim(&mut own, member, &class_ctx)?;
                insert_member(&class, member, MemberKind::Method(Rc::clone(func)), None);
            }
        }

        // Defaults see the class under construction as `self` and by name.
        let defaults_ctx = Context::child(&class_ctx, format!("<Class {}>", name));
        {
            let mut symbols = defaults_ctx.symbols.borrow_mut();
            symbols.set("self", Value::Class(Rc::clone(&class)), None);
            symbols.set(name, Value::Class(Rc::clone(&class)), None);
        }

        let properties = def
            .members
            .iter()
            .filter(|m| matches!(m.kind, ClassMemberKind::Property { .. }));
        for member in properties {
            if let ClassMemberKind::Property { given_type, value } = &member.kind {
                claim(&mut own, member, &class_ctx)?;

                let initial = match value {
                    Some(node) => self.visit(node, &defaults_ctx)?,
                    None => Value::None,
                };

                if value.is_some() {
                    check_type(&class_ctx, member.span, given_type.as_deref(), &initial, &member.name)?;
                }

                insert_member(
                    &class,
                    member,
                    MemberKind::Property(initial),
                    given_type.clone(),
                );
            }
        }

        let getters = def
            .members
            .iter()
            .filter(|m| matches!(m.kind, ClassMemberKind::Getter(_)));
        for member in getters {
            if let ClassMemberKind::Getter(func) = &member.kind {
                claim(&mut own, member, &class_ctx)?;
                insert_member(
                    &class,
                    member,
                    MemberKind::Accessor {
                        getter: Some(Rc::clone(func)),
                        setter: None,
                    },
                    None,
                );
            }
        }

        let setters = def
            .members
            .iter()
            .filter(|m| matches!(m.kind, ClassMemberKind::Setter(_)));
        for member in setters {
            if let ClassMemberKind::Setter(func) = &member.kind {
                let paired = {
                    let mut class = class.borrow_mut();
                    match class.members.get_mut(&member.name) {
                        Some(Member {
                            kind: MemberKind::Accessor { setter, .. },
                            ..
                        }) if own.contains(member.name.as_str()) && setter.is_none() => {
                            *setter = Some(Rc::clone(func));
                            true
                        }
                        _ => false,
                    }
                };

                if !paired {
                    claim(&mut own, member, &class_ctx)?;
                    insert_member(
                        &class,
                        member,
                        MemberKind::Accessor {
                            getter: None,
                            setter: Some(Rc::clone(func)),
                        },
                        None,
                    );
                }
            }
        }

        ctx.symbols
            .borrow_mut()
            .set(name, Value::Class(Rc::clone(&class)), None);

        info!(
            "Class '{}' defined with {} members",
            name,
            class.borrow().members.len()
        );

        Ok(Value::Class(class))
    }

    fn validate_member(
        &self,
        member: &ClassMemberDef,
        inherited: &HashSet<String>,
        ctx: &Context,
    ) -> IResult<()> {
        let name = member.name.as_str();

        if RESERVED.contains(&name) {
            return Err(runtime(
                ctx,
                member.span,
                format!("'{}' is reserved and cannot be declared", name),
            ));
        }

        if SPECIAL_METHODS.contains(&name) {
            let is_method = matches!(member.kind, ClassMemberKind::Method(_));

            if !is_method
                || member.visibility != Visibility::Public
                || member.is_static
                || member.is_override
            {
                return Err(runtime(
                    ctx,
                    member.span,
                    format!(
                        "'{}' must be a public, non-static method declared without 'override'",
                        name
                    ),
                ));
            }

            if let ClassMemberKind::Method(func) = &member.kind {
                if name == "__repr" && !func.args.is_empty() {
                    return Err(runtime(ctx, member.span, "'__repr' takes no arguments"));
                }
            }

            return Ok(());
        }

        if inherited.contains(name) && !member.is_override {
            return Err(runtime(
                ctx,
                member.span,
                format!(
                    "'{}' is already defined by a parent class; declare it with 'override'",
                    name
                ),
            ));
        }

        Ok(())
    }

    pub(super) fn instantiate(
        &mut self,
        class_name: &str,
        args: Vec<Value>,
        ctx: &Rc<Context>,
        span: Span,
    ) -> IResult<Value> {
        let class = match ctx.get(class_name) {
            Some(Value::Class(class)) if !class.borrow().is_instance => class,
            Some(other) => {
                return Err(runtime(
                    ctx,
                    span,
                    format!("'{}' is a '{}', not a class", class_name, other.type_name()),
                ));
            }
            None => {
                return Err(runtime(
                    ctx,
                    span,
                    format!("Class '{}' is not defined", class_name),
                ));
            }
        };

        let instance = {
            let class = class.borrow();

            let members: OrderedMap<Member> = class
                .members
                .iter()
                .filter(|(_, member)| !member.is_static)
                .map(|(name, member)| {
                    let mut member = member.clone();
                    if let MemberKind::Property(value) = &member.kind {
                        member.kind = MemberKind::Property(value.deep_clone());
                    }
                    (name.clone(), member)
                })
                .collect();

            Rc::new(RefCell::new(ClassObject {
                name: class.name.clone(),
                members,
                parent: class.parent.clone(),
                is_instance: true,
                context: Rc::clone(&class.context),
            }))
        };

        debug!("Instantiated '{}'", class_name);

        let init = instance.borrow().members.get("__init").cloned();

        match init {
            Some(member) => {
                if let MemberKind::Method(def) = &member.kind {
                    let constructor = bind(def, &member, &instance);
                    self.call_function(&constructor, args, span)?;
                }
            }
            None if !args.is_empty() => {
                return Err(runtime(
                    ctx,
                    span,
                    format!(
                        "Class '{}' has no '__init' but got {} argument(s)",
                        class_name,
                        args.len()
                    ),
                ));
            }
            None => {}
        }

        Ok(Value::Class(instance))
    }

    /// `base.property` (`is_static == false`) or `base::property`.
    pub(super) fn get_property(
        &mut self,
        base: &Value,
        property: &str,
        is_static: bool,
        optional: bool,
        ctx: &Rc<Context>,
        span: Span,
    ) -> IResult<Value> {
        match base {
            Value::Class(object) => {
                if property == "__name" {
                    return Ok(Value::String(object.borrow().name.clone()));
                }

                let member = object.borrow().members.get(property).cloned();

                let Some(member) = member else {
                    if is_static && !optional {
                        return Err(runtime(
                            ctx,
                            span,
                            format!(
                                "Static member '{}' does not exist on '{}'",
                                property,
                                object.borrow().name
                            ),
                        ));
                    }
                    return Ok(Value::None);
                };

                check_static_access(&member, property, is_static, ctx, span)?;
                check_visibility(&member, &object.borrow(), property, ctx, span)?;

                match &member.kind {
                    MemberKind::Property(value) => Ok(value.clone()),

                    MemberKind::Method(def) => {
                        let function = if object.borrow().is_instance {
                            bind(def, &member, object)
                        } else {
                            Function {
                                def: Rc::clone(def),
                                closure: Rc::clone(&object.borrow().context),
                                bound: None,
                            }
                        };
                        Ok(Value::Function(Rc::new(function)))
                    }

                    MemberKind::Accessor { getter, .. } => match getter {
                        Some(def) => {
                            let getter = bind(def, &member, object);
                            self.call_function(&getter, Vec::new(), span)
                        }
                        None => Err(runtime(
                            ctx,
                            span,
                            format!("'{}' has a setter but no getter", property),
                        )),
                    },
                }
            }

            Value::NativeClass(class) => match class.properties.get(property) {
                Some(crate::value::NativeProperty::Data(value)) => Ok(value.clone()),
                Some(crate::value::NativeProperty::Computed(compute)) => Ok(compute(span)?),
                None if optional => Ok(Value::None),
                None => Err(runtime(
                    ctx,
                    span,
                    format!("'{}' does not exist on '{}'", property, class.name),
                )),
            },

            Value::Enum(enumeration) => match enumeration.members.get(property) {
                Some(ordinal) => Ok(Value::Number(*ordinal as f64)),
                None if optional => Ok(Value::None),
                None => Err(runtime(
                    ctx,
                    span,
                    format!(
                        "'{}' is not a member of enum '{}'",
                        property, enumeration.name
                    ),
                )),
            },

            Value::Dict(map) if !is_static => {
                Ok(map.borrow().get(property).cloned().unwrap_or(Value::None))
            }

            other => Err(runtime(
                ctx,
                span,
                format!(
                    "Cannot read property '{}' of a value of type '{}'",
                    property,
                    other.type_name()
                ),
            )),
        }
    }

    /// Assignment to `obj.prop` or `Class::prop`.
    pub(super) fn assign_property(
        &mut self,
        target: &Node,
        value: Value,
        ctx: &Rc<Context>,
    ) -> IResult<()> {
        let (base, property, is_static) = match &target.kind {
            NodeKind::CallProperty { base, property, .. } => (base, property, false),
            NodeKind::CallStaticProperty { base, property, .. } => (base, property, true),
            _ => return Err(runtime(ctx, target.span, "Invalid assignment target")),
        };

        let span = target.span;
        let base = self.visit(base, ctx)?;

        match &base {
            Value::Class(object) => {
                if property == "__name" {
                    return Err(runtime(ctx, span, "'__name' is read-only"));
                }

                let member = object.borrow().members.get(property).cloned();

                let Some(member) = member else {
                    if is_static || !object.borrow().is_instance {
                        return Err(runtime(
                            ctx,
                            span,
                            format!(
                                "'{}' does not exist on '{}'",
                                property,
                                object.borrow().name
                            ),
                        ));
                    }

                    debug!("Adding property '{}' to an instance", property);

                    let owner = Rc::downgrade(object);
                    object.borrow_mut().members.insert(
                        property.clone(),
                        Member {
                            kind: MemberKind::Property(value),
                            visibility: Visibility::Public,
                            is_static: false,
                            is_override: false,
                            given_type: None,
                            owner,
                        },
                    );
                    return Ok(());
                };

                check_static_access(&member, property, is_static, ctx, span)?;
                check_visibility(&member, &object.borrow(), property, ctx, span)?;

                match &member.kind {
                    MemberKind::Property(_) => {
                        check_type(ctx, span, member.given_type.as_deref(), &value, property)?;

                        if let Some(slot) = object.borrow_mut().members.get_mut(property) {
                            slot.kind = MemberKind::Property(value);
                        }
                        Ok(())
                    }

                    MemberKind::Accessor { setter, .. } => match setter {
                        Some(def) => {
                            let setter = bind(def, &member, object);
                            self.call_function(&setter, vec![value], span)?;
                            Ok(())
                        }
                        None => Err(runtime(
                            ctx,
                            span,
                            format!("'{}' has a getter but no setter", property),
                        )),
                    },

                    MemberKind::Method(_) => Err(runtime(
                        ctx,
                        span,
                        format!("Cannot assign to method '{}'", property),
                    )),
                }
            }

            Value::Dict(map) if !is_static => {
                map.borrow_mut().insert(property.clone(), value);
                Ok(())
            }

            other => Err(runtime(
                ctx,
                span,
                format!(
                    "Cannot set property '{}' on a value of type '{}'",
                    property,
                    other.type_name()
                ),
            )),
        }
    }

    /// Runs the parent's version of the executing method with the same
    /// `self`.
    pub(super) fn call_super(
        &mut self,
        args: Vec<Value>,
        ctx: &Rc<Context>,
        span: Span,
    ) -> IResult<Value> {
        let frame = ctx
            .method_frame()
            .ok_or_else(|| runtime(ctx, span, "'super' can only be used inside a method"))?;

        let parent = frame.class.borrow().parent.clone().ok_or_else(|| {
            runtime(
                ctx,
                span,
                format!("Class '{}' has no parent class", frame.class.borrow().name),
            )
        })?;

        let member = parent
            .borrow()
            .members
            .get(&frame.method)
            .cloned()
            .ok_or_else(|| {
                runtime(
                    ctx,
                    span,
                    format!(
                        "Parent class '{}' has no method '{}'",
                        parent.borrow().name,
                        frame.method
                    ),
                )
            })?;

        let MemberKind::Method(def) = &member.kind else {
            return Err(runtime(
                ctx,
                span,
                format!("'{}' is not a method of '{}'", frame.method, parent.borrow().name),
            ));
        };

        let Some(Value::Class(receiver)) = ctx.get("self") else {
            return Err(runtime(ctx, span, "'super' needs an instance"));
        };

        debug!("super() -> {}.{}", parent.borrow().name, frame.method);

        let mut function = bind(def, &member, &receiver);
        if let Some(bound) = &mut function.bound {
            bound.owner.get_or_insert_with(|| Rc::clone(&parent));
        }

        self.call_function(&function, args, span)
    }

    /// `__repr()` for instances that declare it; the value itself otherwise.
    pub(super) fn repr_of(&mut self, value: &Value, span: Span) -> IResult<Value> {
        let Value::Class(object) = value else {
            return Ok(value.clone());
        };

        let repr = object.borrow().members.get("__repr").cloned();

        match repr {
            Some(member) if object.borrow().is_instance => match &member.kind {
                MemberKind::Method(def) => {
                    let function = bind(def, &member, object);
                    self.call_function(&function, Vec::new(), span)
                }
                _ => Ok(value.clone()),
            },
            _ => Ok(value.clone()),
        }
    }
}

/// Records `member` as declared by the class body, rejecting duplicates.
fn claim<'d>(own: &mut HashSet<&'d str>, member: &'d ClassMemberDef, ctx: &Context) -> IResult<()> {
    if !own.insert(member.name.as_str()) {
        return Err(runtime(
            ctx,
            member.span,
            format!("'{}' is declared more than once", member.name),
        ));
    }

    Ok(())
}

fn insert_member(class: &ClassRef, def: &ClassMemberDef, kind: MemberKind, given_type: Option<String>) {
    let owner = Rc::downgrade(class);

    class.borrow_mut().members.insert(
        def.name.clone(),
        Member {
            kind,
            visibility: def.visibility,
            is_static: def.is_static,
            is_override: def.is_override,
            given_type,
            owner,
        },
    );
}
