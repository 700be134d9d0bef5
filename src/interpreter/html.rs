//! Tag definitions and HTML literals.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, info};
use phf::{phf_map, phf_set};

use crate::ast::{HtmlNode, TagDef, Visibility};
use crate::context::Context;
use crate::position::Span;
use crate::value::{
    ClassObject, Html, Member, MemberKind, OrderedMap, TagMember, TagMemberKind, TagObject, Value,
};

use super::classes::bind;
use super::{check_type, runtime, IResult, Interpreter};

/// Attributes every native element accepts.
static GLOBAL_ATTRIBUTES: phf::Set<&'static str> = phf_set! {
    "accesskey", "class", "contenteditable", "dir", "draggable", "hidden", "id",
    "lang", "role", "spellcheck", "style", "tabindex", "title", "translate",
};

/// Native elements and the attributes they add to the global set.
static NATIVE_TAGS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "a" => &["href", "target", "rel", "download", "hreflang", "type"],
    "abbr" => &[],
    "article" => &[],
    "aside" => &[],
    "b" => &[],
    "blockquote" => &["cite"],
    "br" => &[],
    "button" => &["disabled", "name", "type", "value", "form"],
    "code" => &[],
    "div" => &[],
    "em" => &[],
    "footer" => &[],
    "form" => &["action", "method", "enctype", "name", "novalidate", "target"],
    "h1" => &[],
    "h2" => &[],
    "h3" => &[],
    "h4" => &[],
    "h5" => &[],
    "h6" => &[],
    "header" => &[],
    "hr" => &[],
    "i" => &[],
    "img" => &["src", "alt", "width", "height", "loading", "srcset"],
    "input" => &[
        "type", "name", "value", "placeholder", "checked", "disabled", "readonly",
        "required", "min", "max", "step", "maxlength", "pattern", "autocomplete",
    ],
    "label" => &["for", "form"],
    "li" => &["value"],
    "main" => &[],
    "nav" => &[],
    "ol" => &["reversed", "start", "type"],
    "option" => &["disabled", "label", "selected", "value"],
    "p" => &[],
    "pre" => &[],
    "section" => &[],
    "select" => &["disabled", "multiple", "name", "required", "size"],
    "small" => &[],
    "span" => &[],
    "strong" => &[],
    "table" => &[],
    "tbody" => &[],
    "td" => &["colspan", "rowspan", "headers"],
    "textarea" => &["cols", "rows", "name", "placeholder", "disabled", "readonly", "required", "maxlength"],
    "th" => &["colspan", "rowspan", "headers", "scope"],
    "thead" => &[],
    "tr" => &[],
    "ul" => &[],
};

fn is_native_attribute(tagname: &str, attribute: &str) -> bool {
    GLOBAL_ATTRIBUTES.contains(attribute)
        || attribute.starts_with("data-")
        || attribute.starts_with("aria-")
        || NATIVE_TAGS
            .get(tagname)
            .is_some_and(|extra| extra.contains(&attribute))
}

/// Appends `value` to `children`, splicing lists and dropping `none`.
fn flatten_into(children: &mut Vec<Value>, value: Value) {
    match value {
        Value::None => {}
        Value::List(items) => {
            for item in items.borrow().iter() {
                flatten_into(children, item.clone());
            }
        }
        other => children.push(other),
    }
}

impl Interpreter {
    pub(super) fn define_tag(&mut self, def: &Rc<TagDef>, ctx: &Rc<Context>) -> IResult<Value> {
        let name = &def.name;

        if ctx.is_constant(name) || ctx.symbols.borrow().does_exist(name) {
            return Err(runtime(
                ctx,
                def.span,
                format!("Tag '{}' already exists", name),
            ));
        }

        if NATIVE_TAGS.contains_key(name.as_str()) {
            return Err(runtime(
                ctx,
                def.span,
                format!("'{}' is a native element and cannot be redefined", name),
            ));
        }

        let tag_ctx = Context::child(ctx, format!("<Tag {}>", name));
        let mut members: OrderedMap<TagMember> = OrderedMap::new();

        for member in &def.members {
            let declared = match &member.kind {
                crate::ast::TagMemberKind::Prop {
                    given_type,
                    default,
                    is_optional,
                } => {
                    let value = match default {
                        Some(node) => {
                            let value = self.visit(node, &tag_ctx)?;
                            check_type(&tag_ctx, member.span, given_type.as_deref(), &value, &member.name)?;
                            value
                        }
                        None => Value::None,
                    };

                    TagMember {
                        kind: TagMemberKind::Prop {
                            is_optional: *is_optional || default.is_some(),
                        },
                        value,
                        given_type: given_type.clone(),
                    }
                }

                crate::ast::TagMemberKind::State { given_type, value } => {
                    let value = self.visit(value, &tag_ctx)?;
                    check_type(&tag_ctx, member.span, given_type.as_deref(), &value, &member.name)?;

                    TagMember {
                        kind: TagMemberKind::State,
                        value,
                        given_type: given_type.clone(),
                    }
                }

                crate::ast::TagMemberKind::Method(func) => TagMember {
                    kind: TagMemberKind::Method(Rc::clone(func)),
                    value: Value::None,
                    given_type: None,
                },
            };

            if member.name == "children" {
                return Err(runtime(
                    &tag_ctx,
                    member.span,
                    "'children' is reserved for the tag's child nodes",
                ));
            }

            if members.contains_key(&member.name) {
                return Err(runtime(
                    &tag_ctx,
                    member.span,
                    format!("'{}' is declared more than once", member.name),
                ));
            }

            members.insert(member.name.clone(), declared);
        }

        let tag = Rc::new(TagObject {
            name: name.clone(),
            members,
            context: tag_ctx,
        });

        ctx.symbols
            .borrow_mut()
            .set(name, Value::Tag(Rc::clone(&tag)), None);

        info!("Tag '{}' defined with {} members", name, tag.members.len());

        Ok(Value::Tag(tag))
    }

    pub(super) fn evaluate_html(
        &mut self,
        html: &Rc<HtmlNode>,
        ctx: &Rc<Context>,
        span: Span,
    ) -> IResult<Value> {
        let tagname = html.tagname.as_str();

        let user_tag = match ctx.get(tagname) {
            Some(Value::Tag(tag)) => Some(tag),
            _ => None,
        };

        if user_tag.is_none() && !NATIVE_TAGS.contains_key(tagname) {
            return Err(runtime(ctx, span, format!("Unknown tag '{}'", tagname)));
        }

        let mut attributes = Vec::with_capacity(html.attributes.len());
        for attribute in &html.attributes {
            if user_tag.is_none() && !is_native_attribute(tagname, &attribute.name) {
                return Err(runtime(
                    ctx,
                    attribute.span,
                    format!("'{}' is not a valid attribute of <{}>", attribute.name, tagname),
                ));
            }

            let value = self.visit(&attribute.value, ctx)?;
            attributes.push((attribute.name.clone(), value));
        }

        let mut events = Vec::with_capacity(html.events.len());
        for event in &html.events {
            let handler = self.visit(&event.value, ctx)?;

            if !handler.is_callable() {
                return Err(runtime(
                    ctx,
                    event.span,
                    format!(
                        "Handler for '@{}' must be callable, got '{}'",
                        event.name,
                        handler.type_name()
                    ),
                ));
            }

            events.push((event.name.clone(), handler));
        }

        let mut children = Vec::new();
        for child in &html.children {
            let value = self.visit(child, ctx)?;
            flatten_into(&mut children, value);
        }

        let Some(tag) = user_tag else {
            return Ok(Value::Html(Rc::new(Html {
                tagname: tagname.to_string(),
                classes: html.classes.clone(),
                id: html.id.clone(),
                attributes,
                events,
                children,
                component: None,
            })));
        };

        let rendered = self.render_tag(&tag, &attributes, children, ctx, span)?;

        let mut output = Vec::new();
        flatten_into(&mut output, rendered);

        Ok(Value::Html(Rc::new(Html {
            tagname: tagname.to_string(),
            classes: html.classes.clone(),
            id: html.id.clone(),
            attributes,
            events,
            children: output,
            component: Some(tag.name.clone()),
        })))
    }

    /// Builds an instance of `tag` from the given props and returns what its
    /// `render()` produces.
    fn render_tag(
        &mut self,
        tag: &Rc<TagObject>,
        attributes: &[(String, Value)],
        children: Vec<Value>,
        ctx: &Rc<Context>,
        span: Span,
    ) -> IResult<Value> {
        for (name, value) in attributes {
            let declared = match tag.members.get(name) {
                Some(member) if matches!(member.kind, TagMemberKind::Prop { .. }) => member,
                _ => {
                    return Err(runtime(
                        ctx,
                        span,
                        format!("<{}> has no prop '{}'", tag.name, name),
                    ));
                }
            };

            check_type(ctx, span, declared.given_type.as_deref(), value, name)?;
        }

        let mut members: OrderedMap<Member> = OrderedMap::new();

        for (name, member) in tag.members.iter() {
            let kind = match &member.kind {
                TagMemberKind::Prop { is_optional } => {
                    let value = attributes
                        .iter()
                        .find(|(attribute, _)| attribute == name)
                        .map(|(_, value)| value.clone());

                    match value {
                        Some(value) => MemberKind::Property(value),
                        None if *is_optional => MemberKind::Property(member.value.deep_clone()),
                        None => {
                            return Err(runtime(
                                ctx,
                                span,
                                format!("<{}> requires prop '{}'", tag.name, name),
                            ));
                        }
                    }
                }
                TagMemberKind::State => MemberKind::Property(member.value.deep_clone()),
                TagMemberKind::Method(def) => MemberKind::Method(Rc::clone(def)),
            };

            members.insert(
                name.clone(),
                Member {
                    kind,
                    visibility: Visibility::Public,
                    is_static: false,
                    is_override: false,
                    given_type: member.given_type.clone(),
                    owner: Weak::new(),
                },
            );
        }

        members.insert(
            "children".to_string(),
            Member {
                kind: MemberKind::Property(Value::list(children)),
                visibility: Visibility::Public,
                is_static: false,
                is_override: false,
                given_type: None,
                owner: Weak::new(),
            },
        );

        let instance = Rc::new(RefCell::new(ClassObject {
            name: tag.name.clone(),
            members,
            parent: None,
            is_instance: true,
            context: Rc::clone(&tag.context),
        }));

        let render = instance.borrow().members.get("render").cloned();

        match render {
            Some(member) => match &member.kind {
                MemberKind::Method(def) => {
                    debug!("Rendering <{}>", tag.name);

                    let function = bind(def, &member, &instance);
                    self.call_function(&function, Vec::new(), span)
                }
                _ => Err(runtime(
                    ctx,
                    span,
                    format!("'render' of <{}> must be a method", tag.name),
                )),
            },
            None => Err(runtime(
                ctx,
                span,
                format!("<{}> has no 'render' method", tag.name),
            )),
        }
    }
}
