use crate::ast::{ArgSpec, FuncDef, IndexKind, Node, NodeKind};
use crate::value::format_number;

/// Renders a [`Node`] tree in parenthesized prefix form, one construct per
/// list: `(+ (+ 27 14) 8)`, `(var x (list 1 2))`, `(class Dog : Animal ...)`.
pub struct AstPrinter;

/// `(a b c)`
fn group(parts: impl IntoIterator<Item = String>) -> String {
    format!("({})", parts.into_iter().collect::<Vec<_>>().join(" "))
}

fn join(head: &str, parts: impl IntoIterator<Item = String>) -> String {
    group(std::iter::once(head.to_string()).chain(parts))
}

fn typed(name: &str, given_type: Option<&str>) -> String {
    match given_type {
        Some(given_type) => format!("{}: {}", name, given_type),
        None => name.to_string(),
    }
}

impl AstPrinter {
    pub fn print(node: &Node) -> String {
        match &node.kind {
            // ── literals ────────────────────────────────────────────────
            NodeKind::Number(n) => format_number(*n),

            NodeKind::Str(s) => format!("{:?}", s),

            NodeKind::Boolean(b) => b.to_string(),

            NodeKind::NoneLiteral => "none".into(),

            NodeKind::List(items) => join("list", items.iter().map(Self::print)),

            NodeKind::Dict(entries) => join(
                "dict",
                entries
                    .iter()
                    .map(|entry| format!("({} {})", entry.key, Self::print(&entry.value))),
            ),

            NodeKind::Statements(statements) => join("do", statements.iter().map(Self::print)),

            // ── variables ───────────────────────────────────────────────
            NodeKind::VarAssign {
                name,
                given_type,
                value,
            } => format!(
                "(var {} {})",
                typed(name, given_type.as_deref()),
                Self::print(value)
            ),

            NodeKind::Define {
                name,
                given_type,
                value,
            } => format!(
                "(define {} {})",
                typed(name, given_type.as_deref()),
                Self::print(value)
            ),

            NodeKind::VarModify { name, value } => format!("(= {} {})", name, Self::print(value)),

            NodeKind::VarAccess(name) => name.clone(),

            NodeKind::Delete(target) => format!("(delete {})", Self::print(target)),

            // ── operators ───────────────────────────────────────────────
            NodeKind::Binary { op, left, right } => format!(
                "({} {} {})",
                op.symbol(),
                Self::print(left),
                Self::print(right)
            ),

            NodeKind::Logical { op, left, right } => format!(
                "({} {} {})",
                op.symbol(),
                Self::print(left),
                Self::print(right)
            ),

            NodeKind::Unary { op, operand } => format!("({} {})", op.symbol(), Self::print(operand)),

            NodeKind::Prefix { target, delta } => {
                let op = if *delta > 0.0 { "++" } else { "--" };
                format!("({} {})", op, Self::print(target))
            }

            NodeKind::Postfix { target, delta } => {
                let op = if *delta > 0.0 { "++" } else { "--" };
                format!("(post{} {})", op, Self::print(target))
            }

            NodeKind::Typeof(value) => format!("(typeof {})", Self::print(value)),

            NodeKind::Instanceof { value, class } => {
                format!("(instanceof {} {})", Self::print(value), Self::print(class))
            }

            // ── list access ─────────────────────────────────────────────
            NodeKind::ListAccess { base, indices } => {
                let mut s = format!("(index {}", Self::print(base));
                for index in indices {
                    let mark = if index.optional { "?" } else { "" };
                    let part = match &index.kind {
                        IndexKind::Expr(node) => format!("{}[{}]", mark, Self::print(node)),
                        IndexKind::Push => format!("{}[]", mark),
                        IndexKind::Slice { start, end } => format!(
                            "{}[{}:{}]",
                            mark,
                            start.as_ref().map(Self::print).unwrap_or_default(),
                            end.as_ref().map(Self::print).unwrap_or_default()
                        ),
                    };
                    s.push(' ');
                    s.push_str(&part);
                }
                s.push(')');
                s
            }

            NodeKind::ListAssignment { access, value } => {
                format!("(= {} {})", Self::print(access), Self::print(value))
            }

            // ── control flow ────────────────────────────────────────────
            NodeKind::If { cases, else_case } => {
                let mut parts: Vec<String> = cases
                    .iter()
                    .map(|case| {
                        format!("({} {})", Self::print(&case.condition), Self::print(&case.body))
                    })
                    .collect();
                if let Some(else_case) = else_case {
                    parts.push(format!("(else {})", Self::print(else_case)));
                }
                join("if", parts)
            }

            NodeKind::For {
                var_name,
                start,
                end,
                step,
                body,
            } => {
                let start = start.as_deref().map(Self::print).unwrap_or_else(|| "0".into());
                let step = step.as_deref().map(Self::print).unwrap_or_else(|| "1".into());
                format!(
                    "(for {} {} {} {} {})",
                    var_name,
                    start,
                    Self::print(end),
                    step,
                    Self::print(body)
                )
            }

            NodeKind::Foreach {
                iterable,
                key_name,
                value_name,
                body,
            } => {
                let names = match key_name {
                    Some(key) => format!("({} {})", key, value_name),
                    None => value_name.clone(),
                };
                format!(
                    "(foreach {} {} {})",
                    names,
                    Self::print(iterable),
                    Self::print(body)
                )
            }

            NodeKind::While { condition, body } => {
                format!("(while {} {})", Self::print(condition), Self::print(body))
            }

            NodeKind::Switch {
                subject,
                cases,
                default,
            } => {
                let mut parts = vec![Self::print(subject)];
                for case in cases {
                    parts.push(format!(
                        "(case {} {})",
                        group(case.conditions.iter().map(Self::print)),
                        Self::print(&case.body)
                    ));
                }
                if let Some(default) = default {
                    parts.push(format!("(default {})", Self::print(default)));
                }
                join("switch", parts)
            }

            NodeKind::Return(value) => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".into(),
            },

            NodeKind::Continue => "(continue)".into(),

            NodeKind::Break => "(break)".into(),

            // ── functions ───────────────────────────────────────────────
            NodeKind::FuncDef(def) => Self::function("func", def),

            NodeKind::Call {
                callee,
                args,
                optional,
            } => join(
                if *optional { "call?" } else { "call" },
                std::iter::once(Self::print(callee)).chain(args.iter().map(Self::print)),
            ),

            // ── classes and enums ───────────────────────────────────────
            NodeKind::ClassDef(def) => {
                let head = match &def.parent {
                    Some(parent) => format!("class {} : {}", def.name, parent),
                    None => format!("class {}", def.name),
                };
                join(
                    &head,
                    def.members.iter().map(|member| {
                        let mut flags = member.visibility.to_string();
                        if member.is_static {
                            flags.push_str(" static");
                        }
                        if member.is_override {
                            flags.push_str(" override");
                        }
                        format!("({} {})", flags, member.name)
                    }),
                )
            }

            NodeKind::New { class_name, args } => {
                join(&format!("new {}", class_name), args.iter().map(Self::print))
            }

            NodeKind::CallProperty {
                base,
                property,
                optional,
            } => format!(
                "({} {} {})",
                if *optional { "?." } else { "." },
                Self::print(base),
                property
            ),

            NodeKind::CallStaticProperty {
                base,
                property,
                optional,
            } => format!(
                "({} {} {})",
                if *optional { "?::" } else { "::" },
                Self::print(base),
                property
            ),

            NodeKind::AssignProperty { target, value } => {
                format!("(= {} {})", Self::print(target), Self::print(value))
            }

            NodeKind::Super(args) => join("super", args.iter().map(Self::print)),

            NodeKind::Enum { name, members } => join(&format!("enum {}", name), members.iter().cloned()),

            // ── tags ────────────────────────────────────────────────────
            NodeKind::TagDef(def) => join(
                &format!("tag {}", def.name),
                def.members.iter().map(|member| member.name.clone()),
            ),

            NodeKind::Html(html) => {
                let mut head = html.tagname.clone();
                for class in &html.classes {
                    head.push('.');
                    head.push_str(class);
                }
                if let Some(id) = &html.id {
                    head.push('#');
                    head.push_str(id);
                }

                let attributes = html
                    .attributes
                    .iter()
                    .map(|attribute| format!("({} {})", attribute.name, Self::print(&attribute.value)));
                let events = html
                    .events
                    .iter()
                    .map(|event| format!("(@{} {})", event.name, Self::print(&event.value)));

                join(
                    &format!("<{}>", head),
                    attributes.chain(events).chain(html.children.iter().map(Self::print)),
                )
            }
        }
    }

    fn function(head: &str, def: &FuncDef) -> String {
        let head = match &def.name {
            Some(name) => format!("{} {}", head, name),
            None => head.to_string(),
        };
        let args = group(def.args.iter().map(Self::argument));

        format!("({} {} {})", head, args, Self::print(&def.body))
    }

    fn argument(arg: &ArgSpec) -> String {
        let mut s = String::new();
        if arg.is_rest {
            s.push_str("...");
        }
        s.push_str(&arg.name);
        if arg.is_optional {
            s.push('?');
        }
        typed(&s, arg.given_type.as_deref())
    }
}
