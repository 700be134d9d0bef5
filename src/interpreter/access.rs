//! Indexed reads, writes and deletes on lists and dictionaries.
//!
//! A `ListAccess` node holds a base expression and a chain of brackets.
//! Reads walk the whole chain. Writes and deletes walk every bracket but the
//! last to find the container, then mutate that container in place, so the
//! change is visible through every alias of it.

use std::rc::Rc;

use log::debug;

use crate::ast::{IndexKind, ListIndex, Node, NodeKind};
use crate::context::Context;
use crate::position::Span;
use crate::value::{format_number, Value};

use super::{runtime, IResult, Interpreter};

/// Name used in error messages for the accessed container.
fn target_name(base: &Node) -> String {
    match &base.kind {
        NodeKind::VarAccess(name) => name.clone(),
        NodeKind::CallProperty { property, .. }
        | NodeKind::CallStaticProperty { property, .. } => property.clone(),
        _ => "list".to_string(),
    }
}

/// Resolves a possibly negative numeric index against `len`. Returns `None`
/// when the key is not an integer.
fn integer_index(key: f64, len: usize) -> Option<i64> {
    if key.fract() != 0.0 || !key.is_finite() {
        return None;
    }

    let index = key as i64;

    Some(if index < 0 { len as i64 + index } else { index })
}

impl Interpreter {
    pub(super) fn access(
        &mut self,
        base: &Node,
        indices: &[ListIndex],
        ctx: &Rc<Context>,
    ) -> IResult<Option<Value>> {
        let Some(mut current) = self.visit_link(base, ctx)? else {
            return Ok(None);
        };

        let name = target_name(base);

        for index in indices {
            if index.optional && current.is_none() {
                debug!("Optional index on none in '{}'", name);
                return Ok(None);
            }

            current = match &index.kind {
                IndexKind::Expr(node) => {
                    let key = self.visit(node, ctx)?;
                    read_index(&current, &key, &name, ctx, index.span)?
                }

                IndexKind::Slice { start, end } => {
                    let Value::List(items) = &current else {
                        return Err(runtime(
                            ctx,
                            index.span,
                            format!(
                                "Cannot slice '{}': slices only apply to lists, not '{}'",
                                name,
                                current.type_name()
                            ),
                        ));
                    };

                    let len = items.borrow().len();
                    let (from, to) = self.slice_bounds(start, end, len, ctx, index.span)?;
                    let slice = items.borrow()[from..to].to_vec();

                    Value::list(slice)
                }

                IndexKind::Push => {
                    return Err(runtime(
                        ctx,
                        index.span,
                        format!("Empty brackets on '{}' can only be assigned to", name),
                    ));
                }
            };
        }

        Ok(Some(current))
    }

    /// `a[i] = v`, `a[] = v`, `a[x:y] = v`, `d["k"] = v`, `d[] = other`.
    pub(super) fn assign_index(
        &mut self,
        access: &Node,
        value: Value,
        ctx: &Rc<Context>,
    ) -> IResult<()> {
        let (container, last, name) = self.walk_to_last(access, ctx)?;

        match (&container, &last.kind) {
            (Value::List(items), IndexKind::Expr(node)) => {
                let key = self.visit(node, ctx)?;
                let Value::Number(n) = key else {
                    return Err(runtime(
                        ctx,
                        last.span,
                        format!(
                            "List '{}' must be indexed with a number, got '{}'",
                            name,
                            key.type_name()
                        ),
                    ));
                };

                let mut items = items.borrow_mut();
                let len = items.len();

                let index = match integer_index(n, len) {
                    Some(index) if index >= 0 => index as usize,
                    _ => {
                        return Err(runtime(
                            ctx,
                            last.span,
                            format!("Invalid index {} for list '{}'", format_number(n), name),
                        ));
                    }
                };

                if index >= len {
                    debug!("Padding '{}' from {} to {} elements", name, len, index + 1);
                    items.resize(index, Value::None);
                    items.push(value);
                } else {
                    items[index] = value;
                }
            }

            (Value::List(items), IndexKind::Push) => {
                items.borrow_mut().push(value);
            }

            (Value::List(items), IndexKind::Slice { start, end }) => {
                let replacement: Vec<Value> = match &value {
                    Value::List(elements) => elements.borrow().clone(),
                    other => vec![other.clone()],
                };

                let len = items.borrow().len();
                let (from, to) = self.slice_bounds(start, end, len, ctx, last.span)?;

                items.borrow_mut().splice(from..to, replacement);
            }

            (Value::Dict(map), IndexKind::Expr(node)) => {
                let key = self.visit(node, ctx)?;
                let Value::String(key) = key else {
                    return Err(runtime(
                        ctx,
                        last.span,
                        format!(
                            "Dictionary '{}' must be indexed with a string, got '{}'",
                            name,
                            key.type_name()
                        ),
                    ));
                };

                map.borrow_mut().insert(key, value);
            }

            (Value::Dict(map), IndexKind::Push) => {
                let Value::Dict(other) = &value else {
                    return Err(runtime(
                        ctx,
                        last.span,
                        format!(
                            "Only a dictionary can be merged into '{}', got '{}'",
                            name,
                            value.type_name()
                        ),
                    ));
                };

                let entries: Vec<(String, Value)> = other
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();

                let mut map = map.borrow_mut();
                for (key, entry) in entries {
                    map.insert(key, entry);
                }
            }

            (Value::Dict(_), IndexKind::Slice { .. }) => {
                return Err(runtime(
                    ctx,
                    last.span,
                    format!("Cannot slice dictionary '{}'", name),
                ));
            }

            (other, _) => {
                return Err(runtime(
                    ctx,
                    last.span,
                    format!(
                        "'{}' is a '{}', not a list or a dictionary",
                        name,
                        other.type_name()
                    ),
                ));
            }
        }

        Ok(())
    }

    /// `delete a[i]`, `delete a[x:y]`, `delete d["k"]`. List removals
    /// compact the list.
    pub(super) fn delete_index(&mut self, access: &Node, ctx: &Rc<Context>) -> IResult<()> {
        let (container, last, name) = self.walk_to_last(access, ctx)?;

        match (&container, &last.kind) {
            (Value::List(items), IndexKind::Expr(node)) => {
                let key = self.visit(node, ctx)?;
                let Value::Number(n) = key else {
                    return Err(runtime(
                        ctx,
                        last.span,
                        format!("List '{}' must be indexed with a number", name),
                    ));
                };

                let mut items = items.borrow_mut();
                let len = items.len();

                match integer_index(n, len) {
                    Some(index) if index >= 0 && (index as usize) < len => {
                        items.remove(index as usize);
                    }
                    _ => {
                        return Err(runtime(
                            ctx,
                            last.span,
                            format!(
                                "Index {} is out of range for '{}' (length {})",
                                format_number(n),
                                name,
                                len
                            ),
                        ));
                    }
                }
            }

            (Value::List(items), IndexKind::Slice { start, end }) => {
                let len = items.borrow().len();
                let (from, to) = self.slice_bounds(start, end, len, ctx, last.span)?;

                items.borrow_mut().drain(from..to);
            }

            (Value::Dict(map), IndexKind::Expr(node)) => {
                let key = self.visit(node, ctx)?;
                let Value::String(key) = key else {
                    return Err(runtime(
                        ctx,
                        last.span,
                        format!("Dictionary '{}' must be indexed with a string", name),
                    ));
                };

                map.borrow_mut().remove(&key);
            }

            (_, IndexKind::Push) => {
                return Err(runtime(
                    ctx,
                    last.span,
                    format!("Cannot delete through empty brackets on '{}'", name),
                ));
            }

            (other, _) => {
                return Err(runtime(
                    ctx,
                    last.span,
                    format!(
                        "Cannot delete from '{}' of type '{}'",
                        name,
                        other.type_name()
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Evaluates the base and every bracket but the last. Intermediate
    /// brackets must be plain indices that already hold a container.
    fn walk_to_last<'n>(
        &mut self,
        access: &'n Node,
        ctx: &Rc<Context>,
    ) -> IResult<(Value, &'n ListIndex, String)> {
        let NodeKind::ListAccess { base, indices } = &access.kind else {
            return Err(runtime(ctx, access.span, "Expected a list access"));
        };

        let Some((last, path)) = indices.split_last() else {
            return Err(runtime(ctx, access.span, "Expected at least one index"));
        };

        let name = target_name(base);
        let mut current = self.visit(base, ctx)?;

        for index in path {
            current = match &index.kind {
                IndexKind::Expr(node) => {
                    let key = self.visit(node, ctx)?;
                    read_index(&current, &key, &name, ctx, index.span)?
                }
                IndexKind::Slice { .. } => {
                    return Err(runtime(
                        ctx,
                        index.span,
                        format!("Cannot assign through a slice of '{}'", name),
                    ));
                }
                IndexKind::Push => {
                    return Err(runtime(
                        ctx,
                        index.span,
                        format!("Empty brackets must be the last index of '{}'", name),
                    ));
                }
            };

            if !matches!(current, Value::List(_) | Value::Dict(_)) {
                return Err(runtime(
                    ctx,
                    index.span,
                    format!(
                        "'{}' holds a '{}' here, not a list or a dictionary",
                        name,
                        current.type_name()
                    ),
                ));
            }
        }

        Ok((current, last, name))
    }

    /// Half-open `[from, to)` within `0..=len`. A negative start is an
    /// error; a negative end counts back from the length.
    fn slice_bounds(
        &mut self,
        start: &Option<Node>,
        end: &Option<Node>,
        len: usize,
        ctx: &Rc<Context>,
        span: Span,
    ) -> IResult<(usize, usize)> {
        let from = match start {
            Some(node) => {
                let n = self.slice_number(node, ctx)?;
                if n < 0 {
                    return Err(runtime(
                        ctx,
                        span,
                        "The start of a slice cannot be negative",
                    ));
                }
                (n as usize).min(len)
            }
            None => 0,
        };

        let to = match end {
            Some(node) => {
                let n = self.slice_number(node, ctx)?;
                if n < 0 {
                    (len as i64 + n).max(0) as usize
                } else {
                    (n as usize).min(len)
                }
            }
            None => len,
        };

        Ok((from, to.max(from)))
    }

    fn slice_number(&mut self, node: &Node, ctx: &Rc<Context>) -> IResult<i64> {
        match self.visit(node, ctx)? {
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Ok(n as i64),
            other => Err(runtime(
                ctx,
                node.span,
                format!("Slice bounds must be integers, got '{}'", other.type_name()),
            )),
        }
    }
}

/// One bracket read. Missing dictionary keys read as `none`; list indices
/// out of range are errors.
fn read_index(
    container: &Value,
    key: &Value,
    name: &str,
    ctx: &Context,
    span: Span,
) -> IResult<Value> {
    match (container, key) {
        (Value::List(items), Value::Number(n)) => {
            let items = items.borrow();

            match integer_index(*n, items.len()) {
                Some(index) if index >= 0 && (index as usize) < items.len() => {
                    Ok(items[index as usize].clone())
                }
                _ => Err(runtime(
                    ctx,
                    span,
                    format!(
                        "Index {} is out of range for '{}' (length {})",
                        format_number(*n),
                        name,
                        items.len()
                    ),
                )),
            }
        }

        (Value::List(_), other) => Err(runtime(
            ctx,
            span,
            format!(
                "List '{}' must be indexed with a number, got '{}'",
                name,
                other.type_name()
            ),
        )),

        (Value::Dict(map), Value::String(key)) => {
            Ok(map.borrow().get(key).cloned().unwrap_or(Value::None))
        }

        (Value::Dict(_), other) => Err(runtime(
            ctx,
            span,
            format!(
                "Dictionary '{}' must be indexed with a string, got '{}'",
                name,
                other.type_name()
            ),
        )),

        (Value::String(s), Value::Number(n)) => {
            let len = s.chars().count();

            match integer_index(*n, len) {
                Some(index) if index >= 0 && (index as usize) < len => Ok(Value::String(
                    s.chars().nth(index as usize).map(String::from).unwrap_or_default(),
                )),
                _ => Err(runtime(
                    ctx,
                    span,
                    format!(
                        "Index {} is out of range for '{}' (length {})",
                        format_number(*n),
                        name,
                        len
                    ),
                )),
            }
        }

        (other, _) => Err(runtime(
            ctx,
            span,
            format!("Cannot index '{}' of type '{}'", name, other.type_name()),
        )),
    }
}
