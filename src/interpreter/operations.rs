//! Operator semantics over pairs of runtime values.
//!
//! Every operator is an explicit match over operand kinds. Pairs that are
//! not listed fail with [`OperationError::Illegal`]; the caller attaches the
//! span and context.

use std::cmp::Ordering;
use std::rc::Rc;

use log::debug;
use thiserror::Error;

use crate::ast::{BinaryOp, UnaryOp};
use crate::value::{format_number, OrderedMap, Value};

#[derive(Debug, Error, PartialEq)]
pub enum OperationError {
    #[error("Illegal operation")]
    Illegal,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("{0}")]
    Invalid(String),
}

pub type OpResult = Result<Value, OperationError>;

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> OpResult {
    debug!("Applying {} to {:?} and {:?}", op, left, right);

    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Subtract => arithmetic(left, right, |a, b| a - b),
        BinaryOp::Multiply => multiply(left, right),
        BinaryOp::Divide => divide(left, right, |a, b| a / b),
        BinaryOp::Modulo => divide(left, right, |a, b| a % b),
        BinaryOp::Power => power(left, right),

        BinaryOp::ShiftLeft => {
            let (a, b) = int_pair(left, right)?;
            Ok(Value::Number(a.wrapping_shl(b as u32 & 31) as f64))
        }
        BinaryOp::ShiftRight => {
            let (a, b) = int_pair(left, right)?;
            Ok(Value::Number((a >> (b as u32 & 31)) as f64))
        }
        BinaryOp::UnsignedShiftRight => {
            let (a, b) = int_pair(left, right)?;
            Ok(Value::Number(((a as u32) >> (b as u32 & 31)) as f64))
        }
        BinaryOp::BitAnd => {
            let (a, b) = int_pair(left, right)?;
            Ok(Value::Number((a & b) as f64))
        }
        BinaryOp::BitOr => {
            let (a, b) = int_pair(left, right)?;
            Ok(Value::Number((a | b) as f64))
        }
        BinaryOp::BitXor => {
            let (a, b) = int_pair(left, right)?;
            Ok(Value::Number((a ^ b) as f64))
        }

        BinaryOp::Equals => Ok(Value::Boolean(equals(left, right))),
        BinaryOp::NotEquals => Ok(Value::Boolean(!equals(left, right))),

        BinaryOp::LessThan => compare(left, right, Ordering::is_lt),
        BinaryOp::GreaterThan => compare(left, right, Ordering::is_gt),
        BinaryOp::LessThanOrEqual => compare(left, right, Ordering::is_le),
        BinaryOp::GreaterThanOrEqual => compare(left, right, Ordering::is_ge),
    }
}

pub fn unary(op: UnaryOp, operand: &Value) -> OpResult {
    match op {
        UnaryOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
        UnaryOp::Minus => numeric(operand)
            .map(|n| Value::Number(-n))
            .ok_or(OperationError::Illegal),
        UnaryOp::Plus => numeric(operand)
            .map(Value::Number)
            .ok_or(OperationError::Illegal),
        UnaryOp::BitNot => numeric(operand)
            .map(|n| Value::Number(!to_int32(n) as f64))
            .ok_or(OperationError::Illegal),
    }
}

/// Number, Boolean (1/0) and None (0) take part in arithmetic.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::None => Some(0.0),
        _ => None,
    }
}

/// Text a scalar contributes to a string concatenation.
fn concat_form(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(format_number(*n)),
        Value::Boolean(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::None => Some(String::new()),
        _ => None,
    }
}

/// Values a list can be extended with by `+`.
fn is_list_operand(value: &Value) -> bool {
    matches!(
        value,
        Value::Number(_)
            | Value::String(_)
            | Value::List(_)
            | Value::Dict(_)
            | Value::Class(_)
            | Value::Enum(_)
            | Value::None
            | Value::Boolean(_)
    )
}

fn add(left: &Value, right: &Value) -> OpResult {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),

        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }

        (Value::List(a), other) if is_list_operand(other) => {
            let mut items = a.borrow().clone();
            items.push(other.clone());
            Ok(Value::list(items))
        }

        (other, Value::List(b)) if is_list_operand(other) => {
            let mut items = Vec::with_capacity(b.borrow().len() + 1);
            items.push(other.clone());
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }

        (Value::String(a), other) => concat_form(other)
            .map(|b| Value::String(format!("{}{}", a, b)))
            .ok_or(OperationError::Illegal),

        (other, Value::String(b)) => concat_form(other)
            .map(|a| Value::String(format!("{}{}", a, b)))
            .ok_or(OperationError::Illegal),

        (Value::Dict(a), Value::Dict(b)) => {
            let mut merged: OrderedMap<Value> = a.borrow().clone();
            for (key, value) in b.borrow().iter() {
                merged.insert(key.clone(), value.clone());
            }
            Ok(Value::dict(merged))
        }

        _ => arithmetic(left, right, |a, b| a + b),
    }
}

fn arithmetic(left: &Value, right: &Value, apply: fn(f64, f64) -> f64) -> OpResult {
    match (numeric(left), numeric(right)) {
        (Some(a), Some(b)) => Ok(Value::Number(apply(a, b))),
        _ => Err(OperationError::Illegal),
    }
}

/// Repeat count for `list * n` and `string * n`.
fn repeat_count(n: f64) -> Result<usize, OperationError> {
    if n < 0.0 || n.fract() != 0.0 {
        return Err(OperationError::Invalid(format!(
            "Cannot repeat a sequence {} times",
            format_number(n)
        )));
    }

    Ok(n as usize)
}

fn multiply(left: &Value, right: &Value) -> OpResult {
    match (left, right) {
        (Value::List(items), Value::Number(n)) => {
            let count = repeat_count(*n)?;
            let items = items.borrow();
            let mut repeated = Vec::with_capacity(items.len() * count);
            for _ in 0..count {
                repeated.extend(items.iter().cloned());
            }
            Ok(Value::list(repeated))
        }

        (Value::String(s), Value::Number(n)) => Ok(Value::String(s.repeat(repeat_count(*n)?))),

        _ => arithmetic(left, right, |a, b| a * b),
    }
}

/// `/` and `%`. A `none` divisor always fails, whatever the dividend.
fn divide(left: &Value, right: &Value, apply: fn(f64, f64) -> f64) -> OpResult {
    let (Some(a), Some(b)) = (numeric(left), numeric(right)) else {
        return Err(OperationError::Illegal);
    };

    if right.is_none() || b == 0.0 {
        return Err(OperationError::DivisionByZero);
    }

    Ok(Value::Number(apply(a, b)))
}

fn power(left: &Value, right: &Value) -> OpResult {
    let base = numeric(left).ok_or(OperationError::Illegal)?;
    let exponent = match right {
        Value::None => 1.0,
        other => numeric(other).ok_or(OperationError::Illegal)?,
    };

    Ok(Value::Number(base.powf(exponent)))
}

/// ECMAScript ToInt32: truncate, wrap modulo 2^32, reinterpret as signed.
pub fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }

    let wrapped = n.trunc().rem_euclid(4_294_967_296.0);

    if wrapped >= 2_147_483_648.0 {
        (wrapped - 4_294_967_296.0) as i32
    } else {
        wrapped as i32
    }
}

fn int_pair(left: &Value, right: &Value) -> Result<(i32, i32), OperationError> {
    match (numeric(left), numeric(right)) {
        (Some(a), Some(b)) => Ok((to_int32(a), to_int32(b))),
        _ => Err(OperationError::Illegal),
    }
}

/// Length used when sequences are ordered.
fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => Some(s.chars().count() as f64),
        Value::List(items) => Some(items.borrow().len() as f64),
        Value::Dict(map) => Some(map.borrow().len() as f64),
        _ => None,
    }
}

fn same_sequence_kind(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::String(_), Value::String(_))
            | (Value::List(_), Value::List(_))
            | (Value::Dict(_), Value::Dict(_))
    )
}

fn is_opaque(value: &Value) -> bool {
    matches!(
        value,
        Value::Class(_) | Value::Enum(_) | Value::Function(_) | Value::NativeFunction(_)
    )
}

fn compare(left: &Value, right: &Value, accept: fn(Ordering) -> bool) -> OpResult {
    let ordering = |a: f64, b: f64| {
        Value::Boolean(a.partial_cmp(&b).map(accept).unwrap_or(false))
    };

    if let (Some(a), Some(b)) = (numeric(left), numeric(right)) {
        return Ok(ordering(a, b));
    }

    match (measure(left), measure(right)) {
        (Some(a), Some(b)) if same_sequence_kind(left, right) => Ok(ordering(a, b)),
        (Some(a), None) => match right {
            Value::Number(b) => Ok(ordering(a, *b)),
            other if is_opaque(other) => Ok(Value::Boolean(false)),
            _ => Err(OperationError::Illegal),
        },
        (None, Some(b)) => match left {
            Value::Number(a) => Ok(ordering(*a, b)),
            other if is_opaque(other) => Ok(Value::Boolean(false)),
            _ => Err(OperationError::Illegal),
        },
        _ => Err(OperationError::Illegal),
    }
}

/// Structural equality. Functions and classes are never equal, even to
/// themselves.
pub fn equals(left: &Value, right: &Value) -> bool {
    equals_within(left, right, &mut Vec::new())
}

/// `comparing` holds the container pairs already under comparison; meeting
/// a pair again counts as equal so cyclic structures terminate.
fn equals_within(left: &Value, right: &Value, comparing: &mut Vec<(*const (), *const ())>) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::None, Value::None) => true,

        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            format_number(*n) == *s
        }

        (Value::Boolean(b), Value::Number(n)) | (Value::Number(n), Value::Boolean(b)) => {
            (if *b { 1.0 } else { 0.0 }) == *n
        }

        (Value::List(a), Value::List(b)) => {
            let pair = (Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ());
            if comparing.contains(&pair) {
                return true;
            }

            comparing.push(pair);
            let (a, b) = (a.borrow(), b.borrow());
            let same = a.len() == b.len()
                && a
                    .iter()
                    .zip(b.iter())
                    .all(|(x, y)| equals_within(x, y, comparing));
            comparing.pop();
            same
        }

        (Value::Dict(a), Value::Dict(b)) => {
            let pair = (Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ());
            if comparing.contains(&pair) {
                return true;
            }

            comparing.push(pair);
            let (a, b) = (a.borrow(), b.borrow());
            let same = a.len() == b.len()
                && a
                    .iter()
                    .zip(b.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && equals_within(va, vb, comparing));
            comparing.pop();
            same
        }

        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    fn s(text: &str) -> Value {
        Value::string(text)
    }

    fn show(result: OpResult) -> String {
        match result {
            Ok(value) => value.to_string(),
            Err(e) => format!("error: {}", e),
        }
    }

    #[test]
    fn addition_matrix() {
        assert_eq!(show(binary(BinaryOp::Add, &Value::None, &Value::None)), "0");
        assert_eq!(show(binary(BinaryOp::Add, &s("abc"), &num(5.0))), "abc5");
        assert_eq!(show(binary(BinaryOp::Add, &num(5.0), &s("abc"))), "5abc");
        assert_eq!(show(binary(BinaryOp::Add, &s("x"), &Value::Boolean(true))), "x1");
        assert_eq!(show(binary(BinaryOp::Add, &s("x"), &Value::None)), "x");
        assert_eq!(show(binary(BinaryOp::Add, &num(4.0), &Value::None)), "4");
        assert_eq!(show(binary(BinaryOp::Add, &Value::Boolean(true), &num(2.0))), "3");
    }

    #[test]
    fn list_addition_appends_and_prepends() {
        let list = Value::list(vec![num(1.0)]);

        assert_eq!(show(binary(BinaryOp::Add, &list, &num(2.0))), "[1, 2]");
        assert_eq!(show(binary(BinaryOp::Add, &num(0.0), &list)), "[0, 1]");
        assert_eq!(show(binary(BinaryOp::Add, &list, &list)), "[1, 1]");
        assert_eq!(list.to_string(), "[1]");
    }

    #[test]
    fn dict_addition_merges_with_right_winning() {
        let left: OrderedMap<Value> = vec![("a".to_string(), num(1.0)), ("b".to_string(), num(2.0))]
            .into_iter()
            .collect();
        let right: OrderedMap<Value> = vec![("b".to_string(), num(3.0))].into_iter().collect();

        assert_eq!(
            show(binary(BinaryOp::Add, &Value::dict(left), &Value::dict(right))),
            "{\"a\": 1, \"b\": 3}"
        );
    }

    #[test]
    fn division_by_none_is_asymmetric() {
        assert_eq!(
            binary(BinaryOp::Divide, &num(5.0), &Value::None).err(),
            Some(OperationError::DivisionByZero)
        );
        assert_eq!(show(binary(BinaryOp::Divide, &Value::None, &num(5.0))), "0");
        assert_eq!(
            binary(BinaryOp::Modulo, &num(5.0), &num(0.0)).err(),
            Some(OperationError::DivisionByZero)
        );
        assert_eq!(
            binary(BinaryOp::Divide, &num(5.0), &Value::Boolean(false)).err(),
            Some(OperationError::DivisionByZero)
        );
    }

    #[test]
    fn power_with_none() {
        assert_eq!(show(binary(BinaryOp::Power, &Value::None, &num(2.0))), "0");
        assert_eq!(show(binary(BinaryOp::Power, &num(7.0), &Value::None)), "7");
        assert_eq!(show(binary(BinaryOp::Power, &num(2.0), &num(10.0))), "1024");
    }

    #[test]
    fn repetition() {
        let list = Value::list(vec![num(1.0), num(2.0)]);

        assert_eq!(show(binary(BinaryOp::Multiply, &list, &num(2.0))), "[1, 2, 1, 2]");
        assert_eq!(show(binary(BinaryOp::Multiply, &s("ab"), &num(3.0))), "ababab");
        assert!(matches!(
            binary(BinaryOp::Multiply, &s("ab"), &num(-1.0)),
            Err(OperationError::Invalid(_))
        ));
    }

    #[test]
    fn bitwise_uses_32_bit_integers() {
        assert_eq!(show(binary(BinaryOp::BitAnd, &num(6.0), &num(3.0))), "2");
        assert_eq!(show(binary(BinaryOp::ShiftLeft, &num(1.0), &num(33.0))), "2");
        assert_eq!(show(binary(BinaryOp::ShiftRight, &num(-8.0), &num(1.0))), "-4");
        assert_eq!(
            show(binary(BinaryOp::UnsignedShiftRight, &num(-1.0), &num(0.0))),
            "4294967295"
        );
        assert_eq!(show(unary(UnaryOp::BitNot, &num(0.0))), "-1");
        assert_eq!(to_int32(4_294_967_296.0 + 5.0), 5);
    }

    #[test]
    fn relational_by_length() {
        let list = Value::list(vec![num(1.0), num(2.0)]);

        assert_eq!(show(binary(BinaryOp::GreaterThan, &list, &num(1.0))), "true");
        assert_eq!(show(binary(BinaryOp::LessThan, &s("ab"), &s("abc"))), "true");
        assert_eq!(show(binary(BinaryOp::LessThan, &Value::None, &num(1.0))), "true");
        assert_eq!(
            binary(BinaryOp::LessThan, &list, &s("ab")).err(),
            Some(OperationError::Illegal)
        );
    }

    #[test]
    fn equality_laws() {
        assert!(equals(&num(5.0), &s("5")));
        assert!(equals(&Value::Boolean(true), &num(1.0)));
        assert!(!equals(&Value::None, &num(0.0)));

        let a = Value::list(vec![num(1.0), Value::list(vec![s("x")])]);
        let b = Value::list(vec![num(1.0), Value::list(vec![s("x")])]);
        assert!(equals(&a, &b));
        assert!(equals(&b, &a));
    }

    #[test]
    fn illegal_pairs() {
        let list = Value::list(Vec::new());

        assert_eq!(
            binary(BinaryOp::Subtract, &list, &num(1.0)).err(),
            Some(OperationError::Illegal)
        );
        assert_eq!(unary(UnaryOp::Minus, &s("x")).err(), Some(OperationError::Illegal));
    }
}
