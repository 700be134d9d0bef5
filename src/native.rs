//! Host-implemented functions and classes installed in every program's
//! global context.
//!
//! Natives are registered as constants: no scope may redeclare or reassign
//! them.

use std::rc::Rc;

use chrono::{SecondsFormat, Utc};
use log::{debug, info};

use crate::context::Context;
use crate::error::{QuillError, Result};
use crate::interpreter::Interpreter;
use crate::position::Span;
use crate::value::{NativeClass, NativeFn, NativeFunction, NativeProperty, OrderedMap, Value};

fn native_error<S: Into<String>>(name: &str, span: Span, msg: S) -> QuillError {
    QuillError::runtime(span, &format!("<native {}>", name), msg)
}

fn function(name: &'static str, arity: Option<usize>, func: NativeFn) -> Value {
    Value::NativeFunction(Rc::new(NativeFunction { name, arity, func }))
}

fn number_arg(name: &str, value: &Value, span: Span) -> Result<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(native_error(
            name,
            span,
            format!("Expected a number but got '{}'", other.type_name()),
        )),
    }
}

fn write_log(interpreter: &mut Interpreter, args: &[Value], span: Span) -> Result<Value> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(interpreter.stringify(arg, span)?);
    }

    interpreter
        .write_line(&parts.join(" "))
        .map_err(|e| native_error("log", span, format!("Failed to write output: {}", e)))?;

    Ok(Value::None)
}

fn len(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value> {
    let length = match &args[0] {
        Value::List(items) => items.borrow().len(),
        Value::Dict(map) => map.borrow().len(),
        Value::String(s) => s.chars().count(),
        other => {
            return Err(native_error(
                "len",
                span,
                format!("A value of type '{}' has no length", other.type_name()),
            ));
        }
    };

    Ok(Value::Number(length as f64))
}

fn to_str(interpreter: &mut Interpreter, args: &[Value], span: Span) -> Result<Value> {
    interpreter.stringify(&args[0], span).map(Value::String)
}

fn num(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value> {
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Boolean(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
        Value::None => Ok(Value::Number(0.0)),
        Value::String(s) => s.trim().parse::<f64>().map(Value::Number).map_err(|_| {
            native_error("num", span, format!("Cannot convert \"{}\" to a number", s))
        }),
        other => Err(native_error(
            "num",
            span,
            format!("Cannot convert a value of type '{}' to a number", other.type_name()),
        )),
    }
}

fn clone(_: &mut Interpreter, args: &[Value], _: Span) -> Result<Value> {
    Ok(args[0].deep_clone())
}

fn keys(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value> {
    match &args[0] {
        Value::Dict(map) => Ok(Value::list(
            map.borrow().keys().cloned().map(Value::String).collect(),
        )),
        other => Err(native_error(
            "keys",
            span,
            format!("Expected a dict but got '{}'", other.type_name()),
        )),
    }
}

/// Seconds since the Unix epoch.
fn clock(_: &mut Interpreter, _: &[Value], _: Span) -> Result<Value> {
    let millis = Utc::now().timestamp_millis();
    Ok(Value::Number(millis as f64 / 1000.0))
}

fn math_abs(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value> {
    Ok(Value::Number(number_arg("Math.abs", &args[0], span)?.abs()))
}

fn math_floor(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value> {
    Ok(Value::Number(number_arg("Math.floor", &args[0], span)?.floor()))
}

fn math_ceil(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value> {
    Ok(Value::Number(number_arg("Math.ceil", &args[0], span)?.ceil()))
}

/// Halves round up, as in `Math.round(-2.5) == -2`.
fn math_round(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value> {
    Ok(Value::Number((number_arg("Math.round", &args[0], span)? + 0.5).floor()))
}

fn math_sqrt(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value> {
    Ok(Value::Number(number_arg("Math.sqrt", &args[0], span)?.sqrt()))
}

fn extremum(name: &str, args: &[Value], span: Span, pick: fn(f64, f64) -> f64) -> Result<Value> {
    let (first, rest) = args
        .split_first()
        .ok_or_else(|| native_error(name, span, "Expected at least one argument"))?;

    let mut result = number_arg(name, first, span)?;
    for arg in rest {
        result = pick(result, number_arg(name, arg, span)?);
    }

    Ok(Value::Number(result))
}

fn math_min(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value> {
    extremum("Math.min", args, span, f64::min)
}

fn math_max(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value> {
    extremum("Math.max", args, span, f64::max)
}

fn time_now(_: Span) -> Result<Value> {
    Ok(Value::Number(Utc::now().timestamp_millis() as f64))
}

fn time_iso(_: &mut Interpreter, _: &[Value], _: Span) -> Result<Value> {
    Ok(Value::String(
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    ))
}

fn math_class() -> NativeClass {
    let mut properties = OrderedMap::new();

    properties.insert("PI".into(), NativeProperty::Data(Value::Number(std::f64::consts::PI)));
    properties.insert("E".into(), NativeProperty::Data(Value::Number(std::f64::consts::E)));

    let methods: [(&'static str, Option<usize>, NativeFn); 7] = [
        ("abs", Some(1), math_abs),
        ("floor", Some(1), math_floor),
        ("ceil", Some(1), math_ceil),
        ("round", Some(1), math_round),
        ("sqrt", Some(1), math_sqrt),
        ("min", None, math_min),
        ("max", None, math_max),
    ];

    for (name, arity, func) in methods {
        properties.insert(name.into(), NativeProperty::Data(function(name, arity, func)));
    }

    NativeClass {
        name: "Math",
        properties,
    }
}

fn time_class() -> NativeClass {
    let mut properties = OrderedMap::new();

    properties.insert("now".into(), NativeProperty::Computed(time_now));
    properties.insert(
        "iso".into(),
        NativeProperty::Data(function("iso", Some(0), time_iso)),
    );

    NativeClass {
        name: "Time",
        properties,
    }
}

/// Installs the natives into `ctx`'s constant registry.
pub fn register(ctx: &Context) {
    info!("Registering native functions and classes");

    let functions: [(&'static str, Option<usize>, NativeFn); 7] = [
        ("log", None, write_log),
        ("len", Some(1), len),
        ("str", Some(1), to_str),
        ("num", Some(1), num),
        ("clone", Some(1), clone),
        ("keys", Some(1), keys),
        ("clock", Some(0), clock),
    ];

    let mut constants = ctx.constants.borrow_mut();

    for (name, arity, func) in functions {
        debug!("Defining native function '{}'", name);
        constants.define(name, function(name, arity, func));
    }

    for class in [math_class(), time_class()] {
        debug!("Defining native class '{}'", class.name);
        constants.define(class.name, Value::NativeClass(Rc::new(class)));
    }
}
