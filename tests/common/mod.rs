#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use quill::error::QuillError;
use quill::interpreter::Interpreter;
use quill::parser::parse_source;
use quill::value::Value;

/// Output sink the test keeps a handle to after the interpreter takes it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs a program, returning its result and everything it logged.
pub fn run(source: &str) -> (Result<Value, QuillError>, String) {
    let buffer = SharedBuffer::default();
    let mut interpreter = Interpreter::with_output(Box::new(buffer.clone()));

    let result = parse_source(source).and_then(|program| interpreter.interpret(&program));

    (result, buffer.contents())
}

/// Value of the program's last statement.
pub fn eval(source: &str) -> Value {
    match run(source).0 {
        Ok(Value::List(values)) => values.borrow().last().cloned().unwrap_or(Value::None),
        Ok(other) => panic!("program evaluated to a non-list: {}", other),
        Err(e) => panic!("program failed: {}\n--- source ---\n{}", e, source),
    }
}

/// Display form of the program's last statement.
pub fn show(source: &str) -> String {
    eval(source).to_string()
}

/// Everything the program wrote through `log`.
pub fn output(source: &str) -> String {
    let (result, output) = run(source);

    if let Err(e) = result {
        panic!("program failed: {}\n--- output ---\n{}", e, output);
    }

    output
}

pub fn error(source: &str) -> QuillError {
    match run(source).0 {
        Ok(value) => panic!("expected an error, program returned {}", value),
        Err(e) => e,
    }
}

/// Asserts the program fails with a runtime error mentioning `needle`.
pub fn assert_runtime_error(source: &str, needle: &str) {
    let error = error(source);

    assert!(error.is_runtime(), "expected a runtime error, got: {}", error);
    assert!(
        error.to_string().contains(needle),
        "expected '{}' in: {}",
        needle,
        error
    );
}
