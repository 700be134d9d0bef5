//! Quill: a dynamically typed scripting language with classes, enums and
//! declarative UI tags, evaluated by a tree-walking interpreter.
//!
//! ```no_run
//! // a program evaluates to the values of its statements
//! let value = quill::run("var x = 40\nx + 2").unwrap();
//! assert_eq!(value.to_string(), "[40, 42]");
//! ```

pub mod ast;
pub mod ast_printer;
pub mod context;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod native;
pub mod parser;
pub mod position;
pub mod scanner;
pub mod token;
pub mod value;

use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Parses and runs `source` in a fresh interpreter writing to stdout.
pub fn run(source: &str) -> Result<Value> {
    let program = parser::parse_source(source)?;

    Interpreter::new().interpret(&program)
}
