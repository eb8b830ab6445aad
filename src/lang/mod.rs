//! Implementation of the xen language: a small interpreted language for
//! doing arithmetic on musical pitch values (equal-tempered intervals,
//! frequency ratios, cents, and raw frequencies).
//!
//! The pipeline is rebuilt per evaluation: source text is lexed against
//! the *current* operator registry, parsed by a Pratt parser whose symbol
//! table is a snapshot of that registry, and then walked by the evaluator.
//! Programs can extend the grammar at run time through the `operator` and
//! `function` macros; those extensions become visible to the *next*
//! top-level evaluation.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod value;

pub mod builtins;
pub mod interpreter;
pub mod macros;

use snafu::Snafu;

pub use interpreter::{EvalError, Host, Interpreter, NullHost};
pub use value::{display_type, Value};

/// One top-level result: a value paired with its display type tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub value: Value,
    pub ty: &'static str,
}

impl Answer {
    pub fn new(value: Value) -> Answer {
        Answer {
            ty: display_type(&value),
            value,
        }
    }
}

/// Any failure of the evaluation pipeline. The stage-specific errors
/// carry the interesting details; this type only records which stage
/// rejected the input.
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{}", source))]
    Lex { source: lexer::LexError },
    #[snafu(display("{}", source))]
    Parse { source: parser::ParseError },
    #[snafu(display("{}", source))]
    Eval { source: interpreter::EvalError },
}

/// Evaluate a source string in a fresh interpreter.
///
/// Embeddings that want definitions to persist between inputs should keep
/// an [`Interpreter`] around instead.
pub fn evaluate(source: &str) -> Result<Vec<Answer>, Error> {
    Interpreter::new().evaluate(source)
}
