//! The dynamic value model of the language.
//!
//! Coercion in the builtin operations is driven entirely by the type tag
//! of a value, so the enum is exhaustive: there is no catch-all "object"
//! value and no implicit conversion outside the rules the operations
//! spell out themselves.

use std::fmt;
use std::rc::Rc;

use super::ast::Node;
use super::interpreter::{EvalResult, Interpreter};
use super::registry::OpHandler;
use crate::pitch::{self, Et, Ratio};

/// Signature of a natively implemented function or operator.
///
/// Returning `Ok(None)` means the operation produced no value (`play`,
/// `print`, the `;` operator); top-level statements evaluating to `None`
/// are omitted from the output.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> EvalResult<Option<Value>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    /// Equal-tempered interval, e.g. `7#12`.
    Et(Et),
    /// Frequency ratio, e.g. `3:2`.
    Ratio(Ratio),
    /// Interval measured in cents, e.g. `702c`.
    Cents(f64),
    /// Absolute frequency in Hz, always positive.
    Freq(f64),
    List(Vec<Value>),
    Waveshape(Waveshape),
    Function(FunctionVal),
    Partial(Rc<PartialFn>),
    /// The `...` placeholder used for partial application.
    Hole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveshape {
    Saw,
    Tri,
    Sine,
    Square,
}

impl Waveshape {
    pub fn name(self) -> &'static str {
        match self {
            Waveshape::Saw => "sawtooth",
            Waveshape::Tri => "triangle",
            Waveshape::Sine => "sine",
            Waveshape::Square => "square",
        }
    }
}

#[derive(Clone)]
pub enum FunctionVal {
    /// Function implemented in Rust.
    Native { name: Rc<str>, f: NativeFn },
    /// Function defined with `f(x) = body`; the body is a parsed tree.
    User(Rc<UserFn>),
    /// Function defined by the `function` macro; the body is re-evaluated
    /// from source on every call.
    Textual(Rc<TextualFn>),
}

impl FunctionVal {
    pub fn name(&self) -> &str {
        match self {
            FunctionVal::Native { name, .. } => name,
            FunctionVal::User(f) => &f.name,
            FunctionVal::Textual(f) => &f.name,
        }
    }
}

impl fmt::Debug for FunctionVal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FunctionVal({})", self.name())
    }
}

impl PartialEq for FunctionVal {
    fn eq(&self, other: &FunctionVal) -> bool {
        match (self, other) {
            (
                FunctionVal::Native { f: a, name: n1 },
                FunctionVal::Native { f: b, name: n2 },
            ) => n1 == n2 && *a as usize == *b as usize,
            (FunctionVal::User(a), FunctionVal::User(b)) => Rc::ptr_eq(a, b),
            (FunctionVal::Textual(a), FunctionVal::Textual(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct UserFn {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Node>,
}

#[derive(Debug, PartialEq)]
pub struct TextualFn {
    pub name: String,
    pub params: Vec<String>,
    pub source: String,
}

/// A partially applied function or operator.
///
/// `captured` holds the original arguments in order; `Hole` slots (and
/// the holes of nested partials) are filled left to right when the
/// partial is applied.
pub struct PartialFn {
    pub target: PartialTarget,
    pub captured: Vec<Value>,
    pub display: String,
}

#[derive(Clone)]
pub enum PartialTarget {
    /// A named callable: a function, or another partial.
    Callee(Value),
    /// An operator application, with the handler captured at creation so
    /// a later redefinition of the symbol does not change the partial.
    Op { symbol: String, handler: OpHandler },
}

impl PartialFn {
    /// Number of arguments still needed to saturate this partial.
    pub fn hole_count(&self) -> usize {
        self.captured
            .iter()
            .map(|v| match v {
                Value::Hole => 1,
                Value::Partial(p) => p.hole_count(),
                _ => 0,
            })
            .sum()
    }
}

impl fmt::Debug for PartialFn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PartialFn({})", self.display)
    }
}

impl PartialEq for PartialFn {
    fn eq(&self, other: &PartialFn) -> bool {
        // identity comparison; partials are only equal to themselves
        std::ptr::eq(self, other)
    }
}

/// The type tag shown to the user next to every result.
pub fn display_type(v: &Value) -> &'static str {
    match v {
        Value::Number(_) => "number",
        Value::Bool(_) => "bool",
        Value::Et(_) => "et",
        Value::Ratio(_) => "ratio",
        Value::Cents(_) => "cents",
        Value::Freq(_) => "freq",
        Value::List(_) => "list",
        Value::Waveshape(_) => "waveshape",
        Value::Function(_) => "function",
        Value::Partial(_) => "partial function",
        Value::Hole => "hole",
    }
}

/// Interval types measure a distance between two pitches.
pub fn is_interval(v: &Value) -> bool {
    matches!(v, Value::Et(_) | Value::Ratio(_) | Value::Cents(_))
}

/// Note types name an absolute pitch. Cents and equal-tempered values
/// are both: `6300c` reads as a position on the keyboard as well as an
/// interval of 63 semitones.
pub fn is_note(v: &Value) -> bool {
    matches!(v, Value::Et(_) | Value::Freq(_) | Value::Cents(_))
}

/// The size of a value in cents, where it has one. Frequencies map to
/// their position on the 12-tone keyboard (so comparisons between notes
/// and frequencies agree with musical pitch height).
pub fn cents_of(v: &Value) -> Option<f64> {
    match v {
        Value::Et(e) => Some(e.cents()),
        Value::Ratio(r) => Some(r.cents()),
        Value::Cents(c) => Some(*c),
        Value::Freq(hz) => Some(pitch::freq_to_et(*hz, 12.0) * 100.0),
        _ => None,
    }
}

/// Truthiness for `&&`, `||`, `!` and the comparison combinators:
/// `false` and `0` are falsy, everything else is truthy.
pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(x) => *x != 0.0,
        _ => true,
    }
}

/// Render a list of offending values for an error message.
pub fn given_vals(vals: &[&Value]) -> String {
    let parts: Vec<String> = vals
        .iter()
        .map(|v| format!("{} ({})", v, display_type(v)))
        .collect();
    format!("Given: {}", parts.join(", "))
}

/// Round to two decimal places for display.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Number(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Et(e) => write!(f, "{}#{}", round2(e.steps), round2(e.base)),
            Value::Ratio(r) => write!(f, "{}:{}", round2(r.n), round2(r.d)),
            Value::Cents(c) => write!(f, "{}c", round2(*c)),
            Value::Freq(hz) => write!(f, "{}hz", round2(*hz)),
            Value::List(items) => {
                write!(f, "'(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Value::Waveshape(w) => write!(f, "{}", w.name()),
            Value::Function(fun) => match fun {
                FunctionVal::Textual(t) => write!(f, "{}({})", t.name, t.params.join(", ")),
                _ => write!(f, "{}", fun.name()),
            },
            Value::Partial(p) => write!(f, "{}", p.display),
            Value::Hole => write!(f, "..."),
        }
    }
}
