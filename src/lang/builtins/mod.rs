//! The builtin environment: native functions and constants.
//!
//! Builtins live in their own immutable layer below the user globals, so
//! a program can shadow `pi` or `add` by assignment without losing the
//! original for later sessions of the same interpreter.

pub mod analysis;
pub mod arithmetic;
pub mod conversion;
pub mod lists;
pub mod numeric;
pub mod playback;

use std::collections::HashMap;
use std::f64::consts;

use super::interpreter::{EvalError, EvalResult, Interpreter};
use super::value::{FunctionVal, NativeFn, Value, Waveshape};
use crate::pitch::Ratio;

/// Handler of the `;` operator: swallow the operand.
pub fn null_op(_interp: &mut Interpreter, _args: &[Value]) -> EvalResult<Option<Value>> {
    Ok(None)
}

/// Collect argument references for error messages.
pub(crate) fn refs(args: &[Value]) -> Vec<&Value> {
    args.iter().collect()
}

/// Reject calls with fewer than `n` arguments.
pub(crate) fn need(args: &[Value], n: usize) -> EvalResult<()> {
    if args.len() < n {
        Err(EvalError::arity(n, &refs(args)))
    } else {
        Ok(())
    }
}

/// The full builtin environment.
pub fn table() -> HashMap<String, Value> {
    let mut env = HashMap::new();

    let natives: &[(&str, NativeFn)] = &[
        ("add", arithmetic::add),
        ("subtract", arithmetic::subtract),
        ("multiply", arithmetic::multiply),
        ("divide", arithmetic::divide),
        ("mod", arithmetic::modulo),
        ("pow", numeric::pow),
        ("inverse", arithmetic::inverse),
        ("abs", arithmetic::abs),
        ("round", arithmetic::round),
        ("ceil", arithmetic::ceil),
        ("floor", arithmetic::floor),
        ("normalize", arithmetic::normalize),
        ("greaterThan", arithmetic::greater_than),
        ("lessThan", arithmetic::less_than),
        ("greaterThanOrEqual", arithmetic::greater_than_or_equal),
        ("lessThanOrEqual", arithmetic::less_than_or_equal),
        ("equal", arithmetic::equal),
        ("notEqual", arithmetic::not_equal),
        ("and", arithmetic::and),
        ("or", arithmetic::or),
        ("not", arithmetic::not),
        ("ratio", conversion::ratio),
        ("et", conversion::et),
        ("cents", conversion::cents),
        ("freq", conversion::freq),
        ("number", conversion::number),
        ("mtof", conversion::mtof),
        ("ftom", conversion::ftom),
        ("list", lists::list),
        ("getIndex", lists::get_index),
        ("sin", numeric::sin),
        ("cos", numeric::cos),
        ("tan", numeric::tan),
        ("asin", numeric::asin),
        ("acos", numeric::acos),
        ("atan", numeric::atan),
        ("exp", numeric::exp),
        ("sqrt", numeric::sqrt),
        ("log", numeric::log),
        ("max", numeric::max),
        ("min", numeric::min),
        ("random", numeric::random),
        ("range", numeric::range),
        ("simplify", analysis::simplify),
        ("closest", analysis::closest),
        ("approxpartials", analysis::approxpartials),
        ("just", analysis::just),
        ("consistent", analysis::consistent),
        ("smallestConsistent", analysis::smallest_consistent),
        ("play", playback::play),
        ("print", playback::print),
    ];
    for (name, f) in natives {
        env.insert(
            (*name).to_owned(),
            Value::Function(FunctionVal::Native {
                name: (*name).into(),
                f: *f,
            }),
        );
    }

    // the quote name `'` is the same function as `list`
    if let Some(list_fn) = env.get("list").cloned() {
        env.insert("'".to_owned(), list_fn);
    }

    env.insert("pi".to_owned(), Value::Number(consts::PI));
    env.insert("e".to_owned(), Value::Number(consts::E));

    // common just intervals
    env.insert("octave".to_owned(), Value::Ratio(Ratio::new(2.0, 1.0)));
    env.insert("fifth".to_owned(), Value::Ratio(Ratio::new(3.0, 2.0)));
    env.insert("third".to_owned(), Value::Ratio(Ratio::new(5.0, 4.0)));
    env.insert("seventh".to_owned(), Value::Ratio(Ratio::new(7.0, 4.0)));

    env.insert("true".to_owned(), Value::Bool(true));
    env.insert("false".to_owned(), Value::Bool(false));
    env.insert("__functionsAsData".to_owned(), Value::Bool(false));

    env.insert("...".to_owned(), Value::Hole);

    for (name, shape) in &[
        ("sawtooth", Waveshape::Saw),
        ("saw", Waveshape::Saw),
        ("triangle", Waveshape::Tri),
        ("tri", Waveshape::Tri),
        ("sine", Waveshape::Sine),
        ("square", Waveshape::Square),
        ("rect", Waveshape::Square),
    ] {
        env.insert((*name).to_owned(), Value::Waveshape(*shape));
    }

    env
}
