//! Conversions between the pitch types, including the `:` and `#`
//! constructor operators and the `c`/`hz` postfix units.

use crate::pitch::{self, Et, Ratio};

use super::super::interpreter::{EvalError, EvalResult, Interpreter};
use super::super::value::Value;
use super::lists::{map1, map2};
use super::need;

/// A frequency value, validated to be finite and positive.
pub(crate) fn make_freq(hz: f64) -> EvalResult<Value> {
    if hz.is_finite() && hz > 0.0 {
        Ok(Value::Freq(hz))
    } else {
        Err(EvalError::domain("Frequencies must be positive."))
    }
}

/// The `:` operator. On plain numbers it is the ratio constructor; on a
/// ratio or a list of ratios it extends a compound ratio, so `4:5:6:7`
/// becomes the otonal chord `'(5:4, 6:4, 7:4)`.
pub fn colon(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    if let (Value::Ratio(r), Some(Value::Number(x))) = (&args[0], args.get(1)) {
        return Ok(Some(Value::List(vec![
            Value::Ratio(r.recip()),
            Value::Ratio(Ratio::new(*x, r.n)),
        ])));
    }
    if let (Value::List(items), Some(Value::Number(x))) = (&args[0], args.get(1)) {
        if let Some(Value::Ratio(first)) = items.first() {
            let mut out = Vec::with_capacity(items.len() + 1);
            for item in items {
                match item {
                    Value::Ratio(_) => out.push(item.clone()),
                    other => {
                        return Err(EvalError::type_err(
                            "Unable to extend the compound ratio.",
                            &[other],
                        ))
                    }
                }
            }
            out.push(Value::Ratio(Ratio::new(*x, first.d)));
            return Ok(Some(Value::List(out)));
        }
    }
    ratio(interp, args)
}

pub fn ratio(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    match args.get(1) {
        Some(b) => map2(interp, &args[0], b, |_, a, b| ratio_scalar(a, Some(b))).map(Some),
        None => map1(interp, &args[0], |_, a| ratio_scalar(a, None)).map(Some),
    }
}

fn ratio_scalar(a: &Value, b: Option<&Value>) -> EvalResult<Value> {
    match (a, b) {
        (Value::Number(n), None) => new_ratio(*n, 1.0),
        (Value::Number(n), Some(Value::Number(d))) => new_ratio(*n, *d),
        (_, Some(b)) => Err(EvalError::type_err(
            "Incompatible type(s) for the ratio constructor.",
            &[a, b],
        )),
        (Value::Ratio(r), None) => Ok(Value::Ratio(*r)),
        (Value::Et(e), None) => Ok(Value::Ratio(e.as_ratio())),
        (Value::Cents(c), None) => Ok(Value::Ratio(Et::from_cents(*c, 12.0).as_ratio())),
        _ => Err(EvalError::type_err(
            "Incompatible type(s) for the ratio constructor.",
            &[a],
        )),
    }
}

fn new_ratio(n: f64, d: f64) -> EvalResult<Value> {
    if n > 0.0 && d > 0.0 && n.is_finite() && d.is_finite() {
        Ok(Value::Ratio(Ratio::new(n, d)))
    } else {
        Err(EvalError::domain("Ratios must be positive."))
    }
}

/// The `#` operator and `et()` builtin. The optional second argument is
/// the octave division; an optional third argument re-measures the
/// division against a stretched octave (e.g. the tritave `3:1`).
pub fn et(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    let mut base = match args.get(1) {
        None => None,
        Some(Value::Number(b)) => Some(*b),
        Some(other) => {
            return Err(EvalError::type_err(
                "Incompatible type(s) for the et constructor.",
                &[other],
            ))
        }
    };
    if let (Some(b), Some(octave)) = (base, args.get(2)) {
        // b divisions of the given octave, re-measured against 2:1
        let octave_decimal = match octave {
            Value::Ratio(r) => r.decimal(),
            Value::Et(e) => e.as_ratio().decimal(),
            Value::Cents(c) => (c / 1200.0).exp2(),
            other => {
                return Err(EvalError::type_err(
                    "Incompatible type(s) for the et constructor.",
                    &[other],
                ))
            }
        };
        base = Some(b / octave_decimal.log2());
    }
    if let Some(b) = base {
        if !(b > 0.0) || !b.is_finite() {
            return Err(EvalError::domain("The ET base must be positive."));
        }
    }
    map1(interp, &args[0], move |_, a| et_scalar(a, base)).map(Some)
}

fn et_scalar(a: &Value, base: Option<f64>) -> EvalResult<Value> {
    let base = base.unwrap_or(12.0);
    match a {
        Value::Number(n) => Ok(Value::Et(Et::new(*n, base))),
        Value::Et(e) => Ok(Value::Et(e.rebase(base))),
        Value::Cents(c) => Ok(Value::Et(Et::from_cents(*c, base))),
        Value::Ratio(r) => Ok(Value::Et(Et::from_cents(r.cents(), base))),
        Value::Freq(hz) => Ok(Value::Et(Et::new(pitch::freq_to_et(*hz, base), base))),
        _ => Err(EvalError::type_err(
            "Incompatible type(s) for the et constructor.",
            &[a],
        )),
    }
}

pub fn cents(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    map1(interp, &args[0], |_, a| cents_scalar(a)).map(Some)
}

fn cents_scalar(a: &Value) -> EvalResult<Value> {
    match a {
        Value::Number(n) => Ok(Value::Cents(*n)),
        Value::Cents(c) => Ok(Value::Cents(*c)),
        Value::Et(e) => Ok(Value::Cents(e.cents())),
        Value::Ratio(r) => Ok(Value::Cents(r.cents())),
        // the position of the frequency on the 12-et keyboard, in cents
        Value::Freq(hz) => Ok(Value::Cents(pitch::freq_to_et(*hz, 12.0) * 100.0)),
        _ => Err(EvalError::type_err("Unable to convert to cents.", &[a])),
    }
}

/// The `hz` postfix and `freq()` builtin. Et and cents inputs are read
/// as keyboard positions, numbers as raw Hz.
pub fn freq(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    map1(interp, &args[0], |_, a| freq_scalar(a)).map(Some)
}

pub(crate) fn freq_scalar(a: &Value) -> EvalResult<Value> {
    match a {
        Value::Number(n) => make_freq(*n),
        Value::Freq(hz) => Ok(Value::Freq(*hz)),
        Value::Et(e) => make_freq(pitch::et_to_freq(e.cents() / 100.0, 12.0)),
        Value::Cents(c) => make_freq(pitch::et_to_freq(c / 100.0, 12.0)),
        _ => Err(EvalError::type_err("Unable to convert to Hz.", &[a])),
    }
}

pub fn number(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    map1(interp, &args[0], |_, a| number_scalar(a)).map(Some)
}

fn number_scalar(a: &Value) -> EvalResult<Value> {
    match a {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Et(e) => Ok(Value::Number(e.cents() / 100.0)),
        Value::Cents(c) => Ok(Value::Number(*c)),
        Value::Ratio(r) => Ok(Value::Number(r.decimal())),
        Value::Freq(hz) => Ok(Value::Number(*hz)),
        _ => Err(EvalError::type_err("Unable to convert to a number.", &[a])),
    }
}

/// Midi key number to frequency.
pub fn mtof(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    map1(interp, &args[0], |_, a| mtof_scalar(a)).map(Some)
}

fn mtof_scalar(a: &Value) -> EvalResult<Value> {
    match a {
        Value::Number(n) => make_freq(pitch::et_to_freq(*n, 12.0)),
        Value::Et(e) => make_freq(pitch::et_to_freq(e.cents() / 100.0, 12.0)),
        Value::Cents(c) => make_freq(pitch::et_to_freq(c / 100.0, 12.0)),
        _ => Err(EvalError::type_err("Incompatible type for mtof().", &[a])),
    }
}

/// Frequency to (fractional) key number, with an optional octave
/// division other than 12.
pub fn ftom(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    let base = match args.get(1) {
        None => 12.0,
        Some(Value::Number(b)) if *b > 0.0 => *b,
        Some(other) => {
            return Err(EvalError::type_err(
                "Incompatible type(s) for ftom().",
                &[other],
            ))
        }
    };
    map1(interp, &args[0], move |_, a| ftom_scalar(a, base)).map(Some)
}

fn ftom_scalar(a: &Value, base: f64) -> EvalResult<Value> {
    match a {
        Value::Number(hz) => Ok(Value::Et(Et::new(pitch::freq_to_et(*hz, base), base))),
        Value::Freq(hz) => Ok(Value::Et(Et::new(pitch::freq_to_et(*hz, base), base))),
        _ => Err(EvalError::type_err(
            "Incompatible type(s) for ftom().",
            &[a],
        )),
    }
}
