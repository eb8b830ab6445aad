//! Arithmetic, comparison and logic builtins.
//!
//! Every operation is an explicit dispatch over the operand type tags;
//! the rules are deliberately closed, so an uncovered combination is a
//! coercion error rather than a silent guess.

use crate::pitch::{self, Et, Ratio};

use super::super::interpreter::{EvalError, EvalResult, Interpreter};
use super::super::value::{cents_of, is_interval, is_note, truthy, Value};
use super::conversion::{self, make_freq};
use super::lists::{map1, map2};
use super::need;

/// The size of an interval or note in cents, for the operations that
/// work in log-frequency space.
fn cents(v: &Value) -> EvalResult<f64> {
    cents_of(v).ok_or_else(|| EvalError::type_err("Value has no size in cents.", &[v]))
}

pub fn add(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    if args.len() < 2 {
        // unary `+` is numeric coercion
        return conversion::number(interp, args);
    }
    map2(interp, &args[0], &args[1], |_, a, b| add_scalar(a, b)).map(Some)
}

fn add_scalar(a: &Value, b: &Value) -> EvalResult<Value> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x + y)),
        // transposition: frequency plus interval
        (Value::Freq(hz), x) | (x, Value::Freq(hz)) if is_interval(x) => {
            make_freq(pitch::note_above(*hz, cents(x)?))
        }
        (Value::Freq(x), Value::Freq(y)) => make_freq(x + y),
        (Value::Et(x), Value::Et(y)) => Ok(Value::Et(Et::new(
            x.steps + y.rebase(x.base).steps,
            x.base,
        ))),
        (Value::Et(x), y) if is_interval(y) => {
            Ok(Value::Et(Et::from_cents(x.cents() + cents(y)?, x.base)))
        }
        (x, Value::Et(y)) if is_interval(x) => {
            Ok(Value::Et(Et::from_cents(cents(x)? + y.cents(), y.base)))
        }
        (Value::Cents(x), y) if is_interval(y) => Ok(Value::Cents(x + cents(y)?)),
        (x, Value::Cents(y)) if is_interval(x) => Ok(Value::Cents(cents(x)? + y)),
        (Value::Ratio(x), Value::Ratio(y)) => Ok(Value::Ratio(x.stack(*y))),
        _ => Err(EvalError::type_err(
            "Ambiguous or incorrect call to +.",
            &[a, b],
        )),
    }
}

pub fn subtract(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    if args.len() < 2 {
        // unary `-` is inversion
        return inverse(interp, args);
    }
    map2(interp, &args[0], &args[1], |_, a, b| sub_scalar(a, b)).map(Some)
}

fn sub_scalar(a: &Value, b: &Value) -> EvalResult<Value> {
    if let (Value::Freq(x), Value::Freq(y)) = (a, b) {
        return make_freq(x - y);
    }
    add_scalar(a, &inverse_scalar(b)?)
}

pub fn inverse(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    map1(interp, &args[0], |_, a| inverse_scalar(a)).map(Some)
}

fn inverse_scalar(a: &Value) -> EvalResult<Value> {
    match a {
        Value::Number(x) => Ok(Value::Number(-x)),
        Value::Et(e) => Ok(Value::Et(Et::new(-e.steps, e.base))),
        Value::Cents(c) => Ok(Value::Cents(-c)),
        Value::Ratio(r) => Ok(Value::Ratio(r.recip())),
        Value::Freq(_) => Err(EvalError::domain("Frequencies cannot be negative.")),
        _ => Err(EvalError::type_err("Unable to invert.", &[a])),
    }
}

pub fn multiply(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 2)?;
    map2(interp, &args[0], &args[1], |_, a, b| mul_scalar(a, b)).map(Some)
}

fn mul_scalar(a: &Value, b: &Value) -> EvalResult<Value> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x * y)),
        (Value::Number(k), v) | (v, Value::Number(k)) => scale_scalar(v, *k),
        _ => Err(EvalError::type_err(
            "At least one argument of * must be a number.",
            &[a, b],
        )),
    }
}

/// Multiply a pitch value by a plain number. For intervals this works in
/// log-frequency space: doubling a ratio stacks it on itself.
fn scale_scalar(v: &Value, k: f64) -> EvalResult<Value> {
    match v {
        Value::Freq(hz) => make_freq(hz * k),
        Value::Et(e) => Ok(Value::Et(Et::new(e.steps * k, e.base))),
        Value::Cents(c) => Ok(Value::Cents(c * k)),
        Value::Ratio(r) => Ok(Value::Ratio(r.scale(k))),
        _ => Err(EvalError::type_err(
            "At least one argument of * must be a number.",
            &[v],
        )),
    }
}

pub fn divide(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 2)?;
    map2(interp, &args[0], &args[1], |_, a, b| div_scalar(a, b)).map(Some)
}

fn div_scalar(a: &Value, b: &Value) -> EvalResult<Value> {
    let bad = || EvalError::type_err("Incompatible types for /.", &[a, b]);
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x / y)),
        (Value::Freq(hz), Value::Number(k)) => make_freq(hz / k),
        (Value::Freq(x), Value::Freq(y)) => Ok(Value::Number(x / y)),
        // how many times does the interval fit below the note?
        (Value::Freq(_), y) if is_interval(y) => Ok(Value::Number(cents(a)? / cents(y)?)),
        (_, Value::Freq(_)) => Err(bad()),
        (x, y) if is_interval(x) && is_interval(y) => Ok(Value::Number(cents(x)? / cents(y)?)),
        (x, Value::Number(k)) if is_interval(x) => scale_scalar(x, 1.0 / k),
        _ => Err(bad()),
    }
}

pub fn modulo(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 2)?;
    map2(interp, &args[0], &args[1], |_, a, b| mod_scalar(a, b)).map(Some)
}

fn mod_scalar(a: &Value, b: &Value) -> EvalResult<Value> {
    let bad = || EvalError::type_err("Incompatible types for %.", &[a, b]);
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(pitch::modulo(*x, *y))),
        (Value::Freq(x), Value::Freq(y)) => make_freq(pitch::modulo(*x, *y)),
        (_, Value::Freq(_)) => Err(bad()),
        // reduce in 12-ET step space, then convert back; this keeps
        // octave reduction of ratios exact enough to read
        (Value::Ratio(r), y) if is_interval(y) => {
            let steps = pitch::modulo(r.cents() / 100.0, cents(y)? / 100.0);
            Ok(Value::Ratio(Et::new(steps, 12.0).as_ratio()))
        }
        (Value::Et(e), y) if is_interval(y) => {
            let span = Et::from_cents(cents(y)?, e.base).steps;
            Ok(Value::Et(Et::new(pitch::modulo(e.steps, span), e.base)))
        }
        (Value::Cents(c), y) if is_interval(y) => {
            Ok(Value::Cents(pitch::modulo(*c, cents(y)?)))
        }
        _ => Err(bad()),
    }
}

/// Octave-reduce a value: the remainder after removing whole `2:1`s.
pub fn normalize(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    let octave = Value::Ratio(Ratio::new(2.0, 1.0));
    map1(interp, &args[0], |_, a| mod_scalar(a, &octave)).map(Some)
}

pub fn abs(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    map1(interp, &args[0], |_, a| abs_scalar(a)).map(Some)
}

fn abs_scalar(a: &Value) -> EvalResult<Value> {
    match a {
        Value::Number(x) => Ok(Value::Number(x.abs())),
        Value::Et(e) => Ok(Value::Et(Et::new(e.steps.abs(), e.base))),
        Value::Cents(c) => Ok(Value::Cents(c.abs())),
        // the ascending version of the interval
        Value::Ratio(r) => {
            if r.n < r.d {
                Ok(Value::Ratio(r.recip()))
            } else {
                Ok(Value::Ratio(*r))
            }
        }
        Value::Freq(hz) => Ok(Value::Freq(*hz)),
        _ => Err(EvalError::type_err(
            "Unable to take the absolute value.",
            &[a],
        )),
    }
}

pub fn round(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    rounded(interp, args, f64::round)
}

pub fn ceil(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    rounded(interp, args, f64::ceil)
}

pub fn floor(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    rounded(interp, args, f64::floor)
}

fn rounded(
    interp: &mut Interpreter,
    args: &[Value],
    f: fn(f64) -> f64,
) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    map1(interp, &args[0], |_, a| round_scalar(a, f)).map(Some)
}

fn round_scalar(a: &Value, f: fn(f64) -> f64) -> EvalResult<Value> {
    match a {
        Value::Number(x) => Ok(Value::Number(f(*x))),
        Value::Et(e) => Ok(Value::Et(Et::new(f(e.steps), e.base))),
        Value::Cents(c) => Ok(Value::Cents(f(*c))),
        // ratios round to the nearest semitone
        Value::Ratio(r) => Ok(Value::Et(Et::new(f(r.cents() / 100.0), 12.0))),
        Value::Freq(hz) => make_freq(f(*hz)),
        other => Ok(other.clone()),
    }
}

#[derive(Clone, Copy)]
enum CmpOp {
    Gt,
    Lt,
    Eq,
}

/// Pitch values compare by their size in cents; intervals compare with
/// intervals, notes with notes. Numbers and bools compare among
/// themselves.
fn compare_scalar(a: &Value, b: &Value, op: CmpOp) -> EvalResult<Value> {
    let bad = || EvalError::type_err("Cannot compare the given values.", &[a, b]);
    if (is_interval(a) && is_interval(b)) || (is_note(a) && is_note(b)) {
        let (x, y) = (cents(a)?, cents(b)?);
        return Ok(Value::Bool(match op {
            CmpOp::Gt => x > y,
            CmpOp::Lt => x < y,
            CmpOp::Eq => (x - y).abs() < 1e-9,
        }));
    }
    if is_interval(a) || is_note(a) || is_interval(b) || is_note(b) {
        return Err(bad());
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Bool(match op {
            CmpOp::Gt => x > y,
            CmpOp::Lt => x < y,
            CmpOp::Eq => x == y,
        })),
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(match op {
            CmpOp::Gt => *x && !*y,
            CmpOp::Lt => !*x && *y,
            CmpOp::Eq => x == y,
        })),
        (Value::Waveshape(x), Value::Waveshape(y)) => match op {
            CmpOp::Eq => Ok(Value::Bool(x == y)),
            _ => Err(bad()),
        },
        _ => Err(bad()),
    }
}

pub fn greater_than(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 2)?;
    map2(interp, &args[0], &args[1], |_, a, b| {
        compare_scalar(a, b, CmpOp::Gt)
    })
    .map(Some)
}

pub fn less_than(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 2)?;
    map2(interp, &args[0], &args[1], |_, a, b| {
        compare_scalar(a, b, CmpOp::Lt)
    })
    .map(Some)
}

/// Equality never fails: values no rule can compare are simply unequal.
pub fn equal(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 2)?;
    match map2(interp, &args[0], &args[1], |_, a, b| {
        compare_scalar(a, b, CmpOp::Eq)
    }) {
        Ok(value) => Ok(Some(value)),
        Err(_) => Ok(Some(Value::Bool(false))),
    }
}

pub fn not_equal(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    let result = equal(interp, args)?;
    Ok(Some(Value::Bool(
        !result.map_or(false, |v| truthy(&v)),
    )))
}

pub fn greater_than_or_equal(
    interp: &mut Interpreter,
    args: &[Value],
) -> EvalResult<Option<Value>> {
    match greater_than(interp, args)? {
        Some(v) if truthy(&v) => Ok(Some(v)),
        _ => equal(interp, args),
    }
}

pub fn less_than_or_equal(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    match less_than(interp, args)? {
        Some(v) if truthy(&v) => Ok(Some(v)),
        _ => equal(interp, args),
    }
}

/// `&&` and `||` return one of their operands, not a bool. Both sides
/// are evaluated before the operator runs.
pub fn and(_interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 2)?;
    if truthy(&args[0]) {
        Ok(Some(args[1].clone()))
    } else {
        Ok(Some(args[0].clone()))
    }
}

pub fn or(_interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 2)?;
    if truthy(&args[0]) {
        Ok(Some(args[0].clone()))
    } else {
        Ok(Some(args[1].clone()))
    }
}

pub fn not(_interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    Ok(Some(Value::Bool(!truthy(&args[0]))))
}

#[cfg(test)]
mod test {
    use super::*;

    fn num(x: f64) -> Value {
        Value::Number(x)
    }

    fn ratio(n: f64, d: f64) -> Value {
        Value::Ratio(Ratio::new(n, d))
    }

    fn et(steps: f64, base: f64) -> Value {
        Value::Et(Et::new(steps, base))
    }

    #[test]
    fn test_add_dispatch() {
        assert_eq!(add_scalar(&num(2.0), &num(3.0)).unwrap(), num(5.0));
        assert_eq!(
            add_scalar(&ratio(5.0, 4.0), &ratio(3.0, 2.0)).unwrap(),
            ratio(15.0, 8.0)
        );
        assert_eq!(
            add_scalar(&et(2.0, 12.0), &et(19.0, 19.0)).unwrap(),
            et(14.0, 12.0)
        );
        // freq + interval transposes
        match add_scalar(&Value::Freq(440.0), &ratio(3.0, 2.0)).unwrap() {
            Value::Freq(hz) => assert!((hz - 660.0).abs() < 1e-9),
            other => panic!("{:?}", other),
        }
        // interval + number has no rule
        assert!(add_scalar(&ratio(3.0, 2.0), &num(1.0)).is_err());
    }

    #[test]
    fn test_cents_absorb_intervals() {
        match add_scalar(&Value::Cents(100.0), &ratio(2.0, 1.0)).unwrap() {
            Value::Cents(c) => assert!((c - 1300.0).abs() < 1e-9),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_subtract_via_inverse() {
        assert_eq!(
            sub_scalar(&ratio(3.0, 2.0), &ratio(3.0, 2.0)).unwrap(),
            ratio(6.0, 6.0)
        );
        // freq - freq is linear, not an interval
        match sub_scalar(&Value::Freq(660.0), &Value::Freq(440.0)).unwrap() {
            Value::Freq(hz) => assert!((hz - 220.0).abs() < 1e-9),
            other => panic!("{:?}", other),
        }
        // interval - freq would need a negative frequency
        assert!(sub_scalar(&ratio(3.0, 2.0), &Value::Freq(440.0)).is_err());
    }

    #[test]
    fn test_multiply_scales_intervals() {
        assert_eq!(mul_scalar(&ratio(3.0, 2.0), &num(2.0)).unwrap(), ratio(9.0, 4.0));
        assert_eq!(mul_scalar(&num(2.0), &et(7.0, 12.0)).unwrap(), et(14.0, 12.0));
        assert!(mul_scalar(&ratio(3.0, 2.0), &ratio(3.0, 2.0)).is_err());
    }

    #[test]
    fn test_divide_measures_intervals() {
        // how many 12-et semitones make an octave
        match div_scalar(&ratio(2.0, 1.0), &et(1.0, 12.0)).unwrap() {
            Value::Number(x) => assert!((x - 12.0).abs() < 1e-9),
            other => panic!("{:?}", other),
        }
        assert!(div_scalar(&num(2.0), &Value::Freq(440.0)).is_err());
    }

    #[test]
    fn test_modulo_octave_reduction() {
        // 3:1 reduced by the octave is a fifth
        match mod_scalar(&ratio(3.0, 1.0), &ratio(2.0, 1.0)).unwrap() {
            Value::Ratio(r) => assert!((r.decimal() - 1.5).abs() < 1e-9),
            other => panic!("{:?}", other),
        }
        match mod_scalar(&et(13.0, 12.0), &ratio(2.0, 1.0)).unwrap() {
            Value::Et(e) => {
                assert!((e.steps - 1.0).abs() < 1e-9);
                assert_eq!(e.base, 12.0);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_abs_ratio_ascends() {
        assert_eq!(abs_scalar(&ratio(2.0, 3.0)).unwrap(), ratio(3.0, 2.0));
        assert_eq!(abs_scalar(&ratio(3.0, 2.0)).unwrap(), ratio(3.0, 2.0));
    }

    #[test]
    fn test_round_ratio_to_semitones() {
        assert_eq!(round_scalar(&ratio(3.0, 2.0), f64::round).unwrap(), et(7.0, 12.0));
    }

    #[test]
    fn test_compare_mixed_classes() {
        // et is both interval and note, so it compares with either
        assert_eq!(
            compare_scalar(&et(7.0, 12.0), &ratio(3.0, 2.0), CmpOp::Lt).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            compare_scalar(&Value::Freq(440.0), &et(69.0, 12.0), CmpOp::Eq).unwrap(),
            Value::Bool(true)
        );
        // a pure interval cannot be compared with an absolute frequency
        assert!(compare_scalar(&ratio(3.0, 2.0), &Value::Freq(440.0), CmpOp::Gt).is_err());
        assert!(compare_scalar(&num(1.0), &ratio(3.0, 2.0), CmpOp::Gt).is_err());
    }
}
