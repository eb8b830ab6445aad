//! Plain numeric builtins: trigonometry, powers, logarithms, random
//! numbers and ranges. These are strict about their inputs; pitch values
//! must be converted to numbers first.

use super::super::interpreter::{EvalError, EvalResult, Interpreter};
use super::super::value::Value;
use super::lists::map1;
use super::{need, refs};

fn number_only(a: &Value, name: &str) -> EvalResult<f64> {
    if let Value::Number(x) = a {
        Ok(*x)
    } else {
        Err(EvalError::type_err(
            format!("Type mismatch for {}().", name),
            &[a],
        ))
    }
}

macro_rules! unary_math {
    ($(($fn_name:ident, $method:ident)),* $(,)?) => {
        $(
            pub fn $fn_name(
                interp: &mut Interpreter,
                args: &[Value],
            ) -> EvalResult<Option<Value>> {
                need(args, 1)?;
                map1(interp, &args[0], |_, a| {
                    Ok(Value::Number(number_only(a, stringify!($fn_name))?.$method()))
                })
                .map(Some)
            }
        )*
    };
}

unary_math![
    (sin, sin),
    (cos, cos),
    (tan, tan),
    (asin, asin),
    (acos, acos),
    (atan, atan),
    (exp, exp),
    (sqrt, sqrt),
];

/// Natural logarithm, or an arbitrary-base logarithm with two arguments.
pub fn log(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    let base = match args.get(1) {
        None => None,
        Some(b) => Some(number_only(b, "log")?),
    };
    map1(interp, &args[0], move |_, a| {
        let x = number_only(a, "log")?;
        Ok(Value::Number(match base {
            None => x.ln(),
            Some(b) => x.ln() / b.ln(),
        }))
    })
    .map(Some)
}

pub fn pow(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 2)?;
    super::lists::map2(interp, &args[0], &args[1], |_, a, b| {
        Ok(Value::Number(
            number_only(a, "pow")?.powf(number_only(b, "pow")?),
        ))
    })
    .map(Some)
}

pub fn max(_interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    let mut best = f64::NEG_INFINITY;
    for arg in args {
        best = best.max(number_only(arg, "max")?);
    }
    Ok(Some(Value::Number(best)))
}

pub fn min(_interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    let mut best = f64::INFINITY;
    for arg in args {
        best = best.min(number_only(arg, "min")?);
    }
    Ok(Some(Value::Number(best)))
}

/// One random number in `[0, 1)`, or a list of `n` of them.
pub fn random(_interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    match args.first() {
        None => Ok(Some(Value::Number(rand::random::<f64>()))),
        Some(Value::Number(n)) if *n >= 1.0 => {
            let count = n.floor() as usize;
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                out.push(Value::Number(rand::random::<f64>()));
            }
            Ok(Some(Value::List(out)))
        }
        _ => Err(EvalError::type_err(
            "random() takes an optional positive count.",
            &refs(args),
        )),
    }
}

/// Inclusive integer range, in either direction: `range(1, 4)` is
/// `'(1, 2, 3, 4)`, `range(3)` is `'(0, 1, 2, 3)`.
pub fn range(_interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    let first = number_only(&args[0], "range")?;
    let (mut from, to) = match args.get(1) {
        Some(b) => (first, number_only(b, "range")?),
        None => (0.0, first),
    };
    let step = if from <= to { 1.0 } else { -1.0 };
    let mut out = Vec::new();
    loop {
        out.push(Value::Number(from));
        if (step > 0.0 && from + step > to) || (step < 0.0 && from + step < to) {
            break;
        }
        from += step;
    }
    Ok(Some(Value::List(out)))
}

#[cfg(test)]
mod test {
    use super::*;

    fn num(x: f64) -> Value {
        Value::Number(x)
    }

    #[test]
    fn test_unary_math_rejects_pitch_types() {
        let mut interp = Interpreter::new();
        assert_eq!(sqrt(&mut interp, &[num(4.0)]).unwrap(), Some(num(2.0)));
        assert!(sqrt(&mut interp, &[Value::Cents(100.0)]).is_err());
    }

    #[test]
    fn test_log_with_base() {
        let mut interp = Interpreter::new();
        match log(&mut interp, &[num(8.0), num(2.0)]).unwrap() {
            Some(Value::Number(x)) => assert!((x - 3.0).abs() < 1e-9),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_min_is_not_max() {
        let mut interp = Interpreter::new();
        assert_eq!(
            min(&mut interp, &[num(3.0), num(1.0), num(2.0)]).unwrap(),
            Some(num(1.0))
        );
        assert_eq!(
            max(&mut interp, &[num(3.0), num(1.0), num(2.0)]).unwrap(),
            Some(num(3.0))
        );
    }

    #[test]
    fn test_random_list() {
        let mut interp = Interpreter::new();
        match random(&mut interp, &[num(4.0)]).unwrap() {
            Some(Value::List(items)) => {
                assert_eq!(items.len(), 4);
                for item in items {
                    match item {
                        Value::Number(x) => assert!((0.0..1.0).contains(&x)),
                        other => panic!("{:?}", other),
                    }
                }
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_range_directions() {
        let mut interp = Interpreter::new();
        assert_eq!(
            range(&mut interp, &[num(1.0), num(4.0)]).unwrap(),
            Some(Value::List(vec![num(1.0), num(2.0), num(3.0), num(4.0)]))
        );
        assert_eq!(
            range(&mut interp, &[num(2.0), num(0.0)]).unwrap(),
            Some(Value::List(vec![num(2.0), num(1.0), num(0.0)]))
        );
        assert_eq!(
            range(&mut interp, &[num(2.0)]).unwrap(),
            Some(Value::List(vec![num(0.0), num(1.0), num(2.0)]))
        );
    }
}
