//! List construction, indexing, and the elementwise broadcasting that
//! every arithmetic builtin goes through.

use super::super::interpreter::{EvalError, EvalResult, Interpreter};
use super::super::value::Value;
use super::{need, refs};

/// Apply a scalar operation across a value, mapping over lists one
/// level deep.
pub fn map1<F>(interp: &mut Interpreter, a: &Value, f: F) -> EvalResult<Value>
where
    F: Fn(&mut Interpreter, &Value) -> EvalResult<Value>,
{
    if let Value::List(items) = a {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(f(interp, item)?);
        }
        Ok(Value::List(out))
    } else {
        f(interp, a)
    }
}

/// Binary broadcasting: list/list pairs must have equal length and are
/// combined pairwise, list/scalar pairs map the scalar across the list.
pub fn map2<F>(interp: &mut Interpreter, a: &Value, b: &Value, f: F) -> EvalResult<Value>
where
    F: Fn(&mut Interpreter, &Value, &Value) -> EvalResult<Value>,
{
    match (a, b) {
        (Value::List(xs), Value::List(ys)) => {
            if xs.len() != ys.len() {
                return Err(EvalError::size_err(&[a, b]));
            }
            let mut out = Vec::with_capacity(xs.len());
            for (x, y) in xs.iter().zip(ys) {
                out.push(f(interp, x, y)?);
            }
            Ok(Value::List(out))
        }
        (Value::List(xs), y) => {
            let mut out = Vec::with_capacity(xs.len());
            for x in xs {
                out.push(f(interp, x, y)?);
            }
            Ok(Value::List(out))
        }
        (x, Value::List(ys)) => {
            let mut out = Vec::with_capacity(ys.len());
            for y in ys {
                out.push(f(interp, x, y)?);
            }
            Ok(Value::List(out))
        }
        _ => f(interp, a, b),
    }
}

/// Recursively flatten nested lists into `out`.
pub fn flatten_into(value: &Value, out: &mut Vec<Value>) {
    if let Value::List(items) = value {
        for item in items {
            flatten_into(item, out);
        }
    } else {
        out.push(value.clone());
    }
}

/// The `list` builtin (also reachable as `'` and through `[...]`).
pub fn list(_interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    for arg in args {
        if let Value::Function(_) | Value::Partial(_) = arg {
            return Err(EvalError::type_err(
                "Cannot make a list of functions.",
                &refs(args),
            ));
        }
    }
    Ok(Some(Value::List(args.to_vec())))
}

pub fn get_index(_interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 2)?;
    match (&args[0], &args[1]) {
        (Value::List(items), Value::Number(index)) => {
            if index.fract() == 0.0 && *index >= 0.0 && (*index as usize) < items.len() {
                Ok(Some(items[*index as usize].clone()))
            } else {
                Err(EvalError::domain(format!(
                    "Index {} is out of range.",
                    index
                )))
            }
        }
        (a, b) => Err(EvalError::type_err(
            "Indexing requires a list and a whole number.",
            &[a, b],
        )),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn num(x: f64) -> Value {
        Value::Number(x)
    }

    #[test]
    fn test_map2_broadcasting() {
        let mut interp = Interpreter::new();
        let add = |_: &mut Interpreter, a: &Value, b: &Value| match (a, b) {
            (Value::Number(x), Value::Number(y)) => Ok(num(x + y)),
            _ => unreachable!(),
        };
        let xs = Value::List(vec![num(1.0), num(2.0)]);
        let ys = Value::List(vec![num(10.0), num(20.0)]);
        assert_eq!(
            map2(&mut interp, &xs, &ys, add).unwrap(),
            Value::List(vec![num(11.0), num(22.0)])
        );
        assert_eq!(
            map2(&mut interp, &xs, &num(5.0), add).unwrap(),
            Value::List(vec![num(6.0), num(7.0)])
        );
        assert!(map2(&mut interp, &xs, &Value::List(vec![num(1.0)]), add).is_err());
    }

    #[test]
    fn test_flatten() {
        let nested = Value::List(vec![
            num(1.0),
            Value::List(vec![num(2.0), Value::List(vec![num(3.0)])]),
        ]);
        let mut out = Vec::new();
        flatten_into(&nested, &mut out);
        assert_eq!(out, vec![num(1.0), num(2.0), num(3.0)]);
    }

    #[test]
    fn test_list_rejects_functions() {
        let mut interp = Interpreter::new();
        let f = super::super::table().get("add").cloned().unwrap();
        assert!(list(&mut interp, &[num(1.0), f]).is_err());
    }

    #[test]
    fn test_get_index_bounds() {
        let mut interp = Interpreter::new();
        let xs = Value::List(vec![num(10.0), num(20.0)]);
        assert_eq!(
            get_index(&mut interp, &[xs.clone(), num(1.0)]).unwrap(),
            Some(num(20.0))
        );
        assert!(get_index(&mut interp, &[xs.clone(), num(2.0)]).is_err());
        assert!(get_index(&mut interp, &[xs.clone(), num(-1.0)]).is_err());
        assert!(get_index(&mut interp, &[xs, num(0.5)]).is_err());
    }
}
