//! Interval analysis: rational approximation, nearby equal temperaments,
//! harmonic-series fitting and edo consistency checks.

use std::cmp::Ordering;

use crate::pitch::{self, Et, Ratio};

use super::super::interpreter::{EvalError, EvalResult, Interpreter};
use super::super::value::{cents_of, is_interval, Value};
use super::conversion::freq_scalar;
use super::lists::{flatten_into, map1};
use super::{need, refs};

fn interval_decimal(v: &Value) -> Option<f64> {
    if is_interval(v) {
        cents_of(v).map(|c| (c / 1200.0).exp2())
    } else {
        None
    }
}

/// Find a simpler fraction within a tolerance of the interval, by
/// truncating its continued fraction expansion.
pub fn simplify(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    let tolerance = match args.get(1) {
        None => (5.0f64 / 1200.0).exp2(),
        Some(v) => interval_decimal(v).ok_or_else(|| {
            EvalError::type_err("Incompatible type(s) for simplify().", &refs(args))
        })?,
    };
    map1(interp, &args[0], move |_, v| simplify_scalar(v, tolerance)).map(Some)
}

fn simplify_scalar(interval: &Value, tolerance: f64) -> EvalResult<Value> {
    let bad = || EvalError::type_err("Incompatible type(s) for simplify().", &[interval]);
    let target = interval_decimal(interval).ok_or_else(bad)?;
    // keep the original denominator off-limits so the result is
    // genuinely simpler when the input is already a fraction
    let original_d = match interval {
        Value::Ratio(r) => r.d,
        _ => 1.0,
    };
    let err = (tolerance - 1.0) * target;

    let mut x = target;
    let mut a = x.floor();
    let (mut h1, mut k1) = (1.0, 0.0);
    let (mut h, mut k) = (a, 1.0);
    while x - a > err * k * k {
        x = 1.0 / (x - a);
        a = x.floor();
        let h2 = h1;
        let k2 = k1;
        h1 = h;
        k1 = k;
        if k2 + a * k1 == original_d {
            break;
        }
        h = h2 + a * h1;
        k = k2 + a * k1;
    }
    Ok(Value::Ratio(Ratio::new(h, k)))
}

/// For a ratio: the equal temperaments that approximate it best. For an
/// et or cents value: the closest simple ratios within a tolerance.
///
/// The optional arguments are a result count and a tolerance interval,
/// in either order.
pub fn closest(_interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    let bad = || EvalError::type_err("Incompatible type(s) for closest().", &refs(args));
    let mut count_arg = args.get(1).cloned();
    let mut tolerance_arg = args.get(2).cloned();
    if let Some(v) = &count_arg {
        // tolerate the two optional arguments in either order
        if is_interval(v) {
            std::mem::swap(&mut count_arg, &mut tolerance_arg);
        }
    }
    let count = match &count_arg {
        None => 5,
        Some(Value::Number(n)) if *n >= 1.0 => n.floor() as usize,
        Some(_) => return Err(bad()),
    };
    let tolerance = match &tolerance_arg {
        None => (30.0f64 / 1200.0).exp2(),
        Some(v) => interval_decimal(v).ok_or_else(bad)?,
    };

    let interval = &args[0];
    match interval {
        Value::List(items) => best_fit_edos(items, count).map(Some),
        Value::Ratio(r) => Ok(Some(closest_ets(r.cents(), count))),
        Value::Et(_) | Value::Cents(_) => {
            let target = interval_decimal(interval).ok_or_else(bad)?;
            closest_ratios(target, tolerance, count).map(Some)
        }
        _ => Err(bad()),
    }
}

/// The `count` equal temperaments (up to 52 divisions) whose nearest
/// step is closest to the given interval, best first.
fn closest_ets(target_cents: f64, count: usize) -> Value {
    let mut candidates: Vec<(Et, f64)> = (1..=52)
        .map(|base| {
            let base = f64::from(base);
            let et = Et::new((target_cents * base / 1200.0).round(), base);
            let error = (et.cents() - target_cents).abs();
            (et, error)
        })
        .collect();
    candidates.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.base.partial_cmp(&b.0.base).unwrap_or(Ordering::Equal))
    });
    Value::List(
        candidates
            .into_iter()
            .take(count)
            .map(|(et, _)| Value::Et(et))
            .collect(),
    )
}

/// The `count` edo sizes (up to 52) whose steps approximate every
/// interval of the set best, as plain numbers.
fn best_fit_edos(intervals: &[Value], count: usize) -> EvalResult<Value> {
    let mut targets = Vec::with_capacity(intervals.len());
    for v in intervals {
        let c = cents_of(v)
            .ok_or_else(|| EvalError::type_err("Incompatible type(s) for closest().", &[v]))?;
        targets.push(c);
    }
    let mut candidates: Vec<(f64, f64)> = (1..=52)
        .map(|base| {
            let base = f64::from(base);
            let error: f64 = targets
                .iter()
                .map(|&c| (Et::new((c * base / 1200.0).round(), base).cents() - c).abs())
                .sum();
            (base, error)
        })
        .collect();
    candidates.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal))
    });
    Ok(Value::List(
        candidates
            .into_iter()
            .take(count)
            .map(|(base, _)| Value::Number(base))
            .collect(),
    ))
}

/// The first `count` coprime fractions within the tolerance of the
/// target, searched by increasing denominator.
fn closest_ratios(target: f64, tolerance: f64, count: usize) -> EvalResult<Value> {
    let max_err = (tolerance - 1.0) * target;
    let mut out = Vec::with_capacity(count);
    let mut d: i64 = 1;
    while out.len() < count {
        let n = (target * d as f64).round() as i64;
        if n >= 1 {
            let error = (target - n as f64 / d as f64).abs();
            if error <= max_err && pitch::coprime(n, d) {
                out.push(Value::Ratio(Ratio::new(n as f64, d as f64)));
            }
        }
        d += 1;
        if d > 1_000_000 {
            return Err(EvalError::domain(
                "No ratios found within the given tolerance.",
            ));
        }
    }
    Ok(Value::List(out))
}

/// Fit the (flattened) input frequencies to a harmonic series: the result
/// is `'(fundamental, '(partial numbers))`.
pub fn approxpartials(_interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    let mut flat = Vec::new();
    for arg in args {
        flatten_into(arg, &mut flat);
    }
    let mut freqs = Vec::with_capacity(flat.len());
    for v in &flat {
        match freq_scalar(v)? {
            Value::Freq(hz) => freqs.push(hz),
            _ => return Err(EvalError::type_err("Expected pitches.", &refs(args))),
        }
    }
    if freqs.is_empty() {
        return Err(EvalError::domain("approxpartials() needs at least one pitch."));
    }
    let (fundamental, partials) = best_fit_partials(&freqs);
    Ok(Some(Value::List(vec![
        Value::Freq(fundamental),
        Value::List(
            partials
                .into_iter()
                .map(|p| Value::Ratio(Ratio::new(p as f64, 1.0)))
                .collect(),
        ),
    ])))
}

/// Retune a set of pitches to just intonation by snapping each one to a
/// whole harmonic of the fitted common fundamental. Ratio inputs are
/// treated as intervals over an implicit unison root and come back as
/// harmonics over that root.
pub fn just(_interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    let mut flat = Vec::new();
    for arg in args {
        flatten_into(arg, &mut flat);
    }
    let first = match flat.first() {
        Some(v) => v.clone(),
        None => return Ok(Some(Value::List(Vec::new()))),
    };
    if matches!(first, Value::Ratio(_)) {
        return just_intervals(&flat).map(Some);
    }
    let mut freqs = Vec::with_capacity(flat.len());
    for v in &flat {
        match freq_scalar(v)? {
            Value::Freq(hz) => freqs.push(hz),
            _ => return Err(EvalError::type_err("Expected pitches.", &refs(args))),
        }
    }
    let (fundamental, partials) = best_fit_partials(&freqs);
    let out = partials
        .iter()
        .map(|&p| {
            let snapped = fundamental * p as f64;
            match &first {
                Value::Et(_) => Value::Et(Et::new(pitch::freq_to_et(snapped, 12.0), 12.0)),
                Value::Cents(_) => Value::Cents(pitch::freq_to_et(snapped, 12.0) * 100.0),
                _ => Value::Freq(snapped),
            }
        })
        .collect();
    Ok(Some(Value::List(out)))
}

fn just_intervals(intervals: &[Value]) -> EvalResult<Value> {
    let mut freqs = Vec::with_capacity(intervals.len() + 1);
    for v in intervals {
        let c = cents_of(v)
            .ok_or_else(|| EvalError::type_err("Incompatible type(s) for just().", &[v]))?;
        freqs.push(pitch::et_to_freq(c / 100.0, 12.0));
    }
    // the unison root anchors the harmonic numbers
    freqs.push(pitch::et_to_freq(0.0, 12.0));
    let (_, partials) = best_fit_partials(&freqs);
    let root = partials[partials.len() - 1] as f64;
    Ok(Value::List(
        partials[..partials.len() - 1]
            .iter()
            .map(|&p| Value::Ratio(Ratio::new(p as f64, root)))
            .collect(),
    ))
}

/// Candidate fundamentals are unit fractions of the lowest input; the
/// first one that lines the inputs up with whole harmonics (within a
/// small relative error) wins, otherwise the best candidate overall.
fn best_fit_partials(freqs: &[f64]) -> (f64, Vec<i64>) {
    let lowest = freqs.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut best = (f64::INFINITY, lowest, vec![1; freqs.len()]);
    for k in 1..=32i64 {
        let fundamental = lowest / k as f64;
        let mut error = 0.0;
        let mut partials = Vec::with_capacity(freqs.len());
        for &hz in freqs {
            let exact = hz / fundamental;
            let harmonic = exact.round().max(1.0);
            error += (exact - harmonic).abs() / harmonic;
            partials.push(harmonic as i64);
        }
        if error < 0.005 * freqs.len() as f64 {
            return (fundamental, partials);
        }
        if error < best.0 {
            best = (error, fundamental, partials);
        }
    }
    (best.1, best.2)
}

/// An edo is consistent at an odd limit when rounding the steps of the
/// involved intervals never contradicts adding them exactly.
pub fn consistent(_interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 2)?;
    let (limit, edo) = match (&args[0], &args[1]) {
        (Value::Number(limit), Value::Number(edo)) => (*limit as i64, *edo),
        _ => {
            return Err(EvalError::type_err(
                "Type mismatch for consistent().",
                &refs(args),
            ))
        }
    };
    Ok(Some(Value::Bool(edo_is_consistent(limit, edo))))
}

fn steps_of(n: i64, d: i64, edo: f64) -> f64 {
    (Ratio::new(n as f64, d as f64).cents() * edo / 1200.0).round()
}

fn edo_is_consistent(limit: i64, edo: f64) -> bool {
    let mut a = 1;
    while a <= limit - 4 {
        let mut b = a + 2;
        while b <= limit - 2 {
            let mut c = b + 2;
            while c <= limit {
                if steps_of(b, a, edo) + steps_of(c, b, edo) != steps_of(c, a, edo) {
                    return false;
                }
                c += 2;
            }
            b += 2;
        }
        a += 2;
    }
    true
}

/// The smallest edo consistent at the given odd limit.
pub fn smallest_consistent(_interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    need(args, 1)?;
    let limit = match &args[0] {
        Value::Number(limit) => *limit as i64,
        other => {
            return Err(EvalError::type_err(
                "Type mismatch for smallestConsistent().",
                &[other],
            ))
        }
    };
    if limit >= 50 {
        return Err(EvalError::domain(
            "This search is too expensive for limits of 50 and above.",
        ));
    }
    let mut edo = 1.0;
    while !edo_is_consistent(limit, edo) {
        edo += 1.0;
    }
    Ok(Some(Value::Number(edo)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_simplify_finds_the_fifth() {
        // 700 cents is within 5 cents of 3:2
        let result = simplify_scalar(&Value::Cents(700.0), (5.0f64 / 1200.0).exp2()).unwrap();
        assert_eq!(result, Value::Ratio(Ratio::new(3.0, 2.0)));
    }

    #[test]
    fn test_simplify_respects_tolerance() {
        // with a 1-cent tolerance, 700c needs a more complex fraction
        let tight = simplify_scalar(&Value::Cents(700.0), (1.0f64 / 1200.0).exp2()).unwrap();
        match tight {
            Value::Ratio(r) => assert!(r.d > 2.0),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_closest_ets_prefers_exact_hits() {
        // a perfect fourth of 12-et is hit exactly by 12, 24, 36, 48
        match closest_ets(500.0, 4) {
            Value::List(items) => {
                let bases: Vec<f64> = items
                    .iter()
                    .map(|v| match v {
                        Value::Et(e) => e.base,
                        other => panic!("{:?}", other),
                    })
                    .collect();
                assert_eq!(bases, vec![12.0, 24.0, 36.0, 48.0]);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_closest_ratios_are_coprime() {
        let result = closest_ratios(1.5, (30.0f64 / 1200.0).exp2(), 3).unwrap();
        match result {
            Value::List(items) => {
                assert_eq!(items[0], Value::Ratio(Ratio::new(3.0, 2.0)));
                for item in &items {
                    match item {
                        Value::Ratio(r) => {
                            assert!(pitch::coprime(r.n as i64, r.d as i64));
                        }
                        other => panic!("{:?}", other),
                    }
                }
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_best_fit_edos_for_a_set() {
        // 100c and 700c are only hit exactly by multiples of 12
        let intervals = [Value::Cents(100.0), Value::Cents(700.0)];
        match best_fit_edos(&intervals, 4).unwrap() {
            Value::List(items) => assert_eq!(
                items,
                vec![
                    Value::Number(12.0),
                    Value::Number(24.0),
                    Value::Number(36.0),
                    Value::Number(48.0),
                ]
            ),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_just_snaps_pitches_to_harmonics() {
        let mut interp = Interpreter::new();
        let input = Value::List(vec![
            Value::Freq(440.0),
            Value::Freq(662.0),
            Value::Freq(771.0),
        ]);
        let result = just(&mut interp, &[input]).unwrap().unwrap();
        assert_eq!(result.to_string(), "'(440hz,660hz,770hz)");
    }

    #[test]
    fn test_just_on_ratios_measures_from_a_unison_root() {
        let mut interp = Interpreter::new();
        let input = Value::List(vec![
            Value::Ratio(Ratio::new(5.0, 4.0)),
            Value::Ratio(Ratio::new(3.0, 2.0)),
        ]);
        let result = just(&mut interp, &[input]).unwrap().unwrap();
        assert_eq!(result.to_string(), "'(5:4,6:4)");
    }

    #[test]
    fn test_best_fit_partials() {
        let (fundamental, partials) = best_fit_partials(&[440.0, 660.0, 770.0]);
        assert!((fundamental - 110.0).abs() < 1e-6);
        assert_eq!(partials, vec![4, 6, 7]);
    }

    #[test]
    fn test_consistency() {
        // 12-et is consistent at the 5-limit but not at the 11-limit
        assert!(edo_is_consistent(5, 12.0));
        assert!(!edo_is_consistent(11, 12.0));
    }

    #[test]
    fn test_smallest_consistent_limit_guard() {
        let mut interp = Interpreter::new();
        assert!(smallest_consistent(&mut interp, &[Value::Number(99.0)]).is_err());
        assert_eq!(
            smallest_consistent(&mut interp, &[Value::Number(3.0)]).unwrap(),
            Some(Value::Number(1.0))
        );
    }
}
