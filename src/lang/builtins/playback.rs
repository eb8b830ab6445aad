//! The `play` and `print` builtins. Neither produces a value; both hand
//! their arguments to the embedding through the [`Host`] trait.
//!
//! [`Host`]: super::super::interpreter::Host

use crate::pitch;

use super::super::interpreter::{EvalError, EvalResult, Interpreter};
use super::super::value::{cents_of, Value};
use super::lists::flatten_into;
use super::refs;

/// Default reference for relative pitches: middle C.
const MIDDLE_C: f64 = 261.63;

/// Turn the (flattened) arguments into a list of frequencies and hand
/// them to the host.
///
/// Absolute pitches play as they are; intervals and ratios play relative
/// to the preceding absolute pitch, or to middle C when there is none.
/// Et values below 20 Hz are taken as intervals rather than (inaudible)
/// keyboard positions.
pub fn play(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    let mut flat = Vec::new();
    for arg in args {
        flatten_into(arg, &mut flat);
    }
    let mut waveshape = None;
    let mut base: Option<f64> = None;
    let mut freqs = Vec::with_capacity(flat.len());
    for v in &flat {
        match v {
            Value::Waveshape(w) => {
                waveshape = Some(w.name());
            }
            Value::Et(e) => {
                let hz = pitch::et_to_freq(e.cents() / 100.0, 12.0);
                if hz < 20.0 {
                    push_relative(&mut freqs, &mut base, e.cents());
                } else {
                    push_fixed(&mut freqs, &mut base, hz);
                }
            }
            Value::Number(x) => {
                if *x <= 0.0 {
                    return Err(EvalError::domain("Frequencies must be positive."));
                }
                push_fixed(&mut freqs, &mut base, *x);
            }
            Value::Freq(hz) => {
                push_fixed(&mut freqs, &mut base, *hz);
            }
            Value::Cents(_) | Value::Ratio(_) => {
                let c = cents_of(v).ok_or_else(|| {
                    EvalError::type_err("Ambiguous or incorrect call to play().", &refs(args))
                })?;
                push_relative(&mut freqs, &mut base, c);
            }
            _ => {
                return Err(EvalError::type_err(
                    "Ambiguous or incorrect call to play().",
                    &refs(args),
                ))
            }
        }
    }
    interp.host_mut().playback(&freqs, waveshape)?;
    Ok(None)
}

fn push_fixed(freqs: &mut Vec<f64>, base: &mut Option<f64>, hz: f64) {
    if base.is_none() {
        *base = Some(hz);
    }
    freqs.push(hz);
}

fn push_relative(freqs: &mut Vec<f64>, base: &mut Option<f64>, cents: f64) {
    let reference = match base {
        Some(hz) => *hz,
        None => {
            // an all-relative chord gets an implicit root
            *base = Some(MIDDLE_C);
            freqs.push(MIDDLE_C);
            MIDDLE_C
        }
    };
    freqs.push(pitch::note_above(reference, cents));
}

pub fn print(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Option<Value>> {
    let answers: Vec<super::super::Answer> = args
        .iter()
        .cloned()
        .map(super::super::Answer::new)
        .collect();
    interp.host_mut().print(&answers)?;
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::super::super::interpreter::{EvalResult, Host, Interpreter};
    use super::super::super::Answer;
    use super::*;
    use crate::pitch::Ratio;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingHost {
        played: Rc<RefCell<Vec<(Vec<f64>, Option<String>)>>>,
        printed: Rc<RefCell<Vec<String>>>,
    }

    impl Host for RecordingHost {
        fn playback(&mut self, freqs: &[f64], waveshape: Option<&str>) -> EvalResult<()> {
            self.played
                .borrow_mut()
                .push((freqs.to_vec(), waveshape.map(str::to_owned)));
            Ok(())
        }

        fn print(&mut self, values: &[Answer]) -> EvalResult<()> {
            for answer in values {
                self.printed
                    .borrow_mut()
                    .push(format!("{} : {}", answer.value, answer.ty));
            }
            Ok(())
        }
    }

    fn recording_interpreter() -> (
        Interpreter,
        Rc<RefCell<Vec<(Vec<f64>, Option<String>)>>>,
        Rc<RefCell<Vec<String>>>,
    ) {
        let played = Rc::new(RefCell::new(Vec::new()));
        let printed = Rc::new(RefCell::new(Vec::new()));
        let interp = Interpreter::with_host(Box::new(RecordingHost {
            played: played.clone(),
            printed: printed.clone(),
        }));
        (interp, played, printed)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_play_fixed_then_relative() {
        let (mut interp, played, _) = recording_interpreter();
        let args = [Value::Freq(440.0), Value::Ratio(Ratio::new(3.0, 2.0))];
        play(&mut interp, &args).unwrap();
        let calls = played.borrow();
        let (freqs, shape) = &calls[0];
        assert_eq!(freqs.len(), 2);
        assert!(close(freqs[0], 440.0));
        assert!(close(freqs[1], 660.0));
        assert_eq!(shape.as_deref(), None);
    }

    #[test]
    fn test_play_all_relative_gets_middle_c_root() {
        let (mut interp, played, _) = recording_interpreter();
        play(&mut interp, &[Value::Ratio(Ratio::new(5.0, 4.0))]).unwrap();
        let calls = played.borrow();
        let freqs = &calls[0].0;
        assert!(close(freqs[0], MIDDLE_C));
        assert!(close(freqs[1], MIDDLE_C * 1.25));
    }

    #[test]
    fn test_play_waveshape_and_flattening() {
        let (mut interp, played, _) = recording_interpreter();
        let args = [
            Value::Waveshape(crate::lang::value::Waveshape::Square),
            Value::List(vec![Value::Freq(100.0), Value::List(vec![Value::Freq(200.0)])]),
        ];
        play(&mut interp, &args).unwrap();
        let calls = played.borrow();
        assert_eq!(calls[0].0, vec![100.0, 200.0]);
        assert_eq!(calls[0].1.as_deref(), Some("square"));
    }

    #[test]
    fn test_play_rejects_functions() {
        let (mut interp, _, _) = recording_interpreter();
        let f = super::super::table().get("add").cloned().unwrap();
        assert!(play(&mut interp, &[f]).is_err());
    }

    #[test]
    fn test_play_unsupported_by_default() {
        let mut interp = Interpreter::new();
        assert!(play(&mut interp, &[Value::Freq(440.0)]).is_err());
    }

    #[test]
    fn test_print_routes_to_host() {
        let (mut interp, _, printed) = recording_interpreter();
        interp.evaluate("print(3:2)").unwrap();
        assert_eq!(printed.borrow().as_slice(), ["3:2 : ratio"]);
    }
}
