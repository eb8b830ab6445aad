//! End-to-end tests of the language through the public API.

use xen::lang::{evaluate, Interpreter};

fn display(source: &str) -> Vec<String> {
    evaluate(source)
        .unwrap_or_else(|e| panic!("{} in {:?}", e, source))
        .into_iter()
        .map(|a| format!("{} : {}", a.value, a.ty))
        .collect()
}

fn one(source: &str) -> String {
    let mut results = display(source);
    assert_eq!(results.len(), 1, "in {:?}", source);
    results.pop().unwrap_or_default()
}

#[test]
fn pitch_arithmetic() {
    assert_eq!(one("2#12 + 19#19"), "14#12 : et");
    assert_eq!(one("5:4 + 3:2"), "15:8 : ratio");
    assert_eq!(one("440hz + 3:2"), "660hz : freq");
    assert_eq!(one("100c * 7"), "700c : cents");
    assert_eq!(one("4:5:6:7"), "'(5:4,6:4,7:4) : list");
}

#[test]
fn broadcast_and_errors() {
    assert_eq!(one("4 + '(1, 2, 3)"), "'(5,6,7) : list");
    assert!(evaluate("'(1, 2, 3) + '(2, 4)").is_err());
    assert!(evaluate("-100hz").is_err());
    assert!(evaluate("3:2 + 1").is_err());
}

#[test]
fn session_state_persists() {
    let mut interp = Interpreter::new();
    interp.evaluate("root = 440hz").unwrap();
    interp.evaluate("up(x) = root + x").unwrap();
    let answers = interp.evaluate("up(3:2)").unwrap();
    assert_eq!(answers[0].value.to_string(), "660hz");

    // `ans` follows the last produced value
    interp.evaluate("21").unwrap();
    let answers = interp.evaluate("ans * 2").unwrap();
    assert_eq!(answers[0].value.to_string(), "42");
}

#[test]
fn currying_end_to_end() {
    assert_eq!(
        display("transpose = 440hz + ...\ntranspose(3:2)"),
        ["660hz : freq"]
    );
    assert_eq!(one("add(..., 3)"), "add(..., 3) : partial function");
}

#[test]
fn grammar_extension_across_evaluations() {
    let mut interp = Interpreter::new();
    interp
        .evaluate("operator (a ~ b) { (a + b) / 2 }")
        .unwrap();
    let answers = interp.evaluate("10 ~ 20").unwrap();
    assert_eq!(answers[0].value.to_string(), "15");

    // the new operator also changes how punctuation runs tokenize
    interp.evaluate("operator (x ~~) { x * 10 }").unwrap();
    let answers = interp.evaluate("3~~").unwrap();
    assert_eq!(answers[0].value.to_string(), "30");
}

#[test]
fn scl_import() {
    let source = "scale = scl {\n! example.scl\n!\na five note scale\n 5\n!\n 100.0\n 5/4\n 3/2\n 950.0\n 2/1\n}\nscale[1]";
    assert_eq!(display(source), ["5:4 : ratio"]);
}

#[test]
fn analysis_pipeline() {
    // measure a just fifth in 53-et, then recover the fraction
    assert_eq!(one("et(3:2, 53)"), "31#53 : et");
    assert_eq!(one("simplify(702c)"), "3:2 : ratio");
    // of the edos up to 52, 41 places a step closest to the just fifth
    assert_eq!(one("closest(3:2, 1)"), "'(24#41) : list");
    // a whole set of intervals yields the best-fitting edo sizes
    assert_eq!(one("closest('(100c, 700c), 4)"), "'(12,24,36,48) : list");
    // retune a chord to whole harmonics of a common fundamental
    assert_eq!(one("just('(440hz, 662hz, 771hz))"), "'(440hz,660hz,770hz) : list");
    assert_eq!(one("just('(5:4, 3:2))"), "'(5:4,6:4) : list");
}

#[test]
fn comparisons_and_logic() {
    assert_eq!(one("5:4 < 3:2"), "true : bool");
    assert_eq!(one("440hz == 69#12"), "true : bool");
    assert_eq!(one("octave == 3"), "false : bool");
    assert_eq!(one("0 || 2:1"), "2:1 : ratio");
}
