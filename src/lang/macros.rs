//! The macro subsystem.
//!
//! A macro receives the raw text the lexer captured for it (the `pre`
//! text up to the end of the line and the `{ ... }` block body) and may
//! do anything with the interpreter: evaluate the text, define globals,
//! or extend the operator registry.

use std::rc::Rc;

use super::interpreter::{EvalError, EvalResult, Interpreter};
use super::registry::{Fixity, OpHandler, UserOp};
use super::value::{FunctionVal, Value};
use crate::pitch::Ratio;

pub type MacroFn = fn(&mut Interpreter, &str, &str) -> EvalResult<Option<Value>>;

#[derive(Clone)]
pub enum MacroHandler {
    /// Registered name with no behavior; the captured text is discarded.
    Noop,
    Native(MacroFn),
    /// Embedding-provided handler, the macro extension point.
    Ext(Rc<dyn Fn(&mut Interpreter, &str, &str) -> EvalResult<Option<Value>>>),
}

pub struct MacroTable {
    table: std::collections::HashMap<String, MacroHandler>,
}

impl MacroTable {
    pub fn with_builtins() -> MacroTable {
        let mut macros = MacroTable {
            table: std::collections::HashMap::new(),
        };
        macros.register("@", MacroHandler::Noop);
        macros.register("comment", MacroHandler::Noop);
        macros.register("scl", MacroHandler::Native(scl));
        macros.register("function", MacroHandler::Native(function_def));
        macros.register("operator", MacroHandler::Native(operator_def));
        macros.register("return", MacroHandler::Native(return_stmt));
        macros.register("break", MacroHandler::Native(break_stmt));
        macros
    }

    pub fn register(&mut self, name: &str, handler: MacroHandler) {
        self.table.insert(name.to_owned(), handler);
    }

    pub fn get(&self, name: &str) -> Option<&MacroHandler> {
        self.table.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }
}

fn return_stmt(interp: &mut Interpreter, pre: &str, _block: &str) -> EvalResult<Option<Value>> {
    let value = if pre.is_empty() {
        None
    } else {
        interp.eval_source(pre)?
    };
    interp.set_return(value.clone());
    Ok(value)
}

fn break_stmt(interp: &mut Interpreter, _pre: &str, _block: &str) -> EvalResult<Option<Value>> {
    interp.set_break();
    Ok(None)
}

/// Parse a Scala `.scl` tuning file into a list of intervals.
///
/// With `*` before the block, the result also carries the declared note
/// count: `'(count, scale)`.
fn scl(_interp: &mut Interpreter, pre: &str, block: &str) -> EvalResult<Option<Value>> {
    let bad = || EvalError::domain("Error in .scl file format.");
    let lines: Vec<&str> = block.lines().collect();
    let mut index = 0;
    let skip_junk = |index: &mut usize| {
        while *index < lines.len() {
            let line = lines[*index].trim();
            if line.is_empty() || line.starts_with('!') {
                *index += 1;
            } else {
                break;
            }
        }
    };

    skip_junk(&mut index);
    let description = lines.get(index).copied().ok_or_else(bad)?;
    index += 1;
    skip_junk(&mut index);
    let count_line = lines.get(index).copied().ok_or_else(bad)?;
    index += 1;
    let count: i64 = count_line.trim().parse().map_err(|_| bad())?;

    let mut scale = Vec::new();
    for line in &lines[index..] {
        let line = line.trim();
        if line.is_empty() || line.starts_with('!') {
            continue;
        }
        let token = line.split_whitespace().next().ok_or_else(bad)?;
        let value = if token.contains('.') {
            // pitch lines with a period are cents values
            Value::Cents(token.parse::<f64>().map_err(|_| bad())?)
        } else {
            let mut parts = token.splitn(2, '/');
            let n: i64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
            let d: i64 = match parts.next() {
                Some(d) => d.parse().map_err(|_| bad())?,
                None => 1,
            };
            Value::Ratio(Ratio::new(n as f64, d as f64))
        };
        scale.push(value);
    }

    if pre.trim() == "*" {
        log::info!("scl: {}", description.trim());
        return Ok(Some(Value::List(vec![
            Value::Number(count as f64),
            Value::List(scale),
        ])));
    }
    Ok(Some(Value::List(scale)))
}

/// `function name(a, b) { body }`: defines a function whose body is
/// re-evaluated from source on each call.
fn function_def(interp: &mut Interpreter, pre: &str, block: &str) -> EvalResult<Option<Value>> {
    let bad = || EvalError::pattern("Incorrect function definition syntax.");
    let open = pre.find('(').ok_or_else(bad)?;
    if !pre.ends_with(')') {
        return Err(bad());
    }
    let name = pre[..open].trim();
    if name.is_empty() || !name.chars().all(is_word) {
        return Err(bad());
    }
    let arglist = &pre[open + 1..pre.len() - 1];
    let mut params = Vec::new();
    if !arglist.trim().is_empty() {
        for param in arglist.split(',') {
            let param = param.trim();
            if param.is_empty() || !param.chars().all(is_word) {
                return Err(bad());
            }
            params.push(param.to_owned());
        }
    }
    let function = Value::Function(FunctionVal::Textual(Rc::new(
        super::value::TextualFn {
            name: name.to_owned(),
            params,
            source: block.to_owned(),
        },
    )));
    interp.define_global(name, function.clone());
    Ok(Some(function))
}

const OP_CHARS: &str = "+-*/^%=,:;<>&|!#~";

fn is_word(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// `operator (left OP right) bp { body }`: registers a new operator.
/// The fixity follows from which operand names are present; parentheses
/// and the binding power are optional.
fn operator_def(interp: &mut Interpreter, pre: &str, block: &str) -> EvalResult<Option<Value>> {
    let bad = || EvalError::pattern("Incorrect operator definition syntax.");
    let chars: Vec<char> = pre.chars().collect();
    let mut pos = 0;
    let skip_ws = |pos: &mut usize| {
        while *pos < chars.len() && chars[*pos].is_whitespace() {
            *pos += 1;
        }
    };
    let scan_word = |pos: &mut usize| -> Option<String> {
        let start = *pos;
        while *pos < chars.len() && is_word(chars[*pos]) {
            *pos += 1;
        }
        if *pos > start {
            Some(chars[start..*pos].iter().collect())
        } else {
            None
        }
    };

    skip_ws(&mut pos);
    if chars.get(pos) == Some(&'(') {
        pos += 1;
    }
    skip_ws(&mut pos);
    let left = scan_word(&mut pos);
    skip_ws(&mut pos);
    let op_start = pos;
    while pos < chars.len() && OP_CHARS.contains(chars[pos]) {
        pos += 1;
    }
    if pos == op_start {
        return Err(bad());
    }
    let symbol: String = chars[op_start..pos].iter().collect();
    skip_ws(&mut pos);
    let right = scan_word(&mut pos);
    skip_ws(&mut pos);
    if chars.get(pos) == Some(&')') {
        pos += 1;
    }
    skip_ws(&mut pos);
    let bp = {
        let start = pos;
        while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
            pos += 1;
        }
        chars[start..pos]
            .iter()
            .collect::<String>()
            .parse::<f64>()
            .ok()
    };

    let (fixity, default_bp) = match (&left, &right) {
        (Some(_), Some(_)) => (Fixity::Infix, 4.0),
        (None, Some(_)) => (Fixity::Prefix, 6.5),
        (Some(_), None) => (Fixity::Postfix, 6.8),
        (None, None) => return Err(bad()),
    };
    let handler = OpHandler::User(Rc::new(UserOp {
        left,
        right,
        body: block.to_owned(),
    }));
    let registered = interp.registry_mut().add(
        fixity,
        &symbol,
        bp.unwrap_or(default_bp),
        None,
        handler,
        true,
    );
    if !registered {
        return Err(EvalError::domain(format!(
            "The operator {} is read-only.",
            symbol
        )));
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::super::interpreter::Interpreter;
    use super::*;

    fn run_macro(f: MacroFn, pre: &str, block: &str) -> EvalResult<Option<Value>> {
        let mut interp = Interpreter::new();
        f(&mut interp, pre, block)
    }

    #[test]
    fn test_scl_skips_comments_and_blank_lines() {
        let block = "! comment\n\n description line\n 2\n! another\n 100.0\n 2/1";
        let result = run_macro(scl, "", block).unwrap().unwrap();
        assert_eq!(result.to_string(), "'(100c,2:1)");
    }

    #[test]
    fn test_scl_bare_integer_is_a_ratio_over_one() {
        let block = "desc\n 1\n 3";
        let result = run_macro(scl, "", block).unwrap().unwrap();
        assert_eq!(result.to_string(), "'(3:1)");
    }

    #[test]
    fn test_scl_rejects_garbage() {
        assert!(run_macro(scl, "", "desc\n not-a-count\n 2/1").is_err());
        assert!(run_macro(scl, "", "").is_err());
    }

    #[test]
    fn test_function_pattern_rejected() {
        assert!(run_macro(function_def, "noparens", "1").is_err());
        assert!(run_macro(function_def, "f(a b)", "1").is_err());
        assert!(run_macro(function_def, "(a)", "1").is_err());
    }

    #[test]
    fn test_operator_pattern_fixities() {
        let mut interp = Interpreter::new();
        operator_def(&mut interp, "(a >>> b)", "a").unwrap();
        operator_def(&mut interp, "~ b", "b").unwrap();
        operator_def(&mut interp, "a !!", "a").unwrap();
        let reg = interp.registry_mut();
        assert!(reg.get(Fixity::Infix, ">>>").is_some());
        assert!(reg.get(Fixity::Prefix, "~").is_some());
        assert!(reg.get(Fixity::Postfix, "!!").is_some());
    }

    #[test]
    fn test_operator_custom_binding_power() {
        let mut interp = Interpreter::new();
        operator_def(&mut interp, "(a ~ b) 2.5", "a").unwrap();
        let entry = interp.registry_mut().get(Fixity::Infix, "~").cloned().unwrap();
        assert_eq!(entry.bp, 2.5);
    }

    #[test]
    fn test_operator_without_operands_rejected() {
        assert!(run_macro(operator_def, "~~", "1").is_err());
        assert!(run_macro(operator_def, "", "1").is_err());
    }
}
