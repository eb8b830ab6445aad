//! Tree-walking evaluator.
//!
//! Name resolution goes through three layers: the innermost call frame
//! (function parameters and operator operands), then the mutable user
//! globals, then the immutable builtin environment. User assignments can
//! therefore shadow builtins without destroying them.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use snafu::ResultExt;

use super::ast::{MacroCall, Node};
use super::builtins;
use super::lexer;
use super::macros::{MacroHandler, MacroTable};
use super::parser::Parser;
use super::registry::{Fixity, OpHandler, OperatorRegistry};
use super::value::{
    given_vals, FunctionVal, NativeFn, PartialFn, PartialTarget, TextualFn, UserFn, Value,
};
use super::{Answer, Error};

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Debug)]
pub struct EvalError {
    info: EvalErrorKind,
}

impl EvalError {
    pub fn new(info: EvalErrorKind) -> EvalError {
        EvalError { info }
    }

    pub fn info(&self) -> &EvalErrorKind {
        &self.info
    }

    pub(crate) fn type_err(what: impl Into<String>, vals: &[&Value]) -> EvalError {
        EvalError::new(EvalErrorKind::TypeCoercion {
            what: what.into(),
            given: given_vals(vals),
        })
    }

    pub(crate) fn arity(expected: usize, vals: &[&Value]) -> EvalError {
        EvalError::new(EvalErrorKind::Arity {
            expected,
            given: given_vals(vals),
        })
    }

    pub(crate) fn size_err(vals: &[&Value]) -> EvalError {
        EvalError::new(EvalErrorKind::ElementwiseSize {
            given: given_vals(vals),
        })
    }

    pub(crate) fn domain(message: impl Into<String>) -> EvalError {
        EvalError::new(EvalErrorKind::Domain(message.into()))
    }

    pub(crate) fn pattern(message: impl Into<String>) -> EvalError {
        EvalError::new(EvalErrorKind::MacroPattern(message.into()))
    }
}

#[derive(Debug)]
pub enum EvalErrorKind {
    /// Reference to a name that is not bound anywhere.
    UndefinedName(String),
    /// Call of a name that is not bound anywhere.
    UndefinedFunction(String),
    /// Bare reference to a function value outside `__functionsAsData`.
    MissingParentheses(String),
    /// Too few arguments in a call.
    Arity { expected: usize, given: String },
    /// No coercion rule covers the given operand types.
    TypeCoercion { what: String, given: String },
    /// Elementwise application of lists with different lengths.
    ElementwiseSize { given: String },
    /// Structurally valid input with an impossible value.
    Domain(String),
    /// Malformed `function` or `operator` macro pattern.
    MacroPattern(String),
    /// Failure inside a nested evaluation: macro bodies and textual
    /// functions re-enter the whole pipeline.
    Nested(Box<Error>),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.info {
            EvalErrorKind::UndefinedName(name) => write!(f, "{} is undefined.", name),
            EvalErrorKind::UndefinedFunction(name) => write!(f, "{}() is undefined.", name),
            EvalErrorKind::MissingParentheses(name) => {
                write!(f, "Missing parentheses in call to {}().", name)
            }
            EvalErrorKind::Arity { expected, given } => {
                write!(f, "Expected {} argument(s). {}", expected, given)
            }
            EvalErrorKind::TypeCoercion { what, given } => write!(f, "{} {}", what, given),
            EvalErrorKind::ElementwiseSize { given } => write!(
                f,
                "Elementwise operations require lists of the same size. {}",
                given
            ),
            EvalErrorKind::Domain(message) => write!(f, "{}", message),
            EvalErrorKind::MacroPattern(message) => write!(f, "{}", message),
            EvalErrorKind::Nested(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for EvalError {}

/// Connection of the interpreter to the outside world.
///
/// The default implementations make `play` an error and route `print`
/// through the logger; embeddings override what they support.
pub trait Host {
    fn playback(&mut self, _freqs: &[f64], _waveshape: Option<&str>) -> EvalResult<()> {
        Err(EvalError::domain("play() is not supported here."))
    }

    fn print(&mut self, values: &[Answer]) -> EvalResult<()> {
        for answer in values {
            log::info!("{} : {}", answer.value, answer.ty);
        }
        Ok(())
    }
}

/// Host with no playback and logger-only printing.
pub struct NullHost;

impl Host for NullHost {}

pub struct Interpreter {
    /// Builtin functions and constants; never mutated by programs.
    builtins: HashMap<String, Value>,
    /// User assignments, including `ans`.
    globals: HashMap<String, Value>,
    /// Call frames for function parameters and operator operands. Only
    /// the innermost frame is visible; there are no closures.
    frames: Vec<HashMap<String, Value>>,
    registry: OperatorRegistry,
    macros: MacroTable,
    host: Box<dyn Host>,
    break_flag: bool,
    return_value: Option<Value>,
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new()
    }
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter::with_host(Box::new(NullHost))
    }

    pub fn with_host(host: Box<dyn Host>) -> Interpreter {
        Interpreter {
            builtins: builtins::table(),
            globals: HashMap::new(),
            frames: Vec::new(),
            registry: OperatorRegistry::with_builtins(),
            macros: MacroTable::with_builtins(),
            host,
            break_flag: false,
            return_value: None,
        }
    }

    /// Extension point: expose a native function to programs.
    pub fn register_native(&mut self, name: &str, f: NativeFn) {
        self.builtins.insert(
            name.to_owned(),
            Value::Function(FunctionVal::Native {
                name: name.into(),
                f,
            }),
        );
    }

    /// Extension point: add or replace a macro.
    pub fn register_macro(&mut self, name: &str, handler: MacroHandler) {
        self.macros.register(name, handler);
    }

    pub fn registry_mut(&mut self) -> &mut OperatorRegistry {
        &mut self.registry
    }

    pub(crate) fn host_mut(&mut self) -> &mut dyn Host {
        self.host.as_mut()
    }

    pub(crate) fn set_break(&mut self) {
        self.break_flag = true;
    }

    pub(crate) fn set_return(&mut self, value: Option<Value>) {
        self.return_value = value;
        self.break_flag = true;
    }

    pub(crate) fn define_global(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_owned(), value);
    }

    /// Evaluate a source string and return the value of every statement
    /// that produced one.
    pub fn evaluate(&mut self, source: &str) -> Result<Vec<Answer>, Error> {
        let tokens = lexer::lex(source, &self.registry, &self.macros).context(super::Lex)?;
        let nodes = Parser::new(&tokens, &self.registry).parse().context(super::Parse)?;
        self.break_flag = false;
        self.return_value = None;
        let mut output = Vec::new();
        for node in &nodes {
            let value = self.eval_node(node).context(super::Eval)?;
            if let Some(value) = value {
                self.globals.insert("ans".to_owned(), value.clone());
                output.push(Answer::new(value));
            }
            if self.break_flag {
                break;
            }
        }
        self.break_flag = false;
        if let Some(value) = self.return_value.take() {
            return Ok(vec![Answer::new(value)]);
        }
        Ok(output)
    }

    /// Nested evaluation used by macros, user operators and textual
    /// functions; yields the value of the last statement.
    pub(crate) fn eval_source(&mut self, source: &str) -> EvalResult<Option<Value>> {
        let answers = self
            .evaluate(source)
            .map_err(|e| EvalError::new(EvalErrorKind::Nested(Box::new(e))))?;
        Ok(answers.into_iter().last().map(|a| a.value))
    }

    pub fn eval_node(&mut self, node: &Node) -> EvalResult<Option<Value>> {
        if self.break_flag || self.return_value.is_some() {
            return Ok(None);
        }
        match node {
            Node::Number(x) => Ok(Some(Value::Number(*x))),
            Node::Ident(name) => self.eval_ident(name).map(Some),
            Node::Assign { name, value } => {
                match self.eval_node(value)? {
                    Some(v) => {
                        self.globals.insert(name.clone(), v);
                    }
                    None => {
                        self.globals.remove(name);
                    }
                }
                Ok(None)
            }
            Node::FnDef { name, params, body } => {
                let function = FunctionVal::User(Rc::new(UserFn {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                }));
                self.globals.insert(name.clone(), Value::Function(function));
                Ok(None)
            }
            Node::Call { name, args } => self.eval_call(name, args),
            Node::Prefix { op, right } => {
                let right = self.eval_node(right)?;
                self.eval_operator(Fixity::Prefix, op, None, right)
            }
            Node::Infix { op, left, right } => {
                let left = self.eval_node(left)?;
                let right = self.eval_node(right)?;
                self.eval_operator(Fixity::Infix, op, left, right)
            }
            Node::Postfix { op, left } => {
                let left = self.eval_node(left)?;
                self.eval_operator(Fixity::Postfix, op, left, None)
            }
            Node::Macro(call) => self.eval_macro(call),
        }
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(frame) = self.frames.last() {
            if let Some(value) = frame.get(name) {
                return Some(value.clone());
            }
        }
        if let Some(value) = self.globals.get(name) {
            return Some(value.clone());
        }
        self.builtins.get(name).cloned()
    }

    fn functions_as_data(&self) -> bool {
        matches!(self.lookup("__functionsAsData"), Some(Value::Bool(true)))
    }

    fn eval_ident(&mut self, name: &str) -> EvalResult<Value> {
        let value = self
            .lookup(name)
            .ok_or_else(|| EvalError::new(EvalErrorKind::UndefinedName(name.to_owned())))?;
        match &value {
            Value::Function(_) | Value::Partial(_) if !self.functions_as_data() => Err(
                EvalError::new(EvalErrorKind::MissingParentheses(name.to_owned())),
            ),
            _ => Ok(value),
        }
    }

    fn eval_call(&mut self, name: &str, args: &[Node]) -> EvalResult<Option<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match self.eval_node(arg)? {
                Some(value) => values.push(value),
                None => {
                    return Err(EvalError::domain(format!(
                        "An argument of {}() produced no value.",
                        name
                    )))
                }
            }
        }
        let callee = self
            .lookup(name)
            .ok_or_else(|| EvalError::new(EvalErrorKind::UndefinedFunction(name.to_owned())))?;
        if values
            .iter()
            .any(|v| matches!(v, Value::Hole | Value::Partial(_)))
        {
            let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            let display = format!("{}({})", name, rendered.join(", "));
            return Ok(Some(Value::Partial(Rc::new(PartialFn {
                target: PartialTarget::Callee(callee),
                captured: values,
                display,
            }))));
        }
        self.call_value(&callee, &values, name)
    }

    fn call_value(
        &mut self,
        callee: &Value,
        args: &[Value],
        name: &str,
    ) -> EvalResult<Option<Value>> {
        match callee {
            Value::Function(FunctionVal::Native { f, .. }) => f(self, args),
            Value::Function(FunctionVal::User(function)) => {
                self.call_user(function.clone(), args)
            }
            Value::Function(FunctionVal::Textual(function)) => {
                self.call_textual(function.clone(), args)
            }
            Value::Partial(partial) => {
                let partial = partial.clone();
                self.apply_partial(&partial, args)
            }
            other => Err(EvalError::type_err(
                format!("{} is not a function.", name),
                &[other],
            )),
        }
    }

    fn call_user(&mut self, function: Rc<UserFn>, args: &[Value]) -> EvalResult<Option<Value>> {
        if args.len() < function.params.len() {
            let refs: Vec<&Value> = args.iter().collect();
            return Err(EvalError::arity(function.params.len(), &refs));
        }
        let mut frame = HashMap::new();
        for (param, arg) in function.params.iter().zip(args) {
            frame.insert(param.clone(), arg.clone());
        }
        self.frames.push(frame);
        let result = self.eval_node(&function.body);
        self.frames.pop();
        result
    }

    /// Textual functions evaluate their body from source with the
    /// parameters temporarily shadowing the globals of the same name.
    fn call_textual(
        &mut self,
        function: Rc<TextualFn>,
        args: &[Value],
    ) -> EvalResult<Option<Value>> {
        if args.len() < function.params.len() {
            let refs: Vec<&Value> = args.iter().collect();
            return Err(EvalError::arity(function.params.len(), &refs));
        }
        let mut shadowed = Vec::with_capacity(function.params.len());
        for (param, arg) in function.params.iter().zip(args) {
            let prior = self.globals.insert(param.clone(), arg.clone());
            shadowed.push((param.clone(), prior));
        }
        let result = self.eval_source(&function.source);
        for (param, prior) in shadowed.into_iter().rev() {
            match prior {
                Some(value) => {
                    self.globals.insert(param, value);
                }
                None => {
                    self.globals.remove(&param);
                }
            }
        }
        result
    }

    /// Fill the holes of a partial left to right with the supplied
    /// arguments. If they run out, the result is a narrower partial; if
    /// every hole is filled, the underlying target is invoked.
    fn apply_partial(
        &mut self,
        partial: &Rc<PartialFn>,
        supplied: &[Value],
    ) -> EvalResult<Option<Value>> {
        let mut resolved = Vec::with_capacity(partial.captured.len());
        let mut next = 0;
        let mut starved = false;
        for slot in &partial.captured {
            if starved {
                resolved.push(slot.clone());
                continue;
            }
            match slot {
                Value::Hole => {
                    if next < supplied.len() {
                        resolved.push(supplied[next].clone());
                        next += 1;
                    } else {
                        starved = true;
                        resolved.push(Value::Hole);
                    }
                }
                Value::Partial(inner) => {
                    let need = inner.hole_count();
                    if next + need <= supplied.len() {
                        let inner = inner.clone();
                        match self.apply_partial(&inner, &supplied[next..next + need])? {
                            Some(value) => resolved.push(value),
                            None => {
                                return Err(EvalError::domain(
                                    "A partially applied function produced no value.",
                                ))
                            }
                        }
                        next += need;
                    } else {
                        starved = true;
                        resolved.push(slot.clone());
                    }
                }
                value => resolved.push(value.clone()),
            }
        }
        if starved {
            let rendered: Vec<String> = resolved.iter().map(|v| v.to_string()).collect();
            let display = match &partial.target {
                PartialTarget::Callee(callee) => {
                    format!("{}({})", callable_name(callee), rendered.join(", "))
                }
                PartialTarget::Op { symbol, .. } => match resolved.len() {
                    2 => format!("({} {} {})", rendered[0], symbol, rendered[1]),
                    _ => format!("({} {})", symbol, rendered.join(" ")),
                },
            };
            return Ok(Some(Value::Partial(Rc::new(PartialFn {
                target: partial.target.clone(),
                captured: resolved,
                display,
            }))));
        }
        match &partial.target {
            PartialTarget::Callee(callee) => {
                let callee = callee.clone();
                let name = callable_name(&callee).to_owned();
                self.call_value(&callee, &resolved, &name)
            }
            PartialTarget::Op { handler, .. } => {
                let handler = handler.clone();
                self.call_op_handler(&handler, &resolved)
            }
        }
    }

    fn eval_operator(
        &mut self,
        fixity: Fixity,
        symbol: &str,
        left: Option<Value>,
        right: Option<Value>,
    ) -> EvalResult<Option<Value>> {
        let entry = self
            .registry
            .get(fixity, symbol)
            .cloned()
            .ok_or_else(|| EvalError::new(EvalErrorKind::UndefinedFunction(symbol.to_owned())))?;
        let has_hole = matches!(left, Some(Value::Hole)) || matches!(right, Some(Value::Hole));
        if has_hole {
            let display = match (&left, &right) {
                (Some(l), Some(r)) => format!("({} {} {})", l, symbol, r),
                (None, Some(r)) => format!("({}{})", symbol, r),
                (Some(l), None) => format!("({}{})", l, symbol),
                (None, None) => symbol.to_owned(),
            };
            let mut captured = Vec::new();
            if let Some(l) = left {
                captured.push(l);
            }
            if let Some(r) = right {
                captured.push(r);
            }
            return Ok(Some(Value::Partial(Rc::new(PartialFn {
                target: PartialTarget::Op {
                    symbol: symbol.to_owned(),
                    handler: entry.handler.clone(),
                },
                captured,
                display,
            }))));
        }
        let mut operands = Vec::new();
        if let Some(l) = left {
            operands.push(l);
        }
        if let Some(r) = right {
            operands.push(r);
        }
        self.call_op_handler(&entry.handler, &operands)
    }

    fn call_op_handler(
        &mut self,
        handler: &OpHandler,
        operands: &[Value],
    ) -> EvalResult<Option<Value>> {
        match handler {
            OpHandler::Builtin(f) => f(self, operands),
            OpHandler::User(op) => {
                let op = op.clone();
                let mut frame = HashMap::new();
                let names = op.left.iter().chain(op.right.iter());
                for (name, value) in names.zip(operands) {
                    frame.insert(name.clone(), value.clone());
                }
                self.frames.push(frame);
                let result = self.eval_source(&op.body);
                self.frames.pop();
                result
            }
        }
    }

    fn eval_macro(&mut self, call: &MacroCall) -> EvalResult<Option<Value>> {
        let handler = match self.macros.get(&call.id) {
            Some(handler) => handler.clone(),
            None => return Ok(None),
        };
        match handler {
            MacroHandler::Noop => Ok(None),
            MacroHandler::Native(f) => f(self, &call.pre, &call.block),
            MacroHandler::Ext(f) => f(self, &call.pre, &call.block),
        }
    }
}

fn callable_name(value: &Value) -> &str {
    match value {
        Value::Function(function) => function.name(),
        Value::Partial(partial) => &partial.display,
        _ => "?",
    }
}
