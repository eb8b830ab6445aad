//! The operator registry: the single source of truth for which operator
//! symbols exist, how strongly they bind, and what they do.
//!
//! The lexer consults it to split punctuation runs, the parser snapshots
//! its binding powers, and the evaluator resolves handlers through it at
//! application time. Programs extend it through the `operator` macro.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::builtins::{self, arithmetic, conversion, numeric};
use super::value::NativeFn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Prefix,
    Infix,
    Postfix,
}

#[derive(Clone)]
pub enum OpHandler {
    Builtin(NativeFn),
    User(Rc<UserOp>),
}

impl fmt::Debug for OpHandler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OpHandler::Builtin(_) => write!(f, "OpHandler::Builtin"),
            OpHandler::User(op) => write!(f, "OpHandler::User({:?})", op),
        }
    }
}

/// Operator defined from inside the language by the `operator` macro.
/// The body is kept as source text and re-parsed on every application,
/// with the operand names bound in a fresh call frame.
#[derive(Debug)]
pub struct UserOp {
    pub left: Option<String>,
    pub right: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct OpEntry {
    /// Left binding power (for prefix operators: the binding power of the
    /// operand expression).
    pub bp: f64,
    /// Right binding power of an infix operator, where it differs from
    /// `bp` (right-associative operators bind their right side weaker).
    pub rbp: Option<f64>,
    pub handler: OpHandler,
    /// Builtin operators are read-only; user definitions may be replaced.
    pub writable: bool,
}

pub struct OperatorRegistry {
    prefix: HashMap<String, OpEntry>,
    infix: HashMap<String, OpEntry>,
    postfix: HashMap<String, OpEntry>,
}

impl OperatorRegistry {
    pub fn empty() -> OperatorRegistry {
        OperatorRegistry {
            prefix: HashMap::new(),
            infix: HashMap::new(),
            postfix: HashMap::new(),
        }
    }

    /// The registry with the builtin operator set installed.
    pub fn with_builtins() -> OperatorRegistry {
        let mut reg = OperatorRegistry::empty();
        let mut install = |fixity, symbol: &str, bp: f64, rbp: Option<f64>, f: NativeFn| {
            reg.table_mut(fixity).insert(
                symbol.to_owned(),
                OpEntry {
                    bp,
                    rbp,
                    handler: OpHandler::Builtin(f),
                    writable: false,
                },
            );
        };

        install(Fixity::Infix, ":", 7.5, None, conversion::colon);
        install(Fixity::Prefix, ":", 7.0, None, conversion::colon);
        install(Fixity::Infix, "#", 7.3, None, conversion::et);
        install(Fixity::Prefix, "#", 7.0, None, conversion::et);

        install(Fixity::Postfix, "c", 6.8, None, conversion::cents);
        install(Fixity::Postfix, "hz", 6.8, None, conversion::freq);

        install(Fixity::Prefix, "-", 6.5, None, arithmetic::subtract);
        install(Fixity::Prefix, "+", 6.5, None, arithmetic::add);
        install(Fixity::Prefix, "!", 6.5, None, arithmetic::not);

        // right-associative
        install(Fixity::Infix, "^", 6.0, Some(5.0), numeric::pow);

        install(Fixity::Infix, "*", 4.0, None, arithmetic::multiply);
        install(Fixity::Infix, "/", 4.0, None, arithmetic::divide);
        install(Fixity::Infix, "%", 4.0, None, arithmetic::modulo);

        install(Fixity::Infix, "+", 3.0, None, arithmetic::add);
        install(Fixity::Infix, "-", 3.0, None, arithmetic::subtract);

        install(Fixity::Infix, ">", 2.8, None, arithmetic::greater_than);
        install(Fixity::Infix, "<", 2.8, None, arithmetic::less_than);
        install(Fixity::Infix, ">=", 2.8, None, arithmetic::greater_than_or_equal);
        install(Fixity::Infix, "<=", 2.8, None, arithmetic::less_than_or_equal);
        install(Fixity::Infix, "==", 2.7, None, arithmetic::equal);
        install(Fixity::Infix, "!=", 2.7, None, arithmetic::not_equal);
        install(Fixity::Infix, "&&", 2.65, None, arithmetic::and);
        install(Fixity::Infix, "||", 2.6, None, arithmetic::or);

        // statement separator; swallows its operand
        install(Fixity::Postfix, ";", 0.5, None, builtins::null_op);

        reg
    }

    fn table(&self, fixity: Fixity) -> &HashMap<String, OpEntry> {
        match fixity {
            Fixity::Prefix => &self.prefix,
            Fixity::Infix => &self.infix,
            Fixity::Postfix => &self.postfix,
        }
    }

    fn table_mut(&mut self, fixity: Fixity) -> &mut HashMap<String, OpEntry> {
        match fixity {
            Fixity::Prefix => &mut self.prefix,
            Fixity::Infix => &mut self.infix,
            Fixity::Postfix => &mut self.postfix,
        }
    }

    pub fn get(&self, fixity: Fixity, symbol: &str) -> Option<&OpEntry> {
        self.table(fixity).get(symbol)
    }

    /// Whether a punctuation run is a known operator under any fixity.
    /// The lexer uses this for maximal-munch tokenization.
    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.prefix.contains_key(symbol)
            || self.infix.contains_key(symbol)
            || self.postfix.contains_key(symbol)
    }

    /// Register an operator. Fails when the symbol is already taken under
    /// this fixity by a read-only entry.
    pub fn add(
        &mut self,
        fixity: Fixity,
        symbol: &str,
        bp: f64,
        rbp: Option<f64>,
        handler: OpHandler,
        writable: bool,
    ) -> bool {
        let table = self.table_mut(fixity);
        if let Some(existing) = table.get(symbol) {
            if !existing.writable {
                return false;
            }
        }
        table.insert(
            symbol.to_owned(),
            OpEntry {
                bp,
                rbp,
                handler,
                writable,
            },
        );
        true
    }

    pub fn iter(&self, fixity: Fixity) -> impl Iterator<Item = (&str, &OpEntry)> {
        self.table(fixity).iter().map(|(k, v)| (k.as_str(), v))
    }
}
