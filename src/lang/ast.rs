use std::rc::Rc;

/// A node of the abstract syntax tree.
///
/// Operator nodes keep their symbol rather than a resolved handler:
/// dispatch happens at evaluation time through the operator registry, so
/// an operator redefined between two evaluations picks up its new
/// meaning.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(f64),
    Ident(String),
    Call {
        name: String,
        args: Vec<Node>,
    },
    Assign {
        name: String,
        value: Box<Node>,
    },
    /// Function definition in the `f(x, y) = body` form.
    FnDef {
        name: String,
        params: Vec<String>,
        body: Rc<Node>,
    },
    Prefix {
        op: String,
        right: Box<Node>,
    },
    Infix {
        op: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    Postfix {
        op: String,
        left: Box<Node>,
    },
    Macro(MacroCall),
}

/// A macro token parses to itself; it is dispatched at evaluation time
/// with the raw `pre` text and the balanced `block` body.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroCall {
    pub id: String,
    pub pre: String,
    pub block: String,
}
