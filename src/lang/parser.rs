//! Pratt parser for xen.
//!
//! Binding powers are snapshotted from the operator registry when the
//! parser is created, so operators defined during one top-level
//! evaluation become parseable in the next but never retroactively
//! within the same source string.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::ast::{MacroCall, Node};
use super::lexer::Token;
use super::registry::{Fixity, OperatorRegistry};

#[derive(Debug)]
pub struct ParseError {
    kind: ParseErrorKind,
}

impl ParseError {
    fn new(kind: ParseErrorKind) -> ParseError {
        ParseError { kind }
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

#[derive(Debug, PartialEq)]
pub enum ParseErrorKind {
    /// A token with no meaning in its position.
    Unexpected(Token),
    /// A `)` or `]` that never arrives.
    MissingDelimiter(&'static str),
    /// Assignment to something that is neither a name nor a call pattern.
    InvalidLvalue,
    /// A function definition whose parameter list contains a non-name.
    InvalidArgumentName,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ParseErrorKind::Unexpected(token) => write!(f, "unexpected token `{}`", token),
            ParseErrorKind::MissingDelimiter(d) => write!(f, "expected closing `{}`", d),
            ParseErrorKind::InvalidLvalue => {
                write!(f, "left side of `=` must be a name or a call pattern")
            }
            ParseErrorKind::InvalidArgumentName => {
                write!(f, "function arguments must be plain names")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Binding powers of the grammar, flattened out of the registry.
struct Symbols {
    prefix: HashMap<String, f64>,
    infix: HashMap<String, (f64, f64)>,
    postfix: HashMap<String, f64>,
}

impl Symbols {
    fn snapshot(registry: &OperatorRegistry) -> Symbols {
        let mut prefix = HashMap::new();
        let mut infix = HashMap::new();
        let mut postfix = HashMap::new();
        for (sym, entry) in registry.iter(Fixity::Prefix) {
            prefix.insert(sym.to_owned(), entry.bp);
        }
        for (sym, entry) in registry.iter(Fixity::Infix) {
            infix.insert(sym.to_owned(), (entry.bp, entry.rbp.unwrap_or(entry.bp)));
        }
        for (sym, entry) in registry.iter(Fixity::Postfix) {
            postfix.insert(sym.to_owned(), entry.bp);
        }
        Symbols {
            prefix,
            infix,
            postfix,
        }
    }
}

// Fixed binding powers of the non-operator syntax.
const BP_ASSIGN: f64 = 1.0;
const BP_INDEX: f64 = 8.0;
/// Right binding power used inside delimiters, argument lists and
/// assignment right sides: everything except `;` and `=` binds tighter.
const BP_INNER: f64 = 2.0;

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    symbols: Symbols,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], registry: &OperatorRegistry) -> Parser<'a> {
        Parser {
            tokens,
            pos: 0,
            symbols: Symbols::snapshot(registry),
        }
    }

    /// Parse the token stream as a sequence of statements.
    pub fn parse(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        while !matches!(self.peek(), Token::End) {
            nodes.push(self.expression(0.0)?);
        }
        Ok(nodes)
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::End)
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens.get(self.pos).cloned().unwrap_or(Token::End);
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: &Token, delimiter: &'static str) -> Result<(), ParseError> {
        if self.peek() == expected {
            self.bump();
            Ok(())
        } else {
            Err(ParseError::new(ParseErrorKind::MissingDelimiter(delimiter)))
        }
    }

    /// Left binding power of the upcoming token. Postfix wins over infix
    /// for symbols registered under both fixities.
    fn lbp(&self) -> f64 {
        match self.peek() {
            Token::Op(s) if s == "=" => BP_ASSIGN,
            Token::Op(s) => {
                if let Some(&bp) = self.symbols.postfix.get(s) {
                    bp
                } else if let Some(&(lbp, _)) = self.symbols.infix.get(s) {
                    lbp
                } else {
                    0.0
                }
            }
            Token::BracketOpen => BP_INDEX,
            _ => 0.0,
        }
    }

    fn expression(&mut self, rbp: f64) -> Result<Node, ParseError> {
        let mut left = self.nud()?;
        while rbp < self.lbp() {
            left = self.led(left)?;
        }
        Ok(left)
    }

    fn nud(&mut self) -> Result<Node, ParseError> {
        match self.bump() {
            Token::Number(x) => Ok(Node::Number(x)),
            Token::Ident(name) => {
                if matches!(self.peek(), Token::ParenOpen) {
                    self.bump();
                    let args = self.call_args()?;
                    Ok(Node::Call { name, args })
                } else {
                    Ok(Node::Ident(name))
                }
            }
            Token::Macro { id, pre, block } => Ok(Node::Macro(MacroCall { id, pre, block })),
            Token::ParenOpen => {
                let inner = self.expression(BP_INNER)?;
                self.expect(&Token::ParenClose, ")")?;
                Ok(inner)
            }
            Token::BracketOpen => {
                // list literal; sugar for a call to the list builtin
                let mut args = Vec::new();
                if !matches!(self.peek(), Token::BracketClose) {
                    args.push(self.expression(BP_INNER)?);
                    while matches!(self.peek(), Token::Comma) {
                        self.bump();
                        args.push(self.expression(BP_INNER)?);
                    }
                }
                self.expect(&Token::BracketClose, "]")?;
                Ok(Node::Call {
                    name: "list".to_owned(),
                    args,
                })
            }
            Token::Op(s) => {
                if let Some(&bp) = self.symbols.prefix.get(&s) {
                    let right = self.expression(bp)?;
                    Ok(Node::Prefix {
                        op: s,
                        right: Box::new(right),
                    })
                } else {
                    Err(ParseError::new(ParseErrorKind::Unexpected(Token::Op(s))))
                }
            }
            other => Err(ParseError::new(ParseErrorKind::Unexpected(other))),
        }
    }

    fn led(&mut self, left: Node) -> Result<Node, ParseError> {
        match self.bump() {
            Token::Op(s) if s == "=" => self.assignment(left),
            Token::Op(s) => {
                if self.symbols.postfix.contains_key(&s) {
                    Ok(Node::Postfix {
                        op: s,
                        left: Box::new(left),
                    })
                } else if let Some(&(_, rbp)) = self.symbols.infix.get(&s) {
                    let right = self.expression(rbp)?;
                    Ok(Node::Infix {
                        op: s,
                        left: Box::new(left),
                        right: Box::new(right),
                    })
                } else {
                    Err(ParseError::new(ParseErrorKind::Unexpected(Token::Op(s))))
                }
            }
            Token::BracketOpen => {
                let index = self.expression(BP_INNER)?;
                self.expect(&Token::BracketClose, "]")?;
                Ok(Node::Call {
                    name: "getIndex".to_owned(),
                    args: vec![left, index],
                })
            }
            other => Err(ParseError::new(ParseErrorKind::Unexpected(other))),
        }
    }

    fn assignment(&mut self, left: Node) -> Result<Node, ParseError> {
        match left {
            Node::Ident(name) => {
                let value = self.expression(BP_INNER)?;
                Ok(Node::Assign {
                    name,
                    value: Box::new(value),
                })
            }
            Node::Call { name, args } => {
                let mut params = Vec::with_capacity(args.len());
                for arg in args {
                    if let Node::Ident(param) = arg {
                        params.push(param);
                    } else {
                        return Err(ParseError::new(ParseErrorKind::InvalidArgumentName));
                    }
                }
                let body = self.expression(BP_INNER)?;
                Ok(Node::FnDef {
                    name,
                    params,
                    body: Rc::new(body),
                })
            }
            _ => Err(ParseError::new(ParseErrorKind::InvalidLvalue)),
        }
    }

    fn call_args(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Token::ParenClose) {
            self.bump();
            return Ok(args);
        }
        loop {
            args.push(self.expression(BP_INNER)?);
            match self.bump() {
                Token::Comma => continue,
                Token::ParenClose => break,
                _ => return Err(ParseError::new(ParseErrorKind::MissingDelimiter(")"))),
            }
        }
        Ok(args)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lang::lexer;
    use crate::lang::macros::MacroTable;

    fn parse(input: &str) -> Result<Vec<Node>, ParseError> {
        let registry = OperatorRegistry::with_builtins();
        let tokens = lexer::lex(input, &registry, &MacroTable::with_builtins()).unwrap();
        Parser::new(&tokens, &registry).parse()
    }

    fn num(x: f64) -> Node {
        Node::Number(x)
    }

    fn infix(op: &str, left: Node, right: Node) -> Node {
        Node::Infix {
            op: op.to_owned(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn test_precedence() {
        // `:` binds tighter than `+`
        assert_eq!(
            parse("5:4 + 3:2").unwrap(),
            vec![infix(
                "+",
                infix(":", num(5.0), num(4.0)),
                infix(":", num(3.0), num(2.0)),
            )]
        );
        // `*` binds tighter than `+`
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            vec![infix("+", num(1.0), infix("*", num(2.0), num(3.0)))]
        );
    }

    #[test]
    fn test_right_associative_pow() {
        assert_eq!(
            parse("2 ^ 3 ^ 4").unwrap(),
            vec![infix("^", num(2.0), infix("^", num(3.0), num(4.0)))]
        );
    }

    #[test]
    fn test_postfix_unit() {
        assert_eq!(
            parse("440hz").unwrap(),
            vec![Node::Postfix {
                op: "hz".to_owned(),
                left: Box::new(num(440.0)),
            }]
        );
    }

    #[test]
    fn test_prefix_minus() {
        // prefix `-` binds tighter than infix `*`
        assert_eq!(
            parse("-2 * 3").unwrap(),
            vec![infix(
                "*",
                Node::Prefix {
                    op: "-".to_owned(),
                    right: Box::new(num(2.0)),
                },
                num(3.0),
            )]
        );
    }

    #[test]
    fn test_call_and_statements() {
        assert_eq!(
            parse("f(1, 2) 3").unwrap(),
            vec![
                Node::Call {
                    name: "f".to_owned(),
                    args: vec![num(1.0), num(2.0)],
                },
                num(3.0),
            ]
        );
    }

    #[test]
    fn test_assignment_forms() {
        assert_eq!(
            parse("x = 1 + 2").unwrap(),
            vec![Node::Assign {
                name: "x".to_owned(),
                value: Box::new(infix("+", num(1.0), num(2.0))),
            }]
        );
        assert_eq!(
            parse("f(a, b) = a + b").unwrap(),
            vec![Node::FnDef {
                name: "f".to_owned(),
                params: vec!["a".to_owned(), "b".to_owned()],
                body: Rc::new(infix(
                    "+",
                    Node::Ident("a".to_owned()),
                    Node::Ident("b".to_owned()),
                )),
            }]
        );
        assert!(matches!(
            parse("1 = 2").unwrap_err().kind(),
            ParseErrorKind::InvalidLvalue
        ));
        assert!(matches!(
            parse("f(1) = 2").unwrap_err().kind(),
            ParseErrorKind::InvalidArgumentName
        ));
    }

    #[test]
    fn test_list_literal_and_indexing() {
        assert_eq!(
            parse("[1, 2][0]").unwrap(),
            vec![Node::Call {
                name: "getIndex".to_owned(),
                args: vec![
                    Node::Call {
                        name: "list".to_owned(),
                        args: vec![num(1.0), num(2.0)],
                    },
                    num(0.0),
                ],
            }]
        );
    }

    #[test]
    fn test_missing_delimiter() {
        assert!(matches!(
            parse("(1 + 2").unwrap_err().kind(),
            ParseErrorKind::MissingDelimiter(")")
        ));
        assert!(matches!(
            parse("[1, 2").unwrap_err().kind(),
            ParseErrorKind::MissingDelimiter("]")
        ));
    }

    #[test]
    fn test_unknown_operator_rejected() {
        assert!(matches!(
            parse("1 ~ 2").unwrap_err().kind(),
            ParseErrorKind::Unexpected(Token::Op(_))
        ));
    }
}
