//! Lexer for xen source text.
//!
//! Two things make this lexer unusual. Punctuation runs are matched
//! greedily against the current operator registry, so `>=` is one token
//! exactly when an operator `>=` exists. And an identifier naming a
//! registered macro switches the lexer into raw capture mode: the rest of
//! the line (or a balanced `{ ... }` block) is swallowed into the macro
//! token without being tokenized.

use std::fmt;

use super::macros::MacroTable;
use super::registry::OperatorRegistry;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    /// Operator or punctuation run. Single unmatched punctuation
    /// characters also end up here; the parser rejects them.
    Op(String),
    /// A macro invocation with its raw argument text.
    Macro {
        id: String,
        pre: String,
        block: String,
    },
    ParenOpen,
    ParenClose,
    BracketOpen,
    BracketClose,
    Comma,
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Number(x) => write!(f, "{}", x),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Op(s) => write!(f, "{}", s),
            Token::Macro { id, .. } => write!(f, "{}", id),
            Token::ParenOpen => write!(f, "("),
            Token::ParenClose => write!(f, ")"),
            Token::BracketOpen => write!(f, "["),
            Token::BracketClose => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::End => write!(f, "end of input"),
        }
    }
}

#[derive(Debug)]
pub struct LexError {
    position: usize,
    kind: LexErrorKind,
}

impl LexError {
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn kind(&self) -> &LexErrorKind {
        &self.kind
    }
}

#[derive(Debug, PartialEq)]
pub enum LexErrorKind {
    UnrecognizedChar(char),
    /// A numeric literal that does not fit a finite f64.
    NonFiniteNumber,
    /// A macro `{` block that is never closed.
    IncompleteBlock,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            LexErrorKind::UnrecognizedChar(ch) => {
                write!(f, "unrecognized character {:?} at offset {}", ch, self.position)
            }
            LexErrorKind::NonFiniteNumber => {
                write!(f, "numeric literal at offset {} is out of range", self.position)
            }
            LexErrorKind::IncompleteBlock => {
                write!(f, "unterminated {{ block starting near offset {}", self.position)
            }
        }
    }
}

impl std::error::Error for LexError {}

const PUNCTUATION: &str = "+-*/^%=(),:;<>&|!#~[]";
const MACRO_SIGIL: char = '@';

fn is_punctuation(ch: char) -> bool {
    PUNCTUATION.contains(ch)
}

/// Identifier characters are everything that is not punctuation, not a
/// digit (in leading position), not whitespace and not the macro sigil.
/// This deliberately lets `'` and `...` be ordinary identifiers.
fn is_ident_start(ch: char) -> bool {
    !is_punctuation(ch) && !ch.is_ascii_digit() && !ch.is_whitespace() && ch != MACRO_SIGIL
}

fn is_ident_continue(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

pub fn lex(
    input: &str,
    registry: &OperatorRegistry,
    macros: &MacroTable,
) -> Result<Vec<Token>, LexError> {
    Lexer {
        chars: input.chars().collect(),
        pos: 0,
        registry,
        macros,
        tokens: Vec::new(),
    }
    .run()
}

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    registry: &'a OperatorRegistry,
    macros: &'a MacroTable,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.bump();
            } else if is_punctuation(ch) {
                self.lex_punctuation();
            } else if ch.is_ascii_digit() {
                self.lex_number()?;
            } else if ch == MACRO_SIGIL {
                self.bump();
                self.lex_macro("@".to_owned())?;
            } else if ch.is_control() {
                return Err(self.error(LexErrorKind::UnrecognizedChar(ch)));
            } else {
                self.lex_ident()?;
            }
        }
        self.tokens.push(Token::End);
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn error(&self, kind: LexErrorKind) -> LexError {
        LexError {
            position: self.pos,
            kind,
        }
    }

    /// Greedily collect a punctuation run and match it against the
    /// registry; an unmatched run degrades to its individual characters.
    fn lex_punctuation(&mut self) {
        let mut run = String::new();
        while let Some(ch) = self.peek() {
            if is_punctuation(ch) {
                run.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        if run.starts_with("//") {
            // comment to end of line
            while let Some(ch) = self.bump() {
                if ch == '\n' {
                    break;
                }
            }
            return;
        }
        if run == "=" || self.registry.contains_symbol(&run) {
            self.tokens.push(Token::Op(run));
            return;
        }
        for ch in run.chars() {
            let token = match ch {
                '(' => Token::ParenOpen,
                ')' => Token::ParenClose,
                '[' => Token::BracketOpen,
                ']' => Token::BracketClose,
                ',' => Token::Comma,
                _ => Token::Op(ch.to_string()),
            };
            self.tokens.push(token);
        }
    }

    fn lex_number(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') {
            text.push('.');
            self.bump();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    text.push(ch);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        match text.parse::<f64>() {
            Ok(x) if x.is_finite() => {
                self.tokens.push(Token::Number(x));
                Ok(())
            }
            _ => Err(LexError {
                position: start,
                kind: LexErrorKind::NonFiniteNumber,
            }),
        }
    }

    fn lex_ident(&mut self) -> Result<(), LexError> {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if is_ident_continue(ch) {
                name.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        if self.macros.contains(&name) {
            self.lex_macro(name)
        } else if name.eq_ignore_ascii_case("c") {
            self.tokens.push(Token::Op("c".to_owned()));
            Ok(())
        } else if name.eq_ignore_ascii_case("hz") {
            self.tokens.push(Token::Op("hz".to_owned()));
            Ok(())
        } else {
            self.tokens.push(Token::Ident(name));
            Ok(())
        }
    }

    /// Capture the macro arguments: raw text up to the end of the line,
    /// or a balanced `{ ... }` block.
    fn lex_macro(&mut self, id: String) -> Result<(), LexError> {
        let mut pre = String::new();
        let mut block = String::new();
        loop {
            match self.peek() {
                None => break,
                Some('\n') => {
                    self.bump();
                    break;
                }
                Some('{') => {
                    self.bump();
                    block = self.lex_block()?;
                    break;
                }
                Some(ch) => {
                    pre.push(ch);
                    self.bump();
                }
            }
        }
        let pre = pre.trim().trim_end_matches(';').to_owned();
        let block = block.trim().to_owned();
        self.tokens.push(Token::Macro { id, pre, block });
        Ok(())
    }

    fn lex_block(&mut self) -> Result<String, LexError> {
        let start = self.pos;
        let mut depth = 1u32;
        let mut out = String::new();
        while let Some(ch) = self.bump() {
            match ch {
                '{' => {
                    depth += 1;
                    out.push(ch);
                }
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(ch);
                }
                _ => out.push(ch),
            }
        }
        Err(LexError {
            position: start,
            kind: LexErrorKind::IncompleteBlock,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lang::macros::MacroTable;
    use crate::lang::registry::OperatorRegistry;

    fn lex_default(input: &str) -> Result<Vec<Token>, LexError> {
        lex(
            input,
            &OperatorRegistry::with_builtins(),
            &MacroTable::with_builtins(),
        )
    }

    fn op(s: &str) -> Token {
        Token::Op(s.to_owned())
    }

    #[test]
    fn test_numbers_and_operators() {
        assert_eq!(
            lex_default("2#12 + 19#19").unwrap(),
            vec![
                Token::Number(2.0),
                op("#"),
                Token::Number(12.0),
                op("+"),
                Token::Number(19.0),
                op("#"),
                Token::Number(19.0),
                Token::End,
            ]
        );
    }

    #[test]
    fn test_maximal_munch() {
        // ">=" is a registered operator and lexes as one token;
        // "=>" is not and falls apart into single characters
        assert_eq!(
            lex_default("a >= b").unwrap(),
            vec![
                Token::Ident("a".to_owned()),
                op(">="),
                Token::Ident("b".to_owned()),
                Token::End,
            ]
        );
        assert_eq!(
            lex_default("a => b").unwrap(),
            vec![
                Token::Ident("a".to_owned()),
                op("="),
                op(">"),
                Token::Ident("b".to_owned()),
                Token::End,
            ]
        );
    }

    #[test]
    fn test_postfix_units_case_insensitive() {
        assert_eq!(
            lex_default("440Hz 100C").unwrap(),
            vec![
                Token::Number(440.0),
                op("hz"),
                Token::Number(100.0),
                op("c"),
                Token::End,
            ]
        );
    }

    #[test]
    fn test_comment() {
        assert_eq!(
            lex_default("1 // the rest + is * ignored\n2").unwrap(),
            vec![Token::Number(1.0), Token::Number(2.0), Token::End]
        );
    }

    #[test]
    fn test_quote_and_hole_are_identifiers() {
        assert_eq!(
            lex_default("'(1, ...)").unwrap(),
            vec![
                Token::Ident("'".to_owned()),
                Token::ParenOpen,
                Token::Number(1.0),
                Token::Comma,
                Token::Ident("...".to_owned()),
                Token::ParenClose,
                Token::End,
            ]
        );
    }

    #[test]
    fn test_macro_capture_line() {
        assert_eq!(
            lex_default("break the rest; \nnext").unwrap(),
            vec![
                Token::Macro {
                    id: "break".to_owned(),
                    pre: "the rest".to_owned(),
                    block: String::new(),
                },
                Token::Ident("next".to_owned()),
                Token::End,
            ]
        );
    }

    #[test]
    fn test_macro_capture_block() {
        assert_eq!(
            lex_default("scl * {\n 12\n{nested}\n}\n5").unwrap(),
            vec![
                Token::Macro {
                    id: "scl".to_owned(),
                    pre: "*".to_owned(),
                    block: "12\n{nested}".to_owned(),
                },
                Token::Number(5.0),
                Token::End,
            ]
        );
    }

    #[test]
    fn test_unterminated_block() {
        let err = lex_default("operator (a ~ b) { a + b").unwrap_err();
        assert_eq!(*err.kind(), LexErrorKind::IncompleteBlock);
    }

    #[test]
    fn test_user_operator_changes_tokenization() {
        let mut reg = OperatorRegistry::with_builtins();
        use crate::lang::registry::{Fixity, OpHandler};
        reg.add(
            Fixity::Infix,
            "~~",
            4.0,
            None,
            OpHandler::Builtin(crate::lang::builtins::null_op),
            true,
        );
        let toks = lex("1 ~~ 2", &reg, &MacroTable::with_builtins()).unwrap();
        assert_eq!(
            toks,
            vec![Token::Number(1.0), op("~~"), Token::Number(2.0), Token::End]
        );
        // without the registration the run splits
        let toks = lex_default("1 ~~ 2").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Number(1.0),
                op("~"),
                op("~"),
                Token::Number(2.0),
                Token::End,
            ]
        );
    }
}
