use std::fmt;

use serde::{Deserialize, Serialize};

pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod printer;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use parser::{ParseError, Parser};
use scanner::LexError;
use stmt::Stmt;

/// A problem found before evaluation: the scanner or the parser rejected
/// part of the source. Collected per run rather than flagged globally, so
/// one run's errors can never leak into the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    Lex(LexError),
    Parse(ParseError),
}

impl From<LexError> for Diagnostic {
    fn from(error: LexError) -> Self {
        Self::Lex(error)
    }
}

impl From<ParseError> for Diagnostic {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Lex(error) => write!(f, "{error}"),
            Diagnostic::Parse(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Scan and parse a complete source string. Returns every statement that
/// parsed cleanly along with all lexical and syntax diagnostics found in
/// one pass. Evaluation should only proceed when the diagnostics are empty.
pub fn parse_source(source: &str) -> (Vec<Stmt>, Vec<Diagnostic>) {
    let (lexemes, lex_errors) = scanner::scan(source);

    let mut parser = Parser::new(lexemes.into_iter());
    let (statements, parse_errors) = parser.parse();

    let diagnostics = lex_errors
        .into_iter()
        .map(Diagnostic::from)
        .chain(parse_errors.into_iter().map(Diagnostic::from))
        .collect();

    (statements, diagnostics)
}
