use std::{fmt, rc::Rc};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyword {
    And,
    Class,
    Else,
    For,
    Fun,
    If,
    Or,
    Print,
    Return,
    Super,
    This,
    Var,
    While,
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Keyword::And => "and",
            Keyword::Class => "class",
            Keyword::Else => "else",
            Keyword::For => "for",
            Keyword::Fun => "fun",
            Keyword::If => "if",
            Keyword::Or => "or",
            Keyword::Print => "print",
            Keyword::Return => "return",
            Keyword::Super => "super",
            Keyword::This => "this",
            Keyword::Var => "var",
            Keyword::While => "while",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Token {
    // Guaranteed single-character tokens.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Star,

    // One or two character tokens.
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Slash, // Double slash means the start of a comment, so we don't emit a '//' token by itself.

    // Literals.
    Identifier(Rc<str>),
    String(Rc<str>),
    Number(f64),
    True,
    False,
    Nil,

    // Keywords.
    Keyword(Keyword),

    // Comments.
    Comment(Rc<str>),

    // Malformed input. The scanner emits these instead of giving up;
    // `scan` turns them into diagnostics before the parser runs.
    Unknown,
    UnterminatedString,
    UnterminatedComment,

    // End-of-file token.
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::LeftBrace => f.write_str("{"),
            Token::RightBrace => f.write_str("}"),
            Token::Comma => f.write_str(","),
            Token::Dot => f.write_str("."),
            Token::Minus => f.write_str("-"),
            Token::Plus => f.write_str("+"),
            Token::Semicolon => f.write_str(";"),
            Token::Star => f.write_str("*"),
            Token::Bang => f.write_str("!"),
            Token::BangEqual => f.write_str("!="),
            Token::Equal => f.write_str("="),
            Token::EqualEqual => f.write_str("=="),
            Token::Greater => f.write_str(">"),
            Token::GreaterEqual => f.write_str(">="),
            Token::Less => f.write_str("<"),
            Token::LessEqual => f.write_str("<="),
            Token::Slash => f.write_str("/"),
            Token::Identifier(name) => f.write_str(name),
            Token::String(value) => write!(f, "\"{value}\""),
            Token::Number(value) => write!(f, "{value}"),
            Token::True => f.write_str("true"),
            Token::False => f.write_str("false"),
            Token::Nil => f.write_str("nil"),
            Token::Keyword(keyword) => write!(f, "{keyword}"),
            Token::Comment(text) => f.write_str(text),
            Token::Unknown => f.write_str("<unknown>"),
            Token::UnterminatedString => f.write_str("<unterminated string>"),
            Token::UnterminatedComment => f.write_str("<unterminated comment>"),
            Token::Eof => f.write_str("<eof>"),
        }
    }
}
