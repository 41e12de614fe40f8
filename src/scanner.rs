use std::{fmt, iter::Peekable, rc::Rc, str::CharIndices};

use itertools::{Either, Itertools};
use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::token::{Keyword, Token};

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "and" => Keyword::And,
    "class" => Keyword::Class,
    "else" => Keyword::Else,
    "for" => Keyword::For,
    "fun" => Keyword::Fun,
    "if" => Keyword::If,
    "or" => Keyword::Or,
    "print" => Keyword::Print,
    "return" => Keyword::Return,
    "super" => Keyword::Super,
    "this" => Keyword::This,
    "var" => Keyword::Var,
    "while" => Keyword::While,
};

/// A single scanned token together with the exact source substring it was
/// scanned from and the line it ended on.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme<'a> {
    pub token: Token,
    pub content: &'a str,
    pub line: usize,
}

impl<'a> Lexeme<'a> {
    fn new(token: Token, content: &'a str, line: usize) -> Self {
        Self {
            token,
            content,
            line,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    position: Peekable<CharIndices<'a>>,
    line_number: usize,
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: source.char_indices().peekable(),
            line_number: 1,
            finished: false,
        }
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        self.position.peek().copied()
    }

    /// Look `n` characters past the current one without consuming anything.
    fn peek_nth(&self, n: usize) -> Option<(usize, char)> {
        self.position.clone().nth(n)
    }

    /// Attempt to match against the next character. If it matched, consume it
    /// and return a slice from the given start index up to and including the matched char.
    fn match_char(&mut self, expected: char, start_index: usize) -> Option<&'a str> {
        match self.peek() {
            Some((_, found_char)) if found_char == expected => {
                self.position.next();
                match self.peek() {
                    Some((boundary_index, _)) => Some(&self.source[start_index..boundary_index]),
                    None => Some(&self.source[start_index..]),
                }
            }
            _ => None,
        }
    }

    fn advance_until(&mut self, predicate: impl Fn(char) -> bool, start_index: usize) -> &'a str {
        loop {
            match self.peek() {
                Some((index, c)) if predicate(c) => {
                    break &self.source[start_index..index];
                }
                Some((_, c)) => {
                    if c == '\n' {
                        self.line_number += 1;
                    }
                    self.position.next();
                }
                None => break &self.source[start_index..],
            }
        }
    }

    fn new_lexeme(&self, token: Token, content: &'a str) -> Lexeme<'a> {
        Lexeme::new(token, content, self.line_number)
    }

    fn new_identifier(&self, content: &'a str) -> Lexeme<'a> {
        let token = KEYWORDS
            .get(content)
            .map(|keyword| Token::Keyword(*keyword))
            .unwrap_or_else(|| match content {
                // Handle literals that look like keywords, and handle identifiers.
                "nil" => Token::Nil,
                "false" => Token::False,
                "true" => Token::True,
                identifier => Token::Identifier(Rc::from(identifier)),
            });
        self.new_lexeme(token, content)
    }

    fn new_line_comment(&mut self) -> Lexeme<'a> {
        let content = {
            match self.peek() {
                Some((comment_start_index, _)) => {
                    let content = self.advance_until(|c| c == '\n', comment_start_index);

                    // advance_until() doesn't munch the newline, so we need to munch it now.
                    // There might not be a newline if we are at the end of the file, though.
                    if self.position.next().is_some() {
                        self.line_number += 1;
                    }
                    content
                }
                None => {
                    // The comment started right at the end of the file,
                    // so it has no content.
                    ""
                }
            }
        };
        self.new_lexeme(Token::Comment(Rc::from(content)), content)
    }

    /// Consume a block comment. `/*` inside the body opens another nesting
    /// level which must be closed before the comment itself ends.
    fn new_block_comment(&mut self, start_index: usize) -> Lexeme<'a> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.position.next() {
                Some((_, '\n')) => self.line_number += 1,
                Some((_, '/')) => {
                    if matches!(self.peek(), Some((_, '*'))) {
                        self.position.next();
                        depth += 1;
                    }
                }
                Some((_, '*')) => {
                    if matches!(self.peek(), Some((_, '/'))) {
                        self.position.next();
                        depth -= 1;
                    }
                }
                Some(_) => {}
                None => {
                    let content = &self.source[start_index..];
                    return self.new_lexeme(Token::UnterminatedComment, content);
                }
            }
        }

        let content = match self.peek() {
            Some((boundary_index, _)) => &self.source[start_index..boundary_index],
            None => &self.source[start_index..],
        };
        // The payload excludes the outermost '/*' and '*/' delimiters.
        let body = &content[2..content.len() - 2];
        self.new_lexeme(Token::Comment(Rc::from(body)), content)
    }

    fn new_string_literal(&mut self, opening_quote_index: usize) -> Lexeme<'a> {
        let content = self.advance_until(|c| c == '"', opening_quote_index);

        // Check if we found the closing quote or not.
        match self.position.next() {
            Some((_, '"')) => {
                // The content doesn't include the closing quote, if one exists.
                let string_value = &content[1..];
                self.new_lexeme(Token::String(Rc::from(string_value)), string_value)
            }
            None => self.new_lexeme(Token::UnterminatedString, content),
            _ => unreachable!(),
        }
    }

    fn new_number_literal(&mut self, start_index: usize) -> Lexeme<'a> {
        let mut content = self.advance_until(|c| !matches!(c, '0'..='9'), start_index);

        let peek_two = (self.peek(), self.peek_nth(1));
        if let (Some((_, '.')), Some((_, '0'..='9'))) = peek_two {
            // Found a decimal point and a digit behind it, continue advancing.
            self.position.next(); // consume the '.'
            content = self.advance_until(|c| !matches!(c, '0'..='9'), start_index);
        }

        match content.parse() {
            Ok(number) => self.new_lexeme(Token::Number(number), content),
            Err(_) => self.new_lexeme(Token::Unknown, content),
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Lexeme<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let maybe_next = self.position.next();
            if let Some((start_index, start_char)) = maybe_next {
                let content = &self.source[start_index..start_index + start_char.len_utf8()];
                let maybe_lexeme = match start_char {
                    '(' => Some(self.new_lexeme(Token::LeftParen, content)),
                    ')' => Some(self.new_lexeme(Token::RightParen, content)),
                    '{' => Some(self.new_lexeme(Token::LeftBrace, content)),
                    '}' => Some(self.new_lexeme(Token::RightBrace, content)),
                    ',' => Some(self.new_lexeme(Token::Comma, content)),
                    '.' => Some(self.new_lexeme(Token::Dot, content)),
                    '-' => Some(self.new_lexeme(Token::Minus, content)),
                    '+' => Some(self.new_lexeme(Token::Plus, content)),
                    ';' => Some(self.new_lexeme(Token::Semicolon, content)),
                    '*' => Some(self.new_lexeme(Token::Star, content)),
                    '!' => {
                        if let Some(content) = self.match_char('=', start_index) {
                            Some(self.new_lexeme(Token::BangEqual, content))
                        } else {
                            Some(self.new_lexeme(Token::Bang, content))
                        }
                    }
                    '=' => {
                        if let Some(content) = self.match_char('=', start_index) {
                            Some(self.new_lexeme(Token::EqualEqual, content))
                        } else {
                            Some(self.new_lexeme(Token::Equal, content))
                        }
                    }
                    '<' => {
                        if let Some(content) = self.match_char('=', start_index) {
                            Some(self.new_lexeme(Token::LessEqual, content))
                        } else {
                            Some(self.new_lexeme(Token::Less, content))
                        }
                    }
                    '>' => {
                        if let Some(content) = self.match_char('=', start_index) {
                            Some(self.new_lexeme(Token::GreaterEqual, content))
                        } else {
                            Some(self.new_lexeme(Token::Greater, content))
                        }
                    }
                    '/' => {
                        if self.match_char('/', start_index).is_some() {
                            Some(self.new_line_comment())
                        } else if self.match_char('*', start_index).is_some() {
                            Some(self.new_block_comment(start_index))
                        } else {
                            Some(self.new_lexeme(Token::Slash, content))
                        }
                    }
                    '"' => Some(self.new_string_literal(start_index)),
                    '0'..='9' => Some(self.new_number_literal(start_index)),
                    'a'..='z' | 'A'..='Z' | '_' => {
                        let content = self.advance_until(
                            |c| !matches!(c, 'a'..='z' | 'A'..='Z' | '_' | '0'..='9'),
                            start_index,
                        );
                        Some(self.new_identifier(content))
                    }
                    ' ' | '\r' | '\t' => None, // ignore whitespace chars
                    '\n' => {
                        self.line_number += 1;
                        None
                    }
                    _ => Some(self.new_lexeme(Token::Unknown, content)),
                };

                // If we found a lexeme, return it. If not, keep looking.
                if let Some(lexeme) = maybe_lexeme {
                    break Some(lexeme);
                }
            } else {
                let eof_lexeme = Lexeme::new(Token::Eof, "", self.line_number);
                self.finished = true;
                break Some(eof_lexeme);
            }
        }
    }
}

/// Scan an entire source string, separating the token stream from lexical
/// errors. Comments never reach the parser. The token stream always ends
/// with an `Eof` lexeme, even for malformed input.
pub fn scan(source: &str) -> (Vec<Lexeme<'_>>, Vec<LexError>) {
    Scanner::new(source)
        .filter(|lexeme| !matches!(lexeme.token, Token::Comment(_)))
        .partition_map(|lexeme| match lexeme.token {
            Token::Unknown => {
                Either::Right(LexError::new(LexErrorKind::UnexpectedCharacter, lexeme.line))
            }
            Token::UnterminatedString => {
                Either::Right(LexError::new(LexErrorKind::UnterminatedString, lexeme.line))
            }
            Token::UnterminatedComment => Either::Right(LexError::new(
                LexErrorKind::UnterminatedComment,
                lexeme.line,
            )),
            _ => Either::Left(lexeme),
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_new::new)]
pub struct LexError {
    kind: LexErrorKind,
    line: usize,
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum LexErrorKind {
    #[error("Unexpected character.")]
    UnexpectedCharacter,

    #[error("Unterminated string.")]
    UnterminatedString,

    #[error("Unterminated multi-line nested comment.")]
    UnterminatedComment,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error: {}", self.line, self.kind)
    }
}

impl std::error::Error for LexError {}
