//! Lexer for task files
//!
//! The language is line oriented. Each non-blank line produces its tokens
//! followed by a `Newline`. A line that starts with exactly [`INDENT_WIDTH`]
//! spaces begins with an `Indent` token; any other leading whitespace is an
//! error. Comments (`#` to end of line) and inline whitespace are dropped.
//!
//! Two identifier classes exist: variable names (`[A-Z][A-Z0-9_-]*`) and
//! task names (a letter followed by letters, digits and hyphens). An
//! identifier that fits the variable class is always a variable. The parser
//! still accepts one as a task header (`CI:`); such a task is called with a
//! spelling that is not all capitals (`ci`), since task names ignore case.

use crate::error::{SyntaxError, SyntaxResult};
use crate::lang::ast::Location;
use std::fmt;

/// Spaces that make up one level of indentation
pub const INDENT_WIDTH: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    TaskId(String),
    VarId(String),
    /// Contents of a double-quoted string, without the quotes
    Str(String),
    /// Everything after `$` up to the end of the line, trimmed
    Command(String),
    Indent,
    Newline,
    Colon,
    Comma,
    Equals,
    LParen,
    RParen,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::TaskId(name) => write!(f, "task name '{}'", name),
            Token::VarId(name) => write!(f, "variable '{}'", name),
            Token::Str(_) => write!(f, "string"),
            Token::Command(_) => write!(f, "command"),
            Token::Indent => write!(f, "indentation"),
            Token::Newline => write!(f, "end of line"),
            Token::Colon => write!(f, "':'"),
            Token::Comma => write!(f, "','"),
            Token::Equals => write!(f, "'='"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub location: Location,
}

impl Spanned {
    pub fn new(token: Token, location: Location) -> Self {
        Self { token, location }
    }
}

/// Returns true if `name` is a variable identifier
pub fn is_var_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => chars.all(|c| {
            c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-'
        }),
        _ => false,
    }
}

/// Returns true if `name` is a task identifier
pub fn is_task_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        _ => false,
    }
}

/// Convert source text into tokens, ending with `Eof`
pub fn tokenize(source: &str) -> SyntaxResult<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut line_count = 0;

    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        line_count = line_no;
        let chars: Vec<char> = raw.trim_end_matches('\r').chars().collect();

        let indent = chars.iter().take_while(|c| c.is_whitespace()).count();
        if indent == chars.len() || chars[indent] == '#' {
            continue;
        }
        if indent > 0 {
            if indent != INDENT_WIDTH || chars[..indent].iter().any(|&c| c != ' ') {
                return Err(SyntaxError::BadIndent {
                    location: Location::new(line_no, 1),
                    expected: INDENT_WIDTH,
                });
            }
            tokens.push(Spanned::new(Token::Indent, Location::new(line_no, 1)));
        }

        let end = scan_line(&chars, indent, line_no, &mut tokens)?;
        tokens.push(Spanned::new(Token::Newline, Location::new(line_no, end + 1)));
    }

    tokens.push(Spanned::new(Token::Eof, Location::new(line_count + 1, 1)));
    Ok(tokens)
}

/// Tokenize one line starting at `pos`; returns the column the line ends at
fn scan_line(
    chars: &[char],
    mut pos: usize,
    line_no: usize,
    tokens: &mut Vec<Spanned>,
) -> SyntaxResult<usize> {
    while pos < chars.len() {
        let c = chars[pos];
        let location = Location::new(line_no, pos + 1);

        match c {
            ' ' | '\t' => pos += 1,
            '#' => break,
            '"' => {
                let start = pos + 1;
                let close = chars[start..]
                    .iter()
                    .position(|&ch| ch == '"')
                    .ok_or(SyntaxError::UnterminatedString { location })?;
                let text: String = chars[start..start + close].iter().collect();
                tokens.push(Spanned::new(Token::Str(text), location));
                pos = start + close + 1;
            }
            '$' => {
                let text: String = chars[pos + 1..].iter().collect();
                let text = text.trim();
                if text.is_empty() {
                    return Err(SyntaxError::EmptyCommand { location });
                }
                tokens.push(Spanned::new(Token::Command(text.to_string()), location));
                pos = chars.len();
            }
            ':' => push_punct(tokens, Token::Colon, location, &mut pos),
            ',' => push_punct(tokens, Token::Comma, location, &mut pos),
            '=' => push_punct(tokens, Token::Equals, location, &mut pos),
            '(' => push_punct(tokens, Token::LParen, location, &mut pos),
            ')' => push_punct(tokens, Token::RParen, location, &mut pos),
            c if c.is_ascii_alphabetic() => {
                let start = pos;
                while pos < chars.len()
                    && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '-' || chars[pos] == '_')
                {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().collect();
                tokens.push(Spanned::new(classify(&word, line_no, start)?, location));
            }
            other => {
                return Err(SyntaxError::UnexpectedChar {
                    location,
                    found: other,
                })
            }
        }
    }
    Ok(chars.len())
}

fn push_punct(tokens: &mut Vec<Spanned>, token: Token, location: Location, pos: &mut usize) {
    tokens.push(Spanned::new(token, location));
    *pos += 1;
}

/// Decide which identifier class a word belongs to
fn classify(word: &str, line_no: usize, start: usize) -> SyntaxResult<Token> {
    if is_var_ident(word) {
        return Ok(Token::VarId(word.to_string()));
    }
    if is_task_ident(word) {
        return Ok(Token::TaskId(word.to_string()));
    }
    // Only underscores can make a word fit neither class
    let offset = word.find('_').unwrap_or(0);
    Err(SyntaxError::UnexpectedChar {
        location: Location::new(line_no, start + offset + 1),
        found: '_',
    })
}
