//! Tokenizer.
//!
//! Produces the full token vector up front; the parser needs two tokens of
//! lookahead to tell `[*]` from a multi-select list and to reject quoted
//! function names.

use crate::error::ParseError;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Identifier(String),
    QuotedIdentifier(String),
    /// `'raw string'`
    RawString(String),
    /// `` `json` ``
    Literal(Value),
    Number(i64),
    At,
    Dot,
    Star,
    /// `[`
    Lbracket,
    /// `[]`
    Flatten,
    /// `[?`
    Filter,
    Rbracket,
    Lbrace,
    Rbrace,
    Lparen,
    Rparen,
    Comma,
    Colon,
    Pipe,
    Or,
    And,
    Ampersand,
    Not,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    /// `=~`
    Match,
    Eof,
}

impl Token {
    /// Left binding power used by the parser.
    pub fn lbp(&self) -> u8 {
        match self {
            Token::Pipe => 1,
            Token::Or => 2,
            Token::And => 3,
            Token::Eq | Token::Ne | Token::Lt | Token::Lte | Token::Gt | Token::Gte => 5,
            Token::Match => 5,
            Token::Flatten => 9,
            Token::Star => 20,
            Token::Filter => 21,
            Token::Dot => 40,
            Token::Not => 45,
            Token::Lbrace => 50,
            Token::Lbracket => 55,
            Token::Lparen => 60,
            _ => 0,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(s) => write!(f, "identifier '{s}'"),
            Token::QuotedIdentifier(s) => write!(f, "quoted identifier \"{s}\""),
            Token::RawString(s) => write!(f, "raw string '{s}'"),
            Token::Literal(v) => write!(f, "literal `{v}`"),
            Token::Number(n) => write!(f, "number {n}"),
            Token::At => f.write_str("'@'"),
            Token::Dot => f.write_str("'.'"),
            Token::Star => f.write_str("'*'"),
            Token::Lbracket => f.write_str("'['"),
            Token::Flatten => f.write_str("'[]'"),
            Token::Filter => f.write_str("'[?'"),
            Token::Rbracket => f.write_str("']'"),
            Token::Lbrace => f.write_str("'{'"),
            Token::Rbrace => f.write_str("'}'"),
            Token::Lparen => f.write_str("'('"),
            Token::Rparen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
            Token::Colon => f.write_str("':'"),
            Token::Pipe => f.write_str("'|'"),
            Token::Or => f.write_str("'||'"),
            Token::And => f.write_str("'&&'"),
            Token::Ampersand => f.write_str("'&'"),
            Token::Not => f.write_str("'!'"),
            Token::Eq => f.write_str("'=='"),
            Token::Ne => f.write_str("'!='"),
            Token::Lt => f.write_str("'<'"),
            Token::Lte => f.write_str("'<='"),
            Token::Gt => f.write_str("'>'"),
            Token::Gte => f.write_str("'>='"),
            Token::Match => f.write_str("'=~'"),
            Token::Eof => f.write_str("end of expression"),
        }
    }
}

/// A token and the 1-based position of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>, ParseError> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn run(mut self) -> Result<Vec<Spanned>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let (line, column) = (self.line, self.column);
            let Some(c) = self.advance() else {
                tokens.push(Spanned { token: Token::Eof, line, column });
                return Ok(tokens);
            };
            let token = match c {
                '.' => Token::Dot,
                '*' => Token::Star,
                '@' => Token::At,
                ',' => Token::Comma,
                ':' => Token::Colon,
                ']' => Token::Rbracket,
                '{' => Token::Lbrace,
                '}' => Token::Rbrace,
                '(' => Token::Lparen,
                ')' => Token::Rparen,
                '[' => match self.peek() {
                    Some(']') => {
                        self.advance();
                        Token::Flatten
                    }
                    Some('?') => {
                        self.advance();
                        Token::Filter
                    }
                    _ => Token::Lbracket,
                },
                '|' => self.alt('|', Token::Or, Token::Pipe),
                '&' => self.alt('&', Token::And, Token::Ampersand),
                '!' => self.alt('=', Token::Ne, Token::Not),
                '<' => self.alt('=', Token::Lte, Token::Lt),
                '>' => self.alt('=', Token::Gte, Token::Gt),
                '=' => match self.peek() {
                    Some('=') => {
                        self.advance();
                        Token::Eq
                    }
                    Some('~') => {
                        self.advance();
                        Token::Match
                    }
                    _ => return Err(ParseError::new("Expected '==' or '=~'", line, column)),
                },
                '"' => Token::QuotedIdentifier(self.quoted_string(line, column)?),
                '\'' => Token::RawString(self.raw_string(line, column)?),
                '`' => Token::Literal(self.literal(line, column)?),
                '-' | '0'..='9' => Token::Number(self.number(c, line, column)?),
                c if c.is_ascii_alphabetic() || c == '_' => Token::Identifier(self.identifier(c)),
                other => {
                    return Err(ParseError::new(
                        format!("Unexpected character '{other}'"),
                        line,
                        column,
                    ))
                }
            };
            tokens.push(Spanned { token, line, column });
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\r' => {
                // CRLF counts as one line break.
                if self.peek() != Some('\n') {
                    self.line += 1;
                    self.column = 1;
                }
            }
            _ => self.column += 1,
        }
        Some(c)
    }

    fn alt(&mut self, next: char, matched: Token, single: Token) -> Token {
        if self.peek() == Some(next) {
            self.advance();
            matched
        } else {
            single
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\n' | '\r')) {
            self.advance();
        }
    }

    fn identifier(&mut self, first: char) -> String {
        let mut name = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    fn number(&mut self, first: char, line: usize, column: usize) -> Result<i64, ParseError> {
        let mut text = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if text == "-" {
            return Err(ParseError::new("Expected digits after '-'", self.line, self.column));
        }
        text.parse::<i64>()
            .map_err(|_| ParseError::new(format!("Invalid number '{text}'"), line, column))
    }

    fn quoted_string(&mut self, line: usize, column: usize) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            let (esc_line, esc_column) = (self.line, self.column);
            match self.advance() {
                None => return Err(ParseError::new("Unterminated quoted identifier", line, column)),
                Some('"') => return Ok(out),
                Some('\\') => {
                    let c = self.escape(esc_line, esc_column)?;
                    out.push(c);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, line: usize, column: usize) -> Result<char, ParseError> {
        let invalid = |what: &str| ParseError::new(what.to_string(), line, column);
        match self.advance() {
            Some('"') => Ok('"'),
            Some('\\') => Ok('\\'),
            Some('/') => Ok('/'),
            Some('b') => Ok('\u{0008}'),
            Some('f') => Ok('\u{000C}'),
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('u') => {
                let high = self.hex4().ok_or_else(|| invalid("Invalid \\u escape"))?;
                if (0xD800..0xDC00).contains(&high) {
                    if self.advance() != Some('\\') || self.advance() != Some('u') {
                        return Err(invalid("Expected low surrogate after high surrogate"));
                    }
                    let low = self.hex4().ok_or_else(|| invalid("Invalid \\u escape"))?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(invalid("Invalid low surrogate"));
                    }
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    char::from_u32(code).ok_or_else(|| invalid("Invalid surrogate pair"))
                } else if (0xDC00..0xE000).contains(&high) {
                    Err(invalid("Unexpected low surrogate"))
                } else {
                    char::from_u32(high).ok_or_else(|| invalid("Invalid \\u escape"))
                }
            }
            _ => Err(invalid("Invalid escape sequence")),
        }
    }

    fn hex4(&mut self) -> Option<u32> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self.advance()?.to_digit(16)?;
            code = code * 16 + digit;
        }
        Some(code)
    }

    fn raw_string(&mut self, line: usize, column: usize) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.advance() {
                None => return Err(ParseError::new("Unterminated raw string", line, column)),
                Some('\'') => return Ok(out),
                Some('\\') => match self.peek() {
                    Some(c @ ('\'' | '\\')) => {
                        self.advance();
                        out.push(c);
                    }
                    _ => out.push('\\'),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn literal(&mut self, line: usize, column: usize) -> Result<Value, ParseError> {
        let mut text = String::new();
        loop {
            match self.advance() {
                None => return Err(ParseError::new("Unterminated JSON literal", line, column)),
                Some('`') => break,
                Some('\\') if self.peek() == Some('`') => {
                    self.advance();
                    text.push('`');
                }
                Some(c) => text.push(c),
            }
        }
        serde_json::from_str(text.trim())
            .map_err(|e| ParseError::new(format!("Invalid JSON literal: {e}"), line, column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap_or_else(|e| panic!("tokenize failed for '{input}': {e}"))
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn punctuation_and_brackets() {
        assert_eq!(
            tokens("a[].b[?c][*]"),
            vec![
                Token::Identifier("a".into()),
                Token::Flatten,
                Token::Dot,
                Token::Identifier("b".into()),
                Token::Filter,
                Token::Identifier("c".into()),
                Token::Rbracket,
                Token::Lbracket,
                Token::Star,
                Token::Rbracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn comparators() {
        assert_eq!(
            tokens("< <= > >= == != ! =~ || | && &"),
            vec![
                Token::Lt,
                Token::Lte,
                Token::Gt,
                Token::Gte,
                Token::Eq,
                Token::Ne,
                Token::Not,
                Token::Match,
                Token::Or,
                Token::Pipe,
                Token::And,
                Token::Ampersand,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn strings_and_literals() {
        assert_eq!(
            tokens(r#""a\"bé" 'it\'s \d' `{"k": [1]}` `"x\`y"`"#),
            vec![
                Token::QuotedIdentifier("a\"bé".into()),
                Token::RawString("it's \\d".into()),
                Token::Literal(json!({"k": [1]})),
                Token::Literal(json!("x`y")),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn surrogate_pairs() {
        assert_eq!(
            tokens(r#""\ud83d\ude00""#)[0],
            Token::QuotedIdentifier("\u{1F600}".into())
        );
        assert_eq!(tokens(r#""\u00e9""#)[0], Token::QuotedIdentifier("\u{e9}".into()));
        assert!(tokenize(r#""\ud83d""#).is_err());
        assert!(tokenize(r#""\ude00""#).is_err());
    }

    #[test]
    fn numbers() {
        assert_eq!(tokens("-12 7"), vec![Token::Number(-12), Token::Number(7), Token::Eof]);
        assert!(tokenize("-").is_err());
    }

    #[test]
    fn positions_track_lines() {
        let spanned = tokenize("a\n  .b\r\n|c").unwrap();
        let positions: Vec<(usize, usize)> = spanned.iter().map(|s| (s.line, s.column)).collect();
        assert_eq!(positions, vec![(1, 1), (2, 3), (2, 4), (3, 1), (3, 2), (3, 3)]);
    }

    #[test]
    fn errors_report_position() {
        let err = tokenize("foo.#").unwrap_err();
        assert_eq!((err.line, err.column), (1, 5));
        let err = tokenize("a = b").unwrap_err();
        assert_eq!((err.line, err.column), (1, 3));
        let err = tokenize("`{bad`").unwrap_err();
        assert_eq!((err.line, err.column), (1, 1));
        assert!(tokenize("\"open").is_err());
        assert!(tokenize("'open").is_err());
    }
}
