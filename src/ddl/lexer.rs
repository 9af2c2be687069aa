//! Tokenizer for DDL scripts.
//!
//! Only the vocabulary needed to recover tables, keys and nullability is
//! recognised as keywords; everything else comes through as identifiers and
//! is skipped by the parser.

use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Create,
    Alter,
    Add,
    Table,
    Only,
    Primary,
    Key,
    Foreign,
    References,
    Not,
    Null,
    Unique,
    Default,
    On,
    Constraint,
    Index,
    If,
    Exists,
    Check,

    // Identifiers and literals
    Ident(String),
    Str(String),
    Num(String),

    // Symbols
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,

    Eof,
}

/// A token and the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    current: Option<char>,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.chars().peekable();
        let current = chars.next();
        Self {
            chars,
            current,
            line: 1,
        }
    }

    fn advance(&mut self) {
        if self.current == Some('\n') {
            self.line += 1;
        }
        self.current = self.chars.next();
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        // positioned on the '*' of "/*"
        self.advance();
        while let Some(c) = self.current {
            self.advance();
            if c == '*' && self.current == Some('/') {
                self.advance();
                break;
            }
        }
    }

    fn read_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.current.filter(|c| keep(*c)) {
            out.push(c);
            self.advance();
        }
        out
    }

    /// Read up to `close`. A doubled closer stands for itself.
    fn read_delimited(&mut self, close: char) -> String {
        self.advance();
        let mut out = String::new();
        while let Some(c) = self.current {
            self.advance();
            if c == close {
                if self.current == Some(close) {
                    out.push(c);
                    self.advance();
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        if self.current == Some('-') {
            num.push('-');
            self.advance();
        }
        let mut seen_dot = false;
        while let Some(c) = self.current {
            if c.is_ascii_digit() || (c == '.' && !seen_dot) {
                seen_dot |= c == '.';
                num.push(c);
                self.advance();
            } else {
                break;
            }
        }
        num
    }

    fn keyword_or_ident(word: String) -> Token {
        match word.to_uppercase().as_str() {
            "CREATE" => Token::Create,
            "ALTER" => Token::Alter,
            "ADD" => Token::Add,
            "TABLE" => Token::Table,
            "ONLY" => Token::Only,
            "PRIMARY" => Token::Primary,
            "KEY" => Token::Key,
            "FOREIGN" => Token::Foreign,
            "REFERENCES" => Token::References,
            "NOT" => Token::Not,
            "NULL" => Token::Null,
            "UNIQUE" => Token::Unique,
            "DEFAULT" => Token::Default,
            "ON" => Token::On,
            "CONSTRAINT" => Token::Constraint,
            "INDEX" => Token::Index,
            "IF" => Token::If,
            "EXISTS" => Token::Exists,
            "CHECK" => Token::Check,
            _ => Token::Ident(word),
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            let next = self.peek();
            match self.current {
                Some(c) if c.is_whitespace() => self.advance(),
                Some('-') if next == Some('-') => self.skip_line_comment(),
                Some('/') if next == Some('*') => {
                    self.advance();
                    self.skip_block_comment();
                }
                Some('#') => self.skip_line_comment(),
                _ => return,
            }
        }
    }

    fn symbol(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    fn next_token(&mut self) -> Token {
        loop {
            self.skip_trivia();
            let next = self.peek();
            let token = match self.current {
                None => Token::Eof,
                Some('(') => self.symbol(Token::LParen),
                Some(')') => self.symbol(Token::RParen),
                Some(',') => self.symbol(Token::Comma),
                Some(';') => self.symbol(Token::Semicolon),
                Some('.') => self.symbol(Token::Dot),
                Some('"') => Token::Ident(self.read_delimited('"')),
                Some('`') => Token::Ident(self.read_delimited('`')),
                Some('[') => Token::Ident(self.read_delimited(']')),
                Some('\'') => Token::Str(self.read_delimited('\'')),
                Some('-') if next.is_some_and(|c| c.is_ascii_digit()) => {
                    Token::Num(self.read_number())
                }
                Some(c) if c.is_ascii_digit() => Token::Num(self.read_number()),
                Some(c) if c.is_alphabetic() || c == '_' || c == '@' => {
                    let word = self.read_while(|c| {
                        c.is_alphanumeric() || matches!(c, '_' | '$' | '@' | '#')
                    });
                    Self::keyword_or_ident(word)
                }
                // operators and anything else the parser has no use for
                Some(_) => {
                    self.advance();
                    continue;
                }
            };
            return token;
        }
    }

    pub fn tokenize(mut self) -> Vec<Spanned> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let line = self.line;
            let token = self.next_token();
            let done = token == Token::Eof;
            tokens.push(Spanned { token, line });
            if done {
                return tokens;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(sql: &str) -> Vec<Token> {
        Lexer::new(sql).tokenize().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_simple_create_table() {
        assert_eq!(
            tokens("CREATE TABLE users (id INT);"),
            vec![
                Token::Create,
                Token::Table,
                Token::Ident("users".to_string()),
                Token::LParen,
                Token::Ident("id".to_string()),
                Token::Ident("INT".to_string()),
                Token::RParen,
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted_identifiers() {
        let t = tokens(r#"CREATE TABLE "User Table" (`col name` INT, [Order Id] INT);"#);
        assert_eq!(t[2], Token::Ident("User Table".to_string()));
        assert_eq!(t[4], Token::Ident("col name".to_string()));
        assert_eq!(t[7], Token::Ident("Order Id".to_string()));
    }

    #[test]
    fn test_comments_and_strings() {
        let t = tokens("-- header\nCREATE /* inline */ TABLE t (s TEXT DEFAULT 'it''s');");
        assert_eq!(t[0], Token::Create);
        assert_eq!(t[1], Token::Table);
        assert!(t.contains(&Token::Str("it's".to_string())));
    }

    #[test]
    fn test_minus_and_slash_lookahead() {
        let t = tokens("DEFAULT -1 CHECK (a - b / 2) -- gone\n/* gone */ x");
        assert_eq!(t[1], Token::Num("-1".to_string()));
        assert_eq!(
            &t[2..],
            [
                Token::Check,
                Token::LParen,
                Token::Ident("a".to_string()),
                Token::Ident("b".to_string()),
                Token::Num("2".to_string()),
                Token::RParen,
                Token::Ident("x".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_line_numbers() {
        let spanned = Lexer::new("CREATE TABLE a (\n  id INT\n);").tokenize();
        let id = spanned
            .iter()
            .find(|s| s.token == Token::Ident("id".to_string()))
            .unwrap();
        assert_eq!(id.line, 2);
    }
}
