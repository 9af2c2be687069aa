//! Recursive-descent reader for `CREATE TABLE` and `ALTER TABLE` statements.
//!
//! The parser is forgiving: statements it has no use for (indexes, views,
//! grants, batch separators) are skipped, and unknown column options are
//! ignored. It fails only where a key definition is too broken to recover.

use thiserror::Error;
use tracing::debug;

use super::lexer::{Lexer, Spanned, Token};
use super::provider::Provider;
use crate::schema::{Column, Constraint, Schema, Table};

#[derive(Debug, Error)]
pub enum DdlError {
    #[error("line {line}: expected {expected}, found {found}")]
    Expected {
        expected: &'static str,
        found: String,
        line: usize,
    },
    #[error("line {line}: unexpected end of input inside table {table}")]
    UnexpectedEof { table: String, line: usize },
    #[error("line {line}: ALTER TABLE on unknown table {table}")]
    UnknownTable { table: String, line: usize },
    #[error("line {line}: table {table} is defined twice")]
    DuplicateTable { table: String, line: usize },
}

pub type Result<T> = std::result::Result<T, DdlError>;

/// Words that end a column's type and start its options.
const TYPE_TERMINATORS: &[&str] = &[
    "identity",
    "auto_increment",
    "autoincrement",
    "collate",
    "generated",
    "comment",
    "rowguidcol",
    "sparse",
];

/// Parse a DDL script into a schema. `provider` is detected from the script
/// when not given.
pub fn parse_ddl(input: &str, provider: Option<Provider>) -> Result<Schema> {
    let provider = Provider::resolve(provider, input);
    debug!(provider = provider.as_str(), "parsing ddl");

    let tokens = Lexer::new(input).tokenize();
    let mut parser = Parser { tokens, pos: 0 };
    let tables = parser.parse()?;

    Ok(Schema {
        provider,
        tables,
        views: Vec::new(),
    })
}

/// A foreign key added after the table, by `ALTER TABLE`.
struct LateKey {
    table: String,
    line: usize,
    key: LateKeyKind,
}

enum LateKeyKind {
    Primary(Vec<String>),
    Foreign(Constraint),
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn current(&self) -> &Token {
        self.tokens.get(self.pos).map(|s| &s.token).unwrap_or(&Token::Eof)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_word(&self, word: &str) -> bool {
        matches!(self.current(), Token::Ident(w) if w.eq_ignore_ascii_case(word))
    }

    fn expected(&self, expected: &'static str) -> DdlError {
        DdlError::Expected {
            expected,
            found: format!("{:?}", self.current()),
            line: self.line(),
        }
    }

    fn parse(&mut self) -> Result<Vec<Table>> {
        let mut tables: Vec<Table> = Vec::new();
        let mut late_keys = Vec::new();

        loop {
            match self.current() {
                Token::Eof => break,
                Token::Create => {
                    self.advance();
                    if self.current() != &Token::Table {
                        // views, indexes, sequences, functions
                        self.skip_statement();
                        continue;
                    }
                    self.advance();
                    self.skip_if_not_exists();

                    let line = self.line();
                    let table = self.parse_create_table()?;
                    if tables.iter().any(|t| t.name == table.name) {
                        return Err(DdlError::DuplicateTable {
                            table: table.name,
                            line,
                        });
                    }
                    debug!(table = %table.name, columns = table.columns.len(), "parsed table");
                    tables.push(table);
                }
                Token::Alter => {
                    self.advance();
                    if let Some(key) = self.parse_alter_table()? {
                        late_keys.push(key);
                    }
                }
                _ => self.advance(),
            }
        }

        for late in late_keys {
            let Some(table) = tables.iter_mut().find(|t| t.name == late.table) else {
                return Err(DdlError::UnknownTable {
                    table: late.table,
                    line: late.line,
                });
            };
            match late.key {
                LateKeyKind::Primary(columns) => set_primary_key(table, columns),
                LateKeyKind::Foreign(fk) => table.add_foreign_key(fk),
            }
        }

        Ok(tables)
    }

    fn skip_if_not_exists(&mut self) {
        if self.eat(&Token::If) {
            self.eat(&Token::Not);
            self.eat(&Token::Exists);
        }
    }

    /// `schema.table` or `table`; keeps the last part.
    fn parse_qualified_name(&mut self, what: &'static str) -> Result<String> {
        let Token::Ident(first) = self.current() else {
            return Err(self.expected(what));
        };
        let mut name = first.clone();
        self.advance();
        while self.current() == &Token::Dot {
            self.advance();
            match self.current() {
                Token::Ident(part) => {
                    name = part.clone();
                    self.advance();
                }
                _ => return Err(self.expected(what)),
            }
        }
        Ok(name)
    }

    fn parse_create_table(&mut self) -> Result<Table> {
        let name = self.parse_qualified_name("table name")?;
        if !self.eat(&Token::LParen) {
            return Err(self.expected("( after table name"));
        }

        let mut table = Table::new(&name);
        let mut primary_key: Vec<String> = Vec::new();
        let mut foreign_keys: Vec<Constraint> = Vec::new();

        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => {
                    return Err(DdlError::UnexpectedEof {
                        table: name,
                        line: self.line(),
                    });
                }
                Token::Comma => self.advance(),
                Token::Constraint => {
                    self.advance();
                    let constraint_name = match self.current() {
                        Token::Ident(n) => Some(n.clone()),
                        _ => None,
                    };
                    if constraint_name.is_some() {
                        self.advance();
                    }
                    self.parse_table_constraint(
                        &name,
                        constraint_name,
                        &mut primary_key,
                        &mut foreign_keys,
                    )?;
                }
                Token::Primary | Token::Foreign | Token::Unique | Token::Check => {
                    self.parse_table_constraint(&name, None, &mut primary_key, &mut foreign_keys)?;
                }
                Token::Index | Token::Key => self.skip_element(),
                Token::Ident(_) => {
                    let (column, inline) = self.parse_column(&name)?;
                    if column.is_primary_key {
                        primary_key.push(column.name.clone());
                    }
                    foreign_keys.extend(inline);
                    table.columns.push(column);
                }
                _ => self.skip_element(),
            }
        }

        // ENGINE=..., ON [PRIMARY], WITH (...)
        self.skip_statement();

        if !primary_key.is_empty() {
            set_primary_key(&mut table, primary_key);
        }
        for fk in foreign_keys {
            table.add_foreign_key(fk);
        }
        Ok(table)
    }

    fn parse_table_constraint(
        &mut self,
        table: &str,
        name: Option<String>,
        primary_key: &mut Vec<String>,
        foreign_keys: &mut Vec<Constraint>,
    ) -> Result<()> {
        match self.current() {
            Token::Primary => {
                self.advance();
                if !self.eat(&Token::Key) {
                    return Err(self.expected("KEY after PRIMARY"));
                }
                primary_key.extend(self.parse_column_list()?);
                self.skip_element();
            }
            Token::Foreign => {
                let mut fk = self.parse_foreign_key(table)?;
                fk.name = name;
                foreign_keys.push(fk);
                self.skip_element();
            }
            _ => self.skip_element(),
        }
        Ok(())
    }

    /// `FOREIGN KEY (cols) REFERENCES table [(cols)] [ON ...]`
    fn parse_foreign_key(&mut self, table: &str) -> Result<Constraint> {
        self.advance();
        if !self.eat(&Token::Key) {
            return Err(self.expected("KEY after FOREIGN"));
        }
        let columns = self.parse_column_list()?;
        if !self.eat(&Token::References) {
            return Err(self.expected("REFERENCES"));
        }
        let (refers_to, referenced_column) = self.parse_reference()?;
        let fk = Constraint::foreign_key(table, columns, &refers_to);
        Ok(match referenced_column {
            Some(column) => fk.referencing(column),
            None => fk,
        })
    }

    /// `table [(col, ...)]`, positioned after REFERENCES.
    fn parse_reference(&mut self) -> Result<(String, Option<String>)> {
        let target = self.parse_qualified_name("referenced table")?;
        let column = if self.current() == &Token::LParen {
            self.parse_column_list()?.into_iter().next()
        } else {
            None
        };
        self.skip_on_actions();
        Ok((target, column))
    }

    /// A parenthesized identifier list. Modifiers ahead of the list
    /// (`CLUSTERED`) and after each name (`ASC`, `DESC`) are skipped.
    fn parse_column_list(&mut self) -> Result<Vec<String>> {
        while matches!(self.current(), Token::Ident(_)) {
            self.advance();
        }
        if !self.eat(&Token::LParen) {
            return Err(self.expected("column list"));
        }

        let mut columns = Vec::new();
        let mut expect_name = true;
        loop {
            match self.current() {
                Token::Ident(name) => {
                    if expect_name {
                        columns.push(name.clone());
                        expect_name = false;
                    }
                    self.advance();
                }
                Token::Comma => {
                    expect_name = true;
                    self.advance();
                }
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => return Err(self.expected(") closing column list")),
                _ => self.advance(),
            }
        }
        Ok(columns)
    }

    fn parse_column(&mut self, table: &str) -> Result<(Column, Option<Constraint>)> {
        let Token::Ident(name) = self.current() else {
            return Err(self.expected("column name"));
        };
        let mut column = Column::new(name, "");
        column.nullable = true;
        self.advance();

        column.data_type = self.parse_type();

        let mut inline_fk = None;
        loop {
            match self.current() {
                Token::Comma | Token::RParen | Token::Eof => break,
                Token::Primary => {
                    self.advance();
                    self.eat(&Token::Key);
                    column.is_primary_key = true;
                }
                Token::Not => {
                    self.advance();
                    if self.eat(&Token::Null) {
                        column.nullable = false;
                    }
                }
                Token::Null => self.advance(),
                Token::Default => {
                    self.advance();
                    self.skip_default_value();
                }
                Token::References => {
                    self.advance();
                    let (refers_to, referenced_column) = self.parse_reference()?;
                    let fk = Constraint::foreign_key(table, vec![column.name.clone()], &refers_to);
                    inline_fk = Some(match referenced_column {
                        Some(c) => fk.referencing(c),
                        None => fk,
                    });
                }
                Token::Check | Token::LParen => self.skip_parenthesized(),
                _ => self.advance(),
            }
        }

        if column.is_primary_key {
            column.nullable = false;
        }
        Ok((column, inline_fk))
    }

    /// Collect the declared type up to the first column option, e.g.
    /// `decimal(18,2)`, `double precision`, `int[]`.
    fn parse_type(&mut self) -> String {
        let mut data_type = String::new();
        let mut depth = 0usize;
        loop {
            match self.current() {
                Token::Ident(word) if depth == 0 => {
                    if TYPE_TERMINATORS.iter().any(|t| word.eq_ignore_ascii_case(t)) {
                        break;
                    }
                    if word.is_empty() {
                        // `[]` lexes as an empty bracketed identifier
                        data_type.push_str("[]");
                    } else {
                        if !data_type.is_empty() {
                            data_type.push(' ');
                        }
                        data_type.push_str(word);
                    }
                }
                Token::Ident(word) | Token::Num(word) => data_type.push_str(word),
                Token::LParen => {
                    depth += 1;
                    data_type.push('(');
                }
                Token::RParen if depth > 0 => {
                    depth -= 1;
                    data_type.push(')');
                }
                Token::Comma if depth > 0 => data_type.push(','),
                // enum('a','b')
                Token::Str(value) if depth > 0 => {
                    data_type.push('\'');
                    data_type.push_str(value);
                    data_type.push('\'');
                }
                Token::Eof => break,
                _ if depth > 0 => {}
                _ => break,
            }
            self.advance();
        }
        data_type
    }

    fn skip_default_value(&mut self) {
        match self.current() {
            Token::LParen => self.skip_parenthesized(),
            Token::Ident(_) => {
                self.advance();
                // now(), newid()
                if self.current() == &Token::LParen {
                    self.skip_parenthesized();
                }
            }
            Token::Eof => {}
            _ => self.advance(),
        }
    }

    /// `ON DELETE CASCADE`, `ON UPDATE SET NULL`, `ON DELETE NO ACTION`
    fn skip_on_actions(&mut self) {
        while self.eat(&Token::On) {
            // DELETE | UPDATE
            self.advance();
            if self.at_word("set") || self.at_word("no") {
                self.advance();
            }
            // CASCADE | RESTRICT | NULL | DEFAULT | ACTION
            self.advance();
        }
    }

    fn skip_parenthesized(&mut self) {
        if !self.eat(&Token::LParen) {
            return;
        }
        let mut depth = 1;
        while depth > 0 {
            match self.current() {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                Token::Eof => return,
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip to the comma or parenthesis ending the current table element.
    fn skip_element(&mut self) {
        while !matches!(self.current(), Token::Comma | Token::RParen | Token::Eof) {
            if self.current() == &Token::LParen {
                self.skip_parenthesized();
            } else {
                self.advance();
            }
        }
    }

    /// Skip to the end of the statement: a semicolon, a `GO` batch separator
    /// or the start of the next statement.
    fn skip_statement(&mut self) {
        loop {
            match self.current() {
                Token::Eof | Token::Create | Token::Alter => return,
                Token::Semicolon => {
                    self.advance();
                    return;
                }
                _ if self.at_word("go") => {
                    self.advance();
                    return;
                }
                _ => self.advance(),
            }
        }
    }

    /// `ALTER TABLE [ONLY] t [WITH CHECK] ADD [CONSTRAINT n] PRIMARY KEY (...)`
    /// or `... FOREIGN KEY (...) REFERENCES ...`. Other alterations are skipped.
    fn parse_alter_table(&mut self) -> Result<Option<LateKey>> {
        if !self.eat(&Token::Table) {
            self.skip_statement();
            return Ok(None);
        }
        self.eat(&Token::Only);
        self.skip_if_not_exists_alter();

        let line = self.line();
        let table = self.parse_qualified_name("table name")?;

        while !matches!(
            self.current(),
            Token::Add | Token::Semicolon | Token::Eof | Token::Create | Token::Alter
        ) {
            self.advance();
        }
        if !self.eat(&Token::Add) {
            self.skip_statement();
            return Ok(None);
        }

        let mut name = None;
        if self.eat(&Token::Constraint) {
            if let Token::Ident(n) = self.current() {
                name = Some(n.clone());
                self.advance();
            }
        }

        let key = match self.current() {
            Token::Primary => {
                self.advance();
                if !self.eat(&Token::Key) {
                    return Err(self.expected("KEY after PRIMARY"));
                }
                Some(LateKeyKind::Primary(self.parse_column_list()?))
            }
            Token::Foreign => {
                let mut fk = self.parse_foreign_key(&table)?;
                fk.name = name;
                Some(LateKeyKind::Foreign(fk))
            }
            _ => None,
        };
        self.skip_statement();

        Ok(key.map(|key| LateKey { table, line, key }))
    }

    /// pg_dump writes `ALTER TABLE IF EXISTS ONLY`.
    fn skip_if_not_exists_alter(&mut self) {
        if self.eat(&Token::If) {
            self.eat(&Token::Exists);
            self.eat(&Token::Only);
        }
    }
}

fn set_primary_key(table: &mut Table, columns: Vec<String>) {
    for column in &mut table.columns {
        if columns.contains(&column.name) {
            column.is_primary_key = true;
            column.nullable = false;
        }
    }
    table.primary_key = Some(Constraint::primary_key(&table.name, columns));
}
