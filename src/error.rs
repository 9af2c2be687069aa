//! Errors and non-fatal diagnostics produced while generating code.

use std::fmt;

use thiserror::Error;

use crate::ddl::DdlError;

/// Failures that stop a generation run before (or while) any text is produced.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("settings: namespace must not be empty")]
    EmptyNamespace,
    #[error("settings: the api layer needs a mapped target, but target is {0}")]
    ApiLayerWithoutMapping(&'static str),
    #[error("table {table}: foreign key {constraint} references missing table {refers_to}")]
    DanglingForeignKey {
        table: String,
        constraint: String,
        refers_to: String,
    },
    #[error("table {table}: foreign key {constraint} has no referenced table")]
    MissingReference { table: String, constraint: String },
    #[error("table {table}: foreign key {constraint} has no columns")]
    EmptyForeignKey { table: String, constraint: String },
    #[error("unbalanced scope: {depth} level(s) still open when the unit was finished")]
    UnbalancedScope { depth: usize },
}

pub type Result<T> = std::result::Result<T, GenerateError>;

/// Failures reading a schema from JSON or DDL text.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("schema json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ddl: {0}")]
    Ddl(#[from] DdlError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A column type had no mapping and was emitted as the placeholder type.
    UnknownDataType,
    /// Two tables produce the same class name.
    NameCollision,
    /// Two members of one generated class wanted the same name.
    AccessorCollision,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownDataType => "unknown-type",
            Self::NameCollision => "name-collision",
            Self::AccessorCollision => "accessor-collision",
        }
    }
}

/// A recoverable problem noticed during synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub table: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, table: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind.as_str(), self.table, self.message)
    }
}
