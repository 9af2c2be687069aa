//! Database provider tag and detection from dump content.

use serde::{Deserialize, Serialize};

/// The database a schema was read from. Only branches type mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    SqlServer,
    PostgreSql,
    MySql,
    Sqlite,
    Oracle,
    /// Standard SQL
    #[default]
    Generic,
}

impl Provider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sqlserver" | "mssql" | "tsql" => Some(Self::SqlServer),
            "postgres" | "postgresql" => Some(Self::PostgreSql),
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" => Some(Self::Sqlite),
            "oracle" => Some(Self::Oracle),
            "generic" => Some(Self::Generic),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SqlServer => "sqlserver",
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::Oracle => "oracle",
            Self::Generic => "generic",
        }
    }

    /// Guess the provider from header comments and type keywords.
    pub fn detect(content: &str) -> Self {
        let lower = content.to_lowercase();

        if lower.contains("postgresql database dump")
            || lower.contains("pg_dump")
            || lower.contains("-- postgres")
        {
            return Self::PostgreSql;
        }
        if lower.contains("mysql dump") || lower.contains("mysqldump") || lower.contains("-- mysql")
        {
            return Self::MySql;
        }
        if lower.contains("set ansi_nulls") || lower.contains("[dbo].") || lower.contains("\ngo\n")
        {
            return Self::SqlServer;
        }

        if lower.contains("serial")
            || lower.contains("timestamptz")
            || lower.contains("::text")
            || lower.contains("text[]")
        {
            return Self::PostgreSql;
        }
        if lower.contains("auto_increment") || lower.contains("engine=") || lower.contains("unsigned")
        {
            return Self::MySql;
        }
        if lower.contains("nvarchar") || lower.contains("identity(") || lower.contains("uniqueidentifier")
        {
            return Self::SqlServer;
        }
        if lower.contains("varchar2") || lower.contains("number(") {
            return Self::Oracle;
        }
        if lower.contains("autoincrement") {
            return Self::Sqlite;
        }

        Self::Generic
    }

    /// An explicit choice wins; otherwise detect.
    pub fn resolve(explicit: Option<Self>, content: &str) -> Self {
        explicit.unwrap_or_else(|| Self::detect(content))
    }
}
