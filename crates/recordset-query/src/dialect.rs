//! SQL dialect differences: placeholders, identifier quoting, RETURNING.

use serde::{Deserialize, Serialize};

/// SQL dialect for statement generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL (`$1`, `"ident"`)
    #[default]
    Postgres,
    /// SQLite (`?`, `"ident"`)
    Sqlite,
    /// MySQL (`?`, `` `ident` ``)
    Mysql,
}

impl Dialect {
    /// Placeholder for the 1-based parameter `index`.
    #[must_use]
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite | Dialect::Mysql => "?".to_string(),
        }
    }

    /// Quote an identifier, doubling embedded quote characters.
    #[must_use]
    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
            Dialect::Mysql => format!("`{}`", ident.replace('`', "``")),
        }
    }

    /// Whether `INSERT ... RETURNING` is available.
    #[must_use]
    pub const fn supports_returning(&self) -> bool {
        matches!(self, Dialect::Postgres | Dialect::Sqlite)
    }

    /// Operator keyword for case-insensitive LIKE.
    #[must_use]
    pub const fn ilike(&self) -> &'static str {
        match self {
            Dialect::Postgres => "ILIKE",
            // LIKE is already case-insensitive for ASCII on these engines.
            Dialect::Sqlite | Dialect::Mysql => "LIKE",
        }
    }
}
