//! The table-clearing engine that restores the known-empty baseline between
//! tests.
//!
//! Clearing is a single multi-table `TRUNCATE ... RESTART IDENTITY`
//! statement, PostgreSQL's native atomic bulk-truncation primitive. That one
//! statement carries the whole isolation contract:
//!
//! - all named tables end up empty or none do; a failure is never observable
//!   as a partially-cleared store,
//! - foreign keys *among* the named tables are resolved by the server, so
//!   callers may list tables in any order,
//! - a foreign key pointing in from a table *outside* the set fails
//!   explicitly instead of cascading into tables the caller did not name,
//! - truncating an already-empty table is a no-op,
//! - `RESTART IDENTITY` resets sequences, so generated ids are deterministic
//!   from a fresh baseline.

use crate::connection::TestStore;
use crate::error::StoreError;
use tracing::debug;

impl TestStore {
    /// Empties the named tables in one atomic unit.
    ///
    /// Every test calls this between cases to restore the baseline. The
    /// caller owns the table list; pass a referentially-closed set (include
    /// every table that references one you want cleared). An empty set is a
    /// no-op. Failures come back as [`StoreError::ClearFailed`] (or
    /// `UnknownTable`/`InvalidTableName` for bad input) and are never
    /// retried; the current test cannot safely proceed on an unverified
    /// baseline, but the store itself is left consistent.
    pub async fn clear_tables(&self, tables: &[&str]) -> Result<(), StoreError> {
        if tables.is_empty() {
            return Ok(());
        }
        for &table in tables {
            if !is_plain_identifier(table) {
                return Err(StoreError::InvalidTableName(table.to_string()));
            }
        }
        // Resolve each name up front so an unknown table is reported by
        // name, rather than as a parse error on the combined statement.
        for &table in tables {
            if !self.table_exists(table).await? {
                return Err(StoreError::UnknownTable(table.to_string()));
            }
        }

        let statement = truncate_statement(tables);
        sqlx::query(&statement)
            .execute(self.pool())
            .await
            .map_err(|source| StoreError::ClearFailed {
                table: tables.join(", "),
                source,
            })?;

        debug!(?tables, "tables cleared");
        Ok(())
    }

    async fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )",
        )
        .bind(table)
        .fetch_one(self.pool())
        .await
        .map_err(|source| StoreError::ClearFailed {
            table: table.to_string(),
            source,
        })
    }
}

/// Builds the combined truncation statement over quoted identifiers.
fn truncate_statement(tables: &[&str]) -> String {
    let list = tables
        .iter()
        .map(|t| quote_identifier(t))
        .collect::<Vec<_>>()
        .join(", ");
    format!("TRUNCATE TABLE {list} RESTART IDENTITY")
}

/// Accepts unquoted PostgreSQL identifiers only: leading letter or
/// underscore, then letters, digits and underscores, within the 63-byte
/// name limit. Table names come from test code, not user input, but they
/// are interpolated into SQL and get validated like input anyway.
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_lowercase() || first == '_') {
        return false;
    }
    name.len() <= 63
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifiers_pass() {
        for name in ["users", "_internal", "posts_2024", "a"] {
            assert!(is_plain_identifier(name), "{name}");
        }
    }

    #[test]
    fn injection_shaped_names_are_rejected() {
        for name in [
            "",
            "Users",
            "users; DROP TABLE users",
            "users\"",
            "user name",
            "1users",
        ] {
            assert!(!is_plain_identifier(name), "{name:?}");
        }
    }

    #[test]
    fn overlong_names_are_rejected() {
        let name = "t".repeat(64);
        assert!(!is_plain_identifier(&name));
        let name = "t".repeat(63);
        assert!(is_plain_identifier(&name));
    }

    #[test]
    fn truncate_statement_quotes_and_joins() {
        assert_eq!(
            truncate_statement(&["users", "posts"]),
            "TRUNCATE TABLE \"users\", \"posts\" RESTART IDENTITY"
        );
    }
}
