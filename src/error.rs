use thiserror::Error;

/// Errors returned by the test-store lifecycle operations.
///
/// The variants split into two severities the harness should treat
/// differently: `SettingsLoad`, `ConnectionFailed` and `SchemaInitFailed`
/// are fatal to the whole run (no test can proceed without a store), while
/// the clear/exec variants are scoped to the current test case. Every
/// variant carries the underlying cause so a failing suite can be debugged
/// from the output alone.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to load connection settings: {0}")]
    SettingsLoad(#[from] config::ConfigError),

    #[error("Failed to read connection settings from the environment: {0}")]
    ConnectionConfig(String),

    #[error("Failed to connect to the test database: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    #[error("Schema initialization failed while executing {statement:?}: {source}")]
    SchemaInitFailed {
        statement: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Table name {0:?} is not a plain SQL identifier")]
    InvalidTableName(String),

    #[error("Cannot clear {0:?}: no such table in the current schema")]
    UnknownTable(String),

    #[error("Failed to clear table(s) {table}: {source}")]
    ClearFailed {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Statement {statement:?} failed: {source}")]
    ExecFailed {
        statement: String,
        #[source]
        source: sqlx::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_failed_reports_the_statement_and_cause() {
        let err = StoreError::ExecFailed {
            statement: "INSERT INTO users (name) VALUES ($1)".to_string(),
            source: sqlx::Error::RowNotFound,
        };
        let msg = err.to_string();
        assert!(msg.contains("INSERT INTO users"));
        assert!(msg.contains("no rows returned"));
    }

    #[test]
    fn unknown_table_names_the_offender() {
        let err = StoreError::UnknownTable("bans".to_string());
        assert!(err.to_string().contains("\"bans\""));
    }
}
