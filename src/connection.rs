use crate::error::StoreError;
use crate::settings::Settings;
use sqlx::Execute;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, Postgres};
use sqlx::query::Query;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Process-wide load guard. `TestStore::load` publishes the handle here
/// exactly once; later calls get a clone of the same handle.
static STORE: OnceCell<TestStore> = OnceCell::const_new();

/// The shape the suite expects the schema to have, expressed as an ordered
/// list of idempotent DDL statements (`CREATE TABLE IF NOT EXISTS ...`).
///
/// The schema contents belong to the surrounding suite, not to this crate;
/// the loader only applies them, and only in test mode.
#[derive(Debug, Clone, Default)]
pub struct SchemaSpec {
    statements: Vec<String>,
}

impl SchemaSpec {
    pub fn new<I, S>(statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            statements: statements.into_iter().map(Into::into).collect(),
        }
    }

    /// A spec that applies nothing, for suites managing their schema
    /// out-of-band.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// A live handle to the test database.
///
/// This is the single shared resource every test and every reset passes
/// through. It is an explicit value rather than an ambient global: the
/// harness obtains it from [`TestStore::load`] and threads it into test
/// bodies. Cloning is cheap; all clones share one connection pool.
///
/// The handle assumes sequential use: tests that share a store must run one
/// at a time, enforced by the harness. It takes no store-level lock itself.
#[derive(Debug, Clone)]
pub struct TestStore {
    pool: PgPool,
    test_mode: bool,
}

impl TestStore {
    /// Loads the test database, once per process.
    ///
    /// The first call connects, applies the schema (test mode only) and
    /// publishes the handle into process-wide state. Every later call is a
    /// no-op that returns a clone of the prior handle; its `settings` and
    /// `schema` arguments are ignored, and the schema is never silently
    /// re-initialized. A connection or schema failure is fatal to the run:
    /// the harness should abort, since no test can proceed without a store.
    pub async fn load(settings: &Settings, schema: &SchemaSpec) -> Result<TestStore, StoreError> {
        let store = STORE
            .get_or_try_init(|| Self::connect(settings, schema))
            .await?;
        Ok(store.clone())
    }

    /// Connects without the once-per-process guard.
    ///
    /// This is the inner path behind [`TestStore::load`]; it is public for
    /// harnesses that provision more than one store in a process.
    pub async fn connect(settings: &Settings, schema: &SchemaSpec) -> Result<TestStore, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&settings.url())
            .await
            .map_err(StoreError::ConnectionFailed)?;

        let store = TestStore {
            pool,
            test_mode: settings.test_mode,
        };

        if settings.test_mode {
            store.ensure_schema(schema).await?;
        } else {
            // Safety boundary: outside of test mode the loader must never
            // issue a schema-mutating statement.
            debug!("test mode off, leaving the schema untouched");
        }

        info!(
            database = %settings.database,
            test_mode = settings.test_mode,
            "test store loaded"
        );
        Ok(store)
    }

    /// Applies the suite's create-if-absent DDL.
    async fn ensure_schema(&self, schema: &SchemaSpec) -> Result<(), StoreError> {
        if schema.is_empty() {
            debug!("empty schema spec, nothing to ensure");
            return Ok(());
        }
        for statement in &schema.statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|source| StoreError::SchemaInitFailed {
                    statement: statement.clone(),
                    source,
                })?;
        }
        debug!(statements = schema.statements.len(), "schema ensured");
        Ok(())
    }

    /// The underlying connection pool, for queries this crate does not wrap.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Whether the store was loaded in test mode.
    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    /// Executes one bound statement, failing loudly.
    ///
    /// The fixture-setup workhorse: build the query with `sqlx::query(...)`
    /// and `.bind(...)`, pass it here, and `?`/`expect` the result in the
    /// test body. Any error comes back as [`StoreError::ExecFailed`] with
    /// the SQL text attached, so a fixture mistake reads like an assertion
    /// failure in the test output. No retries, no silent continuation.
    ///
    /// Returns the number of rows affected.
    pub async fn exec(&self, query: Query<'_, Postgres, PgArguments>) -> Result<u64, StoreError> {
        let statement = query.sql().to_string();
        let done = query
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::ExecFailed { statement, source })?;
        Ok(done.rows_affected())
    }

    /// [`TestStore::exec`] for statements without bind parameters.
    pub async fn exec_sql(&self, sql: &str) -> Result<u64, StoreError> {
        self.exec(sqlx::query(sql)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_spec_reports_emptiness() {
        assert!(SchemaSpec::empty().is_empty());
        assert!(SchemaSpec::default().is_empty());
        assert!(!SchemaSpec::new(["CREATE TABLE IF NOT EXISTS t (id INT)"]).is_empty());
    }
}
