//! Running built statements.
//!
//! [`Executor`] is the glue between a [`Builder`] and a [`GenericClient`]: it
//! builds the statement, runs it under the configured timeout, reports it to
//! its [`QueryLogger`] and maps rows through [`FromRow`].
//!
//! # Example
//!
//! ```ignore
//! use prequel::{params, select, Executor, ExecutorConfig};
//! use std::time::Duration;
//!
//! let exec = Executor::with_config(
//!     ExecutorConfig::new().with_query_timeout(Duration::from_secs(5)),
//! );
//! let users: Vec<(i64, String)> = exec
//!     .fetch_all(&client, &select(["id", "name"]).from("users").and_where("active = $1", params![true]))
//!     .await?;
//! ```

use crate::builder::{Builder, Built};
use crate::client::GenericClient;
use crate::error::{PrequelError, PrequelResult};
use crate::log::{QueryEvent, QueryLogger, QueryOutcome, QueryType, TracingLogger};
use crate::row::FromRow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_postgres::Row;

/// Executor settings.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Statements running longer than this fail with [`PrequelError::Timeout`].
    /// `None` means no timeout (default).
    pub query_timeout: Option<Duration>,
    /// Statements at or above this duration are flagged as slow.
    pub slow_query_threshold: Option<Duration>,
    /// Whether statements are reported to the logger.
    pub logging_enabled: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            query_timeout: None,
            slow_query_threshold: Some(Duration::from_secs(1)),
            logging_enabled: true,
        }
    }
}

impl ExecutorConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query timeout duration.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Set the slow query threshold.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Never flag statements as slow.
    pub fn without_slow_query_threshold(mut self) -> Self {
        self.slow_query_threshold = None;
        self
    }

    /// Stop reporting statements to the logger.
    pub fn disable_logging(mut self) -> Self {
        self.logging_enabled = false;
        self
    }

    fn is_slow(&self, elapsed: Duration) -> bool {
        self.slow_query_threshold.is_some_and(|t| elapsed >= t)
    }
}

/// Builds statements and runs them on any [`GenericClient`].
///
/// The executor holds no connection, so one instance can be shared by every
/// task and used with plain clients, transactions and pooled clients alike.
#[derive(Clone)]
pub struct Executor {
    config: ExecutorConfig,
    logger: Arc<dyn QueryLogger>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Default configuration, logging through [`TracingLogger`].
    pub fn new() -> Self {
        Self::with_config(ExecutorConfig::default())
    }

    pub fn with_config(config: ExecutorConfig) -> Self {
        Self {
            config,
            logger: Arc::new(TracingLogger::default()),
        }
    }

    /// Replace the logger.
    pub fn logger(mut self, logger: impl QueryLogger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Replace the logger with a shared one.
    pub fn with_logger(mut self, logger: Arc<dyn QueryLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    // ==================== Raw rows ====================

    /// Run a statement and return the number of affected rows.
    pub async fn execute(
        &self,
        conn: &impl GenericClient,
        b: &(impl Builder + ?Sized),
    ) -> PrequelResult<u64> {
        let built = b.build()?;
        let params = built.params_ref();
        self.run(&built, conn.execute(&built.sql, &params), |n| {
            QueryOutcome::Affected(*n)
        })
        .await
    }

    /// Run a statement and return all rows.
    pub async fn query(
        &self,
        conn: &impl GenericClient,
        b: &(impl Builder + ?Sized),
    ) -> PrequelResult<Vec<Row>> {
        let built = b.build()?;
        let params = built.params_ref();
        self.run(&built, conn.query(&built.sql, &params), |rows| {
            QueryOutcome::Rows(rows.len())
        })
        .await
    }

    /// Run a statement and return the first row, or [`PrequelError::NotFound`].
    pub async fn query_one(
        &self,
        conn: &impl GenericClient,
        b: &(impl Builder + ?Sized),
    ) -> PrequelResult<Row> {
        let built = b.build()?;
        let params = built.params_ref();
        self.run(&built, conn.query_one(&built.sql, &params), |_| {
            QueryOutcome::Rows(1)
        })
        .await
    }

    /// Run a statement and return the first row, if any.
    pub async fn query_opt(
        &self,
        conn: &impl GenericClient,
        b: &(impl Builder + ?Sized),
    ) -> PrequelResult<Option<Row>> {
        let built = b.build()?;
        let params = built.params_ref();
        self.run(&built, conn.query_opt(&built.sql, &params), |row| {
            QueryOutcome::Rows(usize::from(row.is_some()))
        })
        .await
    }

    // ==================== Mapped rows ====================

    /// Run a statement and map every row.
    pub async fn fetch_all<T: FromRow>(
        &self,
        conn: &impl GenericClient,
        b: &(impl Builder + ?Sized),
    ) -> PrequelResult<Vec<T>> {
        self.query(conn, b).await?.iter().map(T::from_row).collect()
    }

    /// Run a statement and map the first row, or fail with [`PrequelError::NotFound`].
    pub async fn fetch_one<T: FromRow>(
        &self,
        conn: &impl GenericClient,
        b: &(impl Builder + ?Sized),
    ) -> PrequelResult<T> {
        T::from_row(&self.query_one(conn, b).await?)
    }

    pub async fn fetch_opt<T: FromRow>(
        &self,
        conn: &impl GenericClient,
        b: &(impl Builder + ?Sized),
    ) -> PrequelResult<Option<T>> {
        self.query_opt(conn, b)
            .await?
            .as_ref()
            .map(T::from_row)
            .transpose()
    }

    async fn run<T, F>(
        &self,
        built: &Built,
        future: F,
        outcome: impl Fn(&T) -> QueryOutcome<'static>,
    ) -> PrequelResult<T>
    where
        F: Future<Output = PrequelResult<T>>,
    {
        let start = Instant::now();
        let result = match self.config.query_timeout {
            Some(timeout) => tokio::time::timeout(timeout, future)
                .await
                .unwrap_or(Err(PrequelError::Timeout(timeout))),
            None => future.await,
        };
        let elapsed = start.elapsed();

        if self.config.logging_enabled {
            let outcome = match &result {
                Ok(value) => outcome(value),
                Err(err) => QueryOutcome::Failed(err),
            };
            self.logger.log(&QueryEvent {
                query_type: QueryType::from_sql(&built.sql),
                sql: &built.sql,
                params: &built.params,
                elapsed,
                slow: self.config.is_slow(elapsed),
                outcome,
            });
        }
        result
    }
}
