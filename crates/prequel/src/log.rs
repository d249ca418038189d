//! Statement logging.
//!
//! The builders never log. The [`Executor`](crate::Executor) reports one
//! [`QueryEvent`] per statement to the [`QueryLogger`] it was constructed
//! with; [`TracingLogger`] is the default and writes to the `prequel.sql`
//! tracing target.

use crate::error::PrequelError;
use crate::value::Param;
use std::time::Duration;
use tracing::Level;

/// The kind of statement being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// DDL or anything unrecognised.
    Other,
}

impl QueryType {
    /// Detect the statement kind from its text.
    ///
    /// For `WITH ...` statements the CTE bodies are skipped and the main
    /// statement's keyword decides.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = strip_sql_prefix(sql);
        match Self::from_keyword(trimmed) {
            Some(ty) => ty,
            None if starts_with_keyword(trimmed, "WITH") => Self::main_statement_of_cte(&trimmed[4..]),
            None => QueryType::Other,
        }
    }

    fn from_keyword(s: &str) -> Option<Self> {
        [
            ("SELECT", QueryType::Select),
            ("INSERT", QueryType::Insert),
            ("UPDATE", QueryType::Update),
            ("DELETE", QueryType::Delete),
        ]
        .into_iter()
        .find(|(kw, _)| starts_with_keyword(s, kw))
        .map(|(_, ty)| ty)
    }

    /// First DML keyword outside of any parentheses.
    fn main_statement_of_cte(sql: &str) -> Self {
        let mut depth = 0usize;
        let mut in_quote = false;
        for (i, ch) in sql.char_indices() {
            if in_quote {
                in_quote = ch != '\'';
                continue;
            }
            match ch {
                '\'' => in_quote = true,
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                c if depth == 0 && c.is_ascii_alphabetic() => {
                    let word_start = i == 0 || !sql[..i].ends_with(|p: char| p.is_alphanumeric() || p == '_');
                    if word_start {
                        if let Some(ty) = Self::from_keyword(&sql[i..]) {
                            return ty;
                        }
                    }
                }
                _ => {}
            }
        }
        QueryType::Select
    }
}

/// Skip leading whitespace, comments and opening parentheses.
pub(crate) fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if let Some(rest) = s.strip_prefix("--") {
            match rest.find('\n') {
                Some(pos) => s = &rest[pos + 1..],
                None => return "",
            }
            continue;
        }
        if let Some(rest) = s.strip_prefix("/*") {
            match rest.find("*/") {
                Some(pos) => s = &rest[pos + 2..],
                None => return "",
            }
            continue;
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            return s;
        }
    }
}

/// Case-insensitive keyword match that does not accept a longer identifier.
pub(crate) fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    let Some(prefix) = s.get(..keyword.len()) else {
        return false;
    };
    prefix.eq_ignore_ascii_case(keyword)
        && !s[keyword.len()..].starts_with(|c: char| c.is_alphanumeric() || c == '_')
}

/// Cut `sql` to at most `max_bytes`, on a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// How a statement finished.
#[derive(Debug, Clone, Copy)]
pub enum QueryOutcome<'a> {
    /// Rows returned.
    Rows(usize),
    /// Rows affected.
    Affected(u64),
    Failed(&'a PrequelError),
}

/// One executed statement.
#[derive(Debug, Clone, Copy)]
pub struct QueryEvent<'a> {
    pub query_type: QueryType,
    pub sql: &'a str,
    pub params: &'a [Param],
    pub elapsed: Duration,
    /// Elapsed time reached the configured slow-query threshold.
    pub slow: bool,
    pub outcome: QueryOutcome<'a>,
}

/// Receives one event per executed statement.
pub trait QueryLogger: Send + Sync {
    fn log(&self, event: &QueryEvent<'_>);
}

/// Logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl QueryLogger for NoopLogger {
    fn log(&self, _event: &QueryEvent<'_>) {}
}

/// A `tracing`-based logger.
///
/// Successful statements are emitted at `level`, slow ones at `WARN` and
/// failures at `ERROR`, all on the `prequel.sql` target.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    /// Tracing event level for ordinary statements.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Include parameter values in the event.
    pub log_params: bool,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(1024),
            log_params: false,
        }
    }
}

impl TracingLogger {
    /// Create a new logger with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Include parameter values.
    pub fn with_params(mut self) -> Self {
        self.log_params = true;
        self
    }

    pub(crate) fn display_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    fn effective_level(&self, event: &QueryEvent<'_>) -> Level {
        match event.outcome {
            QueryOutcome::Failed(_) => Level::ERROR,
            _ if event.slow => Level::WARN,
            _ => self.level,
        }
    }
}

impl QueryLogger for TracingLogger {
    fn log(&self, event: &QueryEvent<'_>) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let level = self.effective_level(event);
        let sql = self.display_sql(event.sql);
        let elapsed_ms = event.elapsed.as_secs_f64() * 1000.0;
        let (rows, error) = match event.outcome {
            QueryOutcome::Rows(n) => (n as u64, None),
            QueryOutcome::Affected(n) => (n, None),
            QueryOutcome::Failed(err) => (0, Some(err.to_string())),
        };
        let error = error.as_deref().unwrap_or("-");

        if self.log_params {
            emit_at_level!(
                level,
                target: "prequel.sql",
                query_type = ?event.query_type,
                param_count = event.params.len(),
                params = ?event.params,
                elapsed_ms,
                slow = event.slow,
                rows,
                error,
                sql = %sql,
            );
        } else {
            emit_at_level!(
                level,
                target: "prequel.sql",
                query_type = ?event.query_type,
                param_count = event.params.len(),
                elapsed_ms,
                slow = event.slow,
                rows,
                error,
                sql = %sql,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_type_detection() {
        assert_eq!(QueryType::from_sql("SELECT 1"), QueryType::Select);
        assert_eq!(QueryType::from_sql("  insert into t values ($1)"), QueryType::Insert);
        assert_eq!(QueryType::from_sql("-- note\nUPDATE t SET a = 1"), QueryType::Update);
        assert_eq!(QueryType::from_sql("/* x */ DELETE FROM t"), QueryType::Delete);
        assert_eq!(QueryType::from_sql("(SELECT 1) UNION (SELECT 2)"), QueryType::Select);
        assert_eq!(QueryType::from_sql("CREATE TABLE t (id int)"), QueryType::Other);
        assert_eq!(QueryType::from_sql("SELECTED"), QueryType::Other);
    }

    #[test]
    fn test_query_type_looks_through_cte() {
        assert_eq!(
            QueryType::from_sql("WITH x AS (SELECT 1) INSERT INTO t (a) SELECT * FROM x"),
            QueryType::Insert
        );
        assert_eq!(
            QueryType::from_sql("WITH RECURSIVE r AS (SELECT 1 UNION ALL SELECT n FROM r) SELECT * FROM r"),
            QueryType::Select
        );
        assert_eq!(
            QueryType::from_sql("WITH a AS (SELECT ')'), b AS (DELETE FROM t RETURNING *) UPDATE u SET x = 1"),
            QueryType::Update
        );
        assert_eq!(
            QueryType::from_sql("WITH updated_rows AS (SELECT 1) DELETE FROM t"),
            QueryType::Delete
        );
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
        assert_eq!(truncate_sql_bytes("SELECT 1", 6), "SELECT");
        assert_eq!(truncate_sql_bytes("ééé", 3), "é");

        let logger = TracingLogger::new().max_sql_length(6);
        assert_eq!(logger.display_sql("SELECT 1"), "SELECT...");
        assert_eq!(logger.no_truncate().display_sql("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_levels() {
        let logger = TracingLogger::new().level(Level::INFO);
        let err = PrequelError::Other("boom".into());
        let mut event = QueryEvent {
            query_type: QueryType::Select,
            sql: "SELECT 1",
            params: &[],
            elapsed: Duration::from_millis(3),
            slow: false,
            outcome: QueryOutcome::Rows(1),
        };
        assert_eq!(logger.effective_level(&event), Level::INFO);

        event.slow = true;
        assert_eq!(logger.effective_level(&event), Level::WARN);

        event.outcome = QueryOutcome::Failed(&err);
        assert_eq!(logger.effective_level(&event), Level::ERROR);

        // No subscriber installed: emitting must be harmless.
        logger.log(&event);
        NoopLogger.log(&event);
    }
}
