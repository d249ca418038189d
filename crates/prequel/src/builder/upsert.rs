//! `INSERT ... ON CONFLICT target DO UPDATE SET ...` builder.

use super::{Builder, Built, Insert, SqlWriter};
use crate::error::{BuildError, BuildResult};
use crate::expr::Expr;
use crate::value::Value;

/// Upsert builder.
///
/// When no explicit update is given, `SET col = EXCLUDED.col` is derived for
/// every declared column.
#[derive(Clone, Debug)]
pub struct Upsert {
    insert: Insert,
    target: Option<Expr>,
    update: Option<Expr>,
}

impl Upsert {
    /// Create an upsert into `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            insert: Insert::new(table),
            target: None,
            update: None,
        }
    }

    /// Add a CTE: `WITH name AS (query)`.
    pub fn with(mut self, name: impl Into<String>, query: impl Builder + 'static) -> Self {
        self.insert = self.insert.with(name, query);
        self
    }

    /// Conflict target, e.g. `("(a) WHERE a != $1", params!["x"])`.
    pub fn target(mut self, target: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        self.target = Some(Expr::new(target, params));
        self
    }

    /// Append target columns.
    pub fn columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert = self.insert.columns(cols);
        self
    }

    /// Append one VALUES row.
    pub fn values(mut self, row: impl IntoIterator<Item = Value>) -> Self {
        self.insert = self.insert.values(row);
        self
    }

    /// Insert the rows produced by `query`.
    pub fn from_select(mut self, query: impl Builder + 'static) -> Self {
        self.insert = self.insert.from_select(query);
        self
    }

    /// Explicit `DO UPDATE SET` body, e.g. `("name = EXCLUDED.name WHERE name != $1", params!["x"])`.
    pub fn update(mut self, update: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        self.update = Some(Expr::new(update, params));
        self
    }

    /// Append RETURNING expressions.
    pub fn returning<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert = self.insert.returning(exprs);
        self
    }

    fn validate(&self) -> BuildResult<()> {
        self.insert.validate()?;

        match &self.target {
            Some(target) if !target.is_blank() => {}
            _ => return Err(BuildError::ConflictConfiguration("empty target")),
        }
        match &self.update {
            Some(update) if update.is_blank() => {
                Err(BuildError::ConflictConfiguration("empty update statement"))
            }
            None if self.insert.column_names().is_empty() => Err(BuildError::ConflictConfiguration(
                "columns required when no update statement is given",
            )),
            _ => Ok(()),
        }
    }
}

impl Builder for Upsert {
    fn build(&self) -> BuildResult<Built> {
        self.validate()?;

        let mut w = SqlWriter::new();
        self.insert.write_head(&mut w)?;

        w.keyword("ON CONFLICT ");
        if let Some(target) = &self.target {
            w.push_expr(target)?;
        }

        w.keyword("DO UPDATE SET ");
        match &self.update {
            Some(update) => w.push_expr(update)?,
            None => {
                let excluded: Vec<String> = self
                    .insert
                    .column_names()
                    .iter()
                    .map(|col| format!("{} = EXCLUDED.{}", col, col))
                    .collect();
                w.push(&excluded.join(", "));
            }
        }

        self.insert.write_returning(&mut w);
        Ok(w.finish())
    }
}
