//! Statement builders.
//!
//! Each builder accumulates clause fragments through chained calls and turns
//! them into one SQL string plus one ordered parameter list in [`Builder::build`].
//! Fragments are written with their own local `$1..$n`; building renumbers
//! them into a single statement-wide sequence.
//!
//! # Example
//!
//! ```ignore
//! use prequel::{params, select, Builder};
//!
//! let built = select(["a", "b"])
//!     .from("t")
//!     .and_where("x = $1", params![5])
//!     .and_where("y IN ($1)", params![vec![1, 2]])
//!     .build()?;
//!
//! assert_eq!(built.sql, "SELECT a, b FROM t WHERE (x = $1) AND (y IN ($2,$3))");
//! ```

mod conflict;
mod delete;
mod insect;
mod insert;
mod raw;
mod select;
mod update;
mod upsert;

pub use conflict::{Conflict, ConflictAction};
pub use delete::Delete;
pub use insect::Insect;
pub use insert::Insert;
pub use raw::Raw;
pub use select::Select;
pub use update::Update;
pub use upsert::Upsert;

use crate::error::BuildResult;
use crate::expr::{Expr, ExprList, Joiner, Rendered};
use crate::value::{Param, Value};
use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// Anything that can produce a parameterized statement.
///
/// `build` takes `&self`: building twice yields the same output, and a
/// builder can be shared across tasks once assembled.
pub trait Builder: fmt::Debug + Send + Sync {
    /// Produce the SQL text and its parameters in placeholder order.
    fn build(&self) -> BuildResult<Built>;

    /// Debug helper returning just the SQL text.
    fn to_sql(&self) -> BuildResult<String> {
        self.build().map(|b| b.sql)
    }
}

impl<B: Builder + ?Sized> Builder for &B {
    fn build(&self) -> BuildResult<Built> {
        (**self).build()
    }
}

impl<B: Builder + ?Sized> Builder for Arc<B> {
    fn build(&self) -> BuildResult<Built> {
        (**self).build()
    }
}

impl<B: Builder + ?Sized> Builder for Box<B> {
    fn build(&self) -> BuildResult<Built> {
        (**self).build()
    }
}

/// A finished statement.
#[derive(Clone, Debug, Default)]
pub struct Built {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Built {
    /// Parameters as references compatible with tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(Param::as_sql).collect()
    }

    /// Treat the statement as a fragment so it can be spliced into another one.
    pub(crate) fn into_expr(self) -> Expr {
        Expr::new(self.sql, self.params.into_iter().map(Value::Scalar))
    }
}

// ==================== Constructors ====================

/// `SELECT cols ...`; an empty column list selects `*`.
pub fn select<I, S>(cols: I) -> Select
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Select::new().columns(cols)
}

/// `INSERT INTO table ...`
pub fn insert(table: impl Into<String>) -> Insert {
    Insert::new(table)
}

/// `UPDATE table SET ...`
pub fn update(table: impl Into<String>) -> Update {
    Update::new(table)
}

/// A bare `SET ...` list, used as the action of `ON CONFLICT DO UPDATE`.
pub fn update_set() -> Update {
    Update::set_only()
}

/// `DELETE FROM table ...`
pub fn delete(table: impl Into<String>) -> Delete {
    Delete::new(table)
}

/// `INSERT ... ON CONFLICT target DO UPDATE SET ...`
pub fn upsert(table: impl Into<String>) -> Upsert {
    Upsert::new(table)
}

/// Insert a row unless one matching the conditions exists; return either.
pub fn insect(table: impl Into<String>) -> Insect {
    Insect::new(table)
}

/// `ON CONFLICT ... DO NOTHING`
pub fn do_nothing() -> Conflict {
    Conflict::new(ConflictAction::Nothing)
}

/// `ON CONFLICT target ... DO UPDATE SET ...`
pub fn do_update() -> Conflict {
    Conflict::new(ConflictAction::Update)
}

/// A hand-written statement whose placeholders are renumbered from `$1`.
pub fn raw(text: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Raw {
    Raw::new(text, params)
}

// ==================== Shared assembly ====================

/// Collect raw strings into fragments without parameters.
pub(crate) fn raw_exprs<I, S>(items: I) -> impl Iterator<Item = Expr>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Expr::raw)
}

/// Accumulates statement text and the running parameter list.
///
/// Every fragment is renumbered at `params.len() + 1`, so clauses must be
/// written in the order they appear in the final text.
#[derive(Debug, Default)]
pub(crate) struct SqlWriter {
    sql: String,
    params: Vec<Param>,
}

impl SqlWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The index the next placeholder will get.
    pub(crate) fn next_index(&self) -> usize {
        self.params.len() + 1
    }

    /// Append text separated from what precedes it by one space.
    pub(crate) fn keyword(&mut self, text: &str) {
        if !self.sql.is_empty() {
            self.sql.push(' ');
        }
        self.sql.push_str(text);
    }

    /// Separate the next piece from what precedes it.
    pub(crate) fn space(&mut self) {
        self.keyword("");
    }

    /// Append text as is.
    pub(crate) fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    pub(crate) fn push_rendered(&mut self, rendered: Rendered) {
        self.sql.push_str(&rendered.text);
        self.params.extend(rendered.params);
    }

    pub(crate) fn push_expr(&mut self, expr: &Expr) -> BuildResult<()> {
        let rendered = expr.rewrite(self.next_index())?;
        self.push_rendered(rendered);
        Ok(())
    }

    pub(crate) fn push_list(&mut self, list: &ExprList, joiner: Joiner) -> BuildResult<()> {
        let rendered = list.render(self.next_index(), joiner)?;
        self.push_rendered(rendered);
        Ok(())
    }

    /// `KEYWORD items` when the list has members, nothing otherwise.
    pub(crate) fn clause(&mut self, keyword: &str, list: &ExprList, joiner: Joiner) -> BuildResult<()> {
        if list.is_empty() {
            return Ok(());
        }
        self.keyword(keyword);
        self.sql.push(' ');
        self.push_list(list, joiner)
    }

    /// `KEYWORD a, b` for plain identifier lists.
    pub(crate) fn names(&mut self, keyword: &str, names: &[String]) {
        if names.is_empty() {
            return;
        }
        self.keyword(keyword);
        self.sql.push(' ');
        self.sql.push_str(&names.join(", "));
    }

    /// Build a nested statement and splice it in, renumbered.
    pub(crate) fn push_builder(&mut self, builder: &dyn Builder) -> BuildResult<()> {
        let built = builder.build()?;
        self.push_expr(&built.into_expr())
    }

    /// One row value: `DEFAULT` or a fresh placeholder.
    pub(crate) fn push_value(&mut self, value: &Value) {
        match value.row_param() {
            Some(param) => {
                self.params.push(param);
                self.sql.push('$');
                self.sql.push_str(&self.params.len().to_string());
            }
            None => self.sql.push_str("DEFAULT"),
        }
    }

    /// `(v1, v2, ...)`
    pub(crate) fn push_row(&mut self, row: &[Value]) {
        self.sql.push('(');
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_value(value);
        }
        self.sql.push(')');
    }

    pub(crate) fn finish(self) -> Built {
        Built {
            sql: self.sql,
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests;
