//! UPDATE statement builder.

use super::{Builder, Built, SqlWriter};
use crate::error::{BuildError, BuildResult};
use crate::expr::{Expr, ExprList, Joiner, is_blank};
use crate::value::Value;
use crate::with::WithList;

/// UPDATE statement builder.
///
/// Assignments render in this order: `columns`/`values` pairs, then
/// [`set`](Update::set) fragments, then [`set_excluded`](Update::set_excluded).
/// Without a table (see [`update_set`](crate::update_set)) only
/// `SET ... [WHERE ...]` is produced, for use as an `ON CONFLICT` action.
#[derive(Clone, Debug)]
pub struct Update {
    with: WithList,
    table: Option<String>,
    columns: Vec<String>,
    values: Vec<Value>,
    set: ExprList,
    excluded: Vec<String>,
    from: ExprList,
    where_list: ExprList,
    returning: Vec<String>,
}

impl Update {
    /// Create an UPDATE of `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self::with_table(Some(table.into()))
    }

    /// Create a table-less `SET ...` list.
    pub fn set_only() -> Self {
        Self::with_table(None)
    }

    fn with_table(table: Option<String>) -> Self {
        Self {
            with: WithList::new(),
            table,
            columns: Vec::new(),
            values: Vec::new(),
            set: ExprList::new(),
            excluded: Vec::new(),
            from: ExprList::new(),
            where_list: ExprList::new(),
            returning: Vec::new(),
        }
    }

    /// Whether this renders as a bare `SET ...` list.
    pub fn is_set_only(&self) -> bool {
        self.table.is_none()
    }

    /// Add a CTE: `WITH name AS (query)`.
    pub fn with(mut self, name: impl Into<String>, query: impl Builder + 'static) -> Self {
        self.with.push(name, query);
        self
    }

    /// Append columns assigned from [`values`](Update::values), pairwise.
    pub fn columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(cols.into_iter().map(Into::into));
        self
    }

    /// Append values for [`columns`](Update::columns); `DEFAULT` is allowed.
    pub fn values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.values.extend(values);
        self
    }

    /// Append an assignment fragment, e.g. `("n = n + $1", params![1])`.
    pub fn set(mut self, expr: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        self.set.push(Expr::new(expr, params));
        self
    }

    /// Append `col = EXCLUDED.col` for each column.
    pub fn set_excluded<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(cols.into_iter().map(Into::into));
        self
    }

    /// Append a FROM part; parts are joined by a space.
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from.push(Expr::raw(from));
        self
    }

    /// Add a WHERE condition; conditions are AND-ed.
    pub fn and_where(mut self, cond: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        self.where_list.push(Expr::new(cond, params));
        self
    }

    /// Append RETURNING expressions.
    pub fn returning<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning.extend(exprs.into_iter().map(Into::into));
        self
    }

    fn validate(&self) -> BuildResult<()> {
        match &self.table {
            Some(table) if is_blank(table) => return Err(BuildError::MissingRequiredField("table")),
            Some(_) => {}
            None => {
                if !self.with.is_empty() || !self.from.is_empty() || !self.returning.is_empty() {
                    return Err(BuildError::IncompatibleClauses(
                        "update_set() cannot take WITH, FROM or RETURNING",
                    ));
                }
            }
        }

        if self.columns.is_empty() && self.set.is_empty() && self.excluded.is_empty() {
            return Err(BuildError::MissingRequiredField("columns"));
        }
        if self.columns.len() != self.values.len() {
            return Err(BuildError::ArityMismatch {
                expected: self.columns.len(),
                got: self.values.len(),
            });
        }
        Ok(())
    }

    fn write_assignments(&self, w: &mut SqlWriter) -> BuildResult<()> {
        let mut first = true;
        let mut sep = |w: &mut SqlWriter| {
            if !first {
                w.push(", ");
            }
            first = false;
        };

        for (col, value) in self.columns.iter().zip(&self.values) {
            sep(w);
            w.push(col);
            w.push(" = ");
            w.push_value(value);
        }
        if !self.set.is_empty() {
            sep(w);
            w.push_list(&self.set, Joiner::Comma)?;
        }
        for col in &self.excluded {
            sep(w);
            w.push(&format!("{} = EXCLUDED.{}", col, col));
        }
        Ok(())
    }
}

impl Builder for Update {
    fn build(&self) -> BuildResult<Built> {
        self.validate()?;

        let mut w = SqlWriter::new();
        self.with.write_to(&mut w)?;
        if let Some(table) = &self.table {
            w.keyword("UPDATE ");
            w.push(table);
        }

        w.keyword("SET ");
        self.write_assignments(&mut w)?;
        w.clause("FROM", &self.from, Joiner::Space)?;
        w.clause("WHERE", &self.where_list, Joiner::And)?;
        w.names("RETURNING", &self.returning);
        Ok(w.finish())
    }
}
