//! DELETE statement builder.

use super::{Builder, Built, SqlWriter};
use crate::error::{BuildError, BuildResult};
use crate::expr::{Expr, ExprList, Joiner, is_blank};
use crate::value::Value;
use crate::with::WithList;

/// DELETE statement builder.
#[derive(Clone, Debug)]
pub struct Delete {
    with: WithList,
    table: String,
    using: Vec<String>,
    where_list: ExprList,
    returning: Vec<String>,
}

impl Delete {
    /// Create a DELETE from `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            with: WithList::new(),
            table: table.into(),
            using: Vec::new(),
            where_list: ExprList::new(),
            returning: Vec::new(),
        }
    }

    /// Add a CTE: `WITH name AS (query)`.
    pub fn with(mut self, name: impl Into<String>, query: impl Builder + 'static) -> Self {
        self.with.push(name, query);
        self
    }

    /// Add a USING table.
    pub fn using(mut self, using: impl Into<String>) -> Self {
        self.using.push(using.into());
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
}

impl Builder for Delete {
    fn build(&self) -> BuildResult<Built> {
        if is_blank(&self.table) {
            return Err(BuildError::MissingRequiredField("table"));
        }

        let mut w = SqlWriter::new();
        self.with.write_to(&mut w)?;
        w.keyword("DELETE FROM ");
        w.push(&self.table);
        w.names("USING", &self.using);
        w.clause("WHERE", &self.where_list, Joiner::And)?;
        w.names("RETURNING", &self.returning);
        Ok(w.finish())
    }
}
