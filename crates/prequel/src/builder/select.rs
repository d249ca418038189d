//! SELECT statement builder.

use super::{Builder, Built, SqlWriter, raw_exprs};
use crate::error::BuildResult;
use crate::expr::{Expr, ExprList, Joiner};
use crate::value::Value;
use crate::with::WithList;
use std::sync::Arc;

/// One piece of the FROM clause.
#[derive(Clone, Debug)]
enum FromPart {
    Expr(Expr),
    Select { query: Arc<dyn Builder>, alias: String },
}

/// SELECT statement builder.
///
/// Clauses are emitted in SQL order regardless of the order they were set:
/// `WITH`, `SELECT [DISTINCT [ON]]`, `FROM`, `WHERE`, `GROUP BY`, `HAVING`,
/// `UNION`, `ORDER BY`, `LIMIT`, `OFFSET`, `FOR`.
#[derive(Clone, Debug, Default)]
pub struct Select {
    with: WithList,
    /// `None`: plain; `Some([])`: DISTINCT; `Some(cols)`: DISTINCT ON (cols)
    distinct: Option<Vec<String>>,
    columns: ExprList,
    from: Vec<FromPart>,
    where_list: ExprList,
    group_by: Vec<String>,
    having: ExprList,
    unions: Vec<(bool, Arc<dyn Builder>)>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    lock: Option<String>,
}

impl Select {
    /// Create an empty SELECT; without columns it selects `*`.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== WITH ====================

    /// Add a CTE: `WITH name AS (query)`.
    pub fn with(mut self, name: impl Into<String>, query: impl Builder + 'static) -> Self {
        self.with.push(name, query);
        self
    }

    /// Emit `WITH RECURSIVE`.
    pub fn recursive(mut self) -> Self {
        self.with.set_recursive(true);
        self
    }

    // ==================== SELECT columns ====================

    /// Append plain columns.
    pub fn columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for expr in raw_exprs(cols) {
            self.columns.push(expr);
        }
        self
    }

    /// Append a column expression carrying its own parameters.
    pub fn column(mut self, expr: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        self.columns.push(Expr::new(expr, params));
        self
    }

    /// `SELECT DISTINCT`
    pub fn distinct(mut self) -> Self {
        self.distinct.get_or_insert_with(Vec::new);
        self
    }

    /// `SELECT DISTINCT ON (cols)`
    pub fn distinct_on<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.distinct
            .get_or_insert_with(Vec::new)
            .extend(cols.into_iter().map(Into::into));
        self
    }

    // ==================== FROM ====================

    /// Append a FROM part. Parts are joined by a space, so joins can follow the table.
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from.push(FromPart::Expr(Expr::raw(from)));
        self
    }

    /// Append a FROM part carrying its own parameters.
    pub fn from_expr(mut self, from: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        self.from.push(FromPart::Expr(Expr::new(from, params)));
        self
    }

    /// Append `(query) AS alias`.
    pub fn from_select(mut self, query: impl Builder + 'static, alias: impl Into<String>) -> Self {
        self.from.push(FromPart::Select {
            query: Arc::new(query),
            alias: alias.into(),
        });
        self
    }

    /// Append `INNER JOIN table ON on`.
    pub fn inner_join(self, table: &str, on: &str) -> Self {
        self.from(format!("INNER JOIN {} ON {}", table, on))
    }

    /// Append `LEFT JOIN table ON on`.
    pub fn left_join(self, table: &str, on: &str) -> Self {
        self.from(format!("LEFT JOIN {} ON {}", table, on))
    }

    // ==================== WHERE / GROUP BY / HAVING ====================

    /// Add a WHERE condition; conditions are AND-ed.
    pub fn and_where(mut self, cond: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        self.where_list.push(Expr::new(cond, params));
        self
    }

    /// Add a GROUP BY expression.
    pub fn group_by(mut self, expr: impl Into<String>) -> Self {
        self.group_by.push(expr.into());
        self
    }

    /// Add a HAVING condition; conditions are AND-ed.
    pub fn having(mut self, cond: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        self.having.push(Expr::new(cond, params));
        self
    }

    // ==================== UNION ====================

    /// `UNION query`
    pub fn union(mut self, query: impl Builder + 'static) -> Self {
        self.unions.push((false, Arc::new(query)));
        self
    }

    /// `UNION ALL query`
    pub fn union_all(mut self, query: impl Builder + 'static) -> Self {
        self.unions.push((true, Arc::new(query)));
        self
    }

    // ==================== Ordering & Pagination ====================

    /// Add an ORDER BY expression.
    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by.push(expr.into());
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Pagination helper.
    ///
    /// `page` is 1-based (clamped to >= 1).
    /// `per_page` is clamped to >= 1.
    pub fn paginate(mut self, page: u64, per_page: u64) -> Self {
        let p = page.max(1);
        let size = per_page.max(1);
        self.limit = Some(size);
        self.offset = Some((p - 1) * size);
        self
    }

    /// Row locking: `FOR locking`, e.g. `"UPDATE SKIP LOCKED"`.
    pub fn locking(mut self, locking: impl Into<String>) -> Self {
        self.lock = Some(locking.into());
        self
    }

    // ==================== Build helpers ====================

    fn write_from(&self, w: &mut SqlWriter) -> BuildResult<()> {
        if self.from.is_empty() {
            return Ok(());
        }

        w.keyword("FROM");
        for part in &self.from {
            w.push(" ");
            match part {
                FromPart::Expr(expr) => {
                    let list: ExprList = std::iter::once(expr.clone()).collect();
                    w.push_list(&list, Joiner::Space)?;
                }
                FromPart::Select { query, alias } => {
                    w.push("(");
                    w.push_builder(query.as_ref())?;
                    w.push(") AS ");
                    w.push(alias);
                }
            }
        }
        Ok(())
    }
}

impl Builder for Select {
    fn build(&self) -> BuildResult<Built> {
        let mut w = SqlWriter::new();

        self.with.write_to(&mut w)?;

        w.keyword("SELECT");
        if let Some(on) = &self.distinct {
            w.push(" DISTINCT");
            if !on.is_empty() {
                w.push(" ON (");
                w.push(&on.join(", "));
                w.push(")");
            }
        }

        w.push(" ");
        if self.columns.is_empty() {
            w.push("*");
        } else {
            w.push_list(&self.columns, Joiner::Comma)?;
        }

        self.write_from(&mut w)?;
        w.clause("WHERE", &self.where_list, Joiner::And)?;
        w.names("GROUP BY", &self.group_by);
        w.clause("HAVING", &self.having, Joiner::And)?;

        for (all, query) in &self.unions {
            w.keyword(if *all { "UNION ALL " } else { "UNION " });
            w.push_builder(query.as_ref())?;
        }

        w.names("ORDER BY", &self.order_by);
        if let Some(limit) = self.limit {
            w.keyword(&format!("LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            w.keyword(&format!("OFFSET {}", offset));
        }
        if let Some(lock) = &self.lock {
            w.keyword(&format!("FOR {}", lock));
        }

        Ok(w.finish())
    }
}
