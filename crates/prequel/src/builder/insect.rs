//! Insert-or-select-existing builder.
//!
//! Produces a single statement that inserts a row only when no row matches
//! the given conditions, and returns either the existing or the new row:
//!
//! ```text
//! WITH sel AS (SELECT ret FROM t WHERE ...),
//!      ins AS (INSERT INTO t (cols) SELECT $.. WHERE (NOT EXISTS(SELECT * FROM sel)) RETURNING ret)
//! SELECT ret FROM ins UNION ALL SELECT ret FROM sel
//! ```

use super::{Builder, Built, Insert, Select};
use crate::error::{BuildError, BuildResult};
use crate::expr::{Expr, is_blank};
use crate::value::Value;

/// Insect builder.
#[derive(Clone, Debug)]
pub struct Insect {
    table: String,
    columns: Vec<String>,
    values: Vec<Value>,
    where_list: Vec<Expr>,
    returning: Vec<String>,
}

impl Insect {
    /// Create an insect on `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            values: Vec::new(),
            where_list: Vec::new(),
            returning: Vec::new(),
        }
    }

    /// Append target columns.
    pub fn columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(cols.into_iter().map(Into::into));
        self
    }

    /// Append values for the columns; `DEFAULT` is allowed.
    pub fn values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.values.extend(values);
        self
    }

    /// Add a condition identifying an existing row; conditions are AND-ed.
    pub fn and_where(mut self, cond: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        self.where_list.push(Expr::new(cond, params));
        self
    }

    /// Append RETURNING expressions; `*` when none are given.
    pub fn returning<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning.extend(exprs.into_iter().map(Into::into));
        self
    }

    fn validate(&self) -> BuildResult<()> {
        if is_blank(&self.table) {
            return Err(BuildError::MissingRequiredField("table"));
        }
        if self.columns.is_empty() {
            return Err(BuildError::MissingRequiredField("columns"));
        }
        if self.values.is_empty() {
            return Err(BuildError::MissingRequiredField("values"));
        }
        if self.columns.len() != self.values.len() {
            return Err(BuildError::ArityMismatch {
                expected: self.columns.len(),
                got: self.values.len(),
            });
        }
        Ok(())
    }

    /// The equivalent SELECT with `sel` and `ins` CTEs.
    fn to_select(&self) -> Select {
        let ret: Vec<String> = if self.returning.is_empty() {
            vec!["*".to_string()]
        } else {
            self.returning.clone()
        };

        let mut existing = Select::new().columns(ret.iter().cloned()).from(self.table.clone());
        for cond in &self.where_list {
            existing = existing.and_where(cond.text(), cond.params().to_vec());
        }

        let slots: Vec<String> = (1..=self.values.len()).map(|i| format!("${}", i)).collect();
        let row = Select::new()
            .column(slots.join(", "), self.values.iter().map(Value::as_row_value))
            .and_where("NOT EXISTS(SELECT * FROM sel)", []);
        let inserted = Insert::new(self.table.clone())
            .columns(self.columns.iter().cloned())
            .from_select(row)
            .returning(ret.iter().cloned());

        Select::new()
            .with("sel", existing)
            .with("ins", inserted)
            .columns(ret.iter().cloned())
            .from("ins")
            .union_all(Select::new().columns(ret).from("sel"))
    }
}

impl Builder for Insect {
    fn build(&self) -> BuildResult<Built> {
        self.validate()?;
        self.to_select().build()
    }
}
