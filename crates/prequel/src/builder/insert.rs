//! INSERT statement builder.

use super::{Builder, Built, Conflict, SqlWriter};
use crate::error::{BuildError, BuildResult};
use crate::expr::is_blank;
use crate::value::Value;
use crate::with::WithList;
use std::sync::Arc;

/// Where the inserted rows come from.
#[derive(Clone, Debug)]
enum Source {
    None,
    Rows(Vec<Vec<Value>>),
    Select(Arc<dyn Builder>),
    DefaultValues,
}

/// INSERT statement builder.
///
/// Row values that are [`Value::Default`] render as `DEFAULT` and take no
/// placeholder; list values bind as one array parameter.
#[derive(Clone, Debug)]
pub struct Insert {
    with: WithList,
    table: String,
    columns: Vec<String>,
    source: Source,
    mixed_source: bool,
    on_conflict: Option<Conflict>,
    returning: Vec<String>,
}

impl Insert {
    /// Create an INSERT into `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            with: WithList::new(),
            table: table.into(),
            columns: Vec::new(),
            source: Source::None,
            mixed_source: false,
            on_conflict: None,
            returning: Vec::new(),
        }
    }

    /// Add a CTE: `WITH name AS (query)`.
    pub fn with(mut self, name: impl Into<String>, query: impl Builder + 'static) -> Self {
        self.with.push(name, query);
        self
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

    /// Append one VALUES row.
    pub fn values(mut self, row: impl IntoIterator<Item = Value>) -> Self {
        let row: Vec<Value> = row.into_iter().collect();
        match &mut self.source {
            Source::Rows(rows) => rows.push(row),
            Source::None => self.source = Source::Rows(vec![row]),
            _ => self.mixed_source = true,
        }
        self
    }

    /// Insert the rows produced by `query`.
    pub fn from_select(mut self, query: impl Builder + 'static) -> Self {
        self.set_source(Source::Select(Arc::new(query)));
        self
    }

    /// `DEFAULT VALUES`
    pub fn default_values(mut self) -> Self {
        self.set_source(Source::DefaultValues);
        self
    }

    /// Attach an `ON CONFLICT` clause.
    pub fn on_conflict(mut self, conflict: Conflict) -> Self {
        self.on_conflict = Some(conflict);
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

    fn set_source(&mut self, source: Source) {
        if matches!(self.source, Source::None) {
            self.source = source;
        } else {
            self.mixed_source = true;
        }
    }

    pub(crate) fn validate(&self) -> BuildResult<()> {
        if is_blank(&self.table) {
            return Err(BuildError::MissingRequiredField("table"));
        }
        if self.mixed_source {
            return Err(BuildError::IncompatibleClauses(
                "only one of VALUES, SELECT or DEFAULT VALUES may be used",
            ));
        }
        match &self.source {
            Source::None => return Err(BuildError::MissingRequiredField("values")),
            Source::Rows(rows) => check_arity(&self.columns, rows)?,
            Source::Select(_) | Source::DefaultValues => {}
        }
        Ok(())
    }

    /// Write `INSERT INTO ... <source>`; shared with the upsert builder.
    pub(crate) fn write_head(&self, w: &mut SqlWriter) -> BuildResult<()> {
        self.with.write_to(w)?;

        w.keyword("INSERT INTO ");
        w.push(&self.table);
        if !self.columns.is_empty() {
            w.push(" (");
            w.push(&self.columns.join(", "));
            w.push(")");
        }

        match &self.source {
            Source::Rows(rows) => {
                w.keyword("VALUES ");
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        w.push(", ");
                    }
                    w.push_row(row);
                }
            }
            Source::Select(query) => {
                w.space();
                w.push_builder(query.as_ref())?;
            }
            Source::DefaultValues => w.keyword("DEFAULT VALUES"),
            Source::None => {}
        }
        Ok(())
    }

    pub(crate) fn write_returning(&self, w: &mut SqlWriter) {
        w.names("RETURNING", &self.returning);
    }

    pub(crate) fn column_names(&self) -> &[String] {
        &self.columns
    }
}

/// Every row must match the column count when columns are given.
pub(crate) fn check_arity(columns: &[String], rows: &[Vec<Value>]) -> BuildResult<()> {
    if columns.is_empty() {
        return Ok(());
    }
    for row in rows {
        if row.len() != columns.len() {
            return Err(BuildError::ArityMismatch {
                expected: columns.len(),
                got: row.len(),
            });
        }
    }
    Ok(())
}

impl Builder for Insert {
    fn build(&self) -> BuildResult<Built> {
        self.validate()?;

        let mut w = SqlWriter::new();
        self.write_head(&mut w)?;
        if let Some(conflict) = &self.on_conflict {
            w.space();
            w.push_builder(conflict)?;
        }
        self.write_returning(&mut w);
        Ok(w.finish())
    }
}
