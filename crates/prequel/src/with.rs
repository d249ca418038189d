//! Common table expressions (`WITH name AS (...)`).

use crate::builder::{Builder, Built, SqlWriter};
use crate::error::{BuildError, BuildResult};
use crate::expr::is_blank;
use std::sync::Arc;

/// Named sub-statements emitted ahead of the main statement.
///
/// CTE bodies come first in the text, so their parameters take the lowest
/// placeholder indices of the whole statement.
#[derive(Clone, Debug, Default)]
pub struct WithList {
    entries: Vec<(String, Arc<dyn Builder>)>,
    recursive: bool,
}

impl WithList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name AS (query)`.
    pub fn push(&mut self, name: impl Into<String>, query: impl Builder + 'static) {
        self.entries.push((name.into(), Arc::new(query)));
    }

    /// Emit `WITH RECURSIVE`.
    pub fn set_recursive(&mut self, recursive: bool) {
        self.recursive = recursive;
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the whole `WITH ...` prefix on its own, numbered from `$1`.
    ///
    /// An empty list builds to empty text.
    pub fn build(&self) -> BuildResult<Built> {
        let mut w = SqlWriter::new();
        self.write_to(&mut w)?;
        Ok(w.finish())
    }

    pub(crate) fn write_to(&self, w: &mut SqlWriter) -> BuildResult<()> {
        if self.entries.is_empty() {
            return Ok(());
        }

        w.keyword(if self.recursive { "WITH RECURSIVE " } else { "WITH " });
        for (i, (name, query)) in self.entries.iter().enumerate() {
            if is_blank(name) {
                return Err(BuildError::EmptyQueryName);
            }
            if i > 0 {
                w.push(", ");
            }
            w.push(name);
            w.push(" AS (");
            w.push_builder(query.as_ref())?;
            w.push(")");
        }
        Ok(())
    }
}
