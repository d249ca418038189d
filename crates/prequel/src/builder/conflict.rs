//! `ON CONFLICT` clause builder, attached to an INSERT.

use super::{Builder, Built, SqlWriter, Update};
use crate::error::{BuildError, BuildResult};
use crate::expr::{Expr, ExprList, Joiner, is_blank};
use crate::value::Value;

/// What to do on conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictAction {
    Nothing,
    Update,
}

/// `ON CONFLICT [target] [WHERE ...] DO NOTHING | DO UPDATE SET ...`
///
/// The target is written as is, e.g. `(a, b)` or `ON CONSTRAINT uniq_a`.
#[derive(Clone, Debug)]
pub struct Conflict {
    action: ConflictAction,
    target: Option<String>,
    where_list: ExprList,
    update: Option<Update>,
}

impl Conflict {
    pub fn new(action: ConflictAction) -> Self {
        Self {
            action,
            target: None,
            where_list: ExprList::new(),
            update: None,
        }
    }

    /// Conflict target, e.g. `(a)` or `ON CONSTRAINT uniq_a`.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Add an index predicate; predicates are AND-ed.
    pub fn and_where(mut self, cond: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        self.where_list.push(Expr::new(cond, params));
        self
    }

    /// The SET list for `DO UPDATE`, built with [`update_set`](crate::update_set).
    pub fn update(mut self, update: Update) -> Self {
        self.update = Some(update);
        self
    }

    fn validate(&self) -> BuildResult<()> {
        match self.action {
            ConflictAction::Nothing => {
                if self.update.is_some() {
                    return Err(BuildError::ConflictConfiguration("DO NOTHING takes no update"));
                }
            }
            ConflictAction::Update => {
                if self.target.as_deref().is_none_or(is_blank) {
                    return Err(BuildError::ConflictConfiguration("DO UPDATE requires a target"));
                }
                match &self.update {
                    None => return Err(BuildError::ConflictConfiguration("DO UPDATE requires an update")),
                    Some(update) if !update.is_set_only() => {
                        return Err(BuildError::ConflictConfiguration(
                            "DO UPDATE takes a table-less update_set()",
                        ));
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }
}

impl Builder for Conflict {
    fn build(&self) -> BuildResult<Built> {
        self.validate()?;

        let mut w = SqlWriter::new();
        w.keyword("ON CONFLICT");
        if let Some(target) = self.target.as_deref().filter(|t| !is_blank(t)) {
            w.keyword(target);
        }
        w.clause("WHERE", &self.where_list, Joiner::And)?;

        match (&self.action, &self.update) {
            (ConflictAction::Update, Some(update)) => {
                w.keyword("DO UPDATE ");
                w.push_builder(update)?;
            }
            _ => w.keyword("DO NOTHING"),
        }
        Ok(w.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{do_nothing, do_update, params, update, update_set};

    fn sample_set() -> Update {
        update_set()
            .set("a = $1", params![1])
            .set("b = $1", params!["bbb"])
            .set("d = 'ddd'", params![])
            .set("e = EXCLUDED.e", params![])
    }

    #[test]
    fn test_do_nothing() {
        assert_eq!(do_nothing().to_sql().unwrap(), "ON CONFLICT DO NOTHING");
        assert_eq!(
            do_nothing().target("(a)").to_sql().unwrap(),
            "ON CONFLICT (a) DO NOTHING"
        );
        assert_eq!(
            do_nothing().target("ON CONSTRAINT unique_a").to_sql().unwrap(),
            "ON CONFLICT ON CONSTRAINT unique_a DO NOTHING"
        );
    }

    #[test]
    fn test_do_nothing_with_where() {
        let built = do_nothing()
            .and_where("a = $1", params!["aaa"])
            .and_where("b = $1", params![true])
            .build()
            .unwrap();
        assert_eq!(built.sql, "ON CONFLICT WHERE (a = $1) AND (b = $2) DO NOTHING");
        assert_eq!(built.params.len(), 2);
    }

    #[test]
    fn test_do_update() {
        let built = do_update().target("(a)").update(sample_set()).build().unwrap();
        assert_eq!(
            built.sql,
            "ON CONFLICT (a) DO UPDATE SET a = $1, b = $2, d = 'ddd', e = EXCLUDED.e"
        );
        assert_eq!(built.params.len(), 2);
    }

    #[test]
    fn test_do_update_with_where() {
        let built = do_update()
            .target("(a)")
            .and_where("a = $1", params!["aaa"])
            .and_where("b = $1", params![true])
            .update(sample_set())
            .build()
            .unwrap();
        assert_eq!(
            built.sql,
            "ON CONFLICT (a) WHERE (a = $1) AND (b = $2) DO UPDATE SET a = $3, b = $4, d = 'ddd', e = EXCLUDED.e"
        );
        assert_eq!(built.params.len(), 4);
    }

    #[test]
    fn test_invalid_configurations() {
        assert!(matches!(
            do_nothing().update(sample_set()).build().unwrap_err(),
            BuildError::ConflictConfiguration(_)
        ));
        assert!(matches!(
            do_update().update(sample_set()).build().unwrap_err(),
            BuildError::ConflictConfiguration(_)
        ));
        assert!(matches!(
            do_update().target("(a)").build().unwrap_err(),
            BuildError::ConflictConfiguration(_)
        ));
        assert!(matches!(
            do_update()
                .target("(a)")
                .update(update("t").set("a = 1", params![]))
                .build()
                .unwrap_err(),
            BuildError::ConflictConfiguration(_)
        ));
    }
}
