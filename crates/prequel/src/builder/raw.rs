//! Hand-written statements.

use super::{Builder, Built};
use crate::error::{BuildError, BuildResult};
use crate::expr::Expr;
use crate::value::Value;

/// A complete statement written by hand.
///
/// Placeholders are renumbered from `$1`, so IN lists are expanded and
/// `DEFAULT` values substituted just like in clause fragments.
#[derive(Clone, Debug)]
pub struct Raw {
    expr: Expr,
}

impl Raw {
    pub fn new(text: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        Self {
            expr: Expr::new(text, params),
        }
    }
}

impl Builder for Raw {
    fn build(&self) -> BuildResult<Built> {
        if self.expr.is_blank() {
            return Err(BuildError::EmptyExpressionText);
        }
        let rendered = self.expr.rewrite(1)?;
        Ok(Built {
            sql: rendered.text,
            params: rendered.params,
        })
    }
}
