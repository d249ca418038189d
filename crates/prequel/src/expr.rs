//! Placeholder renumbering for hand-written SQL fragments.
//!
//! Every fragment is written as if it were the only one in the statement, so
//! its placeholders start at `$1` and index into the parameters passed along
//! with it. When fragments are merged, [`Expr::rewrite`] renumbers them into
//! the statement-wide sequence:
//!
//! ```text
//! "id IN ($1) AND name = $2", [[7, 8], "bob"]  --rewrite(3)-->
//! "id IN ($3,$4) AND name = $5",  [7, 8, "bob"], next = 6
//! ```
//!
//! The scanner is quote and escape aware: anything inside `'...'` and any
//! character following `\` is copied untouched.

use crate::error::{BuildError, BuildResult};
use crate::value::{Param, Value};
use std::iter::Peekable;
use std::str::Chars;

const ESCAPE: char = '\\';
const QUOTE: char = '\'';
const MARKER: char = '$';

/// A SQL fragment with its own, locally numbered parameters.
#[derive(Clone, Debug)]
pub struct Expr {
    text: String,
    params: Vec<Value>,
}

/// The output of a rewrite: renumbered text, flattened params and the next free index.
#[derive(Clone, Debug)]
pub struct Rendered {
    pub text: String,
    pub params: Vec<Param>,
    pub next: usize,
}

impl Expr {
    /// Create a fragment from text and its `$1..$n` parameters.
    pub fn new(text: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        Self {
            text: text.into(),
            params: params.into_iter().collect(),
        }
    }

    /// Create a fragment without parameters.
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
        }
    }

    /// The fragment text as written.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parameters as supplied.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Whether the text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        is_blank(&self.text)
    }

    /// Renumber placeholders so the first emitted one is `$start`.
    ///
    /// Lists are expanded in place, one slot per element; `DEFAULT` values
    /// are written as the keyword and take no slot. Parameters that the text
    /// never references are dropped, and a parameter referenced twice is
    /// bound twice.
    pub fn rewrite(&self, start: usize) -> BuildResult<Rendered> {
        if start < 1 {
            return Err(BuildError::NegativeOrZeroStartIndex);
        }

        let mut out = String::with_capacity(self.text.len() + 8);
        let mut params: Vec<Param> = Vec::with_capacity(self.params.len());
        let mut chars = self.text.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                ESCAPE => {
                    out.push(ch);
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                QUOTE => {
                    out.push(ch);
                    copy_quoted(&mut chars, &mut out)?;
                }
                MARKER => {
                    let mut digits = String::new();
                    while let Some(d) = chars.next_if(char::is_ascii_digit) {
                        digits.push(d);
                    }
                    if digits.is_empty() {
                        return Err(BuildError::InvalidPlaceholder);
                    }

                    match self.lookup(&digits)? {
                        Value::Scalar(p) => {
                            push_placeholder(&mut out, start + params.len());
                            params.push(p.clone());
                        }
                        Value::List { items, .. } => {
                            if items.is_empty() {
                                return Err(BuildError::EmptySliceParameter);
                            }
                            for (i, item) in items.iter().enumerate() {
                                if i > 0 {
                                    out.push(',');
                                }
                                push_placeholder(&mut out, start + params.len());
                                params.push(item.clone());
                            }
                        }
                        Value::Default => out.push_str("DEFAULT"),
                    }
                }
                _ => out.push(ch),
            }
        }

        let next = start + params.len();
        Ok(Rendered {
            text: out,
            params,
            next,
        })
    }

    /// Resolve a one-based placeholder index against the supplied params.
    fn lookup(&self, digits: &str) -> BuildResult<&Value> {
        let invalid = || BuildError::InvalidPlaceholderIndex(digits.to_string());
        let idx: usize = digits.parse().map_err(|_| invalid())?;
        if idx < 1 {
            return Err(invalid());
        }
        self.params.get(idx - 1).ok_or_else(invalid)
    }
}

/// Copy a quoted literal up to and including its closing quote.
fn copy_quoted(chars: &mut Peekable<Chars<'_>>, out: &mut String) -> BuildResult<()> {
    while let Some(ch) = chars.next() {
        out.push(ch);
        match ch {
            ESCAPE => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            QUOTE => return Ok(()),
            _ => {}
        }
    }
    Err(BuildError::MissingClosingQuote)
}

fn push_placeholder(out: &mut String, idx: usize) {
    out.push(MARKER);
    out.push_str(&idx.to_string());
}

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// How the members of an [`ExprList`] are joined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Joiner {
    /// `(a) AND (b)`, for WHERE / HAVING.
    And,
    /// `a, b`, for column lists and SET.
    Comma,
    /// `a b`, for FROM parts and joins.
    Space,
}

/// The fragments of one clause, renumbered together.
#[derive(Clone, Debug, Default)]
pub struct ExprList {
    exprs: Vec<Expr>,
}

impl ExprList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self { exprs: Vec::new() }
    }

    /// Append a fragment.
    pub fn push(&mut self, expr: Expr) {
        self.exprs.push(expr);
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    /// Iterate the fragments as written.
    pub fn iter(&self) -> impl Iterator<Item = &Expr> {
        self.exprs.iter()
    }

    /// Rewrite every fragment, threading the next free index from one to the next.
    ///
    /// Fails as a whole on the first bad fragment.
    pub fn build(&self, start: usize) -> BuildResult<Vec<Rendered>> {
        if start < 1 {
            return Err(BuildError::NegativeOrZeroStartIndex);
        }

        let mut next = start;
        let mut out = Vec::with_capacity(self.exprs.len());
        for expr in &self.exprs {
            if expr.is_blank() {
                return Err(BuildError::EmptyExpressionText);
            }
            let rendered = expr.rewrite(next)?;
            next = rendered.next;
            out.push(rendered);
        }
        Ok(out)
    }

    /// Build and join into one clause body.
    pub fn render(&self, start: usize, joiner: Joiner) -> BuildResult<Rendered> {
        let parts = self.build(start)?;

        let mut text = String::new();
        let mut params = Vec::new();
        for (i, part) in parts.into_iter().enumerate() {
            match joiner {
                Joiner::And => {
                    if i > 0 {
                        text.push_str(" AND ");
                    }
                    text.push('(');
                    text.push_str(&part.text);
                    text.push(')');
                }
                Joiner::Comma | Joiner::Space => {
                    if i > 0 {
                        text.push_str(if joiner == Joiner::Comma { ", " } else { " " });
                    }
                    text.push_str(&part.text);
                }
            }
            params.extend(part.params);
        }

        let next = start + params.len();
        Ok(Rendered { text, params, next })
    }
}

impl FromIterator<Expr> for ExprList {
    fn from_iter<I: IntoIterator<Item = Expr>>(iter: I) -> Self {
        Self {
            exprs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;

    fn shown(params: &[Param]) -> Vec<String> {
        params.iter().map(|p| format!("{:?}", p)).collect()
    }

    #[test]
    fn test_plain_text_is_untouched() {
        let r = Expr::new("name = 'user'", params![]).rewrite(1).unwrap();
        assert_eq!(r.text, "name = 'user'");
        assert!(r.params.is_empty());
        assert_eq!(r.next, 1);
    }

    #[test]
    fn test_quoted_and_escaped_placeholders_are_skipped() {
        let expr = Expr::new(r"where name='vasya \$1' and \$5 and $1 and $2", params!["a", "b"]);
        let r = expr.rewrite(10).unwrap();
        assert_eq!(r.text, r"where name='vasya \$1' and \$5 and $10 and $11");
        assert_eq!(shown(&r.params), vec!["\"a\"", "\"b\""]);
        assert_eq!(r.next, 12);
    }

    #[test]
    fn test_dollar_inside_quotes_is_literal() {
        let r = Expr::new("note = 'cost is $1' AND id = $1", params![7])
            .rewrite(4)
            .unwrap();
        assert_eq!(r.text, "note = 'cost is $1' AND id = $4");
        assert_eq!(r.next, 5);
    }

    #[test]
    fn test_doubled_quote_stays_inside_literal() {
        let r = Expr::new("name = 'it''s $1' AND x = $1", params![1])
            .rewrite(1)
            .unwrap();
        assert_eq!(r.text, "name = 'it''s $1' AND x = $1");
        assert_eq!(r.params.len(), 1);
    }

    #[test]
    fn test_escaped_quote_does_not_close_literal() {
        let r = Expr::new(r"a = 'x\' $1' AND b = $1", params![true])
            .rewrite(2)
            .unwrap();
        assert_eq!(r.text, r"a = 'x\' $1' AND b = $2");
    }

    #[test]
    fn test_trailing_escape_passes_through() {
        let r = Expr::new(r"a = $1 \", params![1]).rewrite(1).unwrap();
        assert_eq!(r.text, r"a = $1 \");
    }

    #[test]
    fn test_multibyte_text_is_preserved() {
        let r = Expr::new("имя = $1 AND note = 'ü $2'", params!["x"])
            .rewrite(3)
            .unwrap();
        assert_eq!(r.text, "имя = $3 AND note = 'ü $2'");
    }

    #[test]
    fn test_multi_digit_placeholders() {
        let values: Vec<Value> = (1..=12).map(|i: i32| crate::IntoValue::into_value(i)).collect();
        let r = Expr::new("a = $12 AND b = $1", values).rewrite(100).unwrap();
        assert_eq!(r.text, "a = $100 AND b = $101");
        assert_eq!(shown(&r.params), vec!["12", "1"]);
    }

    #[test]
    fn test_repeated_placeholder_binds_twice() {
        let r = Expr::new("a = $1 OR b = $1", params![5]).rewrite(1).unwrap();
        assert_eq!(r.text, "a = $1 OR b = $2");
        assert_eq!(shown(&r.params), vec!["5", "5"]);
        assert_eq!(r.next, 3);
    }

    #[test]
    fn test_in_expansion() {
        let r = Expr::new("id IN ($1)", params![vec![1, 2, 3]])
            .rewrite(3)
            .unwrap();
        assert_eq!(r.text, "id IN ($3,$4,$5)");
        assert_eq!(shown(&r.params), vec!["1", "2", "3"]);
        assert_eq!(r.next, 6);
    }

    #[test]
    fn test_in_expansion_after_scalar() {
        let r = Expr::new("name=$1 AND id IN ($2)", params!["name", vec![1, 2, 3]])
            .rewrite(5)
            .unwrap();
        assert_eq!(r.text, "name=$5 AND id IN ($6,$7,$8)");
        assert_eq!(r.next, 9);
    }

    #[test]
    fn test_multi_slice_interleaving() {
        let expr = Expr::new(
            "name=$1 AND age=$3 AND last_name=$4 AND id IN ($2)",
            params!["name", vec![1, 2, 3], 42, "last"],
        );
        let r = expr.rewrite(7).unwrap();
        assert_eq!(r.text, "name=$7 AND age=$8 AND last_name=$9 AND id IN ($10,$11,$12)");
        assert_eq!(
            shown(&r.params),
            vec!["\"name\"", "42", "\"last\"", "1", "2", "3"]
        );
        assert_eq!(r.next, 13);
    }

    #[test]
    fn test_byte_string_is_not_expanded() {
        let expr = Expr::new(
            "hash=$2 AND names IN ($1)",
            params![vec![1, 2], b"bytes".to_vec()],
        );
        let r = expr.rewrite(9).unwrap();
        assert_eq!(r.text, "hash=$9 AND names IN ($10,$11)");
        assert_eq!(r.params.len(), 3);
        assert_eq!(format!("{:?}", r.params[0]), format!("{:?}", b"bytes".to_vec()));
        assert_eq!(r.next, 12);
    }

    #[test]
    fn test_two_lists() {
        let r = Expr::new(
            "id IN ($1) AND other_id IN ($2)",
            params![vec![1, 2, 3], vec![4, 5]],
        )
        .rewrite(1)
        .unwrap();
        assert_eq!(r.text, "id IN ($1,$2,$3) AND other_id IN ($4,$5)");
        assert_eq!(r.next, 6);

        let r = Expr::new("id IN ($1) AND other_id IN ($2)", params![vec![1, 2], vec![3]])
            .rewrite(1)
            .unwrap();
        assert_eq!(r.text, "id IN ($1,$2) AND other_id IN ($3)");
        assert_eq!(r.next, 4);
    }

    #[test]
    fn test_default_value_renders_keyword() {
        let r = Expr::new("a = $1, b = $2", params![crate::Value::Default, 3])
            .rewrite(1)
            .unwrap();
        assert_eq!(r.text, "a = DEFAULT, b = $1");
        assert_eq!(r.next, 2);
    }

    #[test]
    fn test_rewrite_is_deterministic_and_non_destructive() {
        let expr = Expr::new("x = $1 AND y IN ($2)", params![1, vec![2, 3]]);
        let a = expr.rewrite(4).unwrap();
        let b = expr.rewrite(4).unwrap();
        assert_eq!(a.text, b.text);
        assert_eq!(shown(&a.params), shown(&b.params));
        assert_eq!(expr.text(), "x = $1 AND y IN ($2)");
    }

    #[test]
    fn test_empty_slice_is_rejected() {
        let err = Expr::new("name=$1 AND id IN ($2)", params!["name", Vec::<i32>::new()])
            .rewrite(1)
            .unwrap_err();
        assert_eq!(err, BuildError::EmptySliceParameter);
        assert_eq!(err.to_string(), "empty slice passed as 'IN' parameter");
    }

    #[test]
    fn test_index_out_of_range() {
        let err = Expr::new("id IN ($1) AND other_id IN ($2)", params![vec![1, 2, 3]])
            .rewrite(1)
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid placeholder index: 2");

        let err = Expr::new("a = $0", params![1]).rewrite(1).unwrap_err();
        assert_eq!(err, BuildError::InvalidPlaceholderIndex("0".to_string()));

        let err = Expr::new("a = $99999999999999999999999", params![1])
            .rewrite(1)
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidPlaceholderIndex(_)));
    }

    #[test]
    fn test_missing_digits() {
        let err = Expr::new("$ name = '' and $5 and true", params![])
            .rewrite(1)
            .unwrap_err();
        assert_eq!(err, BuildError::InvalidPlaceholder);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = Expr::new("name = '' and ' and", params![])
            .rewrite(1)
            .unwrap_err();
        assert_eq!(err, BuildError::MissingClosingQuote);
        assert_eq!(err.to_string(), "missing closing quote");
    }

    #[test]
    fn test_list_rejects_zero_start() {
        let list: ExprList = [Expr::raw("and")].into_iter().collect();
        assert_eq!(list.build(0).unwrap_err(), BuildError::NegativeOrZeroStartIndex);
        assert_eq!(
            BuildError::NegativeOrZeroStartIndex.to_string(),
            "start index should be >= 1"
        );
    }

    #[test]
    fn test_list_rejects_blank_fragment() {
        let list: ExprList = [Expr::raw("a = 1"), Expr::raw("   ")].into_iter().collect();
        assert_eq!(list.build(1).unwrap_err(), BuildError::EmptyExpressionText);
    }

    #[test]
    fn test_list_threads_index() {
        let mut list = ExprList::new();
        list.push(Expr::new("a = $1", params![1]));
        list.push(Expr::new("b IN ($1)", params![vec![2, 3]]));
        list.push(Expr::new("c = $2 OR c = $1", params![4, 5]));

        let parts = list.build(3).unwrap();
        let texts: Vec<_> = parts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["a = $3", "b IN ($4,$5)", "c = $6 OR c = $7"]);
        assert_eq!(parts[2].next, 8);
    }

    #[test]
    fn test_list_failure_is_all_or_nothing() {
        let mut list = ExprList::new();
        list.push(Expr::new("a = $1", params![1]));
        list.push(Expr::new("b = $2", params![2]));
        assert!(list.build(1).is_err());
    }

    #[test]
    fn test_render_joiners() {
        let mut list = ExprList::new();
        list.push(Expr::new("x=$1", params![5]));
        list.push(Expr::new("y IN ($1)", params![vec![1, 2]]));

        let and = list.render(1, Joiner::And).unwrap();
        assert_eq!(and.text, "(x=$1) AND (y IN ($2,$3))");
        assert_eq!(shown(&and.params), vec!["5", "1", "2"]);
        assert_eq!(and.next, 4);

        let comma = list.render(2, Joiner::Comma).unwrap();
        assert_eq!(comma.text, "x=$2, y IN ($3,$4)");
    }
}
