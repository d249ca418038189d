//! Parameter values bound to `$N` placeholders.
//!
//! Every value handed to a builder becomes a [`Value`]:
//! - [`Value::Scalar`] occupies one placeholder slot,
//! - [`Value::List`] is expanded into `$a,$b,...` when referenced from an
//!   expression (the `IN ($1)` convention) and bound as one array when used as
//!   an INSERT row value,
//! - [`Value::Default`] renders the `DEFAULT` keyword and binds nothing.
//!
//! Byte strings (`Vec<u8>`, `&[u8]`) are always scalars (`bytea`), never lists.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly parameter wrapper using Arc.
#[derive(Clone)]
pub struct Param(pub(crate) Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Create a new parameter from any ToSql value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Get a reference to the inner value as a ToSql trait object.
    pub fn as_sql(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// A value destined for a placeholder slot, or the `DEFAULT` marker.
#[derive(Clone, Debug)]
pub enum Value {
    /// One bound parameter.
    Scalar(Param),
    /// A sequence: `items` for IN expansion, `array` when bound whole.
    List { items: Vec<Param>, array: Param },
    /// Emit `DEFAULT` instead of a placeholder.
    Default,
}

impl Value {
    /// Wrap any ToSql value as a scalar, bypassing list detection.
    pub fn scalar<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Value::Scalar(Param::new(value))
    }

    /// Build a list value from a vector of scalars.
    pub fn list<T: SqlScalar + Clone>(values: Vec<T>) -> Self {
        let items = values.iter().cloned().map(Param::new).collect();
        Value::List {
            items,
            array: Param::new(values),
        }
    }

    /// Whether this is the `DEFAULT` marker.
    pub fn is_default(&self) -> bool {
        matches!(self, Value::Default)
    }

    /// The parameter to bind when this value fills one column of a row.
    ///
    /// Lists bind as a single array; `DEFAULT` binds nothing.
    pub(crate) fn row_param(&self) -> Option<Param> {
        match self {
            Value::Scalar(p) => Some(p.clone()),
            Value::List { array, .. } => Some(array.clone()),
            Value::Default => None,
        }
    }

    /// Same value with lists collapsed to their array form.
    pub(crate) fn as_row_value(&self) -> Value {
        match self.row_param() {
            Some(p) => Value::Scalar(p),
            None => Value::Default,
        }
    }
}

/// Types that bind as a single Postgres scalar (or a NULL-able one).
///
/// `u8` is deliberately absent so that `Vec<u8>` stays a `bytea` scalar.
pub trait SqlScalar: ToSql + Send + Sync + 'static {}

/// Conversion into a [`Value`]; used by [`params!`](crate::params).
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for Param {
    fn into_value(self) -> Value {
        Value::Scalar(self)
    }
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SqlScalar for $ty {}

            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::Scalar(Param::new(self))
                }
            }
        )*
    };
}

impl_scalar!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u32,
    f32,
    f64,
    String,
    &'static str,
    Vec<u8>,
    &'static [u8],
    chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::FixedOffset>,
    chrono::DateTime<chrono::Local>,
    uuid::Uuid,
    serde_json::Value,
);

#[cfg(feature = "rust_decimal")]
impl_scalar!(rust_decimal::Decimal);

impl<T: SqlScalar> SqlScalar for Option<T> {}

impl<T: SqlScalar> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        Value::Scalar(Param::new(self))
    }
}

impl<T: SqlScalar + Clone> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::list(self)
    }
}

impl<T: SqlScalar + Clone, const N: usize> IntoValue for [T; N] {
    fn into_value(self) -> Value {
        Value::list(self.to_vec())
    }
}

/// Build a `Vec<Value>` from heterogeneous values.
///
/// ```ignore
/// let p = prequel::params![42, "alice", vec![1, 2, 3], prequel::Value::Default];
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::IntoValue::into_value($value)),+]
    };
}

/// Zero-ness test used to decide whether a value collapses to `DEFAULT`.
pub trait IsZero {
    fn is_zero(&self) -> bool;
}

macro_rules! impl_is_zero_num {
    ($($ty:ty => $zero:expr),* $(,)?) => {
        $(
            impl IsZero for $ty {
                fn is_zero(&self) -> bool {
                    *self == $zero
                }
            }
        )*
    };
}

impl_is_zero_num!(
    i8 => 0,
    i16 => 0,
    i32 => 0,
    i64 => 0,
    u32 => 0,
    f32 => 0.0,
    f64 => 0.0,
);

impl IsZero for bool {
    fn is_zero(&self) -> bool {
        !*self
    }
}

impl IsZero for str {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl IsZero for String {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: IsZero + ?Sized> IsZero for &T {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl<T: IsZero> IsZero for Option<T> {
    fn is_zero(&self) -> bool {
        match self {
            None => true,
            Some(v) => v.is_zero(),
        }
    }
}

impl<T> IsZero for [T] {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsZero for Vec<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T, const N: usize> IsZero for [T; N] {
    fn is_zero(&self) -> bool {
        N == 0
    }
}

impl<K, V, S> IsZero for HashMap<K, V, S> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> IsZero for BTreeMap<K, V> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl IsZero for uuid::Uuid {
    fn is_zero(&self) -> bool {
        self.is_nil()
    }
}

impl IsZero for serde_json::Value {
    fn is_zero(&self) -> bool {
        use serde_json::Value as Json;
        match self {
            Json::Null => true,
            Json::Bool(b) => !*b,
            Json::Number(n) => n.as_f64() == Some(0.0),
            Json::String(s) => s.is_empty(),
            Json::Array(a) => a.is_empty(),
            Json::Object(o) => o.is_empty(),
        }
    }
}

#[cfg(feature = "rust_decimal")]
impl IsZero for rust_decimal::Decimal {
    fn is_zero(&self) -> bool {
        rust_decimal::Decimal::is_zero(self)
    }
}

/// `DEFAULT` when `value` is zero-valued, otherwise the value itself.
///
/// ```ignore
/// insert("users").columns(["id", "name"]).values(params![default_or(id), name]);
/// ```
pub fn default_or<T: IsZero + IntoValue>(value: T) -> Value {
    if value.is_zero() {
        Value::Default
    } else {
        value.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_macro_classifies_values() {
        let values = params![1, "name", vec![1, 2, 3], b"raw".to_vec(), Value::Default];
        assert!(matches!(values[0], Value::Scalar(_)));
        assert!(matches!(values[1], Value::Scalar(_)));
        assert!(matches!(&values[2], Value::List { items, .. } if items.len() == 3));
        assert!(matches!(values[3], Value::Scalar(_)));
        assert!(values[4].is_default());
    }

    #[test]
    fn test_empty_params_macro() {
        let values = params![];
        assert!(values.is_empty());
    }

    #[test]
    fn test_list_binds_as_array_in_rows() {
        let value = Value::list(vec![1i32, 2]);
        assert_eq!(format!("{:?}", value.row_param().unwrap()), "[1, 2]");
        assert!(Value::Default.row_param().is_none());
    }

    #[test]
    fn test_param_debug_forwards_to_value() {
        assert_eq!(format!("{:?}", Param::new("alice")), "\"alice\"");
        assert_eq!(format!("{:?}", Param::new(Some(5i64))), "Some(5)");
    }

    #[test]
    fn test_zero_values_collapse_to_default() {
        assert!(default_or(0).is_default());
        assert!(default_or(0.0f64).is_default());
        assert!(default_or("").is_default());
        assert!(default_or(String::new()).is_default());
        assert!(default_or(None::<i32>).is_default());
        assert!(default_or(Some(0i64)).is_default());
        assert!(default_or(Vec::<i32>::new()).is_default());
        assert!(default_or(uuid::Uuid::nil()).is_default());
        assert!(default_or(serde_json::json!({})).is_default());
        assert!(HashMap::<String, i32>::new().is_zero());
        assert!(BTreeMap::<String, i32>::new().is_zero());
    }

    #[test]
    fn test_non_zero_values_are_kept() {
        assert!(matches!(default_or(7), Value::Scalar(_)));
        assert!(matches!(default_or("bob"), Value::Scalar(_)));
        assert!(matches!(default_or(Some(3i32)), Value::Scalar(_)));
        assert!(matches!(default_or(vec![1, 2]), Value::List { .. }));
        assert!(matches!(default_or(serde_json::json!({"a": 1})), Value::Scalar(_)));
        assert!(!HashMap::from([("a", 1)]).is_zero());
    }
}
