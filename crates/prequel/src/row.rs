//! Row mapping traits.

use crate::error::{PrequelError, PrequelResult};
use tokio_postgres::Row;
use tokio_postgres::types::FromSqlOwned;

/// Convert a database row into a Rust value.
///
/// ```ignore
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> PrequelResult<Self> {
///         Ok(Self {
///             id: row.try_get_column("id")?,
///             name: row.try_get_column("name")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> PrequelResult<Self>;
}

/// Typed column access with [`PrequelError::Decode`] errors.
pub trait RowExt {
    /// Get a column by name.
    fn try_get_column<T: FromSqlOwned>(&self, column: &str) -> PrequelResult<T>;

    /// Get a column by position.
    fn try_get_index<T: FromSqlOwned>(&self, idx: usize) -> PrequelResult<T>;
}

impl RowExt for Row {
    fn try_get_column<T: FromSqlOwned>(&self, column: &str) -> PrequelResult<T> {
        self.try_get(column)
            .map_err(|e| PrequelError::decode(column, e.to_string()))
    }

    fn try_get_index<T: FromSqlOwned>(&self, idx: usize) -> PrequelResult<T> {
        self.try_get(idx)
            .map_err(|e| PrequelError::decode(format!("#{}", idx), e.to_string()))
    }
}

// Tuples map columns by position, e.g. `fetch_all::<(i64, String)>`.
macro_rules! impl_from_row_tuple {
    ($($ty:ident => $idx:tt),+) => {
        impl<$($ty: FromSqlOwned),+> FromRow for ($($ty,)+) {
            fn from_row(row: &Row) -> PrequelResult<Self> {
                Ok(($(row.try_get_index::<$ty>($idx)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(A => 0);
impl_from_row_tuple!(A => 0, B => 1);
impl_from_row_tuple!(A => 0, B => 1, C => 2);
impl_from_row_tuple!(A => 0, B => 1, C => 2, D => 3);
impl_from_row_tuple!(A => 0, B => 1, C => 2, D => 3, E => 4);
impl_from_row_tuple!(A => 0, B => 1, C => 2, D => 3, E => 4, F => 5);
