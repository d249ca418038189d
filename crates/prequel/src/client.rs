//! Generic client trait over connections, transactions and pooled clients.

use crate::error::{PrequelError, PrequelResult};
use std::future::Future;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A trait that unifies database clients and transactions.
///
/// Executor methods accept any `GenericClient`, so the same call works on a
/// plain connection, inside a transaction, or on a pooled client.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = PrequelResult<Vec<Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = PrequelResult<u64>> + Send;

    /// Execute a query and return the **first** row.
    ///
    /// - 0 rows: returns [`PrequelError::NotFound`]
    /// - 1 or more rows: returns the first one
    fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = PrequelResult<Row>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            rows.into_iter()
                .next()
                .ok_or_else(|| PrequelError::not_found("Expected one row, got none"))
        }
    }

    /// Execute a query and return the first row, if any.
    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = PrequelResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }
}

/// Implement [`GenericClient`] for a type that derefs to a tokio-postgres handle.
macro_rules! impl_generic_client {
    ($ty:ty => $inner:ident) => {
        impl GenericClient for $ty {
            async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> PrequelResult<Vec<Row>> {
                tokio_postgres::$inner::query(self, sql, params)
                    .await
                    .map_err(PrequelError::from_db_error)
            }

            async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> PrequelResult<u64> {
                tokio_postgres::$inner::execute(self, sql, params)
                    .await
                    .map_err(PrequelError::from_db_error)
            }
        }
    };
}

impl_generic_client!(tokio_postgres::Client => Client);
impl_generic_client!(tokio_postgres::Transaction<'_> => Transaction);

#[cfg(feature = "pool")]
impl_generic_client!(deadpool_postgres::Client => Client);
#[cfg(feature = "pool")]
impl_generic_client!(deadpool_postgres::ClientWrapper => Client);
#[cfg(feature = "pool")]
impl_generic_client!(deadpool_postgres::Transaction<'_> => Transaction);

impl<C: GenericClient> GenericClient for &C {
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = PrequelResult<Vec<Row>>> + Send {
        (**self).query(sql, params)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = PrequelResult<u64>> + Send {
        (**self).execute(sql, params)
    }

    fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = PrequelResult<Row>> + Send {
        (**self).query_one(sql, params)
    }

    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = PrequelResult<Option<Row>>> + Send {
        (**self).query_opt(sql, params)
    }
}
