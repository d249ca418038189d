//! Transaction helper.
//!
//! Transactions are ordinary [`GenericClient`](crate::GenericClient)s, so the
//! [`Executor`](crate::Executor) runs built statements inside them unchanged.
//! [`transaction!`](crate::transaction) wraps a block with begin, commit on
//! `Ok` and rollback on `Err`.
//!
//! # Example
//!
//! ```ignore
//! use prequel::{params, update, Executor, PrequelResult};
//!
//! # async fn demo(client: &mut tokio_postgres::Client, exec: &Executor) -> PrequelResult<()> {
//! prequel::transaction!(client, tx, {
//!     exec.execute(&tx, &update("accounts").set("balance = balance - $1", params![100_i64]).and_where("id = $1", params![1_i64])).await?;
//!     exec.execute(&tx, &update("accounts").set("balance = balance + $1", params![100_i64]).and_where("id = $1", params![2_i64])).await?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

/// Runs the given block inside a database transaction.
///
/// - Begins a transaction via `$client.transaction().await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`; a failed rollback is folded into the returned error.
///
/// The block must evaluate to `prequel::PrequelResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($client:expr, $tx:ident, $body:block) => {{
        let $tx = ($client)
            .transaction()
            .await
            .map_err($crate::PrequelError::from_db_error)?;

        let __prequel_tx_result: $crate::PrequelResult<_> = async { $body }.await;
        match __prequel_tx_result {
            Ok(value) => {
                $tx.commit()
                    .await
                    .map_err($crate::PrequelError::from_db_error)?;
                Ok(value)
            }
            Err(error) => match $tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::PrequelError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}
