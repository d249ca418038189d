//! # prequel
//!
//! A PostgreSQL statement builder that stays close to hand-written SQL.
//!
//! ## Features
//!
//! - **SQL fragments**: every clause is a piece of SQL with its own local
//!   `$1..$n` placeholders
//! - **One numbering**: building merges fragments and nested statements into
//!   a single `$1..$N` sequence with parameters in matching order
//! - **IN lists**: a sequence bound to `$k` expands to `$a,$b,...`
//! - **DEFAULT**: [`Value::Default`] and [`default_or`] emit the `DEFAULT`
//!   keyword instead of a placeholder
//! - **Composable**: CTEs, sub-selects, `UNION` and `ON CONFLICT` actions take
//!   any [`Builder`]
//! - **Runs anywhere**: [`Executor`] accepts a connection, a transaction or a
//!   pooled client through [`GenericClient`]
//!
//! ```ignore
//! use prequel::{params, select, upsert, Builder, Executor};
//!
//! let built = select(["a", "b"])
//!     .from("t")
//!     .and_where("x = $1", params![5])
//!     .and_where("y IN ($1)", params![vec![1, 2]])
//!     .build()?;
//! assert_eq!(built.sql, "SELECT a, b FROM t WHERE (x = $1) AND (y IN ($2,$3))");
//!
//! let exec = Executor::new();
//! exec.execute(
//!     &client,
//!     &upsert("kv").columns(["k", "v"]).values(params!["a", 1]).target("(k)", params![]),
//! )
//! .await?;
//! ```

pub mod builder;
pub mod client;
pub mod error;
pub mod executor;
pub mod expr;
pub mod log;
pub mod row;
pub mod transaction;
pub mod value;
pub mod with;

pub use builder::{
    Builder, Built, Conflict, ConflictAction, Delete, Insect, Insert, Raw, Select, Update, Upsert,
    delete, do_nothing, do_update, insect, insert, raw, select, update, update_set, upsert,
};
pub use client::GenericClient;
pub use error::{BuildError, BuildResult, PrequelError, PrequelResult};
pub use executor::{Executor, ExecutorConfig};
pub use expr::{Expr, ExprList, Joiner, Rendered};
pub use log::{NoopLogger, QueryEvent, QueryLogger, QueryOutcome, QueryType, TracingLogger};
pub use row::{FromRow, RowExt};
pub use value::{IntoValue, IsZero, Param, SqlScalar, Value, default_or};
pub use with::WithList;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config, create_pool_with_manager_config};
