//! Compile-only tests for the executor surface.
//!
//! These tests verify that built statements can be run on every client kind.
//! They do NOT execute against a database.

#![allow(dead_code)]

use prequel::{
    Builder, Executor, FromRow, GenericClient, PrequelResult, RowExt, params, select, update,
};
use tokio_postgres::Row;

#[derive(Debug)]
struct User {
    id: i64,
    name: String,
}

impl FromRow for User {
    fn from_row(row: &Row) -> PrequelResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            name: row.try_get_column("name")?,
        })
    }
}

async fn load_users(exec: &Executor, conn: &impl GenericClient) -> PrequelResult<Vec<User>> {
    exec.fetch_all(conn, &select(["id", "name"]).from("users").order_by("id"))
        .await
}

async fn rename(exec: &Executor, conn: &impl GenericClient, id: i64, name: &'static str) -> PrequelResult<u64> {
    let stmt = update("users")
        .columns(["name"])
        .values(params![name])
        .and_where("id = $1", params![id]);
    exec.execute(conn, &stmt).await
}

async fn run_dyn(exec: &Executor, conn: &impl GenericClient, stmt: &dyn Builder) -> PrequelResult<Vec<Row>> {
    exec.query(conn, stmt).await
}

async fn on_every_client(exec: &Executor, client: &mut tokio_postgres::Client) -> PrequelResult<()> {
    load_users(exec, client).await?;
    load_users(exec, &&*client).await?;

    let tx = client.transaction().await?;
    rename(exec, &tx, 1, "alice").await?;
    tx.commit().await?;
    Ok(())
}

#[cfg(feature = "pool")]
async fn on_pool(exec: &Executor, pool: &deadpool_postgres::Pool) -> PrequelResult<Option<User>> {
    let client = pool.get().await?;
    exec.fetch_opt(&client, &select(["id", "name"]).from("users").limit(1))
        .await
}

fn assert_send<T: Send>(_: &T) {}

#[test]
fn compile_executor_futures_are_send() {
    let _ = |exec: &'static Executor, client: &'static tokio_postgres::Client| {
        assert_send(&load_users(exec, client));
        assert_send(&rename(exec, client, 1, "bob"));
    };
}

#[test]
fn compile_builders_are_object_safe() {
    let stmts: Vec<Box<dyn Builder>> = vec![
        Box::new(select(["1"])),
        Box::new(update("t").set("a = a + $1", params![1])),
        Box::new(prequel::raw("SELECT $1", params![true])),
    ];
    let sql: Vec<_> = stmts.iter().map(|s| s.to_sql().unwrap()).collect();
    assert_eq!(sql, ["SELECT 1", "UPDATE t SET a = a + $1", "SELECT $1"]);
}
