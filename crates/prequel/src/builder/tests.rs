//! Cross-builder scenarios.

use crate::error::BuildError;
use crate::value::{Param, Value};
use crate::{
    Builder, default_or, delete, do_update, insert, params, raw, select, update, update_set,
};

fn shown(params: &[Param]) -> Vec<String> {
    params.iter().map(|p| format!("{:?}", p)).collect()
}

#[test]
fn test_end_to_end_select() {
    let built = select(["a", "b"])
        .from("t")
        .and_where("x=$1", params![5])
        .and_where("y IN ($1)", params![vec![1, 2]])
        .build()
        .unwrap();
    assert_eq!(built.sql, "SELECT a, b FROM t WHERE (x=$1) AND (y IN ($2,$3))");
    assert_eq!(shown(&built.params), vec!["5", "1", "2"]);
    assert_eq!(built.params_ref().len(), 3);
}

#[test]
fn test_cte_params_come_first() {
    let built = select(["*"])
        .and_where("owner = $1", params!["main"])
        .from("recent")
        .with("recent", select(["*"]).from("posts").and_where("age < $1", params![7]))
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "WITH recent AS (SELECT * FROM posts WHERE (age < $1)) SELECT * FROM recent WHERE (owner = $2)"
    );
    assert_eq!(shown(&built.params), vec!["7", "\"main\""]);
}

#[test]
fn test_placeholders_match_param_order() {
    let built = update("accounts")
        .with("hot", raw("SELECT id FROM accounts WHERE score > $1", params![90]))
        .columns(["tier"])
        .values(params!["gold"])
        .set("tags = array_append(tags, $1)", params!["vip"])
        .from("hot")
        .and_where("accounts.id = hot.id AND region IN ($1)", params![vec!["eu", "us"]])
        .returning(["accounts.id"])
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "WITH hot AS (SELECT id FROM accounts WHERE score > $1) UPDATE accounts SET tier = $2, \
         tags = array_append(tags, $3) FROM hot WHERE (accounts.id = hot.id AND region IN ($4,$5)) \
         RETURNING accounts.id"
    );
    assert_eq!(
        shown(&built.params),
        vec!["90", "\"gold\"", "\"vip\"", "\"eu\"", "\"us\""]
    );
}

#[test]
fn test_insert_with_conflict_update() {
    let built = insert("kv")
        .columns(["k", "v"])
        .values(params!["a", 1])
        .on_conflict(
            do_update()
                .target("(k)")
                .update(update_set().set("v = kv.v + $1", params![1]).set_excluded(["k"])),
        )
        .returning(["v"])
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "INSERT INTO kv (k, v) VALUES ($1, $2) ON CONFLICT (k) DO UPDATE SET v = kv.v + $3, k = EXCLUDED.k RETURNING v"
    );
}

#[test]
fn test_default_or_in_rows() {
    let id: i64 = 0;
    let name = "bob";
    let built = insert("users")
        .columns(["id", "name", "nick"])
        .values(params![default_or(id), default_or(name), default_or("")])
        .build()
        .unwrap();
    assert_eq!(built.sql, "INSERT INTO users (id, name, nick) VALUES (DEFAULT, $1, DEFAULT)");
    assert_eq!(shown(&built.params), vec!["\"bob\""]);
}

#[test]
fn test_nested_error_short_circuits() {
    let err = select(["*"])
        .from_select(select(["*"]).from("t").and_where("a = $1", params![Vec::<i32>::new()]), "s")
        .build()
        .unwrap_err();
    assert_eq!(err, BuildError::EmptySliceParameter);

    let err = delete("t")
        .with("x", select(["*"]).from("u").and_where("name = 'oops", params![]))
        .build()
        .unwrap_err();
    assert_eq!(err, BuildError::MissingClosingQuote);
}

#[test]
fn test_builders_are_shareable() {
    fn assert_send_sync<T: Send + Sync>(_: &T) {}
    let b = select(["id"]).from("t").and_where("id = $1", params![Value::scalar(1i64)]);
    assert_send_sync(&b);

    let shared = std::sync::Arc::new(b);
    let handle = {
        let shared = shared.clone();
        std::thread::spawn(move || shared.build().map(|b| b.sql))
    };
    let from_thread = handle.join().unwrap().unwrap();
    assert_eq!(from_thread, shared.to_sql().unwrap());
}
