//! End-to-end statements against an in-memory SQLite database.

use sqlx::sqlite::SqlitePoolOptions;
use tessera_core::{
    add_days, literal, value, year, Database, ExpressionExt, ForeignKeyJoin, Order, SqlValue,
};
use tessera_derive::Table;
use tessera_sqlite::{SqliteDialect, SqliteExecutor};

#[derive(Debug, Clone, PartialEq, Table)]
pub struct Salesperson {
    #[column(primary_key)]
    pub id: i64,
    pub first_name: String,
    pub surname: String,
}

#[derive(Debug, Clone, PartialEq, Table)]
pub struct Manufacturer {
    #[column(primary_key)]
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Table)]
pub struct Part {
    #[column(primary_key)]
    pub id: i64,
    pub name: String,
    #[column(references = "Manufacturer::id")]
    pub manufacturer_id: i64,
}

#[derive(Debug, Clone, PartialEq, Table)]
pub struct TopSeller {
    pub id: i64,
    pub first_name: String,
}

async fn setup() -> (Database, SqliteExecutor) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    let executor = SqliteExecutor::new(pool);
    for ddl in [
        "CREATE TABLE SALESPERSON (ID INTEGER PRIMARY KEY, FIRST_NAME TEXT NOT NULL, SURNAME TEXT NOT NULL)",
        "CREATE TABLE MANUFACTURER (ID INTEGER PRIMARY KEY, NAME TEXT NOT NULL)",
        "CREATE TABLE PART (ID INTEGER PRIMARY KEY, NAME TEXT NOT NULL, MANUFACTURER_ID INTEGER NOT NULL)",
    ] {
        executor.execute(ddl, &[]).await.unwrap();
    }
    executor
        .execute(
            "INSERT INTO SALESPERSON (ID, FIRST_NAME, SURNAME) VALUES \
             (1, 'James', 'Bond'), (2, 'Eve', 'Moneypenny'), (3, 'Jimmy', 'Bond')",
            &[],
        )
        .await
        .unwrap();
    executor
        .execute(
            "INSERT INTO MANUFACTURER (ID, NAME) VALUES (1, 'Acme'), (2, 'Globex')",
            &[],
        )
        .await
        .unwrap();
    executor
        .execute(
            "INSERT INTO PART (ID, NAME, MANUFACTURER_ID) VALUES (10, 'Anvil', 1), (11, 'Rocket', 1)",
            &[],
        )
        .await
        .unwrap();

    let db = Database::builder().dialect(SqliteDialect::new()).build();
    (db, executor)
}

#[tokio::test]
async fn test_select_where_first_name() {
    let (db, executor) = setup().await;
    let p = db.alias::<Salesperson>("p");
    let select = db
        .from(&p)
        .select(p.col(Salesperson::surname()))
        .where_clause(p.col(Salesperson::first_name()).eq("James"))
        .build()
        .unwrap();

    assert_eq!(select.single(&executor).await.unwrap(), "Bond");
}

#[tokio::test]
async fn test_self_join_finds_namesakes() {
    let (db, executor) = setup().await;
    let s1 = db.alias::<Salesperson>("s1");
    let s2 = db.alias::<Salesperson>("s2");
    let select = db
        .from(&s1)
        .join(&s2)
        .on(s2.col(Salesperson::surname()).eq(s1.col(Salesperson::surname())))
        .and(s2.col(Salesperson::id()).ne(s1.col(Salesperson::id())))
        .order_by(s1.col(Salesperson::id()), Order::Asc)
        .build()
        .unwrap();

    let pairs = select.list(&executor).await.unwrap();
    let names: Vec<(&str, &str)> = pairs
        .iter()
        .map(|(a, b)| (a.first_name.as_str(), b.first_name.as_str()))
        .collect();
    assert_eq!(names, vec![("James", "Jimmy"), ("Jimmy", "James")]);
}

#[tokio::test]
async fn test_union_ordered_by_position() {
    let (db, executor) = setup().await;
    let two = db.select_as(literal(2_i64), "two").build().unwrap();
    let three = db.select_as(value(3_i64), "three").build().unwrap();
    let select = db
        .select_as(value(1_i64), "one")
        .union(&two)
        .union_all(&three)
        .order_by_position(1, Order::Desc)
        .build()
        .unwrap();

    assert_eq!(
        select.sql().unwrap(),
        "select ? as one union select 2 as two union all select ? as three order by 1 desc"
    );
    assert_eq!(select.list(&executor).await.unwrap(), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_left_join_with_unmatched_parent() {
    let (db, executor) = setup().await;
    let m = db.alias::<Manufacturer>("m");
    let pt = db.alias::<Part>("pt");
    let select = db
        .from(&m)
        .left_join(&pt)
        .on_foreign_key(ForeignKeyJoin::to::<Manufacturer>())
        .order_by(m.col(Manufacturer::id()), Order::Asc)
        .build()
        .unwrap();

    let rows = select.list(&executor).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].1.as_ref().map(|p| p.manufacturer_id), Some(1));
    assert_eq!(rows[2].0.name, "Globex");
    assert_eq!(rows[2].1, None);
}

#[tokio::test]
async fn test_common_table_expression_and_paging() {
    let (db, executor) = setup().await;
    let p = db.alias::<Salesperson>("p");
    let body = db
        .from(&p)
        .select(p.col(Salesperson::id()))
        .comma(p.col(Salesperson::first_name()))
        .where_clause(p.col(Salesperson::surname()).eq("Bond"))
        .build()
        .unwrap();
    let top = db.with("top").as_select::<TopSeller, _>(&body).unwrap();
    let t = top.alias();
    let select = db
        .from(&t)
        .order_by(t.col(TopSeller::id()), Order::Asc)
        .page(1, 1)
        .build()
        .unwrap();

    assert!(select.sql().unwrap().ends_with("limit 1 offset 1"));
    let rows = select.list(&executor).await.unwrap();
    assert_eq!(
        rows,
        vec![TopSeller {
            id: 3,
            first_name: String::from("Jimmy"),
        }]
    );
}

#[tokio::test]
async fn test_date_functions() {
    let (db, executor) = setup().await;
    let select = db
        .select_as(year(add_days(value(String::from("2024-12-30")), value(5_i32))), "y")
        .build()
        .unwrap();

    assert_eq!(
        select.sql().unwrap(),
        "select cast(strftime('%Y', date(?, '+' || ? || ' days')) as integer) as y"
    );
    assert_eq!(
        select.args().unwrap(),
        vec![SqlValue::Text(String::from("2024-12-30")), SqlValue::Int(5)]
    );
    assert_eq!(select.single(&executor).await.unwrap(), 2025);
}
