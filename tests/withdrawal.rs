//! Database-backed tests for the withdrawal ledger. They need a running
//! Postgres reachable via `DATABASE_URL` and are ignored by default:
//!
//! ```text
//! DATABASE_URL=postgres://... cargo test --test withdrawal -- --ignored
//! ```

use rust_decimal::Decimal;
use sqlx::PgPool;

use stock_api::egresos::repo::{self as egresos, EgresoError};
use stock_api::stock::dto::ItemInput;
use stock_api::stock::repo as stock;

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
    let db = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("run migrations");
    db
}

fn reloj(stock: i32, min_stock: i32) -> ItemInput {
    ItemInput {
        sku: Some("TEST-SKU".into()),
        marca: Some("Test".into()),
        nombre: Some("Reloj de prueba".into()),
        id_categoria: None,
        categoria: Some("Relojes".into()),
        stock: Some(stock),
        min_stock: Some(min_stock),
        precio: Decimal::new(19900, 2),
        es_activo: Some(true),
        nombre_imagen: None,
        url_imagen: None,
        maneja_peso: None,
    }
}

async fn ledger_rows(db: &PgPool, item_id: i32) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM egresos WHERE item_id = $1")
        .bind(item_id)
        .fetch_one(db)
        .await
        .expect("count ledger rows")
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn withdraw_decrements_stock_and_records_exactly_one_ledger_row() {
    let db = pool().await;
    let item = stock::create(&db, &reloj(5, 2)).await.expect("create item");

    let egreso = egresos::withdraw(&db, item.id, 3, Some("Venta"))
        .await
        .expect("withdraw");
    assert_eq!(egreso.item_id, item.id);
    assert_eq!(egreso.cantidad, 3);

    let after = stock::find(&db, item.id)
        .await
        .expect("find")
        .expect("item still exists");
    assert_eq!(after.stock, Some(2));
    // 2 <= 2: the withdrawal flipped the item to low stock.
    assert!(after.is_low_stock());
    assert_eq!(ledger_rows(&db, item.id).await, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn insufficient_stock_leaves_stock_and_ledger_unchanged() {
    let db = pool().await;
    let item = stock::create(&db, &reloj(2, 2)).await.expect("create item");

    let err = egresos::withdraw(&db, item.id, 3, Some("Venta"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EgresoError::StockInsuficiente {
            actual: 2,
            solicitado: 3
        }
    ));

    let after = stock::find(&db, item.id)
        .await
        .expect("find")
        .expect("item still exists");
    assert_eq!(after.stock, Some(2));
    assert_eq!(ledger_rows(&db, item.id).await, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn failed_ledger_insert_rolls_back_the_decrement() {
    let db = pool().await;
    let item = stock::create(&db, &reloj(5, 0)).await.expect("create item");

    // Same statements the withdrawal runs, but with a ledger insert that
    // violates the foreign key after the decrement succeeded.
    let mut tx = db.begin().await.expect("begin");
    let updated = sqlx::query(
        "UPDATE producto SET stock = COALESCE(stock, 0) - $1 \
         WHERE id = $2 AND COALESCE(stock, 0) >= $1",
    )
    .bind(3)
    .bind(item.id)
    .execute(&mut *tx)
    .await
    .expect("decrement");
    assert_eq!(updated.rows_affected(), 1);

    let insert = sqlx::query("INSERT INTO egresos (item_id, cantidad) VALUES ($1, $2)")
        .bind(-1)
        .bind(3)
        .execute(&mut *tx)
        .await;
    assert!(insert.is_err());
    drop(tx); // rollback

    let after = stock::find(&db, item.id)
        .await
        .expect("find")
        .expect("item still exists");
    assert_eq!(after.stock, Some(5));
    assert_eq!(ledger_rows(&db, item.id).await, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn second_overdraw_attempt_fails_and_stock_stays_put() {
    let db = pool().await;
    let item = stock::create(&db, &reloj(5, 2)).await.expect("create item");

    egresos::withdraw(&db, item.id, 3, Some("Venta"))
        .await
        .expect("first withdrawal");
    let err = egresos::withdraw(&db, item.id, 3, Some("Venta"))
        .await
        .unwrap_err();
    assert!(matches!(err, EgresoError::StockInsuficiente { .. }));

    let after = stock::find(&db, item.id)
        .await
        .expect("find")
        .expect("item still exists");
    assert_eq!(after.stock, Some(2));
    assert_eq!(ledger_rows(&db, item.id).await, 1);
}
