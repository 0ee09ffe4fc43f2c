use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::stock::dto::{ItemFilter, ItemInput, StockStats};

/// Column list with the aliases the `Item` struct maps from. The physical
/// table keeps the legacy column names (`codigo_barra`, `descripcion`).
const ITEM_COLS: &str = "id, codigo_barra AS sku, marca, descripcion AS nombre, \
     id_categoria, categoria, stock, min_stock, precio, es_activo, \
     fecha_registro, nombre_imagen, url_imagen, maneja_peso";

/// A stocked product (watch, jewelry piece, etc.).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i32,
    pub sku: Option<String>,
    pub marca: Option<String>,
    pub nombre: Option<String>,
    pub id_categoria: Option<i32>,
    pub categoria: Option<String>,
    pub stock: Option<i32>,
    pub min_stock: Option<i32>,
    pub precio: Decimal,
    pub es_activo: Option<bool>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub fecha_registro: Option<OffsetDateTime>,
    pub nombre_imagen: Option<String>,
    pub url_imagen: Option<String>,
    pub maneja_peso: Option<bool>,
}

impl Item {
    /// Absent stock counts as 0; the boundary `stock == min_stock` is low.
    pub fn is_low_stock(&self) -> bool {
        self.stock.unwrap_or(0) <= self.min_stock.unwrap_or(0)
    }
}

pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Item>> {
    let rows = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLS} FROM producto ORDER BY id DESC"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find(db: &PgPool, id: i32) -> anyhow::Result<Option<Item>> {
    let item = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLS} FROM producto WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(item)
}

pub async fn find_many(db: &PgPool, ids: &[i32]) -> anyhow::Result<Vec<Item>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLS} FROM producto WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn create(db: &PgPool, input: &ItemInput) -> anyhow::Result<Item> {
    let item = sqlx::query_as::<_, Item>(&format!(
        r#"
        INSERT INTO producto
            (codigo_barra, marca, descripcion, id_categoria, categoria,
             stock, min_stock, precio, es_activo, fecha_registro,
             nombre_imagen, url_imagen, maneja_peso)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), $10, $11, $12)
        RETURNING {ITEM_COLS}
        "#
    ))
    .bind(&input.sku)
    .bind(&input.marca)
    .bind(&input.nombre)
    .bind(input.id_categoria)
    .bind(&input.categoria)
    .bind(input.stock)
    .bind(input.min_stock)
    .bind(input.precio)
    .bind(input.es_activo)
    .bind(&input.nombre_imagen)
    .bind(&input.url_imagen)
    .bind(input.maneja_peso)
    .fetch_one(db)
    .await?;
    Ok(item)
}

/// Full-record replace. Returns the number of rows touched; 0 means the
/// item vanished under us.
pub async fn replace(db: &PgPool, item: &Item) -> anyhow::Result<u64> {
    let done = sqlx::query(
        r#"
        UPDATE producto SET
            codigo_barra = $2, marca = $3, descripcion = $4, id_categoria = $5,
            categoria = $6, stock = $7, min_stock = $8, precio = $9,
            es_activo = $10, fecha_registro = $11, nombre_imagen = $12,
            url_imagen = $13, maneja_peso = $14
        WHERE id = $1
        "#,
    )
    .bind(item.id)
    .bind(&item.sku)
    .bind(&item.marca)
    .bind(&item.nombre)
    .bind(item.id_categoria)
    .bind(&item.categoria)
    .bind(item.stock)
    .bind(item.min_stock)
    .bind(item.precio)
    .bind(item.es_activo)
    .bind(item.fecha_registro)
    .bind(&item.nombre_imagen)
    .bind(&item.url_imagen)
    .bind(item.maneja_peso)
    .execute(db)
    .await?;
    Ok(done.rows_affected())
}

pub async fn delete(db: &PgPool, id: i32) -> anyhow::Result<u64> {
    let done = sqlx::query("DELETE FROM producto WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(done.rows_affected())
}

pub async fn stats(db: &PgPool) -> anyhow::Result<StockStats> {
    let total_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM producto")
        .fetch_one(db)
        .await?;
    let total_watches: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM producto WHERE categoria = 'Relojes'")
            .fetch_one(db)
            .await?;
    let total_jewelry: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM producto WHERE categoria = 'Joyas'")
            .fetch_one(db)
            .await?;
    let low_stock_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM producto WHERE COALESCE(stock, 0) <= COALESCE(min_stock, 0)",
    )
    .fetch_one(db)
    .await?;
    let low_stock_items = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLS} FROM producto \
         WHERE COALESCE(stock, 0) <= COALESCE(min_stock, 0) ORDER BY id LIMIT 5"
    ))
    .fetch_all(db)
    .await?;
    let recent_items = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLS} FROM producto ORDER BY id DESC LIMIT 5"
    ))
    .fetch_all(db)
    .await?;

    Ok(StockStats {
        total_items,
        total_watches,
        total_jewelry,
        low_stock_count,
        low_stock_items,
        recent_items,
    })
}

/// Appends the shared WHERE clauses for search / category / stock status.
/// "Todas" (category) and anything other than "Bajo"/"Óptimo" (stock
/// status) act as sentinels that disable the respective filter.
fn push_filters(qb: &mut QueryBuilder<Postgres>, filter: &ItemFilter) {
    qb.push(" WHERE TRUE");

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (descripcion ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR codigo_barra ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR marca ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(category) = &filter.category {
        if !category.is_empty() && category != "Todas" {
            qb.push(" AND categoria = ").push_bind(category.clone());
        }
    }

    match filter.stock_status.as_deref() {
        Some("Bajo") => {
            qb.push(" AND COALESCE(stock, 0) <= COALESCE(min_stock, 0)");
        }
        Some("Óptimo") => {
            qb.push(" AND COALESCE(stock, 0) > COALESCE(min_stock, 0)");
        }
        _ => {}
    }
}

pub async fn count_filtered(db: &PgPool, filter: &ItemFilter) -> anyhow::Result<i64> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM producto");
    push_filters(&mut qb, filter);
    let n: i64 = qb.build_query_scalar().fetch_one(db).await?;
    Ok(n)
}

pub async fn page_filtered(
    db: &PgPool,
    filter: &ItemFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Item>> {
    let mut qb = QueryBuilder::new(format!("SELECT {ITEM_COLS} FROM producto"));
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let rows = qb.build_query_as::<Item>().fetch_all(db).await?;
    Ok(rows)
}

/// Same filters as the paginated listing, full result set.
pub async fn list_filtered(db: &PgPool, filter: &ItemFilter) -> anyhow::Result<Vec<Item>> {
    let mut qb = QueryBuilder::new(format!("SELECT {ITEM_COLS} FROM producto"));
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY id DESC");
    let rows = qb.build_query_as::<Item>().fetch_all(db).await?;
    Ok(rows)
}
