use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use time::OffsetDateTime;

use crate::egresos::dto::EgresoConItem;
use crate::stock;

/// A withdrawal decrementing an item's stock. Rows are only ever inserted
/// by [`withdraw`], never updated or deleted through the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Egreso {
    pub id: i32,
    pub item_id: i32,
    pub cantidad: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub fecha_egreso: OffsetDateTime,
    pub motivo: Option<String>,
}

#[derive(Debug, Error)]
pub enum EgresoError {
    #[error("La cantidad debe ser mayor a cero.")]
    CantidadInvalida,
    #[error("No se encontró el artículo con ID {0}.")]
    ItemNoEncontrado(i32),
    #[error("Stock insuficiente. Stock actual: {actual}, intentando egresar: {solicitado}")]
    StockInsuficiente { actual: i32, solicitado: i32 },
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Withdrawals newest first, each with its parent item so the listing can
/// show name/SKU without extra round trips.
pub async fn list_with_items(db: &PgPool) -> anyhow::Result<Vec<EgresoConItem>> {
    let egresos = sqlx::query_as::<_, Egreso>(
        r#"
        SELECT id, item_id, cantidad, fecha_egreso, motivo
        FROM egresos
        ORDER BY fecha_egreso DESC
        "#,
    )
    .fetch_all(db)
    .await?;

    let ids: Vec<i32> = egresos.iter().map(|e| e.item_id).collect();
    let items = stock::repo::find_many(db, &ids).await?;
    let by_id: HashMap<i32, stock::repo::Item> =
        items.into_iter().map(|i| (i.id, i)).collect();

    Ok(egresos
        .into_iter()
        .map(|e| {
            let item = by_id.get(&e.item_id).cloned();
            EgresoConItem { egreso: e, item }
        })
        .collect())
}

/// Atomically subtracts `cantidad` from the item's stock and records the
/// withdrawal. Either both effects commit or neither does; the conditional
/// UPDATE guards against two concurrent withdrawals passing the sufficiency
/// check on the same stale stock value.
pub async fn withdraw(
    db: &PgPool,
    item_id: i32,
    cantidad: i32,
    motivo: Option<&str>,
) -> Result<Egreso, EgresoError> {
    if cantidad <= 0 {
        return Err(EgresoError::CantidadInvalida);
    }

    let item = stock::repo::find(db, item_id)
        .await
        .map_err(db_err)?
        .ok_or(EgresoError::ItemNoEncontrado(item_id))?;

    let actual = item.stock.unwrap_or(0);
    if actual < cantidad {
        return Err(EgresoError::StockInsuficiente {
            actual,
            solicitado: cantidad,
        });
    }

    let mut tx = db.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE producto
        SET stock = COALESCE(stock, 0) - $1
        WHERE id = $2 AND COALESCE(stock, 0) >= $1
        "#,
    )
    .bind(cantidad)
    .bind(item_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        // Lost a race with a concurrent withdrawal; the transaction rolls
        // back on drop, nothing was written.
        return Err(EgresoError::StockInsuficiente {
            actual,
            solicitado: cantidad,
        });
    }

    let egreso = sqlx::query_as::<_, Egreso>(
        r#"
        INSERT INTO egresos (item_id, cantidad, motivo)
        VALUES ($1, $2, $3)
        RETURNING id, item_id, cantidad, fecha_egreso, motivo
        "#,
    )
    .bind(item_id)
    .bind(cantidad)
    .bind(motivo)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(egreso)
}

fn db_err(e: anyhow::Error) -> EgresoError {
    match e.downcast::<sqlx::Error>() {
        Ok(e) => EgresoError::Db(e),
        Err(e) => EgresoError::Db(sqlx::Error::Protocol(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[tokio::test]
    async fn withdraw_rejects_non_positive_quantity_before_touching_db() {
        // The lazy pool never connects; reaching the database would error
        // differently, so these variants prove the early return.
        let state = AppState::fake();
        let err = withdraw(&state.db, 1, 0, None).await.unwrap_err();
        assert!(matches!(err, EgresoError::CantidadInvalida));

        let err = withdraw(&state.db, 1, -3, Some("Venta")).await.unwrap_err();
        assert!(matches!(err, EgresoError::CantidadInvalida));
    }

    #[test]
    fn insufficient_stock_message_carries_both_numbers() {
        let err = EgresoError::StockInsuficiente {
            actual: 2,
            solicitado: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains('2'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn not_found_message_names_the_item() {
        let msg = EgresoError::ItemNoEncontrado(42).to_string();
        assert!(msg.contains("42"));
    }
}
