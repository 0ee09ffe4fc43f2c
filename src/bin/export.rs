//! One-off SQL dump of the stock database: writes flat INSERT statements
//! for `producto`, `usuarios` and `egresos` so the file can re-seed an
//! empty database (see `seed::run`). Output path comes from the first CLI
//! argument or `EXPORT_SQL_PATH`.

use anyhow::Context;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use stock_api::auth::repo::Usuario;
use stock_api::egresos::repo::Egreso;
use stock_api::stock::repo::{self, Item};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let output = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("EXPORT_SQL_PATH").ok())
        .context("usage: export <output.sql> (or set EXPORT_SQL_PATH)")?;

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let db = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .context("connect to database")?;

    let mut sql = String::new();

    let items = repo::list_all(&db).await?;
    if !items.is_empty() {
        sql.push_str("-- EXPORTANDO TABLA producto\n");
        for item in &items {
            sql.push_str(&item_insert(item)?);
        }
        sql.push_str(&setval("producto"));
        sql.push('\n');
    }
    tracing::info!(rows = items.len(), "exported producto");

    let usuarios = Usuario::list_all(&db).await?;
    if !usuarios.is_empty() {
        sql.push_str("-- EXPORTANDO TABLA usuarios\n");
        for u in &usuarios {
            sql.push_str(&usuario_insert(u));
        }
        sql.push_str(&setval("usuarios"));
        sql.push('\n');
    }
    tracing::info!(rows = usuarios.len(), "exported usuarios");

    let egresos = list_egresos(&db).await?;
    if !egresos.is_empty() {
        sql.push_str("-- EXPORTANDO TABLA egresos\n");
        for e in &egresos {
            sql.push_str(&egreso_insert(e)?);
        }
        sql.push_str(&setval("egresos"));
        sql.push('\n');
    }
    tracing::info!(rows = egresos.len(), "exported egresos");

    tokio::fs::write(&output, sql)
        .await
        .with_context(|| format!("write {}", output))?;
    tracing::info!(path = %output, "export complete");
    Ok(())
}

async fn list_egresos(db: &sqlx::PgPool) -> anyhow::Result<Vec<Egreso>> {
    let rows = sqlx::query_as::<_, Egreso>(
        "SELECT id, item_id, cantidad, fecha_egreso, motivo FROM egresos ORDER BY id",
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

fn item_insert(i: &Item) -> anyhow::Result<String> {
    Ok(format!(
        "INSERT INTO producto (id, codigo_barra, marca, descripcion, id_categoria, categoria, \
         stock, min_stock, precio, es_activo, fecha_registro, nombre_imagen, url_imagen, \
         maneja_peso) VALUES ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {});\n",
        i.id,
        opt_str(i.sku.as_deref()),
        opt_str(i.marca.as_deref()),
        opt_str(i.nombre.as_deref()),
        opt_i32(i.id_categoria),
        opt_str(i.categoria.as_deref()),
        opt_i32(i.stock),
        opt_i32(i.min_stock),
        i.precio,
        opt_bool(i.es_activo),
        opt_ts(i.fecha_registro)?,
        opt_str(i.nombre_imagen.as_deref()),
        opt_str(i.url_imagen.as_deref()),
        opt_bool(i.maneja_peso),
    ))
}

fn usuario_insert(u: &Usuario) -> String {
    format!(
        "INSERT INTO usuarios (id, email, password_hash, rol) VALUES ({}, {}, {}, {});\n",
        u.id,
        quote(&u.email),
        quote(&u.password_hash),
        quote(&u.rol),
    )
}

fn egreso_insert(e: &Egreso) -> anyhow::Result<String> {
    Ok(format!(
        "INSERT INTO egresos (id, item_id, cantidad, fecha_egreso, motivo) \
         VALUES ({}, {}, {}, {}, {});\n",
        e.id,
        e.item_id,
        e.cantidad,
        ts(e.fecha_egreso)?,
        opt_str(e.motivo.as_deref()),
    ))
}

/// Realigns the serial sequence after explicit-id inserts.
fn setval(table: &str) -> String {
    format!(
        "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
         COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false);\n"
    )
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn opt_str(v: Option<&str>) -> String {
    match v {
        Some(s) => quote(s),
        None => "NULL".into(),
    }
}

fn opt_i32(v: Option<i32>) -> String {
    match v {
        Some(n) => n.to_string(),
        None => "NULL".into(),
    }
}

fn opt_bool(v: Option<bool>) -> String {
    match v {
        Some(true) => "TRUE".into(),
        Some(false) => "FALSE".into(),
        None => "NULL".into(),
    }
}

fn ts(v: OffsetDateTime) -> anyhow::Result<String> {
    Ok(quote(&v.format(&Rfc3339)?))
}

fn opt_ts(v: Option<OffsetDateTime>) -> anyhow::Result<String> {
    match v {
        Some(t) => ts(t),
        None => Ok("NULL".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn quote_doubles_single_quotes() {
        assert_eq!(quote("O'Clock"), "'O''Clock'");
        assert_eq!(quote("plain"), "'plain'");
    }

    #[test]
    fn null_and_bool_literals() {
        assert_eq!(opt_str(None), "NULL");
        assert_eq!(opt_i32(None), "NULL");
        assert_eq!(opt_bool(Some(true)), "TRUE");
        assert_eq!(opt_bool(Some(false)), "FALSE");
        assert_eq!(opt_bool(None), "NULL");
    }

    #[test]
    fn timestamps_render_as_quoted_rfc3339() {
        let t = datetime!(2026-02-25 04:18:59 UTC);
        assert_eq!(ts(t).unwrap(), "'2026-02-25T04:18:59Z'");
    }

    #[test]
    fn usuario_insert_escapes_values() {
        let u = Usuario {
            id: 1,
            email: "ad'min@joyeria.local".into(),
            password_hash: "$argon2id$hash".into(),
            rol: "Admin".into(),
        };
        let line = usuario_insert(&u);
        assert!(line.starts_with("INSERT INTO usuarios"));
        assert!(line.contains("'ad''min@joyeria.local'"));
        assert!(line.ends_with(";\n"));
    }

    #[test]
    fn setval_targets_the_id_sequence() {
        let s = setval("producto");
        assert!(s.contains("pg_get_serial_sequence('producto', 'id')"));
        assert!(s.contains("MAX(id) FROM producto"));
    }
}
