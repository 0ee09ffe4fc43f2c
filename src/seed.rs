use sqlx::{Executor, PgPool};
use tracing::{info, warn};

use crate::auth::repo::Usuario;
use crate::auth::services::hash_password;
use crate::config::AppConfig;

/// Idempotent startup seeding: a master account when no users exist, and an
/// optional bulk SQL load when the product table is empty. Both guards are
/// plain existence checks, which is enough for a single-instance deployment.
pub async fn run(db: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    if Usuario::count(db).await? == 0 {
        let hash = hash_password(&config.seed.admin_password)?;
        let admin = Usuario::create(db, &config.seed.admin_email, &hash, "Admin").await?;
        info!(user_id = admin.id, email = %admin.email, "seeded master user");
    }

    if let Some(path) = &config.seed.sql_path {
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM producto")
            .fetch_one(db)
            .await?;
        if items > 0 {
            return Ok(());
        }
        if !path.exists() {
            warn!(path = %path.display(), "seed SQL file not found, skipping");
            return Ok(());
        }
        let sql = tokio::fs::read_to_string(path).await?;
        // Simple-query protocol, so the script may hold many statements.
        db.execute(sql.as_str()).await?;
        info!(path = %path.display(), "seeded products from SQL script");
    }

    Ok(())
}
