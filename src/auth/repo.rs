use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Account record. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Usuario {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub rol: String,
}

impl Usuario {
    /// Find a user by email (exact match as stored).
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Usuario>> {
        let user = sqlx::query_as::<_, Usuario>(
            r#"
            SELECT id, email, password_hash, rol
            FROM usuarios
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        rol: &str,
    ) -> anyhow::Result<Usuario> {
        let user = sqlx::query_as::<_, Usuario>(
            r#"
            INSERT INTO usuarios (email, password_hash, rol)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, rol
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(rol)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usuarios")
            .fetch_one(db)
            .await?;
        Ok(n)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Usuario>> {
        let rows = sqlx::query_as::<_, Usuario>(
            r#"
            SELECT id, email, password_hash, rol
            FROM usuarios
            ORDER BY id
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
