use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// Logical folder (key prefix) under which product images are stored.
    pub folder: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    pub admin_email: String,
    pub admin_password: String,
    /// Optional path to a flat SQL script used to bulk-load an empty database.
    pub sql_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub seed: SeedConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "stock-api".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "stock-api-users".into()),
            ttl_hours: std::env::var("JWT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };
        let storage = StorageConfig {
            endpoint: std::env::var("S3_ENDPOINT")?,
            bucket: std::env::var("S3_BUCKET")?,
            access_key: std::env::var("S3_ACCESS_KEY")?,
            secret_key: std::env::var("S3_SECRET_KEY")?,
            folder: std::env::var("S3_FOLDER").unwrap_or_else(|_| "joyeria_stock".into()),
        };
        let seed = SeedConfig {
            admin_email: std::env::var("SEED_ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@joyeria.local".into()),
            admin_password: std::env::var("SEED_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "Admin123!".into()),
            sql_path: std::env::var("SEED_SQL_PATH").ok().map(PathBuf::from),
        };
        Ok(Self {
            database_url,
            jwt,
            storage,
            seed,
        })
    }
}
