use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Where uploaded recipe images end up.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    Local {
        root: PathBuf,
    },
    S3 {
        endpoint: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        region: String,
    },
}

#[derive(Debug, Clone)]
pub struct DbWaitConfig {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for DbWaitConfig {
    fn default() -> Self {
        Self {
            attempts: 60,
            interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub db_wait: DbWaitConfig,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Settings the management commands need: where the database lives and how
/// long to wait for it. No secrets involved.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub wait: DbWaitConfig,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: env_or("DATABASE_URL", "sqlite:data/recipes.db"),
            wait: DbWaitConfig {
                attempts: env_parse("DB_WAIT_ATTEMPTS", 60),
                interval: Duration::from_millis(env_parse("DB_WAIT_INTERVAL_MS", 1000)),
            },
        }
    }
}

impl AppConfig {
    /// Everything the HTTP server needs; `JWT_SECRET` is mandatory here.
    pub fn from_env() -> anyhow::Result<Self> {
        let database = DatabaseConfig::from_env();
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: env_or("JWT_ISSUER", "recipe-api"),
            audience: env_or("JWT_AUDIENCE", "recipe-api-users"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };

        let storage = match env_or("STORAGE_BACKEND", "local").as_str() {
            "local" => StorageConfig::Local {
                root: PathBuf::from(env_or("MEDIA_ROOT", "media")),
            },
            "s3" => StorageConfig::S3 {
                endpoint: std::env::var("S3_ENDPOINT").context("S3_ENDPOINT must be set")?,
                bucket: std::env::var("S3_BUCKET").context("S3_BUCKET must be set")?,
                access_key: std::env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY must be set")?,
                secret_key: std::env::var("S3_SECRET_KEY").context("S3_SECRET_KEY must be set")?,
                region: env_or("S3_REGION", "us-east-1"),
            },
            other => anyhow::bail!("unknown STORAGE_BACKEND {other:?}, expected local or s3"),
        };

        Ok(Self {
            database_url: database.url,
            jwt,
            storage,
            db_wait: database.wait,
        })
    }
}
