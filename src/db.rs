use std::{path::Path, str::FromStr};

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Connection, SqliteConnection, SqlitePool,
};
use tracing::{info, warn};

use crate::config::DbWaitConfig;

fn connect_options(database_url: &str) -> anyhow::Result<SqliteConnectOptions> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid database url {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);
    Ok(options)
}

/// Create the directory holding a file-backed database.
pub fn ensure_data_dir(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let path = path.trim_start_matches("//");
    if path.starts_with(':') {
        return Ok(()); // :memory:
    }
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create database directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Open the pool and run embedded migrations.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    ensure_data_dir(database_url)?;

    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options(database_url)?)
        .await
        .context("connect to database")?;

    migrate(&db).await?;
    Ok(db)
}

pub async fn migrate(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    Ok(())
}

/// Poll until a connection can be opened and answers a trivial query.
pub async fn wait_for_db(database_url: &str, cfg: &DbWaitConfig) -> anyhow::Result<()> {
    ensure_data_dir(database_url)?;
    let options = connect_options(database_url)?;
    info!("waiting for database");

    let mut attempt = 0;
    loop {
        attempt += 1;
        match ping(&options).await {
            Ok(()) => {
                info!(attempt, "database available");
                return Ok(());
            }
            Err(e) if attempt < cfg.attempts => {
                warn!(error = %e, attempt, "database unavailable, sleeping");
                tokio::time::sleep(cfg.interval).await;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("database still unavailable after {attempt} attempts")
                });
            }
        }
    }
}

async fn ping(options: &SqliteConnectOptions) -> Result<(), sqlx::Error> {
    let mut conn = SqliteConnection::connect_with(options).await?;
    sqlx::query("SELECT 1").execute(&mut conn).await?;
    conn.close().await
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(connect_options("sqlite::memory:").unwrap())
        .await
        .expect("open in-memory database");
    migrate(&db).await.expect("migrate in-memory database");
    db
}
