use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use curation_migration::{Migrator, MigratorTrait};
use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sea_orm::sqlx::{self, Executor};
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, SqlxSqliteConnector, TransactionTrait};
use serde::Serialize;
use tracing::{debug, info};

/// 创建 SQLite 连接选项
fn create_sqlite_options(database_url: &str) -> Result<SqliteConnectOptions> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("无效的数据库地址: {}", database_url))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30))
        .foreign_keys(true)
        .pragma("temp_store", "MEMORY");
    Ok(options)
}

async fn database_connection(database_url: &str) -> Result<DatabaseConnection> {
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("PRAGMA busy_timeout = 30000;").await?;
                let row: (i64,) = sqlx::query_as("PRAGMA busy_timeout;").fetch_one(&mut *conn).await?;
                debug!("新数据库连接已创建，busy_timeout = {}ms", row.0);
                Ok(())
            })
        })
        .connect_with(create_sqlite_options(database_url)?)
        .await
        .context("创建数据库连接池失败")?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// 迁移使用单连接池，避免多连接导致的迁移顺序问题
async fn migration_connection(database_url: &str) -> Result<(sqlx::SqlitePool, DatabaseConnection)> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(create_sqlite_options(database_url)?)
        .await
        .context("创建迁移连接失败")?;
    let connection = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());
    Ok((pool, connection))
}

/// 应用待执行的迁移，`steps` 为空时全部应用
pub async fn migrate_database(database_url: &str, steps: Option<u32>) -> Result<()> {
    let (pool, connection) = migration_connection(database_url).await?;
    Migrator::up(&connection, steps).await.context("数据库迁移失败")?;
    // 显式关闭连接池，确保释放所有数据库锁
    pool.close().await;
    debug!("迁移完成，已关闭迁移连接池");
    Ok(())
}

/// 回滚已应用的迁移，`steps` 为空时回滚一步
pub async fn rollback_database(database_url: &str, steps: Option<u32>) -> Result<()> {
    let (pool, connection) = migration_connection(database_url).await?;
    Migrator::down(&connection, Some(steps.unwrap_or(1)))
        .await
        .context("数据库回滚失败")?;
    pool.close().await;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationState {
    pub name: String,
    pub applied: bool,
}

pub async fn migration_status(database_url: &str) -> Result<Vec<MigrationState>> {
    let (pool, connection) = migration_connection(database_url).await?;
    let states = migration_states(&connection).await?;
    pool.close().await;
    Ok(states)
}

async fn migration_states(connection: &DatabaseConnection) -> Result<Vec<MigrationState>, DbErr> {
    let applied = Migrator::get_applied_migrations(connection).await?;
    let pending = Migrator::get_pending_migrations(connection).await?;
    Ok(applied
        .iter()
        .map(|m| MigrationState {
            name: m.name().to_owned(),
            applied: true,
        })
        .chain(pending.iter().map(|m| MigrationState {
            name: m.name().to_owned(),
            applied: false,
        }))
        .collect())
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// 内存库只存在于单个连接内，迁移与业务必须共用这一个连接
async fn memory_connection(database_url: &str) -> Result<DatabaseConnection> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("无效的数据库地址: {}", database_url))?
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("创建内存数据库失败")?;
    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// 进行数据库迁移并获取数据库连接，供外部使用
pub async fn setup_database(database_url: &str) -> Result<DatabaseConnection> {
    let connection = if is_memory_url(database_url) {
        let connection = memory_connection(database_url).await?;
        Migrator::up(&connection, None).await.context("数据库迁移失败")?;
        connection
    } else {
        migrate_database(database_url, None).await?;
        database_connection(database_url).await?
    };
    info!("数据库已就绪: {}", database_url);
    Ok(connection)
}

/// 开始一个事务并立即获取写锁
/// 通过更新锁定表来强制获取写锁，避免 SQLITE_BUSY_SNAPSHOT 问题
/// `_write_lock` 表由基础迁移创建
pub async fn begin_write_transaction(connection: &DatabaseConnection) -> Result<DatabaseTransaction, DbErr> {
    let txn = connection.begin().await?;

    // 如果其他事务持有锁，这里会等待 busy_timeout
    txn.execute_unprepared("UPDATE _write_lock SET ts = strftime('%s', 'now') WHERE id = 1")
        .await?;

    Ok(txn)
}

/// 单连接的内存数据库，已应用全部迁移
#[cfg(test)]
pub async fn memory_database() -> DatabaseConnection {
    setup_database("sqlite::memory:").await.unwrap()
}
