//! SQLite驱动
//!
//! 数据库文件为 `<dbDir>/<name>.db`，dbDir 默认为当前工作目录；
//! 额外参数以 `PRAGMA key = value` 应用到每个连接

use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqliteConnection};
use sqlx::{Connection, Pool};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use super::{register_entries_yaml, split_param};
use crate::entry::{DatabaseEntry, Driver, Target};
use crate::error::EntryResult;
use crate::manager::AppContext;
use crate::types::{DatabaseInner, DatabaseType};
use crate::utils::resolve_dir;

/// SQLite入口类型
pub const SQLITE_ENTRY_TYPE: &str = "SqliteEntry";

const IN_MEMORY_URL: &str = "sqlite::memory:";

/// SQLite驱动
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

/// SQLite入口
pub type SqliteEntry = DatabaseEntry<SqliteDriver>;

impl SqliteDriver {
    /// 数据库文件所在目录
    pub fn db_dir(inner: &DatabaseInner) -> PathBuf {
        resolve_dir(inner.db_dir.as_deref().unwrap_or_else(|| Path::new("")))
    }

    /// 数据库文件路径
    pub fn db_file(inner: &DatabaseInner) -> PathBuf {
        Self::db_dir(inner).join(format!("{}.db", inner.name))
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    type Db = Sqlite;

    const ENTRY_TYPE: &'static str = SQLITE_ENTRY_TYPE;
    const DB_TYPE: DatabaseType = DatabaseType::SQLite;
    const DEFAULT_NAME: &'static str = "SQLite";
    const DEFAULT_USER: &'static str = "";
    const DEFAULT_PASS: &'static str = "";
    const DEFAULT_ADDR: &'static str = "";

    fn connect_options(_target: &Target<'_>, inner: &DatabaseInner) -> EntryResult<SqliteConnectOptions> {
        let mut options = if inner.in_memory {
            SqliteConnectOptions::from_str(IN_MEMORY_URL)?
        } else {
            SqliteConnectOptions::new()
                .filename(Self::db_file(inner))
                .create_if_missing(true)
        };

        for param in &inner.params {
            let (key, value) = split_param(param)?;
            options = options.pragma(key.to_string(), value.to_string());
        }

        Ok(options)
    }

    async fn ensure_database(target: &Target<'_>, inner: &DatabaseInner) -> EntryResult<()> {
        if inner.in_memory {
            return Ok(());
        }

        tokio::fs::create_dir_all(Self::db_dir(inner)).await?;

        let options = Self::connect_options(target, inner)?;
        let conn = SqliteConnection::connect_with(&options).await?;
        conn.close().await?;
        Ok(())
    }

    async fn execute(pool: &Pool<Sqlite>, sql: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::raw_sql(sql).execute(pool).await?;
        Ok(result.rows_affected())
    }

    fn describe_target(_target: &Target<'_>, inner: &DatabaseInner) -> String {
        if inner.in_memory {
            IN_MEMORY_URL.to_string()
        } else {
            Self::db_file(inner).display().to_string()
        }
    }
}

/// 从YAML注册SQLite入口
pub fn register_sqlite_entries_yaml(ctx: &AppContext, raw: &[u8]) -> HashMap<String, Arc<SqliteEntry>> {
    register_entries_yaml::<SqliteDriver>(ctx, raw)
}

/// 按名称获取SQLite入口
pub fn get_sqlite_entry(ctx: &AppContext, name: &str) -> Option<Arc<SqliteEntry>> {
    SqliteEntry::get(ctx, name)
}
