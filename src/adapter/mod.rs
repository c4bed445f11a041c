//! 数据库驱动模块
//!
//! 每种数据库一个 [`Driver`](crate::entry::Driver) 实现，负责拼装连接选项与建库

#[cfg(feature = "mysql-support")]
mod mysql;
#[cfg(feature = "postgres-support")]
mod postgres;
#[cfg(feature = "sqlite-support")]
mod sqlite;

#[cfg(feature = "mysql-support")]
pub use mysql::{
    MYSQL_ENTRY_TYPE, MySqlDriver, MySqlEntry, get_mysql_entry, register_mysql_entries_yaml,
};
#[cfg(feature = "postgres-support")]
pub use postgres::{
    POSTGRES_ENTRY_TYPE, PostgresDriver, PostgresEntry, get_postgres_entry,
    register_postgres_entries_yaml,
};
#[cfg(feature = "sqlite-support")]
pub use sqlite::{
    SQLITE_ENTRY_TYPE, SqliteDriver, SqliteEntry, get_sqlite_entry, register_sqlite_entries_yaml,
};

use rat_logger::warn;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{BootConfig, register_from_boot};
use crate::entry::{DatabaseEntry, Driver};
use crate::error::EntryResult;
use crate::manager::AppContext;

/// 解析YAML并注册对应段落的入口
///
/// YAML格式错误时记录警告并返回空表
pub(crate) fn register_entries_yaml<D: Driver>(
    ctx: &AppContext,
    raw: &[u8],
) -> HashMap<String, Arc<DatabaseEntry<D>>> {
    match BootConfig::from_yaml(raw) {
        Ok(config) => register_from_boot::<D>(ctx, config.section(D::DB_TYPE)),
        Err(err) => {
            warn!("解析 {} 启动配置失败: {}", D::ENTRY_TYPE, err);
            HashMap::new()
        }
    }
}

/// 拆分 `key=value` 形式的连接参数
pub(crate) fn split_param(param: &str) -> EntryResult<(&str, &str)> {
    match param.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(crate::entry_error!(
            validation,
            "params",
            format!("连接参数格式应为 key=value: {}", param)
        )),
    }
}

/// 校验参数后用 `&` 拼接为查询串，键和值都做百分号编码
#[cfg(any(feature = "postgres-support", feature = "mysql-support"))]
pub(crate) fn query_string(params: &[String]) -> EntryResult<String> {
    let mut pairs = Vec::with_capacity(params.len());
    for param in params {
        let (key, value) = split_param(param)?;
        pairs.push(format!(
            "{}={}",
            urlencoding::encode(key),
            urlencoding::encode(value)
        ));
    }
    Ok(pairs.join("&"))
}
