use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::plugin::Plugin;

/// 支持的数据库类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    /// SQLite 数据库
    SQLite,
    /// PostgreSQL 数据库
    PostgreSQL,
    /// MySQL 数据库
    MySQL,
}

impl DatabaseType {
    /// 获取数据库类型的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::SQLite => "sqlite",
            DatabaseType::PostgreSQL => "postgresql",
            DatabaseType::MySQL => "mysql",
        }
    }

    /// 从字符串解析数据库类型
    pub fn from_str(s: &str) -> Result<Self, crate::error::EntryError> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(DatabaseType::SQLite),
            "postgresql" | "postgres" | "pg" => Ok(DatabaseType::PostgreSQL),
            "mysql" => Ok(DatabaseType::MySQL),
            _ => Err(crate::entry_error!(
                config,
                format!("不支持的数据库类型: {}", s)
            )),
        }
    }
}

/// 连接池配置
///
/// 只描述交给驱动连接池的参数，连接池本身由 sqlx 实现
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// 最小连接数
    pub min_connections: u32,
    /// 最大连接数
    pub max_connections: u32,
    /// 获取连接超时时间（秒）
    pub connection_timeout: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: u64,
    /// 连接最大生存时间（秒）
    pub max_lifetime: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            connection_timeout: 30,
            idle_timeout: 600,
            max_lifetime: 3600,
        }
    }
}

impl PoolConfig {
    /// 转换为 sqlx 的连接池选项
    pub fn to_pool_options<DB: sqlx::Database>(&self) -> sqlx::pool::PoolOptions<DB> {
        sqlx::pool::PoolOptions::<DB>::new()
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.connection_timeout))
            .idle_timeout(Duration::from_secs(self.idle_timeout))
            .max_lifetime(Duration::from_secs(self.max_lifetime))
    }
}

/// 单个逻辑数据库的描述
///
/// 同一入口下允许出现同名描述，构建器不会合并它们
#[derive(Clone, Default)]
pub struct DatabaseInner {
    /// 数据库名
    pub name: String,
    /// 是否为演练模式（不连接、不执行）
    pub dry_run: bool,
    /// 连接前是否自动创建数据库
    pub auto_create: bool,
    /// 额外连接参数，格式为 key=value
    pub params: Vec<String>,
    /// 仅SQLite：使用共享内存数据库
    pub in_memory: bool,
    /// 仅SQLite：数据库文件目录
    pub db_dir: Option<PathBuf>,
    /// 连接池配置，未设置时使用默认值
    pub pool: Option<PoolConfig>,
    /// 挂载的插件
    pub plugins: Vec<Arc<dyn Plugin>>,
}

impl DatabaseInner {
    /// 创建新的描述
    pub fn new<S: Into<String>>(name: S, dry_run: bool, auto_create: bool) -> Self {
        Self {
            name: name.into(),
            dry_run,
            auto_create,
            ..Default::default()
        }
    }

    /// 获取生效的连接池配置
    pub fn pool_config(&self) -> PoolConfig {
        self.pool.clone().unwrap_or_default()
    }
}

impl fmt::Debug for DatabaseInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("DatabaseInner")
            .field("name", &self.name)
            .field("dry_run", &self.dry_run)
            .field("auto_create", &self.auto_create)
            .field("params", &self.params)
            .field("in_memory", &self.in_memory)
            .field("db_dir", &self.db_dir)
            .field("pool", &self.pool)
            .field("plugins", &plugins)
            .finish()
    }
}
