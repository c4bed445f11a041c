//! rat_dbentry - 配置驱动的数据库入口库
//!
//! 从YAML（或TOML/JSON）启动配置创建SQLite、PostgreSQL、MySQL入口，
//! 注入语句日志适配器，按需自动建库，并注册到应用上下文中按名称取用。
//! SQL执行、连接与连接池均由 sqlx 完成
//!
//! 注意：日志系统由调用者自行初始化

// 导出所有公共模块
pub mod error;
pub mod types;
pub mod config;
pub mod logger;
pub mod plugin;
pub mod entry;
pub mod adapter;
pub mod manager;
pub mod security;
pub mod utils;

// 重新导出常用类型和函数
pub use error::{EntryError, EntryResult};
pub use types::{DatabaseInner, DatabaseType, PoolConfig};
pub use config::{
    BootConfig, BootConfigEntry, Deployment, EntryOptions, LogLevel, LoggerConfigBuilder,
    PoolConfigBuilder,
};
pub use logger::{
    FileSink, LogEncoding, LogRotation, LogSink, Logger, LoggerEntry, MemorySink, QueryEvent,
    QueryLogLevel, QueryLogger, RatLoggerSink,
};
pub use plugin::{MetricSample, MetricsPlugin, Plugin, PluginConfig, TracePlugin};
pub use entry::{DatabaseEntry, DbConfig, DbHandle, Driver, Entry, EntryState};
pub use manager::{AppContext, EntryRegistry, ShutdownHook, register_entries};

#[cfg(feature = "sqlite-support")]
pub use adapter::{SqliteDriver, SqliteEntry, get_sqlite_entry, register_sqlite_entries_yaml};
#[cfg(feature = "postgres-support")]
pub use adapter::{
    PostgresDriver, PostgresEntry, get_postgres_entry, register_postgres_entries_yaml,
};
#[cfg(feature = "mysql-support")]
pub use adapter::{MySqlDriver, MySqlEntry, get_mysql_entry, register_mysql_entries_yaml};

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
