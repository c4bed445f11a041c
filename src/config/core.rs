//! # 配置管理模块 - 核心配置类型
//!
//! 启动配置的结构定义，字段名与YAML中的驼峰命名一致

use crate::error::EntryError;
use crate::logger::LogRotation;
use crate::plugin::PluginConfig;
use crate::types::{DatabaseType, PoolConfig};
use rat_logger::info;
use serde::{Deserialize, Serialize};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 错误级别
    Error,
    /// 警告级别
    Warn,
    /// 信息级别
    Info,
    /// 调试级别
    Debug,
    /// 跟踪级别
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// 启动配置
///
/// 每种数据库一个段落，每个段落是有序的入口声明列表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    pub sqlite: Vec<BootConfigEntry>,
    pub postgres: Vec<BootConfigEntry>,
    pub mysql: Vec<BootConfigEntry>,
}

/// 单个入口的声明
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BootConfigEntry {
    pub enabled: bool,
    pub name: String,
    pub description: String,
    /// `realm::region::az::domain` 形式，设置后优先于 domain
    pub locale: Option<String>,
    pub domain: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub pass: String,
    pub addr: String,
    pub database: Vec<DatabaseDecl>,
    pub logger: LoggerDecl,
}

/// 逻辑数据库声明
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseDecl {
    pub name: String,
    pub params: Vec<String>,
    pub dry_run: bool,
    pub auto_create: bool,
    /// 仅SQLite
    pub in_memory: bool,
    /// 仅SQLite，相对路径基于当前工作目录
    pub db_dir: Option<String>,
    pub pool: Option<PoolDecl>,
    pub plugins: PluginsDecl,
}

/// 插件声明
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsDecl {
    #[serde(alias = "prom")]
    pub metrics: PluginConfig,
    pub trace: PluginConfig,
}

/// 连接池声明，未填写的字段取默认值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoolDecl {
    pub min_connections: Option<u32>,
    pub max_connections: Option<u32>,
    pub connect_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    pub max_lifetime_secs: Option<u64>,
}

impl PoolDecl {
    /// 与默认值合并后构建连接池配置
    pub fn to_pool_config(&self) -> Result<PoolConfig, EntryError> {
        let defaults = PoolConfig::default();
        PoolConfig::builder()
            .min_connections(self.min_connections.unwrap_or(defaults.min_connections))
            .max_connections(self.max_connections.unwrap_or(defaults.max_connections))
            .connection_timeout(self.connect_timeout_secs.unwrap_or(defaults.connection_timeout))
            .idle_timeout(self.idle_timeout_secs.unwrap_or(defaults.idle_timeout))
            .max_lifetime(self.max_lifetime_secs.unwrap_or(defaults.max_lifetime))
            .build()
    }
}

/// 日志声明
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerDecl {
    /// 引用的日志入口名称，为空时使用默认入口
    pub entry: String,
    pub level: String,
    pub encoding: String,
    pub output_paths: Vec<String>,
    /// 新建文件输出端时的滚动周期，默认按天
    pub rotation: LogRotation,
    pub slow_threshold_ms: u64,
    pub ignore_record_not_found_error: bool,
}

impl BootConfig {
    /// 从YAML字节解析
    pub fn from_yaml(raw: &[u8]) -> Result<Self, EntryError> {
        Ok(serde_yaml::from_slice(raw)?)
    }

    /// 从配置文件加载配置
    ///
    /// 按扩展名选择格式：yaml/yml、toml、json
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径
    pub fn from_file<P: AsRef<std::path::Path>>(config_path: P) -> Result<Self, EntryError> {
        let path = config_path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let config: BootConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| {
                crate::entry_error!(config, format!("解析TOML配置文件失败: {}", e))
            })?,
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                crate::entry_error!(config, format!("解析JSON配置文件失败: {}", e))
            })?,
            _ => serde_yaml::from_str(&content)?,
        };

        info!("从文件加载启动配置: {:?}", path);
        Ok(config)
    }

    /// 获取指定数据库类型的段落
    pub fn section(&self, db_type: DatabaseType) -> &[BootConfigEntry] {
        match db_type {
            DatabaseType::SQLite => &self.sqlite,
            DatabaseType::PostgreSQL => &self.postgres,
            DatabaseType::MySQL => &self.mysql,
        }
    }
}
