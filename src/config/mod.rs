//! # 配置管理模块
//!
//! 启动配置的解析、部署环境筛选，以及入口选项与连接池、日志适配器的构建器

pub mod boot;
pub mod builders;
pub mod core;
pub mod locale;

pub use boot::{build_logger, entry_options, register_from_boot, select_entries};
pub use builders::{EntryOptions, LoggerConfigBuilder, PoolConfigBuilder};
pub use self::core::{
    BootConfig, BootConfigEntry, DatabaseDecl, LogLevel, LoggerDecl, PluginsDecl, PoolDecl,
};
pub use locale::{Deployment, WILDCARD};
