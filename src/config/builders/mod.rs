//! # 配置构建器模块
//!
//! 提供入口选项、连接池与日志适配器的构建器实现，支持链式调用

pub mod entry_builder;
pub mod logger_builder;
pub mod pool_builder;

pub use entry_builder::EntryOptions;
pub use logger_builder::LoggerConfigBuilder;
pub use pool_builder::PoolConfigBuilder;
