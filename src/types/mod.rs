//! 数据库类型定义和配置
//!
//! 定义支持的数据库类型、连接池配置和逻辑数据库描述

pub mod database_config;

// 重新导出所有公共类型以保持API兼容性
pub use database_config::{DatabaseInner, DatabaseType, PoolConfig};
