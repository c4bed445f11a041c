//! 入口管理模块
//!
//! 应用上下文、入口注册表以及按启动配置批量注册入口

mod context;
mod registry;

pub use context::{AppContext, DEFAULT_LOGGER_ENTRY, ShutdownHook, default_shutdown_hook};
pub use registry::EntryRegistry;

use std::sync::Arc;

use crate::config::BootConfig;
use crate::entry::Entry;

/// 按启动配置注册所有已启用数据库类型的入口
///
/// 返回新注册的入口，顺序为 SQLite、Postgres、MySQL
pub fn register_entries(ctx: &AppContext, config: &BootConfig) -> Vec<Arc<dyn Entry>> {
    let mut entries: Vec<Arc<dyn Entry>> = Vec::new();

    #[cfg(feature = "sqlite-support")]
    {
        let registered = crate::config::register_from_boot::<crate::adapter::SqliteDriver>(
            ctx,
            &config.sqlite,
        );
        entries.extend(sorted(registered));
    }

    #[cfg(feature = "postgres-support")]
    {
        let registered = crate::config::register_from_boot::<crate::adapter::PostgresDriver>(
            ctx,
            &config.postgres,
        );
        entries.extend(sorted(registered));
    }

    #[cfg(feature = "mysql-support")]
    {
        let registered = crate::config::register_from_boot::<crate::adapter::MySqlDriver>(
            ctx,
            &config.mysql,
        );
        entries.extend(sorted(registered));
    }

    entries
}

fn sorted<E: Entry>(map: std::collections::HashMap<String, Arc<E>>) -> Vec<Arc<dyn Entry>> {
    let mut items: Vec<(String, Arc<E>)> = map.into_iter().collect();
    items.sort_by(|a, b| a.0.cmp(&b.0));
    items
        .into_iter()
        .map(|(_, entry)| entry as Arc<dyn Entry>)
        .collect()
}
