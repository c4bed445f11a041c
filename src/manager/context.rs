//! 应用上下文

use dashmap::DashMap;
use rat_logger::{error, info};
use std::sync::Arc;

use super::EntryRegistry;
use crate::config::Deployment;
use crate::error::EntryError;
use crate::logger::{LogEncoding, LoggerEntry, RatLoggerSink};

/// 默认日志入口名称
pub const DEFAULT_LOGGER_ENTRY: &str = "default";

/// 致命错误处理钩子
pub type ShutdownHook = Arc<dyn Fn(&EntryError) + Send + Sync>;

/// 默认钩子：记录错误后退出进程
pub fn default_shutdown_hook() -> ShutdownHook {
    Arc::new(|err: &EntryError| {
        error!("致命错误，进程退出: {}", err);
        std::process::exit(1);
    })
}

/// 应用上下文
///
/// 进程启动时创建一次，按引用传给需要查找入口的地方
pub struct AppContext {
    registry: EntryRegistry,
    logger_entries: DashMap<String, LoggerEntry>,
    deployment: Deployment,
    shutdown_hook: ShutdownHook,
}

impl AppContext {
    /// 使用环境变量中的部署信息创建
    pub fn new() -> Self {
        Self::with_deployment(Deployment::from_env())
    }

    /// 使用指定的部署信息创建
    pub fn with_deployment(deployment: Deployment) -> Self {
        let logger_entries = DashMap::new();
        logger_entries.insert(
            DEFAULT_LOGGER_ENTRY.to_string(),
            LoggerEntry::new(
                DEFAULT_LOGGER_ENTRY,
                Arc::new(RatLoggerSink::new(LogEncoding::Console)),
            ),
        );

        info!("创建应用上下文: {:?}", deployment);

        Self {
            registry: EntryRegistry::new(),
            logger_entries,
            deployment,
            shutdown_hook: default_shutdown_hook(),
        }
    }

    /// 替换致命错误处理钩子
    pub fn with_shutdown_hook(mut self, hook: ShutdownHook) -> Self {
        self.shutdown_hook = hook;
        self
    }

    pub fn registry(&self) -> &EntryRegistry {
        &self.registry
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn shutdown_hook(&self) -> ShutdownHook {
        self.shutdown_hook.clone()
    }

    /// 添加具名日志入口，同名时覆盖
    pub fn add_logger_entry(&self, entry: LoggerEntry) {
        self.logger_entries.insert(entry.name().to_string(), entry);
    }

    pub fn get_logger_entry(&self, name: &str) -> Option<LoggerEntry> {
        self.logger_entries.get(name).map(|item| item.value().clone())
    }

    /// 默认日志入口
    pub fn default_logger_entry(&self) -> LoggerEntry {
        self.get_logger_entry(DEFAULT_LOGGER_ENTRY).unwrap_or_else(|| {
            LoggerEntry::new(
                DEFAULT_LOGGER_ENTRY,
                Arc::new(RatLoggerSink::new(LogEncoding::Console)),
            )
        })
    }

    /// 把致命错误交给关闭钩子
    pub fn shutdown_with_error(&self, err: &EntryError) {
        (self.shutdown_hook)(err);
    }

    /// 按 (类型, 名称) 顺序启动所有入口
    pub async fn bootstrap_all(&self, event_id: Option<&str>) {
        for entry in self.registry.list() {
            entry.bootstrap(event_id).await;
        }
    }

    /// 中断所有入口
    pub async fn interrupt_all(&self, event_id: Option<&str>) {
        for entry in self.registry.list() {
            entry.interrupt(event_id).await;
        }
    }

    /// 所有入口的健康状态
    pub async fn health(&self) -> Vec<(String, String, bool)> {
        let mut result = Vec::new();
        for entry in self.registry.list() {
            let healthy = entry.is_healthy().await;
            result.push((entry.entry_type().to_string(), entry.name().to_string(), healthy));
        }
        result
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let loggers: Vec<String> = self.logger_entries.iter().map(|i| i.key().clone()).collect();
        f.debug_struct("AppContext")
            .field("registry", &self.registry)
            .field("logger_entries", &loggers)
            .field("deployment", &self.deployment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemorySink;
    use parking_lot::Mutex;

    #[test]
    fn test_default_logger_entry_present() {
        let ctx = AppContext::with_deployment(Deployment::default());
        assert_eq!(ctx.default_logger_entry().name(), DEFAULT_LOGGER_ENTRY);
        assert!(ctx.get_logger_entry("missing").is_none());

        ctx.add_logger_entry(LoggerEntry::new("audit", Arc::new(MemorySink::new())));
        assert!(ctx.get_logger_entry("audit").is_some());
    }

    #[test]
    fn test_shutdown_hook() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let ctx = AppContext::with_deployment(Deployment::with_domain("prod"))
            .with_shutdown_hook(Arc::new(move |err: &EntryError| {
                recorder.lock().push(err.to_string());
            }));

        ctx.shutdown_with_error(&crate::entry_error!(connection, "boom"));
        assert_eq!(seen.lock().len(), 1);
        assert!(seen.lock()[0].contains("boom"));
        assert_eq!(ctx.deployment().domain.as_deref(), Some("prod"));
    }
}
