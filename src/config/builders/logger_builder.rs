//! # 日志适配器构建器模块
//!
//! 构建语句日志适配器 [`Logger`]，输出端必须显式设置

use std::sync::Arc;
use std::time::Duration;

use crate::error::EntryError;
use crate::logger::{DEFAULT_SLOW_THRESHOLD, LogSink, Logger, QueryLogLevel};

/// 日志适配器构建器
pub struct LoggerConfigBuilder {
    delegate: Option<Arc<dyn LogSink>>,
    level: Option<QueryLogLevel>,
    slow_threshold: Option<Duration>,
    ignore_record_not_found: Option<bool>,
}

impl LoggerConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            delegate: None,
            level: None,
            slow_threshold: None,
            ignore_record_not_found: None,
        }
    }

    /// 设置输出端
    ///
    /// # 参数
    ///
    /// * `delegate` - 日志输出端
    pub fn delegate(mut self, delegate: Arc<dyn LogSink>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// 设置最小级别，未设置时为 warn
    pub fn level(mut self, level: QueryLogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// 设置慢查询阈值，零表示关闭慢查询日志
    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    /// 设置是否忽略"记录不存在"错误
    pub fn ignore_record_not_found(mut self, ignore: bool) -> Self {
        self.ignore_record_not_found = Some(ignore);
        self
    }

    /// 构建日志适配器
    ///
    /// # 错误
    ///
    /// 未设置输出端时返回配置错误
    pub fn build(self) -> Result<Logger, EntryError> {
        let delegate = self
            .delegate
            .ok_or_else(|| crate::entry_error!(config, "日志输出端必须设置"))?;

        Ok(Logger::from_parts(
            delegate,
            self.level.unwrap_or(QueryLogLevel::Warn),
            self.slow_threshold.unwrap_or(DEFAULT_SLOW_THRESHOLD),
            self.ignore_record_not_found.unwrap_or(false),
        ))
    }
}

impl Default for LoggerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
