//! 语句日志适配器

use std::sync::Arc;
use std::time::Duration;

use super::{LogSink, QueryEvent, QueryLogLevel, QueryLogger};
use crate::config::LogLevel;

/// 默认慢查询阈值
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(5000);

/// 把语句事件转交给 [`LogSink`] 的适配器
///
/// 构造后除了持有 delegate 外没有其它状态
#[derive(Clone)]
pub struct Logger {
    delegate: Arc<dyn LogSink>,
    level: QueryLogLevel,
    slow_threshold: Duration,
    ignore_record_not_found: bool,
}

impl Logger {
    /// 使用默认参数创建：warn 级别，慢查询阈值 5000ms
    pub fn new(delegate: Arc<dyn LogSink>) -> Self {
        Self {
            delegate,
            level: QueryLogLevel::Warn,
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
            ignore_record_not_found: false,
        }
    }

    /// 创建日志适配器构建器
    pub fn builder() -> crate::config::LoggerConfigBuilder {
        crate::config::LoggerConfigBuilder::new()
    }

    pub(crate) fn from_parts(
        delegate: Arc<dyn LogSink>,
        level: QueryLogLevel,
        slow_threshold: Duration,
        ignore_record_not_found: bool,
    ) -> Self {
        Self {
            delegate,
            level,
            slow_threshold,
            ignore_record_not_found,
        }
    }

    pub fn delegate(&self) -> &Arc<dyn LogSink> {
        &self.delegate
    }

    pub fn level(&self) -> QueryLogLevel {
        self.level
    }

    pub fn slow_threshold(&self) -> Duration {
        self.slow_threshold
    }

    pub fn ignore_record_not_found(&self) -> bool {
        self.ignore_record_not_found
    }

    /// 返回调整了级别的副本
    pub fn with_level(&self, level: QueryLogLevel) -> Self {
        Self {
            level,
            ..self.clone()
        }
    }

    fn event_fields(event: &QueryEvent<'_>) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("database", event.database.to_string()),
            ("elapsedMs", format!("{:.3}", event.elapsed.as_secs_f64() * 1000.0)),
            (
                "rows",
                event.rows.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
            ),
            ("sql", event.sql.to_string()),
        ];
        if let Some(err) = event.error {
            fields.push(("error", err.to_string()));
        }
        fields
    }
}

impl QueryLogger for Logger {
    fn info(&self, message: &str) {
        if self.level >= QueryLogLevel::Info {
            self.delegate.log(LogLevel::Info, message, &[]);
        }
    }

    fn warn(&self, message: &str) {
        if self.level >= QueryLogLevel::Warn {
            self.delegate.log(LogLevel::Warn, message, &[]);
        }
    }

    fn error(&self, message: &str) {
        if self.level >= QueryLogLevel::Error {
            self.delegate.log(LogLevel::Error, message, &[]);
        }
    }

    fn trace(&self, event: &QueryEvent<'_>) {
        if self.level == QueryLogLevel::Silent {
            return;
        }

        let fields = Self::event_fields(event);
        match event.error {
            Some(err)
                if self.level >= QueryLogLevel::Error
                    && !(err.is_record_not_found() && self.ignore_record_not_found) =>
            {
                self.delegate.log(LogLevel::Error, "sql error", &fields);
            }
            _ if !self.slow_threshold.is_zero() && event.elapsed > self.slow_threshold => {
                // 慢查询不受最小级别限制
                let message = format!("SLOW SQL >= {:?}", self.slow_threshold);
                self.delegate.log(LogLevel::Warn, &message, &fields);
            }
            _ if self.level == QueryLogLevel::Info => {
                self.delegate.log(LogLevel::Info, "sql", &fields);
            }
            _ => {}
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("slow_threshold", &self.slow_threshold)
            .field("ignore_record_not_found", &self.ignore_record_not_found)
            .finish()
    }
}
