//! # 日志适配模块
//!
//! 语句日志能力（[`QueryLogger`]）、日志输出端（[`LogSink`]）以及把二者
//! 连接起来的 [`Logger`] 适配器

mod adapter;
mod sink;

pub use adapter::{Logger, DEFAULT_SLOW_THRESHOLD};
pub use sink::{FileSink, LogSink, LoggerEntry, MemorySink, RatLoggerSink, LogRecord};

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EntryError;

/// 一次语句执行事件
#[derive(Debug, Clone, Copy)]
pub struct QueryEvent<'a> {
    /// 逻辑数据库名
    pub database: &'a str,
    /// 语句文本
    pub sql: &'a str,
    /// 执行耗时
    pub elapsed: Duration,
    /// 影响行数，未知时为 None
    pub rows: Option<u64>,
    /// 执行错误
    pub error: Option<&'a EntryError>,
}

/// 语句日志能力
///
/// 每个数据库句柄的配置里注入一个实现
pub trait QueryLogger: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    /// 记录一次语句执行
    fn trace(&self, event: &QueryEvent<'_>);
}

/// 语句日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryLogLevel {
    /// 不输出
    Silent,
    /// 仅错误
    Error,
    /// 错误与警告（含慢查询）
    Warn,
    /// 全部语句
    Info,
}

impl QueryLogLevel {
    /// 解析配置中的级别字符串，无法识别时返回 None
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "silent" => Some(QueryLogLevel::Silent),
            "error" => Some(QueryLogLevel::Error),
            "warn" => Some(QueryLogLevel::Warn),
            "info" => Some(QueryLogLevel::Info),
            _ => None,
        }
    }
}

/// 日志编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogEncoding {
    #[default]
    Console,
    Json,
}

impl LogEncoding {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            LogEncoding::Json
        } else {
            LogEncoding::Console
        }
    }
}

/// 日志文件滚动周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// 不滚动，始终写同一个文件
    Never,
    Hourly,
    #[default]
    Daily,
}

impl LogRotation {
    pub(crate) fn to_appender(self) -> tracing_appender::rolling::Rotation {
        use tracing_appender::rolling::Rotation;
        match self {
            LogRotation::Never => Rotation::NEVER,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
        }
    }
}
