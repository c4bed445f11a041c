//! 语句插件
//!
//! 插件在每条经由 [`DbHandle`](crate::entry::DbHandle) 执行的语句前后被调用

mod metrics;
mod trace;

pub use metrics::{MetricSample, MetricsPlugin};
pub use trace::TracePlugin;

use serde::{Deserialize, Serialize};

use crate::logger::QueryEvent;

/// 插件能力
pub trait Plugin: Send + Sync {
    /// 插件名称
    fn name(&self) -> &str;

    /// 语句执行前回调
    fn before_statement(&self, _database: &str, _sql: &str) {}

    /// 语句执行后回调
    fn after_statement(&self, event: &QueryEvent<'_>);

    /// 插件收集的指标，默认没有
    fn metrics(&self) -> Vec<MetricSample> {
        Vec::new()
    }
}

/// 插件配置
///
/// 地址、库名、类型在注册时由入口填充
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginConfig {
    /// 是否启用
    pub enabled: bool,
    /// 数据库地址
    #[serde(skip)]
    pub db_addr: String,
    /// 数据库名
    #[serde(skip)]
    pub db_name: String,
    /// 数据库类型
    #[serde(skip)]
    pub db_type: String,
}

impl PluginConfig {
    /// 补全数据库相关属性
    pub fn with_target(mut self, db_type: &str, db_addr: &str, db_name: &str) -> Self {
        self.db_type = db_type.to_string();
        self.db_addr = db_addr.to_string();
        self.db_name = db_name.to_string();
        self
    }
}
