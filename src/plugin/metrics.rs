//! 进程内语句指标插件

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{Plugin, PluginConfig};
use crate::logger::QueryEvent;

#[derive(Debug, Default)]
struct OperationStats {
    count: AtomicU64,
    errors: AtomicU64,
    elapsed_micros: AtomicU64,
}

/// 指标快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub db_type: String,
    pub db_addr: String,
    pub db_name: String,
    /// 语句类型（select/insert/...）
    pub operation: String,
    pub count: u64,
    pub errors: u64,
    pub elapsed_micros: u64,
}

/// 按语句类型统计次数、错误数和耗时
#[derive(Debug)]
pub struct MetricsPlugin {
    config: PluginConfig,
    stats: DashMap<String, OperationStats>,
}

impl MetricsPlugin {
    pub fn new(config: PluginConfig) -> Self {
        Self {
            config,
            stats: DashMap::new(),
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }
}

/// 取语句的第一个关键字作为操作类型
fn operation_of(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "unknown".to_string())
}

impl Plugin for MetricsPlugin {
    fn name(&self) -> &str {
        "metrics"
    }

    fn after_statement(&self, event: &QueryEvent<'_>) {
        let stats = self.stats.entry(operation_of(event.sql)).or_default();
        stats.count.fetch_add(1, Ordering::Relaxed);
        stats
            .elapsed_micros
            .fetch_add(event.elapsed.as_micros() as u64, Ordering::Relaxed);
        if event.error.is_some() {
            stats.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn metrics(&self) -> Vec<MetricSample> {
        let mut samples: Vec<MetricSample> = self
            .stats
            .iter()
            .map(|item| MetricSample {
                db_type: self.config.db_type.clone(),
                db_addr: self.config.db_addr.clone(),
                db_name: self.config.db_name.clone(),
                operation: item.key().clone(),
                count: item.value().count.load(Ordering::Relaxed),
                errors: item.value().errors.load(Ordering::Relaxed),
                elapsed_micros: item.value().elapsed_micros.load(Ordering::Relaxed),
            })
            .collect();
        samples.sort_by(|a, b| a.operation.cmp(&b.operation));
        samples
    }
}
