//! 语句追踪插件

use rat_logger::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use super::{Plugin, PluginConfig};
use crate::logger::QueryEvent;

/// 为每条语句生成一个 span 并输出调试日志
#[derive(Debug)]
pub struct TracePlugin {
    config: PluginConfig,
    spans: AtomicU64,
}

impl TracePlugin {
    pub fn new(config: PluginConfig) -> Self {
        Self {
            config,
            spans: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// 已记录的 span 数量
    pub fn span_count(&self) -> u64 {
        self.spans.load(Ordering::Relaxed)
    }
}

impl Plugin for TracePlugin {
    fn name(&self) -> &str {
        "trace"
    }

    fn after_statement(&self, event: &QueryEvent<'_>) {
        let span_id = Uuid::new_v4();
        self.spans.fetch_add(1, Ordering::Relaxed);

        match event.error {
            Some(err) => warn!(
                "sql span={} db.type={} db.addr={} db.name={} elapsed={:?} error={} sql={}",
                span_id, self.config.db_type, self.config.db_addr, self.config.db_name,
                event.elapsed, err, event.sql
            ),
            None => debug!(
                "sql span={} db.type={} db.addr={} db.name={} elapsed={:?} rows={:?} sql={}",
                span_id, self.config.db_type, self.config.db_addr, self.config.db_name,
                event.elapsed, event.rows, event.sql
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_span_counter() {
        let plugin = TracePlugin::new(PluginConfig {
            enabled: true,
            ..Default::default()
        });
        let event = QueryEvent {
            database: "user",
            sql: "SELECT 1",
            elapsed: Duration::from_millis(1),
            rows: None,
            error: None,
        };
        plugin.after_statement(&event);
        plugin.after_statement(&event);
        assert_eq!(plugin.span_count(), 2);
        assert!(plugin.metrics().is_empty());
        assert_eq!(plugin.name(), "trace");
    }
}
