//! 启动配置到入口的转换
//!
//! 按部署环境筛选配置块，构建日志适配器与入口选项并完成注册

use rat_logger::{error, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::builders::EntryOptions;
use super::core::{BootConfigEntry, LoggerDecl};
use super::locale::{Deployment, is_wildcard_domain, is_wildcard_locale};
use crate::entry::{DatabaseEntry, Driver};
use crate::error::EntryResult;
use crate::logger::{FileSink, LogEncoding, LogSink, Logger, QueryLogLevel};
use crate::manager::AppContext;
use crate::plugin::{MetricsPlugin, Plugin, TracePlugin};
use crate::types::DatabaseType;
use crate::utils::to_abs_path;

impl BootConfigEntry {
    /// 该配置块是否适用于当前部署
    pub fn matches(&self, deployment: &Deployment) -> bool {
        match &self.locale {
            Some(locale) => deployment.matches_locale(locale),
            None => deployment.matches_domain(&self.domain),
        }
    }

    /// 是否指定了具体的部署（非通配）
    pub fn is_specific(&self) -> bool {
        match &self.locale {
            Some(locale) => !is_wildcard_locale(locale),
            None => !is_wildcard_domain(&self.domain),
        }
    }
}

/// 从同名配置块中选出适用于当前部署的一个
///
/// 第一个匹配的块先被选中，之后只有指定了具体部署的块才会替换它；
/// 结果保持名称第一次出现的顺序
pub fn select_entries<'a>(
    entries: &'a [BootConfigEntry],
    deployment: &Deployment,
) -> Vec<&'a BootConfigEntry> {
    let mut order: Vec<&str> = Vec::new();
    let mut selected: HashMap<&str, &BootConfigEntry> = HashMap::new();

    for entry in entries {
        if !entry.enabled || entry.name.is_empty() {
            continue;
        }

        if !entry.matches(deployment) {
            continue;
        }

        if !selected.contains_key(entry.name.as_str()) {
            order.push(&entry.name);
            selected.insert(&entry.name, entry);
            continue;
        }

        if entry.is_specific() {
            selected.insert(&entry.name, entry);
        }
    }

    order
        .into_iter()
        .filter_map(|name| selected.get(name).copied())
        .collect()
}

/// 按日志声明构建语句日志适配器
///
/// 引用的日志入口不存在时使用默认入口。声明了 json 编码或输出路径时
/// 只覆盖这两项：声明路径时按入口当前编码（或 json）打开新文件，
/// 只声明 json 时入口的输出端以新编码输出到原目标。
/// 打开输出路径失败交给关闭钩子并回退到入口自带的输出端
pub fn build_logger(ctx: &AppContext, decl: &LoggerDecl) -> Logger {
    let level = QueryLogLevel::parse(&decl.level).unwrap_or(QueryLogLevel::Warn);

    let slow_threshold = if decl.slow_threshold_ms > 0 {
        Duration::from_millis(decl.slow_threshold_ms)
    } else {
        crate::logger::DEFAULT_SLOW_THRESHOLD
    };

    let logger_entry = ctx
        .get_logger_entry(&decl.entry)
        .unwrap_or_else(|| ctx.default_logger_entry());
    let base = logger_entry.sink();

    let json = LogEncoding::parse(&decl.encoding) == LogEncoding::Json;
    let sink: Arc<dyn LogSink> = if !decl.output_paths.is_empty() {
        let encoding = if json { LogEncoding::Json } else { base.encoding() };
        let paths = to_abs_path(&decl.output_paths);
        match FileSink::open(encoding, decl.rotation, &paths) {
            Ok(sink) => Arc::new(sink),
            Err(err) => {
                error!("打开日志输出路径失败: {:?}, {}", paths, err);
                ctx.shutdown_with_error(&err);
                base
            }
        }
    } else if json {
        base.with_encoding(LogEncoding::Json).unwrap_or(base)
    } else {
        base
    };

    Logger::from_parts(sink, level, slow_threshold, decl.ignore_record_not_found_error)
}

fn plugins_for(
    db_type: DatabaseType,
    element: &BootConfigEntry,
    db: &super::core::DatabaseDecl,
) -> Vec<Arc<dyn Plugin>> {
    let mut plugins: Vec<Arc<dyn Plugin>> = Vec::new();

    if db.plugins.trace.enabled {
        let config = db
            .plugins
            .trace
            .clone()
            .with_target(db_type.as_str(), &element.addr, &db.name);
        plugins.push(Arc::new(TracePlugin::new(config)));
    }

    if db.plugins.metrics.enabled {
        let config = db
            .plugins
            .metrics
            .clone()
            .with_target(db_type.as_str(), &element.addr, &db.name);
        plugins.push(Arc::new(MetricsPlugin::new(config)));
    }

    plugins
}

/// 把配置块转换为入口选项
///
/// # 错误
///
/// 连接池声明不合法时返回配置错误
pub fn entry_options(
    ctx: &AppContext,
    db_type: DatabaseType,
    element: &BootConfigEntry,
) -> EntryResult<EntryOptions> {
    let logger = build_logger(ctx, &element.logger);

    let mut options = EntryOptions::new()
        .name(element.name.as_str())
        .description(element.description.as_str())
        .user(element.user.as_str())
        .pass(element.pass.as_str())
        .addr(element.addr.as_str())
        .logger(Arc::new(logger));

    for db in &element.database {
        options = options.database(db.name.as_str(), db.dry_run, db.auto_create, db.params.iter().cloned());

        for plugin in plugins_for(db_type, element, db) {
            options = options.plugin(&db.name, plugin);
        }

        if let Some(pool) = &db.pool {
            options = options.pool(&db.name, pool.to_pool_config()?);
        }

        if db_type == DatabaseType::SQLite {
            options = options.in_memory(&db.name, db.in_memory);
            if let Some(dir) = &db.db_dir {
                options = options.db_dir(&db.name, dir.as_str());
            }
        }
    }

    Ok(options)
}

/// 注册适用于当前部署的所有入口，返回 名称 -> 入口
///
/// 不合法的配置块被跳过；注册失败属于致命错误，交给关闭钩子处理
pub fn register_from_boot<D: Driver>(
    ctx: &AppContext,
    entries: &[BootConfigEntry],
) -> HashMap<String, Arc<DatabaseEntry<D>>> {
    let mut result = HashMap::new();

    for element in select_entries(entries, ctx.deployment()) {
        let options = match entry_options(ctx, D::DB_TYPE, element) {
            Ok(options) => options,
            Err(err) => {
                warn!("跳过配置块 {} [{}]: {}", D::ENTRY_TYPE, element.name, err);
                continue;
            }
        };

        match DatabaseEntry::<D>::register(ctx, options) {
            Ok(entry) => {
                result.insert(element.name.clone(), entry);
            }
            Err(err) => {
                error!("注册入口失败 {} [{}]: {}", D::ENTRY_TYPE, element.name, err);
                ctx.shutdown_with_error(&err);
            }
        }
    }

    result
}
