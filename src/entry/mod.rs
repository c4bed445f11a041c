//! # 数据库入口模块
//!
//! [`DatabaseEntry`] 持有一组逻辑数据库的声明与连接，负责
//! 注册、启动（建库与连接）、中断和健康检查；
//! 具体数据库的差异由 [`Driver`] 描述

mod handle;

pub use handle::{DbConfig, DbHandle};

use async_trait::async_trait;
use parking_lot::RwLock;
use rat_logger::warn;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use sqlx::{Connection, Database, Pool};
use std::any::Any;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{EntryOptions, LogLevel};
use crate::error::{EntryError, EntryResult};
use crate::logger::{Logger, QueryLogger};
use crate::manager::{AppContext, ShutdownHook};
use crate::plugin::MetricSample;
use crate::security::{REDACTED, redact_credentials};
use crate::types::{DatabaseInner, DatabaseType};

/// 驱动的连接选项类型
pub type ConnectOpts<DB> = <<DB as Database>::Connection as Connection>::Options;

/// 注册表中的入口能力
#[async_trait]
pub trait Entry: Send + Sync + 'static {
    /// 入口名称
    fn name(&self) -> &str;
    /// 入口类型，如 `SqliteEntry`
    fn entry_type(&self) -> &str;
    fn description(&self) -> &str;
    /// 诊断用的JSON表示，不包含密码
    fn to_json(&self) -> String;
    /// 建库并连接，失败时交给关闭钩子处理
    async fn bootstrap(&self, event_id: Option<&str>);
    /// 关闭所有连接
    async fn interrupt(&self, event_id: Option<&str>);
    async fn is_healthy(&self) -> bool;
    /// 用于按具体类型取回入口
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// 连接目标
#[derive(Clone, Copy)]
pub struct Target<'a> {
    pub user: &'a str,
    pub pass: &'a str,
    pub addr: &'a str,
}

/// 数据库驱动
///
/// 只描述连接选项的拼装与建库方式，连接池和语句执行由 sqlx 完成
#[async_trait]
pub trait Driver: Send + Sync + Sized + 'static {
    type Db: Database;

    const ENTRY_TYPE: &'static str;
    const DB_TYPE: DatabaseType;
    const DEFAULT_NAME: &'static str;
    const DEFAULT_USER: &'static str;
    const DEFAULT_PASS: &'static str;
    const DEFAULT_ADDR: &'static str;

    /// 连接指定数据库的选项
    fn connect_options(target: &Target<'_>, inner: &DatabaseInner) -> EntryResult<ConnectOpts<Self::Db>>;

    /// 数据库不存在时创建
    async fn ensure_database(target: &Target<'_>, inner: &DatabaseInner) -> EntryResult<()>;

    /// 执行语句并返回影响行数
    async fn execute(pool: &Pool<Self::Db>, sql: &str) -> Result<u64, sqlx::Error>;

    /// 错误消息里使用的连接目标描述，密码已脱敏
    fn describe_target(target: &Target<'_>, _inner: &DatabaseInner) -> String {
        format!("{}:{}@{}", target.user, REDACTED, target.addr)
    }
}

/// 入口生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum EntryState {
    Constructed,
    Bootstrapped,
    Interrupted,
}

/// 数据库入口
pub struct DatabaseEntry<D: Driver> {
    name: String,
    description: String,
    user: String,
    pass: String,
    addr: String,
    inner_dbs: Vec<DatabaseInner>,
    logger: Arc<Logger>,
    config_map: HashMap<String, DbConfig>,
    db_map: RwLock<HashMap<String, DbHandle<D>>>,
    state: RwLock<EntryState>,
    shutdown_hook: ShutdownHook,
}

impl<D: Driver> DatabaseEntry<D> {
    /// 创建入口并加入注册表
    ///
    /// 未设置的字段取驱动默认值；同类型同名入口已存在时返回错误
    pub fn register(ctx: &AppContext, options: EntryOptions) -> EntryResult<Arc<Self>> {
        let entry = Arc::new(Self::build(ctx, options));
        ctx.registry().add(entry.clone())?;
        Ok(entry)
    }

    fn build(ctx: &AppContext, options: EntryOptions) -> Self {
        let logger = options
            .logger
            .unwrap_or_else(|| Arc::new(Logger::new(ctx.default_logger_entry().sink())));

        let name = options.name.unwrap_or_else(|| D::DEFAULT_NAME.to_string());
        let user = options.user.unwrap_or_else(|| D::DEFAULT_USER.to_string());
        let pass = options.pass.unwrap_or_else(|| D::DEFAULT_PASS.to_string());
        let addr = options.addr.unwrap_or_else(|| D::DEFAULT_ADDR.to_string());
        let description = options.description.unwrap_or_else(|| {
            format!(
                "{} entry with name of {}, addr:{}, user:{}",
                D::ENTRY_TYPE,
                name,
                addr,
                user
            )
        });

        let query_logger: Arc<dyn QueryLogger> = logger.clone();
        let mut config_map = HashMap::new();
        for inner in &options.databases {
            let previous = config_map.insert(
                inner.name.clone(),
                DbConfig {
                    logger: query_logger.clone(),
                    dry_run: inner.dry_run,
                    plugins: inner.plugins.clone(),
                },
            );
            if previous.is_some() {
                warn!("{} [{}] 重复声明数据库: {}", D::ENTRY_TYPE, name, inner.name);
            }
        }

        Self {
            name,
            description,
            user,
            pass,
            addr,
            inner_dbs: options.databases,
            logger,
            config_map,
            db_map: RwLock::new(HashMap::new()),
            state: RwLock::new(EntryState::Constructed),
            shutdown_hook: ctx.shutdown_hook(),
        }
    }

    /// 按名称取回已注册的入口，类型不符或不存在时返回 None
    pub fn get(ctx: &AppContext, name: &str) -> Option<Arc<Self>> {
        ctx.registry()
            .get(D::ENTRY_TYPE, name)
            .and_then(|entry| entry.as_any().downcast::<Self>().ok())
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn state(&self) -> EntryState {
        *self.state.read()
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// 声明的逻辑数据库，保持声明顺序
    pub fn databases(&self) -> &[DatabaseInner] {
        &self.inner_dbs
    }

    /// 按数据库名分组的运行配置
    pub fn configs(&self) -> &HashMap<String, DbConfig> {
        &self.config_map
    }

    /// 获取已连接的数据库句柄
    pub fn get_db(&self, name: &str) -> Option<DbHandle<D>> {
        self.db_map.read().get(name).cloned()
    }

    /// 已连接的数据库名，按名称排序
    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.db_map.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// 汇总所有插件的指标
    pub fn metrics(&self) -> Vec<MetricSample> {
        self.inner_dbs
            .iter()
            .flat_map(|inner| inner.plugins.iter())
            .flat_map(|plugin| plugin.metrics())
            .collect()
    }

    fn target(&self) -> Target<'_> {
        Target {
            user: &self.user,
            pass: &self.pass,
            addr: &self.addr,
        }
    }

    fn lifecycle_fields(&self, event_id: Option<&str>) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(3);
        if let Some(id) = event_id {
            fields.push(("eventId", id.to_string()));
        }
        fields.push(("entryName", self.name.clone()));
        fields.push(("entryType", D::ENTRY_TYPE.to_string()));
        fields
    }

    fn log_info(&self, message: &str) {
        self.logger.delegate().log(LogLevel::Info, message, &[]);
    }

    /// 按声明顺序建库并连接，遇到第一个错误即停止
    ///
    /// 已建立的连接保持打开，由 interrupt 关闭
    async fn connect(&self) -> Result<(), (String, EntryError)> {
        let target = self.target();

        for inner in &self.inner_dbs {
            let describe = || D::describe_target(&target, inner);

            if !inner.dry_run && inner.auto_create {
                self.log_info(&format!("Creating database [{}]", inner.name));
                D::ensure_database(&target, inner)
                    .await
                    .map_err(|e| (describe(), e))?;
                self.log_info(&format!("Creating database [{}] success", inner.name));
            }

            let options = D::connect_options(&target, inner).map_err(|e| (describe(), e))?;
            let pool_options = inner.pool_config().to_pool_options::<D::Db>();

            let pool = if inner.dry_run {
                self.log_info(&format!("Database [{}] is in dry-run mode", inner.name));
                pool_options.min_connections(0).connect_lazy_with(options)
            } else {
                self.log_info(&format!("Connecting to database [{}]", inner.name));
                pool_options
                    .connect_with(options)
                    .await
                    .map_err(|e| (describe(), EntryError::from(e)))?
            };

            // 句柄配置跟随当前这条声明，同名声明各自保留演练模式
            let config = DbConfig {
                logger: self.logger.clone(),
                dry_run: inner.dry_run,
                plugins: inner.plugins.clone(),
            };

            let handle = DbHandle::new(inner.name.clone(), pool, config);
            let replaced = self.db_map.write().insert(inner.name.clone(), handle);
            if let Some(old) = replaced {
                old.close().await;
            }

            if !inner.dry_run {
                self.log_info(&format!("Connecting to database [{}] success", inner.name));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl<D: Driver> Entry for DatabaseEntry<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn entry_type(&self) -> &str {
        D::ENTRY_TYPE
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    async fn bootstrap(&self, event_id: Option<&str>) {
        let mut fields = self.lifecycle_fields(event_id);
        let message = format!("Bootstrap {}", D::ENTRY_TYPE);
        self.logger.delegate().log(LogLevel::Info, &message, &fields);

        if self.state() == EntryState::Bootstrapped {
            warn!("{} [{}] 已经启动，忽略重复调用", D::ENTRY_TYPE, self.name);
            return;
        }

        let result = self.connect().await;
        *self.state.write() = EntryState::Bootstrapped;

        if let Err((target, err)) = result {
            fields.push(("error", redact_credentials(&err.to_string(), &self.pass)));
            self.logger
                .delegate()
                .log(LogLevel::Error, "Failed to connect to database", &fields);

            let fatal = crate::entry_error!(
                connection,
                format!("failed to connect to database at {}", target)
            );
            (self.shutdown_hook)(&fatal);
        }
    }

    async fn interrupt(&self, event_id: Option<&str>) {
        let handles: Vec<DbHandle<D>> = self.db_map.write().drain().map(|(_, h)| h).collect();
        for handle in &handles {
            handle.close().await;
        }
        *self.state.write() = EntryState::Interrupted;

        let fields = self.lifecycle_fields(event_id);
        let message = format!("Interrupt {}", D::ENTRY_TYPE);
        self.logger.delegate().log(LogLevel::Info, &message, &fields);
    }

    /// 所有非演练句柄都能取得连接并响应 ping 时为健康
    async fn is_healthy(&self) -> bool {
        let handles: Vec<DbHandle<D>> = self.db_map.read().values().cloned().collect();
        for handle in handles.iter().filter(|h| !h.is_dry_run()) {
            if let Err(e) = handle.ping().await {
                warn!("{} [{}] 数据库 {} 不健康: {}", D::ENTRY_TYPE, self.name, handle.name(), e);
                return false;
            }
        }
        true
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseView<'a> {
    name: &'a str,
    dry_run: bool,
    auto_create: bool,
    params: &'a [String],
    in_memory: bool,
    db_dir: Option<&'a PathBuf>,
    plugins: Vec<&'a str>,
}

impl<D: Driver> Serialize for DatabaseEntry<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let databases: Vec<DatabaseView<'_>> = self
            .inner_dbs
            .iter()
            .map(|inner| DatabaseView {
                name: &inner.name,
                dry_run: inner.dry_run,
                auto_create: inner.auto_create,
                params: &inner.params,
                in_memory: inner.in_memory,
                db_dir: inner.db_dir.as_ref(),
                plugins: inner.plugins.iter().map(|p| p.name()).collect(),
            })
            .collect();

        let mut state = serializer.serialize_struct("DatabaseEntry", 7)?;
        state.serialize_field("entryName", &self.name)?;
        state.serialize_field("entryType", D::ENTRY_TYPE)?;
        state.serialize_field("entryDescription", &self.description)?;
        state.serialize_field("user", &self.user)?;
        state.serialize_field("addr", &self.addr)?;
        state.serialize_field("databases", &databases)?;
        state.serialize_field("state", &self.state())?;
        state.end()
    }
}

impl<D: Driver> std::fmt::Debug for DatabaseEntry<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseEntry")
            .field("name", &self.name)
            .field("type", &D::ENTRY_TYPE)
            .field("user", &self.user)
            .field("addr", &self.addr)
            .field("databases", &self.inner_dbs)
            .field("state", &self.state())
            .finish()
    }
}
