//! 单个逻辑数据库的句柄

use rat_logger::debug;
use sqlx::{Connection, Pool};
use std::sync::Arc;
use std::time::Instant;

use super::Driver;
use crate::error::{EntryError, EntryResult};
use crate::logger::{QueryEvent, QueryLogger};
use crate::plugin::Plugin;

/// 逻辑数据库的运行配置
///
/// 注册时为每个不同的数据库名创建一份
#[derive(Clone)]
pub struct DbConfig {
    /// 语句日志
    pub logger: Arc<dyn QueryLogger>,
    /// 演练模式
    pub dry_run: bool,
    /// 挂载的插件
    pub plugins: Vec<Arc<dyn Plugin>>,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("DbConfig")
            .field("dry_run", &self.dry_run)
            .field("plugins", &plugins)
            .finish()
    }
}

/// 已建立的数据库句柄，克隆开销很小
///
/// 连接池由 sqlx 提供，通过 [`pool`](Self::pool) 可以直接使用
pub struct DbHandle<D: Driver> {
    name: String,
    pool: Pool<D::Db>,
    config: DbConfig,
}

impl<D: Driver> Clone for DbHandle<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            pool: self.pool.clone(),
            config: self.config.clone(),
        }
    }
}

impl<D: Driver> DbHandle<D> {
    pub(crate) fn new(name: String, pool: Pool<D::Db>, config: DbConfig) -> Self {
        Self { name, pool, config }
    }

    /// 数据库名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 底层连接池
    pub fn pool(&self) -> &Pool<D::Db> {
        &self.pool
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }

    /// 执行一条语句并返回影响行数
    ///
    /// 插件与语句日志在执行前后被调用；演练模式下语句只记录不发送，返回0
    pub async fn execute(&self, sql: &str) -> EntryResult<u64> {
        for plugin in &self.config.plugins {
            plugin.before_statement(&self.name, sql);
        }

        let start = Instant::now();
        let result = if self.config.dry_run {
            debug!("演练模式，跳过语句: {}", sql);
            Ok(0)
        } else {
            D::execute(&self.pool, sql).await.map_err(EntryError::from)
        };

        let event = QueryEvent {
            database: &self.name,
            sql,
            elapsed: start.elapsed(),
            rows: result.as_ref().ok().copied(),
            error: result.as_ref().err(),
        };
        self.config.logger.trace(&event);
        for plugin in &self.config.plugins {
            plugin.after_statement(&event);
        }

        result
    }

    /// 获取一个连接并发送 ping
    pub async fn ping(&self) -> EntryResult<()> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    /// 关闭连接池，重复调用没有副作用
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

impl<D: Driver> std::fmt::Debug for DbHandle<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbHandle")
            .field("name", &self.name)
            .field("dry_run", &self.config.dry_run)
            .field("closed", &self.pool.is_closed())
            .finish()
    }
}
