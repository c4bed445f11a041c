//! # 入口选项构建器模块
//!
//! 以链式调用收集入口的连接参数与逻辑数据库声明
//! 空值调用不会覆盖已有值

use std::path::PathBuf;
use std::sync::Arc;

use crate::logger::Logger;
use crate::plugin::Plugin;
use crate::types::{DatabaseInner, PoolConfig};

/// 入口选项
///
/// 未设置的字段在注册时取各数据库类型的默认值
#[derive(Debug, Clone, Default)]
pub struct EntryOptions {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) user: Option<String>,
    pub(crate) pass: Option<String>,
    pub(crate) addr: Option<String>,
    pub(crate) logger: Option<Arc<Logger>>,
    pub(crate) databases: Vec<DatabaseInner>,
}

fn non_empty<S: Into<String>>(value: S) -> Option<String> {
    let value = value.into();
    if value.is_empty() { None } else { Some(value) }
}

impl EntryOptions {
    /// 创建空的选项
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置入口名称
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        if let Some(name) = non_empty(name) {
            self.name = Some(name);
        }
        self
    }

    /// 设置入口描述
    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        if let Some(description) = non_empty(description) {
            self.description = Some(description);
        }
        self
    }

    /// 设置用户名
    pub fn user<S: Into<String>>(mut self, user: S) -> Self {
        if let Some(user) = non_empty(user) {
            self.user = Some(user);
        }
        self
    }

    /// 设置密码
    pub fn pass<S: Into<String>>(mut self, pass: S) -> Self {
        if let Some(pass) = non_empty(pass) {
            self.pass = Some(pass);
        }
        self
    }

    /// 设置服务地址，格式为 host:port
    pub fn addr<S: Into<String>>(mut self, addr: S) -> Self {
        if let Some(addr) = non_empty(addr) {
            self.addr = Some(addr);
        }
        self
    }

    /// 设置语句日志适配器
    pub fn logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// 声明一个逻辑数据库
    ///
    /// 名称为空时忽略；同名声明会追加而不是合并
    ///
    /// # 参数
    ///
    /// * `name` - 数据库名
    /// * `dry_run` - 演练模式，不连接也不执行语句
    /// * `auto_create` - 连接前自动创建数据库
    /// * `params` - 额外连接参数，格式为 key=value
    pub fn database<S, I, P>(mut self, name: S, dry_run: bool, auto_create: bool, params: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let Some(name) = non_empty(name) else {
            return self;
        };

        let mut inner = DatabaseInner::new(name, dry_run, auto_create);
        inner.params = params
            .into_iter()
            .map(Into::<String>::into)
            .filter(|p| !p.is_empty())
            .collect();
        self.databases.push(inner);
        self
    }

    /// 为同名数据库挂载插件，没有匹配的声明时忽略
    pub fn plugin(mut self, db_name: &str, plugin: Arc<dyn Plugin>) -> Self {
        self.for_each_db(db_name, |inner| inner.plugins.push(plugin.clone()));
        self
    }

    /// 设置SQLite数据库文件目录
    pub fn db_dir<P: Into<PathBuf>>(mut self, db_name: &str, dir: P) -> Self {
        let dir = dir.into();
        if dir.as_os_str().is_empty() {
            return self;
        }
        self.for_each_db(db_name, |inner| inner.db_dir = Some(dir.clone()));
        self
    }

    /// 设置SQLite是否使用内存数据库
    pub fn in_memory(mut self, db_name: &str, in_memory: bool) -> Self {
        self.for_each_db(db_name, |inner| inner.in_memory = in_memory);
        self
    }

    /// 设置连接池配置
    pub fn pool(mut self, db_name: &str, pool: PoolConfig) -> Self {
        self.for_each_db(db_name, |inner| inner.pool = Some(pool.clone()));
        self
    }

    /// 已声明的数据库
    pub fn databases(&self) -> &[DatabaseInner] {
        &self.databases
    }

    fn for_each_db<F: FnMut(&mut DatabaseInner)>(&mut self, db_name: &str, f: F) {
        if db_name.is_empty() {
            return;
        }
        self.databases
            .iter_mut()
            .filter(|inner| inner.name == db_name)
            .for_each(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{PluginConfig, TracePlugin};

    #[test]
    fn test_empty_values_are_ignored() {
        let options = EntryOptions::new()
            .name("user-db")
            .name("")
            .user("admin")
            .user("")
            .pass("")
            .addr("");

        assert_eq!(options.name.as_deref(), Some("user-db"));
        assert_eq!(options.user.as_deref(), Some("admin"));
        assert!(options.pass.is_none());
        assert!(options.addr.is_none());
    }

    #[test]
    fn test_database_declarations() {
        let options = EntryOptions::new()
            .database("", false, true, Vec::<String>::new())
            .database("user", false, true, ["sslmode=disable", ""])
            .database("user", true, false, Vec::<String>::new());

        let dbs = options.databases();
        assert_eq!(dbs.len(), 2);
        assert_eq!(dbs[0].params, vec!["sslmode=disable".to_string()]);
        assert!(dbs[1].dry_run);
    }

    #[test]
    fn test_per_database_mutators() {
        let trace: Arc<dyn Plugin> = Arc::new(TracePlugin::new(PluginConfig::default()));
        let options = EntryOptions::new()
            .database("user", false, false, Vec::<String>::new())
            .database("order", false, false, Vec::<String>::new())
            .plugin("user", trace.clone())
            .plugin("missing", trace)
            .db_dir("order", "data")
            .in_memory("user", true)
            .pool("order", PoolConfig::default());

        let dbs = options.databases();
        assert_eq!(dbs[0].plugins.len(), 1);
        assert!(dbs[0].in_memory);
        assert!(dbs[0].db_dir.is_none());
        assert!(dbs[1].plugins.is_empty());
        assert_eq!(dbs[1].db_dir, Some(PathBuf::from("data")));
        assert!(dbs[1].pool.is_some());
    }
}
