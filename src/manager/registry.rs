//! 入口注册表

use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use rat_logger::debug;
use std::sync::Arc;

use crate::entry::Entry;
use crate::error::EntryResult;

/// 按 (类型, 名称) 保存入口的并发注册表
#[derive(Default)]
pub struct EntryRegistry {
    entries: DashMap<(String, String), Arc<dyn Entry>>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加入口，同类型同名入口已存在时返回错误
    pub fn add(&self, entry: Arc<dyn Entry>) -> EntryResult<()> {
        let key = (entry.entry_type().to_string(), entry.name().to_string());
        match self.entries.entry(key) {
            MapEntry::Occupied(occupied) => {
                let (entry_type, name) = occupied.key();
                Err(crate::entry_error!(duplicate, entry_type, name))
            }
            MapEntry::Vacant(vacant) => {
                debug!("注册入口: type={}, name={}", entry.entry_type(), entry.name());
                vacant.insert(entry);
                Ok(())
            }
        }
    }

    /// 按类型与名称获取
    pub fn get(&self, entry_type: &str, name: &str) -> Option<Arc<dyn Entry>> {
        self.entries
            .get(&(entry_type.to_string(), name.to_string()))
            .map(|item| item.value().clone())
    }

    /// 只按名称获取，多个类型同名时返回其中任意一个
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Entry>> {
        self.entries
            .iter()
            .find(|item| item.key().1 == name)
            .map(|item| item.value().clone())
    }

    /// 删除所有类型下的同名入口，返回删除数量
    pub fn remove(&self, name: &str) -> usize {
        let keys: Vec<(String, String)> = self
            .entries
            .iter()
            .filter(|item| item.key().1 == name)
            .map(|item| item.key().clone())
            .collect();
        keys.iter()
            .filter(|key| self.entries.remove(*key).is_some())
            .count()
    }

    /// 删除指定类型的入口
    pub fn remove_typed(&self, entry_type: &str, name: &str) -> Option<Arc<dyn Entry>> {
        self.entries
            .remove(&(entry_type.to_string(), name.to_string()))
            .map(|(_, entry)| entry)
    }

    /// 所有入口，按 (类型, 名称) 排序
    pub fn list(&self) -> Vec<Arc<dyn Entry>> {
        let mut items: Vec<((String, String), Arc<dyn Entry>)> = self
            .entries
            .iter()
            .map(|item| (item.key().clone(), item.value().clone()))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        items.into_iter().map(|(_, entry)| entry).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for EntryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<(String, String)> = self.entries.iter().map(|i| i.key().clone()).collect();
        f.debug_struct("EntryRegistry").field("entries", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::any::Any;

    struct StubEntry {
        entry_type: &'static str,
        name: &'static str,
    }

    #[async_trait]
    impl Entry for StubEntry {
        fn name(&self) -> &str {
            self.name
        }
        fn entry_type(&self) -> &str {
            self.entry_type
        }
        fn description(&self) -> &str {
            ""
        }
        fn to_json(&self) -> String {
            "{}".to_string()
        }
        async fn bootstrap(&self, _event_id: Option<&str>) {}
        async fn interrupt(&self, _event_id: Option<&str>) {}
        async fn is_healthy(&self) -> bool {
            true
        }
        fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    fn stub(entry_type: &'static str, name: &'static str) -> Arc<dyn Entry> {
        Arc::new(StubEntry { entry_type, name })
    }

    #[test]
    fn test_add_and_get() {
        let registry = EntryRegistry::new();
        registry.add(stub("SqliteEntry", "user-db")).unwrap();
        registry.add(stub("MySqlEntry", "user-db")).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("SqliteEntry", "user-db").is_some());
        assert!(registry.get("PostgresEntry", "user-db").is_none());
        assert!(registry.get_by_name("user-db").is_some());
        assert!(registry.get_by_name("missing").is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let registry = EntryRegistry::new();
        registry.add(stub("SqliteEntry", "user-db")).unwrap();
        let err = registry.add(stub("SqliteEntry", "user-db")).unwrap_err();
        assert!(matches!(err, crate::error::EntryError::DuplicateEntry { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove() {
        let registry = EntryRegistry::new();
        registry.add(stub("SqliteEntry", "a")).unwrap();
        registry.add(stub("MySqlEntry", "a")).unwrap();
        registry.add(stub("MySqlEntry", "b")).unwrap();

        assert!(registry.remove_typed("MySqlEntry", "b").is_some());
        assert!(registry.remove_typed("MySqlEntry", "b").is_none());
        assert_eq!(registry.remove("a"), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_sorted() {
        let registry = EntryRegistry::new();
        registry.add(stub("SqliteEntry", "b")).unwrap();
        registry.add(stub("MySqlEntry", "z")).unwrap();
        registry.add(stub("SqliteEntry", "a")).unwrap();

        let names: Vec<String> = registry
            .list()
            .iter()
            .map(|e| format!("{}/{}", e.entry_type(), e.name()))
            .collect();
        assert_eq!(names, vec!["MySqlEntry/z", "SqliteEntry/a", "SqliteEntry/b"]);
    }
}
