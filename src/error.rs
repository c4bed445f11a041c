//! 错误类型定义
//!
//! 统一的错误枚举与便捷构造宏

use thiserror::Error;

/// 数据库入口错误
#[derive(Debug, Error)]
pub enum EntryError {
    /// 配置错误（YAML格式错误、参数非法等）
    #[error("配置错误: {message}")]
    ConfigError { message: String },

    /// 连接错误，消息中的凭证已脱敏
    #[error("连接错误: {message}")]
    ConnectionError { message: String },

    /// 底层驱动返回的错误
    #[error("数据库错误: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// 注册表中已存在同类型同名入口
    #[error("入口已存在: type={entry_type}, name={name}")]
    DuplicateEntry { entry_type: String, name: String },

    /// 参数验证错误
    #[error("验证错误 [{field}]: {message}")]
    ValidationError { field: String, message: String },

    /// IO错误
    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    SerializationError { message: String },
}

/// 结果类型别名
pub type EntryResult<T> = Result<T, EntryError>;

impl EntryError {
    /// 是否为"记录不存在"类错误
    pub fn is_record_not_found(&self) -> bool {
        matches!(self, EntryError::DatabaseError(sqlx::Error::RowNotFound))
    }
}

impl From<serde_yaml::Error> for EntryError {
    fn from(e: serde_yaml::Error) -> Self {
        EntryError::SerializationError {
            message: format!("解析YAML失败: {}", e),
        }
    }
}

/// 快速构造常用错误
///
/// ```rust,ignore
/// let err = entry_error!(config, "数据库名不能为空");
/// let err = entry_error!(validation, "name", "包含非法字符");
/// ```
#[macro_export]
macro_rules! entry_error {
    (config, $msg:expr) => {
        $crate::error::EntryError::ConfigError {
            message: ($msg).to_string(),
        }
    };
    (connection, $msg:expr) => {
        $crate::error::EntryError::ConnectionError {
            message: ($msg).to_string(),
        }
    };
    (validation, $field:expr, $msg:expr) => {
        $crate::error::EntryError::ValidationError {
            field: ($field).to_string(),
            message: ($msg).to_string(),
        }
    };
    (serialization, $msg:expr) => {
        $crate::error::EntryError::SerializationError {
            message: ($msg).to_string(),
        }
    };
    (duplicate, $entry_type:expr, $name:expr) => {
        $crate::error::EntryError::DuplicateEntry {
            entry_type: ($entry_type).to_string(),
            name: ($name).to_string(),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_macro() {
        let err = entry_error!(config, "缺少名称");
        assert!(matches!(err, EntryError::ConfigError { .. }));
        assert_eq!(err.to_string(), "配置错误: 缺少名称");

        let err = entry_error!(validation, "name", "非法");
        assert_eq!(err.to_string(), "验证错误 [name]: 非法");

        let err = entry_error!(duplicate, "SqliteEntry", "user-db");
        assert!(err.to_string().contains("user-db"));
    }

    #[test]
    fn test_record_not_found() {
        let err = EntryError::from(sqlx::Error::RowNotFound);
        assert!(err.is_record_not_found());
        assert!(!entry_error!(config, "x").is_record_not_found());
    }
}
