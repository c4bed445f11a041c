//! 部署环境匹配
//!
//! 判断一个配置块是否适用于当前部署（realm/region/az/domain）

use serde::{Deserialize, Serialize};

/// 通配符
pub const WILDCARD: &str = "*";

/// 当前进程的部署环境，通常来自环境变量 REALM/REGION/AZ/DOMAIN
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub realm: Option<String>,
    pub region: Option<String>,
    pub az: Option<String>,
    pub domain: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Deployment {
    /// 从环境变量读取
    pub fn from_env() -> Self {
        Self {
            realm: non_empty(std::env::var("REALM").ok()),
            region: non_empty(std::env::var("REGION").ok()),
            az: non_empty(std::env::var("AZ").ok()),
            domain: non_empty(std::env::var("DOMAIN").ok()),
        }
    }

    /// 只设置 domain
    pub fn with_domain<S: Into<String>>(domain: S) -> Self {
        Self {
            domain: non_empty(Some(domain.into())),
            ..Default::default()
        }
    }

    /// 匹配 `realm::region::az::domain` 形式的 locale
    ///
    /// 段数不为4或为空时不匹配
    pub fn matches_locale(&self, locale: &str) -> bool {
        if locale.is_empty() {
            return false;
        }

        let tokens: Vec<&str> = locale.split("::").collect();
        if tokens.len() != 4 {
            return false;
        }

        let actual = [&self.realm, &self.region, &self.az, &self.domain];
        tokens
            .iter()
            .zip(actual.iter())
            .all(|(token, value)| segment_matches(token, value.as_deref()))
    }

    /// 匹配单独的 domain，空字符串视为通配
    pub fn matches_domain(&self, domain: &str) -> bool {
        domain.is_empty() || segment_matches(domain, self.domain.as_deref())
    }
}

fn segment_matches(pattern: &str, value: Option<&str>) -> bool {
    pattern == WILDCARD || value == Some(pattern)
}

/// locale 是否所有段都是通配符
pub fn is_wildcard_locale(locale: &str) -> bool {
    locale.split("::").all(|token| token == WILDCARD)
}

/// domain 是否为通配
pub fn is_wildcard_domain(domain: &str) -> bool {
    domain.is_empty() || domain == WILDCARD
}
