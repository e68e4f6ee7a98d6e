//! 过滤配置与持久化
//!
//! 每个用户身份一个 JSON 文件（`~/.config/irc-push-relay/<user>.json`）。
//! 读取逐字段容错：缺失或类型不符的字段静默落回文档化默认值；文件缺失
//! 或整体无法解析时退回完整默认配置。写入从类型化结构序列化（写出的
//! 文件必然良构），先落临时文件再原子改名，不存在半写状态。

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::PersistenceError;

/// 顶层通知配置，每个用户身份一份
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotifyConfig {
    /// 总开关；enable/disable 命令翻转这里
    pub enabled: bool,
    /// 服务名 → 服务配置；字段模式由各服务的 descriptor 定义
    pub services: BTreeMap<String, ServiceConfig>,
    pub filters: FilterSettings,
}

/// 单个通知服务的配置
///
/// 除 `enabled` 外的字段对核心代码是不透明的，含义由服务自己的
/// 字段模式解释。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fields: BTreeMap::new(),
        }
    }
}

/// 过滤设置
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSettings {
    /// 只在 away 时通知
    pub only_when_away: bool,
    /// 正文包含本人昵称时通知
    pub highlights: bool,
    /// 关键字列表，按配置顺序做大小写无关子串匹配
    pub keywords: Vec<String>,
    pub channels: ChannelFilters,
}

/// 频道名单。白名单非空时只放行名单内频道（完全覆盖黑名单）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelFilters {
    pub whitelist: BTreeSet<String>,
    pub blacklist: BTreeSet<String>,
}

impl NotifyConfig {
    /// 逐字段容错解析：任何缺失或类型不符的字段落回默认值
    pub fn from_value(value: &Value) -> Self {
        let mut config = NotifyConfig::default();

        config.enabled = value.get("enabled").and_then(Value::as_bool).unwrap_or(false);

        if let Some(services) = value.get("services").and_then(Value::as_object) {
            for (name, service) in services {
                config
                    .services
                    .insert(name.clone(), ServiceConfig::from_value(service));
            }
        }

        config.filters = FilterSettings::from_value(value.get("filters").unwrap_or(&Value::Null));
        config
    }

    /// 添加关键字；重复返回 `false`
    pub fn add_keyword(&mut self, word: &str) -> bool {
        let word = word.trim();
        if word.is_empty() || self.filters.keywords.iter().any(|k| k == word) {
            return false;
        }
        self.filters.keywords.push(word.to_string());
        true
    }

    /// 移除关键字；不存在返回 `false`
    pub fn remove_keyword(&mut self, word: &str) -> bool {
        let before = self.filters.keywords.len();
        self.filters.keywords.retain(|k| k != word);
        self.filters.keywords.len() != before
    }
}

impl ServiceConfig {
    fn from_value(value: &Value) -> Self {
        let mut service = ServiceConfig::default();
        if let Some(map) = value.as_object() {
            service.enabled = map.get("enabled").and_then(Value::as_bool).unwrap_or(true);
            for (key, field) in map {
                if key == "enabled" {
                    continue;
                }
                service.fields.insert(key.clone(), field.clone());
            }
        }
        service
    }

    /// 字段的字符串视图；数字和布尔做显示转换，其余类型视为缺失
    pub fn field_str(&self, key: &str) -> Option<String> {
        match self.fields.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        }
    }

    /// 写入字段：整数写成 JSON 数字，其余写成字符串
    pub fn set_field(&mut self, key: &str, raw: &str) {
        self.fields.insert(key.to_string(), coerce_field(raw));
    }
}

impl FilterSettings {
    fn from_value(value: &Value) -> Self {
        let mut filters = FilterSettings::default();

        filters.only_when_away = value
            .get("only_when_away")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        filters.highlights = value
            .get("highlights")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if let Some(words) = value.get("keywords").and_then(Value::as_array) {
            filters.keywords = words
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
        }

        filters.channels =
            ChannelFilters::from_value(value.get("channels").unwrap_or(&Value::Null));
        filters
    }
}

impl ChannelFilters {
    fn from_value(value: &Value) -> Self {
        Self {
            whitelist: string_set(value.get("whitelist")),
            blacklist: string_set(value.get("blacklist")),
        }
    }
}

fn string_set(value: Option<&Value>) -> BTreeSet<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// 把命令行/向导输入的原始字符串转成 JSON 值：整数落成数字，其余落成字符串
pub fn coerce_field(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    Value::String(raw.to_string())
}

/// 配置文件存取
#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: PathBuf,
}

impl ConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 默认位置 `~/.config/irc-push-relay`
    pub fn open_default() -> Self {
        let root = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("irc-push-relay");
        Self::new(root)
    }

    pub fn config_path(&self, user: &str) -> PathBuf {
        self.root.join(format!("{}.json", user))
    }

    pub fn history_path(&self) -> PathBuf {
        self.root.join("history.jsonl")
    }

    /// 读取用户配置；文件缺失或无法解析时回退默认配置
    pub fn load(&self, user: &str) -> NotifyConfig {
        let path = self.config_path(user);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!(path = %path.display(), "no config file, using defaults");
                return NotifyConfig::default();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => NotifyConfig::from_value(&value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config file unreadable, using defaults");
                NotifyConfig::default()
            }
        }
    }

    /// 原子写入：临时文件 + rename
    pub fn save(&self, user: &str, config: &NotifyConfig) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.root)?;

        let path = self.config_path(user);
        let temp_path = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(config)?;

        fs::write(&temp_path, data)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = NotifyConfig::default();
        assert!(!config.enabled);
        assert!(config.services.is_empty());
        assert!(!config.filters.only_when_away);
        assert!(!config.filters.highlights);
        assert!(config.filters.keywords.is_empty());
        assert!(config.filters.channels.whitelist.is_empty());
        assert!(config.filters.channels.blacklist.is_empty());
    }

    #[test]
    fn test_from_value_fills_missing_fields() {
        let config = NotifyConfig::from_value(&json!({ "enabled": true }));
        assert!(config.enabled);
        assert!(config.services.is_empty());
        assert!(config.filters.keywords.is_empty());
    }

    #[test]
    fn test_from_value_replaces_mistyped_fields() {
        let config = NotifyConfig::from_value(&json!({
            "enabled": "yes",
            "filters": {
                "only_when_away": 1,
                "keywords": 42,
                "channels": { "whitelist": "#dev" }
            }
        }));
        // 类型不符的字段一律落回默认值
        assert!(!config.enabled);
        assert!(!config.filters.only_when_away);
        assert!(config.filters.keywords.is_empty());
        assert!(config.filters.channels.whitelist.is_empty());
    }

    #[test]
    fn test_from_value_skips_non_string_keywords() {
        let config = NotifyConfig::from_value(&json!({
            "filters": { "keywords": ["deploy", 7, "urgent"] }
        }));
        assert_eq!(config.filters.keywords, vec!["deploy", "urgent"]);
    }

    #[test]
    fn test_service_enabled_defaults_to_true() {
        let config = NotifyConfig::from_value(&json!({
            "services": { "pushover": { "user": "u", "token": "t" } }
        }));
        let service = &config.services["pushover"];
        assert!(service.enabled);
        assert_eq!(service.field_str("user").as_deref(), Some("u"));
    }

    #[test]
    fn test_field_str_converts_numbers() {
        let config = NotifyConfig::from_value(&json!({
            "services": { "pushover": { "priority": 1 } }
        }));
        assert_eq!(
            config.services["pushover"].field_str("priority").as_deref(),
            Some("1")
        );
    }

    #[test]
    fn test_coerce_field_prefers_integers() {
        assert_eq!(coerce_field("2"), json!(2));
        assert_eq!(coerce_field("-1"), json!(-1));
        assert_eq!(coerce_field("siren"), json!("siren"));
    }

    #[test]
    fn test_keyword_add_remove() {
        let mut config = NotifyConfig::default();
        assert!(config.add_keyword("deploy"));
        assert!(!config.add_keyword("deploy"));
        assert!(!config.add_keyword("  "));
        assert!(config.remove_keyword("deploy"));
        assert!(!config.remove_keyword("deploy"));
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path());

        let mut config = NotifyConfig::default();
        config.enabled = true;
        config.add_keyword("deploy");
        config.filters.highlights = true;
        config.filters.channels.blacklist.insert("#noisy".to_string());
        let mut service = ServiceConfig::default();
        service.set_field("user", "u".repeat(30).as_str());
        service.set_field("priority", "1");
        config.services.insert("pushover".to_string(), service);

        store.save("alice", &config).unwrap();
        let loaded = store.load("alice");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path());
        assert_eq!(store.load("nobody"), NotifyConfig::default());
    }

    #[test]
    fn test_load_corrupt_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path());
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(store.config_path("alice"), "{ not json").unwrap();
        assert_eq!(store.load("alice"), NotifyConfig::default());
    }

    #[test]
    fn test_save_overwrites_atomically() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path());

        let mut config = NotifyConfig::default();
        store.save("alice", &config).unwrap();
        config.enabled = true;
        store.save("alice", &config).unwrap();

        assert!(store.load("alice").enabled);
        // 临时文件不残留
        assert!(!store.config_path("alice").with_extension("json.tmp").exists());
    }
}
