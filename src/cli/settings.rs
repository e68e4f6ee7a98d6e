// src/cli/settings.rs
//! Config 命令 - 单键写入
//!
//! `config <service|filters> <key> <value>` 的取值与校验。服务键按
//! descriptor 的字段模式校验,过滤键按已知字段名匹配,未知键直接拒绝。

use std::collections::BTreeSet;

use crate::config::NotifyConfig;
use crate::error::ConfigError;
use crate::notify::descriptor::descriptor;

/// 写入一个配置键,返回面向操作者的确认文本
pub fn apply_setting(
    config: &mut NotifyConfig,
    target: &str,
    key: &str,
    value: &str,
) -> Result<String, ConfigError> {
    if target == "filters" {
        apply_filter_setting(config, key, value)
    } else {
        apply_service_setting(config, target, key, value)
    }
}

fn apply_filter_setting(
    config: &mut NotifyConfig,
    key: &str,
    value: &str,
) -> Result<String, ConfigError> {
    match key {
        "only_when_away" => {
            config.filters.only_when_away = parse_bool("filters", key, value)?;
            Ok(format!(
                "filters.only_when_away = {}",
                config.filters.only_when_away
            ))
        }
        "highlights" => {
            config.filters.highlights = parse_bool("filters", key, value)?;
            Ok(format!("filters.highlights = {}", config.filters.highlights))
        }
        // 逗号分隔整体替换;增量编辑走 add-keyword / remove-keyword
        "keywords" => {
            config.filters.keywords = split_list(value);
            Ok(format!(
                "filters.keywords = [{}]",
                config.filters.keywords.join(", ")
            ))
        }
        "whitelist" => {
            config.filters.channels.whitelist = split_set(value);
            Ok(describe_set(
                "filters.whitelist",
                &config.filters.channels.whitelist,
            ))
        }
        "blacklist" => {
            config.filters.channels.blacklist = split_set(value);
            Ok(describe_set(
                "filters.blacklist",
                &config.filters.channels.blacklist,
            ))
        }
        _ => Err(ConfigError::UnknownKey {
            service: "filters".to_string(),
            key: key.to_string(),
        }),
    }
}

fn apply_service_setting(
    config: &mut NotifyConfig,
    service: &str,
    key: &str,
    value: &str,
) -> Result<String, ConfigError> {
    let desc =
        descriptor(service).ok_or_else(|| ConfigError::UnknownService(service.to_string()))?;

    if key == "enabled" {
        let enabled = parse_bool(desc.name, key, value)?;
        config
            .services
            .entry(desc.name.to_string())
            .or_default()
            .enabled = enabled;
        return Ok(format!("{}.enabled = {}", desc.name, enabled));
    }

    let spec = desc.field(key).ok_or_else(|| ConfigError::UnknownKey {
        service: desc.name.to_string(),
        key: key.to_string(),
    })?;

    if let Some(validate) = spec.validator {
        validate(value).map_err(|reason| ConfigError::InvalidValue {
            service: desc.name.to_string(),
            field: spec.key.to_string(),
            reason,
        })?;
    }

    config
        .services
        .entry(desc.name.to_string())
        .or_default()
        .set_field(spec.key, value);

    // 凭据不回显
    if spec.secret {
        Ok(format!("{}.{} updated", desc.name, spec.key))
    } else {
        Ok(format!("{}.{} = {}", desc.name, spec.key, value))
    }
}

fn parse_bool(service: &str, field: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            service: service.to_string(),
            field: field.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_set(value: &str) -> BTreeSet<String> {
    split_list(value).into_iter().collect()
}

fn describe_set(name: &str, set: &BTreeSet<String>) -> String {
    if set.is_empty() {
        format!("{} cleared", name)
    } else {
        let items: Vec<&str> = set.iter().map(String::as_str).collect();
        format!("{} = [{}]", name, items.join(", "))
    }
}
