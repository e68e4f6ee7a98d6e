//! 服务注册表与字段模式
//!
//! 每个通知服务登记一个 `ServiceDescriptor`：声明字段模式（必填 / 默认值 /
//! 校验器）并提供从配置构造就绪实例的 `build`。路由器和会话注册表只通过
//! 这张表查找服务，从不针对具体服务名写分支；新增服务 = 新增一个条目。

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{NotifyConfig, ServiceConfig};
use crate::error::ConfigError;

use super::notifier::Notifier;
use super::services::{pushover, webhook};

/// 字段校验器；`Err` 携带拒绝原因
pub type FieldValidator = fn(&str) -> Result<(), String>;

/// 单个配置字段的模式
#[derive(Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    /// setup 向导里展示的提示语
    pub label: &'static str,
    pub required: bool,
    pub default: Option<&'static str>,
    /// 凭据字段；向导改用密码输入，status 不回显
    pub secret: bool,
    pub validator: Option<FieldValidator>,
}

/// 通知服务的注册条目
pub struct ServiceDescriptor {
    pub name: &'static str,
    pub summary: &'static str,
    pub fields: &'static [FieldSpec],
    /// 校验配置并构造就绪实例；实例存在即可发送
    pub build: fn(&ServiceConfig) -> Result<Arc<dyn Notifier>, ConfigError>,
}

static DESCRIPTORS: [ServiceDescriptor; 2] = [pushover::DESCRIPTOR, webhook::DESCRIPTOR];

/// 已注册的服务
pub fn descriptors() -> &'static [ServiceDescriptor] {
    &DESCRIPTORS
}

/// 按名字查找服务
pub fn descriptor(name: &str) -> Option<&'static ServiceDescriptor> {
    DESCRIPTORS.iter().find(|d| d.name == name)
}

impl ServiceDescriptor {
    /// 查找字段模式
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// 按模式解析配置：填默认值、查必填、跑校验器。
    /// 配置里模式之外的字段被忽略（容错读取的一部分）。
    pub fn resolve(&self, config: &ServiceConfig) -> Result<ResolvedFields, ConfigError> {
        let mut values = BTreeMap::new();

        for spec in self.fields {
            let raw = config
                .field_str(spec.key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());

            let value = match (raw, spec.default) {
                (Some(v), _) => Some(v),
                (None, Some(default)) => Some(default.to_string()),
                (None, None) if spec.required => {
                    return Err(ConfigError::MissingField {
                        service: self.name.to_string(),
                        field: spec.key.to_string(),
                    })
                }
                (None, None) => None,
            };

            if let Some(value) = value {
                if let Some(validate) = spec.validator {
                    validate(&value).map_err(|reason| ConfigError::InvalidValue {
                        service: self.name.to_string(),
                        field: spec.key.to_string(),
                        reason,
                    })?;
                }
                values.insert(spec.key.to_string(), value);
            }
        }

        Ok(ResolvedFields {
            service: self.name,
            values,
        })
    }
}

/// 解析完成的字段值（默认值已填、校验器已跑）
#[derive(Debug)]
pub struct ResolvedFields {
    service: &'static str,
    values: BTreeMap<String, String>,
}

impl ResolvedFields {
    /// 必填字段；`resolve` 之后一定存在，缺失仍按错误上报而不是 panic
    pub fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::MissingField {
                service: self.service.to_string(),
                field: key.to_string(),
            })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// 按注册表构建全部已启用服务的通知实例。
/// 无效配置只跳过并告警,一个能用的都没有也不算失败,
/// 是否拒绝空结果由调用方决定。
pub fn build_notifiers(config: &NotifyConfig) -> Vec<Arc<dyn Notifier>> {
    let mut notifiers = Vec::new();

    for (name, service) in &config.services {
        if !service.enabled {
            debug!(service = %name, "service disabled, skipping");
            continue;
        }

        let desc = match descriptor(name) {
            Some(desc) => desc,
            None => {
                warn!(service = %name, "unknown notification service, skipping");
                continue;
            }
        };

        match (desc.build)(service) {
            Ok(notifier) => notifiers.push(notifier),
            Err(e) => warn!(service = %name, error = %e, "invalid service config, skipping"),
        }
    }

    notifiers
}
