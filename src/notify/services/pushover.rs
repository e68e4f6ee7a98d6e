//! Pushover 推送服务
//!
//! 参考实现：必填 user key 与 application token（官方凭据长 30 位，
//! 长度不符只告警不拒绝），可选 priority（[-2, 2]，默认 0）与
//! sound（默认 "pushover"）。载荷按官方 messages API 组装，
//! 时间戳取 `sent_at` 的整数秒。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ServiceConfig;
use crate::error::{ConfigError, SendError};
use crate::notify::descriptor::{FieldSpec, ServiceDescriptor};
use crate::notify::notifier::{Notification, Notifier};

const API_URL: &str = "https://api.pushover.net/1/messages.json";
/// 官方凭据的标准长度
const CREDENTIAL_LEN: usize = 30;
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub const DESCRIPTOR: ServiceDescriptor = ServiceDescriptor {
    name: "pushover",
    summary: "Pushover push notifications (pushover.net)",
    fields: FIELDS,
    build,
};

const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "user",
        label: "User key",
        required: true,
        default: None,
        secret: true,
        validator: None,
    },
    FieldSpec {
        key: "token",
        label: "Application token",
        required: true,
        default: None,
        secret: true,
        validator: None,
    },
    FieldSpec {
        key: "priority",
        label: "Priority (-2 to 2)",
        required: false,
        default: Some("0"),
        secret: false,
        validator: Some(validate_priority),
    },
    FieldSpec {
        key: "sound",
        label: "Notification sound",
        required: false,
        default: Some("pushover"),
        secret: false,
        validator: None,
    },
];

fn validate_priority(value: &str) -> Result<(), String> {
    match value.parse::<i8>() {
        Ok(p) if (-2..=2).contains(&p) => Ok(()),
        Ok(p) => Err(format!("priority {} out of range -2 to 2", p)),
        Err(_) => Err(format!("'{}' is not an integer", value)),
    }
}

fn build(config: &ServiceConfig) -> Result<Arc<dyn Notifier>, ConfigError> {
    Ok(Arc::new(PushoverNotifier::from_config(config)?))
}

/// Pushover 通知实例
#[derive(Debug)]
pub struct PushoverNotifier {
    user: String,
    token: String,
    priority: i8,
    sound: String,
    api_url: String,
    client: Client,
}

impl PushoverNotifier {
    /// 从配置构造；必填字段缺失或 priority 越界即失败，
    /// 凭据长度异常只告警
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ConfigError> {
        let fields = DESCRIPTOR.resolve(config)?;

        let user = fields.required("user")?;
        let token = fields.required("token")?;
        // 校验器保证 priority 是 [-2, 2] 内的整数
        let priority = fields
            .get("priority")
            .and_then(|v| v.parse::<i8>().ok())
            .unwrap_or(0);
        let sound = fields.get("sound").unwrap_or("pushover").to_string();

        for (name, value) in [("user", &user), ("token", &token)] {
            let len = value.chars().count();
            if len != CREDENTIAL_LEN {
                warn!(
                    field = name,
                    len,
                    "pushover credential is not the usual {} characters, accepting anyway",
                    CREDENTIAL_LEN
                );
            }
        }

        let client = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                service: DESCRIPTOR.name.to_string(),
                field: "client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            user,
            token,
            priority,
            sound,
            api_url: API_URL.to_string(),
            client,
        })
    }

    /// 覆盖 API 端点（测试或代理网关用）
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

/// messages API 请求体
#[derive(Debug, Serialize)]
struct PushoverPayload<'a> {
    token: &'a str,
    user: &'a str,
    message: &'a str,
    title: &'a str,
    priority: i8,
    sound: &'a str,
    /// unix 秒，向下取整
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct PushoverResponse {
    status: i32,
    #[serde(default)]
    errors: Vec<String>,
}

#[async_trait]
impl Notifier for PushoverNotifier {
    fn name(&self) -> &str {
        "pushover"
    }

    async fn send(&self, notification: &Notification) -> Result<(), SendError> {
        let payload = PushoverPayload {
            token: &self.token,
            user: &self.user,
            message: &notification.body,
            title: &notification.title,
            priority: self.priority,
            sound: &self.sound,
            timestamp: notification.sent_at.timestamp(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SendError::transport(self.name(), e))?;

        let http_status = response.status();
        let body: PushoverResponse = match response.json().await {
            Ok(body) => body,
            Err(_) if !http_status.is_success() => {
                return Err(SendError::api(self.name(), format!("HTTP {}", http_status)))
            }
            Err(e) => return Err(SendError::transport(self.name(), e)),
        };

        if body.status == 1 {
            Ok(())
        } else if body.errors.is_empty() {
            Err(SendError::api(self.name(), format!("HTTP {}", http_status)))
        } else {
            Err(SendError::api(self.name(), body.errors.join("; ")))
        }
    }
}
