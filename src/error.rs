//! 错误类型定义
//!
//! 三类错误各走各的传播路径：配置错误在命令层/启用时直接拒绝；
//! 发送错误在分发循环内按服务隔离，只记日志，不会中断消息处理；
//! 持久化错误在读取时退化为默认配置，写入时上报给调用方。

use thiserror::Error;

/// 配置与校验错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 启用通知但一个服务都没配置
    #[error("no notification services configured")]
    NoServicesConfigured,

    /// 服务名不在注册表中
    #[error("unknown service '{0}'")]
    UnknownService(String),

    /// 字段名不在服务的字段模式中
    #[error("{service}: unknown key '{key}'")]
    UnknownKey { service: String, key: String },

    /// 必填字段缺失或为空
    #[error("{service}: missing required field '{field}'")]
    MissingField { service: String, field: String },

    /// 字段值未通过校验器
    #[error("{service}: invalid value for '{field}': {reason}")]
    InvalidValue {
        service: String,
        field: String,
        reason: String,
    },
}

/// 单个通知服务的发送失败
#[derive(Debug, Error)]
pub enum SendError {
    /// 厂商明确返回了错误
    #[error("{service}: {message}")]
    Api { service: String, message: String },

    /// 请求没能到达厂商（超时、连接失败等）
    #[error("{service}: {source}")]
    Transport {
        service: String,
        #[source]
        source: reqwest::Error,
    },
}

impl SendError {
    pub fn api(service: impl Into<String>, message: impl Into<String>) -> Self {
        SendError::Api {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn transport(service: impl Into<String>, source: reqwest::Error) -> Self {
        SendError::Transport {
            service: service.into(),
            source,
        }
    }

    /// 出错的服务名
    pub fn service(&self) -> &str {
        match self {
            SendError::Api { service, .. } => service,
            SendError::Transport { service, .. } => service,
        }
    }
}

/// 配置持久化错误
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
