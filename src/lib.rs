//! IRC Push Relay - 把重要的 IRC 消息转发到推送服务
//!
//! 宿主聊天程序通过 `EventBridge` 送入消息事件;过滤、去重、格式化
//! 与分发在 `notify` 里完成,按会话+网络隔离的状态在 `session` 里。

pub mod bridge;
pub mod cli;
pub mod config;
pub mod error;
pub mod message;
pub mod notify;
pub mod session;

pub use bridge::{ChatEvent, ChatEventKind, EventBridge};
pub use config::{ChannelFilters, ConfigStore, FilterSettings, NotifyConfig, ServiceConfig};
pub use error::{ConfigError, PersistenceError, SendError};
pub use message::{Message, MessageKind};
pub use notify::descriptor::{build_notifiers, descriptor, descriptors, ServiceDescriptor};
pub use notify::{
    DeliveryLog, DeliveryRecord, Notification, NotificationRouter, Notifier, RecentKeys,
};
pub use session::{SessionKey, SessionRegistry, SessionState};
