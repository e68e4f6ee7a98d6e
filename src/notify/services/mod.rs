//! 通知服务实现
//!
//! 每个服务一个模块，向注册表提供一个 `DESCRIPTOR` 条目。

pub mod pushover;
pub mod webhook;

pub use pushover::PushoverNotifier;
pub use webhook::WebhookNotifier;
