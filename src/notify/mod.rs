//! 通知管线
//!
//! 过滤、去重、格式化与分发都在这里。入口是 `NotificationRouter`,
//! 各服务实现 `Notifier` trait 并通过 `descriptor` 注册表构建。

pub mod dedup;
pub mod dedup_key;
pub mod descriptor;
pub mod format;
pub mod history;
pub mod notifier;
pub mod router;
pub mod services;

pub use dedup::RecentKeys;
pub use descriptor::{build_notifiers, descriptor, descriptors, ServiceDescriptor};
pub use format::{format_notification, test_notification};
pub use history::{DeliveryLog, DeliveryRecord};
pub use notifier::{Notification, Notifier};
pub use router::NotificationRouter;
