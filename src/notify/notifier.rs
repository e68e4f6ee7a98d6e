//! 通知服务抽象 - 统一的推送接口
//!
//! 所有推送服务实现 `Notifier` trait，路由器只依赖这个接口，
//! 通过 `Arc<dyn Notifier>` 并发分发，各服务互不影响。
//! 实例一律由服务 descriptor 的 `build` 从校验过的配置构造，
//! 构造成功即处于可发送状态。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SendError;

/// 格式化完成、待分发的通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// 标题：网络名，频道消息追加 " - {channel}"
    pub title: String,
    /// 正文："<nick> body" 或动作消息的 "* nick body"
    pub body: String,
    /// 格式化时刻；厂商载荷里的时间戳取整到秒
    pub sent_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            sent_at: Utc::now(),
        }
    }
}

/// 推送通知服务接口
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 服务名，与注册表中的 descriptor 名一致
    fn name(&self) -> &str;

    /// 执行一次推送；失败只以 `SendError` 报告，绝不 panic
    async fn send(&self, notification: &Notification) -> Result<(), SendError>;
}
