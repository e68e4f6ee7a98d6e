//! 通知格式化
//!
//! 把归一化消息压缩成「标题 + 正文」：
//! - 标题：网络名；频道消息（`#` 开头）追加 " - {channel}"，
//!   私聊只留网络名
//! - 正文：action 渲染为 "* nick body"，其余一律 "<nick> body"

use chrono::Utc;

use crate::message::{Message, MessageKind};

use super::notifier::Notification;

/// 测试通知的固定内容
const TEST_TITLE: &str = "irc-push-relay";
const TEST_BODY: &str = "Test notification - your setup works";

/// 把消息格式化为推送通知
pub fn format_notification(message: &Message) -> Notification {
    let title = if message.is_channel() {
        format!("{} - {}", message.network, message.channel)
    } else {
        message.network.clone()
    };

    let body = match message.kind {
        MessageKind::Action => format!("* {} {}", message.sender, message.body),
        _ => format!("<{}> {}", message.sender, message.body),
    };

    Notification {
        title,
        body,
        sent_at: Utc::now(),
    }
}

/// 固定内容的测试通知（`test` 命令用，绕过过滤与去重）
pub fn test_notification() -> Notification {
    Notification::new(TEST_TITLE, TEST_BODY)
}
