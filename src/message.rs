//! IRC 消息记录
//!
//! Event Bridge 把宿主客户端的三类消息事件（privmsg / action / notice）
//! 归一化成统一的 `Message`，路由管线只消费这个类型。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 消息类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// 普通频道消息或私聊
    Privmsg,
    /// /me 动作消息
    Action,
    /// NOTICE
    Notice,
}

/// 归一化后的入站消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    /// 网络标识（如 "libera"）
    pub network: String,
    /// 目标频道名；私聊时为对方昵称，不带 `#` 前缀
    pub channel: String,
    /// 发送者昵称
    pub sender: String,
    /// 消息正文
    pub body: String,
    /// 桥接层收到事件的时刻
    pub observed_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        kind: MessageKind,
        network: impl Into<String>,
        channel: impl Into<String>,
        sender: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            network: network.into(),
            channel: channel.into(),
            sender: sender.into(),
            body: body.into(),
            observed_at: Utc::now(),
        }
    }

    pub fn privmsg(
        network: impl Into<String>,
        channel: impl Into<String>,
        sender: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::new(MessageKind::Privmsg, network, channel, sender, body)
    }

    pub fn action(
        network: impl Into<String>,
        channel: impl Into<String>,
        sender: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::new(MessageKind::Action, network, channel, sender, body)
    }

    pub fn notice(
        network: impl Into<String>,
        channel: impl Into<String>,
        sender: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::new(MessageKind::Notice, network, channel, sender, body)
    }

    /// 是否发往频道（而不是私聊）
    pub fn is_channel(&self) -> bool {
        self.channel.starts_with('#')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_kind() {
        assert_eq!(
            Message::privmsg("libera", "#dev", "bob", "hi").kind,
            MessageKind::Privmsg
        );
        assert_eq!(
            Message::action("libera", "#dev", "bob", "waves").kind,
            MessageKind::Action
        );
        assert_eq!(
            Message::notice("libera", "#dev", "bob", "hi").kind,
            MessageKind::Notice
        );
    }

    #[test]
    fn test_is_channel() {
        assert!(Message::privmsg("libera", "#dev", "bob", "hi").is_channel());
        assert!(!Message::privmsg("libera", "bob", "bob", "hi").is_channel());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&MessageKind::Privmsg).unwrap();
        assert_eq!(json, "\"privmsg\"");
    }
}
