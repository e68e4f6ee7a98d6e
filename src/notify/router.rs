//! 通知路由器
//!
//! 每个（会话，网络）一个路由器：过滤管线 → 去重 → 格式化 → 并发分发。
//! 过滤判定与去重登记在第一个 await 之前同步完成，同一条消息背靠背
//! 处理两次也只会放行一次。分发阶段各服务并发执行、失败互相隔离，
//! 单个服务出错只记日志，不影响其余服务，也不向调用方传播。

use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::config::FilterSettings;
use crate::error::SendError;
use crate::message::Message;

use super::dedup::RecentKeys;
use super::dedup_key::dedup_key;
use super::format::{format_notification, test_notification};
use super::history::{DeliveryLog, DeliveryRecord};
use super::notifier::{Notification, Notifier};

/// 通知路由器
pub struct NotificationRouter {
    /// 本人在该网络的昵称，高亮匹配用
    self_nick: String,
    filters: Mutex<FilterSettings>,
    notifiers: Vec<Arc<dyn Notifier>>,
    recent: Mutex<RecentKeys>,
    history: Option<DeliveryLog>,
}

impl NotificationRouter {
    pub fn new(
        self_nick: impl Into<String>,
        filters: FilterSettings,
        notifiers: Vec<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            self_nick: self_nick.into(),
            filters: Mutex::new(filters),
            notifiers,
            recent: Mutex::new(RecentKeys::new()),
            history: None,
        }
    }

    /// 成功投递后追加本地历史
    pub fn with_history(mut self, log: DeliveryLog) -> Self {
        self.history = Some(log);
        self
    }

    /// 换用自定义去重缓存（测试用短纪元）
    pub fn with_recent_keys(mut self, recent: RecentKeys) -> Self {
        self.recent = Mutex::new(recent);
        self
    }

    pub fn notifier_count(&self) -> usize {
        self.notifiers.len()
    }

    pub fn notifier_names(&self) -> Vec<String> {
        self.notifiers.iter().map(|n| n.name().to_string()).collect()
    }

    /// 替换过滤设置（配置命令修改后热更新）
    pub fn set_filters(&self, filters: FilterSettings) {
        *self.filters.lock().unwrap() = filters;
    }

    /// 过滤判定，顺序固定：
    ///
    /// 1. 频道名单：白名单非空时只放行名单内频道（完全覆盖黑名单）；
    ///    否则黑名单内的频道被拒绝
    /// 2. 关键字：任一关键字是正文的大小写无关子串
    /// 3. 高亮：启用时，正文大小写无关地包含本人昵称
    /// 4. 默认放行：既没配关键字也没开高亮时，**每条消息都通知**
    ///    （空过滤配置 = 全量推送，这是刻意保留的行为）
    /// 5. away 门槛：`only_when_away` 开启时额外要求 away 为真；
    ///    away 状态由宿主按次传入，这里从不自己跟踪
    pub fn should_notify(&self, message: &Message, away: bool) -> bool {
        let filters = self.filters.lock().unwrap().clone();

        if !filters.channels.whitelist.is_empty() {
            if !filters.channels.whitelist.contains(&message.channel) {
                debug!(channel = %message.channel, "channel not in whitelist");
                return false;
            }
        } else if filters.channels.blacklist.contains(&message.channel) {
            debug!(channel = %message.channel, "channel blacklisted");
            return false;
        }

        let body = message.body.to_lowercase();
        let keyword_hit = filters
            .keywords
            .iter()
            .any(|keyword| body.contains(&keyword.to_lowercase()));
        let highlight_hit =
            filters.highlights && body.contains(&self.self_nick.to_lowercase());

        let passed = if filters.keywords.is_empty() && !filters.highlights {
            true
        } else {
            keyword_hit || highlight_hit
        };
        if !passed {
            return false;
        }

        if filters.only_when_away && !away {
            debug!("recipient not away, only_when_away is set");
            return false;
        }

        true
    }

    /// 完整管线：过滤 → 去重 → 格式化 → 并发分发。
    /// 去重登记发生在任何网络调用之前。
    pub async fn process_message(&self, message: &Message, away: bool) {
        if !self.should_notify(message, away) {
            debug!(
                network = %message.network,
                channel = %message.channel,
                "message filtered"
            );
            return;
        }

        let key = dedup_key(message);
        {
            let mut recent = self.recent.lock().unwrap();
            if !recent.check_and_insert(&key) {
                debug!(network = %message.network, key = %key, "duplicate, not sending");
                return;
            }
        }

        let notification = format_notification(message);
        info!(
            network = %message.network,
            channel = %message.channel,
            services = self.notifiers.len(),
            "dispatching notification"
        );
        self.dispatch(&notification, Some(message)).await;
    }

    /// 固定内容的测试通知，绕过过滤与去重
    pub async fn send_test_notification(&self) -> Vec<(String, Result<(), SendError>)> {
        let notification = test_notification();
        info!(services = self.notifiers.len(), "sending test notification");
        self.dispatch(&notification, None).await
    }

    /// 并发分发到全部服务；每个服务的失败独立记日志，互不影响
    async fn dispatch(
        &self,
        notification: &Notification,
        origin: Option<&Message>,
    ) -> Vec<(String, Result<(), SendError>)> {
        let sends = self.notifiers.iter().map(|notifier| async move {
            let name = notifier.name().to_string();
            let result = notifier.send(notification).await;
            (name, result)
        });

        let results = join_all(sends).await;

        for (name, result) in &results {
            match result {
                Ok(()) => {
                    info!(service = %name, "notification sent");
                    if let (Some(log), Some(message)) = (&self.history, origin) {
                        let record = DeliveryRecord {
                            sent_at: notification.sent_at,
                            network: message.network.clone(),
                            channel: message.channel.clone(),
                            service: name.clone(),
                            title: notification.title.clone(),
                        };
                        if let Err(e) = log.append(&record) {
                            warn!(error = %e, "failed to record delivery history");
                        }
                    }
                }
                Err(e) => warn!(service = %name, error = %e, "notification failed"),
            }
        }

        results
    }
}
