//! 会话注册表
//!
//! 每个（聊天会话，网络）对一个条目，首次访问时惰性创建。enable 从持久化
//! 配置构建通知服务并装配路由器；disable 只翻转标志位，路由器保留，
//! 桥接层继续持有的 Arc 不会失效，重新启用也无需重装订阅。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{ConfigStore, NotifyConfig};
use crate::error::ConfigError;
use crate::notify::descriptor::build_notifiers;
use crate::notify::history::DeliveryLog;
use crate::notify::router::NotificationRouter;

/// （会话，网络）键；会话 id 即用户身份
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub session: String,
    pub network: String,
}

impl SessionKey {
    pub fn new(session: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            network: network.into(),
        }
    }
}

/// 单个会话的通知状态
pub struct SessionState {
    pub enabled: bool,
    pub config: NotifyConfig,
    pub router: Option<Arc<NotificationRouter>>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            enabled: false,
            config: NotifyConfig::default(),
            router: None,
        }
    }
}

/// 会话注册表
pub struct SessionRegistry {
    sessions: HashMap<SessionKey, SessionState>,
    store: ConfigStore,
}

impl SessionRegistry {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            sessions: HashMap::new(),
            store,
        }
    }

    /// 惰性创建并返回会话条目；同一键总是同一个条目
    pub fn get_or_create(&mut self, session: &str, network: &str) -> &mut SessionState {
        self.sessions
            .entry(SessionKey::new(session, network))
            .or_insert_with(SessionState::new)
    }

    pub fn get(&self, session: &str, network: &str) -> Option<&SessionState> {
        self.sessions.get(&SessionKey::new(session, network))
    }

    /// 启用通知
    ///
    /// 重新读取持久化配置并重建路由器（带全新去重缓存）。
    /// services 为空直接拒绝；单个服务构建失败跳过并告警；
    /// 一个可用服务都没有仍然算成功，只是分发列表为空。
    pub fn enable(
        &mut self,
        session: &str,
        network: &str,
        self_nick: &str,
    ) -> Result<(), ConfigError> {
        let config = self.store.load(session);
        if config.services.is_empty() {
            return Err(ConfigError::NoServicesConfigured);
        }

        let notifiers = build_notifiers(&config);
        if notifiers.is_empty() {
            warn!(session, network, "no usable notification service, enabling anyway");
        }

        let history = DeliveryLog::new(self.store.history_path());
        let router = NotificationRouter::new(self_nick, config.filters.clone(), notifiers)
            .with_history(history);

        let state = self.get_or_create(session, network);
        state.config = config;
        state.router = Some(Arc::new(router));
        state.enabled = true;

        info!(session, network, "notifications enabled");
        Ok(())
    }

    /// 停用通知；从不失败，路由器保留
    pub fn disable(&mut self, session: &str, network: &str) {
        let state = self.get_or_create(session, network);
        state.enabled = false;
        info!(session, network, "notifications disabled");
    }

    /// 拆除会话条目（宿主断开网络连接时调用）；不存在则为 no-op
    pub fn remove_session(&mut self, session: &str, network: &str) {
        if self.sessions.remove(&SessionKey::new(session, network)).is_some() {
            info!(session, network, "session removed");
        }
    }

    /// 已启用会话的路由器；未启用或无路由器返回 None（桥接层据此丢弃事件）
    pub fn active_router(&self, session: &str, network: &str) -> Option<Arc<NotificationRouter>> {
        self.sessions
            .get(&SessionKey::new(session, network))
            .filter(|state| state.enabled)
            .and_then(|state| state.router.clone())
    }

    /// 注册表背后的配置存储；宿主通过它改写配置后重新 enable 即可生效
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }
}
