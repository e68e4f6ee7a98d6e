//! Host event bridge
//!
//! The host chat application owns the IRC connections and the away state.
//! For each (session, network) pair it hands this bridge an mpsc stream of
//! chat events plus a watch channel carrying the current away flag. The
//! bridge normalizes each event into a `Message`, stamps the receipt time,
//! and routes it through the session's router while the session is enabled.
//! Events arriving while the session is disabled are dropped; the
//! subscription itself stays installed. One pump per pair, installed at
//! most once.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::message::{Message, MessageKind};
use crate::session::{SessionKey, SessionRegistry};

/// Chat event kinds the host reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatEventKind {
    Privmsg,
    Action,
    Notice,
}

/// One inbound chat event as the host sees it. The bridge stamps the
/// receipt time; hosts do not supply timestamps.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub kind: ChatEventKind,
    /// Target channel, or the sender's nick for private messages.
    pub target: String,
    pub sender: String,
    pub body: String,
}

/// Bridge between host event streams and session routers.
pub struct EventBridge {
    registry: Arc<Mutex<SessionRegistry>>,
    attached: HashSet<SessionKey>,
}

impl EventBridge {
    pub fn new(registry: Arc<Mutex<SessionRegistry>>) -> Self {
        Self {
            registry,
            attached: HashSet::new(),
        }
    }

    /// Installs the event pump for one (session, network) pair.
    ///
    /// At most one subscription per pair: a repeated attach is refused and
    /// the receiver dropped. Events for one session are processed strictly
    /// in arrival order; the only concurrency is the notifier fan-out
    /// inside `process_message`. The pump ends when the host closes the
    /// event channel.
    pub fn attach(
        &mut self,
        session: &str,
        network: &str,
        mut events: mpsc::Receiver<ChatEvent>,
        away: watch::Receiver<bool>,
    ) -> Option<JoinHandle<()>> {
        let key = SessionKey::new(session, network);
        if !self.attached.insert(key) {
            debug!(session, network, "already attached, refusing second subscription");
            return None;
        }

        let registry = Arc::clone(&self.registry);
        let session = session.to_string();
        let network = network.to_string();

        let handle = tokio::spawn(async move {
            info!(session = %session, network = %network, "event pump started");

            while let Some(event) = events.recv().await {
                let message = normalize(&network, event);

                // 锁只护住查表，发送阶段不持锁
                let router = {
                    let registry = registry.lock().unwrap();
                    registry.active_router(&session, &network)
                };
                let router = match router {
                    Some(router) => router,
                    None => {
                        debug!(
                            session = %session,
                            network = %network,
                            "session not enabled, dropping message"
                        );
                        continue;
                    }
                };

                let away_now = *away.borrow();
                router.process_message(&message, away_now).await;
            }

            info!(session = %session, network = %network, "event stream closed");
        });

        Some(handle)
    }

    /// Clears the one-shot guard so a later attach can install again.
    /// Pair with `SessionRegistry::remove_session` on disconnect.
    pub fn detach(&mut self, session: &str, network: &str) {
        self.attached.remove(&SessionKey::new(session, network));
    }

    pub fn is_attached(&self, session: &str, network: &str) -> bool {
        self.attached.contains(&SessionKey::new(session, network))
    }
}

fn normalize(network: &str, event: ChatEvent) -> Message {
    let kind = match event.kind {
        ChatEventKind::Privmsg => MessageKind::Privmsg,
        ChatEventKind::Action => MessageKind::Action,
        ChatEventKind::Notice => MessageKind::Notice,
    };
    Message::new(kind, network, event.target, event.sender, event.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::config::{ConfigStore, FilterSettings};
    use crate::error::SendError;
    use crate::notify::notifier::{Notification, Notifier};
    use crate::notify::router::NotificationRouter;
    use tempfile::TempDir;

    struct CountingNotifier {
        sent: AtomicUsize,
    }

    impl CountingNotifier {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: AtomicUsize::new(0),
            })
        }

        fn sent_count(&self) -> usize {
            self.sent.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        fn name(&self) -> &str {
            "counting"
        }

        async fn send(&self, _notification: &Notification) -> Result<(), SendError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn registry_with_mock(
        dir: &TempDir,
        filters: FilterSettings,
        enabled: bool,
    ) -> (Arc<Mutex<SessionRegistry>>, Arc<CountingNotifier>) {
        let mock = CountingNotifier::new();
        let router = NotificationRouter::new(
            "alice",
            filters,
            vec![Arc::clone(&mock) as Arc<dyn Notifier>],
        );

        let mut registry = SessionRegistry::new(ConfigStore::new(dir.path()));
        let state = registry.get_or_create("alice", "libera");
        state.router = Some(Arc::new(router));
        state.enabled = enabled;

        (Arc::new(Mutex::new(registry)), mock)
    }

    fn privmsg(body: &str) -> ChatEvent {
        ChatEvent {
            kind: ChatEventKind::Privmsg,
            target: "#dev".to_string(),
            sender: "bob".to_string(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_attach_is_one_shot() {
        let dir = TempDir::new().unwrap();
        let (registry, _mock) = registry_with_mock(&dir, FilterSettings::default(), true);
        let mut bridge = EventBridge::new(registry);

        let (_tx1, rx1) = mpsc::channel(4);
        let (_away_tx, away_rx) = watch::channel(false);
        assert!(bridge.attach("alice", "libera", rx1, away_rx.clone()).is_some());
        assert!(bridge.is_attached("alice", "libera"));

        let (_tx2, rx2) = mpsc::channel(4);
        assert!(bridge.attach("alice", "libera", rx2, away_rx).is_none());
    }

    #[tokio::test]
    async fn test_detach_allows_reattach() {
        let dir = TempDir::new().unwrap();
        let (registry, _mock) = registry_with_mock(&dir, FilterSettings::default(), true);
        let mut bridge = EventBridge::new(registry);

        let (_tx1, rx1) = mpsc::channel(4);
        let (_away_tx, away_rx) = watch::channel(false);
        bridge.attach("alice", "libera", rx1, away_rx.clone()).unwrap();

        bridge.detach("alice", "libera");
        assert!(!bridge.is_attached("alice", "libera"));

        let (_tx2, rx2) = mpsc::channel(4);
        assert!(bridge.attach("alice", "libera", rx2, away_rx).is_some());
    }

    #[tokio::test]
    async fn test_events_flow_to_enabled_session() {
        let dir = TempDir::new().unwrap();
        let (registry, mock) = registry_with_mock(&dir, FilterSettings::default(), true);
        let mut bridge = EventBridge::new(registry);

        let (tx, rx) = mpsc::channel(4);
        let (_away_tx, away_rx) = watch::channel(false);
        let handle = bridge.attach("alice", "libera", rx, away_rx).unwrap();

        tx.send(privmsg("deploy done")).await.unwrap();
        tx.send(privmsg("second thing")).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(mock.sent_count(), 2);
    }

    #[tokio::test]
    async fn test_disabled_session_drops_events() {
        let dir = TempDir::new().unwrap();
        let (registry, mock) = registry_with_mock(&dir, FilterSettings::default(), false);
        let mut bridge = EventBridge::new(registry);

        let (tx, rx) = mpsc::channel(4);
        let (_away_tx, away_rx) = watch::channel(false);
        let handle = bridge.attach("alice", "libera", rx, away_rx).unwrap();

        tx.send(privmsg("dropped on the floor")).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(mock.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_away_flag_reaches_router() {
        let dir = TempDir::new().unwrap();
        let mut filters = FilterSettings::default();
        filters.only_when_away = true;
        let (registry, mock) = registry_with_mock(&dir, filters, true);
        let mut bridge = EventBridge::new(registry);

        let (tx, rx) = mpsc::channel(4);
        let (away_tx, away_rx) = watch::channel(true);
        let handle = bridge.attach("alice", "libera", rx, away_rx).unwrap();

        tx.send(privmsg("while away")).await.unwrap();
        // 等第一条被消费后再翻转 away，避免竞态
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        away_tx.send(false).unwrap();
        tx.send(privmsg("while present")).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(mock.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_events_suppressed_through_bridge() {
        let dir = TempDir::new().unwrap();
        let (registry, mock) = registry_with_mock(&dir, FilterSettings::default(), true);
        let mut bridge = EventBridge::new(registry);

        let (tx, rx) = mpsc::channel(4);
        let (_away_tx, away_rx) = watch::channel(false);
        let handle = bridge.attach("alice", "libera", rx, away_rx).unwrap();

        tx.send(privmsg("same thing")).await.unwrap();
        tx.send(privmsg("same thing")).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(mock.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_action_event_is_normalized() {
        let dir = TempDir::new().unwrap();
        let (registry, mock) = registry_with_mock(&dir, FilterSettings::default(), true);
        let mut bridge = EventBridge::new(registry);

        let (tx, rx) = mpsc::channel(4);
        let (_away_tx, away_rx) = watch::channel(false);
        let handle = bridge.attach("alice", "libera", rx, away_rx).unwrap();

        tx.send(ChatEvent {
            kind: ChatEventKind::Action,
            target: "#dev".to_string(),
            sender: "bob".to_string(),
            body: "waves".to_string(),
        })
        .await
        .unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(mock.sent_count(), 1);
    }
}
