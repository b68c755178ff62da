//! Shared streaming connection and channel subscriptions

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::stream::payload::{decode, ClientFrame, ServerFrame};

/// Callback receiving each log line of a channel
pub type LineHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Lines handed to at least one subscriber
    pub delivered: u64,

    /// Frames dropped because they could not be decoded
    pub malformed: u64,

    /// Well-formed lines on a channel nobody subscribes to
    pub unrouted: u64,

    /// Number of times a transport attached
    pub connections: u64,
}

struct Registration {
    channel: String,
    handler: LineHandler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscriptions: BTreeMap<u64, Registration>,
    outbound: Option<mpsc::UnboundedSender<ClientFrame>>,
    stats: StreamStats,
}

impl Registry {
    fn has_channel(&self, channel: &str) -> bool {
        self.subscriptions.values().any(|r| r.channel == channel)
    }

    fn send(&mut self, frame: ClientFrame) {
        let Some(tx) = self.outbound.as_ref() else {
            debug!("Not connected, deferring {:?}", frame);
            return;
        };
        if tx.send(frame).is_err() {
            warn!("Stream transport went away, dropping outbound channel");
            self.outbound = None;
        }
    }
}

/// Process-wide streaming connection.
///
/// The transport (see [`crate::stream::socket`]) attaches an outbound frame
/// channel when it connects and feeds every inbound text frame to
/// [`ConnectionManager::dispatch`]. Subscriptions outlive reconnects: each
/// attach replays a subscribe frame for every live channel.
#[derive(Default)]
pub struct ConnectionManager {
    registry: Mutex<Registry>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to `channel`
    pub fn subscribe(self: &Arc<Self>, channel: impl Into<String>, handler: LineHandler) -> Subscription {
        let channel = channel.into();
        let mut registry = self.lock();

        if !registry.has_channel(&channel) {
            registry.send(ClientFrame::Subscribe {
                channel: channel.clone(),
            });
        }

        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscriptions.insert(
            id,
            Registration {
                channel: channel.clone(),
                handler,
            },
        );
        info!("Subscribed to {}", channel);

        Subscription {
            id,
            channel,
            manager: Arc::downgrade(self),
            active: true,
        }
    }

    fn unsubscribe(&self, id: u64) {
        let mut registry = self.lock();
        let Some(registration) = registry.subscriptions.remove(&id) else {
            return;
        };
        if !registry.has_channel(&registration.channel) {
            registry.send(ClientFrame::Unsubscribe {
                channel: registration.channel.clone(),
            });
        }
        info!("Unsubscribed from {}", registration.channel);
    }

    /// Attach a freshly connected transport and replay live subscriptions
    pub fn on_connected(&self, outbound: mpsc::UnboundedSender<ClientFrame>) {
        let mut registry = self.lock();
        registry.outbound = Some(outbound);
        registry.stats.connections += 1;

        let channels: BTreeSet<String> = registry
            .subscriptions
            .values()
            .map(|r| r.channel.clone())
            .collect();
        for channel in channels {
            debug!("Resubscribing to {}", channel);
            registry.send(ClientFrame::Subscribe { channel });
        }
    }

    /// Detach the transport; subscriptions are kept for the next connection
    pub fn on_disconnected(&self) {
        self.lock().outbound = None;
    }

    pub fn is_connected(&self) -> bool {
        self.lock().outbound.is_some()
    }

    /// Route one inbound text frame to the subscribers of its channel.
    ///
    /// Handlers run after the registry lock is released, in the order frames
    /// are dispatched. Malformed frames are counted and dropped.
    pub fn dispatch(&self, text: &str) {
        let (channel, line) = match decode(text) {
            Ok(ServerFrame::Message { channel, line }) => (channel, line),
            Ok(ServerFrame::Pong) => {
                debug!("Stream pong received");
                return;
            }
            Err(e) => {
                self.lock().stats.malformed += 1;
                debug!(target: "launchpad::diagnostics", "Dropping malformed stream frame: {}", e);
                return;
            }
        };

        let handlers: Vec<LineHandler> = {
            let mut registry = self.lock();
            let handlers: Vec<LineHandler> = registry
                .subscriptions
                .values()
                .filter(|r| r.channel == channel)
                .map(|r| r.handler.clone())
                .collect();
            if handlers.is_empty() {
                registry.stats.unrouted += 1;
            } else {
                registry.stats.delivered += 1;
            }
            handlers
        };

        if handlers.is_empty() {
            debug!(target: "launchpad::diagnostics", "No subscriber for {}", channel);
            return;
        }
        for handler in handlers {
            handler(line.clone());
        }
    }

    /// Distinct channels with at least one live subscription
    pub fn channels(&self) -> Vec<String> {
        let registry = self.lock();
        let channels: BTreeSet<&String> = registry.subscriptions.values().map(|r| &r.channel).collect();
        channels.into_iter().cloned().collect()
    }

    pub fn stats(&self) -> StreamStats {
        self.lock().stats
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Registration on the shared connection; unsubscribes when dropped
pub struct Subscription {
    id: u64,
    channel: String,
    manager: Weak<ConnectionManager>,
    active: bool,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Detach the handler. Lines dispatched afterwards are not delivered.
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(manager) = self.manager.upgrade() {
            manager.unsubscribe(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("active", &self.active)
            .finish()
    }
}
