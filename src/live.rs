use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Channel carrying score and spirit events for one match.
pub fn match_channel(match_id: i64) -> String {
    format!("live:match:{}", match_id)
}

/// Channel carrying full standings for one tournament.
pub fn leaderboard_channel(tournament_id: i64) -> String {
    format!("live:leaderboard:{}", tournament_id)
}

/// Channel carrying personal notifications for one user.
pub fn user_channel(user_id: i64) -> String {
    format!("notify:user:{}", user_id)
}

/// The in-process publish/subscribe bus behind live updates.
///
/// Constructed once at startup, injected wherever events are published, and
/// closed on shutdown. Messages published to a channel reach every live
/// subscription of that channel in publish order; a channel with no
/// subscribers drops the message.
#[derive(Debug, Default)]
pub struct LiveBus {
    topics: Mutex<HashMap<String, Vec<(u64, mpsc::UnboundedSender<String>)>>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl LiveBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes the event and delivers it to every subscriber of the
    /// channel. Fire-and-forget: failures are logged, never surfaced, so a
    /// broken broadcast can never fail the mutation that triggered it.
    ///
    /// Returns how many subscribers received the message.
    pub fn publish(&self, channel: &str, event: &impl Serialize) -> usize {
        if self.closed.load(Ordering::Acquire) {
            warn!("Dropping live update for {}: bus is closed", channel);
            return 0;
        }

        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Dropping live update for {}: {}", channel, e);
                return 0;
            }
        };

        let mut topics = match self.topics.lock() {
            Ok(topics) => topics,
            Err(e) => {
                warn!("Dropping live update for {}: {}", channel, e);
                return 0;
            }
        };

        let Some(subscribers) = topics.get_mut(channel) else {
            return 0;
        };

        // Senders whose receiver is gone get pruned as we go.
        subscribers.retain(|(_, tx)| tx.send(payload.clone()).is_ok());
        let delivered = subscribers.len();
        if subscribers.is_empty() {
            topics.remove(channel);
        }

        debug!("Published to {} ({} subscribers)", channel, delivered);
        delivered
    }

    /// Registers a new subscription on a channel.
    ///
    /// The returned handle buffers every message published while it is alive
    /// and releases its registration when dropped.
    pub fn subscribe(self: &Arc<Self>, channel: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut topics) = self.topics.lock() {
            topics.entry(channel.to_string()).or_default().push((id, tx));
        }

        Subscription {
            channel: channel.to_string(),
            id,
            rx,
            bus: Arc::downgrade(self),
        }
    }

    /// How many live subscriptions a channel has.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.topics
            .lock()
            .map(|topics| topics.get(channel).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Shuts the bus down: drops every subscriber sender so pending `recv`
    /// calls resolve to `None`, and rejects further publishes.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if let Ok(mut topics) = self.topics.lock() {
            topics.clear();
        }
    }
}

/// A live registration on one channel.
///
/// Each relay connection owns exactly one of these, never shared. Dropping
/// it unsubscribes, so cleanup happens on every exit path of the owning
/// task, panics and cancellation included.
#[derive(Debug)]
pub struct Subscription {
    channel: String,
    id: u64,
    rx: mpsc::UnboundedReceiver<String>,
    bus: Weak<LiveBus>,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Waits for the next published message.
    ///
    /// Returns `None` once the bus has closed or this subscription was
    /// removed; messages already buffered are still drained first.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        let Ok(mut topics) = bus.topics.lock() else {
            return;
        };
        if let Some(subscribers) = topics.get_mut(&self.channel) {
            subscribers.retain(|(id, _)| *id != self.id);
            if subscribers.is_empty() {
                topics.remove(&self.channel);
            }
        }
    }
}
