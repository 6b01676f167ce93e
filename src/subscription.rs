//! Subscription lifecycle tracking and subscribe-rate limiting.
//!
//! The rate limiter is the teacher's `batch::TokenBucket` adapted from a
//! blocking "how long should I sleep" limiter (right for pacing outbound API
//! calls) to a non-blocking "may I subscribe right now" gate: subscribing is
//! a one-shot control-plane action, not something worth suspending a caller
//! over, so a refused attempt returns `false` instead of a wait duration.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::{debug, warn};

use crate::models::MarketEventKind;

/// Lifecycle state of a single (symbol, event kind) subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Requested but not yet confirmed active by the transport layer.
    Pending,
    /// Confirmed and expected to be receiving events.
    Active,
    /// Temporarily suspended (e.g. during a reconnect) without losing its slot.
    Paused,
    /// The transport layer reported a failure for this subscription.
    Error,
    /// Explicitly torn down; no longer tracked.
    Unsubscribed,
}

#[derive(Debug, Clone)]
struct SubscriptionEntry {
    subscribers: HashSet<String>,
    state: SubscriptionState,
    created_at_ns: i64,
    last_update_ns: i64,
    message_count: u64,
    error_message: Option<String>,
}

/// Tunables for a [`SubscriptionManager`].
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionManagerConfig {
    /// Subscribe attempts allowed per second, enforced via a token bucket
    /// with burst capacity equal to one second's worth of attempts.
    pub max_subscriptions_per_second: f64,
    /// Upper bound on the total number of (symbol, event_type, subscriber)
    /// registrations tracked at once.
    pub max_total_subscriptions: usize,
    /// Upper bound on registrations for a single symbol across all event types.
    pub max_subscriptions_per_symbol: usize,
}

impl Default for SubscriptionManagerConfig {
    fn default() -> Self {
        Self {
            max_subscriptions_per_second: 10.0,
            max_total_subscriptions: 10_000,
            max_subscriptions_per_symbol: 100,
        }
    }
}

struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            capacity,
            refill_rate: capacity,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Attempt to consume one token, refusing rather than blocking if none
    /// are available.
    fn try_consume(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

type SubscriptionKey = (String, MarketEventKind);
type StateChangeCallback = Box<dyn FnMut(&str, MarketEventKind, SubscriptionState, SubscriptionState) + Send>;

/// Tracks `(symbol, event_type) -> set<subscriber_id>` plus lifecycle state,
/// and rate limits new subscribe attempts.
pub struct SubscriptionManager {
    entries: HashMap<SubscriptionKey, SubscriptionEntry>,
    limiter: TokenBucket,
    config: SubscriptionManagerConfig,
    on_state_change: Option<StateChangeCallback>,
}

impl SubscriptionManager {
    pub fn new(config: SubscriptionManagerConfig) -> Self {
        Self {
            entries: HashMap::new(),
            limiter: TokenBucket::new(config.max_subscriptions_per_second),
            config,
            on_state_change: None,
        }
    }

    /// Invoked synchronously whenever a subscription transitions state.
    pub fn on_state_change(
        &mut self,
        callback: impl FnMut(&str, MarketEventKind, SubscriptionState, SubscriptionState) + Send + 'static,
    ) {
        self.on_state_change = Some(Box::new(callback));
    }

    /// Register `subscriber_id`'s interest in `(symbol, event_type)`.
    ///
    /// Returns `false` without mutating any state if the rate limiter is
    /// exhausted, or if accepting the subscription would exceed
    /// `max_total_subscriptions` or `max_subscriptions_per_symbol`. The
    /// first subscriber for a (symbol, event_type) pair creates a `Pending`
    /// entry; later subscribers join the existing entry regardless of its
    /// current state.
    pub fn subscribe(&mut self, symbol: impl Into<String>, event_type: MarketEventKind, subscriber_id: impl Into<String>, now_ns: i64) -> bool {
        let symbol = symbol.into();
        let subscriber_id = subscriber_id.into();
        let key = (symbol.clone(), event_type);

        if self.entries.get(&key).is_some_and(|e| e.subscribers.contains(&subscriber_id)) {
            return true;
        }

        if self.total_subscriptions() >= self.config.max_total_subscriptions {
            warn!(symbol = %symbol, "subscription rejected: total subscription limit reached");
            return false;
        }
        if self.symbol_subscriptions(&symbol) >= self.config.max_subscriptions_per_symbol {
            warn!(symbol = %symbol, "subscription rejected: per-symbol subscription limit reached");
            return false;
        }
        if !self.limiter.try_consume() {
            warn!(symbol = %symbol, event_type = ?event_type, "subscribe rate limited");
            return false;
        }

        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.subscribers.insert(subscriber_id);
                entry.last_update_ns = now_ns;
            }
            None => {
                debug!(symbol = %symbol, event_type = ?event_type, "subscription pending");
                self.entries.insert(
                    key,
                    SubscriptionEntry {
                        subscribers: HashSet::from([subscriber_id]),
                        state: SubscriptionState::Pending,
                        created_at_ns: now_ns,
                        last_update_ns: now_ns,
                        message_count: 0,
                        error_message: None,
                    },
                );
            }
        }
        true
    }

    /// Remove `subscriber_id` from `(symbol, event_type)`. When it was the
    /// last subscriber, the entry is dropped entirely. Returns `false` if
    /// the subscriber was not registered.
    pub fn unsubscribe(&mut self, symbol: &str, event_type: MarketEventKind, subscriber_id: &str) -> bool {
        let key = (symbol.to_string(), event_type);
        let Some(entry) = self.entries.get_mut(&key) else { return false };
        if !entry.subscribers.remove(subscriber_id) {
            return false;
        }
        if entry.subscribers.is_empty() {
            self.set_state(&key, SubscriptionState::Unsubscribed);
            self.entries.remove(&key);
        }
        true
    }

    /// Transition a `Pending` subscription to `Active`. Returns `false` if
    /// no such entry exists or it was not `Pending`.
    pub fn confirm_subscription(&mut self, symbol: &str, event_type: MarketEventKind) -> bool {
        let key = (symbol.to_string(), event_type);
        if self.entries.get(&key).map(|e| e.state) != Some(SubscriptionState::Pending) {
            return false;
        }
        self.set_state(&key, SubscriptionState::Active);
        true
    }

    /// Mark a subscription as failed, recording `message` for inspection.
    pub fn mark_error(&mut self, symbol: &str, event_type: MarketEventKind, message: impl Into<String>) -> bool {
        let key = (symbol.to_string(), event_type);
        if !self.entries.contains_key(&key) {
            return false;
        }
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.error_message = Some(message.into());
        }
        self.set_state(&key, SubscriptionState::Error);
        true
    }

    /// Flip every `Active` subscription to `Paused`, e.g. while a transport
    /// reconnect is in progress.
    pub fn pause_all(&mut self) {
        let keys: Vec<SubscriptionKey> = self
            .entries
            .iter()
            .filter(|(_, e)| e.state == SubscriptionState::Active)
            .map(|(k, _)| k.clone())
            .collect();
        for key in keys {
            self.set_state(&key, SubscriptionState::Paused);
        }
    }

    /// Flip every `Paused` subscription back to `Active`.
    pub fn resume_all(&mut self) {
        let keys: Vec<SubscriptionKey> = self
            .entries
            .iter()
            .filter(|(_, e)| e.state == SubscriptionState::Paused)
            .map(|(k, _)| k.clone())
            .collect();
        for key in keys {
            self.set_state(&key, SubscriptionState::Active);
        }
    }

    /// Record that a message was delivered for `(symbol, event_type)`,
    /// bumping its message counter and last-update timestamp.
    pub fn record_message(&mut self, symbol: &str, event_type: MarketEventKind, now_ns: i64) {
        if let Some(entry) = self.entries.get_mut(&(symbol.to_string(), event_type)) {
            entry.message_count += 1;
            entry.last_update_ns = now_ns;
        }
    }

    fn set_state(&mut self, key: &SubscriptionKey, new_state: SubscriptionState) {
        let Some(entry) = self.entries.get_mut(key) else { return };
        let old_state = entry.state;
        if old_state == new_state {
            return;
        }
        entry.state = new_state;
        if let Some(cb) = self.on_state_change.as_mut() {
            cb(&key.0, key.1, old_state, new_state);
        }
    }

    pub fn state(&self, symbol: &str, event_type: MarketEventKind) -> Option<SubscriptionState> {
        self.entries.get(&(symbol.to_string(), event_type)).map(|e| e.state)
    }

    pub fn is_subscribed(&self, symbol: &str, event_type: MarketEventKind, subscriber_id: &str) -> bool {
        self.entries
            .get(&(symbol.to_string(), event_type))
            .is_some_and(|e| e.subscribers.contains(subscriber_id))
    }

    pub fn subscriber_count(&self, symbol: &str, event_type: MarketEventKind) -> usize {
        self.entries
            .get(&(symbol.to_string(), event_type))
            .map(|e| e.subscribers.len())
            .unwrap_or(0)
    }

    pub fn last_error(&self, symbol: &str, event_type: MarketEventKind) -> Option<&str> {
        self.entries
            .get(&(symbol.to_string(), event_type))
            .and_then(|e| e.error_message.as_deref())
    }

    /// Every subscriber id registered for `(symbol, event_type)`.
    pub fn subscribers(&self, symbol: &str, event_type: MarketEventKind) -> Vec<String> {
        self.entries
            .get(&(symbol.to_string(), event_type))
            .map(|e| e.subscribers.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every distinct symbol with at least one tracked subscription.
    pub fn active_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.entries.keys().map(|(s, _)| s.clone()).collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }

    /// Every event type subscribed to for `symbol`.
    pub fn event_types(&self, symbol: &str) -> Vec<MarketEventKind> {
        self.entries
            .keys()
            .filter(|(s, _)| s == symbol)
            .map(|(_, k)| *k)
            .collect()
    }

    fn count_in_state(&self, state: SubscriptionState) -> usize {
        self.entries.values().filter(|e| e.state == state).count()
    }

    pub fn total_count(&self) -> usize {
        self.entries.len()
    }

    pub fn pending_count(&self) -> usize {
        self.count_in_state(SubscriptionState::Pending)
    }

    pub fn active_count(&self) -> usize {
        self.count_in_state(SubscriptionState::Active)
    }

    pub fn error_count(&self) -> usize {
        self.count_in_state(SubscriptionState::Error)
    }

    fn total_subscriptions(&self) -> usize {
        self.entries.values().map(|e| e.subscribers.len()).sum()
    }

    fn symbol_subscriptions(&self, symbol: &str) -> usize {
        self.entries
            .iter()
            .filter(|((s, _), _)| s == symbol)
            .map(|(_, e)| e.subscribers.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s6_subscribe_lifecycle_and_rate_limit() {
        let mut manager = SubscriptionManager::new(SubscriptionManagerConfig {
            max_subscriptions_per_second: 2.0,
            ..Default::default()
        });

        assert!(manager.subscribe("BTCUSDT", MarketEventKind::Trade, "s1", 0));
        assert!(manager.subscribe("ETHUSDT", MarketEventKind::Trade, "s1", 0));
        assert!(!manager.subscribe("SOLUSDT", MarketEventKind::Trade, "s1", 0));
        assert_eq!(manager.state("SOLUSDT", MarketEventKind::Trade), None);

        assert_eq!(manager.state("BTCUSDT", MarketEventKind::Trade), Some(SubscriptionState::Pending));
        assert!(manager.confirm_subscription("BTCUSDT", MarketEventKind::Trade));
        assert_eq!(manager.state("BTCUSDT", MarketEventKind::Trade), Some(SubscriptionState::Active));
        assert_eq!(manager.active_count(), 1);
    }

    #[test]
    fn multiple_subscribers_share_one_entry() {
        let mut manager = SubscriptionManager::new(SubscriptionManagerConfig::default());
        manager.subscribe("BTCUSDT", MarketEventKind::Trade, "alice", 0);
        manager.subscribe("BTCUSDT", MarketEventKind::Trade, "bob", 1);
        assert_eq!(manager.subscriber_count("BTCUSDT", MarketEventKind::Trade), 2);
        assert_eq!(manager.total_count(), 1);

        assert!(manager.unsubscribe("BTCUSDT", MarketEventKind::Trade, "alice"));
        assert_eq!(manager.subscriber_count("BTCUSDT", MarketEventKind::Trade), 1);
        assert!(manager.unsubscribe("BTCUSDT", MarketEventKind::Trade, "bob"));
        assert_eq!(manager.total_count(), 0);
        assert!(manager.state("BTCUSDT", MarketEventKind::Trade).is_none());
    }

    #[test]
    fn per_symbol_cap_is_enforced_independently_of_total_cap() {
        let mut manager = SubscriptionManager::new(SubscriptionManagerConfig {
            max_subscriptions_per_second: 100.0,
            max_total_subscriptions: 100,
            max_subscriptions_per_symbol: 1,
        });
        assert!(manager.subscribe("BTCUSDT", MarketEventKind::Trade, "alice", 0));
        assert!(!manager.subscribe("BTCUSDT", MarketEventKind::BookDelta, "bob", 0));
        assert!(manager.subscribe("ETHUSDT", MarketEventKind::Trade, "bob", 0));
    }

    #[test]
    fn pause_all_and_resume_all_flip_only_active_entries() {
        let mut manager = SubscriptionManager::new(SubscriptionManagerConfig::default());
        manager.subscribe("BTCUSDT", MarketEventKind::Trade, "alice", 0);
        manager.confirm_subscription("BTCUSDT", MarketEventKind::Trade);
        manager.subscribe("ETHUSDT", MarketEventKind::Trade, "alice", 0); // stays Pending

        manager.pause_all();
        assert_eq!(manager.state("BTCUSDT", MarketEventKind::Trade), Some(SubscriptionState::Paused));
        assert_eq!(manager.state("ETHUSDT", MarketEventKind::Trade), Some(SubscriptionState::Pending));

        manager.resume_all();
        assert_eq!(manager.state("BTCUSDT", MarketEventKind::Trade), Some(SubscriptionState::Active));
    }

    #[test]
    fn state_change_callback_fires_on_every_transition() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let mut manager = SubscriptionManager::new(SubscriptionManagerConfig::default());
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        manager.on_state_change(move |_, _, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        manager.subscribe("BTCUSDT", MarketEventKind::Trade, "alice", 0);
        manager.confirm_subscription("BTCUSDT", MarketEventKind::Trade);
        manager.mark_error("BTCUSDT", MarketEventKind::Trade, "boom");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn queries_report_active_symbols_and_event_types() {
        let mut manager = SubscriptionManager::new(SubscriptionManagerConfig::default());
        manager.subscribe("BTCUSDT", MarketEventKind::Trade, "alice", 0);
        manager.subscribe("BTCUSDT", MarketEventKind::BookDelta, "alice", 0);
        manager.subscribe("ETHUSDT", MarketEventKind::Trade, "alice", 0);

        assert_eq!(manager.active_symbols(), vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]);
        let mut kinds = manager.event_types("BTCUSDT");
        kinds.sort_by_key(|k| format!("{k:?}"));
        assert_eq!(kinds.len(), 2);
        assert_eq!(manager.subscribers("BTCUSDT", MarketEventKind::Trade), vec!["alice".to_string()]);
    }
}
