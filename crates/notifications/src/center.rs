//! The notification feed: history, unread counters and alert side effects.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, trace};

use rentdesk_protocol::{InboundEnvelope, Module};

use crate::alerts::{AlertSink, DesktopAlert, Permission};
use crate::config::NotificationConfig;
use crate::history::NotificationHistory;
use crate::templates::{Template, entity_id, render_message, template_for};
use crate::types::{Notification, Priority, UnreadCounters};

/// Aggregates domain events into a bounded, unread-counted feed.
///
/// Not internally synchronized; share it behind a mutex.
pub struct NotificationCenter {
    config: NotificationConfig,
    history: NotificationHistory,
    counters: UnreadCounters,
    alerts: Arc<dyn AlertSink>,
    /// Last time each `(type, entity id)` produced a notification.
    recent: HashMap<(String, String), DateTime<Utc>>,
}

impl NotificationCenter {
    pub fn new(config: NotificationConfig, alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            history: NotificationHistory::new(config.history_limit),
            counters: UnreadCounters::default(),
            alerts,
            recent: HashMap::new(),
            config,
        }
    }

    /// Turns a domain event into a notification. Returns its id, or `None`
    /// for control/unknown types and deduplicated repeats.
    pub fn ingest(&mut self, envelope: &InboundEnvelope) -> Option<String> {
        self.ingest_at(envelope, Utc::now())
    }

    /// [`NotificationCenter::ingest`] with an explicit clock.
    pub fn ingest_at(&mut self, envelope: &InboundEnvelope, now: DateTime<Utc>) -> Option<String> {
        let msg_type = envelope.message_type();
        let (Some(module), Some(template)) = (msg_type.module(), template_for(msg_type)) else {
            debug!(msg_type = %envelope.msg_type, "not a notifiable event");
            return None;
        };

        if self.is_repeat(envelope, now) {
            debug!(msg_type = %msg_type, "dropping repeated event");
            return None;
        }

        let notification = Notification {
            id: uuid::Uuid::new_v4().to_string(),
            kind: template.kind,
            module,
            event_type: envelope.msg_type.clone(),
            title: template.title.to_string(),
            message: render_message(envelope),
            data: envelope.data.clone(),
            timestamp: now,
            icon: template.icon.to_string(),
            priority: template.priority,
            sound: template.sound,
            read: false,
        };
        let id = notification.id.clone();
        let alert = DesktopAlert {
            title: notification.title.clone(),
            body: notification.message.clone(),
            icon: notification.icon.clone(),
            require_interaction: notification.priority == Priority::High,
        };

        if let Some(evicted) = self.history.push(notification) {
            trace!(evicted = %evicted.id, "history full, dropped oldest");
        }
        self.counters.increment(module);
        debug!(
            %module,
            msg_type = %msg_type,
            priority = %template.priority,
            unread = self.counters.total,
            "notification added"
        );

        self.raise(template, &alert);
        Some(id)
    }

    fn is_repeat(&mut self, envelope: &InboundEnvelope, now: DateTime<Utc>) -> bool {
        if self.config.dedupe_window_ms == 0 {
            return false;
        }
        let Some(entity) = entity_id(envelope) else {
            return false;
        };

        let window = i64::try_from(self.config.dedupe_window_ms)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .unwrap_or(TimeDelta::MAX);
        self.recent.retain(|_, at| now.signed_duration_since(*at) < window);

        let key = (envelope.msg_type.clone(), entity);
        if self.recent.contains_key(&key) {
            return true;
        }
        self.recent.insert(key, now);
        false
    }

    /// Sound and desktop notification. Failures never reach the caller.
    fn raise(&self, template: Template, alert: &DesktopAlert) {
        if self.config.sound
            && template.sound
            && template.priority == Priority::High
            && let Err(e) = self.alerts.play_sound()
        {
            debug!("notification sound failed: {e}");
        }

        if self.config.desktop
            && self.alerts.permission() == Permission::Granted
            && let Err(e) = self.alerts.show(alert)
        {
            debug!("desktop notification failed: {e}");
        }
    }

    /// Removes one notification. An unread one also lowers the counters.
    pub fn clear(&mut self, id: &str) -> bool {
        match self.history.remove(id) {
            Some(n) => {
                if !n.read {
                    self.counters.decrement(n.module);
                }
                true
            }
            None => false,
        }
    }

    /// Empties the feed and zeroes every counter.
    pub fn clear_all(&mut self) {
        self.history.clear();
        self.counters.clear();
    }

    /// Removes one module's notifications and zeroes its counter. Returns how
    /// many notifications were removed.
    pub fn clear_module(&mut self, module: Module) -> usize {
        let removed = self.history.remove_module(module);
        self.counters.reset(module);
        removed
    }

    /// Marks a notification read. Returns `false` if it is unknown or was
    /// already read.
    pub fn mark_read(&mut self, id: &str) -> bool {
        let Some(n) = self.history.get_mut(id) else {
            return false;
        };
        if n.read {
            return false;
        }
        n.read = true;
        let module = n.module;
        self.counters.decrement(module);
        true
    }

    /// Asks for desktop-notification permission. Only prompts while the
    /// permission is undecided; returns whether it is granted.
    pub fn request_permission(&self) -> bool {
        match self.alerts.permission() {
            Permission::Granted => true,
            Permission::Denied => false,
            Permission::Default => match self.alerts.request_permission() {
                Ok(p) => {
                    info!(permission = ?p, "notification permission answered");
                    p == Permission::Granted
                }
                Err(e) => {
                    debug!("permission request failed: {e}");
                    false
                }
            },
        }
    }

    pub fn permission(&self) -> Permission {
        self.alerts.permission()
    }

    /// Notifications, newest first.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.history.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.history.get(id)
    }

    pub fn unread_counts(&self) -> UnreadCounters {
        self.counters
    }

    /// The most urgent unread notification; the newest wins a tie.
    pub fn highest_priority_unread(&self) -> Option<&Notification> {
        self.history
            .iter()
            .rev()
            .filter(|n| !n.read)
            .max_by_key(|n| n.priority)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("len", &self.history.len())
            .field("counters", &self.counters)
            .field("permission", &self.alerts.permission())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{NoopAlerts, RecordingAlerts};
    use rentdesk_protocol::MessageType;
    use serde_json::json;

    fn center_with(alerts: Arc<dyn AlertSink>) -> NotificationCenter {
        NotificationCenter::new(NotificationConfig::default(), alerts)
    }

    fn center() -> NotificationCenter {
        center_with(Arc::new(NoopAlerts))
    }

    fn env(t: MessageType, data: serde_json::Value) -> InboundEnvelope {
        InboundEnvelope::event(t, data)
    }

    fn assert_consistent(c: &NotificationCenter) {
        let counts = c.unread_counts();
        assert_eq!(counts.total, counts.module_sum(), "{counts:?}");
    }

    #[test]
    fn new_quote_scenario() {
        let mut c = center();
        let before = c.unread_counts();
        let id = c
            .ingest(&env(
                MessageType::NewQuote,
                json!({"customer": {"name": "Ada"}, "categoryName": "Tents"}),
            ))
            .unwrap();

        let n = c.get(&id).unwrap();
        assert_eq!(n.module, Module::Quotes);
        assert_eq!(n.priority, Priority::High);
        assert!(n.sound);
        assert!(!n.read);
        assert!(n.message.contains("Ada"));
        assert!(n.message.contains("Tents"));
        assert_eq!(n.data, Some(json!({"customer": {"name": "Ada"}, "categoryName": "Tents"})));

        let after = c.unread_counts();
        assert_eq!(after.quotes, before.quotes + 1);
        assert_eq!(after.total, before.total + 1);
    }

    #[test]
    fn clear_module_scenario() {
        let mut c = center();
        for i in 0..3 {
            c.ingest(&env(MessageType::NewOrder, json!({"id": format!("o{i}")})));
        }
        for i in 0..2 {
            c.ingest(&env(MessageType::NewQuote, json!({"id": format!("q{i}")})));
        }
        assert_eq!(c.len(), 5);

        assert_eq!(c.clear_module(Module::Orders), 3);
        assert_eq!(c.len(), 2);
        assert!(c.notifications().all(|n| n.module == Module::Quotes));
        assert_eq!(c.unread_counts().orders, 0);
        assert_eq!(c.unread_counts().total, 2);
    }

    #[test]
    fn unknown_event_changes_nothing() {
        let mut c = center();
        let raw = InboundEnvelope::parse(r#"{"type":"unknown_future_event","data":{"id":"x"}}"#).unwrap();
        assert!(c.ingest(&raw).is_none());
        let pong = InboundEnvelope::parse(r#"{"type":"pong"}"#).unwrap();
        assert!(c.ingest(&pong).is_none());
        assert!(c.is_empty());
        assert_eq!(c.unread_counts(), UnreadCounters::default());
    }

    #[test]
    fn denied_permission_does_not_prompt() {
        let sink = Arc::new(RecordingAlerts::new(Permission::Denied, Permission::Granted));
        let c = center_with(sink.clone());
        assert!(!c.request_permission());
        assert_eq!(sink.with_log(|l| l.prompts), 0);
    }

    #[test]
    fn granted_permission_does_not_prompt() {
        let sink = Arc::new(RecordingAlerts::new(Permission::Granted, Permission::Denied));
        let c = center_with(sink.clone());
        assert!(c.request_permission());
        assert_eq!(sink.with_log(|l| l.prompts), 0);
    }

    #[test]
    fn default_permission_prompts_once() {
        let sink = Arc::new(RecordingAlerts::new(Permission::Default, Permission::Granted));
        let c = center_with(sink.clone());
        assert!(c.request_permission());
        assert!(c.request_permission());
        assert_eq!(sink.with_log(|l| l.prompts), 1);
        assert_eq!(c.permission(), Permission::Granted);
    }

    #[test]
    fn history_is_capped_and_counters_survive_eviction() {
        let mut c = center();
        for i in 0..55 {
            c.ingest(&env(MessageType::OrderUpdated, json!({"id": format!("o{i}")})));
        }
        assert_eq!(c.len(), 50);
        assert_eq!(c.notifications().last().unwrap().data, Some(json!({"id": "o5"})));
        assert_eq!(c.unread_counts().orders, 55);
        assert_consistent(&c);
    }

    #[test]
    fn mark_read_lowers_module_and_total_once() {
        let mut c = center();
        let id = c.ingest(&env(MessageType::NewBooking, json!({"id": "b1"}))).unwrap();
        c.ingest(&env(MessageType::NewBooking, json!({"id": "b2"})));

        assert!(c.mark_read(&id));
        assert!(!c.mark_read(&id));
        assert!(!c.mark_read("missing"));
        assert_eq!(c.unread_counts().bookings, 1);
        assert_eq!(c.unread_counts().total, 1);
        assert!(c.get(&id).unwrap().read);

        // Clearing a read notification does not count it again.
        assert!(c.clear(&id));
        assert_eq!(c.unread_counts().total, 1);
        assert_consistent(&c);
    }

    #[test]
    fn clear_one_and_all() {
        let mut c = center();
        let a = c.ingest(&env(MessageType::NewOrder, json!({"id": "1"}))).unwrap();
        c.ingest(&env(MessageType::QuoteDeleted, json!({"id": "2"})));

        assert!(c.clear(&a));
        assert!(!c.clear(&a));
        assert_eq!(c.unread_counts().orders, 0);
        assert_eq!(c.unread_counts().total, 1);

        c.clear_all();
        assert!(c.is_empty());
        assert_eq!(c.unread_counts(), UnreadCounters::default());
    }

    #[test]
    fn total_matches_sum_over_mixed_operations() {
        let types = [
            MessageType::NewBooking,
            MessageType::OrderStatusUpdated,
            MessageType::QuoteResponseCreated,
            MessageType::BookingDeleted,
            MessageType::NewOrder,
        ];
        let mut c = NotificationCenter::new(
            NotificationConfig {
                history_limit: 8,
                ..NotificationConfig::default()
            },
            Arc::new(NoopAlerts),
        );
        let mut ids = Vec::new();
        // Small LCG so the sequence is arbitrary but reproducible.
        let mut seed: u32 = 7;
        for step in 0..400 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let pick = (seed >> 16) as usize;
            match pick % 7 {
                0..=2 => {
                    let t = types[pick % types.len()];
                    if let Some(id) = c.ingest(&env(t, json!({"id": step}))) {
                        ids.push(id);
                    }
                }
                3 => {
                    if let Some(id) = ids.get(pick % ids.len().max(1)) {
                        c.mark_read(id);
                    }
                }
                4 => {
                    if let Some(id) = ids.get(pick % ids.len().max(1)) {
                        c.clear(id);
                    }
                }
                5 => {
                    c.clear_module(Module::ALL[pick % 3]);
                }
                _ => {
                    if pick % 11 == 0 {
                        c.clear_all();
                    }
                }
            }
            assert_consistent(&c);
            assert!(c.len() <= 8);
        }
    }

    #[test]
    fn duplicate_within_window_is_dropped() {
        let mut c = center();
        let t0 = Utc::now();
        let e = env(MessageType::NewOrder, json!({"_id": "o-1"}));
        assert!(c.ingest_at(&e, t0).is_some());
        assert!(c.ingest_at(&e, t0 + TimeDelta::seconds(2)).is_none());
        assert_eq!(c.len(), 1);

        // Same entity, different type: not a repeat.
        let status = env(MessageType::OrderStatusUpdated, json!({"_id": "o-1"}));
        assert!(c.ingest_at(&status, t0 + TimeDelta::seconds(2)).is_some());

        // Window elapsed.
        assert!(c.ingest_at(&e, t0 + TimeDelta::seconds(6)).is_some());
        assert_eq!(c.len(), 3);
        assert_eq!(c.unread_counts().total, 3);
    }

    #[test]
    fn events_without_id_are_never_deduplicated() {
        let mut c = center();
        let e = env(MessageType::NewQuote, json!({"categoryName": "Chairs"}));
        let now = Utc::now();
        assert!(c.ingest_at(&e, now).is_some());
        assert!(c.ingest_at(&e, now).is_some());
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn zero_window_disables_dedupe() {
        let mut c = NotificationCenter::new(
            NotificationConfig {
                dedupe_window_ms: 0,
                ..NotificationConfig::default()
            },
            Arc::new(NoopAlerts),
        );
        let e = env(MessageType::NewOrder, json!({"id": "same"}));
        let now = Utc::now();
        assert!(c.ingest_at(&e, now).is_some());
        assert!(c.ingest_at(&e, now).is_some());
    }

    #[test]
    fn sound_only_for_high_priority_with_sound() {
        let sink = Arc::new(RecordingAlerts::new(Permission::Denied, Permission::Denied));
        let mut c = center_with(sink.clone());
        c.ingest(&env(MessageType::NewBooking, json!({"id": "1"})));
        c.ingest(&env(MessageType::BookingStatusUpdate, json!({"id": "1"})));
        c.ingest(&env(MessageType::QuoteResponseCreated, json!({"id": "2"})));
        assert_eq!(sink.with_log(|l| l.sounds), 1);
        assert_eq!(sink.with_log(|l| l.shown.len()), 0);
    }

    #[test]
    fn desktop_alert_when_granted_with_interaction_for_high() {
        let sink = Arc::new(RecordingAlerts::new(Permission::Granted, Permission::Granted));
        let mut c = center_with(sink.clone());
        c.ingest(&env(MessageType::NewOrder, json!({"id": "1", "customerName": "Bo"})));
        c.ingest(&env(MessageType::OrderDeleted, json!({"id": "1"})));

        sink.with_log(|l| {
            assert_eq!(l.shown.len(), 2);
            assert_eq!(l.shown[0].title, "New Order");
            assert!(l.shown[0].body.contains("Bo"));
            assert!(l.shown[0].require_interaction);
            assert!(!l.shown[1].require_interaction);
        });
    }

    #[test]
    fn alert_failures_are_swallowed() {
        let sink = Arc::new(RecordingAlerts::failing(Permission::Granted));
        let mut c = center_with(sink.clone());
        assert!(c.ingest(&env(MessageType::NewQuote, json!({"id": "q"}))).is_some());
        assert_eq!(c.len(), 1);
        assert_eq!(c.unread_counts().quotes, 1);
        assert_eq!(sink.with_log(|l| (l.sounds, l.shown.len())), (1, 1));
    }

    #[test]
    fn sound_can_be_disabled() {
        let sink = Arc::new(RecordingAlerts::new(Permission::Denied, Permission::Denied));
        let mut c = NotificationCenter::new(
            NotificationConfig {
                sound: false,
                ..NotificationConfig::default()
            },
            sink.clone(),
        );
        c.ingest(&env(MessageType::NewBooking, json!({"id": "1"})));
        assert_eq!(sink.with_log(|l| l.sounds), 0);
    }

    #[test]
    fn highest_priority_unread_prefers_priority_then_recency() {
        let mut c = center();
        assert!(c.highest_priority_unread().is_none());

        let low = c.ingest(&env(MessageType::OrderUpdated, json!({"id": "1"}))).unwrap();
        let high_old = c.ingest(&env(MessageType::NewOrder, json!({"id": "2"}))).unwrap();
        let high_new = c.ingest(&env(MessageType::NewBooking, json!({"id": "3"}))).unwrap();
        c.ingest(&env(MessageType::QuoteStatusUpdated, json!({"id": "4"})));

        assert_eq!(c.highest_priority_unread().unwrap().id, high_new);
        c.mark_read(&high_new);
        assert_eq!(c.highest_priority_unread().unwrap().id, high_old);
        c.mark_read(&high_old);
        assert_eq!(c.highest_priority_unread().unwrap().priority, Priority::Medium);
        c.clear_module(Module::Quotes);
        assert_eq!(c.highest_priority_unread().unwrap().id, low);
    }
}
