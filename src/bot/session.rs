use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::config::SessionSettings;
use crate::domain::PlayerId;

/// A `/matchresult` waiting for its body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReport {
    pub chat_id: i64,
    pub opened_at: DateTime<Utc>,
}

/// Users who asked to report a match and whose next message is the report.
///
/// Entries expire after the configured TTL and the table never holds more
/// than `capacity` entries; the oldest one is evicted to make room.
pub struct PendingReports {
    entries: Mutex<HashMap<PlayerId, PendingReport>>,
    ttl: Duration,
    capacity: usize,
}

impl PendingReports {
    pub fn new(settings: &SessionSettings) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(settings.ttl_secs),
            capacity: settings.capacity.max(1),
        }
    }

    pub fn open(&self, user_id: PlayerId, chat_id: i64, now: DateTime<Utc>) {
        let mut entries = self.lock();
        self.prune(&mut entries, now);

        if !entries.contains_key(&user_id) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, pending)| pending.opened_at)
                .map(|(id, _)| *id);
            if let Some(id) = oldest {
                debug!("Pending reports full, evicting user {}", id);
                entries.remove(&id);
            }
        }

        entries.insert(
            user_id,
            PendingReport {
                chat_id,
                opened_at: now,
            },
        );
    }

    /// Consumes the user's pending report if it is still live and was opened
    /// in `chat_id`
    pub fn take(&self, user_id: PlayerId, chat_id: i64, now: DateTime<Utc>) -> Option<PendingReport> {
        let mut entries = self.lock();
        self.prune(&mut entries, now);

        match entries.get(&user_id) {
            Some(pending) if pending.chat_id == chat_id => entries.remove(&user_id),
            _ => None,
        }
    }

    /// Returns true when something was cancelled
    pub fn cancel(&self, user_id: PlayerId) -> bool {
        self.lock().remove(&user_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(&self, entries: &mut HashMap<PlayerId, PendingReport>, now: DateTime<Utc>) {
        entries.retain(|_, pending| now - pending.opened_at < self.ttl);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PlayerId, PendingReport>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
