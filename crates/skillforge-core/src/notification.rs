//! Bounded notification queue for the presentation layer.
//!
//! Completions, level-ups, unlocks and purchases append a [`Notification`].
//! The queue keeps at most `capacity` entries (oldest dropped first) and the
//! UI shows the first `visible` of them. Passive listeners see every
//! notification as it is pushed. When suppressed (the player turned
//! notifications off) nothing is recorded or delivered.

use crate::fixed::Millis;
use crate::id::{NotificationId, SkillId};
use serde::Serialize;
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    XpGain,
    ItemGain,
    LevelUp,
    ActivityUnlock,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub skill: Option<SkillId>,
    pub message: String,
    pub details: Vec<String>,
    pub icon: Option<String>,
    pub duration_ms: Millis,
    pub timestamp: Millis,
}

/// A notification before the queue assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub kind: NotificationKind,
    pub skill: Option<SkillId>,
    pub message: String,
    pub details: Vec<String>,
    pub icon: Option<String>,
    /// `None` uses the queue's default duration.
    pub duration_ms: Option<Millis>,
}

impl NotificationDraft {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            skill: None,
            message: message.into(),
            details: Vec::new(),
            icon: None,
            duration_ms: None,
        }
    }

    pub fn skill(mut self, skill: SkillId) -> Self {
        self.skill = Some(skill);
        self
    }

    pub fn details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn duration(mut self, duration_ms: Millis) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// A passive listener receives notifications read-only.
pub type NotificationListener = Box<dyn FnMut(&Notification) + Send>;

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

pub struct NotificationQueue {
    entries: VecDeque<Notification>,
    capacity: usize,
    visible: usize,
    default_duration_ms: Millis,
    next_id: u64,
    suppressed: bool,
    total_written: u64,
    evicted: u64,
    listeners: Vec<NotificationListener>,
}

impl std::fmt::Debug for NotificationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationQueue")
            .field("entries", &self.entries)
            .field("capacity", &self.capacity)
            .field("visible", &self.visible)
            .field("suppressed", &self.suppressed)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl NotificationQueue {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize, visible: usize, default_duration_ms: Millis) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            visible,
            default_duration_ms,
            next_id: 1,
            suppressed: false,
            total_written: 0,
            evicted: 0,
            listeners: Vec::new(),
        }
    }

    /// Record a notification. Returns its id, or `None` while suppressed.
    pub fn push(&mut self, draft: NotificationDraft, now: Millis) -> Option<NotificationId> {
        if self.suppressed {
            return None;
        }
        let id = NotificationId(self.next_id);
        self.next_id += 1;
        let notification = Notification {
            id,
            kind: draft.kind,
            skill: draft.skill,
            message: draft.message,
            details: draft.details,
            icon: draft.icon,
            duration_ms: draft.duration_ms.unwrap_or(self.default_duration_ms),
            timestamp: now,
        };
        for listener in &mut self.listeners {
            listener(&notification);
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }
        self.entries.push_back(notification);
        self.total_written += 1;
        Some(id)
    }

    pub fn subscribe(&mut self, listener: NotificationListener) {
        self.listeners.push(listener);
    }

    /// Move every listener of `other` onto this queue.
    pub fn adopt_listeners(&mut self, other: &mut NotificationQueue) {
        self.listeners.append(&mut other.listeners);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Remove one notification. Returns false if it was not queued.
    pub fn remove(&mut self, id: NotificationId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|n| n.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Take every queued notification, oldest first.
    pub fn drain(&mut self) -> Vec<Notification> {
        self.entries.drain(..).collect()
    }

    /// The notifications the UI should currently show, oldest first.
    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter().take(self.visible)
    }

    /// All retained notifications, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn set_suppressed(&mut self, suppressed: bool) {
        self.suppressed = suppressed;
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Notifications pushed since creation, including evicted ones.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Notifications evicted because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn draft(n: u32) -> NotificationDraft {
        NotificationDraft::new(NotificationKind::XpGain, format!("+{n} Woodcutting XP"))
    }

    #[test]
    fn push_assigns_ids_and_default_duration() {
        let mut q = NotificationQueue::new(10, 3, 3500);
        let a = q.push(draft(1), 100).unwrap();
        let b = q
            .push(draft(2).duration(4000).icon("🎉"), 200)
            .unwrap();
        assert!(a < b);
        let all: Vec<_> = q.iter().collect();
        assert_eq!(all[0].duration_ms, 3500);
        assert_eq!(all[0].timestamp, 100);
        assert_eq!(all[1].duration_ms, 4000);
        assert_eq!(all[1].icon.as_deref(), Some("🎉"));
    }

    #[test]
    fn oldest_is_evicted_at_capacity() {
        let mut q = NotificationQueue::new(10, 3, 3500);
        for n in 0..15 {
            q.push(draft(n), 0);
        }
        assert_eq!(q.len(), 10);
        assert_eq!(q.iter().next().unwrap().message, "+5 Woodcutting XP");
        assert_eq!(q.total_written(), 15);
        assert_eq!(q.dropped_count(), 5);
    }

    #[test]
    fn visible_is_bounded() {
        let mut q = NotificationQueue::new(10, 3, 3500);
        for n in 0..5 {
            q.push(draft(n), 0);
        }
        let shown: Vec<_> = q.visible().map(|n| n.message.as_str()).collect();
        assert_eq!(shown, vec!["+0 Woodcutting XP", "+1 Woodcutting XP", "+2 Woodcutting XP"]);
    }

    #[test]
    fn remove_and_clear() {
        let mut q = NotificationQueue::new(10, 3, 3500);
        let a = q.push(draft(1), 0).unwrap();
        q.push(draft(2), 0);
        assert!(q.remove(a));
        assert!(!q.remove(a));
        assert_eq!(q.len(), 1);
        q.clear();
        assert!(q.is_empty());
    }

    #[test]
    fn suppressed_queue_records_nothing() {
        let mut q = NotificationQueue::new(10, 3, 3500);
        q.set_suppressed(true);
        assert!(q.push(draft(1), 0).is_none());
        assert!(q.is_empty());
        q.set_suppressed(false);
        assert!(q.push(draft(1), 0).is_some());
    }

    #[test]
    fn listeners_see_every_push() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut q = NotificationQueue::new(2, 1, 3500);
        q.subscribe(Box::new(move |n| sink.lock().unwrap().push(n.id)));
        for n in 0..4 {
            q.push(draft(n), 0);
        }
        assert_eq!(seen.lock().unwrap().len(), 4);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn zero_capacity_clamped() {
        let mut q = NotificationQueue::new(0, 3, 3500);
        q.push(draft(1), 0);
        q.push(draft(2), 0);
        assert_eq!(q.capacity(), 1);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn serializes_kind_as_type() {
        let mut q = NotificationQueue::new(10, 3, 3500);
        q.push(
            NotificationDraft::new(NotificationKind::LevelUp, "Level 2 Woodcutting!")
                .skill(SkillId::Woodcutting),
            7,
        );
        let json = serde_json::to_value(q.iter().next().unwrap()).unwrap();
        assert_eq!(json["type"], "level_up");
        assert_eq!(json["skill"], "woodcutting");
        assert_eq!(json["durationMs"], 3500);
    }
}
