use crate::model::notification::{NotificationCounts, NotificationList, NotificationRecord};

/// In-memory copy of the user's notifications.
///
/// Records keep the order the server returned them in. `unread_count` is the
/// server's number; after a counts-only refresh it may briefly disagree with
/// the records held here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationStore {
    notifications: Vec<NotificationRecord>,
    unread_count: u32,
    total_count: Option<u32>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> &[NotificationRecord] {
        &self.notifications
    }

    pub fn unread_count(&self) -> u32 {
        self.unread_count
    }

    pub fn total_count(&self) -> Option<u32> {
        self.total_count
    }

    pub fn get(&self, id: i32) -> Option<&NotificationRecord> {
        self.notifications.iter().find(|n| n.id == id)
    }

    pub fn is_unread(&self, id: i32) -> bool {
        self.get(id).map_or(false, |n| !n.is_read)
    }

    pub fn replace(&mut self, list: NotificationList) {
        self.notifications = list.notifications;
        self.unread_count = list.unread_count;
        self.total_count = list.total_count;
    }

    pub fn apply_counts(&mut self, counts: &NotificationCounts) {
        self.unread_count = counts.unread_count;
        if counts.total_count.is_some() {
            self.total_count = counts.total_count;
        }
    }

    /// Returns `true` when a local unread record flipped to read.
    pub fn mark_read(&mut self, id: i32) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) if !n.is_read => {
                n.is_read = true;
                self.unread_count = self.unread_count.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in self.notifications.iter_mut() {
            n.is_read = true;
        }
        self.unread_count = 0;
    }

    pub fn remove(&mut self, id: i32) -> Option<NotificationRecord> {
        let index = self.notifications.iter().position(|n| n.id == id)?;
        let removed = self.notifications.remove(index);
        if !removed.is_read {
            self.unread_count = self.unread_count.saturating_sub(1);
        }
        if let Some(total) = self.total_count.as_mut() {
            *total = total.saturating_sub(1);
        }
        Some(removed)
    }
}

#[cfg(test)]
pub(crate) fn record(id: i32, is_read: bool) -> NotificationRecord {
    NotificationRecord {
        id,
        title: format!("Notification {}", id),
        content: format!("Contenu {}", id),
        icon: "<i class=\"bi bi-bell text-sm\"></i>".to_string(),
        color: "bg-blue-500".to_string(),
        time_ago: "à l'instant".to_string(),
        is_read,
        kind: None,
        created_at: None,
        redirect_url: None,
    }
}

#[cfg(test)]
pub(crate) fn list_of(records: Vec<NotificationRecord>) -> NotificationList {
    let unread_count = records.iter().filter(|n| !n.is_read).count() as u32;
    NotificationList {
        total_count: Some(records.len() as u32),
        notifications: records,
        unread_count,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(records: Vec<NotificationRecord>) -> NotificationStore {
        let mut store = NotificationStore::new();
        store.replace(list_of(records));
        store
    }

    #[test]
    fn replace_keeps_server_order() {
        let store = store_with(vec![record(9, false), record(2, true), record(5, false)]);
        let ids: Vec<i32> = store.notifications().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![9, 2, 5]);
        assert_eq!(store.unread_count(), 2);
    }

    #[test]
    fn marking_distinct_unread_ids_decrements_once_each() {
        let mut store = store_with(vec![record(1, false), record(2, false), record(3, false)]);
        assert!(store.mark_read(1));
        assert!(store.mark_read(3));
        assert_eq!(store.unread_count(), 1);
        assert!(store.get(1).unwrap().is_read);
        assert!(!store.get(2).unwrap().is_read);
    }

    #[test]
    fn marking_a_read_or_unknown_record_changes_nothing() {
        let mut store = store_with(vec![record(1, true), record(2, false)]);
        let before = store.clone();
        assert!(!store.mark_read(1));
        assert!(!store.mark_read(42));
        assert_eq!(store, before);
    }

    #[test]
    fn unread_count_is_floored_at_zero() {
        let mut store = store_with(vec![record(1, false)]);
        store.apply_counts(&NotificationCounts::default());
        assert_eq!(store.unread_count(), 0);
        assert!(store.mark_read(1));
        assert_eq!(store.unread_count(), 0);
        store.replace(list_of(vec![record(2, false)]));
        store.apply_counts(&NotificationCounts::default());
        assert!(store.remove(2).is_some());
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn mark_all_read_clears_everything() {
        let mut store = store_with(vec![record(1, false), record(2, true), record(3, false)]);
        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);
        assert!(store.notifications().iter().all(|n| n.is_read));
    }

    #[test]
    fn removing_read_record_keeps_unread_count() {
        let mut store = store_with(vec![record(1, true), record(2, false)]);
        let removed = store.remove(1).unwrap();
        assert_eq!(removed.id, 1);
        assert_eq!(store.notifications().len(), 1);
        assert_eq!(store.notifications()[0].id, 2);
        assert_eq!(store.unread_count(), 1);
        assert_eq!(store.total_count(), Some(1));
    }

    #[test]
    fn removing_unread_record_decrements() {
        let mut store = store_with(vec![record(1, true), record(2, false)]);
        store.remove(2);
        assert_eq!(store.unread_count(), 0);
        assert!(store.remove(2).is_none());
    }

    #[test]
    fn counts_refresh_leaves_records_alone() {
        let mut store = store_with(vec![record(1, false)]);
        store.apply_counts(&NotificationCounts {
            unread_count: 4,
            total_count: Some(6),
            ..Default::default()
        });
        assert_eq!(store.unread_count(), 4);
        assert_eq!(store.total_count(), Some(6));
        assert_eq!(store.notifications().len(), 1);
    }
}
