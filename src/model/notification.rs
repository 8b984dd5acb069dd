use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub time_ago: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

/// `GET /get/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationList {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub notifications: Vec<NotificationRecord>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub total_count: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /counts/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationCounts {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub total_count: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /click/{id}/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClickOutput {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
}

impl ListQuery {
    pub fn first_page(per_page: u32) -> Self {
        Self { page: 1, per_page }
    }
}

/// Bodies that carry the server's `success` / `message` envelope.
pub trait Envelope {
    fn rejected_message(&self) -> Option<String>;
}

macro_rules! impl_envelope {
    ($($t:ty),*) => {
        $(impl Envelope for $t {
            fn rejected_message(&self) -> Option<String> {
                match self.success {
                    Some(false) => Some(self.message.clone().unwrap_or_default()),
                    _ => None,
                }
            }
        })*
    };
}

impl_envelope!(NotificationList, NotificationCounts, ClickOutput);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_tolerates_missing_fields() {
        let list: NotificationList = serde_json::from_str("{}").unwrap();
        assert!(list.notifications.is_empty());
        assert_eq!(list.unread_count, 0);
        assert!(list.rejected_message().is_none());
    }

    #[test]
    fn record_reads_server_payload() {
        let record: NotificationRecord = serde_json::from_str(
            r#"{
                "id": 7,
                "type": "appointment",
                "title": "Rendez-vous confirmé",
                "content": "Votre rendez-vous est confirmé",
                "is_read": false,
                "created_at": "2024-05-01T10:00:00+00:00",
                "time_ago": "il y a 2 heures",
                "icon": "<i class=\"bi bi-calendar-event text-sm\"></i>",
                "color": "bg-green-500",
                "redirect_url": "/appointments/3/",
                "unexpected": 1
            }"#,
        )
        .unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.kind.as_deref(), Some("appointment"));
        assert!(!record.is_read);
        assert!(record.created_at.is_some());
        assert_eq!(record.redirect_url.as_deref(), Some("/appointments/3/"));
    }

    #[test]
    fn success_false_is_rejected() {
        let counts: NotificationCounts =
            serde_json::from_str(r#"{"success": false, "message": "boom"}"#).unwrap();
        assert_eq!(counts.rejected_message().as_deref(), Some("boom"));
    }
}
