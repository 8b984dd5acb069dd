use crate::model::notification::NotificationRecord;
use crate::store::NotificationStore;

pub const LOAD_ERROR_MESSAGE: &str = "Failed to load notifications";

/// Replacement children for `#notifications-content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelBody {
    pub html: String,
    /// Whether `#notifications-empty` should be shown.
    pub empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    /// `None` hides the badge.
    pub text: Option<String>,
}

impl Badge {
    pub fn for_count(unread_count: u32) -> Self {
        let text = match unread_count {
            0 => None,
            1..=99 => Some(unread_count.to_string()),
            _ => Some("99+".to_string()),
        };
        Self { text }
    }

    pub fn is_visible(&self) -> bool {
        self.text.is_some()
    }
}

pub fn mark_all_visible(store: &NotificationStore) -> bool {
    store.unread_count() > 0
}

pub fn render_body(store: &NotificationStore) -> PanelBody {
    if store.notifications().is_empty() {
        return PanelBody {
            html: String::new(),
            empty: true,
        };
    }
    let mut html = String::new();
    for notification in store.notifications() {
        render_item(&mut html, notification);
    }
    PanelBody { html, empty: false }
}

pub fn render_error(message: &str) -> PanelBody {
    let mut html = String::new();
    html.push_str("<div class=\"notification-error px-4 py-3 text-center\" role=\"alert\">");
    html.push_str("<div class=\"text-red-600 text-sm\">");
    html.push_str(&escape_html(message));
    html.push_str("</div>");
    html.push_str(
        "<button class=\"retry-btn mt-2 text-blue-600 hover:text-blue-800 text-sm\" data-action=\"retry\">Try again</button>",
    );
    html.push_str(
        "<button class=\"dismiss-btn mt-2 ml-2 text-gray-500 hover:text-gray-700 text-sm\" data-action=\"dismiss\" title=\"Dismiss\">×</button>",
    );
    html.push_str("</div>");
    PanelBody { html, empty: false }
}

fn render_item(out: &mut String, notification: &NotificationRecord) {
    let unread = !notification.is_read;
    let bg_class = if unread { "bg-blue-50" } else { "bg-white" };

    out.push_str(&format!(
        "<div class=\"notification-item px-3 py-2 hover:bg-gray-50 {}\" data-notification-id=\"{}\">",
        bg_class, notification.id
    ));
    out.push_str("<div class=\"flex items-start space-x-2\">");

    out.push_str("<div class=\"flex-shrink-0 flex items-center\">");
    out.push_str(&format!(
        "<div class=\"w-6 h-6 rounded-full {} flex items-center justify-center\">{}</div>",
        escape_html(&notification.color),
        notification.icon
    ));
    if unread {
        out.push_str("<div class=\"w-1.5 h-1.5 bg-blue-500 rounded-full ml-1\"></div>");
    }
    out.push_str("</div>");

    out.push_str("<div class=\"flex-1 min-w-0\"><div class=\"flex items-start justify-between\"><div class=\"flex-1\">");
    out.push_str(&format!(
        "<p class=\"text-xs font-medium text-gray-900 truncate\">{}</p>",
        escape_html(&notification.title)
    ));
    out.push_str(&format!(
        "<p class=\"text-xs text-gray-600 mt-0.5 line-clamp-2\">{}</p>",
        escape_html(&notification.content)
    ));
    out.push_str(&format!(
        "<p class=\"text-xs text-gray-500 mt-0.5\">{}</p>",
        escape_html(&notification.time_ago)
    ));
    out.push_str("</div>");

    out.push_str("<div class=\"flex items-center space-x-0.5 ml-1\">");
    if unread {
        out.push_str(&format!(
            "<button class=\"mark-read-btn text-blue-600 hover:text-blue-800 text-xs p-0.5 rounded\" data-notification-id=\"{}\" title=\"Mark as read\">✓</button>",
            notification.id
        ));
    }
    out.push_str(&format!(
        "<button class=\"delete-btn text-red-600 hover:text-red-800 text-xs p-0.5 rounded\" data-notification-id=\"{}\" title=\"Delete\">×</button>",
        notification.id
    ));
    out.push_str("</div></div></div></div></div>");
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
