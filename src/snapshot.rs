use std::collections::HashSet;
use std::path::PathBuf;

use crate::model::notification::NotificationRecord;
use crate::render::{Badge, PanelBody};
use crate::view::PanelView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownState {
    Hidden,
    Shown,
    FadingOut,
}

/// Headless panel that keeps its elements in memory and, when given a path,
/// writes the rendered document after every change.
///
/// Deletes are confirmed by requesting the same id twice in a row.
pub struct SnapshotView {
    path: Option<PathBuf>,
    dirty: bool,
    pub dropdown: DropdownState,
    pub badge: Badge,
    pub mark_all_visible: bool,
    pub loading: bool,
    pub content_hidden: bool,
    pub empty_visible: bool,
    pub body: String,
    armed_delete: HashSet<i32>,
}

impl SnapshotView {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            dirty: true,
            dropdown: DropdownState::Hidden,
            badge: Badge::for_count(0),
            mark_all_visible: false,
            loading: false,
            content_hidden: false,
            empty_visible: false,
            body: String::new(),
            armed_delete: HashSet::new(),
        }
    }

    pub fn detached() -> Self {
        Self::new(None)
    }

    pub fn document(&self) -> String {
        let hidden = |h: bool| if h { " hidden" } else { "" };
        let dropdown_class = match self.dropdown {
            DropdownState::Hidden => "hidden",
            DropdownState::Shown => "notification-show",
            DropdownState::FadingOut => "notification-show notification-hide",
        };
        let badge = match &self.badge.text {
            Some(text) => format!(
                "<span id=\"notification-badge\" class=\"notification-pulse\">{}</span>",
                text
            ),
            None => "<span id=\"notification-badge\" class=\"hidden\"></span>".to_string(),
        };
        format!(
            concat!(
                "<div class=\"notification-container\">\n",
                "<button id=\"notification-button\">{badge}</button>\n",
                "<div id=\"notification-dropdown\" class=\"{dropdown}\" aria-hidden=\"{aria}\">\n",
                "<button id=\"mark-all-read-btn\" style=\"display: {mark_all}\">Mark all as read</button>\n",
                "<div id=\"notifications-loading\" class=\"{loading}\">Loading...</div>\n",
                "<div id=\"notifications-content\" class=\"{content}\">{body}</div>\n",
                "<div id=\"notifications-empty\" class=\"{empty}\">No notifications</div>\n",
                "</div>\n",
                "</div>\n"
            ),
            badge = badge,
            dropdown = dropdown_class,
            aria = self.dropdown == DropdownState::Hidden,
            mark_all = if self.mark_all_visible { "block" } else { "none" },
            loading = hidden(!self.loading).trim_start(),
            content = hidden(self.content_hidden).trim_start(),
            body = self.body,
            empty = hidden(!self.empty_visible).trim_start(),
        )
    }
}

impl PanelView for SnapshotView {
    fn show_dropdown(&mut self) {
        self.dropdown = DropdownState::Shown;
        self.dirty = true;
    }

    fn fade_out_dropdown(&mut self) {
        if self.dropdown == DropdownState::Shown {
            self.dropdown = DropdownState::FadingOut;
            self.dirty = true;
        }
    }

    fn hide_dropdown(&mut self) {
        self.dropdown = DropdownState::Hidden;
        self.dirty = true;
    }

    fn set_badge(&mut self, badge: &Badge) {
        self.badge = badge.clone();
        self.dirty = true;
    }

    fn set_mark_all_visible(&mut self, visible: bool) {
        self.mark_all_visible = visible;
        self.dirty = true;
    }

    fn show_loading(&mut self) {
        self.loading = true;
        self.content_hidden = true;
        self.empty_visible = false;
        self.dirty = true;
    }

    fn hide_loading(&mut self) {
        self.loading = false;
        self.content_hidden = false;
        self.dirty = true;
    }

    fn replace_body(&mut self, body: &PanelBody) {
        self.body = body.html.clone();
        self.empty_visible = body.empty;
        self.dirty = true;
    }

    fn confirm_delete(&mut self, record: &NotificationRecord) -> bool {
        if self.armed_delete.remove(&record.id) {
            return true;
        }
        self.armed_delete.clear();
        self.armed_delete.insert(record.id);
        tracing::warn!(
            "[通知{}]确定要删除 \"{}\" 吗? 再次删除以确认",
            record.id,
            record.title
        );
        false
    }

    fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        if let Some(path) = &self.path {
            match std::fs::write(path, self.document()) {
                Ok(_) => tracing::debug!("面板快照写入成功: {}", path.display()),
                Err(e) => tracing::error!("面板快照写入失败: {}", e),
            }
        }
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::record;

    #[test]
    fn delete_needs_two_requests_for_the_same_id() {
        let mut view = SnapshotView::detached();
        assert!(!view.confirm_delete(&record(1, false)));
        assert!(view.confirm_delete(&record(1, false)));
        assert!(!view.confirm_delete(&record(1, false)));
    }

    #[test]
    fn asking_for_another_id_disarms_the_first() {
        let mut view = SnapshotView::detached();
        assert!(!view.confirm_delete(&record(1, false)));
        assert!(!view.confirm_delete(&record(2, false)));
        assert!(!view.confirm_delete(&record(1, false)));
    }

    #[test]
    fn loading_hides_content_and_empty_state() {
        let mut view = SnapshotView::detached();
        view.replace_body(&PanelBody {
            html: String::new(),
            empty: true,
        });
        view.show_loading();
        assert!(view.loading && view.content_hidden && !view.empty_visible);
        view.hide_loading();
        assert!(!view.loading && !view.content_hidden);
    }

    #[test]
    fn document_reflects_element_state() {
        let mut view = SnapshotView::detached();
        view.set_badge(&Badge::for_count(3));
        view.set_mark_all_visible(true);
        view.show_dropdown();
        let doc = view.document();
        assert!(doc.contains("<span id=\"notification-badge\" class=\"notification-pulse\">3</span>"));
        assert!(doc.contains("class=\"notification-show\" aria-hidden=\"false\""));
        assert!(doc.contains("style=\"display: block\""));
    }

    #[test]
    fn flush_writes_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.html");
        let mut view = SnapshotView::new(Some(path.clone()));
        view.set_badge(&Badge::for_count(120));
        view.flush();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains(">99+</span>"));
    }
}
