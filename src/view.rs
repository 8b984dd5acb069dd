use crate::model::notification::NotificationRecord;
use crate::render::{Badge, PanelBody};

/// Handles on the panel's elements.
///
/// The controller drives these but does not own the underlying nodes.
pub trait PanelView {
    /// `#notification-dropdown`: visible, fade-out started, hidden.
    fn show_dropdown(&mut self);
    fn fade_out_dropdown(&mut self);
    fn hide_dropdown(&mut self);

    /// `#notification-badge`
    fn set_badge(&mut self, badge: &Badge);
    /// `#mark-all-read-btn`
    fn set_mark_all_visible(&mut self, visible: bool);

    /// `#notifications-loading`
    fn show_loading(&mut self);
    fn hide_loading(&mut self);

    /// Replaces all children of `#notifications-content` and toggles
    /// `#notifications-empty`.
    fn replace_body(&mut self, body: &PanelBody);

    /// Asks the user before a delete is sent.
    fn confirm_delete(&mut self, record: &NotificationRecord) -> bool;

    /// Called after each handled event.
    fn flush(&mut self) {}
}
