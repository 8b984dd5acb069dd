use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::api::NotificationApi;
use crate::config::PanelConfig;
use crate::error::ClientError;
use crate::model::notification::{ClickOutput, ListQuery, NotificationCounts, NotificationList};
use crate::render::{self, Badge, LOAD_ERROR_MESSAGE};
use crate::store::NotificationStore;
use crate::view::PanelView;

/// An API call that has been dispatched but not yet applied.
pub type PendingCall = BoxFuture<'static, Outcome>;

#[derive(Debug)]
pub enum Outcome {
    Listed(Result<NotificationList, ClientError>),
    Counted(Result<NotificationCounts, ClientError>),
    MarkedRead(i32, Result<(), ClientError>),
    MarkedAllRead(Result<(), ClientError>),
    Deleted(i32, Result<(), ClientError>),
    Followed(i32, Result<ClickOutput, ClientError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Closed,
    Open,
}

/// Owns the panel's visibility and the fetch/mutate cycle.
///
/// Every operation comes in two halves: a `request_*` method that updates the
/// view and hands back the API call, and [`PanelController::apply`] which
/// folds the call's outcome into the store. Local state only changes after
/// the server confirmed a mutation.
pub struct PanelController<A, V> {
    api: Arc<A>,
    view: V,
    store: NotificationStore,
    state: PanelState,
    per_page: u32,
    fade_out: Duration,
    hide_deadline: Option<Instant>,
}

impl<A, V> PanelController<A, V>
where
    A: NotificationApi + 'static,
    V: PanelView,
{
    pub fn new(api: Arc<A>, view: V, config: &PanelConfig) -> Self {
        Self {
            api,
            view,
            store: NotificationStore::new(),
            state: PanelState::Closed,
            per_page: config.per_page,
            fade_out: Duration::from_millis(config.fade_out_millis),
            hide_deadline: None,
        }
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn hide_deadline(&self) -> Option<Instant> {
        self.hide_deadline
    }

    // 页面初始化: 先加载一次完整列表
    pub fn init(&mut self) -> PendingCall {
        self.update_badge();
        self.request_list()
    }

    pub fn toggle(&mut self) -> Option<PendingCall> {
        match self.state {
            PanelState::Open => {
                self.close();
                None
            }
            PanelState::Closed => Some(self.open()),
        }
    }

    pub fn open(&mut self) -> PendingCall {
        self.hide_deadline = None;
        self.view.show_dropdown();
        self.state = PanelState::Open;
        self.update_badge();
        tracing::debug!("打开通知面板");
        self.request_list()
    }

    pub fn close(&mut self) {
        if self.state != PanelState::Open {
            return;
        }
        self.view.fade_out_dropdown();
        self.state = PanelState::Closed;
        self.hide_deadline = Some(Instant::now() + self.fade_out);
        tracing::debug!("关闭通知面板");
    }

    pub fn outside_click(&mut self) {
        self.close();
    }

    pub fn escape(&mut self) {
        self.close();
    }

    /// Hides the dropdown once the fade-out delay has passed.
    pub fn finish_hide(&mut self) {
        let deadline = match self.hide_deadline {
            Some(v) => v,
            None => return,
        };
        if Instant::now() < deadline {
            return;
        }
        self.hide_deadline = None;
        if self.state == PanelState::Closed {
            self.view.hide_dropdown();
        }
    }

    // 面板打开时不刷新, 避免覆盖用户正在看的列表
    pub fn refresh_tick(&mut self) -> Option<PendingCall> {
        match self.state {
            PanelState::Closed => Some(self.request_counts()),
            PanelState::Open => None,
        }
    }

    pub fn request_list(&mut self) -> PendingCall {
        self.view.show_loading();
        let api = self.api.clone();
        let query = ListQuery::first_page(self.per_page);
        Box::pin(async move { Outcome::Listed(api.list(query).await) })
    }

    pub fn request_counts(&self) -> PendingCall {
        let api = self.api.clone();
        Box::pin(async move { Outcome::Counted(api.counts().await) })
    }

    pub fn request_mark_read(&self, id: i32) -> PendingCall {
        let api = self.api.clone();
        Box::pin(async move { Outcome::MarkedRead(id, api.mark_read(id).await) })
    }

    pub fn request_mark_all_read(&self) -> PendingCall {
        let api = self.api.clone();
        Box::pin(async move { Outcome::MarkedAllRead(api.mark_all_read().await) })
    }

    /// `None` when the record is unknown or the user declined.
    pub fn request_delete(&mut self, id: i32) -> Option<PendingCall> {
        let record = match self.store.get(id) {
            Some(v) => v,
            None => {
                tracing::warn!("[通知{}]不在当前列表中, 忽略删除", id);
                return None;
            }
        };
        if !self.view.confirm_delete(record) {
            tracing::debug!("[通知{}]删除未确认", id);
            return None;
        }
        let api = self.api.clone();
        let call: PendingCall = Box::pin(async move { Outcome::Deleted(id, api.delete(id).await) });
        Some(call)
    }

    pub fn request_follow(&self, id: i32) -> PendingCall {
        let api = self.api.clone();
        Box::pin(async move { Outcome::Followed(id, api.click(id).await) })
    }

    /// Clicking a row marks it read when it is still unread.
    pub fn row_click(&self, id: i32) -> Option<PendingCall> {
        if self.store.is_unread(id) {
            Some(self.request_mark_read(id))
        } else {
            None
        }
    }

    pub fn retry(&mut self) -> PendingCall {
        self.request_list()
    }

    pub fn dismiss_error(&mut self) {
        self.render();
    }

    pub fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Listed(result) => {
                match result {
                    Ok(list) => {
                        tracing::info!(
                            "加载通知成功, 数量: {}, 未读: {}",
                            list.notifications.len(),
                            list.unread_count
                        );
                        self.store.replace(list);
                        self.render();
                    }
                    Err(e) => {
                        tracing::error!("加载通知失败: {}", e);
                        self.view.replace_body(&render::render_error(LOAD_ERROR_MESSAGE));
                    }
                }
                self.view.hide_loading();
            }
            Outcome::Counted(result) => match result {
                Ok(counts) => {
                    tracing::debug!("刷新未读数量成功: {}", counts.unread_count);
                    self.store.apply_counts(&counts);
                    self.update_badge();
                }
                Err(e) => tracing::error!("刷新未读数量失败: {}", e),
            },
            Outcome::MarkedRead(id, result) => match result {
                Ok(_) => {
                    tracing::info!("[通知{}]已标记为已读", id);
                    if self.store.mark_read(id) {
                        self.render();
                    }
                }
                Err(e) => tracing::error!("[通知{}]标记为已读失败: {}", id, e),
            },
            Outcome::MarkedAllRead(result) => match result {
                Ok(_) => {
                    tracing::info!("全部通知已标记为已读");
                    self.store.mark_all_read();
                    self.render();
                }
                Err(e) => tracing::error!("全部标记为已读失败: {}", e),
            },
            Outcome::Deleted(id, result) => match result {
                Ok(_) => {
                    tracing::info!("[通知{}]已删除", id);
                    if self.store.remove(id).is_some() {
                        self.render();
                    }
                }
                Err(e) if e.is_not_found_err() => {
                    tracing::warn!("[通知{}]删除时服务器未找到该通知: {}", id, e)
                }
                Err(e) => tracing::error!("[通知{}]删除失败: {}", id, e),
            },
            Outcome::Followed(id, result) => match result {
                Ok(output) => {
                    if self.store.mark_read(id) {
                        self.render();
                    }
                    if let Some(url) = &output.redirect_url {
                        tracing::info!("[通知{}]跳转到: {}", id, url);
                    }
                }
                Err(e) => tracing::error!("[通知{}]打开失败: {}", id, e),
            },
        }
    }

    pub async fn load_notifications(&mut self) {
        let outcome = self.request_list().await;
        self.apply(outcome);
    }

    pub async fn load_counts(&mut self) {
        let outcome = self.request_counts().await;
        self.apply(outcome);
    }

    pub async fn mark_as_read(&mut self, id: i32) {
        let outcome = self.request_mark_read(id).await;
        self.apply(outcome);
    }

    pub async fn mark_all_as_read(&mut self) {
        let outcome = self.request_mark_all_read().await;
        self.apply(outcome);
    }

    pub async fn delete_notification(&mut self, id: i32) {
        if let Some(call) = self.request_delete(id) {
            let outcome = call.await;
            self.apply(outcome);
        }
    }

    /// Returns the page the notification points at, if the server sent one.
    pub async fn follow_notification(&mut self, id: i32) -> Option<String> {
        let outcome = self.request_follow(id).await;
        let redirect_url = match &outcome {
            Outcome::Followed(_, Ok(output)) => output.redirect_url.clone(),
            _ => None,
        };
        self.apply(outcome);
        redirect_url
    }

    pub fn destroy(&mut self) {
        self.hide_deadline = None;
        tracing::info!("通知面板已销毁");
    }

    fn render(&mut self) {
        self.view.replace_body(&render::render_body(&self.store));
        self.update_badge();
    }

    fn update_badge(&mut self) {
        self.view.set_badge(&Badge::for_count(self.store.unread_count()));
        self.view
            .set_mark_all_visible(render::mark_all_visible(&self.store));
    }
}
