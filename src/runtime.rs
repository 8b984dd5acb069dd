use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant};

use crate::api::NotificationApi;
use crate::command::PanelEvent;
use crate::panel::{PanelController, PendingCall};
use crate::view::PanelView;

/// Drives the panel until `Shutdown` arrives or every sender is dropped.
///
/// The controller is only touched from this loop. API calls run concurrently
/// in `pending` and are applied in completion order. The refresh timer and
/// any call still in flight are dropped on exit.
pub async fn run<A, V>(
    mut panel: PanelController<A, V>,
    mut events: mpsc::Receiver<PanelEvent>,
    refresh_interval: Duration,
) -> PanelController<A, V>
where
    A: NotificationApi + 'static,
    V: PanelView,
{
    let mut pending: FuturesUnordered<PendingCall> = FuturesUnordered::new();
    pending.push(panel.init());
    panel.view_mut().flush();

    let mut refresh = interval(refresh_interval);
    refresh.tick().await;

    loop {
        let hide_at = panel.hide_deadline();
        tokio::select! {
            Some(outcome) = pending.next(), if !pending.is_empty() => {
                panel.apply(outcome);
            }
            _ = refresh.tick() => {
                if let Some(call) = panel.refresh_tick() {
                    pending.push(call);
                }
            }
            _ = sleep_until(hide_at.unwrap_or_else(Instant::now)), if hide_at.is_some() => {
                panel.finish_hide();
            }
            event = events.recv() => match event {
                None | Some(PanelEvent::Shutdown) => break,
                Some(event) => {
                    tracing::debug!("处理面板事件: {:?}", event);
                    if let Some(call) = dispatch(&mut panel, event) {
                        pending.push(call);
                    }
                }
            },
        }
        panel.view_mut().flush();
    }

    if !pending.is_empty() {
        tracing::info!("放弃{}个未完成的请求", pending.len());
    }
    drop(pending);
    panel.destroy();
    panel.view_mut().flush();
    panel
}

pub fn dispatch<A, V>(panel: &mut PanelController<A, V>, event: PanelEvent) -> Option<PendingCall>
where
    A: NotificationApi + 'static,
    V: PanelView,
{
    match event {
        PanelEvent::Toggle => panel.toggle(),
        PanelEvent::Open => Some(panel.open()),
        PanelEvent::Close => {
            panel.close();
            None
        }
        PanelEvent::OutsideClick => {
            panel.outside_click();
            None
        }
        PanelEvent::Escape => {
            panel.escape();
            None
        }
        PanelEvent::Refresh => Some(panel.request_list()),
        PanelEvent::Retry => Some(panel.retry()),
        PanelEvent::DismissError => {
            panel.dismiss_error();
            None
        }
        PanelEvent::RowClick(id) => panel.row_click(id),
        PanelEvent::MarkRead(id) => Some(panel.request_mark_read(id)),
        PanelEvent::MarkAllRead => Some(panel.request_mark_all_read()),
        PanelEvent::Delete(id) => panel.request_delete(id),
        PanelEvent::Follow(id) => Some(panel.request_follow(id)),
        PanelEvent::Shutdown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::tests::controller;
    use crate::panel::PanelState;
    use crate::snapshot::DropdownState;
    use crate::store::record;
    use tokio::time::sleep;

    async fn send_all(tx: &mpsc::Sender<PanelEvent>, events: &[PanelEvent]) {
        for event in events {
            tx.send(*event).await.unwrap();
            sleep(Duration::from_millis(20)).await;
        }
    }

    #[tokio::test]
    async fn initial_load_then_user_actions() {
        let (api, panel) = controller(vec![record(1, false), record(2, false), record(3, true)]);
        let (tx, rx) = mpsc::channel(16);

        let (panel, _) = tokio::join!(run(panel, rx, Duration::from_secs(3600)), async {
            send_all(
                &tx,
                &[
                    PanelEvent::Toggle,
                    PanelEvent::RowClick(1),
                    PanelEvent::Delete(3),
                    PanelEvent::Delete(3),
                    PanelEvent::Escape,
                ],
            )
            .await;
            sleep(Duration::from_millis(300)).await;
            tx.send(PanelEvent::Shutdown).await.unwrap();
        });

        assert_eq!(panel.state(), PanelState::Closed);
        assert_eq!(panel.view().dropdown, DropdownState::Hidden);
        assert_eq!(panel.store().unread_count(), 1);
        let ids: Vec<i32> = panel.store().notifications().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(
            api.calls(),
            vec!["list", "list", "mark_read 1", "delete 3"]
        );
        assert!(panel.hide_deadline().is_none());
    }

    #[tokio::test]
    async fn closed_panel_polls_counts() {
        let (api, panel) = controller(vec![record(1, false)]);
        let (tx, rx) = mpsc::channel(4);

        let (panel, _) = tokio::join!(run(panel, rx, Duration::from_millis(25)), async {
            sleep(Duration::from_millis(40)).await;
            api.state.lock().unwrap().records.push(record(2, false));
            sleep(Duration::from_millis(100)).await;
            drop(tx);
        });

        assert!(api.calls().iter().any(|c| c == "counts"));
        assert_eq!(panel.store().unread_count(), 2);
        assert_eq!(panel.view().badge.text.as_deref(), Some("2"));
        // the list itself is only refreshed on open
        assert_eq!(panel.store().notifications().len(), 1);
    }

    #[tokio::test]
    async fn open_panel_does_not_poll() {
        let (api, panel) = controller(vec![]);
        let (tx, rx) = mpsc::channel(4);

        let (panel, _) = tokio::join!(run(panel, rx, Duration::from_millis(20)), async {
            tx.send(PanelEvent::Open).await.unwrap();
            sleep(Duration::from_millis(120)).await;
            tx.send(PanelEvent::Shutdown).await.unwrap();
        });

        assert_eq!(panel.state(), PanelState::Open);
        assert!(!api.calls().iter().any(|c| c == "counts"));
    }
}
