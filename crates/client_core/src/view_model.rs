use std::{sync::Arc, time::Duration};

use shared::{
    domain::{OrderId, SortDirection, StatusId},
    error::GatewayError,
    protocol::{Order, Status},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    gateway::OrderGateway,
    notice::{Notice, NoticeKind, NoticeSlot, DEFAULT_NOTICE_TTL},
    projection::{derive_rows, OrderRow},
};

pub const DEFAULT_PAGE_SIZE: u32 = 100;
const SNAPSHOT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct ViewModelConfig {
    pub page_size: u32,
    pub notice_ttl: Duration,
}

impl Default for ViewModelConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }
}

/// Everything a renderer needs for one frame of the order list.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderListSnapshot {
    pub rows: Vec<OrderRow>,
    pub statuses: Vec<Status>,
    pub order_count: usize,
    pub total_pages: Option<u32>,
    pub search_query: String,
    pub sort_direction: SortDirection,
    pub selected_order: Option<Order>,
    pub modal_open: bool,
    pub error: Option<String>,
    pub success: Option<String>,
    pub loading: bool,
    pub submitting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Applied,
    Failed(GatewayError),
    Ignored(IgnoredReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    NoSelection,
    InFlight,
}

#[derive(Default)]
struct ViewState {
    orders: Vec<Order>,
    statuses: Vec<Status>,
    total_pages: Option<u32>,
    search_query: String,
    sort_direction: SortDirection,
    selected_order: Option<Order>,
    modal_open: bool,
    notice: NoticeSlot,
    /// Orders fetches still outstanding; overlapping refreshes each hold one.
    pending_fetches: usize,
    submitting: bool,
}

impl ViewState {
    fn snapshot(&self) -> OrderListSnapshot {
        OrderListSnapshot {
            rows: derive_rows(
                &self.orders,
                &self.statuses,
                &self.search_query,
                self.sort_direction,
            ),
            statuses: self.statuses.clone(),
            order_count: self.orders.len(),
            total_pages: self.total_pages,
            search_query: self.search_query.clone(),
            sort_direction: self.sort_direction,
            selected_order: self.selected_order.clone(),
            modal_open: self.modal_open,
            error: self.notice.text_of(NoticeKind::Error).map(str::to_string),
            success: self.notice.text_of(NoticeKind::Success).map(str::to_string),
            loading: self.pending_fetches > 0,
            submitting: self.submitting,
        }
    }

    fn status_name(&self, status_id: StatusId) -> Option<&str> {
        self.statuses
            .iter()
            .find(|status| status.id == status_id)
            .map(|status| status.name.as_str())
    }
}

/// State holder for the order management screen.
///
/// Gateway failures never escape: every operation turns them into the
/// transient error notice carried by the next snapshot.
pub struct OrderListViewModel {
    gateway: Arc<dyn OrderGateway>,
    config: ViewModelConfig,
    inner: Mutex<ViewState>,
    events: broadcast::Sender<OrderListSnapshot>,
}

impl OrderListViewModel {
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Arc<Self> {
        Self::with_config(gateway, ViewModelConfig::default())
    }

    pub fn with_config(gateway: Arc<dyn OrderGateway>, config: ViewModelConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Arc::new(Self {
            gateway,
            config,
            inner: Mutex::new(ViewState::default()),
            events,
        })
    }

    /// Receives one snapshot after every state change.
    pub fn subscribe(&self) -> broadcast::Receiver<OrderListSnapshot> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> OrderListSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// Loads orders and the status dictionary concurrently.
    pub async fn activate(self: &Arc<Self>) {
        info!(page_size = self.config.page_size, "activating order list");
        tokio::join!(self.refresh_orders(), self.refresh_statuses());
    }

    pub async fn set_search_query(&self, text: impl Into<String>) {
        let mut guard = self.inner.lock().await;
        guard.search_query = text.into();
        self.emit(&guard);
    }

    pub async fn toggle_sort(&self) {
        let mut guard = self.inner.lock().await;
        guard.sort_direction = guard.sort_direction.flipped();
        debug!(direction = ?guard.sort_direction, "status sort toggled");
        self.emit(&guard);
    }

    /// Opens the status modal for `order_id`, replacing any prior selection.
    /// Returns false when the order is unknown or a submission is in flight.
    pub async fn select_order_for_status_change(&self, order_id: OrderId) -> bool {
        let mut guard = self.inner.lock().await;
        if guard.submitting {
            debug!(%order_id, "selection ignored while a status change is in flight");
            return false;
        }
        let Some(order) = guard.orders.iter().find(|order| order.id == order_id).cloned() else {
            warn!(%order_id, "cannot select unknown order");
            return false;
        };
        guard.selected_order = Some(order);
        guard.modal_open = true;
        self.emit(&guard);
        true
    }

    pub async fn close_modal(&self) {
        let mut guard = self.inner.lock().await;
        guard.selected_order = None;
        guard.modal_open = false;
        self.emit(&guard);
    }

    /// Sends the new status for the selected order and resynchronizes the
    /// list from the backend on success.
    pub async fn submit_status_change(self: &Arc<Self>, status_id: StatusId) -> SubmitOutcome {
        let order = {
            let mut guard = self.inner.lock().await;
            if guard.submitting {
                debug!(%status_id, "status change already in flight");
                return SubmitOutcome::Ignored(IgnoredReason::InFlight);
            }
            let Some(order) = guard.selected_order.clone() else {
                return SubmitOutcome::Ignored(IgnoredReason::NoSelection);
            };
            guard.submitting = true;
            self.emit(&guard);
            order
        };

        match self.gateway.update_order_status(order.id, status_id).await {
            Ok(()) => {
                info!(order_id = %order.id, %status_id, "order status updated");
                let refreshed = self.refresh_orders().await;

                let mut guard = self.inner.lock().await;
                guard.submitting = false;
                guard.selected_order = None;
                guard.modal_open = false;
                if refreshed {
                    let status_name = guard
                        .status_name(status_id)
                        .map(str::to_string)
                        .unwrap_or_else(|| status_id.to_string());
                    let code = order
                        .order_code
                        .clone()
                        .unwrap_or_else(|| order.id.to_string());
                    self.post_notice(
                        &mut guard,
                        Notice::success(format!("Order {code} moved to {status_name}")),
                    );
                }
                self.emit(&guard);
                SubmitOutcome::Applied
            }
            Err(err) => {
                warn!(order_id = %order.id, %status_id, error = %err, "order status update failed");
                let mut guard = self.inner.lock().await;
                guard.submitting = false;
                self.post_notice(&mut guard, Notice::error(err.to_string()));
                self.emit(&guard);
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Returns whether the orders collection was replaced.
    async fn refresh_orders(self: &Arc<Self>) -> bool {
        {
            let mut guard = self.inner.lock().await;
            guard.pending_fetches += 1;
            self.emit(&guard);
        }

        let result = self.gateway.fetch_orders(0, self.config.page_size).await;

        let mut guard = self.inner.lock().await;
        guard.pending_fetches = guard.pending_fetches.saturating_sub(1);
        let refreshed = match result {
            Ok(page) => {
                debug!(
                    orders = page.orders.len(),
                    total_pages = ?page.total_pages,
                    "orders loaded"
                );
                guard.orders = page.orders;
                guard.total_pages = page.total_pages;
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to load orders");
                self.post_notice(&mut guard, Notice::error(err.to_string()));
                false
            }
        };
        self.emit(&guard);
        refreshed
    }

    async fn refresh_statuses(self: &Arc<Self>) {
        let result = self.gateway.fetch_statuses().await;

        let mut guard = self.inner.lock().await;
        match result {
            Ok(statuses) => {
                debug!(statuses = statuses.len(), "status dictionary loaded");
                guard.statuses = statuses;
            }
            Err(err) => {
                warn!(error = %err, "failed to load status dictionary");
                self.post_notice(&mut guard, Notice::error(err.to_string()));
            }
        }
        self.emit(&guard);
    }

    fn post_notice(self: &Arc<Self>, state: &mut ViewState, notice: Notice) {
        let generation = state.notice.post(notice);
        let view_model = Arc::clone(self);
        let ttl = self.config.notice_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut guard = view_model.inner.lock().await;
            if guard.notice.expire(generation) {
                view_model.emit(&guard);
            }
        });
    }

    fn emit(&self, state: &ViewState) {
        if self.events.receiver_count() == 0 {
            return;
        }
        let _ = self.events.send(state.snapshot());
    }
}

#[cfg(test)]
#[path = "tests/view_model_tests.rs"]
mod tests;
