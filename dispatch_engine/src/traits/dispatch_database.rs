use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{AssignmentRequest, Order, OrderId, OrderItem, OrderStatusType, RequestStatus, RiderId},
    traits::{
        data_objects::{AcceptedOrder, AvailableOrders, BroadcastResult, Pagination, RiderProfile, SweepResult},
        FleetManagement,
    },
};

/// This trait defines the core behaviour for backends supporting the dispatch engine.
///
/// This behaviour includes:
/// * Broadcasting ready orders to the eligible rider set.
/// * Resolving concurrent accept attempts so that exactly one rider wins an order.
/// * The rider-side reject path and eligible-order listing.
///
/// The correctness contract: [`accept_order`](Self::accept_order) must express the
/// `Ready` → `OutForDelivery` transition as a single conditional update — a write that only
/// applies while the order is still `Ready` with no rider, checked and applied indivisibly with
/// respect to concurrent writers of the same order. No in-memory locking is assumed, so the
/// guarantee must hold across processes.
#[allow(async_fn_in_trait)]
pub trait DispatchDatabase: Clone + FleetManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches the order for the given human-facing order number.
    async fn fetch_order_by_number(&self, order_number: &OrderId) -> Result<Option<Order>, DispatchError>;

    /// Fetches the line items for the given order (internal id).
    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, DispatchError>;

    /// Fetches all assignment requests recorded against the given order (internal id).
    async fn fetch_assignment_requests(&self, order_id: i64) -> Result<Vec<AssignmentRequest>, DispatchError>;

    /// Populates the order's assignment requests: one `Pending` entry per active rider affiliated
    /// with any vendor named by the order's line items. Idempotent — riders that already have an
    /// entry are never duplicated. The order must be `Ready`.
    ///
    /// Zero eligible riders is a success with an empty `newly_added` set.
    async fn broadcast_order(&self, order_number: &OrderId) -> Result<BroadcastResult, DispatchError>;

    /// Resolves a rider's accept against the order.
    ///
    /// In a single transaction: the guarded conditional update assigns the rider, stamps
    /// `assigned_at` and moves the order to `OutForDelivery`; the winner's request entry becomes
    /// `Accepted` (created on the spot if the order was never broadcast); every other `Pending`
    /// entry becomes `Expired`.
    ///
    /// If the guard does not match, the order is re-read and the outcome classified as
    /// [`DispatchError::AlreadyAssigned`], [`DispatchError::NoLongerReady`] or
    /// [`DispatchError::Conflict`]. The first two are race losses, not failures.
    async fn accept_order(&self, order_number: &OrderId, rider_id: &RiderId) -> Result<AcceptedOrder, DispatchError>;

    /// Marks the rider's own `Pending` request `Rejected`, with an optional free-text reason.
    /// Never touches the order row, and is safe to run concurrently with other riders' accepts.
    async fn reject_order(
        &self,
        order_number: &OrderId,
        rider_id: &RiderId,
        reason: Option<String>,
    ) -> Result<AssignmentRequest, DispatchError>;

    /// Lists `Ready`, unassigned orders whose line items name the rider's vendor, ordered by
    /// `created_at` ascending. Reads here are non-authoritative: a listed order may already be
    /// claimed by the time the rider acts on it, and the accept call is the sole authority.
    async fn available_orders_for_rider(
        &self,
        rider_id: &RiderId,
        pagination: &Pagination,
    ) -> Result<AvailableOrders, DispatchError>;

    /// Marks `Pending` requests older than `older_than` as `Expired`, returning the count.
    async fn expire_stale_requests(&self, older_than: Duration) -> Result<SweepResult, DispatchError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), DispatchError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested rider {0} does not exist")]
    RiderNotFound(RiderId),
    #[error("Rider {0} is not active")]
    RiderInactive(RiderId),
    #[error("The rider is not affiliated with any vendor on this order")]
    NoVendorAffiliation,
    #[error("The rider was not notified of this order")]
    NotNotified,
    #[error("The order has already been assigned to {}", winner.name)]
    AlreadyAssigned { winner: RiderProfile },
    #[error("The order is no longer ready for pickup (current status: {status})")]
    NoLongerReady { status: OrderStatusType },
    #[error("The order could not be claimed due to a concurrent update. Try again.")]
    Conflict,
    #[error("There is no assignment request for this rider on this order")]
    RequestNotFound,
    #[error("The assignment request is not pending (current status: {status})")]
    RequestNotPending { status: RequestStatus },
}

impl DispatchError {
    /// Race losses are expected outcomes of concurrent dispatch, distinct from true failures.
    pub fn is_race_loss(&self) -> bool {
        matches!(self, DispatchError::AlreadyAssigned { .. } | DispatchError::NoLongerReady { .. })
    }
}

impl From<sqlx::Error> for DispatchError {
    fn from(e: sqlx::Error) -> Self {
        DispatchError::DatabaseError(e.to_string())
    }
}
