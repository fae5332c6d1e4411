use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{AssignmentRequest, Order, OrderId, OrderItem, RiderId},
    events::{EventProducers, OrderAvailableEvent, RiderAssignedEvent},
    traits::{AcceptedOrder, AvailableOrders, BroadcastResult, DispatchDatabase, DispatchError, Pagination, SweepResult},
};

/// `DispatchFlowApi` is the primary API for the order dispatch flow: broadcasting ready orders to
/// their eligible rider sets and resolving each rider's accept or reject.
///
/// The API owns no state of its own. All coordination lives in the backing store's conditional
/// update (see [`DispatchDatabase::accept_order`]); the API's job is sequencing, logging and
/// firing the notification hooks. Hook delivery is fire-and-forget — a notification failure is
/// logged and never surfaced to the dispatch caller.
pub struct DispatchFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for DispatchFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DispatchFlowApi")
    }
}

impl<B> DispatchFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> DispatchFlowApi<B>
where B: DispatchDatabase
{
    /// Broadcasts a `Ready` order: records a `Pending` assignment request for every active rider
    /// affiliated with a vendor on the order, then announces the order to each newly notified
    /// rider. Safe to call repeatedly — riders already listed are never duplicated, and repeat
    /// calls announce nothing.
    pub async fn broadcast_order(&self, order_number: &OrderId) -> Result<BroadcastResult, DispatchError> {
        let result = self.db.broadcast_order(order_number).await?;
        debug!(
            "🔄️📮️ Order [{}] broadcast complete. {} riders notified, {} new",
            result.order.order_number,
            result.notified.len(),
            result.newly_added.len()
        );
        self.call_order_available_hook(&result).await;
        Ok(result)
    }

    /// Resolves a rider's accept. Exactly one rider can ever win a given order; the losers of the
    /// race receive [`DispatchError::AlreadyAssigned`] (naming the winner) or
    /// [`DispatchError::NoLongerReady`], which are expected outcomes rather than failures.
    pub async fn accept_order(&self, rider_id: &RiderId, order_number: &OrderId) -> Result<AcceptedOrder, DispatchError> {
        let accepted = match self.db.accept_order(order_number, rider_id).await {
            Ok(a) => a,
            Err(e) if e.is_race_loss() => {
                debug!("🔄️🛵️ Rider {rider_id} lost the race for order [{order_number}]: {e}");
                return Err(e);
            },
            Err(e) => return Err(e),
        };
        debug!("🔄️🛵️ Order [{}] accepted by rider {}", accepted.order.order_number, accepted.rider.id);
        self.call_rider_assigned_hook(&accepted).await;
        Ok(accepted)
    }

    /// Marks the rider's own pending request as rejected. Never affects the order itself or any
    /// other rider's request.
    pub async fn reject_order(
        &self,
        rider_id: &RiderId,
        order_number: &OrderId,
        reason: Option<String>,
    ) -> Result<AssignmentRequest, DispatchError> {
        let request = self.db.reject_order(order_number, rider_id, reason).await?;
        debug!("🔄️🛵️ Rider {rider_id} rejected order [{order_number}]");
        Ok(request)
    }

    /// The rider-facing eligible-order listing. Non-authoritative: an order listed here may be
    /// claimed by another rider before this one acts, and only the accept call decides.
    pub async fn available_orders(
        &self,
        rider_id: &RiderId,
        pagination: &Pagination,
    ) -> Result<AvailableOrders, DispatchError> {
        let available = self.db.available_orders_for_rider(rider_id, pagination).await?;
        if available.vendor_id.is_none() {
            trace!("🔄️🛵️ Rider {rider_id} has no vendor affiliation; returning an empty listing");
        }
        Ok(available)
    }

    /// Expires pending requests older than `older_than`. Exposed for the (optional) server-side
    /// sweep worker; the engine never runs this on its own.
    pub async fn expire_stale_requests(&self, older_than: Duration) -> Result<SweepResult, DispatchError> {
        self.db.expire_stale_requests(older_than).await
    }

    /// The order and its line items, for display. Returns `None` when the order number is unknown.
    pub async fn fetch_order(&self, order_number: &OrderId) -> Result<Option<(Order, Vec<OrderItem>)>, DispatchError> {
        let order = match self.db.fetch_order_by_number(order_number).await? {
            Some(o) => o,
            None => return Ok(None),
        };
        let items = self.db.fetch_order_items(order.id).await?;
        Ok(Some((order, items)))
    }

    async fn call_rider_assigned_hook(&self, accepted: &AcceptedOrder) {
        for emitter in &self.producers.rider_assigned_producer {
            debug!("🔄️📬️ Notifying rider-assigned hook subscribers");
            let event = RiderAssignedEvent::new(accepted.order.clone(), accepted.rider.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_available_hook(&self, broadcast: &BroadcastResult) {
        for emitter in &self.producers.order_available_producer {
            for rider_id in &broadcast.newly_added {
                let event = OrderAvailableEvent::new(broadcast.order.clone(), rider_id.clone());
                emitter.publish_event(event).await;
            }
        }
    }
}
