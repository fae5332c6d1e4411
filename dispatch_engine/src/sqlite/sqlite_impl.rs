//! `SqliteDatabase` is a concrete implementation of a dispatch engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`traits`](crate::traits) module.
//!
//! A note on the acceptance guard: the fast-fail precondition checks run on a plain pooled
//! connection and are *not* part of the correctness argument — they exist to produce specific
//! error messages cheaply. The guarded conditional update opens its own transaction and issues
//! the write as its first statement, so the row-level check-and-set is what actually decides the
//! race, exactly once per order.
use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, orders, requests, riders, vendors};
use crate::{
    db_types::{
        AssignmentRequest,
        NewOrder,
        NewRider,
        NewVendor,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        Rider,
        RiderId,
        Vendor,
        VendorId,
    },
    geo::VendorLocation,
    traits::{
        AcceptedOrder,
        AvailableOrders,
        BroadcastResult,
        DispatchDatabase,
        DispatchError,
        FleetManagement,
        Pagination,
        RiderProfile,
        SweepResult,
    },
};

const DEFAULT_PAGE_SIZE: i64 = 50;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new connection pool using the database URL from the `DDS_DATABASE_URL`
    /// environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Stores a new order and its line items atomically. Order creation belongs to checkout, not
    /// dispatch; this exists for the services upstream of the engine and for test fixtures.
    pub async fn insert_order(&self, order: NewOrder) -> Result<Order, DispatchError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    pub async fn insert_rider(&self, rider: NewRider) -> Result<Rider, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        riders::insert_rider(rider, &mut conn).await
    }

    pub async fn insert_vendor(&self, vendor: NewVendor) -> Result<Vendor, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        vendors::insert_vendor(vendor, &mut conn).await
    }

    /// Out-of-scope fulfilment transitions (vendor marks packed, admin cancels). No state-machine
    /// enforcement here; the owning services are trusted.
    pub async fn set_order_status(&self, id: i64, status: OrderStatusType) -> Result<Order, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(id, status, &mut conn).await
    }

    /// Classifies a failed conditional update by re-reading the order. Never guesses: the answer
    /// comes from what the store says *now*.
    async fn classify_lost_race(&self, order_number: &OrderId) -> DispatchError {
        let mut conn = match self.pool.acquire().await {
            Ok(c) => c,
            Err(e) => return DispatchError::from(e),
        };
        let order = match orders::fetch_order_by_number(order_number, &mut conn).await {
            Ok(Some(o)) => o,
            Ok(None) => return DispatchError::OrderNotFound(order_number.clone()),
            Err(e) => return DispatchError::from(e),
        };
        if let Some(winner_id) = &order.rider_id {
            let winner = match riders::fetch_rider(winner_id, &mut conn).await {
                Ok(Some(r)) => RiderProfile::from(&r),
                // The FK guarantees the row exists; fall back to a bare profile rather than error
                _ => RiderProfile { id: winner_id.clone(), name: String::new(), phone: None },
            };
            return DispatchError::AlreadyAssigned { winner };
        }
        if order.status != OrderStatusType::Ready {
            return DispatchError::NoLongerReady { status: order.status };
        }
        // Still looks claimable, yet the guard did not match: transient. The caller may retry.
        DispatchError::Conflict
    }
}

impl FleetManagement for SqliteDatabase {
    async fn fetch_rider(&self, rider_id: &RiderId) -> Result<Option<Rider>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        Ok(riders::fetch_rider(rider_id, &mut conn).await?)
    }

    async fn fetch_vendor(&self, vendor_id: &VendorId) -> Result<Option<Vendor>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        Ok(vendors::fetch_vendor(vendor_id, &mut conn).await?)
    }

    async fn active_riders_for_vendors(&self, vendor_ids: &[VendorId]) -> Result<Vec<Rider>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        Ok(riders::active_riders_for_vendors(vendor_ids, &mut conn).await?)
    }

    async fn active_vendor_locations(&self) -> Result<Vec<VendorLocation>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        Ok(vendors::active_vendor_locations(&mut conn).await?)
    }
}

impl DispatchDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_order_by_number(&self, order_number: &OrderId) -> Result<Option<Order>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_number(order_number, &mut conn).await?)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_items(order_id, &mut conn).await?)
    }

    async fn fetch_assignment_requests(&self, order_id: i64) -> Result<Vec<AssignmentRequest>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        Ok(requests::fetch_requests_for_order(order_id, &mut conn).await?)
    }

    async fn broadcast_order(&self, order_number: &OrderId) -> Result<BroadcastResult, DispatchError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_number(order_number, &mut tx)
            .await?
            .ok_or_else(|| DispatchError::OrderNotFound(order_number.clone()))?;
        if !order.is_assignable() {
            return Err(DispatchError::NoLongerReady { status: order.status });
        }
        let vendor_ids =
            orders::vendors_for_order(order.id, &mut tx).await?.into_iter().map(VendorId::from).collect::<Vec<_>>();
        let candidates = riders::active_riders_for_vendors(&vendor_ids, &mut tx).await?;
        let rider_ids = candidates.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        let newly_added = requests::insert_pending_requests(order.id, &rider_ids, &mut tx).await?;
        let notified = requests::fetch_requests_for_order(order.id, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "📮️ Order [{}] broadcast to {} riders across {} vendors ({} new)",
            order.order_number,
            rider_ids.len(),
            vendor_ids.len(),
            newly_added.len()
        );
        Ok(BroadcastResult { order, notified, newly_added })
    }

    async fn accept_order(&self, order_number: &OrderId, rider_id: &RiderId) -> Result<AcceptedOrder, DispatchError> {
        // Fast-fail preconditions. Plain reads, deliberately outside the guard's transaction.
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(order_number, &mut conn)
            .await?
            .ok_or_else(|| DispatchError::OrderNotFound(order_number.clone()))?;
        let rider = riders::fetch_rider(rider_id, &mut conn)
            .await?
            .ok_or_else(|| DispatchError::RiderNotFound(rider_id.clone()))?;
        if !rider.is_active {
            return Err(DispatchError::RiderInactive(rider_id.clone()));
        }
        let order_vendors = orders::vendors_for_order(order.id, &mut conn).await?;
        let affiliated =
            rider.vendor_id.as_ref().map(|v| order_vendors.iter().any(|ov| ov == v.as_str())).unwrap_or(false);
        if !affiliated {
            return Err(DispatchError::NoVendorAffiliation);
        }
        let existing = requests::fetch_requests_for_order(order.id, &mut conn).await?;
        if !existing.is_empty() && !existing.iter().any(|r| &r.rider_id == rider_id) {
            return Err(DispatchError::NotNotified);
        }
        if !order.is_assignable() {
            return Err(self.classify_lost_race(order_number).await);
        }
        drop(conn);

        // The authoritative guard. The conditional update is the first statement of the
        // transaction, so the write lock is taken before anything is checked, and the
        // status/rider predicate is evaluated at apply time.
        let mut tx = self.pool.begin().await?;
        match orders::try_assign_rider(order.id, rider_id, &mut tx).await? {
            Some(updated) => {
                let request = requests::mark_winner_accepted(order.id, rider_id, &mut tx).await?;
                let expired = requests::expire_other_pending(order.id, rider_id, &mut tx).await?;
                tx.commit().await?;
                info!(
                    "🛵️ Order [{}] assigned to rider {} ({} other pending requests expired)",
                    updated.order_number, rider.id, expired
                );
                Ok(AcceptedOrder { order: updated, rider: RiderProfile::from(&rider), request })
            },
            None => {
                drop(tx);
                trace!("🛵️ Rider {rider_id} lost the race for order [{order_number}]. Classifying.");
                Err(self.classify_lost_race(order_number).await)
            },
        }
    }

    async fn reject_order(
        &self,
        order_number: &OrderId,
        rider_id: &RiderId,
        reason: Option<String>,
    ) -> Result<AssignmentRequest, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(order_number, &mut conn)
            .await?
            .ok_or_else(|| DispatchError::OrderNotFound(order_number.clone()))?;
        match requests::mark_rejected(order.id, rider_id, reason, &mut conn).await? {
            Some(request) => {
                debug!("🛵️ Rider {rider_id} rejected order [{order_number}]");
                Ok(request)
            },
            None => match requests::fetch_request(order.id, rider_id, &mut conn).await? {
                Some(request) => Err(DispatchError::RequestNotPending { status: request.status }),
                None => Err(DispatchError::RequestNotFound),
            },
        }
    }

    async fn available_orders_for_rider(
        &self,
        rider_id: &RiderId,
        pagination: &Pagination,
    ) -> Result<AvailableOrders, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let rider = riders::fetch_rider(rider_id, &mut conn)
            .await?
            .ok_or_else(|| DispatchError::RiderNotFound(rider_id.clone()))?;
        let vendor_id = match rider.vendor_id {
            Some(v) => v,
            // No vendor affiliation is a normal empty result, not an error
            None => return Ok(AvailableOrders::none_for(rider.id)),
        };
        let offset = pagination.offset.unwrap_or(0).max(0);
        let count = pagination.count.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 500);
        let orders = orders::ready_orders_for_vendor(vendor_id.as_str(), offset, count, &mut conn).await?;
        Ok(AvailableOrders { rider_id: rider.id, vendor_id: Some(vendor_id), orders })
    }

    async fn expire_stale_requests(&self, older_than: Duration) -> Result<SweepResult, DispatchError> {
        let cutoff = Utc::now() - older_than;
        let mut conn = self.pool.acquire().await?;
        let expired_count = requests::expire_older_than(cutoff, &mut conn).await?;
        if expired_count > 0 {
            info!("🕰️ Expired {expired_count} stale pending assignment requests");
        }
        Ok(SweepResult { expired_count })
    }
}
