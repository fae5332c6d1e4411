use serde::{Deserialize, Serialize};

use crate::db_types::{AssignmentRequest, Order, Rider, RiderId, VendorId};

/// The public-facing slice of a rider record. This is what race losers see in an
/// `AlreadyAssigned` outcome, and what push payloads carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderProfile {
    pub id: RiderId,
    pub name: String,
    pub phone: Option<String>,
}

impl From<&Rider> for RiderProfile {
    fn from(rider: &Rider) -> Self {
        Self { id: rider.id.clone(), name: rider.name.clone(), phone: rider.phone.clone() }
    }
}

/// The result of a successful accept: the order as written by the guarded update, the winning
/// rider, and the winner's `Accepted` request entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedOrder {
    pub order: Order,
    pub rider: RiderProfile,
    pub request: AssignmentRequest,
}

/// The result of a broadcast. `notified` is the full pending request set for the order;
/// `newly_added` is the subset created by this call (empty on a repeat broadcast).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub order: Order,
    pub notified: Vec<AssignmentRequest>,
    pub newly_added: Vec<RiderId>,
}

/// The eligible-order listing for one rider. A rider with no vendor affiliation gets
/// `vendor_id: None` and an empty list; that is a normal outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableOrders {
    pub rider_id: RiderId,
    pub vendor_id: Option<VendorId>,
    pub orders: Vec<Order>,
}

impl AvailableOrders {
    pub fn none_for(rider_id: RiderId) -> Self {
        Self { rider_id, vendor_id: None, orders: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: Option<i64>,
    pub count: Option<i64>,
}

/// The outcome of a stale-request sweep.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SweepResult {
    pub expired_count: u64,
}
