use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, RiderId},
    traits::RiderProfile,
};

/// Emitted exactly once per order, the instant the guarded accept commits. Subscribers typically
/// notify the customer and push the delivery details to the winning rider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiderAssignedEvent {
    pub order: Order,
    pub rider: RiderProfile,
}

impl RiderAssignedEvent {
    pub fn new(order: Order, rider: RiderProfile) -> Self {
        Self { order, rider }
    }
}

/// Emitted once per newly notified rider when a ready order is broadcast. Delivery to the rider's
/// device is the subscriber's concern; the dispatch flow never waits on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAvailableEvent {
    pub order: Order,
    pub rider_id: RiderId,
}

impl OrderAvailableEvent {
    pub fn new(order: Order, rider_id: RiderId) -> Self {
        Self { order, rider_id }
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use dispatch_common::Money;

    use super::*;
    use crate::db_types::{OrderId, OrderStatusType};

    fn sample_order() -> Order {
        let now = Utc::now();
        Order {
            id: 1,
            order_number: OrderId("100".into()),
            customer_id: "cust-1".into(),
            status: OrderStatusType::Ready,
            total_price: Money::from_whole(250),
            currency: "THB".into(),
            address_line1: "1 Soi Sukhumvit 12".into(),
            address_line2: None,
            city: "Bangkok".into(),
            postcode: "10110".into(),
            rider_id: None,
            assigned_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn events_compare_by_value() {
        let available = OrderAvailableEvent::new(sample_order(), RiderId::from("r1"));
        assert_eq!(available.clone(), available);

        let order = sample_order();
        let profile = RiderProfile { id: RiderId::from("r1"), name: "Somchai".into(), phone: None };
        let assigned = RiderAssignedEvent::new(order.clone(), profile.clone());
        assert_eq!(assigned.clone(), assigned);
        assert_ne!(assigned, RiderAssignedEvent::new(order, RiderProfile { id: RiderId::from("r2"), ..profile }));
    }
}
