use chrono::{DateTime, Utc};
use dispatch_common::Money;
use serde::{Deserialize, Serialize};

/// The payload pushed to a rider's device when a ready order becomes available to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAvailablePush {
    pub order_number: String,
    pub total_price: Money,
    pub currency: String,
    pub pickup_city: String,
    pub dropoff_lines: Vec<String>,
}

/// Pushed to the winning rider once their accept has been committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentConfirmedPush {
    pub order_number: String,
    pub rider_name: String,
    pub total_price: Money,
    pub currency: String,
    pub dropoff_lines: Vec<String>,
}

/// What the gateway returns for an accepted push. Delivery is best-effort beyond this point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushReceipt {
    pub message_id: String,
    pub accepted_at: DateTime<Utc>,
}
